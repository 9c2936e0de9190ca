//! Stress score extraction
//!
//! Scores come from two places in a prediction: the free-form prediction text and
//! an optional gauge chart. Text matchers run as an ordered list, first in-range
//! hit wins. The gauge chart, when present, overrides whatever the text produced.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Score used when nothing in the payload yields one
pub const DEFAULT_SCORE: f64 = 50.0;

/// Which match of a pattern supplies the candidate score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPick {
    /// Capture group of the leftmost match
    First,
    /// The second match in the text; a single match yields nothing
    Second,
}

/// A text pattern whose first capture group is a candidate score
pub struct ScoreMatcher {
    pub name: &'static str,
    pick: MatchPick,
    pattern: Regex,
}

impl ScoreMatcher {
    fn new(name: &'static str, pick: MatchPick, pattern: &str) -> Self {
        Self {
            name,
            pick,
            pattern: Regex::new(pattern).unwrap(),
        }
    }

    /// Number captured by the picked match, if any
    pub fn capture(&self, text: &str) -> Option<f64> {
        let caps = match self.pick {
            MatchPick::First => self.pattern.captures(text),
            MatchPick::Second => self.pattern.captures_iter(text).nth(1),
        };
        caps.and_then(|caps| caps.get(1))
            .and_then(|m| parse_decimal(m.as_str()))
    }
}

/// Any run of characters short of a line break (`\r`, `\n`, U+2028, U+2029 all count)
const GAP: &str = r"[^\n\r\x{2028}\x{2029}]*?";

/// Whitespace as ECMAScript defines it
const SPACE: &str = r"[\t\n\x0B\f\r \x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}]";

const NUMBER: &str = r"([0-9]+\.?[0-9]*)%?";

/// Keywords match ASCII case-insensitively only (no `ſ` for `s`, no Kelvin sign for `k`)
fn keyword(word: &str) -> String {
    format!("(?i-u:{word})")
}

/// Text matchers in priority order
pub static TEXT_MATCHERS: Lazy<Vec<ScoreMatcher>> = Lazy::new(|| {
    let stress = keyword("stress");
    let probability = keyword("probability");
    let level = keyword("level");
    let score = keyword("score");

    vec![
        ScoreMatcher::new(
            "stress_probability",
            MatchPick::First,
            &format!("{stress}{GAP}{probability}{GAP}{NUMBER}"),
        ),
        ScoreMatcher::new(
            "stress_level",
            MatchPick::First,
            &format!("{stress}{GAP}{level}{GAP}{NUMBER}"),
        ),
        ScoreMatcher::new(
            "stress_score",
            MatchPick::First,
            &format!("{stress}{GAP}{score}{GAP}{NUMBER}"),
        ),
        ScoreMatcher::new(
            "probability",
            MatchPick::First,
            &format!("{probability}{GAP}{NUMBER}"),
        ),
        ScoreMatcher::new("score", MatchPick::First, &format!("{score}{GAP}{NUMBER}")),
        ScoreMatcher::new(
            "number_before_stress",
            MatchPick::First,
            &format!("{NUMBER}{SPACE}*{stress}"),
        ),
        ScoreMatcher::new("bare_number", MatchPick::Second, NUMBER),
    ]
});

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(NUMBER).unwrap());

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^{SPACE}*([+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)"
    ))
    .unwrap()
});

/// Run the text matchers in order. Returns the score and the matcher that found it.
pub fn score_from_text(text: &str) -> Option<(f64, &'static str)> {
    TEXT_MATCHERS.iter().find_map(|matcher| {
        matcher
            .capture(text)
            .filter(|score| in_score_range(*score))
            .map(|score| (score, matcher.name))
    })
}

/// First bare number in the text, without a range check
pub fn bare_number(text: &str) -> Option<f64> {
    FIRST_NUMBER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_decimal(m.as_str()))
}

/// Score carried by a gauge chart payload.
///
/// A `data` array is scanned for the first in-range `value`; an in-range
/// top-level `value` is checked afterwards and replaces it.
pub fn gauge_score(gauge: &Value) -> Option<f64> {
    let chart = gauge.as_object()?;
    let mut score = None;

    if let Some(Value::Array(points)) = chart.get("data") {
        score = points
            .iter()
            .filter_map(|point| point.get("value"))
            .filter_map(numeric_value)
            .find(|value| in_score_range(*value));
    }

    if let Some(value) = chart
        .get("value")
        .and_then(numeric_value)
        .filter(|value| in_score_range(*value))
    {
        score = Some(value);
    }

    score
}

/// Clamp to 0-100 and round half away from zero
pub fn finalize_score(raw: f64) -> u8 {
    raw.clamp(0.0, 100.0).round() as u8
}

fn in_score_range(score: f64) -> bool {
    score.is_finite() && (0.0..=100.0).contains(&score)
}

/// Numbers and numeric strings; strings are read up to the first non-numeric character.
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => LEADING_NUMBER
            .captures(s)
            .and_then(|caps| caps.get(1))
            .and_then(|m| parse_decimal(m.as_str())),
        _ => None,
    }
}

fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim_end_matches('.').parse::<f64>().ok()
}
