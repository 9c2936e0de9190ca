//! Stress CLI - Command-line interface for biomarker stress assessment
//!
//! Commands:
//! - analyze: Submit biomarkers to the inference service
//! - interpret: Interpret a saved prediction payload offline
//! - doctor: Check configuration and connectivity

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use biomarker_stress::gradio::{resolve_base_url, GradioTransport};
use biomarker_stress::transport::InferenceTransport;
use biomarker_stress::{
    interpret, BiomarkerInput, ClientConfig, StressAnalyzer, StressAssessment, StressError,
    PRODUCER_NAME, VERSION,
};

/// Stress - biomarker stress assessment against a hosted model
#[derive(Parser)]
#[command(name = "stress")]
#[command(version = VERSION)]
#[command(about = "Assess stress from salivary biomarkers and sleep", long_about = None)]
struct Cli {
    /// Enable debug logging (otherwise RUST_LOG, default warn)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit biomarkers to the inference service
    Analyze {
        #[command(flatten)]
        biomarkers: BiomarkerArgs,

        #[command(flatten)]
        service: ServiceArgs,

        /// Output format (default: human on a terminal, json otherwise)
        #[arg(long)]
        output_format: Option<OutputFormat>,
    },

    /// Interpret a saved prediction payload without contacting the service
    Interpret {
        /// Payload file (use - for stdin). Non-JSON content is read as plain text.
        #[arg(short, long)]
        payload: PathBuf,

        #[command(flatten)]
        biomarkers: BiomarkerArgs,

        /// Output format (default: human on a terminal, json otherwise)
        #[arg(long)]
        output_format: Option<OutputFormat>,
    },

    /// Check configuration and connectivity
    Doctor {
        #[command(flatten)]
        service: ServiceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Clone)]
struct BiomarkerArgs {
    /// Name of the person assessed
    #[arg(long)]
    name: String,

    /// Age in years (1-120)
    #[arg(long)]
    age: u32,

    /// Cortisol in μg/dL (0-20)
    #[arg(long)]
    cortisol: f64,

    /// Alpha-amylase in U/L (50-200)
    #[arg(long)]
    amylase: f64,

    /// Secretory IgA in mg/dL (20-80)
    #[arg(long)]
    iga: f64,

    /// Hours of sleep (0-12)
    #[arg(long)]
    sleep: f64,
}

impl BiomarkerArgs {
    fn into_input(self) -> Result<BiomarkerInput, StressError> {
        let input = BiomarkerInput {
            name: self.name,
            age: self.age,
            cortisol: self.cortisol,
            amylase: self.amylase,
            iga: self.iga,
            sleep_hours: self.sleep,
        };
        input.validate()?;
        Ok(input)
    }
}

#[derive(Args, Clone)]
struct ServiceArgs {
    /// Service id (owner/space) or URL [env: STRESS_SERVICE_ID]
    #[arg(long)]
    service: Option<String>,

    /// Base URL overriding the service id [env: STRESS_BASE_URL]
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds [env: STRESS_TIMEOUT_SECS]
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl ServiceArgs {
    fn into_config(self) -> Result<ClientConfig, StressError> {
        let mut config = ClientConfig::from_env()?;
        if let Some(service) = self.service {
            config = config.with_service_id(service);
        }
        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Readable summary
    Human,
    /// Single-line JSON report
    Json,
    /// Pretty-printed JSON report
    JsonPretty,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug,reqwest=info,hyper=info,hyper_util=info,rustls=info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), StressCliError> {
    match cli.command {
        Commands::Analyze {
            biomarkers,
            service,
            output_format,
        } => cmd_analyze(biomarkers, service, output_format).await,

        Commands::Interpret {
            payload,
            biomarkers,
            output_format,
        } => cmd_interpret(&payload, biomarkers, output_format),

        Commands::Doctor { service, json } => cmd_doctor(service, json).await,
    }
}

async fn cmd_analyze(
    biomarkers: BiomarkerArgs,
    service: ServiceArgs,
    output_format: Option<OutputFormat>,
) -> Result<(), StressCliError> {
    let input = biomarkers.into_input()?;
    let config = service.into_config()?;
    let service_id = config.service_id.clone();
    info!(%service_id, "submitting biomarkers");

    let analyzer = StressAnalyzer::from_config(config)?;
    let assessment = analyzer.submit(&input).await?;

    print_assessment(assessment, Some(service_id), output_format)
}

fn cmd_interpret(
    payload: &Path,
    biomarkers: BiomarkerArgs,
    output_format: Option<OutputFormat>,
) -> Result<(), StressCliError> {
    let input = biomarkers.into_input()?;

    let raw = if payload.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            eprintln!("Reading prediction payload from stdin (end with Ctrl-D)...");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(payload)?
    };

    let value = serde_json::from_str::<Value>(&raw)
        .unwrap_or_else(|_| Value::String(raw.trim().to_string()));
    let assessment = interpret(&value, &input)?;

    print_assessment(assessment, None, output_format)
}

async fn cmd_doctor(service: ServiceArgs, json: bool) -> Result<(), StressCliError> {
    let mut checks = Vec::new();

    let config = match service.into_config() {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "service {} path {}",
                    config.service_id, config.predict_path
                ),
            });
            Some(config)
        }
        Err(e) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            });
            None
        }
    };

    if let Some(config) = config {
        let endpoint = config
            .base_url
            .clone()
            .unwrap_or_else(|| resolve_base_url(&config.service_id));
        checks.push(DoctorCheck {
            name: "endpoint".to_string(),
            status: CheckStatus::Ok,
            message: endpoint,
        });

        checks.push(DoctorCheck {
            name: "token".to_string(),
            status: if config.access_token.is_some() {
                CheckStatus::Ok
            } else {
                CheckStatus::Warning
            },
            message: if config.access_token.is_some() {
                "access token configured".to_string()
            } else {
                "no access token (public apps only)".to_string()
            },
        });

        let connectivity = match GradioTransport::new(&config) {
            Ok(transport) => match transport.connect(&config.service_id).await {
                Ok(_) => DoctorCheck {
                    name: "connect".to_string(),
                    status: CheckStatus::Ok,
                    message: "app config reachable".to_string(),
                },
                Err(e) => DoctorCheck {
                    name: "connect".to_string(),
                    status: CheckStatus::Error,
                    message: e.describe(),
                },
            },
            Err(e) => DoctorCheck {
                name: "connect".to_string(),
                status: CheckStatus::Error,
                message: format!("cannot build HTTP client: {e}"),
            },
        };
        checks.push(connectivity);
    }

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Stress Doctor Report");
        println!("====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(StressCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn print_assessment(
    assessment: StressAssessment,
    service: Option<String>,
    output_format: Option<OutputFormat>,
) -> Result<(), StressCliError> {
    let format = output_format.unwrap_or_else(|| {
        if atty::is(atty::Stream::Stdout) {
            OutputFormat::Human
        } else {
            OutputFormat::Json
        }
    });

    let report = AssessmentReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        generated_at: Utc::now(),
        service,
        assessment,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Human => print_human(&report.assessment),
    }
    Ok(())
}

fn print_human(assessment: &StressAssessment) {
    let input = &assessment.input;
    let metrics = &assessment.metrics;

    println!("Stress Assessment");
    println!("=================");
    println!("Name:   {} ({})", input.name, input.age);
    println!(
        "Score:  {}/100 ({})",
        assessment.score,
        assessment.level.as_str()
    );
    println!("\nBiomarkers (normalized):");
    println!("  cortisol  {:>6.1} μg/dL  {:.2}", input.cortisol, metrics.cortisol_norm);
    println!("  amylase   {:>6.1} U/L    {:.2}", input.amylase, metrics.amylase_norm);
    println!("  IgA       {:>6.1} mg/dL  {:.2}", input.iga, metrics.iga_norm);
    println!("  sleep     {:>6.1} h      {:.2}", input.sleep_hours, metrics.sleep_norm);
    println!("\nRecommendations:");
    for recommendation in &assessment.recommendations {
        println!("  - {recommendation}");
    }
}

#[derive(Debug)]
enum StressCliError {
    Io(io::Error),
    Stress(StressError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<io::Error> for StressCliError {
    fn from(e: io::Error) -> Self {
        StressCliError::Io(e)
    }
}

impl From<StressError> for StressCliError {
    fn from(e: StressError) -> Self {
        StressCliError::Stress(e)
    }
}

impl From<serde_json::Error> for StressCliError {
    fn from(e: serde_json::Error) -> Self {
        StressCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<StressCliError> for CliError {
    fn from(e: StressCliError) -> Self {
        match e {
            StressCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            StressCliError::Stress(e) => {
                let (code, hint) = match &e {
                    StressError::Inference(_) => (
                        "INFERENCE_ERROR",
                        "Run 'stress doctor' to check connectivity",
                    ),
                    StressError::Parse(_) => (
                        "PARSE_ERROR",
                        "The model returned an unexpected payload shape",
                    ),
                    StressError::InvalidInput(_) => (
                        "INVALID_INPUT",
                        "Check biomarker values against their ranges",
                    ),
                    StressError::Config(_) => ("CONFIG_ERROR", "Check STRESS_* environment variables"),
                    StressError::Json(_) => ("JSON_ERROR", "Check JSON syntax"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            StressCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            StressCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct AssessmentReport {
    producer: String,
    version: String,
    generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<String>,
    assessment: StressAssessment,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
