mod presentation;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use edci_core::{
    constants::CONFIG_ENV_VAR, load_or_default, resolve_config_path, CongestionEngine,
    CycleReport, EngineConfig, Status,
};
use edci_provider::{FileProvider, ReadingProvider, SyntheticProvider};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "edci")]
#[command(about = "Emergency department congestion (EDCI) evaluation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one cycle read from a JSON or YAML readings file
    Evaluate {
        /// Readings file (.json, .yaml or .yml)
        readings_file: PathBuf,
        /// Engine configuration file (falls back to EDCI_CONFIG, then defaults)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Only show facilities with this status (normal, warning, emergency)
        #[arg(long)]
        status: Option<Status>,
        /// Emit the cycle report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Evaluate one cycle of synthetic readings
    Simulate {
        /// Generator seed (defaults to the current time)
        #[arg(long)]
        seed: Option<u64>,
        /// Leave EDCI out of the readings so the engine derives it
        #[arg(long)]
        derive_edci: bool,
        /// Engine configuration file (falls back to EDCI_CONFIG, then defaults)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Only show facilities with this status (normal, warning, emergency)
        #[arg(long)]
        status: Option<Status>,
        /// Emit the cycle report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one facility's assessment and alert reasons
    Facility {
        /// Facility id
        id: String,
        /// Readings file (omit to use synthetic readings)
        readings_file: Option<PathBuf>,
        /// Generator seed for synthetic readings
        #[arg(long, conflicts_with = "readings_file")]
        seed: Option<u64>,
        /// Engine configuration file (falls back to EDCI_CONFIG, then defaults)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Emit the assessment as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate an engine configuration file
    CheckConfig {
        /// Configuration file (YAML)
        file: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive("edci_cli=info".parse()?)
                .add_directive("edci_core=warn".parse()?)
                .add_directive("edci_provider=warn".parse()?),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Evaluate {
            readings_file,
            config,
            status,
            json,
        }) => {
            let engine = engine_from(config)?;
            let mut provider = FileProvider::new(readings_file)?;
            let report = engine.evaluate_cycle(&provider.next_cycle()?);
            emit_cycle(report, status, json)?;
        }
        Some(Commands::Simulate {
            seed,
            derive_edci,
            config,
            status,
            json,
        }) => {
            let engine = engine_from(config)?;
            let seed = seed.unwrap_or_else(clock_seed);
            let mut provider = SyntheticProvider::new(seed).with_reported_edci(!derive_edci);
            let report = engine.evaluate_cycle(&provider.next_cycle()?);
            if !json {
                println!("Seed: {}", seed);
            }
            emit_cycle(report, status, json)?;
        }
        Some(Commands::Facility {
            id,
            readings_file,
            seed,
            config,
            json,
        }) => {
            let engine = engine_from(config)?;
            let records = match readings_file {
                Some(path) => FileProvider::new(path)?.next_cycle()?,
                None => SyntheticProvider::new(seed.unwrap_or_else(clock_seed)).next_cycle()?,
            };
            let report = engine.evaluate_cycle(&records);

            match report.facility(&id) {
                Some(assessment) if json => {
                    println!("{}", serde_json::to_string_pretty(assessment)?);
                }
                Some(assessment) => print!("{}", presentation::render_facility(assessment)),
                None => match report.rejected.iter().find(|e| e.facility_id() == id) {
                    Some(err) => eprintln!("Facility excluded from this cycle: {}", err),
                    None => eprintln!("Facility not found: {}", id),
                },
            }
        }
        Some(Commands::CheckConfig { file }) => {
            let cfg = EngineConfig::load(&file)?;
            let severity = cfg.severity();
            let limits = cfg.alert_limits();
            let weights = cfg.edci_weights();
            println!("Configuration OK: {}", file.display());
            println!(
                "  severity: warning >= {}, emergency >= {}",
                severity.warning(),
                severity.emergency()
            );
            println!(
                "  alert limits: PBR > {}, NBR > {}, waiting > {}, over 24h > {}, transfer > {} h",
                limits.physician_pressure,
                limits.nurse_pressure,
                limits.admission_backlog,
                limits.prolonged_stay,
                limits.transfer_hours
            );
            println!(
                "  EDCI weights: PBR {}, NBR {}, waiting {}, over 24h {}, transfer {}",
                weights.physician_pressure,
                weights.nurse_pressure,
                weights.admission_backlog,
                weights.prolonged_stay,
                weights.transfer_hours
            );
        }
        None => {
            println!("No command given. Run `edci --help` for usage.");
        }
    }

    Ok(())
}

fn engine_from(flag: Option<PathBuf>) -> Result<CongestionEngine, Box<dyn std::error::Error>> {
    let path = resolve_config_path(flag, std::env::var(CONFIG_ENV_VAR).ok());
    if let Some(path) = &path {
        tracing::info!("using engine configuration {}", path.display());
    }
    let cfg = load_or_default(path.as_deref())?;
    Ok(CongestionEngine::new(Arc::new(cfg)))
}

fn emit_cycle(
    report: CycleReport,
    status: Option<Status>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let value = presentation::cycle_json(&report, status)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", presentation::render_cycle(&report, status));
    }
    Ok(())
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
