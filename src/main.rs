use anyhow::Context;
use anyhow::Result;
use chrono::DateTime;
use chrono::Utc;
use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use rusty_trends::config::Config;
use rusty_trends::pipeline::report_tables;
use rusty_trends::pipeline::Pipeline;
use rusty_trends::spreadsheet::document::Workbook;
use rusty_trends::spreadsheet::xlsx::XlsxSnapshot;
use rusty_trends::summary::chat::ChatClient;
use rusty_trends::summary::SummaryGenerator;
use rusty_trends::tables::metrics::MetricEngine;
use rusty_trends::tables::TableReport;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing::warn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rusty-trends")]
#[command(about = "Compute YoY/MoM metrics for the monthly tables of a worksheet")]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write metrics and summaries into the workbook, in place
    Process {
        #[command(flatten)]
        target: Target,

        /// Only write the numbers
        #[arg(long)]
        skip_summaries: bool,

        /// Cross-check totals and YoY values with the chat service
        #[arg(long)]
        validate_with_external: bool,
    },
    /// Print every table as JSON without modifying the workbook
    Report {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Args)]
struct Target {
    /// The .xlsx workbook
    workbook: PathBuf,

    /// Worksheet holding the tables [default: Traffic-Status]
    #[arg(long)]
    sheet: Option<String>,

    /// TOML configuration file
    #[arg(long, env = "RUSTY_TRENDS_CONFIG")]
    config: Option<PathBuf>,
}

impl Target {
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(sheet) = &self.sheet {
            config.sheet = sheet.to_owned();
        }
        Ok(config)
    }
}

#[derive(Serialize)]
struct Report<'a> {
    workbook: String,
    sheet: &'a str,
    generated_at: DateTime<Utc>,
    tables: Vec<TableReport>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Process {
            target,
            skip_summaries,
            validate_with_external,
        } => {
            let mut config = target.config()?;
            config.metrics.validate_with_external |= validate_with_external;
            config.summary.enabled &= !skip_summaries;
            process(&target, &config)
        }
        Command::Report { target, pretty } => report(&target, &target.config()?, pretty),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_filter(filter))
        .try_init();
}

fn process(target: &Target, config: &Config) -> Result<()> {
    let mut workbook = Workbook::open(&target.workbook)
        .with_context(|| format!("Failed to open '{}'", target.workbook.display()))?;

    let needs_client = config.summary.enabled || config.metrics.validate_with_external;
    let client = if needs_client {
        match ChatClient::from_config(&config.summary) {
            Ok(client) => Some(client),
            Err(error) => {
                warn!(%error, "Chat service unavailable, summaries and external validation are off");
                None
            }
        }
    } else {
        None
    };

    let mut engine = MetricEngine::new(config.metrics);
    if let Some(client) = client.as_ref().filter(|_| config.metrics.validate_with_external) {
        engine = engine.with_corroborator(client);
    }
    let mut pipeline = Pipeline::new(&config.sheet, engine);
    if let Some(client) = client.as_ref().filter(|_| config.summary.enabled) {
        pipeline = pipeline.with_summaries(client as &dyn SummaryGenerator, config.summary.timeout());
    }

    let summary = pipeline
        .run(&mut workbook)
        .with_context(|| format!("Failed to process '{}'", target.workbook.display()))?;
    info!(
        tables = summary.tables,
        calculated = summary.calculated,
        summarized = summary.summarized,
        failures = summary.failures.len(),
        "Done"
    );
    for failure in &summary.failures {
        warn!(title = failure.title.as_str(), row = failure.start_row, pass = ?failure.pass, "{}", failure.message);
    }
    Ok(())
}

fn report(target: &Target, config: &Config, pretty: bool) -> Result<()> {
    let sheet = XlsxSnapshot::open(&target.workbook)
        .and_then(|mut snapshot| snapshot.read_sheet(&config.sheet))
        .with_context(|| format!("Failed to read '{}'", target.workbook.display()))?;
    let report = Report {
        workbook: target.workbook.display().to_string(),
        sheet: &config.sheet,
        generated_at: Utc::now(),
        tables: report_tables(&sheet),
    };
    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}
