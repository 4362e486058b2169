mod config;
mod preview;
mod registry;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use etlcheck_catalog::{CatalogError, FileCatalog, SourceRegistry, SuiteStore};
use etlcheck_core::Suite;
use etlcheck_ingest::{CsvLoader, DatasetLoader, LoadError, PostgresLoader};
use etlcheck_validate::{
    EtlValidationOrchestrator, PipelineError, PipelineReport, RunContext, render_report,
};
use thiserror::Error;
use uuid::Uuid;

use config::{ConfigError, EtlConfig, load_config};
use preview::render_preview;
use registry::{RunMeta, init_run_logging, start_run, write_report, write_result};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("load error: {0}")]
    Load(#[from] LoadError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "etlcheck", version, about = "ETL data-quality validator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the flat file, then the reconciled database dataset.
    Run(RunArgs),
    /// Inspect persisted suites.
    Suite {
        #[command(subcommand)]
        command: SuiteCommand,
        #[arg(long, default_value = ".etlcheck", global = true)]
        catalog_dir: PathBuf,
    },
    /// List registered sources, assets and batch definitions.
    Sources {
        #[arg(long, default_value = ".etlcheck")]
        catalog_dir: PathBuf,
    },
    /// Print a JSON Schema.
    EmitSchema {
        #[arg(value_enum)]
        document: SchemaDocument,
    },
}

#[derive(Subcommand, Debug)]
enum SuiteCommand {
    List,
    Show { name: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SchemaDocument {
    Suite,
    Config,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Configuration file (JSON, or TOML by extension).
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
    /// Flat file to validate; overrides `csv_path` from the config.
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Directory holding suites and the resource registry.
    #[arg(long, default_value = ".etlcheck")]
    catalog_dir: PathBuf,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run_pipeline(args).await,
        Command::Suite {
            command,
            catalog_dir,
        } => show_suites(command, catalog_dir).map(|_| true),
        Command::Sources { catalog_dir } => show_sources(catalog_dir).map(|_| true),
        Command::EmitSchema { document } => emit_schema(document).map(|_| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether both stages passed.
async fn run_pipeline(args: RunArgs) -> Result<bool, CliError> {
    dotenvy::dotenv().ok();

    let mut config: EtlConfig = load_config(&args.config)?;
    if let Some(csv) = args.csv {
        config.csv_path = csv;
    }

    let meta = RunMeta {
        run_id: Uuid::new_v4().to_string(),
        started_at: chrono::Utc::now(),
        run_dir: args.run_dir,
    };
    let paths = start_run(&meta, &config.resolved())?;
    init_run_logging(&paths.logs_path)?;

    let timer = Instant::now();
    tracing::info!(event = "run_started", run_id = %meta.run_id);
    tracing::info!(
        event = "config_loaded",
        path = %args.config.display(),
        data_source = %config.data_source_name,
        data_asset = %config.data_asset_name
    );

    let source_loader = CsvLoader::new(&config.csv_path);
    let target_loader = PostgresLoader::new(&config.connection_string, &config.db_query)?;
    let source = source_loader.load().await?;
    let target = target_loader.load().await?;
    tracing::info!(
        event = "datasets_loaded",
        source_kind = source_loader.kind(),
        source = %source_loader.describe(),
        source_rows = source.row_count(),
        target_kind = target_loader.kind(),
        target = %target_loader.describe(),
        target_rows = target.row_count()
    );

    println!("Data preview:\n{}\n", render_preview(&source, config.preview_rows));
    println!(
        "Database data preview:\n{}\n",
        render_preview(&target, config.preview_rows)
    );

    let mut catalog = FileCatalog::open(&args.catalog_dir)?;
    let report = {
        let mut ctx = RunContext::new(&mut catalog, config.settings());
        EtlValidationOrchestrator::new().run(&mut ctx, &source, &target)?
    };

    let sources = catalog.list_sources()?;
    println!(
        "Available data sources: {}",
        sources.into_iter().collect::<Vec<_>>().join(", ")
    );

    write_result(&paths, &report)?;
    write_report(&paths, &render_report(&report))?;
    print_summary(&report);

    tracing::info!(
        event = "run_finished",
        outcome = ?report.outcome,
        duration_ms = timer.elapsed().as_millis() as u64,
        run_dir = %paths.root.display()
    );
    Ok(report.success())
}

fn print_summary(report: &PipelineReport) {
    for (label, result) in [("source", &report.source), ("target", &report.target)] {
        match result {
            Some(result) => println!(
                "{label} suite '{}': {} ({} rule(s), {} unexpected row(s))",
                result.suite_name,
                if result.success { "passed" } else { "failed" },
                result.rule_outcomes.len(),
                result.unexpected_row_total()
            ),
            None => println!("{label} suite: not run"),
        }
    }
}

fn show_suites(command: SuiteCommand, catalog_dir: PathBuf) -> Result<(), CliError> {
    let catalog = FileCatalog::open(catalog_dir)?;
    match command {
        SuiteCommand::List => {
            for name in catalog.list_suites()? {
                println!("{name}");
            }
        }
        SuiteCommand::Show { name } => {
            let suite = catalog.get(&name)?;
            println!("{}", serde_json::to_string_pretty(&suite)?);
        }
    }
    Ok(())
}

fn show_sources(catalog_dir: PathBuf) -> Result<(), CliError> {
    let catalog = FileCatalog::open(catalog_dir)?;
    for (source, entry) in &catalog.registry().sources {
        println!("{source}");
        for (asset, asset_entry) in &entry.assets {
            println!("  {asset}");
            for batch in asset_entry.batch_definitions.keys() {
                println!("    {batch}");
            }
        }
    }
    Ok(())
}

fn emit_schema(document: SchemaDocument) -> Result<(), CliError> {
    let schema = match document {
        SchemaDocument::Suite => schemars::schema_for!(Suite),
        SchemaDocument::Config => schemars::schema_for!(EtlConfig),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
