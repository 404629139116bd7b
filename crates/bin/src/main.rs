//! finhealth CLI binary.
//!
//! Loads panels from a directory of CSV files and prints derived metrics.

mod output;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use finhealth::{
    CsvDirSource, MarginDeltaMode, PanelStore, Pipeline, PipelineConfig,
    data::{PanelKind, SecurityCode},
    metrics::{ColumnInfo, available_columns, column_info, default_feature_columns},
};
use output::{Format, Table};
use std::{io, path::PathBuf, process};

#[derive(Debug, Parser)]
#[command(name = "finhealth")]
#[command(about = "finhealth: quarter-aligned financial-health metrics", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory with one CSV file per panel
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Date the refresh windows are measured back from (default: today)
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the loaded date range of every panel
    Panels,

    /// Print the composed multi-quarter feature table
    Features {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,

        /// Compute margin deltas as previous minus previous quarter
        #[arg(long)]
        legacy_margin_deltas: bool,

        /// Comma-separated column labels (default: EPS analysis selection);
        /// applies to every format
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Print every catalog column
        #[arg(long, conflicts_with = "columns")]
        all_columns: bool,
    },

    /// Print the profitability history of one security
    Profitability {
        /// Security code
        code: String,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Print the trailing four-quarter profit profile
    Trailing {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// List the export columns
    Columns,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    };
    if cli.as_of.is_some() {
        config.windows.reference_date = cli.as_of;
    }
    let source = CsvDirSource::new(&cli.data_dir);

    match cli.command {
        Commands::Panels => {
            let mut store = PanelStore::with_windows(config.windows);
            store.refresh_all(&source)?;
            print_panels(&store)?;
        }
        Commands::Features {
            format,
            legacy_margin_deltas,
            columns,
            all_columns,
        } => {
            if legacy_margin_deltas {
                config.features.margin_delta = MarginDeltaMode::Legacy;
            }
            let columns = select_columns(&columns, all_columns)?;
            let mut pipeline = Pipeline::new(config)?;
            let derived = pipeline.initialize(&source)?;
            tracing::info!(
                quarter = %derived.quarter,
                rows = derived.features.len(),
                "features ready"
            );
            let table = Table::features(&derived.features, &columns);
            match format {
                Format::Json => table.write_json(io::stdout())?,
                Format::Csv => table.write_csv(io::stdout())?,
                Format::Text => table.write_text(io::stdout())?,
            }
        }
        Commands::Profitability { code, format } => {
            let mut pipeline = Pipeline::new(config)?;
            let derived = pipeline.initialize(&source)?;
            let history = derived.history(&SecurityCode::new(code.as_str()));
            if history.is_empty() {
                return Err(format!("no profitability history for security {code}").into());
            }
            let table = Table::profitability(&history);
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&history)?),
                Format::Csv => table.write_csv(io::stdout())?,
                Format::Text => table.write_text(io::stdout())?,
            }
        }
        Commands::Trailing { format } => {
            let mut pipeline = Pipeline::new(config)?;
            let derived = pipeline.initialize(&source)?;
            let table = Table::trailing(&derived.trailing);
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&derived.trailing)?),
                Format::Csv => table.write_csv(io::stdout())?,
                Format::Text => table.write_text(io::stdout())?,
            }
        }
        Commands::Columns => {
            for column in available_columns() {
                let group = format!("{:?}", column.group);
                println!("{:<28} {:<14} {}", column.label, group, column.description);
            }
        }
    }

    Ok(())
}

fn select_columns(labels: &[String], all: bool) -> Result<Vec<ColumnInfo>, String> {
    if all {
        return Ok(available_columns());
    }
    if labels.is_empty() {
        return Ok(default_feature_columns());
    }
    labels
        .iter()
        .map(|label| {
            column_info(label.trim()).ok_or_else(|| format!("unknown column '{label}'"))
        })
        .collect()
}

fn print_panels(store: &PanelStore) -> Result<(), Box<dyn std::error::Error>> {
    println!("Securities: {}", store.securities()?.len());
    println!("{:<28} {:>12} {:>12}", "Panel", "From", "To");
    println!("{}", "─".repeat(54));
    for kind in PanelKind::TIMED {
        match store.bounds(kind) {
            Some(bounds) => println!(
                "{:<28} {:>12} {:>12}",
                kind.to_string(),
                bounds.min.to_string(),
                bounds.max.to_string()
            ),
            None => println!("{:<28} {:>12} {:>12}", kind.to_string(), "-", "-"),
        }
    }
    Ok(())
}
