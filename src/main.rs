//! Sales dashboard CLI
//!
//! Loads a sales dataset once, applies the region / product-line selection
//! given on the command line, and prints the dashboard or exports the
//! filtered rows.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;

use sales_dashboard::data::cache;
use sales_dashboard::data::export::{export_file, DEFAULT_EXPORT_NAME};
use sales_dashboard::report::{render_text, Report};
use sales_dashboard::state::{DashboardState, FilterColumn};

/// Sales dashboard - filter and aggregate regional sales data
#[derive(Parser, Debug)]
#[command(name = "sales-dashboard")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Dataset to load (.csv, .json or .parquet)
    #[arg(short, long, global = true, env = "SALES_DATA", default_value = "nike_sales_data.csv")]
    data: PathBuf,

    /// Region(s) to include (default: all)
    #[arg(short, long = "region", global = true)]
    regions: Vec<String>,

    /// Product line(s) to include (default: all)
    #[arg(short, long = "product-line", global = true)]
    product_lines: Vec<String>,

    /// Region(s) to remove from the selection
    #[arg(long = "exclude-region", global = true)]
    exclude_regions: Vec<String>,

    /// Product line(s) to remove from the selection
    #[arg(long = "exclude-product-line", global = true)]
    exclude_product_lines: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print KPIs and grouped tables for the selection
    Summary {
        /// Emit a JSON report instead of text tables
        #[arg(long)]
        json: bool,
    },

    /// List the regions and product lines available for filtering
    Values,

    /// Write the filtered rows (.csv, .json or .parquet, chosen by extension)
    Export {
        /// Output path
        #[arg(short, long, default_value = DEFAULT_EXPORT_NAME)]
        output: PathBuf,
    },
}

fn apply_selection(cli: &Cli, state: &mut DashboardState) {
    if !cli.regions.is_empty() {
        state.set_selection(FilterColumn::Region, cli.regions.iter().cloned());
    }
    if !cli.product_lines.is_empty() {
        state.set_selection(FilterColumn::ProductLine, cli.product_lines.iter().cloned());
    }
    for region in &cli.exclude_regions {
        state.deselect(FilterColumn::Region, region);
    }
    for product_line in &cli.exclude_product_lines {
        state.deselect(FilterColumn::ProductLine, product_line);
    }
    for region in &state.filters.regions {
        if !state.dataset.regions.contains(region) {
            log::warn!("Region '{region}' does not occur in the dataset");
        }
    }
    for product_line in &state.filters.product_lines {
        if !state.dataset.product_lines.contains(product_line) {
            log::warn!("Product line '{product_line}' does not occur in the dataset");
        }
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Load once for the whole process
    let table = cache::install(&cli.data)
        .and_then(|_| cache::session_table())
        .with_context(|| format!("Failed to load dataset {}", cli.data.display()))?;

    let mut state = DashboardState::new(table);
    apply_selection(&cli, &mut state);

    match &cli.command {
        Commands::Summary { json } => {
            let dashboard = state.dashboard();
            if *json {
                let report = Report::new(&dashboard, &state.filters);
                println!("{}", report.to_json().context("Failed to serialize report")?);
            } else {
                let text = render_text(&dashboard, &state.filters).context("Failed to render tables")?;
                println!("{text}");
            }
        }
        Commands::Values => {
            println!("Regions:");
            for region in &state.dataset.regions {
                println!("  {region}");
            }
            println!("Product lines:");
            for product_line in &state.dataset.product_lines {
                println!("  {product_line}");
            }
        }
        Commands::Export { output } => {
            let filtered = state.filtered();
            export_file(&filtered, output)
                .with_context(|| format!("Failed to export to {}", output.display()))?;
            println!("Wrote {} rows to {}", filtered.len(), output.display());
        }
    }

    Ok(())
}
