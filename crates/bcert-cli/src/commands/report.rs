//! Report command - chart births per year from a saved table.

use std::fs::File;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use bcert_core::{BirthsPerYear, ResultTable};

use super::load_config;

/// Arguments for the report command.
#[derive(Args)]
pub struct ReportArgs {
    /// CSV table written by `bcert batch --format csv`
    #[arg(required = true)]
    input: PathBuf,

    /// Also write the chart as a PNG image
    #[arg(long)]
    chart_png: Option<PathBuf>,

    /// Width of the longest chart bar, in characters
    #[arg(long)]
    chart_width: Option<usize>,
}

pub fn run(args: ReportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let table = ResultTable::read_csv(File::open(&args.input)?)?;
    info!("Loaded {} rows from {}", table.len(), args.input.display());

    let chart = BirthsPerYear::from_table(&table)?;
    let width = args.chart_width.unwrap_or(config.report.chart_width);
    print!("{}", chart.render_text(width));

    if let Some(path) = &args.chart_png {
        chart.render_png(path, config.report.png_width, config.report.png_height)?;
        eprintln!(
            "{} Chart written to {}",
            style("✓").green(),
            path.display()
        );
    }

    Ok(())
}
