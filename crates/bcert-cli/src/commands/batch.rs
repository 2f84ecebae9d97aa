//! Batch processing command for a folder of certificates.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use bcert_core::models::config::BcertConfig;
use bcert_core::{
    BatchMode, BatchOutcome, BatchProcessor, BirthsPerYear, DocumentLoader, FormatFilter,
    ResultTable, VisionClient, discover,
};

use super::{OcrArgs, PdfArgs, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Folder containing the certificates
    #[arg(required = true)]
    folder: PathBuf,

    /// Which documents to process
    #[arg(short = 't', long = "type", value_enum, default_value = "jpg")]
    input_type: InputType,

    /// Abort on the first failing document
    #[arg(long)]
    strict: bool,

    /// Table output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: TableFormat,

    /// Write the table to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the births-per-year chart
    #[arg(long)]
    no_chart: bool,

    /// Also write the chart as a PNG image
    #[arg(long)]
    chart_png: Option<PathBuf>,

    /// Width of the longest chart bar, in characters
    #[arg(long)]
    chart_width: Option<usize>,

    #[command(flatten)]
    ocr: OcrArgs,

    #[command(flatten)]
    pdf: PdfArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum InputType {
    /// JPEG images (*.jpg, *.jpeg)
    Jpg,
    /// PDF documents (*.pdf)
    Pdf,
    /// Both images and PDFs
    All,
}

impl From<InputType> for FormatFilter {
    fn from(input: InputType) -> Self {
        match input {
            InputType::Jpg => FormatFilter::Jpg,
            InputType::Pdf => FormatFilter::Pdf,
            InputType::All => FormatFilter::All,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum TableFormat {
    /// Aligned text table
    Table,
    /// CSV with a header row
    Csv,
    /// JSON array of records
    Json,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.ocr.apply(&mut config.ocr);
    args.pdf.apply(&mut config.pdf);

    let mode = if args.strict || config.batch.strict {
        BatchMode::Strict
    } else {
        BatchMode::Lenient
    };

    let documents = discover(&args.folder, args.input_type.into())?;

    eprintln!(
        "{} Found {} documents to process",
        style("ℹ").blue(),
        documents.len()
    );

    let outcome = if documents.is_empty() {
        BatchOutcome::default()
    } else {
        let client = VisionClient::from_config(&config.ocr)?;
        let processor =
            BatchProcessor::new(DocumentLoader::from_config(&config.pdf), client).with_mode(mode);

        let pb = ProgressBar::new(documents.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents")?
                .progress_chars("=>-"),
        );

        let result = processor
            .run_documents(&documents, |_, _| pb.inc(1))
            .await;
        pb.finish_and_clear();
        result?
    };

    let table = format_table(&outcome.table, args.format)?;
    match &args.output {
        Some(path) => {
            fs::write(path, &table)?;
            eprintln!(
                "{} Table written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => print!("{}", table),
    }

    print_summary(&outcome, start);

    if !args.no_chart {
        render_chart(&outcome.table, &args, &config)?;
    }

    Ok(())
}

fn format_table(table: &ResultTable, format: TableFormat) -> anyhow::Result<String> {
    match format {
        TableFormat::Table => Ok(table.render_text()),
        TableFormat::Csv => {
            let mut out = Vec::new();
            table.write_csv(&mut out)?;
            Ok(String::from_utf8(out)?)
        }
        TableFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(table)?)),
    }
}

fn print_summary(outcome: &BatchOutcome, start: Instant) {
    eprintln!();
    eprintln!(
        "{} Processed {} documents in {:?}",
        style("✓").green(),
        outcome.table.len() + outcome.failures.len(),
        start.elapsed()
    );

    if !outcome.failures.is_empty() {
        eprintln!(
            "   {} successful, {} failed",
            style(outcome.table.len()).green(),
            style(outcome.failures.len()).red()
        );
        eprintln!();
        eprintln!("{}", style("Failed documents:").red());
        for failure in &outcome.failures {
            eprintln!("  - {}: {}", failure.path.display(), failure.error);
        }
    }
}

fn render_chart(table: &ResultTable, args: &BatchArgs, config: &BcertConfig) -> anyhow::Result<()> {
    let chart = BirthsPerYear::from_table(table)?;

    println!();
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

    debug!("Chart covers {} years", chart.counts().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcert_core::FieldRecord;

    #[test]
    fn test_csv_table_format() {
        let table: ResultTable = vec![FieldRecord {
            name: "Jane Doe".to_string(),
            date_of_birth: "1990-05-01".to_string(),
            place_of_birth: "Springfield".to_string(),
        }]
        .into_iter()
        .collect();

        assert_eq!(
            format_table(&table, TableFormat::Csv).unwrap(),
            "Name,Date of Birth,Place of Birth\nJane Doe,1990-05-01,Springfield\n"
        );
    }

    #[test]
    fn test_json_table_format_is_array_of_records() {
        let table = ResultTable::new();
        assert_eq!(format_table(&table, TableFormat::Json).unwrap(), "[]\n");
    }
}
