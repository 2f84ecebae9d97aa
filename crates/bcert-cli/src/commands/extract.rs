//! Extract command - read the fields of a single certificate.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use bcert_core::models::record::{FieldName, FieldRecord};
use bcert_core::{BatchProcessor, Document, DocumentLoader, VisionClient};

use super::{OcrArgs, PdfArgs, load_config};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (JPEG image or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: RecordFormat,

    /// Also print the recognized text
    #[arg(long)]
    show_text: bool,

    #[command(flatten)]
    ocr: OcrArgs,

    #[command(flatten)]
    pdf: PdfArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum RecordFormat {
    /// One "Label: value" line per field
    Text,
    /// JSON object
    Json,
    /// CSV with a header row
    Csv,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.ocr.apply(&mut config.ocr);
    args.pdf.apply(&mut config.pdf);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let document = Document::from_path(&args.input).ok_or_else(|| {
        anyhow::anyhow!(
            "Unsupported file format: {} (expected .jpg, .jpeg or .pdf)",
            args.input.display()
        )
    })?;

    info!("Processing file: {}", document.path.display());

    let client = VisionClient::from_config(&config.ocr)?;
    let processor = BatchProcessor::new(DocumentLoader::from_config(&config.pdf), client);

    let text = processor.recognize_document(&document).await?;
    let record = bcert_core::extract_fields(&text);

    if args.show_text {
        eprintln!("{}", style("Recognized text:").blue());
        eprintln!("{}", text);
    }

    println!("{}", format_record(&record, args.format)?);

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}

fn format_record(record: &FieldRecord, format: RecordFormat) -> anyhow::Result<String> {
    match format {
        RecordFormat::Text => Ok(FieldName::ALL
            .iter()
            .map(|field| format!("{} {}", field.label(), record.get(*field)))
            .collect::<Vec<_>>()
            .join("\n")),
        RecordFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        RecordFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            wtr.write_record(FieldName::ALL.map(|f| f.column()))?;
            wtr.write_record(record.values())?;
            let data = String::from_utf8(wtr.into_inner()?)?;
            Ok(data.trim_end().to_string())
        }
    }
}
