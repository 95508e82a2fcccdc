//! Process command - run one document through the pipeline.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::info;

use docflow_core::{DocumentProcessor, DocumentRecord, StepStatus};

use super::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print the per-step audit trail
    #[arg(long)]
    show_steps: bool,

    /// Report every schema field, zero-filling unmatched ones
    #[arg(long)]
    fill_defaults: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON record
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.fill_defaults {
        config.extraction.fill_defaults = true;
    }

    info!("Processing file: {}", args.input.display());

    let processor = DocumentProcessor::new(&config)?;
    let input = args.input.clone();
    let record = tokio::task::spawn_blocking(move || processor.process(&input)).await?;

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&record)?,
        OutputFormat::Text => format_record_text(&record),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_steps {
        eprintln!();
        eprintln!("{}", style("Pipeline steps:").bold());
        eprint!("{}", format_steps(&record));
    }

    if record.is_error() {
        anyhow::bail!(
            "Processing failed: {}",
            record.error.as_deref().unwrap_or("unknown error")
        );
    }

    eprintln!(
        "{} Processed in {:.2?}",
        style("✓").green(),
        start.elapsed()
    );
    Ok(())
}

fn format_steps(record: &DocumentRecord) -> String {
    let mut output = String::new();
    for step in record.pipeline_steps() {
        match step.status {
            StepStatus::Success => output.push_str(&format!(
                "  {} {:<10} {:.3}s\n",
                style("✓").green(),
                step.step,
                step.duration_seconds.unwrap_or_default()
            )),
            StepStatus::Error => output.push_str(&format!(
                "  {} {:<10} {}\n",
                style("✗").red(),
                step.step,
                step.error.as_deref().unwrap_or("")
            )),
        }
    }
    output
}

fn format_record_text(record: &DocumentRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("File: {}\n", record.file_path().display()));
    output.push_str(&format!("Size: {} bytes\n", record.file_size));
    output.push_str(&format!("Type: {}\n", record.doc_type().unwrap_or("unknown")));
    if let Some(error) = &record.error {
        output.push_str(&format!("Error: {}\n", error));
    }

    let fields = record.extracted_data();
    if !fields.is_empty() {
        output.push('\n');
        output.push_str("Extracted fields:\n");
        for (key, value) in fields {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            output.push_str(&format!("  {}: {}\n", key, rendered));
        }
    }

    output
}
