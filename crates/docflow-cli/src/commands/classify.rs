//! Classify command - show how a document or text is classified.

use std::path::PathBuf;

use clap::Args;
use console::style;

use docflow_core::DocumentRecord;
use docflow_core::StepHandler;
use docflow_core::steps::TextStep;

use super::load_config;

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Document to classify
    #[arg(conflicts_with = "text", required_unless_present = "text")]
    input: Option<PathBuf>,

    /// Classify this text instead of a file
    #[arg(long)]
    text: Option<String>,

    /// File type used for the extension fallback (e.g. ".pdf")
    #[arg(long, default_value = "")]
    file_type: String,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: ClassifyArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let classifier = config.classifier();

    let (text, file_type) = match (&args.input, &args.text) {
        (Some(path), _) => {
            if !path.is_file() {
                anyhow::bail!("Input file not found: {}", path.display());
            }
            let mut record = DocumentRecord::new(path);
            // Unsupported types fall back to the extension tier.
            if let Err(e) = TextStep.process(&mut record) {
                eprintln!("{} {}", style("!").yellow(), e);
            }
            let file_type = if args.file_type.is_empty() {
                record.file_type.clone()
            } else {
                args.file_type.clone()
            };
            (record.content().unwrap_or_default().to_string(), file_type)
        }
        (None, Some(text)) => (text.clone(), args.file_type.clone()),
        (None, None) => anyhow::bail!("Provide a file or --text"),
    };

    let result = classifier.classify(&text, &file_type);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Label:      {}", style(&result.label).green().bold());
    println!("Tier:       {:?}", result.tier);
    println!("Confidence: {:.2}", result.confidence);

    if !result.scores.is_empty() {
        println!();
        println!("Scores:");
        for (label, score) in &result.scores {
            let line = format!("  {:<18} {:.3}", label, score);
            if *label == result.label {
                println!("{}", style(line).green());
            } else {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
