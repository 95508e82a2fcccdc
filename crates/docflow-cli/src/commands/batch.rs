//! Batch processing command for many documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use docflow_core::record::file_type_of;
use docflow_core::{CancellationToken, DocumentProcessor, DocumentRecord, PipelineMetrics};

use super::load_config;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input files
    #[arg(required = true)]
    input: String,

    /// Output directory for results, summary and metrics
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Only process these file types (e.g. ".pdf,.txt")
    #[arg(long, value_delimiter = ',')]
    types: Vec<String>,

    /// Also write a summary CSV
    #[arg(long)]
    summary: bool,

    /// Print pipeline metrics when done
    #[arg(long)]
    metrics: bool,

    /// Number of parallel workers (default: pipeline.workers)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)?;
        config.storage.processed_dir = dir.join("processed");
        config.storage.failed_dir = dir.join("failed");
    }

    let jobs = args.jobs.unwrap_or(config.pipeline.workers);
    if jobs == 0 {
        anyhow::bail!("--jobs must be at least 1");
    }

    let types = normalize_types(&args.types);
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .filter(|p| types.is_empty() || types.contains(&file_type_of(p)))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process with {} workers",
        style("ℹ").blue(),
        files.len(),
        jobs
    );

    let processor = Arc::new(DocumentProcessor::new(&config)?);
    let semaphore = Arc::new(Semaphore::new(jobs));
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing in-flight documents");
                cancel.cancel();
            }
        });
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut handles = Vec::with_capacity(files.len());
    for path in files {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let processor = Arc::clone(&processor);
        let cancel = cancel.clone();
        let progress = progress.clone();

        let task_path = path.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let record = processor.process_with(&task_path, &cancel);
            progress.inc(1);
            drop(permit);
            record
        });
        handles.push((path, handle));
    }

    let mut records = Vec::with_capacity(handles.len());
    for (path, handle) in handles {
        let record = match handle.await {
            Ok(record) => record,
            Err(e) => {
                warn!("Worker for {} failed: {}", path.display(), e);
                progress.inc(1);
                failed_record(&path, &e.to_string())
            }
        };
        records.push(record);
    }
    progress.finish_and_clear();

    let failed: Vec<&DocumentRecord> = records.iter().filter(|r| r.is_error()).collect();

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));
        write_summary(&summary_path, &records)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    if args.metrics {
        let metrics = processor.metrics();
        print_metrics(&metrics);
        if let Some(dir) = &args.output_dir {
            let metrics_path = dir.join("metrics.json");
            fs::write(&metrics_path, serde_json::to_string_pretty(&metrics)?)?;
            debug!("Wrote metrics to {}", metrics_path.display());
        }
    }

    println!(
        "{} Processed {} files in {:.2?}",
        style("✓").green(),
        records.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(records.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for record in &failed {
            println!(
                "  - {}: {}",
                record.file_path().display(),
                record.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    if cancel.is_cancelled() {
        anyhow::bail!("Batch interrupted");
    }
    Ok(())
}

/// Error record for a file whose worker died before producing one.
fn failed_record(path: &Path, message: &str) -> DocumentRecord {
    let mut record = DocumentRecord::new(path);
    record.mark_error(format!("worker failed: {message}"));
    record
}

/// Lowercase, dot-prefixed file types.
fn normalize_types(types: &[String]) -> Vec<String> {
    types
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .map(|t| if t.starts_with('.') { t } else { format!(".{t}") })
        .collect()
}

fn write_summary(path: &Path, records: &[DocumentRecord]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["file", "status", "doc_type", "steps", "error"])?;

    for record in records {
        let status = if record.is_error() { "error" } else { "processed" };
        let steps = record
            .pipeline_steps()
            .iter()
            .map(|s| format!("{}:{}", s.step, if s.is_success() { "ok" } else { "error" }))
            .collect::<Vec<_>>()
            .join(" ");

        wtr.write_record([
            record.file_path().display().to_string().as_str(),
            status,
            record.doc_type().unwrap_or(""),
            steps.as_str(),
            record.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn print_metrics(metrics: &PipelineMetrics) {
    println!();
    println!("{}", style("Pipeline metrics:").bold());
    println!(
        "  {:<10} {:>6} {:>6} {:>6} {:>8} {:>10}",
        "step", "runs", "ok", "errors", "rate", "avg (s)"
    );
    for m in metrics.iter() {
        println!(
            "  {:<10} {:>6} {:>6} {:>6} {:>7.1}% {:>10.4}",
            m.name,
            m.total_runs,
            m.success_count,
            m.error_count,
            m.success_rate * 100.0,
            m.average_success_duration
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_record_marks_error() {
        let record = failed_record(Path::new("inbox/x.pdf"), "task panicked");
        assert!(record.is_error());
        assert_eq!(record.error.as_deref(), Some("worker failed: task panicked"));
        assert_eq!(record.file_path(), Path::new("inbox/x.pdf"));
    }

    #[tokio::test]
    async fn test_join_error_becomes_failed_record() {
        let handle = tokio::task::spawn_blocking(|| -> DocumentRecord { panic!("worker died") });
        let err = handle.await.unwrap_err();
        let record = failed_record(Path::new("x.txt"), &err.to_string());
        assert!(record.is_error());
        assert!(record.error.unwrap().contains("worker failed"));
    }

    #[test]
    fn test_normalize_types() {
        let types = vec!["PDF".to_string(), ".txt".to_string(), " ".to_string()];
        assert_eq!(normalize_types(&types), vec![".pdf", ".txt"]);
    }
}
