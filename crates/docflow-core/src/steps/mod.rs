//! Built-in pipeline steps.

mod classify;
mod extract;
mod inspect;
mod store;
mod text;

pub use classify::ClassifyStep;
pub use extract::ExtractStep;
pub use inspect::InspectStep;
pub use store::JsonStore;
pub use text::{PdfText, TextStep, extract_pdf_text};

use crate::config::DocflowConfig;
use crate::error::Result;
use crate::pipeline::{Pipeline, Step};

pub const INSPECT: &str = "inspect";
pub const TEXT: &str = "text";
pub const CLASSIFY: &str = "classify";
pub const EXTRACT: &str = "extract";
pub const STORE: &str = "store";

/// The standard pipeline: inspect, text, classify, extract, store.
///
/// `inspect` and `store` are critical. The text step gets the configured
/// timeout.
pub fn default_pipeline(config: &DocflowConfig) -> Result<Pipeline> {
    let mut extract = ExtractStep::new(config.schema_registry()?)
        .fill_defaults(config.extraction.fill_defaults);
    if let Some(fallback) = &config.extraction.fallback_schema {
        extract = extract.with_fallback(fallback.clone());
    }

    let mut text = Step::new(TEXT, TextStep);
    if let Some(timeout) = config.step_timeout() {
        text = text.with_timeout(timeout);
    }

    let pipeline = Pipeline::builder()
        .step(Step::new(INSPECT, InspectStep).critical())
        .step(text)
        .step(Step::new(CLASSIFY, ClassifyStep::new(config.classifier())))
        .step(Step::new(EXTRACT, extract))
        .step(
            Step::new(
                STORE,
                JsonStore::new(&config.storage.processed_dir, &config.storage.failed_dir),
            )
            .critical(),
        )
        .build()?;
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DocumentRecord, StepStatus};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn config_in(dir: &std::path::Path) -> DocflowConfig {
        let mut config = DocflowConfig::default();
        config.storage.processed_dir = dir.join("processed");
        config.storage.failed_dir = dir.join("failed");
        config
    }

    #[test]
    fn test_default_pipeline_order() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = default_pipeline(&config_in(dir.path())).unwrap();
        let names: Vec<_> = pipeline.steps().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec![INSPECT, TEXT, CLASSIFY, EXTRACT, STORE]);
        assert!(pipeline.steps()[0].is_critical());
        assert!(!pipeline.steps()[1].is_critical());
        assert!(pipeline.steps()[4].is_critical());
    }

    #[test]
    fn test_text_invoice_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("inv.txt");
        std::fs::write(
            &input,
            "Invoice # INV-77\nInvoice Date: 2024-05-01\nAmount Due: $310.00\nPlease pay this bill.\n",
        )
        .unwrap();

        let pipeline = default_pipeline(&config_in(dir.path())).unwrap();
        let record = pipeline.run(&DocumentRecord::new(&input)).unwrap();

        assert_eq!(record.doc_type(), Some("invoice"));
        assert_eq!(record.extracted_data()["invoice_number"], json!("INV-77"));
        assert_eq!(record.extracted_data()["total"], json!(310.0));
        assert_eq!(record.pipeline_steps().len(), 5);
        assert!(record.pipeline_steps().iter().all(|s| s.is_success()));
        assert!(dir.path().join("processed").join("inv_result.json").exists());
    }

    #[test]
    fn test_image_without_ocr_still_stored() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photo.png");
        image::ImageBuffer::from_pixel(4, 4, image::Rgb([0u8, 0, 0]))
            .save(&input)
            .unwrap();

        let pipeline = default_pipeline(&config_in(dir.path())).unwrap();
        let record = pipeline.run(&DocumentRecord::new(&input)).unwrap();

        let statuses: Vec<_> = record.pipeline_steps().iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![
                StepStatus::Success,
                StepStatus::Error,
                StepStatus::Success,
                StepStatus::Success,
                StepStatus::Success,
            ]
        );
        assert_eq!(record.doc_type(), Some("image_document"));
        assert!(record.extracted_data().is_empty());
    }

    #[test]
    fn test_missing_file_aborts_at_inspect() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = default_pipeline(&config_in(dir.path())).unwrap();

        let err = pipeline
            .run(&DocumentRecord::new(dir.path().join("gone.pdf")))
            .unwrap_err();
        let partial = err.record().unwrap();
        assert_eq!(partial.pipeline_steps().len(), 1);
        assert_eq!(partial.pipeline_steps()[0].step, INSPECT);
    }
}
