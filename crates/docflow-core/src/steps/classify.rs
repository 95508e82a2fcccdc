//! Classification step.

use tracing::{debug, info};

use crate::classify::Classifier;
use crate::error::StepError;
use crate::pipeline::StepHandler;
use crate::record::DocumentRecord;

/// Sets `doc_type` and records the classification in `metadata`.
#[derive(Debug, Clone, Default)]
pub struct ClassifyStep {
    classifier: Classifier,
}

impl ClassifyStep {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }
}

impl StepHandler for ClassifyStep {
    fn process(&self, record: &mut DocumentRecord) -> Result<(), StepError> {
        let result = self
            .classifier
            .classify(record.content().unwrap_or_default(), &record.file_type);

        debug!("Classification scores: {:?}", result.scores);
        info!(
            "Classified {} as {} ({:?}, confidence {:.2})",
            record.file_path().display(),
            result.label,
            result.tier,
            result.confidence
        );

        record
            .metadata
            .insert("classification".to_string(), serde_json::to_value(&result)?);
        record.set_doc_type(result.label);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_sets_doc_type_and_metadata() {
        let mut record = DocumentRecord::new("letter.txt");
        record.set_content("Dear Sir, to whom it may concern. Regards");

        ClassifyStep::default().process(&mut record).unwrap();

        assert_eq!(record.doc_type(), Some("letter"));
        let meta = &record.metadata["classification"];
        assert_eq!(meta["tier"], json!("content"));
        assert_eq!(meta["label"], json!("letter"));
        assert_eq!(meta["scores"].as_array().unwrap().len(), 10);
    }

    #[test]
    fn test_without_content_uses_extension() {
        let mut record = DocumentRecord::new("scan.png");
        ClassifyStep::default().process(&mut record).unwrap();

        assert_eq!(record.doc_type(), Some("image_document"));
        assert_eq!(record.metadata["classification"]["confidence"], json!(0.0));
    }
}
