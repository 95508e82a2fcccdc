//! File inspection step.

use serde_json::json;
use tracing::debug;

use crate::error::StepError;
use crate::pipeline::StepHandler;
use crate::record::{DocumentRecord, file_type_of};

const IMAGE_TYPES: &[&str] = &[".jpg", ".jpeg", ".png", ".tiff", ".tif", ".bmp", ".gif"];

/// Fills `file_size` and `file_type`, and image dimensions for raster files.
#[derive(Debug, Clone, Copy, Default)]
pub struct InspectStep;

impl StepHandler for InspectStep {
    fn process(&self, record: &mut DocumentRecord) -> Result<(), StepError> {
        let path = record.file_path().to_path_buf();
        let meta = std::fs::metadata(&path)?;
        if !meta.is_file() {
            return Err(StepError::MissingInput(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        record.file_size = meta.len();
        record.file_type = file_type_of(&path);

        if is_image(&record.file_type) {
            let (width, height) = image::image_dimensions(&path)?;
            debug!("Image {}x{}", width, height);
            record
                .metadata
                .insert("image".to_string(), json!({"width": width, "height": height}));
        }

        debug!(
            "Inspected {}: {} bytes, type {:?}",
            path.display(),
            record.file_size,
            record.file_type
        );
        Ok(())
    }
}

pub(crate) fn is_image(file_type: &str) -> bool {
    IMAGE_TYPES.contains(&file_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inspect_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Notes.TXT");
        std::fs::write(&path, "hello").unwrap();

        let mut record = DocumentRecord::new(&path);
        InspectStep.process(&mut record).unwrap();

        assert_eq!(record.file_size, 5);
        assert_eq!(record.file_type, ".txt");
        assert!(!record.metadata.contains_key("image"));
    }

    #[test]
    fn test_inspect_image_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        ImageBuffer::from_pixel(12, 7, Rgb([255u8, 255, 255]))
            .save(&path)
            .unwrap();

        let mut record = DocumentRecord::new(&path);
        InspectStep.process(&mut record).unwrap();

        assert_eq!(record.metadata["image"], json!({"width": 12, "height": 7}));
    }

    #[test]
    fn test_missing_file() {
        let mut record = DocumentRecord::new("/no/such/file.pdf");
        let err = InspectStep.process(&mut record).unwrap_err();
        assert!(matches!(err, StepError::Io(_)));
    }

    #[test]
    fn test_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = DocumentRecord::new(dir.path());
        let err = InspectStep.process(&mut record).unwrap_err();
        assert!(matches!(err, StepError::MissingInput(_)));
    }
}
