//! Two-tier document classification.
//!
//! The file extension always yields a coarse fallback label. When text is
//! available, each candidate class is scored by the fraction of its
//! indicator phrases present in the text times its weight; the strictly
//! highest score wins and ties go to the class declared first.

mod table;

pub use table::{DEFAULT_CLASSES, DocumentClass};

use serde::Serialize;

use table::CompiledClass;

/// Which tier produced the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationTier {
    Extension,
    Content,
}

/// Outcome of classifying one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub label: String,
    pub tier: ClassificationTier,
    /// Winning score capped at 1.0; 0.0 for the extension tier.
    pub confidence: f64,
    /// Per-class scores in declaration order; empty without text.
    pub scores: Vec<(String, f64)>,
}

/// Label derived from the file extension alone.
pub fn classify_by_extension(file_type: &str) -> &'static str {
    match file_type.to_lowercase().as_str() {
        ".pdf" => "pdf_document",
        ".jpg" | ".jpeg" | ".png" | ".tiff" | ".tif" | ".bmp" | ".gif" => "image_document",
        ".doc" | ".docx" => "word_document",
        ".xls" | ".xlsx" | ".csv" => "spreadsheet",
        _ => "unknown_document",
    }
}

/// Stateless classifier over a fixed class table.
#[derive(Debug, Clone)]
pub struct Classifier {
    classes: Vec<CompiledClass>,
}

impl Classifier {
    /// Classifier over the built-in table.
    pub fn new() -> Self {
        Self::with_classes(&DEFAULT_CLASSES)
    }

    /// Classifier over a custom table. Order decides ties.
    pub fn with_classes(classes: &[DocumentClass]) -> Self {
        Self {
            classes: classes.iter().map(CompiledClass::compile).collect(),
        }
    }

    /// Score every class against `text`, in declaration order.
    pub fn score(&self, text: &str) -> Vec<(String, f64)> {
        let lowered = text.to_lowercase();
        self.classes
            .iter()
            .map(|class| (class.label.clone(), class.score(&lowered)))
            .collect()
    }

    /// Classify text with the extension label as fallback.
    pub fn classify(&self, text: &str, file_type: &str) -> Classification {
        let fallback = Classification {
            label: classify_by_extension(file_type).to_string(),
            tier: ClassificationTier::Extension,
            confidence: 0.0,
            scores: Vec::new(),
        };

        if text.trim().is_empty() {
            return fallback;
        }

        let scores = self.score(text);
        match best(&scores) {
            Some((label, score)) => Classification {
                label: label.to_string(),
                tier: ClassificationTier::Content,
                confidence: score.min(1.0),
                scores,
            },
            None => Classification { scores, ..fallback },
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Strictly highest positive score; the first one wins a tie.
fn best(scores: &[(String, f64)]) -> Option<(&str, f64)> {
    let mut winner: Option<(&str, f64)> = None;
    for (label, score) in scores {
        let beats = match winner {
            Some((_, top)) => *score > top,
            None => *score > 0.0,
        };
        if beats {
            winner = Some((label.as_str(), *score));
        }
    }
    winner
}

/// Classify with the built-in table and return the label.
pub fn classify(text: &str, file_type: &str) -> String {
    Classifier::new().classify(text, file_type).label
}
