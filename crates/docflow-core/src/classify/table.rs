//! Built-in indicator tables for content classification.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A candidate document class with its indicator phrases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentClass {
    /// Label assigned when this class wins.
    pub label: String,
    /// Lowercase indicator phrases.
    pub indicators: Vec<String>,
    /// Score multiplier.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl DocumentClass {
    pub fn new(label: &str, weight: f64, indicators: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            indicators: indicators.iter().map(|s| s.to_lowercase()).collect(),
            weight,
        }
    }
}

/// Indicator matcher compiled from a class definition.
#[derive(Debug, Clone)]
pub(crate) struct CompiledClass {
    pub label: String,
    pub weight: f64,
    pub matchers: Vec<Regex>,
}

impl CompiledClass {
    pub fn compile(class: &DocumentClass) -> Self {
        Self {
            label: class.label.clone(),
            weight: class.weight,
            matchers: class
                .indicators
                .iter()
                .map(|phrase| indicator_regex(phrase))
                .collect(),
        }
    }

    /// `matched / indicators * weight` over already lowercased text.
    pub fn score(&self, lowered: &str) -> f64 {
        if self.matchers.is_empty() {
            return 0.0;
        }
        let matched = self.matchers.iter().filter(|re| re.is_match(lowered)).count();
        matched as f64 / self.matchers.len() as f64 * self.weight
    }
}

/// Whole-word/phrase matcher. A word boundary is required only on an edge
/// where the phrase itself starts or ends with a word character, so
/// "from:" and "et al." still match in running text.
pub(crate) fn indicator_regex(phrase: &str) -> Regex {
    let phrase = phrase.trim().to_lowercase();
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');

    let mut pattern = String::new();
    if is_word(phrase.chars().next()) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(&phrase));
    if is_word(phrase.chars().last()) {
        pattern.push_str(r"\b");
    }

    // An escaped literal is always a valid pattern.
    Regex::new(&pattern).expect("escaped indicator is a valid regex")
}

lazy_static! {
    /// Default candidate classes, in tie-break order.
    pub static ref DEFAULT_CLASSES: Vec<DocumentClass> = vec![
        DocumentClass::new("invoice", 1.0, &[
            "invoice", "bill", "payment due", "amount due", "invoice number", "invoice date",
        ]),
        DocumentClass::new("receipt", 0.9, &[
            "receipt", "transaction", "payment received", "thank you for your purchase", "cashier",
        ]),
        DocumentClass::new("contract", 1.0, &[
            "agreement", "contract", "terms and conditions", "parties", "hereby agree",
        ]),
        DocumentClass::new("letter", 0.8, &[
            "dear", "sincerely", "regards", "to whom it may concern",
        ]),
        DocumentClass::new("report", 1.0, &[
            "report", "analysis", "findings", "executive summary", "conclusion",
        ]),
        DocumentClass::new("form", 1.0, &[
            "form", "please fill", "signature", "date of birth", "applicant",
        ]),
        DocumentClass::new("medical_record", 1.1, &[
            "patient", "diagnosis", "doctor", "treatment", "hospital",
            "medical", "health", "prescription", "symptoms", "medication",
        ]),
        DocumentClass::new("resume", 0.8, &[
            "resume", "cv", "curriculum vitae", "experience", "education",
            "skills", "employment", "job", "career", "professional",
        ]),
        DocumentClass::new("email", 0.9, &[
            "from:", "to:", "subject:", "sent:", "cc:", "bcc:",
            "forwarded", "replied", "original message",
        ]),
        DocumentClass::new("scientific_paper", 1.1, &[
            "abstract", "introduction", "methodology", "results", "references",
            "journal", "doi", "fig.", "et al.",
        ]),
    ];
}
