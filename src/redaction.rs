//! PII detection and redaction.
//!
//! A data-driven table of PII categories, each with a detection pattern and
//! a stable per-category placeholder. Redaction runs before embedding and
//! before any text reaches the vector index, so unredacted sensitive text is
//! never persisted.
//!
//! Pattern-based detection is best-effort: text that does not match a known
//! pattern passes through unredacted.

use regex::Regex;

use crate::error::{RagError, Result};

/// A category of personally identifiable information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PiiCategory {
    /// Email addresses.
    Email,
    /// Phone numbers (US formats).
    Phone,
    /// Government ids (US SSN format).
    GovernmentId,
    /// Payment card numbers.
    PaymentCard,
}

impl PiiCategory {
    /// A short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::GovernmentId => "government_id",
            Self::PaymentCard => "payment_card",
        }
    }

    /// The stable placeholder every match in this category is replaced with.
    ///
    /// Placeholders must not themselves match any detection pattern; that is
    /// what makes redaction idempotent.
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Email => "[EMAIL]",
            Self::Phone => "[PHONE]",
            Self::GovernmentId => "[SSN]",
            Self::PaymentCard => "[CARD]",
        }
    }
}

/// One entry in the redaction table: a category with its compiled pattern.
#[derive(Debug, Clone)]
struct PiiPattern {
    category: PiiCategory,
    pattern: Regex,
}

/// The ordered redaction table. Patterns are applied in declaration order:
/// the narrower digit patterns (SSN) run before the broad card detector.
const PATTERN_TABLE: &[(PiiCategory, &str)] = &[
    (PiiCategory::Email, r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"),
    (PiiCategory::Phone, r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b"),
    (PiiCategory::GovernmentId, r"\b\d{3}-\d{2}-\d{4}\b"),
    // Naive 13-19 digit detector; false positives are possible.
    (PiiCategory::PaymentCard, r"\b(?:\d[ -]*?){13,19}\b"),
];

/// Detects and redacts PII using a data-driven pattern table.
///
/// Construction compiles every pattern once; [`redact`](Redactor::redact)
/// is infallible thereafter. Redaction is idempotent: redacting
/// already-redacted text is a no-op.
#[derive(Debug, Clone)]
pub struct Redactor {
    patterns: Vec<PiiPattern>,
}

impl Redactor {
    /// Compile the redaction table.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Redaction`] if any pattern fails to compile.
    pub fn new() -> Result<Self> {
        let mut patterns = Vec::with_capacity(PATTERN_TABLE.len());
        for (category, source) in PATTERN_TABLE {
            let pattern = Regex::new(source).map_err(|e| {
                RagError::Redaction(format!(
                    "failed to compile {} pattern: {e}",
                    category.label()
                ))
            })?;
            patterns.push(PiiPattern { category: *category, pattern });
        }
        Ok(Self { patterns })
    }

    /// Replace every PII match with its category placeholder.
    pub fn redact(&self, text: &str) -> String {
        let mut out = text.to_string();
        for entry in &self.patterns {
            out = entry.pattern.replace_all(&out, entry.category.placeholder()).into_owned();
        }
        out
    }

    /// Count PII matches per category without modifying the text.
    ///
    /// Returns only categories with at least one match; useful for audit
    /// logging at ingest.
    pub fn detect(&self, text: &str) -> Vec<(PiiCategory, usize)> {
        self.patterns
            .iter()
            .filter_map(|entry| {
                let count = entry.pattern.find_iter(text).count();
                (count > 0).then_some((entry.category, count))
            })
            .collect()
    }
}
