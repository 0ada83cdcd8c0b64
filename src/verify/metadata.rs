//! Minimal schema check for fetched NFT metadata documents.
//!
//! Only the fields a mint depends on are checked. Unknown fields are ignored.

use crate::config::ImageMatchRule;
use serde_json::Value;

/// Result of validating one metadata document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// Human-readable reasons the document was rejected. Empty when valid.
    pub reasons: Vec<String>,
}

impl ValidationResult {
    /// Returns true if every rule passed.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.reasons.is_empty()
    }

    fn reject(&mut self, reason: impl Into<String>) {
        self.reasons.push(reason.into());
    }
}

/// Validates metadata documents against the required-field schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataValidator {
    image_match: ImageMatchRule,
}

impl MetadataValidator {
    /// Create a validator that compares `image` using the given rule.
    #[must_use]
    pub fn new(image_match: ImageMatchRule) -> Self {
        Self { image_match }
    }

    /// Validate `doc`.
    ///
    /// When `expected_image` is given, `doc.image` must denote the same
    /// resource under the configured [`ImageMatchRule`]. Rejections are
    /// collected, never raised.
    #[must_use]
    pub fn validate(&self, doc: &Value, expected_image: Option<&str>) -> ValidationResult {
        let mut result = ValidationResult::default();

        match doc.get("name") {
            Some(Value::String(name)) if !name.is_empty() => {}
            Some(Value::String(_)) => result.reject("`name` is empty"),
            Some(_) => result.reject("`name` is not a string"),
            None => result.reject("`name` is missing"),
        }

        match doc.get("image") {
            Some(Value::String(image)) => {
                if let Some(expected) = expected_image {
                    if !self.image_match.matches(image, expected) {
                        result.reject(format!(
                            "`image` {image} does not match uploaded image {expected}"
                        ));
                    }
                }
            }
            Some(_) => result.reject("`image` is not a string"),
            None => result.reject("`image` is missing"),
        }

        match doc.get("seller_fee_basis_points") {
            Some(value) if is_numeric(value) => {}
            Some(value) => result.reject(format!(
                "`seller_fee_basis_points` is not numeric: {value}"
            )),
            None => result.reject("`seller_fee_basis_points` is missing"),
        }

        match doc.get("properties").map(|p| p.get("creators")) {
            Some(Some(Value::Array(_))) => {}
            Some(Some(_)) => result.reject("`properties.creators` is not an array"),
            Some(None) => result.reject("`properties.creators` is missing"),
            None => result.reject("`properties` is missing"),
        }

        result
    }
}

/// JSON numbers, or strings holding a finite number.
fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    }
}
