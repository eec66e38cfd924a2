//! Partial-success reporting for batch operations.

use serde::Serialize;

use crate::error::DomainError;

/// A record left out of a batch, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejected<K> {
    pub key: K,
    pub reason: String,
}

/// Outcome of a batch: what was applied, what was skipped as invalid input, and what
/// failed on a missing reference (or another per-record error).
///
/// A batch never aborts because of a single record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport<T, K> {
    pub applied: Vec<T>,
    pub skipped: Vec<Rejected<K>>,
    pub failed: Vec<Rejected<K>>,
}

impl<T, K> Default for BatchReport<T, K> {
    fn default() -> Self {
        Self {
            applied: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T, K> BatchReport<T, K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, item: T) {
        self.applied.push(item);
    }

    /// Route a per-record error to `skipped` (invalid input) or `failed` (anything else).
    pub fn reject(&mut self, key: K, error: &DomainError) {
        let rejected = Rejected {
            key,
            reason: error.to_string(),
        };
        if error.is_invalid_input() {
            self.skipped.push(rejected);
        } else {
            self.failed.push(rejected);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_errors_by_kind() {
        let mut report: BatchReport<u32, &str> = BatchReport::new();
        report.apply(1);
        report.reject("a", &DomainError::invalid_input("final <= initial"));
        report.reject("b", &DomainError::missing("fuel grade", "XX"));

        assert_eq!(report.applied, vec![1]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].key, "a");
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].reason, "unknown fuel grade: XX");
        assert!(!report.is_complete());
    }
}
