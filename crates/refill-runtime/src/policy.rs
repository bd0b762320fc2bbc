//! Refill decision policy.
//!
//! A refill is required when the classifier reports the `"empty"` class with
//! a confidence strictly above the configured threshold.
//!
//! # Example
//!
//! ```rust
//! use refill_runtime::policy::decide;
//! use refill_types::Classification;
//!
//! assert!(decide(&[Classification::new("empty", 0.8)], 0.55));
//! assert!(!decide(&[Classification::new("empty", 0.55)], 0.55));
//! assert!(!decide(&[], 0.55));
//! ```

use refill_types::Classification;

/// Return `true` iff any entry is labelled `"empty"` with
/// `confidence > threshold`.
///
/// Entries are examined in input order and evaluation stops at the first
/// match.  An empty slice yields `false`.
pub fn decide(classifications: &[Classification], threshold: f64) -> bool {
    classifications
        .iter()
        .any(|c| c.is_empty_label() && c.confidence > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(label: &str, confidence: f64) -> Classification {
        Classification::new(label, confidence)
    }

    #[test]
    fn no_empty_label_never_refills() {
        let results = [c("full", 0.99), c("half", 0.9), c("unknown", 1.0)];
        for threshold in [0.0, 0.3, 0.55, 0.99] {
            assert!(!decide(&results, threshold));
        }
    }

    #[test]
    fn confidence_equal_to_threshold_does_not_refill() {
        assert!(!decide(&[c("empty", 0.55)], 0.55));
        assert!(!decide(&[c("empty", 0.0)], 0.0));
        assert!(!decide(&[c("empty", 1.0)], 1.0));
    }

    #[test]
    fn confidence_above_threshold_refills() {
        assert!(decide(&[c("empty", 0.80)], 0.55));
        assert!(decide(&[c("empty", 0.56)], 0.55));
    }

    #[test]
    fn qualifying_entry_wins_regardless_of_position() {
        let threshold = 0.5;
        assert!(decide(&[c("empty", 0.9), c("full", 0.95)], threshold));
        assert!(decide(&[c("full", 0.95), c("empty", 0.9)], threshold));
        assert!(decide(&[c("empty", 0.1), c("full", 0.2), c("empty", 0.6)], threshold));
    }

    #[test]
    fn below_threshold_empty_does_not_refill() {
        assert!(!decide(&[c("empty", 0.50)], 0.55));
    }

    #[test]
    fn empty_input_never_refills() {
        for threshold in [0.0, 0.55, 1.0] {
            assert!(!decide(&[], threshold));
        }
    }
}
