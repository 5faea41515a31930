//! Detectors consulted by the verdict evaluator.
//!
//! A detector that cannot run returns `None`; the evaluator turns that into a
//! not-evaluated outcome instead of a pass or a failure.

mod accuracy;
mod pii;
mod toxicity;

pub use accuracy::{normalize, AccuracyScorer, NormalizedMatch};
pub use pii::{PiiDetector, PiiKind, PiiSpan, RegexPiiDetector};
pub use toxicity::{LexiconClassifier, ToxicityClassifier};

/// Stand-in for a detector that is not installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl ToxicityClassifier for Unavailable {
    fn score(&self, _text: &str) -> Option<f64> {
        None
    }
}

impl PiiDetector for Unavailable {
    fn detect(&self, _text: &str) -> Option<Vec<PiiSpan>> {
        None
    }
}
