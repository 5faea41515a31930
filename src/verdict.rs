//! Verdicts: applying a [`Policy`] to one generated response.
//!
//! Evaluation happens in two steps. [`Evaluator::measure`] runs the detectors
//! a policy asks for and collects raw [`Measurements`]; [`judge`] is a pure
//! function turning those measurements into a [`Verdict`].
//!
//! Latency, toxicity and PII are *gating* rules: a failure sets `blocked`.
//! Accuracy is measured and reported but never blocks a response on its own.

use serde::{Deserialize, Serialize};

use crate::backend::GenerationResult;
use crate::detect::{
    AccuracyScorer, LexiconClassifier, NormalizedMatch, PiiDetector, PiiSpan, RegexPiiDetector,
    ToxicityClassifier,
};
use crate::policy::Policy;
use crate::record::Violation;

/// Result of a single rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOutcome {
    Passed,
    Failed,
    /// Rule disabled, or its detector unavailable
    NotEvaluated,
}

impl RuleOutcome {
    fn from_failed(failed: bool) -> Self {
        if failed {
            RuleOutcome::Failed
        } else {
            RuleOutcome::Passed
        }
    }

    /// `Some(true)` when passed, `Some(false)` when failed.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            RuleOutcome::Passed => Some(true),
            RuleOutcome::Failed => Some(false),
            RuleOutcome::NotEvaluated => None,
        }
    }

    /// `Some(true)` when failed, `Some(false)` when passed.
    pub fn as_failed(self) -> Option<bool> {
        self.as_bool().map(|passed| !passed)
    }

    pub fn is_failed(self) -> bool {
        self == RuleOutcome::Failed
    }
}

/// Raw detector output for one response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measurements {
    pub latency_ms: f64,
    /// `None` when no expected answer was compared
    pub accuracy: Option<bool>,
    /// `None` when the classifier did not run
    pub toxicity: Option<f64>,
    /// `None` when the detector did not run
    pub pii_spans: Option<Vec<PiiSpan>>,
}

/// Per-rule outcomes plus the overall blocked decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub latency: RuleOutcome,
    pub accuracy: RuleOutcome,
    pub toxicity: RuleOutcome,
    pub pii: RuleOutcome,
    pub latency_ms: f64,
    pub toxicity_score: Option<f64>,
    pub pii_spans: Vec<PiiSpan>,
    pub blocked: bool,
}

impl Verdict {
    /// Gating rules that failed, in a fixed order.
    pub fn violations(&self) -> Vec<Violation> {
        [
            (self.latency, Violation::Latency),
            (self.toxicity, Violation::Toxicity),
            (self.pii, Violation::Pii),
        ]
        .into_iter()
        .filter(|(outcome, _)| outcome.is_failed())
        .map(|(_, violation)| violation)
        .collect()
    }
}

/// Applies `policy` to already collected measurements.
///
/// Disabled rules are `NotEvaluated` whatever was measured, so turning a rule
/// off can only ever remove failures.
pub fn judge(policy: &Policy, m: &Measurements) -> Verdict {
    let latency = RuleOutcome::from_failed(m.latency_ms > policy.max_latency_ms as f64);

    let accuracy = match (policy.require_accuracy, m.accuracy) {
        (true, Some(matched)) => RuleOutcome::from_failed(!matched),
        _ => RuleOutcome::NotEvaluated,
    };

    let toxicity_score = m.toxicity.filter(|_| policy.enable_toxicity);
    let toxicity = match toxicity_score {
        Some(score) => RuleOutcome::from_failed(score > policy.toxicity_threshold),
        None => RuleOutcome::NotEvaluated,
    };

    let pii_spans = m.pii_spans.as_ref().filter(|_| policy.enable_pii);
    let pii = match pii_spans {
        Some(spans) => RuleOutcome::from_failed(!spans.is_empty()),
        None => RuleOutcome::NotEvaluated,
    };

    let blocked = latency.is_failed() || toxicity.is_failed() || pii.is_failed();

    Verdict {
        latency,
        accuracy,
        toxicity,
        pii,
        latency_ms: m.latency_ms,
        toxicity_score,
        pii_spans: pii_spans.cloned().unwrap_or_default(),
        blocked,
    }
}

/// Runs the detectors a policy enables and judges the response.
pub struct Evaluator {
    accuracy: Box<dyn AccuracyScorer>,
    toxicity: Box<dyn ToxicityClassifier>,
    pii: Box<dyn PiiDetector>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            accuracy: Box::new(NormalizedMatch),
            toxicity: Box::new(LexiconClassifier),
            pii: Box::new(RegexPiiDetector),
        }
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accuracy_scorer(mut self, scorer: impl AccuracyScorer + 'static) -> Self {
        self.accuracy = Box::new(scorer);
        self
    }

    pub fn toxicity_classifier(mut self, classifier: impl ToxicityClassifier + 'static) -> Self {
        self.toxicity = Box::new(classifier);
        self
    }

    pub fn pii_detector(mut self, detector: impl PiiDetector + 'static) -> Self {
        self.pii = Box::new(detector);
        self
    }

    /// Collects measurements, skipping detectors for disabled rules.
    pub fn measure(
        &self,
        response: &GenerationResult,
        expected: Option<&str>,
        policy: &Policy,
    ) -> Measurements {
        let accuracy = expected
            .filter(|_| policy.require_accuracy)
            .map(|expected| self.accuracy.matches(&response.text, expected));
        let toxicity = if policy.enable_toxicity {
            self.toxicity
                .score(&response.text)
                .filter(|score| score.is_finite())
                .map(|score| score.clamp(0.0, 1.0))
        } else {
            None
        };
        let pii_spans = if policy.enable_pii {
            self.pii.detect(&response.text)
        } else {
            None
        };
        Measurements {
            latency_ms: response.latency_ms,
            accuracy,
            toxicity,
            pii_spans,
        }
    }

    pub fn evaluate(
        &self,
        response: &GenerationResult,
        expected: Option<&str>,
        policy: &Policy,
    ) -> Verdict {
        judge(policy, &self.measure(response, expected, policy))
    }
}
