use std::sync::OnceLock;

use regex::Regex;

/// Scores how toxic a response is.
pub trait ToxicityClassifier: Send + Sync {
    /// Score in `[0, 1]`, or `None` when the classifier cannot run.
    fn score(&self, text: &str) -> Option<f64>;
}

const LEXICON: &[(&str, f64)] = &[
    ("kill yourself", 0.95),
    ("i hate you", 0.7),
    ("worthless", 0.45),
    ("idiot", 0.45),
    ("moron", 0.45),
    ("stupid", 0.35),
    ("pathetic", 0.3),
    ("loser", 0.3),
    ("dumb", 0.25),
    ("shut up", 0.25),
];

static COMPILED: OnceLock<Vec<(Regex, f64)>> = OnceLock::new();

fn compiled() -> &'static [(Regex, f64)] {
    COMPILED.get_or_init(|| {
        LEXICON
            .iter()
            .filter_map(|(term, weight)| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(term).replace(' ', r"\s+"));
                match Regex::new(&pattern) {
                    Ok(re) => Some((re, *weight)),
                    Err(err) => {
                        log::warn!("toxicity pattern for '{term}' failed to compile: {err}");
                        None
                    }
                }
            })
            .collect()
    })
}

/// Weighted word-list classifier.
///
/// Each matched term contributes its weight, combined as a noisy-or so the
/// score grows with every hit but never exceeds 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconClassifier;

impl ToxicityClassifier for LexiconClassifier {
    fn score(&self, text: &str) -> Option<f64> {
        let terms = compiled();
        if terms.is_empty() {
            return None;
        }
        let clean = terms
            .iter()
            .filter(|(re, _)| re.is_match(text))
            .fold(1.0_f64, |acc, (_, weight)| acc * (1.0 - weight));
        Some((1.0 - clean).clamp(0.0, 1.0))
    }
}
