use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Finds personally identifiable information in a response.
pub trait PiiDetector: Send + Sync {
    /// Spans found in `text`, or `None` when the detector cannot run.
    fn detect(&self, text: &str) -> Option<Vec<PiiSpan>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiKind {
    Email,
    Phone,
    Ssn,
    CreditCard,
    IpAddress,
}

impl fmt::Display for PiiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PiiKind::Email => "email",
            PiiKind::Phone => "phone",
            PiiKind::Ssn => "ssn",
            PiiKind::CreditCard => "credit_card",
            PiiKind::IpAddress => "ip_address",
        };
        f.write_str(label)
    }
}

/// Byte range of a detected entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiiSpan {
    pub kind: PiiKind,
    pub start: usize,
    pub end: usize,
}

const PATTERNS: &[(PiiKind, &str)] = &[
    (
        PiiKind::Email,
        r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b",
    ),
    (PiiKind::Ssn, r"\b\d{3}-\d{2}-\d{4}\b"),
    (PiiKind::CreditCard, r"\b(?:\d[ -]?){12,18}\d\b"),
    (
        PiiKind::Phone,
        r"(?:\+?1[ .-]?)?(?:\(\d{3}\)|\b\d{3})[ .-]\d{3}[ .-]\d{4}\b",
    ),
    (
        PiiKind::IpAddress,
        r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b",
    ),
];

static COMPILED: OnceLock<Vec<(PiiKind, Regex)>> = OnceLock::new();

fn compiled() -> &'static [(PiiKind, Regex)] {
    COMPILED.get_or_init(|| {
        PATTERNS
            .iter()
            .filter_map(|(kind, pattern)| match Regex::new(pattern) {
                Ok(re) => Some((*kind, re)),
                Err(err) => {
                    log::warn!("PII pattern for {kind} failed to compile: {err}");
                    None
                }
            })
            .collect()
    })
}

/// Pattern-based detector for common US-style identifiers.
///
/// Card numbers must pass the Luhn checksum. Spans never overlap: the first
/// pattern to claim a range wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexPiiDetector;

impl PiiDetector for RegexPiiDetector {
    fn detect(&self, text: &str) -> Option<Vec<PiiSpan>> {
        let patterns = compiled();
        if patterns.is_empty() {
            return None;
        }
        let mut spans: Vec<PiiSpan> = Vec::new();
        for (kind, re) in patterns {
            for found in re.find_iter(text) {
                if *kind == PiiKind::CreditCard && !luhn_valid(found.as_str()) {
                    continue;
                }
                let overlaps = spans
                    .iter()
                    .any(|s| found.start() < s.end && s.start < found.end());
                if !overlaps {
                    spans.push(PiiSpan {
                        kind: *kind,
                        start: found.start(),
                        end: found.end(),
                    });
                }
            }
        }
        spans.sort_by_key(|s| s.start);
        Some(spans)
    }
}

fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(idx, &d)| {
            if idx % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<PiiKind> {
        RegexPiiDetector
            .detect(text)
            .unwrap()
            .into_iter()
            .map(|s| s.kind)
            .collect()
    }

    #[test]
    fn clean_text_has_no_spans() {
        assert!(kinds("The capital of France is Paris.").is_empty());
    }

    #[test]
    fn finds_email_and_phone() {
        let text = "Mail jane.doe@example.com or call 555-123-4567.";
        assert_eq!(kinds(text), vec![PiiKind::Email, PiiKind::Phone]);
    }

    #[test]
    fn finds_ssn_and_ip() {
        assert_eq!(kinds("SSN 123-45-6789"), vec![PiiKind::Ssn]);
        assert_eq!(kinds("host 192.168.0.12 is up"), vec![PiiKind::IpAddress]);
        assert!(kinds("version 999.1.1.1").is_empty());
    }

    #[test]
    fn card_numbers_need_valid_checksum() {
        assert_eq!(kinds("card 4111 1111 1111 1111"), vec![PiiKind::CreditCard]);
        assert!(kinds("order 4111 1111 1111 1112").is_empty());
    }

    #[test]
    fn spans_point_into_text() {
        let text = "reach me at a@b.io";
        let spans = RegexPiiDetector.detect(text).unwrap();
        assert_eq!(&text[spans[0].start..spans[0].end], "a@b.io");
    }
}
