/// Decides whether a response answers the expected value.
pub trait AccuracyScorer: Send + Sync {
    fn matches(&self, response: &str, expected: &str) -> bool;
}

/// Case- and punctuation-insensitive comparison.
///
/// Both sides are normalized; the response matches when it equals the
/// expected answer or contains it as a whole-word run, so `"The answer is
/// Paris."` matches `"paris"` while `"Parisian"` does not.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedMatch;

impl AccuracyScorer for NormalizedMatch {
    fn matches(&self, response: &str, expected: &str) -> bool {
        let expected = normalize(expected);
        if expected.is_empty() {
            return false;
        }
        let response = normalize(response);
        response == expected || format!(" {response} ").contains(&format!(" {expected} "))
    }
}

/// Lowercases, maps every non-alphanumeric character to a space and collapses
/// runs of whitespace.
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_case_and_punctuation() {
        assert_eq!(normalize("  Hello,   WORLD!! "), "hello world");
        assert_eq!(normalize("4."), "4");
    }

    #[test]
    fn exact_and_contained_answers_match() {
        let scorer = NormalizedMatch;
        assert!(scorer.matches("Paris", "paris"));
        assert!(scorer.matches("The capital of France is Paris.", "Paris"));
        assert!(scorer.matches("2 + 2 = 4", "4"));
        assert!(scorer.matches("It was New York City.", "new york"));
    }

    #[test]
    fn partial_words_do_not_match() {
        let scorer = NormalizedMatch;
        assert!(!scorer.matches("Parisian cafes", "Paris"));
        assert!(!scorer.matches("42", "4"));
        assert!(!scorer.matches("London", "Paris"));
    }

    #[test]
    fn empty_expected_never_matches() {
        assert!(!NormalizedMatch.matches("anything", "?!"));
    }
}
