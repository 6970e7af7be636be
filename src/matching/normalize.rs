//! Name normalization for comparison.
//!
//! All name comparisons in the rule engine go through `normalize`: NFKC
//! fold, lowercase, punctuation replaced by spaces, whitespace collapsed.

use unicode_normalization::UnicodeNormalization;

/// Normalizes a personal name for comparison.
pub fn normalize(name: &str) -> String {
    let folded: String = name.nfkc().collect();

    let stripped: String = folded
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace tokens of the normalized form.
pub fn tokens(name: &str) -> Vec<String> {
    normalize(name)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Whether two names are equal after normalization.
pub fn eq_normalized(a: &str, b: &str) -> bool {
    let a = normalize(a);
    !a.is_empty() && a == normalize(b)
}

/// Whether `haystack` equals `needle` or carries it as a token
/// (maiden-name containment check).
pub fn equals_or_contains(haystack: &str, needle: &str) -> bool {
    let needle = normalize(needle);
    if needle.is_empty() {
        return false;
    }
    let haystack = normalize(haystack);
    haystack == needle || haystack.split_whitespace().any(|t| t == needle)
}

/// Parses free-text spouse input into (first name, optional family name).
///
/// With two or more tokens the last token is the family name and the rest
/// is the first name; a single token is a first name only.
pub fn split_full_name(input: &str) -> Option<(String, Option<String>)> {
    let tokens = tokens(input);
    match tokens.len() {
        0 => None,
        1 => Some((tokens[0].clone(), None)),
        n => Some((tokens[..n - 1].join(" "), Some(tokens[n - 1].clone()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_case_and_punctuation() {
        assert_eq!(normalize("  Dela-Cruz,  JR. "), "dela cruz jr");
        assert_eq!(normalize("María"), "maría");
    }

    #[test]
    fn test_normalize_nfkc() {
        // Fullwidth latin folds to ASCII under NFKC.
        assert_eq!(normalize("Ｓａｎｔｏｓ"), "santos");
    }

    #[test]
    fn test_eq_normalized_rejects_empty() {
        assert!(eq_normalized("Cruz", "cruz"));
        assert!(!eq_normalized("", ""));
        assert!(!eq_normalized("  ", "  "));
    }

    #[test]
    fn test_equals_or_contains() {
        assert!(equals_or_contains("Cruz", "cruz"));
        assert!(equals_or_contains("Dela Cruz Santos", "santos"));
        assert!(!equals_or_contains("Santiago", "santos"));
        assert!(!equals_or_contains("Santos", ""));
    }

    #[test]
    fn test_split_full_name() {
        assert_eq!(split_full_name(""), None);
        assert_eq!(
            split_full_name("Luz"),
            Some(("luz".to_string(), None))
        );
        assert_eq!(
            split_full_name("Maria Luz Cruz"),
            Some(("maria luz".to_string(), Some("cruz".to_string())))
        );
    }
}
