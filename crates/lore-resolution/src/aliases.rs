//! Alias pattern recognition for entity names.
//!
//! Narrative text refers to the same entity in many ways: with or without a
//! leading article ("the Doctor"), an honorific ("Professor Dumbledore") or
//! an epithet ("Alfred the Great"). Normalization strips those decorations
//! so that the remaining core name can be compared.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading articles removed during normalization.
const ARTICLES: &[&str] = &["the", "a", "an", "that", "this"];

/// Honorifics and ranks removed from the front of a name.
const TITLES: &[&str] = &[
    "mr", "mrs", "ms", "miss", "mister", "madam", "madame", "dr", "doctor", "prof", "professor",
    "sir", "dame", "lord", "lady", "count", "countess", "duke", "duchess", "baron", "baroness",
    "king", "queen", "prince", "princess", "emperor", "empress", "captain", "capt", "general",
    "colonel", "major", "lieutenant", "sergeant", "commander", "admiral", "detective",
    "inspector", "officer", "agent", "father", "mother", "brother", "sister", "uncle", "aunt",
    "saint", "st", "reverend", "rev", "master", "mistress", "headmaster", "headmistress",
];

/// Epithets and generational suffixes removed from the end of a name.
const EPITHETS: &[&str] = &[
    "the great", "the elder", "the younger", "the wise", "the bold", "the brave",
    "the terrible", "the conqueror", "the magnificent", "the first", "the second",
    "the third", "the grey", "the white", "jr", "junior", "sr", "senior", "ii", "iii", "iv",
];

static ARTICLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(?:{})\s+(.+)$", ARTICLES.join("|"))).unwrap()
});

static TITLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^({})\.?\s+(.+)$", TITLES.join("|"))).unwrap()
});

static EPITHET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let alternatives: Vec<String> = EPITHETS.iter().map(|e| regex::escape(e)).collect();
    Regex::new(&format!(r"^(.+?),?\s+({})\.?$", alternatives.join("|"))).unwrap()
});

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_article(s: &str) -> String {
    match ARTICLE_PATTERN.captures(s) {
        Some(caps) => caps[1].to_string(),
        None => s.to_string(),
    }
}

fn strip_title(s: &str) -> String {
    match TITLE_PATTERN.captures(s) {
        Some(caps) => caps[2].to_string(),
        None => s.to_string(),
    }
}

fn strip_epithet(s: &str) -> String {
    match EPITHET_PATTERN.captures(s) {
        Some(caps) => caps[1].to_string(),
        None => s.to_string(),
    }
}

/// Normalize a name for comparison.
///
/// Lowercases, then strips one leading article, one leading title and one
/// trailing epithet, collapsing whitespace. The pass is repeated until the
/// name stops changing, so `normalize(normalize(x)) == normalize(x)`.
/// Decorations are only removed when something else remains: "King" stays
/// "king".
pub fn normalize_name_for_matching(name: &str) -> String {
    let mut current = collapse_whitespace(&name.to_lowercase());
    loop {
        let stripped = strip_article(&current);
        let stripped = strip_title(&stripped);
        let stripped = strip_epithet(&stripped);
        let next = collapse_whitespace(&stripped);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// The leading title of a name, if any (e.g. "professor").
pub fn extract_title(name: &str) -> Option<String> {
    let lowered = collapse_whitespace(&name.to_lowercase());
    let without_article = strip_article(&lowered);
    TITLE_PATTERN
        .captures(&without_article)
        .map(|caps| caps[1].to_string())
}

/// The trailing epithet of a name, if any (e.g. "the great").
pub fn extract_epithet(name: &str) -> Option<String> {
    let lowered = collapse_whitespace(&name.to_lowercase());
    EPITHET_PATTERN
        .captures(&lowered)
        .map(|caps| caps[2].to_string())
}

/// Significant tokens of a normalized name.
///
/// Edge punctuation is trimmed and single-character tokens (initials) are
/// dropped.
pub fn get_name_tokens(name: &str) -> Vec<String> {
    normalize_name_for_matching(name)
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| t.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of the token sets of two names.
///
/// Returns 0.0 if either name has no significant tokens.
pub fn token_overlap(a: &str, b: &str) -> f32 {
    let tokens_a: HashSet<String> = get_name_tokens(a).into_iter().collect();
    let tokens_b: HashSet<String> = get_name_tokens(b).into_iter().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    intersection as f32 / union as f32
}

/// Whether one normalized name contains the other.
///
/// Both normalized names must be at least two characters long.
pub fn is_substring_match(a: &str, b: &str) -> bool {
    let norm_a = normalize_name_for_matching(a);
    let norm_b = normalize_name_for_matching(b);

    if norm_a.chars().count() < 2 || norm_b.chars().count() < 2 {
        return false;
    }

    norm_a.contains(&norm_b) || norm_b.contains(&norm_a)
}

/// Whether both names carry the same title.
pub fn share_title(a: &str, b: &str) -> bool {
    match (extract_title(a), extract_title(b)) {
        (Some(title_a), Some(title_b)) => title_a == title_b,
        _ => false,
    }
}

/// Tiered alias heuristic.
///
/// | pattern                      | score                    |
/// |------------------------------|--------------------------|
/// | identical normalized forms   | 1.0                      |
/// | one contains the other       | 0.85                     |
/// | same title                   | 0.7                      |
/// | some shared tokens           | 0.5 + 0.3 * overlap      |
/// | nothing                      | 0.0                      |
pub fn compute_alias_pattern_score(a: &str, b: &str) -> f32 {
    if normalize_name_for_matching(a) == normalize_name_for_matching(b) {
        return 1.0;
    }
    if is_substring_match(a, b) {
        return 0.85;
    }
    if share_title(a, b) {
        return 0.7;
    }

    let overlap = token_overlap(a, b);
    if overlap > 0.0 {
        return 0.5 + 0.3 * overlap;
    }

    0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_decorations() {
        assert_eq!(normalize_name_for_matching("The Doctor"), "doctor");
        assert_eq!(normalize_name_for_matching("Professor Albus Dumbledore"), "albus dumbledore");
        assert_eq!(normalize_name_for_matching("Mr. Darcy"), "darcy");
        assert_eq!(normalize_name_for_matching("Alfred the Great"), "alfred");
        assert_eq!(normalize_name_for_matching("Martin Luther King, Jr."), "martin luther king");
        assert_eq!(normalize_name_for_matching("  Harry    Potter "), "harry potter");
    }

    #[test]
    fn test_normalize_keeps_bare_decorations() {
        assert_eq!(normalize_name_for_matching("King"), "king");
        assert_eq!(normalize_name_for_matching("The"), "the");
        assert_eq!(normalize_name_for_matching(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let names = [
            "The Count Dracula",
            "the the great",
            "A Mr. Smith Jr.",
            "Captain Ahab the Elder",
            "this lord the king",
            "Sir",
            "Doctor Who",
            "  The   Boy   Who   Lived ",
        ];
        for name in names {
            let once = normalize_name_for_matching(name);
            assert_eq!(normalize_name_for_matching(&once), once, "not idempotent for {:?}", name);
        }
    }

    #[test]
    fn test_extract_title_and_epithet() {
        assert_eq!(extract_title("Professor Snape").as_deref(), Some("professor"));
        assert_eq!(extract_title("The Count Dracula").as_deref(), Some("count"));
        assert_eq!(extract_title("Dr. Watson").as_deref(), Some("dr"));
        assert_eq!(extract_title("Snape"), None);

        assert_eq!(extract_epithet("Alfred the Great").as_deref(), Some("the great"));
        assert_eq!(extract_epithet("Pliny the Elder").as_deref(), Some("the elder"));
        assert_eq!(extract_epithet("Harry Potter"), None);
    }

    #[test]
    fn test_get_name_tokens() {
        assert_eq!(get_name_tokens("The Boy Who Lived"), vec!["boy", "who", "lived"]);
        assert_eq!(get_name_tokens("J. R. Hartley"), vec!["hartley"]);
        assert!(get_name_tokens("").is_empty());
    }

    #[test]
    fn test_token_overlap() {
        assert!((token_overlap("Harry Potter", "Harry Potter") - 1.0).abs() < 1e-6);
        assert!((token_overlap("Harry Potter", "Harry") - 0.5).abs() < 1e-6);
        assert_eq!(token_overlap("Harry", "Hermione"), 0.0);
        assert_eq!(token_overlap("", "Harry"), 0.0);
    }

    #[test]
    fn test_substring_and_title() {
        assert!(is_substring_match("Harry Potter", "Harry"));
        assert!(is_substring_match("Mr. Potter", "Harry Potter"));
        assert!(!is_substring_match("X", "Xavier"));

        assert!(share_title("Professor Snape", "Professor McGonagall"));
        assert!(!share_title("Professor Snape", "Snape"));
    }

    #[test]
    fn test_alias_pattern_score_tiers() {
        assert_eq!(compute_alias_pattern_score("The Doctor", "doctor"), 1.0);
        assert_eq!(compute_alias_pattern_score("Harry Potter", "Harry"), 0.85);
        assert_eq!(compute_alias_pattern_score("Professor Snape", "Professor McGonagall"), 0.7);
        // "ron weasley" vs "ginny weasley": 1 shared of 3 tokens
        let score = compute_alias_pattern_score("Ron Weasley", "Ginny Weasley");
        assert!((score - (0.5 + 0.3 / 3.0)).abs() < 1e-6);
        assert_eq!(compute_alias_pattern_score("Hogwarts", "Azkaban"), 0.0);
    }
}
