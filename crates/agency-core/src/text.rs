//! Lexical normalization shared by the registry, inference, harvesting and
//! synthesis. Everything here is pure and deterministic.

use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Words that never become tags or theme keywords.
const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "always", "an", "and", "any", "are", "as", "at", "avoid",
    "be", "been", "before", "but", "by", "can", "do", "does", "each", "every", "for", "from", "has",
    "have", "if", "in", "into", "is", "it", "its", "just", "make", "more", "most", "must", "my",
    "never", "new", "no", "not", "of", "on", "only", "or", "our", "out", "over", "per", "prefer",
    "should", "so", "sure", "than", "that", "the", "their", "then", "these", "they", "this",
    "those", "to", "under", "up", "use", "using", "via", "was", "we", "when", "will", "with",
    "you", "your",
];

/// Longest multi-word phrase considered when matching or clustering.
pub const MAX_PHRASE_WORDS: usize = 3;

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.binary_search(&word).is_ok()
}

/// Normalize a capability identifier: trim, lowercase, and collapse runs of
/// whitespace or underscores into a single `-`.
pub fn normalize_identifier(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.trim().chars() {
        if c.is_whitespace() || c == '_' {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('-');
        }
        pending_sep = false;
        out.extend(c.to_lowercase());
    }
    out
}

/// Whether an identifier can be used as a single file or directory name.
/// Path separators and `.`/`..` would let a capability escape its directory.
pub fn is_path_safe_identifier(id: &str) -> bool {
    !id.is_empty() && !id.contains(['/', '\\', '\0']) && id != "." && id != ".."
}

/// Lowercase alphanumeric tokens. Apostrophes are dropped (`don't` → `dont`);
/// every other non-alphanumeric character separates tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else if c == '\'' || c == '\u{2019}' {
            continue;
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Tokens plus every 2..=3 word phrase of consecutive tokens.
pub fn candidate_terms(text: &str) -> BTreeSet<String> {
    let tokens = tokenize(text);
    let mut terms: BTreeSet<String> = tokens.iter().cloned().collect();
    for n in 2..=MAX_PHRASE_WORDS {
        for window in tokens.windows(n) {
            terms.insert(window.join(" "));
        }
    }
    terms
}

/// Tokens that carry meaning: stopwords and single characters removed.
pub fn keywords(text: &str) -> BTreeSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().count() >= 2 && !is_stopword(t))
        .collect()
}

/// Normalize a tag so that `Test-Driven` and `test driven` compare equal.
pub fn normalize_tag(raw: &str) -> String {
    tokenize(raw).join(" ")
}

/// Fallback tag set for a capability without a manifest entry: keywords of the
/// identifier and of the document title, plus the identifier itself as a phrase
/// when it spans two or three words.
pub fn derive_tags(identifier: &str, title: &str) -> BTreeSet<String> {
    let spaced = identifier.replace('-', " ");
    let mut tags = keywords(&spaced);
    tags.extend(keywords(title));
    let words = tokenize(&spaced);
    if (2..=MAX_PHRASE_WORDS).contains(&words.len()) {
        tags.insert(words.join(" "));
    }
    tags
}

/// Theme candidates for clustering learned statements: keywords of three or
/// more characters, and phrases of consecutive non-stopword tokens.
pub fn theme_terms(text: &str) -> BTreeSet<String> {
    let tokens = tokenize(text);
    let meaningful = |t: &String| t.chars().count() >= 3 && !is_stopword(t);
    let mut terms: BTreeSet<String> = tokens.iter().filter(|t| meaningful(t)).cloned().collect();
    for n in 2..=MAX_PHRASE_WORDS {
        for window in tokens.windows(n) {
            if window.iter().all(meaningful) {
                terms.insert(window.join(" "));
            }
        }
    }
    terms
}

/// Lowercase, whitespace-collapsed form of a learned statement.
pub fn normalize_statement(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// SHA-256 hex digest of the normalized statement.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(normalize_statement(text).as_bytes()))
}

pub fn title_case(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// URL/marker-safe slug of a section title.
pub fn slugify(text: &str) -> String {
    tokenize(text).join("-")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_unsafe_identifiers() {
        assert!(is_path_safe_identifier("task-assigner"));
        assert!(is_path_safe_identifier("v1.2"));
        for bad in ["", ".", "..", "../../escaped", "a/b", "a\\b"] {
            assert!(!is_path_safe_identifier(bad), "{bad:?}");
        }
    }

    #[test]
    fn stopwords_are_sorted_for_binary_search() {
        let mut sorted = STOPWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOPWORDS);
    }

    #[test]
    fn identifiers_normalize_case_and_whitespace() {
        assert_eq!(normalize_identifier("  Architect "), "architect");
        assert_eq!(normalize_identifier("Backend  Dev"), "backend-dev");
        assert_eq!(normalize_identifier("jules_qa"), "jules-qa");
        assert_eq!(normalize_identifier(""), "");
    }

    #[test]
    fn tokenize_strips_punctuation() {
        assert_eq!(
            tokenize("A web-app, with Test-Driven dev!"),
            vec!["a", "web", "app", "with", "test", "driven", "dev"]
        );
        assert_eq!(tokenize("don't"), vec!["dont"]);
    }

    #[test]
    fn candidate_terms_include_phrases() {
        let terms = candidate_terms("use test driven development");
        assert!(terms.contains("test driven"));
        assert!(terms.contains("test driven development"));
        assert!(terms.contains("development"));
        assert!(!terms.contains("use test driven development"));
    }

    #[test]
    fn derive_tags_from_identifier_and_title() {
        let tags = derive_tags("frontend-dev", "# Frontend Developer: UI and UX");
        for t in ["frontend", "dev", "frontend dev", "developer", "ui", "ux"] {
            assert!(tags.contains(t), "missing {t}");
        }
        assert!(!tags.contains("and"));
    }

    #[test]
    fn theme_terms_skip_stopword_phrases() {
        let terms = theme_terms("Always use atomic writes for state files");
        assert!(terms.contains("atomic writes"));
        assert!(terms.contains("state files"));
        assert!(!terms.contains("use atomic"));
        assert!(!terms.contains("always"));
    }

    #[test]
    fn content_hash_ignores_case_and_spacing() {
        assert_eq!(
            content_hash("Use  atomic writes"),
            content_hash("use atomic WRITES ")
        );
        assert_ne!(content_hash("use atomic writes"), content_hash("use atomic reads"));
        assert_eq!(content_hash("x").len(), 64);
    }

    #[test]
    fn title_case_and_slug() {
        assert_eq!(title_case("atomic writes"), "Atomic Writes");
        assert_eq!(slugify("Atomic Writes"), "atomic-writes");
    }
}
