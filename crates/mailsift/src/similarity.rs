//! Subject similarity: TF-IDF over a two-document corpus, compared by cosine.
//!
//! Scores range over `[0, 100]`. Degenerate inputs (empty strings, only
//! stopwords, no word tokens) score `0.0`.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;

static RE_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// Corpus size used for IDF smoothing. Always the two compared subjects.
const CORPUS_DOCS: f64 = 2.0;

/// Function words and reply/forward markers that carry no topical signal.
const STOPWORDS: &[&str] = &[
    "re", "fw", "fwd", "aw", "the", "a", "an", "and", "or", "but", "of", "to", "in", "on", "at",
    "for", "from", "by", "with", "about", "as", "is", "are", "was", "were", "be", "been", "it",
    "its", "this", "that", "these", "those", "your", "you", "our", "we", "my", "me", "i", "us",
    "his", "her", "their", "them", "he", "she", "they", "has", "have", "had", "do", "does", "did",
    "not", "no", "so", "if", "than", "then", "there", "here", "up", "out", "into", "over", "all",
    "any", "can", "will", "just", "now", "am", "pm",
];

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Lower-cased term counts for one subject.
fn term_counts(text: &str) -> HashMap<String, u32> {
    let lowered = text.to_lowercase();
    let mut counts = HashMap::new();
    for token in RE_TOKEN.find_iter(&lowered).map(|m| m.as_str()) {
        if is_stopword(token) {
            continue;
        }
        *counts.entry(token.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Similarity of two subjects in `[0, 100]`.
///
/// Case-insensitive, deterministic and exactly symmetric: the vocabulary is
/// walked in sorted order, so `score(a, b) == score(b, a)` holds bit-for-bit.
pub fn score(a: &str, b: &str) -> f64 {
    let left = term_counts(a);
    let right = term_counts(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let vocabulary: BTreeSet<&str> = left
        .keys()
        .chain(right.keys())
        .map(String::as_str)
        .collect();

    let mut dot = 0.0_f64;
    let mut norm_left = 0.0_f64;
    let mut norm_right = 0.0_f64;

    for term in vocabulary {
        let tf_left = f64::from(left.get(term).copied().unwrap_or(0));
        let tf_right = f64::from(right.get(term).copied().unwrap_or(0));
        let df = f64::from(u8::from(tf_left > 0.0) + u8::from(tf_right > 0.0));
        let idf = ((1.0 + CORPUS_DOCS) / (1.0 + df)).ln() + 1.0;

        let w_left = tf_left * idf;
        let w_right = tf_right * idf;
        dot += w_left * w_right;
        norm_left += w_left * w_left;
        norm_right += w_right * w_right;
    }

    let denominator = norm_left.sqrt() * norm_right.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }

    (dot / denominator * 100.0).clamp(0.0, 100.0)
}
