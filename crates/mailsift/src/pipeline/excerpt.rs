//! Body cleanup and the rule-based one-line summary stored with each message.

const SUMMARY_MAX_CHARS: usize = 200;
const SUMMARY_MAX_WORDS: usize = 25;

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Flattens a body onto one line and bounds it to `max_chars` characters.
pub fn clean_body(body: &str, max_chars: usize) -> String {
    let flattened = body.trim().replace('\r', "").replace('\n', " ");
    truncate_chars(&flattened, max_chars).to_string()
}

/// Text before the first `.`, at most 200 characters. Longer than 25 words
/// is cut to 25 words followed by `...`.
pub fn summarize(body: &str) -> String {
    let first_sentence = body.split('.').next().unwrap_or_default();
    let summary = truncate_chars(first_sentence, SUMMARY_MAX_CHARS);

    let words: Vec<&str> = summary.split_whitespace().collect();
    if words.len() > SUMMARY_MAX_WORDS {
        format!("{}...", words[..SUMMARY_MAX_WORDS].join(" "))
    } else {
        summary.trim().to_string()
    }
}
