//! Prompt construction for the chat-completions collaborator.

use crate::ai::DigestItem;
use crate::model::Category;
use crate::pipeline::excerpt::truncate_chars;

/// Body characters included in a classification prompt.
const CLASSIFY_BODY_CHARS: usize = 1000;

/// Escapes chat-template control sequences in untrusted email text.
///
/// Covers ChatML markers (`<|...|>`), sequence boundaries (`<s>`, `</s>`)
/// and Llama-style instruction and system markers.
pub fn sanitize_for_prompt(text: &str) -> String {
    text.replace("<|", "< |")
        .replace("|>", "| >")
        .replace("<s>", "< s >")
        .replace("</s>", "< / s >")
        .replace("[INST]", "[ INST ]")
        .replace("[/INST]", "[ / INST ]")
        .replace("<<SYS>>", "< < SYS > >")
        .replace("<</SYS>>", "< < / SYS > >")
}

pub fn classification_system_prompt() -> String {
    format!(
        "You classify emails into exactly one category. \
         Allowed categories: {}. \
         Reply with the category name only, without explanation or punctuation.",
        Category::label_list()
    )
}

pub fn classification_user_prompt(sender: &str, subject: &str, body: &str) -> String {
    format!(
        "From: {}\nSubject: {}\nBody: {}",
        sanitize_for_prompt(sender),
        sanitize_for_prompt(subject),
        sanitize_for_prompt(truncate_chars(body, CLASSIFY_BODY_CHARS)),
    )
}

pub fn summary_system_prompt() -> &'static str {
    r#"You are an email assistant. Return VALID JSON ONLY, in exactly this shape:
{"overall_summary": "summary text", "priorities": [{"subject": "subject text", "priority": "High"}]}
Give every email a priority of High, Medium or Low. Copy each subject exactly as given."#
}

pub fn summary_user_prompt(items: &[DigestItem]) -> String {
    let digest: Vec<String> = items
        .iter()
        .map(|item| {
            format!(
                "From: {}\nSubject: {}\nSummary: {}",
                sanitize_for_prompt(&item.sender),
                sanitize_for_prompt(&item.subject),
                sanitize_for_prompt(&item.summary),
            )
        })
        .collect();
    format!("Emails:\n\n{}", digest.join("\n\n"))
}
