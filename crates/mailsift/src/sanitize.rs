//! Helpers for putting mail fields into tracing span attributes.
//!
//! Info-level spans carry only the sender's domain and a subject
//! fingerprint. Full senders and subjects are logged at debug level.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Returns the domain part of a sender, lower-cased.
///
/// - `Alice <alice@Example.com>` → `example.com`
/// - `alerts@security.example.com` → `security.example.com`
/// - `Unknown Sender` → `<unknown>`
pub fn sender_domain(sender: &str) -> String {
    let address = match (sender.rfind('<'), sender.rfind('>')) {
        (Some(open), Some(close)) if open < close => &sender[open + 1..close],
        _ => sender,
    };

    match address.rsplit_once('@') {
        Some((_, domain)) if !domain.trim().is_empty() => domain.trim().to_lowercase(),
        _ => "<unknown>".to_string(),
    }
}

/// Short deterministic hash of a subject, for correlating log lines about
/// the same subject without writing it out.
pub fn subject_fingerprint(subject: &str) -> String {
    let mut hasher = DefaultHasher::new();
    subject.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
