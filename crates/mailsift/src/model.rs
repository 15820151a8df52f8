//! Core records flowing through ingestion, threading and reconciliation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A label that is not part of a closed vocabulary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown label '{0}'")]
pub struct UnknownLabel(pub String);

/// Normalizes free-text labels coming from a model or a config file:
/// surrounding whitespace, quotes, backticks and a trailing period are dropped.
fn normalize_label(raw: &str) -> String {
    let mut label = raw;
    loop {
        let stripped = label
            .trim()
            .trim_end_matches('.')
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`');
        if stripped == label {
            break;
        }
        label = stripped;
    }
    label.to_lowercase()
}

/// Topical category of a message. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Work,
    College,
    Personal,
    #[serde(rename = "Bank/Finance")]
    BankFinance,
    #[serde(rename = "Offers/Promotions")]
    OffersPromotions,
    #[serde(rename = "Travel/Tickets")]
    TravelTickets,
    #[serde(rename = "Bills/Payments")]
    BillsPayments,
    #[serde(rename = "Security Alert")]
    SecurityAlert,
    #[serde(rename = "Subscriptions/Newsletters")]
    SubscriptionsNewsletters,
    #[serde(rename = "Events/Conferences")]
    EventsConferences,
    #[serde(rename = "Important/Deadline")]
    ImportantDeadline,
    Social,
    Spam,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::Work,
        Category::College,
        Category::Personal,
        Category::BankFinance,
        Category::OffersPromotions,
        Category::TravelTickets,
        Category::BillsPayments,
        Category::SecurityAlert,
        Category::SubscriptionsNewsletters,
        Category::EventsConferences,
        Category::ImportantDeadline,
        Category::Social,
        Category::Spam,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::College => "College",
            Category::Personal => "Personal",
            Category::BankFinance => "Bank/Finance",
            Category::OffersPromotions => "Offers/Promotions",
            Category::TravelTickets => "Travel/Tickets",
            Category::BillsPayments => "Bills/Payments",
            Category::SecurityAlert => "Security Alert",
            Category::SubscriptionsNewsletters => "Subscriptions/Newsletters",
            Category::EventsConferences => "Events/Conferences",
            Category::ImportantDeadline => "Important/Deadline",
            Category::Social => "Social",
            Category::Spam => "Spam",
        }
    }

    /// Parses a label case-insensitively. Returns `None` for anything
    /// outside the closed set.
    pub fn parse_label(raw: &str) -> Option<Self> {
        let wanted = normalize_label(raw);
        Self::ALL
            .into_iter()
            .find(|c| c.label().to_lowercase() == wanted)
    }

    /// All labels joined for inclusion in a prompt.
    pub fn label_list() -> String {
        Self::ALL
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_label(s).ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

/// Message priority. `Medium` is the placeholder until reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    pub fn parse_label(raw: &str) -> Option<Self> {
        match normalize_label(raw).as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_label(s).ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

/// Attachment metadata. Owned by its message; no content is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Provider-side handle for fetching the content later.
    pub provider_ref: Option<String>,
}

/// A message as yielded by the mail transport, before ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub message_id: String,
    pub sender: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub provider_thread_id: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// An ingested message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub message_id: String,
    pub owner: String,
    pub sender: String,
    pub subject: String,
    /// Cleaned body, bounded at ingestion.
    pub body_excerpt: String,
    pub summary: String,
    /// Coarse thread id from the provider. Never used for clustering.
    pub provider_thread_id: Option<String>,
    /// Cluster id assigned by the thread assigner. Stable once written.
    pub computed_thread_id: String,
    pub category: Category,
    pub priority: Priority,
    pub attachments: Vec<Attachment>,
    pub received_at: DateTime<Utc>,
}

/// Out-of-band correctness signal about a message's priority. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub id: i64,
    pub message_id: String,
    pub asserted_priority: Priority,
    pub is_correct: bool,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels_round_trip_through_parse() {
        for category in Category::ALL {
            assert_eq!(Category::parse_label(category.label()), Some(category));
        }
    }

    #[test]
    fn test_category_parse_is_lenient_about_decoration() {
        assert_eq!(
            Category::parse_label("  \"security alert\".  "),
            Some(Category::SecurityAlert)
        );
        assert_eq!(
            Category::parse_label("`Bank/Finance`"),
            Some(Category::BankFinance)
        );
        assert_eq!(Category::parse_label("WORK"), Some(Category::Work));
        assert_eq!(
            Category::parse_label("\"Security Alert\"."),
            Some(Category::SecurityAlert)
        );
        assert_eq!(Category::parse_label("'Work'."), Some(Category::Work));
        assert_eq!(
            Category::parse_label("`Travel/Tickets.`"),
            Some(Category::TravelTickets)
        );
    }

    #[test]
    fn test_category_parse_rejects_unknown() {
        assert_eq!(Category::parse_label("Finance"), None);
        assert_eq!(Category::parse_label(""), None);
        assert_eq!(
            Category::parse_label("The category is Work because ..."),
            None
        );
        assert!("Groceries".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde_uses_labels() {
        let json = serde_json::to_string(&Category::TravelTickets).unwrap();
        assert_eq!(json, "\"Travel/Tickets\"");
        let back: Category = serde_json::from_str("\"Important/Deadline\"").unwrap();
        assert_eq!(back, Category::ImportantDeadline);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!(Priority::parse_label("high"), Some(Priority::High));
        assert_eq!(Priority::parse_label(" Low "), Some(Priority::Low));
        assert_eq!(Priority::parse_label("Urgent"), None);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_label_list_contains_every_category() {
        let list = Category::label_list();
        for category in Category::ALL {
            assert!(list.contains(category.label()));
        }
    }
}
