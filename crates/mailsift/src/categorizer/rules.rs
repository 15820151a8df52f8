use serde::{Deserialize, Serialize};

use crate::model::Category;

/// Maps senders whose lower-cased address contains any needle to a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderRule {
    pub id: String,
    #[serde(default)]
    pub priority: i32,
    pub category: Category,
    pub sender_contains_any: Vec<String>,
}

impl SenderRule {
    fn matches(&self, sender_lower: &str) -> bool {
        self.sender_contains_any
            .iter()
            .any(|needle| sender_lower.contains(needle.as_str()))
    }
}

/// (id, priority, category, needles), highest priority first.
const BUILTIN_RULES: &[(&str, i32, Category, &[&str])] = &[
    ("security", 70, Category::SecurityAlert, &["security"]),
    (
        "institution",
        60,
        Category::College,
        &[".edu", ".ac.", "university", "college", "school"],
    ),
    (
        "banking",
        50,
        Category::BankFinance,
        &[
            "bank",
            "hdfc",
            "icici",
            "sbi",
            "axis",
            "paypal",
            "@chase.com",
            ".chase.com",
            "wellsfargo",
        ],
    ),
    (
        "billing",
        40,
        Category::BillsPayments,
        &["billing", "invoice", "payments"],
    ),
    (
        "travel",
        30,
        Category::TravelTickets,
        &[
            "airline",
            "irctc",
            "booking",
            "airbnb",
            "makemytrip",
            "expedia",
        ],
    ),
    (
        "social",
        20,
        Category::Social,
        &[
            "linkedin",
            "facebook",
            "instagram",
            "twitter",
            "@x.com",
            ".x.com",
        ],
    ),
    (
        "bulk-sender",
        10,
        Category::SubscriptionsNewsletters,
        &["no-reply", "noreply", "newsletter", "digest"],
    ),
];

/// Ordered sender rules. The first matching rule wins.
#[derive(Debug, Clone)]
pub struct SenderRules {
    rules: Vec<SenderRule>,
}

impl SenderRules {
    /// Sorts by descending priority; equal priorities keep their given order.
    pub fn new(mut rules: Vec<SenderRule>) -> Self {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        for rule in &mut rules {
            for needle in &mut rule.sender_contains_any {
                *needle = needle.to_lowercase();
            }
        }
        Self { rules }
    }

    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_RULES
                .iter()
                .map(|(id, priority, category, needles)| SenderRule {
                    id: (*id).to_string(),
                    priority: *priority,
                    category: *category,
                    sender_contains_any: needles.iter().map(|n| (*n).to_string()).collect(),
                })
                .collect(),
        )
    }

    pub fn matching_rule(&self, sender: &str) -> Option<&SenderRule> {
        let sender = sender.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&sender))
    }

    pub fn rules(&self) -> &[SenderRule] {
        &self.rules
    }
}

impl Default for SenderRules {
    fn default() -> Self {
        Self::builtin()
    }
}
