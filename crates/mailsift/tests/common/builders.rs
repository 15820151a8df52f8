//! Builders for test messages and configuration files.

#![allow(dead_code)]

use serde_json::{json, Value};

use mailsift::model::{Attachment, RawMessage};

/// Builder for `RawMessage` values as a transport would yield them.
pub struct RawMessageBuilder {
    message: RawMessage,
}

impl RawMessageBuilder {
    pub fn new(message_id: &str) -> Self {
        Self {
            message: RawMessage {
                message_id: message_id.to_string(),
                sender: "friend@gmail.com".to_string(),
                subject: "Hello".to_string(),
                body: String::new(),
                provider_thread_id: None,
                attachments: Vec::new(),
            },
        }
    }

    pub fn sender(mut self, sender: &str) -> Self {
        self.message.sender = sender.to_string();
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.message.subject = subject.to_string();
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.message.body = body.to_string();
        self
    }

    pub fn provider_thread(mut self, thread_id: &str) -> Self {
        self.message.provider_thread_id = Some(thread_id.to_string());
        self
    }

    pub fn attachment(mut self, filename: &str, mime_type: &str, size_bytes: u64) -> Self {
        self.message.attachments.push(Attachment {
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            size_bytes,
            provider_ref: Some(format!("part-{}", self.message.attachments.len())),
        });
        self
    }

    pub fn build(self) -> RawMessage {
        self.message
    }
}

/// Shorthand for a message with only an id and subject.
pub fn raw(message_id: &str, subject: &str) -> RawMessage {
    RawMessageBuilder::new(message_id).subject(subject).build()
}

/// Builder for JSON config documents as they would appear on disk.
pub struct ConfigBuilder {
    doc: Value,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            doc: json!({ "version": "1.0" }),
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.doc["version"] = json!(version);
        self
    }

    pub fn database_path(mut self, path: &str) -> Self {
        self.doc["database_path"] = json!(path);
        self
    }

    pub fn body_max_chars(mut self, max: u64) -> Self {
        self.doc["ingest"] = json!({ "body_max_chars": max });
        self
    }

    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.doc["threading"] = json!({ "similarity_threshold": threshold });
        self
    }

    pub fn default_category(mut self, label: &str) -> Self {
        self.classifier()["default_category"] = json!(label);
        self
    }

    pub fn rule(mut self, id: &str, priority: i32, category: &str, needles: &[&str]) -> Self {
        let classifier = self.classifier();
        if classifier.get("rules").is_none() {
            classifier["rules"] = json!([]);
        }
        if let Some(rules) = classifier["rules"].as_array_mut() {
            rules.push(json!({
                "id": id,
                "priority": priority,
                "category": category,
                "sender_contains_any": needles,
            }));
        }
        self
    }

    pub fn ai_disabled(mut self) -> Self {
        self.doc["ai"] = json!({ "enabled": false });
        self
    }

    pub fn ai_key_env_var(mut self, name: &str) -> Self {
        self.doc["ai"] = json!({ "enabled": true, "api_key_env_var": name });
        self
    }

    pub fn logging(mut self, level: &str, json_output: bool) -> Self {
        self.doc["logging"] = json!({ "level": level, "json": json_output });
        self
    }

    fn classifier(&mut self) -> &mut Value {
        if self.doc.get("classifier").is_none() {
            self.doc["classifier"] = json!({});
        }
        &mut self.doc["classifier"]
    }

    pub fn build(self) -> String {
        self.doc.to_string()
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
