//! Scripted stand-ins for the external collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use mailsift::ai::{AiError, BatchAnalysis, BatchSummarizer, CategoryClassifier, DigestItem};
use mailsift::mail::{MailError, MailTransport};
use mailsift::model::RawMessage;

/// Long enough that any configured timeout fires first.
const STALL: Duration = Duration::from_secs(3600);

pub enum ClassifierScript {
    /// Answers every request with this label.
    Label(&'static str),
    /// Answers per subject, falling back to the given label.
    BySubject(HashMap<&'static str, &'static str>, &'static str),
    Fail,
    Stall,
}

pub struct ScriptedClassifier {
    script: ClassifierScript,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new(script: ClassifierScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn label(label: &'static str) -> Arc<Self> {
        Self::new(ClassifierScript::Label(label))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CategoryClassifier for ScriptedClassifier {
    async fn classify_category(
        &self,
        _sender: &str,
        subject: &str,
        _body: &str,
    ) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            ClassifierScript::Label(label) => Ok(label.to_string()),
            ClassifierScript::BySubject(labels, fallback) => {
                Ok(labels.get(subject).unwrap_or(fallback).to_string())
            }
            ClassifierScript::Fail => Err(AiError::Status {
                status: 503,
                body: "upstream unavailable".to_string(),
            }),
            ClassifierScript::Stall => {
                tokio::time::sleep(STALL).await;
                Ok("Work".to_string())
            }
        }
    }
}

pub enum SummarizerScript {
    /// Raw model text, parsed leniently like the real client does.
    Raw(String),
    Fail,
    Stall,
}

pub struct ScriptedSummarizer {
    script: SummarizerScript,
    calls: AtomicUsize,
    last_items: Mutex<Vec<DigestItem>>,
}

impl ScriptedSummarizer {
    pub fn new(script: SummarizerScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            last_items: Mutex::new(Vec::new()),
        })
    }

    pub fn raw(text: &str) -> Arc<Self> {
        Self::new(SummarizerScript::Raw(text.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_items(&self) -> Vec<DigestItem> {
        self.last_items.lock().unwrap().clone()
    }
}

#[async_trait]
impl BatchSummarizer for ScriptedSummarizer {
    async fn summarize_and_prioritize(
        &self,
        items: &[DigestItem],
    ) -> Result<BatchAnalysis, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_items.lock().unwrap() = items.to_vec();
        match &self.script {
            SummarizerScript::Raw(text) => Ok(BatchAnalysis::parse(text)),
            SummarizerScript::Fail => Err(AiError::EmptyResponse),
            SummarizerScript::Stall => {
                tokio::time::sleep(STALL).await;
                Ok(BatchAnalysis::default())
            }
        }
    }
}

/// Serves canned messages per owner.
#[derive(Default)]
pub struct FakeTransport {
    mailboxes: HashMap<String, Vec<RawMessage>>,
    fail: bool,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            mailboxes: HashMap::new(),
            fail: true,
        }
    }

    pub fn with_mailbox(mut self, owner: &str, messages: Vec<RawMessage>) -> Self {
        self.mailboxes.insert(owner.to_string(), messages);
        self
    }
}

#[async_trait]
impl MailTransport for FakeTransport {
    async fn fetch_recent(&self, owner: &str) -> Result<Vec<RawMessage>, MailError> {
        if self.fail {
            return Err(MailError::Transport("connection reset".to_string()));
        }
        Ok(self.mailboxes.get(owner).cloned().unwrap_or_default())
    }
}
