use async_trait::async_trait;

use super::MailError;
use crate::model::RawMessage;

/// Source of recent raw messages for a mailbox.
///
/// Authentication, paging and provider APIs live behind this trait.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn fetch_recent(&self, owner: &str) -> Result<Vec<RawMessage>, MailError>;
}
