use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Failed to parse message '{message_id}': {reason}")]
    Parse { message_id: String, reason: String },

    /// The mail transport could not deliver messages.
    #[error("Mail transport failed: {0}")]
    Transport(String),
}
