use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Message store failed: {0}")]
    Store(#[from] crate::db::DatabaseError),

    #[error("Mail transport failed: {0}")]
    Transport(#[from] crate::mail::MailError),
}
