//! Mail transport seam and RFC 822 parsing.

pub mod error;
pub mod parser;
pub mod transport;

pub use error::MailError;
pub use parser::parse_rfc822;
pub use transport::MailTransport;
