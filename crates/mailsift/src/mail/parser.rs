//! Turns raw RFC 822 bytes into a [`RawMessage`].

use log::debug;
use mail_parser::{Addr, MessageParser, MimeHeaders, PartType};

use super::MailError;
use crate::model::{Attachment, RawMessage};

pub const UNKNOWN_SENDER: &str = "Unknown Sender";
pub const NO_SUBJECT: &str = "No Subject";

/// Formats as `Name <address>` when a display name is present.
fn format_address(addr: &Addr) -> String {
    let address = addr.address().unwrap_or_default();
    match addr.name() {
        Some(name) if !name.is_empty() => format!("{} <{}>", name, address),
        _ => address.to_string(),
    }
}

fn mime_type_of(part: &mail_parser::MessagePart) -> String {
    part.content_type()
        .map(|ct| match ct.subtype() {
            Some(subtype) => format!("{}/{}", ct.ctype(), subtype),
            None => ct.ctype().to_string(),
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

fn size_of(part: &mail_parser::MessagePart) -> u64 {
    let len = match &part.body {
        PartType::Binary(data) | PartType::InlineBinary(data) => data.len(),
        PartType::Text(text) | PartType::Html(text) => text.len(),
        _ => 0,
    };
    len as u64
}

/// Parses a raw message.
///
/// Missing `From` and `Subject` headers become [`UNKNOWN_SENDER`] and
/// [`NO_SUBJECT`]. The body is the first text part, with HTML converted to
/// text when no plain part exists. Only attachment metadata is kept.
pub fn parse_rfc822(
    message_id: &str,
    raw: &[u8],
    provider_thread_id: Option<&str>,
) -> Result<RawMessage, MailError> {
    let message = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| MailError::Parse {
            message_id: message_id.to_string(),
            reason: "not an RFC 822 message".to_string(),
        })?;

    let sender = message
        .from()
        .and_then(|addrs| addrs.first())
        .map(format_address)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_SENDER.to_string());

    let subject = message
        .subject()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_SUBJECT)
        .to_string();

    let body = message
        .body_text(0)
        .map(|text| text.into_owned())
        .unwrap_or_default();

    let attachments: Vec<Attachment> = message
        .attachments()
        .enumerate()
        .map(|(index, part)| Attachment {
            filename: part
                .attachment_name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("attachment-{}", index + 1)),
            mime_type: mime_type_of(part),
            size_bytes: size_of(part),
            provider_ref: Some(
                part.content_id()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("part-{}", index)),
            ),
        })
        .collect();

    debug!(
        "Parsed message {} with {} attachment(s)",
        message_id,
        attachments.len()
    );

    Ok(RawMessage {
        message_id: message_id.to_string(),
        sender,
        subject,
        body,
        provider_thread_id: provider_thread_id.map(str::to_string),
        attachments,
    })
}
