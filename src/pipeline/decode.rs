//! Mail Decoder: one pass from raw bytes to an owned message tree.

use std::collections::HashMap;

use mailparse::{parse_mail, ParsedMail};

use crate::error::PipelineError;

/// A single node of the decoded message tree.
///
/// Multipart containers carry children and no payload; leaves carry their
/// payload decoded from the declared transfer encoding. The tree is built
/// in exactly one decoding pass and is read-only afterwards.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MessageNode {
    /// Header name (lowercased) to value; repeated headers are
    /// last-write-wins.
    pub headers: HashMap<String, String>,
    /// The declared content type, absent when the part declares none.
    pub content_type: Option<String>,
    /// Filename from the content disposition, with the content type `name`
    /// parameter as fallback.
    pub filename: Option<String>,
    pub payload: Option<Vec<u8>>,
    pub children: Vec<MessageNode>,
}

impl MessageNode {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Parse raw message bytes into a [`MessageNode`] tree.
///
/// Fails only when the top-level envelope is unparsable; partial or
/// unusual structure inside is represented faithfully, with missing fields
/// becoming absent rather than errors.
pub fn decode(raw: &[u8]) -> Result<MessageNode, PipelineError> {
    let parsed = parse_mail(raw)?;
    Ok(convert(&parsed))
}

fn convert(part: &ParsedMail<'_>) -> MessageNode {
    let mut headers = HashMap::new();
    for header in &part.headers {
        headers.insert(header.get_key().to_ascii_lowercase(), header.get_value());
    }

    let content_type = headers
        .contains_key("content-type")
        .then(|| part.ctype.mimetype.to_ascii_lowercase());

    let filename = part
        .get_content_disposition()
        .params
        .get("filename")
        .cloned()
        .or_else(|| part.ctype.params.get("name").cloned());

    // An undecodable payload is represented as absent, not an error.
    let payload = part
        .subparts
        .is_empty()
        .then(|| part.get_body_raw().ok())
        .flatten();

    MessageNode {
        headers,
        content_type,
        filename,
        payload,
        children: part.subparts.iter().map(convert).collect(),
    }
}
