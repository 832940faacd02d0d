//! Forwarding Planner: pure assembly of the summary and the ordered
//! side-effect actions for one message. Nothing here touches the network
//! or the disk, which keeps plans unit-testable without live
//! collaborators.

use std::net::SocketAddr;

use super::{classify::DecomposedParts, RawMessage};

/// What the notification channel is told about one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub peer: SocketAddr,
    pub sender: String,
    /// Comma-joined recipient addresses.
    pub recipients: String,
    pub subject: String,
    pub reply_to: Option<String>,
    pub num_links: usize,
    pub num_attachments: usize,
}

impl Summary {
    pub fn render(&self) -> String {
        format!(
            "IP : {}\nFrom : {}\nRcpts : {}\nSubject : {}\nReply-To : {}\nNum Links : {}\nNum Att : {}",
            self.peer,
            self.sender,
            self.recipients,
            self.subject,
            self.reply_to.as_deref().unwrap_or(""),
            self.num_links,
            self.num_attachments,
        )
    }
}

/// One intended side effect. Execution order is the Vec order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Post the rendered summary.
    PostSummary,
    /// Post one extracted link.
    PostLink(String),
    /// Write one attachment to transient staging.
    Stage { filename: String, payload: Vec<u8> },
    /// Upload one attachment, then clean up its staged file.
    Upload { filename: String, payload: Vec<u8> },
    /// Upload the raw original message bytes.
    UploadRaw { filename: String, payload: Vec<u8> },
}

/// The complete, ordered description of what to emit for one message.
/// Constructed once, consumed immediately, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingPlan {
    pub summary: Summary,
    pub actions: Vec<Action>,
}

pub fn plan(
    raw: RawMessage,
    subject: String,
    parts: DecomposedParts,
    links: Vec<String>,
) -> ForwardingPlan {
    let summary = Summary {
        peer: raw.peer,
        sender: raw.sender,
        recipients: raw.recipients.join(","),
        subject: subject.clone(),
        reply_to: parts.reply_to,
        num_links: links.len(),
        num_attachments: parts.attachments.len(),
    };

    let mut actions = vec![Action::PostSummary];

    actions.extend(links.into_iter().map(Action::PostLink));

    for (filename, payload) in parts.attachments {
        actions.push(Action::Stage {
            filename: filename.clone(),
            payload: payload.clone(),
        });
        actions.push(Action::Upload { filename, payload });
    }

    let name = if subject.is_empty() {
        "message".to_string()
    } else {
        subject
    };
    actions.push(Action::UploadRaw {
        filename: format!("{name}.msg"),
        payload: raw.data,
    });

    ForwardingPlan { summary, actions }
}
