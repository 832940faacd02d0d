//! Part Classifier: bucket every leaf of the message tree into body
//! candidate or attachment. Pure data transformation, deterministic for a
//! given tree.

use super::decode::MessageNode;

/// Adversarial multipart nesting is cut off here rather than recursed into.
const MAX_DEPTH: usize = 64;

/// Which representation the selected body carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Html,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub kind: BodyKind,
    pub content: Vec<u8>,
}

/// Result of classification.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecomposedParts {
    /// The selected body, HTML taking precedence over plain text.
    pub body: Option<Body>,
    /// First non-empty Reply-To value found anywhere in the tree.
    pub reply_to: Option<String>,
    /// Attachment filename to decoded payload, in first-seen order. A
    /// later part with the same filename overwrites the payload in place:
    /// mail trees may legally repeat names, and the last occurrence wins.
    pub attachments: Vec<(String, Vec<u8>)>,
}

/// Walk every node reachable from `tree` (pre-order) and bucket the
/// leaves. Traversal order only affects which body is kept.
pub fn classify(tree: &MessageNode) -> DecomposedParts {
    let mut parts = DecomposedParts::default();

    // Explicit stack so adversarial nesting cannot exhaust the call stack.
    let mut stack: Vec<(&MessageNode, usize)> = vec![(tree, 0)];

    while let Some((node, depth)) = stack.pop() {
        if parts.reply_to.is_none() {
            if let Some(reply_to) = node.header("reply-to").filter(|v| !v.is_empty()) {
                parts.reply_to = Some(reply_to.to_string());
            }
        }

        if node.children.is_empty() {
            classify_leaf(node, &mut parts);
        } else if depth < MAX_DEPTH {
            for child in node.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }

    parts
}

fn classify_leaf(node: &MessageNode, parts: &mut DecomposedParts) {
    let content_type = node.content_type.as_deref().unwrap_or("");

    if let Some(filename) = node.filename.as_deref() {
        // Inline images carry filenames too, but they are noise for a
        // drop box; only non-image parts count as attachments.
        if !content_type.starts_with("image/") {
            let payload = node.payload.clone().unwrap_or_default();
            if let Some(entry) = parts
                .attachments
                .iter_mut()
                .find(|(name, _)| name == filename)
            {
                entry.1 = payload;
            } else {
                parts.attachments.push((filename.to_string(), payload));
            }
        }
    } else if content_type == "text/html" {
        parts.body = Some(Body {
            kind: BodyKind::Html,
            content: node.payload.clone().unwrap_or_default(),
        });
    } else if content_type == "text/text" {
        // Plain text never displaces an HTML body.
        if !matches!(
            parts.body,
            Some(Body {
                kind: BodyKind::Html,
                ..
            })
        ) {
            parts.body = Some(Body {
                kind: BodyKind::Plain,
                content: node.payload.clone().unwrap_or_default(),
            });
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::{classify, BodyKind, MessageNode};

    fn leaf(content_type: Option<&str>, payload: &[u8]) -> MessageNode {
        MessageNode {
            content_type: content_type.map(str::to_string),
            payload: Some(payload.to_vec()),
            ..Default::default()
        }
    }

    fn attachment(filename: &str, content_type: &str, payload: &[u8]) -> MessageNode {
        MessageNode {
            filename: Some(filename.to_string()),
            ..leaf(Some(content_type), payload)
        }
    }

    fn multipart(children: Vec<MessageNode>) -> MessageNode {
        MessageNode {
            content_type: Some("multipart/mixed".to_string()),
            children,
            ..Default::default()
        }
    }

    #[test]
    fn html_body_and_attachment() {
        let tree = multipart(vec![
            leaf(Some("text/html"), b"<p>hi</p>"),
            attachment("doc.pdf", "application/pdf", b"%PDF"),
        ]);

        let parts = classify(&tree);

        let body = parts.body.unwrap();
        assert_eq!(body.kind, BodyKind::Html);
        assert_eq!(body.content, b"<p>hi</p>");
        assert_eq!(
            parts.attachments,
            vec![("doc.pdf".to_string(), b"%PDF".to_vec())]
        );
    }

    #[test]
    fn html_takes_precedence_over_plain() {
        // Plain part first, HTML second.
        let parts = classify(&multipart(vec![
            leaf(Some("text/text"), b"plain"),
            leaf(Some("text/html"), b"<p>html</p>"),
        ]));
        assert_eq!(parts.body.unwrap().kind, BodyKind::Html);

        // HTML part first, plain second: plain never displaces it.
        let parts = classify(&multipart(vec![
            leaf(Some("text/html"), b"<p>html</p>"),
            leaf(Some("text/text"), b"plain"),
        ]));
        let body = parts.body.unwrap();
        assert_eq!(body.kind, BodyKind::Html);
        assert_eq!(body.content, b"<p>html</p>");
    }

    #[test]
    fn last_html_part_wins() {
        let parts = classify(&multipart(vec![
            leaf(Some("text/html"), b"<p>one</p>"),
            leaf(Some("text/html"), b"<p>two</p>"),
        ]));
        assert_eq!(parts.body.unwrap().content, b"<p>two</p>");
    }

    #[test]
    fn duplicate_filename_keeps_later_payload() {
        let parts = classify(&multipart(vec![
            attachment("doc.pdf", "application/pdf", b"first"),
            attachment("other.txt", "text/plain", b"other"),
            attachment("doc.pdf", "application/pdf", b"second"),
        ]));

        assert_eq!(
            parts.attachments,
            vec![
                ("doc.pdf".to_string(), b"second".to_vec()),
                ("other.txt".to_string(), b"other".to_vec()),
            ]
        );
    }

    #[test]
    fn images_with_filenames_are_not_attachments() {
        let parts = classify(&multipart(vec![attachment(
            "logo.png",
            "image/png",
            b"\x89PNG",
        )]));
        assert!(parts.attachments.is_empty());
        assert!(parts.body.is_none());
    }

    #[test]
    fn first_non_empty_reply_to_wins() {
        let empty_reply_to = MessageNode {
            headers: HashMap::from([("reply-to".to_string(), String::new())]),
            ..Default::default()
        };
        let with_reply_to = |addr: &str| MessageNode {
            headers: HashMap::from([("reply-to".to_string(), addr.to_string())]),
            ..leaf(Some("text/html"), b"")
        };

        let parts = classify(&multipart(vec![
            empty_reply_to,
            with_reply_to("first@x.com"),
            with_reply_to("second@x.com"),
        ]));

        assert_eq!(parts.reply_to.as_deref(), Some("first@x.com"));
    }

    #[test]
    fn classification_is_idempotent() {
        let tree = multipart(vec![
            leaf(Some("text/html"), b"<p>hi</p>"),
            attachment("doc.pdf", "application/pdf", b"%PDF"),
        ]);

        assert_eq!(classify(&tree), classify(&tree));
    }

    #[test]
    fn nesting_beyond_depth_cap_is_ignored() {
        let mut tree = leaf(Some("text/html"), b"<p>deep</p>");
        for _ in 0..200 {
            tree = multipart(vec![tree]);
        }

        // Must terminate without exhausting the stack; the overly deep
        // body is simply not reached.
        let parts = classify(&tree);
        assert!(parts.body.is_none());
    }
}
