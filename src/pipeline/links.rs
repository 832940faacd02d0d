//! Link Extractor: pull URLs out of whichever body representation the
//! classifier selected. Never fails; unparsable content yields zero links.

use std::sync::LazyLock;

use regex::Regex;

use super::classify::BodyKind;

/// Anchor tags with an href attribute, best effort over whatever structure
/// is recoverable from the (possibly malformed) HTML.
static HTML_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("anchor pattern is valid")
});

/// Restricted character class: the scan intentionally stops a URL at
/// anything outside letters, digits, dot and slash (so `?`, `#`, `-`
/// terminate a match). Downstream reporting depends on this exact shape.
static TEXT_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[A-Za-z0-9./]+").expect("url pattern is valid"));

/// Extract links from a body, in first-seen order, duplicates preserved
/// (reporting is about volume, not uniqueness).
pub fn extract(body: &[u8], kind: BodyKind) -> Vec<String> {
    let text = decode_lossy(body);

    match kind {
        BodyKind::Html => HTML_ANCHOR
            .captures_iter(&text)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
            .map(|m| m.as_str().to_string())
            // The scheme prefix check is case-sensitive: exactly "http://"
            // or "https://".
            .filter(|href| href.starts_with("http://") || href.starts_with("https://"))
            .collect(),
        BodyKind::Plain => TEXT_URL
            .find_iter(&text)
            .map(|m| m.as_str().to_string())
            .collect(),
    }
}

fn decode_lossy(body: &[u8]) -> String {
    charset::Charset::for_encoding(encoding_rs::UTF_8)
        .decode(body)
        .0
        .to_string()
}

#[cfg(test)]
mod test {
    use super::{extract, BodyKind};

    #[test]
    fn plain_text_urls_in_order_with_duplicates() {
        let body = b"see https://a.example/one and http://b.example/two \
                     and again https://a.example/one";
        assert_eq!(
            extract(body, BodyKind::Plain),
            vec![
                "https://a.example/one",
                "http://b.example/two",
                "https://a.example/one",
            ]
        );
    }

    #[test]
    fn plain_text_url_stops_at_excluded_characters() {
        assert_eq!(
            extract(b"https://x.example/path?q=1#frag", BodyKind::Plain),
            vec!["https://x.example/path"]
        );
        assert_eq!(
            extract(b"https://x.example/a-b", BodyKind::Plain),
            vec!["https://x.example/a"]
        );
    }

    #[test]
    fn plain_text_ignores_other_schemes() {
        assert!(extract(b"ftp://files.example/x", BodyKind::Plain).is_empty());
    }

    #[test]
    fn html_anchors_in_document_order() {
        let body = br#"<html><body>
            <a href="https://pay.example/1">pay</a>
            <p>filler</p>
            <A HREF='http://other.example/2'>other</A>
            <a href=https://bare.example/3>bare</a>
        </body></html>"#;
        assert_eq!(
            extract(body, BodyKind::Html),
            vec![
                "https://pay.example/1",
                "http://other.example/2",
                "https://bare.example/3",
            ]
        );
    }

    #[test]
    fn html_excludes_non_http_and_uppercase_schemes() {
        let body = br#"<a href="mailto:a@x.com">m</a>
            <a href="HTTPS://x.example/">upper</a>
            <a name="anchor">no href</a>
            <a href="https://ok.example/">ok</a>"#;
        assert_eq!(extract(body, BodyKind::Html), vec!["https://ok.example/"]);
    }

    #[test]
    fn malformed_html_is_best_effort() {
        let body = br#"<div><a href="https://x.example/1">unterminated"#;
        assert_eq!(extract(body, BodyKind::Html), vec!["https://x.example/1"]);
    }

    #[test]
    fn empty_body_yields_no_links() {
        assert!(extract(b"", BodyKind::Html).is_empty());
        assert!(extract(b"", BodyKind::Plain).is_empty());
    }

    #[test]
    fn non_utf8_body_is_decoded_lossily() {
        let mut body = b"pre \xff\xfe https://x.example/ok".to_vec();
        body.extend_from_slice(b" \xff");
        assert_eq!(extract(&body, BodyKind::Plain), vec!["https://x.example/ok"]);
    }
}
