//! Save-boundary sanitization.
//!
//! Blocks are cleaned keyed by their type (never by where the value came
//! from) right before they are persisted or handed to the public renderer.
//! Plain-text fields lose markup entirely; rich-text fields lose script/style
//! elements, inline event handlers and `javascript:`/`data:` URLs; URL fields
//! are restricted to a small scheme allowlist.

use crate::models::{Block, BlockData};

/// Remove every `<...>` sequence, keeping the text between tags.
pub(crate) fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

fn remove_element(html: &str, name: &str) -> String {
    let open = format!("<{name}");
    let close = format!("</{name}>");
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;

    while let Some(start) = lower[pos..].find(&open) {
        let start = pos + start;
        out.push_str(&html[pos..start]);
        match lower[start..].find(&close) {
            Some(end) => pos = start + end + close.len(),
            None => {
                // Unclosed element: drop the rest.
                pos = html.len();
            }
        }
    }
    out.push_str(&html[pos..]);
    out
}

fn remove_event_handlers(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let bytes = html.as_bytes();
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;

    while let Some(found) = lower[pos..].find(" on") {
        let attr_start = pos + found;
        // Must look like ` onxxx=`; otherwise keep scanning.
        let rest = &lower[attr_start + 3..];
        let name_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let after_name = attr_start + 3 + name_len;
        if name_len == 0 || !lower[after_name..].starts_with('=') {
            out.push_str(&html[pos..attr_start + 1]);
            pos = attr_start + 1;
            continue;
        }

        out.push_str(&html[pos..attr_start]);

        // Skip the attribute value (quoted or bare).
        let mut i = after_name + 1;
        if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
            let quote = bytes[i];
            i += 1;
            while i < bytes.len() && bytes[i] != quote {
                i += 1;
            }
            i = (i + 1).min(bytes.len());
        } else {
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                i += 1;
            }
        }
        pos = i;
    }
    out.push_str(&html[pos..]);
    out
}

/// Sanitize a rich-text HTML fragment.
pub(crate) fn sanitize_html(html: &str) -> String {
    let mut out = remove_element(html, "script");
    out = remove_element(&out, "style");
    out = remove_element(&out, "iframe");
    out = remove_event_handlers(&out);

    // Neutralize script-bearing URL schemes wherever they appear in attributes.
    let lower = out.to_ascii_lowercase();
    for scheme in ["javascript:", "data:", "vbscript:"] {
        if lower.contains(scheme) {
            let mut cleaned = String::with_capacity(out.len());
            let mut pos = 0;
            let lower = out.to_ascii_lowercase();
            while let Some(found) = lower[pos..].find(scheme) {
                let at = pos + found;
                cleaned.push_str(&out[pos..at]);
                pos = at + scheme.len();
            }
            cleaned.push_str(&out[pos..]);
            out = cleaned;
        }
    }
    out
}

/// Allow http(s), mailto, tel, same-site relative paths and fragments.
pub(crate) fn sanitize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let lower = trimmed.to_ascii_lowercase();
    let allowed = lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || trimmed.starts_with('/')
        || trimmed.starts_with('#');
    if allowed {
        trimmed.to_string()
    } else {
        String::new()
    }
}

fn sanitize_one(block: &mut Block) {
    match &mut block.data {
        BlockData::Heading(h) => h.text = strip_tags(&h.text),
        BlockData::Text(t) => t.html = sanitize_html(&t.html),
        BlockData::Image(i) => {
            i.src = sanitize_url(&i.src);
            i.alt = strip_tags(&i.alt);
            i.caption = strip_tags(&i.caption);
        }
        BlockData::Button(b) => {
            b.label = strip_tags(&b.label);
            b.href = sanitize_url(&b.href);
        }
        BlockData::Video(v) => {
            v.url = sanitize_url(&v.url);
            v.caption = strip_tags(&v.caption);
        }
        BlockData::Quote(q) => {
            q.text = strip_tags(&q.text);
            q.attribution = strip_tags(&q.attribution);
        }
        BlockData::Form(f) => {
            f.action = sanitize_url(&f.action);
            f.submit_label = strip_tags(&f.submit_label);
            for field in &mut f.fields {
                field.label = strip_tags(&field.label);
            }
        }
        BlockData::Social(s) => {
            for link in &mut s.links {
                link.url = sanitize_url(&link.url);
            }
        }
        BlockData::Accordion(a) => {
            for item in &mut a.items {
                item.title = strip_tags(&item.title);
                item.body = sanitize_html(&item.body);
            }
        }
        // Code is rendered escaped, tables hold plain strings, the rest carry
        // no markup or URLs.
        BlockData::Code(_)
        | BlockData::Table(_)
        | BlockData::Spacer(_)
        | BlockData::Divider(_)
        | BlockData::Toc(_)
        | BlockData::Columns(_) => {}
    }
}

/// Sanitized deep copy of the tree, column slots included.
pub(crate) fn sanitize_blocks(blocks: &[Block]) -> Vec<Block> {
    let mut out = blocks.to_vec();
    for b in &mut out {
        if let BlockData::Columns(c) = &mut b.data {
            for slot in &mut c.columns {
                for inner in &mut slot.blocks {
                    sanitize_one(inner);
                }
            }
        }
        sanitize_one(b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::merge_content;
    use crate::models::{BlockType, ColumnSlot, ColumnsContent};

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<b>bold</b> text"), "bold text");
        assert_eq!(strip_tags("plain"), "plain");
    }

    #[test]
    fn test_sanitize_html_drops_script_and_handlers() {
        let dirty = r#"<p onclick="steal()">hi</p><script>alert(1)</script><em>ok</em>"#;
        let clean = sanitize_html(dirty);
        assert!(!clean.contains("script"));
        assert!(!clean.contains("onclick"));
        assert!(!clean.contains("steal"));
        assert!(clean.contains("<em>ok</em>"));
        assert!(clean.contains("hi"));
    }

    #[test]
    fn test_sanitize_html_neutralizes_javascript_urls() {
        let dirty = r#"<a href="JavaScript:alert(1)">x</a>"#;
        let clean = sanitize_html(dirty);
        assert!(!clean.to_ascii_lowercase().contains("javascript:"));
    }

    #[test]
    fn test_sanitize_url_allowlist() {
        assert_eq!(sanitize_url("https://example.com/a"), "https://example.com/a");
        assert_eq!(sanitize_url("/contact"), "/contact");
        assert_eq!(sanitize_url("  #top "), "#top");
        assert_eq!(sanitize_url("javascript:alert(1)"), "");
        assert_eq!(sanitize_url("data:text/html,x"), "");
    }

    #[test]
    fn test_sanitize_blocks_recurses_into_slots() {
        let mut nested = crate::models::Block::new(BlockType::Text);
        merge_content(
            &mut nested.data,
            &serde_json::json!({"html": "<script>x</script><p>keep</p>"}),
        );

        let mut cols = crate::models::Block::new(BlockType::Columns);
        cols.data = crate::models::BlockData::Columns(ColumnsContent {
            columns: vec![ColumnSlot {
                blocks: vec![nested],
            }],
            column_widths: None,
        });

        let out = sanitize_blocks(&[cols]);
        let crate::models::BlockData::Columns(c) = &out[0].data else {
            panic!()
        };
        let crate::models::BlockData::Text(t) = &c.columns[0].blocks[0].data else {
            panic!()
        };
        assert_eq!(t.html, "<p>keep</p>");
    }
}
