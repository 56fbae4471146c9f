//! Minimal markup reader for labeling configs.
//!
//! Accepts the XML subset configs are written in: elements with quoted
//! attributes, self-closing tags, comments and `<?…?>` declarations. Text
//! content is not significant and is skipped. Entity references in attribute
//! values (`&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`) are decoded.
//!
//! Elements nest at most [`MAX_DEPTH`] levels; deeper markup is rejected
//! with a markup error.

use regex::Regex;
use std::sync::LazyLock;

use crate::entities::attrs::RawAttrs;
use crate::error::DocumentError;

/// One element of the markup tree.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupNode {
    /// Tag name as written
    pub tag: String,
    /// Attributes in source order, names as written
    pub attrs: RawAttrs,
    pub children: Vec<MarkupNode>,
    /// Byte offset of the opening `<`
    pub offset: usize,
}

/// Maximum element nesting depth.
pub const MAX_DEPTH: usize = 128;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<!--.*?-->|<\?.*?\?>|</\s*([A-Za-z][\w.-]*)\s*>|<([A-Za-z][\w.-]*)((?:\s+[^\s=/>]+\s*=\s*(?:"[^"]*"|'[^']*'))*)\s*(/?)>"#,
    )
    .unwrap_or_else(|e| panic!("invalid markup token pattern: {e}"))
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=/>]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .unwrap_or_else(|e| panic!("invalid attribute pattern: {e}"))
});

fn markup_error(offset: usize, message: impl Into<String>) -> DocumentError {
    DocumentError::Markup {
        offset,
        message: message.into(),
    }
}

fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn parse_attrs(src: &str, base: usize) -> Result<RawAttrs, DocumentError> {
    let mut attrs = RawAttrs::new();
    for cap in ATTR_RE.captures_iter(src) {
        let name = &cap[1];
        let value = cap.get(2).or_else(|| cap.get(3)).map_or("", |m| m.as_str());
        if attrs.keys().any(|k| k.eq_ignore_ascii_case(name)) {
            let at = base + cap.get(1).map_or(0, |m| m.start());
            return Err(markup_error(at, format!("duplicate attribute `{}`", name)));
        }
        attrs.insert(name.to_string(), decode_entities(value));
    }
    Ok(attrs)
}

/// Text between tags may be anything except a stray `<`.
fn check_text(src: &str, start: usize, end: usize) -> Result<(), DocumentError> {
    match src[start..end].find('<') {
        Some(pos) => Err(markup_error(start + pos, "malformed tag")),
        None => Ok(()),
    }
}

/// Parse markup into its top-level elements.
pub fn parse(src: &str) -> Result<Vec<MarkupNode>, DocumentError> {
    let mut roots: Vec<MarkupNode> = Vec::new();
    let mut stack: Vec<MarkupNode> = Vec::new();
    let mut cursor = 0;

    for cap in TOKEN_RE.captures_iter(src) {
        let Some(whole) = cap.get(0) else { continue };
        check_text(src, cursor, whole.start())?;
        cursor = whole.end();

        if let Some(close) = cap.get(1) {
            let Some(node) = stack.pop() else {
                return Err(markup_error(
                    whole.start(),
                    format!("unexpected closing tag </{}>", close.as_str()),
                ));
            };
            if !node.tag.eq_ignore_ascii_case(close.as_str()) {
                return Err(markup_error(
                    whole.start(),
                    format!("</{}> does not close <{}>", close.as_str(), node.tag),
                ));
            }
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => roots.push(node),
            }
        } else if let Some(open) = cap.get(2) {
            if stack.len() >= MAX_DEPTH {
                return Err(markup_error(
                    whole.start(),
                    format!("<{}> nests deeper than {} levels", open.as_str(), MAX_DEPTH),
                ));
            }
            let attrs = match cap.get(3) {
                Some(m) => parse_attrs(m.as_str(), m.start())?,
                None => RawAttrs::new(),
            };
            let node = MarkupNode {
                tag: open.as_str().to_string(),
                attrs,
                children: Vec::new(),
                offset: whole.start(),
            };
            let self_closing = cap.get(4).is_some_and(|m| !m.as_str().is_empty());
            if self_closing {
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => roots.push(node),
                }
            } else {
                stack.push(node);
            }
        }
        // Comments and declarations produce nothing
    }
    check_text(src, cursor, src.len())?;

    if let Some(open) = stack.pop() {
        return Err(markup_error(open.offset, format!("<{}> is never closed", open.tag)));
    }
    Ok(roots)
}
