//! Custom handling for fenced code blocks.
//!
//! Processors are registered with the renderer and asked in order about every
//! code block that carries a language. The first one that does not return
//! [`ProcessResult::PassThrough`] claims the block.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Outcome of offering a code block to a processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Replace the block with this HTML.
    Inline(String),
    /// Render as a regular code block.
    PassThrough,
}

/// Hook for fences with special meaning.
pub trait CodeBlockProcessor {
    /// Handle one block.
    ///
    /// `attrs` holds the `key=value` pairs following the language in the
    /// fence info string.
    fn process(
        &mut self,
        language: &str,
        attrs: &HashMap<String, String>,
        source: &str,
    ) -> ProcessResult;

    /// Rewrite the rendered document once every event has been handled.
    fn post_process(&mut self, _html: &mut String) {}
}

/// Split a fence info string into language and `key=value` attributes.
#[must_use]
pub(crate) fn parse_fence_info(info: &str) -> (String, HashMap<String, String>) {
    let mut parts = info.split_whitespace();
    let language = parts.next().unwrap_or("").to_owned();

    let mut attrs = HashMap::new();
    for part in parts {
        if let Some((key, value)) = part.split_once('=') {
            let value = value.trim_matches('"').trim_matches('\'');
            attrs.insert(key.to_owned(), value.to_owned());
        }
    }
    (language, attrs)
}

static MERMAID_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<code>mermaid\s+([\s\S]*?)</code>").unwrap());

/// Mermaid diagrams, drawn client-side from `<div class="mermaid">`.
///
/// Claims ```` ```mermaid ```` fences and, after rendering, also rewrites
/// inline or indented code whose text starts with `mermaid`.
#[derive(Debug, Default)]
pub struct MermaidProcessor;

impl CodeBlockProcessor for MermaidProcessor {
    fn process(
        &mut self,
        language: &str,
        _attrs: &HashMap<String, String>,
        source: &str,
    ) -> ProcessResult {
        if language.eq_ignore_ascii_case("mermaid") {
            ProcessResult::Inline(format!(r#"<div class="mermaid">{}</div>"#, source.trim()))
        } else {
            ProcessResult::PassThrough
        }
    }

    fn post_process(&mut self, html: &mut String) {
        if !MERMAID_CODE_RE.is_match(html) {
            return;
        }
        let rewritten = MERMAID_CODE_RE.replace_all(html, |caps: &Captures<'_>| {
            let source = html_escape::decode_html_entities(caps[1].trim());
            format!(r#"<div class="mermaid">{source}</div>"#)
        });
        *html = rewritten.into_owned();
    }
}
