//! State tracked while walking markdown events.

use std::collections::HashMap;

use pulldown_cmark::Alignment;

/// Fenced or indented code block being collected.
#[derive(Default)]
pub(crate) struct CodeBlockState {
    active: bool,
    language: Option<String>,
    buffer: String,
}

impl CodeBlockState {
    pub(crate) fn start(&mut self, language: Option<String>) {
        self.active = true;
        self.language = language;
        self.buffer.clear();
    }

    /// End the block and return `(language, content)`.
    pub(crate) fn end(&mut self) -> (Option<String>, String) {
        self.active = false;
        (self.language.take(), std::mem::take(&mut self.buffer))
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }
}

/// Column alignment and header tracking for tables.
#[derive(Default)]
pub(crate) struct TableState {
    in_head: bool,
    alignments: Vec<Alignment>,
    cell_index: usize,
}

impl TableState {
    pub(crate) fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    pub(crate) fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub(crate) fn end_head(&mut self) {
        self.in_head = false;
    }

    pub(crate) fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub(crate) fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    pub(crate) fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// `style` attribute for the current cell, empty when unaligned.
    pub(crate) fn current_alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" style="text-align: left;""#,
            Some(Alignment::Center) => r#" style="text-align: center;""#,
            Some(Alignment::Right) => r#" style="text-align: right;""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// Alt text capture between image start and end.
#[derive(Default)]
pub(crate) struct ImageState {
    active: bool,
    alt_text: String,
}

impl ImageState {
    pub(crate) fn start(&mut self) {
        self.active = true;
        self.alt_text.clear();
    }

    pub(crate) fn end(&mut self) -> String {
        self.active = false;
        std::mem::take(&mut self.alt_text)
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.alt_text.push_str(text);
    }
}

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    pub title: String,
    /// Anchor id of the heading.
    pub id: String,
}

/// Heading ids, the page title and the table of contents.
#[derive(Default)]
pub(crate) struct HeadingState {
    title: Option<String>,
    current: Option<(u8, Option<String>)>,
    text: String,
    html: String,
    toc: Vec<TocEntry>,
    id_counts: HashMap<String, usize>,
}

impl HeadingState {
    pub(crate) fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Start a heading; `explicit_id` comes from a `{#id}` attribute.
    pub(crate) fn start_heading(&mut self, level: u8, explicit_id: Option<String>) {
        self.current = Some((level, explicit_id));
        self.text.clear();
        self.html.clear();
    }

    /// Finish the heading and return `(level, id, html)`.
    ///
    /// The first level-one heading becomes the page title and is kept out of
    /// the table of contents.
    pub(crate) fn complete_heading(&mut self) -> Option<(u8, String, String)> {
        let (level, explicit_id) = self.current.take()?;
        let text = std::mem::take(&mut self.text);
        let html = std::mem::take(&mut self.html);
        let id = match explicit_id {
            Some(id) => id,
            None => self.generate_id(&text),
        };

        let title = text.trim().to_owned();
        if level == 1 && self.title.is_none() {
            self.title = Some(title);
        } else {
            self.toc.push(TocEntry {
                level,
                title,
                id: id.clone(),
            });
        }
        Some((level, id, html))
    }

    fn generate_id(&mut self, text: &str) -> String {
        let base = slugify(text);
        let count = self.id_counts.entry(base.clone()).or_default();
        let id = match *count {
            0 => base,
            n => format!("{base}_{n}"),
        };
        *count += 1;
        id
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub(crate) fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }

    pub(crate) fn take_title(&mut self) -> Option<String> {
        self.title.take()
    }

    pub(crate) fn take_toc(&mut self) -> Vec<TocEntry> {
        std::mem::take(&mut self.toc)
    }
}

/// Lowercase anchor slug.
///
/// Letters and digits (including non-ASCII ones such as `ă` or `ș`) are kept,
/// runs of whitespace, dashes and underscores collapse to one dash, anything
/// else is dropped.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }
    result
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("  Livrare și retur  "), "livrare-și-retur");
        assert_eq!(slugify("snake_case"), "snake-case");
        assert_eq!(slugify("--"), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>"), "&lt;b&gt;");
        assert_eq!(escape_html("a & 'b'"), "a &amp; &#x27;b&#x27;");
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let mut state = HeadingState::default();
        let mut ids = Vec::new();
        for _ in 0..3 {
            state.start_heading(2, None);
            state.push_text("FAQ");
            ids.push(state.complete_heading().map(|(_, id, _)| id));
        }
        assert_eq!(
            ids,
            vec![
                Some("faq".to_owned()),
                Some("faq_1".to_owned()),
                Some("faq_2".to_owned())
            ]
        );
    }

    #[test]
    fn test_first_h1_is_title() {
        let mut state = HeadingState::default();
        state.start_heading(1, None);
        state.push_text("Despre noi");
        state.complete_heading();
        state.start_heading(1, Some("other".to_owned()));
        state.push_text("Second");
        let (_, id, _) = state.complete_heading().unwrap();

        assert_eq!(id, "other");
        assert_eq!(state.take_title(), Some("Despre noi".to_owned()));
        assert_eq!(state.take_toc().len(), 1);
    }

    #[test]
    fn test_table_alignment() {
        let mut table = TableState::default();
        table.start(vec![Alignment::None, Alignment::Right]);
        table.start_row();
        assert_eq!(table.current_alignment_style(), "");
        table.next_cell();
        assert_eq!(
            table.current_alignment_style(),
            r#" style="text-align: right;""#
        );
    }

    #[test]
    fn test_code_block_state() {
        let mut state = CodeBlockState::default();
        state.start(Some("mermaid".to_owned()));
        state.push_str("graph TD");
        assert!(state.is_active());
        assert_eq!(state.end(), (Some("mermaid".to_owned()), "graph TD".to_owned()));
        assert!(!state.is_active());
    }
}
