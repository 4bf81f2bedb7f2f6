//! Markdown content pipeline for storefront pages.
//!
//! [`markdownify`] turns markdown into sanitized HTML:
//!
//! 1. `@youtube(...)` lines become player iframes
//! 2. pulldown-cmark events are rendered by [`MarkdownRenderer`] with tables,
//!    footnotes, task lists, definition lists, heading ids, emoji shortcodes,
//!    bare URL links and newline breaks; mermaid fences become diagram `div`s
//! 3. remaining `<code>mermaid ...</code>` is rewritten to diagram `div`s
//! 4. the result passes the allow-list sanitizer
//!
//! [`MarkdownLoader`] finds the localized source file for a page name and
//! substitutes template variables before rendering.
//!
//! # Example
//!
//! ```
//! let html = ws_markdown::markdownify("## Livrare\n\nGratuită :truck:");
//! assert!(html.starts_with(r#"<h2 id="livrare">Livrare</h2>"#));
//! assert!(html.contains(r#"class="emoji""#));
//! ```

mod backend;
mod code_block;
mod loader;
mod renderer;
mod sanitize;
mod state;
mod youtube;

use pulldown_cmark::Parser;

pub use backend::{HtmlBackend, RenderBackend};
pub use code_block::{CodeBlockProcessor, MermaidProcessor, ProcessResult};
pub use loader::{MarkdownError, MarkdownLoader, not_found_comment};
pub use renderer::{EMOJI_IMAGE_BASE, MarkdownRenderer, RenderResult, parser_options};
pub use sanitize::{clean, sanitize};
pub use state::{TocEntry, escape_html, slugify};
pub use youtube::preprocess_youtube;

/// Run the full pipeline, keeping the title and table of contents.
pub fn render(markdown: &str) -> RenderResult {
    let source = preprocess_youtube(markdown);
    let parser = Parser::new_ext(&source, parser_options());
    let mut result = MarkdownRenderer::<HtmlBackend>::new()
        .with_processor(MermaidProcessor)
        .render(parser);
    result.html = clean(&result.html);
    result
}

/// Markdown to sanitized HTML.
pub fn markdownify(markdown: &str) -> String {
    render(markdown).html
}
