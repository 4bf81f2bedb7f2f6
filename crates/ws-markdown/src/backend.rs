//! Output backend for the markdown renderer.

use std::fmt::Write;

use crate::state::escape_html;

/// Element-level markup the renderer delegates to its backend.
pub trait RenderBackend {
    /// Render a code block not claimed by any processor.
    fn code_block(lang: Option<&str>, content: &str, out: &mut String);

    fn blockquote_start(out: &mut String) {
        out.push_str("<blockquote>");
    }

    fn blockquote_end(out: &mut String) {
        out.push_str("</blockquote>");
    }

    fn image(src: &str, alt: &str, title: &str, out: &mut String);

    /// Line break inside a paragraph.
    fn soft_break(out: &mut String) {
        out.push('\n');
    }

    fn hard_break(out: &mut String) {
        out.push_str("<br>\n");
    }

    fn horizontal_rule(out: &mut String) {
        out.push_str("<hr>");
    }

    fn task_list_marker(checked: bool, out: &mut String) {
        if checked {
            out.push_str(r#"<input type="checkbox" checked disabled> "#);
        } else {
            out.push_str(r#"<input type="checkbox" disabled> "#);
        }
    }
}

/// Storefront HTML.
///
/// Code blocks keep a `language-*` class for client-side highlighting and
/// every source newline inside a paragraph becomes a `<br>`.
pub struct HtmlBackend;

impl RenderBackend for HtmlBackend {
    fn code_block(lang: Option<&str>, content: &str, out: &mut String) {
        if let Some(lang) = lang {
            write!(
                out,
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(content)
            )
            .unwrap();
        } else {
            write!(out, "<pre><code>{}</code></pre>", escape_html(content)).unwrap();
        }
    }

    fn image(src: &str, alt: &str, title: &str, out: &mut String) {
        let title_attr = if title.is_empty() {
            String::new()
        } else {
            format!(r#" title="{}""#, escape_html(title))
        };
        write!(
            out,
            r#"<img src="{}" alt="{}"{title_attr}>"#,
            escape_html(src),
            escape_html(alt)
        )
        .unwrap();
    }

    fn soft_break(out: &mut String) {
        out.push_str("<br>\n");
    }
}
