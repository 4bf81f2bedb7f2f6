//! Markdown event renderer.

use std::collections::HashMap;
use std::fmt::Write;
use std::marker::PhantomData;
use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, LinkType, Options, Tag, TagEnd};
use regex::Regex;

use crate::backend::RenderBackend;
use crate::code_block::{CodeBlockProcessor, ProcessResult, parse_fence_info};
use crate::state::{CodeBlockState, HeadingState, ImageState, TableState, TocEntry, escape_html};

/// GitHub-hosted PNGs for emoji shortcodes.
pub const EMOJI_IMAGE_BASE: &str = "https://github.githubassets.com/images/icons/emoji/unicode/";

/// Bare URLs and `:shortcode:` emoji in plain text.
static INLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?P<url>\b(?:https?://|www\.)[^\s<>"']*[^\s<>"'.,:;!?)\]}])|:(?P<emoji>[a-z0-9_+\-]+):"#,
    )
    .unwrap()
});

/// Parser extensions used for storefront content.
#[must_use]
pub fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_DEFINITION_LIST
}

/// Rendered document.
#[derive(Clone, Debug)]
pub struct RenderResult {
    pub html: String,
    /// Text of the first level-one heading.
    pub title: Option<String>,
    pub toc: Vec<TocEntry>,
}

/// Footnote numbering and collected definitions.
#[derive(Default)]
struct Footnotes {
    numbers: HashMap<String, usize>,
    definitions: Vec<(String, String)>,
    /// Label and the document output set aside while a definition renders.
    open: Option<(String, String)>,
}

impl Footnotes {
    fn number(&mut self, label: &str) -> usize {
        let next = self.numbers.len() + 1;
        *self.numbers.entry(label.to_owned()).or_insert(next)
    }

    /// `<div class="footnote">` block, ordered by first reference.
    fn render(&mut self) -> Option<String> {
        if self.definitions.is_empty() {
            return None;
        }
        let mut definitions = std::mem::take(&mut self.definitions);
        for (label, _) in &definitions {
            self.number(label);
        }
        definitions.sort_by_key(|(label, _)| self.numbers.get(label).copied());

        let mut out = String::from("<div class=\"footnote\">\n<hr>\n<ol>\n");
        for (label, body) in definitions {
            let label = escape_html(&label);
            let backref = format!(
                "&#160;<a class=\"footnote-backref\" href=\"#fnref:{label}\" title=\"Jump back to footnote\">&#8617;</a>"
            );
            let body = match body.strip_suffix("</p>") {
                Some(head) => format!("{head}{backref}</p>"),
                None => format!("{body}{backref}"),
            };
            writeln!(out, "<li id=\"fn:{label}\">{body}</li>").unwrap();
        }
        out.push_str("</ol>\n</div>");
        Some(out)
    }
}

/// Markdown renderer generic over its output backend.
///
/// Code block processors are consulted in registration order; see
/// [`with_processor`](Self::with_processor).
pub struct MarkdownRenderer<B: RenderBackend> {
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    heading_classes: Vec<String>,
    pending_image: Option<(String, String)>,
    /// Adjacent text events, joined before emoji and URL detection.
    pending_text: String,
    link_depth: usize,
    processors: Vec<Box<dyn CodeBlockProcessor>>,
    pending_attrs: HashMap<String, String>,
    footnotes: Footnotes,
    _backend: PhantomData<B>,
}

impl<B: RenderBackend> MarkdownRenderer<B> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::default(),
            heading_classes: Vec::new(),
            pending_image: None,
            pending_text: String::new(),
            link_depth: 0,
            processors: Vec::new(),
            pending_attrs: HashMap::new(),
            footnotes: Footnotes::default(),
            _backend: PhantomData,
        }
    }

    /// Register a code block processor.
    #[must_use]
    pub fn with_processor<P: CodeBlockProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Render `events`, then let every processor post-process the HTML.
    pub fn render<'a, I>(&mut self, events: I) -> RenderResult
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }
        self.flush_text();

        if let Some(footnotes) = self.footnotes.render() {
            self.output.push_str(&footnotes);
        }

        let mut html = std::mem::take(&mut self.output);
        for processor in &mut self.processors {
            processor.post_process(&mut html);
        }

        RenderResult {
            html,
            title: self.heading.take_title(),
            toc: self.heading.take_toc(),
        }
    }

    fn push_inline(&mut self, content: &str) {
        if self.image.is_active() {
            return;
        }
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        if let Event::Text(text) = event {
            self.text(&text);
            return;
        }
        self.flush_text();

        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) => self.output.push_str(&html),
            Event::InlineHtml(html) => self.push_inline(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => B::hard_break(&mut self.output),
            Event::Rule => B::horizontal_rule(&mut self.output),
            Event::TaskListMarker(checked) => B::task_list_marker(checked, &mut self.output),
            Event::FootnoteReference(label) => self.footnote_reference(&label),
            Event::Text(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {}
        }
    }

    #[allow(clippy::too_many_lines)]
    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading {
                level, id, classes, ..
            } => {
                self.heading_classes = classes.iter().map(ToString::to_string).collect();
                self.heading
                    .start_heading(heading_level_to_num(level), id.map(|id| id.to_string()));
            }
            Tag::BlockQuote(_) => B::blockquote_start(&mut self.output),
            Tag::CodeBlock(kind) => {
                let (lang, attrs) = match kind {
                    CodeBlockKind::Fenced(ref info) if !info.is_empty() => {
                        let (lang, attrs) = parse_fence_info(info);
                        ((!lang.is_empty()).then_some(lang), attrs)
                    }
                    _ => (None, HashMap::new()),
                };
                self.pending_attrs = attrs;
                self.code.start(lang);
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(label) => {
                let saved = std::mem::take(&mut self.output);
                self.footnotes.open = Some((label.to_string(), saved));
            }
            Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let cell = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.output, "<{cell}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let href = if link_type == LinkType::Email {
                    format!("mailto:{dest_url}")
                } else {
                    dest_url.to_string()
                };
                let title_attr = if title.is_empty() {
                    String::new()
                } else {
                    format!(r#" title="{}""#, escape_html(&title))
                };
                let link = format!(r#"<a href="{}"{title_attr}>"#, escape_html(&href));
                self.push_inline(&link);
                self.link_depth += 1;
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.image.start();
                self.pending_image = Some((dest_url.to_string(), title.to_string()));
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(_) => {
                if let Some((level, id, html)) = self.heading.complete_heading() {
                    let classes = std::mem::take(&mut self.heading_classes);
                    let class_attr = if classes.is_empty() {
                        String::new()
                    } else {
                        format!(r#" class="{}""#, escape_html(&classes.join(" ")))
                    };
                    write!(
                        self.output,
                        r#"<h{level} id="{}"{class_attr}>{}</h{level}>"#,
                        escape_html(&id),
                        html.trim()
                    )
                    .unwrap();
                }
            }
            TagEnd::BlockQuote(_) => B::blockquote_end(&mut self.output),
            TagEnd::CodeBlock => self.finish_code_block(),
            TagEnd::List(ordered) => self
                .output
                .push_str(if ordered { "</ol>" } else { "</ul>" }),
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition => {
                if let Some((label, saved)) = self.footnotes.open.take() {
                    let body = std::mem::replace(&mut self.output, saved);
                    self.footnotes.definitions.push((label, body));
                }
            }
            TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => {
                self.push_inline("</a>");
                self.link_depth = self.link_depth.saturating_sub(1);
            }
            TagEnd::Image => {
                let alt = self.image.end();
                if let Some((src, title)) = self.pending_image.take() {
                    let mut img = String::new();
                    B::image(&src, &alt, &title, &mut img);
                    self.push_inline(&img);
                }
            }
        }
    }

    fn finish_code_block(&mut self) {
        let (lang, content) = self.code.end();
        let attrs = std::mem::take(&mut self.pending_attrs);

        let claimed = lang.as_deref().and_then(|lang| {
            self.processors
                .iter_mut()
                .find_map(|processor| match processor.process(lang, &attrs, &content) {
                    ProcessResult::Inline(html) => Some(html),
                    ProcessResult::PassThrough => None,
                })
        });

        match claimed {
            Some(html) => self.output.push_str(&html),
            None => B::code_block(lang.as_deref(), &content, &mut self.output),
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else {
            if self.heading.is_active() {
                self.heading.push_text(text);
            }
            self.pending_text.push_str(text);
        }
    }

    fn flush_text(&mut self) {
        if self.pending_text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending_text);
        let html = render_text(&text, self.link_depth == 0);
        self.push_inline(&html);
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        let html = format!("<code>{}</code>", escape_html(code));
        self.push_inline(&html);
    }

    fn soft_break(&mut self) {
        if self.heading.is_active() {
            self.heading.push_text(" ");
            self.heading.push_html(" ");
        } else if self.image.is_active() {
            self.image.push_str(" ");
        } else {
            B::soft_break(&mut self.output);
        }
    }

    fn footnote_reference(&mut self, label: &str) {
        let number = self.footnotes.number(label);
        let label = escape_html(label);
        let html = format!(
            r##"<sup id="fnref:{label}"><a class="footnote-ref" href="#fn:{label}">{number}</a></sup>"##
        );
        self.push_inline(&html);
    }
}

impl<B: RenderBackend> Default for MarkdownRenderer<B> {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// `<img class="emoji">` for a known shortcode.
fn emoji_image(shortcode: &str) -> Option<String> {
    let emoji = emojis::get_by_shortcode(shortcode)?;
    let file = emoji
        .as_str()
        .chars()
        .filter(|c| *c != '\u{fe0f}')
        .map(|c| format!("{:x}", u32::from(c)))
        .collect::<Vec<_>>()
        .join("-");
    Some(format!(
        r#"<img alt=":{shortcode}:" class="emoji" title=":{shortcode}:" src="{EMOJI_IMAGE_BASE}{file}.png">"#
    ))
}

/// Escape plain text, expanding emoji shortcodes and, when `linkify` is set,
/// turning bare URLs into links.
fn render_text(text: &str, linkify: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in INLINE_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let replacement = if let Some(url) = caps.name("url") {
            linkify.then(|| {
                let url = url.as_str();
                let href = if url.starts_with("www.") {
                    format!("http://{url}")
                } else {
                    url.to_owned()
                };
                format!(
                    r#"<a href="{}">{}</a>"#,
                    escape_html(&href),
                    escape_html(url)
                )
            })
        } else {
            caps.name("emoji").and_then(|code| emoji_image(code.as_str()))
        };

        if let Some(html) = replacement {
            out.push_str(&escape_html(&text[last..whole.start()]));
            out.push_str(&html);
            last = whole.end();
        }
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HtmlBackend;
    use crate::code_block::MermaidProcessor;
    use pretty_assertions::assert_eq;
    use pulldown_cmark::Parser;

    fn render(markdown: &str) -> RenderResult {
        let parser = Parser::new_ext(markdown, parser_options());
        MarkdownRenderer::<HtmlBackend>::new()
            .with_processor(MermaidProcessor)
            .render(parser)
    }

    #[test]
    fn test_paragraph_newlines_become_breaks() {
        let result = render("Line one\nLine two");
        assert_eq!(result.html, "<p>Line one<br>\nLine two</p>");
    }

    #[test]
    fn test_heading_ids_and_toc() {
        let result = render("# Despre noi\n\n## Livrare\n\n## Livrare\n\n### Custom {#retur .lead}");
        assert_eq!(result.title, Some("Despre noi".to_owned()));
        assert_eq!(
            result.html,
            "<h1 id=\"despre-noi\">Despre noi</h1>\
             <h2 id=\"livrare\">Livrare</h2>\
             <h2 id=\"livrare_1\">Livrare</h2>\
             <h3 id=\"retur\" class=\"lead\">Custom</h3>"
        );
        let ids: Vec<_> = result.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["livrare", "livrare_1", "retur"]);
    }

    #[test]
    fn test_fenced_code_keeps_language_class() {
        let result = render("```python\nprint('<hi>')\n```");
        assert_eq!(
            result.html,
            "<pre><code class=\"language-python\">print(&#x27;&lt;hi&gt;&#x27;)\n</code></pre>"
        );
    }

    #[test]
    fn test_mermaid_fence() {
        let result = render("```mermaid\ngraph TD\n  A-->B\n```");
        assert_eq!(result.html, "<div class=\"mermaid\">graph TD\n  A-->B</div>");
    }

    #[test]
    fn test_table_alignment() {
        let result = render("| a | b |\n|:--|--:|\n| 1 | 2 |");
        assert_eq!(
            result.html,
            "<table><thead><tr><th style=\"text-align: left;\">a</th>\
             <th style=\"text-align: right;\">b</th></tr></thead><tbody>\
             <tr><td style=\"text-align: left;\">1</td>\
             <td style=\"text-align: right;\">2</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_task_list_and_strikethrough() {
        let result = render("- [x] ~~done~~\n- [ ] todo");
        assert_eq!(
            result.html,
            "<ul><li><input type=\"checkbox\" checked disabled> <s>done</s></li>\
             <li><input type=\"checkbox\" disabled> todo</li></ul>"
        );
    }

    #[test]
    fn test_definition_list() {
        let result = render("Term\n: Definition");
        assert!(result.html.starts_with("<dl><dt>Term</dt><dd>"), "{}", result.html);
        assert!(result.html.contains("Definition"));
    }

    #[test]
    fn test_emoji_shortcode() {
        let result = render("Salut :smile:!");
        assert_eq!(
            result.html,
            format!(
                "<p>Salut <img alt=\":smile:\" class=\"emoji\" title=\":smile:\" \
                 src=\"{EMOJI_IMAGE_BASE}1f604.png\">!</p>"
            )
        );
    }

    #[test]
    fn test_unknown_shortcode_kept() {
        let result = render("Ora 10:30:45 și :not_an_emoji_xyz:");
        assert_eq!(result.html, "<p>Ora 10:30:45 și :not_an_emoji_xyz:</p>");
    }

    #[test]
    fn test_bare_url_autolinked() {
        let result = render("Vezi https://example.com/shop?a=1. Sau www.example.ro");
        assert_eq!(
            result.html,
            "<p>Vezi <a href=\"https://example.com/shop?a=1\">https://example.com/shop?a=1</a>. \
             Sau <a href=\"http://www.example.ro\">www.example.ro</a></p>"
        );
    }

    #[test]
    fn test_url_inside_link_not_nested() {
        let result = render("[https://example.com](https://example.com)");
        assert_eq!(
            result.html,
            "<p><a href=\"https://example.com\">https://example.com</a></p>"
        );
    }

    #[test]
    fn test_email_autolink() {
        let result = render("<shop@example.com>");
        assert_eq!(
            result.html,
            "<p><a href=\"mailto:shop@example.com\">shop@example.com</a></p>"
        );
    }

    #[test]
    fn test_footnotes() {
        let result = render("Text[^note].\n\n[^note]: Explanation.");
        assert!(result.html.starts_with(
            "<p>Text<sup id=\"fnref:note\"><a class=\"footnote-ref\" href=\"#fn:note\">1</a></sup>.</p>"
        ));
        assert!(result.html.contains("<li id=\"fn:note\"><p>Explanation.&#160;<a class=\"footnote-backref\""));
        assert!(result.html.ends_with("</ol>\n</div>"));
    }

    #[test]
    fn test_image_alt_text() {
        let result = render("![Logo *magazin*](/static/logo.png \"Brand\")");
        assert_eq!(
            result.html,
            "<p><img src=\"/static/logo.png\" alt=\"Logo magazin\" title=\"Brand\"></p>"
        );
    }
}
