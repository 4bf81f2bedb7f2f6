//! Allow-list HTML sanitizer for rendered markdown.
//!
//! The fragment is parsed with `scraper` and serialized again keeping only
//! allowed tags and attributes, attributes in name order. Disallowed elements
//! are unwrapped (their children survive), except `script` and `style` whose
//! contents are dropped.

use scraper::{ElementRef, Html, Node};

const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "b", "blockquote", "code", "em", "i", "li", "ol", "strong", "ul",
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "pre", "img", "table", "thead", "tbody", "tr", "th",
    "td", "hr", "br", "span", "div", "iframe", "s", "sup", "dl", "dt", "dd", "input",
];

/// Attributes allowed on every tag.
const GLOBAL_ATTRS: &[&str] = &["class", "href", "title", "src", "alt", "style", "id"];

const DROP_CONTENT: &[&str] = &["script", "style"];

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input"];

const URL_ATTRS: &[&str] = &["href", "src"];

const ALLOWED_PROTOCOLS: &[&str] = &["http", "https", "mailto"];

const ALLOWED_CSS: &[&str] = &[
    "background-color",
    "border-color",
    "clear",
    "color",
    "display",
    "float",
    "font",
    "font-family",
    "font-size",
    "font-style",
    "font-weight",
    "height",
    "letter-spacing",
    "line-height",
    "margin",
    "max-width",
    "overflow",
    "padding",
    "text-align",
    "text-decoration",
    "text-indent",
    "vertical-align",
    "white-space",
    "width",
];

/// Attributes allowed on `tag` beyond [`GLOBAL_ATTRS`].
fn tag_attrs(tag: &str) -> &'static [&'static str] {
    match tag {
        "iframe" => &["width", "height", "frameborder", "allow", "allowfullscreen"],
        "input" => &["type", "checked", "disabled"],
        _ => &[],
    }
}

/// Whether a URL uses an allowed scheme or is relative.
fn is_safe_url(url: &str) -> bool {
    let url = url.trim();
    let scheme_end = url.find(|c: char| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(i) if url[i..].starts_with(':') => {
            let scheme = url[..i].to_ascii_lowercase();
            ALLOWED_PROTOCOLS.contains(&scheme.as_str())
        }
        _ => true,
    }
}

/// Keep only allowed CSS declarations; `None` when nothing survives.
fn clean_style(style: &str) -> Option<String> {
    let declarations: Vec<String> = style
        .split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            let lowered = value.to_ascii_lowercase();
            let safe = ALLOWED_CSS.contains(&name.as_str())
                && !value.is_empty()
                && !lowered.contains("url(")
                && !lowered.contains("expression(");
            safe.then(|| format!("{name}: {value};"))
        })
        .collect();
    (!declarations.is_empty()).then(|| declarations.join(" "))
}

fn clean_attr(tag: &str, name: &str, value: &str) -> Option<String> {
    if !GLOBAL_ATTRS.contains(&name) && !tag_attrs(tag).contains(&name) {
        return None;
    }
    if URL_ATTRS.contains(&name) && !is_safe_url(value) {
        return None;
    }
    if name == "style" {
        return clean_style(value);
    }
    Some(value.to_owned())
}

fn write_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&html_escape::encode_text(&**text)),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(child, out);
                }
            }
            _ => {}
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let el = element.value();
    let tag = el.name();

    if DROP_CONTENT.contains(&tag) {
        return;
    }
    if !ALLOWED_TAGS.contains(&tag) {
        write_children(element, out);
        return;
    }

    let mut attrs: Vec<(&str, &str)> = el.attrs().collect();
    attrs.sort_unstable_by_key(|(name, _)| *name);

    out.push('<');
    out.push_str(tag);
    for (name, value) in attrs {
        if let Some(value) = clean_attr(tag, name, value) {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(&value));
            out.push('"');
        }
    }
    out.push('>');

    if VOID_TAGS.contains(&tag) {
        return;
    }
    write_children(element, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Sanitize an HTML fragment.
pub fn sanitize(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_children(fragment.root_element(), &mut out);
    out
}

/// Sanitize, then restore `>` the way storefront content expects it.
///
/// Diagram sources such as `A-->B` survive this unescaped.
pub fn clean(html: &str) -> String {
    sanitize(html).replace("&gt;", ">")
}
