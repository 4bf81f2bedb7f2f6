//! `@youtube(...)` embeds.
//!
//! Runs on the markdown source before parsing. A line containing
//! `@youtube(URL[, width=N][, height=N])` is replaced as a whole by the
//! player iframe, so the iframe reaches the parser as an HTML block.

use std::sync::LazyLock;

use regex::Regex;

const DEFAULT_WIDTH: &str = "560";
const DEFAULT_HEIGHT: &str = "315";

static YOUTUBE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"@youtube\(\s*(https?://[^\s,]+)(?:,\s*width=(\d+))?(?:,\s*height=(\d+))?\s*\)",
    )
    .unwrap()
});

/// Open code fence: marker character and run length.
#[derive(Debug, Default)]
struct Fence(Option<(char, usize)>);

impl Fence {
    /// Feed one line; returns whether the line is inside a fence or is a
    /// fence marker itself.
    fn track(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~');
        let run = marker.map_or(0, |m| trimmed.chars().take_while(|c| *c == m).count());

        match (self.0, marker) {
            (Some((open, len)), Some(m)) if m == open && run >= len => {
                if trimmed[run..].trim().is_empty() {
                    self.0 = None;
                }
                true
            }
            (Some(_), _) => true,
            (None, Some(m)) if run >= 3 => {
                self.0 = Some((m, run));
                true
            }
            (None, _) => false,
        }
    }
}

/// Video id from a `youtube.com/watch?v=` or `youtu.be/` URL.
fn video_id(url: &str) -> Option<&str> {
    let id = if url.contains("youtube.com/watch?v=") {
        let (_, rest) = url.split_once("v=")?;
        rest.split('&').next()
    } else if url.contains("youtu.be/") {
        url.rsplit('/').next()
    } else {
        None
    };
    id.filter(|id| !id.is_empty())
}

/// Iframe for the first embed on `line`, if it names a recognised URL.
fn embed(line: &str) -> Option<String> {
    let caps = YOUTUBE_RE.captures(line)?;
    let id = video_id(&caps[1])?;
    let width = caps.get(2).map_or(DEFAULT_WIDTH, |m| m.as_str());
    let height = caps.get(3).map_or(DEFAULT_HEIGHT, |m| m.as_str());
    Some(format!(
        r#"<iframe width="{width}" height="{height}" src="https://www.youtube.com/embed/{id}" frameborder="0" allowfullscreen></iframe>"#
    ))
}

/// Replace embed lines outside fenced code blocks.
pub fn preprocess_youtube(markdown: &str) -> String {
    if !markdown.contains("@youtube(") {
        return markdown.to_owned();
    }

    let mut fence = Fence::default();
    let mut out = String::with_capacity(markdown.len());
    for line in markdown.split_inclusive('\n') {
        let in_code = fence.track(line);
        match embed(line).filter(|_| !in_code) {
            Some(iframe) => {
                tracing::debug!(line = line.trim_end(), "Expanded YouTube embed");
                out.push_str(&iframe);
                if line.ends_with('\n') {
                    out.push('\n');
                }
            }
            None => out.push_str(line),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_url_with_width() {
        let html = preprocess_youtube("@youtube(https://youtu.be/abc123, width=400)");
        assert_eq!(
            html,
            r#"<iframe width="400" height="315" src="https://www.youtube.com/embed/abc123" frameborder="0" allowfullscreen></iframe>"#
        );
    }

    #[test]
    fn test_watch_url_with_size() {
        let md = "Intro\n@youtube(https://www.youtube.com/watch?v=P4nv2O3i_kQ&t=10, width=800, height=450)\nOutro\n";
        let html = preprocess_youtube(md);
        assert_eq!(
            html,
            "Intro\n<iframe width=\"800\" height=\"450\" src=\"https://www.youtube.com/embed/P4nv2O3i_kQ\" frameborder=\"0\" allowfullscreen></iframe>\nOutro\n"
        );
    }

    #[test]
    fn test_whole_line_replaced() {
        let html = preprocess_youtube("See @youtube(https://youtu.be/xyz) now");
        assert!(html.starts_with("<iframe width=\"560\" height=\"315\""));
        assert!(!html.contains("See"));
    }

    #[test]
    fn test_unknown_url_left_alone() {
        let md = "@youtube(https://vimeo.com/123)";
        assert_eq!(preprocess_youtube(md), md);
    }

    #[test]
    fn test_inside_fence_left_alone() {
        let md = "````md\n```\n@youtube(https://youtu.be/abc)\n```\n````\n@youtube(https://youtu.be/def)\n";
        let html = preprocess_youtube(md);
        assert!(html.contains("@youtube(https://youtu.be/abc)"));
        assert!(html.contains("embed/def"));
    }

    #[test]
    fn test_fence_tracking() {
        let mut fence = Fence::default();
        assert!(!fence.track("text"));
        assert!(fence.track("~~~~ python"));
        assert!(fence.track("~~~ not closing"));
        assert!(fence.track("```"));
        assert!(fence.track("~~~~~"));
        assert!(!fence.track("after"));
    }
}
