//! Google Fonts loading, self-hosted or from the CDN.
//!
//! In local mode the fonts CSS is fetched once per font family, every
//! `woff2` face it references is downloaded under the configured font root,
//! and an inline `@font-face` stylesheet pointing at the local copies is
//! emitted. Any network or file failure logs a warning and falls back to the
//! CDN stylesheet; rendering never fails because of fonts.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{LazyLock, Mutex, PoisonError};

use regex::Regex;
use ureq::Agent;
use ws_config::FontsConfig;

use crate::context::RequestContext;
use crate::static_url::static_url;
use crate::tags::{font_mime, render_attrs};

const GOOGLE_FONTS_CSS: &str = "https://fonts.googleapis.com/css";

static FONT_FACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?:/\*\s*([\w-]+)\s*\*/\s*)?@font-face\s*\{(.*?)\}").unwrap()
});
static FAMILY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"font-family:\s*['"]([^'"]+)['"]"#).unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"font-style:\s*(\w+)").unwrap());
static WEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"font-weight:\s*(\d+)").unwrap());
static WOFF2_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\((https://[^)]+\.woff2)\)\s*format\(['"]woff2['"]\)"#).unwrap()
});
static UNICODE_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"unicode-range:\s*([^;]+);").unwrap());

/// Font loading failure.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("HTTP error for {url}: {message}")]
    Http { url: String, message: String },
    #[error("I/O error for {}: {source}", .path.display())]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("no woff2 faces in stylesheet for {0}")]
    NoFaces(String),
    #[error("font directory {} is not under the static root", .0.display())]
    NotServed(std::path::PathBuf),
}

/// Network access used by [`GoogleFonts`].
pub trait FontFetcher: Send + Sync {
    /// Fetch a stylesheet as text.
    fn fetch_css(&self, url: &str) -> Result<String, FontError>;
    /// Fetch a font file.
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FontError>;
}

/// [`FontFetcher`] backed by a `ureq` agent.
#[derive(Debug)]
pub struct HttpFontFetcher {
    agent: Agent,
    user_agent: String,
}

impl HttpFontFetcher {
    pub fn new(config: &FontsConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }

    fn get(&self, url: &str) -> Result<ureq::Body, FontError> {
        let http_error = |message: String| FontError::Http {
            url: url.to_owned(),
            message,
        };
        let response = self
            .agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .call()
            .map_err(|e| http_error(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(http_error(format!("HTTP {status}")));
        }
        Ok(response.into_body())
    }
}

impl FontFetcher for HttpFontFetcher {
    fn fetch_css(&self, url: &str) -> Result<String, FontError> {
        self.get(url)?
            .read_to_string()
            .map_err(|e| FontError::Http {
                url: url.to_owned(),
                message: e.to_string(),
            })
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FontError> {
        self.get(url)?.read_to_vec().map_err(|e| FontError::Http {
            url: url.to_owned(),
            message: e.to_string(),
        })
    }
}

/// Where fonts are served from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FontSource {
    /// Local when `fonts.local` is set, CDN otherwise.
    #[default]
    Auto,
    Local,
    Cdn,
}

impl FontSource {
    /// Parse `auto`, `local` or `cdn`; anything else is `Auto`.
    pub fn parse(value: &str) -> Self {
        match value {
            "local" => Self::Local,
            "cdn" => Self::Cdn,
            _ => Self::Auto,
        }
    }
}

/// Options of one `load_google_fonts` call.
#[derive(Debug, Clone)]
pub struct FontOptions {
    pub source: FontSource,
    /// CSS `font-display` value.
    pub display: String,
    /// Register preload tags with the request.
    pub preloads: bool,
}

impl Default for FontOptions {
    fn default() -> Self {
        Self {
            source: FontSource::Auto,
            display: "swap".to_owned(),
            preloads: true,
        }
    }
}

/// One `@font-face` block of a Google Fonts stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFace {
    pub family: String,
    pub style: String,
    pub weight: String,
    pub url: String,
    pub unicode_range: Option<String>,
    /// Subset label from the comment preceding the block (`latin`, `cyrillic`, ...).
    pub subset: Option<String>,
}

/// A face stored under the font root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFont {
    pub href: String,
    pub face: FontFace,
}

/// Collapse whitespace and encode spaces as `+`.
fn format_family(family: &str) -> String {
    family.split_whitespace().collect::<Vec<_>>().join("+")
}

/// Google Fonts CSS URL for the given `Family[:weights]` specs.
pub fn google_fonts_url(fonts: &[String], display: &str) -> String {
    let families: Vec<String> = fonts.iter().map(|f| format_family(f)).collect();
    format!(
        "{GOOGLE_FONTS_CSS}?family={}&display={display}",
        families.join("|")
    )
}

/// Split `Family:weights`, defaulting weights to `400`.
fn split_family(family: &str) -> (&str, &str) {
    match family.split_once(':') {
        Some((family, weights)) => (family, weights),
        None => (family, "400"),
    }
}

fn first_group(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_owned())
}

/// Extract the `woff2` faces from a Google Fonts stylesheet.
pub fn parse_font_faces(css: &str) -> Vec<FontFace> {
    FONT_FACE_RE
        .captures_iter(css)
        .filter_map(|caps| {
            let body = caps.get(2)?.as_str();
            Some(FontFace {
                family: first_group(&FAMILY_RE, body)?,
                style: first_group(&STYLE_RE, body)?,
                weight: first_group(&WEIGHT_RE, body)?,
                url: first_group(&WOFF2_URL_RE, body)?,
                unicode_range: first_group(&UNICODE_RANGE_RE, body),
                subset: caps.get(1).map(|m| m.as_str().to_owned()),
            })
        })
        .collect()
}

impl FontFace {
    fn directory(&self) -> String {
        self.family.replace(' ', "")
    }

    fn filename(&self) -> String {
        match &self.subset {
            Some(subset) => format!("{}-{}-{subset}.woff2", self.weight, self.style),
            None => format!("{}-{}.woff2", self.weight, self.style),
        }
    }

    /// Faces worth preloading; other subsets load on demand via `unicode-range`.
    fn is_primary(&self) -> bool {
        self.subset.as_deref().is_none_or(|s| s == "latin")
    }
}

/// Google Fonts loader with a per-family memo of downloaded faces.
pub struct GoogleFonts {
    config: FontsConfig,
    static_base: String,
    fetcher: Box<dyn FontFetcher>,
    resolved: Mutex<HashMap<String, Vec<LocalFont>>>,
}

impl std::fmt::Debug for GoogleFonts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleFonts")
            .field("config", &self.config)
            .field("static_base", &self.static_base)
            .finish_non_exhaustive()
    }
}

impl GoogleFonts {
    pub fn new(config: FontsConfig, static_base: impl Into<String>) -> Self {
        let fetcher = Box::new(HttpFontFetcher::new(&config));
        Self::with_fetcher(config, static_base, fetcher)
    }

    pub fn with_fetcher(
        config: FontsConfig,
        static_base: impl Into<String>,
        fetcher: Box<dyn FontFetcher>,
    ) -> Self {
        Self {
            config,
            static_base: static_base.into(),
            fetcher,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Markup loading `fonts`, registering preloads with `request`.
    pub fn render(
        &self,
        fonts: &[String],
        options: &FontOptions,
        request: Option<&RequestContext>,
    ) -> String {
        if fonts.is_empty() {
            return String::new();
        }

        let use_local = match options.source {
            FontSource::Local => true,
            FontSource::Cdn => false,
            FontSource::Auto => self.config.local,
        };

        if use_local {
            match self.resolve_all(fonts) {
                Ok(local) => return self.local_markup(&local, options, request),
                Err(e) => {
                    tracing::warn!(error = %e, fonts = ?fonts, "Google Fonts download failed, using CDN");
                }
            }
        }

        cdn_markup(fonts, options, request)
    }

    fn resolve_all(&self, fonts: &[String]) -> Result<Vec<LocalFont>, FontError> {
        let mut all = Vec::new();
        for family in fonts {
            all.extend(self.resolve(family)?);
        }
        Ok(all)
    }

    fn resolve(&self, family: &str) -> Result<Vec<LocalFont>, FontError> {
        let (family, weights) = split_family(family);
        let key = format!("{}:{weights}", family.trim());

        if let Some(cached) = self.memo().get(&key) {
            return Ok(cached.clone());
        }

        let local = self.download(&key)?;
        self.memo().insert(key, local.clone());
        Ok(local)
    }

    fn download(&self, family: &str) -> Result<Vec<LocalFont>, FontError> {
        let Some(url_path) = self.config.url_path.as_deref() else {
            return Err(FontError::NotServed(self.config.root.clone()));
        };
        let url = google_fonts_url(&[family.to_owned()], "swap");
        let css = self.fetcher.fetch_css(&url)?;
        let faces = parse_font_faces(&css);
        if faces.is_empty() {
            return Err(FontError::NoFaces(family.to_owned()));
        }

        faces
            .into_iter()
            .map(|face| -> Result<LocalFont, FontError> {
                let dir = self.config.root.join(face.directory());
                let path = dir.join(face.filename());
                if !path.exists() {
                    std::fs::create_dir_all(&dir).map_err(|source| FontError::Io {
                        path: dir.clone(),
                        source,
                    })?;
                    let bytes = self.fetcher.fetch_bytes(&face.url)?;
                    write_font(&path, &bytes)?;
                    tracing::info!(path = %path.display(), "Downloaded font");
                }
                let relative = format!("{}/{}", face.directory(), face.filename());
                let href = if url_path.is_empty() {
                    static_url(&self.static_base, &relative)
                } else {
                    static_url(&self.static_base, &format!("{url_path}/{relative}"))
                };
                Ok(LocalFont { href, face })
            })
            .collect()
    }

    fn local_markup(
        &self,
        fonts: &[LocalFont],
        options: &FontOptions,
        request: Option<&RequestContext>,
    ) -> String {
        let mut seen = HashSet::new();
        let mut rules = Vec::new();

        for font in fonts {
            if !seen.insert(font.href.as_str()) {
                continue;
            }
            if options.preloads
                && font.face.is_primary()
                && let Some(request) = request
            {
                let attrs = render_attrs(&[
                    ("rel", Some("preload")),
                    ("as", Some("font")),
                    ("href", Some(font.href.as_str())),
                    ("type", font_mime(&font.href)),
                    ("crossorigin", Some("anonymous")),
                ]);
                request.add_preload(format!("<link {attrs} />"));
            }

            let mut rule = format!(
                "@font-face {{ font-family: '{}'; font-style: {}; font-weight: {}; \
                 font-display: {}; src: url({}) format('woff2');",
                font.face.family, font.face.style, font.face.weight, options.display, font.href
            );
            if let Some(range) = &font.face.unicode_range {
                rule.push_str(&format!(" unicode-range: {range};"));
            }
            rule.push_str(" }");
            rules.push(rule);
        }

        format!("<style>\n{}\n</style>", rules.join("\n"))
    }

    fn memo(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<LocalFont>>> {
        self.resolved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn write_font(path: &Path, bytes: &[u8]) -> Result<(), FontError> {
    std::fs::write(path, bytes).map_err(|source| FontError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn cdn_markup(fonts: &[String], options: &FontOptions, request: Option<&RequestContext>) -> String {
    let href = google_fonts_url(fonts, &options.display);
    if options.preloads
        && let Some(request) = request
    {
        request.add_preload(format!("<link rel=\"preload\" as=\"style\" href=\"{href}\">"));
    }
    format!("<link rel=\"stylesheet\" href=\"{href}\">")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const CSS: &str = "/* latin-ext */
@font-face {
  font-family: 'Open Sans';
  font-style: normal;
  font-weight: 400;
  font-display: swap;
  src: url(https://fonts.gstatic.com/s/opensans/v1/ext.woff2) format('woff2');
  unicode-range: U+0100-02AF;
}
/* latin */
@font-face {
  font-family: 'Open Sans';
  font-style: normal;
  font-weight: 400;
  font-display: swap;
  src: url(https://fonts.gstatic.com/s/opensans/v1/latin.woff2) format('woff2');
  unicode-range: U+0000-00FF;
}
";

    #[derive(Default)]
    struct FakeFetcher {
        css_calls: AtomicUsize,
        fail: bool,
    }

    impl FontFetcher for Arc<FakeFetcher> {
        fn fetch_css(&self, url: &str) -> Result<String, FontError> {
            self.css_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FontError::Http {
                    url: url.to_owned(),
                    message: "connection refused".to_owned(),
                });
            }
            Ok(CSS.to_owned())
        }

        fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FontError> {
            Ok(url.as_bytes().to_vec())
        }
    }

    /// Fonts under `{static_root}/webfonts`, served at `/static/webfonts/`.
    fn config(static_root: &Path, local: bool) -> FontsConfig {
        FontsConfig {
            local,
            root: static_root.join("webfonts"),
            url_path: Some("webfonts".to_owned()),
            user_agent: "test".to_owned(),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_google_fonts_url() {
        let url = google_fonts_url(
            &["Open  Sans:400,700".to_owned(), "Roboto".to_owned()],
            "swap",
        );
        assert_eq!(
            url,
            "https://fonts.googleapis.com/css?family=Open+Sans:400,700|Roboto&display=swap"
        );
    }

    #[test]
    fn test_parse_font_faces() {
        let faces = parse_font_faces(CSS);
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].family, "Open Sans");
        assert_eq!(faces[0].subset.as_deref(), Some("latin-ext"));
        assert_eq!(faces[1].weight, "400");
        assert_eq!(faces[1].style, "normal");
        assert_eq!(faces[1].url, "https://fonts.gstatic.com/s/opensans/v1/latin.woff2");
        assert_eq!(faces[1].unicode_range.as_deref(), Some("U+0000-00FF"));
    }

    #[test]
    fn test_cdn_mode() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::default());
        let fonts = GoogleFonts::with_fetcher(
            config(dir.path(), false),
            "/static/",
            Box::new(Arc::clone(&fetcher)),
        );
        let ctx = RequestContext::new("ro");
        let html = fonts.render(&["Roboto".to_owned()], &FontOptions::default(), Some(&ctx));
        assert_eq!(
            html,
            "<link rel=\"stylesheet\" href=\"https://fonts.googleapis.com/css?family=Roboto&display=swap\">"
        );
        assert_eq!(
            ctx.get_preloads(),
            vec!["<link rel=\"preload\" as=\"style\" href=\"https://fonts.googleapis.com/css?family=Roboto&display=swap\">".to_owned()]
        );
        assert_eq!(fetcher.css_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_local_mode_downloads_and_memoizes() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::default());
        let fonts = GoogleFonts::with_fetcher(
            config(dir.path(), true),
            "/static/",
            Box::new(Arc::clone(&fetcher)),
        );
        let ctx = RequestContext::new("ro");
        let specs = ["Open Sans:400".to_owned()];

        let html = fonts.render(&specs, &FontOptions::default(), Some(&ctx));
        assert!(html.starts_with("<style>"));
        assert!(html.contains("src: url(/static/webfonts/OpenSans/400-normal-latin.woff2)"));
        assert!(html.contains("unicode-range: U+0100-02AF;"));
        assert!(dir.path().join("webfonts/OpenSans/400-normal-latin.woff2").exists());
        assert!(dir.path().join("webfonts/OpenSans/400-normal-latin-ext.woff2").exists());

        // Only the latin subset is preloaded.
        assert_eq!(
            ctx.get_preloads(),
            vec!["<link rel=\"preload\" as=\"font\" href=\"/static/webfonts/OpenSans/400-normal-latin.woff2\" type=\"font/woff2\" crossorigin=\"anonymous\" />".to_owned()]
        );

        fonts.render(&specs, &FontOptions::default(), None);
        assert_eq!(fetcher.css_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_local_failure_falls_back_to_cdn() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher {
            fail: true,
            ..FakeFetcher::default()
        });
        let fonts = GoogleFonts::with_fetcher(
            config(dir.path(), false),
            "/static/",
            Box::new(Arc::clone(&fetcher)),
        );
        let options = FontOptions {
            source: FontSource::Local,
            preloads: false,
            ..FontOptions::default()
        };
        let ctx = RequestContext::new("ro");
        let html = fonts.render(&["Lato:300".to_owned()], &options, Some(&ctx));
        assert_eq!(
            html,
            "<link rel=\"stylesheet\" href=\"https://fonts.googleapis.com/css?family=Lato:300&display=swap\">"
        );
        assert!(ctx.get_preloads().is_empty());
    }

    #[test]
    fn test_root_outside_static_falls_back_to_cdn() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::default());
        let config = FontsConfig {
            url_path: None,
            ..config(dir.path(), true)
        };
        let fonts = GoogleFonts::with_fetcher(config, "/static/", Box::new(Arc::clone(&fetcher)));
        let html = fonts.render(&["Lato".to_owned()], &FontOptions::default(), None);
        assert_eq!(
            html,
            "<link rel=\"stylesheet\" href=\"https://fonts.googleapis.com/css?family=Lato&display=swap\">"
        );
        assert_eq!(fetcher.css_calls.load(Ordering::SeqCst), 0);
        assert!(!dir.path().join("webfonts").exists());
    }

    #[test]
    fn test_font_source_parse() {
        assert_eq!(FontSource::parse("local"), FontSource::Local);
        assert_eq!(FontSource::parse("cdn"), FontSource::Cdn);
        assert_eq!(FontSource::parse("whatever"), FontSource::Auto);
    }
}
