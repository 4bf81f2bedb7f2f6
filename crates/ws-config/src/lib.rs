//! Configuration management for the webstore.
//!
//! Parses `ws.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `database.path`
//! - `static.url`
//! - `maintenance.redirect_url`

mod expand;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override debug mode.
    pub debug: Option<bool>,
    /// Override database file.
    pub database: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "ws.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Verbose error output (manifest errors rendered as HTML comments).
    pub debug: bool,
    /// Asset tag options.
    pub assets: AssetsConfig,
    /// Language settings.
    pub i18n: I18nConfig,
    /// Resource hint domains.
    pub resource_hints: ResourceHintsConfig,
    /// Fallback SEO values.
    pub seo: SeoDefaults,
    /// Maintenance mode gate.
    pub maintenance: MaintenanceConfig,

    database: DatabaseConfigRaw,
    #[serde(rename = "static")]
    static_files: StaticConfigRaw,
    markdown: MarkdownConfigRaw,
    templates: TemplatesConfigRaw,
    fonts: FontsConfigRaw,

    /// Resolved database configuration (set after loading).
    #[serde(skip)]
    pub database_resolved: DatabaseConfig,
    /// Resolved static files configuration (set after loading).
    #[serde(skip)]
    pub static_resolved: StaticConfig,
    /// Resolved markdown configuration (set after loading).
    #[serde(skip)]
    pub markdown_resolved: MarkdownConfig,
    /// Resolved templates configuration (set after loading).
    #[serde(skip)]
    pub templates_resolved: TemplatesConfig,
    /// Resolved fonts configuration (set after loading).
    #[serde(skip)]
    pub fonts_resolved: FontsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DatabaseConfigRaw {
    path: Option<String>,
}

/// Resolved database configuration.
#[derive(Debug, Default)]
pub struct DatabaseConfig {
    /// `SQLite` database file.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct StaticConfigRaw {
    url: Option<String>,
    root: Option<String>,
    manifest_path: Option<String>,
    manifest_url: Option<String>,
}

/// Resolved static files configuration.
#[derive(Debug, Clone)]
pub struct StaticConfig {
    /// Public base URL for static files (`/static/` or an absolute CDN URL).
    pub url: String,
    /// Directory served under `url`.
    pub root: PathBuf,
    /// Webpack manifest file on disk.
    pub manifest_path: PathBuf,
    /// Manifest location relative to `url`.
    pub manifest_url: String,
}

impl StaticConfig {
    fn with_root(root: PathBuf) -> Self {
        Self {
            url: "/static/".to_owned(),
            manifest_path: root.join("manifest.json"),
            root,
            manifest_url: "manifest.json".to_owned(),
        }
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self::with_root(PathBuf::from("static"))
    }
}

/// Options applied to rendered asset tags.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Value for the `crossorigin` attribute on scripts and preloads.
    pub crossorigin: Option<String>,
    /// Render every script as `type="module"`.
    pub module_scripts: bool,
    /// Subresource integrity hashes keyed by manifest path.
    pub integrity: BTreeMap<String, String>,
}

/// Language settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct I18nConfig {
    /// Language used when the URL carries no prefix.
    pub default_language: String,
    /// Language tried after the request language for localized content.
    pub fallback_language: String,
    /// Languages accepted as URL prefixes.
    pub languages: Vec<String>,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_language: "ro".to_owned(),
            fallback_language: "en".to_owned(),
            languages: vec!["ro".to_owned(), "en".to_owned()],
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct MarkdownConfigRaw {
    apps: BTreeMap<String, String>,
}

/// Resolved markdown configuration.
#[derive(Debug, Default)]
pub struct MarkdownConfig {
    /// App label to app directory. Namespaced sources live in `<dir>/markdown/`.
    pub apps: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TemplatesConfigRaw {
    dir: Option<String>,
}

/// Resolved templates configuration.
#[derive(Debug, Default)]
pub struct TemplatesConfig {
    /// Directory overriding the built-in templates.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FontsConfigRaw {
    local: Option<bool>,
    root: Option<String>,
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
}

/// Resolved Google Fonts configuration.
#[derive(Debug, Clone)]
pub struct FontsConfig {
    /// Download fonts and serve them from `root` instead of the CDN.
    pub local: bool,
    /// Download directory; must live under the static root to be served.
    pub root: PathBuf,
    /// `root` relative to the static root, `/`-separated; `None` when the
    /// directory is outside it.
    pub url_path: Option<String>,
    /// User agent sent to the fonts API (it selects woff2 by user agent).
    pub user_agent: String,
    /// Per-request network timeout.
    pub timeout: Duration,
}

const DEFAULT_FONT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

impl FontsConfig {
    fn with_root(root: PathBuf, static_root: &Path) -> Self {
        Self {
            local: false,
            url_path: static_subpath(&root, static_root),
            root,
            user_agent: DEFAULT_FONT_USER_AGENT.to_owned(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self::with_root(PathBuf::from("static/fonts"), Path::new("static"))
    }
}

/// `path` relative to `base` as a URL path, `None` when outside `base`.
fn static_subpath(path: &Path, base: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let segments = relative
        .components()
        .map(|c| match c {
            std::path::Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("/"))
}

/// Resource hint configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResourceHintsConfig {
    /// Domains always hinted.
    pub dns_prefetch_domains: Vec<String>,
    /// Per-domain hint attributes.
    pub domains: BTreeMap<String, DomainHint>,
}

/// Attributes for hints pointing at one domain.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DomainHint {
    /// `type` attribute.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Emit `crossorigin="anonymous"` on preconnect hints.
    pub crossorigin: bool,
}

/// SEO values used when neither the request nor site settings supply one.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SeoDefaults {
    pub title: String,
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub author: String,
    pub publisher: String,
    pub owner: String,
    pub copyright: String,
    /// Path of the default share image, joined with the request origin.
    pub image: String,
    pub og_image: String,
    pub twitter_site: String,
    pub og_site_name: String,
    pub theme_color: String,
}

impl Default for SeoDefaults {
    fn default() -> Self {
        Self {
            title: "Webstore".to_owned(),
            name: "Webstore".to_owned(),
            short_name: "Webstore".to_owned(),
            description: "Online store".to_owned(),
            keywords: vec!["webstore".to_owned(), "shop".to_owned()],
            author: "Webstore".to_owned(),
            publisher: "Webstore".to_owned(),
            owner: "Webstore".to_owned(),
            copyright: "Webstore".to_owned(),
            image: "/static/img/default/brand/1280x391.png".to_owned(),
            og_image: "/static/img/default/brand/1280x391.png".to_owned(),
            twitter_site: String::new(),
            og_site_name: "Webstore".to_owned(),
            theme_color: "#345212".to_owned(),
        }
    }
}

/// Maintenance mode gate configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Path regexes that bypass the gate.
    pub ignore_urls: Vec<String>,
    /// `Retry-After` header value in seconds.
    pub retry_after: u64,
    /// Response status while in maintenance.
    pub status_code: u16,
    /// Redirect target instead of the maintenance page.
    pub redirect_url: Option<String>,
    /// Template rendered as the maintenance page.
    pub template: String,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            ignore_urls: vec![
                "^/robots.txt$".to_owned(),
                "^/webstore".to_owned(),
                "^/favicon.ico$".to_owned(),
                "^/[a-z]{2}/system.js$".to_owned(),
            ],
            retry_after: 3600,
            status_code: 503,
            redirect_url: None,
            template: "maintenance/503.html".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`database.path`").
        field: String,
        /// Error message (e.g., "${`DATABASE_PATH`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// `#rrggbb` or empty.
pub fn is_hex_color(value: &str) -> bool {
    value.is_empty()
        || (value.len() == 7
            && value.starts_with('#')
            && value[1..].chars().all(|c| c.is_ascii_hexdigit()))
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `ws.toml` in current directory and parents.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(debug) = settings.debug {
            self.debug = debug;
        }
        if let Some(database) = &settings.database {
            self.database_resolved.path.clone_from(database);
        }
    }

    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    pub fn default_with_base(base: &Path) -> Self {
        let static_root = base.join("static");
        Self {
            server: ServerConfig::default(),
            debug: false,
            assets: AssetsConfig::default(),
            i18n: I18nConfig::default(),
            resource_hints: ResourceHintsConfig::default(),
            seo: SeoDefaults::default(),
            maintenance: MaintenanceConfig::default(),
            database: DatabaseConfigRaw::default(),
            static_files: StaticConfigRaw::default(),
            markdown: MarkdownConfigRaw::default(),
            templates: TemplatesConfigRaw::default(),
            fonts: FontsConfigRaw::default(),
            database_resolved: DatabaseConfig {
                path: base.join("webstore.db"),
            },
            fonts_resolved: FontsConfig::with_root(static_root.join("fonts"), &static_root),
            static_resolved: StaticConfig::with_root(static_root),
            markdown_resolved: MarkdownConfig::default(),
            templates_resolved: TemplatesConfig::default(),
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_static()?;
        self.validate_i18n()?;
        self.validate_maintenance()?;
        if self.fonts_resolved.local && self.fonts_resolved.url_path.is_none() {
            return Err(ConfigError::Validation(format!(
                "fonts.root {} is outside the static root {}",
                self.fonts_resolved.root.display(),
                self.static_resolved.root.display()
            )));
        }
        if !is_hex_color(&self.seo.theme_color) {
            return Err(ConfigError::Validation(
                "seo.theme_color must be a #rrggbb color".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_static(&self) -> Result<(), ConfigError> {
        let url = &self.static_resolved.url;
        require_non_empty(url, "static.url")?;
        if !url.ends_with('/') {
            return Err(ConfigError::Validation(
                "static.url must end with '/'".to_owned(),
            ));
        }
        if !url.starts_with('/') {
            require_http_url(url, "static.url")?;
        }
        Ok(())
    }

    fn validate_i18n(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.i18n.default_language, "i18n.default_language")?;
        require_non_empty(&self.i18n.fallback_language, "i18n.fallback_language")?;
        if !self.i18n.languages.contains(&self.i18n.default_language) {
            return Err(ConfigError::Validation(format!(
                "i18n.default_language '{}' is not listed in i18n.languages",
                self.i18n.default_language
            )));
        }
        Ok(())
    }

    fn validate_maintenance(&self) -> Result<(), ConfigError> {
        if !(100..=599).contains(&self.maintenance.status_code) {
            return Err(ConfigError::Validation(format!(
                "maintenance.status_code {} is not an HTTP status",
                self.maintenance.status_code
            )));
        }
        if let Some(url) = &self.maintenance.redirect_url {
            require_non_empty(url, "maintenance.redirect_url")?;
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref path) = self.database.path {
            self.database.path = Some(expand::expand_env(path, "database.path")?);
        }
        if let Some(ref url) = self.static_files.url {
            self.static_files.url = Some(expand::expand_env(url, "static.url")?);
        }
        if let Some(ref url) = self.maintenance.redirect_url {
            self.maintenance.redirect_url =
                Some(expand::expand_env(url, "maintenance.redirect_url")?);
        }

        Ok(())
    }

    /// Resolve relative paths against the config file directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.database_resolved = DatabaseConfig {
            path: resolve(self.database.path.as_deref(), "webstore.db"),
        };

        let static_root = resolve(self.static_files.root.as_deref(), "static");
        let mut static_config = StaticConfig::with_root(static_root.clone());
        if let Some(url) = &self.static_files.url {
            static_config.url.clone_from(url);
        }
        if let Some(manifest_path) = &self.static_files.manifest_path {
            static_config.manifest_path = config_dir.join(manifest_path);
        }
        if let Some(manifest_url) = &self.static_files.manifest_url {
            static_config.manifest_url.clone_from(manifest_url);
        }
        self.static_resolved = static_config;

        self.markdown_resolved = MarkdownConfig {
            apps: self
                .markdown
                .apps
                .iter()
                .map(|(label, dir)| (label.clone(), config_dir.join(dir)))
                .collect(),
        };

        self.templates_resolved = TemplatesConfig {
            dir: self.templates.dir.as_deref().map(|d| config_dir.join(d)),
        };

        let fonts_root = self
            .fonts
            .root
            .as_deref()
            .map_or_else(|| static_root.join("fonts"), |r| config_dir.join(r));
        let mut fonts = FontsConfig::with_root(fonts_root, &static_root);
        if let Some(local) = self.fonts.local {
            fonts.local = local;
        }
        if let Some(user_agent) = &self.fonts.user_agent {
            fonts.user_agent.clone_from(user_agent);
        }
        if let Some(secs) = self.fonts.timeout_secs {
            fonts.timeout = Duration::from_secs(secs);
        }
        self.fonts_resolved = fonts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/srv/shop"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert!(!config.debug);
        assert_eq!(
            config.database_resolved.path,
            PathBuf::from("/srv/shop/webstore.db")
        );
        assert_eq!(config.static_resolved.url, "/static/");
        assert_eq!(
            config.static_resolved.manifest_path,
            PathBuf::from("/srv/shop/static/manifest.json")
        );
        assert_eq!(
            config.fonts_resolved.root,
            PathBuf::from("/srv/shop/static/fonts")
        );
        assert_eq!(config.fonts_resolved.timeout, Duration::from_secs(10));
        assert_eq!(config.i18n.default_language, "ro");
        assert_eq!(config.i18n.fallback_language, "en");
        assert_eq!(config.maintenance.retry_after, 3600);
        assert_eq!(config.maintenance.status_code, 503);
        assert_eq!(config.seo.theme_color, "#345212");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert!(config.assets.integrity.is_empty());
    }

    #[test]
    fn test_parse_assets_and_hints() {
        let toml = r#"
debug = true

[assets]
crossorigin = "anonymous"
module_scripts = true

[assets.integrity]
"main.abc123.js" = "sha384-xyz"

[resource_hints]
dns_prefetch_domains = ["cdn.example.com"]

[resource_hints.domains."fonts.gstatic.com"]
type = "font/woff2"
crossorigin = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.debug);
        assert_eq!(config.assets.crossorigin.as_deref(), Some("anonymous"));
        assert!(config.assets.module_scripts);
        assert_eq!(
            config.assets.integrity.get("main.abc123.js").map(String::as_str),
            Some("sha384-xyz")
        );
        assert_eq!(
            config.resource_hints.domains.get("fonts.gstatic.com"),
            Some(&DomainHint {
                kind: Some("font/woff2".to_owned()),
                crossorigin: true,
            })
        );
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[database]
path = "data/shop.db"

[static]
root = "public"
manifest_path = "build/manifest.json"
url = "https://cdn.example.com/static/"

[markdown.apps]
frontpage = "apps/frontpage"

[templates]
dir = "templates"

[fonts]
local = true
timeout_secs = 3
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.database_resolved.path,
            PathBuf::from("/project/data/shop.db")
        );
        assert_eq!(config.static_resolved.root, PathBuf::from("/project/public"));
        assert_eq!(
            config.static_resolved.manifest_path,
            PathBuf::from("/project/build/manifest.json")
        );
        assert_eq!(config.static_resolved.url, "https://cdn.example.com/static/");
        assert_eq!(
            config.markdown_resolved.apps.get("frontpage"),
            Some(&PathBuf::from("/project/apps/frontpage"))
        );
        assert_eq!(
            config.templates_resolved.dir,
            Some(PathBuf::from("/project/templates"))
        );
        assert!(config.fonts_resolved.local);
        assert_eq!(
            config.fonts_resolved.root,
            PathBuf::from("/project/public/fonts")
        );
        assert_eq!(config.fonts_resolved.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_cli_settings_override() {
        let mut config = Config::default_with_base(Path::new("/srv"));
        config.apply_cli_settings(&CliSettings {
            host: Some("0.0.0.0".to_owned()),
            port: Some(9000),
            debug: Some(true),
            database: Some(PathBuf::from("/tmp/other.db")),
        });
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert!(config.debug);
        assert_eq!(config.database_resolved.path, PathBuf::from("/tmp/other.db"));
    }

    #[test]
    fn test_validate_rejects_relative_static_url() {
        let mut config = Config::default_with_base(Path::new("/srv"));
        config.static_resolved.url = "static/".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("static.url"));
    }

    #[test]
    fn test_validate_rejects_static_url_without_slash() {
        let mut config = Config::default_with_base(Path::new("/srv"));
        config.static_resolved.url = "/static".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_default_language() {
        let mut config = Config::default_with_base(Path::new("/srv"));
        config.i18n.default_language = "de".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("i18n.default_language"));
    }

    #[test]
    fn test_validate_rejects_bad_theme_color() {
        let mut config = Config::default_with_base(Path::new("/srv"));
        config.seo.theme_color = "green".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_port_zero() {
        let mut config = Config::default_with_base(Path::new("/srv"));
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fonts_url_path_follows_root() {
        let config = Config::default_with_base(Path::new("/srv"));
        assert_eq!(config.fonts_resolved.url_path.as_deref(), Some("fonts"));

        let mut config: Config = toml::from_str("[fonts]\nroot = \"static/assets/webfonts\"").unwrap();
        config.resolve_paths(Path::new("/srv"));
        assert_eq!(
            config.fonts_resolved.url_path.as_deref(),
            Some("assets/webfonts")
        );
    }

    #[test]
    fn test_validate_rejects_local_fonts_outside_static_root() {
        let mut config: Config =
            toml::from_str("[fonts]\nlocal = true\nroot = \"cache/fonts\"").unwrap();
        config.resolve_paths(Path::new("/srv"));
        assert_eq!(config.fonts_resolved.url_path, None);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("fonts.root"));
    }

    #[test]
    fn test_hex_color() {
        assert!(is_hex_color(""));
        assert!(is_hex_color("#a1B2c3"));
        assert!(!is_hex_color("#12345"));
        assert!(!is_hex_color("1234567"));
        assert!(!is_hex_color("#12345g"));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/ws.toml")), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_from_file_resolves_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ws.toml");
        std::fs::write(
            &path,
            "[server]\nport = 8080\n\n[maintenance]\nretry_after = 60\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.maintenance.retry_after, 60);
        assert_eq!(config.config_path, Some(path));
        assert_eq!(
            config.static_resolved.root,
            dir.path().join("static")
        );
    }

    #[test]
    fn test_load_from_file_invalid_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ws.toml");
        std::fs::write(&path, "[maintenance]\nstatus_code = 42\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
