//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use ws_assets::AssetPipeline;
use ws_config::{Config, SeoDefaults};
use ws_markdown::MarkdownLoader;
use ws_site::{Database, MaintenancePolicy, SiteRepository};

use crate::error::ServerError;
use crate::templates::Templates;

/// Markdown app holding the `/pages/{name}` sources.
pub(crate) const PAGES_APP: &str = "pages";

/// Application state shared across all handlers.
#[derive(Debug)]
pub(crate) struct AppState {
    pub(crate) templates: Templates,
    pub(crate) markdown: Arc<MarkdownLoader>,
    pub(crate) repo: SiteRepository,
    pub(crate) maintenance: MaintenancePolicy,
    pub(crate) seo: SeoDefaults,
    pub(crate) languages: Vec<String>,
    pub(crate) default_language: String,
    /// Public static URL, e.g. `/static/`.
    pub(crate) static_url: String,
    pub(crate) static_root: PathBuf,
}

impl AppState {
    pub(crate) fn new(config: &Config, db: &Database) -> Result<Self, ServerError> {
        Self::with_assets(config, db, AssetPipeline::from_config(config))
    }

    pub(crate) fn with_assets(
        config: &Config,
        db: &Database,
        assets: AssetPipeline,
    ) -> Result<Self, ServerError> {
        let markdown = Arc::new(MarkdownLoader::from_config(config));
        let templates = Templates::new(
            config.templates_resolved.dir.as_deref(),
            Arc::new(assets),
            Arc::clone(&markdown),
        );
        let static_url = config.static_resolved.url.clone();
        let maintenance = MaintenancePolicy::from_config(&config.maintenance, &static_url)?;

        Ok(Self {
            templates,
            markdown,
            repo: SiteRepository::new(db),
            maintenance,
            seo: config.seo.clone(),
            languages: config.i18n.languages.clone(),
            default_language: config.i18n.default_language.clone(),
            static_url,
            static_root: config.static_resolved.root.clone(),
        })
    }

    pub(crate) fn is_language(&self, code: &str) -> bool {
        self.languages.iter().any(|l| l == code)
    }

    /// Language of a request path: its first segment when that is a
    /// configured language, the default language otherwise.
    pub(crate) fn language_for<'a>(&'a self, path: &'a str) -> &'a str {
        path.trim_start_matches('/')
            .split('/')
            .next()
            .filter(|segment| self.is_language(segment))
            .unwrap_or(&self.default_language)
    }
}
