//! Static asset resolution for the webstore.
//!
//! Resolves logical webpack entry names through the build manifest and
//! renders the matching `<link>` / `<script>` markup:
//!
//! - [`ManifestLoader`]: reads the manifest once and caches the outcome,
//!   including failure
//! - [`collect_assets`]: entry names to [`AssetRecord`]s
//! - [`asset_tags`] / [`preload_tags`]: records to HTML
//! - [`RequestContext`]: per-request preload set and resource hint state
//!
//! [`AssetPipeline`] bundles these with the configuration so template
//! helpers can call one method per tag.
//!
//! # Example
//!
//! ```
//! use ws_assets::{AssetPipeline, Manifest, ManifestLoader, RequestContext, ScriptOptions};
//! use ws_config::Config;
//!
//! let manifest: Manifest = [("main.abc123.js", "main.abc123.js")].into_iter().collect();
//! let pipeline = AssetPipeline::from_config(&Config::default())
//!     .with_manifest(ManifestLoader::preloaded(manifest));
//!
//! let request = RequestContext::new("ro");
//! let html = pipeline.webpack_asset("main", ScriptOptions::default(), None, Some(&request));
//! assert_eq!(html, r#"<script src="/static/main.abc123.js" defer="defer"></script>"#);
//! assert_eq!(request.get_preloads().len(), 1);
//! ```

mod context;
mod fonts;
mod hints;
mod manifest;
mod preload;
mod resolver;
mod static_url;
mod tags;

use std::collections::BTreeMap;

use ws_config::{AssetsConfig, Config, ResourceHintsConfig};

pub use context::{RequestContext, RequestScope};
pub use fonts::{
    FontError, FontFace, FontFetcher, FontOptions, FontSource, GoogleFonts, HttpFontFetcher,
    google_fonts_url, parse_font_faces,
};
pub use hints::{HintOptions, resource_hints, url_host};
pub use manifest::{Manifest, ManifestError, ManifestLoader};
pub use preload::PreloadSet;
pub use resolver::{AssetKind, AssetRecord, Resolution, collect_assets, resolve_asset};
pub use static_url::{StaticUrlError, static_dynamic, static_url};
pub use tags::{ScriptOptions, asset_tags, font_mime, preload_tag, preload_tags, render_attrs};

/// Configured entry point for every asset tag.
#[derive(Debug)]
pub struct AssetPipeline {
    static_base: String,
    manifest_url: String,
    debug: bool,
    assets: AssetsConfig,
    hints: ResourceHintsConfig,
    manifest: ManifestLoader,
    fonts: GoogleFonts,
}

impl AssetPipeline {
    pub fn from_config(config: &Config) -> Self {
        let static_config = &config.static_resolved;
        Self {
            static_base: static_config.url.clone(),
            manifest_url: static_config.manifest_url.clone(),
            debug: config.debug,
            assets: config.assets.clone(),
            hints: config.resource_hints.clone(),
            manifest: ManifestLoader::new(&static_config.manifest_path),
            fonts: GoogleFonts::new(config.fonts_resolved.clone(), &static_config.url),
        }
    }

    /// Replace the manifest loader.
    #[must_use]
    pub fn with_manifest(mut self, manifest: ManifestLoader) -> Self {
        self.manifest = manifest;
        self
    }

    /// Replace the Google Fonts loader.
    #[must_use]
    pub fn with_fonts(mut self, fonts: GoogleFonts) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn manifest(&self) -> &ManifestLoader {
        &self.manifest
    }

    pub fn static_base(&self) -> &str {
        &self.static_base
    }

    pub fn static_url(&self, path: &str) -> String {
        static_url(&self.static_base, path)
    }

    pub fn static_dynamic(
        &self,
        template: &str,
        vars: &BTreeMap<String, String>,
    ) -> Result<String, StaticUrlError> {
        static_dynamic(&self.static_base, template, vars)
    }

    /// URL of a manifest key, or of `filename` itself when the key is absent.
    pub fn webpack(&self, filename: &str) -> String {
        let path = self
            .manifest
            .load()
            .ok()
            .and_then(|m| m.get(filename))
            .unwrap_or(filename);
        self.static_url(path)
    }

    pub fn collect_assets(&self, entries: &str, suffix: Option<&str>) -> Resolution {
        collect_assets(
            self.manifest.load(),
            &self.static_base,
            entries,
            suffix,
            self.debug,
        )
    }

    /// Stylesheet and script tags for `entries`, registering preloads.
    pub fn webpack_asset(
        &self,
        entries: &str,
        options: ScriptOptions,
        suffix: Option<&str>,
        request: Option<&RequestContext>,
    ) -> String {
        let resolution = self.collect_assets(entries, suffix);
        asset_tags(&resolution, options, &self.assets, request)
    }

    /// Preload tags for `entries`.
    pub fn webpack_preload(&self, entries: &str, module: bool, suffix: Option<&str>) -> String {
        let resolution = self.collect_assets(entries, suffix);
        preload_tags(&resolution, module, &self.assets)
    }

    /// Public URL of the manifest file, empty when it failed to load.
    pub fn webpack_manifest(&self) -> String {
        match self.manifest.load() {
            Ok(_) => self.static_url(&self.manifest_url),
            Err(_) => String::new(),
        }
    }

    pub fn resource_hints(&self, options: &HintOptions, request: &RequestContext) -> String {
        resource_hints(options, &self.hints, &self.static_base, request)
    }

    pub fn load_google_fonts(
        &self,
        fonts: &[String],
        options: &FontOptions,
        request: Option<&RequestContext>,
    ) -> String {
        self.fonts.render(fonts, options, request)
    }
}

/// Emit every preload collected so far and empty the set.
pub fn render_preloads(request: &RequestContext) -> String {
    request.drain_preloads().join("\n")
}
