//! Entry name to asset resolution.

use crate::manifest::{Manifest, ManifestError};
use crate::static_url::static_url;

/// Category of a resolved asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Style,
    Script,
    Font,
    Image,
}

impl AssetKind {
    /// Resolution order within one entry.
    pub const ALL: [Self; 4] = [Self::Style, Self::Script, Self::Font, Self::Image];

    /// Value of the `as` attribute in preload tags.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::Script => "script",
            Self::Font => "font",
            Self::Image => "image",
        }
    }

    /// File extensions matched for this category.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Style => &["css"],
            Self::Script => &["js"],
            Self::Font => &["woff2", "woff", "ttf", "otf"],
            Self::Image => &["jpg", "jpeg", "png", "webp", "svg", "gif", "avif"],
        }
    }

    /// Classify a URL by its extension, ignoring any query string.
    pub fn guess(url: &str) -> Option<Self> {
        let path = url.split('?').next().unwrap_or(url);
        let ext = path.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "js" | "mjs" => Some(Self::Script),
            _ => Self::ALL
                .into_iter()
                .find(|kind| kind.extensions().contains(&ext.as_str())),
        }
    }
}

/// One resolved asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub kind: AssetKind,
    /// Public URL under the static base.
    pub url: String,
    /// Path as written in the manifest; keys the integrity map.
    pub path: String,
}

/// Outcome of [`collect_assets`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    pub records: Vec<AssetRecord>,
    /// Markup to emit instead of tags when the manifest is unavailable.
    /// Empty outside debug mode.
    pub error: Option<String>,
}

/// First manifest value for `entry[.suffix]` ending in one of `kind`'s extensions.
pub fn resolve_asset<'m>(
    manifest: &'m Manifest,
    entry: &str,
    kind: AssetKind,
    suffix: Option<&str>,
) -> Option<&'m str> {
    let prefix = match suffix.filter(|s| !s.is_empty()) {
        Some(suffix) => format!("{entry}.{suffix}"),
        None => entry.to_owned(),
    };
    manifest
        .iter()
        .find(|(key, emitted)| {
            key.starts_with(&prefix)
                && kind.extensions().iter().any(|ext| {
                    emitted
                        .strip_suffix(ext)
                        .is_some_and(|stem| stem.ends_with('.'))
                })
        })
        .map(|(_, emitted)| emitted)
}

/// Resolve a comma-separated list of entry names.
///
/// Each entry contributes at most one asset per category, in the order
/// style, script, font, image. Unknown entries contribute nothing.
pub fn collect_assets(
    manifest: Result<&Manifest, &ManifestError>,
    static_base: &str,
    entries: &str,
    suffix: Option<&str>,
    debug: bool,
) -> Resolution {
    let manifest = match manifest {
        Ok(manifest) => manifest,
        Err(e) => {
            let error = if debug {
                format!("<!-- Webpack manifest error: {e} -->")
            } else {
                String::new()
            };
            return Resolution {
                records: Vec::new(),
                error: Some(error),
            };
        }
    };

    let mut records = Vec::new();
    for entry in entries.split(',').map(str::trim) {
        for kind in AssetKind::ALL {
            if let Some(path) = resolve_asset(manifest, entry, kind, suffix) {
                records.push(AssetRecord {
                    kind,
                    url: static_url(static_base, path),
                    path: path.to_owned(),
                });
            }
        }
    }

    Resolution {
        records,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn manifest() -> Manifest {
        [
            ("main.abc123.js", "main.abc123.js"),
            ("main.def456.css", "main.def456.css"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_main_entry_yields_style_then_script() {
        let manifest = manifest();
        let resolution = collect_assets(Ok(&manifest), "/static/", "main", None, false);
        assert_eq!(
            resolution.records,
            vec![
                AssetRecord {
                    kind: AssetKind::Style,
                    url: "/static/main.def456.css".to_owned(),
                    path: "main.def456.css".to_owned(),
                },
                AssetRecord {
                    kind: AssetKind::Script,
                    url: "/static/main.abc123.js".to_owned(),
                    path: "main.abc123.js".to_owned(),
                },
            ]
        );
        assert_eq!(resolution.error, None);
    }

    #[test]
    fn test_unknown_entry_is_empty_without_error() {
        let manifest = manifest();
        for debug in [false, true] {
            let resolution = collect_assets(Ok(&manifest), "/static/", "missing", None, debug);
            assert!(resolution.records.is_empty());
            assert_eq!(resolution.error, None);
        }
    }

    #[test]
    fn test_first_match_in_document_order_wins() {
        let manifest: Manifest = [
            ("app.js", "js/app.111.js"),
            ("app-legacy.js", "js/app-legacy.222.js"),
        ]
        .into_iter()
        .collect();
        let found = resolve_asset(&manifest, "app", AssetKind::Script, None);
        assert_eq!(found, Some("js/app.111.js"));

        let reversed: Manifest = [
            ("app-legacy.js", "js/app-legacy.222.js"),
            ("app.js", "js/app.111.js"),
        ]
        .into_iter()
        .collect();
        let found = resolve_asset(&reversed, "app", AssetKind::Script, None);
        assert_eq!(found, Some("js/app-legacy.222.js"));
    }

    #[test]
    fn test_suffix_narrows_prefix() {
        let manifest: Manifest = [
            ("admin.js", "admin.1.js"),
            ("admin.dark.css", "admin.dark.2.css"),
            ("admin.css", "admin.3.css"),
        ]
        .into_iter()
        .collect();
        let resolution = collect_assets(Ok(&manifest), "/static/", "admin", Some("dark"), false);
        assert_eq!(resolution.records.len(), 1);
        assert_eq!(resolution.records[0].path, "admin.dark.2.css");
    }

    #[test]
    fn test_fonts_and_images() {
        let manifest: Manifest = [
            ("brand.woff", "fonts/brand.1.woff"),
            ("brand.woff2", "fonts/brand.1.woff2"),
            ("brand.svg", "img/brand.2.svg"),
        ]
        .into_iter()
        .collect();
        let resolution = collect_assets(Ok(&manifest), "/static/", "brand", None, false);
        let kinds: Vec<_> = resolution.records.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![AssetKind::Font, AssetKind::Image]);
        assert_eq!(resolution.records[0].path, "fonts/brand.1.woff");
    }

    #[test]
    fn test_extension_must_follow_dot() {
        let manifest: Manifest = [("main.map", "main.notjs")].into_iter().collect();
        assert_eq!(resolve_asset(&manifest, "main", AssetKind::Script, None), None);
    }

    #[test]
    fn test_multiple_entries_trimmed() {
        let manifest: Manifest = [
            ("vendor.js", "vendor.9.js"),
            ("main.js", "main.1.js"),
        ]
        .into_iter()
        .collect();
        let resolution = collect_assets(Ok(&manifest), "/static/", " main , vendor", None, false);
        let paths: Vec<_> = resolution.records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["main.1.js", "vendor.9.js"]);
    }

    #[test]
    fn test_manifest_error_hidden_outside_debug() {
        let err = ManifestError::NotObject(PathBuf::from("manifest.json"));
        let resolution = collect_assets(Err(&err), "/static/", "main", None, false);
        assert!(resolution.records.is_empty());
        assert_eq!(resolution.error, Some(String::new()));
    }

    #[test]
    fn test_manifest_error_comment_in_debug() {
        let err = ManifestError::NotObject(PathBuf::from("manifest.json"));
        let resolution = collect_assets(Err(&err), "/static/", "main", None, true);
        assert_eq!(
            resolution.error.as_deref(),
            Some("<!-- Webpack manifest error: manifest.json is not a JSON object -->")
        );
    }

    #[test]
    fn test_guess_kind() {
        assert_eq!(AssetKind::guess("/static/app.mjs"), Some(AssetKind::Script));
        assert_eq!(AssetKind::guess("/static/a.CSS?v=2"), Some(AssetKind::Style));
        assert_eq!(AssetKind::guess("font.otf"), Some(AssetKind::Font));
        assert_eq!(AssetKind::guess("photo.avif"), Some(AssetKind::Image));
        assert_eq!(AssetKind::guess("readme.txt"), None);
    }
}
