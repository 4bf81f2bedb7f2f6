//! HTML rendering for resolved assets.

use ws_config::AssetsConfig;

use crate::context::RequestContext;
use crate::resolver::{AssetKind, AssetRecord, Resolution};

/// Options for script tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptOptions {
    /// `async` instead of `defer`.
    pub async_scripts: bool,
    /// `type="module"`; implies neither `defer` nor `async`.
    pub module: bool,
}

/// Render `attrs` as `k="v"` pairs separated by spaces, skipping `None`.
pub fn render_attrs(attrs: &[(&str, Option<&str>)]) -> String {
    attrs
        .iter()
        .filter_map(|(name, value)| value.map(|v| format!("{name}=\"{v}\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// MIME type for a font URL, by extension.
pub fn font_mime(url: &str) -> Option<&'static str> {
    [
        (".woff2", "font/woff2"),
        (".woff", "font/woff"),
        (".ttf", "font/ttf"),
        (".otf", "font/otf"),
    ]
    .into_iter()
    .find(|(ext, _)| url.ends_with(ext))
    .map(|(_, mime)| mime)
}

/// `<link rel="preload">` (or `modulepreload`) for one asset.
pub fn preload_tag(record: &AssetRecord, module: bool, config: &AssetsConfig) -> String {
    let rel = if module && record.kind == AssetKind::Script {
        "modulepreload"
    } else {
        "preload"
    };
    let font_type = match record.kind {
        AssetKind::Font => font_mime(&record.url),
        _ => None,
    };
    let attrs = render_attrs(&[
        ("rel", Some(rel)),
        ("as", Some(record.kind.as_str())),
        ("href", Some(record.url.as_str())),
        ("crossorigin", config.crossorigin.as_deref().filter(|c| !c.is_empty())),
        ("type", font_type),
    ]);
    format!("<link {attrs} />")
}

fn script_tag(record: &AssetRecord, options: ScriptOptions, config: &AssetsConfig) -> String {
    let defer = (!options.async_scripts && !options.module).then_some("defer");
    let async_attr = (options.async_scripts && !options.module).then_some("async");
    let module = (options.module || config.module_scripts).then_some("module");
    let attrs = render_attrs(&[
        ("src", Some(record.url.as_str())),
        ("defer", defer),
        ("async", async_attr),
        ("type", module),
        ("crossorigin", config.crossorigin.as_deref().filter(|c| !c.is_empty())),
        ("integrity", config.integrity.get(&record.path).map(String::as_str)),
    ]);
    format!("<script {attrs}></script>")
}

/// Stylesheet and script tags for `resolution`.
///
/// Every record, including fonts and images which get no tag of their own,
/// registers its preload tag with `request` when one is given.
pub fn asset_tags(
    resolution: &Resolution,
    options: ScriptOptions,
    config: &AssetsConfig,
    request: Option<&RequestContext>,
) -> String {
    if let Some(error) = &resolution.error {
        return error.clone();
    }

    let mut tags = Vec::new();
    for record in &resolution.records {
        if let Some(request) = request {
            request.add_preload(preload_tag(record, options.module, config));
        }
        match record.kind {
            AssetKind::Style => tags.push(format!(
                "<link rel=\"stylesheet\" href=\"{}\" />",
                record.url
            )),
            AssetKind::Script => tags.push(script_tag(record, options, config)),
            AssetKind::Font | AssetKind::Image => {}
        }
    }
    tags.join("\n")
}

/// Preload tags for every record in `resolution`.
pub fn preload_tags(resolution: &Resolution, module: bool, config: &AssetsConfig) -> String {
    if let Some(error) = &resolution.error {
        return error.clone();
    }
    resolution
        .records
        .iter()
        .map(|record| preload_tag(record, module, config))
        .collect::<Vec<_>>()
        .join("\n")
}
