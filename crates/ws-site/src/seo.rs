//! Page SEO values resolved from overrides, site settings and defaults.
//!
//! Each field is resolved independently: a per-page override wins, then the
//! site's settings record, then the configured defaults. Empty settings
//! strings count as unset.

use std::net::IpAddr;

use serde::Serialize;
use ws_assets::RequestContext;
use ws_config::SeoDefaults;

use crate::models::{PageSeo, SiteSettings};

/// Second-level labels under which registrations happen one level deeper.
const TWO_LEVEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "com.au", "net.au", "org.au", "co.nz", "com.br",
    "co.jp", "co.za", "com.ro", "org.ro", "com.tr", "com.mx",
];

/// Per-request overrides, typically from a content page's SEO record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeoOverrides {
    pub title: Option<String>,
    /// Replaces both `name` and `short_name`.
    pub site_name: Option<String>,
    pub author: Option<String>,
    pub copyright: Option<String>,
    pub publisher: Option<String>,
    pub owner: Option<String>,
    pub meta_title: Option<String>,
    pub keywords: Option<String>,
    pub description: Option<String>,
    pub og_image: Option<String>,
    pub twitter_handle: Option<String>,
    pub theme_color: Option<String>,
    pub og_site_name: Option<String>,
    pub image: Option<String>,
}

impl PageSeo {
    /// Non-empty page values as overrides.
    pub fn overrides(&self) -> SeoOverrides {
        let set = |value: &str| (!value.is_empty()).then(|| value.to_owned());
        let image = self.meta_image.as_deref().and_then(set);
        SeoOverrides {
            title: set(&self.meta_title),
            meta_title: set(&self.meta_title),
            description: set(&self.meta_description),
            og_image: image.clone(),
            image,
            ..SeoOverrides::default()
        }
    }
}

/// The `global_seo` template variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalSeo {
    pub title: String,
    pub name: String,
    pub short_name: String,
    pub author: String,
    pub copyright: String,
    pub publisher: String,
    pub owner: String,
    pub meta_title: String,
    pub keywords: String,
    pub description: String,
    pub og_image: String,
    pub twitter_handle: String,
    pub absolute_url: String,
    pub theme_color: String,
    pub og_site_name: String,
    pub image: String,
    pub domain: String,
}

fn pick(override_value: Option<&String>, setting: Option<&str>, default: &str) -> String {
    override_value
        .map(String::as_str)
        .or(setting.filter(|s| !s.is_empty()))
        .unwrap_or(default)
        .to_owned()
}

/// Resolve every SEO field for one request.
pub fn resolve_seo(
    overrides: &SeoOverrides,
    settings: Option<&SiteSettings>,
    defaults: &SeoDefaults,
    request: &RequestContext,
) -> GlobalSeo {
    let s = settings;
    let keywords_txt = s.map(SiteSettings::keywords_txt);
    let image_path = pick(overrides.image.as_ref(), None, &defaults.image);

    GlobalSeo {
        title: pick(overrides.title.as_ref(), s.map(|s| s.name.as_str()), &defaults.title),
        name: pick(overrides.site_name.as_ref(), s.map(|s| s.name.as_str()), &defaults.name),
        short_name: pick(
            overrides.site_name.as_ref(),
            s.map(|s| s.short_name.as_str()),
            &defaults.short_name,
        ),
        author: pick(overrides.author.as_ref(), None, &defaults.author),
        copyright: pick(
            overrides.copyright.as_ref(),
            s.map(|s| s.copyright.as_str()),
            &defaults.copyright,
        ),
        publisher: pick(
            overrides.publisher.as_ref(),
            s.map(|s| s.publisher.as_str()),
            &defaults.publisher,
        ),
        owner: pick(overrides.owner.as_ref(), s.map(|s| s.owner.as_str()), &defaults.owner),
        meta_title: pick(overrides.meta_title.as_ref(), None, &defaults.title),
        keywords: pick(
            overrides.keywords.as_ref(),
            keywords_txt.as_deref(),
            &defaults.keywords.join(","),
        ),
        description: pick(
            overrides.description.as_ref(),
            s.map(|s| s.description.as_str()),
            &defaults.description,
        ),
        og_image: pick(overrides.og_image.as_ref(), None, &defaults.og_image),
        twitter_handle: pick(overrides.twitter_handle.as_ref(), None, &defaults.twitter_site),
        absolute_url: request.absolute_url(),
        theme_color: pick(
            overrides.theme_color.as_ref(),
            s.map(|s| s.theme_color.as_str()),
            &defaults.theme_color,
        ),
        og_site_name: pick(overrides.og_site_name.as_ref(), None, &defaults.og_site_name),
        image: absolute_image(&image_path, request),
        domain: request.host().map(registrable_domain).unwrap_or_default(),
    }
}

/// Image path joined with the request origin; absolute URLs pass through.
fn absolute_image(path: &str, request: &RequestContext) -> String {
    if path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//") {
        return path.to_owned();
    }
    format!("{}/{}", request.origin(), path.trim_start_matches('/'))
}

/// Label directly below the public suffix: `www.shop.co.uk` gives `shop`.
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    if host.parse::<IpAddr>().is_ok() {
        return host;
    }
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    let suffix_len = match labels.as_slice() {
        [] | [_] => return host,
        [.., second, last] if TWO_LEVEL_SUFFIXES.contains(&format!("{second}.{last}").as_str()) => 2,
        _ => 1,
    };
    labels
        .len()
        .checked_sub(suffix_len + 1)
        .map_or(host.clone(), |i| labels[i].to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Keyword;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn request() -> RequestContext {
        RequestContext::new("ro")
            .with_host(Some("www.magazin.ro"))
            .with_scheme("https")
            .with_path("/ro/pages/about")
    }

    fn settings() -> SiteSettings {
        let now = Utc::now();
        SiteSettings {
            id: 1,
            site_id: 1,
            name: "Magazin".to_owned(),
            short_name: "Mag".to_owned(),
            description: "Pantofi și genți".to_owned(),
            keywords: vec![Keyword {
                value: "pantofi".to_owned(),
            }],
            publisher: "Editura".to_owned(),
            owner: String::new(),
            copyright: "© Magazin".to_owned(),
            theme_color: "#112233".to_owned(),
            background_color: String::new(),
            maintenance_mode: false,
            created: now,
            modified: now,
        }
    }

    #[test]
    fn test_defaults_without_settings() {
        let defaults = SeoDefaults::default();
        let seo = resolve_seo(&SeoOverrides::default(), None, &defaults, &request());
        assert_eq!(seo.title, defaults.title);
        assert_eq!(seo.keywords, "webstore,shop");
        assert_eq!(seo.theme_color, "#345212");
        assert_eq!(seo.absolute_url, "https://www.magazin.ro/ro/pages/about");
        assert_eq!(
            seo.image,
            "https://www.magazin.ro/static/img/default/brand/1280x391.png"
        );
        assert_eq!(seo.domain, "magazin");
    }

    #[test]
    fn test_settings_over_defaults() {
        let defaults = SeoDefaults::default();
        let seo = resolve_seo(&SeoOverrides::default(), Some(&settings()), &defaults, &request());
        assert_eq!(seo.title, "Magazin");
        assert_eq!(seo.short_name, "Mag");
        assert_eq!(seo.keywords, "pantofi");
        assert_eq!(seo.publisher, "Editura");
        assert_eq!(seo.owner, defaults.owner);
        assert_eq!(seo.theme_color, "#112233");
        assert_eq!(seo.meta_title, defaults.title);
    }

    #[test]
    fn test_page_overrides_win() {
        let page = PageSeo {
            page: "about".to_owned(),
            meta_title: "Despre noi".to_owned(),
            meta_description: String::new(),
            meta_image: Some("https://cdn.magazin.ro/about.png".to_owned()),
        };
        let seo = resolve_seo(
            &page.overrides(),
            Some(&settings()),
            &SeoDefaults::default(),
            &request(),
        );
        assert_eq!(seo.title, "Despre noi");
        assert_eq!(seo.meta_title, "Despre noi");
        assert_eq!(seo.description, "Pantofi și genți");
        assert_eq!(seo.og_image, "https://cdn.magazin.ro/about.png");
        assert_eq!(seo.image, "https://cdn.magazin.ro/about.png");
    }

    #[test]
    fn test_site_name_override_sets_both_names() {
        let overrides = SeoOverrides {
            site_name: Some("Outlet".to_owned()),
            ..SeoOverrides::default()
        };
        let seo = resolve_seo(&overrides, Some(&settings()), &SeoDefaults::default(), &request());
        assert_eq!(seo.name, "Outlet");
        assert_eq!(seo.short_name, "Outlet");
        assert_eq!(seo.title, "Magazin");
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(registrable_domain("www.magazin.ro"), "magazin");
        assert_eq!(registrable_domain("shop.example.co.uk"), "example");
        assert_eq!(registrable_domain("magazin.ro"), "magazin");
        assert_eq!(registrable_domain("co.uk"), "co.uk");
        assert_eq!(registrable_domain("localhost"), "localhost");
        assert_eq!(registrable_domain("127.0.0.1"), "127.0.0.1");
    }
}
