//! `dns-prefetch` / `preconnect` resource hints.

use std::collections::BTreeSet;

use ws_config::ResourceHintsConfig;

use crate::context::RequestContext;
use crate::tags::render_attrs;

/// Arguments of one `resource_hints` call.
#[derive(Debug, Clone)]
pub struct HintOptions {
    pub rel: String,
    /// Overrides the per-domain `crossorigin` setting.
    pub crossorigin: Option<String>,
    /// Comma-separated extra domains.
    pub extra_domains: Option<String>,
    /// Forget domains already hinted in this request.
    pub reset: bool,
    pub kind: Option<String>,
    pub importance: Option<String>,
    pub fetchpriority: Option<String>,
}

impl Default for HintOptions {
    fn default() -> Self {
        Self {
            rel: "dns-prefetch".to_owned(),
            crossorigin: None,
            extra_domains: None,
            reset: false,
            kind: None,
            importance: None,
            fetchpriority: None,
        }
    }
}

/// Host part of an absolute `http(s)` URL.
pub fn url_host(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let host = rest.split(['/', '?', '#']).next()?;
    (!host.is_empty()).then_some(host)
}

/// Candidate domains before per-request deduplication.
fn candidate_domains(
    config: &ResourceHintsConfig,
    static_base: &str,
    request: &RequestContext,
    extra: Option<&str>,
) -> BTreeSet<String> {
    let mut domains = BTreeSet::new();
    let mut insert = |domain: &str| {
        let domain = domain.trim();
        if !domain.is_empty() {
            domains.insert(domain.to_owned());
        }
    };

    for domain in request.site_domains() {
        insert(domain);
    }
    if let Some(host) = url_host(static_base) {
        insert(host);
    }
    for domain in &config.dns_prefetch_domains {
        insert(domain);
    }
    if let Some(extra) = extra {
        for domain in extra.split(',') {
            insert(domain);
        }
    }
    domains
}

/// Render `<link>` hints for every known domain not yet hinted in this request.
///
/// Output is sorted by domain.
pub fn resource_hints(
    options: &HintOptions,
    config: &ResourceHintsConfig,
    static_base: &str,
    request: &RequestContext,
) -> String {
    if options.reset {
        request.reset_hints();
    }

    let candidates = candidate_domains(config, static_base, request, options.extra_domains.as_deref());
    let domains = request.claim_hint_domains(candidates);

    let lines: Vec<String> = domains
        .iter()
        .map(|domain| {
            let hint = config.domains.get(domain);
            let kind = options
                .kind
                .as_deref()
                .or_else(|| hint.and_then(|h| h.kind.as_deref()));
            let crossorigin = match &options.crossorigin {
                Some(value) => Some(value.as_str()),
                None => hint.filter(|h| h.crossorigin).map(|_| "anonymous"),
            }
            .filter(|_| options.rel == "preconnect");
            let href = format!("//{domain}");

            let attrs = render_attrs(&[
                ("rel", Some(options.rel.as_str())),
                ("href", Some(href.as_str())),
                ("crossorigin", crossorigin.filter(|c| !c.is_empty())),
                ("type", kind),
                ("importance", options.importance.as_deref()),
                ("fetchpriority", options.fetchpriority.as_deref()),
            ]);
            format!("<link {attrs}>")
        })
        .collect();

    tracing::debug!(count = lines.len(), rel = %options.rel, "Rendered resource hints");
    lines.join("\n")
}
