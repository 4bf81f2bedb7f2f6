//! Security headers middleware.
//!
//! Adds security headers to all responses:
//! - Content-Security-Policy
//! - X-Content-Type-Options
//! - X-Frame-Options
//! - Referrer-Policy

use axum::http::HeaderValue;
use axum::http::header::HeaderName;
use tower_http::set_header::SetResponseHeaderLayer;
use ws_assets::url_host;

/// Content-Security-Policy for a site whose static files live at `static_url`.
///
/// Allows Google Fonts, GitHub-hosted emoji images and YouTube embeds. An
/// absolute static URL adds its origin to the script, style and font sources.
pub(crate) fn content_security_policy(static_url: &str) -> String {
    let cdn = static_origin(static_url)
        .map(|origin| format!(" {origin}"))
        .unwrap_or_default();
    format!(
        "default-src 'self'; \
         script-src 'self'{cdn}; \
         style-src 'self'{cdn} 'unsafe-inline' https://fonts.googleapis.com; \
         font-src 'self'{cdn} data: https://fonts.gstatic.com; \
         img-src 'self' data: https:; \
         frame-src https://www.youtube.com; \
         frame-ancestors 'self'"
    )
}

/// `scheme://host` of an absolute static URL.
fn static_origin(static_url: &str) -> Option<String> {
    let (scheme, _) = static_url.split_once("://")?;
    let host = url_host(static_url)?;
    Some(format!("{scheme}://{host}"))
}

pub(crate) fn csp_layer(static_url: &str) -> SetResponseHeaderLayer<HeaderValue> {
    let policy = content_security_policy(static_url);
    let value = HeaderValue::from_str(&policy).unwrap_or_else(|e| {
        tracing::warn!(error = %e, static_url, "Static URL not usable in CSP");
        HeaderValue::from_static("default-src 'self'")
    });
    SetResponseHeaderLayer::if_not_present(
        HeaderName::from_static("content-security-policy"),
        value,
    )
}

pub(crate) fn content_type_options_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    )
}

pub(crate) fn frame_options_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("SAMEORIGIN"),
    )
}

pub(crate) fn referrer_policy_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    )
}
