//! Storefront pages.
//!
//! The front page renders `index.html`. Content pages render the markdown
//! source `pages.{name}` into `page.html`, with SEO overrides from the
//! page's SEO record.

use std::sync::Arc;

use axum::Extension;
use axum::extract::{Path, State};
use axum::response::Html;
use minijinja::{Value, context};
use ws_assets::RequestContext;
use ws_site::SeoOverrides;

use crate::error::ServerError;
use crate::handlers::SiteData;
use crate::state::{AppState, PAGES_APP};

/// Handle `GET /`.
pub(crate) async fn front_page(
    State(state): State<Arc<AppState>>,
    Extension(request): Extension<Arc<RequestContext>>,
) -> Result<Html<String>, ServerError> {
    render_front_page(state, request).await
}

/// Handle `GET /{lang}/`.
pub(crate) async fn localized_front_page(
    Path(lang): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(request): Extension<Arc<RequestContext>>,
) -> Result<Html<String>, ServerError> {
    if !state.is_language(&lang) {
        return Err(ServerError::PageNotFound(format!("/{lang}/")));
    }
    render_front_page(state, request).await
}

async fn render_front_page(
    state: Arc<AppState>,
    request: Arc<RequestContext>,
) -> Result<Html<String>, ServerError> {
    let site = SiteData::load(&state, &request, &SeoOverrides::default()).await?;
    let ctx = site.context(&request);
    let html = tokio::task::spawn_blocking(move || state.templates.render("index.html", ctx)).await??;
    Ok(Html(html))
}

/// Handle `GET /pages/{name}`.
pub(crate) async fn content_page(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(request): Extension<Arc<RequestContext>>,
) -> Result<Html<String>, ServerError> {
    render_content_page(state, request, name).await
}

/// Handle `GET /{lang}/pages/{name}`.
pub(crate) async fn localized_content_page(
    Path((lang, name)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Extension(request): Extension<Arc<RequestContext>>,
) -> Result<Html<String>, ServerError> {
    if !state.is_language(&lang) {
        return Err(ServerError::PageNotFound(format!("/{lang}/pages/{name}")));
    }
    render_content_page(state, request, name).await
}

/// Page names map onto file names, so only plain slugs are accepted.
fn is_page_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

async fn render_content_page(
    state: Arc<AppState>,
    request: Arc<RequestContext>,
    name: String,
) -> Result<Html<String>, ServerError> {
    if !is_page_name(&name) {
        return Err(ServerError::PageNotFound(name));
    }

    let overrides = state
        .repo
        .page_seo(&name)
        .await?
        .map(|seo| seo.overrides())
        .unwrap_or_default();
    let site = SiteData::load(&state, &request, &overrides).await?;
    let base = site.context(&request);

    let html = tokio::task::spawn_blocking(move || -> Result<String, ServerError> {
        let source = format!("{PAGES_APP}.{name}");
        let page = state
            .markdown
            .render(&source, Some(request.language()), &base, false)?;
        let toc: Vec<Value> = page
            .toc
            .iter()
            .map(|entry| context! { level => entry.level, title => &entry.title, id => &entry.id })
            .collect();
        let ctx = context! {
            title => page.title,
            toc => toc,
            content => Value::from_safe_string(page.html),
            ..base
        };
        Ok(state.templates.render("page.html", ctx)?)
    })
    .await??;

    Ok(Html(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_page_name() {
        assert!(is_page_name("about"));
        assert!(is_page_name("terms_and-conditions2"));
        assert!(!is_page_name(""));
        assert!(!is_page_name("../secret"));
        assert!(!is_page_name("a.b"));
    }
}
