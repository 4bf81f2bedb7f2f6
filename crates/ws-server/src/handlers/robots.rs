//! `robots.txt`.

use std::sync::Arc;

use axum::Extension;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use ws_assets::RequestContext;
use ws_site::SeoOverrides;

use crate::error::ServerError;
use crate::handlers::SiteData;
use crate::state::AppState;

pub(crate) async fn robots_txt(
    State(state): State<Arc<AppState>>,
    Extension(request): Extension<Arc<RequestContext>>,
) -> Result<impl IntoResponse, ServerError> {
    let site = SiteData::load(&state, &request, &SeoOverrides::default()).await?;
    let ctx = site.context(&request);
    let body = tokio::task::spawn_blocking(move || state.templates.render("robots.txt", ctx)).await??;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body))
}
