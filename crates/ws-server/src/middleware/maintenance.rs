//! Maintenance mode gate.
//!
//! Requests for a site in maintenance get the maintenance page (or a
//! redirect) instead of the storefront. Ignored URLs and static files
//! always pass.

use std::sync::Arc;

use axum::Extension;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};
use minijinja::context;
use ws_assets::RequestContext;
use ws_site::{SeoOverrides, is_maintenance_active, resolve_seo};

use crate::state::AppState;
use crate::templates::RequestObject;

pub(crate) async fn maintenance_gate(
    State(state): State<Arc<AppState>>,
    Extension(request): Extension<Arc<RequestContext>>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();
    if state.maintenance.bypasses(&path) || !is_maintenance_active(&state.repo, request.host()).await
    {
        return next.run(req).await;
    }

    tracing::debug!(host = ?request.host(), %path, "Maintenance mode active");

    if let Some(url) = &state.maintenance.redirect_url {
        return (StatusCode::FOUND, [(header::LOCATION, url.clone())]).into_response();
    }

    maintenance_page(&state, request).await
}

async fn maintenance_page(state: &Arc<AppState>, request: Arc<RequestContext>) -> Response {
    let status =
        StatusCode::from_u16(state.maintenance.status_code).unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
    let retry_after = HeaderValue::from(state.maintenance.retry_after);

    let settings = match request.host() {
        Some(host) => state.repo.settings_for_domain(host).await.ok().flatten(),
        None => None,
    };
    let global_seo = resolve_seo(&SeoOverrides::default(), settings.as_ref(), &state.seo, &request);

    let render_state = Arc::clone(state);
    let rendered = tokio::task::spawn_blocking(move || {
        render_state.templates.render(
            &render_state.maintenance.template,
            context! {
                request => RequestObject::value(&request),
                global_seo => global_seo,
            },
        )
    })
    .await;

    let body = match rendered {
        Ok(Ok(html)) => html,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Cannot render maintenance page");
            status.canonical_reason().unwrap_or_default().to_owned()
        }
        Err(e) => {
            tracing::error!(error = %e, "Maintenance render task failed");
            status.canonical_reason().unwrap_or_default().to_owned()
        }
    };

    (status, [(header::RETRY_AFTER, retry_after)], Html(body)).into_response()
}
