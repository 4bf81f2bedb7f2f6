//! Per-request context.
//!
//! Builds the [`RequestContext`] for each request, stores it as a request
//! extension and clears it once the response is produced.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use ws_assets::{RequestContext, RequestScope};

use crate::state::AppState;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

pub(crate) async fn request_context(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let headers = req.headers();
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().host())
        .map(str::to_owned);
    let scheme = headers
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().scheme_str())
        .unwrap_or("http")
        .to_owned();
    let path = req
        .uri()
        .path_and_query()
        .map_or_else(|| req.uri().path().to_owned(), |pq| pq.as_str().to_owned());
    let language = state.language_for(req.uri().path()).to_owned();

    let domains = state.repo.domains().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Cannot list site domains");
        Vec::new()
    });

    let context = Arc::new(
        RequestContext::new(language)
            .with_host(host.as_deref())
            .with_scheme(scheme)
            .with_path(path)
            .with_site_domains(domains),
    );
    let scope = RequestScope::new(Arc::clone(&context));
    req.extensions_mut().insert(context);

    let response = next.run(req).await;
    drop(scope);
    response
}
