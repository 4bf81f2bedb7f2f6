//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{context, maintenance, security};
use crate::state::AppState;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::pages::front_page))
        .route("/{lang}/", get(handlers::pages::localized_front_page))
        .route("/pages/{name}", get(handlers::pages::content_page))
        .route(
            "/{lang}/pages/{name}",
            get(handlers::pages::localized_content_page),
        )
        .route("/robots.txt", get(handlers::robots::robots_txt));

    // Static files, when served from a local prefix
    let prefix = state.static_url.trim_end_matches('/');
    if state.static_url.starts_with('/') && !prefix.is_empty() {
        router = router.nest_service(prefix, ServeDir::new(&state.static_root));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::csp_layer(&state.static_url))
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer())
                .layer(security::referrer_policy_layer())
                .layer(from_fn_with_state(
                    Arc::clone(&state),
                    context::request_context,
                ))
                .layer(from_fn_with_state(
                    Arc::clone(&state),
                    maintenance::maintenance_gate,
                )),
        )
        .with_state(state)
}
