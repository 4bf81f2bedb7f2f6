//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ws_markdown::MarkdownError;
use ws_site::SiteError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No content page with this name.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Markdown error: {0}")]
    Markdown(#[from] MarkdownError),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Site store error: {0}")]
    Site(#[from] SiteError),

    /// Blocking render task failed to complete.
    #[error("Render task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::PageNotFound(_)
            | Self::Markdown(
                MarkdownError::NotFound { .. }
                | MarkdownError::UnknownApp(_)
                | MarkdownError::MissingPage(_),
            ) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Not found");
        }
        let reason = status.canonical_reason().unwrap_or("Error");
        (status, format!("{} {reason}", status.as_u16())).into_response()
    }
}
