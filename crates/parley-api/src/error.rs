use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use thiserror::Error;
use tracing::error;

use crate::views;

/// Application-level error that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed form input.
    #[error("invalid input: {0}")]
    Validation(String),
    /// A party or user id did not resolve.
    #[error("not found")]
    NotFound,
    /// Bad credentials, or an operation that requires a logged-in user.
    /// Deliberately carries no detail: unknown usernames and wrong
    /// passwords must stay indistinguishable to the client.
    #[error("authentication required")]
    Auth,
    /// A uniqueness violation on registration.
    #[error("{0} is already taken")]
    Conflict(&'static str),
    /// Store or hash-subsystem failure.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Html(views::error_page(&msg))).into_response()
            }
            // The not-found view renders with HTTP 200, preserving the
            // behavior of the surface this replaces.
            AppError::NotFound => (StatusCode::OK, Html(views::not_found())).into_response(),
            AppError::Auth => Redirect::to("/login?invalid").into_response(),
            AppError::Conflict(what) => (
                StatusCode::CONFLICT,
                Html(views::error_page(&format!("That {} is already taken", what))),
            )
                .into_response(),
            AppError::Internal(e) => {
                error!("internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(views::error_page("Something went wrong")),
                )
                    .into_response()
            }
        }
    }
}

/// Run a store call off the async runtime. Failures inside the closure and
/// join errors both surface as `AppError::Internal`.
pub async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("blocking task join error: {}", e)))?
        .map_err(AppError::Internal)
}
