//! Axum integration.
//!
//! Handlers return [`Failure`], [`ProblemError`] or [`HttpError`] directly; each
//! renders a problem with default options. When [`problem_details_layer`] is
//! installed, the original failure travels with that response and is rendered
//! again through the configured [`ProblemHandler`] with the request context.
//!
//! ```ignore
//! let handler = Arc::new(ProblemHandler::new(config).with_localize(translate));
//! let app = Router::new()
//!     .route("/orders", post(create_order))
//!     .fallback(route_not_found)
//!     .layer(axum::middleware::from_fn_with_state(handler, problem_details_layer));
//! ```

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{Method, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use parking_lot::Mutex;

use crate::context::RequestContext;
use crate::error::{Failure, HttpError, ProblemError};
use crate::handler::{Classification, ProblemHandler};
use crate::render::ProblemResponse;

/// Failure waiting for [`problem_details_layer`], attached as a response extension.
#[derive(Debug, Clone)]
pub struct PendingFailure(Arc<Mutex<Option<Failure>>>);

impl PendingFailure {
    fn new(failure: Failure) -> Self {
        Self(Arc::new(Mutex::new(Some(failure))))
    }

    /// Take the failure out; later calls return `None`.
    #[must_use]
    pub fn take(&self) -> Option<Failure> {
        self.0.lock().take()
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        http::Response::<Vec<u8>>::from(self).map(Body::from)
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        // Hooks run in the layer; unclassified failures are logged here too so
        // that routes without the layer still record the error chain.
        let classification = ProblemHandler::default().classify(&self);
        if matches!(classification, Classification::Unclassified(_)) {
            tracing::error!(error = ?self, "unhandled failure reported as internal error");
        }
        let problem = classification.into_problem();
        let mut response = ProblemResponse::from_problem(problem).into_response();
        response.extensions_mut().insert(PendingFailure::new(self));
        response
    }
}

impl IntoResponse for ProblemError {
    fn into_response(self) -> Response {
        Failure::from(self).into_response()
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        Failure::from(self).into_response()
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<JsonRejection> for Failure {
    fn from(rejection: JsonRejection) -> Self {
        Self::Http(rejection.into())
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// Global error hook.
///
/// Runs the inner service and, when the response carries a [`PendingFailure`],
/// replaces it with the configured handler's rendering of that failure.
pub async fn problem_details_layer(
    State(handler): State<Arc<ProblemHandler>>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let mut ctx = RequestContext::from_parts(&parts);

    let mut response = next.run(Request::from_parts(parts, body)).await;

    let Some(failure) = response
        .extensions_mut()
        .remove::<PendingFailure>()
        .and_then(|pending| pending.take())
    else {
        return response;
    };

    handler.handle(&failure, &mut ctx).into_response()
}

/// Router fallback reporting unmatched routes as 404 problems.
#[allow(clippy::unused_async, clippy::needless_pass_by_value)]
pub async fn route_not_found(uri: Uri) -> HttpError {
    HttpError::new(StatusCode::NOT_FOUND, format!("No route for {}", uri.path()))
}

/// Method fallback reporting disallowed methods as 405 problems.
#[allow(clippy::unused_async, clippy::needless_pass_by_value)]
pub async fn method_not_allowed(method: Method, uri: Uri) -> HttpError {
    HttpError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("Method {method} is not allowed for {}", uri.path()),
    )
}
