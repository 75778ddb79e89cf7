//! Error values that carry problems up the call stack.

use std::fmt;

use http::StatusCode;

use crate::problem::{ProblemDetails, ProblemInput, normalize};
use crate::render::ProblemResponse;

/// An error that owns exactly one normalized [`ProblemDetails`].
///
/// Handlers return it (usually through [`ProblemResult`]) to report a
/// fully specified problem; the problem is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ProblemError {
    problem: Box<ProblemDetails>,
}

/// Result of an operation that may end in a declared problem.
pub type ProblemResult<T = ()> = Result<T, ProblemError>;

impl ProblemError {
    pub fn new(input: ProblemInput) -> Self {
        Self {
            problem: Box::new(normalize(input)),
        }
    }

    pub fn problem(&self) -> &ProblemDetails {
        &self.problem
    }

    pub fn into_problem(self) -> ProblemDetails {
        *self.problem
    }

    /// `detail` when present, otherwise `title`.
    #[must_use]
    pub fn message(&self) -> &str {
        self.problem.summary()
    }

    /// Render the carried problem as a ready-to-send response.
    pub fn to_response(&self) -> ProblemResponse {
        ProblemResponse::from_problem(self.problem().clone())
    }
}

/// Build a [`ProblemError`] from a partially specified problem.
pub fn problem_details(input: ProblemInput) -> ProblemError {
    ProblemError::new(input)
}

impl fmt::Display for ProblemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ProblemError {}

impl From<ProblemInput> for ProblemError {
    fn from(input: ProblemInput) -> Self {
        Self::new(input)
    }
}

impl From<ProblemDetails> for ProblemError {
    fn from(problem: ProblemDetails) -> Self {
        Self {
            problem: Box::new(problem),
        }
    }
}

/// Framework-level failure with an explicit status and message
/// (rejected extractor, unmatched route, disallowed method, ...).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
#[must_use]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Any failure that can reach the problem handler.
///
/// Classification follows variant order: declared problems first, then
/// framework-level failures, then everything else.
#[derive(Debug, thiserror::Error)]
#[must_use]
pub enum Failure {
    /// Raised deliberately via [`ProblemError`].
    #[error(transparent)]
    Problem(#[from] ProblemError),
    /// Recognized framework-level failure.
    #[error(transparent)]
    Http(#[from] HttpError),
    /// Anything else; reported as an internal error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Failure {
    /// Wrap an arbitrary error as an unclassified failure.
    pub fn other<E>(error: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::Other(error.into())
    }

    /// Try to view the unclassified error as a concrete type.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        match self {
            Self::Other(error) => error.downcast_ref::<E>(),
            Self::Problem(_) | Self::Http(_) => None,
        }
    }
}
