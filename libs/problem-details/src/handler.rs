//! Centralized failure-to-problem mapping.
//!
//! [`ProblemHandler`] is the single place where caught failures become
//! Problem Details responses. Every failure is classified exactly once, in a
//! fixed order (first match wins):
//!
//! 1. a declared [`ProblemError`](crate::ProblemError) is used as-is;
//! 2. a configured classifier may map the failure to a [`ProblemInput`];
//! 3. a framework-level [`HttpError`](crate::HttpError) keeps its status and message;
//! 4. anything else is an internal error (500).
//!
//! The resulting problem then goes through the optional localization hook,
//! is recorded in the [`RequestContext`] and is rendered.

use std::fmt;
use std::sync::Arc;

use crate::config::ProblemConfig;
use crate::context::RequestContext;
use crate::error::Failure;
use crate::problem::{ABOUT_BLANK, ProblemDetails, ProblemInput, normalize};
use crate::render::ProblemResponse;
use crate::status::{phrase_for, slug_for};

/// Application-specific classifier: map a failure to a problem, or decline with `None`.
pub type MapErrorFn = dyn Fn(&Failure) -> Option<ProblemInput> + Send + Sync;

/// Localization hook: receives the normalized problem before it is rendered.
pub type LocalizeFn = dyn Fn(ProblemDetails, &RequestContext) -> ProblemDetails + Send + Sync;

const INTERNAL_SERVER_ERROR: i64 = 500;

/// Outcome of classifying a [`Failure`].
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Classification {
    /// A declared problem, already normalized.
    Declared(ProblemDetails),
    /// Recognized by the configured classifier.
    Mapped(ProblemInput),
    /// Framework-level failure with an explicit status.
    Framework(ProblemInput),
    /// Anything else.
    Unclassified(ProblemInput),
}

impl Classification {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Declared(_) => "declared",
            Self::Mapped(_) => "mapped",
            Self::Framework(_) => "framework",
            Self::Unclassified(_) => "unclassified",
        }
    }

    /// Normalized problem for this classification.
    pub fn into_problem(self) -> ProblemDetails {
        match self {
            Self::Declared(problem) => problem,
            Self::Mapped(input) | Self::Framework(input) | Self::Unclassified(input) => {
                normalize(input)
            }
        }
    }
}

/// Global problem handler: classification, type URIs, localization and rendering.
#[derive(Clone, Default)]
#[must_use]
pub struct ProblemHandler {
    config: ProblemConfig,
    map_error: Option<Arc<MapErrorFn>>,
    localize: Option<Arc<LocalizeFn>>,
}

impl fmt::Debug for ProblemHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProblemHandler")
            .field("config", &self.config)
            .field("map_error", &self.map_error.is_some())
            .field("localize", &self.localize.is_some())
            .finish()
    }
}

impl ProblemHandler {
    pub fn new(config: ProblemConfig) -> Self {
        Self {
            config,
            map_error: None,
            localize: None,
        }
    }

    /// Install a custom classifier, consulted for every failure that is not a declared problem.
    pub fn with_map_error<F>(mut self, map_error: F) -> Self
    where
        F: Fn(&Failure) -> Option<ProblemInput> + Send + Sync + 'static,
    {
        self.map_error = Some(Arc::new(map_error));
        self
    }

    /// Install a localization hook, applied on every response path.
    pub fn with_localize<F>(mut self, localize: F) -> Self
    where
        F: Fn(ProblemDetails, &RequestContext) -> ProblemDetails + Send + Sync + 'static,
    {
        self.localize = Some(Arc::new(localize));
        self
    }

    #[must_use]
    pub fn config(&self) -> &ProblemConfig {
        &self.config
    }

    /// Type URI for handler-built problems.
    ///
    /// `<prefix>/<slug>` when a prefix is configured and `status` has a slug,
    /// else the configured default type, else `about:blank`.
    #[must_use]
    pub fn build_type(&self, status: i64) -> String {
        if let Some((prefix, slug)) = self.config.type_prefix().zip(slug_for(status)) {
            return format!("{prefix}/{slug}");
        }
        self.config
            .default_type()
            .unwrap_or(ABOUT_BLANK)
            .to_owned()
    }

    /// Decide where `failure` came from and build the matching problem.
    pub fn classify(&self, failure: &Failure) -> Classification {
        if let Failure::Problem(declared) = failure {
            return Classification::Declared(declared.problem().clone());
        }

        if let Some(mapped) = self.map_error.as_ref().and_then(|map| map(failure)) {
            return Classification::Mapped(mapped);
        }

        match failure {
            Failure::Http(http) => {
                let status = i64::from(http.status().as_u16());
                let mut input = ProblemInput::new(status)
                    .with_type(self.build_type(status))
                    .with_detail(http.message());
                input.title = phrase_for(status).map(str::to_owned);
                Classification::Framework(input)
            }
            Failure::Problem(_) | Failure::Other(_) => {
                let mut input = ProblemInput::new(INTERNAL_SERVER_ERROR)
                    .with_type(self.build_type(INTERNAL_SERVER_ERROR))
                    .with_title("Internal Server Error");
                if self.config.include_stack {
                    input.detail = Some(diagnostic_text(failure));
                }
                Classification::Unclassified(input)
            }
        }
    }

    /// Turn a caught failure into the final response.
    ///
    /// Never fails: rendering problems degrade to the fallback body.
    pub fn handle(&self, failure: &Failure, ctx: &mut RequestContext) -> ProblemResponse {
        let classification = self.classify(failure);
        match &classification {
            Classification::Unclassified(_) => {
                tracing::error!(
                    error = ?failure,
                    path = %ctx.uri().path(),
                    "unhandled failure reported as internal error"
                );
            }
            other => {
                tracing::debug!(kind = other.kind(), error = %failure, "failure classified");
            }
        }
        self.respond(classification.into_problem(), ctx)
    }

    /// Localize, record and render an already built problem.
    pub fn respond(&self, problem: ProblemDetails, ctx: &mut RequestContext) -> ProblemResponse {
        let problem = match &self.localize {
            Some(localize) => localize(problem, ctx),
            None => problem,
        };
        ctx.record(problem.clone());
        ProblemResponse::from_problem(problem)
    }
}

/// Full diagnostic rendering of an unclassified failure: message, cause chain
/// and backtrace when one was captured.
fn diagnostic_text(failure: &Failure) -> String {
    match failure {
        Failure::Other(error) => format!("{error:?}"),
        Failure::Problem(_) | Failure::Http(_) => failure.to_string(),
    }
}
