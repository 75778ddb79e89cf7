//! RFC 9457 Problem Details for HTTP APIs.
//!
//! This crate turns every failure an HTTP service produces into a consistent
//! `application/problem+json` response:
//! - [`normalize`] fills in defaults for partially specified problems
//!   ([`ProblemInput`] into [`ProblemDetails`]);
//! - [`ProblemError`] carries a declared problem up the call stack;
//! - [`ProblemHandler`] classifies any [`Failure`] (declared, mapped by a
//!   custom classifier, framework-level or unclassified), localizes and
//!   renders it into a [`ProblemResponse`];
//! - [`ProblemRegistry`] holds pre-declared problem types;
//! - [`ValidationHook`] reports validation failures as 422 problems.
//!
//! Optional features: `axum` (response conversions and the global error
//! layer), `utoipa` (OpenAPI schemas and responses), `jsonschema`
//! (violations from `jsonschema` validation errors).
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod problem;
pub mod registry;
pub mod render;
pub mod sanitize;
pub mod status;
pub mod validation;

#[cfg(feature = "axum")]
pub mod axum_ext;
#[cfg(feature = "utoipa")]
pub mod openapi;
#[cfg(feature = "jsonschema")]
pub mod schema;

pub use config::{CONFIG_SECTION, ConfigError, ProblemConfig, config_or_default, config_required};
pub use context::RequestContext;
pub use error::{Failure, HttpError, ProblemError, ProblemResult, problem_details};
pub use handler::{Classification, ProblemHandler};
pub use problem::{ABOUT_BLANK, ProblemDetails, ProblemInput, UNKNOWN_ERROR_TITLE, normalize};
pub use registry::{ProblemOverrides, ProblemRegistry, ProblemType, RegistryError};
pub use render::{
    APPLICATION_PROBLEM_JSON, PROBLEM_JSON_CONTENT_TYPE, ProblemResponse, clamp_http_status,
};
pub use sanitize::{Extensions, sanitize_extensions};
pub use status::{phrase_for, slug_for};
pub use validation::{
    Issue, IntoViolations, PathSegment, ValidationHook, ValidationHookOptions, Violation,
};

#[cfg(feature = "axum")]
pub use axum_ext::{PendingFailure, method_not_allowed, problem_details_layer, route_not_found};
#[cfg(feature = "utoipa")]
pub use openapi::{
    ProblemDetailsSchema, ValidationProblemSchema, problem_details_response,
    problem_details_response_with, problem_details_schema_with,
};
