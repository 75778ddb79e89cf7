//! Validation failures rendered as 422 problems.
//!
//! Each supported issue shape implements [`IntoViolations`]; a
//! [`ValidationHook`] turns any of them into a problem whose `errors`
//! extension lists one [`Violation`] per issue.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::RequestContext;
use crate::problem::{ABOUT_BLANK, ProblemDetails};
use crate::render::ProblemResponse;

/// Status of every validation problem.
pub const VALIDATION_STATUS: i64 = 422;

/// Name of the extension member holding the violations.
pub const ERRORS_MEMBER: &str = "errors";

const DEFAULT_TITLE: &str = "Validation Error";
const DEFAULT_DETAIL: &str = "Request validation failed";

/// Individual validation violation for a specific field or property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[must_use]
pub struct Violation {
    /// field path, e.g. "email" or "user.email"; empty for the whole input
    pub field: String,
    /// Human-readable message describing the validation error
    pub message: String,
    /// Optional machine-readable error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl From<Violation> for Value {
    fn from(violation: Violation) -> Self {
        let mut map = Map::new();
        map.insert("field".to_owned(), Value::String(violation.field));
        map.insert("message".to_owned(), Value::String(violation.message));
        if let Some(code) = violation.code {
            map.insert("code".to_owned(), Value::String(code));
        }
        Value::Object(map)
    }
}

/// Join path segments with `.`; no segments gives the empty string.
#[must_use]
pub fn join_path<I>(segments: I) -> String
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    segments
        .into_iter()
        .map(|segment| segment.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// One step in the path to an invalid value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Library-neutral validation issue: an optional path, a message and an optional code.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Issue {
    pub path: Option<Vec<PathSegment>>,
    pub message: String,
    pub code: Option<String>,
}

impl Issue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: None,
            message: message.into(),
            code: None,
        }
    }

    pub fn at<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        self.path = Some(path.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn to_violation(&self) -> Violation {
        Violation {
            field: self.path.as_deref().map(join_path).unwrap_or_default(),
            message: self.message.clone(),
            code: self.code.clone(),
        }
    }
}

/// Conversion of a validation library's failure shape into violations.
pub trait IntoViolations {
    fn violations(&self) -> Vec<Violation>;
}

impl IntoViolations for [Issue] {
    fn violations(&self) -> Vec<Violation> {
        self.iter().map(Issue::to_violation).collect()
    }
}

impl IntoViolations for Vec<Issue> {
    fn violations(&self) -> Vec<Violation> {
        self.as_slice().violations()
    }
}

impl IntoViolations for [Violation] {
    fn violations(&self) -> Vec<Violation> {
        self.to_vec()
    }
}

impl IntoViolations for Vec<Violation> {
    fn violations(&self) -> Vec<Violation> {
        self.clone()
    }
}

/// Title and detail of the problems produced by a [`ValidationHook`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationHookOptions {
    pub title: Option<String>,
    pub detail: Option<String>,
}

/// Turns failed validation results into 422 problem responses.
#[derive(Debug, Clone, Default)]
pub struct ValidationHook {
    options: ValidationHookOptions,
}

impl ValidationHook {
    #[must_use]
    pub fn new(options: ValidationHookOptions) -> Self {
        Self { options }
    }

    /// The 422 problem reporting `violations`.
    pub fn problem(&self, violations: Vec<Violation>) -> ProblemDetails {
        let errors: Vec<Value> = violations.into_iter().map(Value::from).collect();
        ProblemDetails {
            type_url: ABOUT_BLANK.to_owned(),
            status: VALIDATION_STATUS,
            title: self
                .options
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
            detail: Some(
                self.options
                    .detail
                    .clone()
                    .unwrap_or_else(|| DEFAULT_DETAIL.to_owned()),
            ),
            instance: None,
            extensions: None,
        }
        .with_extension(ERRORS_MEMBER, errors)
    }

    /// `None` when `result` succeeded, otherwise the rendered 422 response.
    pub fn respond<T, E>(
        &self,
        result: &Result<T, E>,
        ctx: &mut RequestContext,
    ) -> Option<ProblemResponse>
    where
        E: IntoViolations,
    {
        let issues = result.as_ref().err()?;
        Some(self.reject(issues, ctx))
    }

    /// Like [`respond`](Self::respond), but hands the payload back on success.
    ///
    /// # Errors
    /// Returns the rendered 422 response when `result` is an error.
    pub fn check<T, E>(
        &self,
        result: Result<T, E>,
        ctx: &mut RequestContext,
    ) -> Result<T, ProblemResponse>
    where
        E: IntoViolations,
    {
        result.map_err(|issues| self.reject(&issues, ctx))
    }

    fn reject<E>(&self, issues: &E, ctx: &mut RequestContext) -> ProblemResponse
    where
        E: IntoViolations + ?Sized,
    {
        let violations = issues.violations();
        tracing::debug!(
            count = violations.len(),
            path = %ctx.uri().path(),
            "request validation failed"
        );
        let problem = self.problem(violations);
        ctx.record(problem.clone());
        ProblemResponse::from_problem(problem)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::json;

    fn body(response: &ProblemResponse) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[test]
    fn success_yields_nothing() {
        let hook = ValidationHook::default();
        let result: Result<u32, Vec<Issue>> = Ok(7);
        let mut ctx = RequestContext::default();
        assert!(hook.respond(&result, &mut ctx).is_none());
        assert!(ctx.reported().is_none());
        assert_eq!(hook.check(result, &mut ctx).unwrap(), 7);
    }

    #[test]
    fn failure_renders_422_with_field_breakdown() {
        let hook = ValidationHook::default();
        let result: Result<(), Vec<Issue>> = Err(vec![
            Issue::new("Required").at(["user", "email"]).with_code("invalid_type"),
            Issue::new("Too small")
                .at([PathSegment::from("items"), PathSegment::from(2), PathSegment::from("qty")]),
            Issue::new("Unrecognized payload"),
        ]);
        let mut ctx = RequestContext::default();
        let response = hook.respond(&result, &mut ctx).unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body(&response),
            json!({
                "type": "about:blank",
                "status": 422,
                "title": "Validation Error",
                "detail": "Request validation failed",
                "errors": [
                    {"field": "user.email", "message": "Required", "code": "invalid_type"},
                    {"field": "items.2.qty", "message": "Too small"},
                    {"field": "", "message": "Unrecognized payload"}
                ]
            })
        );
        assert_eq!(ctx.reported().unwrap().status, 422);
    }

    #[test]
    fn options_override_title_and_detail() {
        let hook = ValidationHook::new(ValidationHookOptions {
            title: Some("Invalid Order".to_owned()),
            detail: Some("The order payload is invalid".to_owned()),
        });
        let result: Result<(), Vec<Violation>> =
            Err(vec![Violation::new("qty", "must be positive")]);
        let response = hook.check(result, &mut RequestContext::default()).unwrap_err();
        let body = body(&response);
        assert_eq!(body["title"], "Invalid Order");
        assert_eq!(body["detail"], "The order payload is invalid");
        assert_eq!(body["errors"][0]["field"], "qty");
    }

    #[test]
    fn empty_path_gives_empty_field() {
        assert_eq!(Issue::new("x").at(Vec::<PathSegment>::new()).to_violation().field, "");
        assert_eq!(Issue::new("x").to_violation().field, "");
        assert_eq!(join_path(["a", "b"]), "a.b");
    }

    #[test]
    fn violations_round_trip_through_serde() {
        let v = Violation::new("email", "Email is required");
        let json = serde_json::to_string(&v).unwrap();
        assert!(!json.contains("code"));
        let back: Violation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
