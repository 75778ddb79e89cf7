//! OpenAPI documentation for problem responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa::openapi::{AllOfBuilder, ContentBuilder, Ref, RefOr, Response, ResponseBuilder, Schema};

use crate::render::APPLICATION_PROBLEM_JSON;
use crate::status::phrase_for;
use crate::validation::{VALIDATION_STATUS, Violation};

const FALLBACK_DESCRIPTION: &str = "Error";

/// RFC 9457 Problem Details body. Extension members appear next to these.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    as = ProblemDetails,
    title = "ProblemDetails",
    description = "RFC 9457 Problem Details for HTTP APIs"
)]
pub struct ProblemDetailsSchema {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    #[schema(example = "about:blank")]
    pub type_url: String,
    /// The HTTP status code generated by the origin server.
    #[schema(example = 404)]
    pub status: i64,
    /// A short, human-readable summary of the problem type.
    #[schema(example = "Not Found")]
    pub title: String,
    /// A human-readable explanation specific to this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// A URI reference that identifies the specific occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Problem Details body of a failed request validation (422).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(as = ValidationProblem, title = "ValidationProblem")]
pub struct ValidationProblemSchema {
    #[serde(rename = "type")]
    #[schema(example = "about:blank")]
    pub type_url: String,
    #[schema(example = 422)]
    pub status: i64,
    #[schema(example = "Validation Error")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Request validation failed")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// One entry per invalid field.
    pub errors: Vec<Violation>,
}

/// Documented `application/problem+json` response for `status`.
///
/// The description defaults to the status phrase, or `"Error"` for unknown
/// statuses. 422 responses reference the validation problem schema.
#[must_use]
pub fn problem_details_response(status: i64, description: Option<&str>) -> Response {
    let schema_name = if status == VALIDATION_STATUS {
        <ValidationProblemSchema as ToSchema>::name()
    } else {
        <ProblemDetailsSchema as ToSchema>::name()
    };
    problem_details_response_with(status, description, Ref::from_schema_name(schema_name))
}

/// Like [`problem_details_response`], with a caller-supplied body schema.
///
/// Pair it with [`problem_details_schema_with`] to document a problem type
/// that carries typed extension members.
#[must_use]
pub fn problem_details_response_with(
    status: i64,
    description: Option<&str>,
    schema: impl Into<RefOr<Schema>>,
) -> Response {
    let description = description
        .or_else(|| phrase_for(status))
        .unwrap_or(FALLBACK_DESCRIPTION);

    let content = ContentBuilder::new().schema(Some(schema)).build();

    ResponseBuilder::new()
        .description(description)
        .content(APPLICATION_PROBLEM_JSON, content)
        .build()
}

/// Problem Details schema extended with typed members.
///
/// Extension members sit at the top level of the body, so the result is an
/// `allOf` of the base `ProblemDetails` schema and `extensions`.
///
/// ```ignore
/// #[derive(utoipa::ToSchema)]
/// struct OutOfCredit { balance: i64 }
///
/// let schema = problem_details_schema_with(<OutOfCredit as PartialSchema>::schema());
/// ```
#[must_use]
pub fn problem_details_schema_with(extensions: impl Into<RefOr<Schema>>) -> Schema {
    Schema::AllOf(
        AllOfBuilder::new()
            .item(Ref::from_schema_name(<ProblemDetailsSchema as ToSchema>::name()))
            .item(extensions)
            .build(),
    )
}
