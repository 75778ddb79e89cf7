//! Turning a problem into an in-memory HTTP response.
//!
//! The transport status is clamped to `200..=599` independently of the `status`
//! member in the body. If the body cannot be encoded, a minimal 500 body is
//! sent instead; rendering never fails.

use http::StatusCode;
use serde::Serialize;

use crate::problem::ProblemDetails;

/// Content type for Problem Details as per RFC 9457.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// `Content-Type` header value sent with every problem response.
pub const PROBLEM_JSON_CONTENT_TYPE: &str = "application/problem+json; charset=utf-8";

/// Body sent when the real body cannot be encoded.
pub const FALLBACK_BODY: &str =
    r#"{"type":"about:blank","status":500,"title":"Internal Server Error"}"#;

/// Status used on the response line for a problem reporting `status`.
///
/// Values in `200..=599` pass through, everything else becomes 500.
#[must_use]
pub fn clamp_http_status(status: i64) -> StatusCode {
    if !(200..=599).contains(&status) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    u16::try_from(status)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// A rendered problem: transport status, encoded body and the problem it was rendered from.
#[derive(Debug, Clone)]
#[must_use]
pub struct ProblemResponse {
    status: StatusCode,
    body: Vec<u8>,
    problem: Option<Box<ProblemDetails>>,
}

impl ProblemResponse {
    /// Render `problem`: sanitize extensions, merge them under the standard
    /// members, clamp the transport status and encode.
    pub fn from_problem(problem: ProblemDetails) -> Self {
        let mut response = Self::encode(problem.status, &problem.body());
        response.problem = Some(Box::new(problem));
        response
    }

    /// Encode an arbitrary problem body with the transport status derived from `status`.
    ///
    /// On encoding failure the body is replaced by [`FALLBACK_BODY`] and the
    /// transport status is forced to 500.
    pub fn encode<B>(status: i64, body: &B) -> Self
    where
        B: Serialize + ?Sized,
    {
        match serde_json::to_vec(body) {
            Ok(body) => Self {
                status: clamp_http_status(status),
                body,
                problem: None,
            },
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    status,
                    "problem body is not serializable, sending fallback"
                );
                Self::fallback()
            }
        }
    }

    /// The minimal 500 response.
    pub fn fallback() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: FALLBACK_BODY.as_bytes().to_vec(),
            problem: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn content_type(&self) -> &'static str {
        PROBLEM_JSON_CONTENT_TYPE
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The problem this response reports, when it was rendered from one.
    #[must_use]
    pub fn problem(&self) -> Option<&ProblemDetails> {
        self.problem.as_deref()
    }

    #[must_use]
    pub fn into_parts(self) -> (StatusCode, Vec<u8>, Option<ProblemDetails>) {
        (self.status, self.body, self.problem.map(|problem| *problem))
    }
}

impl From<ProblemDetails> for ProblemResponse {
    fn from(problem: ProblemDetails) -> Self {
        Self::from_problem(problem)
    }
}

impl From<ProblemResponse> for http::Response<Vec<u8>> {
    fn from(response: ProblemResponse) -> Self {
        let (status, body, problem) = response.into_parts();
        let mut http_response = http::Response::new(body);
        *http_response.status_mut() = status;
        http_response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static(PROBLEM_JSON_CONTENT_TYPE),
        );
        if let Some(problem) = problem {
            http_response.extensions_mut().insert(problem);
        }
        http_response
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::problem::{ProblemInput, normalize};
    use serde::Serializer;
    use serde_json::{Value, json};
    use std::collections::BTreeMap;

    fn body_json(response: &ProblemResponse) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[test]
    fn clamp_keeps_valid_range() {
        for status in [200, 201, 400, 404, 422, 500, 599] {
            assert_eq!(i64::from(clamp_http_status(status).as_u16()), status);
        }
    }

    #[test]
    fn clamp_replaces_out_of_range_with_500() {
        for status in [9999, -1, 0, 100, 199, 600, 999, i64::MAX, i64::MIN] {
            assert_eq!(clamp_http_status(status), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn response_status_mirrors_body_status() {
        let response = ProblemResponse::from_problem(
            normalize(
                ProblemInput::new(409)
                    .with_type("https://x/conflict")
                    .with_title("Conflict"),
            ),
        );
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(response.content_type(), PROBLEM_JSON_CONTENT_TYPE);
        assert_eq!(
            body_json(&response),
            json!({"type": "https://x/conflict", "status": 409, "title": "Conflict"})
        );
        assert_eq!(response.problem().unwrap().status, 409);
    }

    #[test]
    fn body_keeps_unclamped_status() {
        let response = ProblemResponse::from_problem(ProblemDetails::new(9999));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&response)["status"], 9999);

        let response = ProblemResponse::from_problem(ProblemDetails::new(-1));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&response)["status"], -1);
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cyclic value"))
        }
    }

    #[test]
    fn unserializable_body_falls_back_to_minimal_500() {
        let response = ProblemResponse::encode(422, &Unserializable);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(&response),
            json!({"type": "about:blank", "status": 500, "title": "Internal Server Error"})
        );
        assert!(response.problem().is_none());
    }

    #[test]
    fn non_string_map_keys_fall_back_even_for_valid_status() {
        let mut body = BTreeMap::new();
        body.insert((1, 2), "tuple keys are not JSON");
        let response = ProblemResponse::encode(409, &body);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body(), FALLBACK_BODY.as_bytes());
    }

    #[test]
    fn converts_into_http_response() {
        let response: http::Response<Vec<u8>> =
            ProblemResponse::from_problem(ProblemDetails::new(404).with_detail("gone")).into();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[http::header::CONTENT_TYPE],
            PROBLEM_JSON_CONTENT_TYPE
        );
        let reported = response.extensions().get::<ProblemDetails>().unwrap();
        assert_eq!(reported.detail.as_deref(), Some("gone"));
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["detail"], "gone");
    }
}
