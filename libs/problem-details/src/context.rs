//! Per-request context handed to localization and validation hooks.

use http::{HeaderMap, Method, Uri, header, request::Parts};

use crate::problem::ProblemDetails;

/// What the problem handler knows about the request being answered.
///
/// After a problem is rendered, the final normalized value is recorded here
/// and can be read back with [`RequestContext::reported`].
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    reported: Option<ProblemDetails>,
}

impl RequestContext {
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
            reported: None,
        }
    }

    #[must_use]
    pub fn from_parts(parts: &Parts) -> Self {
        Self::new(parts.method.clone(), parts.uri.clone(), parts.headers.clone())
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string; `None` when missing or not visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Most preferred language tag of `Accept-Language` (quality values ignored).
    #[must_use]
    pub fn preferred_language(&self) -> Option<&str> {
        self.headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|tag| tag.split(';').next().unwrap_or(tag).trim())
            .filter(|tag| !tag.is_empty())
    }

    /// Problem reported for this request, once one has been rendered.
    #[must_use]
    pub fn reported(&self) -> Option<&ProblemDetails> {
        self.reported.as_ref()
    }

    pub(crate) fn record(&mut self, problem: ProblemDetails) {
        self.reported = Some(problem);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn built_from_request_parts() {
        let (parts, ()) = http::Request::builder()
            .method(Method::POST)
            .uri("/api/users?limit=1")
            .header("x-request-id", "req-1")
            .body(())
            .unwrap()
            .into_parts();

        let ctx = RequestContext::from_parts(&parts);
        assert_eq!(ctx.method(), &Method::POST);
        assert_eq!(ctx.uri().path(), "/api/users");
        assert_eq!(ctx.header("x-request-id"), Some("req-1"));
        assert!(ctx.reported().is_none());
    }

    #[test]
    fn preferred_language_takes_first_tag() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT_LANGUAGE,
            "de-CH;q=0.9, en;q=0.8".parse().unwrap(),
        );
        let ctx = RequestContext::new(Method::GET, Uri::from_static("/"), headers);
        assert_eq!(ctx.preferred_language(), Some("de-CH"));
    }

    #[test]
    fn preferred_language_absent_without_header() {
        assert_eq!(RequestContext::default().preferred_language(), None);
    }

    #[test]
    fn record_keeps_last_problem() {
        let mut ctx = RequestContext::default();
        ctx.record(ProblemDetails::new(400));
        ctx.record(ProblemDetails::new(404));
        assert_eq!(ctx.reported().unwrap().status, 404);
    }
}
