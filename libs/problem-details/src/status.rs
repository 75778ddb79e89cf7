//! HTTP status phrases and URL slugs used to fill in problem defaults.
//!
//! The slug table is derived from the phrase table once, on first use, so the
//! two always cover the same set of status codes.

use std::collections::HashMap;
use std::sync::LazyLock;

const STATUS_PHRASES: [(i64, &str); 20] = [
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (406, "Not Acceptable"),
    (408, "Request Timeout"),
    (409, "Conflict"),
    (410, "Gone"),
    (411, "Length Required"),
    (412, "Precondition Failed"),
    (413, "Content Too Large"),
    (415, "Unsupported Media Type"),
    (422, "Unprocessable Content"),
    (429, "Too Many Requests"),
    (500, "Internal Server Error"),
    (501, "Not Implemented"),
    (502, "Bad Gateway"),
    (503, "Service Unavailable"),
    (504, "Gateway Timeout"),
];

static PHRASES: LazyLock<HashMap<i64, &'static str>> =
    LazyLock::new(|| STATUS_PHRASES.into_iter().collect());

static SLUGS: LazyLock<HashMap<i64, String>> = LazyLock::new(|| {
    STATUS_PHRASES
        .into_iter()
        .map(|(status, phrase)| (status, slugify(phrase)))
        .collect()
});

fn slugify(phrase: &str) -> String {
    phrase.to_lowercase().replace(' ', "-")
}

/// Reason phrase for `status`, if the status is one this crate knows about.
#[must_use]
pub fn phrase_for(status: i64) -> Option<&'static str> {
    PHRASES.get(&status).copied()
}

/// URL-safe slug for `status` (`422` is `unprocessable-content`).
#[must_use]
pub fn slug_for(status: i64) -> Option<&'static str> {
    let slugs: &'static HashMap<i64, String> = &SLUGS;
    slugs.get(&status).map(String::as_str)
}

/// All status codes with a known phrase, in ascending order.
#[must_use]
pub fn known_statuses() -> Vec<i64> {
    STATUS_PHRASES.iter().map(|(status, _)| *status).collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn phrases_for_known_statuses() {
        let cases = [
            (400, "Bad Request"),
            (401, "Unauthorized"),
            (403, "Forbidden"),
            (404, "Not Found"),
            (409, "Conflict"),
            (422, "Unprocessable Content"),
            (429, "Too Many Requests"),
            (500, "Internal Server Error"),
            (502, "Bad Gateway"),
            (503, "Service Unavailable"),
        ];
        for (status, phrase) in cases {
            assert_eq!(phrase_for(status), Some(phrase), "status {status}");
        }
    }

    #[test]
    fn slugs_for_known_statuses() {
        assert_eq!(slug_for(400), Some("bad-request"));
        assert_eq!(slug_for(404), Some("not-found"));
        assert_eq!(slug_for(413), Some("content-too-large"));
        assert_eq!(slug_for(422), Some("unprocessable-content"));
        assert_eq!(slug_for(429), Some("too-many-requests"));
        assert_eq!(slug_for(500), Some("internal-server-error"));
    }

    #[test]
    fn unknown_status_has_neither_phrase_nor_slug() {
        for status in [999, 200, 418, -1, 0] {
            assert_eq!(phrase_for(status), None);
            assert_eq!(slug_for(status), None);
        }
    }

    #[test]
    fn slug_table_tracks_phrase_table() {
        for status in known_statuses() {
            let phrase = phrase_for(status).unwrap();
            let slug = slug_for(status).unwrap();
            assert_eq!(slug, phrase.to_lowercase().replace(' ', "-"));
            assert!(!slug.contains(' '));
        }
        assert_eq!(PHRASES.len(), SLUGS.len());
    }

    #[test]
    fn known_statuses_are_sorted() {
        let statuses = known_statuses();
        let mut sorted = statuses.clone();
        sorted.sort_unstable();
        assert_eq!(statuses, sorted);
    }
}
