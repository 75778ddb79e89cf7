//! Stripping of extension keys that are unsafe to merge into a client object.
//!
//! Problem bodies are routinely parsed and spread into plain objects by
//! JavaScript clients. Keys such as `__proto__` or `constructor` would then
//! reach the receiving object's prototype chain, so they never leave this
//! crate as extension members.
//!
//! A `serde_json::Map` has no prototype, so `__proto__` here is an ordinary
//! own key like any other. It is stripped together with the other dangerous
//! names instead of being special-cased.

use std::borrow::Cow;

use serde_json::{Map, Value};

/// Extension members of a problem, flattened next to the standard members on the wire.
pub type Extensions = Map<String, Value>;

/// Extension keys removed before a problem is serialized.
pub const DANGEROUS_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Whether `key` is one of [`DANGEROUS_KEYS`].
#[must_use]
pub fn is_dangerous_key(key: &str) -> bool {
    DANGEROUS_KEYS.contains(&key)
}

/// Remove [`DANGEROUS_KEYS`] from `extensions`.
///
/// The caller's map is never modified: when no dangerous key is present the
/// original map is handed back borrowed, otherwise a filtered copy is returned.
#[must_use]
pub fn sanitize_extensions(extensions: Option<&Extensions>) -> Option<Cow<'_, Extensions>> {
    let extensions = extensions?;
    if !extensions.keys().any(|key| is_dangerous_key(key)) {
        return Some(Cow::Borrowed(extensions));
    }

    let filtered = extensions
        .iter()
        .filter(|(key, _)| !is_dangerous_key(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Some(Cow::Owned(filtered))
}
