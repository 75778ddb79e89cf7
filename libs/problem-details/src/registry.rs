//! Catalog of pre-declared problem types.
//!
//! Templates are declared once at startup and never change. Asking for a key
//! that was not registered is a programming error: [`ProblemRegistry::create`]
//! and [`ProblemRegistry::get`] panic instead of falling back silently.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ProblemError;
use crate::problem::ProblemInput;
use crate::sanitize::Extensions;

/// Static problem type definition from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemType {
    #[serde(rename = "type")]
    pub type_url: Cow<'static, str>,
    pub status: i64,
    pub title: Cow<'static, str>,
}

impl ProblemType {
    /// Const constructor for statically declared templates.
    #[must_use]
    pub const fn new(type_url: &'static str, status: i64, title: &'static str) -> Self {
        Self {
            type_url: Cow::Borrowed(type_url),
            status,
            title: Cow::Borrowed(title),
        }
    }

    /// Convert this definition into a problem carrier with per-occurrence overrides.
    pub fn instantiate(&self, overrides: ProblemOverrides) -> ProblemError {
        ProblemError::new(ProblemInput {
            status: self.status,
            type_url: Some(self.type_url.clone().into_owned()),
            title: Some(self.title.clone().into_owned()),
            detail: overrides.detail,
            instance: overrides.instance,
            extensions: overrides.extensions,
        })
    }
}

/// Per-occurrence members merged over a template.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct ProblemOverrides {
    pub detail: Option<String>,
    pub instance: Option<String>,
    pub extensions: Option<Extensions>,
}

impl ProblemOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = Some(extensions);
        self
    }

    pub fn extension(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.extensions
            .get_or_insert_with(Extensions::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Errors raised while building a registry.
#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("problem type '{key}' is declared more than once")]
    DuplicateKey { key: String },
    #[error("problem type '{key}' has an empty '{field}'")]
    EmptyField { key: String, field: &'static str },
    #[error("invalid problem type catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Immutable, ordered catalog of problem type templates keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ProblemRegistry {
    entries: Vec<(String, ProblemType)>,
    index: HashMap<String, usize>,
}

impl ProblemRegistry {
    /// Build a registry; declaration order is kept for [`types`](Self::types).
    ///
    /// # Panics
    /// Panics if the declarations are invalid (see [`try_new`](Self::try_new)).
    #[must_use]
    pub fn new<I, K>(definitions: I) -> Self
    where
        I: IntoIterator<Item = (K, ProblemType)>,
        K: Into<String>,
    {
        match Self::try_new(definitions) {
            Ok(registry) => registry,
            Err(err) => panic!("invalid problem type registry: {err}"),
        }
    }

    /// Build a registry, rejecting duplicate keys and empty `type`/`title`.
    ///
    /// # Errors
    /// Returns [`RegistryError`] on the first invalid declaration.
    pub fn try_new<I, K>(definitions: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (K, ProblemType)>,
        K: Into<String>,
    {
        let mut registry = Self::default();
        for (key, definition) in definitions {
            registry.insert(key.into(), definition)?;
        }
        Ok(registry)
    }

    /// Load a registry from a JSON object of `key -> {type, status, title}`.
    ///
    /// # Errors
    /// Returns [`RegistryError`] if the JSON is malformed or a declaration is invalid.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let Catalog(definitions) = serde_json::from_str(json)?;
        Self::try_new(definitions)
    }

    fn insert(&mut self, key: String, definition: ProblemType) -> Result<(), RegistryError> {
        if self.index.contains_key(&key) {
            return Err(RegistryError::DuplicateKey { key });
        }
        if definition.type_url.is_empty() {
            return Err(RegistryError::EmptyField { key, field: "type" });
        }
        if definition.title.is_empty() {
            return Err(RegistryError::EmptyField {
                key,
                field: "title",
            });
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, definition));
        Ok(())
    }

    /// Fresh carrier for the template `key`, with `overrides` merged in.
    ///
    /// # Panics
    /// Panics if `key` is not registered.
    pub fn create(&self, key: &str, overrides: ProblemOverrides) -> ProblemError {
        self.get(key).instantiate(overrides)
    }

    /// Template registered under `key`.
    ///
    /// # Panics
    /// Panics if `key` is not registered.
    #[must_use]
    pub fn get(&self, key: &str) -> &ProblemType {
        match self.lookup(key) {
            Some(definition) => definition,
            None => panic!("problem type '{key}' is not registered"),
        }
    }

    /// Template registered under `key`, if any.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&ProblemType> {
        self.index.get(key).map(|&at| &self.entries[at].1)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Registered keys in declaration order.
    #[must_use]
    pub fn types(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// JSON catalog read in document order, duplicates included.
struct Catalog(Vec<(String, ProblemType)>);

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = Catalog;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of problem type definitions")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, ProblemType>()? {
                    entries.push(entry);
                }
                Ok(Catalog(entries))
            }
        }

        deserializer.deserialize_map(CatalogVisitor)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::{Value, json};

    const OUT_OF_STOCK: ProblemType =
        ProblemType::new("https://api.example.com/problems/out-of-stock", 409, "Out of Stock");
    const INSUFFICIENT_FUNDS: ProblemType = ProblemType::new(
        "https://api.example.com/problems/insufficient-funds",
        402,
        "Insufficient Funds",
    );

    fn registry() -> ProblemRegistry {
        ProblemRegistry::new([
            ("OUT_OF_STOCK", OUT_OF_STOCK),
            ("INSUFFICIENT_FUNDS", INSUFFICIENT_FUNDS),
        ])
    }

    #[test]
    fn create_uses_registered_template() {
        let err = registry().create("OUT_OF_STOCK", ProblemOverrides::new());
        let p = err.problem();
        assert_eq!(p.type_url, "https://api.example.com/problems/out-of-stock");
        assert_eq!(p.status, 409);
        assert_eq!(p.title, "Out of Stock");
        assert_eq!(p.detail, None);
    }

    #[test]
    fn create_merges_overrides() {
        let err = registry().create(
            "INSUFFICIENT_FUNDS",
            ProblemOverrides::new()
                .detail("Balance is 30, but that costs 50.")
                .instance("/orders/123")
                .extension("balance", 30),
        );
        let p = err.problem();
        assert_eq!(p.status, 402);
        assert_eq!(p.detail.as_deref(), Some("Balance is 30, but that costs 50."));
        assert_eq!(p.instance.as_deref(), Some("/orders/123"));
        assert_eq!(p.extensions.as_ref().unwrap()["balance"], 30);
        assert_eq!(err.to_string(), "Balance is 30, but that costs 50.");
    }

    #[test]
    fn created_error_renders() {
        let response = registry()
            .create("OUT_OF_STOCK", ProblemOverrides::new().detail("sku 42"))
            .to_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(
            body,
            json!({
                "type": "https://api.example.com/problems/out-of-stock",
                "status": 409,
                "title": "Out of Stock",
                "detail": "sku 42"
            })
        );
    }

    #[test]
    fn create_returns_fresh_carriers() {
        let registry = registry();
        let first = registry.create("OUT_OF_STOCK", ProblemOverrides::new().detail("a"));
        let second = registry.create("OUT_OF_STOCK", ProblemOverrides::new());
        assert_eq!(first.problem().detail.as_deref(), Some("a"));
        assert_eq!(second.problem().detail, None);
        assert_eq!(registry.get("OUT_OF_STOCK"), &OUT_OF_STOCK);
    }

    #[test]
    fn types_are_in_declaration_order() {
        let registry = registry();
        assert_eq!(registry.types(), vec!["OUT_OF_STOCK", "INSUFFICIENT_FUNDS"]);
        assert_eq!(registry.types(), registry.types());
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("OUT_OF_STOCK"));
        assert!(registry.lookup("NOPE").is_none());
    }

    #[test]
    #[should_panic(expected = "problem type 'NOPE' is not registered")]
    fn unregistered_key_fails_fast() {
        drop(registry().create("NOPE", ProblemOverrides::new()));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = ProblemRegistry::try_new([("A", OUT_OF_STOCK), ("A", INSUFFICIENT_FUNDS)])
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateKey { key } if key == "A"));
    }

    #[test]
    fn empty_fields_are_rejected() {
        let err = ProblemRegistry::try_new([("A", ProblemType::new("", 400, "Bad"))]).unwrap_err();
        assert!(matches!(err, RegistryError::EmptyField { field: "type", .. }));
    }

    #[test]
    fn loads_json_catalog_in_document_order() {
        let registry = ProblemRegistry::from_json(
            r#"{
                "ZETA": {"type": "https://x/zeta", "status": 400, "title": "Zeta"},
                "ALPHA": {"type": "https://x/alpha", "status": 404, "title": "Alpha"}
            }"#,
        )
        .unwrap();
        assert_eq!(registry.types(), vec!["ZETA", "ALPHA"]);
        assert_eq!(registry.get("ALPHA").status, 404);
    }

    #[test]
    fn json_catalog_duplicates_are_rejected() {
        let err = ProblemRegistry::from_json(
            r#"{
                "A": {"type": "https://x/a", "status": 400, "title": "A"},
                "A": {"type": "https://x/b", "status": 400, "title": "B"}
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateKey { .. }));
    }

    #[test]
    fn malformed_json_catalog_is_an_error() {
        let err = ProblemRegistry::from_json(r#"{"A": {"status": 400}}"#).unwrap_err();
        assert!(matches!(err, RegistryError::Parse(_)));
    }
}
