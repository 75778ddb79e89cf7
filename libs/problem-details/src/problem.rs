//! Problem Details values, normalization and wire format.

use std::borrow::Cow;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::sanitize::{Extensions, sanitize_extensions};
use crate::status::phrase_for;

/// Problem type used when none is given.
pub const ABOUT_BLANK: &str = "about:blank";

/// Title used when neither the input nor the status lookup provides one.
pub const UNKNOWN_ERROR_TITLE: &str = "Unknown Error";

/// Standard members. Extension keys with these names never reach the wire.
pub const STANDARD_MEMBERS: [&str; 5] = ["type", "status", "title", "detail", "instance"];

/// Partially specified problem; only `status` is required.
///
/// Turned into a [`ProblemDetails`] by [`normalize`].
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct ProblemInput {
    pub status: i64,
    pub type_url: Option<String>,
    pub title: Option<String>,
    pub detail: Option<String>,
    pub instance: Option<String>,
    pub extensions: Option<Extensions>,
}

impl ProblemInput {
    pub fn new(status: i64) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = Some(type_url.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = Some(extensions);
        self
    }

    /// Add a single extension member, creating the extension map if needed.
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions
            .get_or_insert_with(Extensions::new)
            .insert(key.into(), value.into());
        self
    }
}

/// RFC 9457 Problem Details for HTTP APIs.
///
/// `status` is the semantic status reported in the body and is never altered;
/// the transport status is derived from it separately (see
/// [`clamp_http_status`](crate::render::clamp_http_status)).
///
/// Serializes as a single flat object: the standard members followed by the
/// extension members, with dangerous keys stripped and standard members
/// winning any name collision.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ProblemDetails {
    /// A URI reference that identifies the problem type.
    pub type_url: String,
    /// The status code for this occurrence of the problem.
    pub status: i64,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// A human-readable explanation specific to this occurrence of the problem.
    pub detail: Option<String>,
    /// A URI reference that identifies the specific occurrence of the problem.
    pub instance: Option<String>,
    /// Additional members, flattened at the top level on serialization.
    pub extensions: Option<Extensions>,
}

/// Fill in the defaults of a [`ProblemInput`].
///
/// `type_url` falls back to [`ABOUT_BLANK`]; `title` falls back to the status
/// phrase, then to [`UNKNOWN_ERROR_TITLE`]. Everything else passes through.
pub fn normalize(input: ProblemInput) -> ProblemDetails {
    let ProblemInput {
        status,
        type_url,
        title,
        detail,
        instance,
        extensions,
    } = input;

    ProblemDetails {
        type_url: type_url.unwrap_or_else(|| ABOUT_BLANK.to_owned()),
        status,
        title: title.unwrap_or_else(|| {
            phrase_for(status)
                .unwrap_or(UNKNOWN_ERROR_TITLE)
                .to_owned()
        }),
        detail,
        instance,
        extensions,
    }
}

impl ProblemDetails {
    /// Problem with only a status; type and title are defaulted.
    pub fn new(status: i64) -> Self {
        normalize(ProblemInput::new(status))
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions
            .get_or_insert_with(Extensions::new)
            .insert(key.into(), value.into());
        self
    }

    /// `detail` when present, otherwise `title`.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.detail.as_deref().unwrap_or(&self.title)
    }

    /// Wire view of this problem with extensions already sanitized.
    #[must_use]
    pub fn body(&self) -> ProblemBody<'_> {
        ProblemBody {
            problem: self,
            extensions: sanitize_extensions(self.extensions.as_ref()),
        }
    }
}

impl From<ProblemInput> for ProblemDetails {
    fn from(input: ProblemInput) -> Self {
        normalize(input)
    }
}

impl From<ProblemDetails> for ProblemInput {
    fn from(problem: ProblemDetails) -> Self {
        Self {
            status: problem.status,
            type_url: Some(problem.type_url),
            title: Some(problem.title),
            detail: problem.detail,
            instance: problem.instance,
            extensions: problem.extensions,
        }
    }
}

/// Flattened, sanitized wire form of a [`ProblemDetails`].
#[derive(Debug)]
pub struct ProblemBody<'a> {
    problem: &'a ProblemDetails,
    extensions: Option<Cow<'a, Extensions>>,
}

impl ProblemBody<'_> {
    fn extension_members(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.extensions
            .iter()
            .flat_map(|extensions| extensions.iter())
            .filter(|(key, _)| !STANDARD_MEMBERS.contains(&key.as_str()))
    }
}

impl Serialize for ProblemBody<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let problem = self.problem;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &problem.type_url)?;
        map.serialize_entry("status", &problem.status)?;
        map.serialize_entry("title", &problem.title)?;
        if let Some(detail) = &problem.detail {
            map.serialize_entry("detail", detail)?;
        }
        if let Some(instance) = &problem.instance {
            map.serialize_entry("instance", instance)?;
        }
        for (key, value) in self.extension_members() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for ProblemDetails {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.body().serialize(serializer)
    }
}

/// Flat wire shape accepted on deserialization; unknown members become extensions.
#[derive(Deserialize)]
struct ProblemWire {
    #[serde(rename = "type", default)]
    type_url: Option<String>,
    status: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    instance: Option<String>,
    #[serde(flatten)]
    extensions: Extensions,
}

impl<'de> Deserialize<'de> for ProblemDetails {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = ProblemWire::deserialize(deserializer)?;
        Ok(normalize(ProblemInput {
            status: wire.status,
            type_url: wire.type_url,
            title: wire.title,
            detail: wire.detail,
            instance: wire.instance,
            extensions: (!wire.extensions.is_empty()).then_some(wire.extensions),
        }))
    }
}
