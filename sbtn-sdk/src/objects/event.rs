//! CloudEvents-shaped envelope.
//!
//! The envelope is the only thing that crosses the push queue. Its payload is
//! kept as an opaque JSON value; listeners decode it into the shape they
//! expect for a given event type with [`Envelope::data_as`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// The only CloudEvents spec version accepted.
pub const SPEC_VERSION: &str = "1.0";

/// Content type of every payload produced by this crate.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Errors produced while building, validating or decoding an envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("invalid envelope: {}", .0.join("; "))]
    Invalid(Vec<String>),
    #[error("cannot encode payload: {0}")]
    Encode(serde_json::Error),
    #[error("cannot decode payload: {0}")]
    Decode(serde_json::Error),
    #[error("envelope carries no data")]
    MissingData,
}

impl EnvelopeError {
    /// Individual validation failures, empty for non-validation errors.
    pub fn violations(&self) -> &[String] {
        match self {
            EnvelopeError::Invalid(violations) => violations,
            _ => &[],
        }
    }
}

/// An immutable event record.
///
/// Every field defaults when absent so that a structurally incomplete event
/// still deserializes and is then rejected by [`Envelope::validate`] with a
/// precise list of violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub specversion: String,
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub id: String,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Envelope {
    /// Create a new envelope with a fresh id and the current UTC time.
    pub fn new<T: Serialize>(
        event_type: impl Into<String>,
        source: impl Into<String>,
        payload: &T,
    ) -> Result<Self, EnvelopeError> {
        let data = serde_json::to_value(payload).map_err(EnvelopeError::Encode)?;
        Ok(Self {
            specversion: SPEC_VERSION.to_string(),
            event_type: event_type.into(),
            source: source.into(),
            id: Uuid::new_v4().to_string(),
            time: Some(OffsetDateTime::now_utc()),
            datacontenttype: Some(JSON_CONTENT_TYPE.to_string()),
            data: Some(data),
        })
    }

    /// Check the envelope invariants.
    ///
    /// An envelope is valid iff `specversion` is [`SPEC_VERSION`], `id`,
    /// `type` and `source` are non-empty, and `time` is set.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        let mut violations = Vec::new();
        if self.specversion != SPEC_VERSION {
            violations.push(format!(
                "specversion: expected [{SPEC_VERSION}], got [{}]",
                self.specversion
            ));
        }
        if self.id.trim().is_empty() {
            violations.push("id: MUST be a non-empty string".to_string());
        }
        if self.event_type.trim().is_empty() {
            violations.push("type: MUST be a non-empty string".to_string());
        }
        if self.source.trim().is_empty() {
            violations.push("source: REQUIRED but MISSING".to_string());
        }
        if self.time.is_none() {
            violations.push("time: REQUIRED but MISSING".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(EnvelopeError::Invalid(violations))
        }
    }

    /// Decode the payload into the shape expected for this event type.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, EnvelopeError> {
        let data = self.data.as_ref().ok_or(EnvelopeError::MissingData)?;
        T::deserialize(data).map_err(EnvelopeError::Decode)
    }
}
