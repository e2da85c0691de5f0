//! # Reply Envelope
//!
//! Every RPC reply travels as a `ResponseEnvelope<T>`: the method's result
//! plus an `ErrorEnvelope` carrying at most one of a structured application
//! error or a plain error string. Wire field names are `Result`,
//! `ApplicationError`, and `Error`.

use crate::errors::{ApplicationError, PlatformError};
use serde::{Deserialize, Serialize};

/// Error half of a reply. At most one field is set; an empty envelope means
/// the call succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ErrorEnvelope {
    /// Structured business error, reconstructed losslessly on the caller.
    #[serde(
        rename = "ApplicationError",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub application_error: Option<ApplicationError>,

    /// Stringified form of any other agent-side error.
    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorEnvelope {
    /// Classify an error for the wire: structured application errors keep
    /// their shape, everything else is stringified.
    pub fn from_error(err: &PlatformError) -> Self {
        match err {
            PlatformError::Application(app) => Self {
                application_error: Some(app.clone()),
                error: None,
            },
            other => Self {
                application_error: None,
                error: Some(other.to_string()),
            },
        }
    }

    /// Reconstruct the caller-side error, preferring the structured form
    /// when both fields arrive set.
    pub fn into_error(self) -> Option<PlatformError> {
        if let Some(app) = self.application_error {
            return Some(PlatformError::Application(app));
        }
        self.error.map(PlatformError::Remote)
    }

    /// True when the envelope reports success.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.application_error.is_none() && self.error.is_none()
    }
}

/// A complete reply: a result or an error, never meaningfully both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ResponseEnvelope<T> {
    #[serde(rename = "Result", default, skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,

    #[serde(flatten)]
    pub errors: ErrorEnvelope,
}

impl<T> ResponseEnvelope<T> {
    /// Successful reply carrying a payload.
    pub fn ok(result: T) -> Self {
        Self {
            result: Some(result),
            errors: ErrorEnvelope::default(),
        }
    }

    /// Failed reply; the payload field is left empty.
    pub fn err(err: &PlatformError) -> Self {
        Self {
            result: None,
            errors: ErrorEnvelope::from_error(err),
        }
    }

    /// Collapse to the caller-facing result. Errors win over payloads; a
    /// reply carrying neither is malformed and reported as unavailability.
    pub fn into_result(self) -> Result<T, PlatformError> {
        if let Some(err) = self.errors.into_error() {
            return Err(err);
        }
        self.result
            .ok_or_else(|| PlatformError::unavailable("reply carried no result"))
    }
}

impl ResponseEnvelope<()> {
    /// Successful reply for methods whose success carries no payload.
    #[must_use]
    pub fn ack() -> Self {
        Self {
            result: None,
            errors: ErrorEnvelope::default(),
        }
    }

    /// Collapse a payload-free reply: the error if present, otherwise `Ok`.
    pub fn into_ack(self) -> Result<(), PlatformError> {
        match self.errors.into_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
