//! # Error Taxonomy
//!
//! Three kinds of failure cross the bus, and they must stay distinguishable
//! end to end:
//!
//! - **Unavailable**: the transport could not complete the call (no reply,
//!   publish failure, undecodable envelope). Recoverable; retry belongs to
//!   the caller.
//! - **Application**: a structured business error the agent returned on
//!   purpose. Propagated transparently; never affects subscription lifetime.
//! - **Fatal**: a connection-ending condition (kick supersession, or the
//!   agent reporting corrupted connection state). Ends the subscription.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured business-level errors an agent returns intentionally.
///
/// These travel inside the reply envelope's `ApplicationError` field and are
/// reconstructed on the caller's side without loss, so both sides must agree
/// on this enum. The `Type` tag keeps the wire form self-describing.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "Type")]
pub enum ApplicationError {
    /// A named resource does not exist on the agent.
    #[error("resource not found: {resource}")]
    #[serde(rename_all = "PascalCase")]
    NotFound { resource: String },

    /// The caller supplied a malformed or unsupported spec.
    #[error("invalid spec: {reason}")]
    #[serde(rename_all = "PascalCase")]
    InvalidSpec { reason: String },

    /// A dependency of the agent failed while servicing the call.
    #[error("{message}")]
    #[serde(rename_all = "PascalCase")]
    Upstream { code: String, message: String },
}

/// The caller-facing result taxonomy for every `Platform` method.
///
/// `Remote` and `Fatal` display the bare message so an agent's error text
/// survives the bus hop byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// Structured business error returned intentionally by the agent.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// The agent answered the call with an unstructured error string.
    #[error("{0}")]
    Remote(String),

    /// Transport-level failure: the agent is unreachable, slow past the
    /// deadline, or its reply could not be decoded. Recoverable.
    #[error("platform unavailable: {0}")]
    Unavailable(String),

    /// Connection-ending condition signalled by the platform implementation
    /// itself. An agent returning this both answers the call and tears its
    /// subscription down.
    #[error("{0}")]
    Fatal(String),
}

impl PlatformError {
    /// Tag an error message as fatal.
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// Tag an error message as a transport-level unavailability.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// True when this error ends the reporting subscription.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// True when this error came from the transport rather than the agent.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
