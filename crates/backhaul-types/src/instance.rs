//! # Instance Identifiers
//!
//! A tenant is identified by an opaque `InstanceId`. The bus uses the id
//! verbatim as the topic prefix for that tenant's RPC namespace, so the only
//! structural requirement is that it forms a valid topic-path segment.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for one tenant instance.
///
/// No internal structure is assumed. The control plane allocates these;
/// the bus only concatenates them into topic names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    /// Wrap a raw identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier, as used in topic names.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for InstanceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
