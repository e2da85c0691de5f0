//! # Core Domain Entities
//!
//! Defines the wire-visible payload types the `Platform` methods exchange.
//!
//! ## Clusters
//!
//! - **Workloads**: `ResourceId`, `ResourceSpec`, `Container`, `ServiceStatus`
//! - **Images**: `ImageInfo`, `ContainerImages`, `ImageStatus`
//! - **Updates & Jobs**: `UpdateSpec`, `UpdateChange`, `Cause`, `JobId`,
//!   `JobState`, `JobStatus`
//! - **Git & Sync**: `GitRemoteConfig`, `GitRepoConfig`, `GitRepoStatus`
//! - **Notifications**: `Change`
//!
//! Field names are pinned to the wire format with serde attributes; every
//! type derives `PartialEq` so envelope round-trips can be deep-compared.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// CLUSTER A: WORKLOADS
// =============================================================================

/// Identifier of one workload in a tenant cluster, in the canonical
/// `namespace:kind/name` string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Build an id from its three components.
    pub fn new(namespace: &str, kind: &str, name: &str) -> Self {
        Self(format!("{namespace}:{kind}/{name}"))
    }

    /// The canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split back into `(namespace, kind, name)` when the canonical form
    /// holds; `None` for ids minted outside this scheme.
    #[must_use]
    pub fn parts(&self) -> Option<(&str, &str, &str)> {
        let (namespace, rest) = self.0.split_once(':')?;
        let (kind, name) = rest.split_once('/')?;
        Some((namespace, kind, name))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Selects workloads for an image listing or release: either everything,
/// or one workload by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceSpec(String);

impl ResourceSpec {
    const ALL: &'static str = "<all>";

    /// The spec matching every workload.
    #[must_use]
    pub fn all() -> Self {
        Self(Self::ALL.to_owned())
    }

    /// True when this spec matches every workload.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.0 == Self::ALL
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<ResourceId> for ResourceSpec {
    fn from(id: ResourceId) -> Self {
        Self(id.0)
    }
}

/// One container inside a workload and the image it currently runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Container {
    pub name: String,
    pub image: String,
}

/// Reported state of one workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceStatus {
    #[serde(rename = "ID")]
    pub id: ResourceId,
    pub containers: Vec<Container>,
    /// Free-form status text from the cluster (e.g. "deployed", "error").
    pub status: String,
    /// Whether automated releases are switched on for this workload.
    pub automated: bool,
}

/// Namespace filter plus an optional explicit workload list; an empty list
/// means "all workloads in the namespace".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct ListServicesOptions {
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ResourceId>,
}

// =============================================================================
// CLUSTER B: IMAGES
// =============================================================================

/// One known image and when it was built, if the registry said.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageInfo {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Current and available images for one container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerImages {
    pub name: String,
    pub current: ImageInfo,
    #[serde(default)]
    pub available: Vec<ImageInfo>,
}

/// Image availability report for one workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageStatus {
    #[serde(rename = "ID")]
    pub id: ResourceId,
    pub containers: Vec<ContainerImages>,
}

/// Workload selector plus field-level overrides for an image listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListImagesOptions {
    pub spec: ResourceSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub override_container_fields: Vec<String>,
}

// =============================================================================
// CLUSTER C: UPDATES & JOBS
// =============================================================================

/// Who asked for an update, and why. Travels with every manifest change for
/// audit trails on the agent side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct Cause {
    pub message: String,
    pub user: String,
}

/// Whether a release is a dry run or applies for real.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseKind {
    Plan,
    Execute,
}

/// The mutation kinds `UpdateManifests` accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Type")]
pub enum UpdateChange {
    /// Move selected workloads to a new image.
    #[serde(rename_all = "PascalCase")]
    ReleaseImage {
        service_specs: Vec<ResourceSpec>,
        image_spec: String,
        kind: ReleaseKind,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        excludes: Vec<ResourceId>,
    },

    /// Toggle automated releases for one workload.
    #[serde(rename_all = "PascalCase")]
    Policy {
        #[serde(rename = "ServiceID")]
        service_id: ResourceId,
        automated: bool,
    },

    /// Rewrite the container list of one workload.
    #[serde(rename_all = "PascalCase")]
    Containers {
        #[serde(rename = "ServiceID")]
        service_id: ResourceId,
        containers: Vec<Container>,
    },
}

/// One requested manifest mutation with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateSpec {
    pub cause: Cause,
    #[serde(flatten)]
    pub change: UpdateChange,
}

/// Identifier of a queued update job on the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Mint a fresh job id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

/// Progress report for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobStatus {
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Workloads the job touched, filled in as it progresses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied: Vec<ResourceId>,
}

// =============================================================================
// CLUSTER D: GIT & SYNC
// =============================================================================

/// Where a tenant's config repository lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GitRemoteConfig {
    #[serde(rename = "URL")]
    pub url: String,
    pub branch: String,
    pub path: String,
}

/// How far the agent has gotten with the config repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitRepoStatus {
    Unknown,
    New,
    Cloning,
    Ready,
}

/// The agent's git configuration, including the deploy key it minted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GitRepoConfig {
    pub remote: GitRemoteConfig,
    #[serde(rename = "PublicSSHKey")]
    pub public_ssh_key: String,
    pub status: GitRepoStatus,
}

// =============================================================================
// CLUSTER E: NOTIFICATIONS & EXPORT
// =============================================================================

/// An upstream change the agent should react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Kind")]
pub enum Change {
    /// The config repository moved.
    #[serde(rename = "git", rename_all = "PascalCase")]
    Git {
        #[serde(rename = "URL")]
        url: String,
        branch: String,
    },

    /// A new image appeared in a registry.
    #[serde(rename = "image", rename_all = "PascalCase")]
    Image { image: String },
}

/// Rendered cluster config, as text, for the Export call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ExportData(pub String);
