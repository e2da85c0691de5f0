//! # Platform Capability
//!
//! The fixed RPC surface every tenant agent implements. The control plane
//! sees the same trait through a remote stub, so code upstream of the bus is
//! generic over local and remote platforms.

use crate::entities::{
    Change, ExportData, GitRepoConfig, ImageStatus, JobId, JobStatus, ListImagesOptions,
    ListServicesOptions, ResourceSpec, ServiceStatus, UpdateSpec,
};
use crate::errors::PlatformError;
use async_trait::async_trait;

/// The RPC methods a tenant agent answers.
///
/// Any method may return `PlatformError::Fatal` to signal that the agent's
/// connection state is corrupted; the bus then both answers the in-flight
/// call and tears the agent's subscription down.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Liveness check. `Ok` means the agent is subscribed and answering.
    async fn ping(&self) -> Result<(), PlatformError>;

    /// The agent's build version string.
    async fn version(&self) -> Result<String, PlatformError>;

    /// Render the tenant's full cluster config.
    async fn export(&self) -> Result<ExportData, PlatformError>;

    /// Workloads in one namespace; empty namespace means all.
    async fn list_services(&self, namespace: String)
        -> Result<Vec<ServiceStatus>, PlatformError>;

    /// Workload listing with an explicit filter.
    async fn list_services_with_options(
        &self,
        opts: ListServicesOptions,
    ) -> Result<Vec<ServiceStatus>, PlatformError>;

    /// Current and available images for the selected workloads.
    async fn list_images(&self, spec: ResourceSpec) -> Result<Vec<ImageStatus>, PlatformError>;

    /// Image listing with field-level overrides.
    async fn list_images_with_options(
        &self,
        opts: ListImagesOptions,
    ) -> Result<Vec<ImageStatus>, PlatformError>;

    /// Queue a manifest mutation on the agent and return its job id.
    ///
    /// Applying can take minutes; callers poll `job_status` with the
    /// returned id rather than waiting here.
    async fn update_manifests(&self, spec: UpdateSpec) -> Result<JobId, PlatformError>;

    /// Progress of a previously queued job.
    async fn job_status(&self, id: JobId) -> Result<JobStatus, PlatformError>;

    /// Revisions applied since `revision`; pass the empty string for the
    /// full applied history the agent still remembers.
    async fn sync_status(&self, revision: String) -> Result<Vec<String>, PlatformError>;

    /// The agent's git remote configuration and deploy key. `regenerate`
    /// forces a fresh key pair.
    async fn git_repo_config(&self, regenerate: bool) -> Result<GitRepoConfig, PlatformError>;

    /// Tell the agent something upstream changed (repo moved, new image).
    async fn notify_change(&self, change: Change) -> Result<(), PlatformError>;
}
