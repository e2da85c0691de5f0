//! Centralized Testing Utilities
//!
//! This module collects the `Platform` test doubles used across the
//! workspace's test suites. It is available with the `test-utils` feature
//! flag.

use crate::entities::{
    Change, ExportData, GitRemoteConfig, GitRepoConfig, GitRepoStatus, ImageStatus, JobId,
    JobState, JobStatus, ListImagesOptions, ListServicesOptions, ResourceSpec, ServiceStatus,
    UpdateSpec,
};
use crate::errors::PlatformError;
use crate::platform::Platform;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// A `Platform` double with canned responses, per-method failure injection,
/// and invocation counters.
///
/// Method keys are the wire method names (`"Ping"`, `"ListServices"`, ...).
///
/// # Example
///
/// ```rust
/// use backhaul_types::testing::MockPlatform;
/// use backhaul_types::PlatformError;
///
/// let platform = MockPlatform::new().failing("Ping", PlatformError::fatal("ping problem"));
/// assert_eq!(platform.calls("Ping"), 0);
/// ```
#[derive(Default)]
pub struct MockPlatform {
    version: String,
    services: Vec<ServiceStatus>,
    images: Vec<ImageStatus>,
    export: ExportData,
    revisions: Vec<String>,
    repo_config: Option<GitRepoConfig>,
    job_status: Option<JobStatus>,
    update_delay: Option<Duration>,
    failures: Mutex<HashMap<&'static str, PlatformError>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    changes: Mutex<Vec<Change>>,
}

impl MockPlatform {
    /// A mock that answers every method successfully with empty data.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: "0.0.0-mock".to_string(),
            ..Self::default()
        }
    }

    /// Set the version string returned by `Version`.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the workload list returned by the `ListServices` methods.
    #[must_use]
    pub fn with_services(mut self, services: Vec<ServiceStatus>) -> Self {
        self.services = services;
        self
    }

    /// Set the image report returned by the `ListImages` methods.
    #[must_use]
    pub fn with_images(mut self, images: Vec<ImageStatus>) -> Self {
        self.images = images;
        self
    }

    /// Set the config blob returned by `Export`.
    #[must_use]
    pub fn with_export(mut self, export: ExportData) -> Self {
        self.export = export;
        self
    }

    /// Set the revision list returned by `SyncStatus`.
    #[must_use]
    pub fn with_revisions(mut self, revisions: Vec<String>) -> Self {
        self.revisions = revisions;
        self
    }

    /// Set the job report returned by `JobStatus`.
    #[must_use]
    pub fn with_job_status(mut self, status: JobStatus) -> Self {
        self.job_status = Some(status);
        self
    }

    /// Set the repository config returned by `GitRepoConfig`.
    #[must_use]
    pub fn with_repo_config(mut self, config: GitRepoConfig) -> Self {
        self.repo_config = Some(config);
        self
    }

    /// Make `UpdateManifests` sleep before answering, to simulate a slow
    /// apply.
    #[must_use]
    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = Some(delay);
        self
    }

    /// Make one method fail with the given error on every call.
    #[must_use]
    pub fn failing(self, method: &'static str, err: PlatformError) -> Self {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(method, err);
        }
        self
    }

    /// How many times a method has been invoked.
    #[must_use]
    pub fn calls(&self, method: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(method).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Changes delivered through `NotifyChange`, in arrival order.
    #[must_use]
    pub fn changes(&self) -> Vec<Change> {
        self.changes
            .lock()
            .map(|changes| changes.clone())
            .unwrap_or_default()
    }

    fn begin(&self, method: &'static str) -> Result<(), PlatformError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(method).or_insert(0) += 1;
        }
        match self.failures.lock() {
            Ok(failures) => match failures.get(method) {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            },
            Err(_) => Ok(()),
        }
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn ping(&self) -> Result<(), PlatformError> {
        self.begin("Ping")
    }

    async fn version(&self) -> Result<String, PlatformError> {
        self.begin("Version")?;
        Ok(self.version.clone())
    }

    async fn export(&self) -> Result<ExportData, PlatformError> {
        self.begin("Export")?;
        Ok(self.export.clone())
    }

    async fn list_services(
        &self,
        _namespace: String,
    ) -> Result<Vec<ServiceStatus>, PlatformError> {
        self.begin("ListServices")?;
        Ok(self.services.clone())
    }

    async fn list_services_with_options(
        &self,
        _opts: ListServicesOptions,
    ) -> Result<Vec<ServiceStatus>, PlatformError> {
        self.begin("ListServicesWithOptions")?;
        Ok(self.services.clone())
    }

    async fn list_images(&self, _spec: ResourceSpec) -> Result<Vec<ImageStatus>, PlatformError> {
        self.begin("ListImages")?;
        Ok(self.images.clone())
    }

    async fn list_images_with_options(
        &self,
        _opts: ListImagesOptions,
    ) -> Result<Vec<ImageStatus>, PlatformError> {
        self.begin("ListImagesWithOptions")?;
        Ok(self.images.clone())
    }

    async fn update_manifests(&self, _spec: UpdateSpec) -> Result<JobId, PlatformError> {
        if let Some(delay) = self.update_delay {
            tokio::time::sleep(delay).await;
        }
        self.begin("UpdateManifests")?;
        Ok(JobId::new())
    }

    async fn job_status(&self, _id: JobId) -> Result<JobStatus, PlatformError> {
        self.begin("JobStatus")?;
        Ok(self.job_status.clone().unwrap_or(JobStatus {
            state: JobState::Succeeded,
            error: None,
            applied: Vec::new(),
        }))
    }

    async fn sync_status(&self, _revision: String) -> Result<Vec<String>, PlatformError> {
        self.begin("SyncStatus")?;
        Ok(self.revisions.clone())
    }

    async fn git_repo_config(&self, _regenerate: bool) -> Result<GitRepoConfig, PlatformError> {
        self.begin("GitRepoConfig")?;
        Ok(self.repo_config.clone().unwrap_or(GitRepoConfig {
            remote: GitRemoteConfig {
                url: "git@example.com:acme/config".to_string(),
                branch: "main".to_string(),
                path: "deploy".to_string(),
            },
            public_ssh_key: "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5 mock".to_string(),
            status: GitRepoStatus::Ready,
        }))
    }

    async fn notify_change(&self, change: Change) -> Result<(), PlatformError> {
        self.begin("NotifyChange")?;
        if let Ok(mut changes) = self.changes.lock() {
            changes.push(change);
        }
        Ok(())
    }
}
