//! # Logging Middleware
//!
//! Wraps any `Platform` and logs each failed call with the method name
//! before propagating the error unchanged. Agents wire this around their
//! local implementation so business failures show up in their own logs
//! without the control plane's help.

use crate::subject::Method;
use async_trait::async_trait;
use backhaul_types::{
    Change, ExportData, GitRepoConfig, ImageStatus, JobId, JobStatus, ListImagesOptions,
    ListServicesOptions, Platform, PlatformError, ResourceSpec, ServiceStatus, UpdateSpec,
};
use tracing::{error, warn};

/// `Platform` decorator that logs failures.
pub struct LoggedPlatform<P> {
    inner: P,
}

impl<P> LoggedPlatform<P> {
    /// Wrap a platform implementation.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    /// Give the wrapped implementation back.
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: Platform> LoggedPlatform<P> {
    fn observe<T>(
        &self,
        method: Method,
        result: Result<T, PlatformError>,
    ) -> Result<T, PlatformError> {
        if let Err(err) = &result {
            if err.is_fatal() {
                error!(method = method.name(), error = %err, "platform call failed fatally");
            } else {
                warn!(method = method.name(), error = %err, "platform call failed");
            }
        }
        result
    }
}

#[async_trait]
impl<P: Platform> Platform for LoggedPlatform<P> {
    async fn ping(&self) -> Result<(), PlatformError> {
        self.observe(Method::Ping, self.inner.ping().await)
    }

    async fn version(&self) -> Result<String, PlatformError> {
        self.observe(Method::Version, self.inner.version().await)
    }

    async fn export(&self) -> Result<ExportData, PlatformError> {
        self.observe(Method::Export, self.inner.export().await)
    }

    async fn list_services(
        &self,
        namespace: String,
    ) -> Result<Vec<ServiceStatus>, PlatformError> {
        self.observe(
            Method::ListServices,
            self.inner.list_services(namespace).await,
        )
    }

    async fn list_services_with_options(
        &self,
        opts: ListServicesOptions,
    ) -> Result<Vec<ServiceStatus>, PlatformError> {
        self.observe(
            Method::ListServicesWithOptions,
            self.inner.list_services_with_options(opts).await,
        )
    }

    async fn list_images(&self, spec: ResourceSpec) -> Result<Vec<ImageStatus>, PlatformError> {
        self.observe(Method::ListImages, self.inner.list_images(spec).await)
    }

    async fn list_images_with_options(
        &self,
        opts: ListImagesOptions,
    ) -> Result<Vec<ImageStatus>, PlatformError> {
        self.observe(
            Method::ListImagesWithOptions,
            self.inner.list_images_with_options(opts).await,
        )
    }

    async fn update_manifests(&self, spec: UpdateSpec) -> Result<JobId, PlatformError> {
        self.observe(
            Method::UpdateManifests,
            self.inner.update_manifests(spec).await,
        )
    }

    async fn job_status(&self, id: JobId) -> Result<JobStatus, PlatformError> {
        self.observe(Method::JobStatus, self.inner.job_status(id).await)
    }

    async fn sync_status(&self, revision: String) -> Result<Vec<String>, PlatformError> {
        self.observe(Method::SyncStatus, self.inner.sync_status(revision).await)
    }

    async fn git_repo_config(&self, regenerate: bool) -> Result<GitRepoConfig, PlatformError> {
        self.observe(
            Method::GitRepoConfig,
            self.inner.git_repo_config(regenerate).await,
        )
    }

    async fn notify_change(&self, change: Change) -> Result<(), PlatformError> {
        self.observe(Method::NotifyChange, self.inner.notify_change(change).await)
    }
}
