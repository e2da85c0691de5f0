//! # Connecter
//!
//! Client-side stub factory. `connect` is pure construction: the returned
//! stub carries the instance's topic prefix and a transport handle, and
//! every method on it is one request/reply exchange. All failure is
//! deferred to the calls themselves.

use crate::codec;
use crate::config::BusConfig;
use crate::subject::Method;
use crate::transport::Transport;
use async_trait::async_trait;
use backhaul_types::{
    Change, ExportData, GitRepoConfig, ImageStatus, InstanceId, JobId, JobStatus,
    ListImagesOptions, ListServicesOptions, Platform, PlatformError, ResourceSpec,
    ResponseEnvelope, ServiceStatus, UpdateSpec,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Builds remote `Platform` stubs for tenant instances.
#[derive(Clone)]
pub struct Connecter {
    transport: Arc<dyn Transport>,
    config: BusConfig,
}

impl Connecter {
    /// A connecter publishing through `transport` with `config`'s timeouts.
    pub fn new(transport: Arc<dyn Transport>, config: BusConfig) -> Self {
        Self { transport, config }
    }

    /// The stub for one instance. Never touches the network.
    #[must_use]
    pub fn connect(&self, id: InstanceId) -> PlatformStub {
        PlatformStub {
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
            id,
        }
    }

    pub(crate) fn config(&self) -> &BusConfig {
        &self.config
    }
}

/// Remote `Platform` implementation for one instance.
///
/// Stateless; clone or discard freely. A call fails `Unavailable` when the
/// agent is unreachable or slow past the configured timeout, with no
/// distinction between the two.
#[derive(Clone)]
pub struct PlatformStub {
    transport: Arc<dyn Transport>,
    config: BusConfig,
    id: InstanceId,
}

fn decode_reply<T: DeserializeOwned>(bytes: &[u8]) -> Result<ResponseEnvelope<T>, PlatformError> {
    codec::decode(bytes).map_err(|err| PlatformError::unavailable(format!("undecodable reply: {err}")))
}

impl PlatformStub {
    /// The instance this stub calls.
    #[must_use]
    pub fn instance(&self) -> &InstanceId {
        &self.id
    }

    async fn exchange(&self, method: Method, payload: Vec<u8>) -> Result<Vec<u8>, PlatformError> {
        let topic = method.topic(&self.id);
        debug!(topic = %topic, "bus call");
        self.transport
            .request(&topic, payload, self.config.call_timeout)
            .await
            .map_err(|err| PlatformError::unavailable(err.to_string()))
    }

    async fn call<Req, Resp>(&self, method: Method, req: &Req) -> Result<Resp, PlatformError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let payload = codec::encode(req)
            .map_err(|err| PlatformError::unavailable(format!("unencodable request: {err}")))?;
        let reply = self.exchange(method, payload).await?;
        decode_reply::<Resp>(&reply)?.into_result()
    }

    async fn call_no_args<Resp: DeserializeOwned>(
        &self,
        method: Method,
    ) -> Result<Resp, PlatformError> {
        let reply = self.exchange(method, Vec::new()).await?;
        decode_reply::<Resp>(&reply)?.into_result()
    }
}

#[async_trait]
impl Platform for PlatformStub {
    async fn ping(&self) -> Result<(), PlatformError> {
        let reply = self.exchange(Method::Ping, Vec::new()).await?;
        decode_reply::<()>(&reply)?.into_ack()
    }

    async fn version(&self) -> Result<String, PlatformError> {
        self.call_no_args(Method::Version).await
    }

    async fn export(&self) -> Result<ExportData, PlatformError> {
        self.call_no_args(Method::Export).await
    }

    async fn list_services(
        &self,
        namespace: String,
    ) -> Result<Vec<ServiceStatus>, PlatformError> {
        self.call(Method::ListServices, &namespace).await
    }

    async fn list_services_with_options(
        &self,
        opts: ListServicesOptions,
    ) -> Result<Vec<ServiceStatus>, PlatformError> {
        self.call(Method::ListServicesWithOptions, &opts).await
    }

    async fn list_images(&self, spec: ResourceSpec) -> Result<Vec<ImageStatus>, PlatformError> {
        self.call(Method::ListImages, &spec).await
    }

    async fn list_images_with_options(
        &self,
        opts: ListImagesOptions,
    ) -> Result<Vec<ImageStatus>, PlatformError> {
        self.call(Method::ListImagesWithOptions, &opts).await
    }

    async fn update_manifests(&self, spec: UpdateSpec) -> Result<JobId, PlatformError> {
        self.call(Method::UpdateManifests, &spec).await
    }

    async fn job_status(&self, id: JobId) -> Result<JobStatus, PlatformError> {
        self.call(Method::JobStatus, &id).await
    }

    async fn sync_status(&self, revision: String) -> Result<Vec<String>, PlatformError> {
        self.call(Method::SyncStatus, &revision).await
    }

    async fn git_repo_config(&self, regenerate: bool) -> Result<GitRepoConfig, PlatformError> {
        self.call(Method::GitRepoConfig, &regenerate).await
    }

    async fn notify_change(&self, change: Change) -> Result<(), PlatformError> {
        let payload = codec::encode(&change)
            .map_err(|err| PlatformError::unavailable(format!("unencodable request: {err}")))?;
        let reply = self.exchange(Method::NotifyChange, payload).await?;
        decode_reply::<()>(&reply)?.into_ack()
    }
}
