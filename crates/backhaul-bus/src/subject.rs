//! # Subject Scheme
//!
//! Maps (instance, method) to transport topics and back. The full topic is
//! the instance id followed by a fixed per-method suffix, e.g.
//! `acme-prod.Platform.Ping`; the agent subscribes to the whole namespace
//! with `acme-prod.Platform.>`.

use backhaul_types::InstanceId;

/// Every message kind carried on an instance's namespace: the kick signal
/// plus the twelve RPC methods.
///
/// `ALL` fixes the dispatch order; no suffix in the table is a string-suffix
/// of another, so recovery by suffix match is unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Kick,
    Ping,
    Version,
    Export,
    ListServices,
    ListServicesWithOptions,
    ListImages,
    ListImagesWithOptions,
    UpdateManifests,
    JobStatus,
    SyncStatus,
    GitRepoConfig,
    NotifyChange,
}

impl Method {
    /// Every method, in the stable dispatch order.
    pub const ALL: [Method; 13] = [
        Method::Kick,
        Method::Ping,
        Method::Version,
        Method::Export,
        Method::ListServices,
        Method::ListServicesWithOptions,
        Method::ListImages,
        Method::ListImagesWithOptions,
        Method::UpdateManifests,
        Method::JobStatus,
        Method::SyncStatus,
        Method::GitRepoConfig,
        Method::NotifyChange,
    ];

    /// The wire method name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Method::Kick => "Kick",
            Method::Ping => "Ping",
            Method::Version => "Version",
            Method::Export => "Export",
            Method::ListServices => "ListServices",
            Method::ListServicesWithOptions => "ListServicesWithOptions",
            Method::ListImages => "ListImages",
            Method::ListImagesWithOptions => "ListImagesWithOptions",
            Method::UpdateManifests => "UpdateManifests",
            Method::JobStatus => "JobStatus",
            Method::SyncStatus => "SyncStatus",
            Method::GitRepoConfig => "GitRepoConfig",
            Method::NotifyChange => "NotifyChange",
        }
    }

    /// Topic suffix appended to an instance id.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Method::Kick => ".Platform.Kick",
            Method::Ping => ".Platform.Ping",
            Method::Version => ".Platform.Version",
            Method::Export => ".Platform.Export",
            Method::ListServices => ".Platform.ListServices",
            Method::ListServicesWithOptions => ".Platform.ListServicesWithOptions",
            Method::ListImages => ".Platform.ListImages",
            Method::ListImagesWithOptions => ".Platform.ListImagesWithOptions",
            Method::UpdateManifests => ".Platform.UpdateManifests",
            Method::JobStatus => ".Platform.JobStatus",
            Method::SyncStatus => ".Platform.SyncStatus",
            Method::GitRepoConfig => ".Platform.GitRepoConfig",
            Method::NotifyChange => ".Platform.NotifyChange",
        }
    }

    /// Full topic for one instance.
    #[must_use]
    pub fn topic(self, id: &InstanceId) -> String {
        format!("{id}{}", self.suffix())
    }

    /// Recover the method from a topic produced by `topic`; `None` for
    /// anything outside the table.
    #[must_use]
    pub fn from_topic(topic: &str) -> Option<Method> {
        Method::ALL
            .iter()
            .copied()
            .find(|method| topic.ends_with(method.suffix()))
    }
}

/// Wildcard pattern covering an instance's whole RPC namespace.
#[must_use]
pub fn wildcard(id: &InstanceId) -> String {
    format!("{id}.Platform.>")
}
