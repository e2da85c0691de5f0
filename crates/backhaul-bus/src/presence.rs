//! # Presence
//!
//! Subscription registration and the kick broadcast are asynchronous with
//! respect to the caller, so "the agent is now definitely receiving calls"
//! needs its own primitive. `ping` is the one-shot probe; `await_presence`
//! polls it until the agent answers or the budget runs out.

use crate::connect::Connecter;
use backhaul_types::{InstanceId, Platform, PlatformError};
use std::time::Duration;
use tracing::debug;

impl Connecter {
    /// One-shot liveness probe for an instance.
    pub async fn ping(&self, id: &InstanceId) -> Result<(), PlatformError> {
        self.connect(id.clone()).ping().await
    }

    /// Poll `ping` on the configured interval until the agent answers or
    /// `timeout` elapses. The timeout also cuts short a ping still in
    /// flight, so the call returns within `timeout` regardless of how slow
    /// the transport is.
    pub async fn await_presence(
        &self,
        id: &InstanceId,
        timeout: Duration,
    ) -> Result<(), PlatformError> {
        let stub = self.connect(id.clone());
        let interval = self.config().presence_poll;
        let probe = async {
            loop {
                match stub.ping().await {
                    Ok(()) => return,
                    Err(err) => debug!(instance = %id, error = %err, "presence poll failed"),
                }
                tokio::time::sleep(interval).await;
            }
        };
        match tokio::time::timeout(timeout, probe).await {
            Ok(()) => Ok(()),
            Err(_) => Err(PlatformError::unavailable(format!(
                "no presence for {id} within {timeout:?}"
            ))),
        }
    }
}
