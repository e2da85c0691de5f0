//! # Subscriber
//!
//! Agent-side registrar: binds one instance id to a local `Platform`
//! implementation and answers that instance's RPC topics until told to
//! stop.
//!
//! ## Ownership
//!
//! Ownership of an instance's namespace is a logical token, not a lock.
//! Every new subscription broadcasts a fresh token on the instance's Kick
//! topic; a subscription seeing a foreign token has been superseded and
//! tears itself down. Two subscriptions may answer concurrently for up to
//! one request/reply round trip; the protocol converges on exactly one
//! winner.
//!
//! ## Lifecycle
//!
//! A subscription ends exactly once, through whichever comes first: a
//! foreign kick, a fatal error from the local platform, the caller's
//! shutdown signal, loss of the transport stream, or the forced-reconnect
//! deadline. The terminal outcome is delivered exactly once on the `done`
//! channel; `Ok(())` is the forced reconnect and callers resubscribe on it.

use crate::codec;
use crate::config::BusConfig;
use crate::subject::{self, Method};
use crate::transport::{Subscription, Transport, TransportError, TransportMessage};
use backhaul_types::{
    GitRepoConfig, ImageStatus, InstanceId, JobId, JobStatus, Platform, PlatformError,
    ResponseEnvelope, ServiceStatus,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Reply sent when even the error envelope failed to encode.
const ENCODE_FAILURE_REPLY: &[u8] = br#"{"Error":"reply encoding failed"}"#;

/// Why a subscription ended, when it did not end by forced reconnect.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// A newer subscription for the same instance took ownership.
    #[error("kicked by new subscriber {token}")]
    Kicked { token: String },

    /// The caller's shutdown signal fired or was dropped.
    #[error("subscription cancelled")]
    Cancelled,

    /// The local platform reported a connection-ending failure.
    #[error("{0}")]
    Fatal(String),

    /// The transport dropped the subscription's message stream.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Agent-side registrar for tenant instances.
#[derive(Clone)]
pub struct Subscriber {
    transport: Arc<dyn Transport>,
    config: BusConfig,
}

impl Subscriber {
    /// A subscriber answering through `transport` with `config`'s timing.
    pub fn new(transport: Arc<dyn Transport>, config: BusConfig) -> Self {
        Self { transport, config }
    }

    /// Register `platform` as the responder for `id`'s RPC namespace.
    ///
    /// Returns once the wildcard subscription and the kick broadcast are in
    /// place; dispatch runs in its own task from then on. The single
    /// terminal outcome arrives on `done`. Send `true` on (or drop) the
    /// `shutdown` channel to tear the subscription down early.
    pub async fn subscribe(
        &self,
        shutdown: watch::Receiver<bool>,
        id: InstanceId,
        platform: Arc<dyn Platform>,
        done: oneshot::Sender<Result<(), SubscriptionError>>,
    ) -> Result<(), TransportError> {
        let sub = self.transport.subscribe(&subject::wildcard(&id)).await?;

        // Announce ownership before any request can arrive; an older
        // subscription for this instance sees the foreign token and exits.
        let token = Uuid::new_v4().to_string();
        self.transport
            .publish(&Method::Kick.topic(&id), token.clone().into_bytes())
            .await?;
        info!(instance = %id, "subscribed");

        let (fatal_tx, fatal_rx) = mpsc::channel(1);
        let shared = Arc::new(DispatchShared {
            transport: Arc::clone(&self.transport),
            platform,
            instance: id,
            token,
            terminated: AtomicBool::new(false),
            fatal_tx,
        });
        tokio::spawn(run_dispatch(
            shared,
            sub,
            shutdown,
            self.config.max_age,
            fatal_rx,
            done,
        ));
        Ok(())
    }
}

/// State shared between the dispatch loop and its per-request workers.
struct DispatchShared {
    transport: Arc<dyn Transport>,
    platform: Arc<dyn Platform>,
    instance: InstanceId,
    token: String,
    terminated: AtomicBool,
    fatal_tx: mpsc::Sender<SubscriptionError>,
}

impl DispatchShared {
    /// Deliver a fatal outcome at most once across all workers. The winner
    /// of the compare-and-swap sends; everyone else drops their error.
    fn report_fatal(&self, err: SubscriptionError) {
        if self
            .terminated
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            if self.fatal_tx.try_send(err).is_err() {
                debug!(instance = %self.instance, "fatal outcome raced teardown");
            }
        } else {
            debug!(instance = %self.instance, "extra fatal outcome dropped");
        }
    }
}

async fn run_dispatch(
    shared: Arc<DispatchShared>,
    mut sub: Subscription,
    mut shutdown: watch::Receiver<bool>,
    max_age: Duration,
    mut fatal_rx: mpsc::Receiver<SubscriptionError>,
    done: oneshot::Sender<Result<(), SubscriptionError>>,
) {
    let deadline = tokio::time::sleep(max_age);
    tokio::pin!(deadline);

    let outcome: Result<(), SubscriptionError> = loop {
        tokio::select! {
            biased;

            // A fatal outcome beats any request still queued behind it.
            Some(err) = fatal_rx.recv() => break Err(err),

            // A flag that is already true when the receiver is handed over
            // cancels immediately; a dropped sender counts as shutdown too.
            _ = shutdown.wait_for(|stop| *stop) => break Err(SubscriptionError::Cancelled),

            () = &mut deadline => break Ok(()),

            msg = sub.recv() => match msg {
                Some(msg) => {
                    let worker = Arc::clone(&shared);
                    tokio::spawn(async move { handle_message(worker, msg).await });
                }
                None => break Err(SubscriptionError::Transport(TransportError::Closed)),
            },
        }
    };

    sub.unsubscribe();
    // Workers finishing after this point must not win the fatal CAS.
    shared.terminated.store(true, Ordering::Release);
    if done.send(outcome).is_err() {
        debug!(instance = %shared.instance, "done receiver dropped before teardown");
    }
    info!(instance = %shared.instance, "subscription ended");
}

/// Decode, invoke, reply. Runs in its own task per message so a slow
/// platform method never blocks the dispatch loop.
async fn handle_message(shared: Arc<DispatchShared>, msg: TransportMessage) {
    let Some(method) = Method::from_topic(&msg.topic) else {
        warn!(instance = %shared.instance, topic = %msg.topic, "unknown message");
        if let Some(reply_to) = msg.reply_to.as_deref() {
            let (body, _) = seal_ack(Err(PlatformError::Remote("unknown message".into())));
            publish_reply(&shared, reply_to, body).await;
        }
        return;
    };

    if method == Method::Kick {
        if msg.payload != shared.token.as_bytes() {
            let token = String::from_utf8_lossy(&msg.payload).into_owned();
            debug!(instance = %shared.instance, "superseded by new subscriber");
            shared.report_fatal(SubscriptionError::Kicked { token });
        }
        return;
    }

    let (body, fatal) = invoke(shared.platform.as_ref(), method, &msg.payload).await;
    if let Some(reply_to) = msg.reply_to.as_deref() {
        publish_reply(&shared, reply_to, body).await;
    }
    // Fatal errors are both replied to and fatal: the caller learns what
    // happened even though the subscription is about to end.
    if let Some(err) = fatal {
        shared.report_fatal(SubscriptionError::Fatal(err.to_string()));
    }
}

async fn publish_reply(shared: &DispatchShared, reply_to: &str, body: Vec<u8>) {
    if let Err(err) = shared.transport.publish(reply_to, body).await {
        warn!(instance = %shared.instance, error = %err, "reply publish failed");
    }
}

/// Dispatch one decoded method against the local platform. Returns the
/// encoded reply envelope plus the error again when it was fatal.
async fn invoke(
    platform: &dyn Platform,
    method: Method,
    payload: &[u8],
) -> (Vec<u8>, Option<PlatformError>) {
    match method {
        // Unreachable from handle_message; kept so the method set stays
        // compiler-checked.
        Method::Kick => seal_ack(Err(PlatformError::Remote("kick is not a request".into()))),

        Method::Ping => seal_ack(platform.ping().await),

        Method::Version => seal(platform.version().await),

        Method::Export => seal(platform.export().await),

        Method::ListServices => match codec::decode(payload) {
            Ok(namespace) => seal(platform.list_services(namespace).await),
            Err(err) => seal::<Vec<ServiceStatus>>(Err(bad_request(&err))),
        },

        Method::ListServicesWithOptions => match codec::decode(payload) {
            Ok(opts) => seal(platform.list_services_with_options(opts).await),
            Err(err) => seal::<Vec<ServiceStatus>>(Err(bad_request(&err))),
        },

        Method::ListImages => match codec::decode(payload) {
            Ok(spec) => seal(platform.list_images(spec).await),
            Err(err) => seal::<Vec<ImageStatus>>(Err(bad_request(&err))),
        },

        Method::ListImagesWithOptions => match codec::decode(payload) {
            Ok(opts) => seal(platform.list_images_with_options(opts).await),
            Err(err) => seal::<Vec<ImageStatus>>(Err(bad_request(&err))),
        },

        Method::UpdateManifests => match codec::decode(payload) {
            Ok(spec) => seal(platform.update_manifests(spec).await),
            Err(err) => seal::<JobId>(Err(bad_request(&err))),
        },

        Method::JobStatus => match codec::decode(payload) {
            Ok(id) => seal(platform.job_status(id).await),
            Err(err) => seal::<JobStatus>(Err(bad_request(&err))),
        },

        Method::SyncStatus => match codec::decode(payload) {
            Ok(revision) => seal(platform.sync_status(revision).await),
            Err(err) => seal::<Vec<String>>(Err(bad_request(&err))),
        },

        Method::GitRepoConfig => match codec::decode(payload) {
            Ok(regenerate) => seal(platform.git_repo_config(regenerate).await),
            Err(err) => seal::<GitRepoConfig>(Err(bad_request(&err))),
        },

        Method::NotifyChange => match codec::decode(payload) {
            Ok(change) => seal_ack(platform.notify_change(change).await),
            Err(err) => seal_ack(Err(bad_request(&err))),
        },
    }
}

fn bad_request(err: &codec::CodecError) -> PlatformError {
    PlatformError::Remote(format!("bad request: {err}"))
}

/// Wrap a method result in an encoded reply envelope, and carry the error
/// back out when it was fatal.
fn seal<T: Serialize>(result: Result<T, PlatformError>) -> (Vec<u8>, Option<PlatformError>) {
    let fatal = match &result {
        Err(err) if err.is_fatal() => Some(err.clone()),
        _ => None,
    };
    let encoded = match result {
        Ok(value) => codec::encode(&ResponseEnvelope::ok(value)),
        Err(err) => codec::encode(&ResponseEnvelope::<T>::err(&err)),
    };
    (unwrap_reply(encoded), fatal)
}

/// `seal` for methods whose success carries no payload.
fn seal_ack(result: Result<(), PlatformError>) -> (Vec<u8>, Option<PlatformError>) {
    let fatal = match &result {
        Err(err) if err.is_fatal() => Some(err.clone()),
        _ => None,
    };
    let encoded = match result {
        Ok(()) => codec::encode(&ResponseEnvelope::ack()),
        Err(err) => codec::encode(&ResponseEnvelope::<()>::err(&err)),
    };
    (unwrap_reply(encoded), fatal)
}

fn unwrap_reply(encoded: Result<Vec<u8>, codec::CodecError>) -> Vec<u8> {
    match encoded {
        Ok(body) => body,
        Err(err) => {
            warn!(error = %err, "reply encode failed");
            ENCODE_FAILURE_REPLY.to_vec()
        }
    }
}
