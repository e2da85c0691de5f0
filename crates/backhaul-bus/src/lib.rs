//! # Backhaul Bus - RPC over Publish/Subscribe
//!
//! Connects a multi-tenant control plane to remote per-tenant agents that
//! cannot accept inbound connections. All calls ride a shared pub/sub
//! transport; this crate makes them look like synchronous RPC.
//!
//! ## Flow
//!
//! ```text
//! ┌───────────────┐  request on                       ┌───────────────┐
//! │ Control plane │  <id>.Platform.<Method>           │  Tenant agent │
//! │               │ ─────────────────┐                │               │
//! │ Connecter ─►  │                  ▼                │  Subscriber   │
//! │ PlatformStub  │            ┌──────────┐  wildcard │  dispatch     │
//! └───────────────┘            │ pub/sub  │ ─────────►│  loop         │
//!         ▲                    │transport │           └───────────────┘
//!         │    reply inbox     └──────────┘                  │
//!         └───────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//!
//! At most one agent answers for one instance. Ownership is a logical
//! token: every new subscription broadcasts a fresh kick token, and any
//! older subscription seeing a foreign token tears itself down. The
//! guarantee is eventual, converging within one request/reply round trip.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod codec;
pub mod config;
pub mod connect;
pub mod logging;
pub mod memory;
pub mod presence;
pub mod subject;
pub mod subscribe;
pub mod transport;

// Re-export main types
pub use codec::CodecError;
pub use config::{BusConfig, DEFAULT_CALL_TIMEOUT, DEFAULT_MAX_AGE, DEFAULT_PRESENCE_POLL};
pub use connect::{Connecter, PlatformStub};
pub use logging::LoggedPlatform;
pub use memory::MemoryTransport;
pub use subject::Method;
pub use subscribe::{Subscriber, SubscriptionError};
pub use transport::{Subscription, Transport, TransportError, TransportMessage};
