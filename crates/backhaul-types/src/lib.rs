//! # Backhaul Types Crate
//!
//! This crate contains the domain entities, the `Platform` RPC capability
//! surface, the reply envelope, and the error taxonomy shared between the
//! control plane and the per-tenant agents.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses the bus is defined
//!   here, once, with its wire names pinned by serde attributes.
//! - **Transparent errors**: an agent's error text must survive a bus hop
//!   byte-for-byte, so error display forms carry the bare message.
//! - **No transport knowledge**: nothing in this crate knows how messages
//!   move; the bus crate owns topics, codecs, and delivery.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod instance;
pub mod platform;

#[cfg(feature = "test-utils")]
pub mod testing;

pub use entities::*;
pub use envelope::{ErrorEnvelope, ResponseEnvelope};
pub use errors::{ApplicationError, PlatformError};
pub use instance::InstanceId;
pub use platform::Platform;
