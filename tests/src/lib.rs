//! # Backhaul Test Suite
//!
//! Unified test crate exercising the bus end to end over the in-memory
//! transport.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── rpc.rs        # Full RPC matrix: every Platform method round-trips
//!     ├── lifecycle.rs  # Kick, fatal, forced reconnect, cancellation
//!     └── presence.rs   # Ping, AwaitPresence, timeout bounds
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p backhaul-tests
//!
//! # By category
//! cargo test -p backhaul-tests integration::lifecycle::
//! ```


/// Route bus logs into the test output when `RUST_LOG` is set. Safe to call
/// from every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
