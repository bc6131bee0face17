//! # System Lifecycle & Orchestration
//!
//! Creates the five actors, wires their late-bound contexts and shuts them down again.
//!
//! ## Wiring
//!
//! ```text
//! OrderWorkflow ──> MerchantInventory
//!       │    ├────> Payment
//!       │    └────> Shipment
//! Cart ─────────> MerchantInventory
//! ```
//!
//! The dependency graph is acyclic, so dropping the top-level clients closes every channel
//! in turn: the order workflow exits first and releases the clients held in its context,
//! then its dependencies follow.
//!
//! ## Observability
//!
//! Call [`durable_actor::tracing::setup_tracing`] once at startup:
//!
//! ```bash
//! RUST_LOG=info cargo run      # Compact logs
//! RUST_LOG=debug cargo run     # Full payloads
//! ```

mod system;

pub use system::FulfillmentSystem;
