//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the global `tracing` subscriber used by binaries built on this
//! crate. Actors log with structured fields (`entity_type`, `key`, `error`) instead of
//! formatted strings, so the compact output stays greppable:
//!
//! ```text
//! INFO Actor started entity_type="MerchantInventory"
//! INFO Action ok entity_type="MerchantInventory" key=m_001
//! WARN Step failed, retrying entity_type="Payment" key=pay_1 step="charge" attempt=1 reason="gateway timeout"
//! ```
//!
//! Levels come from `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=info cargo run      # lifecycle and outcomes
//! RUST_LOG=debug cargo run     # full action and query payloads, journal replays
//! ```

/// Initializes the global subscriber. Call once, at the start of `main`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
