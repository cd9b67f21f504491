//! gridscale-policy — scaling policy model and registry.
//!
//! Defines the per-service `ScalingPolicy` (targets, bounds, behaviors,
//! runtime state), the ephemeral evaluation artifacts
//! (`MetricsSnapshot`, `ScalingDecision`), and the `PolicyStore`, an
//! in-memory `RwLock`ed registry with copy-on-read snapshots.
//!
//! The store is `Clone` + `Send` + `Sync` (backed by `Arc`) and is shared
//! between the controller loop and the admin API.

pub mod error;
pub mod store;
pub mod types;

pub use error::{PolicyError, PolicyResult};
pub use store::PolicyStore;
pub use types::*;
