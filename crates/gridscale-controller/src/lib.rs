//! gridscale-controller — the periodic evaluation loop.
//!
//! Owns the policy store, drives a fixed-interval ticker, and fans out
//! one bounded evaluation task per enabled policy. Metrics come in
//! through the `MetricsSource` trait and scaling commands go out through
//! `ScalingTarget`; both are external collaborators.
//!
//! The loop waits for the whole per-tick batch before sleeping again, so
//! evaluations of the same policy never overlap. A per-policy failure is
//! logged, skipped for the tick, and retried naturally on the next one.

pub mod config;
pub mod controller;
pub mod error;
pub mod sources;

pub use config::ControllerConfig;
pub use controller::AutoScaler;
pub use error::{ControllerError, ControllerResult};
pub use sources::{MetricsSource, ScalingTarget};
