//! gridscale-engine — the scaling decision math.
//!
//! Pure and synchronous: given a policy, a metrics snapshot, and rate
//! limits, produce a `ScalingDecision`. No I/O, no locks. The controller
//! crate owns fetching metrics and acting on decisions.
//!
//! # Decision Algorithm
//!
//! ```text
//! current = snapshot[current_replicas]
//! for signal in [cpu, memory, rps, custom...]:        // fixed order
//!     candidate = ceil(current * observed / target)   // custom: × weight
//!     target = max(target, candidate)                 // signals only push up
//! target = clamp(target, min_replicas, max_replicas)
//! target = rate_limit(current, target)                // bounded step size
//! action = ScaleUp | ScaleDown | NoAction             // vs current
//! ```
//!
//! Any single overloaded signal is sufficient to justify growth; no
//! signal can argue the replica count down on its own.

pub mod decision;
pub mod rate_limit;

pub use decision::calculate_decision;
pub use rate_limit::RateLimits;
