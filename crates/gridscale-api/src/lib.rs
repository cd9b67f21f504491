//! gridscale-api — REST API for GridScale.
//!
//! Provides axum route handlers for managing scaling policies and
//! querying executor-side service state.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/policies` | List policy statuses |
//! | POST | `/api/v1/policies` | Register (upsert) a policy |
//! | GET | `/api/v1/policies/{service}` | Get the full policy |
//! | DELETE | `/api/v1/policies/{service}` | Remove a policy |
//! | GET | `/api/v1/policies/{service}/status` | Status projection |
//! | POST | `/api/v1/policies/{service}/enable` | Enable evaluation |
//! | POST | `/api/v1/policies/{service}/disable` | Disable evaluation |
//! | GET | `/api/v1/services/{service}` | Executor-side service info |
//! | GET | `/healthz` | Liveness |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use gridscale_controller::ScalingTarget;
use gridscale_policy::PolicyStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: PolicyStore,
    pub target: Arc<dyn ScalingTarget>,
}

/// Build the complete API router.
pub fn build_router(store: PolicyStore, target: Arc<dyn ScalingTarget>) -> Router {
    let state = ApiState { store, target };

    let api_routes = Router::new()
        .route(
            "/policies",
            get(handlers::list_policies).post(handlers::register_policy),
        )
        .route(
            "/policies/{service}",
            get(handlers::get_policy).delete(handlers::delete_policy),
        )
        .route("/policies/{service}/status", get(handlers::policy_status))
        .route("/policies/{service}/enable", post(handlers::enable_policy))
        .route(
            "/policies/{service}/disable",
            post(handlers::disable_policy),
        )
        .route("/services/{service}", get(handlers::get_service))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(handlers::healthz))
}
