use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{
    cancel_match, confirm_match, deny_match, get_match, list_pending, submit_match,
};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    Router::new()
        .route("/", post(submit_match))
        .route("/pending", get(list_pending))
        .route("/:id", get(get_match))
        .route("/:id/confirm", post(confirm_match))
        .route("/:id/deny", post(deny_match))
        .route("/:id/cancel", post(cancel_match))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth))
}
