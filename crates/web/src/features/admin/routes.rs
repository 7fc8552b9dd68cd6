use axum::{
    Router, middleware,
    routing::{patch, post, put},
};

use super::handlers::{
    ban_user, edit_match, invalidate_sport_cache, override_rating, revert_match, unban_user,
};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    Router::new()
        .route("/matches/:id", patch(edit_match))
        .route("/matches/:id/revert", post(revert_match))
        .route("/users/:id/ban", post(ban_user))
        .route("/users/:id/unban", post(unban_user))
        .route("/ratings/:user_id/:sport", put(override_rating))
        .route("/sports/cache/invalidate", post(invalidate_sport_cache))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth))
}
