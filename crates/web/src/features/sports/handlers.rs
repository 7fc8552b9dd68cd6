use axum::{Json, extract::State};
use storage::models::SportConfig;

use crate::error::WebError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/sports",
    responses(
        (status = 200, description = "Active sports in display order", body = Vec<SportConfig>)
    ),
    tag = "sports"
)]
pub async fn list_sports(State(state): State<AppState>) -> Result<Json<Vec<SportConfig>>, WebError> {
    let sports = state.sports.list_active().await?;

    Ok(Json(sports))
}
