use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use storage::dto::{
    common::{PaginatedResponse, PaginationParams},
    leaderboard::LeaderboardEntry,
};

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/leaderboard/{sport}",
    params(
        ("sport" = String, Path, description = "Sport id"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Leaderboard retrieved successfully", body = PaginatedResponse<LeaderboardEntry>),
        (status = 400, description = "Invalid query parameters"),
        (status = 404, description = "Sport not found")
    ),
    tag = "leaderboard"
)]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(sport): Path<String>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, WebError> {
    pagination.validate().map_err(WebError::BadRequest)?;

    let sport = state.sports.get_active_sport(&sport).await?;
    let (entries, total_items) =
        services::get_leaderboard(state.db.pool(), &sport.id, &pagination).await?;

    let response = PaginatedResponse::new(entries, pagination, total_items);

    Ok(Json(response).into_response())
}
