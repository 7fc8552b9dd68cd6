use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use storage::{
    dto::{
        admin::RatingOverrideRequest,
        matches::{EditMatchRequest, MatchResponse, RevertResponse},
    },
    models::{PlayerRating, User},
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::middleware::auth::Actor;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/admin/matches/{id}/revert",
    params(
        ("id" = Uuid, Path, description = "Match id")
    ),
    responses(
        (status = 200, description = "Ratings restored and match removed", body = RevertResponse),
        (status = 400, description = "Match is not confirmed"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Match not found")
    ),
    tag = "admin",
    security(("bearer_auth" = []))
)]
pub async fn revert_match(
    State(state): State<AppState>,
    Actor(admin): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<RevertResponse>, WebError> {
    let reverted = state.workflow.revert(admin, id).await?;

    Ok(Json(reverted))
}

#[utoipa::path(
    patch,
    path = "/api/admin/matches/{id}",
    params(
        ("id" = Uuid, Path, description = "Match id")
    ),
    request_body = EditMatchRequest,
    responses(
        (status = 200, description = "Match rewritten", body = MatchResponse),
        (status = 400, description = "Invalid scores"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Match not found"),
        (status = 409, description = "Would create a second pending match for this pair")
    ),
    tag = "admin",
    security(("bearer_auth" = []))
)]
pub async fn edit_match(
    State(state): State<AppState>,
    Actor(admin): Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditMatchRequest>,
) -> Result<Json<MatchResponse>, WebError> {
    payload.validate()?;

    let record = state.workflow.edit(admin, id, &payload).await?;

    Ok(Json(record.into()))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/ban",
    params(
        ("id" = Uuid, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User banned", body = User),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "User not found")
    ),
    tag = "admin",
    security(("bearer_auth" = []))
)]
pub async fn ban_user(
    State(state): State<AppState>,
    Actor(admin): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, WebError> {
    let user = state.workflow.set_user_banned(admin, id, true).await?;

    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/unban",
    params(
        ("id" = Uuid, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User unbanned", body = User),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "User not found")
    ),
    tag = "admin",
    security(("bearer_auth" = []))
)]
pub async fn unban_user(
    State(state): State<AppState>,
    Actor(admin): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, WebError> {
    let user = state.workflow.set_user_banned(admin, id, false).await?;

    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/admin/ratings/{user_id}/{sport}",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
        ("sport" = String, Path, description = "Sport id")
    ),
    request_body = RatingOverrideRequest,
    responses(
        (status = 200, description = "Rating overridden", body = PlayerRating),
        (status = 400, description = "Invalid rating"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "User or sport not found")
    ),
    tag = "admin",
    security(("bearer_auth" = []))
)]
pub async fn override_rating(
    State(state): State<AppState>,
    Actor(admin): Actor,
    Path((user_id, sport)): Path<(Uuid, String)>,
    Json(payload): Json<RatingOverrideRequest>,
) -> Result<Json<PlayerRating>, WebError> {
    payload.validate()?;

    let rating = state
        .workflow
        .override_rating(admin, user_id, &sport, payload.rating)
        .await?;

    Ok(Json(rating))
}

#[utoipa::path(
    post,
    path = "/api/admin/sports/cache/invalidate",
    responses(
        (status = 204, description = "Sport configuration will be reloaded on next access"),
        (status = 403, description = "Admin privileges required")
    ),
    tag = "admin",
    security(("bearer_auth" = []))
)]
pub async fn invalidate_sport_cache(
    State(state): State<AppState>,
    Actor(admin): Actor,
) -> Result<StatusCode, WebError> {
    state.workflow.require_admin(admin).await?;
    state.sports.invalidate().await;

    tracing::info!(target: "audit", admin = %admin, "Sport cache invalidated");
    Ok(StatusCode::NO_CONTENT)
}
