use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::matches::{MatchResponse, SubmitMatchRequest};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::middleware::auth::Actor;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/matches",
    request_body = SubmitMatchRequest,
    responses(
        (status = 201, description = "Match reported and awaiting confirmation", body = MatchResponse),
        (status = 400, description = "Invalid scores or request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Reporting user is banned"),
        (status = 404, description = "Opponent or sport not found"),
        (status = 409, description = "A pending match already exists for this pair")
    ),
    tag = "matches",
    security(("bearer_auth" = []))
)]
pub async fn submit_match(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(payload): Json<SubmitMatchRequest>,
) -> Result<Response, WebError> {
    payload.validate()?;

    let record = state.workflow.submit(actor, &payload).await?;

    Ok((StatusCode::CREATED, Json(MatchResponse::from(record))).into_response())
}

#[utoipa::path(
    get,
    path = "/api/matches/pending",
    responses(
        (status = 200, description = "Pending matches involving the caller", body = Vec<MatchResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "matches",
    security(("bearer_auth" = []))
)]
pub async fn list_pending(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<Json<Vec<MatchResponse>>, WebError> {
    let pending = state.workflow.pending_for_user(actor).await?;

    Ok(Json(pending.into_iter().map(MatchResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/matches/{id}",
    params(
        ("id" = Uuid, Path, description = "Match id")
    ),
    responses(
        (status = 200, description = "Match found", body = MatchResponse),
        (status = 404, description = "Match not found")
    ),
    tag = "matches",
    security(("bearer_auth" = []))
)]
pub async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchResponse>, WebError> {
    let record = state.workflow.get_match(id).await?;

    Ok(Json(record.into()))
}

#[utoipa::path(
    post,
    path = "/api/matches/{id}/confirm",
    params(
        ("id" = Uuid, Path, description = "Match id")
    ),
    responses(
        (status = 200, description = "Match confirmed and ratings updated", body = MatchResponse),
        (status = 400, description = "Match is not pending"),
        (status = 403, description = "Caller may not confirm this match"),
        (status = 404, description = "Match not found")
    ),
    tag = "matches",
    security(("bearer_auth" = []))
)]
pub async fn confirm_match(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchResponse>, WebError> {
    let record = state.workflow.confirm(actor, id).await?;

    Ok(Json(record.into()))
}

#[utoipa::path(
    post,
    path = "/api/matches/{id}/deny",
    params(
        ("id" = Uuid, Path, description = "Match id")
    ),
    responses(
        (status = 200, description = "Match denied", body = MatchResponse),
        (status = 400, description = "Match is not pending"),
        (status = 403, description = "Caller may not deny this match"),
        (status = 404, description = "Match not found")
    ),
    tag = "matches",
    security(("bearer_auth" = []))
)]
pub async fn deny_match(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchResponse>, WebError> {
    let record = state.workflow.deny(actor, id).await?;

    Ok(Json(record.into()))
}

#[utoipa::path(
    post,
    path = "/api/matches/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Match id")
    ),
    responses(
        (status = 200, description = "Match cancelled", body = MatchResponse),
        (status = 400, description = "Match is not pending"),
        (status = 403, description = "Only the submitter may cancel"),
        (status = 404, description = "Match not found")
    ),
    tag = "matches",
    security(("bearer_auth" = []))
)]
pub async fn cancel_match(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchResponse>, WebError> {
    let record = state.workflow.cancel(actor, id).await?;

    Ok(Json(record.into()))
}
