use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{MatchRecord, MatchStatus, SportConfig};

/// Request payload for reporting a match result
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitMatchRequest {
    #[validate(custom(function = "validate_sport_id"))]
    pub sport: String,

    pub opponent_id: Uuid,

    #[validate(range(min = 0, message = "Score cannot be negative"))]
    pub player_score: i32,

    #[validate(range(min = 0, message = "Score cannot be negative"))]
    pub opponent_score: i32,
}

/// Request payload for an administrative rewrite of a match
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct EditMatchRequest {
    #[validate(range(min = 0, message = "Score cannot be negative"))]
    pub player1_score: Option<i32>,

    #[validate(range(min = 0, message = "Score cannot be negative"))]
    pub player2_score: Option<i32>,

    pub status: Option<MatchStatus>,
}

fn validate_sport_id(sport: &str) -> Result<(), ValidationError> {
    if SportConfig::is_valid_id(sport) {
        Ok(())
    } else {
        let mut error = ValidationError::new("invalid_sport");
        error.message = Some("Sport must be a lowercase identifier such as table_tennis".into());
        Err(error)
    }
}

/// A match as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MatchResponse {
    pub id: Uuid,
    pub sport: String,
    pub player1_id: Uuid,
    pub player2_id: Uuid,
    pub player1_score: i32,
    pub player2_score: i32,
    pub winner_id: Uuid,
    pub status: MatchStatus,
    pub submitted_by: Uuid,
    pub player1_elo_before: Option<i32>,
    pub player1_elo_after: Option<i32>,
    pub player1_elo_delta: Option<i32>,
    pub player2_elo_before: Option<i32>,
    pub player2_elo_after: Option<i32>,
    pub player2_elo_delta: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub denied_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<MatchRecord> for MatchResponse {
    fn from(record: MatchRecord) -> Self {
        let ratings = record.ratings;
        Self {
            id: record.id,
            sport: record.sport_id,
            player1_id: record.player1_id,
            player2_id: record.player2_id,
            player1_score: record.player1_score,
            player2_score: record.player2_score,
            winner_id: record.winner_id,
            status: record.status,
            submitted_by: record.submitted_by,
            player1_elo_before: ratings.map(|r| r.player1_elo_before),
            player1_elo_after: ratings.map(|r| r.player1_elo_after),
            player1_elo_delta: ratings.map(|r| r.player1_elo_delta),
            player2_elo_before: ratings.map(|r| r.player2_elo_before),
            player2_elo_after: ratings.map(|r| r.player2_elo_after),
            player2_elo_delta: ratings.map(|r| r.player2_elo_delta),
            created_at: record.created_at,
            confirmed_at: record.confirmed_at,
            denied_at: record.denied_at,
            cancelled_at: record.cancelled_at,
        }
    }
}

/// Outcome of reverting a confirmed match
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RevertResponse {
    pub match_id: Uuid,
    pub sport: String,
    pub player1_id: Uuid,
    pub player1_restored_elo: i32,
    pub player2_id: Uuid,
    pub player2_restored_elo: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_scores_and_bad_sport() {
        let req = SubmitMatchRequest {
            sport: "Table Tennis".to_string(),
            opponent_id: Uuid::new_v4(),
            player_score: -1,
            opponent_score: 11,
        };

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("sport"));
        assert!(fields.contains_key("player_score"));
        assert!(!fields.contains_key("opponent_score"));
    }

    #[test]
    fn accepts_well_formed_submission() {
        let req = SubmitMatchRequest {
            sport: "table_tennis".to_string(),
            opponent_id: Uuid::new_v4(),
            player_score: 11,
            opponent_score: 9,
        };
        assert!(req.validate().is_ok());
    }
}
