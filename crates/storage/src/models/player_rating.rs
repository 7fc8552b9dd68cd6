use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Rating and record of one user in one sport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PlayerRating {
    pub user_id: Uuid,
    pub sport_id: String,
    pub current_elo: i32,
    pub highest_elo: i32,
    pub matches_played: i32,
    pub wins: i32,
    pub losses: i32,
    pub updated_at: DateTime<Utc>,
}

impl PlayerRating {
    /// The state an absent row stands for.
    pub fn initial(user_id: Uuid, sport_id: &str, default_rating: i32) -> Self {
        Self {
            user_id,
            sport_id: sport_id.to_string(),
            current_elo: default_rating,
            highest_elo: default_rating,
            matches_played: 0,
            wins: 0,
            losses: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn record_result(&mut self, new_rating: i32, won: bool, at: DateTime<Utc>) {
        self.current_elo = new_rating;
        self.highest_elo = self.highest_elo.max(new_rating);
        self.matches_played += 1;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.updated_at = at;
    }

    /// Undoes one recorded result. `highest_elo` never goes down.
    pub fn undo_result(&mut self, restored_rating: i32, won: bool, at: DateTime<Utc>) {
        self.current_elo = restored_rating;
        self.highest_elo = self.highest_elo.max(restored_rating);
        self.matches_played = (self.matches_played - 1).max(0);
        if won {
            self.wins = (self.wins - 1).max(0);
        } else {
            self.losses = (self.losses - 1).max(0);
        }
        self.updated_at = at;
    }

    pub fn override_current(&mut self, rating: i32, at: DateTime<Utc>) {
        self.current_elo = rating;
        self.highest_elo = self.highest_elo.max(rating);
        self.updated_at = at;
    }
}
