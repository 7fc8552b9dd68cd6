use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One ranked row of a sport's leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: Uuid,
    pub display_name: String,
    pub current_elo: i32,
    pub highest_elo: i32,
    pub matches_played: i32,
    pub wins: i32,
    pub losses: i32,
}
