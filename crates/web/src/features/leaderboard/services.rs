use sqlx::PgPool;
use storage::{
    dto::{common::PaginationParams, leaderboard::LeaderboardEntry},
    error::Result,
    repository::leaderboard::LeaderboardRepository,
};

/// Get one page of a sport's leaderboard
pub async fn get_leaderboard(
    pool: &PgPool,
    sport_id: &str,
    pagination: &PaginationParams,
) -> Result<(Vec<LeaderboardEntry>, i64)> {
    let repo = LeaderboardRepository::new(pool);
    repo.get_leaderboard(sport_id, pagination).await
}
