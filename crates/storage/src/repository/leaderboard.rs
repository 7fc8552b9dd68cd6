use sqlx::PgPool;

use crate::dto::common::PaginationParams;
use crate::dto::leaderboard::LeaderboardEntry;
use crate::error::Result;

pub struct LeaderboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LeaderboardRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Players with at least one match, best current rating first. Ties go to
    /// the player with more wins, then to the lower user id.
    pub async fn get_leaderboard(
        &self,
        sport_id: &str,
        pagination: &PaginationParams,
    ) -> Result<(Vec<LeaderboardEntry>, i64)> {
        let total_items = self.count_ranked(sport_id).await?;

        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT
                ROW_NUMBER() OVER (
                    ORDER BY pr.current_elo DESC, pr.wins DESC, pr.user_id ASC
                ) AS rank,
                pr.user_id,
                u.display_name,
                pr.current_elo,
                pr.highest_elo,
                pr.matches_played,
                pr.wins,
                pr.losses
            FROM player_ratings pr
            INNER JOIN users u ON u.id = pr.user_id
            WHERE pr.sport_id = $1
              AND pr.matches_played > 0
            ORDER BY rank
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(sport_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((entries, total_items))
    }

    async fn count_ranked(&self, sport_id: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM player_ratings
            WHERE sport_id = $1 AND matches_played > 0
            "#,
        )
        .bind(sport_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }
}
