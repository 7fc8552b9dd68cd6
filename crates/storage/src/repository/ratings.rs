use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::models::PlayerRating;

pub struct RatingRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> RatingRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Materializes the row if needed, then reads it `FOR UPDATE`.
    pub async fn lock(
        &mut self,
        user_id: Uuid,
        sport_id: &str,
        default_rating: i32,
    ) -> Result<PlayerRating> {
        sqlx::query(
            r#"
            INSERT INTO player_ratings (user_id, sport_id, current_elo, highest_elo)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (user_id, sport_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(sport_id)
        .bind(default_rating)
        .execute(&mut *self.conn)
        .await?;

        let rating = sqlx::query_as::<_, PlayerRating>(
            r#"
            SELECT user_id, sport_id, current_elo, highest_elo,
                   matches_played, wins, losses, updated_at
            FROM player_ratings
            WHERE user_id = $1 AND sport_id = $2
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(sport_id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(rating)
    }

    pub async fn save(&mut self, rating: &PlayerRating) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO player_ratings (
                user_id, sport_id, current_elo, highest_elo,
                matches_played, wins, losses, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, sport_id) DO UPDATE SET
                current_elo = EXCLUDED.current_elo,
                highest_elo = EXCLUDED.highest_elo,
                matches_played = EXCLUDED.matches_played,
                wins = EXCLUDED.wins,
                losses = EXCLUDED.losses,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(rating.user_id)
        .bind(&rating.sport_id)
        .bind(rating.current_elo)
        .bind(rating.highest_elo)
        .bind(rating.matches_played)
        .bind(rating.wins)
        .bind(rating.losses)
        .bind(rating.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }
}
