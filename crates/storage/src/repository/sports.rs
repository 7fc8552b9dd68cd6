use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::SportConfig;
use crate::services::sport_registry::SportSource;

pub struct SportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SportRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All sports, active or not
    pub async fn list(&self) -> Result<Vec<SportConfig>> {
        let sports = sqlx::query_as::<_, SportConfig>(
            r#"
            SELECT id, name, emoji, description, k_factor, min_score, max_score,
                   default_rating, is_active, sort_order
            FROM sports
            ORDER BY sort_order, name
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(sports)
    }
}

/// Feeds the sport registry from the `sports` table.
#[derive(Debug, Clone)]
pub struct PgSportSource {
    pool: PgPool,
}

impl PgSportSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SportSource for PgSportSource {
    async fn load_sports(&self) -> Result<Vec<SportConfig>> {
        SportRepository::new(&self.pool).list().await
    }
}
