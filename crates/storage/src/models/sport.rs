use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SportConfig {
    pub id: String,
    pub name: String,
    pub emoji: Option<String>,
    pub description: Option<String>,
    pub k_factor: i32,
    pub min_score: i32,
    pub max_score: i32,
    pub default_rating: i32,
    pub is_active: bool,
    pub sort_order: i32,
}

impl SportConfig {
    /// Sport ids are short lowercase slugs such as `table_tennis`.
    pub fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && id.len() <= 50
            && id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }

    pub fn score_in_range(&self, score: i32) -> bool {
        (self.min_score..=self.max_score).contains(&score)
    }
}
