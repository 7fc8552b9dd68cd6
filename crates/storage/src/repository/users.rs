use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::User;

pub struct UserRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> UserRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&mut self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, display_name, email, is_admin, is_banned, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(user)
    }

    pub async fn set_banned(&mut self, id: Uuid, banned: bool) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_banned = $2
            WHERE id = $1
            RETURNING id, display_name, email, is_admin, is_banned, created_at
            "#,
        )
        .bind(id)
        .bind(banned)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(user)
    }
}
