use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{MatchEdit, MatchRatings, MatchRecord, MatchStatus, NewMatch, StatusChange};

const MATCH_COLUMNS: &str = r#"
    id, sport_id, player1_id, player2_id, player1_score, player2_score, winner_id,
    status, submitted_by,
    player1_elo_before, player1_elo_after, player1_elo_delta,
    player2_elo_before, player2_elo_after, player2_elo_delta,
    created_at, updated_at, confirmed_at, denied_at, cancelled_at
"#;

const PENDING_CONFLICT: &str = "A pending match already exists between these players";

#[derive(FromRow)]
struct MatchRow {
    id: Uuid,
    sport_id: String,
    player1_id: Uuid,
    player2_id: Uuid,
    player1_score: i32,
    player2_score: i32,
    winner_id: Uuid,
    status: MatchStatus,
    submitted_by: Uuid,
    player1_elo_before: Option<i32>,
    player1_elo_after: Option<i32>,
    player1_elo_delta: Option<i32>,
    player2_elo_before: Option<i32>,
    player2_elo_after: Option<i32>,
    player2_elo_delta: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
    denied_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl From<MatchRow> for MatchRecord {
    fn from(row: MatchRow) -> Self {
        let ratings = match (
            row.player1_elo_before,
            row.player1_elo_after,
            row.player1_elo_delta,
            row.player2_elo_before,
            row.player2_elo_after,
            row.player2_elo_delta,
        ) {
            (Some(b1), Some(a1), Some(d1), Some(b2), Some(a2), Some(d2)) => Some(MatchRatings {
                player1_elo_before: b1,
                player1_elo_after: a1,
                player1_elo_delta: d1,
                player2_elo_before: b2,
                player2_elo_after: a2,
                player2_elo_delta: d2,
            }),
            _ => None,
        };

        Self {
            id: row.id,
            sport_id: row.sport_id,
            player1_id: row.player1_id,
            player2_id: row.player2_id,
            player1_score: row.player1_score,
            player2_score: row.player2_score,
            winner_id: row.winner_id,
            status: row.status,
            submitted_by: row.submitted_by,
            ratings,
            created_at: row.created_at,
            updated_at: row.updated_at,
            confirmed_at: row.confirmed_at,
            denied_at: row.denied_at,
            cancelled_at: row.cancelled_at,
        }
    }
}

/// Match queries bound to the connection of an open transaction.
pub struct MatchRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> MatchRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&mut self, id: Uuid) -> Result<Option<MatchRecord>> {
        let sql = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1");
        let row = sqlx::query_as::<_, MatchRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(row.map(MatchRecord::from))
    }

    pub async fn lock_by_id(&mut self, id: Uuid) -> Result<Option<MatchRecord>> {
        let sql = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, MatchRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(row.map(MatchRecord::from))
    }

    /// Checks for a pending match between `a` and `b` in either seat order
    pub async fn pending_exists(&mut self, sport_id: &str, a: Uuid, b: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM matches
                WHERE sport_id = $1
                  AND status = 'pending'
                  AND ((player1_id = $2 AND player2_id = $3)
                    OR (player1_id = $3 AND player2_id = $2))
            )
            "#,
        )
        .bind(sport_id)
        .bind(a)
        .bind(b)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(exists)
    }

    pub async fn create(&mut self, new_match: &NewMatch) -> Result<MatchRecord> {
        let sql = format!(
            r#"
            INSERT INTO matches (
                sport_id, player1_id, player2_id, player1_score, player2_score,
                winner_id, status, submitted_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8, $8)
            RETURNING {MATCH_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, MatchRow>(&sql)
            .bind(&new_match.sport_id)
            .bind(new_match.player1_id)
            .bind(new_match.player2_id)
            .bind(new_match.player1_score)
            .bind(new_match.player2_score)
            .bind(new_match.winner_id)
            .bind(new_match.submitted_by)
            .bind(new_match.created_at)
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| StorageError::from(e).unique_as(PENDING_CONFLICT))?;

        Ok(row.into())
    }

    /// Conditional status update; `None` when the match is no longer in `from`
    pub async fn transition(
        &mut self,
        id: Uuid,
        from: MatchStatus,
        change: &StatusChange,
    ) -> Result<Option<MatchRecord>> {
        let row = match *change {
            StatusChange::Confirmed { at, ratings } => {
                let sql = format!(
                    r#"
                    UPDATE matches
                    SET status = 'confirmed',
                        confirmed_at = $3,
                        updated_at = $3,
                        player1_elo_before = $4,
                        player1_elo_after = $5,
                        player1_elo_delta = $6,
                        player2_elo_before = $7,
                        player2_elo_after = $8,
                        player2_elo_delta = $9
                    WHERE id = $1 AND status = $2
                    RETURNING {MATCH_COLUMNS}
                    "#
                );
                sqlx::query_as::<_, MatchRow>(&sql)
                    .bind(id)
                    .bind(from)
                    .bind(at)
                    .bind(ratings.player1_elo_before)
                    .bind(ratings.player1_elo_after)
                    .bind(ratings.player1_elo_delta)
                    .bind(ratings.player2_elo_before)
                    .bind(ratings.player2_elo_after)
                    .bind(ratings.player2_elo_delta)
                    .fetch_optional(&mut *self.conn)
                    .await?
            }
            StatusChange::Denied { at } => {
                let sql = format!(
                    r#"
                    UPDATE matches
                    SET status = 'denied', denied_at = $3, updated_at = $3
                    WHERE id = $1 AND status = $2
                    RETURNING {MATCH_COLUMNS}
                    "#
                );
                sqlx::query_as::<_, MatchRow>(&sql)
                    .bind(id)
                    .bind(from)
                    .bind(at)
                    .fetch_optional(&mut *self.conn)
                    .await?
            }
            StatusChange::Cancelled { at } => {
                let sql = format!(
                    r#"
                    UPDATE matches
                    SET status = 'cancelled', cancelled_at = $3, updated_at = $3
                    WHERE id = $1 AND status = $2
                    RETURNING {MATCH_COLUMNS}
                    "#
                );
                sqlx::query_as::<_, MatchRow>(&sql)
                    .bind(id)
                    .bind(from)
                    .bind(at)
                    .fetch_optional(&mut *self.conn)
                    .await?
            }
        };

        Ok(row.map(MatchRecord::from))
    }

    pub async fn rewrite(&mut self, id: Uuid, edit: &MatchEdit) -> Result<MatchRecord> {
        let sql = format!(
            r#"
            UPDATE matches
            SET player1_score = $2,
                player2_score = $3,
                winner_id = $4,
                status = $5,
                updated_at = $6
            WHERE id = $1
            RETURNING {MATCH_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, MatchRow>(&sql)
            .bind(id)
            .bind(edit.player1_score)
            .bind(edit.player2_score)
            .bind(edit.winner_id)
            .bind(edit.status)
            .bind(edit.updated_at)
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(|e| StorageError::from(e).unique_as(PENDING_CONFLICT))?
            .ok_or(StorageError::NotFound)?;

        Ok(row.into())
    }

    pub async fn delete(&mut self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    pub async fn pending_for_user(&mut self, user_id: Uuid) -> Result<Vec<MatchRecord>> {
        let sql = format!(
            r#"
            SELECT {MATCH_COLUMNS}
            FROM matches
            WHERE status = 'pending'
              AND (player1_id = $1 OR player2_id = $1)
            ORDER BY created_at DESC
            "#
        );

        let rows = sqlx::query_as::<_, MatchRow>(&sql)
            .bind(user_id)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows.into_iter().map(MatchRecord::from).collect())
    }
}
