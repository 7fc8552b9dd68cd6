use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::Database;
use crate::error::Result;
use crate::models::{MatchEdit, MatchRecord, MatchStatus, NewMatch, PlayerRating, StatusChange, User};
use crate::repository::matches::MatchRepository;
use crate::repository::ratings::RatingRepository;
use crate::repository::users::UserRepository;
use crate::store::{MatchRecordStore, Persistence, RatingStore, UnitOfWork, UserDirectory};

/// An open PostgreSQL transaction. Dropping it without `commit` rolls back.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl Persistence for Database {
    type Work = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork> {
        let tx = self.pool().begin().await?;
        Ok(PgUnitOfWork { tx })
    }
}

#[async_trait]
impl UserDirectory for PgUnitOfWork {
    async fn find_user(&mut self, user_id: Uuid) -> Result<Option<User>> {
        UserRepository::new(&mut self.tx).find_by_id(user_id).await
    }

    async fn set_user_banned(&mut self, user_id: Uuid, banned: bool) -> Result<User> {
        UserRepository::new(&mut self.tx)
            .set_banned(user_id, banned)
            .await
    }
}

#[async_trait]
impl MatchRecordStore for PgUnitOfWork {
    async fn find_match(&mut self, match_id: Uuid) -> Result<Option<MatchRecord>> {
        MatchRepository::new(&mut self.tx).find_by_id(match_id).await
    }

    async fn lock_match(&mut self, match_id: Uuid) -> Result<Option<MatchRecord>> {
        MatchRepository::new(&mut self.tx).lock_by_id(match_id).await
    }

    async fn pending_match_exists(&mut self, sport_id: &str, a: Uuid, b: Uuid) -> Result<bool> {
        MatchRepository::new(&mut self.tx)
            .pending_exists(sport_id, a, b)
            .await
    }

    async fn insert_match(&mut self, new_match: &NewMatch) -> Result<MatchRecord> {
        MatchRepository::new(&mut self.tx).create(new_match).await
    }

    async fn transition_match(
        &mut self,
        match_id: Uuid,
        from: MatchStatus,
        change: &StatusChange,
    ) -> Result<Option<MatchRecord>> {
        MatchRepository::new(&mut self.tx)
            .transition(match_id, from, change)
            .await
    }

    async fn rewrite_match(&mut self, match_id: Uuid, edit: &MatchEdit) -> Result<MatchRecord> {
        MatchRepository::new(&mut self.tx)
            .rewrite(match_id, edit)
            .await
    }

    async fn delete_match(&mut self, match_id: Uuid) -> Result<()> {
        MatchRepository::new(&mut self.tx).delete(match_id).await
    }

    async fn pending_for_user(&mut self, user_id: Uuid) -> Result<Vec<MatchRecord>> {
        MatchRepository::new(&mut self.tx)
            .pending_for_user(user_id)
            .await
    }
}

#[async_trait]
impl RatingStore for PgUnitOfWork {
    async fn lock_rating(
        &mut self,
        user_id: Uuid,
        sport_id: &str,
        default_rating: i32,
    ) -> Result<PlayerRating> {
        RatingRepository::new(&mut self.tx)
            .lock(user_id, sport_id, default_rating)
            .await
    }

    async fn save_rating(&mut self, rating: &PlayerRating) -> Result<()> {
        RatingRepository::new(&mut self.tx).save(rating).await
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
