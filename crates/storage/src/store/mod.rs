//! Persistence seams of the match workflow.
//!
//! Every store operation is a method on a [`UnitOfWork`], an open transaction
//! obtained from [`Persistence::begin`]. The caller that begins a unit of work
//! is the one that commits or rolls it back; dropping it uncommitted discards
//! its writes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{MatchEdit, MatchRecord, MatchStatus, NewMatch, PlayerRating, StatusChange, User};

#[cfg(test)]
pub mod memory;

#[async_trait]
pub trait UserDirectory: Send {
    async fn find_user(&mut self, user_id: Uuid) -> Result<Option<User>>;

    /// Fails with `NotFound` for an unknown user.
    async fn set_user_banned(&mut self, user_id: Uuid, banned: bool) -> Result<User>;
}

#[async_trait]
pub trait MatchRecordStore: Send {
    async fn find_match(&mut self, match_id: Uuid) -> Result<Option<MatchRecord>>;

    /// Like `find_match`, but holds the row lock until the unit of work ends.
    async fn lock_match(&mut self, match_id: Uuid) -> Result<Option<MatchRecord>>;

    /// Whether a `pending` match exists for the unordered pair in this sport.
    async fn pending_match_exists(&mut self, sport_id: &str, a: Uuid, b: Uuid) -> Result<bool>;

    /// Inserts a `pending` match. A second pending match for the same pair and
    /// sport fails with `ConstraintViolation`.
    async fn insert_match(&mut self, new_match: &NewMatch) -> Result<MatchRecord>;

    /// Moves the match out of `from` and returns the updated row, or `None`
    /// when the match is absent or no longer in `from`.
    async fn transition_match(
        &mut self,
        match_id: Uuid,
        from: MatchStatus,
        change: &StatusChange,
    ) -> Result<Option<MatchRecord>>;

    async fn rewrite_match(&mut self, match_id: Uuid, edit: &MatchEdit) -> Result<MatchRecord>;

    async fn delete_match(&mut self, match_id: Uuid) -> Result<()>;

    /// Pending matches involving the user, newest first.
    async fn pending_for_user(&mut self, user_id: Uuid) -> Result<Vec<MatchRecord>>;
}

#[async_trait]
pub trait RatingStore: Send {
    /// Reads the rating row with an exclusive lock held until the unit of work
    /// ends, materializing it from `default_rating` when absent.
    async fn lock_rating(
        &mut self,
        user_id: Uuid,
        sport_id: &str,
        default_rating: i32,
    ) -> Result<PlayerRating>;

    async fn save_rating(&mut self, rating: &PlayerRating) -> Result<()>;
}

#[async_trait]
pub trait UnitOfWork: UserDirectory + MatchRecordStore + RatingStore {
    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

#[async_trait]
pub trait Persistence: Send + Sync + 'static {
    type Work: UnitOfWork + 'static;

    async fn begin(&self) -> Result<Self::Work>;
}
