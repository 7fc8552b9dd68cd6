//! In-memory persistence for tests.
//!
//! Units of work are serialized by a single mutex and operate on a private copy
//! of the state, which replaces the shared state only on commit.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{MatchRecordStore, Persistence, RatingStore, UnitOfWork, UserDirectory};
use crate::error::{Result, StorageError};
use crate::models::{MatchEdit, MatchRecord, MatchStatus, NewMatch, PlayerRating, StatusChange, User};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    matches: HashMap<Uuid, MatchRecord>,
    ratings: HashMap<(Uuid, String), PlayerRating>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_rating_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, display_name: &str) -> User {
        self.insert_user(display_name, false, false).await
    }

    pub async fn add_admin(&self, display_name: &str) -> User {
        self.insert_user(display_name, true, false).await
    }

    pub async fn add_banned_user(&self, display_name: &str) -> User {
        self.insert_user(display_name, false, true).await
    }

    async fn insert_user(&self, display_name: &str, is_admin: bool, is_banned: bool) -> User {
        let user = User {
            id: Uuid::new_v4(),
            display_name: display_name.to_string(),
            email: format!("{}@example.org", display_name.to_lowercase()),
            is_admin,
            is_banned,
            created_at: Utc::now(),
        };
        self.state.lock().await.users.insert(user.id, user.clone());
        user
    }

    pub async fn seed_rating(&self, rating: PlayerRating) {
        self.state
            .lock()
            .await
            .ratings
            .insert((rating.user_id, rating.sport_id.clone()), rating);
    }

    pub async fn rating(&self, user_id: Uuid, sport_id: &str) -> Option<PlayerRating> {
        self.state
            .lock()
            .await
            .ratings
            .get(&(user_id, sport_id.to_string()))
            .cloned()
    }

    pub async fn stored_match(&self, match_id: Uuid) -> Option<MatchRecord> {
        self.state.lock().await.matches.get(&match_id).cloned()
    }

    pub async fn match_count(&self) -> usize {
        self.state.lock().await.matches.len()
    }

    /// Makes every `save_rating` fail until switched off again.
    pub fn fail_rating_writes(&self, fail: bool) {
        self.fail_rating_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    type Work = MemoryWork;

    async fn begin(&self) -> Result<MemoryWork> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryWork {
            guard,
            working,
            fail_rating_writes: Arc::clone(&self.fail_rating_writes),
        })
    }
}

pub struct MemoryWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_rating_writes: Arc<AtomicBool>,
}

#[async_trait]
impl UserDirectory for MemoryWork {
    async fn find_user(&mut self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.working.users.get(&user_id).cloned())
    }

    async fn set_user_banned(&mut self, user_id: Uuid, banned: bool) -> Result<User> {
        let user = self
            .working
            .users
            .get_mut(&user_id)
            .ok_or(StorageError::NotFound)?;
        user.is_banned = banned;
        Ok(user.clone())
    }
}

#[async_trait]
impl MatchRecordStore for MemoryWork {
    async fn find_match(&mut self, match_id: Uuid) -> Result<Option<MatchRecord>> {
        Ok(self.working.matches.get(&match_id).cloned())
    }

    async fn lock_match(&mut self, match_id: Uuid) -> Result<Option<MatchRecord>> {
        self.find_match(match_id).await
    }

    async fn pending_match_exists(&mut self, sport_id: &str, a: Uuid, b: Uuid) -> Result<bool> {
        Ok(self
            .working
            .matches
            .values()
            .any(|m| m.status == MatchStatus::Pending && m.same_pairing(sport_id, a, b)))
    }

    async fn insert_match(&mut self, new_match: &NewMatch) -> Result<MatchRecord> {
        if self
            .pending_match_exists(&new_match.sport_id, new_match.player1_id, new_match.player2_id)
            .await?
        {
            return Err(StorageError::ConstraintViolation(
                "pending match already exists".to_string(),
            ));
        }

        let record = MatchRecord {
            id: Uuid::new_v4(),
            sport_id: new_match.sport_id.clone(),
            player1_id: new_match.player1_id,
            player2_id: new_match.player2_id,
            player1_score: new_match.player1_score,
            player2_score: new_match.player2_score,
            winner_id: new_match.winner_id,
            status: MatchStatus::Pending,
            submitted_by: new_match.submitted_by,
            ratings: None,
            created_at: new_match.created_at,
            updated_at: new_match.created_at,
            confirmed_at: None,
            denied_at: None,
            cancelled_at: None,
        };
        self.working.matches.insert(record.id, record.clone());
        Ok(record)
    }

    async fn transition_match(
        &mut self,
        match_id: Uuid,
        from: MatchStatus,
        change: &StatusChange,
    ) -> Result<Option<MatchRecord>> {
        let Some(record) = self.working.matches.get_mut(&match_id) else {
            return Ok(None);
        };
        if record.status != from {
            return Ok(None);
        }

        record.status = change.status();
        record.updated_at = change.at();
        match *change {
            StatusChange::Confirmed { at, ratings } => {
                record.confirmed_at = Some(at);
                record.ratings = Some(ratings);
            }
            StatusChange::Denied { at } => record.denied_at = Some(at),
            StatusChange::Cancelled { at } => record.cancelled_at = Some(at),
        }
        Ok(Some(record.clone()))
    }

    async fn rewrite_match(&mut self, match_id: Uuid, edit: &MatchEdit) -> Result<MatchRecord> {
        let current = self
            .working
            .matches
            .get(&match_id)
            .ok_or(StorageError::NotFound)?
            .clone();

        if edit.status == MatchStatus::Pending {
            let clash = self.working.matches.values().any(|m| {
                m.id != match_id
                    && m.status == MatchStatus::Pending
                    && m.same_pairing(&current.sport_id, current.player1_id, current.player2_id)
            });
            if clash {
                return Err(StorageError::ConstraintViolation(
                    "pending match already exists".to_string(),
                ));
            }
        }

        let record = self
            .working
            .matches
            .get_mut(&match_id)
            .ok_or(StorageError::NotFound)?;
        record.player1_score = edit.player1_score;
        record.player2_score = edit.player2_score;
        record.winner_id = edit.winner_id;
        record.status = edit.status;
        record.updated_at = edit.updated_at;
        Ok(record.clone())
    }

    async fn delete_match(&mut self, match_id: Uuid) -> Result<()> {
        self.working
            .matches
            .remove(&match_id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn pending_for_user(&mut self, user_id: Uuid) -> Result<Vec<MatchRecord>> {
        let mut pending: Vec<MatchRecord> = self
            .working
            .matches
            .values()
            .filter(|m| m.status == MatchStatus::Pending && m.involves(user_id))
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }
}

#[async_trait]
impl RatingStore for MemoryWork {
    async fn lock_rating(
        &mut self,
        user_id: Uuid,
        sport_id: &str,
        default_rating: i32,
    ) -> Result<PlayerRating> {
        let rating = self
            .working
            .ratings
            .entry((user_id, sport_id.to_string()))
            .or_insert_with(|| PlayerRating::initial(user_id, sport_id, default_rating));
        Ok(rating.clone())
    }

    async fn save_rating(&mut self, rating: &PlayerRating) -> Result<()> {
        if self.fail_rating_writes.load(Ordering::SeqCst) {
            return Err(StorageError::ConstraintViolation(
                "rating writes disabled".to_string(),
            ));
        }
        self.working
            .ratings
            .insert((rating.user_id, rating.sport_id.clone()), rating.clone());
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryWork {
    async fn commit(self) -> Result<()> {
        let MemoryWork {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uncommitted_work_is_discarded() {
        let store = MemoryStore::new();
        let user = store.add_user("Ada").await;

        let mut work = store.begin().await.unwrap();
        work.lock_rating(user.id, "table_tennis", 1000).await.unwrap();
        drop(work);
        assert!(store.rating(user.id, "table_tennis").await.is_none());

        let mut work = store.begin().await.unwrap();
        work.lock_rating(user.id, "table_tennis", 1000).await.unwrap();
        work.commit().await.unwrap();
        assert_eq!(
            store.rating(user.id, "table_tennis").await.unwrap().current_elo,
            1000
        );
    }
}
