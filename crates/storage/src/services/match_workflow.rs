//! Match lifecycle: submit, confirm, deny, cancel, and the admin operations.
//!
//! Every operation runs inside a single unit of work begun here and committed
//! or rolled back here. Input validation runs before the unit of work opens.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::dto::matches::{EditMatchRequest, RevertResponse, SubmitMatchRequest};
use crate::error::StorageError;
use crate::models::{
    MatchEdit, MatchRatings, MatchRecord, MatchStatus, NewMatch, PlayerRating, SportConfig,
    StatusChange, User,
};
use crate::services::elo;
use crate::services::sport_registry::SportRegistry;
use crate::store::{MatchRecordStore, Persistence, RatingStore, UnitOfWork, UserDirectory};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("You cannot report a match against yourself")]
    SelfMatch,

    #[error("Scores cannot be equal, a match must have a winner")]
    TiedScore,

    #[error("Scores must be between {min} and {max}")]
    ScoreOutOfRange { min: i32, max: i32 },

    #[error("Match is not pending")]
    NotPending,

    #[error("Only confirmed matches can be reverted")]
    NotConfirmed,

    #[error("Ratings were already applied for this result, revert the match before changing its winner")]
    RatedWinnerChange,

    #[error("You are not a player in this match")]
    NotParticipant,

    #[error("The submitter cannot confirm or deny their own match")]
    SubmitterCannotRespond,

    #[error("Only the submitter can cancel this match")]
    NotSubmitter,

    #[error("A pending match already exists between these players for this sport")]
    DuplicatePending,

    #[error("Opponent not found")]
    OpponentNotFound,

    #[error("Opponent is banned")]
    OpponentBanned,

    #[error("Your account is banned")]
    ActorBanned,

    #[error("Unknown user")]
    UnknownActor,

    #[error("Admin privileges required")]
    NotAdmin,

    #[error("Match not found")]
    MatchNotFound,

    #[error("Sport not found")]
    SportNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Coarse classification used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Guard,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::SelfMatch | Self::TiedScore | Self::ScoreOutOfRange { .. } => {
                ErrorKind::Validation
            }
            Self::NotPending | Self::NotConfirmed | Self::RatedWinnerChange | Self::OpponentBanned => {
                ErrorKind::Guard
            }
            Self::NotParticipant
            | Self::SubmitterCannotRespond
            | Self::NotSubmitter
            | Self::ActorBanned
            | Self::UnknownActor
            | Self::NotAdmin => ErrorKind::Forbidden,
            Self::MatchNotFound | Self::OpponentNotFound | Self::SportNotFound | Self::UserNotFound => {
                ErrorKind::NotFound
            }
            Self::DuplicatePending => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;

pub struct MatchWorkflow<P: Persistence> {
    store: P,
    sports: Arc<SportRegistry>,
}

impl<P: Persistence> MatchWorkflow<P> {
    pub fn new(store: P, sports: Arc<SportRegistry>) -> Self {
        Self { store, sports }
    }

    pub fn sports(&self) -> &Arc<SportRegistry> {
        &self.sports
    }

    /// Commits on success, rolls back on failure.
    async fn finish<T>(work: P::Work, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => {
                work.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = work.rollback().await {
                    tracing::error!(error = %rollback, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    pub async fn submit(&self, submitter: Uuid, req: &SubmitMatchRequest) -> Result<MatchRecord> {
        if req.opponent_id == submitter {
            return Err(WorkflowError::SelfMatch);
        }
        if !SportConfig::is_valid_id(&req.sport) {
            return Err(WorkflowError::Validation {
                field: "sport",
                message: "Sport must be a lowercase identifier".to_string(),
            });
        }
        if req.player_score < 0 || req.opponent_score < 0 {
            return Err(WorkflowError::Validation {
                field: "score",
                message: "Scores cannot be negative".to_string(),
            });
        }
        if req.player_score == req.opponent_score {
            return Err(WorkflowError::TiedScore);
        }

        let sport = self.active_sport(&req.sport).await?;
        check_score_range(&sport, req.player_score, req.opponent_score)?;

        let new_match = NewMatch {
            sport_id: sport.id,
            player1_id: submitter,
            player2_id: req.opponent_id,
            player1_score: req.player_score,
            player2_score: req.opponent_score,
            winner_id: NewMatch::winner_of(
                submitter,
                req.opponent_id,
                req.player_score,
                req.opponent_score,
            ),
            submitted_by: submitter,
            created_at: Utc::now(),
        };

        let mut work = self.store.begin().await?;
        let outcome = Self::submit_in(&mut work, &new_match).await;
        let record = Self::finish(work, outcome).await?;

        info!(
            match_id = %record.id,
            sport = %record.sport_id,
            submitter = %submitter,
            opponent = %record.player2_id,
            "Match submitted"
        );
        Ok(record)
    }

    async fn submit_in(work: &mut P::Work, new_match: &NewMatch) -> Result<MatchRecord> {
        active_user(work, new_match.submitted_by).await?;

        let opponent = work
            .find_user(new_match.player2_id)
            .await?
            .ok_or(WorkflowError::OpponentNotFound)?;
        if opponent.is_banned {
            return Err(WorkflowError::OpponentBanned);
        }

        if work
            .pending_match_exists(&new_match.sport_id, new_match.player1_id, new_match.player2_id)
            .await?
        {
            return Err(WorkflowError::DuplicatePending);
        }

        work.insert_match(new_match).await.map_err(|e| match e {
            StorageError::ConstraintViolation(_) => WorkflowError::DuplicatePending,
            other => other.into(),
        })
    }

    pub async fn confirm(&self, actor: Uuid, match_id: Uuid) -> Result<MatchRecord> {
        let mut work = self.store.begin().await?;
        let outcome = self.confirm_in(&mut work, actor, match_id).await;
        let record = Self::finish(work, outcome).await?;

        if let Some(ratings) = record.ratings {
            info!(
                match_id = %record.id,
                actor = %actor,
                player1_delta = ratings.player1_elo_delta,
                player2_delta = ratings.player2_elo_delta,
                "Match confirmed"
            );
        }
        Ok(record)
    }

    async fn confirm_in(&self, work: &mut P::Work, actor: Uuid, match_id: Uuid) -> Result<MatchRecord> {
        let record = load_match(work, match_id).await?;
        ensure_transition(&record, MatchStatus::Confirmed)?;
        ensure_responder(&record, actor)?;
        active_user(work, actor).await?;

        let k_factor = self.sports.get_k_factor(&record.sport_id).await;
        let default_rating = self.sports.get_default_rating(&record.sport_id).await;

        let (mut player1, mut player2) = lock_pair(
            work,
            record.player1_id,
            record.player2_id,
            &record.sport_id,
            default_rating,
        )
        .await?;

        let player1_won = record.player1_won();
        let outcome = elo::compute(player1.current_elo, player2.current_elo, player1_won, k_factor);
        let ratings = MatchRatings {
            player1_elo_before: player1.current_elo,
            player1_elo_after: outcome.new_a,
            player1_elo_delta: outcome.delta_a,
            player2_elo_before: player2.current_elo,
            player2_elo_after: outcome.new_b,
            player2_elo_delta: outcome.delta_b,
        };

        let now = Utc::now();
        let confirmed = work
            .transition_match(
                match_id,
                MatchStatus::Pending,
                &StatusChange::Confirmed { at: now, ratings },
            )
            .await?
            .ok_or(WorkflowError::NotPending)?;

        player1.record_result(outcome.new_a, player1_won, now);
        player2.record_result(outcome.new_b, !player1_won, now);
        work.save_rating(&player1).await?;
        work.save_rating(&player2).await?;

        Ok(confirmed)
    }

    pub async fn deny(&self, actor: Uuid, match_id: Uuid) -> Result<MatchRecord> {
        let mut work = self.store.begin().await?;
        let outcome = Self::deny_in(&mut work, actor, match_id).await;
        let record = Self::finish(work, outcome).await?;

        info!(match_id = %record.id, actor = %actor, "Match denied");
        Ok(record)
    }

    async fn deny_in(work: &mut P::Work, actor: Uuid, match_id: Uuid) -> Result<MatchRecord> {
        let record = load_match(work, match_id).await?;
        ensure_transition(&record, MatchStatus::Denied)?;
        ensure_responder(&record, actor)?;
        active_user(work, actor).await?;

        work.transition_match(match_id, MatchStatus::Pending, &StatusChange::Denied { at: Utc::now() })
            .await?
            .ok_or(WorkflowError::NotPending)
    }

    pub async fn cancel(&self, actor: Uuid, match_id: Uuid) -> Result<MatchRecord> {
        let mut work = self.store.begin().await?;
        let outcome = Self::cancel_in(&mut work, actor, match_id).await;
        let record = Self::finish(work, outcome).await?;

        info!(match_id = %record.id, actor = %actor, "Match cancelled");
        Ok(record)
    }

    async fn cancel_in(work: &mut P::Work, actor: Uuid, match_id: Uuid) -> Result<MatchRecord> {
        let record = load_match(work, match_id).await?;
        ensure_transition(&record, MatchStatus::Cancelled)?;
        if record.submitted_by != actor {
            return Err(WorkflowError::NotSubmitter);
        }
        active_user(work, actor).await?;

        work.transition_match(
            match_id,
            MatchStatus::Pending,
            &StatusChange::Cancelled { at: Utc::now() },
        )
        .await?
        .ok_or(WorkflowError::NotPending)
    }

    /// Undoes a confirmed match: both players go back to their stored
    /// pre-match rating, their counters lose the result, and the match is
    /// deleted. `highest_elo` is left as is.
    pub async fn revert(&self, admin: Uuid, match_id: Uuid) -> Result<RevertResponse> {
        let mut work = self.store.begin().await?;
        let outcome = self.revert_in(&mut work, admin, match_id).await;
        let reverted = Self::finish(work, outcome).await?;

        info!(
            target: "audit",
            admin = %admin,
            match_id = %match_id,
            player1 = %reverted.player1_id,
            player1_elo = reverted.player1_restored_elo,
            player2 = %reverted.player2_id,
            player2_elo = reverted.player2_restored_elo,
            "Match reverted"
        );
        Ok(reverted)
    }

    async fn revert_in(&self, work: &mut P::Work, admin: Uuid, match_id: Uuid) -> Result<RevertResponse> {
        admin_user(work, admin).await?;

        let record = work
            .lock_match(match_id)
            .await?
            .ok_or(WorkflowError::MatchNotFound)?;
        ensure_status(&record, MatchStatus::Confirmed, WorkflowError::NotConfirmed)?;
        let ratings = record.ratings.ok_or_else(|| {
            StorageError::Corrupt(format!("confirmed match {match_id} has no rating snapshot"))
        })?;

        let default_rating = self.sports.get_default_rating(&record.sport_id).await;
        let (mut player1, mut player2) = lock_pair(
            work,
            record.player1_id,
            record.player2_id,
            &record.sport_id,
            default_rating,
        )
        .await?;

        let now = Utc::now();
        let player1_won = record.player1_won();
        player1.undo_result(ratings.player1_elo_before, player1_won, now);
        player2.undo_result(ratings.player2_elo_before, !player1_won, now);
        work.save_rating(&player1).await?;
        work.save_rating(&player2).await?;

        work.delete_match(match_id).await.map_err(|e| match e {
            StorageError::NotFound => WorkflowError::MatchNotFound,
            other => other.into(),
        })?;

        Ok(RevertResponse {
            match_id,
            sport: record.sport_id,
            player1_id: player1.user_id,
            player1_restored_elo: player1.current_elo,
            player2_id: player2.user_id,
            player2_restored_elo: player2.current_elo,
        })
    }

    /// Rewrites scores and/or status directly. Ratings are never touched, even
    /// when editing a confirmed match.
    pub async fn edit(&self, admin: Uuid, match_id: Uuid, req: &EditMatchRequest) -> Result<MatchRecord> {
        let mut work = self.store.begin().await?;
        let outcome = self.edit_in(&mut work, admin, match_id, req).await;
        let record = Self::finish(work, outcome).await?;

        info!(
            target: "audit",
            admin = %admin,
            match_id = %record.id,
            status = %record.status,
            player1_score = record.player1_score,
            player2_score = record.player2_score,
            "Match edited"
        );
        Ok(record)
    }

    async fn edit_in(
        &self,
        work: &mut P::Work,
        admin: Uuid,
        match_id: Uuid,
        req: &EditMatchRequest,
    ) -> Result<MatchRecord> {
        admin_user(work, admin).await?;
        let record = load_match(work, match_id).await?;

        let player1_score = req.player1_score.unwrap_or(record.player1_score);
        let player2_score = req.player2_score.unwrap_or(record.player2_score);
        if player1_score != record.player1_score || player2_score != record.player2_score {
            if player1_score < 0 || player2_score < 0 {
                return Err(WorkflowError::Validation {
                    field: "score",
                    message: "Scores cannot be negative".to_string(),
                });
            }
            if player1_score == player2_score {
                return Err(WorkflowError::TiedScore);
            }
            let sport = self.sports.get_sport(&record.sport_id).await.map_err(sport_error)?;
            check_score_range(&sport, player1_score, player2_score)?;
        }

        let winner_id = NewMatch::winner_of(
            record.player1_id,
            record.player2_id,
            player1_score,
            player2_score,
        );
        if record.ratings.is_some() && winner_id != record.winner_id {
            return Err(WorkflowError::RatedWinnerChange);
        }

        let edit = MatchEdit {
            player1_score,
            player2_score,
            winner_id,
            status: req.status.unwrap_or(record.status),
            updated_at: Utc::now(),
        };

        work.rewrite_match(match_id, &edit).await.map_err(|e| match e {
            StorageError::ConstraintViolation(_) => WorkflowError::DuplicatePending,
            StorageError::NotFound => WorkflowError::MatchNotFound,
            other => other.into(),
        })
    }

    pub async fn set_user_banned(&self, admin: Uuid, user_id: Uuid, banned: bool) -> Result<User> {
        let mut work = self.store.begin().await?;
        let outcome = Self::set_user_banned_in(&mut work, admin, user_id, banned).await;
        let user = Self::finish(work, outcome).await?;

        info!(target: "audit", admin = %admin, user = %user_id, banned, "User ban status changed");
        Ok(user)
    }

    async fn set_user_banned_in(work: &mut P::Work, admin: Uuid, user_id: Uuid, banned: bool) -> Result<User> {
        admin_user(work, admin).await?;
        work.set_user_banned(user_id, banned)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => WorkflowError::UserNotFound,
                other => other.into(),
            })
    }

    /// Sets a player's current rating directly; counters are unchanged.
    pub async fn override_rating(
        &self,
        admin: Uuid,
        user_id: Uuid,
        sport_id: &str,
        rating: i32,
    ) -> Result<PlayerRating> {
        if rating < 0 {
            return Err(WorkflowError::Validation {
                field: "rating",
                message: "Rating cannot be negative".to_string(),
            });
        }
        let sport = self.sports.get_sport(sport_id).await.map_err(sport_error)?;

        let mut work = self.store.begin().await?;
        let outcome = Self::override_rating_in(&mut work, admin, user_id, &sport, rating).await;
        let updated = Self::finish(work, outcome).await?;

        info!(
            target: "audit",
            admin = %admin,
            user = %user_id,
            sport = %sport.id,
            rating,
            "Rating overridden"
        );
        Ok(updated)
    }

    async fn override_rating_in(
        work: &mut P::Work,
        admin: Uuid,
        user_id: Uuid,
        sport: &SportConfig,
        rating: i32,
    ) -> Result<PlayerRating> {
        admin_user(work, admin).await?;
        work.find_user(user_id)
            .await?
            .ok_or(WorkflowError::UserNotFound)?;

        let mut current = work.lock_rating(user_id, &sport.id, sport.default_rating).await?;
        current.override_current(rating, Utc::now());
        work.save_rating(&current).await?;
        Ok(current)
    }

    pub async fn get_match(&self, match_id: Uuid) -> Result<MatchRecord> {
        let mut work = self.store.begin().await?;
        let outcome = load_match(&mut work, match_id).await;
        Self::finish(work, outcome).await
    }

    pub async fn pending_for_user(&self, user_id: Uuid) -> Result<Vec<MatchRecord>> {
        let mut work = self.store.begin().await?;
        let outcome = work.pending_for_user(user_id).await.map_err(WorkflowError::from);
        Self::finish(work, outcome).await
    }

    /// Gate for admin actions that do not touch persistence themselves.
    pub async fn require_admin(&self, user_id: Uuid) -> Result<User> {
        let mut work = self.store.begin().await?;
        let outcome = admin_user(&mut work, user_id).await;
        Self::finish(work, outcome).await
    }

    async fn active_sport(&self, sport_id: &str) -> Result<SportConfig> {
        self.sports.get_active_sport(sport_id).await.map_err(sport_error)
    }
}

fn sport_error(e: StorageError) -> WorkflowError {
    match e {
        StorageError::NotFound => WorkflowError::SportNotFound,
        other => other.into(),
    }
}

fn check_score_range(sport: &SportConfig, a: i32, b: i32) -> Result<()> {
    if sport.score_in_range(a) && sport.score_in_range(b) {
        Ok(())
    } else {
        Err(WorkflowError::ScoreOutOfRange {
            min: sport.min_score,
            max: sport.max_score,
        })
    }
}

/// Player-driven transitions only leave `pending`.
fn ensure_transition(record: &MatchRecord, to: MatchStatus) -> Result<()> {
    if record.status.next_states().contains(&to) {
        Ok(())
    } else {
        Err(WorkflowError::NotPending)
    }
}

fn ensure_status(record: &MatchRecord, expected: MatchStatus, error: WorkflowError) -> Result<()> {
    if record.status == expected {
        Ok(())
    } else {
        Err(error)
    }
}

/// Confirm and deny belong to the player who did not submit.
fn ensure_responder(record: &MatchRecord, actor: Uuid) -> Result<()> {
    if !record.involves(actor) {
        return Err(WorkflowError::NotParticipant);
    }
    if record.submitted_by == actor {
        return Err(WorkflowError::SubmitterCannotRespond);
    }
    Ok(())
}

async fn load_match<W: UnitOfWork>(work: &mut W, match_id: Uuid) -> Result<MatchRecord> {
    work.find_match(match_id)
        .await?
        .ok_or(WorkflowError::MatchNotFound)
}

async fn active_user<W: UnitOfWork>(work: &mut W, user_id: Uuid) -> Result<User> {
    let user = work
        .find_user(user_id)
        .await?
        .ok_or(WorkflowError::UnknownActor)?;
    if user.is_banned {
        return Err(WorkflowError::ActorBanned);
    }
    Ok(user)
}

async fn admin_user<W: UnitOfWork>(work: &mut W, user_id: Uuid) -> Result<User> {
    let user = work
        .find_user(user_id)
        .await?
        .ok_or(WorkflowError::UnknownActor)?;
    if !user.is_admin {
        return Err(WorkflowError::NotAdmin);
    }
    Ok(user)
}

/// Locks both rating rows in ascending user-id order so that two transactions
/// touching the same pair cannot deadlock.
async fn lock_pair<W: UnitOfWork>(
    work: &mut W,
    player1: Uuid,
    player2: Uuid,
    sport_id: &str,
    default_rating: i32,
) -> Result<(PlayerRating, PlayerRating)> {
    if player1 < player2 {
        let first = work.lock_rating(player1, sport_id, default_rating).await?;
        let second = work.lock_rating(player2, sport_id, default_rating).await?;
        Ok((first, second))
    } else {
        let second = work.lock_rating(player2, sport_id, default_rating).await?;
        let first = work.lock_rating(player1, sport_id, default_rating).await?;
        Ok((first, second))
    }
}
