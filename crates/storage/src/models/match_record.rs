use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle state of a reported match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "match_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Confirmed,
    Denied,
    Cancelled,
    Disputed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Denied => "denied",
            Self::Cancelled => "cancelled",
            Self::Disputed => "disputed",
        }
    }

    /// States reachable from `self` through the non-administrative operations.
    pub fn next_states(&self) -> &'static [MatchStatus] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Denied, Self::Cancelled],
            Self::Confirmed | Self::Denied | Self::Cancelled | Self::Disputed => &[],
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rating snapshot written onto a match when it is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MatchRatings {
    pub player1_elo_before: i32,
    pub player1_elo_after: i32,
    pub player1_elo_delta: i32,
    pub player2_elo_before: i32,
    pub player2_elo_after: i32,
    pub player2_elo_delta: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub id: Uuid,
    pub sport_id: String,
    pub player1_id: Uuid,
    pub player2_id: Uuid,
    pub player1_score: i32,
    pub player2_score: i32,
    pub winner_id: Uuid,
    pub status: MatchStatus,
    pub submitted_by: Uuid,
    pub ratings: Option<MatchRatings>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub denied_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl MatchRecord {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.player1_id == user_id || self.player2_id == user_id
    }

    pub fn player1_won(&self) -> bool {
        self.winner_id == self.player1_id
    }

    /// True when both matches are between the same two players, in either order.
    pub fn same_pairing(&self, sport_id: &str, a: Uuid, b: Uuid) -> bool {
        self.sport_id == sport_id
            && ((self.player1_id == a && self.player2_id == b)
                || (self.player1_id == b && self.player2_id == a))
    }
}

/// A validated submission, ready to be inserted as `pending`.
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub sport_id: String,
    pub player1_id: Uuid,
    pub player2_id: Uuid,
    pub player1_score: i32,
    pub player2_score: i32,
    pub winner_id: Uuid,
    pub submitted_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl NewMatch {
    /// Winner is whoever scored more; callers reject ties beforehand.
    pub fn winner_of(player1_id: Uuid, player2_id: Uuid, player1_score: i32, player2_score: i32) -> Uuid {
        if player1_score > player2_score {
            player1_id
        } else {
            player2_id
        }
    }
}

/// Transition out of `pending`.
#[derive(Debug, Clone, Copy)]
pub enum StatusChange {
    Confirmed {
        at: DateTime<Utc>,
        ratings: MatchRatings,
    },
    Denied {
        at: DateTime<Utc>,
    },
    Cancelled {
        at: DateTime<Utc>,
    },
}

impl StatusChange {
    pub fn status(&self) -> MatchStatus {
        match self {
            Self::Confirmed { .. } => MatchStatus::Confirmed,
            Self::Denied { .. } => MatchStatus::Denied,
            Self::Cancelled { .. } => MatchStatus::Cancelled,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Confirmed { at, .. } | Self::Denied { at } | Self::Cancelled { at } => *at,
        }
    }
}

/// Fully resolved administrative rewrite of a match.
#[derive(Debug, Clone)]
pub struct MatchEdit {
    pub player1_score: i32,
    pub player2_score: i32,
    pub winner_id: Uuid,
    pub status: MatchStatus,
    pub updated_at: DateTime<Utc>,
}
