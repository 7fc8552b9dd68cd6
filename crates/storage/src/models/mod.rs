mod match_record;
mod player_rating;
mod sport;
mod user;

pub use match_record::{MatchEdit, MatchRatings, MatchRecord, MatchStatus, NewMatch, StatusChange};
pub use player_rating::PlayerRating;
pub use sport::SportConfig;
pub use user::User;
