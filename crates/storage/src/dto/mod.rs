pub mod admin;
pub mod common;
pub mod leaderboard;
pub mod matches;
