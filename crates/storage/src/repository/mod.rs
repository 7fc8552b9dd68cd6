pub mod leaderboard;
pub mod matches;
pub mod ratings;
pub mod sports;
pub mod unit_of_work;
pub mod users;
