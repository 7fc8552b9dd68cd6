pub mod elo;
pub mod match_workflow;
pub mod sport_registry;
