use std::sync::Arc;

use storage::Database;
use storage::services::match_workflow::MatchWorkflow;
use storage::services::sport_registry::SportRegistry;

/// Shared handles every handler can reach.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub workflow: Arc<MatchWorkflow<Database>>,
    pub sports: Arc<SportRegistry>,
}

impl AppState {
    pub fn new(db: Database, sports: Arc<SportRegistry>) -> Self {
        let workflow = Arc::new(MatchWorkflow::new(db.clone(), Arc::clone(&sports)));
        Self {
            db,
            workflow,
            sports,
        }
    }
}
