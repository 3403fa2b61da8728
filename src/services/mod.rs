pub mod ingest;
pub mod insight;
pub mod storage;

use std::sync::Arc;

use insight::{GeminiAnalyzer, ReportAnalyzer};
use storage::{CloudinaryStorage, MediaStorage};

/// Shared outbound clients, handed to handlers as axum state.
///
/// Both collaborators sit behind trait objects so tests can swap in
/// in-memory fakes without touching the HTTP stack.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn MediaStorage>,
    pub analyzer: Arc<dyn ReportAnalyzer>,
}

impl AppState {
    /// Build the production wiring from process configuration.
    ///
    /// Missing credentials are not an error here: the clients report
    /// themselves as unconfigured when first used, so the server can
    /// still boot for auth and CRUD work.
    pub fn from_config() -> Self {
        Self {
            storage: Arc::new(CloudinaryStorage::new()),
            analyzer: Arc::new(GeminiAnalyzer::new()),
        }
    }
}
