use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::rubric::RubricStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// External text-generation boundary. Production wires `LlmClient`;
    /// tests swap in scripted fakes.
    pub llm: Arc<dyn TextGenerator>,
    pub rubric: Arc<RubricStore>,
    pub config: Config,
}
