use std::sync::Arc;

use crate::application::ports::SessionVerifier;
use crate::application::services::{JobCoordinator, ProviderRegistry};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<JobCoordinator>,
    pub registry: Arc<ProviderRegistry>,
    pub sessions: Arc<dyn SessionVerifier>,
}
