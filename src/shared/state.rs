use std::sync::Arc;

use crate::config::AppConfig;
use crate::incidents::service::IncidentService;

pub struct AppState {
    pub config: AppConfig,
    pub incidents: Arc<IncidentService>,
}

impl AppState {
    pub fn new(config: AppConfig, incidents: Arc<IncidentService>) -> Self {
        Self { config, incidents }
    }
}
