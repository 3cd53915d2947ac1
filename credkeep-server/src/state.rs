use credkeep_core::BackupService;
use std::sync::Arc;

pub struct AppState {
    pub service: Arc<BackupService>,
}

impl AppState {
    pub fn new(service: Arc<BackupService>) -> Self {
        Self { service }
    }
}
