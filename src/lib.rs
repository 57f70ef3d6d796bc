pub mod adapters;
pub mod config;
pub mod errors;
pub mod mapping;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use adapters::AdapterRegistry;
use store::{JobStore, PolicyStore, TargetStore};

/// Shared application state passed to all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub targets: TargetStore,
    pub policies: PolicyStore,
    pub jobs: JobStore,
    pub adapters: AdapterRegistry,
}

impl AppState {
    /// Construct the process-wide state: stores are created once here
    /// and shared by every handler and scan job.
    pub fn new(config: config::AppConfig, adapters: AdapterRegistry) -> Self {
        let jobs = JobStore::new(config.max_jobs);
        Self {
            config,
            targets: TargetStore::new(),
            policies: PolicyStore::new(),
            jobs,
            adapters,
        }
    }
}
