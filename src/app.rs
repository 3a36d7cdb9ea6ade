use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::simulation::TelemetryGenerator;

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub generator: Arc<TelemetryGenerator>,
}

impl AppState {
    pub fn new(cfg: Config) -> Result<Self> {
        let generator = TelemetryGenerator::new(&cfg.generator.noise)?;
        Ok(Self {
            cfg: Arc::new(cfg),
            generator: Arc::new(generator),
        })
    }

    /// Longest accepted request span
    pub fn max_range(&self) -> chrono::Duration {
        chrono::Duration::days(self.cfg.generator.max_range_days as i64)
    }
}
