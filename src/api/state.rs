use crate::config::BasslineConfig;
use crate::debug_logs::LogCollector;

#[derive(Clone)]
pub struct AppState {
    pub collector: LogCollector,
}

impl AppState {
    pub fn from_config(config: &BasslineConfig) -> Self {
        Self {
            collector: LogCollector::from_config(&config.debug_logs),
        }
    }
}
