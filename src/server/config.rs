use std::time::Duration;

use super::RequestsLoggingLevel;
use crate::config::StreamingSettings;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    pub streaming: StreamingSettings,
}

impl ServerConfig {
    pub fn keep_alive(&self) -> Duration {
        self.streaming.keep_alive
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            metrics_port: 9091,
            streaming: StreamingSettings::default(),
        }
    }
}
