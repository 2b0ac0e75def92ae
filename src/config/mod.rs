mod file_config;

pub use file_config::{DispatchConfig, FileConfig, SearchConfig, StreamingConfig};

use crate::search::SearchEngine;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SERVICE_NAME: &str = "doc-indexer";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub seed_file: Option<PathBuf>,
    pub search_engine: SearchEngine,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub service_name: String,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub seed_file: Option<PathBuf>,

    // Feature configs (with defaults)
    pub search: SearchSettings,
    pub dispatch: DispatchSettings,
    pub streaming: StreamingSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let service_name = file
            .service_name
            .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string());
        if service_name.trim().is_empty() {
            bail!("service_name must not be empty");
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port != 0 && port == metrics_port {
            bail!("port and metrics_port must differ (both are {})", port);
        }

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let seed_file = file
            .seed_file
            .map(PathBuf::from)
            .or_else(|| cli.seed_file.clone());
        if let Some(path) = &seed_file {
            if !path.is_file() {
                bail!("Seed file does not exist: {:?}", path);
            }
        }

        let search_file = file.search.unwrap_or_default();
        let engine = match search_file.engine {
            Some(name) => match SearchEngine::from_str(&name, true) {
                Ok(engine) => engine,
                Err(_) => bail!("Unknown search engine: {}", name),
            },
            None => cli.search_engine,
        };
        let defaults = SearchSettings::default();
        let search = SearchSettings {
            engine,
            default_limit: search_file.default_limit.unwrap_or(defaults.default_limit),
            max_limit: search_file.max_limit.unwrap_or(defaults.max_limit),
            timeout: search_file
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
        };
        if search.default_limit == 0 || search.max_limit == 0 {
            bail!("search limits must be greater than zero");
        }
        if search.default_limit > search.max_limit {
            bail!(
                "search.default_limit ({}) exceeds search.max_limit ({})",
                search.default_limit,
                search.max_limit
            );
        }
        if search.timeout.is_zero() {
            bail!("search.timeout_ms must be greater than zero");
        }

        let dispatch_file = file.dispatch.unwrap_or_default();
        let defaults = DispatchSettings::default();
        let dispatch = DispatchSettings {
            max_in_flight: dispatch_file
                .max_in_flight
                .unwrap_or(defaults.max_in_flight),
            max_queue_depth: dispatch_file
                .max_queue_depth
                .unwrap_or(defaults.max_queue_depth),
        };
        if dispatch.max_in_flight == 0 {
            bail!("dispatch.max_in_flight must be greater than zero");
        }

        let streaming_file = file.streaming.unwrap_or_default();
        let defaults = StreamingSettings::default();
        let streaming = StreamingSettings {
            tick_interval: streaming_file
                .tick_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            keep_alive: streaming_file
                .keep_alive_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.keep_alive),
        };
        if streaming.tick_interval.is_zero() {
            bail!("streaming.tick_interval_ms must be greater than zero");
        }
        if streaming.keep_alive.is_zero() {
            bail!("streaming.keep_alive_secs must be greater than zero");
        }

        Ok(Self {
            service_name,
            port,
            metrics_port,
            logging_level,
            seed_file,
            search,
            dispatch,
            streaming,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub engine: SearchEngine,
    pub default_limit: usize,
    pub max_limit: usize,
    pub timeout: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            engine: SearchEngine::default(),
            default_limit: 10,
            max_limit: 100,
            timeout: Duration::from_millis(5000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Batch members allowed to execute at the same time.
    pub max_in_flight: usize,
    /// Batch members allowed to wait for a slot before being rejected.
    pub max_queue_depth: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_in_flight: 16,
            max_queue_depth: 256,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StreamingSettings {
    pub tick_interval: Duration,
    pub keep_alive: Duration,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
            keep_alive: Duration::from_secs(15),
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
