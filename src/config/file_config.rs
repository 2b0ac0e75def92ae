use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub service_name: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub seed_file: Option<String>,

    // Feature configs
    pub search: Option<SearchConfig>,
    pub dispatch: Option<DispatchConfig>,
    pub streaming: Option<StreamingConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Search backend to use: "memory" or "noop"
    pub engine: Option<String>,
    pub default_limit: Option<usize>,
    pub max_limit: Option<usize>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct DispatchConfig {
    pub max_in_flight: Option<usize>,
    pub max_queue_depth: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct StreamingConfig {
    pub tick_interval_ms: Option<u64>,
    pub keep_alive_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_nested_tables() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
port = 4000
logging_level = "headers"

[search]
engine = "noop"
max_limit = 50

[dispatch]
max_in_flight = 4

[streaming]
tick_interval_ms = 250
"#
        )
        .unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.port, Some(4000));
        assert_eq!(config.logging_level.as_deref(), Some("headers"));
        let search = config.search.unwrap();
        assert_eq!(search.engine.as_deref(), Some("noop"));
        assert_eq!(search.max_limit, Some(50));
        assert_eq!(search.default_limit, None);
        assert_eq!(config.dispatch.unwrap().max_in_flight, Some(4));
        assert_eq!(config.streaming.unwrap().tick_interval_ms, Some(250));
        assert!(config.metrics_port.is_none());
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert!(config.port.is_none());
        assert!(config.search.is_none());
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = [not toml").unwrap();
        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = FileConfig::load(Path::new("/nonexistent/doc-indexer.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
