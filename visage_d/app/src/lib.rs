pub mod control;
pub mod dump;
pub mod pipeline;
pub mod source;
pub mod trackers;

use anyhow::{Context, Result};
use common::FilterConfig;
use log::info;
use std::fs;
use std::path::Path;

/// Reads the daemon config, writing the defaults out first if the file does
/// not exist yet.
pub fn load_config(path: &Path) -> Result<FilterConfig> {
    if path.exists() {
        info!("Loading config from {:?}", path);
        let file = fs::File::open(path).with_context(|| format!("opening {:?}", path))?;
        let reader = std::io::BufReader::new(file);
        let config = serde_json::from_reader(reader)
            .with_context(|| format!("parsing {:?}", path))?;
        Ok(config)
    } else {
        info!("Config not found. Creating default at {:?}", path);
        let config = FilterConfig::default();
        let file = fs::File::create(path).with_context(|| format!("creating {:?}", path))?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ViewMode;
    use tempfile::TempDir;

    #[test]
    fn missing_config_is_written_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let config = load_config(&path).unwrap();
        assert_eq!(config, FilterConfig::default());
        assert!(path.exists());

        let reloaded = load_config(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"mode":"mesh","frame":{"width":320}}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.mode, ViewMode::Mesh);
        assert_eq!(config.frame.width, 320);
        assert_eq!(config.frame.height, 480);
        assert_eq!(config.control.port, 9360);
    }

    #[test]
    fn broken_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_config(&path).is_err());
    }
}
