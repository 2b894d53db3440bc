use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::sorter::SortConfig;

const DEFAULT_TRACKS_PATH: &str = "tracks.json";
const DEFAULT_CONFIG_PATH: &str = "sorter.json";
const DEFAULT_REPORT_PATH: &str = "sorted.json";

/// File locations loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub tracks_path: PathBuf,
    pub config_path: PathBuf,
    pub report_path: PathBuf,
}

/// Load configuration from `.env` and environment
pub fn load_config() -> Config {
    // Load `.env` file if present
    dotenv::dotenv().ok();
    config_from(|name| std::env::var(name).ok())
}

fn config_from(lookup: impl Fn(&str) -> Option<String>) -> Config {
    let path = |name: &str, default: &str| {
        lookup(name)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(default))
    };
    Config {
        tracks_path: path("PLAYLIST_FEATURES", DEFAULT_TRACKS_PATH),
        config_path: path("PLAYLIST_CONFIG", DEFAULT_CONFIG_PATH),
        report_path: path("PLAYLIST_SORTED", DEFAULT_REPORT_PATH),
    }
}

/// Read a sorting configuration from a JSON file. A missing file means
/// defaults with the recommended weights.
pub fn load_sort_config(path: &Path) -> Result<SortConfig> {
    if !path.exists() {
        log::info!(
            "No sorter configuration at {}, using recommended weights",
            path.display()
        );
        return Ok(SortConfig::with_weights(
            crate::sorter::WeightConfig::recommended(),
        ));
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sorter configuration {}", path.display()))?;
    let config: SortConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse sorter configuration {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_paths_default_when_unset_or_blank() {
        let mut env = HashMap::new();
        env.insert("PLAYLIST_SORTED", "  ".to_string());
        env.insert("PLAYLIST_FEATURES", "data/mix.json".to_string());

        let config = config_from(|name| env.get(name).cloned());
        assert_eq!(config.tracks_path, PathBuf::from("data/mix.json"));
        assert_eq!(config.config_path, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(config.report_path, PathBuf::from(DEFAULT_REPORT_PATH));
    }

    #[test]
    fn test_load_sort_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "weights": {{ "tempo": 1.0 }}, "optimizer": {{ "num_particles": 12 }} }}"#
        )
        .unwrap();

        let config = load_sort_config(file.path()).unwrap();
        assert_relative_eq!(config.weights.tempo, 1.0);
        assert_relative_eq!(config.weights.energy, 0.0);
        assert_eq!(config.optimizer.num_particles, 12);
    }

    #[test]
    fn test_missing_config_uses_recommended_weights() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_sort_config(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.weights, crate::sorter::WeightConfig::recommended());
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = load_sort_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
