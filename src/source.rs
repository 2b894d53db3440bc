use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::models::TrackRecord;

/// Anything that can hand over a playlist's tracks in their current order
#[cfg_attr(test, mockall::automock)]
pub trait TrackSource {
    fn load_tracks(&self) -> Result<Vec<TrackRecord>>;

    /// Human-readable origin, for log lines
    fn describe(&self) -> String;
}

/// Reads a JSON array of track records from disk
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TrackSource for JsonFileSource {
    fn load_tracks(&self) -> Result<Vec<TrackRecord>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read tracks from {}", self.path.display()))?;
        let tracks: Vec<TrackRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse tracks in {}", self.path.display()))?;
        Ok(tracks)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Write any serializable value as pretty JSON
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sorter::Feature;
    use approx::assert_relative_eq;

    #[test]
    fn test_reads_tracks_with_loose_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.json");
        std::fs::write(
            &path,
            r#"[
                { "uri": "spotify:track:1", "name": "First", "energy": 0.8, "key": "7", "mode": 1 },
                { "id": "2", "name": "Second", "energy": null, "tempo": "fast" },
                { "id": "3" }
            ]"#,
        )
        .unwrap();

        let tracks = JsonFileSource::new(&path).load_tracks().unwrap();
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0].id, "spotify:track:1");
        assert_relative_eq!(tracks[0].raw(Feature::Key).unwrap().as_number().unwrap(), 7.0);
        assert!(tracks[1].energy.is_none());
        assert!(tracks[1].raw(Feature::Tempo).unwrap().as_number().is_none());
        assert_eq!(tracks[2].name, "Unknown");
    }

    #[test]
    fn test_missing_file_reports_path() {
        let source = JsonFileSource::new("/definitely/not/here.json");
        let err = source.load_tracks().unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn test_write_json_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &vec![1, 2, 3]).unwrap();

        let parsed: Vec<u32> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);
    }
}
