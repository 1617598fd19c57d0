//! Recording storage - one JSON file per recording

use crate::events::Recording;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

pub struct RecordingStore {
    dir: PathBuf,
}

impl RecordingStore {
    pub fn new() -> Result<Self> {
        let home = std::env::var("HOME").context("HOME not set")?;
        let dir = PathBuf::from(home).join(".uireplay");
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn with_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn save(&self, recording: &Recording) -> Result<PathBuf> {
        let ts = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!("rec_{}_{}.json", recording.id, ts);
        let path = self.dir.join(&filename);

        let file = File::create(&path)?;
        let mut w = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut w, recording)?;

        Ok(path)
    }

    pub fn load(&self, filename: &str) -> Result<Recording> {
        let path = self.dir.join(filename);
        let file = File::open(&path).with_context(|| format!("open {}", path.display()))?;
        let recording = serde_json::from_reader(BufReader::new(file))?;
        Ok(recording)
    }

    pub fn list(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(s) = name.to_str() {
                if s.ends_with(".json") {
                    files.push(s.to_string());
                }
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn delete(&self, filename: &str) -> Result<()> {
        let path = self.dir.join(filename);
        fs::remove_file(path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventData, InteractionEvent, Quadrant};

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordingStore::with_dir(dir.path()).unwrap();

        let recording = Recording::new(
            vec![InteractionEvent {
                t: 7,
                target: None,
                path: Some("//*[@id=\"go\"]".to_string()),
                data: EventData::PointerDown { x: 3.0, y: 4.0, quadrant: Quadrant::TopLeft },
            }],
            Vec::new(),
        );

        let path = store.save(&recording).unwrap();
        let filename = path.file_name().unwrap().to_str().unwrap();
        let loaded = store.load(filename).unwrap();
        assert_eq!(loaded.id, recording.id);
        assert_eq!(loaded.events, recording.events);

        assert_eq!(store.list().unwrap(), vec![filename.to_string()]);
        store.delete(filename).unwrap();
        assert!(store.list().unwrap().is_empty());
    }
}
