// Shared fixtures for integration tests
#![allow(dead_code)]

use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};
use logquery::{Engine, EngineConfig, QueryError};
use tempfile::TempDir;

pub fn engine(dir: &TempDir) -> Engine {
    Engine::new(&EngineConfig {
        current_directory: Some(dir.path().to_path_buf()),
        heading: "off".into(),
        ..EngineConfig::default()
    })
    .unwrap()
}

/// Runs a batch and returns the output lines.
pub fn query(engine: &mut Engine, text: &str) -> Result<Vec<String>, QueryError> {
    let mut out: Vec<String> = Vec::new();
    engine.execute(text, &mut out)?;
    Ok(out)
}

/// Writes `content` and backdates the file by `age_minutes`.
pub fn write_file(dir: &Path, name: &str, content: &str, age_minutes: u64) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    let file = File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(age_minutes * 60))
        .unwrap();
}
