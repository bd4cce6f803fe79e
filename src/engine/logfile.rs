use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use chrono::Local;
use crate::core::QueryError;

/// Persistent session log with size-based rotation
///
/// `<name>` is the active file; backups are `<name>.1` (newest) up to
/// `<name>.<backups>`.
pub struct LogFile {
    path: PathBuf,
    file: Option<File>,
    max_bytes: u64,
    backups: usize,
}

impl LogFile {
    /// Opens (appending) and writes the session-open banner.
    pub fn open(path: PathBuf, max_bytes: u64, backups: usize) -> Result<Self, QueryError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut log = Self {
            file: Some(Self::open_file(&path)?),
            path,
            max_bytes,
            backups,
        };
        log.write("==== session opened ====")?;
        Ok(log)
    }

    fn open_file(path: &Path) -> Result<File, QueryError> {
        Ok(OpenOptions::new().create(true).append(true).open(path)?)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one timestamped entry. Continuation lines are indented.
    pub fn write(&mut self, text: &str) -> Result<(), QueryError> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let mut lines = text.trim_end().lines();
        writeln!(file, "{stamp} {}", lines.next().unwrap_or_default())?;
        for line in lines {
            writeln!(file, "    {line}")?;
        }
        file.flush()?;

        if file.metadata()?.len() >= self.max_bytes {
            self.rotate()?;
        }
        Ok(())
    }

    /// Shifts `<name>.i` to `<name>.i+1`, moves the active file to
    /// `<name>.1` and starts a new one.
    fn rotate(&mut self) -> Result<(), QueryError> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }

        if self.backups == 0 {
            fs::remove_file(&self.path)?;
        } else {
            let oldest = self.backup_path(self.backups);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for i in (1..self.backups).rev() {
                let from = self.backup_path(i);
                if from.exists() {
                    fs::rename(&from, self.backup_path(i + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
        }

        log::debug!("rotated log file {}", self.path.display());
        self.file = Some(Self::open_file(&self.path)?);
        Ok(())
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    /// Writes the session-close banner and releases the handle.
    pub fn close(&mut self) {
        if self.file.is_none() {
            return;
        }
        if let Err(e) = self.write("==== session closed ====") {
            log::warn!("failed to close log file {}: {e}", self.path.display());
        }
        self.file = None;
    }
}

impl Drop for LogFile {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_banners_and_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lq.log");
        {
            let mut log = LogFile::open(path.clone(), 1024 * 1024, 3).unwrap();
            log.write("SELECT 1;\nSELECT 2;").unwrap();
        }
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("session opened ===="));
        assert!(lines[1].ends_with(" SELECT 1;"));
        assert_eq!(lines[2], "    SELECT 2;");
        assert!(lines[3].ends_with("session closed ===="));
    }

    #[test]
    fn test_rotation_keeps_backups() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lq.log");
        let mut log = LogFile::open(path.clone(), 64, 2).unwrap();
        for i in 0..20 {
            log.write(&format!("entry number {i}")).unwrap();
        }
        assert!(path.exists());
        assert!(dir.path().join("lq.log.1").exists());
        assert!(dir.path().join("lq.log.2").exists());
        assert!(!dir.path().join("lq.log.3").exists());
        assert!(fs::metadata(&path).unwrap().len() < 64);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("lq.log");
        let log = LogFile::open(path.clone(), 1024, 1).unwrap();
        assert_eq!(log.path(), path);
        assert!(path.exists());
    }
}
