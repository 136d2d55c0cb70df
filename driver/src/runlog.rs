use anyhow::{Context, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Flat append-only run log. Every entry is echoed to stdout and
/// appended with a timestamp; no rotation, no size bound.
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn log(&self, message: &str) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let entry = format!("{} - {}", timestamp, message);
        println!("{}", entry);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open run log {}", self.path.display()))?;
        writeln!(file, "{}", entry)
            .with_context(|| format!("failed to append to run log {}", self.path.display()))?;
        Ok(())
    }
}
