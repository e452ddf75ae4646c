use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Receives finished export files.
pub trait FileSink: Send + Sync {
    fn deliver(&self, content: &str, mime_type: &str, filename: &str) -> io::Result<()>;
}

/// Writes every delivered file into one directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSink for DirectorySink {
    fn deliver(&self, content: &str, mime_type: &str, filename: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        std::fs::write(&path, content)?;
        debug!(path = %path.display(), mime_type, bytes = content.len(), "Wrote export file");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredFile {
    pub filename: String,
    pub mime_type: String,
    pub content: String,
}

/// Keeps delivered files in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<DeliveredFile>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> Vec<DeliveredFile> {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn get(&self, filename: &str) -> Option<DeliveredFile> {
        self.files().into_iter().find(|f| f.filename == filename)
    }
}

impl FileSink for MemorySink {
    fn deliver(&self, content: &str, mime_type: &str, filename: &str) -> io::Result<()> {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(DeliveredFile {
                filename: filename.to_string(),
                mime_type: mime_type.to_string(),
                content: content.to_string(),
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_sink_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(tmp.path().join("nested").join("exports"));
        sink.deliver("{}", "application/json", "out.json").unwrap();

        let written = std::fs::read_to_string(sink.dir().join("out.json")).unwrap();
        assert_eq!(written, "{}");
    }

    #[test]
    fn test_memory_sink_records_order() {
        let sink = MemorySink::new();
        sink.deliver("a", "text/csv", "a.csv").unwrap();
        sink.deliver("b", "text/csv", "b.csv").unwrap();

        let names: Vec<_> = sink.files().into_iter().map(|f| f.filename).collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
        assert_eq!(sink.get("b.csv").unwrap().content, "b");
        assert!(sink.get("c.csv").is_none());
    }
}
