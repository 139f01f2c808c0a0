//! Destinations for forensics dumps.

use crate::error::{SimError, SimResult};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Receives rendered dumps. Returns where the dump went.
pub trait ForensicsSink: Send {
    fn write_dump(&mut self, file_name: &str, contents: &str) -> SimResult<String>;
}

/// Writes each dump to its own CSV file under a directory.
#[derive(Clone, Debug)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

impl ForensicsSink for FileSink {
    fn write_dump(&mut self, file_name: &str, contents: &str) -> SimResult<String> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, contents)?;
        Ok(path.display().to_string())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoredDump {
    pub file_name: String,
    pub contents: String,
}

/// Keeps dumps in memory; `dumps()` hands out a shared view.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    dumps: Arc<Mutex<Vec<StoredDump>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that sees every dump written through this sink or its clones.
    pub fn handle(&self) -> MemoryDumps {
        MemoryDumps {
            dumps: Arc::clone(&self.dumps),
        }
    }
}

impl ForensicsSink for MemorySink {
    fn write_dump(&mut self, file_name: &str, contents: &str) -> SimResult<String> {
        let mut dumps = self.dumps.lock().map_err(|_| SimError::Forensics {
            message: "memory sink lock poisoned".to_string(),
        })?;
        dumps.push(StoredDump {
            file_name: file_name.to_string(),
            contents: contents.to_string(),
        });
        Ok(format!("memory:{file_name}"))
    }
}

#[derive(Clone, Debug)]
pub struct MemoryDumps {
    dumps: Arc<Mutex<Vec<StoredDump>>>,
}

impl MemoryDumps {
    pub fn len(&self) -> usize {
        self.dumps.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all(&self) -> Vec<StoredDump> {
        self.dumps.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_handle_sees_writes() {
        let mut sink = MemorySink::new();
        let handle = sink.handle();
        assert!(handle.is_empty());
        let where_to = sink.write_dump("a.csv", "x\n").unwrap();
        assert_eq!(where_to, "memory:a.csv");
        assert_eq!(handle.len(), 1);
        assert_eq!(handle.all()[0].contents, "x\n");
    }

    #[test]
    fn file_sink_writes_into_directory() {
        let dir = std::env::temp_dir().join(format!("pw_forensics_sink_{}", uuid::Uuid::new_v4()));
        let mut sink = FileSink::new(&dir);
        let path = sink.write_dump("dump.csv", "a,b\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b\n");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
