//! Blob sink abstraction
//!
//! The Writer hands finished block bytes to a `BlobSink` keyed by a
//! root-relative path. Local disk is the standard implementation; FTP,
//! Dropbox or HTTP uploaders implement the same trait so transport stays
//! decoupled from block/segment bookkeeping.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Destination for finished block bytes.
///
/// `path` is root-relative with `/` separators, e.g.
/// `mysource/1465445600000.zip`.
pub trait BlobSink: Send {
    /// Write `bytes` at `path`, creating parent folders as needed.
    fn write(&self, path: &str, bytes: &[u8]) -> io::Result<()>;

    /// Whether old blocks can be deleted through this sink's storage.
    /// Ring-buffer trim is refused at configure time when false.
    fn supports_trim(&self) -> bool {
        false
    }
}

/// Local-filesystem sink rooted at a data directory
pub struct LocalSink {
    root: PathBuf,
}

impl LocalSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BlobSink for LocalSink {
    fn write(&self, path: &str, bytes: &[u8]) -> io::Result<()> {
        let dest = self.root.join(path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, bytes)
    }

    fn supports_trim(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_local_sink_writes_nested_path() {
        let dir = tempdir().unwrap();
        let sink = LocalSink::new(dir.path());

        sink.write("src/1000.zip", b"payload").unwrap();

        let written = fs::read(dir.path().join("src").join("1000.zip")).unwrap();
        assert_eq!(written, b"payload");
        assert!(sink.supports_trim());
    }
}
