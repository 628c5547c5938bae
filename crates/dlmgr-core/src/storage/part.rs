//! Per-segment part file writer.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::EngineError;

/// Sequential writer for a single segment's `.part<index>` file.
///
/// Fresh segments start at offset 0; resumed segments reopen the existing
/// part file and seek to its current length, so the caller only ever needs
/// to know how many bytes are already on disk (the file's own size), not
/// track a separate write cursor across restarts.
pub struct PartFileWriter {
    file: File,
}

impl PartFileWriter {
    /// Creates a new, empty part file, truncating any previous content.
    pub fn create_fresh(final_path: &Path, index: usize) -> Result<Self, EngineError> {
        let path = super::part_path(final_path, index);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        Ok(Self { file })
    }

    /// Opens an existing part file for appending, positioned at end-of-file.
    /// Returns the number of bytes already present.
    pub fn open_for_append(final_path: &Path, index: usize) -> Result<(Self, u64), EngineError> {
        let path = super::part_path(final_path, index);
        let mut file = OpenOptions::new().write(true).open(&path)?;
        let len = file.seek(SeekFrom::End(0))?;
        Ok((Self { file }, len))
    }

    /// Writes `buf` at the current position (sequential append).
    pub fn write(&mut self, buf: &[u8]) -> Result<(), EngineError> {
        self.file.write_all(buf)?;
        Ok(())
    }

    pub fn sync(&self) -> Result<(), EngineError> {
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_fresh_then_write() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("out.bin");
        let mut w = PartFileWriter::create_fresh(&final_path, 0).unwrap();
        w.write(b"hello").unwrap();
        w.sync().unwrap();
        let len = std::fs::metadata(super::super::part_path(&final_path, 0))
            .unwrap()
            .len();
        assert_eq!(len, 5);
    }

    #[test]
    fn open_for_append_resumes_at_existing_length() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("out.bin");
        {
            let mut w = PartFileWriter::create_fresh(&final_path, 1).unwrap();
            w.write(b"abc").unwrap();
        }
        let (mut w, existing) = PartFileWriter::open_for_append(&final_path, 1).unwrap();
        assert_eq!(existing, 3);
        w.write(b"def").unwrap();
        let len = std::fs::metadata(super::super::part_path(&final_path, 1))
            .unwrap()
            .len();
        assert_eq!(len, 6);
    }
}
