//! Finalization: concatenate part files into the final file.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::Path;

use crate::error::EngineError;

/// Concatenates `segment_count` part files, in index order, into
/// `<final_path>.tmp`, fsyncs it, renames it onto `final_path`, then removes
/// the now-redundant part files. `final_path`'s parent directory is fsynced
/// afterward so the rename itself is durable.
pub fn merge_parts(final_path: &Path, segment_count: usize) -> Result<(), EngineError> {
    let tmp = super::tmp_path(final_path);
    {
        let mut out = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;
        let mut buf = [0u8; 64 * 1024];
        for index in 0..segment_count {
            let part = super::part_path(final_path, index);
            let mut reader = BufReader::new(File::open(&part)?);
            loop {
                let n = reader.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                out.write_all(&buf[..n])?;
            }
        }
        out.sync_all()?;
    }

    fs::rename(&tmp, final_path)?;
    if let Some(parent) = final_path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    for index in 0..segment_count {
        let _ = fs::remove_file(super::part_path(final_path, index));
    }
    Ok(())
}

/// Removes any part files and the scratch `.tmp` file for `final_path`. Used
/// when a task is cancelled or permanently failed so partial downloads don't
/// accumulate on disk.
pub fn cleanup_parts(final_path: &Path, segment_count: usize) {
    for index in 0..segment_count {
        let _ = fs::remove_file(super::part_path(final_path, index));
    }
    let _ = fs::remove_file(super::tmp_path(final_path));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PartFileWriter;

    #[test]
    fn merge_concatenates_in_order_and_renames() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("out.bin");

        let mut w0 = PartFileWriter::create_fresh(&final_path, 0).unwrap();
        w0.write(b"AAA").unwrap();
        let mut w1 = PartFileWriter::create_fresh(&final_path, 1).unwrap();
        w1.write(b"BBB").unwrap();

        merge_parts(&final_path, 2).unwrap();

        let contents = fs::read(&final_path).unwrap();
        assert_eq!(contents, b"AAABBB");
        assert!(!super::super::part_path(&final_path, 0).exists());
        assert!(!super::super::part_path(&final_path, 1).exists());
        assert!(!super::super::tmp_path(&final_path).exists());
    }

    #[test]
    fn cleanup_removes_parts_and_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("out.bin");
        let mut w0 = PartFileWriter::create_fresh(&final_path, 0).unwrap();
        w0.write(b"x").unwrap();
        fs::write(super::super::tmp_path(&final_path), b"scratch").unwrap();

        cleanup_parts(&final_path, 1);

        assert!(!super::super::part_path(&final_path, 0).exists());
        assert!(!super::super::tmp_path(&final_path).exists());
    }
}
