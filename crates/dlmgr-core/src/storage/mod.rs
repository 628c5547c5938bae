//! Disk I/O and file lifecycle.
//!
//! Each segment writes to its own `<final_path>.part<index>` file so that the
//! file's size alone is the resume evidence (strategy B): a crash-restarted
//! fetcher never has to guess which bytes of a shared file are valid. The
//! Task Runner concatenates part files into `<final_path>.tmp` and renames
//! atomically on success.

mod merge;
mod part;

pub use merge::{cleanup_parts, merge_parts};
pub use part::PartFileWriter;

use std::path::{Path, PathBuf};

/// Path of the part file for segment `index` of `final_path`.
pub fn part_path(final_path: &Path, index: usize) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(format!(".part{index}"));
    PathBuf::from(o)
}

/// Path of the merge scratch file, promoted to `final_path` on success.
pub fn tmp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(".tmp");
    PathBuf::from(o)
}

/// Size on disk of an existing part file, or `None` if it doesn't exist.
pub fn existing_part_len(final_path: &Path, index: usize) -> Option<u64> {
    std::fs::metadata(part_path(final_path, index))
        .ok()
        .map(|m| m.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_path_naming() {
        assert_eq!(
            part_path(Path::new("/tmp/file.iso"), 2).to_string_lossy(),
            "/tmp/file.iso.part2"
        );
    }

    #[test]
    fn tmp_path_naming() {
        assert_eq!(
            tmp_path(Path::new("/tmp/file.iso")).to_string_lossy(),
            "/tmp/file.iso.tmp"
        );
    }

    #[test]
    fn existing_part_len_none_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("out.bin");
        assert_eq!(existing_part_len(&final_path, 0), None);
    }
}
