//! URL modeling and filename derivation.
//!
//! Derives safe local filenames from URL path or Content-Disposition header,
//! sanitized for Linux filesystems.

mod content_disposition;
mod path;
mod sanitize;

pub use content_disposition::parse_content_disposition_filename;
pub use path::filename_from_url_path;
pub use sanitize::sanitize_filename_for_linux;

use std::time::{SystemTime, UNIX_EPOCH};

/// Derives a safe filename for saving a download.
///
/// Prefers the filename from `content_disposition` (if present and parseable),
/// otherwise uses the last path segment of `url`. If neither yields a name
/// with a file extension, falls back to a synthetic `download_<epoch_seconds>`
/// name. The result is sanitized for Linux (no `/`, NUL, or control chars; no
/// leading/trailing dots or spaces; reserved names like "." or ".." replaced).
///
/// # Examples
///
/// - `derive_filename("https://example.com/archive.zip", None)` → `"archive.zip"`
/// - `derive_filename("https://example.com/", Some("attachment; filename=\"report.pdf\""))` → `"report.pdf"`
pub fn derive_filename(url: &str, content_disposition: Option<&str>) -> String {
    let candidate = content_disposition
        .and_then(parse_content_disposition_filename)
        .filter(|s| !s.is_empty())
        .or_else(|| filename_from_url_path(url));

    let sanitized = candidate.map(|raw| sanitize_filename_for_linux(&raw));

    match sanitized {
        Some(s) if !s.is_empty() && s != "." && s != ".." && has_extension(&s) => s,
        _ => synthetic_filename(),
    }
}

fn has_extension(name: &str) -> bool {
    match name.rfind('.') {
        Some(0) => false, // dotfile, e.g. ".bashrc": no real extension
        Some(i) => i < name.len() - 1,
        None => false,
    }
}

fn synthetic_filename() -> String {
    let epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("download_{epoch}")
}

/// Appends `_1`, `_2`, ... before the extension until `dir/filename` names a
/// path that doesn't already exist on disk.
pub fn unique_final_path(dir: &std::path::Path, filename: &str) -> std::path::PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let path = std::path::Path::new(filename);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(filename);
    let ext = path.extension().and_then(|s| s.to_str());

    let mut n = 1u32;
    loop {
        let name = match ext {
            Some(ext) => format!("{stem}_{n}.{ext}"),
            None => format!("{stem}_{n}"),
        };
        let candidate = dir.join(&name);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_filename_from_url_path() {
        assert_eq!(
            derive_filename("https://example.com/archive.zip", None),
            "archive.zip"
        );
        assert_eq!(
            derive_filename("https://cdn.example.com/path/to/debian-12.iso", None),
            "debian-12.iso"
        );
    }

    #[test]
    fn derive_filename_from_content_disposition() {
        assert_eq!(
            derive_filename(
                "https://example.com/",
                Some("attachment; filename=\"report.pdf\"")
            ),
            "report.pdf"
        );
        assert_eq!(
            derive_filename(
                "https://example.com/x",
                Some("attachment; filename=simple.bin")
            ),
            "simple.bin"
        );
    }

    #[test]
    fn derive_filename_content_disposition_overrides_url() {
        assert_eq!(
            derive_filename(
                "https://example.com/archive.zip",
                Some("attachment; filename=\"real-name.tar.gz\"")
            ),
            "real-name.tar.gz"
        );
    }

    #[test]
    fn derive_filename_empty_url_path_falls_back_to_synthetic() {
        let name = derive_filename("https://example.com/", None);
        assert!(name.starts_with("download_"));
        let name2 = derive_filename("https://example.com", None);
        assert!(name2.starts_with("download_"));
    }

    #[test]
    fn derive_filename_reserved_names_fall_back_to_synthetic() {
        assert!(derive_filename("https://example.com/.", None).starts_with("download_"));
        assert!(derive_filename("https://example.com/..", None).starts_with("download_"));
    }

    #[test]
    fn derive_filename_extensionless_falls_back_to_synthetic() {
        let name = derive_filename("https://example.com/README", None);
        assert!(name.starts_with("download_"));
    }

    #[test]
    fn unique_final_path_no_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let p = unique_final_path(dir.path(), "file.iso");
        assert_eq!(p, dir.path().join("file.iso"));
    }

    #[test]
    fn unique_final_path_suffixes_on_conflict() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file.iso"), b"x").unwrap();
        let p = unique_final_path(dir.path(), "file.iso");
        assert_eq!(p, dir.path().join("file_1.iso"));
    }
}
