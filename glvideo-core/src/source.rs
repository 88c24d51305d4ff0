//! Source descriptor resolution
//!
//! Hosts hand [`SessionFactory::open`](crate::SessionFactory::open) an
//! already-resolved descriptor. This helper performs the usual resolution:
//! URIs pass through, bare file names are looked up in the data directory
//! first and the current directory second.

use std::path::{Path, PathBuf};

/// Separator that marks a descriptor as a network URI
const SCHEME_SEPARATOR: &str = "://";

/// Resolves a file name or URI into a descriptor the backend can open.
///
/// If the file cannot be found anywhere the input is returned unchanged and
/// the backend gets to report it as unreadable.
pub fn resolve_source(raw: &str, data_dir: Option<&Path>) -> String {
    if raw.is_empty() || raw.contains(SCHEME_SEPARATOR) {
        return raw.to_string();
    }

    let candidates = data_dir
        .map(|dir| dir.join(raw))
        .into_iter()
        .chain(std::iter::once(PathBuf::from(raw)));

    for candidate in candidates {
        if candidate.exists() {
            if let Ok(absolute) = std::path::absolute(&candidate) {
                return absolute.to_string_lossy().into_owned();
            }
        }
    }

    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("glvideo-source-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_uri_is_verbatim() {
        let uri = "rtsp://camera.local/stream1";
        assert_eq!(resolve_source(uri, Some(Path::new("/nonexistent"))), uri);
        assert_eq!(resolve_source("https://example.com/a.mp4", None), "https://example.com/a.mp4");
    }

    #[test]
    fn test_data_dir_takes_precedence() {
        let dir = scratch_dir("data");
        let file = dir.join("clip.mp4");
        fs::write(&file, b"").unwrap();

        let resolved = resolve_source("clip.mp4", Some(&dir));
        assert_eq!(PathBuf::from(&resolved), std::path::absolute(&file).unwrap());
        assert!(Path::new(&resolved).is_absolute());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_absolute_path_resolves_as_is() {
        let dir = scratch_dir("cwd");
        let file = dir.join("fallback.mp4");
        fs::write(&file, b"").unwrap();

        let raw = file.to_string_lossy().into_owned();
        let resolved = resolve_source(&raw, Some(Path::new("/nonexistent-data-dir")));
        assert_eq!(resolved, raw);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_relative_name_found_in_working_directory() {
        let name = format!("glvideo-source-{}-relative.mp4", std::process::id());
        fs::write(&name, b"").unwrap();

        let resolved = resolve_source(&name, Some(Path::new("/nonexistent-data-dir")));
        let expected = std::env::current_dir().unwrap().join(&name);
        fs::remove_file(&name).unwrap();

        assert_eq!(PathBuf::from(resolved), expected);
    }

    #[test]
    fn test_missing_file_is_unchanged() {
        assert_eq!(
            resolve_source("definitely-missing-clip.mp4", None),
            "definitely-missing-clip.mp4"
        );
        assert_eq!(resolve_source("", None), "");
    }
}
