//! Output file naming, preparation and cleanup

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ShrinkXError, ShrinkXResult};

pub mod verifier;

/// Marker appended to the source file stem
pub const OUTPUT_SUFFIX: &str = "_COMPRESSED";

/// `{dir}/{stem}_COMPRESSED{.ext}` next to the source
pub fn derive_output_path(source: &Path) -> ShrinkXResult<PathBuf> {
    let stem = source
        .file_stem()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ShrinkXError::InvalidParameters {
            message: format!("Source path has no file name: {}", source.display()),
        })?;

    let mut name = stem.to_os_string();
    name.push(OUTPUT_SUFFIX);
    if let Some(ext) = source.extension() {
        name.push(".");
        name.push(ext);
    }
    Ok(source.with_file_name(name))
}

/// Remove a file left over from an earlier run so the encoder starts fresh
pub fn prepare_output(path: &Path) -> ShrinkXResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!("Removed previous output: {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ShrinkXError::IoError(e)),
    }
}

/// Best-effort removal of a partial output after a failed or cancelled run
pub fn remove_partial_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => info!("Removed partial output: {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => debug!("Could not remove partial output {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_derive_output_path() {
        let path = derive_output_path(Path::new("/videos/holiday trip.MP4")).unwrap();
        assert_eq!(path, PathBuf::from("/videos/holiday trip_COMPRESSED.MP4"));
    }

    #[test]
    fn test_derive_output_path_without_extension() {
        let path = derive_output_path(Path::new("clip")).unwrap();
        assert_eq!(path, PathBuf::from("clip_COMPRESSED"));
    }

    #[test]
    fn test_derive_output_path_rejects_root() {
        assert!(derive_output_path(Path::new("/")).is_err());
    }

    #[test]
    fn test_prepare_output_removes_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a_COMPRESSED.mp4");
        std::fs::write(&path, b"stale").unwrap();

        prepare_output(&path).unwrap();
        assert!(!path.exists());
        prepare_output(&path).unwrap();
    }

    #[test]
    fn test_remove_partial_output_is_best_effort() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.mp4");
        remove_partial_output(&path);
        assert!(!path.exists());
    }
}
