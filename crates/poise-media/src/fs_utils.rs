//! Request-scoped scratch directories.
//!
//! Each analysis gets its own temp directory that is removed when the
//! returned [`TempDir`] is dropped, on success and error paths alike.

use std::path::Path;

use tempfile::{Builder, TempDir};
use tracing::{debug, warn};

use crate::error::MediaResult;

/// Prefix for per-request scratch directories.
const SCRATCH_PREFIX: &str = "poise-";

/// Create a scratch directory under `base`, creating `base` if needed.
///
/// Falls back to the system temp directory when `base` is unset or cannot
/// be used.
pub fn create_scratch_dir(base: Option<&Path>) -> MediaResult<TempDir> {
    if let Some(base) = base {
        match std::fs::create_dir_all(base)
            .and_then(|_| Builder::new().prefix(SCRATCH_PREFIX).tempdir_in(base))
        {
            Ok(dir) => {
                debug!("Using scratch directory {}", dir.path().display());
                return Ok(dir);
            }
            Err(e) => {
                warn!(
                    "Failed to use temp directory {}: {}. Falling back to system default",
                    base.display(),
                    e
                );
            }
        }
    }

    let dir = Builder::new().prefix(SCRATCH_PREFIX).tempdir()?;
    debug!("Using scratch directory {}", dir.path().display());
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_dir_created_under_base() {
        let base = TempDir::new().unwrap();
        let nested = base.path().join("videos");

        let dir = create_scratch_dir(Some(&nested)).unwrap();
        assert!(dir.path().starts_with(&nested));
        assert!(dir.path().exists());

        let path = dir.path().to_path_buf();
        drop(dir);
        assert!(!path.exists(), "scratch dir should be removed on drop");
    }

    #[test]
    fn test_scratch_dir_falls_back_when_base_unusable() {
        let base = TempDir::new().unwrap();
        let file = base.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();

        let dir = create_scratch_dir(Some(&file)).unwrap();
        assert!(!dir.path().starts_with(&file));
        assert!(dir.path().exists());
    }

    #[test]
    fn test_scratch_dir_default_location() {
        let dir = create_scratch_dir(None).unwrap();
        assert!(dir
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(SCRATCH_PREFIX));
    }
}
