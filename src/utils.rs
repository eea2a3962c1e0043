use crate::error::No2Error;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const CACHE_DIR_NAME: &str = "no2cast_cache";

pub fn get_cache_dir() -> Result<PathBuf, No2Error> {
    dirs::cache_dir()
        .map(|p| p.join(CACHE_DIR_NAME))
        .ok_or(No2Error::CacheDirResolution)
}

pub fn ensure_cache_dir_exists(path: &Path) -> Result<(), No2Error> {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(No2Error::CacheDirCreation(
            path.to_path_buf(),
            io::Error::new(io::ErrorKind::AlreadyExists, "path exists but is not a directory"),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating cache directory: {}", path.display());
            std::fs::create_dir_all(path)
                .map_err(|e| No2Error::CacheDirCreation(path.to_path_buf(), e))
        }
        Err(e) => Err(No2Error::CacheDirCreation(path.to_path_buf(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_cache_dir_creates_nested() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        ensure_cache_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());
        // Idempotent.
        ensure_cache_dir_exists(&nested).unwrap();
    }

    #[test]
    fn test_ensure_cache_dir_rejects_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = ensure_cache_dir_exists(file.path()).unwrap_err();
        assert!(matches!(err, No2Error::CacheDirCreation(..)));
    }
}
