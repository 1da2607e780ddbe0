// File system operations for conversion inputs and outputs
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Output path used when none is given: the input with a `.mid` extension
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("mid")
}

/// Write a file, creating missing parent directories, and return its SHA256 hash
pub fn write_output(path: &Path, data: &[u8]) -> StorageResult<String> {
    let to_err = |source| StorageError::Write {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(to_err)?;
    }

    let mut file = fs::File::create(path).map_err(to_err)?;
    file.write_all(data).map_err(to_err)?;

    Ok(calculate_sha256(data))
}

/// Calculate SHA256 hash of data
pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
