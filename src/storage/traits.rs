//! Storage abstraction trait and common types.

use std::io::{Read, Write};

use crate::error::{ColloquyError, Result};

/// A trait for storage backends that can store and retrieve named blobs.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Open a file for reading.
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    /// Create (or truncate) a file for writing.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Check if a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Delete a file. Deleting a missing file is not an error.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// Get the size of a file in bytes.
    fn file_size(&self, name: &str) -> Result<u64>;

    /// Rename a file, replacing any existing file of the new name.
    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()>;

    /// Create a temporary file whose name starts with `prefix`.
    fn create_temp_output(&self, prefix: &str) -> Result<(String, Box<dyn StorageOutput>)> {
        for counter in 0..10_000 {
            let temp_name = format!("{prefix}_{counter}.tmp");
            if !self.file_exists(&temp_name) {
                let output = self.create_output(&temp_name)?;
                return Ok((temp_name, output));
            }
        }
        Err(StorageError::IoError("Could not create temporary file".to_string()).into())
    }
}

/// A trait for reading data from storage.
pub trait StorageInput: Read + Send + std::fmt::Debug {
    /// Get the size of the input stream.
    fn size(&self) -> Result<u64>;
}

/// A trait for writing data to storage.
///
/// Data is only guaranteed to be visible to readers after
/// [`StorageOutput::flush_and_sync`].
pub trait StorageOutput: Write + Send + std::fmt::Debug {
    /// Flush and sync the output to storage.
    fn flush_and_sync(&mut self) -> Result<()>;

    /// Get the current position in the output stream.
    fn position(&self) -> Result<u64>;
}

/// Configuration for storage backends.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Buffer size for I/O operations.
    pub buffer_size: usize,

    /// Whether to sync writes immediately.
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            buffer_size: 65536,
            sync_writes: false,
        }
    }
}

/// Error types specific to storage operations.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// File not found.
    FileNotFound(String),

    /// Permission denied.
    PermissionDenied(String),

    /// I/O error.
    IoError(String),

    /// Stored data failed an integrity check.
    Corrupted(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::FileNotFound(name) => write!(f, "File not found: {name}"),
            StorageError::PermissionDenied(name) => write!(f, "Permission denied: {name}"),
            StorageError::IoError(msg) => write!(f, "I/O error: {msg}"),
            StorageError::Corrupted(msg) => write!(f, "Corrupted data: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for ColloquyError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::FileNotFound(name) => ColloquyError::not_found(name),
            other => ColloquyError::storage(other.to_string()),
        }
    }
}

impl StorageError {
    /// Classify an I/O error raised while accessing `name`.
    pub fn from_io(name: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StorageError::FileNotFound(name.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                StorageError::PermissionDenied(name.to_string())
            }
            _ => StorageError::IoError(format!("{name}: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();

        assert_eq!(config.buffer_size, 65536);
        assert!(!config.sync_writes);
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::FileNotFound("test.txt".to_string());
        assert_eq!(err.to_string(), "File not found: test.txt");

        let err = StorageError::Corrupted("checksum mismatch".to_string());
        assert_eq!(err.to_string(), "Corrupted data: checksum mismatch");
    }

    #[test]
    fn test_conversion_to_colloquy_error() {
        let err: ColloquyError = StorageError::FileNotFound("a.model".to_string()).into();
        assert!(err.is_not_found());

        let err: ColloquyError = StorageError::IoError("disk full".to_string()).into();
        assert!(matches!(err, ColloquyError::Storage(_)));
    }

    #[test]
    fn test_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(
            StorageError::from_io("x", io),
            StorageError::FileNotFound(name) if name == "x"
        ));
    }
}
