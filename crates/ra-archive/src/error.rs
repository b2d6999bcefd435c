//! Error types for archive operations.

use thiserror::Error;

/// Errors that can occur while building, sealing, or reading an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Identifier, schedule, or data groups rejected by the result model.
    #[error(transparent)]
    Model(#[from] ra_common::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Archive was already sealed and accepts no more changes
    #[error("archive '{0}' is already completed")]
    ArchiveSealed(String),

    /// Archive has not been sealed yet
    #[error("archive '{0}' has not been completed")]
    NotCompleted(String),

    /// A file with the same name was already added
    #[error("duplicate file in archive: {0}")]
    DuplicateFile(String),

    /// `build_archive` was called a second time on the same builder
    #[error("archive for '{0}' was already built")]
    AlreadyBuilt(String),

    /// Checksum verification failed
    #[error("checksum mismatch for '{path}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// Missing required file in archive
    #[error("missing required file: {0}")]
    MissingFile(String),

    /// ZIP entry that the manifest does not list
    #[error("file in archive not listed in manifest: {0}")]
    UnlistedFile(String),

    /// File not found in archive
    #[error("file not found in archive: {0}")]
    FileNotFound(String),

    /// Unknown or unsupported archive format version
    #[error("unsupported archive version: {version} (supported: {supported})")]
    UnsupportedVersion { version: String, supported: String },

    /// Corrupted manifest
    #[error("corrupted manifest: {0}")]
    CorruptedManifest(String),
}

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;
