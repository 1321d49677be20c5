//! Error types for storycheck
//!
//! Library errors use `thiserror`; the binary wraps them with `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for storycheck operations
pub type StorycheckResult<T> = Result<T, StorycheckError>;

/// Main error type for storycheck operations
#[derive(Error, Debug)]
pub enum StorycheckError {
    /// Input file does not exist (or is not a regular file)
    #[error("input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Input file exceeds the configured size limit
    #[error("input file too large: {path} is {size_bytes} bytes (limit {limit_bytes})")]
    InputTooLarge {
        path: PathBuf,
        size_bytes: u64,
        limit_bytes: u64,
    },

    /// Input document is empty or not valid UTF-8
    #[error("input file unreadable: {path} - {reason}")]
    InputUnreadable { path: PathBuf, reason: String },

    /// No API key in the environment or configuration
    #[error("GEMINI_API_KEY is not set - export it or add it to a .env file")]
    ApiKeyMissing,

    /// Remote store reported the upload as failed
    #[error("upload of '{name}' failed: {reason}")]
    UploadFailed { name: String, reason: String },

    /// Poll bound exhausted without the upload reaching a terminal state
    #[error("upload of '{name}' timed out after {attempts} polls")]
    UploadTimeout { name: String, attempts: usize },

    /// Generation request was rejected or returned no usable text
    #[error("generation request failed: {reason}")]
    GenerationFailed { reason: String },

    /// Remote store replied with a non-success HTTP status
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP transport error
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Configuration file could not be parsed
    #[error("invalid configuration in {file}: {message}")]
    Config { file: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
