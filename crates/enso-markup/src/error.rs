//! Error types for markup parsing.

use thiserror::Error;

/// Failure while turning markup text into nodes.
#[derive(Debug, Error)]
pub enum MarkupError {
    /// The tokenizer rejected the input.
    #[error("malformed markup at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    /// An attribute could not be read (duplicate name, bad quoting).
    #[error("malformed attribute at byte {position}: {message}")]
    Attribute { position: u64, message: String },
}

/// Result type for markup operations.
pub type Result<T> = std::result::Result<T, MarkupError>;
