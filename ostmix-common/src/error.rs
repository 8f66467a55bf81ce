//! Common error types for ostmix

use thiserror::Error;

/// Common result type for ostmix operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the ostmix crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file missing, unreadable or malformed
    #[error("Configuration error: {0}")]
    Config(String),
}
