use thiserror::Error;

/// Result type for the sorting engine
pub type Result<T> = std::result::Result<T, SortError>;

/// Errors surfaced by the sorting engine before any optimization work starts
#[derive(Debug, Error, PartialEq)]
pub enum SortError {
    /// Input that cannot be repaired locally (bad start index, broken permutation)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Rejected weight or optimizer setting
    #[error("Configuration error: {0}")]
    Configuration(String),
}
