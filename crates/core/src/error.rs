use thiserror::Error;

use crate::domain::Id;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("replies may nest at most {max} levels deep")]
    TooDeep { max: usize },
    #[error("{field}: {reason}")]
    Conflict {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("comment {0} not found")]
    CommentNotFound(Id),
}

/// Failure of the authoritative entity store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store call timed out")]
    Timeout,
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Failure of the cache store. Callers treat every variant as a miss.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("cache call timed out")]
    Timeout,
    #[error("cache codec error: {0}")]
    Codec(String),
}
