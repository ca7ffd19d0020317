use thiserror::Error;

/// Result type for the shortener contract.
pub type Result<T> = std::result::Result<T, ShortenerError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
}

/// Errors returned by [`Shortener::shorten`][crate::Shortener::shorten].
///
/// Lookups never fail: an unknown code is reported as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortenerError {
    #[error("invalid short code: {0}")]
    InvalidShortcode(String),
    #[error("short code already exists: {0}")]
    ShortcodeTaken(String),
    #[error("no free short code found after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },
    #[error("validity of {minutes} minutes is out of range")]
    ValidityOutOfRange { minutes: u32 },
}

impl From<CoreError> for ShortenerError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidShortCode(message) => Self::InvalidShortcode(message),
        }
    }
}
