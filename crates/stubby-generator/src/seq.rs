use crate::Generator;
use std::sync::atomic::{AtomicU64, Ordering};
use stubby_core::error::CoreError;
use stubby_core::shortcode::{is_code_byte, MAX_LENGTH};
use stubby_core::ShortCode;

const DIGITS: usize = 6;
const WRAP: u64 = 1_000_000;
pub const MAX_PREFIX_LENGTH: usize = MAX_LENGTH - DIGITS;

/// A short code generator using a sequential counter.
///
/// This generator produces codes like "sb000000", "sb000001", etc.
/// The counter wraps after 999999; the store's collision check then
/// rejects codes that are still taken.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
            prefix: self.prefix.clone(),
        }
    }
}

impl SeqGenerator {
    /// Creates a new sequential generator with a custom prefix.
    ///
    /// The prefix may hold up to four characters of the short code alphabet.
    pub fn with_prefix(prefix: impl Into<String>) -> Result<Self, CoreError> {
        Self::with_offset(prefix, 0)
    }

    /// Creates a new sequential generator starting from a specific counter value.
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Result<Self, CoreError> {
        let prefix = prefix.into();
        if prefix.len() > MAX_PREFIX_LENGTH || !prefix.bytes().all(is_code_byte) {
            return Err(CoreError::InvalidShortCode(format!(
                "prefix must be at most {} characters of [a-zA-Z0-9_-]: '{}'",
                MAX_PREFIX_LENGTH, prefix
            )));
        }
        Ok(Self {
            counter: AtomicU64::new(offset),
            prefix,
        })
    }
}

impl Generator for SeqGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        let count = self.counter.fetch_add(1, Ordering::SeqCst) % WRAP;
        ShortCode::new_unchecked(format!("{}{:0width$}", self.prefix, count, width = DIGITS))
    }
}
