use crate::Generator;
use rand::Rng;
use stubby_core::error::CoreError;
use stubby_core::shortcode::{MAX_LENGTH, MIN_LENGTH};
use stubby_core::ShortCode;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

pub const DEFAULT_LENGTH: usize = 6;

/// Draws codes uniformly from the 64-character short code alphabet.
///
/// With the default length of 6 the code space holds 64^6 (about 6.9e10)
/// codes, so collisions stay rare until the store holds millions of records.
#[derive(Debug, Clone, Copy)]
pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    /// Creates a generator producing codes of `length` characters.
    pub fn new(length: usize) -> Result<Self, CoreError> {
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
            return Err(CoreError::InvalidShortCode(format!(
                "generated length must be between {} and {}, got {}",
                MIN_LENGTH, MAX_LENGTH, length
            )));
        }
        Ok(Self { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
        }
    }
}

impl Generator for RandomGenerator {
    type Output = ShortCode;

    fn generate(&self) -> Self::Output {
        let mut rng = rand::rng();
        let code: String = (0..self.length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        ShortCode::new_unchecked(code)
    }
}
