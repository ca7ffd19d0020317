use std::num::NonZeroU32;
use typed_builder::TypedBuilder;

pub const DEFAULT_VALIDITY_MINUTES: NonZeroU32 = match NonZeroU32::new(30) {
    Some(minutes) => minutes,
    None => unreachable!(),
};
pub const DEFAULT_MAX_GENERATE_ATTEMPTS: u32 = 16;

/// Configures a [`ShortcodeStore`][crate::ShortcodeStore].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct StoreSettings {
    /// Validity applied when a create request does not carry one.
    #[builder(default = DEFAULT_VALIDITY_MINUTES)]
    pub default_validity_minutes: NonZeroU32,
    /// How many generated candidates may collide before giving up.
    #[builder(default = DEFAULT_MAX_GENERATE_ATTEMPTS)]
    pub max_generate_attempts: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}
