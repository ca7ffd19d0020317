//! In-memory shortcode store.
//!
//! [`ShortcodeStore`] owns every short URL record and its click history.
//! It validates requested codes, generates fresh ones with a bounded
//! collision retry, and implements the [`stubby_core::Shortener`] contract
//! consumed by the gateway.

pub mod service;
pub mod settings;
pub mod store;

pub use settings::StoreSettings;
pub use store::ShortcodeStore;
