//! Core types and traits for the Stubby URL shortener.
//!
//! This crate provides the shared vocabulary used by the shortcode store and
//! the HTTP gateway: validated short codes, stored records, click events,
//! the [`Shortener`] contract and the [`Clock`] abstraction.

pub mod clock;
pub mod error;
pub mod record;
pub mod shortcode;
pub mod shortener;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, ShortenerError};
pub use record::{ClickEvent, Stats, UrlRecord};
pub use shortcode::ShortCode;
pub use shortener::{Created, ShortenParams, Shortener, Visit};
