use crate::error::Result;
use crate::record::{Stats, UrlRecord};
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use std::net::IpAddr;
use std::num::NonZeroU32;
use typed_builder::TypedBuilder;

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenParams {
    /// The original URL to be shortened. Callers validate its syntax.
    #[builder(setter(into))]
    pub original_url: String,
    /// Minutes the link stays redirectable; the store default applies when absent.
    #[builder(default, setter(strip_option))]
    pub validity_minutes: Option<NonZeroU32>,
    /// A user-requested short code, validated by the store.
    #[builder(default, setter(strip_option, into))]
    pub custom_code: Option<String>,
}

/// Outcome of a successful [`Shortener::shorten`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub shortcode: ShortCode,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// Request metadata attached to a redirect.
#[derive(Debug, Clone, Default)]
pub struct Visit {
    pub referrer: Option<String>,
    pub ip: Option<IpAddr>,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Creates a shortened URL under a requested or freshly generated code.
    async fn shorten(&self, params: ShortenParams) -> Result<Created>;

    /// Looks up a code. Expired records are returned like any other.
    async fn resolve(&self, code: &str) -> Option<UrlRecord>;

    /// Appends a click to the record. Unknown codes are silently ignored.
    async fn record_click(&self, code: &str, visit: Visit);

    /// Returns the record together with its full click history.
    async fn stats(&self, code: &str) -> Option<Stats>;
}
