use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A stored short URL, without its click history.
///
/// Every field is write-once: records are never updated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRecord {
    pub shortcode: ShortCode,
    /// The original URL that was shortened.
    pub original_url: String,
    pub created_at: Timestamp,
    /// When redirects stop being honored. Always after `created_at`.
    pub expires_at: Timestamp,
}

impl UrlRecord {
    /// Returns `true` once `now` is strictly past `expires_at`.
    ///
    /// The store never evaluates this itself; callers decide what an
    /// expired record means for them.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }
}

/// One successful redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub timestamp: Timestamp,
    /// The `Referer` of the redirect request, empty when absent.
    pub referrer: String,
    /// Coarse location of the client.
    pub location: String,
}

/// Read-only projection of a record and its full click history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub original_url: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub total_clicks: usize,
    /// Clicks in the order they were recorded.
    pub clicks: Vec<ClickEvent>,
}
