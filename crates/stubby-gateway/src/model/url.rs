use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use stubby_core::{ClickEvent, Stats};

/// Body of `POST /shorturls`.
///
/// `validity` stays raw JSON so the handler can answer 400 for anything that
/// is not a positive whole number. An explicit `null` is kept as
/// `Some(Value::Null)`; only an absent field means "use the default".
#[derive(Debug, Deserialize)]
pub struct CreateUrlRequest {
    pub url: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub validity: Option<Value>,
    pub shortcode: Option<String>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUrlResponse {
    pub short_link: String,
    pub expiry: Timestamp,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub original_url: String,
    pub created_at: Timestamp,
    pub expiry: Timestamp,
    pub total_clicks: usize,
    pub clicks: Vec<ClickEvent>,
}

impl From<Stats> for StatsResponse {
    fn from(stats: Stats) -> Self {
        Self {
            original_url: stats.original_url,
            created_at: stats.created_at,
            expiry: stats.expires_at,
            total_clicks: stats.total_clicks,
            clicks: stats.clicks,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
