use crate::error::{AppError, Result};
use crate::model::{CreateUrlRequest, CreateUrlResponse, StatsResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use std::num::NonZeroU32;
use stubby_core::ShortenParams;
use tracing::info;

/// Creates a short URL.
///
/// `POST /shorturls` with `{ "url", "validity"?, "shortcode"? }`.
pub async fn create_url_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateUrlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateUrlResponse>)> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let original_url = request
        .url
        .as_deref()
        .and_then(normalize_url)
        .ok_or_else(|| AppError::BadRequest("Invalid or missing URL".to_string()))?;
    let validity_minutes = request.validity.as_ref().map(parse_validity).transpose()?;
    // an empty shortcode means "generate one"
    let custom_code = request.shortcode.filter(|code| !code.is_empty());

    let created = state
        .shortener()
        .shorten(ShortenParams {
            original_url,
            validity_minutes,
            custom_code,
        })
        .await?;

    info!(code = %created.shortcode, expires_at = %created.expires_at, "short url created");

    let response = CreateUrlResponse {
        short_link: created.shortcode.to_url(state.base_url()),
        expiry: created.expires_at,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Returns the stats of a short URL, expired or not.
///
/// `GET /shorturls/{short_code}`.
pub async fn get_stats_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>> {
    let stats = state
        .shortener()
        .stats(&short_code)
        .await
        .ok_or_else(|| AppError::NotFound("Shortcode not found".to_string()))?;

    Ok(Json(stats.into()))
}

/// Parses an absolute URL and returns its serialized form.
///
/// The parser drops embedded tabs and newlines, so the raw input is never
/// stored as is.
fn normalize_url(candidate: &str) -> Option<String> {
    ::url::Url::parse(candidate).ok().map(String::from)
}

/// Accepts whole JSON numbers, `1.0` included, between 1 and `u32::MAX`.
fn parse_validity(raw: &Value) -> Result<NonZeroU32> {
    let minutes = match raw {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|minutes| minutes.fract() == 0.0 && *minutes >= 1.0)
                .filter(|minutes| *minutes <= f64::from(u32::MAX))
                .map(|minutes| minutes as u64)
        }),
        _ => None,
    };

    minutes
        .and_then(|minutes| u32::try_from(minutes).ok())
        .and_then(NonZeroU32::new)
        .ok_or_else(|| AppError::BadRequest("Validity must be a positive integer".to_string()))
}
