use crate::access_log::client_ip;
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use stubby_core::Visit;
use tracing::{debug, error};

/// Redirects a short code to its original URL.
///
/// `GET /{short_code}` answers 404 for unknown codes and 410 once the
/// validity window has passed. Only honored redirects are recorded as clicks.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
    request: Request,
) -> Result<Response> {
    let record = state
        .shortener()
        .resolve(&short_code)
        .await
        .ok_or_else(|| AppError::NotFound("Shortcode not found".to_string()))?;

    if record.is_expired_at(state.now()) {
        debug!(code = %short_code, expires_at = %record.expires_at, "short link expired");
        return Err(AppError::Gone("Short link expired".to_string()));
    }

    // a record that cannot be sent as a Location header is never counted
    let location = HeaderValue::from_str(&record.original_url).map_err(|err| {
        error!(code = %short_code, %err, "stored url is not a valid Location header");
        AppError::Internal("Stored URL cannot be redirected to".to_string())
    })?;

    let referrer = request
        .headers()
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let visit = Visit {
        referrer,
        ip: client_ip(&request),
    };
    state.shortener().record_click(&short_code, visit).await;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}
