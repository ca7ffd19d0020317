use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::access_log::access_log_mw;
use crate::handlers::{create_url_handler, get_stats_handler, health_handler, redirect_handler};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        let access_log = state.access_log().cloned();

        let router = Router::new()
            .route("/health", get(health_handler))
            .route("/shorturls", post(create_url_handler))
            .route("/shorturls/{short_code}", get(get_stats_handler))
            .route("/{short_code}", get(redirect_handler))
            .with_state(state);

        let router = match access_log {
            Some(sink) => router.layer(from_fn_with_state(sink, access_log_mw)),
            None => router,
        };

        router.layer(TraceLayer::new_for_http())
    }

    /// Browser access from a single trusted origin.
    pub fn cors(origin: HeaderValue) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
    }
}
