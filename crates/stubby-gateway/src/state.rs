use std::sync::Arc;

use jiff::Timestamp;
use stubby_core::{Clock, Shortener};

use crate::access_log::AccessLogSink;

#[derive(Clone)]
pub struct AppState {
    shortener: Arc<dyn Shortener>,
    /// Same clock the store stamps records with.
    clock: Arc<dyn Clock>,
    base_url: String,
    access_log: Option<AccessLogSink>,
}

impl AppState {
    pub fn new(
        shortener: Arc<dyn Shortener>,
        clock: Arc<dyn Clock>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            shortener,
            clock,
            base_url: public_base_url.into(),
            access_log: None,
        }
    }

    pub fn with_access_log(mut self, sink: AccessLogSink) -> Self {
        self.access_log = Some(sink);
        self
    }

    pub fn shortener(&self) -> &dyn Shortener {
        self.shortener.as_ref()
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn access_log(&self) -> Option<&AccessLogSink> {
        self.access_log.as_ref()
    }
}
