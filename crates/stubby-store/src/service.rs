use crate::store::ShortcodeStore;
use async_trait::async_trait;
use stubby_core::error::Result;
use stubby_core::{Clock, Created, ShortenParams, Shortener, Stats, UrlRecord, Visit};
use stubby_generator::Generator;

/// The store is fully in-memory, so every contract method completes
/// without awaiting anything.
#[async_trait]
impl<G: Generator, C: Clock + 'static> Shortener for ShortcodeStore<G, C> {
    async fn shorten(&self, params: ShortenParams) -> Result<Created> {
        self.create(params)
    }

    async fn resolve(&self, code: &str) -> Option<UrlRecord> {
        ShortcodeStore::resolve(self, code)
    }

    async fn record_click(&self, code: &str, visit: Visit) {
        ShortcodeStore::record_click(self, code, visit)
    }

    async fn stats(&self, code: &str) -> Option<Stats> {
        ShortcodeStore::stats(self, code)
    }
}
