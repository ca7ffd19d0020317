use crate::settings::StoreSettings;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::{SignedDuration, Timestamp};
use std::num::NonZeroU32;
use stubby_core::error::Result;
use stubby_core::{
    ClickEvent, Clock, Created, ShortCode, ShortenParams, ShortenerError, Stats, SystemClock,
    UrlRecord, Visit,
};
use stubby_generator::Generator;
use tracing::{debug, trace, warn};

/// Placeholder until IP-to-location resolution exists.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// One record and its click history, guarded together by the map shard.
#[derive(Debug, Clone)]
struct StoredUrl {
    record: UrlRecord,
    clicks: Vec<ClickEvent>,
}

impl StoredUrl {
    fn to_stats(&self) -> Stats {
        Stats {
            original_url: self.record.original_url.clone(),
            created_at: self.record.created_at,
            expires_at: self.record.expires_at,
            total_clicks: self.clicks.len(),
            clicks: self.clicks.clone(),
        }
    }
}

/// The shortcode store.
///
/// Records live in a [`DashMap`]. Creation goes through the map's entry
/// API, so the existence check and the insert happen under one shard lock
/// and two concurrent creates can never both win the same code. Clicks are
/// appended under the same shard lock, and readers clone under it, so a
/// reader always sees a complete record and a prefix of the appends.
///
/// Records are never removed; expiry only changes what callers do with them.
#[derive(Debug)]
pub struct ShortcodeStore<G, C = SystemClock> {
    records: DashMap<String, StoredUrl>,
    generator: G,
    clock: C,
    settings: StoreSettings,
}

impl<G: Generator> ShortcodeStore<G, SystemClock> {
    /// Creates a store backed by the system clock and default settings.
    pub fn new(generator: G) -> Self {
        Self::with_clock(generator, SystemClock, StoreSettings::default())
    }
}

impl<G: Generator, C: Clock> ShortcodeStore<G, C> {
    pub fn with_clock(generator: G, clock: C, settings: StoreSettings) -> Self {
        Self {
            records: DashMap::new(),
            generator,
            clock,
            settings,
        }
    }

    /// Creates a record under the requested code, or under a generated one.
    ///
    /// A requested code is validated before the map is touched. An existing
    /// record is never overwritten.
    pub fn create(&self, params: ShortenParams) -> Result<Created> {
        let requested = params.custom_code.map(ShortCode::new).transpose()?;

        let validity = params
            .validity_minutes
            .unwrap_or(self.settings.default_validity_minutes);
        let created_at = self.clock.now();
        let expires_at = expiry(created_at, validity)?;
        let mut original_url = params.original_url;

        let shortcode = match requested {
            Some(code) => {
                if !self.insert_if_absent(&code, &mut original_url, created_at, expires_at) {
                    debug!(code = %code, "requested short code is taken");
                    return Err(ShortenerError::ShortcodeTaken(code.to_string()));
                }
                code
            }
            None => self.insert_generated(&mut original_url, created_at, expires_at)?,
        };

        debug!(code = %shortcode, expires_at = %expires_at, "created short url");

        Ok(Created {
            shortcode,
            created_at,
            expires_at,
        })
    }

    /// Looks up a record without any expiry check.
    pub fn resolve(&self, code: &str) -> Option<UrlRecord> {
        let record = self.records.get(code).map(|stored| stored.record.clone());
        trace!(code, found = record.is_some(), "resolved short code");
        record
    }

    /// Appends a click to the record, expired or not.
    ///
    /// Unknown codes are ignored: callers only record clicks for codes they
    /// have already resolved.
    pub fn record_click(&self, code: &str, visit: Visit) {
        let Some(mut stored) = self.records.get_mut(code) else {
            debug!(code, "ignoring click for unknown short code");
            return;
        };

        // Timestamped under the shard lock so insertion order is time order.
        let event = ClickEvent {
            timestamp: self.clock.now(),
            referrer: visit.referrer.unwrap_or_default(),
            location: UNKNOWN_LOCATION.to_owned(),
        };
        trace!(code, ip = ?visit.ip, "recorded click");
        stored.clicks.push(event);
    }

    /// Projects a record and all clicks recorded so far.
    pub fn stats(&self, code: &str) -> Option<Stats> {
        self.records.get(code).map(|stored| stored.to_stats())
    }

    /// Number of records in the store.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn insert_generated(
        &self,
        original_url: &mut String,
        created_at: Timestamp,
        expires_at: Timestamp,
    ) -> Result<ShortCode> {
        let attempts = self.settings.max_generate_attempts;
        for attempt in 1..=attempts {
            let code: ShortCode = self.generator.generate().into();
            debug_assert!(ShortCode::is_valid(code.as_str()), "generator produced {code}");

            if self.insert_if_absent(&code, original_url, created_at, expires_at) {
                return Ok(code);
            }
            trace!(code = %code, attempt, "generated short code collided");
        }

        warn!(attempts, "short code generation exhausted its attempts");
        Err(ShortenerError::CodeSpaceExhausted { attempts })
    }

    /// Inserts a fresh record unless the code is taken; returns whether it did.
    ///
    /// `original_url` is moved out only on success.
    fn insert_if_absent(
        &self,
        code: &ShortCode,
        original_url: &mut String,
        created_at: Timestamp,
        expires_at: Timestamp,
    ) -> bool {
        match self.records.entry(code.as_str().to_owned()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(StoredUrl {
                    record: UrlRecord {
                        shortcode: code.clone(),
                        original_url: std::mem::take(original_url),
                        created_at,
                        expires_at,
                    },
                    clicks: Vec::new(),
                });
                true
            }
        }
    }
}

fn expiry(created_at: Timestamp, validity: NonZeroU32) -> Result<Timestamp> {
    let minutes = validity.get();
    created_at
        .checked_add(SignedDuration::from_mins(i64::from(minutes)))
        .map_err(|_| ShortenerError::ValidityOutOfRange { minutes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;
    use stubby_core::ManualClock;
    use stubby_generator::{RandomGenerator, SeqGenerator};

    fn start() -> Timestamp {
        "2026-01-01T00:00:00Z".parse().unwrap()
    }

    fn test_store() -> (ShortcodeStore<RandomGenerator, ManualClock>, ManualClock) {
        let clock = ManualClock::new(start());
        let store =
            ShortcodeStore::with_clock(RandomGenerator::default(), clock.clone(), Default::default());
        (store, clock)
    }

    fn params(url: &str, minutes: u32, code: Option<&str>) -> ShortenParams {
        let builder = ShortenParams::builder()
            .original_url(url)
            .validity_minutes(NonZeroU32::new(minutes).unwrap());
        match code {
            Some(code) => builder.custom_code(code).build(),
            None => builder.build(),
        }
    }

    fn visit(referrer: &str) -> Visit {
        Visit {
            referrer: Some(referrer.to_string()),
            ip: Some(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        }
    }

    /// Always proposes the same code.
    struct FixedGenerator(&'static str);

    impl Generator for FixedGenerator {
        type Output = ShortCode;

        fn generate(&self) -> ShortCode {
            ShortCode::new_unchecked(self.0)
        }
    }

    #[test]
    fn create_with_generated_code() {
        let (store, _) = test_store();

        let created = store.create(params("https://example.com", 30, None)).unwrap();

        assert!(ShortCode::is_valid(created.shortcode.as_str()));
        assert_eq!(created.created_at, start());
        assert_eq!(created.expires_at, start() + SignedDuration::from_secs(30 * 60));

        let record = store.resolve(created.shortcode.as_str()).unwrap();
        assert_eq!(record.original_url, "https://example.com");
        assert_eq!(record.shortcode, created.shortcode);
        assert_eq!(record.created_at, created.created_at);
        assert_eq!(record.expires_at, created.created_at + SignedDuration::from_secs(30 * 60));
    }

    #[test]
    fn default_validity_is_thirty_minutes() {
        let (store, _) = test_store();

        let created = store
            .create(ShortenParams::builder().original_url("https://example.com").build())
            .unwrap();

        assert_eq!(
            created.expires_at,
            created.created_at + SignedDuration::from_mins(30)
        );
    }

    #[test]
    fn create_with_requested_code() {
        let (store, _) = test_store();

        let created = store
            .create(params("https://example.com", 30, Some("my-code")))
            .unwrap();

        assert_eq!(created.shortcode.as_str(), "my-code");
        assert!(store.resolve("my-code").is_some());
    }

    #[test]
    fn duplicate_requested_code_is_taken() {
        let (store, _) = test_store();

        store
            .create(params("https://example.com", 30, Some("my-code")))
            .unwrap();
        let err = store
            .create(params("https://other.com", 30, Some("my-code")))
            .unwrap_err();

        assert_eq!(err, ShortenerError::ShortcodeTaken("my-code".to_string()));
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.resolve("my-code").unwrap().original_url,
            "https://example.com"
        );
    }

    #[test]
    fn invalid_requested_code_is_rejected_before_mutation() {
        let (store, _) = test_store();

        for code in ["ab", "has space", "toolongcode1234"] {
            let err = store
                .create(params("https://example.com", 30, Some(code)))
                .unwrap_err();
            assert!(
                matches!(err, ShortenerError::InvalidShortcode(_)),
                "{code}: {err:?}"
            );
        }

        assert!(store.is_empty());
    }

    #[test]
    fn generation_retries_past_collisions() {
        let clock = ManualClock::new(start());
        let store = ShortcodeStore::with_clock(
            SeqGenerator::with_prefix("sb").unwrap(),
            clock,
            StoreSettings::default(),
        );

        // occupy the first two codes the generator will propose
        store
            .create(params("https://a.com", 30, Some("sb000000")))
            .unwrap();
        store
            .create(params("https://b.com", 30, Some("sb000001")))
            .unwrap();

        let created = store.create(params("https://c.com", 30, None)).unwrap();
        assert_eq!(created.shortcode.as_str(), "sb000002");
    }

    #[test]
    fn generation_fails_fast_when_exhausted() {
        let settings = StoreSettings::builder().max_generate_attempts(4).build();
        let store =
            ShortcodeStore::with_clock(FixedGenerator("same"), ManualClock::new(start()), settings);

        store.create(params("https://a.com", 30, None)).unwrap();
        let err = store.create(params("https://b.com", 30, None)).unwrap_err();

        assert_eq!(err, ShortenerError::CodeSpaceExhausted { attempts: 4 });
        assert_eq!(store.len(), 1);
        assert_eq!(store.resolve("same").unwrap().original_url, "https://a.com");
    }

    #[test]
    fn validity_overflow_is_rejected() {
        let (store, _) = test_store();

        let err = store
            .create(params("https://example.com", u32::MAX, None))
            .unwrap_err();

        assert_eq!(err, ShortenerError::ValidityOutOfRange { minutes: u32::MAX });
        assert!(store.is_empty());
    }

    #[test]
    fn resolve_and_stats_unknown_code() {
        let (store, _) = test_store();

        assert!(store.resolve("nope").is_none());
        assert!(store.stats("nope").is_none());
    }

    #[test]
    fn record_click_on_unknown_code_is_noop() {
        let (store, _) = test_store();

        store.record_click("nope", visit("https://ref.example"));

        assert!(store.is_empty());
        assert!(store.stats("nope").is_none());
    }

    #[test]
    fn clicks_accumulate_in_call_order() {
        let (store, clock) = test_store();
        let created = store
            .create(params("https://example.com", 30, Some("abcd")))
            .unwrap();

        for i in 0..5 {
            clock.advance(SignedDuration::from_secs(1));
            store.record_click(created.shortcode.as_str(), visit(&format!("ref-{i}")));
        }

        let stats = store.stats("abcd").unwrap();
        assert_eq!(stats.total_clicks, 5);
        assert_eq!(stats.clicks.len(), 5);
        for (i, click) in stats.clicks.iter().enumerate() {
            assert_eq!(click.referrer, format!("ref-{i}"));
            assert_eq!(click.location, UNKNOWN_LOCATION);
            assert_eq!(click.timestamp, start() + SignedDuration::from_secs(i as i64 + 1));
        }
    }

    #[test]
    fn missing_referrer_is_empty_string() {
        let (store, _) = test_store();
        store
            .create(params("https://example.com", 30, Some("abcd")))
            .unwrap();

        store.record_click("abcd", Visit::default());

        let stats = store.stats("abcd").unwrap();
        assert_eq!(stats.clicks[0].referrer, "");
    }

    #[test]
    fn expired_records_stay_visible() {
        let (store, clock) = test_store();
        let created = store.create(params("https://example.com", 1, None)).unwrap();
        let code = created.shortcode.as_str();

        let record = store.resolve(code).unwrap();
        assert_eq!(record.original_url, "https://example.com");
        assert!(!record.is_expired_at(clock.now()));

        clock.advance(SignedDuration::from_secs(61));

        let record = store.resolve(code).unwrap();
        assert!(record.is_expired_at(clock.now()));

        // clicks are still accepted and stats still served
        store.record_click(code, Visit::default());
        let stats = store.stats(code).unwrap();
        assert_eq!(stats.total_clicks, 1);
        assert_eq!(stats.expires_at, created.expires_at);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_with_same_code() {
        let (store, _) = test_store();
        let store = Arc::new(store);
        let mut handles = vec![];

        for i in 0..32u64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create(params(&format!("https://example{i}.com"), 30, Some("race")))
            }));
        }

        let mut successes = 0;
        let mut taken = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(ShortenerError::ShortcodeTaken(code)) => {
                    assert_eq!(code, "race");
                    taken += 1;
                }
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(taken, 31);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_clicks_are_not_lost() {
        let (store, _) = test_store();
        let store = Arc::new(store);
        store
            .create(params("https://example.com", 30, Some("hot1")))
            .unwrap();
        store
            .create(params("https://example.com", 30, Some("hot2")))
            .unwrap();

        let mut handles = vec![];
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let code = if i % 2 == 0 { "hot1" } else { "hot2" };
                let mut last_seen = 0;
                for own in 1..=100 {
                    store.record_click(code, Visit::default());
                    let stats = store.stats(code).unwrap();
                    assert_eq!(stats.total_clicks, stats.clicks.len());
                    assert!(stats.total_clicks >= last_seen, "click count went backwards");
                    assert!(stats.total_clicks >= own, "own click not visible");
                    last_seen = stats.total_clicks;
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.stats("hot1").unwrap().total_clicks, 800);
        assert_eq!(store.stats("hot2").unwrap().total_clicks, 800);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_generated_codes_are_unique() {
        let (store, _) = test_store();
        let store = Arc::new(store);
        let mut handles = vec![];

        for i in 0..64u64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .create(params(&format!("https://example{i}.com"), 30, None))
                    .unwrap()
                    .shortcode
            }));
        }

        let mut codes = std::collections::HashSet::new();
        for handle in handles {
            assert!(codes.insert(handle.await.unwrap()));
        }
        assert_eq!(store.len(), 64);
    }
}
