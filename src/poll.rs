//! Feed polling.
//!
//! One *cycle* walks every registered feed:
//!
//! ```text
//! read watermark ─► fetch + parse ─► detect ─► persist watermark ─► notify
//! ```
//!
//! and [`Poller::run`] repeats cycles on a fixed-rate timer.  Cycles never
//! overlap: the next one starts only after the previous one returned.
//!
//! ## Failure policy
//!
//! Nothing that goes wrong for one feed affects another feed or the loop.
//! A watermark that cannot be read is replaced by the seed for this pass
//! (and only rewritten when the stored row itself is unparsable), a feed that
//! cannot be fetched is skipped until the next cycle, and a notification
//! that cannot be delivered is logged and dropped.
//!
//! ## For contributors
//!
//! The watermark is persisted *before* notifications go out, so a crash in
//! between loses notifications rather than repeating them.  Keep it that
//! way; nothing downstream de-duplicates.
//!
//! With `workers > 1` feeds are spread over scoped threads.  Each
//! registration is handled by exactly one worker, which keeps every
//! read-modify-write of a feed's watermark on a single thread.

use std::ops::AddAssign;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, error, info, info_span, warn};

use crate::detect::{default_seed, detect};
use crate::notify::{NotificationEvent, Notifier};
use crate::source::FeedSource;
use crate::store::{FeedRegistration, StoreError, WatermarkStore};

/// Counters for one cycle (or one feed within a cycle).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Feeds looked at.
    pub feeds: usize,
    /// Feeds that could not be fetched or parsed.
    pub failed_feeds: usize,
    /// Items the detector reported as new.
    pub new_items: usize,
    /// Notifications accepted by the receiver.
    pub delivered: usize,
    /// Notifications that failed.
    pub delivery_failures: usize,
}

impl AddAssign for CycleReport {
    fn add_assign(&mut self, rhs: Self) {
        self.feeds += rhs.feeds;
        self.failed_feeds += rhs.failed_feeds;
        self.new_items += rhs.new_items;
        self.delivered += rhs.delivered;
        self.delivery_failures += rhs.delivery_failures;
    }
}

/// Drives fetch → detect → persist → notify for a set of feeds.
pub struct Poller {
    source: Arc<dyn FeedSource>,
    store: Arc<dyn WatermarkStore>,
    notifier: Arc<dyn Notifier>,
    /// Where notifications are sent (the configured host).
    destination: String,
    workers: usize,
}

impl Poller {
    pub fn new(
        source: Arc<dyn FeedSource>,
        store: Arc<dyn WatermarkStore>,
        notifier: Arc<dyn Notifier>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
            destination: destination.into(),
            workers: 1,
        }
    }

    /// Process up to `workers` feeds at once.  `1` (the default) is
    /// sequential.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Poll forever, one cycle per `interval`.
    ///
    /// The first cycle runs immediately.  A cycle that takes longer than
    /// `interval` is followed straight away by the next one.
    pub fn run(&self, registrations: &[FeedRegistration], interval: Duration) -> ! {
        let mut ticker = Ticker::new(interval, Instant::now());
        loop {
            info!(feeds = registrations.len(), "checking feeds for updates");
            self.run_cycle(registrations);
            thread::sleep(ticker.delay(Instant::now()));
        }
    }

    /// Run one cycle against the current wall clock.
    pub fn run_cycle(&self, registrations: &[FeedRegistration]) -> CycleReport {
        self.run_cycle_at(registrations, Utc::now())
    }

    /// Run one cycle, seeding never-checked feeds relative to `now`.
    pub fn run_cycle_at(
        &self,
        registrations: &[FeedRegistration],
        now: DateTime<Utc>,
    ) -> CycleReport {
        let started_at = Instant::now();
        let workers = self.workers.min(registrations.len()).max(1);

        let report = if workers == 1 {
            let mut total = CycleReport::default();
            for registration in registrations {
                total += self.process_feed(registration, now);
            }
            total
        } else {
            let next = AtomicUsize::new(0);
            let total = Mutex::new(CycleReport::default());
            thread::scope(|scope| {
                for _ in 0..workers {
                    scope.spawn(|| {
                        while let Some(registration) =
                            registrations.get(next.fetch_add(1, Ordering::Relaxed))
                        {
                            let report = self.process_feed(registration, now);
                            *total.lock() += report;
                        }
                    });
                }
            });
            total.into_inner()
        };

        info!(
            feeds = report.feeds,
            failed = report.failed_feeds,
            new_items = report.new_items,
            delivered = report.delivered,
            delivery_failures = report.delivery_failures,
            duration_ms = started_at.elapsed().as_millis() as u64,
            "feed check completed"
        );
        report
    }

    fn process_feed(&self, registration: &FeedRegistration, now: DateTime<Utc>) -> CycleReport {
        let span = info_span!("feed", feed_id = %registration.id, url = %registration.url);
        let _entered = span.enter();

        let mut report = CycleReport {
            feeds: 1,
            ..CycleReport::default()
        };

        // Only an unparsable row is overwritten; after any other read error
        // the stored watermark is left untouched.
        let (stored, may_persist) = match self.store.get_watermark(registration.id) {
            Ok(stored) => (stored, true),
            Err(err @ StoreError::CorruptWatermark { .. }) => {
                warn!(error = %err, "stored watermark is unreadable, replacing it");
                (None, true)
            }
            Err(err) => {
                warn!(error = %err, "failed to read watermark, using seed");
                (None, false)
            }
        };
        let watermark = stored.unwrap_or_else(|| default_seed(now));

        let items = match self.source.fetch_and_parse(&registration.url) {
            Ok(items) => items,
            Err(err) => {
                error!(error = %err, "failed to get items for feed");
                report.failed_feeds = 1;
                return report;
            }
        };

        let changes = detect(&items, watermark);
        debug!(
            items = items.len(),
            undated_head = items
                .first()
                .is_some_and(|item| item.effective_timestamp().is_none()),
            new_items = changes.new_items.len(),
            watermark = %watermark,
            next_watermark = %changes.next_watermark,
            "detected changes"
        );

        if may_persist && (stored.is_none() || changes.next_watermark != watermark) {
            if let Err(err) = self.store.set_watermark(registration.id, changes.next_watermark) {
                error!(error = %err, "failed to persist watermark");
            }
        }

        if !changes.is_empty() {
            info!(new_items = changes.new_items.len(), "found new items");
        }

        report.new_items = changes.new_items.len();
        for item in &changes.new_items {
            let event = NotificationEvent::from(item);
            match self.notifier.deliver(&event, &self.destination) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    warn!(error = %err, link = %event.link, "failed to send event");
                    report.delivery_failures += 1;
                }
            }
        }

        report
    }
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

/// Fixed-rate schedule.  Ticks missed while a cycle overran are dropped
/// rather than replayed.
struct Ticker {
    interval: Duration,
    deadline: Instant,
}

/// Longest period the schedule accepts; longer intervals are clamped.
const MAX_TICK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

impl Ticker {
    fn new(interval: Duration, start: Instant) -> Self {
        let interval = interval.clamp(Duration::from_millis(1), MAX_TICK);
        Self {
            interval,
            deadline: start + interval,
        }
    }

    /// How long to sleep at `now` before the next cycle, advancing the
    /// schedule past it.
    fn delay(&mut self, now: Instant) -> Duration {
        if now < self.deadline {
            let wait = self.deadline - now;
            self.deadline += self.interval;
            return wait;
        }
        while self.deadline <= now {
            self.deadline += self.interval;
        }
        Duration::ZERO
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
