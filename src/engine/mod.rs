//! Scroll-drive harvest engine.
//!
//! # Architecture
//!
//! ```text
//! Harvester ─┬─ FeedSurface::snapshot → Locator → PromptResolver → RecordStore → PresentationSink
//!            └─ settle wait → scroll step → stall check → (repeat)
//! ```
//!
//! A run is one sequential task. It suspends at fixed waits, settle polls and
//! clipboard round-trips, and checks its [`CancellationToken`] before each
//! item, around the settle wait and before each scroll step. Feed state is
//! re-read after every suspension; the host page owns the scroll position.

mod config;
mod resolver;
mod store;

pub use config::{
    HarvestConfig, DEFAULT_SCROLL_DELAY_MS, MAX_SCROLL_DELAY_MS, MIN_SCROLL_DELAY_MS,
};
pub use resolver::PromptResolver;
pub use store::RecordStore;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::app::{HarvestError, Result};
use crate::channel::ExternalChannel;
use crate::domain::{EngineState, Record, StopReason};
use crate::locator::{FeedSnapshot, Locator};
use crate::sink::PresentationSink;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("Feed container not found")]
    ContainerMissing,

    #[error("Page script failed: {0}")]
    Script(String),
}

/// The host's scrolling feed, as seen from the engine.
#[async_trait]
pub trait FeedSurface: Send + Sync {
    /// Raw item data currently rendered in the container.
    async fn snapshot(&self) -> std::result::Result<FeedSnapshot, FeedError>;

    /// Whether loading placeholders are visible.
    async fn is_loading(&self) -> std::result::Result<bool, FeedError>;

    /// Current scroll offset of the container.
    async fn scroll_offset(&self) -> std::result::Result<f64, FeedError>;

    /// Ask the container to scroll by `delta` with smooth motion.
    async fn scroll_by(&self, delta: f64) -> std::result::Result<(), FeedError>;
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub state: EngineState,
    pub reason: StopReason,
    pub records: Vec<Record>,
}

/// Drives the feed and collects records until it stalls or is cancelled.
pub struct Harvester {
    feed: Arc<dyn FeedSurface>,
    locator: Arc<dyn Locator>,
    channel: Arc<dyn ExternalChannel>,
    config: HarvestConfig,
    state: watch::Sender<EngineState>,
}

impl Harvester {
    pub fn new(
        feed: Arc<dyn FeedSurface>,
        locator: Arc<dyn Locator>,
        channel: Arc<dyn ExternalChannel>,
        config: HarvestConfig,
    ) -> Self {
        let (state, _) = watch::channel(EngineState::Idle);
        Self {
            feed,
            locator,
            channel,
            config,
            state,
        }
    }

    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    /// Watch engine state transitions.
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.state.subscribe()
    }

    /// Run one harvest pass over the feed.
    ///
    /// Returns [`HarvestError::AlreadyRunning`] if a run is in progress and a
    /// clipboard error if the clipboard is not readable; in the latter case
    /// the state becomes [`EngineState::Aborted`] and no batch is emitted.
    /// Every other ending emits exactly one batch to `sink`.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        sink: &mut dyn PresentationSink,
    ) -> Result<RunOutcome> {
        let mut started = false;
        self.state.send_if_modified(|state| {
            if state.is_running() {
                return false;
            }
            *state = EngineState::Running;
            started = true;
            true
        });
        if !started {
            return Err(HarvestError::AlreadyRunning);
        }
        let guard = RunGuard::new(&self.state);

        info!("Harvest started");
        sink.on_status("Harvesting...");
        tokio::time::sleep(self.config.warm_up()).await;

        let resolver = PromptResolver::new(self.channel.as_ref(), self.config.copy_settle());
        if let Err(e) = resolver.ensure_access().await {
            error!("Clipboard is not readable: {}", e);
            sink.on_status("Clipboard read access is required to retrieve full prompts");
            guard.finish(EngineState::Aborted);
            return Err(e.into());
        }

        let mut store = RecordStore::new();
        let reason = self.drive(cancel, &resolver, &mut store, sink).await;

        let state = reason.terminal_state();
        info!(
            "Harvest finished ({:?}) with {} unique records",
            reason,
            store.len()
        );
        sink.on_status(&format!(
            "Harvest finished ({} unique images)",
            store.len()
        ));
        sink.on_batch_complete(store.records());
        guard.finish(state);

        Ok(RunOutcome {
            state,
            reason,
            records: store.into_records(),
        })
    }

    async fn drive(
        &self,
        cancel: &CancellationToken,
        resolver: &PromptResolver<'_>,
        store: &mut RecordStore,
        sink: &mut dyn PresentationSink,
    ) -> StopReason {
        let mut last_offset = 0.0;
        let mut unchanged = 0;

        loop {
            if cancel.is_cancelled() {
                return StopReason::Cancelled;
            }

            let snapshot = match self.feed.snapshot().await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    error!("Cannot read feed: {}", e);
                    return StopReason::ContainerMissing;
                }
            };

            let candidates = self.locator.find_candidates(&snapshot);
            debug!(
                "Found {} candidates in {} links",
                candidates.len(),
                snapshot.anchors.len()
            );

            for candidate in candidates {
                if cancel.is_cancelled() {
                    info!("Stop requested while processing items");
                    break;
                }
                if store.contains(&candidate.job_id) {
                    continue;
                }

                let prompt = resolver.resolve(&candidate).await;
                let record = Record::new(
                    candidate.job_id,
                    candidate.job_link,
                    candidate.img_link,
                    candidate.author,
                    &prompt,
                );
                if store.insert(record) {
                    if let Some(inserted) = store.last() {
                        debug!("Added job {}", inserted.job_id);
                        sink.on_incremental_record(inserted);
                    }
                    sink.on_status(&format!(
                        "Harvesting... ({} unique images)",
                        store.len()
                    ));
                }
            }

            if cancel.is_cancelled() {
                return StopReason::Cancelled;
            }

            if self.settle(cancel).await {
                return StopReason::Cancelled;
            }

            let offset = match self.feed.scroll_offset().await {
                Ok(offset) => offset,
                Err(e) => {
                    error!("Cannot read scroll offset: {}", e);
                    return StopReason::ContainerMissing;
                }
            };
            if let Err(e) = self.feed.scroll_by(self.config.scroll_step).await {
                error!("Cannot scroll feed: {}", e);
                return StopReason::ContainerMissing;
            }
            if pause(cancel, self.config.scroll_delay()).await {
                return StopReason::Cancelled;
            }

            // The offset is sampled before the step, so a repeat means the
            // previous step did not move the feed.
            if offset == last_offset {
                unchanged += 1;
                debug!("Scroll offset unchanged at {} ({} in a row)", offset, unchanged);
                if unchanged >= self.config.stall_threshold {
                    info!("Reached the end of the feed");
                    return StopReason::Exhausted;
                }
            } else {
                unchanged = 0;
                last_offset = offset;
            }
        }
    }

    /// Wait while the feed shows loading placeholders. Returns `true` if
    /// cancelled.
    async fn settle(&self, cancel: &CancellationToken) -> bool {
        loop {
            if cancel.is_cancelled() {
                return true;
            }
            match self.feed.is_loading().await {
                Ok(true) => {}
                Ok(false) => return false,
                Err(e) => {
                    warn!("Cannot check loading state: {}", e);
                    return false;
                }
            }
            if pause(cancel, self.config.settle_poll()).await {
                return true;
            }
        }
    }
}

/// Leaves `Running` when a run future is dropped before it finishes.
struct RunGuard<'a> {
    state: &'a watch::Sender<EngineState>,
    armed: bool,
}

impl<'a> RunGuard<'a> {
    fn new(state: &'a watch::Sender<EngineState>) -> Self {
        Self { state, armed: true }
    }

    fn finish(mut self, state: EngineState) {
        self.armed = false;
        self.state.send_replace(state);
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("Harvest dropped before finishing");
        self.state.send_if_modified(|state| {
            if state.is_terminal() {
                return false;
            }
            *state = EngineState::Cancelled;
            true
        });
    }
}

/// Sleep for `duration` unless cancelled first. Returns `true` if cancelled.
async fn pause(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::channel::{ControlId, MemoryChannel};
    use crate::domain::PROMPT_NOT_FOUND;
    use crate::locator::{ExploreLocator, RawAnchor};

    /// Feed whose items appear as the offset grows.
    struct FakeFeed {
        inner: Mutex<FeedInner>,
    }

    struct FeedInner {
        /// (offset at which the item is rendered, anchor)
        items: Vec<(f64, RawAnchor)>,
        offset: f64,
        max_offset: f64,
        loading_polls: usize,
        container: bool,
        snapshots: usize,
        scrolls: usize,
        loading_checks: usize,
        cancel_on_scroll: Option<CancellationToken>,
    }

    impl FakeFeed {
        fn new(items: Vec<(f64, RawAnchor)>, max_offset: f64) -> Self {
            Self {
                inner: Mutex::new(FeedInner {
                    items,
                    offset: 0.0,
                    max_offset,
                    loading_polls: 0,
                    container: true,
                    snapshots: 0,
                    scrolls: 0,
                    loading_checks: 0,
                    cancel_on_scroll: None,
                }),
            }
        }

        fn loading_for(self, polls: usize) -> Self {
            self.inner.lock().unwrap().loading_polls = polls;
            self
        }

        fn without_container(self) -> Self {
            self.inner.lock().unwrap().container = false;
            self
        }

        fn cancel_on_scroll(self, token: CancellationToken) -> Self {
            self.inner.lock().unwrap().cancel_on_scroll = Some(token);
            self
        }

        fn scrolls(&self) -> usize {
            self.inner.lock().unwrap().scrolls
        }

        fn snapshots(&self) -> usize {
            self.inner.lock().unwrap().snapshots
        }

        fn loading_checks(&self) -> usize {
            self.inner.lock().unwrap().loading_checks
        }
    }

    #[async_trait]
    impl FeedSurface for FakeFeed {
        async fn snapshot(&self) -> std::result::Result<FeedSnapshot, FeedError> {
            let mut inner = self.inner.lock().unwrap();
            if !inner.container {
                return Err(FeedError::ContainerMissing);
            }
            inner.snapshots += 1;
            let offset = inner.offset;
            let anchors = inner
                .items
                .iter()
                .filter(|(at, _)| *at <= offset)
                .map(|(_, anchor)| anchor.clone())
                .collect();
            Ok(FeedSnapshot { anchors })
        }

        async fn is_loading(&self) -> std::result::Result<bool, FeedError> {
            let mut inner = self.inner.lock().unwrap();
            inner.loading_checks += 1;
            if inner.loading_polls > 0 {
                inner.loading_polls -= 1;
                return Ok(true);
            }
            Ok(false)
        }

        async fn scroll_offset(&self) -> std::result::Result<f64, FeedError> {
            Ok(self.inner.lock().unwrap().offset)
        }

        async fn scroll_by(&self, delta: f64) -> std::result::Result<(), FeedError> {
            let mut inner = self.inner.lock().unwrap();
            inner.scrolls += 1;
            inner.offset = (inner.offset + delta).min(inner.max_offset);
            if let Some(token) = &inner.cancel_on_scroll {
                token.cancel();
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        incremental: Vec<Record>,
        batches: Vec<Vec<Record>>,
        statuses: Vec<String>,
        cancel_after: Option<(usize, CancellationToken)>,
    }

    impl PresentationSink for RecordingSink {
        fn on_incremental_record(&mut self, record: &Record) {
            self.incremental.push(record.clone());
            if let Some((limit, token)) = &self.cancel_after {
                if self.incremental.len() >= *limit {
                    token.cancel();
                }
            }
        }

        fn on_batch_complete(&mut self, records: &[Record]) {
            self.batches.push(records.to_vec());
        }

        fn on_status(&mut self, text: &str) {
            self.statuses.push(text.to_string());
        }
    }

    fn item(job_id: &str) -> RawAnchor {
        RawAnchor {
            href: format!("https://www.midjourney.com/jobs/{job_id}?index=0"),
            style: Some(format!(
                r#"background-image: url("https://cdn.midjourney.com/{job_id}/0_0_640_N.webp")"#
            )),
            copy_control: Some(ControlId::new(format!("copy-{job_id}"))),
            ..RawAnchor::default()
        }
    }

    fn channel_for(job_ids: &[&str]) -> MemoryChannel {
        job_ids.iter().fold(MemoryChannel::new("clipboard"), |channel, id| {
            channel.with_control(format!("copy-{id}"), format!("prompt {id} --ar 1:1"))
        })
    }

    fn harvester(feed: Arc<FakeFeed>, channel: Arc<MemoryChannel>) -> Harvester {
        Harvester::new(
            feed,
            Arc::new(ExploreLocator),
            channel,
            HarvestConfig::default(),
        )
    }

    fn job_ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.job_id.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_feed_ends_after_threshold() {
        let feed = Arc::new(FakeFeed::new(vec![(0.0, item("a")), (0.0, item("b"))], 0.0));
        let channel = Arc::new(channel_for(&["a", "b"]));
        let engine = harvester(feed.clone(), channel.clone());
        let mut sink = RecordingSink::default();

        let outcome = engine
            .run(&CancellationToken::new(), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome.state, EngineState::Stalled);
        assert_eq!(outcome.reason, StopReason::Exhausted);
        assert_eq!(engine.state(), EngineState::Stalled);
        assert_eq!(feed.scrolls(), 5);
        assert_eq!(sink.batches.len(), 1);
        assert_eq!(job_ids(&sink.batches[0]), vec!["a", "b"]);
        assert_eq!(job_ids(&sink.incremental), vec!["a", "b"]);
        // Repeated passes see the same items but press copy once per job.
        assert_eq!(channel.triggered().len(), 2);
        assert_eq!(channel.contents(), "clipboard");
    }

    #[tokio::test(start_paused = true)]
    async fn test_items_collected_while_scrolling() {
        let feed = Arc::new(FakeFeed::new(
            vec![
                (0.0, item("a")),
                (0.0, item("b")),
                (600.0, item("c")),
                (1200.0, item("d")),
                (1200.0, item("a")),
            ],
            1200.0,
        ));
        let channel = Arc::new(channel_for(&["a", "b", "c", "d"]));
        let engine = harvester(feed.clone(), channel);
        let mut sink = RecordingSink::default();

        let outcome = engine
            .run(&CancellationToken::new(), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome.reason, StopReason::Exhausted);
        assert_eq!(job_ids(&outcome.records), vec!["a", "b", "c", "d"]);
        // 0 (stall 1), 600, 1200, then 1200 five times.
        assert_eq!(feed.scrolls(), 8);
        let first = &outcome.records[0];
        assert_eq!(first.prompt, "prompt a");
        assert_eq!(first.prompt_params, "--ar 1:1");
        assert_eq!(first.img_link, "https://cdn.midjourney.com/a/0_0.webp");
        assert_eq!(
            sink.statuses.last().map(String::as_str),
            Some("Harvest finished (4 unique images)")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_items_stops_inserting() {
        let feed = Arc::new(FakeFeed::new(
            vec![(0.0, item("a")), (0.0, item("b")), (0.0, item("c"))],
            3000.0,
        ));
        let channel = Arc::new(channel_for(&["a", "b", "c"]));
        let engine = harvester(feed.clone(), channel.clone());
        let token = CancellationToken::new();
        let mut sink = RecordingSink {
            cancel_after: Some((1, token.clone())),
            ..RecordingSink::default()
        };

        let outcome = engine.run(&token, &mut sink).await.unwrap();

        assert_eq!(outcome.state, EngineState::Cancelled);
        assert_eq!(outcome.reason, StopReason::Cancelled);
        assert_eq!(job_ids(&outcome.records), vec!["a"]);
        assert_eq!(channel.triggered().len(), 1);
        assert_eq!(feed.scrolls(), 0);
        assert_eq!(sink.batches.len(), 1);
        assert_eq!(sink.batches[0].len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_start_emits_empty_batch() {
        let feed = Arc::new(FakeFeed::new(vec![(0.0, item("a"))], 0.0));
        let engine = harvester(feed.clone(), Arc::new(channel_for(&["a"])));
        let token = CancellationToken::new();
        token.cancel();
        let mut sink = RecordingSink::default();

        let outcome = engine.run(&token, &mut sink).await.unwrap();

        assert_eq!(outcome.state, EngineState::Cancelled);
        assert!(outcome.records.is_empty());
        assert_eq!(feed.snapshots(), 0);
        assert_eq!(sink.batches, vec![Vec::<Record>::new()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_clipboard_aborts_without_batch() {
        let feed = Arc::new(FakeFeed::new(vec![(0.0, item("a"))], 0.0));
        let channel = Arc::new(MemoryChannel::new("x").deny_access());
        let engine = harvester(feed.clone(), channel);
        let mut sink = RecordingSink::default();

        let err = engine
            .run(&CancellationToken::new(), &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, HarvestError::ClipboardDenied(_)));
        assert_eq!(engine.state(), EngineState::Aborted);
        assert!(sink.batches.is_empty());
        assert_eq!(feed.snapshots(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_container_ends_run() {
        let feed = Arc::new(FakeFeed::new(vec![], 0.0).without_container());
        let engine = harvester(feed, Arc::new(MemoryChannel::new("x")));
        let mut sink = RecordingSink::default();

        let outcome = engine
            .run(&CancellationToken::new(), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome.state, EngineState::Stalled);
        assert_eq!(outcome.reason, StopReason::ContainerMissing);
        assert_eq!(sink.batches.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_loading_to_finish() {
        let feed = Arc::new(FakeFeed::new(vec![(0.0, item("a"))], 0.0).loading_for(3));
        let engine = harvester(feed.clone(), Arc::new(channel_for(&["a"])));
        let mut sink = RecordingSink::default();

        engine
            .run(&CancellationToken::new(), &mut sink)
            .await
            .unwrap();

        // Three loading polls before the first scroll, then one per pass.
        assert_eq!(feed.loading_checks(), 3 + 5);
        assert_eq!(feed.scrolls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_item_without_copy_control_gets_sentinel() {
        let mut anchor = item("a");
        anchor.copy_control = None;
        let feed = Arc::new(FakeFeed::new(vec![(0.0, anchor)], 0.0));
        let engine = harvester(feed, Arc::new(MemoryChannel::new("x")));
        let mut sink = RecordingSink::default();

        let outcome = engine
            .run(&CancellationToken::new(), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].prompt, PROMPT_NOT_FOUND);
        assert_eq!(outcome.records[0].prompt_params, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_run_while_running_is_rejected() {
        let feed = Arc::new(FakeFeed::new(vec![(0.0, item("a"))], 0.0).loading_for(usize::MAX));
        let channel = Arc::new(channel_for(&["a"]));
        let engine = Arc::new(harvester(feed, channel.clone()));
        let token = CancellationToken::new();
        let mut states = engine.subscribe();

        let first = {
            let engine = engine.clone();
            let token = token.clone();
            tokio::spawn(async move {
                let mut sink = RecordingSink::default();
                engine.run(&token, &mut sink).await
            })
        };
        states.wait_for(|s| s.is_running()).await.unwrap();

        let mut sink = RecordingSink::default();
        let second = engine.run(&CancellationToken::new(), &mut sink).await;
        assert!(matches!(second, Err(HarvestError::AlreadyRunning)));

        // Let the first pass finish; the run then sits in the settle wait.
        while channel.triggered().is_empty() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(engine.state(), EngineState::Running);

        token.cancel();
        let outcome = first.await.unwrap().unwrap();
        assert_eq!(outcome.state, EngineState::Cancelled);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(*states.borrow_and_update(), EngineState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_scroll_delay() {
        let token = CancellationToken::new();
        let feed = Arc::new(
            FakeFeed::new(vec![(0.0, item("a"))], 0.0).cancel_on_scroll(token.clone()),
        );
        let engine = harvester(feed.clone(), Arc::new(channel_for(&["a"])));
        let mut sink = RecordingSink::default();

        let outcome = engine.run(&token, &mut sink).await.unwrap();

        assert_eq!(outcome.state, EngineState::Cancelled);
        assert_eq!(outcome.reason, StopReason::Cancelled);
        // The stalled feed would need five scrolls to end as exhausted.
        assert_eq!(feed.scrolls(), 1);
        assert_eq!(feed.snapshots(), 1);
        assert_eq!(sink.batches.len(), 1);
        assert_eq!(job_ids(&sink.batches[0]), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_run_does_not_stay_running() {
        let feed = Arc::new(FakeFeed::new(vec![(0.0, item("a"))], 0.0).loading_for(usize::MAX));
        let engine = harvester(feed, Arc::new(channel_for(&["a"])));
        let token = CancellationToken::new();

        let mut sink = RecordingSink::default();
        let timed_out =
            tokio::time::timeout(Duration::from_secs(5), engine.run(&token, &mut sink)).await;
        assert!(timed_out.is_err());
        assert!(sink.batches.is_empty());
        assert_eq!(engine.state(), EngineState::Cancelled);

        let stopped = CancellationToken::new();
        stopped.cancel();
        let mut sink = RecordingSink::default();
        let outcome = engine.run(&stopped, &mut sink).await.unwrap();
        assert_eq!(outcome.state, EngineState::Cancelled);
        assert_eq!(engine.state(), EngineState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_can_run_again_after_finishing() {
        let feed = Arc::new(FakeFeed::new(vec![(0.0, item("a"))], 0.0));
        let engine = harvester(feed, Arc::new(channel_for(&["a"])));

        let mut sink = RecordingSink::default();
        engine.run(&CancellationToken::new(), &mut sink).await.unwrap();
        let mut sink = RecordingSink::default();
        let outcome = engine.run(&CancellationToken::new(), &mut sink).await.unwrap();

        // Each run starts with an empty store.
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(sink.incremental.len(), 1);
    }
}
