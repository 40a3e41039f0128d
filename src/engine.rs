//! The collection loop: queries → pages → stats → filter/dedupe → store, with
//! credential rotation on quota exhaustion and fixed backoff on other failures.

use crate::catalog::CatalogClient;
use crate::config::HarvestOptions;
use crate::error::{HarvestError, RemoteError};
use crate::progress::ProgressScope;
use crate::record::{ChannelRecord, ChannelStats};
use crate::rotation::CredentialRotator;
use crate::store::ResultStore;
use crate::util::{init_tracing_once, pause};
use anyhow::Result;

/// Where the engine is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Running,
    /// A search or stats call for the current page is outstanding (or being retried).
    AwaitingPage,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    QueriesExhausted,
}

/// What a finished run did. Counts cover this run only, except `total`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub resumed: usize,
    pub accepted: usize,
    pub rejected_below_threshold: usize,
    pub duplicates_skipped: usize,
    pub pages_fetched: usize,
    pub checkpoints: u64,
    pub rotations: usize,
    pub stop_reason: StopReason,
}

#[derive(Default)]
struct Counters {
    accepted: usize,
    rejected: usize,
    duplicates: usize,
    pages: usize,
    rotations: usize,
    consecutive_failures: u32,
}

pub struct CollectionEngine<C> {
    opts: HarvestOptions,
    client: C,
    rotator: CredentialRotator,
    store: ResultStore,
    state: EngineState,
    resumed: usize,
    counters: Counters,
}

impl<C: CatalogClient> CollectionEngine<C> {
    /// Validate `opts`, build the rotator and load whatever `opts.output` already holds.
    /// Configuration and storage-read failures surface here, before any remote call.
    pub fn new(opts: HarvestOptions, client: C) -> Result<Self> {
        opts.validate()?;
        let rotator = CredentialRotator::new(opts.credentials.iter().cloned())?;
        let store = ResultStore::open(&opts.output, opts.checkpoint_every)?;
        let resumed = store.len();
        Ok(Self {
            opts,
            client,
            rotator,
            store,
            state: EngineState::Running,
            resumed,
            counters: Counters::default(),
        })
    }

    #[inline] pub fn state(&self) -> EngineState { self.state }
    #[inline] pub fn store(&self) -> &ResultStore { &self.store }
    #[inline] pub fn rotator(&self) -> &CredentialRotator { &self.rotator }
    #[inline] pub fn options(&self) -> &HarvestOptions { &self.opts }

    /// Drive the loop until the target is reached or every query is exhausted,
    /// then write the final snapshot.
    pub fn run(&mut self) -> Result<RunSummary> {
        init_tracing_once();
        self.state = EngineState::Running;
        tracing::info!("Using API key #{} ({})", self.rotator.index(), self.rotator.masked_current());

        let pb = ProgressScope::count("Collecting channels", self.opts.target as u64, self.opts.progress);
        pb.set_position(self.store.len() as u64);

        let stop_reason = match self.collect(&pb) {
            Ok(reason) => reason,
            Err(e) => {
                if let Some(HarvestError::RetriesExhausted { .. }) = e.downcast_ref::<HarvestError>() {
                    // keep what was accepted before giving up
                    if let Err(flush_err) = self.store.flush_final() {
                        tracing::error!("final save after giving up failed: {flush_err:#}");
                    }
                }
                self.state = EngineState::Done;
                pb.finish("aborted");
                return Err(e);
            }
        };

        self.store.flush_final()?;
        self.state = EngineState::Done;
        pb.finish("done");
        tracing::info!("Finished! Collected {} channels ({:?}).", self.store.len(), stop_reason);

        Ok(RunSummary {
            total: self.store.len(),
            resumed: self.resumed,
            accepted: self.counters.accepted,
            rejected_below_threshold: self.counters.rejected,
            duplicates_skipped: self.counters.duplicates,
            pages_fetched: self.counters.pages,
            checkpoints: self.store.checkpoints(),
            rotations: self.counters.rotations,
            stop_reason,
        })
    }

    fn collect(&mut self, pb: &ProgressScope) -> Result<StopReason> {
        if self.target_reached() {
            tracing::info!("Already holding {} channels (target {}); nothing to do.", self.store.len(), self.opts.target);
            return Ok(StopReason::TargetReached);
        }

        let queries = self.opts.queries.clone();
        let page_size = self.opts.page_size;

        for query in &queries {
            tracing::info!("Searching for: {query}");
            pb.set_label(query.as_str());
            let mut page_token: Option<String> = None;

            loop {
                self.state = EngineState::AwaitingPage;
                let page = self.call("search", |client, key| {
                    client.search_channels(key, query, page_token.as_deref(), page_size)
                })?;
                self.counters.pages += 1;

                let stats = if page.channel_ids.is_empty() {
                    Vec::new()
                } else {
                    self.call("stats", |client, key| client.channel_stats(key, &page.channel_ids))?
                };
                self.state = EngineState::Running;
                tracing::debug!(
                    query = query.as_str(),
                    candidates = page.channel_ids.len(),
                    stats = stats.len(),
                    "page fetched"
                );

                for s in stats {
                    self.absorb(s, query)?;
                    pb.set_position(self.store.len() as u64);
                    if self.target_reached() {
                        return Ok(StopReason::TargetReached);
                    }
                }

                match page.next_page_token {
                    Some(token) => page_token = Some(token),
                    None => break,
                }
            }
        }
        Ok(StopReason::QueriesExhausted)
    }

    /// Filter and dedupe one stats record, appending and checkpointing when it passes.
    fn absorb(&mut self, stats: ChannelStats, query: &str) -> Result<()> {
        if self.store.contains(&stats.channel_id) {
            self.counters.duplicates += 1;
            return Ok(());
        }
        if stats.subscriber_count < self.opts.min_subscribers {
            tracing::debug!("skip {}: {} subscribers", stats.channel_id, stats.subscriber_count);
            self.counters.rejected += 1;
            return Ok(());
        }
        if self.store.append(ChannelRecord::from_stats(stats, query)) {
            self.counters.accepted += 1;
            if self.store.checkpoint_due() {
                self.store.checkpoint()?;
            }
        }
        Ok(())
    }

    /// Run `op` under the current credential until it succeeds. Quota errors rotate
    /// to the next credential and retry at once; other failures sleep first.
    fn call<T>(
        &mut self,
        what: &str,
        mut op: impl FnMut(&C, &str) -> Result<T, RemoteError>,
    ) -> Result<T> {
        loop {
            let err = match op(&self.client, self.rotator.current()) {
                Ok(v) => {
                    self.counters.consecutive_failures = 0;
                    return Ok(v);
                }
                Err(err) => err,
            };

            self.counters.consecutive_failures += 1;
            if let Some(cap) = self.opts.max_consecutive_failures {
                if self.counters.consecutive_failures >= cap {
                    return Err(HarvestError::RetriesExhausted {
                        failures: self.counters.consecutive_failures,
                        last: err,
                    }
                    .into());
                }
            }

            match &err {
                RemoteError::QuotaExceeded(_) => {
                    let from = self.rotator.index();
                    self.rotator.advance();
                    self.counters.rotations += 1;
                    tracing::warn!(
                        "Quota exceeded for key #{from} during {what}. Switching to key #{} ({})",
                        self.rotator.index(),
                        self.rotator.masked_current()
                    );
                }
                RemoteError::RateLimited(_) => {
                    tracing::warn!("Rate limited during {what}: {err}. Waiting {:?}", self.opts.rate_limit_backoff);
                    pause(self.opts.rate_limit_backoff);
                }
                RemoteError::Other(_) => {
                    tracing::warn!("API error during {what}: {err}. Retrying in {:?}", self.opts.remote_error_backoff);
                    pause(self.opts.remote_error_backoff);
                }
            }
        }
    }

    #[inline]
    fn target_reached(&self) -> bool {
        self.store.len() >= self.opts.target
    }
}
