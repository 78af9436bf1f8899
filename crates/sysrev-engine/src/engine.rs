//! The orchestration engine and its run state machine.

use std::collections::HashSet;
use std::task::Poll;
use std::time::Instant;

use futures_util::future::poll_fn;
use futures_util::Stream;
use serde::Serialize;
use sysrev_cache::SearchCache;
use sysrev_common::{Result, SysrevError};
use sysrev_model::{Article, SearchRequest, SearchRequestSource, SearchResponse, Source};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::source::{ResponseStream, SearchSource};

// ── Progress events ──────────────────────────────────────────────────────────

/// Progress event emitted during a run (cloneable for broadcast).
#[derive(Debug, Clone, Serialize)]
pub struct EngineProgress {
    pub run_id: Uuid,
    pub stage: &'static str,
    pub accepted: u64,
    pub pending_streams: usize,
    pub failed_streams: usize,
}

// ── Run summary ──────────────────────────────────────────────────────────────

/// Outcome of one engine run. A run that only lost individual sources still
/// completes; `failed_sources` carries what was lost.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub accepted: u64,
    pub checkpoints: u64,
    pub skipped_cached: usize,
    pub failed_sources: Vec<(Source, String)>,
    pub cancelled: bool,
    pub duration_ms: u64,
}

// ── Per-stream state ─────────────────────────────────────────────────────────

struct PendingStream {
    key: SearchRequestSource,
    stream: ResponseStream,
}

/// What one polling attempt produced. Exhaustion and failure are explicit
/// values, not exceptions; a stream that had nothing ready simply emits no
/// event and stays pending.
enum StreamEvent {
    Item {
        key: SearchRequestSource,
        response: SearchResponse,
    },
    Exhausted {
        key: SearchRequestSource,
    },
    Failed {
        key: SearchRequestSource,
        error: SysrevError,
    },
}

/// Poll every pending stream exactly once. Exhausted and failed streams are
/// retired from `pending` here; streams that yielded an item or nothing stay.
async fn poll_round(pending: &mut Vec<PendingStream>) -> Vec<StreamEvent> {
    poll_fn(|cx| {
        let mut events = Vec::new();
        let mut i = 0;
        while i < pending.len() {
            match pending[i].stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(response))) => {
                    events.push(StreamEvent::Item {
                        key: pending[i].key.clone(),
                        response,
                    });
                    i += 1;
                }
                Poll::Ready(Some(Err(error))) => {
                    let retired = pending.swap_remove(i);
                    events.push(StreamEvent::Failed {
                        key: retired.key,
                        error,
                    });
                }
                Poll::Ready(None) => {
                    let retired = pending.swap_remove(i);
                    events.push(StreamEvent::Exhausted { key: retired.key });
                }
                Poll::Pending => {
                    i += 1;
                }
            }
        }
        Poll::Ready(events)
    })
    .await
}

// ── Engine ───────────────────────────────────────────────────────────────────

/// Drives all (request × source) pairs concurrently against the cache.
///
/// The cache is mutated exclusively by the polling loop; adapters only return
/// immutable response values. One failing source never aborts the others, but
/// a checkpoint write failure aborts the run immediately.
pub struct SearchEngine {
    config: EngineConfig,
    sources: Vec<Box<dyn SearchSource>>,
    requests: HashSet<SearchRequest>,
    cache: SearchCache,
    found_titles: HashSet<String>,
    progress: Option<broadcast::Sender<EngineProgress>>,
    cancel: CancellationToken,
}

impl SearchEngine {
    pub fn new(config: EngineConfig) -> Self {
        let cache = SearchCache::new(config.ignore_case);
        Self {
            config,
            sources: Vec::new(),
            requests: HashSet::new(),
            cache,
            found_titles: HashSet::new(),
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn add_source(&mut self, source: Box<dyn SearchSource>) {
        self.sources.push(source);
    }

    pub fn add_request(&mut self, request: SearchRequest) {
        self.requests.insert(request);
    }

    /// Token that cancels the run cooperatively: polling stops, one final
    /// checkpoint captures accepted-but-unsaved responses and the streams are
    /// dropped. Skip-if-cached planning makes the next run resume cleanly.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Subscribe to progress events for this engine.
    pub fn subscribe_progress(&mut self) -> broadcast::Receiver<EngineProgress> {
        match &self.progress {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = broadcast::channel(64);
                self.progress = Some(tx);
                rx
            }
        }
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    /// Normalized titles accepted during the most recent run.
    pub fn found_titles(&self) -> &HashSet<String> {
        &self.found_titles
    }

    /// Unique articles whose normalized title appeared during the most recent
    /// run (not the whole historical cache).
    pub fn found_articles(&self) -> impl Iterator<Item = &Article> {
        self.cache
            .unique_articles()
            .filter(|article| self.found_titles.contains(article.normalized_title()))
    }

    fn emit(&self, run_id: Uuid, stage: &'static str, accepted: u64, pending: usize, failed: usize) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(EngineProgress {
                run_id,
                stage,
                accepted,
                pending_streams: pending,
                failed_streams: failed,
            });
        }
    }

    /// Execute one run to completion (or cancellation).
    ///
    /// Fatal errors: a corrupt snapshot at startup, or any checkpoint write
    /// failure. Individual source failures are contained and reported in the
    /// summary.
    #[instrument(skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn run(&mut self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        let started = Instant::now();

        // 1. Initialize: resume from the snapshot when one exists. A snapshot
        // that fails to decode is fatal; silently starting empty would mask
        // data loss.
        if self.config.cache_path.exists() {
            self.cache = SearchCache::load(&self.config.cache_path, self.config.compress)?;
            info!(responses = self.cache.len(), "resumed from cache snapshot");
        } else {
            self.cache = SearchCache::new(self.config.ignore_case);
            info!("no cache snapshot, starting empty");
        }
        self.found_titles.clear();

        // 2. Plan: cross product minus already-cached pairs.
        let mut pending: Vec<PendingStream> = Vec::new();
        let mut skipped_cached = 0;
        for request in &self.requests {
            for source in &self.sources {
                let key = SearchRequestSource::new(request.clone(), source.source());
                if !self.config.ignore_cached && self.cache.contains(&key) {
                    debug!(key = %key, "pair already cached, skipping");
                    skipped_cached += 1;
                    continue;
                }
                pending.push(PendingStream {
                    key,
                    stream: source.search(request),
                });
            }
        }
        info!(
            streams = pending.len(),
            skipped_cached,
            requests = self.requests.len(),
            sources = self.sources.len(),
            "run planned"
        );

        let mut accepted: u64 = 0;
        let mut checkpoints: u64 = 0;
        let mut unsaved: u64 = 0;
        let mut failed_sources: Vec<(Source, String)> = Vec::new();
        self.emit(run_id, "planned", accepted, pending.len(), 0);

        // 3. Poll loop: one attempt per stream per round.
        while !pending.is_empty() && !self.cancel.is_cancelled() {
            for event in poll_round(&mut pending).await {
                match event {
                    StreamEvent::Item { key, response } => {
                        self.found_titles
                            .insert(response.article.normalized_title().to_string());
                        debug!(key = %key, title = response.article.title(), "response accepted");
                        self.cache.put(&key, response);
                        accepted += 1;
                        unsaved += 1;
                        // 4. Periodic checkpoint; a write failure is fatal.
                        if self.config.checkpoint_every > 0
                            && accepted % self.config.checkpoint_every == 0
                        {
                            self.cache
                                .dump(&self.config.cache_path, self.config.compress)?;
                            checkpoints += 1;
                            unsaved = 0;
                            debug!(accepted, "periodic checkpoint written");
                        }
                    }
                    StreamEvent::Exhausted { key } => {
                        debug!(key = %key, "stream exhausted");
                    }
                    StreamEvent::Failed { key, error } => {
                        warn!(key = %key, error = %error, "stream failed, retiring");
                        failed_sources.push((key.source, error.to_string()));
                    }
                }
            }
            self.emit(
                run_id,
                "polling",
                accepted,
                pending.len(),
                failed_sources.len(),
            );
            if pending.is_empty() {
                break;
            }
            // 5. Throttle: once per round, cancellation-aware.
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_delay) => {}
            }
        }

        let cancelled = !pending.is_empty();
        drop(pending);

        // 6. Final checkpoint: unconditional on normal termination; on
        // cancellation only when accepted responses are not yet durable.
        if !cancelled || unsaved > 0 {
            self.cache
                .dump(&self.config.cache_path, self.config.compress)?;
            checkpoints += 1;
        }

        let summary = RunSummary {
            run_id,
            accepted,
            checkpoints,
            skipped_cached,
            failed_sources,
            cancelled,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        self.emit(
            run_id,
            if cancelled { "cancelled" } else { "complete" },
            accepted,
            0,
            summary.failed_sources.len(),
        );
        info!(
            accepted = summary.accepted,
            checkpoints = summary.checkpoints,
            failed = summary.failed_sources.len(),
            cancelled,
            duration_ms = summary.duration_ms,
            "run finished"
        );
        Ok(summary)
    }
}
