//! Query execution coordinator
//!
//! Turns a stream of request changes into at most one execution per
//! settled request:
//!
//! ```text
//! submit ─▶ debouncing ─(window elapses)─▶ commit ─┬─ fresh hit ─▶ success
//!                                                  ├─ stale hit ─▶ success + refetch
//!                                                  └─ miss ──────▶ fetching ─▶ success | error
//! ```
//!
//! Every submit bumps the generation. A response is applied only if its
//! generation is still the latest requested and newer than the latest
//! applied, so a slow response can never overwrite a newer one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tokio::time::Instant;

use super::cache::{CacheLookup, ResultCache};
use super::debounce::Debouncer;
use super::errors::{ExecutionError, ExecutionResult};
use super::service::QueryService;
use super::state::{QuerySnapshot, QueryStatus};
use crate::config::VisualizerConfig;
use crate::observability::{log_event, Event, MetricsSnapshot, QueryMetrics};
use crate::request::{VisualizerQueryRequest, VisualizerQueryResult};

type SharedExecution = Shared<BoxFuture<'static, ExecutionResult<Arc<VisualizerQueryResult>>>>;

/// Timing policy of a coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorSettings {
    pub debounce: Duration,
    pub fresh_ttl: Duration,
    pub retain_ttl: Duration,
    pub request_timeout: Duration,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self::from_config(&VisualizerConfig::default())
    }
}

impl CoordinatorSettings {
    pub fn from_config(config: &VisualizerConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            fresh_ttl: Duration::from_secs(config.fresh_ttl_secs),
            retain_ttl: Duration::from_secs(config.retain_ttl_secs),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }
}

#[derive(Debug, Clone)]
struct PendingCommit {
    key: Arc<str>,
    request: Arc<VisualizerQueryRequest>,
    generation: u64,
}

struct InFlight {
    exec_id: u64,
    execution: SharedExecution,
}

struct Inner {
    debouncer: Debouncer,
    /// Request waiting for the debounce window
    pending: Option<PendingCommit>,
    /// Key of the last submitted request
    current_key: Option<Arc<str>>,
    /// Last committed request, for refetch
    committed: Option<PendingCommit>,
    cache: ResultCache,
    in_flight: HashMap<Arc<str>, InFlight>,
    latest_requested: u64,
    latest_applied: u64,
    next_exec_id: u64,
}

struct CoordinatorShared {
    service: Arc<dyn QueryService>,
    settings: CoordinatorSettings,
    state: watch::Sender<QuerySnapshot>,
    inner: Mutex<Inner>,
    metrics: QueryMetrics,
}

/// Debounced, cached, deduplicated execution of one session's requests
///
/// Must be used from within a tokio runtime.
pub struct QueryCoordinator {
    shared: Arc<CoordinatorShared>,
}

impl QueryCoordinator {
    pub fn new(service: Arc<dyn QueryService>, settings: CoordinatorSettings) -> Self {
        let (state, _) = watch::channel(QuerySnapshot::default());
        let inner = Inner {
            debouncer: Debouncer::new(settings.debounce),
            pending: None,
            current_key: None,
            committed: None,
            cache: ResultCache::new(settings.fresh_ttl, settings.retain_ttl),
            in_flight: HashMap::new(),
            latest_requested: 0,
            latest_applied: 0,
            next_exec_id: 0,
        };
        Self {
            shared: Arc::new(CoordinatorShared {
                service,
                settings,
                state,
                inner: Mutex::new(inner),
                metrics: QueryMetrics::new(),
            }),
        }
    }

    pub fn settings(&self) -> CoordinatorSettings {
        self.shared.settings
    }

    /// Current state
    pub fn snapshot(&self) -> QuerySnapshot {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified on every state transition
    pub fn subscribe(&self) -> watch::Receiver<QuerySnapshot> {
        self.shared.state.subscribe()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Accepts the latest serialized request
    ///
    /// An unchanged request is ignored. An unexecutable one cancels any
    /// pending commit and returns to idle. Anything else (re)starts the
    /// debounce window.
    pub fn submit(&self, request: VisualizerQueryRequest) {
        let key: Arc<str> = match request.cache_key() {
            Ok(key) => key.into(),
            Err(e) => {
                self.shared.fail_unencodable(e);
                return;
            }
        };

        let mut inner = self.shared.lock();
        if inner.current_key.as_deref() == Some(&*key) {
            return;
        }
        inner.current_key = Some(Arc::clone(&key));
        inner.latest_requested += 1;
        let generation = inner.latest_requested;

        if !request.is_executable() {
            inner.debouncer.cancel();
            inner.pending = None;
            self.shared.metrics.increment_gated();
            log_event(Event::QueryGated, &[("generation", &generation.to_string())]);
            self.shared.state.send_modify(|s| {
                *s = QuerySnapshot {
                    generation,
                    ..QuerySnapshot::default()
                };
            });
            return;
        }

        inner.pending = Some(PendingCommit {
            key,
            request: Arc::new(request),
            generation,
        });

        let weak = Arc::downgrade(&self.shared);
        let restarted = inner.debouncer.schedule(async move {
            if let Some(shared) = weak.upgrade() {
                CoordinatorShared::commit(&shared, generation);
            }
        });
        if restarted {
            self.shared.metrics.increment_debounce_restarts();
        }
        log_event(
            Event::QueryDebounced,
            &[
                ("generation", &generation.to_string()),
                ("restarted", if restarted { "true" } else { "false" }),
            ],
        );

        self.shared.state.send_modify(|s| {
            s.status = QueryStatus::Debouncing;
            s.generation = generation;
            s.is_fetching = false;
        });
    }

    /// Re-executes the last committed request, ignoring freshness
    ///
    /// No-op while a commit is pending or when nothing was committed.
    pub fn refetch(&self) {
        let mut inner = self.shared.lock();
        if inner.debouncer.is_pending() {
            return;
        }
        let Some(committed) = inner.committed.clone() else {
            return;
        };
        if inner.current_key.as_deref() != Some(&*committed.key) {
            return;
        }

        inner.latest_requested += 1;
        let commit = PendingCommit {
            generation: inner.latest_requested,
            ..committed
        };
        inner.cache.invalidate(&commit.key);
        inner.committed = Some(commit.clone());

        self.shared.state.send_modify(|s| {
            s.status = QueryStatus::Fetching;
            s.generation = commit.generation;
            s.is_fetching = true;
        });
        CoordinatorShared::start_fetch(&self.shared, &mut inner, commit);
    }

    /// Cancels everything and returns to idle; cached results are kept
    pub fn reset(&self) {
        let mut inner = self.shared.lock();
        inner.debouncer.cancel();
        inner.pending = None;
        inner.current_key = None;
        inner.committed = None;
        inner.latest_requested += 1;
        let generation = inner.latest_requested;
        self.shared.state.send_modify(|s| {
            *s = QuerySnapshot {
                generation,
                ..QuerySnapshot::default()
            };
        });
    }

    /// Drops every cached result
    pub fn clear_cache(&self) {
        self.shared.lock().cache.clear();
    }
}

impl CoordinatorShared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Debounce window for `armed` elapsed: serve from cache or execute
    ///
    /// A timer can fire while `submit` holds the lock and then block here
    /// past its own abort; it must not commit the request that replaced
    /// its own.
    fn commit(shared: &Arc<Self>, armed: u64) {
        let mut inner = shared.lock();
        if inner.pending.as_ref().map(|p| p.generation) != Some(armed) {
            return;
        }
        let Some(commit) = inner.pending.take() else {
            return;
        };
        if commit.generation != inner.latest_requested {
            return;
        }
        inner.committed = Some(commit.clone());
        shared.metrics.increment_commits();

        let generation = commit.generation.to_string();
        log_event(Event::QueryCommitted, &[("generation", &generation)]);

        match inner.cache.lookup(&commit.key, Instant::now()) {
            CacheLookup::Fresh(result, updated_at) => {
                shared.metrics.increment_cache_hits();
                log_event(Event::QueryCacheHit, &[("generation", &generation)]);
                inner.latest_applied = commit.generation;
                shared.state.send_modify(|s| {
                    s.status = QueryStatus::Success;
                    s.data = Some(result);
                    s.data_key = Some(commit.key.to_string());
                    s.data_updated_at = Some(updated_at);
                    s.error = None;
                    s.is_fetching = false;
                });
            }
            CacheLookup::Stale(result, updated_at) => {
                shared.metrics.increment_stale_hits();
                log_event(Event::QueryCacheStale, &[("generation", &generation)]);
                shared.state.send_modify(|s| {
                    s.status = QueryStatus::Success;
                    s.data = Some(result);
                    s.data_key = Some(commit.key.to_string());
                    s.data_updated_at = Some(updated_at);
                    s.error = None;
                    s.is_fetching = true;
                });
                Self::start_fetch(shared, &mut inner, commit);
            }
            CacheLookup::Miss => {
                shared.state.send_modify(|s| {
                    s.status = QueryStatus::Fetching;
                    s.is_fetching = true;
                });
                Self::start_fetch(shared, &mut inner, commit);
            }
        }
    }

    /// Starts or joins the execution for `commit.key` and applies its
    /// outcome when it resolves
    fn start_fetch(shared: &Arc<Self>, inner: &mut Inner, commit: PendingCommit) {
        let (exec_id, execution) = match inner.in_flight.get(&commit.key) {
            Some(in_flight) => {
                shared.metrics.increment_in_flight_joins();
                log_event(
                    Event::QueryJoinedInFlight,
                    &[("generation", &commit.generation.to_string())],
                );
                (in_flight.exec_id, in_flight.execution.clone())
            }
            None => {
                inner.next_exec_id += 1;
                let exec_id = inner.next_exec_id;
                let execution = Self::execution(shared, Arc::clone(&commit.request));
                inner.in_flight.insert(
                    Arc::clone(&commit.key),
                    InFlight {
                        exec_id,
                        execution: execution.clone(),
                    },
                );
                (exec_id, execution)
            }
        };

        let weak: Weak<Self> = Arc::downgrade(shared);
        tokio::spawn(async move {
            let outcome = execution.await;
            if let Some(shared) = weak.upgrade() {
                shared.complete(&commit, exec_id, outcome);
            }
        });
    }

    fn execution(shared: &Arc<Self>, request: Arc<VisualizerQueryRequest>) -> SharedExecution {
        shared.metrics.increment_executions();
        let service = Arc::clone(&shared.service);
        let timeout = shared.settings.request_timeout;
        async move {
            let started = Instant::now();
            let outcome = match tokio::time::timeout(timeout, service.execute(&request)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ExecutionError::timeout(timeout.as_millis() as u64)),
            };
            if let Ok(result) = &outcome {
                log_event(
                    Event::QueryExecuted,
                    &[
                        ("elapsed_ms", &started.elapsed().as_millis().to_string()),
                        ("row_count", &result.row_count.to_string()),
                    ],
                );
            }
            outcome.map(Arc::new)
        }
        .boxed()
        .shared()
    }

    fn complete(
        &self,
        commit: &PendingCommit,
        exec_id: u64,
        outcome: ExecutionResult<Arc<VisualizerQueryResult>>,
    ) {
        let mut inner = self.lock();

        if inner
            .in_flight
            .get(&commit.key)
            .map_or(false, |f| f.exec_id == exec_id)
        {
            inner.in_flight.remove(&commit.key);
        }
        if let Ok(result) = &outcome {
            inner
                .cache
                .insert(commit.key.to_string(), Arc::clone(result), Instant::now());
        }

        let generation = commit.generation.to_string();
        if commit.generation != inner.latest_requested || commit.generation <= inner.latest_applied
        {
            self.metrics.increment_superseded();
            log_event(
                Event::QuerySuperseded,
                &[
                    ("generation", &generation),
                    ("latest", &inner.latest_requested.to_string()),
                ],
            );
            return;
        }
        inner.latest_applied = commit.generation;

        match outcome {
            Ok(result) => {
                self.state.send_modify(|s| {
                    s.status = QueryStatus::Success;
                    s.data = Some(result);
                    s.data_key = Some(commit.key.to_string());
                    s.data_updated_at = Some(Utc::now());
                    s.error = None;
                    s.is_fetching = false;
                });
            }
            Err(err) => {
                self.metrics.increment_failures();
                log_event(
                    Event::QueryFailed,
                    &[
                        ("code", err.code().code()),
                        ("generation", &generation),
                        ("message", err.message()),
                    ],
                );
                self.state.send_modify(|s| {
                    s.status = QueryStatus::Error;
                    s.error = Some(err);
                    s.is_fetching = false;
                });
            }
        }
    }

    fn fail_unencodable(&self, err: serde_json::Error) {
        let err = ExecutionError::decode(format!("Request could not be encoded: {}", err));
        self.metrics.increment_failures();
        log_event(
            Event::QueryFailed,
            &[("code", err.code().code()), ("message", err.message())],
        );
        self.state.send_modify(|s| {
            s.status = QueryStatus::Error;
            s.error = Some(err);
            s.is_fetching = false;
        });
    }
}
