// Polling lifecycle controller: Idle/Active state machine, recurring ticks, and
// session-token checks that keep stale responses away from shared state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::detector::{ChangeDetector, ChangeEvent};
use super::session::{PollingSession, SessionToken};
use super::stats::{PollStats, PollStatsSnapshot};
use crate::api::observers::{NotificationEmitter, ViewRenderer};
use crate::config::{PollerConfig, TickOverlap};
use crate::error::FetchError;
use crate::shipment::{normalize_tracking_id, ShipmentSnapshot};
use crate::source::traits::ShipmentSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Active,
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The response belonged to the live session and was applied.
    Applied {
        snapshot: ShipmentSnapshot,
        change: Option<ChangeEvent>,
    },
    /// The session was stopped or replaced before the response arrived.
    Discarded,
    /// The fetch failed; the session was torn down.
    Failed(FetchError),
    /// No session to tick.
    Idle,
}

struct ActiveSession {
    session: PollingSession,
    cancel: CancellationToken,
}

struct State {
    active: Option<ActiveSession>,
    /// Id of the last successful lookup; what `restart` re-runs.
    tracking_id: Option<String>,
    last_error: Option<FetchError>,
}

struct Inner {
    source: Arc<dyn ShipmentSource>,
    renderer: Arc<dyn ViewRenderer>,
    notifier: Arc<dyn NotificationEmitter>,
    detector: ChangeDetector,
    config: PollerConfig,
    state: Mutex<State>,
    state_tx: watch::Sender<ControllerState>,
    stats: PollStats,
    next_token: AtomicU64,
}

/// Cheap to clone; all clones drive the same controller.
#[derive(Clone)]
pub struct PollingController {
    inner: Arc<Inner>,
}

impl PollingController {
    pub fn new(
        source: Arc<dyn ShipmentSource>,
        renderer: Arc<dyn ViewRenderer>,
        notifier: Arc<dyn NotificationEmitter>,
        config: PollerConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(ControllerState::Idle);
        Self {
            inner: Arc::new(Inner {
                source,
                renderer,
                notifier,
                detector: ChangeDetector::new(),
                config,
                state: Mutex::new(State {
                    active: None,
                    tracking_id: None,
                    last_error: None,
                }),
                state_tx,
                stats: PollStats::new(),
                next_token: AtomicU64::new(1),
            }),
        }
    }

    /// Fetch `tracking_id` once and, on success, start polling it.
    ///
    /// The id is trimmed and uppercased first. A successful lookup replaces
    /// any running session; a failed one stops it.
    pub async fn start_lookup(&self, tracking_id: &str) -> Result<ShipmentSnapshot, FetchError> {
        let inner = &self.inner;
        let Some(id) = normalize_tracking_id(tracking_id) else {
            return Err(FetchError::invalid_input("tracking id must not be empty"));
        };

        inner.stats.record_lookup();
        info!("lookup started id={}", id);

        let snapshot = match inner.fetch(&id).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("lookup failed id={} kind={}: {}", id, err.kind, err.message);
                inner.stats.record_failure();
                inner.stop_session(None, "lookup failed");
                inner.state.lock().last_error = Some(err.clone());
                return Err(err);
            }
        };

        let token = SessionToken::from_raw(inner.next_token.fetch_add(1, Ordering::Relaxed));
        let mut session = PollingSession::new(token, id.clone());
        // Seeds the baseline; the first observation never produces an event.
        let _ = inner.detector.observe(&mut session, &snapshot);
        session.active = true;

        let cancel = CancellationToken::new();
        let started_at = {
            let mut state = inner.state.lock();
            if let Some(previous) = state.active.take() {
                previous.cancel.cancel();
                info!(
                    "session {} id={} replaced by {}",
                    previous.session.token, previous.session.tracking_id, token
                );
            }
            state.tracking_id = Some(id.clone());
            state.last_error = None;
            state.active = Some(ActiveSession {
                session,
                cancel: cancel.clone(),
            });
            inner.state_tx.send_replace(ControllerState::Active);
            inner.renderer.render(&snapshot);
            Instant::now()
        };
        inner.stats.record_session_started();
        info!(
            "session {} started id={} status={} interval_ms={}",
            token, id, snapshot.normalized_status, inner.config.poll_interval_ms
        );

        tokio::spawn(run_schedule(
            Arc::downgrade(&self.inner),
            token,
            cancel,
            started_at,
        ));

        Ok(snapshot)
    }

    /// Run one tick for the current session now, outside the schedule.
    pub async fn tick(&self) -> TickOutcome {
        let token = {
            let state = self.inner.state.lock();
            state.active.as_ref().map(|a| a.session.token)
        };
        match token {
            Some(token) => self.inner.tick_session(token).await,
            None => TickOutcome::Idle,
        }
    }

    /// Cancel the schedule and invalidate the session token. No-op when idle.
    /// Returns whether a session was stopped.
    pub fn stop(&self) -> bool {
        self.inner.stop_session(None, "stopped").is_some()
    }

    /// Stop, then look up the last tracked id again with a fresh baseline.
    pub async fn restart(&self) -> Result<ShipmentSnapshot, FetchError> {
        let id = self.tracking_id();
        let Some(id) = id else {
            return Err(FetchError::invalid_input("no shipment to restart"));
        };
        self.stop();
        self.start_lookup(&id).await
    }

    pub fn state(&self) -> ControllerState {
        if self.inner.state.lock().active.is_some() {
            ControllerState::Active
        } else {
            ControllerState::Idle
        }
    }

    /// Watch Idle/Active transitions.
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.inner.state_tx.subscribe()
    }

    /// Copy of the running session, if any.
    pub fn session(&self) -> Option<PollingSession> {
        let state = self.inner.state.lock();
        state.active.as_ref().map(|a| a.session.clone())
    }

    /// The id `restart` would look up.
    pub fn tracking_id(&self) -> Option<String> {
        let state = self.inner.state.lock();
        state
            .active
            .as_ref()
            .map(|a| a.session.tracking_id.clone())
            .or_else(|| state.tracking_id.clone())
    }

    /// Error that last ended a lookup or a session. Cleared by a successful lookup.
    pub fn last_error(&self) -> Option<FetchError> {
        self.inner.state.lock().last_error.clone()
    }

    pub fn stats(&self) -> PollStatsSnapshot {
        self.inner.stats.snapshot()
    }
}

impl Inner {
    /// Run the backend fetch in its own task so a panicking backend surfaces
    /// as a `Network` error instead of unwinding through the controller.
    async fn fetch(&self, tracking_id: &str) -> Result<ShipmentSnapshot, FetchError> {
        let source = Arc::clone(&self.source);
        let id = tracking_id.to_string();
        let t0 = Instant::now();
        let result = match tokio::spawn(async move { source.fetch(&id).await }).await {
            Ok(result) => result,
            Err(e) => {
                warn!("fetch task for {} aborted: {}", tracking_id, e);
                Err(FetchError::network(format!("fetch task failed: {}", e)))
            }
        };
        self.stats
            .record_fetch_latency(t0.elapsed().as_millis() as u64);
        result
    }

    async fn tick_session(&self, token: SessionToken) -> TickOutcome {
        let tracking_id = {
            let state = self.state.lock();
            match &state.active {
                Some(a) if a.session.token == token => a.session.tracking_id.clone(),
                _ => return TickOutcome::Discarded,
            }
        };

        self.stats.record_tick_issued();
        debug!("tick session={} id={}", token, tracking_id);

        match self.fetch(&tracking_id).await {
            Ok(snapshot) => {
                // Held through dispatch: a stop() cannot slip in between the
                // token check and the observer calls.
                let mut state = self.state.lock();
                let change = match state.active.as_mut() {
                    Some(a) if a.session.token == token => {
                        self.detector.observe(&mut a.session, &snapshot)
                    }
                    _ => {
                        self.stats.record_tick_discarded();
                        debug!("stale response discarded session={} id={}", token, tracking_id);
                        return TickOutcome::Discarded;
                    }
                };

                self.stats.record_tick_applied();
                self.renderer.render(&snapshot);
                if let Some(event) = &change {
                    self.stats.record_change();
                    self.notifier.notify(&event.to_string());
                }
                drop(state);
                TickOutcome::Applied { snapshot, change }
            }
            Err(err) => {
                if self.stop_session(Some(token), "tick failed").is_none() {
                    self.stats.record_tick_discarded();
                    debug!("stale failure discarded session={} id={}: {}", token, tracking_id, err);
                    return TickOutcome::Discarded;
                }
                warn!(
                    "tick failed session={} id={} kind={}: {}",
                    token, tracking_id, err.kind, err.message
                );
                self.stats.record_failure();
                self.state.lock().last_error = Some(err.clone());
                self.renderer.show_error(&err);
                TickOutcome::Failed(err)
            }
        }
    }

    /// Tear down the active session. With `expected`, only if it is still that
    /// session. Returns the session that was stopped.
    fn stop_session(&self, expected: Option<SessionToken>, reason: &str) -> Option<PollingSession> {
        let mut state = self.state.lock();
        if let (Some(expected), Some(active)) = (expected, state.active.as_ref()) {
            if active.session.token != expected {
                return None;
            }
        }
        let active = state.active.take()?;
        active.cancel.cancel();
        self.state_tx.send_replace(ControllerState::Idle);
        drop(state);

        let mut session = active.session;
        session.active = false;
        info!(
            "session {} id={} stopped: {}",
            session.token, session.tracking_id, reason
        );
        Some(session)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(active) = self.state.get_mut().active.take() {
            debug!("controller dropped, cancelling session {}", active.session.token);
            active.cancel.cancel();
        }
    }
}

/// Clears the in-flight flag when a skip-mode tick ends, panicking or not.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Recurring schedule for one session. Fires every poll interval from
/// `started_at` (the moment the session went active) and spawns each tick, so
/// slow fetches may overlap unless the config says to skip.
async fn run_schedule(
    weak: Weak<Inner>,
    token: SessionToken,
    cancel: CancellationToken,
    started_at: Instant,
) {
    let (period, overlap) = match weak.upgrade() {
        Some(inner) => (inner.config.poll_interval(), inner.config.tick_overlap),
        None => return,
    };
    let mut interval = interval_at(started_at + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let in_flight = Arc::new(AtomicBool::new(false));

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let Some(inner) = weak.upgrade() else {
            break;
        };

        let guard = match overlap {
            TickOverlap::Concurrent => None,
            TickOverlap::SkipIfInFlight => {
                if in_flight.swap(true, Ordering::AcqRel) {
                    inner.stats.record_tick_skipped();
                    debug!("tick skipped session={}: previous fetch in flight", token);
                    continue;
                }
                Some(InFlight(Arc::clone(&in_flight)))
            }
        };

        tokio::spawn(async move {
            let _guard = guard;
            inner.tick_session(token).await;
        });
    }

    debug!("schedule ended session={}", token);
}
