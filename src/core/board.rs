//! The current rate data shared between the refresh loop and the display.
//!
//! Each successful refresh swaps in a new [`DashboardState`] as a whole, so a
//! reader always sees statistics computed from the snapshot shown next to
//! them. Refreshes carry a sequence number and only the most recently issued
//! one may update the board.
use crate::core::rates::{FetchError, RateSnapshot};
use crate::core::stats::{StatsError, StatsSummary, compute_stats};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, warn};

/// A snapshot together with the statistics derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub snapshot: RateSnapshot,
    pub stats: StatsSummary,
}

impl DashboardState {
    pub fn new(snapshot: RateSnapshot) -> Result<Self, StatsError> {
        let stats = compute_stats(&snapshot)?;
        Ok(DashboardState { snapshot, stats })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPhase {
    #[default]
    Idle,
    Fetching,
}

#[derive(Debug, Clone, Default)]
pub struct BoardView {
    pub state: Option<Arc<DashboardState>>,
    pub phase: RefreshPhase,
    /// Error from the most recent refresh, cleared by the next success.
    pub last_error: Option<String>,
    issued: u64,
    closed: bool,
}

impl BoardView {
    /// True when the shown data survived a failed refresh.
    pub fn is_stale(&self) -> bool {
        self.state.is_some() && self.last_error.is_some()
    }

    pub fn latest_sequence(&self) -> u64 {
        self.issued
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    Superseded,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Refresh failed; the previous state is still shown.
    Failed,
    Discarded(DiscardReason),
}

pub struct RateBoard {
    view: watch::Sender<BoardView>,
}

impl RateBoard {
    pub fn new() -> Self {
        let (view, _) = watch::channel(BoardView::default());
        RateBoard { view }
    }

    /// Issues the sequence number for a new refresh, or `None` once closed.
    pub fn begin_fetch(&self) -> Option<u64> {
        let mut seq = None;
        self.view.send_if_modified(|view| {
            if view.closed {
                return false;
            }
            view.issued += 1;
            view.phase = RefreshPhase::Fetching;
            seq = Some(view.issued);
            true
        });
        seq
    }

    /// Applies the outcome of refresh `seq`.
    pub fn complete(&self, seq: u64, result: Result<RateSnapshot, FetchError>) -> ApplyOutcome {
        // Stats are computed before taking the channel lock.
        let result = result.map(|snapshot| {
            DashboardState::new(snapshot).map_err(|e| {
                error!("Refresh {seq} produced unusable data: {e}");
                e.to_string()
            })
        });

        let mut outcome = ApplyOutcome::Discarded(DiscardReason::Closed);
        self.view.send_if_modified(|view| {
            if view.closed {
                return false;
            }
            if seq != view.issued {
                outcome = ApplyOutcome::Discarded(DiscardReason::Superseded);
                return false;
            }

            view.phase = RefreshPhase::Idle;
            match result {
                Ok(Ok(state)) => {
                    view.state = Some(Arc::new(state));
                    view.last_error = None;
                    outcome = ApplyOutcome::Applied;
                }
                Ok(Err(e)) => {
                    view.last_error = Some(e);
                    outcome = ApplyOutcome::Failed;
                }
                Err(e) => {
                    view.last_error = Some(e.to_string());
                    outcome = ApplyOutcome::Failed;
                }
            }
            true
        });

        match outcome {
            ApplyOutcome::Applied => debug!("Refresh {seq} applied"),
            ApplyOutcome::Failed => warn!("Refresh {seq} failed, keeping previous rates"),
            ApplyOutcome::Discarded(reason) => debug!("Refresh {seq} discarded: {reason:?}"),
        }
        outcome
    }

    /// Marks the board torn down. Results arriving afterwards are dropped.
    pub fn close(&self) {
        self.view.send_if_modified(|view| {
            if view.closed {
                return false;
            }
            view.closed = true;
            view.phase = RefreshPhase::Idle;
            true
        });
    }

    pub fn view(&self) -> BoardView {
        self.view.borrow().clone()
    }

    pub fn current(&self) -> Option<Arc<DashboardState>> {
        self.view.borrow().state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BoardView> {
        self.view.subscribe()
    }
}

impl Default for RateBoard {
    fn default() -> Self {
        Self::new()
    }
}
