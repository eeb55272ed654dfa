//! Drives rate refreshes: once at start, on a fixed interval and on request.
//!
//! Only one fetch runs at a time. Manual requests made while a fetch is in
//! flight collapse into a single follow-up fetch that starts as soon as the
//! current one completes. The interval restarts from every completed fetch.
use crate::core::board::{ApplyOutcome, RateBoard};
use crate::core::rates::RateSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Interval,
    Manual,
}

pub struct RefreshScheduler {
    triggers: mpsc::Sender<()>,
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Spawns the refresh loop. The first fetch starts immediately.
    pub fn start(source: Arc<dyn RateSource>, board: Arc<RateBoard>, interval: Duration) -> Self {
        let (triggers, trigger_rx) = mpsc::channel(1);
        let (shutdown, shutdown_rx) = watch::channel(false);
        info!("Starting rate refresh every {}s", interval.as_secs());

        let handle = tokio::spawn(refresh_loop(
            source,
            board,
            interval,
            trigger_rx,
            shutdown_rx,
        ));

        RefreshScheduler {
            triggers,
            shutdown,
            handle: Some(handle),
        }
    }

    /// Requests an immediate refresh, or a follow-up one if a fetch is in
    /// flight. Returns false when a request is already pending (this one is
    /// merged into it) or the scheduler has stopped.
    pub fn refresh_now(&self) -> bool {
        match self.triggers.try_send(()) {
            Ok(()) => true,
            Err(e) => {
                debug!("Manual refresh not queued: {e}");
                false
            }
        }
    }

    /// Cancels the timer and any in-flight fetch, then waits for the loop.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            debug!("Refresh loop ended abnormally: {e}");
        }
        info!("Rate refresh stopped");
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.shutdown.send(true);
            handle.abort();
        }
    }
}

async fn refresh_loop(
    source: Arc<dyn RateSource>,
    board: Arc<RateBoard>,
    interval: Duration,
    mut triggers: mpsc::Receiver<()>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let trigger = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => Trigger::Interval,
            msg = triggers.recv() => match msg {
                Some(()) => Trigger::Manual,
                None => break,
            },
        };

        if !refresh(source.as_ref(), &board, trigger, &mut shutdown).await {
            break;
        }

        // A request left in the channel runs next; the ticker is not due yet.
        ticker.reset_at(Instant::now() + interval);
    }

    board.close();
    debug!("Refresh loop exited");
}

/// Runs one fetch. Returns false if shutdown interrupted it.
#[instrument(name = "RateRefresh", skip(source, board, shutdown))]
async fn refresh(
    source: &dyn RateSource,
    board: &RateBoard,
    trigger: Trigger,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    let Some(seq) = board.begin_fetch() else {
        return false;
    };
    debug!("Refresh {seq} started");

    tokio::select! {
        biased;
        _ = shutdown.changed() => {
            debug!("Refresh {seq} cancelled by shutdown");
            false
        }
        result = source.fetch_snapshot() => {
            if board.complete(seq, result) == ApplyOutcome::Applied {
                info!("Rates updated");
            }
            true
        }
    }
}
