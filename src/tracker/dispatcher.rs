use crate::domain::PositionSample;
use crate::tracker::sender::{LocationSender, SendError};
use crate::tracker::significance::SignificanceFilter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, instrument, trace, warn};

/// Drains position samples to a [`LocationSender`] at a bounded rate.
///
/// Delivery policy: at most one send is in flight at any time and at most one send starts per tick. Samples
/// arriving between two ticks are coalesced, only the most recent one is considered. A failed send is not
/// retried by itself, the next tick evaluates the latest sample again against the last *successfully* sent
/// one.
#[derive(Debug)]
pub struct Dispatcher {
    sender: Arc<dyn LocationSender>,
    filter: SignificanceFilter,
    tick_interval: Duration,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub received: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped_in_flight: usize,
}

/// Owner of a running dispatcher. Dropping it stops the dispatcher and its timer.
#[derive(Debug)]
pub struct DispatcherHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<DispatchStats>,
}

struct SendOutcome {
    sample: PositionSample,
    result: Result<(), SendError>,
}

#[derive(Default)]
struct DispatchState {
    latest: Option<PositionSample>,
    last_sent: Option<PositionSample>,
    in_flight: bool,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(sender: Arc<dyn LocationSender>, filter: SignificanceFilter, tick_interval: Duration) -> Self {
        Dispatcher {
            sender,
            filter,
            tick_interval,
        }
    }

    /// Starts the dispatcher task consuming `samples_rx`. The first tick fires one interval after spawning.
    pub fn spawn(self, samples_rx: mpsc::Receiver<PositionSample>) -> DispatcherHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(samples_rx, shutdown_rx));

        DispatcherHandle { shutdown_tx, task }
    }

    #[instrument(skip_all)]
    async fn run(self, mut samples_rx: mpsc::Receiver<PositionSample>, mut shutdown_rx: watch::Receiver<bool>) -> DispatchStats {
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<SendOutcome>(1);
        let mut ticker = interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut state = DispatchState::default();
        let mut source_open = true;

        info!(tick_interval = ?self.tick_interval, "🚌 Dispatcher started");
        loop {
            tokio::select! {
                biased;

                // Also fires when the handle is dropped
                _ = shutdown_rx.changed() => break,
                Some(outcome) = outcome_rx.recv() => self.on_outcome(&mut state, outcome),
                sample = samples_rx.recv(), if source_open => match sample {
                    Some(sample) => {
                        trace!("🚌 Buffered sample ({}, {})", sample.latitude(), sample.longitude());
                        state.stats.received += 1;
                        state.latest = Some(sample);
                    }
                    None => {
                        debug!("🚌 Position source closed, keeping the last known position");
                        source_open = false;
                    }
                },
                _ = ticker.tick() => self.on_tick(&mut state, &outcome_tx),
            }
        }

        info!(stats = ?state.stats, "🚌 Dispatcher stopped");
        state.stats
    }

    fn on_tick(&self, state: &mut DispatchState, outcome_tx: &mpsc::Sender<SendOutcome>) {
        if state.in_flight {
            debug!("🚌 Previous send still in flight, skipping tick");
            state.stats.skipped_in_flight += 1;
            return;
        }

        let Some(sample) = &state.latest else {
            trace!("🚌 No position yet");
            return;
        };

        if !self.filter.should_send(sample, state.last_sent.as_ref()) {
            trace!("🚌 Position unchanged, skipping tick");
            return;
        }

        state.in_flight = true;
        let sample = sample.clone();
        let sender = self.sender.clone();
        let outcome_tx = outcome_tx.clone();
        tokio::spawn(async move {
            let result = sender.send(&sample).await;
            // The dispatcher may be gone by now, the outcome is dropped then
            outcome_tx.send(SendOutcome { sample, result }).await.unwrap_or_default();
        });
    }

    fn on_outcome(&self, state: &mut DispatchState, outcome: SendOutcome) {
        state.in_flight = false;
        match outcome.result {
            Ok(()) => {
                debug!("🚌 Sent position ({}, {})", outcome.sample.latitude(), outcome.sample.longitude());
                state.stats.sent += 1;
                state.last_sent = Some(outcome.sample);
            }
            Err(e) => {
                warn!("⚠️ Unable to send position, trying again next tick: {}", e);
                state.stats.failed += 1;
            }
        }
    }
}

impl DispatcherHandle {
    /// Stops the dispatcher and waits for it to release its timer. An in-flight send is not awaited.
    pub async fn shutdown(self) -> DispatchStats {
        self.shutdown_tx.send(true).unwrap_or_default();

        match self.task.await {
            Ok(stats) => stats,
            Err(e) => {
                error!("❌ Dispatcher task failed: {}", e);
                DispatchStats::default()
            }
        }
    }
}
