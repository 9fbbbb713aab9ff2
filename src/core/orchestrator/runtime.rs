//! Single cooperative event loop for the orchestrator.
//!
//! One task owns the [`Orchestrator`] and multiplexes the scheduler ticker,
//! engine completions, control messages and shutdown with `tokio::select!`.
//! Engine subprocesses run as separate tasks and only ever talk back through
//! the completion channel, so every state mutation happens on this loop.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};

use super::controller::{CompletionReport, Orchestrator};
use super::engine::EngineCompletion;
use super::state::FeedSnapshot;
use crate::error::Result;

/// Requests sent to a running loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    SetEnabled(bool),
    /// Start a recommendation cycle now instead of waiting for the timer
    RecommendNow,
    Feedback { action: String, value: String },
}

/// Cloneable handle for talking to a running loop
#[derive(Clone)]
pub struct OrchestratorHandle {
    control_tx: mpsc::UnboundedSender<ControlMessage>,
    shutdown_tx: broadcast::Sender<()>,
    feed_rx: watch::Receiver<Arc<FeedSnapshot>>,
}

impl OrchestratorHandle {
    pub fn set_enabled(&self, enabled: bool) {
        self.send(ControlMessage::SetEnabled(enabled));
    }

    pub fn recommend_now(&self) {
        self.send(ControlMessage::RecommendNow);
    }

    pub fn send_feedback<A: Into<String>, V: Into<String>>(&self, action: A, value: V) {
        self.send(ControlMessage::Feedback {
            action: action.into(),
            value: value.into(),
        });
    }

    pub fn shutdown(&self) {
        // Fails only when the loop already stopped
        let _ = self.shutdown_tx.send(());
    }

    /// Receiver for the latest-value feed
    pub fn feed(&self) -> watch::Receiver<Arc<FeedSnapshot>> {
        self.feed_rx.clone()
    }

    pub fn snapshot(&self) -> Arc<FeedSnapshot> {
        self.feed_rx.borrow().clone()
    }

    fn send(&self, message: ControlMessage) {
        if self.control_tx.send(message).is_err() {
            log::warn!("Orchestrator loop is not running");
        }
    }
}

pub struct OrchestratorRuntime {
    orchestrator: Orchestrator,
    completion_rx: mpsc::UnboundedReceiver<EngineCompletion>,
    control_rx: mpsc::UnboundedReceiver<ControlMessage>,
    feed_tx: watch::Sender<Arc<FeedSnapshot>>,
    shutdown_rx: broadcast::Receiver<()>,
    handle: OrchestratorHandle,
}

impl OrchestratorRuntime {
    pub fn new(
        orchestrator: Orchestrator,
        completion_rx: mpsc::UnboundedReceiver<EngineCompletion>,
    ) -> Self {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (feed_tx, feed_rx) = watch::channel(Arc::new(orchestrator.state().snapshot()));

        Self {
            orchestrator,
            completion_rx,
            control_rx,
            feed_tx,
            shutdown_rx,
            handle: OrchestratorHandle {
                control_tx,
                shutdown_tx,
                feed_rx,
            },
        }
    }

    pub fn handle(&self) -> OrchestratorHandle {
        self.handle.clone()
    }

    /// Run the loop on a fresh current-thread runtime until shutdown.
    ///
    /// `companion` runs alongside the loop on the same thread (feed printers etc).
    pub fn block_on<F>(self, companion: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .thread_name("workpulse-loop")
            .build()?;

        runtime.block_on(async move {
            let local = tokio::task::LocalSet::new();
            local
                .run_until(async move {
                    tokio::task::spawn_local(companion);
                    self.run().await;
                })
                .await;
        });

        Ok(())
    }

    /// The event loop. Returns after a shutdown signal.
    pub async fn run(self) {
        let Self {
            mut orchestrator,
            mut completion_rx,
            mut control_rx,
            feed_tx,
            mut shutdown_rx,
            handle: _handle,
        } = self;

        let resolution = orchestrator.scheduler().resolution();
        let mut ticker = interval(resolution.max(Duration::from_millis(10)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        log::info!("Event loop started (tick every {:?})", resolution);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = orchestrator.tick(Instant::now());
                    if !report.is_idle() {
                        publish(&feed_tx, &orchestrator);
                    }
                }
                Some(completion) = completion_rx.recv() => {
                    let report = orchestrator.handle_completion(completion, Instant::now());
                    if !matches!(report, CompletionReport::Stale) {
                        publish(&feed_tx, &orchestrator);
                    }
                }
                Some(message) = control_rx.recv() => {
                    handle_control(&mut orchestrator, message);
                    publish(&feed_tx, &orchestrator);
                }
                _ = shutdown_rx.recv() => {
                    log::info!("Event loop shutting down");
                    break;
                }
            }
        }
    }
}

fn handle_control(orchestrator: &mut Orchestrator, message: ControlMessage) {
    // Engine requests are dropped while disabled
    if !orchestrator.state().is_enabled() && !matches!(message, ControlMessage::SetEnabled(_)) {
        log::info!("Orchestrator disabled, ignoring {:?}", message);
        return;
    }

    match message {
        ControlMessage::SetEnabled(enabled) => orchestrator.set_enabled(enabled),
        ControlMessage::RecommendNow => {
            if let Err(e) = orchestrator.start_recommendation_cycle() {
                log::warn!("Recommendation cycle not started: {}", e);
            }
        }
        ControlMessage::Feedback { action, value } => {
            if let Err(e) = orchestrator.send_feedback(&action, &value) {
                log::warn!("Feedback not sent: {}", e);
            }
        }
    }
}

fn publish(feed_tx: &watch::Sender<Arc<FeedSnapshot>>, orchestrator: &Orchestrator) {
    // watch::send() only fails if there are no receivers (which is fine)
    let _ = feed_tx.send(Arc::new(orchestrator.state().snapshot()));
}
