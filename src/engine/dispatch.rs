// Engine event dispatch: routes tracking events to anchors, stats and status.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::registry::AnchorRegistry;
use super::session::SessionState;
use super::stats::StatsCollector;
use super::status::StatusNotifier;
use crate::platform::EngineEvent;

/// What happened to one engine event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Frame notification, counted when stats are enabled.
    FrameCounted,
    /// Pose forwarded to this many anchors.
    Delivered(usize),
    /// The session was not running; the event was dropped.
    LateCallbackIgnored,
}

pub struct Dispatcher {
    state: Arc<Mutex<SessionState>>,
    registry: Arc<Mutex<AnchorRegistry>>,
    notifier: Arc<StatusNotifier>,
    stats: Option<Arc<StatsCollector>>,
}

impl Dispatcher {
    pub fn new(
        state: Arc<Mutex<SessionState>>,
        registry: Arc<Mutex<AnchorRegistry>>,
        notifier: Arc<StatusNotifier>,
        stats: Option<Arc<StatsCollector>>,
    ) -> Self {
        Self {
            state,
            registry,
            notifier,
            stats,
        }
    }

    /// Handle one event. The state lock is held for the whole dispatch so a
    /// concurrent pause or stop either precedes it entirely or follows it.
    pub fn handle(&self, event: EngineEvent) -> DispatchOutcome {
        let state = self.state.lock();
        if *state != SessionState::Running {
            trace!("ignoring engine event while {:?}: {:?}", *state, event);
            return DispatchOutcome::LateCallbackIgnored;
        }

        match event {
            EngineEvent::FrameProcessed => {
                if let Some(stats) = &self.stats {
                    stats.record_frame();
                }
                DispatchOutcome::FrameCounted
            }
            EngineEvent::PoseUpdated {
                target_index,
                world_matrix,
            } => {
                if let Some(stats) = &self.stats {
                    stats.record_pose(target_index, world_matrix.is_some());
                }
                let delivered = self
                    .registry
                    .lock()
                    .dispatch(target_index, world_matrix.as_ref());
                if delivered > 0 && world_matrix.is_some() {
                    self.notifier.target_found();
                }
                DispatchOutcome::Delivered(delivered)
            }
        }
    }

    /// Drain engine events in emission order until cancelled or the engine hangs up.
    pub fn spawn(
        self,
        mut events: mpsc::UnboundedReceiver<EngineEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Some(event) => {
                            self.handle(event);
                        }
                        None => break,
                    },
                }
            }
            debug!("engine event dispatcher stopped");
        })
    }
}
