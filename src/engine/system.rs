use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::info;

use super::events::LifecycleEvent;
use super::registry::AnchorRegistry;
use super::session::{Collaborators, Session, SessionState};
use super::stats::StatsSnapshot;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::platform::Anchor;

const LIFECYCLE_CHANNEL_CAPACITY: usize = 16;

/// Entry point of an AR experience.
///
/// Owns the anchor registry for its whole lifetime and at most one
/// [`Session`] at a time. Every method takes `&self`, so the system can be
/// shared behind an `Arc` and anchors registered, state read or the session
/// stopped while `start` is still waiting on the camera or the target set.
pub struct ArSystem {
    deps: Collaborators,
    config: Mutex<Option<SessionConfig>>,
    registry: Arc<Mutex<AnchorRegistry>>,
    events: broadcast::Sender<LifecycleEvent>,
    session: Mutex<Option<Arc<Session>>>,
    sessions_started: AtomicU64,
}

impl ArSystem {
    pub fn new(deps: Collaborators) -> Self {
        let (events, _) = broadcast::channel(LIFECYCLE_CHANNEL_CAPACITY);
        Self {
            deps,
            config: Mutex::new(None),
            registry: Arc::new(Mutex::new(AnchorRegistry::new())),
            events,
            session: Mutex::new(None),
            sessions_started: AtomicU64::new(0),
        }
    }

    /// Supply the configuration used by the next `start`.
    pub fn setup(&self, config: SessionConfig) {
        self.deps.ui.configure(&config.ui_settings());
        info!("ar system configured for {}", config.image_target_src);
        *self.config.lock() = Some(config);
    }

    pub fn config(&self) -> Option<SessionConfig> {
        self.config.lock().clone()
    }

    /// Bind `anchor` to `target_index`. Valid in every state.
    ///
    /// Returns true when the target set is already loaded and the anchor was
    /// configured on the spot.
    pub fn register_anchor(&self, anchor: Arc<dyn Anchor>, target_index: usize) -> bool {
        self.registry.lock().register(anchor, target_index)
    }

    pub fn anchor_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Receive `arReady` / `arError` events.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.session
            .lock()
            .as_ref()
            .map_or(SessionState::Idle, |s| s.state())
    }

    /// Start a new session and wait until it is running.
    ///
    /// Configuration errors abort before any resource is touched. Camera,
    /// target and engine failures leave the session Failed; they are
    /// announced through lifecycle events and the status UI and returned here.
    /// A `stop` issued while this is pending makes it return
    /// [`SessionError::Stopped`].
    pub async fn start(&self) -> Result<(), SessionError> {
        let config = self.config().ok_or(SessionError::NotConfigured)?;
        config.validate()?;

        let session = {
            let mut slot = self.session.lock();
            if let Some(current) = slot.as_ref() {
                let state = current.state();
                if !state.is_terminal() {
                    return Err(SessionError::InvalidState { op: "start", state });
                }
            }
            self.registry.lock().reset_session();
            let id = self.sessions_started.fetch_add(1, Ordering::Relaxed) + 1;
            info!("starting session {}", id);

            let session = Arc::new(Session::new(id, config, Arc::clone(&self.deps.ui)));
            *slot = Some(Arc::clone(&session));
            session
        };

        let result = session.run(&self.deps, &self.registry, &self.events).await;
        if result.is_err() && session.state() == SessionState::Failed {
            self.registry.lock().reset_session();
        }
        result
    }

    pub fn pause(&self, keep_video: bool) -> Result<(), SessionError> {
        self.active_session("pause")?.pause(keep_video)
    }

    pub fn resume(&self) -> Result<(), SessionError> {
        self.active_session("resume")?.resume()
    }

    /// Stop the current session, also one that is still starting.
    /// Stopping twice is a no-op.
    pub fn stop(&self) -> Result<(), SessionError> {
        self.active_session("stop")?.stop();
        self.registry.lock().reset_session();
        Ok(())
    }

    pub fn switch_target(&self, target_index: usize) -> Result<(), SessionError> {
        self.active_session("switch_target")?
            .switch_target(target_index)
    }

    /// Frame statistics of the current session when stats display is enabled.
    pub fn stats(&self) -> Option<StatsSnapshot> {
        self.session.lock().as_ref().and_then(|s| s.stats())
    }

    fn active_session(&self, op: &'static str) -> Result<Arc<Session>, SessionError> {
        self.session
            .lock()
            .clone()
            .ok_or(SessionError::InvalidState {
                op,
                state: SessionState::Idle,
            })
    }
}
