// Session state machine: camera acquisition, tracking engine bootstrap,
// pause/resume and teardown for one run of an AR experience.

use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::dispatch::Dispatcher;
use super::events::{ErrorCode, LifecycleEvent};
use super::registry::AnchorRegistry;
use super::resize::ResizeReactor;
use super::stats::{StatsCollector, StatsSnapshot};
use super::status::StatusNotifier;
use super::warmup::prime_engine;
use crate::config::{SessionConfig, CAMERA_CONSTRAINTS};
use crate::error::SessionError;
use crate::geometry::VideoDimensions;
use crate::platform::{
    EngineParams, MediaDevices, PerspectiveCamera, StatusUi, TrackingEngine,
    TrackingEngineFactory, VideoStream, ViewportHandle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AcquiringVideo,
    InitializingEngine,
    Running,
    Paused,
    Stopped,
    Failed,
}

impl SessionState {
    /// Stopped and Failed sessions never leave their state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Stopped | SessionState::Failed)
    }
}

/// Host objects a session drives.
#[derive(Clone)]
pub struct Collaborators {
    pub media: Arc<dyn MediaDevices>,
    pub engines: Arc<dyn TrackingEngineFactory>,
    pub camera: Arc<dyn PerspectiveCamera>,
    pub ui: Arc<dyn StatusUi>,
    pub viewport: ViewportHandle,
}

/// Handles a session owns from acquisition until release.
#[derive(Default)]
struct Resources {
    video: Option<Arc<dyn VideoStream>>,
    engine: Option<Arc<dyn TrackingEngine>>,
    video_paused: bool,
    tasks: Vec<JoinHandle<()>>,
}

/// One run of an AR experience.
///
/// Every method takes `&self` so the session can be stopped, paused or
/// inspected while `run` is still awaiting the camera or the target set.
pub struct Session {
    id: u64,
    config: SessionConfig,
    state: Arc<Mutex<SessionState>>,
    notifier: Arc<StatusNotifier>,
    stats: Option<Arc<StatsCollector>>,
    resources: Mutex<Resources>,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(id: u64, config: SessionConfig, ui: Arc<dyn StatusUi>) -> Self {
        let notifier = Arc::new(StatusNotifier::new(ui, config.ui_settings()));
        let stats = config.show_stats.then(|| Arc::new(StatsCollector::new()));
        Self {
            id,
            config,
            state: Arc::new(Mutex::new(SessionState::Idle)),
            notifier,
            stats,
            resources: Mutex::new(Resources::default()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Move to `next` unless the session was stopped in the meantime.
    fn advance(&self, next: SessionState) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        if state.is_terminal() {
            return Err(SessionError::Stopped);
        }
        debug!("session {} {:?} -> {:?}", self.id, *state, next);
        *state = next;
        Ok(())
    }

    /// Drive the session from Idle to Running.
    ///
    /// On failure the session ends in Failed with every resource released;
    /// camera failures are also announced as `arError` and on the status UI.
    /// A concurrent `stop` makes this return [`SessionError::Stopped`].
    pub async fn run(
        &self,
        deps: &Collaborators,
        registry: &Arc<Mutex<AnchorRegistry>>,
        events: &broadcast::Sender<LifecycleEvent>,
    ) -> Result<(), SessionError> {
        match self.bootstrap(deps, registry, events).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.fail(&e, events);
                Err(e)
            }
        }
    }

    async fn bootstrap(
        &self,
        deps: &Collaborators,
        registry: &Arc<Mutex<AnchorRegistry>>,
        events: &broadcast::Sender<LifecycleEvent>,
    ) -> Result<(), SessionError> {
        self.notifier.starting();
        self.advance(SessionState::AcquiringVideo)?;
        let (video, video_size) = self.acquire_video(deps.media.as_ref()).await?;

        self.advance(SessionState::InitializingEngine)?;
        let params = EngineParams {
            input_width: video_size.width,
            input_height: video_size.height,
            max_track: self.config.max_track,
            filter_min_cf: self.config.filter_min_cf,
            filter_beta: self.config.filter_beta,
            miss_tolerance: self.config.miss_tolerance,
            warmup_tolerance: self.config.warmup_tolerance,
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = deps
            .engines
            .create(params, tx)
            .map_err(SessionError::Engine)?;
        self.resources.lock().engine = Some(Arc::clone(&engine));

        let dispatcher = Dispatcher::new(
            Arc::clone(&self.state),
            Arc::clone(registry),
            Arc::clone(&self.notifier),
            self.stats.clone(),
        );
        let dispatch_task = dispatcher.spawn(rx, self.cancel.child_token());

        let reactor = Arc::new(ResizeReactor::new(
            deps.viewport.clone(),
            Arc::clone(&deps.camera),
            Arc::clone(&video),
            Arc::clone(&engine),
            video_size,
        ));
        let notifications = deps.viewport.subscribe();
        if let Err(e) = reactor.apply() {
            warn!("session {} initial viewport geometry skipped: {}", self.id, e);
        }
        let reactor_task = reactor.spawn(notifications, self.cancel.child_token());
        self.resources
            .lock()
            .tasks
            .extend([dispatch_task, reactor_task]);

        prime_engine(
            &engine,
            &video,
            &self.config.image_target_src,
            registry,
            &self.cancel,
        )
        .await?;

        {
            // Held until processing starts so a racing stop or pause sees
            // either nothing or a fully running engine.
            let mut state = self.state.lock();
            if state.is_terminal() {
                return Err(SessionError::Stopped);
            }
            *state = SessionState::Running;
            self.notifier.ready();
            engine.process_video(Arc::clone(&video));
        }
        // No receivers is fine: nobody listens for lifecycle events.
        let _ = events.send(LifecycleEvent::Ready);
        info!("session {} running", self.id);
        Ok(())
    }

    async fn acquire_video(
        &self,
        media: &dyn MediaDevices,
    ) -> Result<(Arc<dyn VideoStream>, VideoDimensions), SessionError> {
        if !media.supports_camera() {
            return Err(SessionError::VideoUnsupported);
        }
        let video = media
            .open_camera(CAMERA_CONSTRAINTS)
            .await
            .map_err(SessionError::VideoAcquisition)?;
        self.resources.lock().video = Some(Arc::clone(&video));

        let size = video
            .loaded_metadata()
            .await
            .map_err(SessionError::VideoAcquisition)?;
        info!(
            "session {} video ready: {}x{}",
            self.id, size.width, size.height
        );
        Ok((video, size))
    }

    fn fail(&self, error: &SessionError, events: &broadcast::Sender<LifecycleEvent>) {
        let stopped = {
            let mut state = self.state.lock();
            let stopped = state.is_terminal();
            if !stopped {
                *state = SessionState::Failed;
            }
            stopped
        };
        if stopped {
            // Whatever the bootstrap acquired after stop() still needs releasing.
            debug!("session {} start abandoned: {}", self.id, error);
            self.release();
            return;
        }

        warn!("session {} failed: {}", self.id, error);
        if error.is_video_acquisition() {
            self.notifier.camera_unsupported();
            let code = ErrorCode::VideoFail;
            warn!("session {} arError {}", self.id, code.as_str());
            let _ = events.send(LifecycleEvent::Error { error: code });
        }
        self.release();
    }

    /// Halt frame submission and, unless `keep_video`, pause the video.
    pub fn pause(&self, keep_video: bool) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        if *state != SessionState::Running {
            return Err(SessionError::InvalidState {
                op: "pause",
                state: *state,
            });
        }
        *state = SessionState::Paused;

        let mut guard = self.resources.lock();
        let resources = &mut *guard;
        if let Some(engine) = &resources.engine {
            engine.stop_process_video();
        }
        if !keep_video {
            if let Some(video) = &resources.video {
                video.pause();
                resources.video_paused = true;
            }
        }
        info!("session {} paused (keep_video={})", self.id, keep_video);
        Ok(())
    }

    pub fn resume(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        if *state != SessionState::Paused {
            return Err(SessionError::InvalidState {
                op: "resume",
                state: *state,
            });
        }
        *state = SessionState::Running;

        let mut resources = self.resources.lock();
        if let Some(video) = resources.video.clone() {
            if mem::take(&mut resources.video_paused) {
                video.play();
            }
            if let Some(engine) = &resources.engine {
                engine.process_video(video);
            }
        }
        info!("session {} resumed", self.id);
        Ok(())
    }

    /// End the session. Idempotent; once this returns no pose is dispatched.
    ///
    /// Valid while `run` is pending: the bootstrap notices and bails out.
    pub fn stop(&self) {
        {
            let mut state = self.state.lock();
            if state.is_terminal() {
                return;
            }
            *state = SessionState::Stopped;
        }
        self.release();
        info!("session {} stopped", self.id);
    }

    /// Prioritize one target. Does not change the session state.
    pub fn switch_target(&self, target_index: usize) -> Result<(), SessionError> {
        let engine = self.resources.lock().engine.clone();
        match engine {
            Some(engine) => {
                engine.set_interested_target(Some(target_index));
                debug!("session {} interested target {}", self.id, target_index);
                Ok(())
            }
            None => Err(SessionError::InvalidState {
                op: "switch_target",
                state: self.state(),
            }),
        }
    }

    pub fn stats(&self) -> Option<StatsSnapshot> {
        self.stats.as_ref().map(|s| s.snapshot())
    }

    fn release(&self) {
        self.cancel.cancel();
        let Resources {
            video,
            engine,
            tasks,
            ..
        } = mem::take(&mut *self.resources.lock());
        drop(tasks);
        if let Some(engine) = engine {
            engine.stop_process_video();
        }
        if let Some(video) = video {
            video.stop_tracks();
            video.remove_surface();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("session {} dropped, releasing resources", self.id);
        self.release();
    }
}
