use std::sync::Arc;

use tracing::debug;

use super::logging::init_tracing;
use crate::config::SessionConfig;
use crate::engine::session::SessionState;
use crate::engine::system::ArSystem;
use crate::error::SessionError;
use crate::platform::Anchor;

/// Thin adapter between a scene host's component hooks and [`ArSystem`].
///
/// The host calls `attach` when the AR component is created, `render_started`
/// once its renderer is up, and `detach` when the component is removed.
pub struct HostAdapter {
    system: ArSystem,
    auto_start: bool,
}

impl HostAdapter {
    /// Component created: install logging and configure the system.
    pub fn attach(system: ArSystem, config: SessionConfig, auto_start: bool) -> Self {
        init_tracing();
        system.setup(config);
        Self { system, auto_start }
    }

    /// Like [`HostAdapter::attach`] with the configuration given as JSON.
    pub fn attach_json(
        system: ArSystem,
        json: &str,
        auto_start: bool,
    ) -> Result<Self, SessionError> {
        let config = SessionConfig::from_json(json)?;
        Ok(Self::attach(system, config, auto_start))
    }

    /// Anchor component created.
    pub fn anchor_attached(&self, anchor: Arc<dyn Anchor>, target_index: usize) {
        self.system.register_anchor(anchor, target_index);
    }

    /// Renderer started: start the session when auto-start is on.
    pub async fn render_started(&self) -> Result<(), SessionError> {
        if !self.auto_start {
            debug!("auto start disabled, waiting for an explicit start");
            return Ok(());
        }
        self.system.start().await
    }

    /// Component removed: stop whatever session is active.
    pub fn detach(&self) -> Result<(), SessionError> {
        if self.system.state() == SessionState::Idle {
            return Ok(());
        }
        self.system.stop()
    }

    pub fn system(&self) -> &ArSystem {
        &self.system
    }
}
