// Status notifier: lifecycle transitions to status UI calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::config::UiSettings;
use crate::platform::StatusUi;

/// Translates session transitions into indicator changes.
///
/// Indicators configured as hidden are never shown or hidden. The scanning
/// indicator is dismissed once per session, on the first found target.
pub struct StatusNotifier {
    ui: Arc<dyn StatusUi>,
    settings: UiSettings,
    target_found: AtomicBool,
}

impl StatusNotifier {
    pub fn new(ui: Arc<dyn StatusUi>, settings: UiSettings) -> Self {
        Self {
            ui,
            settings,
            target_found: AtomicBool::new(false),
        }
    }

    pub fn starting(&self) {
        if !self.settings.loading.is_hidden() {
            self.ui.show_loading();
        }
    }

    pub fn ready(&self) {
        if !self.settings.loading.is_hidden() {
            self.ui.hide_loading();
        }
        if !self.settings.scanning.is_hidden() {
            self.ui.show_scanning();
        }
    }

    /// Returns true only for the first call of the session.
    pub fn target_found(&self) -> bool {
        if self.target_found.swap(true, Ordering::AcqRel) {
            return false;
        }
        debug!("first target found, leaving scanning");
        if !self.settings.scanning.is_hidden() {
            self.ui.hide_scanning();
        }
        true
    }

    pub fn camera_unsupported(&self) {
        if !self.settings.error.is_hidden() {
            self.ui.show_compatibility_warning();
        }
    }
}
