// Anchor registry: target index to the anchors following that target.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::geometry::{Mat4, TargetGeometry};
use crate::platform::Anchor;

/// One anchor bound to a target index. The index never changes after registration.
pub struct AnchorBinding {
    anchor: Arc<dyn Anchor>,
    target_index: usize,
    configured: bool,
}

impl AnchorBinding {
    pub fn target_index(&self) -> usize {
        self.target_index
    }

    /// Whether `setup_marker` has been called in the current session.
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    fn configure(&mut self, geometry: &TargetGeometry) {
        if !self.configured {
            self.anchor.setup_marker(geometry);
            self.configured = true;
        }
    }
}

/// Bindings grouped per target index, each group in registration order.
///
/// Registration is valid at any time, including before a session exists.
/// Once a target set is loaded, late registrations are configured on the spot.
#[derive(Default)]
pub struct AnchorRegistry {
    bindings: BTreeMap<usize, Vec<AnchorBinding>>,
    targets: Option<Vec<TargetGeometry>>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding. Returns true when it was configured immediately.
    pub fn register(&mut self, anchor: Arc<dyn Anchor>, target_index: usize) -> bool {
        let mut binding = AnchorBinding {
            anchor,
            target_index,
            configured: false,
        };
        if let Some(geometry) = self.targets.as_ref().and_then(|t| t.get(target_index)) {
            binding.configure(geometry);
        }
        let configured = binding.configured;
        self.bindings.entry(target_index).or_default().push(binding);
        debug!(
            "anchor registered for target {} (configured={})",
            target_index, configured
        );
        configured
    }

    /// Hand `geometry` to every unconfigured binding of `target_index`.
    pub fn resolve_geometry(&mut self, target_index: usize, geometry: &TargetGeometry) -> usize {
        let Some(group) = self.bindings.get_mut(&target_index) else {
            return 0;
        };
        let mut configured = 0;
        for binding in group.iter_mut().filter(|b| !b.configured) {
            binding.configure(geometry);
            configured += 1;
        }
        configured
    }

    /// Store a freshly loaded target set and configure every matching binding.
    ///
    /// Bindings whose index is past the end of the set stay unconfigured.
    pub fn load_targets(&mut self, dimensions: Vec<TargetGeometry>) -> usize {
        let mut configured = 0;
        for (index, geometry) in dimensions.iter().enumerate() {
            configured += self.resolve_geometry(index, geometry);
        }
        for (index, group) in self.bindings.range(dimensions.len()..) {
            warn!(
                "{} anchor(s) bound to target {} but only {} target(s) loaded",
                group.len(),
                index,
                dimensions.len()
            );
        }
        self.targets = Some(dimensions);
        configured
    }

    /// Forward a pose to every binding of `target_index`. Returns the number reached.
    pub fn dispatch(&self, target_index: usize, world_matrix: Option<&Mat4>) -> usize {
        let Some(group) = self.bindings.get(&target_index) else {
            return 0;
        };
        for binding in group {
            binding.anchor.update_world_matrix(world_matrix);
        }
        group.len()
    }

    /// Forget the loaded target set so the next session configures anchors again.
    pub fn reset_session(&mut self) {
        self.targets = None;
        for binding in self.bindings.values_mut().flatten() {
            binding.configured = false;
        }
    }

    pub fn targets_loaded(&self) -> Option<usize> {
        self.targets.as_ref().map(Vec::len)
    }

    pub fn len(&self) -> usize {
        self.bindings.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bindings_for(&self, target_index: usize) -> &[AnchorBinding] {
        self.bindings
            .get(&target_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
