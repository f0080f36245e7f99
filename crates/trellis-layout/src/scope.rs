//! Shared size scopes.
//!
//! A [`SharedSizeScope`] makes corresponding tracks of cooperating grids
//! agree on size: every participating grid reports its per-axis lean
//! lengths when it measures, and at arrange time asks the host for the
//! governing (maximum) lean length per track position. Because all siblings
//! measure before any of them arranges, the aggregate each grid reads
//! reflects the full cohort for that layout cycle, and every asker gets the
//! same answer.
//!
//! Sharing granularity is positional: track `i` of one participant matches
//! track `i` of every other, regardless of either grid's track count.
//!
//! The host is a non-owning aggregator. Grids hold `Weak` references to it
//! and its lifetime is governed by its defining owner (see
//! [`ScopeRegistry`]), not by participant count; disposing it forces every
//! participant to re-resolve to an enclosing scope or none.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::trace;
use trellis_core::{Axis, NodeId, VisualTree};

use crate::grid::GridId;

#[derive(Debug, Clone, Default)]
struct ParticipantLeans {
    columns: Vec<f64>,
    rows: Vec<f64>,
}

impl ParticipantLeans {
    fn along(&self, axis: Axis) -> &[f64] {
        match axis {
            Axis::Horizontal => &self.columns,
            Axis::Vertical => &self.rows,
        }
    }
}

/// Aggregator for one shared size scope.
#[derive(Debug, Default)]
pub struct SharedSizeScope {
    participants: BTreeMap<GridId, ParticipantLeans>,
    disposed: bool,
}

impl SharedSizeScope {
    /// Create an empty scope host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope host behind the shared handle grids join through.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Add a grid to the membership set.
    ///
    /// # Panics
    /// Panics on duplicate registration or registration with a disposed
    /// host: both indicate a broken attach/detach state machine upstream,
    /// and tolerating them would silently desynchronize shared sizing.
    pub fn register(&mut self, id: GridId) {
        assert!(
            !self.disposed,
            "grid {id:?} registered with a disposed shared size scope"
        );
        let previous = self.participants.insert(id, ParticipantLeans::default());
        assert!(
            previous.is_none(),
            "grid {id:?} double-registered with shared size scope"
        );
    }

    /// Remove a grid from the membership set. Idempotent.
    pub fn unregister(&mut self, id: GridId) {
        self.participants.remove(&id);
    }

    /// Whether a grid is currently registered.
    #[must_use]
    pub fn is_registered(&self, id: GridId) -> bool {
        self.participants.contains_key(&id)
    }

    /// Number of registered grids.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Record a participant's lean lengths from its measure pass.
    pub fn record_measure(&mut self, id: GridId, columns: Vec<f64>, rows: Vec<f64>) {
        debug_assert!(
            self.participants.contains_key(&id),
            "measure notification from unregistered grid {id:?}"
        );
        if let Some(leans) = self.participants.get_mut(&id) {
            leans.columns = columns;
            leans.rows = rows;
        }
    }

    /// Governing lean lengths for one axis: the per-position maximum across
    /// all registered participants, sized to the longest participant list.
    #[must_use]
    pub fn governing(&self, axis: Axis) -> Vec<f64> {
        let mut out: Vec<f64> = Vec::new();
        for leans in self.participants.values() {
            let leans = leans.along(axis);
            if leans.len() > out.len() {
                out.resize(leans.len(), 0.0);
            }
            for (slot, &lean) in out.iter_mut().zip(leans) {
                *slot = slot.max(lean);
            }
        }
        out
    }

    /// Governing lean lengths for both axes, read by a grid at arrange
    /// time. The answer is identical for every asker in a layout cycle.
    #[must_use]
    pub fn handle_arrange(&self, id: GridId) -> (Vec<f64>, Vec<f64>) {
        debug_assert!(
            self.participants.contains_key(&id),
            "arrange request from unregistered grid {id:?}"
        );
        trace!(
            grid = id.get(),
            participants = self.participants.len(),
            "shared size scope governing read"
        );
        (self.governing(Axis::Horizontal), self.governing(Axis::Vertical))
    }

    /// Tear the scope down: membership is cleared and the host answers no
    /// further queries. Participants observe this and re-resolve.
    pub fn dispose(&mut self) {
        self.participants.clear();
        self.disposed = true;
    }

    /// Whether the host has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Maps scope-defining nodes of a visual hierarchy to their scope hosts.
///
/// Setting the scope flag on a node creates a host owned by that node's
/// entry; clearing it disposes the host. Grids resolve their scope by
/// walking to the nearest ancestor with a live host, so after a dispose the
/// same walk lands on an enclosing outer scope or none.
#[derive(Debug, Default)]
pub struct ScopeRegistry {
    hosts: BTreeMap<NodeId, Rc<RefCell<SharedSizeScope>>>,
}

impl ScopeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the scope-defining flag for a node.
    ///
    /// Enabling is idempotent; disabling disposes the node's host so every
    /// registered grid re-resolves on its next layout pass.
    pub fn set_scope_flag(&mut self, node: NodeId, enabled: bool) {
        if enabled {
            self.hosts.entry(node).or_insert_with(SharedSizeScope::shared);
        } else if let Some(host) = self.hosts.remove(&node) {
            host.borrow_mut().dispose();
        }
    }

    /// The host defined by a node, if the flag is set.
    #[must_use]
    pub fn host_at(&self, node: NodeId) -> Option<Rc<RefCell<SharedSizeScope>>> {
        self.hosts.get(&node).cloned()
    }

    /// Resolve the scope for a node: the nearest strict ancestor defining a
    /// live scope, or `None`.
    #[must_use]
    pub fn resolve<T>(
        &self,
        tree: &VisualTree<T>,
        node: NodeId,
    ) -> Option<Rc<RefCell<SharedSizeScope>>> {
        tree.ancestors(node).find_map(|ancestor| {
            self.hosts
                .get(&ancestor)
                .filter(|host| !host.borrow().is_disposed())
                .cloned()
        })
    }
}
