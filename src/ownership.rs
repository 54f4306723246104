// src/ownership.rs

//! Hierarchical ownership and disposal.
//!
//! Every factory and live glob is a node in an [`OwnershipGraph`]. Nodes own
//! their children; disposing a node disposes its whole subtree, runs the
//! node's teardown actions and then tells the parent that one of its children
//! went away. A parent can opt into disposing itself once its last
//! not-yet-disposed child is gone, which is how a factory releases its
//! backend subscription when the last view closes.
//!
//! Nodes live in a `petgraph` arena. Edges point parent -> child, so a child
//! only refers to its parent through the graph index, never through a second
//! owning pointer. A node leaves the arena once it is disposed; ids carry a
//! generation so a stale id never resolves to a node that reused its slot.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use tracing::debug;

/// Teardown callback registered with [`OwnershipGraph::on_disposal`].
pub type DisposalAction = Box<dyn FnOnce() + Send>;

/// Handle to a node in an [`OwnershipGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId {
    index: NodeIndex,
    generation: u64,
}

struct OwnerNode {
    generation: u64,
    label: String,
    disposed: bool,
    dispose_on_last_child_disposed: bool,
    nondisposed_children: usize,
    actions: Vec<DisposalAction>,
}

impl fmt::Debug for OwnerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerNode")
            .field("generation", &self.generation)
            .field("label", &self.label)
            .field("disposed", &self.disposed)
            .field(
                "dispose_on_last_child_disposed",
                &self.dispose_on_last_child_disposed,
            )
            .field("nondisposed_children", &self.nondisposed_children)
            .field("actions", &self.actions.len())
            .finish()
    }
}

/// Outcome of [`OwnershipGraph::dispose`].
///
/// The graph itself never runs callbacks; it hands them back in the order
/// they must run so the caller can release any lock first.
#[must_use = "disposal actions must be run"]
pub struct Disposal {
    performed: bool,
    actions: Vec<DisposalAction>,
}

impl fmt::Debug for Disposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposal")
            .field("performed", &self.performed)
            .field("actions", &self.actions.len())
            .finish()
    }
}

impl Disposal {
    /// Whether the dispose call actually disposed the node.
    pub fn performed(&self) -> bool {
        self.performed
    }

    /// Run the collected actions in order and report [`Self::performed`].
    pub fn run(self) -> bool {
        for action in self.actions {
            action();
        }
        self.performed
    }
}

/// Arena of ownership nodes.
#[derive(Debug, Default)]
pub struct OwnershipGraph {
    graph: StableDiGraph<OwnerNode, ()>,
    next_generation: u64,
}

impl OwnershipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fresh, parentless node.
    pub fn add_node(&mut self, label: impl Into<String>) -> OwnerId {
        let generation = self.next_generation;
        self.next_generation += 1;
        let index = self.graph.add_node(OwnerNode {
            generation,
            label: label.into(),
            disposed: false,
            dispose_on_last_child_disposed: false,
            nondisposed_children: 0,
            actions: Vec::new(),
        });
        OwnerId { index, generation }
    }

    fn node(&self, id: OwnerId) -> Option<&OwnerNode> {
        self.graph
            .node_weight(id.index)
            .filter(|n| n.generation == id.generation)
    }

    fn node_mut(&mut self, id: OwnerId) -> Option<&mut OwnerNode> {
        self.graph
            .node_weight_mut(id.index)
            .filter(|n| n.generation == id.generation)
    }

    fn id_at(&self, index: NodeIndex) -> Option<OwnerId> {
        self.graph.node_weight(index).map(|n| OwnerId {
            index,
            generation: n.generation,
        })
    }

    /// Number of nodes still held by the arena.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// `None` once the node has been disposed and released.
    pub fn label(&self, id: OwnerId) -> Option<&str> {
        self.node(id).map(|n| n.label.as_str())
    }

    pub fn is_disposed(&self, id: OwnerId) -> bool {
        self.node(id).is_none_or(|n| n.disposed)
    }

    pub fn parent(&self, id: OwnerId) -> Option<OwnerId> {
        self.node(id)?;
        self.graph
            .neighbors_directed(id.index, Direction::Incoming)
            .next()
            .and_then(|index| self.id_at(index))
    }

    pub fn children(&self, id: OwnerId) -> Vec<OwnerId> {
        if self.node(id).is_none() {
            return Vec::new();
        }
        self.graph
            .neighbors_directed(id.index, Direction::Outgoing)
            .filter_map(|index| self.id_at(index))
            .collect()
    }

    /// Number of owned children that are not disposed yet.
    pub fn nondisposed_children(&self, id: OwnerId) -> usize {
        self.node(id).map_or(0, |n| n.nondisposed_children)
    }

    pub fn dispose_on_last_child_disposed(&mut self, id: OwnerId, enabled: bool) {
        if let Some(node) = self.node_mut(id) {
            node.dispose_on_last_child_disposed = enabled;
        }
    }

    /// Register a teardown action.
    ///
    /// If the node is already disposed the action is handed back so the
    /// caller can run it immediately; it is never silently dropped.
    pub fn on_disposal(&mut self, id: OwnerId, action: DisposalAction) -> Option<DisposalAction> {
        match self.node_mut(id) {
            Some(node) if !node.disposed => {
                node.actions.push(action);
                None
            }
            _ => Some(action),
        }
    }

    /// Detach `child` from its current owner (if any) and attach it to
    /// `parent`.
    ///
    /// Counters only move for children that are not disposed. A child or
    /// parent that has already been released is left unattached.
    pub fn set_owner(&mut self, child: OwnerId, parent: OwnerId) {
        if self.node(child).is_none() || self.node(parent).is_none() {
            return;
        }
        let child_disposed = self.is_disposed(child);

        if let Some(old_parent) = self.parent(child) {
            if let Some(edge) = self.graph.find_edge(old_parent.index, child.index) {
                self.graph.remove_edge(edge);
                if !child_disposed {
                    if let Some(node) = self.node_mut(old_parent) {
                        node.nondisposed_children = node.nondisposed_children.saturating_sub(1);
                    }
                }
            }
        }

        self.graph.add_edge(parent.index, child.index, ());
        if !child_disposed {
            if let Some(node) = self.node_mut(parent) {
                node.nondisposed_children += 1;
            }
        }
    }

    /// Dispose `id` and its subtree.
    ///
    /// Order of the returned actions: every child's actions (depth first),
    /// then this node's own actions in registration order, then the actions
    /// of any ancestor that auto-disposed as a consequence.
    pub fn dispose(&mut self, id: OwnerId) -> Disposal {
        let mut actions = Vec::new();
        let performed = self.dispose_into(id, &mut actions);
        Disposal { performed, actions }
    }

    fn dispose_into(&mut self, id: OwnerId, actions: &mut Vec<DisposalAction>) -> bool {
        match self.node_mut(id) {
            Some(node) if !node.disposed => {
                node.disposed = true;
                debug!(owner = %node.label, "disposing");
            }
            _ => return false,
        }

        for child in self.children(id) {
            self.dispose_into(child, actions);
        }

        if let Some(node) = self.node_mut(id) {
            actions.append(&mut node.actions);
        }

        if let Some(parent) = self.parent(id) {
            self.on_child_disposed(parent, actions);
        }

        // Drops the parent edge too. The parent may already be gone if it
        // auto-disposed above.
        self.graph.remove_node(id.index);
        true
    }

    fn on_child_disposed(&mut self, parent: OwnerId, actions: &mut Vec<DisposalAction>) {
        let should_dispose = match self.node_mut(parent) {
            Some(node) => {
                node.nondisposed_children = node.nondisposed_children.saturating_sub(1);
                node.dispose_on_last_child_disposed && node.nondisposed_children == 0
            }
            None => false,
        };

        if should_dispose {
            self.dispose_into(parent, actions);
        }
    }
}

/// Shared, lock-protected [`OwnershipGraph`].
///
/// Teardown actions always run after the lock is released, so an action may
/// call back into the graph.
#[derive(Debug, Clone, Default)]
pub struct Owners {
    inner: Arc<Mutex<OwnershipGraph>>,
}

impl Owners {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, OwnershipGraph> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_node(&self, label: impl Into<String>) -> OwnerId {
        self.lock().add_node(label)
    }

    pub fn is_disposed(&self, id: OwnerId) -> bool {
        self.lock().is_disposed(id)
    }

    /// Number of nodes not yet disposed and released.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn parent(&self, id: OwnerId) -> Option<OwnerId> {
        self.lock().parent(id)
    }

    pub fn nondisposed_children(&self, id: OwnerId) -> usize {
        self.lock().nondisposed_children(id)
    }

    pub fn dispose_on_last_child_disposed(&self, id: OwnerId, enabled: bool) {
        self.lock().dispose_on_last_child_disposed(id, enabled);
    }

    pub fn set_owner(&self, child: OwnerId, parent: OwnerId) {
        self.lock().set_owner(child, parent);
    }

    pub fn on_disposal(&self, id: OwnerId, action: impl FnOnce() + Send + 'static) {
        let late = self.lock().on_disposal(id, Box::new(action));
        if let Some(action) = late {
            action();
        }
    }

    /// Returns `true` if this call performed the disposal.
    pub fn dispose(&self, id: OwnerId) -> bool {
        let disposal = self.lock().dispose(id);
        disposal.run()
    }
}
