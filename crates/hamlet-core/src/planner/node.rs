//! Search nodes and their arena.

use std::cmp::Ordering;

use hamlet_agents::GameAction;
use hamlet_types::{AgentState, EntityId};

/// One node of the search tree.
///
/// Nodes live in an arena `Vec`; parent links are arena indices, so the
/// full effective state of any node is reconstructable by walking the
/// chain. The root has no parent and no producing edge.
pub(super) struct GoapNode {
    /// Full agent-state snapshot after applying the producing edge.
    pub state: AgentState,
    /// Accumulated action cost from the root.
    pub g: f32,
    /// Heuristic estimate to the goal (0 when achieved, else 1).
    pub h: f32,
    /// Arena index of the parent node.
    pub parent: Option<usize>,
    /// The action/target pair that produced this node.
    pub edge: Option<(GameAction, EntityId)>,
}

impl GoapNode {
    pub fn root(state: AgentState) -> Self {
        Self {
            state,
            g: 0.0,
            h: 0.0,
            parent: None,
            edge: None,
        }
    }

    pub fn f(&self) -> f32 {
        self.g + self.h
    }
}

/// Open-set entry: a node index ordered so the `BinaryHeap` pops the
/// lowest f first, with the lower (earlier-created) index on ties.
pub(super) struct OpenEntry {
    pub f: f32,
    pub node: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f.total_cmp(&other.f) == Ordering::Equal && self.node == other.node
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed on both keys: BinaryHeap is a max-heap.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.node.cmp(&self.node))
    }
}
