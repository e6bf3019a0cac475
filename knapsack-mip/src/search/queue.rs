//! Node priority queue for tree exploration.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::SearchNode;
use crate::settings::NodeSelection;

/// Entry in the node queue with priority.
#[derive(Debug)]
struct QueuedNode {
    node: SearchNode,
    priority: f64, // Higher = selected first
}

impl PartialEq for QueuedNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedNode {}

impl PartialOrd for QueuedNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first, older node on ties
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.node.id.cmp(&self.node.id))
    }
}

/// Priority queue for search nodes.
#[derive(Debug)]
pub struct NodeQueue {
    /// Node selection strategy.
    strategy: NodeSelection,

    /// Priority queue (max-heap by priority).
    heap: BinaryHeap<QueuedNode>,
}

impl NodeQueue {
    /// Create a new node queue with the given strategy.
    pub fn new(strategy: NodeSelection) -> Self {
        Self {
            strategy,
            heap: BinaryHeap::new(),
        }
    }

    /// Add a node to the queue.
    pub fn push(&mut self, node: SearchNode) {
        let priority = self.compute_priority(&node);
        self.heap.push(QueuedNode { node, priority });
    }

    /// Get the next node to process.
    pub fn pop(&mut self) -> Option<SearchNode> {
        self.heap.pop().map(|queued| queued.node)
    }

    /// Get the best (highest) relaxation bound across all open nodes.
    ///
    /// Negative infinity when the queue is empty.
    pub fn best_bound(&self) -> f64 {
        self.heap
            .iter()
            .map(|q| q.node.dual_bound)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Prune nodes that cannot improve on the incumbent.
    ///
    /// Returns the number of pruned nodes.
    pub fn prune_by_bound(&mut self, incumbent_obj: f64, tol: f64) -> usize {
        let before = self.heap.len();
        self.heap.retain(|q| !q.node.can_prune(incumbent_obj, tol));
        before - self.heap.len()
    }

    /// Drop every open node.
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Get the number of nodes in the queue.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Compute priority for a node based on selection strategy.
    fn compute_priority(&self, node: &SearchNode) -> f64 {
        match self.strategy {
            // Highest relaxation bound first
            NodeSelection::BestBound => node.dual_bound,
            // Deepest first
            NodeSelection::DepthFirst => node.depth as f64,
        }
    }
}
