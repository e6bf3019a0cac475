//! Search node representation.

use crate::cuts::CutPool;
use crate::master::Cut;

/// A bound change from branching.
#[derive(Debug, Clone, Copy)]
pub struct BoundChange {
    /// Variable index.
    pub var: usize,

    /// New lower bound.
    pub new_lb: f64,

    /// New upper bound.
    pub new_ub: f64,
}

impl BoundChange {
    /// Create a "down" branch: x <= floor(value), keeping the lower bound `lb`.
    pub fn down_branch(var: usize, lb: f64, value: f64) -> Self {
        Self {
            var,
            new_lb: lb,
            new_ub: value.floor(),
        }
    }

    /// Create an "up" branch: x >= ceil(value), keeping the upper bound `ub`.
    pub fn up_branch(var: usize, ub: f64, value: f64) -> Self {
        Self {
            var,
            new_lb: value.ceil(),
            new_ub: ub,
        }
    }

    /// Check if the bound change creates an empty domain.
    pub fn is_infeasible(&self) -> bool {
        self.new_lb > self.new_ub + 1e-9
    }
}

/// A node in the search tree.
///
/// A node owns everything needed to rebuild its relaxation: the bound
/// changes accumulated from the root and the cuts active in its subtree.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Unique node identifier.
    pub id: u64,

    /// Parent node ID (None for root).
    pub parent_id: Option<u64>,

    /// Depth in the tree (0 for root).
    pub depth: usize,

    /// Bound changes from the root to this node, in application order.
    pub bound_changes: Vec<BoundChange>,

    /// Cuts active in this node's relaxation.
    pub cuts: CutPool,

    /// Relaxation bound inherited from the parent.
    /// Upper bound on the objective reachable in this subtree.
    pub dual_bound: f64,
}

impl SearchNode {
    /// Create the root node.
    pub fn root() -> Self {
        Self {
            id: 0,
            parent_id: None,
            depth: 0,
            bound_changes: Vec::new(),
            cuts: CutPool::new(),
            dual_bound: f64::INFINITY,
        }
    }

    /// Create a child node from a bound change.
    pub fn child(&self, id: u64, bound_change: BoundChange, cuts: CutPool, dual_bound: f64) -> Self {
        let mut bound_changes = self.bound_changes.clone();
        bound_changes.push(bound_change);
        Self {
            id,
            parent_id: Some(self.id),
            depth: self.depth + 1,
            bound_changes,
            cuts,
            dual_bound,
        }
    }

    /// Create a node covering the part of this node's region where `row`
    /// holds, on top of the cuts in `cuts`.
    pub fn restricted(&self, id: u64, mut cuts: CutPool, row: Cut, dual_bound: f64) -> Self {
        cuts.add(row);
        Self {
            id,
            parent_id: Some(self.id),
            depth: self.depth + 1,
            bound_changes: self.bound_changes.clone(),
            cuts,
            dual_bound,
        }
    }

    /// Check if the node is the root.
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    /// Check if this node can be pruned by an incumbent.
    ///
    /// A node can be pruned if its relaxation bound does not exceed the
    /// incumbent objective.
    pub fn can_prune(&self, incumbent_obj: f64, tol: f64) -> bool {
        self.dual_bound <= incumbent_obj + tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::master::CutSource;

    #[test]
    fn test_root_node() {
        let root = SearchNode::root();
        assert_eq!(root.id, 0);
        assert!(root.parent_id.is_none());
        assert!(root.is_root());
        assert!(root.bound_changes.is_empty());
        assert!(root.cuts.is_empty());
    }

    #[test]
    fn test_child_accumulates_bound_changes() {
        let root = SearchNode::root();
        let first = root.child(1, BoundChange::down_branch(0, 0.0, 0.5), CutPool::new(), 10.0);
        let second = first.child(3, BoundChange::up_branch(2, 1.0, 0.4), CutPool::new(), 9.0);

        assert_eq!(second.parent_id, Some(1));
        assert_eq!(second.depth, 2);
        assert_eq!(second.bound_changes.len(), 2);
        assert_eq!(second.bound_changes[0].new_ub, 0.0);
        assert_eq!(second.bound_changes[1].new_lb, 1.0);
        assert_eq!(first.bound_changes.len(), 1);
    }

    #[test]
    fn test_restricted_node_adds_row() {
        let root = SearchNode::root();
        let row = Cut::from_dense(&[1.0, 1.0, 1.0], 3.0, 3.0, CutSource::User);
        let node = root.restricted(2, root.cuts.clone(), row, 5.0);

        assert_eq!(node.depth, 1);
        assert_eq!(node.cuts.len(), 1);
        assert!(root.cuts.is_empty());
        assert_eq!(node.dual_bound, 5.0);
    }

    #[test]
    fn test_bound_changes() {
        let down = BoundChange::down_branch(0, 0.0, 0.7);
        assert_eq!(down.new_lb, 0.0);
        assert_eq!(down.new_ub, 0.0);
        assert!(!down.is_infeasible());

        let up = BoundChange::up_branch(0, 1.0, 0.7);
        assert_eq!(up.new_lb, 1.0);
        assert_eq!(up.new_ub, 1.0);
        assert!(!up.is_infeasible());

        let bad = BoundChange::up_branch(0, 0.0, 0.3);
        assert!(bad.is_infeasible());
    }

    #[test]
    fn test_pruning() {
        let mut node = SearchNode::root();
        node.dual_bound = 10.0;

        // Incumbent 8: cannot prune (10 > 8)
        assert!(!node.can_prune(8.0, 1e-6));

        // Incumbent 10: can prune, nothing strictly better below
        assert!(node.can_prune(10.0, 1e-6));

        // Incumbent 12: can prune
        assert!(node.can_prune(12.0, 1e-6));
    }
}
