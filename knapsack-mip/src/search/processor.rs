//! Per-node cutting-plane loop.
//!
//! A node is processed by repeatedly solving its relaxation and asking the
//! registered cut families for violated rows. The loop ends when the node is
//! infeasible, dominated by the incumbent, integral and feasible, or when
//! separation stops making progress and the node branches.

use std::sync::atomic::{AtomicU64, Ordering};

use super::{BranchingSelector, SearchNode};
use crate::cuts::{CutPool, CutRegistry, SeparationContext, SeparationScratch};
use crate::error::{MipError, MipResult};
use crate::master::MasterBackend;
use crate::model::KnapsackProblem;
use crate::settings::MipSettings;

/// Thread-safe source of node identifiers. Id 0 is the root.
#[derive(Debug)]
pub struct NodeIds(AtomicU64);

impl Default for NodeIds {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeIds {
    /// Start numbering after the root.
    pub fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    /// Next unused id.
    pub fn next_id(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// How a node was closed.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutcome {
    /// The relaxation has no solution.
    Infeasible,

    /// The relaxation bound does not beat the incumbent.
    Pruned {
        /// Last relaxation bound.
        bound: f64,
    },

    /// The relaxation point is integral and satisfies the parity constraint.
    Integral {
        /// Rounded point.
        x: Vec<f64>,
        /// Objective of the rounded point.
        obj: f64,
    },

    /// The node was split on a fractional variable.
    Branched {
        /// Branching variable.
        var: usize,
        /// Its relaxation value.
        value: f64,
        /// Relaxation bound handed to the children.
        bound: f64,
    },
}

/// Everything a node produced.
#[derive(Debug, Clone)]
pub struct NodeReport {
    /// How the node was closed.
    pub outcome: NodeOutcome,

    /// Nodes to enqueue: branching children and sibling nodes for the regions
    /// cut off by cut batches. Returned for every outcome.
    pub children: Vec<SearchNode>,

    /// Cuts installed at this node.
    pub cuts_added: u64,

    /// Sibling nodes created for cut batches.
    pub complement_nodes: u64,

    /// Relaxation solves at this node.
    pub lp_solves: u64,
}

impl NodeReport {
    fn new() -> Self {
        Self {
            outcome: NodeOutcome::Infeasible,
            children: Vec::new(),
            cuts_added: 0,
            complement_nodes: 0,
            lp_solves: 0,
        }
    }
}

/// Solves search nodes against one master backend.
///
/// Each worker owns a processor. The problem, the cut registry and the
/// settings are shared read-only.
pub struct NodeProcessor<'a, B: MasterBackend> {
    prob: &'a KnapsackProblem,
    registry: &'a CutRegistry,
    settings: &'a MipSettings,
    ids: &'a NodeIds,
    backend: B,
    branching: BranchingSelector,
    scratch: SeparationScratch,
}

impl<'a, B: MasterBackend> NodeProcessor<'a, B> {
    /// Create a processor and initialize its backend with the problem.
    pub fn new(
        prob: &'a KnapsackProblem,
        registry: &'a CutRegistry,
        settings: &'a MipSettings,
        ids: &'a NodeIds,
        mut backend: B,
    ) -> MipResult<Self> {
        backend.initialize(prob)?;
        Ok(Self {
            prob,
            registry,
            settings,
            ids,
            backend,
            branching: BranchingSelector::new(settings.branching_rule),
            scratch: SeparationScratch::new(prob.num_vars()),
        })
    }

    /// The backend, for inspection.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Rebuild the node's relaxation in the backend.
    fn load(&mut self, node: &SearchNode) {
        self.backend.reset_var_bounds();
        for change in &node.bound_changes {
            self.backend.set_var_bounds(change.var, change.new_lb, change.new_ub);
        }
        self.backend.clear_cuts();
        for cut in node.cuts.iter() {
            self.backend.add_cut(cut);
        }
    }

    /// Process a node given the incumbent objective seen when it was popped.
    pub fn process(&mut self, node: &SearchNode, incumbent_obj: f64) -> MipResult<NodeReport> {
        let report = self.run(node, incumbent_obj)?;
        log::trace!(
            "node {} (depth {}): {:?}, {} children, {} cuts",
            node.id,
            node.depth,
            report.outcome,
            report.children.len(),
            report.cuts_added
        );
        Ok(report)
    }

    fn run(&mut self, node: &SearchNode, incumbent_obj: f64) -> MipResult<NodeReport> {
        self.load(node);

        let tol = self.settings.bound_tol;
        let pass_limit = self.settings.cut_passes_at_depth(node.depth);
        let mut report = NodeReport::new();
        let mut pool = node.cuts.clone();
        let mut pass = 0;
        let mut idle = 0;
        let mut last_bound = node.dual_bound;

        loop {
            let result = self.backend.solve()?;
            report.lp_solves += 1;

            if !result.is_optimal() {
                report.outcome = NodeOutcome::Infeasible;
                return Ok(report);
            }

            let bound = result.obj_val;
            // Adding rows and tightening bounds never loosens the relaxation
            debug_assert!(
                !last_bound.is_finite() || bound <= last_bound + tol * (1.0 + last_bound.abs()),
                "relaxation bound increased from {} to {}",
                last_bound,
                bound
            );
            if pass > 0 {
                if last_bound - bound > tol {
                    idle = 0;
                } else {
                    idle += 1;
                }
            }
            last_bound = bound;

            if bound <= incumbent_obj + tol {
                report.outcome = NodeOutcome::Pruned { bound };
                return Ok(report);
            }

            let integral = self.prob.is_integer_feasible(&result.x, self.settings.int_feas_tol);
            let separate = integral || (pass < pass_limit && idle < self.settings.max_idle_rounds);

            if separate {
                let ctx = SeparationContext {
                    in_tree: !node.is_root(),
                    pass,
                    at_solution: integral,
                };
                let installed = self.separate(node, &mut pool, &result.x, ctx, bound, &mut report);
                if installed > 0 {
                    pass += 1;
                    continue;
                }
            }

            if integral {
                let mut x = result.x;
                self.prob.round_integers(&mut x);
                let selection = self.prob.selection(&x);
                if !self.prob.is_feasible_selection(&selection) {
                    return Err(MipError::CutGenerationError(format!(
                        "integral point selecting {} items survived separation at node {}",
                        selection.len(),
                        node.id
                    )));
                }
                let obj = self.prob.objective(&x);
                report.outcome = NodeOutcome::Integral { x, obj };
                return Ok(report);
            }

            let decision = self
                .branching
                .select(&result.x, self.prob, self.settings.int_feas_tol)
                .ok_or_else(|| {
                    MipError::InternalError(format!(
                        "no branching candidate for a fractional point at node {}",
                        node.id
                    ))
                })?;

            for change in [decision.down_branch, decision.up_branch] {
                if change.is_infeasible() {
                    continue;
                }
                let child = node.child(self.ids.next_id(), change, pool.clone(), bound);
                report.children.push(child);
            }
            report.outcome = NodeOutcome::Branched {
                var: decision.var,
                value: decision.value,
                bound,
            };
            return Ok(report);
        }
    }

    /// Run one separation round and install what it finds.
    ///
    /// A batch is installed only if at least one of its cuts is violated at
    /// `x`. Each installed batch with a complement row spawns a sibling node
    /// built from the pool as it was before the batch.
    ///
    /// A batch whose complement row is already implied by the pool is
    /// skipped: the node lies entirely inside the complement region, so the
    /// batch would empty the node and hand the same region to a new sibling.
    fn separate(
        &mut self,
        node: &SearchNode,
        pool: &mut CutPool,
        x: &[f64],
        ctx: SeparationContext,
        bound: f64,
        report: &mut NodeReport,
    ) -> usize {
        let viol_tol = self.settings.cut_violation_tol;
        let mut installed = 0;

        for batch in self.registry.separate(x, &ctx, &mut self.scratch) {
            if !batch.cuts.iter().any(|cut| cut.is_violated(x, viol_tol)) {
                continue;
            }

            let complement = self.registry.complement(&batch);
            if complement.as_ref().is_some_and(|row| pool.implies(row)) {
                log::trace!(
                    "node {}: batch from family {} contradicts the node restriction, skipped",
                    node.id,
                    batch.family
                );
                continue;
            }

            let before = pool.clone();
            let mut fresh = 0;
            for cut in &batch.cuts {
                if pool.contains(cut) {
                    continue;
                }
                self.backend.add_cut(cut);
                pool.add(cut.clone());
                fresh += 1;
            }
            if fresh == 0 {
                continue;
            }
            installed += fresh;
            log::debug!(
                "node {}: installed {} cuts from family {} at pass {}",
                node.id,
                fresh,
                batch.family,
                ctx.pass
            );

            if let Some(row) = complement {
                let sibling = node.restricted(self.ids.next_id(), before, row, bound);
                report.children.push(sibling);
                report.complement_nodes += 1;
            }
        }

        report.cuts_added += installed as u64;
        installed
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::cuts::default_registry;
    use crate::master::{Cut, CutSource, MasterResult};

    /// Backend replaying scripted relaxation results.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct ScriptedBackend {
        pub responses: VecDeque<MasterResult>,
        pub cuts: Vec<Cut>,
        pub bounds: Vec<(usize, f64, f64)>,
        pub num_vars: usize,
    }

    impl ScriptedBackend {
        pub fn new(responses: Vec<MasterResult>) -> Self {
            Self {
                responses: responses.into(),
                ..Self::default()
            }
        }
    }

    impl MasterBackend for ScriptedBackend {
        fn initialize(&mut self, prob: &KnapsackProblem) -> MipResult<()> {
            self.num_vars = prob.num_vars();
            self.cuts.clear();
            self.bounds.clear();
            Ok(())
        }

        fn add_cut(&mut self, cut: &Cut) -> usize {
            self.cuts.push(cut.clone());
            self.cuts.len() - 1
        }

        fn clear_cuts(&mut self) {
            self.cuts.clear();
        }

        fn set_var_bounds(&mut self, var: usize, lb: f64, ub: f64) {
            self.bounds.push((var, lb, ub));
        }

        fn reset_var_bounds(&mut self) {
            self.bounds.clear();
        }

        fn solve(&mut self) -> MipResult<MasterResult> {
            self.responses
                .pop_front()
                .ok_or_else(|| MipError::InternalError("script exhausted".into()))
        }

        fn num_cuts(&self) -> usize {
            self.cuts.len()
        }

        fn num_vars(&self) -> usize {
            self.num_vars
        }
    }

    fn scenario_a() -> KnapsackProblem {
        KnapsackProblem::from_vectors(&[2, 3, 4, 5], &[3, 4, 5, 6], 9).unwrap()
    }

    fn run(
        prob: &KnapsackProblem,
        node: &SearchNode,
        incumbent: f64,
        script: Vec<MasterResult>,
    ) -> (NodeReport, usize) {
        let registry = default_registry(prob);
        let settings = MipSettings::default();
        let ids = NodeIds::new();
        let mut processor =
            NodeProcessor::new(prob, &registry, &settings, &ids, ScriptedBackend::new(script)).unwrap();
        let report = processor.process(node, incumbent).unwrap();
        (report, processor.backend().num_cuts())
    }

    #[test]
    fn test_even_integral_point_is_cut_then_accepted() {
        let prob = scenario_a();
        let script = vec![
            MasterResult::optimal(vec![1.0, 1.0, 1.0, 1.0], 18.0),
            MasterResult::optimal(vec![1.0, 1.0, 1.0, 0.0], 12.0),
        ];
        let (report, installed) = run(&prob, &SearchNode::root(), f64::NEG_INFINITY, script);

        assert_eq!(report.lp_solves, 2);
        assert_eq!(report.cuts_added, 2);
        assert_eq!(installed, 2);
        // Selecting five of four items is impossible, no sibling
        assert!(report.children.is_empty());
        assert_eq!(
            report.outcome,
            NodeOutcome::Integral {
                x: vec![1.0, 1.0, 1.0, 0.0],
                obj: 12.0
            }
        );
    }

    #[test]
    fn test_cut_batch_spawns_sibling() {
        let prob = scenario_a();
        let script = vec![
            MasterResult::optimal(vec![1.0, 1.0, 0.0, 0.0], 7.0),
            MasterResult::optimal(vec![1.0, 0.0, 0.0, 0.0], 3.0),
        ];
        let (report, _) = run(&prob, &SearchNode::root(), f64::NEG_INFINITY, script);

        assert_eq!(report.complement_nodes, 1);
        assert_eq!(report.children.len(), 1);

        let sibling = &report.children[0];
        assert_eq!(sibling.depth, 1);
        assert_eq!(sibling.dual_bound, 7.0);
        assert_eq!(sibling.cuts.len(), 1);
        let row = sibling.cuts.iter().next().unwrap();
        assert_eq!(row.lb, 3.0);
        assert_eq!(row.activity(&[1.0; 4]), 4.0);

        assert!(matches!(report.outcome, NodeOutcome::Integral { obj, .. } if obj == 3.0));
    }

    #[test]
    fn test_fractional_point_branches() {
        let prob = scenario_a();
        let script = vec![MasterResult::optimal(vec![1.0, 0.5, 0.0, 0.0], 5.0)];
        let (report, _) = run(&prob, &SearchNode::root(), f64::NEG_INFINITY, script);

        assert_eq!(
            report.outcome,
            NodeOutcome::Branched {
                var: 1,
                value: 0.5,
                bound: 5.0
            }
        );
        assert_eq!(report.children.len(), 2);
        assert_eq!(report.children[0].bound_changes[0].new_ub, 0.0);
        assert_eq!(report.children[1].bound_changes[0].new_lb, 1.0);
        assert_ne!(report.children[0].id, report.children[1].id);
    }

    #[test]
    fn test_dominated_node_is_pruned() {
        let prob = scenario_a();
        let script = vec![MasterResult::optimal(vec![1.0, 1.0, 0.5, 0.0], 9.5)];
        let (report, _) = run(&prob, &SearchNode::root(), 12.0, script);

        assert_eq!(report.outcome, NodeOutcome::Pruned { bound: 9.5 });
        assert!(report.children.is_empty());
    }

    #[test]
    fn test_infeasible_relaxation() {
        let prob = scenario_a();
        let (report, _) = run(&prob, &SearchNode::root(), 0.0, vec![MasterResult::infeasible()]);

        assert_eq!(report.outcome, NodeOutcome::Infeasible);
        assert_eq!(report.lp_solves, 1);
    }

    #[test]
    fn test_tree_node_separates_once() {
        let prob = KnapsackProblem::from_vectors(&[1; 6], &[1; 6], 6).unwrap();
        let mut node = SearchNode::root();
        node.id = 1;
        node.depth = 1;

        let script = vec![
            MasterResult::optimal(vec![1.0, 1.0, 0.5, 0.0, 0.0, 0.0], 2.5),
            MasterResult::optimal(vec![1.0, 1.0, 1.0, 1.0, 0.5, 0.0], 2.4),
        ];
        let (report, installed) = run(&prob, &node, f64::NEG_INFINITY, script);

        // Only pass 0 separates below the root
        assert_eq!(installed, 2);
        assert!(matches!(report.outcome, NodeOutcome::Branched { var: 4, .. }));
    }

    #[test]
    fn test_sibling_with_same_even_count_branches() {
        let prob = KnapsackProblem::from_vectors(&[3, 3, 1, 1, 1], &[10, 10, 2, 2, 2], 6).unwrap();
        // Region left over by a batch for two selected items
        let above_two = Cut::from_dense(&[1.0; 5], 3.0, 5.0, CutSource::Complement { selected: 2 });
        let sibling = SearchNode::root().restricted(1, CutPool::new(), above_two, 20.0);

        // Two items above the threshold again, the rest fractional
        let script = vec![MasterResult::optimal(vec![1.0, 0.5, 1.0, 0.25, 0.25], 18.0)];
        let (report, installed) = run(&prob, &sibling, 10.0, script);

        assert_eq!(report.cuts_added, 0);
        assert_eq!(report.complement_nodes, 0);
        assert_eq!(installed, 1);
        assert!(matches!(report.outcome, NodeOutcome::Branched { var: 1, .. }));
        assert_eq!(report.children.len(), 2);
        assert!(report.children.iter().all(|child| child.cuts.len() == 1));
    }

    #[test]
    fn test_node_state_is_loaded() {
        let prob = scenario_a();
        let registry = default_registry(&prob);
        let settings = MipSettings::default();
        let ids = NodeIds::new();
        let script = vec![MasterResult::optimal(vec![0.0, 0.0, 1.0, 0.0], 5.0)];
        let mut processor =
            NodeProcessor::new(&prob, &registry, &settings, &ids, ScriptedBackend::new(script)).unwrap();

        let mut pool = CutPool::new();
        pool.add(Cut::from_dense(&[1.0, 0.0, 0.0, 0.0], 0.0, 0.0, CutSource::User));
        let node = SearchNode::root().child(
            7,
            crate::search::BoundChange::down_branch(1, 0.0, 0.5),
            pool,
            10.0,
        );

        let report = processor.process(&node, f64::NEG_INFINITY).unwrap();
        assert!(matches!(report.outcome, NodeOutcome::Integral { obj, .. } if obj == 5.0));
        assert_eq!(processor.backend().cuts.len(), 1);
        assert_eq!(processor.backend().bounds, vec![(1, 0.0, 0.0)]);
    }
}
