//! Branch-and-cut tree controller.

use std::time::Instant;

use super::{NodeIds, NodeOutcome, NodeProcessor, NodeQueue, NodeReport, SearchNode};
use crate::cuts::CutRegistry;
use crate::error::MipResult;
use crate::master::MasterBackend;
use crate::model::{IncumbentTracker, KnapsackProblem, KnapsackSolution, MipStatus, SolveStats};
use crate::settings::MipSettings;

/// Sequential branch-and-cut controller.
///
/// Manages the node queue, incumbent, and termination. Nodes are handed to
/// a [`NodeProcessor`] one at a time.
pub struct BranchAndCut {
    /// Node queue.
    queue: NodeQueue,

    /// Incumbent solution tracker.
    pub incumbent: IncumbentTracker,

    /// Search counters.
    stats: SolveStats,

    /// Start time.
    start_time: Option<Instant>,

    /// Settings.
    settings: MipSettings,
}

impl BranchAndCut {
    /// Create a new controller.
    pub fn new(settings: MipSettings) -> Self {
        Self {
            queue: NodeQueue::new(settings.node_selection),
            incumbent: IncumbentTracker::new(),
            stats: SolveStats::default(),
            start_time: None,
            settings,
        }
    }

    /// Initialize with the root node.
    pub fn initialize(&mut self) {
        self.start_time = Some(Instant::now());
        self.queue.clear();
        self.queue.push(SearchNode::root());
    }

    /// Run the search to completion or until a limit is hit.
    pub fn solve<B: MasterBackend>(
        &mut self,
        prob: &KnapsackProblem,
        registry: &CutRegistry,
        backend: B,
    ) -> MipResult<KnapsackSolution> {
        let settings = self.settings.clone();
        let ids = NodeIds::new();
        let mut processor = NodeProcessor::new(prob, registry, &settings, &ids, backend)?;

        self.initialize();
        if settings.verbose {
            log::info!(
                "Branch-and-cut: {} items ({} fixed), capacity {}, cut families {:?}",
                prob.num_vars(),
                prob.num_fixed(),
                prob.capacity,
                registry.names()
            );
        }

        let status = loop {
            if let Some(status) = self.check_termination() {
                break status;
            }
            let Some(node) = self.next_node() else {
                break self.exhausted_status();
            };

            if node.can_prune(self.incumbent.obj_val, settings.bound_tol) {
                self.node_pruned();
                continue;
            }

            let report = processor.process(&node, self.incumbent.obj_val)?;
            self.record(report);
            self.log_progress();
        };

        let solution = self.finalize(prob, status);
        if settings.verbose {
            log::info!(
                "Finished: {:?}, obj={}, nodes={}, cuts={}, time={}ms",
                solution.status,
                solution.obj_val,
                solution.stats.nodes_explored,
                solution.stats.cuts_added,
                solution.stats.solve_time_ms
            );
        }
        Ok(solution)
    }

    /// Get the next node to process.
    pub fn next_node(&mut self) -> Option<SearchNode> {
        self.queue.pop()
    }

    /// Number of open nodes.
    pub fn open_nodes(&self) -> usize {
        self.queue.len()
    }

    /// Record that a node was pruned.
    pub fn node_pruned(&mut self) {
        self.stats.nodes_pruned += 1;
    }

    /// Fold a processed node into the tree.
    pub(crate) fn record(&mut self, report: NodeReport) {
        self.stats.nodes_explored += 1;
        self.stats.cuts_added += report.cuts_added;
        self.stats.complement_nodes += report.complement_nodes;
        self.stats.lp_solves += report.lp_solves;

        match report.outcome {
            NodeOutcome::Infeasible | NodeOutcome::Pruned { .. } => self.stats.nodes_pruned += 1,
            NodeOutcome::Integral { x, obj } => {
                self.update_incumbent(&x, obj);
            }
            NodeOutcome::Branched { .. } => {}
        }

        for child in report.children {
            self.enqueue(child);
        }
    }

    /// Add a node to the queue unless the incumbent already dominates it.
    pub fn enqueue(&mut self, node: SearchNode) {
        if node.can_prune(self.incumbent.obj_val, self.settings.bound_tol) {
            self.stats.nodes_pruned += 1;
        } else {
            self.queue.push(node);
        }
    }

    /// Update incumbent with a new solution.
    ///
    /// Returns true if incumbent was improved.
    pub fn update_incumbent(&mut self, x: &[f64], obj: f64) -> bool {
        let improved = self.incumbent.update(x, obj);

        if improved {
            // Prune nodes dominated by new incumbent
            let pruned = self.queue.prune_by_bound(obj, self.settings.bound_tol);
            self.stats.nodes_pruned += pruned as u64;

            if self.settings.verbose {
                log::info!("New incumbent: obj={}, pruned {} nodes", obj, pruned);
            }
        }

        improved
    }

    /// Get the best bound over open nodes.
    pub fn best_bound(&self) -> f64 {
        self.queue.best_bound()
    }

    /// Get elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    /// Check if time limit is exceeded.
    pub fn time_limit_exceeded(&self) -> bool {
        match self.settings.time_limit_ms {
            Some(limit) => self.elapsed_ms() >= limit,
            None => false,
        }
    }

    /// Check termination conditions.
    ///
    /// Returns Some(status) if we should terminate, None otherwise.
    pub fn check_termination(&self) -> Option<MipStatus> {
        if self.queue.is_empty() {
            return Some(self.exhausted_status());
        }
        self.limit_reached(0)
    }

    /// Check the time and node budgets, counting `in_flight` nodes that are
    /// being processed elsewhere as explored.
    pub fn limit_reached(&self, in_flight: usize) -> Option<MipStatus> {
        if self.time_limit_exceeded() {
            return Some(MipStatus::TimeLimit);
        }

        if self.stats.nodes_explored + in_flight as u64 >= self.settings.max_nodes {
            return Some(MipStatus::NodeLimit);
        }

        None
    }

    /// Status once the queue has run dry.
    pub(crate) fn exhausted_status(&self) -> MipStatus {
        if self.incumbent.has_incumbent() {
            MipStatus::Optimal
        } else {
            MipStatus::Infeasible
        }
    }

    /// Finalize the solve and return the solution.
    pub fn finalize(&self, prob: &KnapsackProblem, status: MipStatus) -> KnapsackSolution {
        let mut stats = self.stats.clone();
        stats.incumbent_updates = self.incumbent.update_count;
        stats.solve_time_ms = self.elapsed_ms();

        assemble_solution(prob, status, &self.incumbent, self.queue.best_bound(), stats)
    }

    /// Log progress (if verbose).
    pub fn log_progress(&self) {
        if !self.settings.verbose || self.stats.nodes_explored % self.settings.log_freq.max(1) != 0 {
            return;
        }

        log::info!(
            "Nodes: {} ({} open) | Bound: {} | Incumbent: {} | Cuts: {} | Siblings: {} | Time: {:.1}s",
            self.stats.nodes_explored,
            self.queue.len(),
            self.queue.best_bound(),
            self.incumbent.obj_val,
            self.stats.cuts_added,
            self.stats.complement_nodes,
            self.elapsed_ms() as f64 / 1000.0,
        );
    }
}

/// Build the public solution from the final incumbent.
pub(crate) fn assemble_solution(
    prob: &KnapsackProblem,
    status: MipStatus,
    incumbent: &IncumbentTracker,
    open_bound: f64,
    stats: SolveStats,
) -> KnapsackSolution {
    let Some(x) = incumbent.solution.clone() else {
        return KnapsackSolution {
            status,
            bound: if status.is_limit() { open_bound } else { f64::NEG_INFINITY },
            stats,
            ..KnapsackSolution::infeasible()
        };
    };

    let selection = prob.selection(&x);
    let bound = match status {
        MipStatus::Optimal | MipStatus::Infeasible => incumbent.obj_val,
        MipStatus::NodeLimit | MipStatus::TimeLimit => open_bound.max(incumbent.obj_val),
    };

    KnapsackSolution {
        status,
        total_weight: prob.selection_weight(&selection),
        total_value: prob.selection_value(&selection),
        selection,
        x,
        obj_val: incumbent.obj_val,
        bound,
        stats,
    }
}
