//! Solution types for the knapsack solver.

/// Status of the solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipStatus {
    /// The search tree was exhausted, the incumbent is optimal.
    Optimal,

    /// No feasible selection exists.
    Infeasible,

    /// Node limit reached, best solution returned.
    NodeLimit,

    /// Time limit reached, best solution returned.
    TimeLimit,
}

impl MipStatus {
    /// Returns true if optimality was proven.
    pub fn is_optimal(&self) -> bool {
        matches!(self, MipStatus::Optimal)
    }

    /// Returns true if the search stopped on a budget.
    pub fn is_limit(&self) -> bool {
        matches!(self, MipStatus::NodeLimit | MipStatus::TimeLimit)
    }
}

/// Search statistics attached to a solution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveStats {
    /// Number of nodes explored.
    pub nodes_explored: u64,

    /// Number of nodes pruned by bound or infeasibility.
    pub nodes_pruned: u64,

    /// Number of cuts installed.
    pub cuts_added: u64,

    /// Number of sibling nodes created for the region cut off by a cut batch.
    pub complement_nodes: u64,

    /// Number of relaxation solves.
    pub lp_solves: u64,

    /// Number of times incumbent was updated.
    pub incumbent_updates: u64,

    /// Total solve time in milliseconds.
    pub solve_time_ms: u64,
}

/// Complete solution with diagnostics.
#[derive(Debug, Clone)]
pub struct KnapsackSolution {
    /// Solve status.
    pub status: MipStatus,

    /// Incumbent point, empty when none was found.
    pub x: Vec<f64>,

    /// Selected item indices, ascending.
    pub selection: Vec<usize>,

    /// Objective value of the incumbent (negative infinity when none).
    pub obj_val: f64,

    /// Best relaxation bound over the nodes left open.
    /// Equals `obj_val` when the tree was exhausted.
    pub bound: f64,

    /// Sum of selected weights.
    pub total_weight: u64,

    /// Sum of selected values.
    pub total_value: u64,

    /// Search statistics.
    pub stats: SolveStats,
}

impl KnapsackSolution {
    /// Create a solution indicating infeasibility.
    pub fn infeasible() -> Self {
        Self {
            status: MipStatus::Infeasible,
            x: Vec::new(),
            selection: Vec::new(),
            obj_val: f64::NEG_INFINITY,
            bound: f64::NEG_INFINITY,
            total_weight: 0,
            total_value: 0,
            stats: SolveStats::default(),
        }
    }

    /// Returns true if a feasible selection is available.
    pub fn has_solution(&self) -> bool {
        self.status != MipStatus::Infeasible && self.obj_val.is_finite()
    }

    /// Number of selected items.
    pub fn num_selected(&self) -> usize {
        self.selection.len()
    }
}

/// Tracks the best known feasible solution (incumbent).
///
/// The objective is maximized, an update is accepted only when strictly better.
#[derive(Debug, Clone)]
pub struct IncumbentTracker {
    /// Current best solution (if any).
    pub solution: Option<Vec<f64>>,

    /// Objective value of incumbent.
    /// Initialized to -inf for maximization.
    pub obj_val: f64,

    /// Number of times incumbent was updated.
    pub update_count: u64,
}

impl Default for IncumbentTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl IncumbentTracker {
    /// Create a new incumbent tracker.
    pub fn new() -> Self {
        Self {
            solution: None,
            obj_val: f64::NEG_INFINITY,
            update_count: 0,
        }
    }

    /// Check if we have an incumbent.
    pub fn has_incumbent(&self) -> bool {
        self.solution.is_some()
    }

    /// Try to update incumbent with a new solution.
    ///
    /// Returns true if the incumbent was improved.
    pub fn update(&mut self, x: &[f64], obj: f64) -> bool {
        let improves = match self.solution {
            None => true,
            Some(_) => obj > self.obj_val + 1e-9,
        };
        if improves {
            self.solution = Some(x.to_vec());
            self.obj_val = obj;
            self.update_count += 1;
        }
        improves
    }
}
