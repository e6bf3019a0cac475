//! Configuration settings for the branch-and-cut solver.

/// Branching variable selection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchingRule {
    /// Select variable with fractional part closest to 0.5.
    #[default]
    MostFractional,

    /// Select the lowest-index fractional variable.
    FirstFractional,
}

/// Node selection strategy for the search tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeSelection {
    /// Always select the open node with the best (highest) relaxation bound.
    #[default]
    BestBound,

    /// Depth-first search (finds incumbents quickly).
    DepthFirst,
}

/// Solver settings.
#[derive(Debug, Clone)]
pub struct MipSettings {
    // === Termination criteria ===
    /// Maximum number of nodes to explore.
    pub max_nodes: u64,

    /// Time limit in milliseconds (None = unlimited).
    pub time_limit_ms: Option<u64>,

    /// Integer feasibility tolerance.
    /// A variable is considered integral if |x - round(x)| <= int_feas_tol.
    pub int_feas_tol: f64,

    /// Tolerance used when comparing relaxation bounds against the incumbent
    /// and against each other.
    pub bound_tol: f64,

    // === Search strategy ===
    /// Branching variable selection rule.
    pub branching_rule: BranchingRule,

    /// Node selection strategy.
    pub node_selection: NodeSelection,

    // === Cut settings ===
    /// Maximum separation passes at the root node.
    pub max_cut_passes: usize,

    /// Separation passes allowed at nodes below the root.
    ///
    /// With the default of 1 only pass 0 separates in the tree, later passes
    /// are suppressed unless the relaxation point is integral.
    pub tree_cut_passes: usize,

    /// Consecutive rounds without bound progress before separation of
    /// fractional points stops at a node.
    pub max_idle_rounds: usize,

    /// Minimum violation for a cut to be installed.
    pub cut_violation_tol: f64,

    // === Parallelism ===
    /// Number of worker threads. 1 runs the sequential controller.
    pub threads: usize,

    // === Output ===
    /// Print progress information.
    pub verbose: bool,

    /// Log frequency (print every N nodes).
    pub log_freq: u64,
}

impl Default for MipSettings {
    fn default() -> Self {
        Self {
            // Termination
            max_nodes: 1_000_000,
            time_limit_ms: None,
            int_feas_tol: 1e-6,
            bound_tol: 1e-6,

            // Search
            branching_rule: BranchingRule::default(),
            node_selection: NodeSelection::default(),

            // Cuts
            max_cut_passes: 100,
            tree_cut_passes: 1,
            max_idle_rounds: 2,
            cut_violation_tol: 1e-6,

            // Parallelism
            threads: 1,

            // Output
            verbose: false,
            log_freq: 100,
        }
    }
}

impl MipSettings {
    /// Create settings with verbose output enabled.
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            log_freq: 1,
            ..Self::default()
        }
    }

    /// Create settings using one worker per hardware thread.
    pub fn parallel() -> Self {
        Self::default().with_threads(num_cpus::get())
    }

    /// Set time limit in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit_ms = Some((seconds * 1000.0) as u64);
        self
    }

    /// Set maximum nodes.
    pub fn with_max_nodes(mut self, nodes: u64) -> Self {
        self.max_nodes = nodes;
        self
    }

    /// Set the number of worker threads (at least one).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Set node selection strategy.
    pub fn with_node_selection(mut self, selection: NodeSelection) -> Self {
        self.node_selection = selection;
        self
    }

    /// Set branching rule.
    pub fn with_branching_rule(mut self, rule: BranchingRule) -> Self {
        self.branching_rule = rule;
        self
    }

    /// Number of separation passes allowed at a node of the given depth.
    pub fn cut_passes_at_depth(&self, depth: usize) -> usize {
        if depth == 0 {
            self.max_cut_passes
        } else {
            self.tree_cut_passes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_reference_policy() {
        let s = MipSettings::default();
        assert_eq!(s.threads, 1);
        assert_eq!(s.tree_cut_passes, 1);
        assert_eq!(s.max_idle_rounds, 2);
        assert_eq!(s.cut_passes_at_depth(0), 100);
        assert_eq!(s.cut_passes_at_depth(3), 1);
    }

    #[test]
    fn test_builders() {
        let s = MipSettings::default()
            .with_time_limit(1.5)
            .with_max_nodes(10)
            .with_threads(0);
        assert_eq!(s.time_limit_ms, Some(1500));
        assert_eq!(s.max_nodes, 10);
        assert_eq!(s.threads, 1);
    }
}
