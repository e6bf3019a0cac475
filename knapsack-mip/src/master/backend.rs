//! Master problem backend trait and types.

use sprs::CsVec;

use crate::error::MipResult;
use crate::model::KnapsackProblem;

/// Status of master problem solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterStatus {
    /// Optimal solution found.
    Optimal,

    /// Master LP is infeasible (node can be pruned).
    Infeasible,
}

/// Result from solving the master problem.
#[derive(Debug, Clone)]
pub struct MasterResult {
    /// Solve status.
    pub status: MasterStatus,

    /// Primal solution x, one entry per variable.
    pub x: Vec<f64>,

    /// Primal objective value.
    pub obj_val: f64,
}

impl MasterResult {
    /// Create an optimal result.
    pub fn optimal(x: Vec<f64>, obj_val: f64) -> Self {
        Self {
            status: MasterStatus::Optimal,
            x,
            obj_val,
        }
    }

    /// Create an infeasible result.
    pub fn infeasible() -> Self {
        Self {
            status: MasterStatus::Infeasible,
            x: Vec::new(),
            obj_val: f64::NEG_INFINITY,
        }
    }

    /// Check if the relaxation was solved to optimality.
    pub fn is_optimal(&self) -> bool {
        self.status == MasterStatus::Optimal
    }
}

/// Source of a cut (for tracking and debugging).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutSource {
    /// Odd-cardinality separation.
    OddCardinality {
        /// Size of the even selection that triggered the cut.
        selected: usize,
    },

    /// Region cut off by a cut batch, explored as a sibling node.
    Complement {
        /// Size of the even selection that triggered the batch.
        selected: usize,
    },

    /// User-provided cut.
    User,
}

/// A two-sided linear row: `lb <= a^T x <= ub`.
///
/// Coefficients are stored sparsely, the vector dimension is the number of
/// variables of the problem the cut was built for.
#[derive(Debug, Clone, PartialEq)]
pub struct Cut {
    /// Sparse coefficient vector.
    pub coefs: CsVec<f64>,

    /// Lower bound (may be `f64::NEG_INFINITY`).
    pub lb: f64,

    /// Upper bound (may be `f64::INFINITY`).
    pub ub: f64,

    /// Optional name for debugging.
    pub name: Option<String>,

    /// Source of this cut.
    pub source: CutSource,
}

impl Cut {
    /// Create a new cut from a sparse coefficient vector.
    ///
    /// # Panics
    ///
    /// Panics if `lb > ub`. A cut with an empty range would silently make
    /// every node infeasible.
    pub fn new(coefs: CsVec<f64>, lb: f64, ub: f64, source: CutSource) -> Self {
        assert!(
            lb <= ub,
            "malformed cut from {:?}: lower bound {} exceeds upper bound {}",
            source,
            lb,
            ub
        );
        Self {
            coefs,
            lb,
            ub,
            name: None,
            source,
        }
    }

    /// Create a cut from a dense coefficient slice, dropping zeros.
    pub fn from_dense(coefs: &[f64], lb: f64, ub: f64, source: CutSource) -> Self {
        let (indices, data): (Vec<usize>, Vec<f64>) = coefs
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c != 0.0)
            .map(|(i, &c)| (i, c))
            .unzip();
        Self::new(CsVec::new(coefs.len(), indices, data), lb, ub, source)
    }

    /// Create a cut with a name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Number of variables the cut is defined over.
    pub fn dim(&self) -> usize {
        self.coefs.dim()
    }

    /// Row activity `a^T x`.
    pub fn activity(&self, x: &[f64]) -> f64 {
        self.coefs.iter().map(|(j, &a)| a * x[j]).sum()
    }

    /// Compute violation: distance of the activity outside `[lb, ub]`
    /// (positive means violated).
    pub fn violation(&self, x: &[f64]) -> f64 {
        let act = self.activity(x);
        (self.lb - act).max(act - self.ub)
    }

    /// Check if cut is violated by more than tolerance.
    pub fn is_violated(&self, x: &[f64], tol: f64) -> bool {
        self.violation(x) > tol
    }

    /// Check whether two cuts describe the same row.
    pub fn same_row(&self, other: &Cut) -> bool {
        self.lb == other.lb
            && self.ub == other.ub
            && self.coefs.dim() == other.coefs.dim()
            && self.coefs.indices() == other.coefs.indices()
            && self.coefs.data() == other.coefs.data()
    }

    /// Check whether every point satisfying this row also satisfies `other`.
    ///
    /// Only rows over the same coefficients are compared, so `false` does not
    /// mean the implication fails.
    pub fn implies(&self, other: &Cut) -> bool {
        self.lb >= other.lb
            && self.ub <= other.ub
            && self.coefs.dim() == other.coefs.dim()
            && self.coefs.indices() == other.coefs.indices()
            && self.coefs.data() == other.coefs.data()
    }
}

/// Trait for master problem backends (LP solvers).
///
/// The master backend maintains the current LP relaxation of the knapsack,
/// including variable bounds and installed cuts. It supports:
/// - Solving the relaxation
/// - Appending cuts without touching variable bounds
/// - Updating variable bounds (for branching)
pub trait MasterBackend {
    /// Initialize the backend with the base problem.
    ///
    /// Sets the objective, the capacity row and the root variable bounds,
    /// and drops every installed cut.
    fn initialize(&mut self, prob: &KnapsackProblem) -> MipResult<()>;

    /// Append a cut row. Returns its position among the installed cuts.
    ///
    /// # Panics
    ///
    /// Implementations panic when the cut dimension differs from the number
    /// of variables.
    fn add_cut(&mut self, cut: &Cut) -> usize;

    /// Append multiple cuts.
    fn add_cuts(&mut self, cuts: &[Cut]) -> Vec<usize> {
        cuts.iter().map(|c| self.add_cut(c)).collect()
    }

    /// Drop every installed cut, keeping variable bounds.
    fn clear_cuts(&mut self);

    /// Update variable bounds (for branching).
    fn set_var_bounds(&mut self, var: usize, lb: f64, ub: f64);

    /// Restore the root bounds given at initialization.
    fn reset_var_bounds(&mut self);

    /// Solve the current master LP.
    fn solve(&mut self) -> MipResult<MasterResult>;

    /// Get the number of installed cuts.
    fn num_cuts(&self) -> usize;

    /// Get the number of variables.
    fn num_vars(&self) -> usize;
}
