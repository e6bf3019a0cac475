//! Branching variable selection.

use super::BoundChange;
use crate::model::KnapsackProblem;
use crate::settings::BranchingRule;

/// A branching decision.
#[derive(Debug, Clone)]
pub struct BranchDecision {
    /// Variable to branch on.
    pub var: usize,

    /// Current (fractional) value.
    pub value: f64,

    /// Bound change for "down" branch (x <= 0).
    pub down_branch: BoundChange,

    /// Bound change for "up" branch (x >= 1).
    pub up_branch: BoundChange,

    /// Score of this decision (for logging/debugging).
    pub score: f64,
}

/// Branching variable selector.
#[derive(Debug, Clone)]
pub struct BranchingSelector {
    /// Branching rule to use.
    rule: BranchingRule,
}

impl BranchingSelector {
    /// Create a new branching selector.
    pub fn new(rule: BranchingRule) -> Self {
        Self { rule }
    }

    /// Select a branching variable.
    ///
    /// Returns None if the solution is integer-feasible.
    pub fn select(&self, x: &[f64], prob: &KnapsackProblem, tol: f64) -> Option<BranchDecision> {
        let fractional = prob.get_fractional_vars(x, tol);

        let (var, value, frac) = match self.rule {
            BranchingRule::MostFractional => {
                // Fractionality closest to 0.5, lowest index on ties within `tol`
                fractional
                    .iter()
                    .copied()
                    .reduce(|best, cand| if cand.2 > best.2 + tol { cand } else { best })?
            }
            BranchingRule::FirstFractional => fractional.first().copied()?,
        };

        Some(self.make_decision(var, value, frac, prob))
    }

    /// Create a branch decision for a variable.
    fn make_decision(&self, var: usize, value: f64, score: f64, prob: &KnapsackProblem) -> BranchDecision {
        BranchDecision {
            var,
            value,
            down_branch: BoundChange::down_branch(var, prob.var_lb[var], value),
            up_branch: BoundChange::up_branch(var, prob.var_ub[var], value),
            score,
        }
    }
}
