//! Master backend using the pure-Rust simplex behind `good_lp`.
//!
//! The relaxation is rebuilt from the stored bounds and rows on every solve:
//! ```text
//! max  v^T x
//! s.t. w^T x <= capacity
//!      lb_i <= a_i^T x <= ub_i    (for each installed cut i)
//!      var_lb <= x <= var_ub
//! ```

use good_lp::solvers::microlp::microlp;
use good_lp::{variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable};

use super::{Cut, MasterBackend, MasterResult};
use crate::error::{MipError, MipResult};
use crate::model::KnapsackProblem;

/// Master backend solving the continuous relaxation with microlp.
#[derive(Debug, Clone, Default)]
pub struct LpMasterBackend {
    /// Objective coefficients (item values).
    values: Vec<f64>,

    /// Capacity row coefficients (item weights).
    weights: Vec<f64>,

    /// Capacity right-hand side.
    capacity: f64,

    /// Installed cuts.
    cuts: Vec<Cut>,

    /// Bounds given at initialization.
    root_lb: Vec<f64>,
    root_ub: Vec<f64>,

    /// Current variable lower bounds.
    var_lb: Vec<f64>,

    /// Current variable upper bounds.
    var_ub: Vec<f64>,

    /// Whether `initialize` has been called.
    initialized: bool,
}

impl LpMasterBackend {
    /// Create an uninitialized backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend already initialized with `prob`.
    pub fn for_problem(prob: &KnapsackProblem) -> MipResult<Self> {
        let mut backend = Self::new();
        backend.initialize(prob)?;
        Ok(backend)
    }

    fn row_expression(cut: &Cut, vars: &[Variable]) -> Expression {
        cut.coefs.iter().map(|(j, &a)| a * vars[j]).sum()
    }
}

impl MasterBackend for LpMasterBackend {
    fn initialize(&mut self, prob: &KnapsackProblem) -> MipResult<()> {
        if prob.var_lb.len() != prob.num_vars() || prob.var_ub.len() != prob.num_vars() {
            return Err(MipError::InvalidProblem(format!(
                "{} variables but {} lower and {} upper bounds",
                prob.num_vars(),
                prob.var_lb.len(),
                prob.var_ub.len()
            )));
        }

        self.values = prob.values();
        self.weights = prob.weights();
        self.capacity = prob.capacity as f64;
        self.cuts.clear();
        self.root_lb = prob.var_lb.clone();
        self.root_ub = prob.var_ub.clone();
        self.var_lb = prob.var_lb.clone();
        self.var_ub = prob.var_ub.clone();
        self.initialized = true;
        Ok(())
    }

    fn add_cut(&mut self, cut: &Cut) -> usize {
        assert_eq!(
            cut.dim(),
            self.values.len(),
            "cut {:?} has {} coefficients for {} variables",
            cut.source,
            cut.dim(),
            self.values.len()
        );
        self.cuts.push(cut.clone());
        self.cuts.len() - 1
    }

    fn clear_cuts(&mut self) {
        self.cuts.clear();
    }

    fn set_var_bounds(&mut self, var: usize, lb: f64, ub: f64) {
        self.var_lb[var] = lb;
        self.var_ub[var] = ub;
    }

    fn reset_var_bounds(&mut self) {
        self.var_lb.clone_from(&self.root_lb);
        self.var_ub.clone_from(&self.root_ub);
    }

    fn solve(&mut self) -> MipResult<MasterResult> {
        if !self.initialized {
            return Err(MipError::InternalError(
                "Master backend not initialized".to_string(),
            ));
        }

        // Empty variable domain, no need to call the LP solver
        if self
            .var_lb
            .iter()
            .zip(&self.var_ub)
            .any(|(&lb, &ub)| lb > ub + 1e-9)
        {
            return Ok(MasterResult::infeasible());
        }

        let mut problem_vars = ProblemVariables::new();
        let vars: Vec<Variable> = self
            .var_lb
            .iter()
            .zip(&self.var_ub)
            .map(|(&lb, &ub)| problem_vars.add(variable().min(lb).max(ub)))
            .collect();

        let objective: Expression = vars.iter().zip(&self.values).map(|(&x, &v)| v * x).sum();
        let load: Expression = vars.iter().zip(&self.weights).map(|(&x, &w)| w * x).sum();

        let mut model = problem_vars
            .maximise(objective)
            .using(microlp)
            .with(load.leq(self.capacity));

        for cut in &self.cuts {
            let row = Self::row_expression(cut, &vars);
            if cut.lb.is_finite() {
                model = model.with(row.clone().geq(cut.lb));
            }
            if cut.ub.is_finite() {
                model = model.with(row.leq(cut.ub));
            }
        }

        match model.solve() {
            Ok(solution) => {
                let x: Vec<f64> = vars
                    .iter()
                    .zip(self.var_lb.iter().zip(&self.var_ub))
                    .map(|(&v, (&lb, &ub))| solution.value(v).clamp(lb, ub))
                    .collect();
                let obj_val = x.iter().zip(&self.values).map(|(xi, vi)| xi * vi).sum();
                Ok(MasterResult::optimal(x, obj_val))
            }
            Err(ResolutionError::Infeasible) => Ok(MasterResult::infeasible()),
            Err(ResolutionError::Unbounded) => Err(MipError::MasterSolveError(
                "relaxation of a bounded knapsack reported unbounded".to_string(),
            )),
            Err(other) => Err(MipError::MasterSolveError(other.to_string())),
        }
    }

    fn num_cuts(&self) -> usize {
        self.cuts.len()
    }

    fn num_vars(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::master::{CutSource, MasterStatus};

    fn scenario_a() -> KnapsackProblem {
        KnapsackProblem::from_vectors(&[2, 3, 4, 5], &[3, 4, 5, 6], 9).unwrap()
    }

    #[test]
    fn test_root_relaxation() {
        let mut backend = LpMasterBackend::for_problem(&scenario_a()).unwrap();
        let res = backend.solve().unwrap();

        // Greedy by value density fills items 0, 1, 2 exactly
        assert_eq!(res.status, MasterStatus::Optimal);
        assert!((res.obj_val - 12.0).abs() < 1e-6);
        assert!(res.x[3].abs() < 1e-6);
    }

    #[test]
    fn test_cut_tightens_relaxation() {
        let mut backend = LpMasterBackend::for_problem(&scenario_a()).unwrap();
        let before = backend.solve().unwrap().obj_val;

        // At most one item
        backend.add_cut(&Cut::from_dense(&[1.0; 4], 1.0, 1.0, CutSource::User));
        let after = backend.solve().unwrap();

        assert_eq!(backend.num_cuts(), 1);
        assert!(after.obj_val <= before + 1e-9);
        assert!((after.obj_val - 6.0).abs() < 1e-6);
        assert!((after.x.iter().sum::<f64>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bounds_survive_cut_installation() {
        let mut backend = LpMasterBackend::for_problem(&scenario_a()).unwrap();
        backend.set_var_bounds(3, 1.0, 1.0);
        backend.add_cut(&Cut::from_dense(&[1.0; 4], 1.0, 2.0, CutSource::User));

        let res = backend.solve().unwrap();
        assert!((res.x[3] - 1.0).abs() < 1e-6);

        backend.reset_var_bounds();
        backend.clear_cuts();
        let res = backend.solve().unwrap();
        assert!((res.obj_val - 12.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_relaxation() {
        let mut backend = LpMasterBackend::for_problem(&scenario_a()).unwrap();

        // Requires five items out of four
        backend.add_cut(&Cut::from_dense(&[1.0; 4], 5.0, f64::INFINITY, CutSource::User));
        assert_eq!(backend.solve().unwrap().status, MasterStatus::Infeasible);

        // Empty domain
        backend.clear_cuts();
        backend.set_var_bounds(0, 1.0, 0.0);
        assert_eq!(backend.solve().unwrap().status, MasterStatus::Infeasible);
    }

    #[test]
    fn test_negative_capacity_is_infeasible() {
        let prob = KnapsackProblem::from_vectors(&[1, 2], &[1, 1], -1).unwrap();
        let mut backend = LpMasterBackend::for_problem(&prob).unwrap();
        assert_eq!(backend.solve().unwrap().status, MasterStatus::Infeasible);
    }

    #[test]
    #[should_panic(expected = "coefficients for")]
    fn test_wrong_dimension_panics() {
        let mut backend = LpMasterBackend::for_problem(&scenario_a()).unwrap();
        backend.add_cut(&Cut::from_dense(&[1.0; 3], 1.0, 1.0, CutSource::User));
    }

    #[test]
    fn test_uninitialized_backend_errors() {
        let mut backend = LpMasterBackend::new();
        assert!(backend.solve().is_err());
    }
}
