//! Knapsack problem representation.

use crate::error::{MipError, MipResult};

/// A knapsack item. Both fields are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    /// Weight charged against the capacity.
    pub weight: u64,

    /// Value added to the objective.
    pub value: u64,
}

impl Item {
    /// Create a new item.
    pub fn new(weight: u64, value: u64) -> Self {
        Self { weight, value }
    }
}

/// 0/1 knapsack with an odd-cardinality side constraint.
///
/// One binary variable per item, `x[i] = 1` meaning item `i` is selected.
/// The objective `sum value[i] * x[i]` is maximized subject to
/// `sum weight[i] * x[i] <= capacity` and an odd number of selected items.
#[derive(Debug, Clone)]
pub struct KnapsackProblem {
    /// Items in variable order.
    pub items: Vec<Item>,

    /// Capacity bound. Negative capacities are accepted and make the
    /// problem infeasible.
    pub capacity: i64,

    /// Root lower bounds for all variables.
    pub var_lb: Vec<f64>,

    /// Root upper bounds for all variables.
    pub var_ub: Vec<f64>,
}

impl KnapsackProblem {
    /// Create a problem from items and a capacity.
    ///
    /// Items heavier than the capacity can never be selected, their upper
    /// bound is fixed to 0 up front.
    pub fn new(items: Vec<Item>, capacity: i64) -> MipResult<Self> {
        for (i, item) in items.iter().enumerate() {
            if item.weight == 0 || item.value == 0 {
                return Err(MipError::InvalidProblem(format!(
                    "Item {} has weight {} and value {}, both must be positive",
                    i, item.weight, item.value
                )));
            }
        }

        let n = items.len();
        let var_lb = vec![0.0; n];
        let var_ub = items
            .iter()
            .map(|item| if item.weight as i128 > capacity as i128 { 0.0 } else { 1.0 })
            .collect();

        Ok(Self {
            items,
            capacity,
            var_lb,
            var_ub,
        })
    }

    /// Create a problem from parallel weight and value vectors.
    pub fn from_vectors(weights: &[u64], values: &[u64], capacity: i64) -> MipResult<Self> {
        if weights.len() != values.len() {
            return Err(MipError::InvalidProblem(format!(
                "{} weights but {} values",
                weights.len(),
                values.len()
            )));
        }
        let items = weights
            .iter()
            .zip(values)
            .map(|(&w, &v)| Item::new(w, v))
            .collect();
        Self::new(items, capacity)
    }

    /// Number of variables (one per item).
    pub fn num_vars(&self) -> usize {
        self.items.len()
    }

    /// Check if the problem has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of variables fixed to 0 because the item never fits.
    pub fn num_fixed(&self) -> usize {
        self.var_ub.iter().filter(|&&ub| ub == 0.0).count()
    }

    /// Objective coefficients as floats.
    pub fn values(&self) -> Vec<f64> {
        self.items.iter().map(|item| item.value as f64).collect()
    }

    /// Capacity row coefficients as floats.
    pub fn weights(&self) -> Vec<f64> {
        self.items.iter().map(|item| item.weight as f64).collect()
    }

    /// Objective value of a point.
    pub fn objective(&self, x: &[f64]) -> f64 {
        self.items
            .iter()
            .zip(x)
            .map(|(item, &xi)| item.value as f64 * xi)
            .sum()
    }

    /// Check if a solution is integer-feasible within tolerance.
    pub fn is_integer_feasible(&self, x: &[f64], tol: f64) -> bool {
        x.iter().all(|&val| self.fractionality(val) <= tol)
    }

    /// Get the fractionality of a variable (distance to nearest integer).
    pub fn fractionality(&self, val: f64) -> f64 {
        let frac = val.fract().abs();
        frac.min(1.0 - frac)
    }

    /// Round all variables to the nearest integer.
    pub fn round_integers(&self, x: &mut [f64]) {
        for val in x.iter_mut() {
            *val = val.round();
        }
    }

    /// Get fractional variables and their values.
    ///
    /// Returns (var_index, current_value, fractionality) for each fractional variable.
    pub fn get_fractional_vars(&self, x: &[f64], tol: f64) -> Vec<(usize, f64, f64)> {
        x.iter()
            .enumerate()
            .filter_map(|(i, &val)| {
                let frac = self.fractionality(val);
                (frac > tol).then_some((i, val, frac))
            })
            .collect()
    }

    /// Indices of items selected by an integral point.
    pub fn selection(&self, x: &[f64]) -> Vec<usize> {
        x.iter()
            .enumerate()
            .filter(|&(_, &val)| val > 0.5)
            .map(|(i, _)| i)
            .collect()
    }

    /// Total weight of a selection.
    pub fn selection_weight(&self, selection: &[usize]) -> u64 {
        selection.iter().map(|&i| self.items[i].weight).sum()
    }

    /// Total value of a selection.
    pub fn selection_value(&self, selection: &[usize]) -> u64 {
        selection.iter().map(|&i| self.items[i].value).sum()
    }

    /// Check that a selection fits and has odd cardinality (or is empty).
    pub fn is_feasible_selection(&self, selection: &[usize]) -> bool {
        let fits = self.selection_weight(selection) as i128 <= self.capacity as i128;
        let parity_ok = selection.is_empty() || selection.len() % 2 == 1;
        fits && parity_ok
    }
}
