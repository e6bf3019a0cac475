//! Odd-cardinality cut generation.
//!
//! Let `S = { i : x_i > threshold }` and `k = |S|`. When `k` is even and
//! positive the point selects a forbidden number of items, and the pair
//! ```text
//!    1            <=  sum x_i  <=  2*floor(k/2) - 1
//!   -(2*ceil(k/2) + 1) <= -sum x_i  <= -1
//! ```
//! is emitted over all variables. Every odd-cardinality subset of `S`
//! satisfies both rows, and the inspected point violates the first one.
//!
//! The first row also removes every selection larger than `k`. Those
//! selections are not lost: [`OddCardinalityGenerator::complement`] returns
//! `sum x_i >= k + 1`, which the search explores as a separate node.
//!
//! An empty selection (`k = 0`) is accepted as is. It is even, but the
//! empty knapsack is the fallback solution and is never cut.

use crate::master::{Cut, CutSource};

use super::{CutGenerator, SeparationContext, SeparationScratch};

/// Odd-cardinality generator settings.
#[derive(Debug, Clone)]
pub struct OddCardinalitySettings {
    /// A variable counts as selected when its value exceeds this threshold.
    pub threshold: f64,

    /// Minimum violation of the first row for the pair to be emitted.
    pub min_violation: f64,
}

impl Default for OddCardinalitySettings {
    fn default() -> Self {
        Self {
            threshold: 0.99,
            min_violation: 1e-6,
        }
    }
}

/// Separates relaxation points that select an even, non-zero number of items.
#[derive(Debug, Clone)]
pub struct OddCardinalityGenerator {
    /// Number of variables of the problem.
    num_vars: usize,

    /// Settings.
    settings: OddCardinalitySettings,
}

impl OddCardinalityGenerator {
    /// Create a new generator for a problem with `num_vars` variables.
    pub fn new(num_vars: usize, settings: OddCardinalitySettings) -> Self {
        Self { num_vars, settings }
    }

    /// Count the selected variables of `x` into `scratch.selected`.
    pub fn selected_count(&self, x: &[f64], scratch: &mut SeparationScratch) -> usize {
        scratch.selected.clear();
        scratch.selected.extend(
            x.iter()
                .enumerate()
                .filter(|&(_, &v)| v > self.settings.threshold)
                .map(|(i, _)| i),
        );
        scratch.selected.len()
    }

    /// Upper bound of the first row for an even count `k`.
    pub fn primary_upper(k: usize) -> f64 {
        (2 * (k / 2)) as f64 - 1.0
    }

    /// Lower bound of the second row for an even count `k`.
    ///
    /// One unit looser than the mirror of [`primary_upper`](Self::primary_upper).
    pub fn complementary_lower(k: usize) -> f64 {
        -((2 * k.div_ceil(2) + 1) as f64)
    }
}

impl CutGenerator for OddCardinalityGenerator {
    fn name(&self) -> &str {
        "odd-cardinality"
    }

    fn generate(
        &self,
        x: &[f64],
        _ctx: &SeparationContext,
        scratch: &mut SeparationScratch,
    ) -> Vec<Cut> {
        assert_eq!(
            x.len(),
            self.num_vars,
            "odd-cardinality separation got a point with {} entries for {} variables",
            x.len(),
            self.num_vars
        );

        let k = self.selected_count(x, scratch);
        if k == 0 || k % 2 == 1 {
            return Vec::new();
        }

        let source = CutSource::OddCardinality { selected: k };

        scratch.coefs.clear();
        scratch.coefs.resize(self.num_vars, 1.0);
        let primary = Cut::from_dense(&scratch.coefs, 1.0, Self::primary_upper(k), source)
            .with_name(format!("odd_card_ub_{}", k));

        if !primary.is_violated(x, self.settings.min_violation) {
            return Vec::new();
        }

        scratch.coefs.iter_mut().for_each(|c| *c = -1.0);
        let complementary =
            Cut::from_dense(&scratch.coefs, Self::complementary_lower(k), -1.0, source)
                .with_name(format!("odd_card_lb_{}", k));

        vec![primary, complementary]
    }

    fn complement(&self, cuts: &[Cut]) -> Option<Cut> {
        let k = cuts.iter().find_map(|cut| match cut.source {
            CutSource::OddCardinality { selected } => Some(selected),
            _ => None,
        })?;
        if k + 1 > self.num_vars {
            return None;
        }
        let row = Cut::from_dense(
            &vec![1.0; self.num_vars],
            (k + 1) as f64,
            self.num_vars as f64,
            CutSource::Complement { selected: k },
        );
        Some(row.with_name(format!("odd_card_above_{}", k)))
    }
}
