//! Human-readable solution report.

use std::fmt;

use crate::model::{KnapsackProblem, KnapsackSolution};

/// One line of the per-item listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemLine {
    /// Item index.
    pub index: usize,
    /// Value of the item's variable in the incumbent.
    pub x: f64,
    /// Item value (price).
    pub value: u64,
    /// Item weight.
    pub weight: u64,
}

/// Summary of a solve: what went into the knapsack and what it costs.
///
/// `Display` renders the console format:
///
/// ```text
/// 0 has value 1 price: 3 weight: 2
/// ...
///
/// items in knapsack: 3
/// knapsack weight: 9 <= 9
/// knapsack price: 12
/// ```
///
/// The per-item lines are only printed when requested with
/// [`SolutionReport::with_items`].
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionReport {
    /// Selected item indices, ascending.
    pub selected: Vec<usize>,
    /// Number of selected items.
    pub item_count: usize,
    /// Sum of selected weights.
    pub total_weight: u64,
    /// Sum of selected values.
    pub total_value: u64,
    /// Knapsack capacity.
    pub capacity: i64,
    /// Per-item listing (empty unless requested).
    pub items: Vec<ItemLine>,
    /// Whether a feasible selection exists.
    pub feasible: bool,
}

impl SolutionReport {
    /// Build a report for `solution`.
    pub fn new(prob: &KnapsackProblem, solution: &KnapsackSolution) -> Self {
        Self {
            selected: solution.selection.clone(),
            item_count: solution.num_selected(),
            total_weight: solution.total_weight,
            total_value: solution.total_value,
            capacity: prob.capacity,
            items: Vec::new(),
            feasible: solution.has_solution(),
        }
    }

    /// Include one line per item with its incumbent value.
    pub fn with_items(mut self, prob: &KnapsackProblem, solution: &KnapsackSolution) -> Self {
        self.items = prob
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| ItemLine {
                index,
                x: solution.x.get(index).copied().unwrap_or(0.0),
                value: item.value,
                weight: item.weight,
            })
            .collect();
        self
    }
}

impl fmt::Display for SolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.feasible {
            return writeln!(f, "no feasible solution");
        }

        if !self.items.is_empty() {
            for line in &self.items {
                writeln!(
                    f,
                    "{} has value {} price: {} weight: {}",
                    line.index, line.x, line.value, line.weight
                )?;
            }
            writeln!(f)?;
        }

        writeln!(f, "items in knapsack: {}", self.item_count)?;
        writeln!(f, "knapsack weight: {} <= {}", self.total_weight, self.capacity)?;
        writeln!(f, "knapsack price: {}", self.total_value)
    }
}
