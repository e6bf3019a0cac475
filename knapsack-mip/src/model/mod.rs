//! Problem and solution types for the knapsack solver.

mod problem;
mod solution;

pub use problem::{Item, KnapsackProblem};
pub use solution::{IncumbentTracker, KnapsackSolution, MipStatus, SolveStats};
