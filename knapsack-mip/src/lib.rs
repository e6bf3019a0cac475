//! Branch-and-cut for the 0/1 knapsack with an odd-cardinality side constraint.
//!
//! Every item is taken or left out, the total weight may not exceed the
//! capacity, and the number of selected items must be odd. The empty
//! selection is always accepted.
//!
//! The solver explores a search tree over LP relaxations. At each node the
//! relaxation is tightened with odd-cardinality cuts until no violated cut
//! remains, then the node is either accepted as an incumbent candidate or
//! split on a fractional item.
//!
//! ```no_run
//! use knapsack_mip::{solve_knapsack, KnapsackProblem, MipSettings, SolutionReport};
//!
//! let prob = KnapsackProblem::from_vectors(&[2, 3, 4, 5], &[3, 4, 5, 6], 9)?;
//! let solution = solve_knapsack(&prob, &MipSettings::default())?;
//! print!("{}", SolutionReport::new(&prob, &solution));
//! # Ok::<(), knapsack_mip::MipError>(())
//! ```

#![warn(missing_docs)]

pub mod cuts;
pub mod error;
pub mod master;
pub mod model;
pub mod report;
pub mod search;
pub mod settings;

pub use cuts::{default_registry, CutGenerator, CutRegistry, OddCardinalityGenerator};
pub use error::{MipError, MipResult};
pub use master::{Cut, LpMasterBackend, MasterBackend};
pub use model::{Item, KnapsackProblem, KnapsackSolution, MipStatus, SolveStats};
pub use report::SolutionReport;
pub use search::{BranchAndCut, ParallelBranchAndCut};
pub use settings::{BranchingRule, MipSettings, NodeSelection};

/// Solve a knapsack instance with the default cut families and the LP backend.
///
/// Uses the sequential controller when `settings.threads` is 1 and the
/// parallel one otherwise.
pub fn solve_knapsack(prob: &KnapsackProblem, settings: &MipSettings) -> MipResult<KnapsackSolution> {
    let registry = default_registry(prob);
    solve_with(prob, &registry, settings, LpMasterBackend::new())
}

/// Solve with a custom cut registry and master backend.
pub fn solve_with<B>(
    prob: &KnapsackProblem,
    registry: &CutRegistry,
    settings: &MipSettings,
    backend: B,
) -> MipResult<KnapsackSolution>
where
    B: MasterBackend + Clone + Send,
{
    if prob.is_empty() {
        log::warn!("problem has no items, nothing to select");
        return Ok(KnapsackSolution::infeasible());
    }

    if settings.threads > 1 {
        ParallelBranchAndCut::new(prob, registry, settings).solve(backend)
    } else {
        BranchAndCut::new(settings.clone()).solve(prob, registry, backend)
    }
}
