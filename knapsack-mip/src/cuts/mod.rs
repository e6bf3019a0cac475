//! Cut generation for the knapsack relaxation.
//!
//! This module provides:
//! - The cut generator interface and the registry of cut families
//! - Odd-cardinality cuts for the parity side constraint
//! - The per-node pool of active cuts

mod generator;
pub mod odd;
mod pool;

pub use generator::{CutBatch, CutGenerator, CutRegistry, SeparationContext, SeparationScratch};
pub use odd::{OddCardinalityGenerator, OddCardinalitySettings};
pub use pool::CutPool;

use crate::model::KnapsackProblem;

/// Registry holding the odd-cardinality family with default settings.
pub fn default_registry(prob: &KnapsackProblem) -> CutRegistry {
    CutRegistry::new().with(OddCardinalityGenerator::new(
        prob.num_vars(),
        OddCardinalitySettings::default(),
    ))
}
