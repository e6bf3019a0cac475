//! Random instance generation.

use anyhow::{ensure, Context, Result};
use knapsack_mip::KnapsackProblem;
use rand::Rng;

/// Parameters of a random instance.
#[derive(Debug, Clone, Copy)]
pub struct InstanceParams {
    pub num_items: usize,
    pub max_weight: u64,
    pub max_value: u64,
    pub capacity: i64,
}

/// Draw weights uniformly from `[1, max_weight]` and values uniformly from
/// `[1, max_value]`.
pub fn generate<R: Rng>(params: &InstanceParams, rng: &mut R) -> Result<KnapsackProblem> {
    ensure!(params.max_weight >= 1, "maximum weight must be at least 1");
    ensure!(params.max_value >= 1, "maximum price must be at least 1");

    let weights: Vec<u64> = (0..params.num_items)
        .map(|_| rng.gen_range(1..=params.max_weight))
        .collect();
    let values: Vec<u64> = (0..params.num_items)
        .map(|_| rng.gen_range(1..=params.max_value))
        .collect();

    KnapsackProblem::from_vectors(&weights, &values, params.capacity)
        .context("generated instance was rejected")
}
