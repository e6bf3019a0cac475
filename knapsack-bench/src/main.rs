//! Command-line driver: generate a random instance, solve it, print the knapsack.

mod generator;

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use knapsack_mip::{solve_knapsack, MipSettings, SolutionReport};
use rand::rngs::StdRng;
use rand::SeedableRng;

use generator::InstanceParams;

/// Solve a random 0/1 knapsack whose selection must hold an odd number of items.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of items
    #[arg(short = 'n', long, default_value = "200", value_parser = clap::value_parser!(u64).range(200..=1000))]
    items: u64,
    /// Maximum weight of an item
    #[arg(long, default_value = "100")]
    max_weight: u64,
    /// Maximum price of an item
    #[arg(long, default_value = "100")]
    max_value: u64,
    /// Knapsack capacity
    #[arg(short, long, default_value = "1000", allow_negative_numbers = true)]
    capacity: i64,
    /// Random seed (drawn from the OS when absent)
    #[arg(short, long)]
    seed: Option<u64>,
    /// Worker threads (0 uses every hardware thread)
    #[arg(short, long, default_value = "1")]
    threads: usize,
    /// Stop after exploring this many nodes
    #[arg(long)]
    max_nodes: Option<u64>,
    /// Stop after this many seconds
    #[arg(long)]
    time_limit: Option<f64>,
    /// Log search progress
    #[arg(short, long)]
    verbose: bool,
    /// Print every item with its value in the solution
    #[arg(long)]
    print_items: bool,
}

impl Args {
    fn settings(&self) -> MipSettings {
        let mut settings = if self.verbose {
            MipSettings::verbose()
        } else {
            MipSettings::default()
        };
        let threads = if self.threads == 0 { num_cpus::get() } else { self.threads };
        settings = settings.with_threads(threads);
        if let Some(nodes) = self.max_nodes {
            settings = settings.with_max_nodes(nodes);
        }
        if let Some(secs) = self.time_limit {
            settings = settings.with_time_limit(secs);
        }
        settings
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();

    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("instance seed {}", seed);

    let params = InstanceParams {
        num_items: args.items as usize,
        max_weight: args.max_weight,
        max_value: args.max_value,
        capacity: args.capacity,
    };
    let prob = generator::generate(&params, &mut StdRng::seed_from_u64(seed))?;

    let start = Instant::now();
    let solution = solve_knapsack(&prob, &args.settings()).context("branch-and-cut failed")?;
    let elapsed = start.elapsed();

    let mut report = SolutionReport::new(&prob, &solution);
    if args.print_items {
        report = report.with_items(&prob, &solution);
    }
    print!("{}", report);

    println!();
    println!("status: {:?}", solution.status);
    println!("bound: {}", solution.bound);
    println!(
        "nodes: {} explored, {} pruned | cuts: {} | sibling nodes: {} | LP solves: {}",
        solution.stats.nodes_explored,
        solution.stats.nodes_pruned,
        solution.stats.cuts_added,
        solution.stats.complement_nodes,
        solution.stats.lp_solves
    );
    println!("time: {:.3}s", elapsed.as_secs_f64());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_threads_uses_every_core() {
        let args = Args::parse_from(["knapsack-bench", "--threads", "0", "--max-nodes", "50"]);
        let settings = args.settings();

        assert_eq!(settings.threads, num_cpus::get());
        assert_eq!(settings.max_nodes, 50);
    }

    #[test]
    fn test_negative_capacity_accepted() {
        let args = Args::parse_from(["knapsack-bench", "-c", "-5"]);
        assert_eq!(args.capacity, -5);
        assert_eq!(args.settings().threads, 1);
    }
}
