//! Branch-and-cut search tree management.

mod branching;
mod node;
mod parallel;
mod processor;
mod queue;
mod tree;

pub use branching::{BranchDecision, BranchingSelector};
pub use node::{BoundChange, SearchNode};
pub use parallel::ParallelBranchAndCut;
pub use processor::{NodeIds, NodeOutcome, NodeProcessor, NodeReport};
pub use queue::NodeQueue;
pub use tree::BranchAndCut;
