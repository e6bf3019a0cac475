//! Error types for the knapsack branch-and-cut solver.

use thiserror::Error;

/// Errors that can occur while solving.
///
/// An infeasible relaxation is not an error: it is reported through
/// [`MasterStatus::Infeasible`](crate::master::MasterStatus) and prunes the node.
#[derive(Error, Debug)]
pub enum MipError {
    /// Problem validation failed
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// Master LP solve failed
    #[error("Master solve failed: {0}")]
    MasterSolveError(String),

    /// A cut generator could not complete a separation round
    #[error("Cut generation failed: {0}")]
    CutGenerationError(String),

    /// Internal solver error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type for MIP operations.
pub type MipResult<T> = Result<T, MipError>;
