//! Master problem (LP relaxation) management.

mod backend;
mod lp_backend;

pub use backend::{Cut, CutSource, MasterBackend, MasterResult, MasterStatus};
pub use lp_backend::LpMasterBackend;
