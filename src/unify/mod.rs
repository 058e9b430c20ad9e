pub mod auto_step;
pub mod context;
pub mod dj_vars;
pub mod driver;
pub mod dummy;
pub mod filter;
pub mod pairwise;
pub mod proof_builder;
pub mod result;
pub mod step_unifier;
pub mod step_update;
pub mod unifier;
pub mod work_var_driver;

pub use unifier::{ProofUnifier, UnifyOutcome};
