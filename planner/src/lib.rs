pub mod builder;
pub mod constraints;
pub mod distances;
pub mod error;
pub mod extract;
pub mod extsolvers;
pub mod feasibility;
pub mod indices;
pub mod lpformat;
pub mod model;
pub mod objective;
pub mod solve;
pub mod variables;

mod testutil;

#[cfg(test)]
mod scenario_tests;

pub use builder::{build_model, RoutingModel};
pub use error::{ModelError, SolverError};
pub use solve::{solve, SolveOutcome, SolveReport};
