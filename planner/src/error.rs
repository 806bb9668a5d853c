use dronerouting_structs::{instance::InstanceError, NodeId};
use thiserror::Error;

/// Failures while assembling a model or reading a solution back.
///
/// These are programming or input errors. A model that the solver proves
/// infeasible is not an error, see [`crate::solve::SolveOutcome`].
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid instance: {0}")]
    Instance(#[from] InstanceError),
    #[error("no travel time from node {from} to node {to}")]
    MissingTravelTime { from: NodeId, to: NodeId },
    #[error("node {0} does not exist in the instance")]
    UnknownNode(NodeId),
    #[error("no variable for key {0}")]
    MissingVariable(String),
    #[error("solution does not describe consistent routes: {0}")]
    InconsistentSolution(String),
}

/// Failures of the external solver itself (license, memory, backend calls).
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("solver backend error: {0}")]
    Backend(String),
    #[error("could not access model file {path}: {reason}")]
    File { path: String, reason: String },
}
