use std::path::Path;

use crate::error::SolverError;

pub mod highs;
pub mod gurobi;

/// What the backend reports after `optimize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LPStatus {
    Optimal,
    /// Stopped by the time limit.
    TimeLimit,
    Infeasible,
    /// Any other termination, e.g. numerical trouble or another limit.
    Other,
}

#[derive(Debug, Clone)]
pub struct LPResult {
    pub status: LPStatus,
    /// Objective, dual bound and column values of the best solution found.
    pub solution: Option<(f64, f64, Vec<f64>)>,
    pub message: String,
}

pub trait LPSolver {
    type Var: Copy + Clone;
    fn new() -> Result<Self, SolverError>
    where
        Self: Sized;
    /// Loads a model file written by [`crate::lpformat`] or by the backend.
    fn read_model(path: &Path) -> Result<Self, SolverError>
    where
        Self: Sized;
    fn add_var(
        &mut self,
        name: &str,
        cost: f64,
        lower: f64,
        upper: f64,
        binary: bool,
    ) -> Result<Self::Var, SolverError>;
    fn add_constraint(
        &mut self,
        name: &str,
        lb: f64,
        ub: f64,
        idxs: &[Self::Var],
        coeffs: &[f64],
    ) -> Result<(), SolverError>;
    fn set_time_limit(&mut self, seconds: f64) -> Result<(), SolverError>;
    fn optimize(&mut self) -> Result<LPResult, SolverError>;
    fn inf(&self) -> f64;
    fn num_vars(&self) -> usize;
    fn write_model(&mut self, path: &Path) -> Result<(), SolverError>;
}
