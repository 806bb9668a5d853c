#![cfg(feature = "highs")]

use std::convert::TryFrom;
use std::ffi::{c_void, CString};
use std::fmt::{Debug, Formatter};
use std::os::raw::c_int;
use std::path::Path;

use highs_sys::*;
use log::debug;

use super::{LPResult, LPSolver, LPStatus};
use crate::error::SolverError;

/// HiGHS instance behind the C API. The handle is released on drop, also
/// when a solve fails halfway.
pub struct HighsSolver {
    ptr: *mut c_void,
}

impl Drop for HighsSolver {
    fn drop(&mut self) {
        unsafe {
            highs_sys::Highs_destroy(self.ptr);
        }
    }
}

fn c_string(s: &str) -> Result<CString, SolverError> {
    CString::new(s).map_err(|_| SolverError::Backend(format!("string {:?} contains a nul byte", s)))
}

fn check(retval: HighsInt, what: &str) -> Result<(), SolverError> {
    match HighsStatus::try_from(retval) {
        Ok(HighsStatus::OK) | Ok(HighsStatus::Warning) => Ok(()),
        Ok(HighsStatus::Error) => Err(SolverError::Backend(format!("HiGHS call failed: {}", what))),
        Err(e) => Err(SolverError::Backend(format!("{:?} ({})", e, what))),
    }
}

impl HighsSolver {
    fn create() -> Result<Self, SolverError> {
        let ptr = unsafe { highs_sys::Highs_create() };
        if ptr.is_null() {
            return Err(SolverError::Backend("could not create HiGHS instance".to_string()));
        }
        let solver = Self { ptr };
        let option = c_string("output_flag")?;
        let retval = unsafe { highs_sys::Highs_setBoolOptionValue(solver.ptr, option.as_ptr(), 0) };
        check(retval, "output_flag")?;
        Ok(solver)
    }

    fn double_info(&self, name: &str) -> Option<f64> {
        let name = c_string(name).ok()?;
        let mut value = 0.0f64;
        let retval =
            unsafe { highs_sys::Highs_getDoubleInfoValue(self.ptr, name.as_ptr(), &mut value) };
        check(retval, "double info").ok().map(|_| value)
    }

    fn int_info(&self, name: &str) -> Option<HighsInt> {
        let name = c_string(name).ok()?;
        let mut value: HighsInt = 0;
        let retval =
            unsafe { highs_sys::Highs_getIntInfoValue(self.ptr, name.as_ptr(), &mut value) };
        check(retval, "int info").ok().map(|_| value)
    }

    fn column_values(&self) -> Vec<f64> {
        let mut values = vec![0.0; self.num_vars()];
        if !values.is_empty() {
            let (ptr, null) = (self.ptr, std::ptr::null_mut());
            unsafe { highs_sys::Highs_getSolution(ptr, values.as_mut_ptr(), null, null, null) };
        }
        values
    }
}

impl LPSolver for HighsSolver {
    type Var = HighsInt;

    fn new() -> Result<Self, SolverError> {
        Self::create()
    }

    fn read_model(path: &Path) -> Result<Self, SolverError> {
        let solver = Self::create()?;
        let filename = c_string(&path.to_string_lossy())?;
        let retval = unsafe { highs_sys::Highs_readModel(solver.ptr, filename.as_ptr()) };
        check(retval, "read model").map_err(|e| SolverError::File {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(solver)
    }

    fn add_var(
        &mut self,
        _name: &str,
        cost: f64,
        lower: f64,
        upper: f64,
        binary: bool,
    ) -> Result<Self::Var, SolverError> {
        let col = unsafe { highs_sys::Highs_getNumCol(self.ptr) };
        let null = std::ptr::null();
        let retval =
            unsafe { highs_sys::Highs_addCol(self.ptr, cost, lower, upper, 0, null, null) };
        check(retval, "add column")?;
        if binary {
            let retval = unsafe {
                highs_sys::Highs_changeColIntegrality(self.ptr, col, kHighsVarTypeInteger)
            };
            check(retval, "set integrality")?;
        }
        Ok(col)
    }

    fn add_constraint(
        &mut self,
        _name: &str,
        lb: f64,
        ub: f64,
        idxs: &[Self::Var],
        coeffs: &[f64],
    ) -> Result<(), SolverError> {
        assert!(idxs.len() == coeffs.len());
        let len = idxs.len() as HighsInt;
        let retval = unsafe {
            highs_sys::Highs_addRow(self.ptr, lb, ub, len, idxs.as_ptr(), coeffs.as_ptr())
        };
        check(retval, "add row")
    }

    fn set_time_limit(&mut self, seconds: f64) -> Result<(), SolverError> {
        let option = c_string("time_limit")?;
        let retval =
            unsafe { highs_sys::Highs_setDoubleOptionValue(self.ptr, option.as_ptr(), seconds) };
        check(retval, "time_limit")
    }

    fn optimize(&mut self) -> Result<LPResult, SolverError> {
        let run = unsafe { highs_sys::Highs_run(self.ptr) };
        let model_status =
            HighsModelStatus::from(unsafe { highs_sys::Highs_getModelStatus(self.ptr) });
        debug!("HiGHS run returned {} with model status {:?}", run, model_status);
        let run_failed = HighsStatus::try_from(run) == Ok(HighsStatus::Error);
        if run_failed && model_status == HighsModelStatus::NotSet {
            return Err(SolverError::Backend("HiGHS run failed".to_string()));
        }

        let status = match model_status {
            HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => LPStatus::Optimal,
            HighsModelStatus::ReachedTimeLimit => LPStatus::TimeLimit,
            // All columns are bounded, so this can only mean infeasible.
            HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
                LPStatus::Infeasible
            }
            _ => LPStatus::Other,
        };

        // kHighsSolutionStatusFeasible
        let has_primal = self.int_info("primal_solution_status") == Some(2);
        let solution = if self.num_vars() == 0 {
            Some((0.0, 0.0, Vec::new()))
        } else if has_primal && status != LPStatus::Infeasible {
            let obj = self.double_info("objective_function_value").unwrap_or(f64::NAN);
            let bound = self.double_info("mip_dual_bound").unwrap_or(obj);
            Some((obj, bound, self.column_values()))
        } else {
            None
        };

        Ok(LPResult { status, solution, message: format!("{:?}", model_status) })
    }

    fn inf(&self) -> f64 {
        unsafe { highs_sys::Highs_getInfinity(self.ptr) }
    }

    fn num_vars(&self) -> usize {
        unsafe { highs_sys::Highs_getNumCol(self.ptr) as usize }
    }

    fn write_model(&mut self, path: &Path) -> Result<(), SolverError> {
        let filename = c_string(&path.to_string_lossy())?;
        let retval = unsafe { highs_sys::Highs_writeModel(self.ptr, filename.as_ptr()) };
        check(retval, "write model").map_err(|e| SolverError::File {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Model status after `Highs_run`, reduced to the cases the adapter tells apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HighsModelStatus {
    NotSet,
    ModelEmpty,
    Optimal,
    Infeasible,
    UnboundedOrInfeasible,
    ReachedTimeLimit,
    /// Any other status code, e.g. a solve error or another limit.
    Other(c_int),
}

impl From<c_int> for HighsModelStatus {
    fn from(value: c_int) -> Self {
        match value {
            MODEL_STATUS_NOTSET => Self::NotSet,
            MODEL_STATUS_MODEL_EMPTY => Self::ModelEmpty,
            MODEL_STATUS_OPTIMAL => Self::Optimal,
            MODEL_STATUS_INFEASIBLE => Self::Infeasible,
            MODEL_STATUS_UNBOUNDED_OR_INFEASIBLE => Self::UnboundedOrInfeasible,
            MODEL_STATUS_REACHED_TIME_LIMIT => Self::ReachedTimeLimit,
            n => Self::Other(n),
        }
    }
}

/// Return value of a HiGHS call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HighsStatus {
    OK,
    Warning,
    Error,
}

#[derive(PartialEq, Clone, Copy)]
pub struct InvalidStatus(pub c_int);

impl Debug for InvalidStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} is not a valid HiGHS status", self.0)
    }
}

impl TryFrom<c_int> for HighsStatus {
    type Error = InvalidStatus;

    fn try_from(value: c_int) -> Result<Self, InvalidStatus> {
        match value {
            STATUS_OK => Ok(Self::OK),
            STATUS_WARNING => Ok(Self::Warning),
            STATUS_ERROR => Ok(Self::Error),
            n => Err(InvalidStatus(n)),
        }
    }
}
