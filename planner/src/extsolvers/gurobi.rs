#![cfg(feature = "gurobi")]

use core::f64;
use std::cell::RefCell;
use std::path::Path;

use super::{LPResult, LPSolver, LPStatus};
use crate::error::SolverError;
use grb::{expr::LinExpr, prelude::*};

thread_local! {
static GLOBAL_GUROBI_ENV :RefCell<Option<grb::Env>> = const { RefCell::new(None) };
}

fn backend(e: grb::Error) -> SolverError {
    SolverError::Backend(e.to_string())
}

/// Runs `f` with the shared environment, starting it on first use. License
/// failures surface here.
fn with_env<T>(f: impl FnOnce(&grb::Env) -> grb::Result<T>) -> Result<T, SolverError> {
    GLOBAL_GUROBI_ENV.with_borrow_mut(|e| {
        if e.is_none() {
            *e = Some(grb::Env::new("").map_err(backend)?);
        }
        match e.as_ref() {
            Some(env) => f(env).map_err(backend),
            None => Err(SolverError::Backend("no gurobi environment".to_string())),
        }
    })
}

pub struct GurobiSolver {
    grb: grb::Model,
    added_vars: Vec<grb::Var>,
}

impl GurobiSolver {
    fn wrap(mut grb: grb::Model) -> Result<Self, SolverError> {
        grb.set_param(grb::param::OutputFlag, 0).map_err(backend)?;
        let added_vars = grb.get_vars().map_err(backend)?.to_vec();
        Ok(Self { grb, added_vars })
    }
}

impl LPSolver for GurobiSolver {
    type Var = grb::Var;

    fn new() -> Result<Self, SolverError> {
        let grb = with_env(|env| grb::Model::with_env("dronerouting", env))?;
        Self::wrap(grb)
    }

    fn read_model(path: &Path) -> Result<Self, SolverError> {
        let filename = path.to_string_lossy().to_string();
        let grb = with_env(|env| grb::Model::read_from(&filename, env)).map_err(|e| {
            SolverError::File { path: filename.clone(), reason: e.to_string() }
        })?;
        Self::wrap(grb)
    }

    fn add_var(
        &mut self,
        name: &str,
        cost: f64,
        lower: f64,
        upper: f64,
        binary: bool,
    ) -> Result<Self::Var, SolverError> {
        let model = &mut self.grb;
        let var = if binary {
            add_binvar!(model, name: name, obj: cost)
        } else {
            add_ctsvar!(model, name: name, obj: cost, bounds: lower..upper)
        }
        .map_err(backend)?;
        self.added_vars.push(var);
        Ok(var)
    }

    fn add_constraint(
        &mut self,
        name: &str,
        lb: f64,
        ub: f64,
        idxs: &[Self::Var],
        coeffs: &[f64],
    ) -> Result<(), SolverError> {
        let mut expr = LinExpr::new();
        for (v, c) in idxs.iter().zip(coeffs.iter()) {
            expr.add_term(*c, *v);
        }
        let result = if lb == ub {
            self.grb.add_constr(name, c!(expr == lb))
        } else if lb == -self.inf() {
            assert!(ub != self.inf());
            self.grb.add_constr(name, c!(expr <= ub))
        } else if ub == self.inf() {
            assert!(lb != -self.inf());
            self.grb.add_constr(name, c!(expr >= lb))
        } else {
            return Err(SolverError::Backend("range constraints not supported".to_string()));
        };
        result.map(|_| ()).map_err(backend)
    }

    fn set_time_limit(&mut self, seconds: f64) -> Result<(), SolverError> {
        self.grb.set_param(grb::param::TimeLimit, seconds).map_err(backend)
    }

    fn optimize(&mut self) -> Result<LPResult, SolverError> {
        self.grb.optimize().map_err(backend)?;
        let grb_status = self.grb.status().map_err(backend)?;
        let status = match grb_status {
            Status::Optimal => LPStatus::Optimal,
            Status::TimeLimit => LPStatus::TimeLimit,
            Status::Infeasible | Status::InfOrUnbd => LPStatus::Infeasible,
            _ => LPStatus::Other,
        };

        let sol_count = self.grb.get_attr(attr::SolCount).map_err(backend)?;
        let solution = if sol_count > 0 {
            let bound = self.grb.get_attr(attr::ObjBound).map_err(backend)?;
            let obj = self.grb.get_attr(attr::ObjVal).map_err(backend)?;
            let sol = self
                .grb
                .get_obj_attr_batch(grb::attr::X, self.added_vars.iter().cloned())
                .map_err(backend)?;
            Some((obj, bound, sol))
        } else {
            None
        };

        Ok(LPResult { status, solution, message: format!("{:?}", grb_status) })
    }

    fn inf(&self) -> f64 {
        f64::INFINITY
    }

    fn num_vars(&self) -> usize {
        self.added_vars.len()
    }

    fn write_model(&mut self, path: &Path) -> Result<(), SolverError> {
        self.grb.update().map_err(backend)?;
        self.grb.write(&path.to_string_lossy()).map_err(|e| SolverError::File {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
