use std::{
    path::Path,
    time::{Duration, Instant},
};

use log::{info, warn};

use crate::{
    builder::RoutingModel,
    error::SolverError,
    extsolvers::{LPResult, LPSolver, LPStatus},
    model::{Family, MilpModel, Sense, VarKind},
};

/// Values of every model column, in [`crate::model::VarId`] order, for the
/// best solution found.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub objective: f64,
    pub bound: f64,
    pub values: Vec<f64>,
}

impl Assignment {
    /// Relative optimality gap.
    pub fn gap(&self) -> f64 {
        (self.objective - self.bound).abs() / self.objective.abs().max(1e-10)
    }
}

/// Every way a solve can end. None of these is an error for the caller:
/// an infeasible instance or an exhausted time limit are ordinary results.
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    Optimal(Assignment),
    /// A solution was found but the solver stopped before proving optimality
    /// for a reason other than the time limit.
    Feasible(Assignment),
    TimeLimit(Option<Assignment>),
    /// Rows that can never hold, if any, as `(family, row name)`.
    Infeasible { suspects: Vec<(Family, String)> },
    /// License, memory or backend failures. The caller may retry.
    SolverFailure(String),
}

#[derive(Debug, Clone)]
pub struct SolveReport {
    pub outcome: SolveOutcome,
    pub solve_time: Duration,
}

impl SolveReport {
    pub fn assignment(&self) -> Option<&Assignment> {
        match &self.outcome {
            SolveOutcome::Optimal(a) | SolveOutcome::Feasible(a) => Some(a),
            SolveOutcome::TimeLimit(a) => a.as_ref(),
            SolveOutcome::Infeasible { .. } | SolveOutcome::SolverFailure(_) => None,
        }
    }

    pub fn status_name(&self) -> &'static str {
        match &self.outcome {
            SolveOutcome::Optimal(_) => "OPTIMAL",
            SolveOutcome::Feasible(_) => "FEASIBLE",
            SolveOutcome::TimeLimit(_) => "TIME_LIMIT",
            SolveOutcome::Infeasible { .. } => "INFEASIBLE",
            SolveOutcome::SolverFailure(_) => "SOLVER_FAILURE",
        }
    }
}

/// Copies `milp` into a fresh backend instance.
pub fn load_model<LP: LPSolver>(milp: &MilpModel) -> Result<LP, SolverError> {
    let mut lp = LP::new()?;

    let mut costs = vec![0.0; milp.num_vars()];
    for (var, cost) in milp.objective() {
        costs[var.idx()] += cost;
    }

    let mut cols = Vec::with_capacity(milp.num_vars());
    for (var, cost) in milp.vars().iter().zip(costs) {
        cols.push(lp.add_var(&var.name, cost, var.lb, var.ub, var.kind == VarKind::Binary)?);
    }

    let inf = lp.inf();
    let mut idxs = Vec::new();
    for c in milp.constraints() {
        let (lb, ub) = match c.sense {
            Sense::Le => (-inf, c.rhs),
            Sense::Ge => (c.rhs, inf),
            Sense::Eq => (c.rhs, c.rhs),
        };
        idxs.clear();
        idxs.extend(c.idxs.iter().map(|v| cols[v.idx()]));
        lp.add_constraint(&c.name, lb, ub, &idxs, &c.coeffs)?;
    }
    Ok(lp)
}

fn to_outcome(result: LPResult, milp: Option<&MilpModel>) -> SolveOutcome {
    let assignment = result
        .solution
        .map(|(objective, bound, values)| Assignment { objective, bound, values });
    match (result.status, assignment) {
        (LPStatus::Optimal, Some(a)) => SolveOutcome::Optimal(a),
        (LPStatus::TimeLimit, a) => SolveOutcome::TimeLimit(a),
        (LPStatus::Infeasible, _) => {
            let suspects = milp
                .map(|m| {
                    let rows = m.unsatisfiable_rows(1e-9);
                    rows.into_iter().map(|c| (c.family, c.name.clone())).collect()
                })
                .unwrap_or_default();
            SolveOutcome::Infeasible { suspects }
        }
        (LPStatus::Other, Some(a)) => SolveOutcome::Feasible(a),
        (_, None) => SolveOutcome::SolverFailure(format!(
            "solver stopped without a solution: {}",
            result.message
        )),
    }
}

fn finish(outcome: SolveOutcome, t0: Instant) -> SolveReport {
    let report = SolveReport { outcome, solve_time: t0.elapsed() };
    match report.assignment() {
        Some(a) => info!(
            "{}: objective {:.4} bound {:.4} gap {:.4} in {:.2}s",
            report.status_name(),
            a.objective,
            a.bound,
            a.gap(),
            report.solve_time.as_secs_f64()
        ),
        None => info!("{} after {:.2}s", report.status_name(), report.solve_time.as_secs_f64()),
    }
    report
}

/// Solves the assembled model under `time_limit` seconds. The model is only
/// read, and the backend instance is dropped before returning.
pub fn solve<LP: LPSolver>(model: &RoutingModel, time_limit: f64) -> SolveReport {
    #[cfg(feature = "prof")]
    let _p = hprof::enter("solve");
    let milp = model.milp();
    let t0 = Instant::now();
    let result = load_model::<LP>(milp).and_then(|mut lp| {
        lp.set_time_limit(time_limit)?;
        lp.optimize()
    });
    let outcome = match result {
        Ok(result) => to_outcome(result, Some(milp)),
        Err(e) => {
            warn!("Solver failure: {}", e);
            SolveOutcome::SolverFailure(e.to_string())
        }
    };
    finish(outcome, t0)
}

/// Solves a model file, e.g. one written by [`crate::lpformat::write_lp_file`].
/// Column values follow the file's column order.
pub fn solve_lp_file<LP: LPSolver>(path: &Path, time_limit: f64) -> SolveReport {
    let t0 = Instant::now();
    let result = LP::read_model(path).and_then(|mut lp| {
        lp.set_time_limit(time_limit)?;
        lp.optimize()
    });
    let outcome = match result {
        Ok(result) => to_outcome(result, None),
        Err(e) => {
            warn!("Solver failure: {}", e);
            SolveOutcome::SolverFailure(e.to_string())
        }
    };
    finish(outcome, t0)
}
