use std::{fs::File, process::exit};

use dronerouting_planner::{
    build_model,
    extract::{extract_routes, write_routes_csv},
    lpformat::write_lp_file,
    RoutingModel, SolveOutcome, SolveReport,
};
use dronerouting_structs::instance::Instance;
use log::info;

#[cfg(feature = "highs")]
fn run_solver(model: &RoutingModel, time_limit: f64) -> SolveReport {
    use dronerouting_planner::extsolvers::highs::HighsSolver;
    dronerouting_planner::solve::<HighsSolver>(model, time_limit)
}

#[cfg(all(feature = "gurobi", not(feature = "highs")))]
fn run_solver(model: &RoutingModel, time_limit: f64) -> SolveReport {
    use dronerouting_planner::extsolvers::gurobi::GurobiSolver;
    dronerouting_planner::solve::<GurobiSolver>(model, time_limit)
}

#[cfg(not(any(feature = "highs", feature = "gurobi")))]
fn run_solver(_model: &RoutingModel, _time_limit: f64) -> SolveReport {
    SolveReport {
        outcome: SolveOutcome::SolverFailure(
            "no solver backend -- enable the 'highs' or 'gurobi' crate feature".to_string(),
        ),
        solve_time: std::time::Duration::ZERO,
    }
}

fn main() {
    env_logger::init();

    let args = std::env::args().collect::<Vec<_>>();
    if args.len() < 3 {
        eprintln!("usage: {} <instance.json> <time_limit_seconds>", args[0]);
        exit(1);
    }
    let time_limit = match args[2].parse::<f64>() {
        Ok(t) if t > 0.0 => t,
        _ => {
            eprintln!("time limit must be a positive number of seconds, got {:?}", args[2]);
            exit(1);
        }
    };

    let instance = match Instance::read(&args[1]) {
        Ok(instance) => instance,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };

    let model = match build_model(&instance) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("could not build model: {}", e);
            exit(1);
        }
    };

    let lp_file = format!("drone_model_{}.lp", instance.id);
    match write_lp_file(model.milp(), &lp_file) {
        Ok(()) => info!("Wrote model to {}", lp_file),
        Err(e) => eprintln!("WARNING: could not write {}: {}", lp_file, e),
    }

    let report = run_solver(&model, time_limit);
    let assignment = match report.assignment() {
        Some(a) => a,
        None => {
            println!("status: {}", report.status_name());
            match &report.outcome {
                SolveOutcome::Infeasible { suspects } => {
                    for (family, name) in suspects {
                        println!("  unsatisfiable row {} ({:?})", name, family);
                    }
                }
                SolveOutcome::SolverFailure(msg) => println!("  {}", msg),
                _ => {}
            }
            exit(2);
        }
    };

    println!("status:     {}", report.status_name());
    println!("objective:  {:.4}", assignment.objective);
    println!("solve time: {:.2}s", report.solve_time.as_secs_f64());
    println!("gap:        {:.4}", assignment.gap());

    let plan = match extract_routes(&model, &assignment.values) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };
    plan.print();

    let csv_file = format!("routes_{}.csv", instance.id);
    let written = File::create(&csv_file)
        .map_err(csv::Error::from)
        .and_then(|f| write_routes_csv(&plan, f));
    match written {
        Ok(()) => info!("Wrote routes to {}", csv_file),
        Err(e) => {
            eprintln!("could not write {}: {}", csv_file, e);
            exit(1);
        }
    }
}
