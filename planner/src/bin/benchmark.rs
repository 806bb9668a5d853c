#[cfg(not(all(feature = "prof", feature = "highs")))]
pub fn main() {
    println!("benchmarks not supported -- enable 'prof' and 'highs' crate features")
}

#[cfg(all(feature = "prof", feature = "highs"))]
struct InstanceInfo {
    name: String,
    locations: usize,
    stations: usize,
    drones: u32,
}

#[cfg(all(feature = "prof", feature = "highs"))]
#[derive(Debug)]
struct Result {
    time: f64,
    status: &'static str,
    obj: f64,
    bound: f64,
}

#[cfg(all(feature = "prof", feature = "highs"))]
fn get_instance_files() -> Vec<(std::path::PathBuf, InstanceInfo)> {
    let mut filenames = std::fs::read_dir("bench")
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|e| e.as_os_str().to_string_lossy().ends_with(".json"))
        .collect::<Vec<_>>();
    filenames.sort();

    filenames
        .into_iter()
        .map(|filename| {
            let instance = dronerouting_structs::instance::Instance::read(&filename).unwrap();
            let info = InstanceInfo {
                name: filename.file_stem().unwrap().to_string_lossy().to_string(),
                locations: instance.locations.len(),
                stations: instance.stations.len(),
                drones: instance.stations.iter().map(|s| s.initial_drones).sum(),
            };
            (filename, info)
        })
        .collect()
}

#[cfg(all(feature = "prof", feature = "highs"))]
pub fn main() {
    use dronerouting_planner::{
        builder::{build_model, RoutingModel},
        extsolvers::highs::HighsSolver,
        solve::{solve, SolveReport},
    };
    use dronerouting_structs::instance::Instance;

    const TIME_LIMIT: f64 = 60.0;

    let _ = env_logger::try_init();
    let solvers: Vec<(&str, fn(&RoutingModel, f64) -> SolveReport)> = vec![
        ("highs", solve::<HighsSolver>),
        #[cfg(feature = "gurobi")]
        ("gurobi", solve::<dronerouting_planner::extsolvers::gurobi::GurobiSolver>),
    ];

    println!("---------------------------------");
    println!("drone routing solver benchmarking");
    println!("---------------------------------");
    println!();
    println!("  solvers: {}", solvers.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(", "));
    println!();

    let instance_files = get_instance_files();
    let mut results: Vec<Vec<Result>> = Vec::new();

    println!("# RUNNING {} INSTANCES", instance_files.len());
    for (filename, _) in instance_files.iter() {
        results.push(Vec::new());
        let _p = hprof::enter("instance");
        let instance = {
            let _p = hprof::enter("read");
            let instance = Instance::read(filename).unwrap();
            println!(
                " * instance {} with {} locations {} stations",
                filename.display(),
                instance.locations.len(),
                instance.stations.len()
            );
            instance
        };
        let model = {
            let _p = hprof::enter("build");
            build_model(&instance).unwrap()
        };

        for (solver_name, solver_fn) in &solvers {
            println!("   - solving with: \"{}\"", solver_name);
            let report = solver_fn(&model, TIME_LIMIT);
            let (obj, bound) = report
                .assignment()
                .map(|a| (a.objective, a.bound))
                .unwrap_or((f64::NAN, f64::NAN));
            results.last_mut().unwrap().push(Result {
                time: report.solve_time.as_secs_f64(),
                status: report.status_name(),
                obj,
                bound,
            });
        }
    }
    println!();
    println!("# PROFILER");
    hprof::profiler().print_timing();
    println!();

    println!("# RESULTS");

    use std::io::Write;
    let table = Vec::new();
    let mut tablewriter = tabwriter::TabWriter::new(table);
    write!(&mut tablewriter, "filename\tlocs\tstns\tdrones").unwrap();
    for (solver_name, _) in &solvers {
        write!(&mut tablewriter, "\t|\t{}\t\t\t", solver_name).unwrap();
    }
    writeln!(&mut tablewriter).unwrap();

    write!(&mut tablewriter, "\t\t\t").unwrap();
    for _ in &solvers {
        write!(&mut tablewriter, "\t|\tstatus\ttime\tobj\tbnd").unwrap();
    }
    writeln!(&mut tablewriter).unwrap();

    write!(&mut tablewriter, "---\t---\t---\t---").unwrap();
    for _ in &solvers {
        write!(&mut tablewriter, "\t\t---\t---\t---\t---").unwrap();
    }
    writeln!(&mut tablewriter).unwrap();

    for ((_filename, instance), solver_results) in instance_files.iter().zip(results.iter()) {
        write!(
            &mut tablewriter,
            "{}\t{}\t{}\t{}",
            instance.name, instance.locations, instance.stations, instance.drones
        )
        .unwrap();
        for result in solver_results.iter() {
            write!(
                &mut tablewriter,
                "\t|\t{}\t{:.2}\t{:.2}\t{:.2}",
                result.status, result.time, result.obj, result.bound
            )
            .unwrap();
        }
        writeln!(&mut tablewriter).unwrap();
    }

    let written = String::from_utf8(tablewriter.into_inner().unwrap()).unwrap();
    println!("{}", written);
}
