use dronerouting_structs::{instance::Instance, Node};

use crate::{
    builder::build_model,
    extract::extract_routes,
    lpformat::to_lp_string,
    model::{Family, Violation},
    testutil::{assignment, line_instance, location, station},
};

const TOL: f64 = 1e-6;

fn violated_families(violations: &[Violation]) -> Vec<Family> {
    violations
        .iter()
        .filter_map(|v| match v {
            Violation::Row { family, .. } => Some(*family),
            _ => None,
        })
        .collect()
}

/// One location between the depot and a second station, and no drones
/// anywhere.
fn no_drones_instance() -> Instance {
    Instance {
        id: 2,
        max_battery: 10.0,
        travel_energy_rate: 1.0,
        hover_energy_rate: 0.0,
        recharge_time: 1.0,
        tbig: 100.0,
        speed: 1.0,
        battery_big_m: 1.0,
        locations: vec![location(2, 5.0, 0.0, 1.0)],
        stations: vec![station(0, 0.0, 0.0, 0), station(1, 10.0, 0.0, 0)],
    }
}

/// Location 2 is only reachable from the far depot and location 3 can only
/// leave towards the far station 5, so the two need separate drones and the
/// hop between them stays unused.
fn far_apart_instance() -> Instance {
    Instance {
        id: 3,
        max_battery: 10.0,
        travel_energy_rate: 1.0,
        hover_energy_rate: 0.0,
        recharge_time: 1.0,
        tbig: 100.0,
        speed: 1.0,
        battery_big_m: 1.0,
        locations: vec![location(2, 0.0, 0.0, 0.0), location(3, 7.0, 0.0, 0.0)],
        stations: vec![
            station(0, -8.0, 0.0, 1),
            station(1, 0.0, 1.0, 0),
            station(4, 7.0, 1.0, 1),
            station(5, 15.0, 0.0, 0),
        ],
    }
}

/// The depot is the only station and sits between the two locations.
fn depot_only_instance() -> Instance {
    let mut instance = line_instance(10.0, 1);
    instance.stations = vec![station(0, 5.0, 0.0, 1)];
    instance
}

fn with_isolated_location() -> Instance {
    let mut instance = line_instance(10.0, 1);
    instance.locations.push(location(4, 500.0, 500.0, 0.0));
    instance
}

#[test]
fn single_drone_recharges_between_locations() {
    let _ = env_logger::try_init();
    let instance = line_instance(10.0, 1);
    let model = build_model(&instance).unwrap();
    let values = assignment(
        &model,
        &[(1, 2), (2, 1), (1, 3), (3, 1)],
        &[(2, 3, 1)],
        &[(2, 5.0), (3, 18.0)],
        &[(2, 0.5), (3, 0.5)],
    );
    assert_eq!(model.milp().violations(&values, TOL), vec![]);
    assert_eq!(model.milp().objective_value(&values), 20.0);

    let plan = extract_routes(&model, &values).unwrap();
    assert_eq!(plan.routes.len(), 1);
    let nodes = plan.routes[0].nodes().collect::<Vec<_>>();
    assert_eq!(nodes[2], Node::station(1));
    assert_eq!(plan.total_flight_time(), 20.0);
}

#[test]
fn second_drone_needs_second_slot() {
    let instance = line_instance(10.0, 1);
    let model = build_model(&instance).unwrap();
    let values = assignment(
        &model,
        &[(1, 2), (2, 1), (1, 3), (3, 1)],
        &[],
        &[(2, 5.0), (3, 5.0)],
        &[(2, 0.5), (3, 0.5)],
    );
    let violations = model.milp().violations(&values, TOL);
    assert_eq!(violations.len(), 1);
    match &violations[0] {
        Violation::Row { name, lhs, rhs, .. } => {
            assert_eq!(name, "station_cap_1");
            assert_eq!((*lhs, *rhs), (2.0, 1.0));
        }
        other => panic!("unexpected {:?}", other),
    }

    // With two drones at the station the same routes are fine.
    let instance = line_instance(10.0, 2);
    let model = build_model(&instance).unwrap();
    let values = assignment(
        &model,
        &[(1, 2), (2, 1), (1, 3), (3, 1)],
        &[],
        &[(2, 5.0), (3, 5.0)],
        &[(2, 0.5), (3, 0.5)],
    );
    assert_eq!(model.milp().violations(&values, TOL), vec![]);
}

#[test]
fn direct_hop_drains_the_battery() {
    let instance = line_instance(10.0, 1);
    let model = build_model(&instance).unwrap();
    for f2 in [0.0, 0.25, 0.5, 0.75, 1.0] {
        let times = [(2, 5.0), (3, 16.0)];
        let charge = [(2, f2), (3, 0.0)];
        let values = assignment(&model, &[(1, 2), (2, 3), (3, 1)], &[], &times, &charge);
        let families = violated_families(&model.milp().violations(&values, TOL));
        assert!(
            families.contains(&Family::ArcBattery) || families.contains(&Family::FromStation),
            "f2 = {}: {:?}",
            f2,
            families
        );
    }
}

#[test]
fn subtour_between_locations_breaks_time_rows() {
    let instance = line_instance(10.0, 1);
    let model = build_model(&instance).unwrap();
    let times = [(2, 20.0), (3, 31.0)];
    let values = assignment(&model, &[(2, 3), (3, 2)], &[], &times, &[(2, 1.0), (3, 0.0)]);
    let families = violated_families(&model.milp().violations(&values, TOL));
    assert!(families.contains(&Family::ArcTime));
}

#[test]
fn unused_arc_does_not_constrain_battery() {
    let instance = far_apart_instance();
    let model = build_model(&instance).unwrap();
    assert!(model.network().has_arc(2, 3));
    for (f2, f3) in [(0.1, 0.8), (0.2, 0.85), (0.2, 0.9)] {
        let values = assignment(
            &model,
            &[(0, 2), (2, 1), (4, 3), (3, 5)],
            &[],
            &[(2, 8.0), (3, 1.0)],
            &[(2, f2), (3, f3)],
        );
        assert_eq!(model.milp().violations(&values, TOL), vec![], "f2 = {}, f3 = {}", f2, f3);
    }

    // Chaining both locations on one drone still runs out of battery.
    let values = assignment(
        &model,
        &[(0, 2), (2, 3), (3, 5)],
        &[],
        &[(2, 8.0), (3, 15.0)],
        &[(2, 0.2), (3, 0.0)],
    );
    let families = violated_families(&model.milp().violations(&values, TOL));
    assert!(families.contains(&Family::ArcBattery), "{:?}", families);
}

#[test]
fn depot_departures_include_pass_throughs() {
    let instance = depot_only_instance();
    let model = build_model(&instance).unwrap();
    let values = assignment(
        &model,
        &[(0, 2), (2, 0), (0, 3), (3, 0)],
        &[(2, 3, 0)],
        &[(2, 5.0), (3, 18.0)],
        &[(2, 0.5), (3, 0.5)],
    );
    let violations = model.milp().violations(&values, TOL);
    assert_eq!(
        violations,
        vec![Violation::Row {
            name: "depot_dep".to_string(),
            family: Family::DepotDepartures,
            lhs: 2.0,
            rhs: 1.0
        }]
    );

    // A second drone at the depot covers the extra departure.
    let mut instance = depot_only_instance();
    instance.stations[0].initial_drones = 2;
    let model = build_model(&instance).unwrap();
    let values = assignment(
        &model,
        &[(0, 2), (2, 0), (0, 3), (3, 0)],
        &[(2, 3, 0)],
        &[(2, 5.0), (3, 18.0)],
        &[(2, 0.5), (3, 0.5)],
    );
    assert_eq!(model.milp().violations(&values, TOL), vec![]);
}

#[test]
fn isolated_location_is_reported() {
    let instance = with_isolated_location();
    let model = build_model(&instance).unwrap();
    assert!(model.network().locations.contains(&4));
    let rows = model.milp().unsatisfiable_rows(1e-9);
    let names = rows.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
    assert!(names.contains(&"out_deg_4"));
    assert!(names.contains(&"in_deg_4"));
    assert!(rows.iter().all(|c| matches!(c.family, Family::OutDegree | Family::InDegree)));
}

#[test]
fn no_drones_no_routes() {
    let instance = no_drones_instance();
    let model = build_model(&instance).unwrap();
    for from in [0, 1] {
        for to in [0, 1] {
            let values = assignment(&model, &[(from, 2), (2, to)], &[], &[(2, 5.0)], &[(2, 0.5)]);
            let families = violated_families(&model.milp().violations(&values, TOL));
            let capacity =
                |f: &Family| matches!(f, Family::StationCapacity | Family::DepotCapacity);
            assert!(
                families.iter().any(capacity),
                "{} -> 2 -> {}: {:?}",
                from,
                to,
                families
            );
        }
    }
}

#[test]
fn lp_export_is_stable() {
    let instance = line_instance(10.0, 1);
    let a = to_lp_string(build_model(&instance).unwrap().milp());
    let b = to_lp_string(build_model(&instance).unwrap().milp());
    assert_eq!(a, b);
    assert!(a.contains(" time_stop_2_3_1: + 1 t_3 - 1 t_2 - 100 z_2_3_1 >= -87"));
}

#[test]
fn bench_instances_build() {
    let _ = env_logger::try_init();
    for file in ["../bench/line.json", "../bench/grid.json"] {
        let text = std::fs::read_to_string(file).unwrap();
        let instance: Instance = serde_json::from_str(&text).unwrap();
        instance.validate().unwrap();
        let model = build_model(&instance).unwrap();
        assert!(model.milp().num_constraints() > 0);
        assert!(model.milp().unsatisfiable_rows(1e-9).is_empty(), "{}", file);
    }
}

#[cfg(feature = "highs")]
mod highs {
    use super::*;
    use crate::{
        extsolvers::{highs::HighsSolver, LPSolver},
        lpformat::write_lp_file,
        solve::{load_model, solve, solve_lp_file, SolveOutcome},
    };

    #[test]
    fn line_optimum() {
        let _ = env_logger::try_init();
        let instance = line_instance(10.0, 1);
        let model = build_model(&instance).unwrap();
        let report = solve::<HighsSolver>(&model, 30.0);
        let assignment = match &report.outcome {
            SolveOutcome::Optimal(a) => a,
            other => panic!("unexpected {:?}", other),
        };
        assert!((assignment.objective - 20.0).abs() < TOL);
        assert_eq!(model.milp().violations(&assignment.values, TOL), vec![]);

        let plan = extract_routes(&model, &assignment.values).unwrap();
        plan.print();
        assert_eq!(plan.routes.len(), 1);
        assert!((plan.total_flight_time() - 20.0).abs() < TOL);
    }

    #[test]
    fn two_drones_share_the_work() {
        let instance = line_instance(10.0, 2);
        let model = build_model(&instance).unwrap();
        let report = solve::<HighsSolver>(&model, 30.0);
        let assignment = report.assignment().unwrap();
        assert!((assignment.objective - 20.0).abs() < TOL);
        let plan = extract_routes(&model, &assignment.values).unwrap();
        assert!(!plan.routes.is_empty());
    }

    #[test]
    fn infeasible_instances() {
        let _ = env_logger::try_init();
        let instance = with_isolated_location();
        let model = build_model(&instance).unwrap();
        match solve::<HighsSolver>(&model, 30.0).outcome {
            SolveOutcome::Infeasible { suspects } => {
                assert!(suspects.contains(&(Family::OutDegree, "out_deg_4".to_string())));
            }
            other => panic!("unexpected {:?}", other),
        }

        let instance = no_drones_instance();
        let model = build_model(&instance).unwrap();
        let report = solve::<HighsSolver>(&model, 30.0);
        assert!(matches!(report.outcome, SolveOutcome::Infeasible { .. }));
    }

    #[test]
    fn separate_drones_for_far_apart_locations() {
        let instance = far_apart_instance();
        let model = build_model(&instance).unwrap();
        let report = solve::<HighsSolver>(&model, 30.0);
        let assignment = match &report.outcome {
            SolveOutcome::Optimal(a) => a,
            other => panic!("unexpected {:?}", other),
        };
        // 0 -> 2 -> 1 and 4 -> 3 -> 5 is one feasible plan.
        assert!(assignment.objective <= 18.0 + TOL);
        assert_eq!(model.milp().violations(&assignment.values, TOL), vec![]);
        extract_routes(&model, &assignment.values).unwrap();
    }

    #[test]
    fn lp_file_round_trip() {
        let instance = line_instance(10.0, 1);
        let model = build_model(&instance).unwrap();
        let dir = std::env::temp_dir();
        let path = dir.join(format!("drone_model_roundtrip_{}.lp", std::process::id()));
        write_lp_file(model.milp(), &path).unwrap();
        let report = solve_lp_file::<HighsSolver>(&path, 30.0);
        let _ = std::fs::remove_file(&path);
        let assignment = report.assignment().unwrap();
        assert!((assignment.objective - 20.0).abs() < TOL);
    }

    #[test]
    fn backend_written_model_solves_the_same() {
        let instance = line_instance(10.0, 1);
        let model = build_model(&instance).unwrap();
        let dir = std::env::temp_dir();
        let path = dir.join(format!("drone_model_backend_{}.lp", std::process::id()));
        let mut lp = load_model::<HighsSolver>(model.milp()).unwrap();
        assert_eq!(lp.num_vars(), model.milp().num_vars());
        lp.write_model(&path).unwrap();
        let report = solve_lp_file::<HighsSolver>(&path, 30.0);
        let _ = std::fs::remove_file(&path);
        let assignment = report.assignment().unwrap();
        assert!((assignment.objective - 20.0).abs() < TOL);
    }
}
