#![cfg(test)]

use dronerouting_structs::{
    instance::{Instance, Location, RechargeStation},
    NodeId,
};

use crate::{
    builder::RoutingModel,
    indices::{ArcIdx, StopIdx},
};

pub fn location(id: NodeId, x: f64, y: f64, service_time: f64) -> Location {
    Location { id, x, y, service_time }
}

pub fn station(id: NodeId, x: f64, y: f64, initial_drones: u32) -> RechargeStation {
    RechargeStation { id, x, y, initial_drones }
}

/// Locations 2 and 3 are `gap` apart with station 1 halfway between them.
/// The battery covers exactly `gap` units of flight, so the direct hop
/// between the locations drains it completely. The depot is far away and
/// has no drones.
pub fn line_instance(gap: f64, station_drones: u32) -> Instance {
    Instance {
        id: 1,
        max_battery: gap,
        travel_energy_rate: 1.0,
        hover_energy_rate: 0.0,
        recharge_time: 2.0,
        tbig: 100.0,
        speed: 1.0,
        battery_big_m: 1.0,
        locations: vec![location(2, 0.0, 0.0, 1.0), location(3, gap, 0.0, 1.0)],
        stations: vec![station(0, 100.0, 100.0, 0), station(1, gap / 2.0, 0.0, station_drones)],
    }
}

/// Column values with the given arcs and stops selected and the given
/// arrival times and charge levels. Everything else is zero.
pub fn assignment(
    model: &RoutingModel,
    arcs: &[(NodeId, NodeId)],
    stops: &[(NodeId, NodeId, NodeId)],
    times: &[(NodeId, f64)],
    charge: &[(NodeId, f64)],
) -> Vec<f64> {
    let vars = model.vars();
    let mut values = vec![0.0; model.milp().num_vars()];
    for (i, j) in arcs {
        values[vars.x(ArcIdx::new(*i, *j)).unwrap().idx()] = 1.0;
    }
    for (i, j, s) in stops {
        values[vars.z(StopIdx::new(*i, *j, *s)).unwrap().idx()] = 1.0;
    }
    for (j, t) in times {
        values[vars.t(*j).unwrap().idx()] = *t;
    }
    for (j, f) in charge {
        values[vars.f(*j).unwrap().idx()] = *f;
    }
    values
}
