use std::{
    collections::{BTreeMap, HashMap, HashSet},
    io::Write,
};

use dronerouting_structs::{
    route::{Route, RouteArc, RoutePlan},
    NodeId, NodeKind,
};
use log::debug;
use serde::Serialize;

use crate::{builder::RoutingModel, error::ModelError, indices::ArcIdx, model::VarId};

/// Turns the column values of a solved model into one route per drone.
///
/// A drone starts on every selected station arc that is not the second leg
/// of a selected recharge stop. It then follows the unique outgoing arc of
/// each location, and continues through a station only where a stop
/// variable says so.
pub fn extract_routes(model: &RoutingModel, values: &[f64]) -> Result<RoutePlan, ModelError> {
    let instance = model.instance();
    let network = model.network();
    let vars = model.vars();
    let is_on = |v: VarId| values.get(v.idx()).map_or(false, |x| *x > 0.5);

    let mut successor: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    let mut station_departures = Vec::new();
    for arc in network.arcs.iter() {
        if !is_on(vars.x(*arc)?) {
            continue;
        }
        if network.is_location(arc.from) {
            if successor.insert(arc.from, arc.to).is_some() {
                let msg = format!("location {} is left twice", arc.from);
                return Err(ModelError::InconsistentSolution(msg));
            }
        } else {
            station_departures.push(*arc);
        }
    }

    let mut continuation: HashMap<(NodeId, NodeId), NodeId> = HashMap::new();
    let mut continued = HashSet::new();
    for stop in model.stops().iter() {
        if is_on(vars.z(*stop)?) {
            if continuation.insert((stop.from, stop.station), stop.to).is_some() {
                return Err(ModelError::InconsistentSolution(format!(
                    "two stops continue from {} via {}",
                    stop.from, stop.station
                )));
            }
            continued.insert(stop.second_leg());
        }
    }

    let node = |id: NodeId| instance.node(id).ok_or(ModelError::UnknownNode(id));
    let mut visited = HashSet::new();
    let mut routes = Vec::new();
    for start in station_departures.iter().filter(|a| !continued.contains(a)) {
        let mut arcs = Vec::new();
        let mut current = *start;
        let mut recharge_time = 0.0;
        loop {
            if !visited.insert(current) {
                let msg = format!("arc {} is flown twice", current);
                return Err(ModelError::InconsistentSolution(msg));
            }
            let service_time = instance
                .service_time(current.from)
                .ok_or(ModelError::UnknownNode(current.from))?;
            arcs.push(RouteArc {
                from: node(current.from)?,
                to: node(current.to)?,
                travel_time: model.travel().get(current.from, current.to)?,
                service_time,
                recharge_time,
            });

            if network.is_location(current.to) {
                match successor.get(&current.to) {
                    Some(&next) => {
                        current = ArcIdx::new(current.to, next);
                        recharge_time = 0.0;
                    }
                    None => {
                        let msg = format!("location {} is never left", current.to);
                        return Err(ModelError::InconsistentSolution(msg));
                    }
                }
            } else {
                match continuation.get(&(current.from, current.to)) {
                    Some(&next) => {
                        current = ArcIdx::new(current.to, next);
                        recharge_time = instance.recharge_time;
                    }
                    None => break,
                }
            }
        }
        routes.push(Route::new(routes.len(), arcs));
    }

    let stray = successor
        .iter()
        .map(|(i, j)| ArcIdx::new(*i, *j))
        .chain(station_departures.iter().copied())
        .filter(|a| !visited.contains(a))
        .collect::<Vec<_>>();
    if !stray.is_empty() {
        return Err(ModelError::InconsistentSolution(format!(
            "arcs not on any drone route: {}",
            stray.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
        )));
    }

    debug!("Extracted {} drone routes", routes.len());
    Ok(RoutePlan { routes })
}

#[derive(Serialize)]
struct SegmentRow {
    drone: usize,
    seq: usize,
    from: NodeId,
    from_kind: NodeKind,
    to: NodeId,
    to_kind: NodeKind,
    travel_time: f64,
    service_time: f64,
    recharge_time: f64,
    route_total_time: f64,
}

/// One CSV row per flown segment.
pub fn write_routes_csv<W: Write>(plan: &RoutePlan, out: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(out);
    for route in plan.routes.iter() {
        for (seq, arc) in route.arcs.iter().enumerate() {
            wtr.serialize(SegmentRow {
                drone: route.drone,
                seq,
                from: arc.from.id,
                from_kind: arc.from.kind,
                to: arc.to.id,
                to_kind: arc.to.kind,
                travel_time: arc.travel_time,
                service_time: arc.service_time,
                recharge_time: arc.recharge_time,
                route_total_time: route.total_time,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}
