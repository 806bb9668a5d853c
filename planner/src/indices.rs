use dronerouting_structs::{instance::Instance, NodeId};
use log::debug;

use crate::{
    distances::TravelTimes,
    error::ModelError,
    feasibility::{FeasibleNetwork, FEAS_TOL},
};

/// Direct arc `from -> to`.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct ArcIdx {
    pub from: NodeId,
    pub to: NodeId,
}

impl ArcIdx {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        ArcIdx { from, to }
    }
}

impl std::fmt::Display for ArcIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.from, self.to)
    }
}

/// Leg `from -> to` flown with a recharge stop at `station` in between.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct StopIdx {
    pub from: NodeId,
    pub to: NodeId,
    pub station: NodeId,
}

impl StopIdx {
    pub fn new(from: NodeId, to: NodeId, station: NodeId) -> Self {
        StopIdx { from, to, station }
    }

    pub fn first_leg(&self) -> ArcIdx {
        ArcIdx::new(self.from, self.station)
    }

    pub fn second_leg(&self) -> ArcIdx {
        ArcIdx::new(self.station, self.to)
    }
}

impl std::fmt::Display for StopIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}_{}", self.from, self.to, self.station)
    }
}

/// Time from arriving at `stop.from` to arriving at `stop.to`: service,
/// both legs and the recharge in between.
pub fn stop_duration(
    instance: &Instance,
    travel: &TravelTimes,
    stop: &StopIdx,
) -> Result<f64, ModelError> {
    let service = instance.service_time(stop.from).ok_or(ModelError::UnknownNode(stop.from))?;
    Ok(service
        + travel.get(stop.from, stop.station)?
        + instance.recharge_time
        + travel.get(stop.station, stop.to)?)
}

/// All `(i, j, s)` with `i != j` locations and `s` a station such that both
/// legs `i -> s` and `s -> j` are direct arcs and the whole detour fits in
/// the time horizon. Sorted ascending.
pub fn stop_indices(
    instance: &Instance,
    travel: &TravelTimes,
    network: &FeasibleNetwork,
) -> Result<Vec<StopIdx>, ModelError> {
    let mut stops = Vec::new();
    for &i in network.locations.iter() {
        for &j in network.locations.iter() {
            if i == j {
                continue;
            }
            for &s in network.stations.iter() {
                if !(network.has_arc(i, s) && network.has_arc(s, j)) {
                    continue;
                }
                let stop = StopIdx::new(i, j, s);
                if stop_duration(instance, travel, &stop)? <= instance.tbig + FEAS_TOL {
                    stops.push(stop);
                }
            }
        }
    }
    debug_assert!(stops.windows(2).all(|w| w[0] < w[1]));
    debug!("Generated {} stop indices", stops.len());
    Ok(stops)
}
