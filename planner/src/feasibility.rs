use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use dronerouting_structs::{instance::Instance, Node, NodeId, DEPOT};
use log::{debug, info, warn};
use ordered_float::OrderedFloat;

use crate::{distances::TravelTimes, error::ModelError, indices::ArcIdx};

/// Slack allowed on the battery and horizon tests, so that a leg using
/// exactly the full battery is kept.
pub const FEAS_TOL: f64 = 1e-9;

/// The routing graph left after battery and horizon pruning.
#[derive(Debug, Clone)]
pub struct FeasibleNetwork {
    pub locations: BTreeSet<NodeId>,
    pub stations: BTreeSet<NodeId>,
    /// Direct arcs, ascending by `(from, to)`.
    pub arcs: Vec<ArcIdx>,
    arc_set: HashSet<ArcIdx>,
    pub nearest_station_after: BTreeMap<NodeId, NodeId>,
    pub nearest_station_before: BTreeMap<NodeId, NodeId>,
}

/// Can a drone leaving `from` with a full battery fly to `to`, including the
/// service at `from`, within the battery and the time horizon?
pub fn leg_is_flyable(
    instance: &Instance,
    travel: &TravelTimes,
    from: Node,
    to: Node,
) -> Result<bool, ModelError> {
    if from.id == to.id || (from.is_station() && to.is_station()) {
        return Ok(false);
    }
    let t = travel.get(from.id, to.id)?;
    let service = instance.service_time(from.id).ok_or(ModelError::UnknownNode(from.id))?;
    let battery_ok = instance.energy_fraction(t, service) <= 1.0 + FEAS_TOL;
    let time_ok = t + service <= instance.tbig + FEAS_TOL;
    Ok(battery_ok && time_ok)
}

impl FeasibleNetwork {
    pub fn compute(instance: &Instance, travel: &TravelTimes) -> Result<Self, ModelError> {
        let all_nodes = instance.nodes().map(|(n, _)| n).collect::<Vec<_>>();

        // Stations count as usable if drones start there or can get there.
        let mut reached = instance
            .stations
            .iter()
            .filter(|s| s.id == DEPOT || s.initial_drones > 0)
            .map(|s| s.id)
            .collect::<HashSet<_>>();
        let mut queue = all_nodes
            .iter()
            .filter(|n| reached.contains(&n.id))
            .copied()
            .collect::<VecDeque<_>>();
        while let Some(node) = queue.pop_front() {
            for next in all_nodes.iter() {
                if !reached.contains(&next.id) && leg_is_flyable(instance, travel, node, *next)? {
                    reached.insert(next.id);
                    queue.push_back(*next);
                }
            }
        }

        let locations = instance.locations.iter().map(|l| l.id).collect::<BTreeSet<_>>();
        let mut stations = BTreeSet::new();
        for rs in instance.stations.iter() {
            if reached.contains(&rs.id) {
                stations.insert(rs.id);
            } else {
                debug!("Dropping recharge station {}: not reachable from any drone start", rs.id);
            }
        }

        let mut kept = locations.iter().map(|id| Node::location(*id)).collect::<Vec<_>>();
        kept.extend(stations.iter().map(|id| Node::station(*id)));
        kept.sort();

        let mut arcs = Vec::new();
        for from in kept.iter() {
            for to in kept.iter() {
                if leg_is_flyable(instance, travel, *from, *to)? {
                    arcs.push(ArcIdx::new(from.id, to.id));
                }
            }
        }
        let arc_set = arcs.iter().copied().collect::<HashSet<_>>();

        let mut nearest_station_after = BTreeMap::new();
        let mut nearest_station_before = BTreeMap::new();
        for &loc in locations.iter() {
            let mut after: Option<(OrderedFloat<f64>, NodeId)> = None;
            let mut before: Option<(OrderedFloat<f64>, NodeId)> = None;
            for &rs in stations.iter() {
                if arc_set.contains(&ArcIdx::new(loc, rs)) {
                    let key = (OrderedFloat(travel.get(loc, rs)?), rs);
                    if after.map_or(true, |best| key < best) {
                        after = Some(key);
                    }
                }
                if arc_set.contains(&ArcIdx::new(rs, loc)) {
                    let key = (OrderedFloat(travel.get(rs, loc)?), rs);
                    if before.map_or(true, |best| key < best) {
                        before = Some(key);
                    }
                }
            }

            match after {
                Some((_, rs)) => {
                    nearest_station_after.insert(loc, rs);
                }
                None => warn!("Location {} cannot reach any recharge station", loc),
            }
            match before {
                Some((_, rs)) => {
                    nearest_station_before.insert(loc, rs);
                }
                None => warn!("Location {} cannot be reached from any recharge station", loc),
            }
        }

        info!(
            "Feasible network: {} locations, {} of {} stations, {} arcs",
            locations.len(),
            stations.len(),
            instance.stations.len(),
            arcs.len()
        );

        Ok(FeasibleNetwork {
            locations,
            stations,
            arcs,
            arc_set,
            nearest_station_after,
            nearest_station_before,
        })
    }

    pub fn has_arc(&self, from: NodeId, to: NodeId) -> bool {
        self.arc_set.contains(&ArcIdx::new(from, to))
    }

    pub fn is_location(&self, id: NodeId) -> bool {
        self.locations.contains(&id)
    }

    pub fn is_station(&self, id: NodeId) -> bool {
        self.stations.contains(&id)
    }

    pub fn arcs_from(&self, from: NodeId) -> impl Iterator<Item = &ArcIdx> + '_ {
        self.arcs.iter().filter(move |a| a.from == from)
    }

    pub fn arcs_to(&self, to: NodeId) -> impl Iterator<Item = &ArcIdx> + '_ {
        self.arcs.iter().filter(move |a| a.to == to)
    }
}
