//! Constraint families of the arc based drone routing formulation.
//!
//! With `M = tbig` and `Mb = battery_big_m`, `x` arc variables, `z` stop
//! variables, `t` arrival times and `f` arrival state of charge:
//!
//! - degree: every location has one outgoing and one incoming arc,
//! - stop linking: a stop through `s` needs the arcs into and out of `s`,
//! - capacity: departures from a station, minus drones passing through it
//!   after a recharge, are bounded by the drones stationed there; at the
//!   depot all departures are bounded as well,
//! - time: `t[j] >= t[i] + service(i) + travel - M (1 - x)` along arcs and
//!   stops, seeded from zero at stations with drones,
//! - battery: `f[j] <= f[i] - e(i, j) + M' (1 - x)` along arcs with
//!   `M' = max(Mb, 1 + e(i, j))`, and every arc into or out of a station
//!   bounds `f` from that side.

use std::collections::BTreeSet;

use dronerouting_structs::{instance::Instance, NodeId, DEPOT};
use log::trace;

use crate::{
    distances::TravelTimes,
    error::ModelError,
    feasibility::FeasibleNetwork,
    indices::{stop_duration, ArcIdx, StopIdx},
    model::{Constraint, Family, MilpModel, Sense},
    variables::RoutingVars,
};

/// Read-only inputs shared by all constraint families.
pub struct ModelContext<'a> {
    pub instance: &'a Instance,
    pub travel: &'a TravelTimes,
    pub network: &'a FeasibleNetwork,
    pub stops: &'a [StopIdx],
    pub vars: &'a RoutingVars,
}

impl ModelContext<'_> {
    fn service(&self, id: NodeId) -> Result<f64, ModelError> {
        self.instance.service_time(id).ok_or(ModelError::UnknownNode(id))
    }

    /// Battery fraction used by service at `from` and the flight to `to`.
    fn energy(&self, from: NodeId, to: NodeId) -> Result<f64, ModelError> {
        let travel = self.travel.get(from, to)?;
        Ok(self.instance.energy_fraction(travel, self.service(from)?))
    }

    fn between_locations(&self, arc: &ArcIdx) -> bool {
        self.network.is_location(arc.from) && self.network.is_location(arc.to)
    }

    /// Stations a drone may fly to right after serving `loc`.
    pub fn stations_after(&self, loc: NodeId) -> BTreeSet<NodeId> {
        let mut out = self
            .stops
            .iter()
            .filter(|s| s.from == loc)
            .map(|s| s.station)
            .collect::<BTreeSet<_>>();
        out.extend(self.network.nearest_station_after.get(&loc));
        out.extend(
            self.network.arcs_from(loc).filter(|a| self.network.is_station(a.to)).map(|a| a.to),
        );
        out
    }

    /// Stations a drone may come from when arriving at `loc`.
    pub fn stations_before(&self, loc: NodeId) -> BTreeSet<NodeId> {
        let mut out = self
            .stops
            .iter()
            .filter(|s| s.to == loc)
            .map(|s| s.station)
            .collect::<BTreeSet<_>>();
        out.extend(self.network.nearest_station_before.get(&loc));
        out.extend(
            self.network.arcs_to(loc).filter(|a| self.network.is_station(a.from)).map(|a| a.from),
        );
        out
    }
}

pub fn add_constraints(mut milp: MilpModel, ctx: &ModelContext) -> Result<MilpModel, ModelError> {
    degree_rows(&mut milp, ctx)?;
    stop_linking_rows(&mut milp, ctx)?;
    capacity_rows(&mut milp, ctx)?;
    time_rows(&mut milp, ctx)?;
    battery_rows(&mut milp, ctx)?;
    Ok(milp)
}

fn degree_rows(milp: &mut MilpModel, ctx: &ModelContext) -> Result<(), ModelError> {
    for &loc in ctx.network.locations.iter() {
        let mut c = Constraint::new(format!("out_deg_{}", loc), Family::OutDegree, Sense::Eq, 1.0);
        for arc in ctx.network.arcs_from(loc) {
            c = c.term(1.0, ctx.vars.x(*arc)?);
        }
        milp.add_constraint(c);
    }

    for &loc in ctx.network.locations.iter() {
        let mut c = Constraint::new(format!("in_deg_{}", loc), Family::InDegree, Sense::Eq, 1.0);
        for arc in ctx.network.arcs_to(loc) {
            c = c.term(1.0, ctx.vars.x(*arc)?);
        }
        milp.add_constraint(c);
    }
    Ok(())
}

fn stop_linking_rows(milp: &mut MilpModel, ctx: &ModelContext) -> Result<(), ModelError> {
    for &loc in ctx.network.locations.iter() {
        let leaving = ctx.stops.iter().filter(|s| s.from == loc).collect::<Vec<_>>();
        let stations = leaving.iter().map(|s| s.station).collect::<BTreeSet<_>>();
        for rs in stations {
            let name = format!("stop_start_{}_{}", loc, rs);
            let mut c = Constraint::new(name, Family::StopStart, Sense::Ge, 0.0)
                .term(1.0, ctx.vars.x(ArcIdx::new(loc, rs))?);
            for stop in leaving.iter().filter(|s| s.station == rs) {
                c = c.term(-1.0, ctx.vars.z(**stop)?);
            }
            milp.add_constraint(c);
        }
    }

    for &loc in ctx.network.locations.iter() {
        let arriving = ctx.stops.iter().filter(|s| s.to == loc).collect::<Vec<_>>();
        let stations = arriving.iter().map(|s| s.station).collect::<BTreeSet<_>>();
        for rs in stations {
            let name = format!("stop_finish_{}_{}", rs, loc);
            let mut c = Constraint::new(name, Family::StopFinish, Sense::Ge, 0.0)
                .term(1.0, ctx.vars.x(ArcIdx::new(rs, loc))?);
            for stop in arriving.iter().filter(|s| s.station == rs) {
                c = c.term(-1.0, ctx.vars.z(**stop)?);
            }
            milp.add_constraint(c);
        }
    }
    Ok(())
}

fn capacity_rows(milp: &mut MilpModel, ctx: &ModelContext) -> Result<(), ModelError> {
    for &rs in ctx.network.stations.iter() {
        let drones = ctx.instance.initial_drones(rs).ok_or(ModelError::UnknownNode(rs))?;
        let (name, family) = if rs == DEPOT {
            ("depot_cap".to_string(), Family::DepotCapacity)
        } else {
            (format!("station_cap_{}", rs), Family::StationCapacity)
        };
        let mut c = Constraint::new(name, family, Sense::Le, drones as f64);
        for arc in ctx.network.arcs_from(rs) {
            c = c.term(1.0, ctx.vars.x(*arc)?);
        }
        for stop in ctx.stops.iter().filter(|s| s.station == rs) {
            c = c.term(-1.0, ctx.vars.z(*stop)?);
        }
        milp.add_constraint(c);
    }

    // Every departure from the depot, pass-throughs included, uses one of its drones.
    if ctx.network.is_station(DEPOT) {
        let drones = ctx.instance.initial_drones(DEPOT).ok_or(ModelError::UnknownNode(DEPOT))?;
        let name = "depot_dep".to_string();
        let mut c = Constraint::new(name, Family::DepotDepartures, Sense::Le, drones as f64);
        for arc in ctx.network.arcs_from(DEPOT) {
            c = c.term(1.0, ctx.vars.x(*arc)?);
        }
        milp.add_constraint(c);
    }
    Ok(())
}

fn time_rows(milp: &mut MilpModel, ctx: &ModelContext) -> Result<(), ModelError> {
    let big_m = ctx.instance.tbig;

    // Drones stationed at time zero start their routes right away.
    for &rs in ctx.network.stations.iter() {
        if ctx.instance.initial_drones(rs).unwrap_or(0) == 0 {
            continue;
        }
        for arc in ctx.network.arcs_from(rs) {
            let travel = ctx.travel.get(arc.from, arc.to)?;
            let name = format!("seed_time_{}", arc);
            milp.add_constraint(
                Constraint::new(name, Family::StartTime, Sense::Ge, travel - big_m)
                    .term(1.0, ctx.vars.t(arc.to)?)
                    .term(-big_m, ctx.vars.x(*arc)?),
            );
        }
    }

    for arc in ctx.network.arcs.iter().filter(|a| ctx.between_locations(a)) {
        let offset = ctx.travel.get(arc.from, arc.to)? + ctx.service(arc.from)?;
        milp.add_constraint(
            Constraint::new(format!("time_arc_{}", arc), Family::ArcTime, Sense::Ge, offset - big_m)
                .term(1.0, ctx.vars.t(arc.to)?)
                .term(-1.0, ctx.vars.t(arc.from)?)
                .term(-big_m, ctx.vars.x(*arc)?),
        );
    }

    for stop in ctx.stops.iter() {
        let offset = stop_duration(ctx.instance, ctx.travel, stop)?;
        let name = format!("time_stop_{}", stop);
        milp.add_constraint(
            Constraint::new(name, Family::StopTime, Sense::Ge, offset - big_m)
                .term(1.0, ctx.vars.t(stop.to)?)
                .term(-1.0, ctx.vars.t(stop.from)?)
                .term(-big_m, ctx.vars.z(*stop)?),
        );
    }
    Ok(())
}

fn battery_rows(milp: &mut MilpModel, ctx: &ModelContext) -> Result<(), ModelError> {
    let big_m = ctx.instance.battery_big_m;

    for arc in ctx.network.arcs.iter().filter(|a| ctx.between_locations(a)) {
        let used = ctx.energy(arc.from, arc.to)?;
        // f[j] - f[i] ranges up to 1, so an unused arc needs at least 1 + e of slack.
        let m = big_m.max(1.0 + used);
        milp.add_constraint(
            Constraint::new(format!("soc_arc_{}", arc), Family::ArcBattery, Sense::Le, m - used)
                .term(1.0, ctx.vars.f(arc.to)?)
                .term(-1.0, ctx.vars.f(arc.from)?)
                .term(m, ctx.vars.x(*arc)?),
        );
    }

    for &loc in ctx.network.locations.iter() {
        for rs in ctx.stations_after(loc) {
            let used = ctx.energy(loc, rs)?;
            let name = format!("soc_reach_{}_{}", loc, rs);
            milp.add_constraint(
                Constraint::new(name, Family::ReachStation, Sense::Ge, used - big_m)
                    .term(1.0, ctx.vars.f(loc)?)
                    .term(-big_m, ctx.vars.x(ArcIdx::new(loc, rs))?),
            );
        }
    }

    for &loc in ctx.network.locations.iter() {
        for rs in ctx.stations_before(loc) {
            let used = ctx.energy(rs, loc)?;
            let name = format!("soc_from_{}_{}", rs, loc);
            milp.add_constraint(
                Constraint::new(name, Family::FromStation, Sense::Le, 1.0 + big_m - used)
                    .term(1.0, ctx.vars.f(loc)?)
                    .term(big_m, ctx.vars.x(ArcIdx::new(rs, loc))?),
            );
        }
    }

    trace!("Battery rows done, {} rows in model", milp.num_constraints());
    Ok(())
}
