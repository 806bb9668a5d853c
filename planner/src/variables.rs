use std::collections::HashMap;

use dronerouting_structs::{instance::Instance, NodeId};
use log::debug;

use crate::{
    error::ModelError,
    feasibility::FeasibleNetwork,
    indices::{ArcIdx, StopIdx},
    model::{MilpModel, VarId, VarKind},
};

/// Decision variables of the routing model, keyed by their index tuples.
#[derive(Debug, Clone, Default)]
pub struct RoutingVars {
    x: HashMap<ArcIdx, VarId>,
    z: HashMap<StopIdx, VarId>,
    t: HashMap<NodeId, VarId>,
    f: HashMap<NodeId, VarId>,
}

impl RoutingVars {
    pub fn x(&self, arc: ArcIdx) -> Result<VarId, ModelError> {
        self.x.get(&arc).copied().ok_or_else(|| ModelError::MissingVariable(format!("x_{}", arc)))
    }

    pub fn z(&self, stop: StopIdx) -> Result<VarId, ModelError> {
        self.z.get(&stop).copied().ok_or_else(|| ModelError::MissingVariable(format!("z_{}", stop)))
    }

    /// Arrival time at a location.
    pub fn t(&self, loc: NodeId) -> Result<VarId, ModelError> {
        self.t.get(&loc).copied().ok_or_else(|| ModelError::MissingVariable(format!("t_{}", loc)))
    }

    /// State of charge on arrival at a location.
    pub fn f(&self, loc: NodeId) -> Result<VarId, ModelError> {
        self.f.get(&loc).copied().ok_or_else(|| ModelError::MissingVariable(format!("f_{}", loc)))
    }

    pub fn num_arcs(&self) -> usize {
        self.x.len()
    }

    pub fn num_stops(&self) -> usize {
        self.z.len()
    }
}

pub fn create_vars(
    mut milp: MilpModel,
    instance: &Instance,
    network: &FeasibleNetwork,
    stops: &[StopIdx],
) -> (MilpModel, RoutingVars) {
    let mut vars = RoutingVars::default();

    for arc in network.arcs.iter() {
        let var = milp.add_var(format!("x_{}", arc), VarKind::Binary, 0.0, 1.0);
        let prev = vars.x.insert(*arc, var);
        assert!(prev.is_none(), "duplicate arc {}", arc);
    }

    for stop in stops.iter() {
        let var = milp.add_var(format!("z_{}", stop), VarKind::Binary, 0.0, 1.0);
        let prev = vars.z.insert(*stop, var);
        assert!(prev.is_none(), "duplicate stop {}", stop);
    }

    for &loc in network.locations.iter() {
        let var = milp.add_var(format!("t_{}", loc), VarKind::Continuous, 0.0, instance.tbig);
        vars.t.insert(loc, var);
        let var = milp.add_var(format!("f_{}", loc), VarKind::Continuous, 0.0, 1.0);
        vars.f.insert(loc, var);
    }

    debug!(
        "Created {} arc, {} stop and {} location variables",
        vars.x.len(),
        vars.z.len(),
        vars.t.len() + vars.f.len()
    );
    (milp, vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{distances::TravelTimes, indices::stop_indices, testutil::line_instance};

    #[test]
    fn one_variable_per_key() {
        let instance = line_instance(10.0, 1);
        let travel = TravelTimes::compute(&instance);
        let network = FeasibleNetwork::compute(&instance, &travel).unwrap();
        let stops = stop_indices(&instance, &travel, &network).unwrap();
        let (milp, vars) = create_vars(MilpModel::new(), &instance, &network, &stops);

        assert_eq!(vars.num_arcs(), 6);
        assert_eq!(vars.num_stops(), 2);
        assert_eq!(milp.num_vars(), 6 + 2 + 2 * 2);

        let x = vars.x(ArcIdx::new(2, 3)).unwrap();
        assert_eq!(milp.var(x).name, "x_2_3");
        assert_eq!(milp.var(x).kind, VarKind::Binary);
        let t = vars.t(3).unwrap();
        assert_eq!((milp.var(t).lb, milp.var(t).ub), (0.0, 100.0));
        let f = vars.f(2).unwrap();
        assert_eq!((milp.var(f).lb, milp.var(f).ub), (0.0, 1.0));
        assert_eq!(milp.var(vars.z(StopIdx::new(3, 2, 1)).unwrap()).name, "z_3_2_1");
    }

    #[test]
    fn missing_key_is_an_error() {
        let vars = RoutingVars::default();
        match vars.x(ArcIdx::new(4, 5)) {
            Err(ModelError::MissingVariable(key)) => assert_eq!(key, "x_4_5"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(vars.z(StopIdx::new(1, 2, 3)).is_err());
        assert!(vars.t(1).is_err());
        assert!(vars.f(1).is_err());
    }
}
