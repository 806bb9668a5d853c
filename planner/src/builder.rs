use dronerouting_structs::instance::Instance;
use log::{debug, info};

use crate::{
    constraints::{add_constraints, ModelContext},
    distances::TravelTimes,
    error::ModelError,
    feasibility::FeasibleNetwork,
    indices::{stop_indices, StopIdx},
    model::MilpModel,
    objective::set_objective,
    variables::{create_vars, RoutingVars},
};

/// A fully assembled routing model together with the derived data it was
/// built from. Nothing in here changes after [`build_model`] returns.
#[derive(Debug)]
pub struct RoutingModel<'a> {
    instance: &'a Instance,
    travel: TravelTimes,
    network: FeasibleNetwork,
    stops: Vec<StopIdx>,
    vars: RoutingVars,
    milp: MilpModel,
}

impl<'a> RoutingModel<'a> {
    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    pub fn travel(&self) -> &TravelTimes {
        &self.travel
    }

    pub fn network(&self) -> &FeasibleNetwork {
        &self.network
    }

    pub fn stops(&self) -> &[StopIdx] {
        &self.stops
    }

    pub fn vars(&self) -> &RoutingVars {
        &self.vars
    }

    pub fn milp(&self) -> &MilpModel {
        &self.milp
    }
}

/// Runs distances, pruning, index generation, variables, constraints and
/// objective, in that order.
pub fn build_model(instance: &Instance) -> Result<RoutingModel<'_>, ModelError> {
    instance.validate()?;

    let travel = {
        #[cfg(feature = "prof")]
        let _p = hprof::enter("distances");
        TravelTimes::compute(instance)
    };

    let network = {
        #[cfg(feature = "prof")]
        let _p = hprof::enter("feasibility");
        FeasibleNetwork::compute(instance, &travel)?
    };

    let stops = {
        #[cfg(feature = "prof")]
        let _p = hprof::enter("stop indices");
        stop_indices(instance, &travel, &network)?
    };

    let (milp, vars) = create_vars(MilpModel::new(), instance, &network, &stops);

    let milp = {
        #[cfg(feature = "prof")]
        let _p = hprof::enter("constraints");
        let ctx = ModelContext {
            instance,
            travel: &travel,
            network: &network,
            stops: &stops,
            vars: &vars,
        };
        let milp = add_constraints(milp, &ctx)?;
        set_objective(milp, &ctx)?
    };

    info!(
        "Built model for instance {}: {} variables, {} constraints",
        instance.id,
        milp.num_vars(),
        milp.num_constraints()
    );
    for (family, count) in milp.family_counts() {
        debug!("  {:?}: {}", family, count);
    }

    Ok(RoutingModel { instance, travel, network, stops, vars, milp })
}
