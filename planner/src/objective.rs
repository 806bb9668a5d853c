use crate::{constraints::ModelContext, error::ModelError, model::MilpModel};

/// Total flight time over the selected arcs. Service and recharge time are
/// not part of the cost.
pub fn set_objective(mut milp: MilpModel, ctx: &ModelContext) -> Result<MilpModel, ModelError> {
    let mut terms = Vec::with_capacity(ctx.network.arcs.len());
    for arc in ctx.network.arcs.iter() {
        terms.push((ctx.vars.x(*arc)?, ctx.travel.get(arc.from, arc.to)?));
    }
    milp.set_objective(terms);
    Ok(milp)
}
