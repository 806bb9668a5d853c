use std::collections::BTreeMap;

/// Column handle into a [`MilpModel`].
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct VarId(pub u32);

impl VarId {
    pub fn idx(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VarKind {
    Binary,
    Continuous,
}

#[derive(Clone, Debug)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
    pub lb: f64,
    pub ub: f64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl Sense {
    pub fn lp_symbol(&self) -> &'static str {
        match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "=",
        }
    }

    /// Does `lhs (sense) rhs` hold within `tol`?
    pub fn holds(&self, lhs: f64, rhs: f64, tol: f64) -> bool {
        match self {
            Sense::Le => lhs <= rhs + tol,
            Sense::Ge => lhs >= rhs - tol,
            Sense::Eq => (lhs - rhs).abs() <= tol,
        }
    }
}

/// Constraint families of the routing formulation.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Family {
    OutDegree,
    InDegree,
    StopStart,
    StopFinish,
    StationCapacity,
    DepotCapacity,
    DepotDepartures,
    StartTime,
    ArcTime,
    StopTime,
    ArcBattery,
    ReachStation,
    FromStation,
}

#[derive(Clone, Debug)]
pub struct Constraint {
    pub name: String,
    pub family: Family,
    pub idxs: Vec<VarId>,
    pub coeffs: Vec<f64>,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    pub fn new(name: String, family: Family, sense: Sense, rhs: f64) -> Self {
        Constraint { name, family, idxs: Vec::new(), coeffs: Vec::new(), sense, rhs }
    }

    pub fn term(mut self, coeff: f64, var: VarId) -> Self {
        self.idxs.push(var);
        self.coeffs.push(coeff);
        self
    }

    pub fn terms(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.idxs.iter().copied().zip(self.coeffs.iter().copied())
    }

    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms().map(|(v, c)| c * values[v.idx()]).sum()
    }

    /// The range the left-hand side can take given the variable bounds.
    fn activity_range(&self, vars: &[Variable]) -> (f64, f64) {
        let mut lo = 0.0;
        let mut hi = 0.0;
        for (v, c) in self.terms() {
            let var = &vars[v.idx()];
            if c >= 0.0 {
                lo += c * var.lb;
                hi += c * var.ub;
            } else {
                lo += c * var.ub;
                hi += c * var.lb;
            }
        }
        (lo, hi)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Violation {
    Bounds { var: String, value: f64 },
    Integrality { var: String, value: f64 },
    Row { name: String, family: Family, lhs: f64, rhs: f64 },
}

/// A mixed-integer linear program, independent of any solver backend.
/// Minimization only.
#[derive(Clone, Debug, Default)]
pub struct MilpModel {
    vars: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Vec<(VarId, f64)>,
}

impl MilpModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_var(&mut self, name: String, kind: VarKind, lb: f64, ub: f64) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(Variable { name, kind, lb, ub });
        id
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        assert!(constraint.idxs.len() == constraint.coeffs.len());
        self.constraints.push(constraint);
    }

    pub fn set_objective(&mut self, terms: Vec<(VarId, f64)>) {
        self.objective = terms;
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    pub fn var(&self, id: VarId) -> &Variable {
        &self.vars[id.idx()]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &[(VarId, f64)] {
        &self.objective
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn family_counts(&self) -> BTreeMap<Family, usize> {
        let mut counts = BTreeMap::new();
        for c in self.constraints.iter() {
            *counts.entry(c.family).or_insert(0) += 1;
        }
        counts
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.iter().map(|(v, c)| c * values[v.idx()]).sum()
    }

    /// Everything `values` violates: bounds, integrality and rows.
    pub fn violations(&self, values: &[f64], tol: f64) -> Vec<Violation> {
        assert!(values.len() == self.vars.len());
        let mut out = Vec::new();
        for (var, &value) in self.vars.iter().zip(values.iter()) {
            if value < var.lb - tol || value > var.ub + tol {
                out.push(Violation::Bounds { var: var.name.clone(), value });
            }
            if var.kind == VarKind::Binary && (value - value.round()).abs() > tol {
                out.push(Violation::Integrality { var: var.name.clone(), value });
            }
        }
        for c in self.constraints.iter() {
            let lhs = c.lhs(values);
            if !c.sense.holds(lhs, c.rhs, tol) {
                let name = c.name.clone();
                out.push(Violation::Row { name, family: c.family, lhs, rhs: c.rhs });
            }
        }
        out
    }

    /// Rows that no assignment within the variable bounds can satisfy, such
    /// as a degree row without any arc. Used to point at the cause of an
    /// infeasible model.
    pub fn unsatisfiable_rows(&self, tol: f64) -> Vec<&Constraint> {
        self.constraints
            .iter()
            .filter(|c| {
                let (lo, hi) = c.activity_range(&self.vars);
                match c.sense {
                    Sense::Le => lo > c.rhs + tol,
                    Sense::Ge => hi < c.rhs - tol,
                    Sense::Eq => lo > c.rhs + tol || hi < c.rhs - tol,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knapsack() -> (MilpModel, VarId, VarId) {
        let mut m = MilpModel::new();
        let a = m.add_var("a".to_string(), VarKind::Binary, 0.0, 1.0);
        let b = m.add_var("b".to_string(), VarKind::Continuous, 0.0, 4.0);
        m.add_constraint(
            Constraint::new("cap".to_string(), Family::StationCapacity, Sense::Le, 3.0)
                .term(2.0, a)
                .term(1.0, b),
        );
        m.set_objective(vec![(a, -5.0), (b, -1.0)]);
        (m, a, b)
    }

    #[test]
    fn check_assignment() {
        let (m, _, _) = knapsack();
        assert!(m.violations(&[1.0, 1.0], 1e-6).is_empty());
        assert_eq!(m.objective_value(&[1.0, 1.0]), -6.0);

        let v = m.violations(&[1.0, 2.0], 1e-6);
        assert_eq!(
            v,
            vec![Violation::Row {
                name: "cap".to_string(),
                family: Family::StationCapacity,
                lhs: 4.0,
                rhs: 3.0
            }]
        );

        let v = m.violations(&[0.5, 5.0], 1e-6);
        assert_eq!(v.len(), 3);
        assert!(matches!(v[0], Violation::Integrality { .. }));
        assert!(matches!(v[1], Violation::Bounds { .. }));
        assert!(matches!(v[2], Violation::Row { .. }));
    }

    #[test]
    fn unsatisfiable_rows() {
        let (mut m, a, b) = knapsack();
        assert!(m.unsatisfiable_rows(1e-9).is_empty());
        m.add_constraint(Constraint::new("empty".to_string(), Family::OutDegree, Sense::Eq, 1.0));
        m.add_constraint(
            Constraint::new("big".to_string(), Family::ArcTime, Sense::Ge, 7.0)
                .term(1.0, a)
                .term(1.0, b),
        );
        m.add_constraint(
            Constraint::new("ok".to_string(), Family::ArcTime, Sense::Ge, 5.0)
                .term(1.0, a)
                .term(1.0, b),
        );
        let names = m.unsatisfiable_rows(1e-9).iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["empty", "big"]);
        assert_eq!(m.family_counts()[&Family::ArcTime], 2);
    }
}
