use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::model::{MilpModel, VarId, VarKind};

/// Writes `milp` in CPLEX LP format. Output depends only on the model, so
/// two identical models give identical files.
pub fn write_lp<W: Write>(milp: &MilpModel, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "\\ drone routing model")?;
    writeln!(out, "Minimize")?;
    write!(out, " obj:")?;
    write_terms(out, milp, milp.objective().iter().copied())?;
    writeln!(out)?;

    writeln!(out, "Subject To")?;
    for c in milp.constraints() {
        if c.idxs.is_empty() {
            // LP files need at least one term per row.
            let Some(first) = milp.vars().first() else { continue };
            write!(out, " {}: 0 {}", c.name, first.name)?;
        } else {
            write!(out, " {}:", c.name)?;
            write_terms(out, milp, c.terms())?;
        }
        writeln!(out, " {} {}", c.sense.lp_symbol(), c.rhs)?;
    }

    writeln!(out, "Bounds")?;
    for var in milp.vars().iter().filter(|v| v.kind == VarKind::Continuous) {
        writeln!(out, " {} <= {} <= {}", var.lb, var.name, var.ub)?;
    }

    writeln!(out, "Binaries")?;
    for var in milp.vars().iter().filter(|v| v.kind == VarKind::Binary) {
        writeln!(out, " {}", var.name)?;
    }
    writeln!(out, "End")?;
    Ok(())
}

fn write_terms<W: Write>(
    out: &mut W,
    milp: &MilpModel,
    terms: impl Iterator<Item = (VarId, f64)>,
) -> std::io::Result<()> {
    for (var, coeff) in terms {
        let sign = if coeff < 0.0 { '-' } else { '+' };
        write!(out, " {} {} {}", sign, coeff.abs(), milp.var(var).name)?;
    }
    Ok(())
}

pub fn to_lp_string(milp: &MilpModel) -> String {
    let mut buf = Vec::new();
    write_lp(milp, &mut buf).expect("writing to a Vec cannot fail");
    String::from_utf8(buf).expect("LP output is ASCII")
}

pub fn write_lp_file(milp: &MilpModel, path: impl AsRef<Path>) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_lp(milp, &mut out)?;
    out.flush()
}
