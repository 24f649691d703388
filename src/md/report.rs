use super::calc::{Calc, ManeuverVar};
use super::manager::SequenceManager;
use super::opti::NlpSolution;
use crate::cosmic::CalcScalar;
use crate::linalg::DVector;
use std::fmt;
use std::rc::Rc;

/// Writes the sequence report: per event, the variables it owns and the
/// constraints it imposes with their per-component bounds, then the stateful
/// subjects of the whole plan.
pub fn write_sequence_report<T: CalcScalar, W: fmt::Write>(
    sm: &SequenceManager<T>,
    out: &mut W,
) -> fmt::Result {
    writeln!(
        out,
        "Mission sequence: {} events, {} variables ({} scalars), {} constraints ({} scalars)",
        sm.sorted_events().len(),
        sm.ordered_vars().len(),
        sm.num_variables(),
        sm.ordered_funcs().len(),
        sm.num_constraints()
    )?;
    for (position, event) in sm.sorted_events().iter().enumerate() {
        writeln!(out, "[{}] {}", position + 1, event.name())?;
        for var in event.variables() {
            writeln!(out, "\tvar  {var}")?;
        }
        for constraint in event.constraints() {
            writeln!(out, "\tcon  {constraint}")?;
        }
    }
    write!(out, "Stateful subjects:")?;
    for subject in sm.stateful_subjects() {
        write!(out, " {} ({})", subject.name(), subject.kind())?;
    }
    writeln!(out)
}

impl<T: CalcScalar> fmt::Display for SequenceManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_sequence_report(self, f)
    }
}

/// The flattened view of a solved plan: the solution vector sliced back onto
/// each variable, the final constraint values against their bounds, and the
/// total delta-v of all maneuver variables.
pub struct SolutionReport {
    pub converged: bool,
    pub iterations: usize,
    pub variables: Vec<(String, Vec<f64>)>,
    pub constraints: Vec<(String, Vec<f64>, Vec<f64>, Vec<f64>)>,
    pub total_dv_km_s: f64,
}

impl SolutionReport {
    /// Slices `solution.x` by the manager's variable arities and `g` by its
    /// constraint sizes, pairing each chunk with its owner.
    pub fn new(sm: &SequenceManager<f64>, solution: &NlpSolution, g: &DVector<f64>) -> Self {
        let mut variables = Vec::with_capacity(sm.ordered_vars().len());
        let mut total_dv_km_s = 0.0;
        let mut offset = 0;
        for var in sm.ordered_vars() {
            let chunk: Vec<f64> = solution.x.as_slice()[offset..offset + var.arity()].to_vec();
            if let Calc::Maneuver(mc) = &var.calc {
                if mc.tag == ManeuverVar::DeltaVVector {
                    total_dv_km_s += chunk.iter().map(|c| c * c).sum::<f64>().sqrt();
                }
            }
            variables.push((var.name.clone(), chunk));
            offset += var.arity();
        }

        let mut constraints = Vec::with_capacity(sm.ordered_funcs().len());
        let mut g_offset = 0;
        for (constraint, size) in sm
            .ordered_funcs()
            .iter()
            .map(Rc::as_ref)
            .zip(sm.fun_sizes().iter().copied())
        {
            constraints.push((
                constraint.name.clone(),
                g.as_slice()[g_offset..g_offset + size].to_vec(),
                constraint.lower.clone(),
                constraint.upper.clone(),
            ));
            g_offset += size;
        }

        Self {
            converged: solution.converged,
            iterations: solution.iterations,
            variables,
            constraints,
            total_dv_km_s,
        }
    }
}

impl fmt::Display for SolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Solution: {} after {} iterations",
            if self.converged {
                "converged"
            } else {
                "NOT converged"
            },
            self.iterations
        )?;
        for (name, values) in &self.variables {
            write!(f, "\t{name} =")?;
            for v in values {
                write!(f, " {v:.6}")?;
            }
            writeln!(f)?;
        }
        for (name, values, lower, upper) in &self.constraints {
            write!(f, "\t{name}:")?;
            for i in 0..values.len() {
                write!(f, " {:.6} in [{}, {}]", values[i], lower[i], upper[i])?;
            }
            writeln!(f)?;
        }
        writeln!(f, "\ttotal dv = {:.6} km/s", self.total_dv_km_s)
    }
}
