use super::calc::{Subject, SubjectSnapshot};
use super::constraint::Constraint;
use super::event::Event;
use super::opti::{NlpSolution, NlpSolver};
use super::sequence::Sequence;
use super::variable::SolverVariable;
use crate::cosmic::CalcScalar;
use crate::errors::VelaError;
use crate::linalg::DVector;
use std::rc::Rc;

/// The frozen, executable view of a [`Sequence`]: events in topological
/// order, decision variables and constraints flattened into the vectors an
/// NLP solver consumes, and a deep snapshot of every stateful subject taken
/// at construction time.
///
/// A manager is single-threaded by construction (subjects are `Rc` handles);
/// an optimizer parallelizing residual evaluations must build one manager,
/// with its own subjects, per worker thread.
pub struct SequenceManager<T: CalcScalar> {
    sorted_events: Vec<Event<T>>,
    ordered_vars: Vec<Rc<SolverVariable<T>>>,
    ordered_funcs: Vec<Rc<Constraint<T>>>,
    fun_sizes: Vec<usize>,
    var_lower: Vec<f64>,
    var_upper: Vec<f64>,
    var_shift: Vec<f64>,
    var_scale: Vec<f64>,
    var_max_step: Vec<f64>,
    stateful_subjects: Vec<Subject<T>>,
    snapshots: Vec<SubjectSnapshot<T>>,
}

impl<T: CalcScalar> SequenceManager<T> {
    /// Sorts the sequence, orders variables and constraints, discovers the
    /// stateful subjects and snapshots them.
    pub fn new(sequence: &Sequence<T>) -> Result<Self, VelaError> {
        let sorted_events = sequence.topological_sort()?;

        // Variables in first-appearance order, deduplicated by identity: a
        // variable listed on several events is still assigned exactly once
        // per solver iteration.
        let mut ordered_vars: Vec<Rc<SolverVariable<T>>> = Vec::new();
        for event in &sorted_events {
            for var in event.variables() {
                if !ordered_vars.iter().any(|v| Rc::ptr_eq(v, &var)) {
                    ordered_vars.push(var);
                }
            }
        }

        // Constraints in event order, *not* deduplicated: the same constraint
        // on two events is collected twice, once at each event's instant.
        let mut ordered_funcs: Vec<Rc<Constraint<T>>> = Vec::new();
        let mut fun_sizes = Vec::new();
        for event in &sorted_events {
            for constraint in event.constraints() {
                fun_sizes.push(constraint.arity());
                ordered_funcs.push(constraint);
            }
        }

        // Stateful subjects in discovery order: variables first, then
        // constraints event by event.
        let mut stateful_subjects: Vec<Subject<T>> = Vec::new();
        let discover = |subjects: Vec<Subject<T>>, seen: &mut Vec<Subject<T>>| {
            for subject in subjects {
                if subject.is_stateful() && !seen.iter().any(|s| s.same_object(&subject)) {
                    seen.push(subject);
                }
            }
        };
        for var in &ordered_vars {
            discover(var.calc.subjects(), &mut stateful_subjects);
        }
        for event in &sorted_events {
            for constraint in event.constraints() {
                discover(constraint.calc.subjects(), &mut stateful_subjects);
            }
        }

        let snapshots = stateful_subjects
            .iter()
            .map(|s| s.snapshot().expect("stateful subjects always snapshot"))
            .collect();

        let mut var_lower = Vec::new();
        let mut var_upper = Vec::new();
        let mut var_shift = Vec::new();
        let mut var_scale = Vec::new();
        let mut var_max_step = Vec::new();
        for var in &ordered_vars {
            var_lower.extend_from_slice(&var.lower);
            var_upper.extend_from_slice(&var.upper);
            var_shift.extend_from_slice(&var.shift);
            var_scale.extend_from_slice(&var.scale);
            var_max_step.extend_from_slice(&var.max_step);
        }

        info!(
            "sequence manager: {} events, {} variables ({} scalars), {} constraints ({} scalars), {} stateful subjects",
            sorted_events.len(),
            ordered_vars.len(),
            var_lower.len(),
            ordered_funcs.len(),
            fun_sizes.iter().sum::<usize>(),
            stateful_subjects.len()
        );

        Ok(Self {
            sorted_events,
            ordered_vars,
            ordered_funcs,
            fun_sizes,
            var_lower,
            var_upper,
            var_shift,
            var_scale,
            var_max_step,
            stateful_subjects,
            snapshots,
        })
    }

    pub fn sorted_events(&self) -> &[Event<T>] {
        &self.sorted_events
    }

    pub fn ordered_vars(&self) -> &[Rc<SolverVariable<T>>] {
        &self.ordered_vars
    }

    pub fn ordered_funcs(&self) -> &[Rc<Constraint<T>>] {
        &self.ordered_funcs
    }

    pub fn fun_sizes(&self) -> &[usize] {
        &self.fun_sizes
    }

    pub fn stateful_subjects(&self) -> &[Subject<T>] {
        &self.stateful_subjects
    }

    /// Total number of decision variable scalars.
    pub fn num_variables(&self) -> usize {
        self.var_lower.len()
    }

    /// Total number of constraint scalars.
    pub fn num_constraints(&self) -> usize {
        self.fun_sizes.iter().sum()
    }

    pub fn var_lower(&self) -> &[f64] {
        &self.var_lower
    }

    pub fn var_upper(&self) -> &[f64] {
        &self.var_upper
    }

    pub fn var_shift(&self) -> &[f64] {
        &self.var_shift
    }

    pub fn var_scale(&self) -> &[f64] {
        &self.var_scale
    }

    pub fn var_max_step(&self) -> &[f64] {
        &self.var_max_step
    }

    /// Concatenated lower bounds of the constraints, in collection order.
    pub fn fun_lower(&self) -> Vec<f64> {
        self.ordered_funcs
            .iter()
            .flat_map(|c| c.lower.iter().copied())
            .collect()
    }

    /// Concatenated upper bounds of the constraints, in collection order.
    pub fn fun_upper(&self) -> Vec<f64> {
        self.ordered_funcs
            .iter()
            .flat_map(|c| c.upper.iter().copied())
            .collect()
    }

    /// Concatenated scales of the constraints, in collection order.
    pub fn fun_scale(&self) -> Vec<f64> {
        self.ordered_funcs
            .iter()
            .flat_map(|c| c.scale.iter().copied())
            .collect()
    }

    /// Current values of all decision variables, concatenated.
    pub fn variable_values(&self) -> Result<Vec<T>, VelaError> {
        let mut values = Vec::with_capacity(self.num_variables());
        for var in &self.ordered_vars {
            values.extend(var.calc.value()?);
        }
        Ok(values)
    }

    /// Assigns `x` to the decision variables, slicing by each variable's
    /// arity and writing through the calc framework.
    pub fn set_variable_values(&self, x: &[T]) -> Result<(), VelaError> {
        if x.len() != self.num_variables() {
            return Err(VelaError::ArityMismatch {
                expected: self.num_variables(),
                got: x.len(),
            });
        }
        let mut offset = 0;
        for var in &self.ordered_vars {
            let n = var.arity();
            var.calc.set_value(&x[offset..offset + n])?;
            offset += n;
        }
        Ok(())
    }

    /// Initial variable vector for the solver (real parts of the current calc
    /// values).
    pub fn initial_guess(&self) -> Result<DVector<f64>, VelaError> {
        let values = self.variable_values()?;
        Ok(DVector::from_iterator(
            values.len(),
            values.iter().map(CalcScalar::real),
        ))
    }

    /// Restores every stateful subject to its construction-time snapshot, in
    /// place: the handles captured by event effects keep pointing at the
    /// restored objects.
    pub fn reset_stateful(&self) {
        for (subject, snapshot) in self.stateful_subjects.iter().zip(&self.snapshots) {
            subject.restore(snapshot);
        }
    }

    /// The residual the outer optimizer iterates on: reset the subjects,
    /// assign `x`, replay the events in topological order, and collect each
    /// constraint immediately after its owning event has run, so that
    /// mid-trajectory quantities are sampled at the instant they are
    /// meaningful.
    ///
    /// The accumulator element type is `x`'s element type, which is what lets
    /// a dual-valued `x` carry derivatives through the whole replay.
    pub fn solver_fun(&self, f: &mut [T], x: &[T]) -> Result<i32, VelaError> {
        if f.len() != self.num_constraints() {
            return Err(VelaError::ArityMismatch {
                expected: self.num_constraints(),
                got: f.len(),
            });
        }
        self.reset_stateful();
        self.set_variable_values(x)?;
        let mut residuals: Vec<T> = Vec::with_capacity(f.len());
        for event in &self.sorted_events {
            debug!("running event: {}", event.name());
            event.apply_effect()?;
            for constraint in event.constraints() {
                residuals.extend(constraint.calc.value()?);
            }
        }
        f.copy_from_slice(&residuals);
        Ok(0)
    }
}

impl SequenceManager<f64> {
    /// Hands the problem to a solver, then evaluates the residual once more
    /// at the returned solution so the caller gets the final constraint
    /// values alongside it.
    pub fn execute(
        &self,
        solver: &mut dyn NlpSolver,
    ) -> Result<(NlpSolution, DVector<f64>), VelaError> {
        let solution = solver.solve(self)?;
        let mut g = DVector::zeros(self.num_constraints());
        self.solver_fun(g.as_mut_slice(), solution.x.as_slice())?;
        Ok((solution, g))
    }
}
