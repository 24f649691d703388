//! The import one-liner for mission design scripts and tests.

pub use super::calc::{BodyVar, Calc, ManeuverVar, OrbitVar, Subject};
pub use super::constraint::Constraint;
pub use super::event::{Effect, Event};
pub use super::manager::SequenceManager;
pub use super::opti::{FiniteDiffNewton, NlpSolution, NlpSolver};
pub use super::report::{write_sequence_report, SolutionReport};
pub use super::sequence::Sequence;
pub use super::variable::SolverVariable;
pub use crate::cosmic::{
    convert, CalcScalar, CelestialBody, CoordSystem, OrbitState, Spacecraft, StateRepr,
};
pub use crate::dynamics::{apply_impulse, ImpulsiveMnvr, LocalFrame};
pub use crate::errors::VelaError;
pub use crate::propagators::{propagate_for, propagate_to_apoapsis, propagate_to_periapsis};
pub use hifitime::{Duration, Epoch, Unit};
