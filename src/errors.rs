use crate::cosmic::StateRepr;
use thiserror::Error;

/// Errors raised by the calc framework, the event sequencer and the solver bridge.
///
/// All of these are user visible: nothing in the crate catches one of these to
/// continue silently. The only internal retry is the conversion bridge, which
/// attempts a representation conversion once without a gravitational parameter
/// and once with it before giving up.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VelaError {
    #[error("value has {got} components but the calc expects {expected}")]
    ArityMismatch { expected: usize, got: usize },
    #[error("calc is not settable: {0}")]
    UnsettableCalc(String),
    #[error("gravitational parameter required to convert {from} into {to}, but none is available")]
    MissingMu { from: StateRepr, to: StateRepr },
    #[error("no conversion defined from {from} into {to}")]
    ConversionUndefined { from: StateRepr, to: StateRepr },
    #[error("event sequence contains a cycle")]
    SequenceCycle,
    #[error("bound vector has {got} components but the arity is {expected}")]
    BoundsLengthMismatch { expected: usize, got: usize },
    #[error("constraint requires a lower bound, an upper bound, or both")]
    NoBoundsSpecified,
    #[error("gravitational parameter of {0} is not defined")]
    UndefinedGravParam(String),
    #[error("math domain error: {0}")]
    MathDomain(String),
    #[error("propagation error: {0}")]
    Propagation(String),
    #[error("correction is ineffective: {0}")]
    CorrectionIneffective(String),
    #[error("maximum number of iterations reached ({0})")]
    MaxIterReached(usize),
    #[error("jacobian is singular: {0}")]
    SingularJacobian(String),
    #[error("problem is underdetermined: no constraint to satisfy")]
    UnderdeterminedProblem,
    #[error("unknown celestial body: {0}")]
    UnknownBody(String),
    #[error("configuration error: {0}")]
    ConfigError(String),
}
