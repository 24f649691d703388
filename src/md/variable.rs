use super::calc::Calc;
use crate::cosmic::CalcScalar;
use crate::errors::VelaError;
use std::fmt;
use std::rc::Rc;

/// A decision variable of the outer optimizer: a settable calc plus
/// per-component lower/upper bounds, shift, scale and a maximum per-iteration
/// step for differential correctors.
///
/// All per-component vectors have exactly `arity()` entries. Variables are
/// shared between events through `Rc`, and the sequence manager deduplicates
/// them by that identity.
pub struct SolverVariable<T: CalcScalar> {
    pub name: String,
    pub calc: Calc<T>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub shift: Vec<f64>,
    pub scale: Vec<f64>,
    pub max_step: Vec<f64>,
}

impl<T: CalcScalar> SolverVariable<T> {
    /// Builds a variable over a settable calc. Bounds default to unbounded,
    /// shift to zero, scale to one and max_step to unbounded.
    pub fn new(name: &str, calc: Calc<T>) -> Result<Self, VelaError> {
        if !calc.is_settable() {
            error!("cannot build a solver variable over a read-only calc: {calc}");
            return Err(VelaError::UnsettableCalc(calc.to_string()));
        }
        let n = calc.arity();
        Ok(Self {
            name: name.to_string(),
            calc,
            lower: vec![f64::NEG_INFINITY; n],
            upper: vec![f64::INFINITY; n],
            shift: vec![0.0; n],
            scale: vec![1.0; n],
            max_step: vec![f64::INFINITY; n],
        })
    }

    pub fn arity(&self) -> usize {
        self.calc.arity()
    }

    pub fn with_bounds(mut self, lower: &[f64], upper: &[f64]) -> Result<Self, VelaError> {
        check_len(self.arity(), lower)?;
        check_len(self.arity(), upper)?;
        self.lower = lower.to_vec();
        self.upper = upper.to_vec();
        Ok(self)
    }

    pub fn with_shift(mut self, shift: &[f64]) -> Result<Self, VelaError> {
        check_len(self.arity(), shift)?;
        self.shift = shift.to_vec();
        Ok(self)
    }

    pub fn with_scale(mut self, scale: &[f64]) -> Result<Self, VelaError> {
        check_len(self.arity(), scale)?;
        self.scale = scale.to_vec();
        Ok(self)
    }

    /// Caps the per-iteration correction of differential correctors, applied
    /// to every component.
    pub fn with_max_step(mut self, max_step: f64) -> Result<Self, VelaError> {
        self.max_step = vec![max_step.abs(); self.arity()];
        Ok(self)
    }

    pub fn into_shared(self) -> Rc<Self> {
        Rc::new(self)
    }
}

fn check_len(expected: usize, values: &[f64]) -> Result<(), VelaError> {
    if values.len() != expected {
        return Err(VelaError::BoundsLengthMismatch {
            expected,
            got: values.len(),
        });
    }
    Ok(())
}

impl<T: CalcScalar> fmt::Display for SolverVariable<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.calc)?;
        for i in 0..self.arity() {
            write!(f, " [{}, {}]", self.lower[i], self.upper[i])?;
        }
        Ok(())
    }
}

impl<T: CalcScalar> fmt::Debug for SolverVariable<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
