use super::manager::SequenceManager;
use crate::errors::VelaError;
use crate::linalg::DVector;

/// Differential correction using finite differencing.
pub mod newton;
pub use self::newton::FiniteDiffNewton;

/// What a solver hands back: the solution vector, an objective value (zero
/// for pure feasibility problems), and how it got there.
#[derive(Clone, Debug)]
pub struct NlpSolution {
    pub x: DVector<f64>,
    pub objective: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// The outbound seam to an optimizer. The manager provides the initial
/// guess, the variable and constraint bounds, and the residual; anything
/// implementing this trait may drive them.
pub trait NlpSolver {
    fn solve(&mut self, sm: &SequenceManager<f64>) -> Result<NlpSolution, VelaError>;
}
