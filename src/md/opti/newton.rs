use super::{NlpSolution, NlpSolver};
use crate::errors::VelaError;
use crate::linalg::{DMatrix, DVector};
use crate::md::manager::SequenceManager;
use crate::utils::pseudo_inverse;
use std::time::Instant;

/// A Newton-Raphson differential corrector over the sequence residual, with a
/// finite-difference Jacobian and a pseudo-inverse for non-square problems.
///
/// Convergence is reached when every constraint value, scaled by the
/// constraint's scale, is within `tolerance` of its bounds. Per-iteration
/// corrections are clamped to each variable's `max_step`, and the iterate is
/// kept inside the variable bounds throughout.
#[derive(Clone, Debug)]
pub struct FiniteDiffNewton {
    /// Maximum number of Newton iterations.
    pub iterations: usize,
    /// Tolerance on the scaled constraint violation.
    pub tolerance: f64,
    /// Absolute perturbation used for the finite-difference Jacobian columns.
    pub perturbation: f64,
}

impl Default for FiniteDiffNewton {
    fn default() -> Self {
        Self {
            iterations: 50,
            tolerance: 1e-3,
            perturbation: 1e-5,
        }
    }
}

impl NlpSolver for FiniteDiffNewton {
    #[allow(clippy::needless_range_loop)]
    fn solve(&mut self, sm: &SequenceManager<f64>) -> Result<NlpSolution, VelaError> {
        let num_vars = sm.num_variables();
        let num_cons = sm.num_constraints();
        if num_cons == 0 {
            return Err(VelaError::UnderdeterminedProblem);
        }

        let lx = sm.var_lower();
        let ux = sm.var_upper();
        let lg = sm.fun_lower();
        let ug = sm.fun_upper();
        let scale = sm.fun_scale();
        let max_step = sm.var_max_step();

        // Clamp the initial guess into the variable bounds.
        let mut x = sm.initial_guess()?;
        for j in 0..num_vars {
            x[j] = x[j].clamp(lx[j], ux[j]);
        }

        let mut g = vec![0.0; num_cons];
        let mut g_pert = vec![0.0; num_cons];
        let mut prev_err_norm = f64::INFINITY;
        let start_instant = Instant::now();

        for it in 0..=self.iterations {
            sm.solver_fun(&mut g, x.as_slice())?;

            // Distance from each constraint value to its nearest violated
            // bound; zero when already feasible.
            let mut err = DVector::from_element(num_cons, 0.0);
            let mut converged = true;
            for i in 0..num_cons {
                if g[i] < lg[i] {
                    err[i] = lg[i] - g[i];
                } else if g[i] > ug[i] {
                    err[i] = ug[i] - g[i];
                }
                if (err[i] * scale[i]).abs() > self.tolerance {
                    converged = false;
                }
            }

            if converged {
                info!(
                    "corrector converged in {} iterations ({:?})",
                    it,
                    Instant::now() - start_instant
                );
                return Ok(NlpSolution {
                    x,
                    objective: 0.0,
                    iterations: it,
                    converged: true,
                });
            }

            if (err.norm() - prev_err_norm).abs() < 1e-12 {
                return Err(VelaError::CorrectionIneffective(
                    "no change in constraint errors".to_string(),
                ));
            }
            prev_err_norm = err.norm();
            info!(
                "corrector iteration #{} -- error norm {:.6e}",
                it,
                err.norm()
            );

            // Finite-difference Jacobian, one residual evaluation per column.
            let mut jac = DMatrix::from_element(num_cons, num_vars, 0.0);
            for j in 0..num_vars {
                let mut x_pert = x.clone();
                x_pert[j] += self.perturbation;
                sm.solver_fun(&mut g_pert, x_pert.as_slice())?;
                for i in 0..num_cons {
                    jac[(i, j)] = (g_pert[i] - g[i]) / self.perturbation;
                }
            }
            debug!("jacobian {}", jac);

            let jac_inv = pseudo_inverse(&jac)?;
            let mut delta = jac_inv * &err;
            for j in 0..num_vars {
                if delta[j].abs() > max_step[j] {
                    delta[j] = max_step[j] * delta[j].signum();
                }
                debug!("correction (element {}): {:e}", j, delta[j]);
            }

            x += &delta;
            for j in 0..num_vars {
                x[j] = x[j].clamp(lx[j], ux[j]);
            }
        }

        Err(VelaError::MaxIterReached(self.iterations))
    }
}
