//! Analytic two-body propagation, the workhorse of propagation event effects.
//!
//! These helpers advance a spacecraft along its osculating conic by solving
//! Kepler's equation, and write the result back in whichever representation
//! the state was stored in. They are restricted to elliptical motion; event
//! effects wanting higher fidelity dynamics are free to mutate the spacecraft
//! through any external integrator instead.

use crate::cosmic::state::{deg_to_rad, rad_to_deg, wrap_two_pi};
use crate::cosmic::{convert, CalcScalar, Spacecraft, StateRepr};
use crate::errors::VelaError;
use hifitime::{Duration, Unit};
use std::f64::consts::PI;

/// Convergence tolerance on the eccentric anomaly, in radians.
const KEPLER_TOL: f64 = 1e-12;
const KEPLER_MAX_ITER: usize = 50;

fn true_to_mean<T: CalcScalar>(ta: T, ecc: T) -> T {
    let beta = (T::one() - ecc * ecc).sqrt();
    let ecc_anomaly = (beta * ta.sin()).atan2(ecc + ta.cos());
    wrap_two_pi(ecc_anomaly - ecc * ecc_anomaly.sin())
}

fn mean_to_true<T: CalcScalar>(mean: T, ecc: T) -> Result<T, VelaError> {
    // Newton's method on Kepler's equation.
    let mut ecc_anomaly = if ecc.real() > 0.8 {
        T::from_f64(PI)
    } else {
        mean
    };
    let mut converged = false;
    for _ in 0..KEPLER_MAX_ITER {
        let f = ecc_anomaly - ecc * ecc_anomaly.sin() - mean;
        let fp = T::one() - ecc * ecc_anomaly.cos();
        let delta = f / fp;
        ecc_anomaly = ecc_anomaly - delta;
        if delta.abs().real() < KEPLER_TOL {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(VelaError::Propagation(format!(
            "Kepler's equation did not converge in {KEPLER_MAX_ITER} iterations (e = {})",
            ecc.real()
        )));
    }
    let beta = (T::one() - ecc * ecc).sqrt();
    Ok(wrap_two_pi(
        (beta * ecc_anomaly.sin()).atan2(ecc_anomaly.cos() - ecc),
    ))
}

/// Osculating Keplerian elements plus the mean motion, the shared preamble of
/// every propagation helper.
fn osculating<T: CalcScalar>(sc: &Spacecraft<T>) -> Result<(crate::cosmic::OrbitState<T>, T, T), VelaError> {
    let mu = sc.origin_mu().ok_or_else(|| {
        VelaError::Propagation(format!(
            "two-body propagation of {} requires a gravitational parameter on {}",
            sc.name,
            sc.coord.origin.borrow().name
        ))
    })?;
    let kep = convert(&sc.state, StateRepr::Keplerian, Some(mu))?;
    let sma = kep.elements[0];
    let ecc = kep.elements[1];
    if sma.real() <= 0.0 || ecc.real() >= 1.0 {
        return Err(VelaError::Propagation(format!(
            "two-body propagation requires an elliptical orbit, got sma = {:.3} km, ecc = {:.6}",
            sma.real(),
            ecc.real()
        )));
    }
    let mean_motion = (mu / (sma * sma * sma)).sqrt();
    Ok((kep, mu, mean_motion))
}

fn write_back<T: CalcScalar>(
    sc: &mut Spacecraft<T>,
    kep: crate::cosmic::OrbitState<T>,
    mu: T,
    elapsed: Duration,
) -> Result<(), VelaError> {
    sc.state = convert(&kep, sc.state.repr, Some(mu))?;
    sc.epoch += elapsed;
    sc.log_state();
    Ok(())
}

/// Advances the spacecraft along its osculating conic for the given duration.
pub fn propagate_for<T: CalcScalar>(
    sc: &mut Spacecraft<T>,
    duration: Duration,
) -> Result<(), VelaError> {
    let (mut kep, mu, mean_motion) = osculating(sc)?;
    let ecc = kep.elements[1];
    let mean0 = true_to_mean(deg_to_rad(kep.elements[5]), ecc);
    let mean1 = wrap_two_pi(mean0 + mean_motion * T::from_f64(duration.to_seconds()));
    kep.elements[5] = rad_to_deg(mean_to_true(mean1, ecc)?);
    write_back(sc, kep, mu, duration)
}

/// Coasts to the next apoapsis passage. A spacecraft already at apoapsis
/// (within the anomaly tolerance) stays where it is.
pub fn propagate_to_apoapsis<T: CalcScalar>(sc: &mut Spacecraft<T>) -> Result<(), VelaError> {
    propagate_to_mean_anomaly(sc, PI, 180.0)
}

/// Coasts to the next periapsis passage.
pub fn propagate_to_periapsis<T: CalcScalar>(sc: &mut Spacecraft<T>) -> Result<(), VelaError> {
    propagate_to_mean_anomaly(sc, 0.0, 0.0)
}

fn propagate_to_mean_anomaly<T: CalcScalar>(
    sc: &mut Spacecraft<T>,
    mean_target_rad: f64,
    ta_target_deg: f64,
) -> Result<(), VelaError> {
    let (mut kep, mu, mean_motion) = osculating(sc)?;
    let ecc = kep.elements[1];
    let mean0 = true_to_mean(deg_to_rad(kep.elements[5]), ecc);
    let delta_mean = wrap_two_pi(T::from_f64(mean_target_rad) - mean0);
    let elapsed_s = (delta_mean / mean_motion).real();
    // The apsis anomaly is exact by construction; only the epoch carries the
    // transfer time.
    kep.elements[5] = T::from_f64(ta_target_deg);
    write_back(sc, kep, mu, elapsed_s * Unit::Second)
}
