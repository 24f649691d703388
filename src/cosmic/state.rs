use super::CalcScalar;
use crate::errors::VelaError;
use crate::linalg::{Vector3, Vector6};
use crate::utils::{cross, dot, norm};
use serde_derive::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Below this, eccentricities are treated as circular, inclinations as
/// equatorial, and angular momenta as rectilinear.
pub const DEGENERACY_TOL: f64 = 1e-11;

/// The parameterizations an orbital state may be stored or requested in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateRepr {
    Cartesian,
    Keplerian,
    ModifiedEquinoctial,
    Spherical,
}

impl fmt::Display for StateRepr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Cartesian => write!(f, "Cartesian"),
            Self::Keplerian => write!(f, "Keplerian"),
            Self::ModifiedEquinoctial => write!(f, "ModifiedEquinoctial"),
            Self::Spherical => write!(f, "Spherical"),
        }
    }
}

/// A six component orbital state tagged with its representation.
///
/// Component meaning by representation:
///
/// - `Cartesian`: x, y, z in km, then vx, vy, vz in km/s;
/// - `Keplerian`: sma km, ecc, inc deg, raan deg, aop deg, true anomaly deg;
/// - `ModifiedEquinoctial`: p km, f, g, h, k, true longitude L deg;
/// - `Spherical`: rmag km, right ascension deg, declination deg, vmag km/s,
///   azimuth deg, vertical flight path angle deg.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrbitState<T: CalcScalar> {
    pub repr: StateRepr,
    pub elements: Vector6<T>,
}

impl<T: CalcScalar> OrbitState<T> {
    pub fn new(repr: StateRepr, elements: Vector6<T>) -> Self {
        Self { repr, elements }
    }

    pub fn cartesian(x: T, y: T, z: T, vx: T, vy: T, vz: T) -> Self {
        Self::new(StateRepr::Cartesian, Vector6::new(x, y, z, vx, vy, vz))
    }

    pub fn keplerian(sma: T, ecc: T, inc: T, raan: T, aop: T, ta: T) -> Self {
        Self::new(StateRepr::Keplerian, Vector6::new(sma, ecc, inc, raan, aop, ta))
    }

    /// Position components; only meaningful for a Cartesian state.
    pub(crate) fn radius(&self) -> Vector3<T> {
        Vector3::new(self.elements[0], self.elements[1], self.elements[2])
    }

    /// Velocity components; only meaningful for a Cartesian state.
    pub(crate) fn velocity(&self) -> Vector3<T> {
        Vector3::new(self.elements[3], self.elements[4], self.elements[5])
    }
}

impl<T: CalcScalar> fmt::Display for OrbitState<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}", self.repr)?;
        for i in 0..6 {
            write!(f, " {:.6}", self.elements[i].real())?;
        }
        write!(f, "]")
    }
}

/// Converts `state` into the `to` representation.
///
/// Keplerian <-> ModifiedEquinoctial and Cartesian <-> Spherical convert
/// directly and never need a gravitational parameter. Every other pair routes
/// through Cartesian, and the legs touching Keplerian elements require `mu`:
/// when it is `None`, the conversion fails with [`VelaError::MissingMu`] naming
/// the requested source and target representations.
pub fn convert<T: CalcScalar>(
    state: &OrbitState<T>,
    to: StateRepr,
    mu: Option<T>,
) -> Result<OrbitState<T>, VelaError> {
    use StateRepr::*;
    if state.repr == to {
        return Ok(*state);
    }
    match (state.repr, to) {
        (Keplerian, ModifiedEquinoctial) => keplerian_to_equinoctial(state),
        (ModifiedEquinoctial, Keplerian) => equinoctial_to_keplerian(state),
        (Cartesian, Spherical) => cartesian_to_spherical(state),
        (Spherical, Cartesian) => spherical_to_cartesian(state),
        _ => {
            let cart = into_cartesian(state, mu).map_err(|e| remap_mu(e, state.repr, to))?;
            if to == Cartesian {
                Ok(cart)
            } else {
                from_cartesian(&cart, to, mu).map_err(|e| remap_mu(e, state.repr, to))
            }
        }
    }
}

/// Rewrites an inner-leg MissingMu so the message names the user-requested pair.
fn remap_mu(err: VelaError, from: StateRepr, to: StateRepr) -> VelaError {
    match err {
        VelaError::MissingMu { .. } => VelaError::MissingMu { from, to },
        other => other,
    }
}

fn into_cartesian<T: CalcScalar>(
    state: &OrbitState<T>,
    mu: Option<T>,
) -> Result<OrbitState<T>, VelaError> {
    match state.repr {
        StateRepr::Cartesian => Ok(*state),
        StateRepr::Spherical => spherical_to_cartesian(state),
        StateRepr::Keplerian => {
            let mu = mu.ok_or(VelaError::MissingMu {
                from: StateRepr::Keplerian,
                to: StateRepr::Cartesian,
            })?;
            keplerian_to_cartesian(state, mu)
        }
        StateRepr::ModifiedEquinoctial => {
            let mu = mu.ok_or(VelaError::MissingMu {
                from: StateRepr::ModifiedEquinoctial,
                to: StateRepr::Cartesian,
            })?;
            let kep = equinoctial_to_keplerian(state)?;
            keplerian_to_cartesian(&kep, mu)
        }
    }
}

fn from_cartesian<T: CalcScalar>(
    cart: &OrbitState<T>,
    to: StateRepr,
    mu: Option<T>,
) -> Result<OrbitState<T>, VelaError> {
    match to {
        StateRepr::Cartesian => Ok(*cart),
        StateRepr::Spherical => cartesian_to_spherical(cart),
        StateRepr::Keplerian => {
            let mu = mu.ok_or(VelaError::MissingMu {
                from: StateRepr::Cartesian,
                to: StateRepr::Keplerian,
            })?;
            cartesian_to_keplerian(cart, mu)
        }
        StateRepr::ModifiedEquinoctial => {
            let mu = mu.ok_or(VelaError::MissingMu {
                from: StateRepr::Cartesian,
                to: StateRepr::ModifiedEquinoctial,
            })?;
            let kep = cartesian_to_keplerian(cart, mu)?;
            keplerian_to_equinoctial(&kep)
        }
    }
}

pub(crate) fn deg_to_rad<T: CalcScalar>(deg: T) -> T {
    deg * T::from_f64(PI / 180.0)
}

pub(crate) fn rad_to_deg<T: CalcScalar>(rad: T) -> T {
    rad * T::from_f64(180.0 / PI)
}

/// Wraps an angle in radians into [0, 2pi).
pub(crate) fn wrap_two_pi<T: CalcScalar>(angle: T) -> T {
    let two_pi = T::from_f64(2.0 * PI);
    let mut wrapped = angle % two_pi;
    if wrapped < T::zero() {
        wrapped = wrapped + two_pi;
    }
    wrapped
}

/// Arc cosine clamped against round-off slightly outside [-1, 1].
fn safe_acos<T: CalcScalar>(x: T) -> T {
    if x > T::one() {
        T::zero()
    } else if x < -T::one() {
        T::from_f64(PI)
    } else {
        x.acos()
    }
}

fn cartesian_to_keplerian<T: CalcScalar>(
    state: &OrbitState<T>,
    mu: T,
) -> Result<OrbitState<T>, VelaError> {
    let tol = DEGENERACY_TOL;
    let two = T::from_f64(2.0);
    let r = state.radius();
    let v = state.velocity();
    let rmag = norm(&r);
    let vmag = norm(&v);
    let h = cross(&r, &v);
    let hmag = norm(&h);
    if hmag.real() < tol {
        return Err(VelaError::MathDomain(
            "angular momentum is zero: orbit is rectilinear".to_string(),
        ));
    }
    // Node vector, z_hat x h.
    let node = Vector3::new(-h[1], h[0], T::zero());
    let nmag = norm(&node);
    let rdotv = dot(&r, &v);

    let coef = vmag * vmag - mu / rmag;
    let e_vec = Vector3::new(
        (coef * r[0] - rdotv * v[0]) / mu,
        (coef * r[1] - rdotv * v[1]) / mu,
        (coef * r[2] - rdotv * v[2]) / mu,
    );
    let ecc = norm(&e_vec);
    if (ecc - T::one()).abs().real() < tol {
        return Err(VelaError::MathDomain(
            "eccentricity is one: semi-major axis is undefined".to_string(),
        ));
    }
    let energy = vmag * vmag / two - mu / rmag;
    let sma = -mu / (two * energy);

    let inc = safe_acos(h[2] / hmag);
    let circular = ecc.real() < tol;
    let equatorial = nmag.real() < tol;

    let raan = if equatorial {
        T::zero()
    } else {
        let mut raan = safe_acos(node[0] / nmag);
        if node[1] < T::zero() {
            raan = T::from_f64(2.0 * PI) - raan;
        }
        raan
    };

    let aop = if circular {
        T::zero()
    } else if equatorial {
        // Longitude of periapsis stands in for the argument of periapsis.
        wrap_two_pi(e_vec[1].atan2(e_vec[0]))
    } else {
        let mut aop = safe_acos(dot(&node, &e_vec) / (nmag * ecc));
        if e_vec[2] < T::zero() {
            aop = T::from_f64(2.0 * PI) - aop;
        }
        aop
    };

    let ta = if circular && equatorial {
        wrap_two_pi(r[1].atan2(r[0]))
    } else if circular {
        // Argument of latitude stands in for the true anomaly.
        let mut u = safe_acos(dot(&node, &r) / (nmag * rmag));
        if r[2] < T::zero() {
            u = T::from_f64(2.0 * PI) - u;
        }
        u
    } else {
        let mut ta = safe_acos(dot(&e_vec, &r) / (ecc * rmag));
        if rdotv < T::zero() {
            ta = T::from_f64(2.0 * PI) - ta;
        }
        ta
    };

    Ok(OrbitState::keplerian(
        sma,
        ecc,
        rad_to_deg(inc),
        rad_to_deg(raan),
        rad_to_deg(aop),
        rad_to_deg(ta),
    ))
}

fn keplerian_to_cartesian<T: CalcScalar>(
    state: &OrbitState<T>,
    mu: T,
) -> Result<OrbitState<T>, VelaError> {
    let el = &state.elements;
    let (sma, ecc) = (el[0], el[1]);
    let inc = deg_to_rad(el[2]);
    let raan = deg_to_rad(el[3]);
    let aop = deg_to_rad(el[4]);
    let ta = deg_to_rad(el[5]);

    let p = sma * (T::one() - ecc * ecc);
    if p.real() < DEGENERACY_TOL {
        return Err(VelaError::MathDomain(
            "semi-latus rectum is not positive".to_string(),
        ));
    }
    let rmag = p / (T::one() + ecc * ta.cos());
    let sqrt_mu_p = (mu / p).sqrt();

    // Perifocal position and velocity.
    let r_pf = Vector3::new(rmag * ta.cos(), rmag * ta.sin(), T::zero());
    let v_pf = Vector3::new(
        -sqrt_mu_p * ta.sin(),
        sqrt_mu_p * (ecc + ta.cos()),
        T::zero(),
    );

    // Perifocal to inertial rotation, R3(-raan) R1(-inc) R3(-aop).
    let (cr, sr) = (raan.cos(), raan.sin());
    let (ci, si) = (inc.cos(), inc.sin());
    let (cw, sw) = (aop.cos(), aop.sin());
    let m11 = cr * cw - sr * sw * ci;
    let m12 = -cr * sw - sr * cw * ci;
    let m21 = sr * cw + cr * sw * ci;
    let m22 = -sr * sw + cr * cw * ci;
    let m31 = sw * si;
    let m32 = cw * si;

    Ok(OrbitState::cartesian(
        m11 * r_pf[0] + m12 * r_pf[1],
        m21 * r_pf[0] + m22 * r_pf[1],
        m31 * r_pf[0] + m32 * r_pf[1],
        m11 * v_pf[0] + m12 * v_pf[1],
        m21 * v_pf[0] + m22 * v_pf[1],
        m31 * v_pf[0] + m32 * v_pf[1],
    ))
}

fn keplerian_to_equinoctial<T: CalcScalar>(
    state: &OrbitState<T>,
) -> Result<OrbitState<T>, VelaError> {
    let el = &state.elements;
    let (sma, ecc) = (el[0], el[1]);
    let inc = deg_to_rad(el[2]);
    let raan = deg_to_rad(el[3]);
    let aop = deg_to_rad(el[4]);
    let ta = deg_to_rad(el[5]);

    let p = sma * (T::one() - ecc * ecc);
    let lonper = raan + aop;
    let tan_half_inc = (inc / T::from_f64(2.0)).tan();
    Ok(OrbitState::new(
        StateRepr::ModifiedEquinoctial,
        Vector6::new(
            p,
            ecc * lonper.cos(),
            ecc * lonper.sin(),
            tan_half_inc * raan.cos(),
            tan_half_inc * raan.sin(),
            rad_to_deg(wrap_two_pi(lonper + ta)),
        ),
    ))
}

fn equinoctial_to_keplerian<T: CalcScalar>(
    state: &OrbitState<T>,
) -> Result<OrbitState<T>, VelaError> {
    let el = &state.elements;
    let (p, f, g, h, k) = (el[0], el[1], el[2], el[3], el[4]);
    let lon = deg_to_rad(el[5]);

    let ecc = (f * f + g * g).sqrt();
    let one_m_e2 = T::one() - ecc * ecc;
    if one_m_e2.abs().real() < DEGENERACY_TOL {
        return Err(VelaError::MathDomain(
            "eccentricity is one: semi-major axis is undefined".to_string(),
        ));
    }
    let sma = p / one_m_e2;
    let inc = T::from_f64(2.0) * (h * h + k * k).sqrt().atan();
    let raan = if (h * h + k * k).real() < DEGENERACY_TOL {
        T::zero()
    } else {
        wrap_two_pi(k.atan2(h))
    };
    let lonper = if ecc.real() < DEGENERACY_TOL {
        T::zero()
    } else {
        wrap_two_pi(g.atan2(f))
    };
    let aop = wrap_two_pi(lonper - raan);
    let ta = wrap_two_pi(lon - lonper);

    Ok(OrbitState::keplerian(
        sma,
        ecc,
        rad_to_deg(inc),
        rad_to_deg(raan),
        rad_to_deg(aop),
        rad_to_deg(ta),
    ))
}

fn cartesian_to_spherical<T: CalcScalar>(
    state: &OrbitState<T>,
) -> Result<OrbitState<T>, VelaError> {
    let r = state.radius();
    let v = state.velocity();
    let rmag = norm(&r);
    let vmag = norm(&v);
    if rmag.real() < DEGENERACY_TOL {
        return Err(VelaError::MathDomain(
            "position is at the frame origin".to_string(),
        ));
    }
    let ra = wrap_two_pi(r[1].atan2(r[0]));
    let dec = (r[2] / rmag).asin();

    // Local radial / east / north basis.
    let (cra, sra) = (ra.cos(), ra.sin());
    let (cdec, sdec) = (dec.cos(), dec.sin());
    let u_r = Vector3::new(cdec * cra, cdec * sra, sdec);
    let u_e = Vector3::new(-sra, cra, T::zero());
    let u_n = Vector3::new(-sdec * cra, -sdec * sra, cdec);

    if vmag.real() < DEGENERACY_TOL {
        return Err(VelaError::MathDomain(
            "velocity is zero: flight path angle is undefined".to_string(),
        ));
    }
    let fpa = safe_acos(dot(&v, &u_r) / vmag);
    let azi = wrap_two_pi(dot(&v, &u_e).atan2(dot(&v, &u_n)));

    Ok(OrbitState::new(
        StateRepr::Spherical,
        Vector6::new(
            rmag,
            rad_to_deg(ra),
            rad_to_deg(dec),
            vmag,
            rad_to_deg(azi),
            rad_to_deg(fpa),
        ),
    ))
}

fn spherical_to_cartesian<T: CalcScalar>(
    state: &OrbitState<T>,
) -> Result<OrbitState<T>, VelaError> {
    let el = &state.elements;
    let rmag = el[0];
    let ra = deg_to_rad(el[1]);
    let dec = deg_to_rad(el[2]);
    let vmag = el[3];
    let azi = deg_to_rad(el[4]);
    let fpa = deg_to_rad(el[5]);

    let (cra, sra) = (ra.cos(), ra.sin());
    let (cdec, sdec) = (dec.cos(), dec.sin());
    let u_r = Vector3::new(cdec * cra, cdec * sra, sdec);
    let u_e = Vector3::new(-sra, cra, T::zero());
    let u_n = Vector3::new(-sdec * cra, -sdec * sra, cdec);

    let v_r = vmag * fpa.cos();
    let v_h = vmag * fpa.sin();
    let v_n = v_h * azi.cos();
    let v_e = v_h * azi.sin();

    Ok(OrbitState::cartesian(
        rmag * u_r[0],
        rmag * u_r[1],
        rmag * u_r[2],
        v_r * u_r[0] + v_e * u_e[0] + v_n * u_n[0],
        v_r * u_r[1] + v_e * u_e[1] + v_n * u_n[1],
        v_r * u_r[2] + v_e * u_e[2] + v_n * u_n[2],
    ))
}
