use crate::cosmic::{convert, CalcScalar, Restore, Spacecraft, StateRepr};
use crate::errors::VelaError;
use crate::linalg::{Vector3, Vector6};
use crate::utils::{cross, norm, unit_vector};
use serde_derive::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Standard gravity in m/s^2, for the rocket equation.
pub const STD_GRAVITY_M_S2: f64 = 9.806_65;

/// Local orbital frames a maneuver's delta-v components may be expressed in.
///
/// `VNC` is velocity / orbit normal / co-normal (the "VNB" of GMAT heritage),
/// `RIC` is radial / in-track / cross-track, and `RCN` is radial / co-normal /
/// normal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalFrame {
    Inertial,
    VNC,
    RIC,
    RCN,
}

impl LocalFrame {
    /// Rotates `local` components of this frame, evaluated at the provided
    /// Cartesian state, into inertial axes.
    pub fn to_inertial<T: CalcScalar>(
        self,
        cartesian: &Vector6<T>,
        local: &Vector3<T>,
    ) -> Result<Vector3<T>, VelaError> {
        let r = Vector3::new(cartesian[0], cartesian[1], cartesian[2]);
        let v = Vector3::new(cartesian[3], cartesian[4], cartesian[5]);
        let (x, y, z) = match self {
            Self::Inertial => return Ok(*local),
            Self::VNC => {
                let v_hat = unit_vector(&v)?;
                let n_hat = unit_vector(&cross(&r, &v))?;
                let c_hat = cross(&v_hat, &n_hat);
                (v_hat, n_hat, c_hat)
            }
            Self::RIC => {
                let r_hat = unit_vector(&r)?;
                let c_hat = unit_vector(&cross(&r, &v))?;
                let i_hat = cross(&c_hat, &r_hat);
                (r_hat, i_hat, c_hat)
            }
            Self::RCN => {
                let r_hat = unit_vector(&r)?;
                let n_hat = unit_vector(&cross(&r, &v))?;
                let c_hat = cross(&n_hat, &r_hat);
                (r_hat, c_hat, n_hat)
            }
        };
        Ok(Vector3::new(
            x[0] * local[0] + y[0] * local[1] + z[0] * local[2],
            x[1] * local[0] + y[1] * local[1] + z[1] * local[2],
            x[2] * local[0] + y[2] * local[1] + z[2] * local[2],
        ))
    }
}

impl fmt::Display for LocalFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// An impulsive maneuver: three delta-v components in km/s expressed in
/// `frame`, with an optional specific impulse for mass bookkeeping.
///
/// Maneuvers are stateful subjects: applying one may rescale its effective
/// delta-v, and the solver writes trial components into `dv` on every
/// iteration, so they participate in snapshot and restore.
#[derive(Clone, Debug)]
pub struct ImpulsiveMnvr<T: CalcScalar> {
    pub name: String,
    pub dv: Vector3<T>,
    pub frame: LocalFrame,
    pub isp_s: Option<f64>,
    pub decrement_mass: bool,
}

pub type SharedMnvr<T> = Rc<RefCell<ImpulsiveMnvr<T>>>;

impl<T: CalcScalar> ImpulsiveMnvr<T> {
    pub fn new(name: &str, frame: LocalFrame, dv: Vector3<T>) -> Self {
        Self {
            name: name.to_string(),
            dv,
            frame,
            isp_s: None,
            decrement_mass: false,
        }
    }

    /// Enables mass decrement through the rocket equation.
    pub fn with_isp(mut self, isp_s: f64) -> Self {
        self.isp_s = Some(isp_s);
        self.decrement_mass = true;
        self
    }

    pub fn dv_mag(&self) -> T {
        norm(&self.dv)
    }

    pub fn into_shared(self) -> SharedMnvr<T> {
        Rc::new(RefCell::new(self))
    }
}

impl<T: CalcScalar> Restore for ImpulsiveMnvr<T> {
    fn restore_from(&mut self, snapshot: &Self) {
        self.name.clone_from(&snapshot.name);
        self.dv = snapshot.dv;
        self.frame = snapshot.frame;
        self.isp_s = snapshot.isp_s;
        self.decrement_mass = snapshot.decrement_mass;
    }
}

impl<T: CalcScalar> fmt::Display for ImpulsiveMnvr<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: dv = [{:.6}, {:.6}, {:.6}] km/s ({})",
            self.name,
            self.dv[0].real(),
            self.dv[1].real(),
            self.dv[2].real(),
            self.frame
        )
    }
}

/// Applies an impulsive maneuver to a spacecraft, in place.
///
/// The spacecraft state is converted to Cartesian (fetching the gravitational
/// parameter from its coordinate origin if the stored representation needs
/// one), the delta-v components are rotated from the maneuver frame into
/// inertial axes and added to the velocity, and the result is converted back
/// to the representation the state was stored in.
pub fn apply_impulse<T: CalcScalar>(
    sc: &mut Spacecraft<T>,
    mnvr: &ImpulsiveMnvr<T>,
) -> Result<(), VelaError> {
    let original_repr = sc.state.repr;
    let mu = sc.origin_mu();
    let cart = match convert(&sc.state, StateRepr::Cartesian, None) {
        Ok(cart) => cart,
        Err(VelaError::MissingMu { from, to }) => {
            let mu = mu.ok_or(VelaError::MissingMu { from, to })?;
            convert(&sc.state, StateRepr::Cartesian, Some(mu))?
        }
        Err(other) => return Err(other),
    };

    let dv_inertial = mnvr.frame.to_inertial(&cart.elements, &mnvr.dv)?;
    let mut post = cart;
    for i in 0..3 {
        post.elements[3 + i] = post.elements[3 + i] + dv_inertial[i];
    }

    sc.state = match convert(&post, original_repr, None) {
        Ok(state) => state,
        Err(VelaError::MissingMu { from, to }) => {
            let mu = mu.ok_or(VelaError::MissingMu { from, to })?;
            convert(&post, original_repr, Some(mu))?
        }
        Err(other) => return Err(other),
    };

    if mnvr.decrement_mass {
        if let Some(isp) = mnvr.isp_s {
            let v_exhaust_km_s = T::from_f64(isp * STD_GRAVITY_M_S2 * 1e-3);
            let ratio = (-mnvr.dv_mag() / v_exhaust_km_s).exp();
            sc.mass_kg = sc.mass_kg * ratio;
        }
    }
    sc.log_state();
    Ok(())
}
