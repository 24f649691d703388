use crate::cosmic::state::{rad_to_deg, wrap_two_pi};
use crate::cosmic::{
    convert, CalcScalar, OrbitState, Restore, SharedBody, SharedSpacecraft, Spacecraft, StateRepr,
};
use crate::dynamics::{ImpulsiveMnvr, SharedMnvr};
use crate::errors::VelaError;
use crate::linalg::Vector3;
use crate::utils::{cross, dot, norm, unit_vector};
use enum_iterator::Sequence;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Derived quantities of a spacecraft orbit. Each tag evaluates against the
/// state expressed in its required input representation; the conversion to
/// get there (and back, for setters) is the calc framework's job.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize)]
pub enum OrbitVar {
    Sma,
    Ecc,
    Inc,
    Raan,
    Aop,
    Ta,
    PositionVector,
    VelocityVector,
    PosMag,
    VelMag,
    PosX,
    PosY,
    PosZ,
    PosDotVel,
    CartesianState,
    IncomingAsymptote,
}

impl OrbitVar {
    /// Number of scalar components this tag produces or consumes.
    pub const fn arity(self) -> usize {
        match self {
            Self::PositionVector | Self::VelocityVector | Self::IncomingAsymptote => 3,
            Self::CartesianState => 6,
            _ => 1,
        }
    }

    /// Whether an inverse (assignment) is defined for this tag.
    pub const fn is_settable(self) -> bool {
        !matches!(
            self,
            Self::PosMag | Self::VelMag | Self::PosDotVel | Self::IncomingAsymptote
        )
    }

    /// The representation this tag's evaluation and setter are defined in.
    pub const fn required_input_repr(self) -> StateRepr {
        match self {
            Self::Sma | Self::Ecc | Self::Inc | Self::Raan | Self::Aop | Self::Ta => {
                StateRepr::Keplerian
            }
            _ => StateRepr::Cartesian,
        }
    }
}

/// Derived quantities of an impulsive maneuver.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize)]
pub enum ManeuverVar {
    DeltaVVector,
    DeltaVMag,
}

impl ManeuverVar {
    pub const fn arity(self) -> usize {
        match self {
            Self::DeltaVVector => 3,
            Self::DeltaVMag => 1,
        }
    }

    pub const fn is_settable(self) -> bool {
        matches!(self, Self::DeltaVVector)
    }
}

/// Settable properties of a celestial body.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize)]
pub enum BodyVar {
    GravParam,
}

impl BodyVar {
    pub const fn arity(self) -> usize {
        1
    }

    pub const fn is_settable(self) -> bool {
        true
    }
}

/// Binds an [`OrbitVar`] to a spacecraft. The optional dependency craft is for
/// relative quantities; the base tag set does not use it, but it still counts
/// toward the stateful subjects of the calc.
#[derive(Clone)]
pub struct OrbitCalc<T: CalcScalar> {
    pub spacecraft: SharedSpacecraft<T>,
    pub tag: OrbitVar,
    pub dependency: Option<SharedSpacecraft<T>>,
}

impl<T: CalcScalar> OrbitCalc<T> {
    pub fn new(spacecraft: &SharedSpacecraft<T>, tag: OrbitVar) -> Self {
        Self {
            spacecraft: spacecraft.clone(),
            tag,
            dependency: None,
        }
    }
}

/// Binds a [`ManeuverVar`] to a maneuver. The spacecraft rides along because
/// the delta-v of frame-dependent maneuvers is evaluated against its state.
#[derive(Clone)]
pub struct ManeuverCalc<T: CalcScalar> {
    pub maneuver: SharedMnvr<T>,
    pub spacecraft: SharedSpacecraft<T>,
    pub tag: ManeuverVar,
}

impl<T: CalcScalar> ManeuverCalc<T> {
    pub fn new(
        maneuver: &SharedMnvr<T>,
        spacecraft: &SharedSpacecraft<T>,
        tag: ManeuverVar,
    ) -> Self {
        Self {
            maneuver: maneuver.clone(),
            spacecraft: spacecraft.clone(),
            tag,
        }
    }
}

/// Binds a [`BodyVar`] to a celestial body.
#[derive(Clone)]
pub struct BodyCalc {
    pub body: SharedBody,
    pub tag: BodyVar,
}

impl BodyCalc {
    pub fn new(body: &SharedBody, tag: BodyVar) -> Self {
        Self {
            body: body.clone(),
            tag,
        }
    }
}

/// A calc: a variable tag bound to the domain object(s) it is evaluated
/// against, with uniform get/set semantics.
#[derive(Clone)]
pub enum Calc<T: CalcScalar> {
    Orbit(OrbitCalc<T>),
    Body(BodyCalc),
    Maneuver(ManeuverCalc<T>),
}

impl<T: CalcScalar> Calc<T> {
    pub fn orbit(spacecraft: &SharedSpacecraft<T>, tag: OrbitVar) -> Self {
        Self::Orbit(OrbitCalc::new(spacecraft, tag))
    }

    pub fn maneuver(
        maneuver: &SharedMnvr<T>,
        spacecraft: &SharedSpacecraft<T>,
        tag: ManeuverVar,
    ) -> Self {
        Self::Maneuver(ManeuverCalc::new(maneuver, spacecraft, tag))
    }

    pub fn body(body: &SharedBody, tag: BodyVar) -> Self {
        Self::Body(BodyCalc::new(body, tag))
    }

    pub fn arity(&self) -> usize {
        match self {
            Self::Orbit(c) => c.tag.arity(),
            Self::Body(c) => c.tag.arity(),
            Self::Maneuver(c) => c.tag.arity(),
        }
    }

    pub fn is_settable(&self) -> bool {
        match self {
            Self::Orbit(c) => c.tag.is_settable(),
            Self::Body(c) => c.tag.is_settable(),
            Self::Maneuver(c) => c.tag.is_settable(),
        }
    }

    /// Evaluates the quantity named by the tag against the current state of
    /// the subject(s). The returned vector always has `arity()` components.
    pub fn value(&self) -> Result<Vec<T>, VelaError> {
        match self {
            Self::Orbit(c) => {
                let sc = c.spacecraft.borrow();
                let (converted, mu) = state_in_repr(&sc, c.tag.required_input_repr())?;
                eval_orbit(c.tag, &converted, mu)
            }
            Self::Maneuver(c) => {
                let mnvr = c.maneuver.borrow();
                eval_maneuver(c.tag, &mnvr)
            }
            Self::Body(c) => {
                let body = c.body.borrow();
                match c.tag {
                    BodyVar::GravParam => {
                        let mu = body
                            .mu_km3_s2
                            .ok_or_else(|| VelaError::UndefinedGravParam(body.name.clone()))?;
                        Ok(vec![T::from_f64(mu)])
                    }
                }
            }
        }
    }

    /// Mutates the subject(s) so that a subsequent `value()` returns the
    /// assigned components, up to conversion round-off. The subject's stored
    /// representation is preserved.
    pub fn set_value(&self, value: &[T]) -> Result<(), VelaError> {
        if !self.is_settable() {
            error!("attempt to assign to a read-only calc: {self}");
            return Err(VelaError::UnsettableCalc(self.to_string()));
        }
        if value.len() != self.arity() {
            return Err(VelaError::ArityMismatch {
                expected: self.arity(),
                got: value.len(),
            });
        }
        match self {
            Self::Orbit(c) => {
                let mut sc = c.spacecraft.borrow_mut();
                let original_repr = sc.state.repr;
                let (converted, mu) = state_in_repr(&sc, c.tag.required_input_repr())?;
                let updated = set_orbit(c.tag, &converted, value)?;
                sc.state = match convert(&updated, original_repr, None) {
                    Ok(state) => state,
                    Err(VelaError::MissingMu { from, to }) => {
                        let mu = mu.ok_or(VelaError::MissingMu { from, to })?;
                        convert(&updated, original_repr, Some(mu))?
                    }
                    Err(other) => return Err(other),
                };
                Ok(())
            }
            Self::Maneuver(c) => {
                let mut mnvr = c.maneuver.borrow_mut();
                match c.tag {
                    ManeuverVar::DeltaVVector => {
                        mnvr.dv = Vector3::new(value[0], value[1], value[2]);
                        Ok(())
                    }
                    ManeuverVar::DeltaVMag => unreachable!("guarded by is_settable"),
                }
            }
            Self::Body(c) => {
                let mut body = c.body.borrow_mut();
                match c.tag {
                    BodyVar::GravParam => {
                        body.mu_km3_s2 = Some(value[0].real());
                        Ok(())
                    }
                }
            }
        }
    }

    /// The domain objects this calc reaches, in a fixed order. The sequence
    /// manager uses this to discover what must be snapshotted.
    pub fn subjects(&self) -> Vec<Subject<T>> {
        match self {
            Self::Orbit(c) => {
                let mut subjects = vec![Subject::Spacecraft(c.spacecraft.clone())];
                if let Some(dep) = &c.dependency {
                    subjects.push(Subject::Spacecraft(dep.clone()));
                }
                subjects
            }
            Self::Maneuver(c) => vec![
                Subject::Maneuver(c.maneuver.clone()),
                Subject::Spacecraft(c.spacecraft.clone()),
            ],
            Self::Body(c) => vec![Subject::Body(c.body.clone())],
        }
    }
}

impl<T: CalcScalar> fmt::Display for Calc<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Orbit(c) => write!(f, "{:?} of {}", c.tag, c.spacecraft.borrow().name),
            Self::Maneuver(c) => write!(f, "{:?} of {}", c.tag, c.maneuver.borrow().name),
            Self::Body(c) => write!(f, "{:?} of {}", c.tag, c.body.borrow().name),
        }
    }
}

/// Converts the spacecraft state into the requested representation, trying
/// once without a gravitational parameter and once with the one of the
/// coordinate origin. Also returns that parameter so tag evaluations which
/// need it (the asymptote family) do not fetch it twice.
fn state_in_repr<T: CalcScalar>(
    sc: &Spacecraft<T>,
    target: StateRepr,
) -> Result<(OrbitState<T>, Option<T>), VelaError> {
    let mu = sc.origin_mu();
    match convert(&sc.state, target, None) {
        Ok(state) => Ok((state, mu)),
        Err(VelaError::MissingMu { from, to }) => {
            let mu = mu.ok_or(VelaError::MissingMu { from, to })?;
            Ok((convert(&sc.state, target, Some(mu))?, Some(mu)))
        }
        Err(other) => Err(other),
    }
}

/// Evaluates an orbit tag on a state already expressed in the tag's required
/// input representation.
pub fn eval_orbit<T: CalcScalar>(
    tag: OrbitVar,
    state: &OrbitState<T>,
    mu: Option<T>,
) -> Result<Vec<T>, VelaError> {
    let el = &state.elements;
    let value = match tag {
        OrbitVar::Sma => vec![el[0]],
        OrbitVar::Ecc => vec![el[1]],
        OrbitVar::Inc => vec![el[2]],
        OrbitVar::Raan => vec![el[3]],
        OrbitVar::Aop => vec![el[4]],
        OrbitVar::Ta => vec![el[5]],
        OrbitVar::PositionVector => vec![el[0], el[1], el[2]],
        OrbitVar::VelocityVector => vec![el[3], el[4], el[5]],
        OrbitVar::PosMag => vec![norm(&state.radius())],
        OrbitVar::VelMag => vec![norm(&state.velocity())],
        OrbitVar::PosX => vec![el[0]],
        OrbitVar::PosY => vec![el[1]],
        OrbitVar::PosZ => vec![el[2]],
        OrbitVar::PosDotVel => vec![dot(&state.radius(), &state.velocity())],
        OrbitVar::CartesianState => (0..6).map(|i| el[i]).collect(),
        OrbitVar::IncomingAsymptote => {
            let mu = mu.ok_or(VelaError::MissingMu {
                from: state.repr,
                to: state.repr,
            })?;
            incoming_asymptote(state, mu)?
        }
    };
    Ok(value)
}

/// C3 plus right ascension and declination of the incoming asymptote of a
/// hyperbolic orbit.
fn incoming_asymptote<T: CalcScalar>(
    state: &OrbitState<T>,
    mu: T,
) -> Result<Vec<T>, VelaError> {
    let r = state.radius();
    let v = state.velocity();
    let rmag = norm(&r);
    let vmag = norm(&v);
    let two = T::from_f64(2.0);
    let c3 = vmag * vmag - two * mu / rmag;
    if c3.real() <= 0.0 {
        return Err(VelaError::MathDomain(
            "asymptote is undefined for a closed orbit".to_string(),
        ));
    }
    let h = cross(&r, &v);
    let rdotv = dot(&r, &v);
    let coef = vmag * vmag - mu / rmag;
    let e_vec = Vector3::new(
        (coef * r[0] - rdotv * v[0]) / mu,
        (coef * r[1] - rdotv * v[1]) / mu,
        (coef * r[2] - rdotv * v[2]) / mu,
    );
    let ecc = norm(&e_vec);
    let p_hat = unit_vector(&e_vec)?;
    let q_hat = cross(&unit_vector(&h)?, &p_hat);
    let nu_inf = (-T::one() / ecc).acos();
    let (c, s) = (nu_inf.cos(), nu_inf.sin());
    let s_hat = Vector3::new(
        c * p_hat[0] - s * q_hat[0],
        c * p_hat[1] - s * q_hat[1],
        c * p_hat[2] - s * q_hat[2],
    );
    Ok(vec![
        c3,
        rad_to_deg(wrap_two_pi(s_hat[1].atan2(s_hat[0]))),
        rad_to_deg(s_hat[2].asin()),
    ])
}

/// Applies the setter rule of a settable orbit tag to a state already
/// expressed in the tag's required input representation.
pub fn set_orbit<T: CalcScalar>(
    tag: OrbitVar,
    state: &OrbitState<T>,
    value: &[T],
) -> Result<OrbitState<T>, VelaError> {
    let mut updated = *state;
    match tag {
        OrbitVar::Sma => updated.elements[0] = value[0],
        OrbitVar::Ecc => updated.elements[1] = value[0],
        OrbitVar::Inc => updated.elements[2] = value[0],
        OrbitVar::Raan => updated.elements[3] = value[0],
        OrbitVar::Aop => updated.elements[4] = value[0],
        OrbitVar::Ta => updated.elements[5] = value[0],
        OrbitVar::PositionVector => {
            for i in 0..3 {
                updated.elements[i] = value[i];
            }
        }
        OrbitVar::VelocityVector => {
            for i in 0..3 {
                updated.elements[3 + i] = value[i];
            }
        }
        OrbitVar::PosX => updated.elements[0] = value[0],
        OrbitVar::PosY => updated.elements[1] = value[0],
        OrbitVar::PosZ => updated.elements[2] = value[0],
        OrbitVar::CartesianState => {
            for i in 0..6 {
                updated.elements[i] = value[i];
            }
        }
        OrbitVar::PosMag | OrbitVar::VelMag | OrbitVar::PosDotVel | OrbitVar::IncomingAsymptote => {
            return Err(VelaError::UnsettableCalc(format!("{tag:?}")));
        }
    }
    Ok(updated)
}

/// Evaluates a maneuver tag.
pub fn eval_maneuver<T: CalcScalar>(
    tag: ManeuverVar,
    mnvr: &ImpulsiveMnvr<T>,
) -> Result<Vec<T>, VelaError> {
    match tag {
        ManeuverVar::DeltaVVector => Ok(vec![mnvr.dv[0], mnvr.dv[1], mnvr.dv[2]]),
        ManeuverVar::DeltaVMag => Ok(vec![mnvr.dv_mag()]),
    }
}

/// A domain object reachable through a calc. Spacecraft and maneuvers are
/// stateful (event effects mutate them); bodies are not.
#[derive(Clone)]
pub enum Subject<T: CalcScalar> {
    Spacecraft(SharedSpacecraft<T>),
    Maneuver(SharedMnvr<T>),
    Body(SharedBody),
}

/// The deep copy of a stateful subject taken at manager construction.
#[derive(Clone)]
pub enum SubjectSnapshot<T: CalcScalar> {
    Spacecraft(Spacecraft<T>),
    Maneuver(ImpulsiveMnvr<T>),
}

impl<T: CalcScalar> Subject<T> {
    pub fn is_stateful(&self) -> bool {
        matches!(self, Self::Spacecraft(_) | Self::Maneuver(_))
    }

    /// Identity comparison: two subjects are the same iff they are handles to
    /// the same live object.
    pub fn same_object(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Spacecraft(a), Self::Spacecraft(b)) => Rc::ptr_eq(a, b),
            (Self::Maneuver(a), Self::Maneuver(b)) => Rc::ptr_eq(a, b),
            (Self::Body(a), Self::Body(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::Spacecraft(sc) => sc.borrow().name.clone(),
            Self::Maneuver(m) => m.borrow().name.clone(),
            Self::Body(b) => b.borrow().name.clone(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Spacecraft(_) => "spacecraft",
            Self::Maneuver(_) => "maneuver",
            Self::Body(_) => "body",
        }
    }

    /// Deep-copies a stateful subject; `None` for stateless kinds.
    pub fn snapshot(&self) -> Option<SubjectSnapshot<T>> {
        match self {
            Self::Spacecraft(sc) => Some(SubjectSnapshot::Spacecraft(sc.borrow().clone())),
            Self::Maneuver(m) => Some(SubjectSnapshot::Maneuver(m.borrow().clone())),
            Self::Body(_) => None,
        }
    }

    /// Restores the live object from its snapshot, in place.
    pub fn restore(&self, snapshot: &SubjectSnapshot<T>) {
        match (self, snapshot) {
            (Self::Spacecraft(live), SubjectSnapshot::Spacecraft(snap)) => {
                live.borrow_mut().restore_from(snap);
            }
            (Self::Maneuver(live), SubjectSnapshot::Maneuver(snap)) => {
                live.borrow_mut().restore_from(snap);
            }
            _ => unreachable!("snapshot kind always matches its subject"),
        }
    }
}
