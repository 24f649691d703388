extern crate hyperdual;

use self::hyperdual::{OHyperdual, Owned};
use crate::errors::VelaError;
use crate::linalg::{Allocator, DefaultAllocator, Dim, DimName};
use num::Float;
use serde_derive::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use typed_builder::TypedBuilder;

/// Orbital state representations and the conversion registry between them.
pub mod state;
pub use self::state::*;

/// The spacecraft, the central mutable subject of mission sequencing.
pub mod spacecraft;
pub use self::spacecraft::*;

/// The scalar type all calc evaluations and the solver residual are generic over.
///
/// Implemented for `f64` and for hyperdual numbers, so that an optimizer feeding
/// dual-valued decision variables into [`crate::md::SequenceManager::solver_fun`]
/// receives a residual carrying the same dual parts, without any change to the
/// event effects.
pub trait CalcScalar: Float + nalgebra::Scalar {
    /// Lifts a plain double into this scalar (dual parts, if any, are zero).
    fn from_f64(val: f64) -> Self;
    /// Returns the real part of this scalar.
    fn real(&self) -> f64;
}

impl CalcScalar for f64 {
    fn from_f64(val: f64) -> Self {
        val
    }

    fn real(&self) -> f64 {
        *self
    }
}

impl<N: Dim + DimName> CalcScalar for OHyperdual<f64, N>
where
    DefaultAllocator: Allocator<f64, N>,
    Owned<f64, N>: Copy,
{
    fn from_f64(val: f64) -> Self {
        Self::from(val)
    }

    fn real(&self) -> f64 {
        // The real part of a hyperdual is its zeroth component.
        self[0]
    }
}

/// How a stateful subject restores itself from its construction-time snapshot.
///
/// Restoration happens in place: the live object keeps its identity (and hence
/// every `Rc` handle held by event effects keeps pointing at it), only its
/// mutable fields are overwritten. Append-only logs such as the spacecraft
/// history are deliberately left untouched.
pub trait Restore {
    fn restore_from(&mut self, snapshot: &Self);
}

/// A celestial body: the origin of coordinate systems and the source of the
/// gravitational parameter needed by several representation conversions.
///
/// Bodies are shared and mutable (the gravitational parameter is a legitimate
/// solve-for in orbit determination style problems) but they are *not* stateful:
/// event effects never touch them, so they do not participate in snapshotting.
#[derive(Clone, Debug, PartialEq, TypedBuilder, Serialize, Deserialize)]
pub struct CelestialBody {
    #[builder(setter(into))]
    pub name: String,
    /// Gravitational parameter in km^3/s^2, if known.
    #[builder(default, setter(strip_option))]
    pub mu_km3_s2: Option<f64>,
    #[builder(default = 0.0)]
    pub equatorial_radius_km: f64,
}

pub type SharedBody = Rc<RefCell<CelestialBody>>;

lazy_static::lazy_static! {
    /// Built-in (name, mu km^3/s^2, equatorial radius km) table, DE-series values.
    static ref BODY_TABLE: HashMap<&'static str, (f64, f64)> = {
        let mut table = HashMap::new();
        table.insert("sun", (132_712_440_041.939_38, 695_700.0));
        table.insert("mercury", (22_031.780_000, 2_439.7));
        table.insert("venus", (324_858.592, 6_051.8));
        table.insert("earth", (398_600.441_8, 6_378.136_3));
        table.insert("moon", (4_902.800_066, 1_737.4));
        table.insert("mars", (42_828.375_214, 3_396.19));
        table.insert("jupiter", (126_686_531.900, 71_492.0));
        table
    };
}

impl CelestialBody {
    /// Looks a body up in the built-in table (case insensitive).
    pub fn from_name(name: &str) -> Result<Self, VelaError> {
        let key = name.to_lowercase();
        let (mu, radius) = BODY_TABLE
            .get(key.as_str())
            .ok_or_else(|| VelaError::UnknownBody(name.to_string()))?;
        Ok(Self {
            name: key,
            mu_km3_s2: Some(*mu),
            equatorial_radius_km: *radius,
        })
    }

    pub fn earth() -> Self {
        Self::from_name("earth").unwrap()
    }

    pub fn into_shared(self) -> SharedBody {
        Rc::new(RefCell::new(self))
    }
}

impl fmt::Display for CelestialBody {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Axes of a coordinate system. Only inertial axes are defined in the base set;
/// local (spacecraft centered) frames live on maneuvers, cf.
/// [`crate::dynamics::LocalFrame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axes {
    Inertial,
}

/// A coordinate system: an origin body plus axes. The origin supplies the
/// gravitational parameter to the conversion bridge.
#[derive(Clone, Debug)]
pub struct CoordSystem {
    pub origin: SharedBody,
    pub axes: Axes,
}

impl CoordSystem {
    pub fn inertial(origin: SharedBody) -> Self {
        Self {
            origin,
            axes: Axes::Inertial,
        }
    }

    /// The origin's gravitational parameter, if it has one.
    pub fn mu_km3_s2(&self) -> Option<f64> {
        self.origin.borrow().mu_km3_s2
    }
}
