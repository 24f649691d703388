use super::{CalcScalar, CoordSystem, OrbitState, Restore};
use hifitime::Epoch;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A spacecraft: orbital state, epoch, mass and the coordinate system the
/// state is expressed in. This is the archetypal *stateful subject*: event
/// effects mutate it in place, and the sequence manager snapshots and restores
/// it between solver iterations.
#[derive(Clone, Debug)]
pub struct Spacecraft<T: CalcScalar> {
    pub name: String,
    pub state: OrbitState<T>,
    pub epoch: Epoch,
    pub mass_kg: T,
    pub coord: CoordSystem,
    /// When enabled, the propagation helpers append each reached state to
    /// `history`. The log survives [`Restore`], so it accumulates across
    /// solver iterations.
    pub record_history: bool,
    pub history: Vec<(Epoch, OrbitState<T>)>,
}

pub type SharedSpacecraft<T> = Rc<RefCell<Spacecraft<T>>>;

impl<T: CalcScalar> Spacecraft<T> {
    pub fn new(name: &str, state: OrbitState<T>, epoch: Epoch, coord: CoordSystem) -> Self {
        Self {
            name: name.to_string(),
            state,
            epoch,
            mass_kg: T::from_f64(1000.0),
            coord,
            record_history: false,
            history: Vec::new(),
        }
    }

    pub fn with_mass(mut self, mass_kg: T) -> Self {
        self.mass_kg = mass_kg;
        self
    }

    pub fn with_history(mut self) -> Self {
        self.record_history = true;
        self
    }

    /// The gravitational parameter of the coordinate system origin, lifted
    /// into the calc scalar.
    pub fn origin_mu(&self) -> Option<T> {
        self.coord.mu_km3_s2().map(T::from_f64)
    }

    pub fn log_state(&mut self) {
        if self.record_history {
            self.history.push((self.epoch, self.state));
        }
    }

    pub fn into_shared(self) -> SharedSpacecraft<T> {
        Rc::new(RefCell::new(self))
    }
}

impl<T: CalcScalar> Restore for Spacecraft<T> {
    fn restore_from(&mut self, snapshot: &Self) {
        self.name.clone_from(&snapshot.name);
        self.state = snapshot.state;
        self.epoch = snapshot.epoch;
        self.mass_kg = snapshot.mass_kg;
        self.coord = snapshot.coord.clone();
        self.record_history = snapshot.record_history;
        // The history log is append-only and intentionally not restored.
    }
}

impl<T: CalcScalar> fmt::Display for Spacecraft<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} @ {} around {}: {} ({:.3} kg)",
            self.name,
            self.epoch,
            self.coord.origin.borrow().name,
            self.state,
            self.mass_kg.real()
        )
    }
}
