use super::constraint::Constraint;
use super::variable::SolverVariable;
use crate::cosmic::{CalcScalar, SharedSpacecraft};
use crate::dynamics::{apply_impulse, SharedMnvr};
use crate::errors::VelaError;
use crate::propagators;
use hifitime::Duration;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// The mutation an event performs when it runs. Blanket-implemented for
/// closures, so `Event::new("burn", move || { ... })` is the common spelling;
/// the trait form exists for effects that carry their own state.
pub trait Effect {
    fn apply(&mut self) -> Result<(), VelaError>;
}

impl<F> Effect for F
where
    F: FnMut() -> Result<(), VelaError>,
{
    fn apply(&mut self) -> Result<(), VelaError> {
        self()
    }
}

struct EventData<T: CalcScalar> {
    name: String,
    effect: Box<dyn Effect>,
    variables: Vec<Rc<SolverVariable<T>>>,
    constraints: Vec<Rc<Constraint<T>>>,
}

/// A node of the mission sequence: a named effect plus the decision variables
/// and constraints it owns.
///
/// Events are cheap handles with *identity* semantics: cloning the handle
/// does not clone the event, and equality/hashing compare the underlying
/// allocation. The sequence graph and the manager rely on that identity.
pub struct Event<T: CalcScalar>(Rc<RefCell<EventData<T>>>);

impl<T: CalcScalar> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: CalcScalar> Event<T> {
    pub fn new(name: &str, effect: impl Effect + 'static) -> Self {
        Self(Rc::new(RefCell::new(EventData {
            name: name.to_string(),
            effect: Box::new(effect),
            variables: Vec::new(),
            constraints: Vec::new(),
        })))
    }

    /// An event whose effect applies an impulsive maneuver to a spacecraft.
    pub fn maneuver(name: &str, sc: &SharedSpacecraft<T>, mnvr: &SharedMnvr<T>) -> Self
    where
        T: 'static,
    {
        let sc = sc.clone();
        let mnvr = mnvr.clone();
        Self::new(name, move || {
            apply_impulse(&mut sc.borrow_mut(), &mnvr.borrow())
        })
    }

    /// An event whose effect coasts the spacecraft to its next apoapsis.
    pub fn propagate_to_apoapsis(name: &str, sc: &SharedSpacecraft<T>) -> Self
    where
        T: 'static,
    {
        let sc = sc.clone();
        Self::new(name, move || {
            propagators::propagate_to_apoapsis(&mut sc.borrow_mut())
        })
    }

    /// An event whose effect coasts the spacecraft to its next periapsis.
    pub fn propagate_to_periapsis(name: &str, sc: &SharedSpacecraft<T>) -> Self
    where
        T: 'static,
    {
        let sc = sc.clone();
        Self::new(name, move || {
            propagators::propagate_to_periapsis(&mut sc.borrow_mut())
        })
    }

    /// An event whose effect coasts the spacecraft for a fixed duration.
    pub fn propagate_for(name: &str, sc: &SharedSpacecraft<T>, duration: Duration) -> Self
    where
        T: 'static,
    {
        let sc = sc.clone();
        Self::new(name, move || {
            propagators::propagate_for(&mut sc.borrow_mut(), duration)
        })
    }

    /// An event with no effect, useful to anchor variables or constraints at
    /// a particular point of the sequence.
    pub fn wait(name: &str) -> Self {
        Self::new(name, || -> Result<(), VelaError> { Ok(()) })
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    pub fn add_variable(&self, variable: &Rc<SolverVariable<T>>) {
        self.0.borrow_mut().variables.push(variable.clone());
    }

    pub fn add_constraint(&self, constraint: &Rc<Constraint<T>>) {
        self.0.borrow_mut().constraints.push(constraint.clone());
    }

    pub fn variables(&self) -> Vec<Rc<SolverVariable<T>>> {
        self.0.borrow().variables.clone()
    }

    pub fn constraints(&self) -> Vec<Rc<Constraint<T>>> {
        self.0.borrow().constraints.clone()
    }

    /// Runs the event's effect.
    pub(crate) fn apply_effect(&self) -> Result<(), VelaError> {
        self.0.borrow_mut().effect.apply()
    }
}

impl<T: CalcScalar> PartialEq for Event<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: CalcScalar> Eq for Event<T> {}

impl<T: CalcScalar> Hash for Event<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl<T: CalcScalar> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Event({})", self.name())
    }
}

impl<T: CalcScalar> fmt::Display for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
