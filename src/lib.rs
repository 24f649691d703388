/*! # Vela

Vela turns a user-declared mission plan into a nonlinear programming problem
and executes it repeatedly inside an outer optimizer. Three subsystems carry
the load:

- the **calc framework** ([`md::calc`]): a uniform, reversible getter/setter
  layer over spacecraft, maneuvers and celestial bodies, performing the
  representation conversions needed to evaluate or assign each quantity while
  preserving whichever representation the user stored the state in;
- the **event sequence graph** ([`md::sequence`]): a DAG of events with
  "must-occur-before" edges, linearized by topological sort and replayed as a
  state machine over shared mutable domain objects;
- the **sequence manager** ([`md::manager`]): the frozen view of a plan which
  orders the decision variables and constraints, deep-snapshots every stateful
  subject, and exposes the residual `solver_fun(F, x)` an external solver
  iterates on: reset, assign, replay, collect.

The crate is single-threaded by design: subjects are `Rc` handles and one
[`md::SequenceManager`] must be built per thread.

## A two-burn plan in a dozen lines

```
use vela::md::prelude::*;
use vela::linalg::Vector3;

let earth = CelestialBody::earth().into_shared();
let sc = Spacecraft::new(
    "sc1",
    OrbitState::cartesian(7000.0, 300.0, 0.0, 0.0, 7.5, 1.0),
    Epoch::from_gregorian_utc_at_midnight(2023, 1, 1),
    CoordSystem::inertial(earth),
)
.into_shared();
let toi = ImpulsiveMnvr::new("toi", LocalFrame::VNC, Vector3::new(0.1, 0.0, 0.0))
    .into_shared();

let burn = Event::maneuver("perform toi", &sc, &toi);
burn.add_variable(
    &SolverVariable::new("toi dv", Calc::maneuver(&toi, &sc, ManeuverVar::DeltaVVector))
        .unwrap()
        .with_bounds(&[-10.0, 0.0, 0.0], &[10.0, 0.0, 0.0])
        .unwrap()
        .into_shared(),
);
let coast = Event::propagate_to_apoapsis("coast to apoapsis", &sc);
coast.add_constraint(
    &Constraint::equality(Calc::orbit(&sc, OrbitVar::PosMag), &[45_000.0])
        .unwrap()
        .into_shared(),
);

let mut seq = Sequence::new();
seq.add_event(&burn, &[]);
seq.add_event(&coast, &[burn.clone()]);
let sm = SequenceManager::new(&seq).unwrap();

let mut residual = vec![0.0];
sm.solver_fun(&mut residual, &[0.1, 0.0, 0.0]).unwrap();
```
*/

#[macro_use]
extern crate log;

/// Celestial bodies, coordinate systems, orbital states and spacecraft.
pub mod cosmic;
/// Impulsive maneuvers and the local frames their components live in.
pub mod dynamics;
pub mod errors;
/// Configuration file representations of the domain objects.
pub mod io;
pub mod linalg;
/// Mission design: calcs, events, sequences, manager, solver bridge.
pub mod md;
/// Analytic two-body propagation helpers for event effects.
pub mod propagators;
pub mod utils;

pub use errors::VelaError;
