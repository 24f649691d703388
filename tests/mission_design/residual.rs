use super::init_logger;
use vela::linalg::Vector3;
use vela::md::prelude::*;

/// The single-impulse apoapsis plan used by the replay tests.
fn apoapsis_plan(record_history: bool) -> SequenceManager<f64> {
    let earth = CelestialBody::earth().into_shared();
    let mut craft = Spacecraft::new(
        "sc1",
        OrbitState::cartesian(7000.0, 300.0, 0.0, 0.0, 7.5, 1.0),
        Epoch::from_gregorian_utc_at_midnight(2023, 1, 1),
        CoordSystem::inertial(earth),
    );
    if record_history {
        craft = craft.with_history();
    }
    let sc = craft.into_shared();
    let toi = ImpulsiveMnvr::new("toi", LocalFrame::VNC, Vector3::new(0.1, 0.2, 0.3))
        .into_shared();

    let e_man = Event::maneuver("perform toi", &sc, &toi);
    e_man.add_variable(
        &SolverVariable::new("toi dv", Calc::maneuver(&toi, &sc, ManeuverVar::DeltaVVector))
            .unwrap()
            .into_shared(),
    );
    let e_prop = Event::propagate_to_apoapsis("coast to apoapsis", &sc);
    e_prop.add_constraint(
        &Constraint::equality(Calc::orbit(&sc, OrbitVar::PosMag), &[45_000.0])
            .unwrap()
            .into_shared(),
    );

    let mut seq = Sequence::new();
    seq.add_event(&e_man, &[]);
    seq.add_event(&e_prop, &[e_man.clone()]);
    SequenceManager::new(&seq).unwrap()
}

#[test]
fn residual_is_bit_reproducible() {
    init_logger();
    let sm = apoapsis_plan(false);
    let x = [0.3, 0.05, -0.1];
    let mut f1 = vec![0.0];
    let mut f2 = vec![0.0];
    sm.solver_fun(&mut f1, &x).unwrap();
    sm.solver_fun(&mut f2, &x).unwrap();
    assert_eq!(f1[0].to_bits(), f2[0].to_bits());
}

#[test]
fn reset_makes_iterations_independent() {
    init_logger();
    let sm = apoapsis_plan(false);
    let x1 = [0.3, 0.0, 0.0];
    let x2 = [0.6, 0.0, 0.0];
    let mut f1 = vec![0.0];
    let mut f2 = vec![0.0];
    let mut f3 = vec![0.0];
    sm.solver_fun(&mut f1, &x1).unwrap();
    sm.solver_fun(&mut f2, &x2).unwrap();
    sm.solver_fun(&mut f3, &x1).unwrap();
    assert_eq!(f1[0].to_bits(), f3[0].to_bits());
    assert_ne!(f1[0], f2[0]);
}

#[test]
fn wrong_lengths_are_rejected() {
    init_logger();
    let sm = apoapsis_plan(false);
    let mut f = vec![0.0; 2];
    assert!(matches!(
        sm.solver_fun(&mut f, &[0.1, 0.0, 0.0]),
        Err(VelaError::ArityMismatch { .. })
    ));
    let mut f = vec![0.0];
    assert!(matches!(
        sm.solver_fun(&mut f, &[0.1, 0.0]),
        Err(VelaError::ArityMismatch { .. })
    ));
}

#[test]
fn effect_errors_propagate() {
    init_logger();
    let earth = CelestialBody::earth().into_shared();
    let sc = Spacecraft::new(
        "sc1",
        OrbitState::cartesian(7000.0, 300.0, 0.0, 0.0, 7.5, 1.0),
        Epoch::from_gregorian_utc_at_midnight(2023, 1, 1),
        CoordSystem::inertial(earth),
    )
    .into_shared();
    let toi = ImpulsiveMnvr::new("toi", LocalFrame::VNC, Vector3::new(0.0, 0.0, 0.0))
        .into_shared();
    let e_man = Event::maneuver("escape burn", &sc, &toi);
    e_man.add_variable(
        &SolverVariable::new("toi dv", Calc::maneuver(&toi, &sc, ManeuverVar::DeltaVVector))
            .unwrap()
            .into_shared(),
    );
    let e_prop = Event::propagate_to_apoapsis("coast to apoapsis", &sc);
    e_prop.add_constraint(
        &Constraint::equality(Calc::orbit(&sc, OrbitVar::PosMag), &[45_000.0])
            .unwrap()
            .into_shared(),
    );
    let mut seq = Sequence::new();
    seq.add_event(&e_man, &[]);
    seq.add_event(&e_prop, &[e_man.clone()]);
    let sm = SequenceManager::new(&seq).unwrap();

    // A 5 km/s prograde burn makes the orbit hyperbolic: coasting to
    // apoapsis must fail, and the failure must surface from the residual.
    let mut f = vec![0.0];
    assert!(matches!(
        sm.solver_fun(&mut f, &[5.0, 0.0, 0.0]),
        Err(VelaError::Propagation(_))
    ));

    // The next evaluation resets cleanly and succeeds.
    sm.solver_fun(&mut f, &[0.1, 0.0, 0.0]).unwrap();
    assert!(f[0] > 7000.0);
}

#[test]
fn history_survives_resets() {
    init_logger();
    let sm = apoapsis_plan(true);
    let mut f = vec![0.0];
    sm.solver_fun(&mut f, &[0.1, 0.0, 0.0]).unwrap();
    sm.solver_fun(&mut f, &[0.2, 0.0, 0.0]).unwrap();
    sm.solver_fun(&mut f, &[0.3, 0.0, 0.0]).unwrap();
    // Two recording effects per replay (burn + coast), three replays.
    let subjects = sm.stateful_subjects();
    let craft = subjects
        .iter()
        .find_map(|s| match s {
            Subject::Spacecraft(sc) => Some(sc.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(craft.borrow().history.len(), 6);
}
