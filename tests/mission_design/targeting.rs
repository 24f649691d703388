use super::init_logger;
use approx::assert_relative_eq;
use vela::linalg::Vector3;
use vela::md::prelude::*;

#[test]
fn single_impulse_apoapsis_targeting() {
    init_logger();
    let earth = CelestialBody::earth().into_shared();
    let sc = Spacecraft::new(
        "sc1",
        OrbitState::cartesian(7000.0, 300.0, 0.0, 0.0, 7.5, 1.0),
        Epoch::from_gregorian_utc_at_midnight(2023, 1, 1),
        CoordSystem::inertial(earth),
    )
    .into_shared();
    let toi = ImpulsiveMnvr::new("toi", LocalFrame::VNC, Vector3::new(0.1, 0.2, 0.3))
        .into_shared();

    let e_man = Event::maneuver("perform toi", &sc, &toi);
    // Velocity-direction burn only: the normal and co-normal components are
    // pinned to zero, and the correction is capped for a stable march.
    e_man.add_variable(
        &SolverVariable::new("toi dv", Calc::maneuver(&toi, &sc, ManeuverVar::DeltaVVector))
            .unwrap()
            .with_bounds(&[-10.0, 0.0, 0.0], &[10.0, 0.0, 0.0])
            .unwrap()
            .with_max_step(0.5)
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

    let mut solver = FiniteDiffNewton::default();
    let (solution, g) = sm.execute(&mut solver).unwrap();
    println!("x* = {}", solution.x);
    assert!(solution.converged);
    assert_relative_eq!(g[0], 45_000.0, epsilon = 1e-2);
    // Raising a ~7350 km apoapsis to 45000 km takes roughly 2.4 km/s.
    assert!(solution.x[0] > 2.0 && solution.x[0] < 2.8);
    assert_eq!(solution.x[1], 0.0);
    assert_eq!(solution.x[2], 0.0);

    let report = SolutionReport::new(&sm, &solution, &g);
    let text = format!("{report}");
    println!("{text}");
    assert!(text.contains("converged"));
    assert!(report.total_dv_km_s > 2.0 && report.total_dv_km_s < 2.8);
}

#[test]
fn two_impulse_hohmann_like_transfer() {
    init_logger();
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
    let moi = ImpulsiveMnvr::new("moi", LocalFrame::VNC, Vector3::new(0.1, 0.0, 0.0))
        .into_shared();

    let e_man = Event::maneuver("perform toi", &sc, &toi);
    e_man.add_variable(
        &SolverVariable::new("toi dv", Calc::maneuver(&toi, &sc, ManeuverVar::DeltaVVector))
            .unwrap()
            .with_bounds(&[-10.0, 0.0, 0.0], &[10.0, 0.0, 0.0])
            .unwrap()
            .with_max_step(0.5)
            .unwrap()
            .into_shared(),
    );
    let e_prop = Event::propagate_to_apoapsis("coast to apoapsis", &sc);
    let e_moi = Event::maneuver("perform moi", &sc, &moi);
    e_moi.add_variable(
        &SolverVariable::new("moi dv", Calc::maneuver(&moi, &sc, ManeuverVar::DeltaVVector))
            .unwrap()
            .with_bounds(&[-10.0, 0.0, 0.0], &[10.0, 0.0, 0.0])
            .unwrap()
            .with_max_step(0.5)
            .unwrap()
            .into_shared(),
    );
    e_moi.add_constraint(
        &Constraint::equality(Calc::orbit(&sc, OrbitVar::PosMag), &[45_000.0])
            .unwrap()
            .into_shared(),
    );
    e_moi.add_constraint(
        &Constraint::equality(Calc::orbit(&sc, OrbitVar::Ecc), &[0.0])
            .unwrap()
            .into_shared(),
    );

    let mut seq = Sequence::new();
    seq.add_event(&e_man, &[]);
    seq.add_event(&e_prop, &[e_man.clone()]);
    seq.add_event(&e_moi, &[e_prop.clone()]);
    let sm = SequenceManager::new(&seq).unwrap();

    let mut solver = FiniteDiffNewton::default();
    let (solution, g) = sm.execute(&mut solver).unwrap();
    println!("x* = {}", solution.x);
    assert!(solution.converged);
    assert_relative_eq!(g[0], 45_000.0, epsilon = 1e-2);
    assert!(g[1].abs() < 2e-3);

    let report = SolutionReport::new(&sm, &solution, &g);
    println!("{report}");
    // Classic two-burn budget from a ~7000 km orbit to a circular 45000 km one.
    assert!(report.total_dv_km_s > 3.4 && report.total_dv_km_s < 4.2);
}

#[test]
fn a_plan_without_constraints_is_underdetermined() {
    init_logger();
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
    let e_man = Event::maneuver("perform toi", &sc, &toi);
    e_man.add_variable(
        &SolverVariable::new("toi dv", Calc::maneuver(&toi, &sc, ManeuverVar::DeltaVVector))
            .unwrap()
            .into_shared(),
    );
    let mut seq = Sequence::new();
    seq.add_event(&e_man, &[]);
    let sm = SequenceManager::new(&seq).unwrap();
    assert!(matches!(
        FiniteDiffNewton::default().solve(&sm),
        Err(VelaError::UnderdeterminedProblem)
    ));
}
