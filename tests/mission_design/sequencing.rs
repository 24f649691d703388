use super::init_logger;
use vela::linalg::Vector3;
use vela::md::prelude::*;

fn leo_craft() -> (Spacecraft<f64>, CoordSystem) {
    let earth = CelestialBody::earth().into_shared();
    let coord = CoordSystem::inertial(earth);
    (
        Spacecraft::new(
            "sc1",
            OrbitState::cartesian(7000.0, 300.0, 0.0, 0.0, 7.5, 1.0),
            Epoch::from_gregorian_utc_at_midnight(2023, 1, 1),
            coord.clone(),
        ),
        coord,
    )
}

#[test]
fn single_impulse_plan_shapes() {
    init_logger();
    let (craft, _) = leo_craft();
    let sc = craft.into_shared();
    let toi = ImpulsiveMnvr::new("toi", LocalFrame::VNC, Vector3::new(0.1, 0.2, 0.3))
        .into_shared();

    let e_man = Event::maneuver("perform toi", &sc, &toi);
    let var_toi =
        SolverVariable::new("toi dv", Calc::maneuver(&toi, &sc, ManeuverVar::DeltaVVector))
            .unwrap()
            .with_bounds(&[-10.0, 0.0, 0.0], &[10.0, 0.0, 0.0])
            .unwrap()
            .into_shared();
    e_man.add_variable(&var_toi);

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

    assert_eq!(sm.sorted_events().len(), 2);
    assert_eq!(sm.ordered_vars().len(), 1);
    assert_eq!(sm.num_variables(), 3);
    assert_eq!(sm.num_constraints(), 1);
    assert_eq!(sm.var_lower(), &[-10.0, 0.0, 0.0]);
    assert_eq!(sm.var_upper(), &[10.0, 0.0, 0.0]);
    assert_eq!(sm.fun_lower(), vec![45_000.0]);
    assert_eq!(sm.fun_upper(), vec![45_000.0]);
    // The maneuver calc contributes its maneuver first, then its spacecraft.
    let kinds: Vec<&str> = sm.stateful_subjects().iter().map(Subject::kind).collect();
    assert_eq!(kinds, vec!["maneuver", "spacecraft"]);

    let x0 = sm.initial_guess().unwrap();
    assert_eq!(x0.as_slice(), &[0.1, 0.2, 0.3]);
    let mut f = vec![0.0];
    assert_eq!(sm.solver_fun(&mut f, x0.as_slice()).unwrap(), 0);
    // One residual element: the apoapsis radius after the burn.
    assert!(f[0] > 7000.0 && f[0] < 45_000.0);
}

#[test]
fn two_impulse_plan_shapes() {
    init_logger();
    let (craft, _) = leo_craft();
    let sc = craft.into_shared();
    let toi = ImpulsiveMnvr::new("toi", LocalFrame::VNC, Vector3::new(0.1, 0.0, 0.0))
        .into_shared();
    let moi = ImpulsiveMnvr::new("moi", LocalFrame::VNC, Vector3::new(0.1, 0.0, 0.0))
        .into_shared();

    let e_man = Event::maneuver("perform toi", &sc, &toi);
    e_man.add_variable(
        &SolverVariable::new("toi dv", Calc::maneuver(&toi, &sc, ManeuverVar::DeltaVVector))
            .unwrap()
            .into_shared(),
    );
    let e_prop = Event::propagate_to_apoapsis("coast to apoapsis", &sc);
    let e_moi = Event::maneuver("perform moi", &sc, &moi);
    e_moi.add_variable(
        &SolverVariable::new("moi dv", Calc::maneuver(&moi, &sc, ManeuverVar::DeltaVVector))
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

    assert_eq!(sm.ordered_vars().len(), 2);
    assert_eq!(sm.num_variables(), 6);
    assert_eq!(sm.fun_sizes(), &[1, 1]);
    assert_eq!(sm.num_constraints(), 2);
    // toi, sc1, moi in discovery order (variables first).
    let names: Vec<String> = sm.stateful_subjects().iter().map(Subject::name).collect();
    assert_eq!(names, vec!["toi", "sc1", "moi"]);

    let mut f = vec![0.0; 2];
    sm.solver_fun(&mut f, &[0.1, 0.0, 0.0, 0.1, 0.0, 0.0]).unwrap();
    assert!(f[0] > 7000.0);
    assert!(f[1] > 0.0 && f[1] < 1.0);
}

#[test]
fn cyclic_plan_is_rejected_at_manager_construction() {
    init_logger();
    let e_a = Event::<f64>::wait("A");
    let e_b = Event::<f64>::wait("B");
    let mut seq = Sequence::new();
    seq.add_event(&e_a, &[e_b.clone()]);
    seq.add_event(&e_b, &[e_a.clone()]);
    assert!(matches!(
        SequenceManager::new(&seq),
        Err(VelaError::SequenceCycle)
    ));
}

#[test]
fn diamond_sorts_deterministically() {
    init_logger();
    let (a, b, c, d) = (
        Event::<f64>::wait("A"),
        Event::<f64>::wait("B"),
        Event::<f64>::wait("C"),
        Event::<f64>::wait("D"),
    );
    let mut seq = Sequence::new();
    seq.add_event(&a, &[]);
    seq.add_event(&b, &[a.clone()]);
    seq.add_event(&c, &[a.clone()]);
    seq.add_event(&d, &[b.clone(), c.clone()]);
    let sm = SequenceManager::new(&seq).unwrap();
    let names: Vec<String> = sm.sorted_events().iter().map(Event::name).collect();
    assert_eq!(names, vec!["A", "B", "C", "D"]);
}

#[test]
fn shared_variables_dedup_but_shared_constraints_do_not() {
    init_logger();
    let (craft, _) = leo_craft();
    let sc = craft.into_shared();
    let toi = ImpulsiveMnvr::new("toi", LocalFrame::VNC, Vector3::new(0.1, 0.0, 0.0))
        .into_shared();

    let var = SolverVariable::new("toi dv", Calc::maneuver(&toi, &sc, ManeuverVar::DeltaVVector))
        .unwrap()
        .into_shared();
    let con = Constraint::bounded(Calc::orbit(&sc, OrbitVar::PosMag), Some(&[6500.0]), None)
        .unwrap()
        .into_shared();

    let e_man = Event::maneuver("perform toi", &sc, &toi);
    e_man.add_variable(&var);
    e_man.add_constraint(&con);
    let e_prop = Event::propagate_to_apoapsis("coast to apoapsis", &sc);
    // The same variable and the same constraint, listed again downstream.
    e_prop.add_variable(&var);
    e_prop.add_constraint(&con);

    let mut seq = Sequence::new();
    seq.add_event(&e_man, &[]);
    seq.add_event(&e_prop, &[e_man.clone()]);
    let sm = SequenceManager::new(&seq).unwrap();

    // Deduplicated by identity: assigned once per iteration.
    assert_eq!(sm.ordered_vars().len(), 1);
    assert_eq!(sm.num_variables(), 3);
    // Not deduplicated: sampled after each owning event, at two instants.
    assert_eq!(sm.ordered_funcs().len(), 2);
    assert_eq!(sm.num_constraints(), 2);

    let mut f = vec![0.0; 2];
    sm.solver_fun(&mut f, &[0.2, 0.0, 0.0]).unwrap();
    // Post-burn radius versus apoapsis radius: same calc, different instants.
    assert!(f[1] > f[0]);
}

#[test]
fn sequence_report_lists_events_and_subjects() {
    init_logger();
    let (craft, _) = leo_craft();
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
    let sm = SequenceManager::new(&seq).unwrap();

    let mut report = String::new();
    write_sequence_report(&sm, &mut report).unwrap();
    println!("{report}");
    for needle in [
        "perform toi",
        "coast to apoapsis",
        "toi dv",
        "PosMag of sc1",
        "sc1 (spacecraft)",
        "toi (maneuver)",
    ] {
        assert!(report.contains(needle), "missing {needle:?} in:\n{report}");
    }
}
