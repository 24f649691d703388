use super::init_logger;
use approx::assert_relative_eq;
use hyperdual::{hyperspace_from_vector, OHyperdual};
use vela::linalg::{Vector3, U4};
use vela::md::prelude::*;

/// Three decision variables plus the real part.
type Dual = OHyperdual<f64, U4>;

/// Builds the single-impulse apoapsis plan for any calc scalar.
fn apoapsis_plan<T: CalcScalar + 'static>(dv: Vector3<T>) -> SequenceManager<T> {
    let earth = CelestialBody::earth().into_shared();
    let sc = Spacecraft::new(
        "sc1",
        OrbitState::cartesian(
            T::from_f64(7000.0),
            T::from_f64(300.0),
            T::from_f64(0.0),
            T::from_f64(0.0),
            T::from_f64(7.5),
            T::from_f64(1.0),
        ),
        Epoch::from_gregorian_utc_at_midnight(2023, 1, 1),
        CoordSystem::inertial(earth),
    )
    .into_shared();
    let toi = ImpulsiveMnvr::new("toi", LocalFrame::VNC, dv).into_shared();

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
fn residual_elements_stay_dual() {
    init_logger();
    let dv0 = Vector3::new(0.1, 0.2, 0.3);

    // Reference replay in plain doubles.
    let sm_real = apoapsis_plan::<f64>(dv0);
    let mut f_real = vec![0.0];
    sm_real
        .solver_fun(&mut f_real, &[dv0[0], dv0[1], dv0[2]])
        .unwrap();

    // Same replay with each variable seeded as an independent dual direction.
    let sm_dual = apoapsis_plan::<Dual>(Vector3::new(
        Dual::from(dv0[0]),
        Dual::from(dv0[1]),
        Dual::from(dv0[2]),
    ));
    let x: Vector3<Dual> = hyperspace_from_vector(&dv0);
    let mut f_dual = vec![Dual::from(0.0)];
    sm_dual.solver_fun(&mut f_dual, &[x[0], x[1], x[2]]).unwrap();

    // The real part matches the double replay.
    assert_relative_eq!(f_dual[0].real(), f_real[0], max_relative = 1e-10);

    // The dual parts carry d(apoapsis radius)/d(dv): the velocity-direction
    // component dominates by far.
    let d_dv_v = f_dual[0][1];
    assert!(
        d_dv_v > 100.0,
        "expected a strong apoapsis sensitivity to the prograde burn, got {d_dv_v}"
    );
    assert!(f_dual[0][2].is_finite());
    assert!(f_dual[0][3].is_finite());
}

#[test]
fn dual_set_get_round_trip() {
    init_logger();
    let sm = apoapsis_plan::<Dual>(Vector3::new(
        Dual::from(0.1),
        Dual::from(0.2),
        Dual::from(0.3),
    ));
    let x: Vector3<Dual> = hyperspace_from_vector(&Vector3::new(0.4, 0.5, 0.6));
    sm.set_variable_values(&[x[0], x[1], x[2]]).unwrap();
    let values = sm.variable_values().unwrap();
    for (i, value) in values.iter().enumerate() {
        assert_relative_eq!(value.real(), 0.4 + 0.1 * i as f64, epsilon = 1e-12);
        // The seed direction survives the write/read through the maneuver.
        assert_relative_eq!(value[i + 1], 1.0, epsilon = 1e-12);
    }
}
