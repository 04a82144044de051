//! Concrete scenarios (S1-S6) against the published rigging API.

use slackline::{build_constraints, SlacklineError, SolverOptions, WebbingMaterial};

fn material() -> WebbingMaterial {
    WebbingMaterial::new("test", 0.088, 9.81, 250_000.0).unwrap()
}

fn value_at(xs: &[f64], ys: &[f64], target: f64) -> f64 {
    let idx = xs
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - target).abs().partial_cmp(&(*b - target).abs()).unwrap())
        .map(|(i, _)| i)
        .unwrap();
    ys[idx]
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn s1_unloaded_midpoint_sag_and_natural_length() {
    init_logging();
    let constraints = build_constraints(material(), 25.0, 2000.0).unwrap();
    let profile = constraints
        .rig_with_options(&SolverOptions {
            length_cutoff: 60.0,
            ..SolverOptions::default()
        })
        .unwrap();

    let sag = value_at(&profile.x, &profile.y, 12.5);
    assert!((0.02..=0.08).contains(&sag), "sag = {sag}");

    let n_final = *profile.n.last().unwrap();
    assert!((24.95..=25.00).contains(&n_final), "n_final = {n_final}");
}

#[test]
fn s2_single_central_load_raises_sag_and_tension() {
    let mut constraints = build_constraints(material(), 25.0, 2000.0).unwrap();
    constraints.add_load(12.5, 80.0).unwrap();
    let options = SolverOptions {
        length_cutoff: 60.0,
        ..SolverOptions::default()
    };
    let profile = constraints.rig_with_options(&options).unwrap();

    let sag = value_at(&profile.x, &profile.y, 12.5);
    assert!((0.6..=1.0).contains(&sag), "sag = {sag}");

    let max_tension = profile.tension.iter().cloned().fold(f64::MIN, f64::max);
    assert!(
        max_tension >= 2.0 * 2000.0 && max_tension <= 4.0 * 2000.0,
        "max_tension = {max_tension}"
    );

    // Symmetry: sample near x and L-x and compare sag.
    let left = value_at(&profile.x, &profile.y, 5.0);
    let right = value_at(&profile.x, &profile.y, 20.0);
    assert!((left - right).abs() < 1e-2, "left={left} right={right}");
}

#[test]
fn s3_two_loads_produce_two_local_sag_maxima() {
    let mut constraints = build_constraints(material(), 100.0, 3000.0).unwrap();
    constraints.add_load(30.0, 70.0).unwrap();
    constraints.add_load(70.0, 80.0).unwrap();
    let options = SolverOptions {
        length_cutoff: 300.0,
        max_steps_per_segment: 500_000,
        ..SolverOptions::default()
    };
    let profile = constraints.rig_with_options(&options).unwrap();

    let sag_30 = value_at(&profile.x, &profile.y, 30.0);
    let sag_70 = value_at(&profile.x, &profile.y, 70.0);
    let sag_10 = value_at(&profile.x, &profile.y, 10.0);
    let sag_90 = value_at(&profile.x, &profile.y, 90.0);
    assert!(sag_30 > sag_10, "sag near first load should exceed nearby baseline");
    assert!(sag_70 > sag_90, "sag near second load should exceed nearby baseline");
}

#[test]
fn s4_dynamic_pluck_decays_and_reaches_requested_frames() {
    let constraints = build_constraints(material(), 25.0, 2000.0).unwrap();
    let options = SolverOptions {
        length_cutoff: 60.0,
        ..SolverOptions::default()
    };
    let dyn_constraints = constraints.with_dynamics_options(30, 0.05, &options).unwrap();
    let (profile, equilibrium_y) = dyn_constraints
        .simulate_pluck(0.0, 2.0, 60, 12.5, 0.2, 1.5)
        .unwrap();

    assert_eq!(profile.t.len(), 60);
    let deviation = |frame: &[f64]| -> f64 {
        frame
            .iter()
            .zip(&equilibrium_y)
            .map(|(y, eq)| (y - eq).abs())
            .fold(0.0, f64::max)
    };
    let first_extent = deviation(&profile.y[0]);
    let last_extent = deviation(profile.y.last().unwrap());
    assert!(last_extent <= first_extent + 1e-6);
}

#[test]
fn s5_long_span_bvp_converges() {
    let mut constraints = build_constraints(material(), 500.0, 8000.0).unwrap();
    constraints.add_load(100.0, 75.0).unwrap();
    let options = SolverOptions {
        length_cutoff: 1500.0,
        max_steps_per_segment: 1_000_000,
        ..SolverOptions::default()
    };
    let profile = constraints.rig_with_options(&options).unwrap();
    assert!(profile.x.len() > 2);
}

#[test]
fn s6_boundary_loads_are_filtered_not_rejected() {
    let mut constraints = build_constraints(material(), 25.0, 2000.0).unwrap();
    assert!(constraints.add_load(0.0, 70.0).is_ok());
    assert!(constraints.add_load(25.0, 70.0).is_ok());
    assert!(constraints.loads.is_empty());
}

#[test]
fn s6_nonpositive_mass_is_invalid_input() {
    let mut constraints = build_constraints(material(), 25.0, 2000.0).unwrap();
    let err = constraints.add_load(12.5, 0.0).unwrap_err();
    assert!(matches!(err, SlacklineError::InvalidInput { .. }));
}

#[test]
fn s6_nonpositive_gap_length_is_invalid_input() {
    let err = build_constraints(material(), 0.0, 2000.0).unwrap_err();
    assert!(matches!(err, SlacklineError::InvalidInput { .. }));
}
