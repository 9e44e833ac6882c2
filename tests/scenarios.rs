//! End-to-end scenarios S1-S6.

use std::f64::consts::{E, PI};
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use richardson_ode::{MethodId, Params, Problem, Solver, SolverError};

fn exponential_growth(dy: &mut Vec<f64>, y: &[f64], _t: f64) {
    dy.clear();
    dy.extend(y.iter().copied());
}

fn exponential_decay(dy: &mut Vec<f64>, y: &[f64], _t: f64) {
    dy.clear();
    dy.extend(y.iter().map(|v| -v));
}

fn cosine(dy: &mut Vec<f64>, _y: &[f64], t: f64) {
    dy.clear();
    dy.push(t.cos());
}

fn gravity_fall(dy: &mut Vec<f64>, y: &[f64], _t: f64) {
    dy.clear();
    dy.push(y[1]);
    dy.push(-9.81);
}

#[test]
fn s1_rk4_matches_e_within_one_micro() {
    let params = Params::new()
        .with_methods(false, false, true)
        .with_error_band(1e-8, 1e-7)
        .with_table_bounds(4, 6)
        .with_reduction_factor(2)
        .with_initial_dt(0.1);
    let mut solver = Solver::new(params).unwrap().quiet();
    let f: Arc<Problem> = Arc::new(exponential_growth);
    let report = solver.run(f, vec![1.0], 0.0, 1.0).unwrap();
    assert!(report.is_success());

    let trajectory = solver.results(MethodId::Rk4).unwrap();
    let y_final = trajectory.samples().last().unwrap().y[0];
    assert_abs_diff_eq!(y_final, E, epsilon = 1e-6);
}

#[test]
fn s2_rk4_decay_matches_within_relative_tolerance() {
    let params = Params::new()
        .with_methods(false, false, true)
        .with_error_band(1e-8, 1e-7)
        .with_table_bounds(4, 6)
        .with_reduction_factor(2)
        .with_initial_dt(0.1);
    let mut solver = Solver::new(params).unwrap().quiet();
    let f: Arc<Problem> = Arc::new(exponential_decay);
    let report = solver.run(f, vec![1.0], 0.0, 10.0).unwrap();
    assert!(report.is_success());

    let trajectory = solver.results(MethodId::Rk4).unwrap();
    let y_final = trajectory.samples().last().unwrap().y[0];
    let truth = (-10.0_f64).exp();
    assert!((y_final - truth).abs() / truth <= 1e-3);
}

#[test]
fn s3_cosine_antiderivative_is_sine() {
    let params = Params::new().with_error_band(1e-9, 1e-8);
    let mut solver = Solver::new(params).unwrap().quiet();
    let f: Arc<Problem> = Arc::new(cosine);
    let report = solver.run(f, vec![0.0], 0.0, 2.0 * PI).unwrap();
    assert!(report.is_success());

    let trajectory = solver.results(MethodId::Euler).unwrap();
    let y_final = trajectory.samples().last().unwrap().y[0];
    assert_abs_diff_eq!(y_final, 0.0, epsilon = 1e-6);

    let halfway = solver.state_at(MethodId::Euler, PI / 2.0).unwrap();
    assert_abs_diff_eq!(halfway.y[0], 1.0, epsilon = 1e-6);
}

#[test]
fn s4_gravity_fall_matches_closed_form() {
    let params = Params::new()
        .with_methods(false, false, true)
        .with_error_band(1e-6, 1e-5)
        .with_table_bounds(4, 6)
        .with_initial_dt(0.1);
    let mut solver = Solver::new(params).unwrap().quiet();
    let f: Arc<Problem> = Arc::new(gravity_fall);
    let report = solver.run(f, vec![0.0, 100.0], 0.0, 20.0).unwrap();
    assert!(report.is_success());

    let trajectory = solver.results(MethodId::Rk4).unwrap();
    let y_final = trajectory.samples().last().unwrap().y[0];
    let truth = 100.0 * 20.0 - 9.81 * 20.0_f64.powi(2) / 2.0;
    assert_abs_diff_eq!(y_final, truth, epsilon = 1e-4);
}

#[test]
fn s5_three_methods_rank_by_accuracy_and_best_picks_rk4() {
    let params = Params::new()
        .with_methods(true, true, true)
        .with_error_band(1e-5, 1e-4);
    let mut solver = Solver::new(params).unwrap().quiet();
    let f: Arc<Problem> = Arc::new(exponential_growth);
    let report = solver.run(f, vec![1.0], 0.0, 1.0).unwrap();
    assert!(report.is_success());

    let euler = solver.results(MethodId::Euler).unwrap();
    let rk2 = solver.results(MethodId::Rk2).unwrap();
    let rk4 = solver.results(MethodId::Rk4).unwrap();

    for trajectory in [euler, rk2, rk4] {
        let y_final = trajectory.samples().last().unwrap().y[0];
        assert!((y_final - E).abs() < 1e-1);
    }

    assert!(rk4.final_total_error() < rk2.final_total_error());
    assert!(rk2.final_total_error() < euler.final_total_error());

    let best = solver.best().unwrap();
    assert_abs_diff_eq!(
        best.final_total_error(),
        rk4.final_total_error(),
        epsilon = 1e-15
    );
}

#[test]
fn s6_stiff_problem_fails_with_no_allowed_methods() {
    let params = Params::new()
        .with_methods(true, true, true)
        .with_problem_hints(true, false, false);
    let mut solver = Solver::new(params).unwrap().quiet();
    let f: Arc<Problem> = Arc::new(exponential_growth);
    let err = solver.run(f, vec![1.0], 0.0, 1.0).unwrap_err();
    assert!(matches!(err, SolverError::NoAllowedMethods));
}
