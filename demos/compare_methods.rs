//! Runs Euler, RK2, and RK4 concurrently on the same exponential-growth
//! problem and prints which trajectory the result store judges best. Run
//! with `cargo run --example compare_methods`.

use std::f64::consts::E;
use std::sync::Arc;

use richardson_ode::{MethodId, Params, Problem, Solver};

fn growth(dy: &mut Vec<f64>, y: &[f64], _t: f64) {
    dy.clear();
    dy.extend(y.iter().copied());
}

fn main() {
    let params = Params::new()
        .with_methods(true, true, true)
        .with_error_band(1e-5, 1e-4);

    let mut solver = Solver::new(params).expect("valid configuration");
    let f: Arc<Problem> = Arc::new(growth);
    let report = solver.run(f, vec![1.0], 0.0, 1.0).expect("no allowed methods");

    if !report.is_success() {
        for (method, err) in &report.worker_errors {
            eprintln!("{method:?} failed: {err}");
        }
    }

    for method in [MethodId::Euler, MethodId::Rk2, MethodId::Rk4] {
        let trajectory = solver.results(method).expect("method installed");
        let y_final = trajectory.samples().last().expect("at least one sample").y[0];
        println!(
            "{method:?}: y(1)={y_final:.10}  |error|={:.3e}  total_error={:.3e}",
            (y_final - E).abs(),
            trajectory.final_total_error(),
        );
    }

    let best = solver.best().expect("at least one method ran");
    println!("best trajectory ends with total_error={:.3e}", best.final_total_error());
}
