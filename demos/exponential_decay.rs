//! `y' = -y, y(0) = 1` integrated with RK4 and printed at a handful of
//! checkpoints. Run with `cargo run --example exponential_decay`.

use std::sync::Arc;

use richardson_ode::{MethodId, Params, Problem, Solver};

fn decay(dy: &mut Vec<f64>, y: &[f64], _t: f64) {
    dy.clear();
    dy.extend(y.iter().map(|v| -v));
}

fn main() {
    let params = Params::new()
        .with_methods(false, false, true)
        .with_error_band(1e-8, 1e-7)
        .with_table_bounds(4, 6)
        .with_initial_dt(0.1);

    let mut solver = Solver::new(params).expect("valid configuration");
    let f: Arc<Problem> = Arc::new(decay);
    let report = solver.run(f, vec![1.0], 0.0, 10.0).expect("no allowed methods");

    if !report.is_success() {
        for (method, err) in &report.worker_errors {
            eprintln!("{method:?} failed: {err}");
        }
    }

    let trajectory = solver.results(MethodId::Rk4).expect("rk4 installed");
    for t in [0.0, 2.5, 5.0, 7.5, 10.0] {
        let sample = trajectory.state_at(t).expect("interpolatable");
        println!("t={t:>5.2}  y={:.10}", sample.y[0]);
    }
}
