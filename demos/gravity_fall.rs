//! 1-D gravity fall: `y' = v, v' = -9.81`, `y(0) = 0, v(0) = 100` over
//! `[0, 20]`. Run with `cargo run --example gravity_fall`.

use std::sync::Arc;

use richardson_ode::{MethodId, Params, Problem, Solver};

fn gravity(dy: &mut Vec<f64>, y: &[f64], _t: f64) {
    dy.clear();
    dy.push(y[1]);
    dy.push(-9.81);
}

fn main() {
    let params = Params::new()
        .with_methods(false, false, true)
        .with_error_band(1e-6, 1e-5)
        .with_table_bounds(4, 6)
        .with_initial_dt(0.1);

    let mut solver = Solver::new(params).expect("valid configuration");
    let f: Arc<Problem> = Arc::new(gravity);
    let report = solver
        .run(f, vec![0.0, 100.0], 0.0, 20.0)
        .expect("no allowed methods");

    if !report.is_success() {
        for (method, err) in &report.worker_errors {
            eprintln!("{method:?} failed: {err}");
        }
    }

    let trajectory = solver.results(MethodId::Rk4).expect("rk4 installed");
    let last = trajectory.samples().last().expect("at least one sample");
    println!(
        "y(20) = {:.6}  (closed form: {:.6})",
        last.y[0],
        100.0 * 20.0 - 9.81 * 20.0_f64.powi(2) / 2.0,
    );
}
