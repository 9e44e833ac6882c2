use crate::method::{FixedStepMethod, Problem};
use crate::params::Params;
use crate::tableau::RichardsonTableau;

/// Drives one accepted time step: grows the tableau depth or shrinks the
/// step size until the global-error model is satisfied, then returns the
/// extrapolated state. This is the algorithmic heart of the crate; the rest
/// of the system exists to feed it and to record what it produces.
pub fn advance_one_step(
    method: &mut dyn FixedStepMethod,
    tableau: &mut RichardsonTableau,
    params: &mut Params,
    y_cur: &[f64],
    t_begin: f64,
    t_end: f64,
    f: &Problem,
) -> Vec<f64> {
    params.satisfies_error = false;
    params.c = method.error_order() as f64 + params.min_table_size as f64;

    update_dt(params, true, t_begin, t_end);

    let t_wall_begin = std::time::Instant::now();
    let mut y_next = y_cur.to_vec();

    loop {
        let k = params.current_table_size;
        tableau.initialize_steps(params.reduction_factor, params.dt);
        tableau.build_tables(k, y_cur.len());

        for i in 0..k {
            let n_sub = tableau.substeps(i);
            let h_arg = params.dt / n_sub as f64;
            let mut y_row = Vec::new();
            method.advance(&mut y_row, y_cur, h_arg, t_begin, n_sub, f);
            tableau.append(i, 0, &y_row);
        }

        let (best, current_error, c) = tableau.extrapolate_and_error();
        y_next = best;
        params.current_error = current_error;
        params.c = c;

        log::trace!(
            "{:?}: dt={:.6e} table_size={} error={:.6e}",
            method.method_id(),
            params.dt,
            params.current_table_size,
            current_error,
        );

        if !update_dt(params, false, t_begin, t_end) {
            break;
        }
    }

    params.current_run_time += t_wall_begin.elapsed().as_secs_f64();

    log::debug!(
        "{:?}: step accepted at t={:.6} dt={:.6e} satisfies_error={}",
        method.method_id(),
        t_begin,
        params.dt,
        params.satisfies_error,
    );

    y_next
}

/// Revises `(dt, current_table_size)` for the current phase of
/// `advance_one_step`'s inner loop. Returns whether the loop should keep
/// iterating (`true`) or the step is accepted (`false`).
pub fn update_dt(params: &mut Params, first_pass: bool, t_begin: f64, t_end: f64) -> bool {
    if first_pass {
        if !(params.is_stiff || params.is_fast || params.is_dt_clamped) {
            params.current_table_size = params.min_table_size;
        }
        if params.upgrade_factor > 1.0 {
            params.dt *= params.upgrade_factor;
        }
        params.satisfies_error = false;
        params.last_run = false;
        params.is_dt_clamped = false;

        if params.dt + t_begin > t_end {
            params.dt = t_end - t_begin;
            params.current_table_size = params.max_table_size;
            params.last_run = true;
        }
        return true;
    }

    let remaining_steps = if params.dt > 0.0 {
        ((t_end - t_begin) / params.dt).floor()
    } else {
        0.0
    };
    let global_error = params.total_error + remaining_steps * params.current_error;

    if params.last_run {
        params.satisfies_error = params.current_error <= params.upper_error;
        params.total_error += params.current_error;
        return false;
    }

    let c_usable = params.c.is_finite() && params.c > 0.0;

    if global_error > params.upper_error && c_usable && !params.is_dt_clamped {
        let desired = (params.upper_error / global_error)
            .powf(1.0 / params.c)
            .clamp(params.min_dt, params.max_dt);
        params.dt *= 0.9 * desired;
        params.current_table_size = (params.current_table_size + 1).min(params.max_table_size);
        if params.dt < params.smallest_allowable_dt {
            params.dt = params.smallest_allowable_dt;
            params.is_dt_clamped = true;
        }
        true
    } else {
        let mut desired = if c_usable {
            (params.upper_error / params.current_error)
                .powf(1.0 / params.c)
                .clamp(params.min_dt, params.max_dt)
        } else {
            params.min_dt
        };
        params.upgrade_factor = desired;

        if global_error <= params.lower_error {
            desired = if c_usable {
                (params.lower_error / params.current_error)
                    .powf(1.0 / params.c)
                    .clamp(params.min_dt, params.max_dt)
            } else {
                params.min_dt
            };
            params.upgrade_factor = desired;
            params.current_table_size = (params.current_table_size - 1).max(params.min_table_size);
        }

        params.satisfies_error = true;
        params.total_error += params.current_error;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Rk4;

    fn exponential(dy: &mut Vec<f64>, y: &[f64], _t: f64) {
        dy.clear();
        dy.extend(y.iter().copied());
    }

    #[test]
    fn first_pass_clamps_final_step_to_t_end() {
        let mut params = Params::new().with_initial_dt(0.2);
        update_dt(&mut params, true, 0.95, 1.0);
        assert!((params.dt - 0.05).abs() < 1e-12);
        assert!(params.last_run);
        assert_eq!(params.current_table_size, params.max_table_size);
    }

    #[test]
    fn table_size_stays_within_bounds_across_many_iterations() {
        let mut params = Params::new();
        params.current_error = 1.0;
        params.c = 2.0;
        for _ in 0..50 {
            update_dt(&mut params, false, 0.0, 100.0);
            assert!(params.current_table_size >= params.min_table_size);
            assert!(params.current_table_size <= params.max_table_size);
        }
    }

    #[test]
    fn non_finite_c_is_treated_as_accept_and_move_on() {
        let mut params = Params::new();
        params.current_error = 1e-6;
        params.c = f64::NAN;
        params.total_error = 0.0;
        let keep_going = update_dt(&mut params, false, 0.0, 1.0);
        assert!(!keep_going);
        assert!(params.satisfies_error);
    }

    #[test]
    fn dt_never_drops_below_smallest_allowable() {
        let mut params = Params::new().with_step_bounds(0.5, 0.9, 1e-5);
        params.current_error = 1e3;
        params.c = 1.0;
        params.total_error = 0.0;
        update_dt(&mut params, false, 0.0, 1000.0);
        assert!(params.dt >= params.smallest_allowable_dt);
    }

    #[test]
    fn advance_one_step_converges_on_gentle_exponential() {
        let mut method = Rk4::default();
        let mut tableau = RichardsonTableau::new();
        let mut params = Params::new()
            .with_methods(false, false, true)
            .with_error_band(1e-8, 1e-7)
            .with_table_bounds(4, 6)
            .with_initial_dt(0.1);

        let y_cur = vec![1.0];
        let y_next = advance_one_step(&mut method, &mut tableau, &mut params, &y_cur, 0.0, 1.0, &exponential);
        assert!(y_next[0] > 1.0);
        assert!(params.current_table_size >= params.min_table_size);
        assert!(params.current_table_size <= params.max_table_size);
    }
}
