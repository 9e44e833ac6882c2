use serde::{Deserialize, Serialize};

use crate::error::SolverError;

/// Immutable-at-construction configuration plus the per-run mutable control
/// state the step controller revises on every call.
///
/// Each installed method owns a private `Clone` of this record for the
/// duration of `Solver::run` (see `registry`); the live-state fields below
/// are therefore never shared across methods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Params {
    // Method-enable flags.
    pub use_euler: bool,
    pub use_rk2: bool,
    pub use_rk4: bool,
    pub use_implicit_euler: bool,
    pub use_crank: bool,

    // Problem hints, consulted by the method registry.
    pub is_stiff: bool,
    pub is_large: bool,
    pub is_fast: bool,

    // Error band: lower_error < upper_error, both finite and positive.
    pub lower_error: f64,
    pub upper_error: f64,

    // Step bounds. min_dt/max_dt are multiplicative clamps on the per-step
    // revision factor, not absolute bounds on h — see DESIGN.md Open
    // Question 3. smallest_allowable_dt is the absolute floor on h.
    pub min_dt: f64,
    pub max_dt: f64,
    pub smallest_allowable_dt: f64,

    // Tableau bounds: 1 < min_table_size < max_table_size.
    pub min_table_size: usize,
    pub max_table_size: usize,
    pub current_table_size: usize,

    // Richardson reduction factor rho > 1: step at tableau row i uses
    // rho^i substeps of total step h.
    pub reduction_factor: u32,

    // Live per-run state, revised by the step controller on every call.
    pub dt: f64,
    pub c: f64,
    pub current_error: f64,
    pub total_error: f64,
    pub current_time: f64,
    pub current_run_time: f64,
    pub upgrade_factor: f64,
    pub satisfies_error: bool,
    pub last_run: bool,
    pub is_dt_clamped: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            use_euler: true,
            use_rk2: false,
            use_rk4: false,
            use_implicit_euler: false,
            use_crank: false,
            is_stiff: false,
            is_large: false,
            is_fast: false,
            lower_error: 1e-4,
            upper_error: 1e-3,
            min_dt: 0.01,
            max_dt: 0.1,
            smallest_allowable_dt: 1e-5,
            min_table_size: 4,
            max_table_size: 8,
            current_table_size: 4,
            reduction_factor: 2,
            dt: 0.01,
            c: -1.0,
            current_error: 0.0,
            total_error: 0.0,
            current_time: 0.0,
            current_run_time: 0.0,
            upgrade_factor: 0.0,
            satisfies_error: false,
            last_run: false,
            is_dt_clamped: false,
        }
    }
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_methods(mut self, euler: bool, rk2: bool, rk4: bool) -> Self {
        self.use_euler = euler;
        self.use_rk2 = rk2;
        self.use_rk4 = rk4;
        self
    }

    pub fn with_problem_hints(mut self, is_stiff: bool, is_large: bool, is_fast: bool) -> Self {
        self.is_stiff = is_stiff;
        self.is_large = is_large;
        self.is_fast = is_fast;
        self
    }

    pub fn with_error_band(mut self, lower_error: f64, upper_error: f64) -> Self {
        self.lower_error = lower_error;
        self.upper_error = upper_error;
        self
    }

    pub fn with_step_bounds(mut self, min_dt: f64, max_dt: f64, smallest_allowable_dt: f64) -> Self {
        self.min_dt = min_dt;
        self.max_dt = max_dt;
        self.smallest_allowable_dt = smallest_allowable_dt;
        self
    }

    pub fn with_table_bounds(mut self, min_table_size: usize, max_table_size: usize) -> Self {
        self.min_table_size = min_table_size;
        self.max_table_size = max_table_size;
        self.current_table_size = min_table_size;
        self
    }

    pub fn with_reduction_factor(mut self, reduction_factor: u32) -> Self {
        self.reduction_factor = reduction_factor;
        self
    }

    pub fn with_initial_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Validates every invariant in the data model. Called by `Solver::new`
    /// and `Solver::refresh`; violations fail with `InvalidConfig`.
    pub fn validate(&self) -> Result<(), SolverError> {
        if !(self.lower_error.is_finite() && self.upper_error.is_finite()) {
            return Err(SolverError::InvalidConfig(
                "lower_error and upper_error must be finite".into(),
            ));
        }
        if !(self.lower_error > 0.0 && self.lower_error < self.upper_error) {
            return Err(SolverError::InvalidConfig(
                "require 0 < lower_error < upper_error".into(),
            ));
        }
        if !(self.min_dt > 0.0 && self.min_dt < self.max_dt) {
            return Err(SolverError::InvalidConfig(
                "require 0 < min_dt < max_dt".into(),
            ));
        }
        if !(self.smallest_allowable_dt > 0.0) {
            return Err(SolverError::InvalidConfig(
                "smallest_allowable_dt must be positive".into(),
            ));
        }
        if !(self.min_table_size > 1 && self.min_table_size < self.max_table_size) {
            return Err(SolverError::InvalidConfig(
                "require 1 < min_table_size < max_table_size".into(),
            ));
        }
        if self.reduction_factor <= 1 {
            return Err(SolverError::InvalidConfig(
                "reduction_factor must be greater than 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Params::new().validate().unwrap();
    }

    #[test]
    fn error_band_invariant() {
        let p = Params::new().with_error_band(1e-3, 1e-4);
        assert!(matches!(p.validate(), Err(SolverError::InvalidConfig(_))));
    }

    #[test]
    fn step_bounds_invariant() {
        let p = Params::new().with_step_bounds(0.1, 0.01, 1e-5);
        assert!(matches!(p.validate(), Err(SolverError::InvalidConfig(_))));
    }

    #[test]
    fn table_size_invariant() {
        let p = Params::new().with_table_bounds(1, 8);
        assert!(matches!(p.validate(), Err(SolverError::InvalidConfig(_))));

        let p = Params::new().with_table_bounds(8, 4);
        assert!(matches!(p.validate(), Err(SolverError::InvalidConfig(_))));
    }

    #[test]
    fn reduction_factor_invariant() {
        let p = Params::new().with_reduction_factor(1);
        assert!(matches!(p.validate(), Err(SolverError::InvalidConfig(_))));
    }
}
