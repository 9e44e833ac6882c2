use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::SolverError;

/// The user's right-hand side: `f(y_out, y_in, t)`. `y_out` is resized to
/// `y_in`'s length before the call returns. Must be safe to call
/// concurrently from several worker threads with distinct state arguments.
pub type Problem = dyn Fn(&mut Vec<f64>, &[f64], f64) + Send + Sync;

/// Stable public identifiers for the method table. Part of the public API —
/// values must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum MethodId {
    Euler = 10,
    Rk2 = 20,
    Rk4 = 30,
    ImplicitEuler = 40,
    CrankNicolson = 50,
}

/// Fixed-step integrator contract (component C2). Given `(y_prev, h,
/// t_begin, n_sub, f)`, `advance` takes `n_sub` uniform substeps of size `h`
/// starting at `t_begin` and writes the result at `t_begin + n_sub * h`
/// into `y_out`.
pub trait FixedStepMethod: Debug + Send {
    /// Sizes internal working buffers to `y0`'s length.
    fn initialize(&mut self, y0: &[f64]);

    fn advance(
        &mut self,
        y_out: &mut Vec<f64>,
        y_prev: &[f64],
        h: f64,
        t_begin: f64,
        n_sub: u64,
        f: &Problem,
    );

    /// The implicit overload. Every scheme in this core is explicit and
    /// inherits this default, which fails with `NotImplemented` — the
    /// implicit linear-algebra machinery (Jacobian build, Newton loop) is an
    /// out-of-scope collaborator; no `FixedStepMethod` implementing it
    /// exists here, so the explicit/implicit split lives in the registry's
    /// `MethodId` filtering (see `registry::MethodRegistry::build`) rather
    /// than in a method-level tag.
    fn advance_implicit(
        &mut self,
        _y_out: &mut Vec<f64>,
        _y_prev: &[f64],
        _h: f64,
        _t_begin: f64,
        _n_sub: u64,
        _f: &Problem,
    ) -> Result<(), SolverError> {
        Err(SolverError::NotImplemented(
            "implicit advance is not supported by this fixed-step scheme",
        ))
    }

    /// Reports the order the source uses to seed the theoretical
    /// convergence baseline: Euler -> 2, RK2 -> 3, RK4 -> 4 (one more than
    /// the formal truncation-error exponent `p`; kept consistent with the
    /// original implementation's convention rather than renamed).
    fn error_order(&self) -> u32;

    fn method_id(&self) -> MethodId;
}

#[derive(Debug, Default)]
pub struct Euler {
    derivative: Vec<f64>,
}

impl FixedStepMethod for Euler {
    fn initialize(&mut self, y0: &[f64]) {
        self.derivative = vec![0.0; y0.len()];
    }

    fn advance(
        &mut self,
        y_out: &mut Vec<f64>,
        y_prev: &[f64],
        h: f64,
        t_begin: f64,
        n_sub: u64,
        f: &Problem,
    ) {
        if self.derivative.len() != y_prev.len() {
            self.initialize(y_prev);
        }
        y_out.clear();
        y_out.extend_from_slice(y_prev);

        let mut t = t_begin;
        for _ in 0..n_sub {
            f(&mut self.derivative, y_out, t);
            for (y, dy) in y_out.iter_mut().zip(&self.derivative) {
                *y += h * dy;
            }
            t += h;
        }
    }

    fn error_order(&self) -> u32 {
        2
    }

    fn method_id(&self) -> MethodId {
        MethodId::Euler
    }
}

#[derive(Debug, Default)]
pub struct Rk2 {
    k1: Vec<f64>,
    k2: Vec<f64>,
    mid: Vec<f64>,
}

impl FixedStepMethod for Rk2 {
    fn initialize(&mut self, y0: &[f64]) {
        let n = y0.len();
        self.k1 = vec![0.0; n];
        self.k2 = vec![0.0; n];
        self.mid = vec![0.0; n];
    }

    fn advance(
        &mut self,
        y_out: &mut Vec<f64>,
        y_prev: &[f64],
        h: f64,
        t_begin: f64,
        n_sub: u64,
        f: &Problem,
    ) {
        let n = y_prev.len();
        if self.k1.len() != n {
            self.initialize(y_prev);
        }
        y_out.clear();
        y_out.extend_from_slice(y_prev);

        let mut t = t_begin;
        for _ in 0..n_sub {
            f(&mut self.k1, y_out, t);
            for i in 0..n {
                self.mid[i] = y_out[i] + 0.5 * h * self.k1[i];
            }
            f(&mut self.k2, &self.mid, t + 0.5 * h);
            for i in 0..n {
                y_out[i] += h * self.k2[i];
            }
            t += h;
        }
    }

    fn error_order(&self) -> u32 {
        3
    }

    fn method_id(&self) -> MethodId {
        MethodId::Rk2
    }
}

#[derive(Debug, Default)]
pub struct Rk4 {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    tmp: Vec<f64>,
}

impl FixedStepMethod for Rk4 {
    fn initialize(&mut self, y0: &[f64]) {
        let n = y0.len();
        self.k1 = vec![0.0; n];
        self.k2 = vec![0.0; n];
        self.k3 = vec![0.0; n];
        self.k4 = vec![0.0; n];
        self.tmp = vec![0.0; n];
    }

    fn advance(
        &mut self,
        y_out: &mut Vec<f64>,
        y_prev: &[f64],
        h: f64,
        t_begin: f64,
        n_sub: u64,
        f: &Problem,
    ) {
        let n = y_prev.len();
        if self.k1.len() != n {
            self.initialize(y_prev);
        }
        y_out.clear();
        y_out.extend_from_slice(y_prev);

        let mut t = t_begin;
        for _ in 0..n_sub {
            f(&mut self.k1, y_out, t);

            for i in 0..n {
                self.tmp[i] = y_out[i] + 0.5 * h * self.k1[i];
            }
            f(&mut self.k2, &self.tmp, t + 0.5 * h);

            for i in 0..n {
                self.tmp[i] = y_out[i] + 0.5 * h * self.k2[i];
            }
            f(&mut self.k3, &self.tmp, t + 0.5 * h);

            for i in 0..n {
                self.tmp[i] = y_out[i] + h * self.k3[i];
            }
            f(&mut self.k4, &self.tmp, t + h);

            for i in 0..n {
                y_out[i] += h / 6.0 * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
            }
            t += h;
        }
    }

    fn error_order(&self) -> u32 {
        4
    }

    fn method_id(&self) -> MethodId {
        MethodId::Rk4
    }
}
