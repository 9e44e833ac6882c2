//! Adaptive step-and-order ODE integration via Richardson extrapolation
//! tableaux.
//!
//! For each candidate step, the [`controller`] runs a [`method::FixedStepMethod`]
//! several times at geometrically refined sub-step counts, combines the
//! results into a higher-order estimate with a [`tableau::RichardsonTableau`],
//! and adjusts both the step size and the tableau depth to keep the local
//! error inside a caller-supplied band. Several base methods may run
//! concurrently on the same problem via [`Solver`]; the lowest-accumulated-
//! error trajectory can then be queried with [`Solver::best`].

pub mod controller;
pub mod error;
pub mod method;
pub mod params;
pub mod registry;
pub mod result;
pub mod solver;
pub mod tableau;

pub use error::{SolverError, WorkerError};
pub use method::{Euler, FixedStepMethod, MethodId, Problem, Rk2, Rk4};
pub use params::Params;
pub use result::{MethodResult, ResultStore, Sample};
pub use solver::{RunReport, Solver, WorkerStatus};
pub use tableau::RichardsonTableau;
