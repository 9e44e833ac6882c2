use thiserror::Error;

use crate::method::MethodId;

/// Fatal errors that abort the call that raised them.
///
/// Numerical degradation inside the step controller (non-finite error
/// estimates, the smallest allowable step still failing the error band) is
/// advisory, not fatal — see `Params::satisfies_error` on the affected
/// sample instead.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("no allowed methods were installed for this configuration")]
    NoAllowedMethods,
    #[error("unknown method: {0:?}")]
    UnknownMethod(MethodId),
    #[error("no sample brackets time {0}")]
    UnknownTime(f64),
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A single method-worker's failure, collected into `RunReport` rather than
/// aborting the whole `run` so sibling workers' results stay usable.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("worker for method {method:?} panicked: {message}")]
    Panicked { method: MethodId, message: String },
    #[error("worker for method {method:?} failed: {source}")]
    Solver {
        method: MethodId,
        #[source]
        source: SolverError,
    },
}
