use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::controller::advance_one_step;
use crate::error::{SolverError, WorkerError};
use crate::method::{MethodId, Problem};
use crate::params::Params;
use crate::registry::MethodRegistry;
use crate::result::{MethodResult, ResultStore, Sample};

/// One worker's published progress, read by the monitor thread. `current_time`
/// is the `f64` bit pattern so the monitor never observes a torn read, and no
/// fresh lock is taken per integration step — one `Arc` per worker, shared
/// for the run's duration.
#[derive(Debug, Default)]
pub struct WorkerStatus {
    current_time: AtomicU64,
    last_run: AtomicBool,
}

impl WorkerStatus {
    fn publish(&self, t: f64, last_run: bool) {
        self.current_time.store(t.to_bits(), Ordering::Relaxed);
        self.last_run.store(last_run, Ordering::Relaxed);
    }

    pub fn current_time(&self) -> f64 {
        f64::from_bits(self.current_time.load(Ordering::Relaxed))
    }

    pub fn last_run(&self) -> bool {
        self.last_run.load(Ordering::Relaxed)
    }
}

/// Outcome of `Solver::run`: the result store for every worker that
/// completed plus any per-worker failures. A worker failing never aborts
/// its siblings.
#[derive(Debug, Default)]
pub struct RunReport {
    pub worker_errors: Vec<(MethodId, WorkerError)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.worker_errors.is_empty()
    }
}

/// Owns the method registry and drives one OS thread per installed method
/// plus a dedicated progress-monitor thread — never a work-stealing pool,
/// per the concurrency model this core requires.
pub struct Solver {
    params: Params,
    registry: MethodRegistry,
    quiet: bool,
    store: ResultStore,
}

impl Solver {
    pub fn new(params: Params) -> Result<Self, SolverError> {
        params.validate()?;
        let registry = MethodRegistry::build(&params);
        Ok(Self {
            params,
            registry,
            quiet: false,
            store: ResultStore::default(),
        })
    }

    /// Suppresses the `indicatif` progress bars; used by tests and by
    /// callers embedding the solver in their own UI.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Clears methods, parameter copies, trajectories, and the result
    /// store, then rebuilds the registry from `params`.
    pub fn refresh(&mut self, params: Params) -> Result<(), SolverError> {
        params.validate()?;
        self.params = params;
        self.registry = MethodRegistry::build(&self.params);
        self.store = ResultStore::default();
        Ok(())
    }

    /// Runs every installed method to completion on `[t0, t_end]`,
    /// starting from `y0`. `f` is shared read-only across worker threads
    /// and must be thread-safe.
    pub fn run(
        &mut self,
        f: Arc<Problem>,
        y0: Vec<f64>,
        t0: f64,
        t_end: f64,
    ) -> Result<RunReport, SolverError> {
        self.params.validate()?;
        let registry = MethodRegistry::build(&self.params);
        if registry.is_empty() {
            return Err(SolverError::NoAllowedMethods);
        }
        self.store = ResultStore::default();
        let entries = registry.into_entries();

        let multi = (!self.quiet).then(MultiProgress::new);
        let style = ProgressStyle::with_template("{prefix:>14} [{bar:40}] {percent}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar());

        let mut handles = Vec::new();
        let mut monitored = Vec::new();

        for (id, entry) in entries {
            let status = Arc::new(WorkerStatus::default());

            let bar = multi.as_ref().map(|m| {
                let bar = m.add(ProgressBar::new(100));
                bar.set_style(style.clone());
                bar.set_prefix(format!("{id:?}"));
                bar
            });
            monitored.push((Arc::clone(&status), bar));

            let f = Arc::clone(&f);
            let y0 = y0.clone();
            let status = Arc::clone(&status);

            let handle = std::thread::Builder::new()
                .name(format!("method-{id:?}"))
                .spawn(move || run_worker(id, entry, f, y0, t0, t_end, status))
                .expect("failed to spawn method worker thread");
            handles.push((id, handle));
        }

        let monitor = multi.map(|multi| {
            std::thread::spawn(move || monitor_progress(monitored, t0, t_end, multi))
        });

        let mut report = RunReport::default();
        for (id, handle) in handles {
            match handle.join() {
                Ok(Ok((_entry, result))) => {
                    self.store.insert(id, result);
                }
                Ok(Err(err)) => report.worker_errors.push((
                    id,
                    WorkerError::Solver {
                        method: id,
                        source: err,
                    },
                )),
                Err(panic) => {
                    let message = panic_message(&panic);
                    report.worker_errors.push((
                        id,
                        WorkerError::Panicked { method: id, message },
                    ));
                }
            }
        }

        if let Some(monitor) = monitor {
            let _ = monitor.join();
        }

        Ok(report)
    }

    pub fn results(&self, method: MethodId) -> Result<&MethodResult, SolverError> {
        self.store.results(method)
    }

    pub fn best(&self) -> Result<&MethodResult, SolverError> {
        self.store.best()
    }

    pub fn state_at(&self, method: MethodId, tau: f64) -> Result<Sample, SolverError> {
        self.store.state_at(method, tau)
    }

    pub fn state_at_best(&self, tau: f64) -> Result<Sample, SolverError> {
        self.store.state_at_best(tau)
    }

    pub fn methods(&self) -> impl Iterator<Item = MethodId> + '_ {
        self.store.methods()
    }
}

type WorkerOutcome = (crate::registry::MethodEntry, MethodResult);

fn run_worker(
    id: MethodId,
    mut entry: crate::registry::MethodEntry,
    f: Arc<Problem>,
    y0: Vec<f64>,
    t0: f64,
    t_end: f64,
    status: Arc<WorkerStatus>,
) -> Result<WorkerOutcome, SolverError> {
    entry.method.initialize(&y0);
    let mut result = MethodResult::new(id);

    let mut y = y0;
    let mut t = t0;
    result.push(Sample::new(t, y.clone(), entry.params));
    status.publish(t, entry.params.last_run);

    while t < t_end {
        y = advance_one_step(
            entry.method.as_mut(),
            &mut entry.tableau,
            &mut entry.params,
            &y,
            t,
            t_end,
            f.as_ref(),
        );
        t += entry.params.dt;
        entry.params.current_time = t;

        result.push(Sample::new(t, y.clone(), entry.params));
        status.publish(t, entry.params.last_run);
    }

    Ok((entry, result))
}

/// Periodically reads every worker's published `(current_time, last_run)`
/// and ticks its progress bar from it; terminates once every worker has
/// reached `last_run`. Purely observational — it only reads shared status
/// and touches its own bars, never worker state.
fn monitor_progress(
    workers: Vec<(Arc<WorkerStatus>, Option<ProgressBar>)>,
    t0: f64,
    t_end: f64,
    _multi: MultiProgress,
) {
    let span = t_end - t0;
    loop {
        let mut all_done = true;
        for (status, bar) in &workers {
            let t = status.current_time();
            let last_run = status.last_run();
            all_done &= last_run;

            if let Some(bar) = bar {
                let pct = if span > 0.0 {
                    (((t - t0) / span) * 100.0).clamp(0.0, 100.0)
                } else {
                    100.0
                };
                bar.set_position(pct as u64);
                if last_run {
                    bar.finish_and_clear();
                }
            }
        }

        if all_done {
            return;
        }
        std::thread::sleep(Duration::from_secs(2));
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exponential(dy: &mut Vec<f64>, y: &[f64], _t: f64) {
        dy.clear();
        dy.extend(y.iter().copied());
    }

    #[test]
    fn stiff_config_fails_with_no_allowed_methods() {
        let params = Params::new().with_problem_hints(true, false, false);
        let mut solver = Solver::new(params).unwrap().quiet();
        let f: Arc<Problem> = Arc::new(exponential);
        let err = solver.run(f, vec![1.0], 0.0, 1.0).unwrap_err();
        assert!(matches!(err, SolverError::NoAllowedMethods));
    }

    #[test]
    fn single_method_run_produces_monotone_trajectory() {
        let params = Params::new()
            .with_methods(false, false, true)
            .with_error_band(1e-8, 1e-7)
            .with_table_bounds(4, 6)
            .with_initial_dt(0.1);
        let mut solver = Solver::new(params).unwrap().quiet();
        let f: Arc<Problem> = Arc::new(exponential);
        let report = solver.run(f, vec![1.0], 0.0, 1.0).unwrap();
        assert!(report.is_success());

        let trajectory = solver.results(MethodId::Rk4).unwrap();
        let times: Vec<f64> = trajectory.samples().iter().map(|s| s.current_time).collect();
        for pair in times.windows(2) {
            assert!(pair[1] > pair[0]);
        }
        assert!((times.last().unwrap() - 1.0).abs() < 1e-4);
    }
}
