use std::collections::BTreeMap;
use std::path::Path;

use crate::error::SolverError;
use crate::method::MethodId;
use crate::params::Params;

/// One accepted step: the state vector plus a full snapshot of the
/// parameter record at accept time (spec's "pair of y and a
/// snapshot-of-parameters"). `current_time` is duplicated out of the
/// snapshot for convenient, allocation-free access during interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub current_time: f64,
    pub y: Vec<f64>,
    pub params: Params,
}

impl Sample {
    pub fn new(t: f64, y: Vec<f64>, mut params: Params) -> Self {
        params.current_time = t;
        Self {
            current_time: t,
            y,
            params,
        }
    }
}

/// One method's ordered trajectory. Appends happen only from that method's
/// worker thread during `run`; readers only ever see it after the worker
/// has joined.
#[derive(Debug, Default, Clone)]
pub struct MethodResult {
    method: Option<MethodId>,
    samples: Vec<Sample>,
}

impl MethodResult {
    pub fn new(method: MethodId) -> Self {
        Self {
            method: Some(method),
            samples: Vec::new(),
        }
    }

    pub fn push(&mut self, sample: Sample) {
        debug_assert!(
            self.samples.last().map_or(true, |prev| sample.current_time > prev.current_time),
            "samples must be strictly monotone in time",
        );
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn final_total_error(&self) -> f64 {
        self.samples
            .last()
            .map(|s| s.params.total_error)
            .unwrap_or(f64::INFINITY)
    }

    /// Clamps to the first/last sample outside `[t_first, t_last]`;
    /// otherwise linearly interpolates `y`, `total_error`, `current_error`,
    /// and `current_run_time` between the bracketing samples, sets
    /// `current_time` to `tau`, and keeps every other field from the later
    /// (right) sample.
    pub fn state_at(&self, tau: f64) -> Result<Sample, SolverError> {
        let first = self.samples.first().ok_or(SolverError::UnknownTime(tau))?;
        let last = self.samples.last().ok_or(SolverError::UnknownTime(tau))?;

        if tau <= first.current_time {
            return Ok(first.clone());
        }
        if tau >= last.current_time {
            return Ok(last.clone());
        }

        let right_idx = self
            .samples
            .iter()
            .position(|s| s.current_time >= tau)
            .ok_or(SolverError::UnknownTime(tau))?;
        if right_idx == 0 {
            return Err(SolverError::UnknownTime(tau));
        }
        let left = &self.samples[right_idx - 1];
        let right = &self.samples[right_idx];

        let span = right.current_time - left.current_time;
        let frac = if span > 0.0 {
            (tau - left.current_time) / span
        } else {
            0.0
        };

        let y = left
            .y
            .iter()
            .zip(&right.y)
            .map(|(a, b)| a + frac * (b - a))
            .collect();

        let mut params = right.params;
        params.current_time = tau;
        params.total_error = left.params.total_error + frac * (right.params.total_error - left.params.total_error);
        params.current_error = left.params.current_error
            + frac * (right.params.current_error - left.params.current_error);
        params.current_run_time = left.params.current_run_time
            + frac * (right.params.current_run_time - left.params.current_run_time);

        Ok(Sample {
            current_time: tau,
            y,
            params,
        })
    }

    /// Writes `(t, y..., current_error, total_error)` for every sample to a
    /// CSV file; a convenience export over data `samples()` already
    /// exposes.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<(), SolverError> {
        let mut writer = csv::Writer::from_path(path)?;

        let dims = self.samples.first().map_or(0, |s| s.y.len());
        let mut header = vec!["t".to_string()];
        header.extend((0..dims).map(|i| format!("y{i}")));
        header.push("current_error".to_string());
        header.push("total_error".to_string());
        writer.write_record(&header)?;

        for sample in &self.samples {
            let mut record = vec![sample.current_time.to_string()];
            record.extend(sample.y.iter().map(|v| v.to_string()));
            record.push(sample.params.current_error.to_string());
            record.push(sample.params.total_error.to_string());
            writer.write_record(&record)?;
        }
        writer.flush().map_err(SolverError::Io)?;
        Ok(())
    }
}

/// Maps method-ID to its trajectory; answers trajectory/best-method/
/// interpolated-state queries (C7).
#[derive(Debug, Default)]
pub struct ResultStore {
    results: BTreeMap<MethodId, MethodResult>,
}

impl ResultStore {
    pub fn insert(&mut self, method: MethodId, result: MethodResult) {
        self.results.insert(method, result);
    }

    pub fn results(&self, method: MethodId) -> Result<&MethodResult, SolverError> {
        self.results
            .get(&method)
            .ok_or(SolverError::UnknownMethod(method))
    }

    /// The trajectory with the smallest final `total_error` across methods.
    pub fn best(&self) -> Result<&MethodResult, SolverError> {
        self.results
            .values()
            .min_by(|a, b| a.final_total_error().total_cmp(&b.final_total_error()))
            .ok_or(SolverError::NoAllowedMethods)
    }

    pub fn state_at(&self, method: MethodId, tau: f64) -> Result<Sample, SolverError> {
        self.results(method)?.state_at(tau)
    }

    pub fn state_at_best(&self, tau: f64) -> Result<Sample, SolverError> {
        self.best()?.state_at(tau)
    }

    pub fn methods(&self) -> impl Iterator<Item = MethodId> + '_ {
        self.results.keys().copied()
    }

    /// Writes every installed method's trajectory to `dir/<method>.csv`.
    pub fn to_csv_dir(&self, dir: impl AsRef<Path>) -> Result<(), SolverError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        for (id, result) in &self.results {
            result.to_csv(dir.join(format!("{id:?}.csv")))?;
        }
        Ok(())
    }
}
