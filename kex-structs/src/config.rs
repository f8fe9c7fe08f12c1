use anyhow::{anyhow, Result};
use kex_utils::load_json;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Microlp,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SolverConfig {
    pub timeout_secs: f64,
    pub eps: f64,
    pub min_solve_quantum_secs: f64,
    pub poll_interval_ms: u64,
    pub grace_period_ms: u64,
    pub decrease: bool,
    pub backend: BackendKind,
    pub worker_path: Option<PathBuf>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60.0,
            eps: 1e-6,
            min_solve_quantum_secs: 0.1,
            poll_interval_ms: 10,
            grace_period_ms: 1000,
            decrease: true,
            backend: BackendKind::Microlp,
            worker_path: None,
        }
    }
}

impl SolverConfig {
    /// Accepts an inline json string or a path to a `.json` file. Missing fields keep their defaults.
    pub fn load(source: &str) -> Result<Self> {
        let config: Self = load_json(source)?;
        config.worker_timeout()?;
        Ok(config)
    }

    /// Negative and NaN values mean no time at all.
    pub fn timeout(&self) -> Result<Duration> {
        let secs = if self.timeout_secs.is_nan() {
            0.0
        } else {
            self.timeout_secs.max(0.0)
        };
        Duration::try_from_secs_f64(secs)
            .map_err(|e| anyhow!("Invalid timeout_secs {}: {}", self.timeout_secs, e))
    }

    /// How long a worker process may run before it is killed: the timeout plus the grace period.
    pub fn worker_timeout(&self) -> Result<Duration> {
        self.timeout()?
            .checked_add(self.grace_period())
            .ok_or_else(|| anyhow!("timeout_secs plus grace_period_ms overflows"))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn with_timeout_secs(&self, timeout_secs: f64) -> Self {
        Self {
            timeout_secs,
            ..self.clone()
        }
    }
}
