//! Dispatcher configuration.

use std::time::Duration;

use rp_planner::PlannerConfig;
use rp_spatial::GreatCircleEstimator;

use crate::{DispatchError, DispatchResult};

/// Bounded retry for lifecycle operations that meet a locked route.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetryPolicy {
    pub attempts:   u32,
    /// Sleep between attempts; doubles after each miss.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: 5, backoff_ms: 10 }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (zero-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(1 << attempt.min(10)))
    }
}

/// Global dispatcher settings.  Per-location limits live on
/// [`Location`](rp_fleet::Location).
///
/// | Field                  | Default | Meaning                                       |
/// |------------------------|---------|-----------------------------------------------|
/// | `lock_ttl_secs`        | 10      | Age after which a route lock may be broken    |
/// | `service_secs`         | 120     | Dwell at every served stop                    |
/// | `speed_kmh`            | 40      | Average speed for the default estimator       |
/// | `retry`                | 5 × 10 ms | Lifecycle lock retries                      |
/// | `max_pending_stops`    | 8       | Drivers at or over this are not offered rides |
/// | `planner`              | see [`PlannerConfig`] | Insertion and re-optimization knobs |
/// | `request_timeout_secs` | `None`  | Cancel requests waiting longer than this      |
/// | `candidate_radius_m`   | `None`  | Only offer rides to drivers this close to the pickup |
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DispatchConfig {
    pub lock_ttl_secs:        u64,
    pub service_secs:         f64,
    pub speed_kmh:            f64,
    pub retry:                RetryPolicy,
    pub max_pending_stops:    usize,
    pub planner:              PlannerConfig,
    pub request_timeout_secs: Option<u64>,
    pub candidate_radius_m:   Option<f64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            lock_ttl_secs:        10,
            service_secs:         120.0,
            speed_kmh:            40.0,
            retry:                RetryPolicy::default(),
            max_pending_stops:    8,
            planner:              PlannerConfig::default(),
            request_timeout_secs: None,
            candidate_radius_m:   None,
        }
    }
}

impl DispatchConfig {
    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Great-circle estimator at `speed_kmh`.
    pub fn estimator(&self) -> GreatCircleEstimator {
        GreatCircleEstimator::new(self.speed_kmh)
    }

    pub fn validate(&self) -> DispatchResult<()> {
        if self.lock_ttl_secs == 0 {
            return Err(DispatchError::Config("lock_ttl_secs must be positive".into()));
        }
        if !(self.service_secs.is_finite() && self.service_secs >= 0.0) {
            return Err(DispatchError::Config(format!("service_secs {} is not a duration", self.service_secs)));
        }
        if !(self.speed_kmh.is_finite() && self.speed_kmh > 0.0) {
            return Err(DispatchError::Config(format!("speed_kmh {} must be positive", self.speed_kmh)));
        }
        if let Some(r) = self.candidate_radius_m {
            if !(r.is_finite() && r > 0.0) {
                return Err(DispatchError::Config(format!("candidate_radius_m {r} must be positive")));
            }
        }
        if self.max_pending_stops < 2 {
            return Err(DispatchError::Config("max_pending_stops must leave room for one ride".into()));
        }
        Ok(())
    }
}
