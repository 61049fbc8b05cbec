//! Defrost efficiency and temperature compliance computations.
//!
//! Everything here is synchronous and works on an already loaded
//! [`ZoneSeries`](defrost_client::queries::ZoneSeries).

pub mod compliance;
pub mod defrost;

use time::Duration;

pub use compliance::{forward_fill, recovery_mask, temperature_compliance};
pub use defrost::{aggregate, compute_metrics, defrost_events, rising_edges};

/// Fixed parameters of the reference deployment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Scheduled defrost cycles per day.
    pub cycles_per_day: u32,
    /// Nominal duration of one cycle, in hours.
    pub cycle_hours: f64,
    pub setpoint_c: f64,
    /// Recovery window after a defrost event: `(t0 + start, t0 + end]`.
    pub recovery_start: Duration,
    pub recovery_end: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycles_per_day: 4,
            cycle_hours: 45.0 / 60.0,
            setpoint_c: -20.0,
            recovery_start: Duration::minutes(45),
            recovery_end: Duration::minutes(75),
        }
    }
}
