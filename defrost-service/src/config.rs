use std::{collections::HashSet, fs, path::PathBuf};

use defrost_client::domain::Zone;
use serde::Deserialize;

use crate::{engine::EngineConfig, sources::CsvOptions};

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    pub path: PathBuf,
    pub rated_power_kw: f64,
}

impl ZoneConfig {
    pub fn zone(&self) -> Zone {
        Zone::new(self.name.clone(), self.rated_power_kw)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefrostConfig {
    pub cycles_per_day: u32,
    pub cycle_minutes: f64,
}

impl Default for DefrostConfig {
    fn default() -> Self {
        Self {
            cycles_per_day: 4,
            cycle_minutes: 45.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemperatureConfig {
    pub setpoint_c: f64,
    pub default_delta_k: f64,
    pub recovery_start_minutes: i64,
    pub recovery_end_minutes: i64,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            setpoint_c: -20.0,
            default_delta_k: 2.0,
            recovery_start_minutes: 45,
            recovery_end_minutes: 75,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    pub delimiter: char,
    pub defrost_status_column: String,
    pub ambient_temperature_column: String,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            defrost_status_column: "Defrost Status ()".to_string(),
            ambient_temperature_column: "Ambient Temperature (°C)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub zones: Vec<ZoneConfig>,
    #[serde(default)]
    pub defrost: DefrostConfig,
    #[serde(default)]
    pub temperature: TemperatureConfig,
    #[serde(default)]
    pub csv: CsvConfig,
    pub server: Option<ServerConfig>,
    pub metrics: Option<MetricsConfig>,
}

/// Bounds of the tolerance input of the dashboard.
pub const MAX_DELTA_K: f64 = 10.0;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("no zones configured")]
    NoZones,
    #[error("zone '{0}' is configured more than once")]
    DuplicateZone(String),
    #[error("zone '{zone}' has invalid rated power {value} kW")]
    InvalidRatedPower { zone: String, value: f64 },
    #[error("defrost cycle duration must be positive, got {0} minutes")]
    InvalidCycleDuration(f64),
    #[error("recovery window end ({end} min) must be after its start ({start} min)")]
    InvalidRecoveryWindow { start: i64, end: i64 },
    #[error("tolerance must be within [0, 10] K, got {0}")]
    InvalidDelta(f64),
    #[error("CSV delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(char),
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("DEFROST_CONFIG").unwrap_or_else(|_| "defrost-config.toml".to_string());
        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config '{path}': {e}"))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zones.is_empty() {
            return Err(ConfigError::NoZones);
        }

        let mut seen = HashSet::new();
        for z in &self.zones {
            if !seen.insert(z.name.as_str()) {
                return Err(ConfigError::DuplicateZone(z.name.clone()));
            }
            if !z.rated_power_kw.is_finite() || z.rated_power_kw < 0.0 {
                return Err(ConfigError::InvalidRatedPower {
                    zone: z.name.clone(),
                    value: z.rated_power_kw,
                });
            }
        }

        if !(self.defrost.cycle_minutes.is_finite() && self.defrost.cycle_minutes > 0.0) {
            return Err(ConfigError::InvalidCycleDuration(self.defrost.cycle_minutes));
        }

        let t = &self.temperature;
        if t.recovery_start_minutes < 0 || t.recovery_end_minutes <= t.recovery_start_minutes {
            return Err(ConfigError::InvalidRecoveryWindow {
                start: t.recovery_start_minutes,
                end: t.recovery_end_minutes,
            });
        }
        validate_delta(t.default_delta_k)?;

        if !self.csv.delimiter.is_ascii() {
            return Err(ConfigError::InvalidDelimiter(self.csv.delimiter));
        }

        Ok(())
    }

    pub fn zones(&self) -> Vec<Zone> {
        self.zones.iter().map(ZoneConfig::zone).collect()
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            cycles_per_day: self.defrost.cycles_per_day,
            cycle_hours: self.defrost.cycle_minutes / 60.0,
            setpoint_c: self.temperature.setpoint_c,
            recovery_start: time::Duration::minutes(self.temperature.recovery_start_minutes),
            recovery_end: time::Duration::minutes(self.temperature.recovery_end_minutes),
        }
    }

    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            // validate() guarantees an ASCII delimiter.
            delimiter: self.csv.delimiter as u8,
            defrost_status_column: self.csv.defrost_status_column.clone(),
            ambient_temperature_column: self.csv.ambient_temperature_column.clone(),
        }
    }
}

pub fn validate_delta(delta_k: f64) -> Result<f64, ConfigError> {
    if delta_k.is_finite() && (0.0..=MAX_DELTA_K).contains(&delta_k) {
        Ok(delta_k)
    } else {
        Err(ConfigError::InvalidDelta(delta_k))
    }
}
