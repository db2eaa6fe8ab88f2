//! Application configuration.
//!
//! Loaded from a JSON file (every field optional, missing ones take their
//! defaults) and then overridden by command-line flags.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dsp::{SamplingPolicy, SignalParameters};
use crate::error::{ScopeError, ScopeResult};

/// Scrolling oscilloscope timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Width of the visible window in time units.
    pub window_duration: f64,
    /// Wall-clock period between ticks, in milliseconds.
    pub tick_period_ms: u64,
    /// Time units the window advances per tick. Smaller than the tick
    /// period, so the trace scrolls slower than real time.
    pub tick_time_step: f64,
}

impl ScrollConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            window_duration: 0.1,
            tick_period_ms: 50,
            tick_time_step: 0.001,
        }
    }
}

/// Rendering surface readiness polling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub poll_interval_ms: u64,
}

impl SurfaceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

/// Leading windows shown by the static displays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Clip point for the analog modulated signal.
    pub analog_x_max: f64,
    /// Clip point for the digital displays.
    pub digital_x_max: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            analog_x_max: 0.1,
            digital_x_max: 0.2,
        }
    }
}

/// Where modulated waveforms come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Compute in-process.
    #[default]
    Local,
    /// Ask the remote modulation service.
    Http,
}

impl std::str::FromStr for BackendMode {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(BackendMode::Local),
            "http" => Ok(BackendMode::Http),
            other => Err(ScopeError::Config(format!("unknown backend mode '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub mode: BackendMode,
    /// Endpoint for AM/FM/PM requests.
    pub analog_url: String,
    /// Endpoint for ASK/FSK/PSK requests.
    pub digital_url: String,
    pub timeout_ms: u64,
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::Local,
            analog_url: "http://localhost:5000/modulacion".to_string(),
            digital_url: "http://localhost:5001/modulacion_digital".to_string(),
            timeout_ms: 5000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. `info` or `modulation_scope=debug`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub scroll: ScrollConfig,
    pub surface: SurfaceConfig,
    pub sampler: SamplingPolicy,
    pub display: DisplayConfig,
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
    /// Initial carrier parameters.
    pub carrier: SignalParameters,
    /// Initial modulating-signal parameters.
    pub modulating: SignalParameters,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            scroll: ScrollConfig::default(),
            surface: SurfaceConfig::default(),
            sampler: SamplingPolicy::default(),
            display: DisplayConfig::default(),
            backend: BackendConfig::default(),
            logging: LoggingConfig::default(),
            carrier: SignalParameters::CARRIER,
            modulating: SignalParameters::MODULATING,
        }
    }
}

impl ScopeConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> ScopeResult<()> {
        let scroll = &self.scroll;
        if !(scroll.window_duration.is_finite() && scroll.window_duration > 0.0) {
            return Err(ScopeError::Config(format!(
                "scroll.window_duration must be positive, got {}",
                scroll.window_duration
            )));
        }
        if scroll.tick_period_ms == 0 {
            return Err(ScopeError::Config("scroll.tick_period_ms must be positive".into()));
        }
        if !(scroll.tick_time_step.is_finite() && scroll.tick_time_step >= 0.0) {
            return Err(ScopeError::Config(format!(
                "scroll.tick_time_step must be non-negative, got {}",
                scroll.tick_time_step
            )));
        }
        if self.surface.poll_interval_ms == 0 {
            return Err(ScopeError::Config("surface.poll_interval_ms must be positive".into()));
        }
        if self.sampler.min_total_points == 0 {
            return Err(ScopeError::Config("sampler.min_total_points must be at least 1".into()));
        }
        if !(self.sampler.min_points_per_cycle.is_finite() && self.sampler.min_points_per_cycle > 0.0)
        {
            return Err(ScopeError::Config(
                "sampler.min_points_per_cycle must be positive".into(),
            ));
        }
        if !(self.display.analog_x_max > 0.0 && self.display.digital_x_max > 0.0) {
            return Err(ScopeError::Config("display clip points must be positive".into()));
        }
        self.carrier
            .validate()
            .and_then(|_| self.modulating.validate())
            .map_err(|e| ScopeError::Config(e.to_string()))
    }
}

/// Save a configuration as pretty JSON.
pub fn save_to_file(config: &ScopeConfig, path: &Path) -> ScopeResult<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load and validate a configuration file.
pub fn load_from_file(path: &Path) -> ScopeResult<ScopeConfig> {
    let json = std::fs::read_to_string(path)?;
    let config: ScopeConfig = serde_json::from_str(&json)?;
    config.validate()?;
    tracing::info!(path = %path.display(), "configuration loaded");
    Ok(config)
}
