//! # Kiln Configuration
//!
//! Every field has a default, so an empty file (or no file at all) describes
//! the stock controller: relays on BCM 27 (heater SSR) and BCM 17 (enclosure
//! fan), a MAX31855 thermocouple behind the IIO driver, a 5 second tick.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:5000"
//!
//! [control]
//! tick_interval_ms = 5000
//! sensor_timeout_ms = 1000
//!
//! [firing]
//! default_setpoint_f = 1000.0
//! max_setpoint_f = 2400.0
//!
//! [enclosure]
//! fan_on_c = 60.0
//! fan_off_c = 50.0
//!
//! [hardware]
//! backend = "simulated"
//! ```

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct for the controller.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KilnConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub firing: FiringConfig,
    #[serde(default)]
    pub enclosure: EnclosureConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// HTTP control surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

/// Control loop timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControlConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_sensor_timeout_ms")]
    pub sensor_timeout_ms: u64,
}

impl ControlConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn sensor_timeout(&self) -> Duration {
        Duration::from_millis(self.sensor_timeout_ms)
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            sensor_timeout_ms: default_sensor_timeout_ms(),
        }
    }
}

/// Setpoint defaults and limits, in degrees Fahrenheit.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FiringConfig {
    #[serde(default = "default_setpoint_f")]
    pub default_setpoint_f: f64,
    #[serde(default = "default_min_setpoint_f")]
    pub min_setpoint_f: f64,
    #[serde(default = "default_max_setpoint_f")]
    pub max_setpoint_f: f64,
}

impl Default for FiringConfig {
    fn default() -> Self {
        Self {
            default_setpoint_f: default_setpoint_f(),
            min_setpoint_f: default_min_setpoint_f(),
            max_setpoint_f: default_max_setpoint_f(),
        }
    }
}

/// Fan hysteresis thresholds for the electronics enclosure, in degrees Celsius.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct EnclosureConfig {
    #[serde(default = "default_fan_on_c")]
    pub fan_on_c: f64,
    #[serde(default = "default_fan_off_c")]
    pub fan_off_c: f64,
}

impl Default for EnclosureConfig {
    fn default() -> Self {
        Self {
            fan_on_c: default_fan_on_c(),
            fan_off_c: default_fan_off_c(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HardwareBackend {
    Sysfs,
    Simulated,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HardwareConfig {
    #[serde(default = "default_backend")]
    pub backend: HardwareBackend,
    #[serde(default = "default_gpio_root")]
    pub gpio_root: PathBuf,
    #[serde(default = "default_heater_gpio")]
    pub heater_gpio: u32,
    #[serde(default = "default_fan_gpio")]
    pub fan_gpio: u32,
    #[serde(default = "default_thermocouple_device")]
    pub thermocouple_device: PathBuf,
    #[serde(default = "default_enclosure_thermal_zone")]
    pub enclosure_thermal_zone: PathBuf,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            gpio_root: default_gpio_root(),
            heater_gpio: default_heater_gpio(),
            fan_gpio: default_fan_gpio(),
            thermocouple_device: default_thermocouple_device(),
            enclosure_thermal_zone: default_enclosure_thermal_zone(),
        }
    }
}

/// Parameters of the simulated kiln (rates are per second).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default = "default_ambient_c")]
    pub ambient_c: f64,
    #[serde(default = "default_heater_rate_c_per_s")]
    pub heater_rate_c_per_s: f64,
    #[serde(default = "default_kiln_loss_per_s")]
    pub kiln_loss_per_s: f64,
    #[serde(default = "default_enclosure_coupling_per_s")]
    pub enclosure_coupling_per_s: f64,
    #[serde(default = "default_enclosure_loss_per_s")]
    pub enclosure_loss_per_s: f64,
    #[serde(default = "default_fan_loss_per_s")]
    pub fan_loss_per_s: f64,
    #[serde(default = "default_noise_c")]
    pub noise_c: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ambient_c: default_ambient_c(),
            heater_rate_c_per_s: default_heater_rate_c_per_s(),
            kiln_loss_per_s: default_kiln_loss_per_s(),
            enclosure_coupling_per_s: default_enclosure_coupling_per_s(),
            enclosure_loss_per_s: default_enclosure_loss_per_s(),
            fan_loss_per_s: default_fan_loss_per_s(),
            noise_c: default_noise_c(),
        }
    }
}

impl KilnConfig {
    /// Reject settings the controller cannot run with safely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let control = &self.control;
        if control.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("control.tick_interval_ms must be > 0".to_string()));
        }
        // A tick makes two timed reads back to back (process, then enclosure).
        if control.sensor_timeout_ms == 0
            || control.sensor_timeout_ms.saturating_mul(2) > control.tick_interval_ms
        {
            return Err(ConfigError::Invalid(
                "control.sensor_timeout_ms must be > 0 and at most half the tick interval".to_string(),
            ));
        }

        let firing = &self.firing;
        if !firing.min_setpoint_f.is_finite() || !firing.max_setpoint_f.is_finite() {
            return Err(ConfigError::Invalid("firing setpoint limits must be finite".to_string()));
        }
        if firing.min_setpoint_f > firing.max_setpoint_f {
            return Err(ConfigError::Invalid(format!(
                "firing.min_setpoint_f ({}) is above firing.max_setpoint_f ({})",
                firing.min_setpoint_f, firing.max_setpoint_f
            )));
        }
        if !(firing.min_setpoint_f..=firing.max_setpoint_f).contains(&firing.default_setpoint_f) {
            return Err(ConfigError::Invalid(format!(
                "firing.default_setpoint_f ({}) is outside {}..={}",
                firing.default_setpoint_f, firing.min_setpoint_f, firing.max_setpoint_f
            )));
        }

        let enclosure = &self.enclosure;
        if !(enclosure.fan_off_c < enclosure.fan_on_c) {
            return Err(ConfigError::Invalid(format!(
                "enclosure.fan_off_c ({}) must be below enclosure.fan_on_c ({})",
                enclosure.fan_off_c, enclosure.fan_on_c
            )));
        }

        if self.hardware.heater_gpio == self.hardware.fan_gpio {
            return Err(ConfigError::Invalid("heater and fan cannot share a GPIO line".to_string()));
        }
        Ok(())
    }
}

// Default value functions
fn default_listen() -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], 5000)) }
fn default_tick_interval_ms() -> u64 { 5000 }
fn default_sensor_timeout_ms() -> u64 { 1000 }
fn default_setpoint_f() -> f64 { 1000.0 }
fn default_min_setpoint_f() -> f64 { 0.0 }
fn default_max_setpoint_f() -> f64 { 2400.0 }
fn default_fan_on_c() -> f64 { 60.0 }
fn default_fan_off_c() -> f64 { 50.0 }
fn default_backend() -> HardwareBackend { HardwareBackend::Sysfs }
fn default_gpio_root() -> PathBuf { PathBuf::from("/sys/class/gpio") }
fn default_heater_gpio() -> u32 { 27 }
fn default_fan_gpio() -> u32 { 17 }
fn default_thermocouple_device() -> PathBuf { PathBuf::from("/sys/bus/iio/devices/iio:device0") }
fn default_enclosure_thermal_zone() -> PathBuf { PathBuf::from("/sys/class/thermal/thermal_zone0/temp") }
fn default_ambient_c() -> f64 { 20.0 }
fn default_heater_rate_c_per_s() -> f64 { 0.5 }
fn default_kiln_loss_per_s() -> f64 { 0.0005 }
fn default_enclosure_coupling_per_s() -> f64 { 0.0001 }
fn default_enclosure_loss_per_s() -> f64 { 0.002 }
fn default_fan_loss_per_s() -> f64 { 0.01 }
fn default_noise_c() -> f64 { 0.5 }

/// Load and validate configuration from a TOML file at the given path.
pub fn load_config(path: &Path) -> Result<KilnConfig, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path.display(), e);
            return Err(ConfigError::Io(e));
        }
    };
    let config: KilnConfig = match toml::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to parse config TOML: {}", e);
            return Err(ConfigError::Toml(e));
        }
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = KilnConfig::default();
        assert_eq!(config.server.listen.port(), 5000);
        assert_eq!(config.control.tick_interval(), Duration::from_secs(5));
        assert_eq!(config.firing.default_setpoint_f, 1000.0);
        assert_eq!(config.enclosure.fan_on_c, 60.0);
        assert_eq!(config.enclosure.fan_off_c, 50.0);
        assert_eq!(config.hardware.heater_gpio, 27);
        assert_eq!(config.hardware.fan_gpio, 17);
        assert_eq!(config.hardware.backend, HardwareBackend::Sysfs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("kiln.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "[control]\ntick_interval_ms = 2000\n\n[hardware]\nbackend = 'simulated'").unwrap();
        file.flush().unwrap();
        let config = load_config(&file_path).unwrap();
        assert_eq!(config.control.tick_interval_ms, 2000);
        assert_eq!(config.hardware.backend, HardwareBackend::Simulated);
        // Defaults for missing fields
        assert_eq!(config.control.sensor_timeout_ms, 1000);
        assert_eq!(config.firing.max_setpoint_f, 2400.0);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Path::new("nonexistent_kiln.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_config(&file_path);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_inverted_fan_thresholds_rejected() {
        let config: KilnConfig = toml::from_str("[enclosure]\nfan_on_c = 50.0\nfan_off_c = 55.0").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_default_setpoint_must_be_in_range() {
        let config: KilnConfig = toml::from_str("[firing]\nmax_setpoint_f = 900.0").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_sensor_timeout_bounded_by_tick() {
        let config: KilnConfig =
            toml::from_str("[control]\ntick_interval_ms = 500\nsensor_timeout_ms = 1000").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        // Both reads of a tick timing out must still fit inside the period.
        let config: KilnConfig =
            toml::from_str("[control]\ntick_interval_ms = 1500\nsensor_timeout_ms = 1000").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config: KilnConfig =
            toml::from_str("[control]\ntick_interval_ms = 2000\nsensor_timeout_ms = 1000").unwrap();
        assert!(config.validate().is_ok());
    }
}
