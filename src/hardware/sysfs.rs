//! Linux sysfs drivers for the kiln hardware.
//!
//! The thermocouple amplifier (MAX31855) is read through the kernel's
//! `maxim_thermocouple` IIO driver, the enclosure temperature comes from a
//! thermal zone, and both relays hang off plain GPIO lines.

use super::temperature::Temperature;
use super::{Actuator, ActuatorPort, SensorError, TemperatureSensor};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

async fn read_trimmed(path: &Path) -> Result<String, SensorError> {
    let raw = fs::read_to_string(path).await?;
    Ok(raw.trim().to_string())
}

fn parse_number(path: &Path, text: &str) -> Result<f64, SensorError> {
    text.parse::<f64>()
        .map_err(|_| SensorError::Malformed(format!("{}: {:?}", path.display(), text)))
}

/// Thermocouple exposed by an IIO device directory.
#[derive(Debug, Clone)]
pub struct IioThermocouple {
    raw_path: PathBuf,
    scale_path: PathBuf,
}

impl IioThermocouple {
    pub fn new(device_dir: impl AsRef<Path>) -> Self {
        let dir = device_dir.as_ref();
        Self {
            raw_path: dir.join("in_temp_raw"),
            scale_path: dir.join("in_temp_scale"),
        }
    }
}

#[async_trait]
impl TemperatureSensor for IioThermocouple {
    async fn read_temperature(&self) -> Result<Temperature, SensorError> {
        // The driver fails the raw read with EINVAL when the probe is open.
        let raw = read_trimmed(&self.raw_path).await?;
        let scale = read_trimmed(&self.scale_path).await?;
        let millidegrees = parse_number(&self.raw_path, &raw)? * parse_number(&self.scale_path, &scale)?;
        Ok(Temperature::celsius(millidegrees / 1000.0))
    }
}

/// A `/sys/class/thermal/thermal_zoneN/temp` file, in millidegrees Celsius.
#[derive(Debug, Clone)]
pub struct ThermalZoneSensor {
    path: PathBuf,
}

impl ThermalZoneSensor {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

#[async_trait]
impl TemperatureSensor for ThermalZoneSensor {
    async fn read_temperature(&self) -> Result<Temperature, SensorError> {
        let text = read_trimmed(&self.path).await?;
        Ok(Temperature::celsius(parse_number(&self.path, &text)? / 1000.0))
    }
}

/// A single output line under the sysfs GPIO class.
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    pin: u32,
    value_path: PathBuf,
}

impl SysfsGpio {
    /// Export `pin` if needed, configure it as an output and drive it low.
    pub async fn open_output(gpio_root: &Path, pin: u32) -> std::io::Result<Self> {
        let pin_dir = gpio_root.join(format!("gpio{}", pin));
        if fs::metadata(&pin_dir).await.is_err() {
            tracing::debug!("Exporting GPIO {}", pin);
            fs::write(gpio_root.join("export"), pin.to_string()).await?;
        }
        fs::write(pin_dir.join("direction"), "out").await?;
        let gpio = Self { pin, value_path: pin_dir.join("value") };
        gpio.write(false).await?;
        Ok(gpio)
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    pub async fn write(&self, high: bool) -> std::io::Result<()> {
        fs::write(&self.value_path, if high { "1" } else { "0" }).await
    }
}

/// Heater SSR and enclosure fan relay on two GPIO lines.
#[derive(Debug, Clone)]
pub struct GpioActuators {
    heater: SysfsGpio,
    fan: SysfsGpio,
}

impl GpioActuators {
    pub async fn open(gpio_root: &Path, heater_pin: u32, fan_pin: u32) -> std::io::Result<Self> {
        let heater = SysfsGpio::open_output(gpio_root, heater_pin).await?;
        let fan = SysfsGpio::open_output(gpio_root, fan_pin).await?;
        Ok(Self { heater, fan })
    }

    async fn drive(&self, actuator: Actuator, on: bool) {
        let line = match actuator {
            Actuator::Heater => &self.heater,
            Actuator::Fan => &self.fan,
        };
        if let Err(e) = line.write(on).await {
            tracing::error!("Failed to drive {} GPIO {}: {}", actuator, line.pin(), e);
        }
    }
}

#[async_trait]
impl ActuatorPort for GpioActuators {
    async fn set_heater(&self, on: bool) {
        self.drive(Actuator::Heater, on).await;
    }

    async fn set_fan(&self, on: bool) {
        self.drive(Actuator::Fan, on).await;
    }
}
