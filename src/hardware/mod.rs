// src/hardware/mod.rs - Sensor and actuator ports plus the backends behind them
pub mod simulated;
pub mod sysfs;
pub mod temperature;

use crate::config::{HardwareBackend, KilnConfig};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use temperature::Temperature;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor read timed out after {0:?}")]
    Timeout(Duration),
    #[error("sensor I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed sensor reading: {0}")]
    Malformed(String),
    #[error("sensor fault: {0}")]
    Fault(String),
}

/// Anything that can report a temperature.
#[async_trait]
pub trait TemperatureSensor: Send + Sync {
    async fn read_temperature(&self) -> Result<Temperature, SensorError>;
}

/// On/off outputs driven by the controller.
///
/// Commands are idempotent "set state" requests. Hardware failures are the
/// implementation's problem: they are logged there and never reach the
/// control loop.
#[async_trait]
pub trait ActuatorPort: Send + Sync {
    async fn set_heater(&self, on: bool);
    async fn set_fan(&self, on: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuator {
    Heater,
    Fan,
}

impl fmt::Display for Actuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actuator::Heater => f.write_str("heater"),
            Actuator::Fan => f.write_str("fan"),
        }
    }
}

/// Read a sensor, treating a reading that takes longer than `limit` as a fault.
pub async fn read_with_timeout(
    sensor: &dyn TemperatureSensor,
    limit: Duration,
) -> Result<Temperature, SensorError> {
    let reading = tokio::time::timeout(limit, sensor.read_temperature())
        .await
        .map_err(|_| SensorError::Timeout(limit))??;
    if !reading.is_finite() {
        return Err(SensorError::Malformed(format!("non-finite value {}", reading.value())));
    }
    Ok(reading)
}

/// The concrete ports the controller runs against.
#[derive(Clone)]
pub struct Hardware {
    pub process_sensor: Arc<dyn TemperatureSensor>,
    pub enclosure_sensor: Arc<dyn TemperatureSensor>,
    pub actuators: Arc<dyn ActuatorPort>,
}

impl Hardware {
    /// Build the backend selected in the configuration. Both outputs are
    /// driven off before this returns.
    pub async fn from_config(config: &KilnConfig) -> std::io::Result<Self> {
        match config.hardware.backend {
            HardwareBackend::Sysfs => {
                let hw = &config.hardware;
                tracing::info!(
                    "Using sysfs hardware: heater GPIO {}, fan GPIO {}, thermocouple {}",
                    hw.heater_gpio,
                    hw.fan_gpio,
                    hw.thermocouple_device.display()
                );
                let actuators = sysfs::GpioActuators::open(&hw.gpio_root, hw.heater_gpio, hw.fan_gpio).await?;
                Ok(Self {
                    process_sensor: Arc::new(sysfs::IioThermocouple::new(&hw.thermocouple_device)),
                    enclosure_sensor: Arc::new(sysfs::ThermalZoneSensor::new(&hw.enclosure_thermal_zone)),
                    actuators: Arc::new(actuators),
                })
            }
            HardwareBackend::Simulated => {
                tracing::info!(
                    "Using simulated kiln (ambient {:.1}°C)",
                    config.simulation.ambient_c
                );
                let kiln = Arc::new(simulated::SimulatedKiln::new(config.simulation.clone()));
                Ok(Self {
                    process_sensor: Arc::new(simulated::KilnProbe(kiln.clone())),
                    enclosure_sensor: Arc::new(simulated::EnclosureProbe(kiln.clone())),
                    actuators: kiln,
                })
            }
        }
    }
}
