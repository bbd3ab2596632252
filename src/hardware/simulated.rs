// src/hardware/simulated.rs - Thermal model used when no kiln is attached
use super::temperature::Temperature;
use super::{ActuatorPort, SensorError, TemperatureSensor};
use crate::config::SimulationConfig;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct ThermalState {
    kiln_c: f64,
    enclosure_c: f64,
    heater_on: bool,
    fan_on: bool,
    last_update: Instant,
}

/// First-order kiln and enclosure model advanced lazily on every access.
///
/// The heater adds a fixed number of degrees per second, both bodies lose heat
/// in proportion to their distance from ambient, and the enclosure is warmed
/// by the kiln wall and cooled by the fan.
pub struct SimulatedKiln {
    config: SimulationConfig,
    state: Mutex<ThermalState>,
}

impl SimulatedKiln {
    pub fn new(config: SimulationConfig) -> Self {
        let state = ThermalState {
            kiln_c: config.ambient_c,
            enclosure_c: config.ambient_c,
            heater_on: false,
            fan_on: false,
            last_update: Instant::now(),
        };
        Self { config, state: Mutex::new(state) }
    }

    fn advance(&self, state: &mut ThermalState) {
        let now = Instant::now();
        let mut remaining = now.saturating_duration_since(state.last_update).as_secs_f64();
        state.last_update = now;
        let cfg = &self.config;

        // Euler steps of at most one second keep long gaps stable.
        while remaining > 0.0 {
            let dt = remaining.min(1.0);
            remaining -= dt;

            let gain = if state.heater_on { cfg.heater_rate_c_per_s } else { 0.0 };
            let loss = cfg.kiln_loss_per_s * (state.kiln_c - cfg.ambient_c);
            state.kiln_c += (gain - loss) * dt;

            let warming = cfg.enclosure_coupling_per_s * (state.kiln_c - state.enclosure_c);
            let loss_rate = if state.fan_on { cfg.fan_loss_per_s } else { cfg.enclosure_loss_per_s };
            let cooling = loss_rate * (state.enclosure_c - cfg.ambient_c);
            state.enclosure_c += (warming - cooling) * dt;
        }
    }

    fn noise(&self) -> f64 {
        self.config.noise_c * (rand::random::<f64>() - 0.5)
    }

    pub async fn kiln_temperature(&self) -> Temperature {
        let mut state = self.state.lock().await;
        self.advance(&mut state);
        Temperature::celsius(state.kiln_c + self.noise())
    }

    pub async fn enclosure_temperature(&self) -> Temperature {
        let mut state = self.state.lock().await;
        self.advance(&mut state);
        Temperature::celsius(state.enclosure_c + self.noise())
    }

    pub async fn outputs(&self) -> (bool, bool) {
        let state = self.state.lock().await;
        (state.heater_on, state.fan_on)
    }
}

#[async_trait]
impl ActuatorPort for SimulatedKiln {
    async fn set_heater(&self, on: bool) {
        let mut state = self.state.lock().await;
        self.advance(&mut state);
        state.heater_on = on;
    }

    async fn set_fan(&self, on: bool) {
        let mut state = self.state.lock().await;
        self.advance(&mut state);
        state.fan_on = on;
    }
}

/// The thermocouple inside the simulated kiln.
pub struct KilnProbe(pub Arc<SimulatedKiln>);

#[async_trait]
impl TemperatureSensor for KilnProbe {
    async fn read_temperature(&self) -> Result<Temperature, SensorError> {
        Ok(self.0.kiln_temperature().await)
    }
}

/// The SoC temperature of the simulated controller board.
pub struct EnclosureProbe(pub Arc<SimulatedKiln>);

#[async_trait]
impl TemperatureSensor for EnclosureProbe {
    async fn read_temperature(&self) -> Result<Temperature, SensorError> {
        Ok(self.0.enclosure_temperature().await)
    }
}
