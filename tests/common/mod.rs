// Shared test doubles for the sensor and actuator ports
#![allow(dead_code)]

use async_trait::async_trait;
use kiln_rs::config::KilnConfig;
use kiln_rs::hardware::temperature::Temperature;
use kiln_rs::hardware::{Actuator, ActuatorPort, Hardware, SensorError, TemperatureSensor};
use kiln_rs::KilnController;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Sensor whose next reading is set by the test. `None` means the device fails.
pub struct SettableSensor {
    reading: Mutex<Option<Temperature>>,
}

impl SettableSensor {
    pub fn new(reading: Temperature) -> Arc<Self> {
        Arc::new(Self { reading: Mutex::new(Some(reading)) })
    }

    pub fn set(&self, reading: Temperature) {
        *self.reading.lock().unwrap() = Some(reading);
    }

    pub fn fail(&self) {
        *self.reading.lock().unwrap() = None;
    }
}

#[async_trait]
impl TemperatureSensor for SettableSensor {
    async fn read_temperature(&self) -> Result<Temperature, SensorError> {
        self.reading
            .lock()
            .unwrap()
            .ok_or_else(|| SensorError::Fault("thermocouple open".to_string()))
    }
}

/// Records every command in the order it was issued.
#[derive(Default)]
pub struct RecordingActuators {
    commands: Mutex<Vec<(Actuator, bool)>>,
}

impl RecordingActuators {
    pub fn commands(&self) -> Vec<(Actuator, bool)> {
        self.commands.lock().unwrap().clone()
    }

    pub fn commands_for(&self, actuator: Actuator) -> Vec<bool> {
        self.commands()
            .into_iter()
            .filter(|(a, _)| *a == actuator)
            .map(|(_, on)| on)
            .collect()
    }

    pub fn last(&self, actuator: Actuator) -> Option<bool> {
        self.commands_for(actuator).last().copied()
    }

    pub fn clear(&self) {
        self.commands.lock().unwrap().clear();
    }
}

#[async_trait]
impl ActuatorPort for RecordingActuators {
    async fn set_heater(&self, on: bool) {
        self.commands.lock().unwrap().push((Actuator::Heater, on));
    }

    async fn set_fan(&self, on: bool) {
        self.commands.lock().unwrap().push((Actuator::Fan, on));
    }
}

/// Records like [`RecordingActuators`], but a heater-on command parks until
/// the test releases it, so a tick can be held mid-actuation.
pub struct HeaterGate {
    pub recorder: Arc<RecordingActuators>,
    pub reached: Notify,
    pub release: Notify,
}

#[async_trait]
impl ActuatorPort for HeaterGate {
    async fn set_heater(&self, on: bool) {
        if on {
            self.reached.notify_one();
            self.release.notified().await;
        }
        self.recorder.set_heater(on).await;
    }

    async fn set_fan(&self, on: bool) {
        self.recorder.set_fan(on).await;
    }
}

pub struct Rig {
    pub config: KilnConfig,
    pub process: Arc<SettableSensor>,
    pub enclosure: Arc<SettableSensor>,
    pub actuators: Arc<RecordingActuators>,
    pub kiln: KilnController,
}

/// A kiln at 68°F with a 40°C enclosure and default settings.
pub fn rig() -> Rig {
    let actuators = Arc::new(RecordingActuators::default());
    build_rig(actuators.clone(), actuators)
}

/// Like [`rig`], with heater-on commands held at a [`HeaterGate`].
pub fn gated_rig() -> (Rig, Arc<HeaterGate>) {
    let recorder = Arc::new(RecordingActuators::default());
    let gate = Arc::new(HeaterGate {
        recorder: recorder.clone(),
        reached: Notify::new(),
        release: Notify::new(),
    });
    (build_rig(gate.clone(), recorder), gate)
}

fn build_rig(port: Arc<dyn ActuatorPort>, actuators: Arc<RecordingActuators>) -> Rig {
    let config = KilnConfig::default();
    let process = SettableSensor::new(Temperature::fahrenheit(68.0));
    let enclosure = SettableSensor::new(Temperature::celsius(40.0));
    let hardware = Hardware {
        process_sensor: process.clone(),
        enclosure_sensor: enclosure.clone(),
        actuators: port,
    };
    let kiln = KilnController::new(&config, hardware);
    Rig { config, process, enclosure, actuators, kiln }
}
