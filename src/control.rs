//! The fixed-period control loop.
//!
//! Each tick reads the process thermocouple, runs the enclosure guard, applies
//! the heater policy for the current firing session and records a log sample
//! while a firing is active. Sensor faults cost one tick, never the loop.

use crate::config::KilnConfig;
use crate::enclosure::{EnclosureGuard, FanDecision};
use crate::firing::heater_command;
use crate::kiln::{KilnController, Telemetry};
use crate::process_log::LogSample;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// Outcome of a single tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub process_f: Option<f64>,
    pub heater_on: bool,
    pub fan: Option<FanDecision>,
    pub logged: Option<LogSample>,
    pub fault: Option<String>,
}

pub struct ControlLoop {
    kiln: KilnController,
    guard: EnclosureGuard,
    period: Duration,
    ticks: u64,
}

impl ControlLoop {
    pub fn new(kiln: KilnController, config: &KilnConfig) -> Self {
        Self {
            kiln,
            guard: EnclosureGuard::new(config.enclosure),
            period: config.control.tick_interval(),
            ticks: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub async fn tick(&mut self) -> TickReport {
        self.ticks += 1;
        let actuators = self.kiln.actuators();

        let process = self.kiln.read_process_temperature().await;

        let mut enclosure_c = None;
        let fan = match self.kiln.read_enclosure_temperature().await {
            Ok(reading) => {
                enclosure_c = Some(reading.as_celsius());
                let decision = self.guard.evaluate(reading.as_celsius());
                if let Some(on) = decision.command {
                    actuators.set_fan(on).await;
                }
                Some(decision)
            }
            Err(e) => {
                tracing::warn!("Enclosure sensor fault, fan left {:?}: {}", self.guard.latch(), e);
                None
            }
        };

        // Held until the heater command is out; see KilnController::stop_firing.
        let session = self.kiln.session_guard().await;
        let (process_f, heater_on, logged, fault) = match process {
            Ok(reading) => {
                let process_f = reading.as_fahrenheit();
                let heater_on = heater_command(&session, process_f);
                let mut logged = None;
                if let Some(firing) = session.active() {
                    let sample = LogSample {
                        elapsed_seconds: firing.elapsed().as_secs_f64(),
                        temperature_f: process_f,
                    };
                    self.kiln.log().append(sample).await;
                    logged = Some(sample);
                }
                (Some(process_f), heater_on, logged, None)
            }
            Err(e) => {
                tracing::warn!("Process sensor fault, heater held off this tick: {}", e);
                (None, false, None, Some(e.to_string()))
            }
        };
        actuators.set_heater(heater_on).await;
        drop(session);

        tracing::debug!(
            "Tick {}: process {:?}°F, heater {}, fan {:?}",
            self.ticks,
            process_f,
            if heater_on { "on" } else { "off" },
            self.guard.latch()
        );

        self.kiln.publish_telemetry(Telemetry {
            ticks: self.ticks,
            process_f,
            enclosure_c,
            heater_on,
            fan: self.guard.latch(),
            last_fault: fault.clone(),
        });

        TickReport { process_f, heater_on, fan, logged, fault }
    }

    /// Tick every period until a shutdown signal arrives (or its sender is
    /// dropped), then force the heater off.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!("Control loop started, period {:?}", self.period);
        loop {
            let tick_start = Instant::now();
            self.tick().await;
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep_until(tick_start + self.period) => {}
            }
        }
        self.kiln.actuators().set_heater(false).await;
        tracing::info!("Control loop stopped after {} ticks, heater off", self.ticks);
    }
}
