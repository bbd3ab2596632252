// src/kiln.rs - Shared kiln state and the operations the API performs on it
use crate::config::KilnConfig;
use crate::enclosure::FanLatch;
use crate::firing::{ActiveFiring, FiringError, FiringSession, SetpointLimits};
use crate::hardware::temperature::Temperature;
use crate::hardware::{read_with_timeout, ActuatorPort, Hardware, SensorError};
use crate::process_log::ProcessLog;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock, RwLockReadGuard};

/// What the control loop saw on its most recent tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Telemetry {
    pub ticks: u64,
    pub process_f: Option<f64>,
    pub enclosure_c: Option<f64>,
    pub heater_on: bool,
    pub fan: FanLatch,
    pub last_fault: Option<String>,
}

/// Live status: a fresh sensor reading plus the session and loop telemetry.
#[derive(Debug, Clone)]
pub struct KilnStatus {
    pub current_temp_f: f64,
    pub firing: Option<ActiveFiring>,
    pub elapsed: Option<Duration>,
    pub telemetry: Telemetry,
}

struct KilnShared {
    hardware: Hardware,
    session: RwLock<FiringSession>,
    log: ProcessLog,
    limits: SetpointLimits,
    default_setpoint_f: f64,
    sensor_timeout: Duration,
    telemetry: watch::Sender<Telemetry>,
}

/// Cloneable handle to the kiln. The control loop and every API handler hold
/// one; the firing session and process log behind it are the only state they
/// share.
#[derive(Clone)]
pub struct KilnController {
    inner: Arc<KilnShared>,
}

impl KilnController {
    pub fn new(config: &KilnConfig, hardware: Hardware) -> Self {
        let (telemetry, _) = watch::channel(Telemetry::default());
        Self {
            inner: Arc::new(KilnShared {
                hardware,
                session: RwLock::new(FiringSession::Inactive),
                log: ProcessLog::new(),
                limits: SetpointLimits::from(&config.firing),
                default_setpoint_f: config.firing.default_setpoint_f,
                sensor_timeout: config.control.sensor_timeout(),
                telemetry,
            }),
        }
    }

    pub fn default_setpoint_f(&self) -> f64 {
        self.inner.default_setpoint_f
    }

    pub fn setpoint_limits(&self) -> SetpointLimits {
        self.inner.limits
    }

    pub fn log(&self) -> &ProcessLog {
        &self.inner.log
    }

    pub fn actuators(&self) -> &dyn ActuatorPort {
        self.inner.hardware.actuators.as_ref()
    }

    /// Start a new firing at `setpoint_f`, replacing any firing in progress.
    /// An invalid setpoint leaves the session untouched.
    pub async fn start_firing(&self, setpoint_f: f64) -> Result<f64, FiringError> {
        let setpoint_f = self.inner.limits.validate(setpoint_f)?;
        let mut session = self.inner.session.write().await;
        if let Some(previous) = session.active() {
            tracing::info!(
                "Firing {} replaced after {:.0}s",
                previous.id,
                previous.elapsed().as_secs_f64()
            );
        }
        let firing = session.start(setpoint_f);
        tracing::info!("Firing {} started, setpoint {:.1}°F", firing.id, setpoint_f);
        Ok(setpoint_f)
    }

    /// End the current firing (if any) and drive the heater off right away.
    ///
    /// The heater command is issued while the session lock is held, so a tick
    /// that read the old session cannot switch the heater back on afterwards.
    pub async fn stop_firing(&self) -> Option<ActiveFiring> {
        let mut session = self.inner.session.write().await;
        let ended = session.stop();
        self.actuators().set_heater(false).await;
        match &ended {
            Some(firing) => tracing::info!(
                "Firing {} stopped after {:.0}s, heater off",
                firing.id,
                firing.elapsed().as_secs_f64()
            ),
            None => tracing::info!("Stop requested with no firing active, heater off"),
        }
        ended
    }

    pub async fn session(&self) -> FiringSession {
        self.inner.session.read().await.clone()
    }

    pub(crate) async fn session_guard(&self) -> RwLockReadGuard<'_, FiringSession> {
        self.inner.session.read().await
    }

    pub async fn read_process_temperature(&self) -> Result<Temperature, SensorError> {
        read_with_timeout(self.inner.hardware.process_sensor.as_ref(), self.inner.sensor_timeout).await
    }

    pub async fn read_enclosure_temperature(&self) -> Result<Temperature, SensorError> {
        read_with_timeout(self.inner.hardware.enclosure_sensor.as_ref(), self.inner.sensor_timeout).await
    }

    pub async fn status(&self) -> Result<KilnStatus, SensorError> {
        let current = self.read_process_temperature().await?;
        let firing = self.inner.session.read().await.active().cloned();
        let elapsed = firing.as_ref().map(ActiveFiring::elapsed);
        Ok(KilnStatus {
            current_temp_f: current.as_fahrenheit(),
            firing,
            elapsed,
            telemetry: self.telemetry(),
        })
    }

    pub fn telemetry(&self) -> Telemetry {
        self.inner.telemetry.borrow().clone()
    }

    pub(crate) fn publish_telemetry(&self, telemetry: Telemetry) {
        self.inner.telemetry.send_replace(telemetry);
    }
}
