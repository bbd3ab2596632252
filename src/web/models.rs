//! Contains the data models for API requests and responses.

use crate::kiln::KilnStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response for `GET /`.
#[derive(Serialize, Debug)]
pub struct StatusResponse {
    /// Always "online" when the controller answers.
    pub status: &'static str,
    /// Live process temperature.
    pub current_temp_f: f64,
    pub firing: bool,
    pub firing_id: Option<Uuid>,
    /// Setpoint of the active firing, null when idle.
    pub set_temp: Option<f64>,
    /// Wall-clock start of the active firing (RFC 3339).
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: Option<f64>,
    /// Heater and fan states as commanded on the last tick.
    pub heater_on: bool,
    pub fan_on: bool,
    /// Enclosure temperature seen on the last tick, null before the first
    /// good reading or after a fault.
    pub enclosure_temp_c: Option<f64>,
}

impl From<KilnStatus> for StatusResponse {
    fn from(status: KilnStatus) -> Self {
        Self {
            status: "online",
            current_temp_f: status.current_temp_f,
            firing: status.firing.is_some(),
            firing_id: status.firing.as_ref().map(|f| f.id),
            set_temp: status.firing.as_ref().map(|f| f.setpoint_f),
            started_at: status.firing.as_ref().map(|f| f.started_wallclock),
            elapsed_seconds: status.elapsed.map(|d| d.as_secs_f64()),
            heater_on: status.telemetry.heater_on,
            fan_on: status.telemetry.fan.is_on(),
            enclosure_temp_c: status.telemetry.enclosure_c,
        }
    }
}

/// Form body for `POST /start`. The value is kept as text so a bad number
/// can be reported as an invalid setpoint rather than a generic rejection.
#[derive(Deserialize, Debug, Default)]
pub struct StartRequest {
    #[serde(default)]
    pub set_temp: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct StartResponse {
    pub status: &'static str,
    pub set_temp: f64,
}

#[derive(Serialize, Debug)]
pub struct StopResponse {
    pub status: &'static str,
}
