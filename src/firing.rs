// src/firing.rs - Firing session state machine
use crate::config::FiringConfig;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq)]
pub enum FiringError {
    #[error("Invalid setpoint: {0}")]
    InvalidSetpoint(String),
}

/// Accepted range for operator setpoints, in degrees Fahrenheit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetpointLimits {
    pub min_f: f64,
    pub max_f: f64,
}

impl SetpointLimits {
    pub fn validate(&self, setpoint_f: f64) -> Result<f64, FiringError> {
        if !setpoint_f.is_finite() {
            return Err(FiringError::InvalidSetpoint(format!("{} is not a finite temperature", setpoint_f)));
        }
        if setpoint_f < self.min_f || setpoint_f > self.max_f {
            return Err(FiringError::InvalidSetpoint(format!(
                "{}°F is outside {}..={}°F",
                setpoint_f, self.min_f, self.max_f
            )));
        }
        Ok(setpoint_f)
    }

    /// Parse a raw form value, then range-check it.
    pub fn parse(&self, raw: &str) -> Result<f64, FiringError> {
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| FiringError::InvalidSetpoint(format!("{:?} is not a number", raw)))?;
        self.validate(value)
    }
}

impl From<&FiringConfig> for SetpointLimits {
    fn from(config: &FiringConfig) -> Self {
        Self { min_f: config.min_setpoint_f, max_f: config.max_setpoint_f }
    }
}

/// An active firing. Elapsed time is measured on the monotonic clock from
/// `started_at`; the wall-clock start is informational only.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveFiring {
    pub id: Uuid,
    pub setpoint_f: f64,
    pub started_at: Instant,
    pub started_wallclock: DateTime<Utc>,
}

impl ActiveFiring {
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum FiringSession {
    #[default]
    Inactive,
    Active(ActiveFiring),
}

impl FiringSession {
    /// Begin a new firing, replacing whatever was running. There is no resume:
    /// the elapsed-time origin is always reset.
    pub fn start(&mut self, setpoint_f: f64) -> ActiveFiring {
        let firing = ActiveFiring {
            id: Uuid::new_v4(),
            setpoint_f,
            started_at: Instant::now(),
            started_wallclock: Utc::now(),
        };
        *self = FiringSession::Active(firing.clone());
        firing
    }

    /// End the current firing, returning it if there was one.
    pub fn stop(&mut self) -> Option<ActiveFiring> {
        match std::mem::take(self) {
            FiringSession::Active(firing) => Some(firing),
            FiringSession::Inactive => None,
        }
    }

    pub fn active(&self) -> Option<&ActiveFiring> {
        match self {
            FiringSession::Active(firing) => Some(firing),
            FiringSession::Inactive => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }
}

/// Heater policy for one tick: on strictly below the setpoint, off at or
/// above it, always off while idle.
pub fn heater_command(session: &FiringSession, process_f: f64) -> bool {
    match session.active() {
        Some(firing) => process_f < firing.setpoint_f,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> SetpointLimits {
        SetpointLimits { min_f: 0.0, max_f: 2400.0 }
    }

    #[test]
    fn test_initial_state_is_inactive() {
        let session = FiringSession::default();
        assert!(!session.is_active());
        assert!(!heater_command(&session, -100.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_elapsed_origin() {
        let mut session = FiringSession::default();
        let first_id = session.start(900.0).id;
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(session.active().unwrap().elapsed(), Duration::from_secs(30));

        let second = session.start(1200.0);
        assert_ne!(second.id, first_id);
        assert_eq!(second.setpoint_f, 1200.0);
        assert_eq!(second.elapsed(), Duration::ZERO);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(session.active().unwrap().elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_never_negative() {
        let mut session = FiringSession::default();
        let before = Instant::now();
        tokio::time::advance(Duration::from_secs(1)).await;
        let firing = session.start(500.0);
        assert_eq!(firing.elapsed_at(before), Duration::ZERO);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut session = FiringSession::default();
        assert!(session.stop().is_none());
        session.start(1000.0);
        let ended = session.stop().unwrap();
        assert_eq!(ended.setpoint_f, 1000.0);
        assert!(session.stop().is_none());
        assert_eq!(session, FiringSession::Inactive);
    }

    #[test]
    fn test_heater_tie_break_is_off() {
        let mut session = FiringSession::default();
        session.start(1000.0);
        assert!(heater_command(&session, 68.0));
        assert!(heater_command(&session, 999.99));
        assert!(!heater_command(&session, 1000.0));
        assert!(!heater_command(&session, 1000.01));
    }

    #[test]
    fn test_setpoint_validation() {
        assert_eq!(limits().parse("1000"), Ok(1000.0));
        assert_eq!(limits().parse(" 1832.5 "), Ok(1832.5));
        assert!(matches!(limits().parse("hot"), Err(FiringError::InvalidSetpoint(_))));
        assert!(matches!(limits().parse("NaN"), Err(FiringError::InvalidSetpoint(_))));
        assert!(matches!(limits().parse("inf"), Err(FiringError::InvalidSetpoint(_))));
        assert!(matches!(limits().validate(2400.1), Err(FiringError::InvalidSetpoint(_))));
        assert!(matches!(limits().validate(-1.0), Err(FiringError::InvalidSetpoint(_))));
        assert_eq!(limits().validate(0.0), Ok(0.0));
    }
}
