//! Enclosure thermal guard.
//!
//! Keeps the controller electronics cool with a two-threshold fan latch. The
//! guard is independent of any firing: it runs on every tick, idle or not.

use crate::config::EnclosureConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanLatch {
    #[default]
    FanOff,
    FanOn,
}

impl FanLatch {
    pub fn is_on(self) -> bool {
        self == FanLatch::FanOn
    }

    /// Next latch value for an enclosure reading. Readings strictly inside the
    /// band leave the latch where it was.
    pub fn next(self, temp_c: f64, thresholds: &EnclosureConfig) -> FanLatch {
        if temp_c >= thresholds.fan_on_c {
            FanLatch::FanOn
        } else if temp_c <= thresholds.fan_off_c {
            FanLatch::FanOff
        } else {
            self
        }
    }
}

/// Result of one guard evaluation. `command` is the fan state to send, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanDecision {
    pub latch: FanLatch,
    pub command: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct EnclosureGuard {
    thresholds: EnclosureConfig,
    latch: FanLatch,
    evaluated: bool,
}

impl EnclosureGuard {
    pub fn new(thresholds: EnclosureConfig) -> Self {
        Self { thresholds, latch: FanLatch::FanOff, evaluated: false }
    }

    pub fn latch(&self) -> FanLatch {
        self.latch
    }

    /// Update the latch. A fan command is produced on the first evaluation and
    /// whenever the latch flips.
    pub fn evaluate(&mut self, temp_c: f64) -> FanDecision {
        let next = self.latch.next(temp_c, &self.thresholds);
        let command = if !self.evaluated || next != self.latch {
            Some(next.is_on())
        } else {
            None
        };
        if next != self.latch {
            tracing::info!(
                "Enclosure at {:.1}°C, fan {}",
                temp_c,
                if next.is_on() { "on" } else { "off" }
            );
        }
        self.latch = next;
        self.evaluated = true;
        FanDecision { latch: next, command }
    }
}
