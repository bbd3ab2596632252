// src/process_log.rs - Time series recorded during a firing
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One temperature sample, serialized as `[elapsed_seconds, temp_f]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "(f64, f64)")]
pub struct LogSample {
    pub elapsed_seconds: f64,
    pub temperature_f: f64,
}

impl From<LogSample> for (f64, f64) {
    fn from(sample: LogSample) -> Self {
        (sample.elapsed_seconds, sample.temperature_f)
    }
}

/// Append-only sample log shared between the control loop and the API.
///
/// Only the loop appends. Readers take a full copy; each lock is held for a
/// single push or a single clone.
#[derive(Debug, Clone, Default)]
pub struct ProcessLog {
    samples: Arc<RwLock<Vec<LogSample>>>,
}

impl ProcessLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, sample: LogSample) {
        self.samples.write().await.push(sample);
    }

    pub async fn snapshot(&self) -> Vec<LogSample> {
        self.samples.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.samples.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.samples.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_preserves_append_order() {
        let log = ProcessLog::new();
        assert!(log.is_empty().await);
        for i in 0..5 {
            log.append(LogSample { elapsed_seconds: i as f64 * 5.0, temperature_f: 68.0 + i as f64 }).await;
        }
        let snapshot = log.snapshot().await;
        assert_eq!(snapshot.len(), 5);
        assert_eq!(log.len().await, 5);
        assert!(snapshot.windows(2).all(|w| w[0].elapsed_seconds <= w[1].elapsed_seconds));
        assert_eq!(snapshot[4].temperature_f, 72.0);
    }

    #[tokio::test]
    async fn test_snapshot_is_point_in_time() {
        let log = ProcessLog::new();
        log.append(LogSample { elapsed_seconds: 0.0, temperature_f: 70.0 }).await;
        let before = log.snapshot().await;
        log.append(LogSample { elapsed_seconds: 5.0, temperature_f: 75.0 }).await;
        assert_eq!(before.len(), 1);
        assert_eq!(log.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_readers_see_whole_samples() {
        let log = ProcessLog::new();
        let writer = {
            let log = log.clone();
            tokio::spawn(async move {
                for i in 0..500 {
                    let t = i as f64;
                    log.append(LogSample { elapsed_seconds: t, temperature_f: t * 2.0 }).await;
                    tokio::task::yield_now().await;
                }
            })
        };
        let reader = {
            let log = log.clone();
            tokio::spawn(async move {
                for _ in 0..100 {
                    let snapshot = log.snapshot().await;
                    for (i, sample) in snapshot.iter().enumerate() {
                        assert_eq!(sample.elapsed_seconds, i as f64);
                        assert_eq!(sample.temperature_f, sample.elapsed_seconds * 2.0);
                    }
                    tokio::task::yield_now().await;
                }
            })
        };
        writer.await.unwrap();
        reader.await.unwrap();
        assert_eq!(log.len().await, 500);
    }

    #[test]
    fn test_sample_serializes_as_pair() {
        let json = serde_json::to_string(&LogSample { elapsed_seconds: 5.5, temperature_f: 68.0 }).unwrap();
        assert_eq!(json, "[5.5,68.0]");
    }
}
