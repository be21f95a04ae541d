// src/telemetry.rs
//
// Telemetry sinks for the agent harness.
// - TelemetrySink: trait the controller reports into
// - NoopSink:      discards everything
// - FileSink:      one JSON object per record (JSONL), for replay and
//                  offline reward reconstruction

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::evaluator::{Evaluation, FeatureTensor, SituationState};
use crate::reward::EpisodeSummary;
use crate::types::{Action, Timestamp};

/// Abstract sink for per-tick telemetry.
pub trait TelemetrySink {
    /// A fresh Snapshot/State/Tensor triple was published.
    /// `sensor_failures` counts sensors skipped during this evaluation.
    fn record_evaluation(&mut self, evaluation: &Evaluation, sensor_failures: usize);

    /// The policy produced an action for the given state.
    fn record_decision(&mut self, state: &SituationState, action: &Action);

    /// A clamped non-zero reward contribution was forwarded.
    fn record_reward(&mut self, timestamp: Timestamp, delta: f32, cumulative: f32);

    /// The episode closed.
    fn record_episode_end(&mut self, summary: &EpisodeSummary);
}

/// Sink that discards all records.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {
    fn record_evaluation(&mut self, _evaluation: &Evaluation, _sensor_failures: usize) {}
    fn record_decision(&mut self, _state: &SituationState, _action: &Action) {}
    fn record_reward(&mut self, _timestamp: Timestamp, _delta: f32, _cumulative: f32) {}
    fn record_episode_end(&mut self, _summary: &EpisodeSummary) {}
}

/// Tagged record written by `FileSink`, one per line.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TelemetryRecord<'a> {
    Evaluation {
        timestamp: Timestamp,
        state: &'a SituationState,
        tensor: &'a FeatureTensor,
        sensor_failures: usize,
    },
    Decision {
        timestamp: Timestamp,
        state: &'a SituationState,
        action: &'a Action,
    },
    Reward {
        timestamp: Timestamp,
        delta: f32,
        cumulative: f32,
    },
    EpisodeEnd {
        summary: &'a EpisodeSummary,
    },
}

/// JSONL file sink.
///
/// Serialization failures and write failures are counted, not propagated;
/// telemetry must never take down the decision loop.
pub struct FileSink {
    writer: BufWriter<File>,
    write_errors: u64,
}

impl FileSink {
    /// Create a new sink writing to `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            write_errors: 0,
        })
    }

    /// Number of records dropped due to I/O or serialization errors.
    pub fn write_errors(&self) -> u64 {
        self.write_errors
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn write_record(&mut self, record: &TelemetryRecord<'_>) {
        let ok = serde_json::to_writer(&mut self.writer, record)
            .map_err(io::Error::from)
            .and_then(|_| self.writer.write_all(b"\n"));
        if ok.is_err() {
            self.write_errors += 1;
        }
    }
}

impl TelemetrySink for FileSink {
    fn record_evaluation(&mut self, evaluation: &Evaluation, sensor_failures: usize) {
        self.write_record(&TelemetryRecord::Evaluation {
            timestamp: evaluation.snapshot.timestamp,
            state: &evaluation.state,
            tensor: &evaluation.tensor,
            sensor_failures,
        });
    }

    fn record_decision(&mut self, state: &SituationState, action: &Action) {
        self.write_record(&TelemetryRecord::Decision {
            timestamp: state.timestamp,
            state,
            action,
        });
    }

    fn record_reward(&mut self, timestamp: Timestamp, delta: f32, cumulative: f32) {
        self.write_record(&TelemetryRecord::Reward {
            timestamp,
            delta,
            cumulative,
        });
    }

    fn record_episode_end(&mut self, summary: &EpisodeSummary) {
        self.write_record(&TelemetryRecord::EpisodeEnd { summary });
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
