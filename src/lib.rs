//! Gloam core library.
//!
//! An online decision-and-learning-signal harness for a real-time
//! simulated agent. Each simulated tick the harness summarizes world
//! context into a fixed-shape snapshot, lets a replaceable policy choose
//! an action, records the observation into a bounded rolling memory, and
//! shapes a scalar reward from game events that feeds back to the policy.
//!
//! # Architecture
//!
//! - **World query** (`world`): the only contract with the host engine.
//!   Pose/vitals/status reads, a bounded nearby-entity query, and a
//!   velocity write. Injected explicitly; no global singletons.
//!
//! - **Situation evaluator** (`evaluator`): throttled Snapshot → State →
//!   Tensor pipeline with an ordered pluggable sensor chain.
//!
//! - **Working memory** (`memory`): fixed-capacity FIFO log of
//!   (state, action, reward) observations.
//!
//! - **Reward calculator** (`reward`): event-driven shaping with
//!   per-contribution clamping and idempotent episode closing.
//!
//! - **Policy** (`policy`): the pluggable "brain" contract plus no-op and
//!   heuristic reference implementations.
//!
//! - **Agent controller** (`controller`): the tick loop gluing all of the
//!   above together and applying movement/attack/mode intent.
//!
//! The binary (`src/main.rs`) is a thin deterministic simulation harness
//! around these components.

pub mod config;
pub mod controller;
pub mod evaluator;
pub mod memory;
pub mod policy;
pub mod reward;
pub mod sim;
pub mod telemetry;
pub mod types;
pub mod world;

// --- Re-exports for ergonomic external use ---------------------------------

pub use config::{AgentConfig, RewardConfig, TargetDetectionConfig};
pub use controller::AgentController;
pub use evaluator::{
    Evaluation, FeatureTensor, SensorId, SituationEvaluator, SituationSensor, SituationState,
    Snapshot, BASE_FEATURE_COUNT,
};
pub use memory::{MemoryEntry, WorkingMemory};
pub use policy::{HeuristicPolicy, NoopPolicy, Policy, HEURISTIC_POLICY_VERSION};
pub use reward::{EpisodeSummary, RewardCalculator, SurvivalTick};
pub use sim::{SimWorld, StepEvents};
pub use telemetry::{FileSink, NoopSink, TelemetrySink};
pub use types::{
    clamp01, Action, ActionKind, CategoryMask, SensorError, TargetInfo, Timestamp, Vec2,
};
pub use world::{AgentStatus, Pose, Vitals, WorldQuery};
