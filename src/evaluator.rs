// src/evaluator.rs
//
// Situation Evaluator: builds a per-tick Snapshot from the world query,
// lets registered sensors augment it, then derives the compact decision
// State and the fixed-length feature tensor consumed by numeric policies.
//
// Ordering guarantee per tick: the snapshot is fully built (including all
// sensors, in registration order) before State/Tensor derivation, and all
// three are published before any policy sees them.

use serde::{Deserialize, Serialize};

use crate::config::TargetDetectionConfig;
use crate::types::{clamp01, SensorError, TargetInfo, Timestamp, Vec2};
use crate::world::WorldQuery;

/// Number of scalar fields in the tensor before the per-target block.
pub const BASE_FEATURE_COUNT: usize = 20;

/// Raw per-tick world observation, before derived scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: Timestamp,
    pub agent_position: Vec2,
    pub agent_velocity: Vec2,
    pub agent_health: f32,
    pub agent_max_health: f32,
    /// In [0, 1] when `agent_max_health > 0`, else exactly 0.
    pub agent_health_ratio: f32,
    pub base_speed: f32,
    pub current_speed: f32,
    pub alternate_mode: bool,
    pub knocked_back: bool,
    pub attack_cooldown_remaining: f32,
    pub obstructed: bool,
    pub opponent_position: Vec2,
    pub opponent_health: f32,
    pub opponent_max_health: f32,
    pub opponent_health_ratio: f32,
    pub distance_to_opponent: f32,
    /// Length never exceeds the configured max target count.
    pub nearby_targets: Vec<TargetInfo>,
}

/// Compact derived decision input with clamped opportunity scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SituationState {
    pub timestamp: Timestamp,
    pub agent_position: Vec2,
    pub agent_velocity: Vec2,
    pub opponent_position: Vec2,
    pub agent_health_ratio: f32,
    pub opponent_health_ratio: f32,
    pub distance_to_opponent: f32,
    pub attack_cooldown_remaining: f32,
    pub alternate_mode: bool,
    pub obstructed: bool,
    /// clamp01(distance_factor * (1 - clamp01(cooldown))).
    pub attack_opportunity: f32,
    /// clamp01((1 - health_ratio) + 0.25 if obstructed).
    pub retreat_urgency: f32,
    /// clamp01(target_density * 0.6 + opponent_health_ratio * 0.4).
    pub explore_value: f32,
    pub nearby_target_count: usize,
}

impl SituationState {
    /// Derive the decision state from a sensor-augmented snapshot.
    ///
    /// Every derived score is a deterministic function of snapshot fields
    /// and lands in [0, 1] for any finite input.
    pub fn from_snapshot(snapshot: &Snapshot, detection: &TargetDetectionConfig) -> Self {
        let distance_factor = if detection.radius > 0.0 {
            clamp01(1.0 - snapshot.distance_to_opponent / detection.radius)
        } else {
            clamp01(1.0 - snapshot.distance_to_opponent * 0.2)
        };
        let attack_opportunity =
            clamp01(distance_factor * (1.0 - clamp01(snapshot.attack_cooldown_remaining)));

        let retreat_urgency = clamp01(
            (1.0 - snapshot.agent_health_ratio) + if snapshot.obstructed { 0.25 } else { 0.0 },
        );

        let slot_capacity = detection.max_targets();
        let target_density = if slot_capacity > 0 {
            clamp01(snapshot.nearby_targets.len() as f32 / slot_capacity as f32)
        } else {
            0.0
        };
        let explore_value =
            clamp01(target_density * 0.6 + snapshot.opponent_health_ratio * 0.4);

        Self {
            timestamp: snapshot.timestamp,
            agent_position: snapshot.agent_position,
            agent_velocity: snapshot.agent_velocity,
            opponent_position: snapshot.opponent_position,
            agent_health_ratio: snapshot.agent_health_ratio,
            opponent_health_ratio: snapshot.opponent_health_ratio,
            distance_to_opponent: snapshot.distance_to_opponent,
            attack_cooldown_remaining: snapshot.attack_cooldown_remaining,
            alternate_mode: snapshot.alternate_mode,
            obstructed: snapshot.obstructed,
            attack_opportunity,
            retreat_urgency,
            explore_value,
            nearby_target_count: snapshot.nearby_targets.len(),
        }
    }
}

/// Fixed-length numeric encoding of a snapshot.
///
/// Layout: 20 base scalars in a frozen order, then one (x, y, distance)
/// triple per target slot, zero-filled past the actual target count.
/// Length is `BASE_FEATURE_COUNT + 3 * target_slots` for the lifetime of
/// one evaluator configuration; consumers depend on positional indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTensor {
    pub values: Vec<f32>,
    pub target_slots: usize,
}

impl FeatureTensor {
    pub fn from_snapshot(snapshot: &Snapshot, target_slots: usize) -> Self {
        let mut values = Vec::with_capacity(BASE_FEATURE_COUNT + target_slots * 3);

        values.push(snapshot.timestamp as f32);
        values.push(snapshot.agent_position.x);
        values.push(snapshot.agent_position.y);
        values.push(snapshot.agent_velocity.x);
        values.push(snapshot.agent_velocity.y);
        values.push(snapshot.agent_health);
        values.push(snapshot.agent_max_health);
        values.push(snapshot.agent_health_ratio);
        values.push(snapshot.base_speed);
        values.push(snapshot.current_speed);
        values.push(if snapshot.alternate_mode { 1.0 } else { 0.0 });
        values.push(if snapshot.knocked_back { 1.0 } else { 0.0 });
        values.push(snapshot.attack_cooldown_remaining);
        values.push(if snapshot.obstructed { 1.0 } else { 0.0 });
        values.push(snapshot.opponent_position.x);
        values.push(snapshot.opponent_position.y);
        values.push(snapshot.opponent_health);
        values.push(snapshot.opponent_max_health);
        values.push(snapshot.opponent_health_ratio);
        values.push(snapshot.distance_to_opponent);

        for slot in 0..target_slots {
            match snapshot.nearby_targets.get(slot) {
                Some(target) => {
                    values.push(target.position.x);
                    values.push(target.position.y);
                    values.push(target.distance);
                }
                None => {
                    values.push(0.0);
                    values.push(0.0);
                    values.push(0.0);
                }
            }
        }

        Self {
            values,
            target_slots,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Pluggable sensor invoked after base snapshot fields are populated.
///
/// Sensors run in registration order and may add or overwrite fields.
/// A failing sensor is skipped; it cannot corrupt or block the others.
pub trait SituationSensor {
    fn capture(&mut self, snapshot: &mut Snapshot) -> Result<(), SensorError>;
}

/// Registration handle returned by `register_sensor`, used to deregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorId(u64);

struct SensorSlot {
    id: SensorId,
    sensor: Box<dyn SituationSensor>,
}

/// One full evaluation result, published as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub snapshot: Snapshot,
    pub state: SituationState,
    pub tensor: FeatureTensor,
}

/// Builds the Snapshot / State / Tensor triple on a throttled cadence.
///
/// The evaluator is passive: the owning controller drives `advance` with
/// the host's delta time and borrows the world per call, keeping a single
/// writer for the published latest evaluation.
pub struct SituationEvaluator {
    evaluation_interval: f32,
    detection: TargetDetectionConfig,
    target_slots: usize,
    sensors: Vec<SensorSlot>,
    next_sensor_id: u64,
    timer: f32,
    latest: Option<Evaluation>,
    /// Sensors that failed during the most recent evaluation.
    sensor_failures: Vec<(SensorId, SensorError)>,
    query_buffer: Vec<TargetInfo>,
}

impl SituationEvaluator {
    pub fn new(evaluation_interval: f32, detection: TargetDetectionConfig) -> Self {
        let interval = evaluation_interval.max(0.02);
        let target_slots = detection.max_targets();
        Self {
            evaluation_interval: interval,
            detection,
            target_slots,
            sensors: Vec::new(),
            next_sensor_id: 0,
            timer: interval,
            latest: None,
            sensor_failures: Vec::new(),
            query_buffer: Vec::with_capacity(target_slots),
        }
    }

    /// Tensor target-slot capacity, fixed for this evaluator's lifetime.
    pub fn target_slots(&self) -> usize {
        self.target_slots
    }

    /// Total tensor length produced by every evaluation.
    pub fn tensor_len(&self) -> usize {
        BASE_FEATURE_COUNT + self.target_slots * 3
    }

    /// Append a sensor to the capture chain; returns its handle.
    pub fn register_sensor(&mut self, sensor: Box<dyn SituationSensor>) -> SensorId {
        let id = SensorId(self.next_sensor_id);
        self.next_sensor_id += 1;
        self.sensors.push(SensorSlot { id, sensor });
        id
    }

    /// Remove a sensor by handle. Unknown handles are ignored.
    pub fn unregister_sensor(&mut self, id: SensorId) {
        self.sensors.retain(|slot| slot.id != id);
    }

    pub fn latest(&self) -> Option<&Evaluation> {
        self.latest.as_ref()
    }

    pub fn latest_state(&self) -> Option<&SituationState> {
        self.latest.as_ref().map(|e| &e.state)
    }

    /// Sensor failures recorded during the most recent evaluation.
    pub fn sensor_failures(&self) -> &[(SensorId, SensorError)] {
        &self.sensor_failures
    }

    /// Advance the evaluation timer by `dt`; runs one evaluation when the
    /// interval elapses and returns the fresh result, `None` otherwise.
    pub fn advance<W: WorldQuery>(
        &mut self,
        world: &W,
        now: Timestamp,
        dt: f32,
    ) -> Option<&Evaluation> {
        self.timer -= dt;
        if self.timer > 0.0 {
            return None;
        }
        self.timer = self.evaluation_interval;
        Some(self.evaluate(world, now))
    }

    /// Rebuild and publish the Snapshot / State / Tensor triple now.
    pub fn evaluate<W: WorldQuery>(&mut self, world: &W, now: Timestamp) -> &Evaluation {
        let snapshot = self.build_snapshot(world, now);
        let state = SituationState::from_snapshot(&snapshot, &self.detection);
        let tensor = FeatureTensor::from_snapshot(&snapshot, self.target_slots);
        &*self.latest.insert(Evaluation {
            snapshot,
            state,
            tensor,
        })
    }

    /// Last computed state; evaluates first if nothing has been published
    /// yet (timestamp ≤ 0) or when `force` is set.
    pub fn current_state<W: WorldQuery>(
        &mut self,
        world: &W,
        now: Timestamp,
        force: bool,
    ) -> SituationState {
        let stale = match &self.latest {
            Some(eval) => eval.state.timestamp <= 0.0,
            None => true,
        };
        if force || stale {
            self.evaluate(world, now);
        }
        self.latest.as_ref().map(|e| e.state).unwrap_or_default()
    }

    fn build_snapshot<W: WorldQuery>(&mut self, world: &W, now: Timestamp) -> Snapshot {
        let pose = world.agent_pose();
        let vitals = world.agent_vitals();
        let status = world.agent_status();

        let mut snapshot = Snapshot {
            timestamp: now,
            agent_position: pose.position,
            agent_velocity: pose.velocity,
            agent_health: vitals.health,
            agent_max_health: vitals.max_health,
            agent_health_ratio: vitals.ratio(),
            base_speed: status.base_speed,
            current_speed: status.current_speed,
            alternate_mode: status.alternate_mode,
            knocked_back: status.knocked_back,
            attack_cooldown_remaining: status.attack_cooldown_remaining,
            obstructed: world.is_obstructed(),
            ..Snapshot::default()
        };

        // Missing opponent is not fatal: zero position, zero distance,
        // zero health ratio, and keep going.
        match world.opponent_pose() {
            Some(opponent) => {
                snapshot.opponent_position = opponent.position;
                snapshot.distance_to_opponent =
                    Vec2::distance(snapshot.agent_position, opponent.position);
            }
            None => {
                snapshot.opponent_position = Vec2::ZERO;
                snapshot.distance_to_opponent = 0.0;
            }
        }
        match world.opponent_vitals() {
            Some(vitals) => {
                snapshot.opponent_health = vitals.health;
                snapshot.opponent_max_health = vitals.max_health;
                snapshot.opponent_health_ratio = vitals.ratio();
            }
            None => {
                snapshot.opponent_health = 0.0;
                snapshot.opponent_max_health = 0.0;
                snapshot.opponent_health_ratio = 0.0;
            }
        }

        snapshot.nearby_targets = self.capture_nearby_targets(world, snapshot.agent_position);

        self.sensor_failures.clear();
        for slot in &mut self.sensors {
            if let Err(err) = slot.sensor.capture(&mut snapshot) {
                self.sensor_failures.push((slot.id, err));
            }
        }

        snapshot
    }

    fn capture_nearby_targets<W: WorldQuery>(
        &mut self,
        world: &W,
        origin: Vec2,
    ) -> Vec<TargetInfo> {
        let detection = &self.detection;
        let max = detection.max_targets();
        if !detection.enabled || detection.radius <= 0.0 || max == 0 {
            return Vec::new();
        }

        self.query_buffer.clear();
        world.query_nearby(
            origin,
            detection.radius,
            detection.category_mask,
            max,
            &mut self.query_buffer,
        );
        self.query_buffer.truncate(max);

        // Distance is recomputed here so sensors and policies see one
        // consistent metric regardless of provider behavior.
        self.query_buffer
            .iter()
            .map(|hit| TargetInfo {
                position: hit.position,
                distance: Vec2::distance(origin, hit.position),
                tag: hit.tag.clone(),
            })
            .collect()
    }
}
