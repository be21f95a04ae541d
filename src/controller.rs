// src/controller.rs
//
// Agent controller: owns the per-tick decision loop. Drives the situation
// evaluator on its throttled cadence, asks the policy for an action,
// blends the returned direction with fallback opponent-seeking steering,
// applies movement, latches attack intent, dispatches mode changes, and
// records observations and reward deltas into working memory.
//
// Lifecycle events from the host (damage, kill, death, episode end) enter
// through the `notify_*` methods and are shaped by the reward calculator
// before reaching the policy.

use crate::config::AgentConfig;
use crate::evaluator::{SensorId, SituationEvaluator, SituationSensor, SituationState};
use crate::memory::{MemoryEntry, WorkingMemory};
use crate::policy::Policy;
use crate::reward::{EpisodeSummary, RewardCalculator};
use crate::telemetry::TelemetrySink;
use crate::types::{approximately_zero, Action, Timestamp, Vec2};
use crate::world::WorldQuery;

/// Decision-loop owner for one agent.
///
/// The policy is optional: without one the controller still steers
/// straight at the opponent each tick, and produces no observations and
/// no learning signal.
pub struct AgentController<W: WorldQuery, S: TelemetrySink> {
    cfg: AgentConfig,
    world: W,
    sink: S,
    evaluator: SituationEvaluator,
    memory: WorkingMemory,
    reward: RewardCalculator,
    policy: Option<Box<dyn Policy>>,

    latest_state: Option<SituationState>,
    latest_action: Action,
    /// True once the current published state has been recorded with zero
    /// reward; suppresses redundant zero-reward pushes until the next
    /// evaluation lands.
    observation_recorded: bool,
    desired_direction: Vec2,
    pending_attack: bool,
}

impl<W: WorldQuery, S: TelemetrySink> AgentController<W, S> {
    pub fn new(cfg: AgentConfig, world: W, sink: S) -> Self {
        let evaluator =
            SituationEvaluator::new(cfg.evaluation_interval(), cfg.target_detection.clone());
        let memory = WorkingMemory::new(cfg.working_memory_capacity());
        let reward = RewardCalculator::new(cfg.reward.clone());
        Self {
            cfg,
            world,
            sink,
            evaluator,
            memory,
            reward,
            policy: None,
            latest_state: None,
            latest_action: Action::idle(),
            observation_recorded: false,
            desired_direction: Vec2::ZERO,
            pending_attack: false,
        }
    }

    pub fn with_policy(mut self, policy: Box<dyn Policy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Append a sensor to the evaluator's capture chain.
    pub fn register_sensor(&mut self, sensor: Box<dyn SituationSensor>) -> SensorId {
        self.evaluator.register_sensor(sensor)
    }

    pub fn unregister_sensor(&mut self, id: SensorId) {
        self.evaluator.unregister_sensor(id);
    }

    /// Begin an episode: attach the reward calculator and run one forced
    /// evaluation so a cached state exists before the first tick.
    pub fn activate(&mut self, now: Timestamp) {
        self.reward.attach(now);
        let state = self.evaluator.current_state(&self.world, now, true);
        self.latest_state = Some(state);
        self.observation_recorded = false;
        self.pending_attack = false;
    }

    /// Stop listening for lifecycle events. Does not close the episode.
    pub fn deactivate(&mut self) {
        self.reward.detach();
    }

    /// One simulated tick: evaluate (throttled), accrue survival reward,
    /// decide, steer, and apply movement.
    pub fn tick(&mut self, now: Timestamp, dt: f32) {
        let published = if let Some(evaluation) = self.evaluator.advance(&self.world, now, dt) {
            self.latest_state = Some(evaluation.state);
            true
        } else {
            false
        };
        if published {
            self.observation_recorded = false;
            let failures = self.evaluator.sensor_failures().len();
            if let Some(evaluation) = self.evaluator.latest() {
                self.sink.record_evaluation(evaluation, failures);
            }
        }

        if self.reward.survival_due(dt) {
            let state = self.last_known_state(now);
            let tick = self.reward.survival_tick(&state);
            for delta in [tick.survival, tick.positional, tick.obstruction]
                .into_iter()
                .flatten()
            {
                self.forward_reward(delta, now);
            }
        }

        self.update_decision(now);
        self.apply_movement();
    }

    fn update_decision(&mut self, now: Timestamp) {
        let Some(state) = self.latest_state else {
            // Nothing published yet; fall back to plain seek.
            self.desired_direction = self.fallback_direction();
            return;
        };

        let Some(policy) = self.policy.as_mut() else {
            self.desired_direction = self.fallback_direction();
            return;
        };

        let action = policy.decide(&state, &self.memory);
        self.sink.record_decision(&state, &action);
        self.latest_action = action;

        self.desired_direction = Self::blend_direction(
            self.fallback_direction(),
            action.move_direction,
            self.cfg.steer_weight(),
        );

        let current_mode = self.world.agent_status().alternate_mode;
        if action.request_alternate_mode != current_mode {
            self.world.set_alternate_mode(action.request_alternate_mode);
            if let Some(delta) = self.reward.mode_changed(action.request_alternate_mode) {
                self.forward_reward(delta, now);
            }
        }

        self.pending_attack = action.attempt_attack;

        self.record_observation(0.0, now);
    }

    fn apply_movement(&mut self) {
        let status = self.world.agent_status();
        // Knockback owns the body until it expires.
        if status.knocked_back {
            return;
        }
        self.world
            .apply_velocity(self.desired_direction * status.current_speed);
    }

    /// Seek direction toward the opponent, zero when coincident or absent.
    fn fallback_direction(&self) -> Vec2 {
        match self.world.opponent_pose() {
            Some(opponent) => {
                let delta = opponent.position - self.world.agent_pose().position;
                if delta.is_degenerate() {
                    Vec2::ZERO
                } else {
                    delta.normalized()
                }
            }
            None => Vec2::ZERO,
        }
    }

    /// Linear blend of fallback seek and policy direction, re-normalized.
    /// Degenerate inputs fall through to the other side; a fully
    /// degenerate pair yields a unit rightward vector.
    fn blend_direction(fallback: Vec2, policy_dir: Vec2, steer_weight: f32) -> Vec2 {
        let desired = if policy_dir.is_degenerate() {
            Vec2::ZERO
        } else {
            policy_dir.normalized()
        };

        if fallback.is_degenerate() {
            if desired.is_degenerate() {
                Vec2::RIGHT
            } else {
                desired
            }
        } else if desired.is_degenerate() {
            fallback
        } else {
            Vec2::lerp(fallback, desired, steer_weight).normalized()
        }
    }

    /// Push one observation entry unless it is a redundant zero-reward
    /// duplicate of the current state.
    fn record_observation(&mut self, reward_delta: f32, now: Timestamp) {
        let Some(state) = self.latest_state else {
            return;
        };
        if approximately_zero(reward_delta) && self.observation_recorded {
            return;
        }
        self.memory
            .push(state, self.latest_action, reward_delta, now);
        self.observation_recorded = true;
    }

    /// Deliver one shaped reward delta: policy notification, telemetry,
    /// and a dedicated working-memory entry.
    fn forward_reward(&mut self, delta: f32, now: Timestamp) {
        if let Some(policy) = self.policy.as_mut() {
            policy.give_reward(delta);
        }
        self.sink
            .record_reward(now, delta, self.reward.cumulative_reward());
        self.record_observation(delta, now);
    }

    fn deliver_summary(&mut self, summary: EpisodeSummary) {
        if let Some(policy) = self.policy.as_mut() {
            policy.on_episode_end(&summary);
        }
        self.sink.record_episode_end(&summary);
    }

    /// Cached latest state, falling back to a forced evaluation.
    fn last_known_state(&mut self, now: Timestamp) -> SituationState {
        match self.latest_state {
            Some(state) => state,
            None => {
                let state = self.evaluator.current_state(&self.world, now, true);
                self.latest_state = Some(state);
                state
            }
        }
    }

    // ----- Lifecycle events from the host -----

    pub fn notify_damage_dealt(&mut self, amount: f32, now: Timestamp) {
        if let Some(delta) = self.reward.damage_dealt(amount) {
            self.forward_reward(delta, now);
        }
    }

    pub fn notify_damage_taken(&mut self, amount: f32, now: Timestamp) {
        if let Some(delta) = self.reward.damage_taken(amount) {
            self.forward_reward(delta, now);
        }
    }

    pub fn notify_opponent_killed(&mut self, now: Timestamp) {
        if let Some(delta) = self.reward.opponent_killed() {
            self.forward_reward(delta, now);
        }
    }

    /// Death closes the episode with `survived = false`; the penalty is
    /// forwarded first. Idempotent: only the first call yields a summary.
    pub fn notify_death(&mut self, now: Timestamp) -> Option<EpisodeSummary> {
        let (delta, summary) = self.reward.death(now, self.memory.len());
        if let Some(delta) = delta {
            self.forward_reward(delta, now);
        }
        if let Some(summary) = summary {
            self.deliver_summary(summary);
            return Some(summary);
        }
        None
    }

    /// External episode-end signal: close with `survived = true`.
    pub fn end_episode(&mut self, now: Timestamp) -> Option<EpisodeSummary> {
        let summary = self.reward.close_episode(true, now, self.memory.len())?;
        self.deliver_summary(summary);
        Some(summary)
    }

    // ----- Accessors -----

    pub fn latest_state(&self) -> Option<&SituationState> {
        self.latest_state.as_ref()
    }

    pub fn latest_action(&self) -> &Action {
        &self.latest_action
    }

    pub fn desired_direction(&self) -> Vec2 {
        self.desired_direction
    }

    /// Consume the latched attack request (host collision layer).
    pub fn take_attack_request(&mut self) -> bool {
        std::mem::take(&mut self.pending_attack)
    }

    pub fn attack_requested(&self) -> bool {
        self.pending_attack
    }

    pub fn memory(&self) -> &WorkingMemory {
        &self.memory
    }

    pub fn last_observation(&self) -> Option<&MemoryEntry> {
        self.memory.last()
    }

    pub fn cumulative_reward(&self) -> f32 {
        self.reward.cumulative_reward()
    }

    pub fn episode_closed(&self) -> bool {
        self.reward.is_closed()
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn config(&self) -> &AgentConfig {
        &self.cfg
    }
}
