// src/reward.rs
//
// Reward calculator: shapes a scalar learning signal from agent lifecycle
// events (damage dealt/taken, mode changes, kills, death) and from a
// periodic survival tick, and closes the episode with a summary.
//
// The calculator is pure with respect to the policy: every method returns
// the clamped contribution (or `None` when nothing should be forwarded)
// and the owning controller delivers it. Contributions are clamped to
// ±max_reward_magnitude before touching the cumulative total.

use serde::{Deserialize, Serialize};

use crate::config::RewardConfig;
use crate::evaluator::SituationState;
use crate::types::{approximately_zero, Timestamp};

/// Immutable end-of-episode summary, created exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Elapsed simulated time since the episode was attached.
    pub duration: f64,
    /// Observation count in working memory at close time.
    pub observations: usize,
    pub cumulative_reward: f32,
    pub survived: bool,
    pub damage_dealt: f32,
    pub damage_taken: f32,
}

/// Contributions emitted by one survival tick, in application order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurvivalTick {
    /// Flat reward for staying alive through the interval.
    pub survival: Option<f32>,
    /// Bonus when the opponent distance sits inside the ideal band.
    pub positional: Option<f32>,
    /// Penalty when the agent is obstructed.
    pub obstruction: Option<f32>,
}

/// Event-driven reward shaping for one episode.
pub struct RewardCalculator {
    config: RewardConfig,
    attached: bool,
    episode_closed: bool,
    start_time: Timestamp,
    survival_timer: f32,
    cumulative_reward: f32,
    damage_dealt_total: f32,
    damage_taken_total: f32,
}

impl RewardCalculator {
    pub fn new(config: RewardConfig) -> Self {
        Self {
            config,
            attached: false,
            episode_closed: false,
            start_time: 0.0,
            survival_timer: 0.0,
            cumulative_reward: 0.0,
            damage_dealt_total: 0.0,
            damage_taken_total: 0.0,
        }
    }

    /// Begin an episode: reset counters and start listening for events.
    pub fn attach(&mut self, now: Timestamp) {
        self.attached = true;
        self.episode_closed = false;
        self.start_time = now;
        self.survival_timer = 0.0;
        self.cumulative_reward = 0.0;
        self.damage_dealt_total = 0.0;
        self.damage_taken_total = 0.0;
    }

    /// Stop listening. Does not close the episode.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_closed(&self) -> bool {
        self.episode_closed
    }

    pub fn cumulative_reward(&self) -> f32 {
        self.cumulative_reward
    }

    pub fn damage_dealt_total(&self) -> f32 {
        self.damage_dealt_total
    }

    pub fn damage_taken_total(&self) -> f32 {
        self.damage_taken_total
    }

    /// Shape one raw contribution: drop zeros, clamp to the magnitude
    /// bound, accumulate, and return the delta to forward to the policy.
    fn shape(&mut self, raw: f32) -> Option<f32> {
        if !self.attached || self.episode_closed || approximately_zero(raw) {
            return None;
        }
        let bound = self.config.max_reward_magnitude();
        let clamped = raw.clamp(-bound, bound);
        self.cumulative_reward += clamped;
        Some(clamped)
    }

    pub fn damage_dealt(&mut self, amount: f32) -> Option<f32> {
        if !self.attached || self.episode_closed {
            return None;
        }
        self.damage_dealt_total += amount;
        self.shape(amount * self.config.damage_dealt_weight)
    }

    pub fn damage_taken(&mut self, amount: f32) -> Option<f32> {
        if !self.attached || self.episode_closed {
            return None;
        }
        self.damage_taken_total += amount;
        self.shape(amount * self.config.damage_taken_weight)
    }

    pub fn mode_changed(&mut self, alternate: bool) -> Option<f32> {
        if alternate {
            self.shape(self.config.mode_enter_reward)
        } else {
            self.shape(self.config.mode_exit_penalty)
        }
    }

    pub fn opponent_killed(&mut self) -> Option<f32> {
        self.shape(self.config.kill_reward)
    }

    /// Death event: apply the death penalty and close the episode with
    /// `survived = false`. A second death after closing is a no-op.
    pub fn death(
        &mut self,
        now: Timestamp,
        observations: usize,
    ) -> (Option<f32>, Option<EpisodeSummary>) {
        if self.episode_closed {
            return (None, None);
        }
        let delta = self.shape(self.config.death_penalty);
        let summary = self.close_episode(false, now, observations);
        (delta, summary)
    }

    /// Accrue active time; true when one survival interval has elapsed.
    /// Partial overshoot carries forward into the next interval.
    pub fn survival_due(&mut self, dt: f32) -> bool {
        if !self.attached || self.episode_closed {
            return false;
        }
        self.survival_timer += dt;
        let interval = self.config.survival_tick_interval();
        if self.survival_timer >= interval {
            self.survival_timer -= interval;
            true
        } else {
            false
        }
    }

    /// Contributions for one due survival tick, based on the last known
    /// state. Each component is shaped independently.
    pub fn survival_tick(&mut self, state: &SituationState) -> SurvivalTick {
        let survival = self.shape(self.config.survival_tick_reward);

        let in_band = state.distance_to_opponent >= self.config.ideal_distance_min
            && state.distance_to_opponent <= self.config.ideal_distance_max;
        let positional = if in_band {
            self.shape(self.config.ideal_distance_reward)
        } else {
            None
        };

        let obstruction = if state.obstructed {
            self.shape(self.config.obstructed_penalty)
        } else {
            None
        };

        SurvivalTick {
            survival,
            positional,
            obstruction,
        }
    }

    /// Close the episode and build its summary. Idempotent: only the first
    /// call yields a summary.
    pub fn close_episode(
        &mut self,
        survived: bool,
        now: Timestamp,
        observations: usize,
    ) -> Option<EpisodeSummary> {
        if self.episode_closed {
            return None;
        }
        self.episode_closed = true;
        Some(EpisodeSummary {
            duration: now - self.start_time,
            observations,
            cumulative_reward: self.cumulative_reward,
            survived,
            damage_dealt: self.damage_dealt_total,
            damage_taken: self.damage_taken_total,
        })
    }
}
