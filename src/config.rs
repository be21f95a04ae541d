// src/config.rs
//
// Central configuration for the gloam agent harness.
// This is the single source of truth for the recognized option surface:
// evaluation cadence, target detection, reward shaping, working memory
// and steering. All floors and ranges are enforced by clamped accessors
// rather than by failing construction.

use crate::types::CategoryMask;

/// Top-level configuration injected into the agent controller.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Human-readable config / release version.
    pub version: &'static str,
    /// Wall-clock interval between situation evaluations (seconds).
    /// Floor-clamped to 0.02 s by `evaluation_interval()`.
    pub evaluation_interval: f32,
    /// Nearby-target capture settings.
    pub target_detection: TargetDetectionConfig,
    /// Reward shaping weights and episode settings.
    pub reward: RewardConfig,
    /// Working memory ring-buffer capacity. Clamped to 4..=128.
    pub working_memory_capacity: usize,
    /// Blend weight between fallback seek direction (0.0) and the
    /// policy's direction (1.0). Clamped to [0, 1].
    pub steer_weight: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            version: "gloam-0.1",
            evaluation_interval: 0.1,
            target_detection: TargetDetectionConfig::default(),
            reward: RewardConfig::default(),
            working_memory_capacity: 32,
            steer_weight: 0.5,
        }
    }
}

impl AgentConfig {
    /// Effective evaluation interval, floor-clamped to avoid zero or
    /// negative cadences.
    pub fn evaluation_interval(&self) -> f32 {
        self.evaluation_interval.max(0.02)
    }

    /// Effective working memory capacity, clamped to 4..=128.
    pub fn working_memory_capacity(&self) -> usize {
        self.working_memory_capacity.clamp(4, 128)
    }

    /// Effective steer weight, clamped to [0, 1].
    pub fn steer_weight(&self) -> f32 {
        self.steer_weight.clamp(0.0, 1.0)
    }
}

/// Settings for the bounded nearby-entity query.
#[derive(Debug, Clone)]
pub struct TargetDetectionConfig {
    pub enabled: bool,
    /// Query radius in world units. Also the detection radius used by the
    /// attack-opportunity distance factor.
    pub radius: f32,
    /// Category mask forwarded to the world query.
    pub category_mask: CategoryMask,
    /// Maximum captured targets per evaluation. Clamped to 0..=16; this is
    /// also the tensor's target-slot capacity.
    pub max_targets: usize,
}

impl Default for TargetDetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 5.0,
            category_mask: u32::MAX,
            max_targets: 4,
        }
    }
}

impl TargetDetectionConfig {
    /// Effective target slot capacity, clamped to 0..=16.
    pub fn max_targets(&self) -> usize {
        self.max_targets.min(16)
    }
}

/// Reward shaping weights.
///
/// Defaults mirror a small-magnitude shaping scheme: per-event deltas stay
/// well inside `max_reward_magnitude` under normal damage numbers, so the
/// clamp only bites on outliers.
#[derive(Debug, Clone)]
pub struct RewardConfig {
    // ----- Combat -----
    pub damage_dealt_weight: f32,
    pub damage_taken_weight: f32,
    pub kill_reward: f32,
    pub death_penalty: f32,

    // ----- Positioning / survival -----
    pub survival_tick_reward: f32,
    /// Seconds of active time between survival ticks. Floor 0.1 s via
    /// `survival_tick_interval()`.
    pub survival_tick_interval: f32,
    pub obstructed_penalty: f32,
    pub ideal_distance_min: f32,
    pub ideal_distance_max: f32,
    pub ideal_distance_reward: f32,

    // ----- Alternate mode -----
    pub mode_enter_reward: f32,
    pub mode_exit_penalty: f32,

    // ----- General -----
    /// Per-contribution clamp bound. Floor 0.01 via
    /// `max_reward_magnitude()`.
    pub max_reward_magnitude: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            damage_dealt_weight: 0.01,
            damage_taken_weight: -0.015,
            kill_reward: 1.0,
            death_penalty: -1.0,
            survival_tick_reward: 0.02,
            survival_tick_interval: 2.0,
            obstructed_penalty: -0.05,
            ideal_distance_min: 1.5,
            ideal_distance_max: 3.5,
            ideal_distance_reward: 0.05,
            mode_enter_reward: 0.1,
            mode_exit_penalty: -0.05,
            max_reward_magnitude: 0.5,
        }
    }
}

impl RewardConfig {
    /// Effective survival tick interval, floor-clamped to 0.1 s.
    pub fn survival_tick_interval(&self) -> f32 {
        self.survival_tick_interval.max(0.1)
    }

    /// Effective clamp bound, floor-clamped to 0.01.
    pub fn max_reward_magnitude(&self) -> f32 {
        self.max_reward_magnitude.max(0.01)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_accessors_enforce_floors() {
        let mut cfg = AgentConfig {
            evaluation_interval: 0.0,
            working_memory_capacity: 0,
            steer_weight: 1.5,
            ..AgentConfig::default()
        };
        cfg.reward.survival_tick_interval = 0.0;
        cfg.reward.max_reward_magnitude = 0.0;
        cfg.target_detection.max_targets = 64;

        assert_eq!(cfg.evaluation_interval(), 0.02);
        assert_eq!(cfg.working_memory_capacity(), 4);
        assert_eq!(cfg.steer_weight(), 1.0);
        assert_eq!(cfg.reward.survival_tick_interval(), 0.1);
        assert_eq!(cfg.reward.max_reward_magnitude(), 0.01);
        assert_eq!(cfg.target_detection.max_targets(), 16);
    }

    #[test]
    fn defaults_are_in_range() {
        let cfg = AgentConfig::default();
        assert!(cfg.evaluation_interval() >= 0.02);
        assert!((4..=128).contains(&cfg.working_memory_capacity()));
        assert!((0.0..=1.0).contains(&cfg.steer_weight()));
        assert!(cfg.target_detection.max_targets() <= 16);
    }
}
