// src/policy.rs
//
// Decision policy ("brain") contract plus two reference implementations:
// a no-op policy and a deterministic heuristic. Learned policies plug in
// through the same trait; the harness never looks inside them.

use crate::evaluator::SituationState;
use crate::memory::WorkingMemory;
use crate::reward::EpisodeSummary;
use crate::types::{Action, ActionKind, Vec2};

/// Version tag for the built-in heuristic, logged with telemetry.
pub const HEURISTIC_POLICY_VERSION: u32 = 1;

/// Pluggable strategy mapping state (+ memory) to an action.
///
/// `decide` must be side-effect-free with respect to game state; internal
/// policy state (weights, traces) is its own business. `give_reward` is
/// fire-and-forget, called once per clamped non-zero reward contribution.
/// `on_episode_end` is called exactly once per episode.
pub trait Policy {
    fn decide(&mut self, state: &SituationState, memory: &WorkingMemory) -> Action;

    fn give_reward(&mut self, reward: f32);

    fn on_episode_end(&mut self, summary: &EpisodeSummary);
}

/// Policy that always stands still and ignores all feedback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPolicy;

impl Policy for NoopPolicy {
    fn decide(&mut self, _state: &SituationState, _memory: &WorkingMemory) -> Action {
        Action::idle()
    }

    fn give_reward(&mut self, _reward: f32) {}

    fn on_episode_end(&mut self, _summary: &EpisodeSummary) {}
}

/// Deterministic rule-based policy over the derived scores.
///
/// Retreat when urgency is high, chase and attack when the opportunity
/// window is open, strafe when the area is busy, otherwise close distance.
#[derive(Debug, Clone)]
pub struct HeuristicPolicy {
    pub retreat_threshold: f32,
    pub attack_threshold: f32,
    pub explore_threshold: f32,
    /// Request alternate mode while retreating through an obstruction.
    pub mode_when_obstructed: bool,
}

impl Default for HeuristicPolicy {
    fn default() -> Self {
        Self {
            retreat_threshold: 0.65,
            attack_threshold: 0.5,
            explore_threshold: 0.5,
            mode_when_obstructed: true,
        }
    }
}

impl HeuristicPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    fn toward_opponent(state: &SituationState) -> Vec2 {
        (state.opponent_position - state.agent_position).normalized()
    }
}

impl Policy for HeuristicPolicy {
    fn decide(&mut self, state: &SituationState, _memory: &WorkingMemory) -> Action {
        let toward = Self::toward_opponent(state);

        if state.retreat_urgency >= self.retreat_threshold {
            return Action {
                kind: ActionKind::Retreat,
                move_direction: toward * -1.0,
                attempt_attack: false,
                request_alternate_mode: self.mode_when_obstructed && state.obstructed,
            };
        }

        if state.attack_opportunity >= self.attack_threshold {
            return Action {
                kind: ActionKind::Chase,
                move_direction: toward,
                attempt_attack: state.attack_cooldown_remaining <= 0.0,
                request_alternate_mode: state.alternate_mode,
            };
        }

        if state.explore_value >= self.explore_threshold {
            // Orbit: perpendicular to the opponent bearing.
            let tangent = Vec2::new(-toward.y, toward.x);
            return Action {
                kind: ActionKind::Strafe,
                move_direction: tangent,
                attempt_attack: false,
                request_alternate_mode: state.alternate_mode,
            };
        }

        Action {
            kind: ActionKind::Chase,
            move_direction: toward,
            attempt_attack: false,
            request_alternate_mode: state.alternate_mode,
        }
    }

    fn give_reward(&mut self, _reward: f32) {}

    fn on_episode_end(&mut self, _summary: &EpisodeSummary) {}
}
