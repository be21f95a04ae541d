// src/world.rs
//
// World Query Provider contract.
//
// The harness core never touches engine-specific physics or scene APIs.
// Everything it needs from the host simulation goes through this trait:
// pose/vitals/status reads, a bounded nearby-entity query, and a single
// velocity write used to apply the blended movement intent.

use crate::types::{CategoryMask, TargetInfo, Vec2};

/// Position and physics velocity of an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    pub position: Vec2,
    pub velocity: Vec2,
}

/// Health pair for an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vitals {
    pub health: f32,
    pub max_health: f32,
}

impl Vitals {
    /// Health ratio in [0, 1]; exactly 0 when `max_health` is not positive.
    pub fn ratio(&self) -> f32 {
        if self.max_health > 0.0 {
            (self.health / self.max_health).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Non-physics agent status read each evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AgentStatus {
    pub base_speed: f32,
    pub current_speed: f32,
    pub alternate_mode: bool,
    pub knocked_back: bool,
    pub attack_cooldown_remaining: f32,
}

/// Host-simulation query surface injected into the harness at construction.
///
/// Implementations must tolerate entities disappearing between query and
/// read by silently omitting them, and must never return more than
/// `max_count` entries from `query_nearby`.
pub trait WorldQuery {
    /// Agent position and physics velocity.
    fn agent_pose(&self) -> Pose;

    /// Agent health pair.
    fn agent_vitals(&self) -> Vitals;

    /// Agent speed/mode/cooldown status.
    fn agent_status(&self) -> AgentStatus;

    /// Opponent pose, or `None` when the opponent reference is unresolved.
    /// A missing opponent is not fatal; the evaluator substitutes zeros.
    fn opponent_pose(&self) -> Option<Pose>;

    /// Opponent health pair, or `None` when unresolved.
    fn opponent_vitals(&self) -> Option<Vitals>;

    /// Whether the agent currently overlaps an obstruction volume.
    fn is_obstructed(&self) -> bool;

    /// Append up to `max_count` entities within `radius` of `origin` that
    /// match `mask` into `out`. `out` is cleared by the caller; entries
    /// carry position and tag, distance is recomputed by the evaluator.
    fn query_nearby(
        &self,
        origin: Vec2,
        radius: f32,
        mask: CategoryMask,
        max_count: usize,
        out: &mut Vec<TargetInfo>,
    );

    /// Write the agent's physics velocity for this tick.
    fn apply_velocity(&mut self, velocity: Vec2);

    /// Toggle the agent's alternate mode. Visual and combat side effects
    /// live in the host; the flag must be reflected by `agent_status`.
    fn set_alternate_mode(&mut self, alternate: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vitals_ratio_bounds() {
        let v = Vitals {
            health: 50.0,
            max_health: 100.0,
        };
        assert_eq!(v.ratio(), 0.5);

        let dead_cfg = Vitals {
            health: 10.0,
            max_health: 0.0,
        };
        assert_eq!(dead_cfg.ratio(), 0.0);

        let overfull = Vitals {
            health: 120.0,
            max_health: 100.0,
        };
        assert_eq!(overfull.ratio(), 1.0);
    }
}
