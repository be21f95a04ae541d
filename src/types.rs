// src/types.rs
//
// Common shared types for the gloam agent harness.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Simulated-time timestamp in seconds since episode host start.
pub type Timestamp = f64;

/// Bitmask selecting which target categories a nearby-entity query returns.
pub type CategoryMask = u32;

/// Clamp to [0, 1]. NaN saturates to 0 so bad sensor or policy values
/// cannot leak into derived scores.
pub fn clamp01(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// True when `v` is close enough to zero to be treated as zero reward.
pub fn approximately_zero(v: f32) -> bool {
    v.abs() <= 1e-6
}

/// 2D vector used for positions, velocities and move directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const RIGHT: Vec2 = Vec2 { x: 1.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_sq(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(&self) -> f32 {
        self.length_sq().sqrt()
    }

    /// Unit vector in the same direction, or zero if degenerate.
    pub fn normalized(&self) -> Vec2 {
        let len_sq = self.length_sq();
        if len_sq <= f32::EPSILON {
            return Vec2::ZERO;
        }
        let inv = 1.0 / len_sq.sqrt();
        Vec2::new(self.x * inv, self.y * inv)
    }

    /// Treat directions shorter than the steering epsilon as "no direction".
    pub fn is_degenerate(&self) -> bool {
        let len_sq = self.length_sq();
        !len_sq.is_finite() || len_sq < 1e-4
    }

    pub fn distance(a: Vec2, b: Vec2) -> f32 {
        (a - b).length()
    }

    pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Discrete movement intent chosen by a policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    #[default]
    Idle,
    Chase,
    Strafe,
    Retreat,
}

/// Decision output of a policy for one tick.
///
/// `move_direction` carries no normalization guarantee; the controller
/// normalizes when blending with its fallback steering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub move_direction: Vec2,
    pub attempt_attack: bool,
    pub request_alternate_mode: bool,
}

impl Action {
    /// Zero action: stand still, no attack, keep current mode.
    pub fn idle() -> Self {
        Action::default()
    }
}

/// One nearby entity captured during target detection.
///
/// `tag` uses `Arc<str>` for cheap cloning on the per-tick path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetInfo {
    pub position: Vec2,
    pub distance: f32,
    pub tag: Arc<str>,
}

/// Failure raised by a single sensor during capture.
///
/// Sensor failures are isolated per sensor: the evaluator records them and
/// continues with the remaining sensors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorError {
    pub message: String,
}

impl SensorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sensor failure: {}", self.message)
    }
}

impl std::error::Error for SensorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp01_saturates() {
        assert_eq!(clamp01(-0.5), 0.0);
        assert_eq!(clamp01(0.25), 0.25);
        assert_eq!(clamp01(1.5), 1.0);
        assert_eq!(clamp01(f32::NAN), 0.0);
    }

    #[test]
    fn normalized_handles_zero() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
        let v = Vec2::new(3.0, 4.0).normalized();
        assert!((v.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn lerp_endpoints() {
        let a = Vec2::new(1.0, 0.0);
        let b = Vec2::new(0.0, 1.0);
        assert_eq!(Vec2::lerp(a, b, 0.0), a);
        assert_eq!(Vec2::lerp(a, b, 1.0), b);
    }
}
