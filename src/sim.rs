// src/sim.rs
//
// Deterministic simulation world for the research harness and tests.
//
// Implements WorldQuery over a tiny scripted arena: the opponent random-
// walks on a seeded RNG, a handful of tagged bystander targets drift
// nearby, obstruction volumes toggle stochastically, and melee combat is
// emulated with cooldowns on both sides. Same seed, same run.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::types::{CategoryMask, TargetInfo, Vec2};
use crate::world::{AgentStatus, Pose, Vitals, WorldQuery};

/// Category bit for bystander targets (matched against the query mask).
pub const CATEGORY_CREATURE: CategoryMask = 0b01;
/// Category bit for environment hazards.
pub const CATEGORY_HAZARD: CategoryMask = 0b10;

#[derive(Debug, Clone)]
struct SimTarget {
    position: Vec2,
    tag: &'static str,
    category: CategoryMask,
}

/// Combat feedback produced by one simulation step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepEvents {
    /// Damage the opponent landed on the agent this step.
    pub damage_taken: Option<f32>,
    /// Agent health reached zero this step.
    pub agent_died: bool,
}

/// Scripted arena world, driven by the harness loop.
pub struct SimWorld {
    rng: ChaCha8Rng,
    agent: Pose,
    agent_vitals: Vitals,
    status: AgentStatus,
    opponent: Pose,
    opponent_vitals: Vitals,
    opponent_cooldown: f32,
    obstructed: bool,
    targets: Vec<SimTarget>,
    arena_half_extent: f32,
    attack_range: f32,
    agent_damage: f32,
    opponent_damage: f32,
    attack_reload: f32,
    opponent_reload: f32,
}

impl SimWorld {
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let targets = (0..3)
            .map(|i| SimTarget {
                position: Vec2::new(
                    rng.gen_range(-4.0..4.0),
                    rng.gen_range(-4.0..4.0),
                ),
                tag: if i == 0 { "hazard" } else { "creature" },
                category: if i == 0 {
                    CATEGORY_HAZARD
                } else {
                    CATEGORY_CREATURE
                },
            })
            .collect();

        Self {
            rng,
            agent: Pose {
                position: Vec2::new(-3.0, 0.0),
                velocity: Vec2::ZERO,
            },
            agent_vitals: Vitals {
                health: 100.0,
                max_health: 100.0,
            },
            status: AgentStatus {
                base_speed: 2.0,
                current_speed: 2.0,
                alternate_mode: false,
                knocked_back: false,
                attack_cooldown_remaining: 0.0,
            },
            opponent: Pose {
                position: Vec2::new(3.0, 0.0),
                velocity: Vec2::ZERO,
            },
            opponent_vitals: Vitals {
                health: 150.0,
                max_health: 150.0,
            },
            opponent_cooldown: 0.0,
            obstructed: false,
            targets,
            arena_half_extent: 8.0,
            attack_range: 1.2,
            agent_damage: 8.0,
            opponent_damage: 6.0,
            attack_reload: 1.0,
            opponent_reload: 1.4,
        }
    }

    /// Advance the world by `dt`: integrate motion, decay cooldowns,
    /// random-walk the opponent, and let it swing when in range.
    pub fn step(&mut self, dt: f32) -> StepEvents {
        // Agent integrates the velocity the controller applied.
        self.agent.position = self.agent.position + self.agent.velocity * dt;
        self.clamp_to_arena();

        // Opponent wanders with a bias toward the agent.
        let wander = Vec2::new(
            self.rng.gen_range(-1.0..1.0),
            self.rng.gen_range(-1.0..1.0),
        );
        let toward_agent = (self.agent.position - self.opponent.position).normalized();
        self.opponent.velocity = (toward_agent * 0.6 + wander * 0.8).normalized() * 1.5;
        self.opponent.position = self.opponent.position + self.opponent.velocity * dt;

        for target in &mut self.targets {
            let drift = Vec2::new(
                self.rng.gen_range(-0.5..0.5),
                self.rng.gen_range(-0.5..0.5),
            );
            target.position = target.position + drift * dt;
        }

        // Obstruction volumes flicker on/off.
        if self.rng.gen_bool(0.02) {
            self.obstructed = !self.obstructed;
        }

        self.status.attack_cooldown_remaining =
            (self.status.attack_cooldown_remaining - dt).max(0.0);
        self.opponent_cooldown = (self.opponent_cooldown - dt).max(0.0);

        let mut events = StepEvents::default();
        let distance = Vec2::distance(self.agent.position, self.opponent.position);
        if distance <= self.attack_range
            && self.opponent_cooldown <= 0.0
            && self.opponent_vitals.health > 0.0
        {
            self.opponent_cooldown = self.opponent_reload;
            self.agent_vitals.health -= self.opponent_damage;
            events.damage_taken = Some(self.opponent_damage);
            if self.agent_vitals.health <= 0.0 {
                self.agent_vitals.health = 0.0;
                events.agent_died = true;
            }
        }

        events
    }

    /// Resolve an attack request from the controller; returns the damage
    /// landed, or `None` when out of range or still reloading.
    pub fn try_agent_attack(&mut self) -> Option<f32> {
        let distance = Vec2::distance(self.agent.position, self.opponent.position);
        if distance > self.attack_range || self.status.attack_cooldown_remaining > 0.0 {
            return None;
        }
        self.status.attack_cooldown_remaining = self.attack_reload;
        self.opponent_vitals.health = (self.opponent_vitals.health - self.agent_damage).max(0.0);
        Some(self.agent_damage)
    }

    pub fn opponent_defeated(&self) -> bool {
        self.opponent_vitals.health <= 0.0
    }

    /// Respawn a fresh opponent at a random arena edge.
    pub fn respawn_opponent(&mut self) {
        let x = self.rng.gen_range(-self.arena_half_extent..self.arena_half_extent);
        let y = self.rng.gen_range(-self.arena_half_extent..self.arena_half_extent);
        self.opponent.position = Vec2::new(x, y);
        self.opponent_vitals = Vitals {
            health: 150.0,
            max_health: 150.0,
        };
        self.opponent_cooldown = 0.0;
    }

    fn clamp_to_arena(&mut self) {
        let half = self.arena_half_extent;
        self.agent.position.x = self.agent.position.x.clamp(-half, half);
        self.agent.position.y = self.agent.position.y.clamp(-half, half);
    }
}

impl WorldQuery for SimWorld {
    fn agent_pose(&self) -> Pose {
        self.agent
    }

    fn agent_vitals(&self) -> Vitals {
        self.agent_vitals
    }

    fn agent_status(&self) -> AgentStatus {
        self.status
    }

    fn opponent_pose(&self) -> Option<Pose> {
        Some(self.opponent)
    }

    fn opponent_vitals(&self) -> Option<Vitals> {
        Some(self.opponent_vitals)
    }

    fn is_obstructed(&self) -> bool {
        self.obstructed
    }

    fn query_nearby(
        &self,
        origin: Vec2,
        radius: f32,
        mask: CategoryMask,
        max_count: usize,
        out: &mut Vec<TargetInfo>,
    ) {
        for target in &self.targets {
            if out.len() >= max_count {
                break;
            }
            if target.category & mask == 0 {
                continue;
            }
            let distance = Vec2::distance(origin, target.position);
            if distance > radius {
                continue;
            }
            out.push(TargetInfo {
                position: target.position,
                distance,
                tag: target.tag.into(),
            });
        }
    }

    fn apply_velocity(&mut self, velocity: Vec2) {
        self.agent.velocity = velocity;
    }

    fn set_alternate_mode(&mut self, alternate: bool) {
        self.status.alternate_mode = alternate;
    }
}
