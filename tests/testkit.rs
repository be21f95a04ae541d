//! Shared fixtures for integration tests: a fully scriptable world and a
//! policy that records everything the harness feeds it.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use gloam::evaluator::SituationState;
use gloam::memory::WorkingMemory;
use gloam::policy::Policy;
use gloam::reward::EpisodeSummary;
use gloam::types::{Action, CategoryMask, TargetInfo, Vec2};
use gloam::world::{AgentStatus, Pose, Vitals, WorldQuery};

/// World whose every reading is set directly by the test.
#[derive(Debug, Clone)]
pub struct MockWorld {
    pub agent: Pose,
    pub agent_vitals: Vitals,
    pub status: AgentStatus,
    pub opponent: Option<Pose>,
    pub opponent_vitals: Option<Vitals>,
    pub obstructed: bool,
    pub targets: Vec<(Vec2, &'static str, CategoryMask)>,
    pub applied_velocity: Option<Vec2>,
}

impl Default for MockWorld {
    fn default() -> Self {
        Self {
            agent: Pose {
                position: Vec2::ZERO,
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
            opponent: Some(Pose {
                position: Vec2::new(2.0, 0.0),
                velocity: Vec2::ZERO,
            }),
            opponent_vitals: Some(Vitals {
                health: 80.0,
                max_health: 100.0,
            }),
            obstructed: false,
            targets: Vec::new(),
            applied_velocity: None,
        }
    }
}

impl WorldQuery for MockWorld {
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
        self.opponent
    }

    fn opponent_vitals(&self) -> Option<Vitals> {
        self.opponent_vitals
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
        for (position, tag, category) in &self.targets {
            if out.len() >= max_count {
                break;
            }
            if category & mask == 0 {
                continue;
            }
            let distance = Vec2::distance(origin, *position);
            if distance > radius {
                continue;
            }
            out.push(TargetInfo {
                position: *position,
                distance,
                tag: (*tag).into(),
            });
        }
    }

    fn apply_velocity(&mut self, velocity: Vec2) {
        self.agent.velocity = velocity;
        self.applied_velocity = Some(velocity);
    }

    fn set_alternate_mode(&mut self, alternate: bool) {
        self.status.alternate_mode = alternate;
    }
}

/// Everything the harness delivered to the policy.
#[derive(Debug, Default)]
pub struct PolicyTrace {
    pub decide_calls: usize,
    pub rewards: Vec<f32>,
    pub summaries: Vec<EpisodeSummary>,
}

/// Policy returning a scripted action while tracing all feedback.
pub struct RecordingPolicy {
    pub action: Action,
    pub trace: Rc<RefCell<PolicyTrace>>,
}

impl RecordingPolicy {
    /// Returns the policy and a shared handle onto its trace.
    pub fn new(action: Action) -> (Self, Rc<RefCell<PolicyTrace>>) {
        let trace = Rc::new(RefCell::new(PolicyTrace::default()));
        (
            Self {
                action,
                trace: Rc::clone(&trace),
            },
            trace,
        )
    }
}

impl Policy for RecordingPolicy {
    fn decide(&mut self, _state: &SituationState, _memory: &WorkingMemory) -> Action {
        self.trace.borrow_mut().decide_calls += 1;
        self.action
    }

    fn give_reward(&mut self, reward: f32) {
        self.trace.borrow_mut().rewards.push(reward);
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        self.trace.borrow_mut().summaries.push(*summary);
    }
}
