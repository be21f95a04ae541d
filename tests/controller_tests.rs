//! Agent controller integration tests: steering blend, mode dispatch,
//! observation recording/suppression and episode lifecycle.

mod testkit;

use gloam::config::AgentConfig;
use gloam::controller::AgentController;
use gloam::telemetry::NoopSink;
use gloam::types::{Action, ActionKind, Vec2};
use gloam::world::Pose;

use testkit::{MockWorld, RecordingPolicy};

const DT: f32 = 0.05;

fn controller_with_action(
    world: MockWorld,
    action: Action,
) -> (
    AgentController<MockWorld, NoopSink>,
    std::rc::Rc<std::cell::RefCell<testkit::PolicyTrace>>,
) {
    let (policy, trace) = RecordingPolicy::new(action);
    let controller = AgentController::new(AgentConfig::default(), world, NoopSink)
        .with_policy(Box::new(policy));
    (controller, trace)
}

#[test]
fn steering_blends_policy_and_fallback() {
    // Opponent due east; policy wants due north; steer weight 0.5.
    let world = MockWorld::default();
    let action = Action {
        kind: ActionKind::Strafe,
        move_direction: Vec2::new(0.0, 1.0),
        ..Action::default()
    };
    let (mut controller, _trace) = controller_with_action(world, action);
    controller.activate(0.0);
    controller.tick(0.0, DT);

    let dir = controller.desired_direction();
    assert!((dir.length() - 1.0).abs() < 1e-5, "blend is re-normalized");
    assert!(dir.x > 0.0 && dir.y > 0.0, "between east and north");
    assert!((dir.x - dir.y).abs() < 1e-5, "equal weights at 0.5");
}

#[test]
fn degenerate_policy_direction_uses_fallback() {
    let world = MockWorld::default();
    let (mut controller, _trace) = controller_with_action(world, Action::idle());
    controller.activate(0.0);
    controller.tick(0.0, DT);

    let dir = controller.desired_direction();
    // Opponent is due east of the agent.
    assert!((dir.x - 1.0).abs() < 1e-5);
    assert!(dir.y.abs() < 1e-5);
}

#[test]
fn coincident_opponent_uses_policy_direction() {
    let mut world = MockWorld::default();
    world.opponent = Some(Pose {
        position: world.agent.position,
        velocity: Vec2::ZERO,
    });
    let action = Action {
        kind: ActionKind::Strafe,
        move_direction: Vec2::new(0.0, -2.0),
        ..Action::default()
    };
    let (mut controller, _trace) = controller_with_action(world, action);
    controller.activate(0.0);
    controller.tick(0.0, DT);

    let dir = controller.desired_direction();
    assert!(dir.x.abs() < 1e-5);
    assert!((dir.y + 1.0).abs() < 1e-5, "policy direction, normalized");
}

#[test]
fn fully_degenerate_steering_defaults_rightward() {
    let mut world = MockWorld::default();
    world.opponent = Some(Pose {
        position: world.agent.position,
        velocity: Vec2::ZERO,
    });
    let (mut controller, _trace) = controller_with_action(world, Action::idle());
    controller.activate(0.0);
    controller.tick(0.0, DT);

    assert_eq!(controller.desired_direction(), Vec2::RIGHT);
}

#[test]
fn velocity_applied_at_current_speed_unless_knocked_back() {
    let world = MockWorld::default();
    let (mut controller, _trace) = controller_with_action(world, Action::idle());
    controller.activate(0.0);
    controller.tick(0.0, DT);

    let applied = controller.world().applied_velocity.expect("velocity set");
    assert!((applied.length() - 2.0).abs() < 1e-5, "current_speed is 2.0");

    // Knockback: controller leaves the body alone.
    controller.world_mut().applied_velocity = None;
    controller.world_mut().status.knocked_back = true;
    controller.tick(0.1, DT);
    assert!(controller.world().applied_velocity.is_none());
}

#[test]
fn mode_request_dispatches_event_and_reward() {
    let world = MockWorld::default();
    let action = Action {
        request_alternate_mode: true,
        ..Action::default()
    };
    let (mut controller, trace) = controller_with_action(world, action);
    controller.activate(0.0);
    controller.tick(0.0, DT);

    assert!(controller.world().status.alternate_mode);
    // Enter reward forwarded once, clamped default 0.1.
    assert_eq!(trace.borrow().rewards, vec![0.1]);

    // Same request next tick: no change, no extra reward.
    controller.tick(0.1, DT);
    assert_eq!(trace.borrow().rewards.len(), 1);
}

#[test]
fn zero_reward_observations_are_suppressed_between_evaluations() {
    let world = MockWorld::default();
    let (mut controller, _trace) = controller_with_action(world, Action::idle());
    controller.activate(0.0);

    // First decision tick records one zero-reward observation.
    let dt = 0.04;
    controller.tick(0.0, dt);
    assert_eq!(controller.memory().len(), 1);

    // No new evaluation yet (interval 0.1): redundant pushes suppressed.
    controller.tick(0.04, dt);
    assert_eq!(controller.memory().len(), 1);

    // Interval elapses, new state published, one more observation.
    controller.tick(0.08, dt);
    assert_eq!(controller.memory().len(), 2);
}

#[test]
fn reward_deltas_log_their_own_entries() {
    let world = MockWorld::default();
    let (mut controller, trace) = controller_with_action(world, Action::idle());
    controller.activate(0.0);
    controller.tick(0.0, DT);
    let before = controller.memory().len();

    controller.notify_damage_dealt(10.0, 0.02);
    assert_eq!(controller.memory().len(), before + 1);
    let entry = controller.last_observation().expect("entry logged");
    assert!((entry.reward - 0.1).abs() < 1e-6);
    let rewards = trace.borrow().rewards.clone();
    assert_eq!(rewards.len(), 1);
    assert!((rewards[0] - 0.1).abs() < 1e-6);
}

#[test]
fn attack_request_is_latched_and_consumed() {
    let world = MockWorld::default();
    let action = Action {
        kind: ActionKind::Chase,
        move_direction: Vec2::new(1.0, 0.0),
        attempt_attack: true,
        ..Action::default()
    };
    let (mut controller, _trace) = controller_with_action(world, action);
    controller.activate(0.0);
    controller.tick(0.0, DT);

    assert!(controller.attack_requested());
    assert!(controller.take_attack_request());
    assert!(!controller.attack_requested());
}

#[test]
fn death_delivers_one_summary() {
    let world = MockWorld::default();
    let (mut controller, trace) = controller_with_action(world, Action::idle());
    controller.activate(0.0);
    controller.tick(0.0, DT);
    controller.notify_damage_taken(20.0, 1.0);

    let summary = controller.notify_death(2.0).expect("first death closes");
    assert!(!summary.survived);
    assert_eq!(summary.duration, 2.0);
    assert_eq!(summary.damage_taken, 20.0);

    // Double finalization is a no-op.
    assert!(controller.notify_death(3.0).is_none());
    assert_eq!(trace.borrow().summaries.len(), 1);
    assert!(controller.episode_closed());

    // Events after closure are ignored entirely.
    controller.notify_damage_dealt(50.0, 3.5);
    assert_eq!(
        trace.borrow().rewards.last().copied(),
        Some(-0.5),
        "death penalty was the final delta"
    );
}

#[test]
fn external_end_closes_survived() {
    let world = MockWorld::default();
    let (mut controller, trace) = controller_with_action(world, Action::idle());
    controller.activate(1.0);
    controller.tick(1.0, DT);

    let summary = controller.end_episode(6.0).expect("closes");
    assert!(summary.survived);
    assert_eq!(summary.duration, 5.0);
    assert_eq!(summary.observations, controller.memory().len());
    assert_eq!(trace.borrow().summaries.len(), 1);

    assert!(controller.end_episode(7.0).is_none());
}

#[test]
fn no_policy_means_fallback_only_and_no_observations() {
    let world = MockWorld::default();
    let mut controller = AgentController::new(AgentConfig::default(), world, NoopSink);
    controller.activate(0.0);
    for i in 0..10 {
        controller.tick(i as f64 * DT as f64, DT);
    }

    // Steers straight at the opponent.
    let dir = controller.desired_direction();
    assert!((dir.x - 1.0).abs() < 1e-5);
    // No learning signal, no observations.
    assert!(controller.memory().is_empty());
    assert_eq!(controller.cumulative_reward(), 0.0);
}

#[test]
fn survival_tick_rewards_flow_through() {
    let mut world = MockWorld::default();
    world.obstructed = true;
    let (mut controller, trace) = controller_with_action(world, Action::idle());
    controller.activate(0.0);

    // Default interval is 2.0 s; step until one survival tick fires.
    let mut now = 0.0;
    for _ in 0..41 {
        controller.tick(now, DT);
        now += DT as f64;
    }

    let rewards = trace.borrow().rewards.clone();
    // Survival tick (0.02), positional bonus at distance 2.0 (0.05),
    // obstruction penalty (-0.05).
    assert!(rewards.contains(&0.02));
    assert!(rewards.contains(&0.05));
    assert!(rewards.contains(&-0.05));
}
