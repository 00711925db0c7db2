use super::*;
use crate::{
    AgentHost, AgentId, Behavior, BehaviorTree, Blackboard, ErrorKind, NullHost, SymbolRef,
    Timers,
};
use std::collections::HashMap;

/// Agents walking in straight lines at a fixed speed.
#[derive(Default)]
struct Walkers {
    positions: HashMap<AgentId, Vector3>,
    speed: f32,
    requests: usize,
}

impl AgentHost for Walkers {
    fn position(&self, agent: AgentId) -> Option<Vector3> {
        self.positions.get(&agent).copied()
    }

    fn move_towards(&mut self, agent: AgentId, target: Vector3, delta_time: f32) {
        self.requests += 1;
        let Some(position) = self.positions.get_mut(&agent) else {
            return;
        };
        let distance = position.distance(target);
        if distance <= f32::EPSILON {
            return;
        }
        let step = (self.speed * delta_time).min(distance) / distance;
        position.x += (target.x - position.x) * step;
        position.y += (target.y - position.y) * step;
        position.z += (target.z - position.z) * step;
    }
}

const AGENT: AgentId = AgentId(7);

fn walkers() -> Walkers {
    Walkers {
        positions: [(AGENT, Vector3::ZERO)].into_iter().collect(),
        speed: 1.,
        requests: 0,
    }
}

#[test]
fn test_move_to_requests_once() {
    let mut host = walkers();
    let mut blackboard = Blackboard::new();
    blackboard.set_local(AGENT, "target", Vector3::new(3., 0., 0.));

    let mut tree = BehaviorTree::new(Behavior::task(MoveTo::new("target")));
    assert_eq!(
        tree.tick(1., AGENT, &mut blackboard, &mut host),
        Ok(BehaviorStatus::Success)
    );
    assert_eq!(host.requests, 1);
    assert!(host.positions[&AGENT].distance(Vector3::new(1., 0., 0.)) < 1e-5);
}

#[test]
fn test_move_to_waits_for_arrival() {
    let mut host = walkers();
    let mut blackboard = Blackboard::new();
    blackboard.set_global("exit", Vector3::new(3., 0., 0.));

    let mut tree = BehaviorTree::new(Behavior::task(
        MoveTo::new(SymbolRef::global("exit")).with_acceptance_radius(0.5),
    ));
    for _ in 0..3 {
        assert_eq!(
            tree.tick(1., AGENT, &mut blackboard, &mut host),
            Ok(BehaviorStatus::Running)
        );
    }
    assert_eq!(
        tree.tick(1., AGENT, &mut blackboard, &mut host),
        Ok(BehaviorStatus::Success)
    );
    assert_eq!(host.requests, 3);
    assert!(host.positions[&AGENT].distance(Vector3::new(3., 0., 0.)) < 1e-5);
}

#[test]
fn test_move_to_fails_on_bad_data() {
    let mut blackboard = Blackboard::new();

    let mut tree = BehaviorTree::new(Behavior::task(MoveTo::new("target")));
    assert_eq!(
        tree.tick(1., AGENT, &mut blackboard, &mut walkers()),
        Ok(BehaviorStatus::Failure)
    );
    assert_eq!(
        tree.root().and_then(Behavior::last_error).map(|e| e.kind()),
        Some(ErrorKind::MissingSymbol)
    );

    blackboard.set_local(AGENT, "target", true);
    tree.restart().unwrap();
    tree.tick(1., AGENT, &mut blackboard, &mut walkers()).unwrap();
    assert_eq!(
        tree.root().and_then(Behavior::last_error).map(|e| e.kind()),
        Some(ErrorKind::TypeMismatch)
    );

    blackboard.set_local(AGENT, "target", Vector3::ZERO);
    let mut tree = BehaviorTree::new(Behavior::task(
        MoveTo::new("target").with_acceptance_radius(1.),
    ));
    assert_eq!(
        tree.tick(1., AGENT, &mut blackboard, &mut NullHost),
        Ok(BehaviorStatus::Failure)
    );
    assert_eq!(
        tree.root().and_then(Behavior::last_error),
        Some(&crate::BehaviorError::UnknownAgent(AGENT))
    );
}

#[test]
fn test_wait() {
    let mut blackboard = Blackboard::new();
    let mut tree = BehaviorTree::new(Behavior::task(Wait::new(1.)));
    for _ in 0..3 {
        assert_eq!(
            tree.tick(0.25, AGENT, &mut blackboard, &mut NullHost),
            Ok(BehaviorStatus::Running)
        );
    }
    assert_eq!(
        tree.tick(0.25, AGENT, &mut blackboard, &mut NullHost),
        Ok(BehaviorStatus::Success)
    );

    // Starts counting from zero again after a restart.
    tree.restart().unwrap();
    assert_eq!(
        tree.tick(0.5, AGENT, &mut blackboard, &mut NullHost),
        Ok(BehaviorStatus::Running)
    );
}

#[test]
fn test_set_symbol() {
    let mut blackboard = Blackboard::new();
    let mut tree = BehaviorTree::new(Behavior::sequence(vec![
        Behavior::task(SetSymbol::new("mood", "angry")),
        Behavior::task(SetSymbol::new(SymbolRef::global("alarm"), true)),
    ]));
    while tree.tick(0.1, AGENT, &mut blackboard, &mut NullHost) == Ok(BehaviorStatus::Running) {}

    assert_eq!(tree.status(), BehaviorStatus::Success);
    assert_eq!(
        blackboard.get_local::<String>(AGENT, "mood"),
        Ok("angry".to_owned())
    );
    assert_eq!(blackboard.get_global::<bool>("alarm"), Ok(true));
    assert!(blackboard.local_value(AGENT, "alarm").is_none());
}

#[test]
fn test_random_position() {
    let center = Vector3::new(10., 2., -5.);
    let mut first = RandomPosition::new("spot", center, 4.).with_seed(42);
    let mut second = RandomPosition::new(SymbolRef::global("spot"), center, 4.).with_seed(42);

    let mut blackboard = Blackboard::new();
    let mut timers = Timers::new();
    let mut host = NullHost;
    let mut ctx = Context::new(AGENT, 0.1, &mut blackboard, &mut timers, &mut host);
    let mut previous = None;
    for _ in 0..20 {
        first.tick(&mut ctx);
        second.tick(&mut ctx);
        let local: Vector3 = ctx.get_local("spot").unwrap();
        let global: Vector3 = ctx.get(SymbolRef::global("spot")).unwrap();
        assert_eq!(local, global);
        assert_eq!(local.y, center.y);
        assert!(local.distance(center) <= 4. + 1e-4);
        assert_ne!(Some(local), previous);
        previous = Some(local);
    }
}
