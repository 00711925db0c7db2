//! A guard wanders around its post until an alarm is raised, then plans its
//! way to the armory.
//!
//! Run with `RUST_LOG=debug cargo run --example patrol` to see the node life cycles.

use ::behavior_tree_planner::{
    boxify, AgentHost, AgentId, Behavior, BehaviorTree, Blackboard, Comparison,
    Domain, Lazy, Loop, MoveTo, Planner, RandomPosition, SetSymbol, SymbolComparison, SymbolRef,
    Vector3, Wait, WorldState,
};
use std::collections::HashMap;

const DOMAIN: &str = r#"
planner:
  max_expansions: 512
actions:
  - name: leave_post
    preconditions: { at: post }
    effects: { at: yard }
  - name: run_to_armory
    cost: 2.0
    preconditions: { at: yard }
    effects: { at: armory }
  - name: grab_sword
    preconditions: { at: armory, armed: false }
    effects: { armed: true }
goals:
  - name: arm_yourself
    desired_state: { armed: true }
"#;

static WANDER_TARGET: Lazy<SymbolRef> = Lazy::new(|| SymbolRef::local("wander_target"));
static ARMORY: Lazy<SymbolRef> = Lazy::new(|| SymbolRef::global("armory"));

#[derive(Default)]
struct World {
    positions: HashMap<AgentId, Vector3>,
}

impl AgentHost for World {
    fn position(&self, agent: AgentId) -> Option<Vector3> {
        self.positions.get(&agent).copied()
    }

    fn move_towards(&mut self, agent: AgentId, target: Vector3, delta_time: f32) {
        let Some(position) = self.positions.get_mut(&agent) else {
            return;
        };
        let distance = position.distance(target);
        if distance > 0. {
            let step = (4. * delta_time).min(distance) / distance;
            position.x += (target.x - position.x) * step;
            position.z += (target.z - position.z) * step;
        }
    }
}

fn wander(post: Vector3) -> Behavior {
    Behavior::decorator(
        SymbolComparison::new(
            SymbolRef::global("alarm"),
            Comparison::IsNotEqualTo,
            SymbolRef::global("raised"),
        ),
        Behavior::decorator(
            Loop::new(3),
            Behavior::sequence(vec![
                // Keeps picking spots while resting; the last one is where it walks to.
                Behavior::task(Wait::new(0.5))
                    .with_service(RandomPosition::new(*WANDER_TARGET, post, 3.).with_seed(7)),
                Behavior::task(MoveTo::new(*WANDER_TARGET).with_acceptance_radius(0.5)),
            ]),
        ),
    )
    .named("wander")
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let guard = AgentId(1);
    let post = Vector3::new(0., 0., 0.);
    let mut world = World::default();
    world.positions.insert(guard, post);

    let mut blackboard = Blackboard::new();
    blackboard.set_global("alarm", "quiet");
    blackboard.set_global("raised", "raised");
    blackboard.set_global("armory", Vector3::new(20., 0., 5.));
    blackboard.set_local(guard, "at", "post");
    blackboard.set_local(guard, "armed", false);

    let mut tree = BehaviorTree::new(wander(post));
    for frame in 0..600 {
        let status = tree.tick(1. / 30., guard, &mut blackboard, &mut world)?;
        if status.is_terminal() {
            println!("wandering ended after {frame} frames: {status:?}");
            break;
        }
    }

    // Someone raises the alarm while the guard rests.
    let mut alarm = BehaviorTree::new(Behavior::task(SetSymbol::new(
        SymbolRef::global("alarm"),
        "raised",
    )));
    alarm.tick(0., AgentId(0), &mut blackboard, &mut world)?;
    tree.abort(guard, &mut blackboard, &mut world)?;
    tree.restart()?;
    let status = tree.tick(1. / 30., guard, &mut blackboard, &mut world)?;
    println!("wandering with the alarm raised: {status:?}");

    let domain = Domain::from_yaml(DOMAIN)?;
    let library = domain.action_library(vec![
        (
            "run_to_armory".to_owned(),
            boxify(|| MoveTo::new(*ARMORY).with_acceptance_radius(1.)),
        ),
        ("grab_sword".to_owned(), boxify(|| Wait::new(1.))),
    ])?;
    let believed = blackboard
        .local(guard)
        .cloned()
        .map(WorldState::from_table)
        .unwrap_or_default();
    let (plan, behavior) = library.plan_behavior(
        &Planner::new(domain.planner),
        &believed,
        domain.goal("arm_yourself")?,
    )?;
    println!(
        "plan: {:?} (cost {})",
        plan.action_names().collect::<Vec<_>>(),
        plan.total_cost
    );

    let mut tree = BehaviorTree::new(behavior).with_config(domain.tree);
    tree.on_ended(|agent, status| {
        println!("{agent} finished its plan: {status:?}");
        true
    });
    for _ in 0..600 {
        if tree.tick(1. / 30., guard, &mut blackboard, &mut world)?.is_terminal() {
            break;
        }
    }
    println!(
        "guard at {:?}, armed: {}",
        world.position(guard),
        blackboard.get_local::<bool>(guard, "armed")?
    );

    Ok(())
}
