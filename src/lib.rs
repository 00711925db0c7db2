//! # behavior-tree-planner (Rust crate)
//!
//! A resumable behavior tree engine with per-agent blackboards and a
//! world-state planner.
//!
//!
//! ## Overview
//!
//! A behavior tree is ticked once per frame by the host. Every node goes
//! through the same life cycle:
//!
//! ```raw
//! Suspended -> Running -> Success | Failure -> (reset) -> Suspended
//! ```
//!
//! A node never blocks. Work that takes longer than a frame reports `Running`
//! and is updated again on the next tick. When a child ends, its parent learns
//! about it in the same call stack, so a sequence can start its next child in
//! the very tick the previous one finished.
//!
//! There are three kinds of nodes:
//!
//! * [`Task`]s are leaves that do agent-visible work, like [`MoveTo`] or [`Wait`].
//! * [`Composite`]s combine an ordered list of children, like [`Sequence`] and [`Selector`].
//! * [`Decorator`]s wrap a single child. Some decide whether the child may run
//!   at all ([`Cooldown`], [`SymbolComparison`]), others reinterpret how it
//!   ended ([`Loop`], [`ForceStatus`], [`Inverter`]).
//!
//! Any node can carry [`Service`]s, side effects ticked before the node's own
//! update for as long as the node is active.
//!
//!
//! ## How it looks like
//!
//! Facts live on a [`Blackboard`], local to each agent or global to all of them.
//!
//! ```rust
//! # use behavior_tree_planner::*;
//! let agent = AgentId(1);
//! let mut blackboard = Blackboard::new();
//! blackboard.set_local(agent, "target", Vector3::new(4., 0., 2.));
//! blackboard.set_global("alarm", false);
//! ```
//!
//! Then you build a tree out of nodes.
//!
//! ```rust
//! # use behavior_tree_planner::*;
//! let root = Behavior::sequence(vec![
//!     Behavior::decorator(
//!         SymbolComparison::new("mood", Comparison::IsEqualTo, SymbolRef::global("calm")),
//!         Behavior::task(MoveTo::new("target")),
//!     ),
//!     Behavior::task(Wait::new(2.)),
//! ])
//! .with_service(RandomPosition::new("target", Vector3::ZERO, 10.));
//! let mut tree = BehaviorTree::new(root);
//! ```
//!
//! and call `tick()` every frame with the elapsed time.
//!
//! ```rust
//! # use behavior_tree_planner::*;
//! # let mut tree = BehaviorTree::new(Behavior::task(Wait::new(1.)));
//! # let mut blackboard = Blackboard::new();
//! let status = tree.tick(1. / 60., AgentId(1), &mut blackboard, &mut NullHost)?;
//! # Ok::<(), BehaviorError>(())
//! ```
//!
//! The last argument is the [`AgentHost`], the engine-side view of agents.
//! Tasks that need to know where an agent is, or want to move it, go through it.
//! [`NullHost`] is enough for trees without spatial tasks.
//!
//!
//! ## How to define your own node
//!
//! Implement [`Task`] for your type. `on_update` is called every tick while the
//! task is running and returns the new status.
//!
//! ```rust
//! # use behavior_tree_planner::*;
//! struct Shout;
//!
//! impl Task for Shout {
//!     fn on_update(&mut self, ctx: &mut Context) -> Result<BehaviorStatus> {
//!         let name: String = ctx.get_local("name")?;
//!         println!("{name}!");
//!         Ok(BehaviorStatus::Success)
//!     }
//! }
//! ```
//!
//! Returning an error like [`BehaviorError::MissingSymbol`] or
//! [`BehaviorError::TypeMismatch`] makes the node fail, so the parent can
//! react to it. The error is logged and kept in [`Behavior::last_error`].
//! Misusing the tree itself, e.g. starting a node that is already running, is
//! an [`ErrorKind::InvalidOperation`] and is returned from `tick` instead.
//!
//! ### Caching keys
//!
//! Blackboard keys are interned, so comparing two [`Key`]s is a pointer
//! comparison. If you use a key a lot, cache it in a `Lazy` static.
//!
//! ```rust
//! use ::behavior_tree_planner::{Key, Lazy};
//! static TARGET: Lazy<Key> = Lazy::new(|| "target".into());
//! assert_eq!(*TARGET, Key::from("target"));
//! ```
//!
//!
//! ## Planning
//!
//! A [`WorldState`] is a set of facts. An [`Action`] needs some facts
//! (preconditions) and changes others (effects), and a [`Goal`] describes the
//! facts an agent wants. The [`Planner`] searches for the cheapest list of
//! actions that turns the current state into one that satisfies the goal.
//!
//! ```rust
//! # use behavior_tree_planner::*;
//! let actions = vec![
//!     Action::new("walk_to_hall", 1.)
//!         .with_preconditions(world_state!("at" => "room1"))
//!         .with_effects(world_state!("at" => "room2")),
//!     Action::new("walk_to_kitchen", 1.)
//!         .with_preconditions(world_state!("at" => "room2"))
//!         .with_effects(world_state!("at" => "room3")),
//! ];
//! let goal = Goal::new("eat", world_state!("at" => "room3"));
//! let plan = Planner::default().plan(&world_state!("at" => "room1"), &goal, &actions)?;
//! assert_eq!(plan.action_names().collect::<Vec<_>>(), ["walk_to_hall", "walk_to_kitchen"]);
//! # Ok::<(), BehaviorError>(())
//! ```
//!
//! An [`ActionLibrary`] knows which [`Task`] carries out each action and turns a
//! plan into a regular [`Behavior`]: a [`Sequence`] of action tasks that write
//! their effects to the agent's local blackboard as they succeed. The sequence
//! is wrapped in a [`GoalScope`], which restores the touched facts afterwards if
//! the goal asks for [`GoalCompletion::Reset`].
//!
//! Actions and goals can be loaded from YAML, see [`Domain`].
//!
//!
//! ## Logging
//!
//! The crate logs through `tracing`: node starts and ends at `debug`, planner
//! expansions at `trace` and nodes failing on missing data at `warn`. Install
//! any subscriber to see them.

mod behavior;
mod blackboard;
mod config;
mod context;
pub mod error;
mod key;
mod nodes;
mod planner;
mod registry;
mod symbol;
mod tasks;
mod timer;
mod tree;
mod value;
mod world_state;

pub use crate::behavior::{
    Behavior, BehaviorStatus, ChildEnded, Composite, Decorator, DecoratorOutcome, EndedCallback,
    Service, Task,
};
pub use crate::blackboard::Blackboard;
pub use crate::config::{Domain, PlannerConfig, TreeConfig};
pub use crate::context::{AgentHost, AgentId, Context, NullHost, Scope, SymbolRef};
pub use crate::error::{BehaviorError, ErrorKind, Result};
pub use crate::key::Key;
pub use crate::nodes::{
    Comparison, Cooldown, ForceStatus, Inverter, Loop, Selector, Sequence, SymbolComparison,
};
pub use crate::planner::{Action, Goal, GoalCompletion, GoalScope, GoalSnapshot, Plan, Planner};
pub use crate::registry::{boxify, ActionLibrary, ActionTask, Constructor};
pub use crate::symbol::{Symbol, SymbolTable};
pub use crate::tasks::{MoveTo, RandomPosition, SetSymbol, Wait};
pub use crate::timer::{Countdown, TimerHandle, Timers};
pub use crate::tree::BehaviorTree;
pub use crate::value::{ObjectRef, SymbolValue, Value, ValueKind, Vector3};
pub use crate::world_state::WorldState;
pub use ::once_cell::sync::Lazy;

/// How many children a node accepts.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum NumChildren {
    Finite(usize),
    Infinite,
}

impl PartialOrd for NumChildren {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(match (self, other) {
            (NumChildren::Finite(_), NumChildren::Infinite) => std::cmp::Ordering::Less,
            (NumChildren::Infinite, NumChildren::Finite(_)) => std::cmp::Ordering::Greater,
            (NumChildren::Finite(lhs), NumChildren::Finite(rhs)) => lhs.cmp(rhs),
            (NumChildren::Infinite, NumChildren::Infinite) => return None,
        })
    }
}
