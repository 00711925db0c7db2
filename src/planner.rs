use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use tracing::{debug, trace};

use crate::{
    error::Result, value::float_bits, BehaviorError, BehaviorStatus, Context, Decorator, Key,
    PlannerConfig, Value, WorldState,
};

/// Something an agent can do, described by what it needs and what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub preconditions: WorldState,
    #[serde(default)]
    pub effects: WorldState,
    #[serde(default = "default_cost")]
    pub cost: f32,
}

fn default_cost() -> f32 {
    1.
}

impl Action {
    pub fn new(name: impl Into<String>, cost: f32) -> Self {
        Self {
            name: name.into(),
            preconditions: WorldState::new(),
            effects: WorldState::new(),
            cost,
        }
    }

    pub fn with_preconditions(mut self, preconditions: WorldState) -> Self {
        self.preconditions = preconditions;
        self
    }

    pub fn with_effects(mut self, effects: WorldState) -> Self {
        self.effects = effects;
        self
    }

    pub fn is_applicable(&self, state: &WorldState) -> bool {
        state.satisfies(&self.preconditions)
    }

    pub fn apply(&self, state: &WorldState) -> WorldState {
        let mut next = state.clone();
        next.merge(&self.effects);
        next
    }
}

/// What happens to the world state once a goal has been pursued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GoalCompletion {
    /// Keep the state as the plan left it.
    #[default]
    None,
    /// Restore the symbols the plan touched to their values before the goal.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub name: String,
    pub desired_state: WorldState,
    #[serde(default)]
    pub completion: GoalCompletion,
}

impl Goal {
    pub fn new(name: impl Into<String>, desired_state: WorldState) -> Self {
        Self {
            name: name.into(),
            desired_state,
            completion: GoalCompletion::None,
        }
    }

    pub fn with_completion(mut self, completion: GoalCompletion) -> Self {
        self.completion = completion;
        self
    }

    pub fn is_satisfied_by(&self, state: &WorldState) -> bool {
        state.satisfies(&self.desired_state)
    }
}

/// An ordered list of actions whose effects lead to a goal.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub actions: Vec<Action>,
    pub total_cost: f32,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|a| a.name.as_str())
    }

    /// Every key some action of the plan may write.
    pub fn touched_keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = vec![];
        for key in self.actions.iter().flat_map(|a| a.effects.keys()) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

/// Hashable image of a world state: symbols sorted by key, floats by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StateKey(Vec<(Key, ValueBits)>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ValueBits {
    Bool(bool),
    Int(i64),
    Float(u32),
    Str(String),
    Vector([u32; 3]),
    Object(u64),
}

impl StateKey {
    fn new(state: &WorldState) -> Self {
        let mut symbols: Vec<_> = state
            .iter()
            .map(|s| {
                let bits = match &s.value {
                    Value::Bool(v) => ValueBits::Bool(*v),
                    Value::Int(v) => ValueBits::Int(*v),
                    Value::Float(v) => ValueBits::Float(float_bits(*v)),
                    Value::Str(v) => ValueBits::Str(v.clone()),
                    Value::Vector(v) => {
                        ValueBits::Vector([float_bits(v.x), float_bits(v.y), float_bits(v.z)])
                    }
                    Value::Object(v) => ValueBits::Object(v.0),
                };
                (s.key(), bits)
            })
            .collect();
        symbols.sort_by(|a, b| a.0.cmp(&b.0));
        Self(symbols)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f: OrderedFloat<f32>,
    g: OrderedFloat<f32>,
    node: usize,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap pops the cheapest node; ties go to the older node.
        (other.f, other.g, other.node).cmp(&(self.f, self.g, self.node))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct SearchNode {
    state: WorldState,
    key: StateKey,
    g: f32,
    came_from: Option<(usize, usize)>,
}

/// Forward A* search over world states.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Finds the cheapest sequence of `actions` leading from `current` to a
    /// state satisfying the goal.
    pub fn plan(&self, current: &WorldState, goal: &Goal, actions: &[Action]) -> Result<Plan> {
        for action in actions {
            if !action.cost.is_finite() || action.cost < 0. {
                return Err(BehaviorError::invalid(format!(
                    "action {:?} has invalid cost {}",
                    action.name, action.cost
                )));
            }
        }
        let target = &goal.desired_state;

        // Admissible: one action fixes at most `max_fixed` goal symbols, each at `min_cost` or more.
        let max_fixed = actions
            .iter()
            .map(|a| a.effects.iter().filter(|s| target.contains(s.key())).count())
            .max()
            .unwrap_or(0)
            .max(1);
        let min_cost = actions
            .iter()
            .map(|a| a.cost)
            .fold(f32::INFINITY, f32::min);
        let heuristic = |state: &WorldState| -> f32 {
            let missing = state.unsatisfied_count(target);
            if missing == 0 {
                0.
            } else {
                ((missing + max_fixed - 1) / max_fixed) as f32 * min_cost
            }
        };

        let mut nodes = vec![SearchNode {
            state: current.clone(),
            key: StateKey::new(current),
            g: 0.,
            came_from: None,
        }];
        let mut best: HashMap<StateKey, usize> = HashMap::new();
        best.insert(nodes[0].key.clone(), 0);
        let mut open = BinaryHeap::new();
        open.push(OpenNode {
            f: OrderedFloat(heuristic(current)),
            g: OrderedFloat(0.),
            node: 0,
        });

        let mut expansions = 0;
        while let Some(OpenNode { g, node, .. }) = open.pop() {
            if best.get(&nodes[node].key) != Some(&node) {
                continue; // a cheaper path to this state was found later
            }
            if nodes[node].state.satisfies(target) {
                let plan = self.reconstruct(&nodes, node, actions);
                debug!(
                    goal = %goal.name,
                    steps = plan.len(),
                    cost = plan.total_cost,
                    expansions,
                    "plan found"
                );
                return Ok(plan);
            }

            expansions += 1;
            if expansions > self.config.max_expansions {
                debug!(goal = %goal.name, expansions, "planner expansion limit reached");
                break;
            }
            trace!(goal = %goal.name, node, g = g.0, "expand");

            for (action_idx, action) in actions.iter().enumerate() {
                if !action.is_applicable(&nodes[node].state) {
                    continue;
                }
                let next = action.apply(&nodes[node].state);
                if next == nodes[node].state {
                    continue;
                }
                let next_g = nodes[node].g + action.cost;
                let key = StateKey::new(&next);
                if let Some(&existing) = best.get(&key) {
                    if nodes[existing].g <= next_g {
                        continue;
                    }
                }
                let f = next_g + heuristic(&next);
                let next_idx = nodes.len();
                best.insert(key.clone(), next_idx);
                nodes.push(SearchNode {
                    state: next,
                    key,
                    g: next_g,
                    came_from: Some((node, action_idx)),
                });
                open.push(OpenNode {
                    f: OrderedFloat(f),
                    g: OrderedFloat(next_g),
                    node: next_idx,
                });
            }
        }

        debug!(goal = %goal.name, expansions, "no plan found");
        Err(BehaviorError::NoPlanFound {
            goal: goal.name.clone(),
        })
    }

    fn reconstruct(&self, nodes: &[SearchNode], mut node: usize, actions: &[Action]) -> Plan {
        let total_cost = nodes[node].g;
        let mut steps = vec![];
        while let Some((prev, action_idx)) = nodes[node].came_from {
            steps.push(actions[action_idx].clone());
            node = prev;
        }
        steps.reverse();
        Plan {
            actions: steps,
            total_cost,
        }
    }
}

/// Values of a set of keys captured before pursuing a goal.
/// `None` records a key that was absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalSnapshot {
    saved: Vec<(Key, Option<Value>)>,
}

impl GoalSnapshot {
    pub fn capture(state: &crate::SymbolTable, keys: &[Key]) -> Self {
        Self {
            saved: keys.iter().map(|&k| (k, state.get(k).cloned())).collect(),
        }
    }

    pub fn restore(&self, state: &mut crate::SymbolTable) {
        for (key, value) in &self.saved {
            match value {
                Some(value) => {
                    state.set(*key, value.clone());
                }
                None => {
                    state.remove(*key);
                }
            }
        }
    }
}

/// Applies a goal's completion policy around the plan executing below it.
///
/// The keys are captured from the agent's local blackboard when the decorator
/// starts; with [`GoalCompletion::Reset`] they are restored when it ends,
/// whether the plan succeeded, failed or was aborted.
pub struct GoalScope {
    completion: GoalCompletion,
    keys: Vec<Key>,
    snapshot: Option<GoalSnapshot>,
}

impl GoalScope {
    pub fn new(completion: GoalCompletion, keys: Vec<Key>) -> Self {
        Self {
            completion,
            keys,
            snapshot: None,
        }
    }

    pub fn for_plan(goal: &Goal, plan: &Plan) -> Self {
        Self::new(goal.completion, plan.touched_keys())
    }
}

impl Decorator for GoalScope {
    fn on_start(&mut self, ctx: &mut Context) {
        if self.completion == GoalCompletion::Reset {
            let local = ctx.blackboard.local_mut(ctx.agent);
            self.snapshot = Some(GoalSnapshot::capture(local, &self.keys));
        }
    }

    fn on_end(&mut self, ctx: &mut Context, status: BehaviorStatus) {
        if let Some(snapshot) = self.snapshot.take() {
            debug!(agent = %ctx.agent, ?status, "restoring goal state");
            snapshot.restore(ctx.blackboard.local_mut(ctx.agent));
        }
    }

    fn on_reset(&mut self) {
        self.snapshot = None;
    }
}
