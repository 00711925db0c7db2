use std::collections::HashMap;
use tracing::debug;

use crate::{
    error::Result, Action, Behavior, BehaviorStatus, Context, Goal, GoalScope, Plan, Planner,
    Task, WorldState,
};

pub type Constructor = Box<dyn Fn() -> Box<dyn Task>>;

pub fn boxify<T>(cons: impl (Fn() -> T) + 'static) -> Constructor
where
    T: Task + 'static,
{
    Box::new(move || Box::new(cons()))
}

/// Runs the task registered for a planner action and, once it succeeds,
/// writes the action's effects into the agent's local blackboard.
pub struct ActionTask {
    action: Action,
    inner: Option<Box<dyn Task>>,
}

impl ActionTask {
    pub fn new(action: Action, inner: Option<Box<dyn Task>>) -> Self {
        Self { action, inner }
    }

    pub fn action(&self) -> &Action {
        &self.action
    }
}

impl Task for ActionTask {
    fn on_start(&mut self, ctx: &mut Context) -> Result<()> {
        match self.inner.as_mut() {
            Some(inner) => inner.on_start(ctx),
            None => Ok(()),
        }
    }

    fn on_update(&mut self, ctx: &mut Context) -> Result<BehaviorStatus> {
        match self.inner.as_mut() {
            Some(inner) => inner.on_update(ctx),
            None => Ok(BehaviorStatus::Success),
        }
    }

    fn on_end(&mut self, ctx: &mut Context, status: BehaviorStatus) {
        if let Some(inner) = self.inner.as_mut() {
            inner.on_end(ctx, status);
        }
        if status == BehaviorStatus::Success {
            let local = ctx.blackboard.local_mut(ctx.agent);
            for symbol in self.action.effects.iter() {
                local.set(symbol.key(), symbol.value.clone());
            }
        }
    }

    fn on_reset(&mut self) {
        if let Some(inner) = self.inner.as_mut() {
            inner.on_reset();
        }
    }
}

/// The actions an agent may plan with, and the tasks that carry them out.
///
/// An action registered without a task completes in a single tick; its
/// effects are still applied.
#[derive(Default)]
pub struct ActionLibrary {
    actions: Vec<Action>,
    tasks: HashMap<String, Constructor>,
}

impl ActionLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, action: Action, constructor: Option<Constructor>) {
        if let Some(constructor) = constructor {
            self.tasks.insert(action.name.clone(), constructor);
        }
        match self.actions.iter_mut().find(|a| a.name == action.name) {
            Some(existing) => *existing = action,
            None => self.actions.push(action),
        }
    }

    /// Attaches a task to an action that is already known, e.g. one loaded from a domain file.
    pub fn register_task(&mut self, action_name: impl ToString, constructor: Constructor) {
        self.tasks.insert(action_name.to_string(), constructor);
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn build_task(&self, action_name: &str) -> Option<Box<dyn Task>> {
        self.tasks
            .get(action_name)
            .map(|constructor| constructor())
    }

    /// Instantiates a plan as a sequence of action tasks, wrapped in a
    /// [`GoalScope`] that applies the goal's completion policy.
    pub fn instantiate(&self, goal: &Goal, plan: &Plan) -> Behavior {
        let steps = plan
            .actions
            .iter()
            .map(|action| {
                let task = ActionTask::new(action.clone(), self.build_task(&action.name));
                Behavior::task(task).named(action.name.clone())
            })
            .collect();
        Behavior::decorator(
            GoalScope::for_plan(goal, plan),
            Behavior::sequence(steps).named(format!("{} plan", goal.name)),
        )
        .named(goal.name.clone())
    }

    /// Plans for `goal` from `current` and instantiates the result.
    pub fn plan_behavior(
        &self,
        planner: &Planner,
        current: &WorldState,
        goal: &Goal,
    ) -> Result<(Plan, Behavior)> {
        let plan = planner.plan(current, goal, &self.actions)?;
        debug!(goal = %goal.name, actions = ?plan.action_names().collect::<Vec<_>>(), "instantiating plan");
        let behavior = self.instantiate(goal, &plan);
        Ok((plan, behavior))
    }
}
