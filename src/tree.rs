use tracing::{debug, trace};

use crate::{
    error::{AddChildResult, Result},
    AgentHost, AgentId, Behavior, BehaviorStatus, Blackboard, Context, EndedCallback, Timers,
    TreeConfig,
};

/// Owns a root behavior and the countdowns its nodes use, and advances both
/// once per call to [`BehaviorTree::tick`].
#[derive(Default)]
pub struct BehaviorTree {
    root: Option<Behavior>,
    timers: Timers,
    config: TreeConfig,
    on_ended: Option<EndedCallback>,
}

impl BehaviorTree {
    pub fn new(root: Behavior) -> Self {
        Self {
            root: Some(root),
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: TreeConfig) -> Self {
        self.config = config;
        self
    }

    /// Called with the root's terminal status every time the root ends.
    pub fn on_ended(&mut self, callback: impl FnMut(AgentId, BehaviorStatus) -> bool + 'static) {
        self.on_ended = Some(Box::new(callback));
    }

    pub fn root(&self) -> Option<&Behavior> {
        self.root.as_ref()
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn status(&self) -> BehaviorStatus {
        self.root
            .as_ref()
            .map_or(BehaviorStatus::Suspended, Behavior::status)
    }

    /// Makes `node` the root of an empty tree, or appends it under the root.
    pub fn add_behavior(&mut self, node: Behavior) -> AddChildResult {
        if let Some(root) = self.root.as_mut() {
            return root.add_child(node);
        }
        self.root = Some(node);
        Ok(())
    }

    /// Replaces the root. The previous root must not be running.
    pub fn set_root(&mut self, root: Behavior) -> Result<Option<Behavior>> {
        if self.status() == BehaviorStatus::Running {
            return Err(crate::BehaviorError::invalid(
                "cannot replace a running root; abort it first",
            ));
        }
        Ok(self.root.replace(root))
    }

    /// Removes every node along with the countdowns they registered.
    /// The root must not be running.
    pub fn clear(&mut self) -> Result<()> {
        if self.status() == BehaviorStatus::Running {
            return Err(crate::BehaviorError::invalid(
                "cannot clear a running tree; abort it first",
            ));
        }
        self.root = None;
        self.timers = Timers::new();
        Ok(())
    }

    /// Advances the countdowns by `delta_time`, starts the root if it is
    /// suspended and updates it once.
    pub fn tick(
        &mut self,
        delta_time: f32,
        agent: AgentId,
        blackboard: &mut Blackboard,
        host: &mut dyn AgentHost,
    ) -> Result<BehaviorStatus> {
        self.timers.update(delta_time);
        let Some(root) = self.root.as_mut() else {
            return Ok(BehaviorStatus::Suspended);
        };
        let mut ctx = Context::new(agent, delta_time, blackboard, &mut self.timers, host);

        if root.status().is_terminal() && self.config.restart_on_end {
            debug!(%agent, "restarting tree");
            root.reset()?;
        }
        let runs = root.is_active() || root.status() == BehaviorStatus::Suspended;
        if root.status() == BehaviorStatus::Suspended {
            root.start(&mut ctx, None)?;
        }
        let status = root.update(&mut ctx)?;
        if runs && status.is_terminal() {
            if let Some(callback) = self.on_ended.as_mut() {
                let handled = callback(agent, status);
                trace!(%agent, ?status, handled, "tree end callback");
            }
        }
        Ok(status)
    }

    /// Aborts a running root so it can be reset or replaced.
    pub fn abort(
        &mut self,
        agent: AgentId,
        blackboard: &mut Blackboard,
        host: &mut dyn AgentHost,
    ) -> Result<()> {
        if let Some(root) = self.root.as_mut() {
            let mut ctx = Context::new(agent, 0., blackboard, &mut self.timers, host);
            root.abort(&mut ctx)?;
        }
        Ok(())
    }

    /// Returns the whole tree to `Suspended` so the next tick starts it over.
    pub fn restart(&mut self) -> Result<()> {
        match self.root.as_mut() {
            Some(root) => root.reset(),
            None => Ok(()),
        }
    }
}
