use tracing::{debug, trace, warn};

use crate::{
    error::{AddChildError, AddChildResult, Result},
    AgentId, BehaviorError, Context, NumChildren,
};

/// Life cycle state of a node.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BehaviorStatus {
    /// Not started, or reset after finishing.
    Suspended,
    /// The node should keep running in the next tick
    Running,
    Success,
    Failure,
}

impl BehaviorStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

/// Called with the agent and the terminal status when a node ends.
/// The return value tells whether the callback handled the event. Nothing
/// chains on it yet; it is only logged at `trace` level.
pub type EndedCallback = Box<dyn FnMut(AgentId, BehaviorStatus) -> bool>;

/// A leaf node doing agent-visible work.
pub trait Task {
    fn on_start(&mut self, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    /// Returning a terminal status ends the task.
    fn on_update(&mut self, ctx: &mut Context) -> Result<BehaviorStatus>;

    fn on_end(&mut self, _ctx: &mut Context, _status: BehaviorStatus) {}

    fn on_reset(&mut self) {}
}

/// What a composite does after one of its children ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildEnded {
    /// Start the next child in order.
    Advance,
    End(BehaviorStatus),
}

/// Combination rule of a node with an ordered list of children.
///
/// The cursor over the children is owned by [`Behavior`]; a composite only
/// decides what a finished child means.
pub trait Composite {
    fn on_child_ended(&mut self, status: BehaviorStatus) -> ChildEnded;

    /// The status to end with when no child is left to start.
    fn exhausted_status(&self) -> BehaviorStatus;

    fn on_reset(&mut self) {}
}

/// What a decorator does after its child ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoratorOutcome {
    Finish(BehaviorStatus),
    /// Reset and start the child again.
    Restart,
}

/// A wrapper around exactly one child.
///
/// Pre-execution decorators override [`Decorator::can_child_execute`], which
/// is consulted once per activation. Post-execution decorators override
/// [`Decorator::on_child_ended`].
pub trait Decorator {
    fn on_start(&mut self, _ctx: &mut Context) {}

    fn can_child_execute(&mut self, _ctx: &mut Context) -> Result<bool> {
        Ok(true)
    }

    /// The status to end with when [`Decorator::can_child_execute`] says no.
    fn denied_status(&self) -> BehaviorStatus {
        BehaviorStatus::Failure
    }

    fn on_child_ended(&mut self, _ctx: &mut Context, status: BehaviorStatus) -> DecoratorOutcome {
        DecoratorOutcome::Finish(status)
    }

    fn on_end(&mut self, _ctx: &mut Context, _status: BehaviorStatus) {}

    fn on_reset(&mut self) {}
}

/// A side effect ticked every update while its owner is active.
///
/// Services run before the owner's own update, so a symbol written by a
/// service is visible to the active child in the same tick.
pub trait Service {
    fn tick(&mut self, ctx: &mut Context);

    fn on_reset(&mut self) {}
}

enum NodeKind {
    Task(Box<dyn Task>),
    Composite {
        composite: Box<dyn Composite>,
        children: Vec<Behavior>,
        cursor: Option<usize>,
    },
    Decorator {
        decorator: Box<dyn Decorator>,
        child: Option<Box<Behavior>>,
    },
}

/// A node of a behavior tree.
///
/// `Behavior` owns the status machine shared by every node kind and delegates
/// the kind specific part to a [`Task`], [`Composite`] or [`Decorator`].
pub struct Behavior {
    name: String,
    kind: NodeKind,
    status: BehaviorStatus,
    active: bool,
    services: Vec<Box<dyn Service>>,
    on_ended: Option<EndedCallback>,
    last_error: Option<BehaviorError>,
}

fn short_type_name<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    let name = name.split('<').next().unwrap_or(name);
    name.rsplit("::").next().unwrap_or(name)
}

impl Behavior {
    fn with_kind(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            status: BehaviorStatus::Suspended,
            active: false,
            services: vec![],
            on_ended: None,
            last_error: None,
        }
    }

    pub fn task<T: Task + 'static>(task: T) -> Self {
        Self::with_kind(short_type_name::<T>(), NodeKind::Task(Box::new(task)))
    }

    pub fn composite<C: Composite + 'static>(composite: C, children: Vec<Behavior>) -> Self {
        Self::with_kind(
            short_type_name::<C>(),
            NodeKind::Composite {
                composite: Box::new(composite),
                children,
                cursor: None,
            },
        )
    }

    pub fn decorator<D: Decorator + 'static>(decorator: D, child: Behavior) -> Self {
        Self::with_kind(
            short_type_name::<D>(),
            NodeKind::Decorator {
                decorator: Box::new(decorator),
                child: Some(Box::new(child)),
            },
        )
    }

    /// A decorator whose child is attached later with [`Behavior::add_child`].
    pub fn empty_decorator<D: Decorator + 'static>(decorator: D) -> Self {
        Self::with_kind(
            short_type_name::<D>(),
            NodeKind::Decorator {
                decorator: Box::new(decorator),
                child: None,
            },
        )
    }

    pub fn sequence(children: Vec<Behavior>) -> Self {
        Self::composite(crate::Sequence, children)
    }

    pub fn selector(children: Vec<Behavior>) -> Self {
        Self::composite(crate::Selector, children)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_service(mut self, service: impl Service + 'static) -> Self {
        self.services.push(Box::new(service));
        self
    }

    pub fn add_service(&mut self, service: impl Service + 'static) {
        self.services.push(Box::new(service));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> BehaviorStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The recoverable error that made this node fail, if any.
    pub fn last_error(&self) -> Option<&BehaviorError> {
        self.last_error.as_ref()
    }

    pub fn max_children(&self) -> NumChildren {
        match &self.kind {
            NodeKind::Task(_) => NumChildren::Finite(0),
            NodeKind::Composite { .. } => NumChildren::Infinite,
            NodeKind::Decorator { .. } => NumChildren::Finite(1),
        }
    }

    pub fn children(&self) -> &[Behavior] {
        match &self.kind {
            NodeKind::Task(_) => &[],
            NodeKind::Composite { children, .. } => children,
            NodeKind::Decorator { child, .. } => match child {
                Some(child) => std::slice::from_ref(&**child),
                None => &[],
            },
        }
    }

    /// Index of the child a composite is currently running.
    pub fn current_child(&self) -> Option<usize> {
        match &self.kind {
            NodeKind::Composite { cursor, .. } => *cursor,
            _ => None,
        }
    }

    pub fn add_child(&mut self, node: Behavior) -> AddChildResult {
        match &mut self.kind {
            NodeKind::Task(_) => Err(AddChildError::TooManyNodes),
            NodeKind::Composite { children, .. } => {
                children.push(node);
                Ok(())
            }
            NodeKind::Decorator { child, .. } => {
                if child.is_some() {
                    return Err(AddChildError::TooManyNodes);
                }
                *child = Some(Box::new(node));
                Ok(())
            }
        }
    }

    /// Starts the node. `on_ended` replaces any previously stored callback.
    pub fn start(&mut self, ctx: &mut Context, on_ended: Option<EndedCallback>) -> Result<()> {
        if self.active {
            return Err(BehaviorError::invalid(format!(
                "{} started while already active",
                self.name
            )));
        }
        self.status = BehaviorStatus::Running;
        self.active = true;
        self.on_ended = on_ended;
        self.last_error = None;
        debug!(node = %self.name, agent = %ctx.agent, "start");

        let Behavior {
            name,
            kind,
            last_error,
            ..
        } = self;
        let ended = match kind {
            NodeKind::Task(task) => match task.on_start(ctx) {
                Ok(()) => None,
                Err(err) => Some(recover(name, ctx.agent, err, last_error)?),
            },
            NodeKind::Composite {
                composite,
                children,
                cursor,
            } => {
                *cursor = None;
                set_next_child(composite.as_mut(), children, cursor, ctx)?
            }
            NodeKind::Decorator { decorator, child } => {
                decorator.on_start(ctx);
                match child {
                    None => Some(BehaviorStatus::Failure),
                    Some(child) => match decorator.can_child_execute(ctx) {
                        Ok(true) => {
                            launch(child, ctx)?;
                            if child.is_active() {
                                None
                            } else {
                                decorator_child_ended(decorator.as_mut(), child, ctx)?
                            }
                        }
                        Ok(false) => {
                            debug!(node = %name, agent = %ctx.agent, "child execution denied");
                            Some(decorator.denied_status())
                        }
                        Err(err) => Some(recover(name, ctx.agent, err, last_error)?),
                    },
                }
            }
        };

        if let Some(status) = ended {
            self.end(ctx, status)?;
        }
        Ok(())
    }

    /// Advances the node by one tick and returns its status afterwards.
    /// Inactive nodes are left untouched.
    pub fn update(&mut self, ctx: &mut Context) -> Result<BehaviorStatus> {
        if !self.active {
            return Ok(self.status);
        }
        for service in &mut self.services {
            service.tick(ctx);
        }

        let Behavior {
            name,
            kind,
            last_error,
            ..
        } = self;
        let ended = match kind {
            NodeKind::Task(task) => match task.on_update(ctx) {
                Ok(status) if status.is_terminal() => Some(status),
                Ok(_) => None,
                Err(err) => Some(recover(name, ctx.agent, err, last_error)?),
            },
            NodeKind::Composite {
                composite,
                children,
                cursor,
            } => match cursor.and_then(|i| children.get_mut(i)) {
                None => Some(composite.exhausted_status()),
                Some(child) => {
                    child.update(ctx)?;
                    if child.is_active() {
                        None
                    } else {
                        match composite.on_child_ended(child.status()) {
                            ChildEnded::Advance => {
                                set_next_child(composite.as_mut(), children, cursor, ctx)?
                            }
                            ChildEnded::End(status) => Some(status),
                        }
                    }
                }
            },
            NodeKind::Decorator { decorator, child } => match child {
                None => Some(BehaviorStatus::Failure),
                Some(child) => {
                    child.update(ctx)?;
                    if child.is_active() {
                        None
                    } else {
                        decorator_child_ended(decorator.as_mut(), child, ctx)?
                    }
                }
            },
        };

        if let Some(status) = ended {
            self.end(ctx, status)?;
        }
        Ok(self.status)
    }

    /// Finishes the node with a terminal `status` and notifies the stored callback.
    pub fn end(&mut self, ctx: &mut Context, status: BehaviorStatus) -> Result<()> {
        if !self.active {
            return Err(BehaviorError::invalid(format!(
                "{} ended while not active",
                self.name
            )));
        }
        if !status.is_terminal() {
            return Err(BehaviorError::invalid(format!(
                "{} ended with non-terminal status {:?}",
                self.name, status
            )));
        }
        self.status = status;
        self.active = false;
        match &mut self.kind {
            NodeKind::Task(task) => task.on_end(ctx, status),
            NodeKind::Decorator { decorator, .. } => decorator.on_end(ctx, status),
            NodeKind::Composite { .. } => (),
        }
        debug!(node = %self.name, agent = %ctx.agent, ?status, "end");
        if let Some(callback) = self.on_ended.as_mut() {
            let handled = callback(ctx.agent, status);
            trace!(node = %self.name, agent = %ctx.agent, handled, "end callback");
        }
        Ok(())
    }

    /// Ends this node and every active descendant with `Failure`, innermost first.
    pub fn abort(&mut self, ctx: &mut Context) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        match &mut self.kind {
            NodeKind::Task(_) => (),
            NodeKind::Composite {
                children, cursor, ..
            } => {
                if let Some(child) = cursor.and_then(|i| children.get_mut(i)) {
                    child.abort(ctx)?;
                }
            }
            NodeKind::Decorator { child, .. } => {
                if let Some(child) = child {
                    child.abort(ctx)?;
                }
            }
        }
        self.end(ctx, BehaviorStatus::Failure)
    }

    /// Returns the node and its whole subtree to `Suspended`.
    pub fn reset(&mut self) -> Result<()> {
        if self.active {
            return Err(BehaviorError::invalid(format!(
                "{} reset while active",
                self.name
            )));
        }
        self.status = BehaviorStatus::Suspended;
        self.last_error = None;
        for service in &mut self.services {
            service.on_reset();
        }
        match &mut self.kind {
            NodeKind::Task(task) => task.on_reset(),
            NodeKind::Composite {
                composite,
                children,
                cursor,
            } => {
                *cursor = None;
                composite.on_reset();
                for child in children {
                    child.reset()?;
                }
            }
            NodeKind::Decorator { decorator, child } => {
                decorator.on_reset();
                if let Some(child) = child {
                    child.reset()?;
                }
            }
        }
        Ok(())
    }
}

/// Converts a data error into `Failure`, keeping it for inspection.
fn recover(
    name: &str,
    agent: AgentId,
    err: BehaviorError,
    last_error: &mut Option<BehaviorError>,
) -> Result<BehaviorStatus> {
    if !err.is_recoverable() {
        return Err(err);
    }
    warn!(node = %name, %agent, error = %err, "node failed");
    *last_error = Some(err);
    Ok(BehaviorStatus::Failure)
}

/// Starts a child, resetting it first if it finished in an earlier run.
fn launch(child: &mut Behavior, ctx: &mut Context) -> Result<()> {
    if child.status() != BehaviorStatus::Suspended {
        child.reset()?;
    }
    child.start(ctx, None)
}

/// Moves the cursor forward and starts the next child. Children that end
/// while starting are handed to the composite right away. Returns the status
/// the composite ends with, if it ends.
fn set_next_child(
    composite: &mut dyn Composite,
    children: &mut [Behavior],
    cursor: &mut Option<usize>,
    ctx: &mut Context,
) -> Result<Option<BehaviorStatus>> {
    loop {
        let next = cursor.map_or(0, |i| i + 1);
        let Some(child) = children.get_mut(next) else {
            return Ok(Some(composite.exhausted_status()));
        };
        *cursor = Some(next);
        launch(child, ctx)?;
        if child.is_active() {
            return Ok(None);
        }
        match composite.on_child_ended(child.status()) {
            ChildEnded::Advance => continue,
            ChildEnded::End(status) => return Ok(Some(status)),
        }
    }
}

/// A restarted child that ends while starting is handled on the next update,
/// so a repeating decorator cannot spin within one tick.
fn decorator_child_ended(
    decorator: &mut dyn Decorator,
    child: &mut Behavior,
    ctx: &mut Context,
) -> Result<Option<BehaviorStatus>> {
    match decorator.on_child_ended(ctx, child.status()) {
        DecoratorOutcome::Finish(status) => Ok(Some(status)),
        DecoratorOutcome::Restart => {
            launch(child, ctx)?;
            Ok(None)
        }
    }
}
