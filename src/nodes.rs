use tracing::debug;

use crate::{
    error::Result, BehaviorError, BehaviorStatus, ChildEnded, Composite, Context, Decorator,
    DecoratorOutcome, SymbolRef, TimerHandle,
};

/// Runs children in order. Fails as soon as a child fails and succeeds
/// once every child has succeeded, so an empty sequence succeeds immediately.
#[derive(Default, Debug, Clone, Copy)]
pub struct Sequence;

impl Composite for Sequence {
    fn on_child_ended(&mut self, status: BehaviorStatus) -> ChildEnded {
        match status {
            BehaviorStatus::Failure => ChildEnded::End(BehaviorStatus::Failure),
            _ => ChildEnded::Advance,
        }
    }

    fn exhausted_status(&self) -> BehaviorStatus {
        BehaviorStatus::Success
    }
}

/// Runs children in order until one succeeds. An empty selector fails.
#[derive(Default, Debug, Clone, Copy)]
pub struct Selector;

impl Composite for Selector {
    fn on_child_ended(&mut self, status: BehaviorStatus) -> ChildEnded {
        match status {
            BehaviorStatus::Success => ChildEnded::End(BehaviorStatus::Success),
            _ => ChildEnded::Advance,
        }
    }

    fn exhausted_status(&self) -> BehaviorStatus {
        BehaviorStatus::Failure
    }
}

/// Lets the child run at most once per `duration` seconds.
///
/// The countdown is registered on the first check in a tree and restarted
/// every time the gate opens. The gate is checked once per activation of the decorator;
/// a denied activation fails.
#[derive(Debug, Clone)]
pub struct Cooldown {
    duration: f32,
    timer: Option<TimerHandle>,
}

impl Cooldown {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            timer: None,
        }
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }
}

impl Decorator for Cooldown {
    fn can_child_execute(&mut self, ctx: &mut Context) -> Result<bool> {
        // A node moved into another tree starts a fresh window there.
        let handle = match self.timer {
            Some(handle) if ctx.timers.contains(handle) => handle,
            _ => {
                let handle = ctx.timers.register(self.duration);
                self.timer = Some(handle);
                handle
            }
        };
        let countdown = ctx.timers.get_mut(handle).ok_or_else(|| {
            BehaviorError::invalid("cooldown timer is not registered in this tree")
        })?;
        if !countdown.is_finished() {
            return Ok(false);
        }
        countdown.reset();
        Ok(true)
    }
}

/// Runs the child up to `limit` times in a row, stopping at the first failure.
/// A limit of zero succeeds without starting the child.
#[derive(Debug, Clone)]
pub struct Loop {
    limit: Option<usize>,
    count: usize,
}

impl Loop {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            count: 0,
        }
    }

    /// Repeats until the child fails.
    pub fn forever() -> Self {
        Self {
            limit: None,
            count: 0,
        }
    }

    /// Successful runs of the child in the current activation.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Decorator for Loop {
    fn on_start(&mut self, _ctx: &mut Context) {
        self.count = 0;
    }

    fn can_child_execute(&mut self, _ctx: &mut Context) -> Result<bool> {
        Ok(self.limit != Some(0))
    }

    /// Zero repetitions is trivially done.
    fn denied_status(&self) -> BehaviorStatus {
        BehaviorStatus::Success
    }

    fn on_child_ended(&mut self, _ctx: &mut Context, status: BehaviorStatus) -> DecoratorOutcome {
        if status == BehaviorStatus::Failure {
            return DecoratorOutcome::Finish(BehaviorStatus::Failure);
        }
        self.count += 1;
        match self.limit {
            Some(limit) if self.count >= limit => DecoratorOutcome::Finish(BehaviorStatus::Success),
            _ => DecoratorOutcome::Restart,
        }
    }

    fn on_reset(&mut self) {
        self.count = 0;
    }
}

/// Reports a fixed status whatever the child reported.
#[derive(Debug, Clone, Copy)]
pub struct ForceStatus(pub BehaviorStatus);

impl ForceStatus {
    pub fn success() -> Self {
        Self(BehaviorStatus::Success)
    }

    pub fn failure() -> Self {
        Self(BehaviorStatus::Failure)
    }
}

impl Decorator for ForceStatus {
    fn on_child_ended(&mut self, _ctx: &mut Context, _status: BehaviorStatus) -> DecoratorOutcome {
        DecoratorOutcome::Finish(self.0)
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct Inverter;

impl Decorator for Inverter {
    fn on_child_ended(&mut self, _ctx: &mut Context, status: BehaviorStatus) -> DecoratorOutcome {
        DecoratorOutcome::Finish(match status {
            BehaviorStatus::Success => BehaviorStatus::Failure,
            BehaviorStatus::Failure => BehaviorStatus::Success,
            other => other,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    IsEqualTo,
    IsNotEqualTo,
}

/// Lets the child run only if two blackboard symbols compare as configured.
///
/// A missing symbol or a comparison between different kinds of values fails
/// the decorator.
#[derive(Debug, Clone)]
pub struct SymbolComparison {
    pub lhs: SymbolRef,
    pub rhs: SymbolRef,
    pub comparison: Comparison,
}

impl SymbolComparison {
    pub fn new(lhs: impl Into<SymbolRef>, comparison: Comparison, rhs: impl Into<SymbolRef>) -> Self {
        Self {
            lhs: lhs.into(),
            rhs: rhs.into(),
            comparison,
        }
    }
}

impl Decorator for SymbolComparison {
    fn can_child_execute(&mut self, ctx: &mut Context) -> Result<bool> {
        let lhs = ctx.resolve(self.lhs)?;
        let rhs = ctx.resolve(self.rhs)?;
        if lhs.kind() != rhs.kind() {
            return Err(BehaviorError::TypeMismatch {
                key: self.rhs.key,
                expected: lhs.kind(),
                found: rhs.kind(),
            });
        }
        let equal = lhs == rhs;
        debug!(lhs = %self.lhs.key, rhs = %self.rhs.key, equal, "compare symbols");
        Ok(match self.comparison {
            Comparison::IsEqualTo => equal,
            Comparison::IsNotEqualTo => !equal,
        })
    }
}
