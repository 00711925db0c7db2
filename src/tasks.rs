use rand::{rngs::SmallRng, Rng, SeedableRng};
use tracing::trace;

use crate::{
    error::Result, BehaviorStatus, Context, Service, SymbolRef, Task, Value, Vector3,
};

/// Moves the agent toward a position stored on the blackboard.
///
/// Without an acceptance radius the task issues a single movement request and
/// succeeds right away, leaving arrival to the host. With one, it keeps
/// steering until the host reports the agent within the radius.
#[derive(Debug, Clone)]
pub struct MoveTo {
    target: SymbolRef,
    acceptance_radius: Option<f32>,
}

impl MoveTo {
    pub fn new(target: impl Into<SymbolRef>) -> Self {
        Self {
            target: target.into(),
            acceptance_radius: None,
        }
    }

    pub fn with_acceptance_radius(mut self, radius: f32) -> Self {
        self.acceptance_radius = Some(radius);
        self
    }
}

impl Task for MoveTo {
    fn on_update(&mut self, ctx: &mut Context) -> Result<BehaviorStatus> {
        let target: Vector3 = ctx.get(self.target)?;
        let Some(radius) = self.acceptance_radius else {
            ctx.host.move_towards(ctx.agent, target, ctx.delta_time);
            return Ok(BehaviorStatus::Success);
        };
        if ctx.position()?.distance(target) <= radius {
            return Ok(BehaviorStatus::Success);
        }
        ctx.host.move_towards(ctx.agent, target, ctx.delta_time);
        Ok(BehaviorStatus::Running)
    }
}

/// Stays running for `duration` seconds of accumulated delta time.
#[derive(Debug, Clone)]
pub struct Wait {
    duration: f32,
    elapsed: f32,
}

impl Wait {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            elapsed: 0.,
        }
    }
}

impl Task for Wait {
    fn on_start(&mut self, _ctx: &mut Context) -> Result<()> {
        self.elapsed = 0.;
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut Context) -> Result<BehaviorStatus> {
        self.elapsed += ctx.delta_time;
        Ok(if self.elapsed >= self.duration {
            BehaviorStatus::Success
        } else {
            BehaviorStatus::Running
        })
    }

    fn on_reset(&mut self) {
        self.elapsed = 0.;
    }
}

/// Writes a fixed value to a blackboard symbol and succeeds.
#[derive(Debug, Clone)]
pub struct SetSymbol {
    output: SymbolRef,
    value: Value,
}

impl SetSymbol {
    pub fn new(output: impl Into<SymbolRef>, value: impl Into<Value>) -> Self {
        Self {
            output: output.into(),
            value: value.into(),
        }
    }
}

impl Task for SetSymbol {
    fn on_update(&mut self, ctx: &mut Context) -> Result<BehaviorStatus> {
        ctx.set(self.output, self.value.clone());
        Ok(BehaviorStatus::Success)
    }
}

/// Writes a random point on the ground plane around `center` every tick.
pub struct RandomPosition {
    output: SymbolRef,
    center: Vector3,
    radius: f32,
    rng: SmallRng,
}

impl RandomPosition {
    pub fn new(output: impl Into<SymbolRef>, center: Vector3, radius: f32) -> Self {
        Self {
            output: output.into(),
            center,
            radius,
            rng: SmallRng::from_entropy(),
        }
    }

    /// Deterministic stream of positions, for replays and tests.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }
}

impl Service for RandomPosition {
    fn tick(&mut self, ctx: &mut Context) {
        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let distance = self.radius * self.rng.gen::<f32>().sqrt();
        let position = Vector3::new(
            self.center.x + distance * angle.cos(),
            self.center.y,
            self.center.z + distance * angle.sin(),
        );
        trace!(agent = %ctx.agent, key = %self.output.key, ?position, "random position");
        ctx.set(self.output, position);
    }
}

#[cfg(test)]
mod test;
