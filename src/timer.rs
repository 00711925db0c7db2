use std::sync::atomic::{AtomicU64, Ordering};

/// A countdown that finishes once `duration` seconds have been accumulated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    duration: f32,
    remaining: f32,
}

impl Countdown {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            remaining: duration,
        }
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn remaining(&self) -> f32 {
        self.remaining.max(0.)
    }

    pub fn is_finished(&self) -> bool {
        self.remaining <= 0.
    }

    pub fn advance(&mut self, delta_time: f32) {
        if !self.is_finished() {
            self.remaining -= delta_time;
        }
    }

    /// Restarts the countdown from its full duration.
    pub fn reset(&mut self) {
        self.remaining = self.duration;
    }
}

static NEXT_REGISTRY: AtomicU64 = AtomicU64::new(0);

/// Refers to a countdown in the [`Timers`] that registered it.
///
/// A handle carries the identity of its registry, so it never resolves in
/// another tree's registry even when the indices line up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    registry: u64,
    index: usize,
}

/// Registry of countdowns advanced once per tick.
///
/// [`crate::BehaviorTree::tick`] calls [`Timers::update`] before any node runs,
/// so every node inspecting a countdown during a tick sees the same time.
#[derive(Debug)]
pub struct Timers {
    id: u64,
    countdowns: Vec<Countdown>,
}

impl Default for Timers {
    fn default() -> Self {
        Self::new()
    }
}

impl Timers {
    pub fn new() -> Self {
        Self {
            id: NEXT_REGISTRY.fetch_add(1, Ordering::Relaxed),
            countdowns: vec![],
        }
    }

    pub fn register(&mut self, duration: f32) -> TimerHandle {
        self.countdowns.push(Countdown::new(duration));
        TimerHandle {
            registry: self.id,
            index: self.countdowns.len() - 1,
        }
    }

    /// True if `handle` was registered here.
    pub fn contains(&self, handle: TimerHandle) -> bool {
        handle.registry == self.id && handle.index < self.countdowns.len()
    }

    pub fn update(&mut self, delta_time: f32) {
        for countdown in &mut self.countdowns {
            countdown.advance(delta_time);
        }
    }

    pub fn get(&self, handle: TimerHandle) -> Option<&Countdown> {
        if handle.registry != self.id {
            return None;
        }
        self.countdowns.get(handle.index)
    }

    pub fn get_mut(&mut self, handle: TimerHandle) -> Option<&mut Countdown> {
        if handle.registry != self.id {
            return None;
        }
        self.countdowns.get_mut(handle.index)
    }

    pub fn len(&self) -> usize {
        self.countdowns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countdowns.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_countdown_finishes_after_duration() {
        let mut timers = Timers::new();
        let handle = timers.register(1.);
        timers.update(0.5);
        timers.update(0.25);
        assert!(!timers.get(handle).unwrap().is_finished());
        timers.update(0.25);
        assert!(timers.get(handle).unwrap().is_finished());
        assert_eq!(timers.get(handle).unwrap().remaining(), 0.);

        timers.get_mut(handle).unwrap().reset();
        assert!(!timers.get(handle).unwrap().is_finished());
    }

    #[test]
    fn test_handles_belong_to_their_registry() {
        let mut first = Timers::new();
        let mut second = Timers::new();
        let handle = first.register(1.);
        second.register(100.);

        assert!(first.contains(handle));
        assert!(!second.contains(handle));
        assert!(second.get(handle).is_none());
        assert!(second.get_mut(handle).is_none());
    }

    #[test]
    fn test_zero_duration_is_finished_immediately() {
        assert!(Countdown::new(0.).is_finished());
    }
}
