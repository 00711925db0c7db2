use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

use crate::{error::Result, BehaviorError, Blackboard, Key, SymbolValue, Timers, Value, Vector3};

/// Identity of the agent a tree is ticked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub u64);

impl Display for AgentId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// The engine-side view of agents that spatial tasks need.
pub trait AgentHost {
    fn position(&self, agent: AgentId) -> Option<Vector3>;

    /// Requests the agent to move toward `target` for `delta_time` seconds.
    fn move_towards(&mut self, agent: AgentId, target: Vector3, delta_time: f32);
}

/// A host without spatial agents.
pub struct NullHost;

impl AgentHost for NullHost {
    fn position(&self, _agent: AgentId) -> Option<Vector3> {
        None
    }

    fn move_towards(&mut self, _agent: AgentId, _target: Vector3, _delta_time: f32) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    Local,
    Global,
}

/// A reference to a blackboard symbol, resolved against the ticked agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolRef {
    pub scope: Scope,
    pub key: Key,
}

impl SymbolRef {
    pub fn local(key: impl Into<Key>) -> Self {
        Self {
            scope: Scope::Local,
            key: key.into(),
        }
    }

    pub fn global(key: impl Into<Key>) -> Self {
        Self {
            scope: Scope::Global,
            key: key.into(),
        }
    }
}

impl<S: AsRef<str>> From<S> for SymbolRef {
    fn from(s: S) -> Self {
        Self::local(s.as_ref())
    }
}

/// Everything a node may touch during one tick.
///
/// Built by [`crate::BehaviorTree::tick`]; tests can build one directly to
/// drive a single [`crate::Behavior`].
pub struct Context<'a> {
    pub agent: AgentId,
    pub delta_time: f32,
    pub blackboard: &'a mut Blackboard,
    pub timers: &'a mut Timers,
    pub host: &'a mut dyn AgentHost,
}

impl<'a> Context<'a> {
    pub fn new(
        agent: AgentId,
        delta_time: f32,
        blackboard: &'a mut Blackboard,
        timers: &'a mut Timers,
        host: &'a mut dyn AgentHost,
    ) -> Self {
        Self {
            agent,
            delta_time,
            blackboard,
            timers,
            host,
        }
    }

    pub fn resolve(&self, symbol: SymbolRef) -> Result<&Value> {
        let value = match symbol.scope {
            Scope::Local => self.blackboard.local_value(self.agent, symbol.key),
            Scope::Global => self.blackboard.global_value(symbol.key),
        };
        value.ok_or(BehaviorError::MissingSymbol { key: symbol.key })
    }

    pub fn get<T: SymbolValue>(&self, symbol: SymbolRef) -> Result<T> {
        match symbol.scope {
            Scope::Local => self.blackboard.get_local(self.agent, symbol.key),
            Scope::Global => self.blackboard.get_global(symbol.key),
        }
    }

    pub fn set(&mut self, symbol: SymbolRef, value: impl Into<Value>) -> Option<Value> {
        match symbol.scope {
            Scope::Local => self.blackboard.set_local(self.agent, symbol.key, value),
            Scope::Global => self.blackboard.set_global(symbol.key, value),
        }
    }

    pub fn get_local<T: SymbolValue>(&self, key: impl Into<Key>) -> Result<T> {
        self.blackboard.get_local(self.agent, key)
    }

    pub fn set_local(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        self.blackboard.set_local(self.agent, key, value)
    }

    pub fn position(&self) -> Result<Vector3> {
        self.host
            .position(self.agent)
            .ok_or(BehaviorError::UnknownAgent(self.agent))
    }
}
