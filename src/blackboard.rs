use std::collections::HashMap;

use crate::{error::Result, AgentId, Key, SymbolTable, SymbolValue, Value};

/// Scoped symbol storage shared by the nodes of a tree.
///
/// Each agent gets its own local table, created on first write, and every
/// agent sees the same global table. A node does not address a scope by
/// agent id directly; it reads through the tick [`crate::Context`], which
/// knows which agent is being ticked.
#[derive(Debug, Clone, Default)]
pub struct Blackboard {
    local: HashMap<AgentId, SymbolTable>,
    global: SymbolTable,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_local(
        &mut self,
        owner: AgentId,
        key: impl Into<Key>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        self.local.entry(owner).or_default().set(key, value)
    }

    pub fn get_local<T: SymbolValue>(&self, owner: AgentId, key: impl Into<Key>) -> Result<T> {
        let key = key.into();
        match self.local.get(&owner) {
            Some(table) => table.get_as(key),
            None => Err(crate::BehaviorError::MissingSymbol { key }),
        }
    }

    pub fn local_value(&self, owner: AgentId, key: impl Into<Key>) -> Option<&Value> {
        self.local.get(&owner)?.get(key)
    }

    pub fn remove_local(&mut self, owner: AgentId, key: impl Into<Key>) -> Option<Value> {
        self.local.get_mut(&owner)?.remove(key)
    }

    pub fn local(&self, owner: AgentId) -> Option<&SymbolTable> {
        self.local.get(&owner)
    }

    /// The local table of `owner`, created empty if the agent has none yet.
    pub fn local_mut(&mut self, owner: AgentId) -> &mut SymbolTable {
        self.local.entry(owner).or_default()
    }

    /// Drops every local symbol of an agent, e.g. when the agent is despawned.
    pub fn remove_agent(&mut self, owner: AgentId) -> Option<SymbolTable> {
        self.local.remove(&owner)
    }

    pub fn set_global(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        self.global.set(key, value)
    }

    pub fn get_global<T: SymbolValue>(&self, key: impl Into<Key>) -> Result<T> {
        self.global.get_as(key)
    }

    pub fn global_value(&self, key: impl Into<Key>) -> Option<&Value> {
        self.global.get(key)
    }

    pub fn remove_global(&mut self, key: impl Into<Key>) -> Option<Value> {
        self.global.remove(key)
    }

    pub fn global(&self) -> &SymbolTable {
        &self.global
    }

    pub fn global_mut(&mut self) -> &mut SymbolTable {
        &mut self.global
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_local_scopes_are_per_agent() {
        let mut bb = Blackboard::new();
        bb.set_local(AgentId(1), "target", 5);
        bb.set_local(AgentId(2), "target", 9);
        assert_eq!(bb.get_local::<i64>(AgentId(1), "target"), Ok(5));
        assert_eq!(bb.get_local::<i64>(AgentId(2), "target"), Ok(9));
        assert_eq!(
            bb.get_local::<i64>(AgentId(3), "target").unwrap_err().kind(),
            ErrorKind::MissingSymbol
        );
    }

    #[test]
    fn test_global_is_shared() {
        let mut bb = Blackboard::new();
        bb.set_global("alarm", true);
        assert_eq!(bb.get_global::<bool>("alarm"), Ok(true));
        assert!(bb.local(AgentId(1)).is_none());
        assert_eq!(bb.remove_global("alarm"), Some(Value::Bool(true)));
        assert!(bb.global().is_empty());
    }

    #[test]
    fn test_remove_agent() {
        let mut bb = Blackboard::new();
        bb.local_mut(AgentId(4)).set("hp", 3);
        assert_eq!(bb.remove_agent(AgentId(4)).map(|t| t.len()), Some(1));
        assert_eq!(bb.local_value(AgentId(4), "hp"), None);
    }
}
