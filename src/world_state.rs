use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

use crate::{Key, Symbol, SymbolTable, Value};

/// A symbol table interpreted as a set of facts about the world.
///
/// The same type describes an agent's believed state, the state a goal
/// wants, and the preconditions and effects of a planner action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldState {
    table: SymbolTable,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: SymbolTable) -> Self {
        Self { table }
    }

    pub fn into_table(self) -> SymbolTable {
        self.table
    }

    /// Builder style [`WorldState::apply`].
    pub fn with(mut self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.table.set(key, value);
        self
    }

    /// True iff every symbol of `other` is present here with an equal value.
    ///
    /// Symbols only present in `self` are ignored, so the relation is not symmetric.
    pub fn satisfies(&self, other: &WorldState) -> bool {
        other
            .table
            .iter()
            .all(|s| self.table.get(s.key()) == Some(&s.value))
    }

    /// Number of symbols of `goal` this state does not satisfy.
    pub fn unsatisfied_count(&self, goal: &WorldState) -> usize {
        goal.table
            .iter()
            .filter(|s| self.table.get(s.key()) != Some(&s.value))
            .count()
    }

    /// Overwrites or inserts a single symbol.
    pub fn apply(&mut self, symbol: Symbol) -> Option<Value> {
        self.table.insert(symbol)
    }

    /// Applies every symbol of `other` onto this state.
    pub fn merge(&mut self, other: &WorldState) {
        for symbol in other.table.iter() {
            self.table.set(symbol.key(), symbol.value.clone());
        }
    }
}

impl Deref for WorldState {
    type Target = SymbolTable;

    fn deref(&self) -> &SymbolTable {
        &self.table
    }
}

impl DerefMut for WorldState {
    fn deref_mut(&mut self) -> &mut SymbolTable {
        &mut self.table
    }
}

impl From<SymbolTable> for WorldState {
    fn from(table: SymbolTable) -> Self {
        Self { table }
    }
}

impl<K: Into<Key>, V: Into<Value>> FromIterator<(K, V)> for WorldState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            table: iter.into_iter().collect(),
        }
    }
}

/// Builds a [`WorldState`] from `key => value` pairs.
///
/// ```
/// # use behavior_tree_planner::*;
/// let state = world_state!("at" => "room1", "armed" => true);
/// assert_eq!(state.len(), 2);
/// ```
#[macro_export]
macro_rules! world_state {
    () => {
        $crate::WorldState::new()
    };
    ($($name: expr => $val: expr),+ $(,)?) => {{
        let mut ret = $crate::WorldState::new();
        $(ret.apply($crate::Symbol::new($name, $val));)+
        ret
    }};
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_satisfies_is_subset_equality() {
        let big = world_state!("at" => "room1", "armed" => true);
        let small = world_state!("at" => "room1");
        assert!(big.satisfies(&small));
        assert!(!small.satisfies(&big));
        assert!(big.satisfies(&big));
        assert!(big.satisfies(&WorldState::new()));
        assert!(!big.satisfies(&world_state!("at" => "room2")));
    }

    #[test]
    fn test_float_facts_satisfy_themselves() {
        let state = world_state!("speed" => f32::NAN, "heading" => -0f32);
        assert!(state.satisfies(&state));
        assert!(state.satisfies(&world_state!("heading" => 0f32)));
        assert_eq!(state.unsatisfied_count(&state), 0);
        assert!(!state.satisfies(&world_state!("speed" => 1f32)));
    }

    #[test]
    fn test_merge_overwrites_and_inserts() {
        let mut state = world_state!("at" => "room1", "hp" => 3);
        state.merge(&world_state!("at" => "room2", "armed" => false));
        assert_eq!(state.get("at"), Some(&Value::from("room2")));
        assert_eq!(state.get("hp"), Some(&Value::Int(3)));
        assert_eq!(state.get("armed"), Some(&Value::Bool(false)));
        assert_eq!(state.len(), 3);
    }

    #[test]
    fn test_unsatisfied_count() {
        let state = world_state!("a" => 1, "b" => 2);
        let goal = world_state!("a" => 1, "b" => 3, "c" => 4);
        assert_eq!(state.unsatisfied_count(&goal), 2);
    }
}
