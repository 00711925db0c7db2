use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::{error::Result, BehaviorError, Key, SymbolValue, Value};

/// A single typed fact. The key is fixed once created; the value may change in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    key: Key,
    pub value: Value,
}

impl Symbol {
    pub fn new(key: impl Into<Key>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> Key {
        self.key
    }
}

/// An ordered collection of symbols with unique keys.
///
/// Insertion order is kept so that iteration is deterministic. Cloning a table
/// clones every symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, key: impl Into<Key>) -> bool {
        self.position(key.into()).is_some()
    }

    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        let key = key.into();
        self.position(key).map(|i| &self.symbols[i].value)
    }

    pub fn get_mut(&mut self, key: impl Into<Key>) -> Option<&mut Value> {
        let key = key.into();
        self.position(key).map(move |i| &mut self.symbols[i].value)
    }

    /// Reads a symbol as a concrete type.
    pub fn get_as<T: SymbolValue>(&self, key: impl Into<Key>) -> Result<T> {
        let key = key.into();
        let value = self
            .get(key)
            .ok_or(BehaviorError::MissingSymbol { key })?;
        T::from_value(value).ok_or(BehaviorError::TypeMismatch {
            key,
            expected: T::KIND,
            found: value.kind(),
        })
    }

    /// Overwrites the value of an existing symbol or appends a new one.
    /// Returns the previous value, if any.
    pub fn set(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.position(key) {
            Some(i) => Some(std::mem::replace(&mut self.symbols[i].value, value)),
            None => {
                self.symbols.push(Symbol { key, value });
                None
            }
        }
    }

    pub fn insert(&mut self, symbol: Symbol) -> Option<Value> {
        self.set(symbol.key, symbol.value)
    }

    pub fn remove(&mut self, key: impl Into<Key>) -> Option<Value> {
        let key = key.into();
        self.position(key)
            .map(|i| self.symbols.remove(i).value)
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.symbols.iter().map(|s| s.key)
    }

    fn position(&self, key: Key) -> Option<usize> {
        self.symbols.iter().position(|s| s.key == key)
    }
}

impl FromIterator<Symbol> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        let mut table = SymbolTable::new();
        for symbol in iter {
            table.insert(symbol);
        }
        table
    }
}

impl<K: Into<Key>, V: Into<Value>> FromIterator<(K, V)> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().map(|(k, v)| Symbol::new(k, v)).collect()
    }
}

impl<'a> IntoIterator for &'a SymbolTable {
    type Item = &'a Symbol;
    type IntoIter = std::slice::Iter<'a, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.symbols.iter()
    }
}

impl Serialize for SymbolTable {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        let mut map = ser.serialize_map(Some(self.len()))?;
        for symbol in &self.symbols {
            map.serialize_entry(&symbol.key, &symbol.value)?;
        }
        map.end()
    }
}

struct TableVisitor;

impl<'de> Visitor<'de> for TableVisitor {
    type Value = SymbolTable;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a mapping of symbol names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SymbolTable, A::Error> {
        let mut table = SymbolTable::new();
        while let Some((key, value)) = access.next_entry::<Key, Value>()? {
            if table.set(key, value).is_some() {
                return Err(serde::de::Error::custom(format!(
                    "duplicate symbol {key:?}"
                )));
            }
        }
        Ok(table)
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<SymbolTable, E> {
        Ok(SymbolTable::new())
    }
}

impl<'de> Deserialize<'de> for SymbolTable {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<SymbolTable, D::Error> {
        de.deserialize_any(TableVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_set_overwrites_in_place() {
        let mut table = SymbolTable::new();
        assert_eq!(table.set("hp", 10), None);
        assert_eq!(table.set("name", "grunt"), None);
        assert_eq!(table.set("hp", 7), Some(Value::Int(10)));
        assert_eq!(table.len(), 2);
        let keys: Vec<_> = table.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["hp", "name"]);
    }

    #[test]
    fn test_get_as_errors() {
        let mut table = SymbolTable::new();
        table.set("alive", true);
        assert_eq!(table.get_as::<bool>("alive"), Ok(true));
        assert_eq!(
            table.get_as::<i64>("alive").unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(
            table.get_as::<bool>("dead").unwrap_err().kind(),
            ErrorKind::MissingSymbol
        );
    }

    #[test]
    fn test_clone_is_deep() {
        let mut a = SymbolTable::new();
        a.set("door", "closed");
        let b = a.clone();
        a.set("door", "open");
        assert_eq!(b.get("door"), Some(&Value::from("closed")));
    }

    #[test]
    fn test_yaml_keeps_order_and_rejects_duplicates() {
        let table: SymbolTable = serde_yaml::from_str("b: 1\na: true\n").unwrap();
        let keys: Vec<_> = table.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert!(serde_yaml::from_str::<SymbolTable>("a: 1\na: 2\n").is_err());
    }
}
