//! Interned blackboard keys.
//!
//! A key is a pointer into a process-wide string heap, so two keys naming the
//! same string always share the same address and compare in O(1).

use ::once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Mutex;

static KEY_HEAP: Lazy<Mutex<HashSet<&'static str>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// An interned key name.
#[derive(Clone, Copy, Eq)]
pub struct Key {
    s: &'static str,
}

impl Key {
    pub fn new(s: &str) -> Self {
        // A poisoned heap still holds valid leaked strings.
        let mut heap = KEY_HEAP.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(interned) = heap.get(s) {
            return Key { s: interned };
        }
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        heap.insert(leaked);
        Key { s: leaked }
    }

    /// Address of the backing string, which identifies the key.
    pub fn addr(self) -> usize {
        self.s.as_ptr() as usize
    }

    pub fn as_str(self) -> &'static str {
        self.s
    }

    /// Number of distinct keys interned so far.
    pub fn count() -> usize {
        KEY_HEAP.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Debug for Key {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        Debug::fmt(self.s, fmt)
    }
}

impl Display for Key {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        fmt.write_str(self.s)
    }
}

impl Deref for Key {
    type Target = str;
    fn deref(&self) -> &str {
        self.s
    }
}

impl<S: AsRef<str>> From<S> for Key {
    fn from(s: S) -> Key {
        Key::new(s.as_ref())
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state)
    }
}

/// Keys order by their string contents, so sorted tables are stable across runs.
impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        if self == other {
            Ordering::Equal
        } else {
            self.s.cmp(other.s)
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl serde::Serialize for Key {
    fn serialize<S: serde::Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(self.s)
    }
}

impl<'de> serde::Deserialize<'de> for Key {
    fn deserialize<D: serde::Deserializer<'de>>(de: D) -> Result<Key, D::Error> {
        <String as serde::Deserialize>::deserialize(de).map(Key::from)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_interned_address() {
        let a = Key::from("position");
        let b = Key::from(String::from("position"));
        assert_eq!(a.addr(), b.addr());
        assert_eq!(a, b);
        assert_ne!(a, Key::from("target"));
    }

    #[test]
    fn test_order_by_contents() {
        let mut keys = vec![Key::from("zeta"), Key::from("alpha"), Key::from("mu")];
        keys.sort();
        let names: Vec<_> = keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mu", "zeta"]);
    }
}
