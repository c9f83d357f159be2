//! Hash keys and the insertion-ordered table behind hash values.

use super::value::Value;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::rc::Rc;

/// Insertion-ordered map backing [`Value::Hash`].
pub type HashTable = IndexMap<HashKey, Value, FxBuildHasher>;

/// The hashable subset of values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    String(Rc<str>),
}

impl HashKey {
    /// Convert back to the value the key was made from.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            HashKey::Integer(i) => Value::Integer(*i),
            HashKey::Boolean(b) => Value::Boolean(*b),
            HashKey::String(s) => Value::String(Rc::clone(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_values_give_equal_keys() {
        let a = Value::string("name").hash_key().unwrap();
        let b = Value::from("name").hash_key().unwrap();
        assert_eq!(a, b);
        assert_ne!(
            Value::Integer(1).hash_key().unwrap(),
            Value::Boolean(true).hash_key().unwrap()
        );
    }

    #[test]
    fn test_table_preserves_insertion_order() {
        let mut table = HashTable::default();
        for key in ["z", "a", "m"] {
            table.insert(Value::from(key).hash_key().unwrap(), Value::Null);
        }
        let keys: Vec<String> = table.keys().map(|k| k.to_value().to_string()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
