//! Variable environments for the tree-walking evaluator.

use crate::object::Value;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to an environment.
pub type Env = Rc<RefCell<Environment>>;

/// One lexical scope: its bindings plus a link to the enclosing scope.
#[derive(Debug, Default)]
pub struct Environment {
    store: FxHashMap<String, Value>,
    outer: Option<Env>,
}

impl Environment {
    /// A fresh top-level environment.
    #[must_use]
    pub fn new() -> Env {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// A new scope nested inside `outer`.
    #[must_use]
    pub fn enclosed(outer: &Env) -> Env {
        Rc::new(RefCell::new(Environment {
            store: FxHashMap::default(),
            outer: Some(Rc::clone(outer)),
        }))
    }

    /// Look `name` up here, then in each enclosing scope.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.store.get(name) {
            Some(value) => Some(value.clone()),
            None => self.outer.as_ref()?.borrow().get(name),
        }
    }

    /// Bind `name` in this scope, shadowing any outer binding.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.store.insert(name.into(), value);
    }

    /// Number of bindings in this scope alone.
    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether this scope has no bindings of its own.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
