//! Symbol table for compile-time name resolution.
//!
//! One table exists per function being compiled, chained to the table of the
//! enclosing function; the outermost table holds globals and built-ins.
//! Resolving a name that lives in an enclosing *function* records it as a
//! free variable of every function in between, so each closure captures
//! what its inner closures need.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::rc::Rc;

/// Storage class of a resolved name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolScope {
    /// Top-level binding, stored in the VM's globals.
    Global,
    /// Parameter or `let` inside a function, stored in the frame.
    Local,
    /// Built-in function, addressed by its fixed index.
    Builtin,
    /// Binding of an enclosing function, captured by the closure.
    Free,
    /// The function currently being defined, for self-reference.
    Function,
}

/// A resolved name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Source name.
    pub name: Rc<str>,
    /// Storage class.
    pub scope: SymbolScope,
    /// Slot within that storage class.
    pub index: usize,
}

/// Names defined in one scope, with a link to the enclosing scope.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    outer: Option<Box<SymbolTable>>,
    store: IndexMap<Rc<str>, Symbol, FxBuildHasher>,
    num_definitions: usize,
    /// Outer-scope symbols captured by this scope, in first-use order.
    free_symbols: Vec<Symbol>,
}

impl SymbolTable {
    /// Create the outermost (global) table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a function scope nested inside `outer`.
    #[must_use]
    pub fn new_enclosed(outer: SymbolTable) -> Self {
        Self {
            outer: Some(Box::new(outer)),
            ..Self::default()
        }
    }

    /// Detach and return the enclosing table.
    pub fn take_outer(&mut self) -> Option<SymbolTable> {
        self.outer.take().map(|outer| *outer)
    }

    /// Whether this is the outermost table.
    #[inline]
    pub fn is_global(&self) -> bool {
        self.outer.is_none()
    }

    /// Number of global or local slots defined here.
    #[inline]
    pub fn num_definitions(&self) -> usize {
        self.num_definitions
    }

    /// Symbols captured from enclosing scopes, in capture order.
    #[inline]
    pub fn free_symbols(&self) -> &[Symbol] {
        &self.free_symbols
    }

    // =========================================================================
    // Definition
    // =========================================================================

    /// Bind `name` to the next global or local slot. Redefining a name
    /// already bound in this scope reuses its slot.
    pub fn define(&mut self, name: &str) -> Symbol {
        let scope = if self.is_global() {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        if let Some(existing) = self.store.get(name).filter(|s| s.scope == scope) {
            return existing.clone();
        }
        let symbol = Symbol {
            name: name.into(),
            scope,
            index: self.num_definitions,
        };
        self.num_definitions += 1;
        self.insert(symbol)
    }

    /// Bind a built-in at its fixed index. Does not consume a slot.
    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        self.insert(Symbol {
            name: name.into(),
            scope: SymbolScope::Builtin,
            index,
        })
    }

    /// Bind the name of the function whose body this table belongs to.
    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        self.insert(Symbol {
            name: name.into(),
            scope: SymbolScope::Function,
            index: 0,
        })
    }

    fn define_free(&mut self, original: Symbol) -> Symbol {
        let symbol = Symbol {
            name: Rc::clone(&original.name),
            scope: SymbolScope::Free,
            index: self.free_symbols.len(),
        };
        self.free_symbols.push(original);
        self.insert(symbol)
    }

    fn insert(&mut self, symbol: Symbol) -> Symbol {
        self.store.insert(Rc::clone(&symbol.name), symbol.clone());
        symbol
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve `name`, innermost scope first.
    ///
    /// Globals and built-ins resolve as-is from any depth. Anything else
    /// found in an enclosing function becomes a free variable here, and in
    /// each function scope between here and its definition.
    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.store.get(name) {
            return Some(symbol.clone());
        }

        let found = self.outer.as_mut()?.resolve(name)?;
        match found.scope {
            SymbolScope::Global | SymbolScope::Builtin => Some(found),
            SymbolScope::Local | SymbolScope::Free | SymbolScope::Function => {
                Some(self.define_free(found))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str, scope: SymbolScope, index: usize) -> Symbol {
        Symbol {
            name: name.into(),
            scope,
            index,
        }
    }

    #[test]
    fn test_define_assigns_dense_slots() {
        let mut global = SymbolTable::new();
        assert_eq!(global.define("a"), sym("a", SymbolScope::Global, 0));
        assert_eq!(global.define("b"), sym("b", SymbolScope::Global, 1));

        let mut local = SymbolTable::new_enclosed(global);
        assert_eq!(local.define("c"), sym("c", SymbolScope::Local, 0));
        assert_eq!(local.define("d"), sym("d", SymbolScope::Local, 1));
        assert_eq!(local.num_definitions(), 2);
    }

    #[test]
    fn test_redefinition_reuses_slot() {
        let mut global = SymbolTable::new();
        global.define("a");
        global.define("b");
        assert_eq!(global.define("a"), sym("a", SymbolScope::Global, 0));
        assert_eq!(global.num_definitions(), 2);

        let mut local = SymbolTable::new_enclosed(global);
        assert_eq!(local.define("a"), sym("a", SymbolScope::Local, 0));
        assert_eq!(local.define("a"), sym("a", SymbolScope::Local, 0));
        assert_eq!(local.num_definitions(), 1);
    }

    #[test]
    fn test_resolve_global_from_nested_scopes() {
        let mut global = SymbolTable::new();
        global.define("a");
        let first = SymbolTable::new_enclosed(global);
        let mut second = SymbolTable::new_enclosed(first);

        assert_eq!(second.resolve("a"), Some(sym("a", SymbolScope::Global, 0)));
        assert!(second.free_symbols().is_empty());
        assert_eq!(second.resolve("missing"), None);
    }

    #[test]
    fn test_builtins_resolve_everywhere_without_slots() {
        let mut global = SymbolTable::new();
        global.define_builtin(0, "len");
        global.define_builtin(5, "push");
        assert_eq!(global.num_definitions(), 0);

        let mut nested = SymbolTable::new_enclosed(SymbolTable::new_enclosed(global));
        assert_eq!(nested.resolve("push"), Some(sym("push", SymbolScope::Builtin, 5)));
        assert!(nested.free_symbols().is_empty());
    }

    #[test]
    fn test_resolve_free_through_intermediate_scope() {
        let mut global = SymbolTable::new();
        global.define("a");

        let mut first = SymbolTable::new_enclosed(global);
        first.define("b");

        let mut second = SymbolTable::new_enclosed(first);
        second.define("c");

        let mut third = SymbolTable::new_enclosed(second);
        third.define("d");

        assert_eq!(third.resolve("a"), Some(sym("a", SymbolScope::Global, 0)));
        assert_eq!(third.resolve("b"), Some(sym("b", SymbolScope::Free, 0)));
        assert_eq!(third.resolve("c"), Some(sym("c", SymbolScope::Free, 1)));
        assert_eq!(third.resolve("d"), Some(sym("d", SymbolScope::Local, 0)));
        assert_eq!(
            third.free_symbols(),
            &[sym("b", SymbolScope::Free, 0), sym("c", SymbolScope::Local, 0)]
        );

        let mut second = third.take_outer().unwrap();
        assert_eq!(second.free_symbols(), &[sym("b", SymbolScope::Local, 0)]);
        assert_eq!(second.resolve("b"), Some(sym("b", SymbolScope::Free, 0)));
    }

    #[test]
    fn test_free_variable_recorded_once() {
        let mut outer = SymbolTable::new_enclosed(SymbolTable::new());
        outer.define("x");
        let mut inner = SymbolTable::new_enclosed(outer);
        inner.resolve("x");
        inner.resolve("x");
        assert_eq!(inner.free_symbols().len(), 1);
    }

    #[test]
    fn test_shadowing_resolves_innermost() {
        let mut global = SymbolTable::new();
        global.define("x");
        let mut local = SymbolTable::new_enclosed(global);
        local.define("x");
        assert_eq!(local.resolve("x"), Some(sym("x", SymbolScope::Local, 0)));

        let mut global = local.take_outer().unwrap();
        assert_eq!(global.resolve("x"), Some(sym("x", SymbolScope::Global, 0)));
    }

    #[test]
    fn test_function_name_resolves_as_function_scope() {
        let mut global = SymbolTable::new();
        global.define("f");
        let mut body = SymbolTable::new_enclosed(global);
        body.define_function_name("f");
        assert_eq!(body.resolve("f"), Some(sym("f", SymbolScope::Function, 0)));

        body.define("f");
        assert_eq!(body.resolve("f"), Some(sym("f", SymbolScope::Local, 0)));
    }

    #[test]
    fn test_function_name_captured_by_inner_closure() {
        let mut body = SymbolTable::new_enclosed(SymbolTable::new());
        body.define_function_name("countdown");
        let mut inner = SymbolTable::new_enclosed(body);
        assert_eq!(inner.resolve("countdown"), Some(sym("countdown", SymbolScope::Free, 0)));
        assert_eq!(
            inner.free_symbols(),
            &[sym("countdown", SymbolScope::Function, 0)]
        );
    }
}
