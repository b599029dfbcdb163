//! Lexical scopes handed to native functions.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use serene_ir::Name;

use crate::value::Value;

/// One level of lexical bindings with an optional enclosing scope.
#[derive(Debug, Default)]
pub struct Scope {
    bindings: FxHashMap<Name, Value>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    /// A top-level scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope nested inside `parent`.
    pub fn child(parent: Rc<Scope>) -> Self {
        Scope {
            bindings: FxHashMap::default(),
            parent: Some(parent),
        }
    }

    /// Bind `name` in this scope, shadowing outer bindings.
    pub fn define(&mut self, name: Name, value: Value) {
        self.bindings.insert(name, value);
    }

    /// Resolve `name`, innermost scope first.
    pub fn lookup(&self, name: Name) -> Option<&Value> {
        let mut scope = self;
        loop {
            if let Some(value) = scope.bindings.get(&name) {
                return Some(value);
            }
            scope = scope.parent.as_deref()?;
        }
    }
}
