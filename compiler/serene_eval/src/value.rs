//! Runtime values passed to and returned from native functions.

use std::sync::Arc;

use serene_ir::{FnId, Name};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
    Symbol(Name),
    /// A callable, by identity.
    Function(FnId),
}

impl Value {
    /// Create a string value.
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// Name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Function(_) => "function",
        }
    }
}
