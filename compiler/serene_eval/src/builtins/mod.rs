//! Native functions.
//!
//! The registry is built once, on first use, and never mutated afterwards,
//! so every evaluation context can share it without locking. Each
//! [`Runtime`] gives every builtin its own [`FnId`](serene_ir::FnId) when it
//! is created.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use rustc_hash::{FxHashMap, FxHasher};
use serene_ir::ExprId;

use crate::errors::{wrong_arg_count, EvalResult};
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::value::Value;

/// Signature of a native function: runtime context, lexical scope,
/// invocation site, arguments.
pub type NativeFn = fn(&mut Runtime, &Scope, ExprId, &[Value]) -> EvalResult;

/// A named native function.
#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub func: NativeFn,
}

impl NativeFunction {
    pub const fn new(name: &'static str, func: NativeFn) -> Self {
        NativeFunction { name, func }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

const BUILTINS: &[NativeFunction] = &[NativeFunction::new("hash", hash_native_fn)];

static GLOBAL: OnceLock<BuiltinRegistry> = OnceLock::new();

/// Immutable lookup table of native functions.
#[derive(Debug)]
pub struct BuiltinRegistry {
    functions: FxHashMap<&'static str, NativeFunction>,
}

impl BuiltinRegistry {
    /// The process-wide registry.
    pub fn global() -> &'static BuiltinRegistry {
        GLOBAL.get_or_init(|| BuiltinRegistry::from_functions(BUILTINS))
    }

    /// Build a registry from a fixed set of functions.
    ///
    /// A later entry with the same name replaces an earlier one.
    pub fn from_functions(functions: &[NativeFunction]) -> Self {
        BuiltinRegistry {
            functions: functions.iter().map(|f| (f.name, *f)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&NativeFunction> {
        self.functions.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Registered functions, sorted by name.
    pub fn functions(&self) -> Vec<NativeFunction> {
        let mut functions: Vec<_> = self.functions.values().copied().collect();
        functions.sort_unstable_by_key(|f| f.name);
        functions
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// `(hash x)`: a deterministic integer hash of `x`.
fn hash_native_fn(_: &mut Runtime, _: &Scope, _: ExprId, args: &[Value]) -> EvalResult {
    let [value] = args else {
        return Err(wrong_arg_count("hash", 1, args.len()));
    };
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    Ok(Value::Int(i64::from_ne_bytes(hasher.finish().to_ne_bytes())))
}
