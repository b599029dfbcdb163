//! Evaluation context.
//!
//! A [`Runtime`] is one independent evaluation: it owns the call stack, the
//! expression arena, the interner and the table of known callables. The
//! trampolined evaluator drives the call stack directly for user functions;
//! native functions go through [`Runtime::call_native`], which wraps them in
//! the same push/pop protocol.

use rustc_hash::FxHashMap;
use serene_ir::{ExprArena, ExprId, FnId, FnIdAllocator, Name, StringInterner};

use crate::builtins::{BuiltinRegistry, NativeFunction};
use crate::call_stack::{CallStack, FrameResolver};
use crate::config::RuntimeConfig;
use crate::errors::{not_callable, EvalError, EvalResult};
use crate::scope::Scope;
use crate::value::Value;

#[derive(Clone, Copy, Debug)]
enum FunctionKind {
    Native(NativeFunction),
    /// Defined in Serene; executed by the evaluator.
    User,
}

#[derive(Clone, Copy, Debug)]
struct FunctionEntry {
    name: Name,
    kind: FunctionKind,
}

pub struct Runtime {
    config: RuntimeConfig,
    call_stack: CallStack,
    interner: StringInterner,
    arena: ExprArena,
    fn_ids: FnIdAllocator,
    functions: FxHashMap<FnId, FunctionEntry>,
    builtins: FxHashMap<&'static str, FnId>,
}

impl Runtime {
    /// Create a fresh context with every global builtin registered.
    pub fn new(config: RuntimeConfig) -> Self {
        let mut runtime = Runtime {
            config,
            call_stack: CallStack::new(config.stack_diagnostics()),
            interner: StringInterner::new(),
            arena: ExprArena::new(),
            fn_ids: FnIdAllocator::new(),
            functions: FxHashMap::default(),
            builtins: FxHashMap::default(),
        };
        for native in BuiltinRegistry::global().functions() {
            let id = runtime.register(native.name, FunctionKind::Native(native));
            runtime.builtins.insert(native.name, id);
        }
        runtime
    }

    fn register(&mut self, name: &str, kind: FunctionKind) -> FnId {
        let id = self.fn_ids.fresh();
        let name = self.interner.intern(name);
        self.call_stack
            .observer_mut()
            .name_callable(id, self.interner.lookup(name));
        self.functions.insert(id, FunctionEntry { name, kind });
        id
    }

    /// Give a user-defined function its identity.
    ///
    /// Every call returns a new id, even for a name seen before: two
    /// functions with the same name are still two callables.
    pub fn declare_function(&mut self, name: &str) -> FnId {
        self.register(name, FunctionKind::User)
    }

    /// Id of the builtin called `name` in this context.
    pub fn builtin(&self, name: &str) -> Option<FnId> {
        self.builtins.get(name).copied()
    }

    /// Name a callable was registered under.
    pub fn function_name(&self, callable: FnId) -> Option<&'static str> {
        self.functions
            .get(&callable)
            .map(|entry| self.interner.lookup(entry.name))
    }

    /// Run a native function as a call from `call_site`.
    ///
    /// The callable is pushed before it runs and the stack is restored
    /// afterwards, whether the call failed or not. That includes the repeat
    /// count of the caller's frame when the push collapsed onto it. A
    /// failure carries the call site's span and the traceback as it was
    /// inside the call.
    #[tracing::instrument(level = "debug", skip_all, fields(callable = %callable))]
    pub fn call_native(
        &mut self,
        scope: &Scope,
        call_site: ExprId,
        callable: FnId,
        args: &[Value],
    ) -> EvalResult {
        let mark = self.call_stack.mark();
        self.call_stack.push(call_site, callable)?;

        let kind = self.functions.get(&callable).map(|entry| entry.kind);
        let result = match kind {
            Some(FunctionKind::Native(native)) => (native.func)(self, scope, call_site, args),
            Some(FunctionKind::User) | None => Err(not_callable(self.callable_name(callable))),
        };
        let result = result.map_err(|mut err| {
            if err.span.is_none() {
                err.span = self.arena.span(call_site);
            }
            self.attach_traceback(err)
        });

        self.call_stack.restore(mark);
        result
    }

    /// Attach the current traceback to `err`, unless it already has one.
    pub fn attach_traceback(&self, err: EvalError) -> EvalError {
        if err.traceback.is_some() || self.call_stack.is_empty() {
            return err;
        }
        let traceback = self.call_stack.to_traceback();
        if self.config.log_tracebacks() {
            tracing::debug!(
                target: "serene_eval::traceback",
                "{err}\n{}",
                traceback.display(self)
            );
        }
        err.with_traceback(traceback)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    pub fn call_stack_mut(&mut self) -> &mut CallStack {
        &mut self.call_stack
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn arena(&self) -> &ExprArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut ExprArena {
        &mut self.arena
    }
}

impl FrameResolver for Runtime {
    fn callable_name(&self, callable: FnId) -> String {
        self.function_name(callable)
            .map_or_else(|| callable.to_string(), str::to_string)
    }

    fn call_site_source(&self, call_site: ExprId) -> String {
        self.arena.display(call_site, &self.interner)
    }
}

#[cfg(test)]
mod tests;
