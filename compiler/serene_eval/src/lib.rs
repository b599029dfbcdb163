//! Serene Eval - call tracking and runtime context for the Serene evaluator.
//!
//! The evaluator is trampolined: tail calls become loop iterations instead
//! of native recursion. This crate provides the bookkeeping it drives.
//!
//! # Architecture
//!
//! - `CallStack`: frames of active calls, collapsing consecutive identical
//!   calls into one frame with a repeat count
//! - `TraceBack`: snapshot of the call stack for error reporting
//! - `StackObserver`: where push/pop events go (nowhere, `tracing`, memory)
//! - `BuiltinRegistry`: immutable table of native functions
//! - `Runtime`: one evaluation context, owning the call stack and running
//!   native functions under the push/pop protocol

pub mod builtins;
mod call_stack;
mod config;
pub mod errors;
mod observer;
mod runtime;
mod scope;
mod tracing_setup;
mod value;

pub use builtins::{BuiltinRegistry, NativeFn, NativeFunction};
pub use call_stack::{
    CallStack, Frame, FrameDisplay, FrameResolver, StackMark, TraceBack, TraceBackDisplay,
};
pub use config::{DebugFlags, RuntimeConfig, DEBUG_ENV_VAR};
pub use errors::{CallStackError, EvalError, EvalErrorKind, EvalResult};
pub use observer::{BufferObserver, StackEvent, StackObserver, TracingObserver};
pub use runtime::Runtime;
pub use scope::Scope;
pub use tracing_setup::init_tracing;
pub use value::Value;
