//! Error types for call tracking and native calls.
//!
//! [`CallStackError`] is what [`CallStack::push`](crate::CallStack::push)
//! can fail with. [`EvalError`] is what the runtime hands back to the
//! evaluator: a structured [`EvalErrorKind`] plus the source location and
//! the traceback captured at the error site.
//!
//! Constructor functions (`wrong_arg_count`, `not_callable`) are the
//! preferred way to build errors from builtins.

use serene_ir::Span;

use crate::call_stack::TraceBack;
use crate::value::Value;

/// Result of evaluating a call.
pub type EvalResult = Result<Value, EvalError>;

/// Rejected call stack operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CallStackError {
    #[error("can't push a nil callable to the call stack")]
    NilCallable,
    #[error("can't push a nil call site to the call stack")]
    NilCallSite,
}

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalErrorKind {
    #[error(transparent)]
    CallStack(#[from] CallStackError),

    #[error("{name} expects {expected} {}, got {got}", arguments(.expected))]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("{name} is not callable")]
    NotCallable { name: String },

    /// Catch-all for errors without a structured kind.
    #[error("{message}")]
    Custom { message: String },
}

fn arguments(count: &usize) -> &'static str {
    if *count == 1 {
        "argument"
    } else {
        "arguments"
    }
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Source location, when known.
    pub span: Option<Span>,
    /// Call stack at the error site, oldest frame first.
    pub traceback: Option<TraceBack>,
}

impl EvalError {
    /// Create an error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self::from_kind(EvalErrorKind::Custom {
            message: message.into(),
        })
    }

    pub fn from_kind(kind: EvalErrorKind) -> Self {
        EvalError {
            kind,
            span: None,
            traceback: None,
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach a traceback; an existing one is kept.
    ///
    /// The first traceback attached is the one closest to the failure, so
    /// callers further out don't overwrite it.
    #[must_use]
    pub fn with_traceback(mut self, traceback: TraceBack) -> Self {
        if self.traceback.is_none() {
            self.traceback = Some(traceback);
        }
        self
    }
}

impl From<CallStackError> for EvalError {
    fn from(err: CallStackError) -> Self {
        EvalError::from_kind(err.into())
    }
}

/// Wrong number of arguments passed to `name`.
#[cold]
pub fn wrong_arg_count(name: &str, expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected,
        got,
    })
}

/// `name` can't be invoked.
#[cold]
pub fn not_callable(name: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable { name: name.into() })
}
