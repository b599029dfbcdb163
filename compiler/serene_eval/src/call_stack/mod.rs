//! Call tracking for the trampolined evaluator.
//!
//! The evaluator pushes a [`Frame`] right before entering a callable's body
//! and pops it right after the body returns. Because tail calls run as a
//! loop rather than native recursion, the stack collapses consecutive pushes
//! of the same `(call site, callable)` pair into one frame and counts the
//! repeats instead. The tracked depth is therefore bounded by the number of
//! distinct active call sites, not by how many times a loop went round.
//!
//! # Example
//!
//! ```text
//! let mut stack = CallStack::new(false);
//! stack.push(call_site, fact)?;
//! stack.push(call_site, fact)?;   // tail call: collapsed
//! assert_eq!(stack.count(), 1);
//! assert_eq!(stack.peek().map(|f| f.repeat_count), Some(1));
//! ```

use std::fmt;

use serene_ir::{ExprId, FnId};

use crate::errors::CallStackError;
use crate::observer::{StackEvent, StackObserver};

/// One logical invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// Consecutive invocations of the same pair beyond the first.
    pub repeat_count: u32,
    /// The callable being executed.
    pub callable: FnId,
    /// The expression that made the call.
    pub call_site: ExprId,
}

impl Frame {
    pub fn new(call_site: ExprId, callable: FnId, repeat_count: u32) -> Self {
        Frame {
            repeat_count,
            callable,
            call_site,
        }
    }

    /// Whether a push of `(call_site, callable)` continues this frame.
    ///
    /// Identity only: the same function called from two different call
    /// sites is two different calls.
    #[inline]
    pub fn is_same_call(&self, call_site: ExprId, callable: FnId) -> bool {
        self.callable == callable && self.call_site == call_site
    }

    /// Human-readable rendering, resolving ids through `resolver`.
    pub fn display<'a, R: FrameResolver + ?Sized>(
        &'a self,
        resolver: &'a R,
    ) -> FrameDisplay<'a, R> {
        FrameDisplay {
            frame: self,
            resolver,
        }
    }
}

/// Turns the ids stored in frames back into text for diagnostics.
pub trait FrameResolver {
    /// Display form of a callable.
    fn callable_name(&self, callable: FnId) -> String;

    /// Source form of a call-site expression.
    fn call_site_source(&self, call_site: ExprId) -> String;
}

/// See [`Frame::display`].
pub struct FrameDisplay<'a, R: ?Sized> {
    frame: &'a Frame,
    resolver: &'a R,
}

impl<R: FrameResolver + ?Sized> fmt::Display for FrameDisplay<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Frame: fn: {}, count: {}, caller: {}>",
            self.resolver.callable_name(self.frame.callable),
            self.frame.repeat_count,
            self.resolver.call_site_source(self.frame.call_site),
        )
    }
}

/// Live call stack of one evaluation context.
///
/// Frames live in a `Vec` used strictly as a stack: the top is the last
/// element and a frame's caller sits at `index - 1`.
///
/// Not shared between threads; every evaluation context builds its own.
#[derive(Clone, Debug, Default)]
pub struct CallStack {
    frames: Vec<Frame>,
    observer: StackObserver,
}

impl CallStack {
    /// Create an empty stack.
    ///
    /// With `diagnostics` set, every push and pop is reported through
    /// `tracing` (see [`StackObserver::Tracing`]).
    pub fn new(diagnostics: bool) -> Self {
        let observer = if diagnostics {
            StackObserver::tracing()
        } else {
            StackObserver::Silent
        };
        Self::with_observer(observer)
    }

    /// Create an empty stack reporting to `observer`.
    pub fn with_observer(observer: StackObserver) -> Self {
        CallStack {
            frames: Vec::new(),
            observer,
        }
    }

    pub fn observer(&self) -> &StackObserver {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut StackObserver {
        &mut self.observer
    }

    /// Record entry into `callable` from `call_site`.
    ///
    /// If the top frame is the same call, its repeat count goes up and no
    /// frame is added. Invalid ids are rejected and leave the stack as it was.
    pub fn push(&mut self, call_site: ExprId, callable: FnId) -> Result<(), CallStackError> {
        if !callable.is_valid() {
            return Err(CallStackError::NilCallable);
        }
        if !call_site.is_valid() {
            return Err(CallStackError::NilCallSite);
        }

        let (repeat_count, collapsed) = match self.frames.last_mut() {
            Some(top) if top.is_same_call(call_site, callable) => {
                top.repeat_count = top.repeat_count.saturating_add(1);
                (top.repeat_count, true)
            }
            _ => {
                self.frames.push(Frame::new(call_site, callable, 0));
                (0, false)
            }
        };

        self.observer.notify(StackEvent::Push {
            callable,
            repeat_count,
            collapsed,
        });
        Ok(())
    }

    /// Remove and return the top frame. `None` on an empty stack.
    pub fn pop(&mut self) -> Option<Frame> {
        let frame = self.frames.pop();
        self.observer.notify(StackEvent::Pop {
            callable: frame.map(|f| f.callable),
        });
        frame
    }

    /// Pop frames until at most `depth` remain.
    ///
    /// Used by the evaluator to restore the stack after an aborted call.
    pub fn unwind_to(&mut self, depth: usize) {
        while self.frames.len() > depth {
            self.pop();
        }
    }

    /// Remember the current depth and top repeat count, so a call can be
    /// undone with [`CallStack::restore`] even when its push collapsed.
    pub fn mark(&self) -> StackMark {
        StackMark {
            depth: self.frames.len(),
            top_repeat_count: self.peek().map(|f| f.repeat_count),
        }
    }

    /// Put the stack back where `mark` was taken.
    ///
    /// Frames pushed since are popped; a repeat count bumped on the marked
    /// top frame is reset, which is reported as a pop of that callable.
    pub fn restore(&mut self, mark: StackMark) {
        self.unwind_to(mark.depth);
        if self.frames.len() != mark.depth {
            return;
        }
        let (Some(saved), Some(top)) = (mark.top_repeat_count, self.frames.last_mut()) else {
            return;
        };
        if top.repeat_count > saved {
            top.repeat_count = saved;
            let callable = top.callable;
            self.observer.notify(StackEvent::Pop {
                callable: Some(callable),
            });
        }
    }

    /// The top frame, without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Number of logical (collapsed) frames.
    #[inline]
    pub fn count(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Callable of the top frame.
    #[inline]
    pub fn current_fn(&self) -> Option<FnId> {
        self.peek().map(|f| f.callable)
    }

    /// Frames from the oldest (bottom) to the most recent (top).
    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// Snapshot the stack for error reporting, oldest frame first.
    pub fn to_traceback(&self) -> TraceBack {
        TraceBack::new(self.frames.clone())
    }
}

/// Position of a [`CallStack`] taken by [`CallStack::mark`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackMark {
    depth: usize,
    top_repeat_count: Option<u32>,
}

impl<'a> IntoIterator for &'a CallStack {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Immutable snapshot of a [`CallStack`], oldest frame first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceBack {
    frames: Vec<Frame>,
}

impl TraceBack {
    pub fn new(frames: Vec<Frame>) -> Self {
        TraceBack { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The most recent frame, i.e. the call that was active at the error.
    pub fn innermost(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Human-readable rendering, resolving ids through `resolver`.
    pub fn display<'a, R: FrameResolver + ?Sized>(
        &'a self,
        resolver: &'a R,
    ) -> TraceBackDisplay<'a, R> {
        TraceBackDisplay {
            traceback: self,
            resolver,
        }
    }
}

/// See [`TraceBack::display`].
pub struct TraceBackDisplay<'a, R: ?Sized> {
    traceback: &'a TraceBack,
    resolver: &'a R,
}

impl<R: FrameResolver + ?Sized> fmt::Display for TraceBackDisplay<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.traceback.is_empty() {
            return Ok(());
        }
        writeln!(f, "traceback (most recent call last):")?;
        for (i, frame) in self.traceback.frames.iter().enumerate() {
            writeln!(f, "  {i}: {}", frame.display(self.resolver))?;
        }
        Ok(())
    }
}
