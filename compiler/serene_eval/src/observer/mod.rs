//! Observers for call stack activity.
//!
//! A [`CallStack`](crate::CallStack) reports every push and pop to its
//! observer. Where the events go is up to the observer:
//! - Silent: nowhere (default)
//! - Tracing: `tracing` debug records on the `serene_eval::stack` target
//! - Buffer: kept in memory for tests and tooling
//!
//! # Performance
//! Uses enum dispatch instead of trait objects; the silent case is a single
//! match arm on the push/pop path.

use std::fmt;

use rustc_hash::FxHashMap;
use serene_ir::FnId;

/// Something that happened to a call stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackEvent {
    /// A push. `collapsed` is set when it only bumped the top frame's
    /// repeat count.
    Push {
        callable: FnId,
        repeat_count: u32,
        collapsed: bool,
    },
    /// A pop. `callable` is `None` when the stack was already empty.
    Pop { callable: Option<FnId> },
}

impl StackEvent {
    /// Trace line for this event, naming callables through `label`.
    pub fn line(&self, label: impl Fn(FnId) -> String) -> String {
        match *self {
            StackEvent::Push {
                callable,
                repeat_count: 0,
                ..
            } => format!("[Stack] --> {}", label(callable)),
            StackEvent::Push {
                callable,
                repeat_count,
                ..
            } => format!("[Stack] --> {} (repeat {repeat_count})", label(callable)),
            StackEvent::Pop {
                callable: Some(callable),
            } => format!("[Stack] <-- {}", label(callable)),
            StackEvent::Pop { callable: None } => "[Stack] <-- nil".to_string(),
        }
    }
}

impl fmt::Display for StackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line(|callable| callable.to_string()))
    }
}

/// Observer that writes `tracing` debug records.
///
/// Callables are shown by name once named with
/// [`StackObserver::name_callable`]; unnamed ones fall back to their id.
#[derive(Clone, Debug, Default)]
pub struct TracingObserver {
    names: FxHashMap<FnId, &'static str>,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&mut self, callable: FnId, name: &'static str) {
        self.names.insert(callable, name);
    }

    /// Display form of `callable` in trace lines.
    pub fn label(&self, callable: FnId) -> String {
        self.names
            .get(&callable)
            .map_or_else(|| callable.to_string(), |name| (*name).to_string())
    }

    pub fn emit(&self, event: StackEvent) {
        tracing::debug!(
            target: "serene_eval::stack",
            "{}",
            event.line(|callable| self.label(callable))
        );
    }
}

/// Observer that records events in memory.
#[derive(Clone, Debug, Default)]
pub struct BufferObserver {
    events: Vec<StackEvent>,
}

impl BufferObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: StackEvent) {
        self.events.push(event);
    }

    /// Events in the order they happened.
    pub fn events(&self) -> &[StackEvent] {
        &self.events
    }

    /// Events rendered as trace lines.
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Destination for call stack events.
#[derive(Clone, Debug, Default)]
pub enum StackObserver {
    /// Discards all events.
    #[default]
    Silent,
    /// Emits a `tracing` debug record per event.
    Tracing(TracingObserver),
    /// Records events in memory.
    Buffer(BufferObserver),
}

impl StackObserver {
    /// A fresh in-memory observer.
    pub fn buffer() -> Self {
        StackObserver::Buffer(BufferObserver::new())
    }

    /// A fresh `tracing` observer with no callable names.
    pub fn tracing() -> Self {
        StackObserver::Tracing(TracingObserver::new())
    }

    /// Give `callable` a name for trace lines. Only the tracing observer
    /// uses names; the others ignore this.
    pub fn name_callable(&mut self, callable: FnId, name: &'static str) {
        if let Self::Tracing(observer) = self {
            observer.name(callable, name);
        }
    }

    pub fn notify(&mut self, event: StackEvent) {
        match self {
            Self::Silent => {}
            Self::Tracing(observer) => observer.emit(event),
            Self::Buffer(buffer) => buffer.record(event),
        }
    }

    /// Recorded events; empty for observers that don't record.
    pub fn events(&self) -> &[StackEvent] {
        match self {
            Self::Buffer(buffer) => buffer.events(),
            Self::Silent | Self::Tracing(_) => &[],
        }
    }

    /// Drop recorded events. No-op for observers that don't record.
    pub fn clear(&mut self) {
        if let Self::Buffer(buffer) = self {
            buffer.clear();
        }
    }
}
