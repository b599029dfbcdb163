//! Runtime configuration.
//!
//! Debug output is controlled by the `SERENE_DEBUG` environment variable,
//! a comma-separated list of flags:
//! - `stack` - Report every call stack push/pop through `tracing`
//! - `traceback` - Log the rendered traceback of every failed native call
//! - `all` - Enable all debug output
//!
//! Example: `SERENE_DEBUG=stack RUST_LOG=serene_eval=debug cargo test`

use std::sync::OnceLock;

/// Environment variable holding the debug flags.
pub const DEBUG_ENV_VAR: &str = "SERENE_DEBUG";

/// Debug flags for controlling runtime debug output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebugFlags(u32);

impl DebugFlags {
    /// No debug flags.
    pub const NONE: Self = Self(0);
    /// Report call stack pushes and pops.
    pub const STACK: Self = Self(0b01);
    /// Log tracebacks of failed calls.
    pub const TRACEBACK: Self = Self(0b10);
    /// All debug flags.
    pub const ALL: Self = Self(Self::STACK.0 | Self::TRACEBACK.0);

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Check if flags contain another flag.
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Parse debug flags from a comma-separated string.
    ///
    /// Unknown flags are ignored.
    pub fn parse(s: &str) -> Self {
        s.split(',')
            .map(|part| match part.trim().to_lowercase().as_str() {
                "stack" => Self::STACK,
                "traceback" => Self::TRACEBACK,
                "all" => Self::ALL,
                _ => Self::NONE,
            })
            .fold(Self::NONE, Self::union)
    }

    /// Flags from `SERENE_DEBUG`, read once per process.
    pub fn from_env() -> Self {
        static FLAGS: OnceLock<DebugFlags> = OnceLock::new();
        *FLAGS.get_or_init(|| {
            std::env::var(DEBUG_ENV_VAR)
                .ok()
                .map(|s| DebugFlags::parse(&s))
                .unwrap_or_default()
        })
    }
}

/// Settings fixed when a [`Runtime`](crate::Runtime) is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeConfig {
    pub debug: DebugFlags,
}

impl RuntimeConfig {
    /// Configuration taken from the environment.
    pub fn from_env() -> Self {
        RuntimeConfig {
            debug: DebugFlags::from_env(),
        }
    }

    #[must_use]
    pub fn with_stack_diagnostics(mut self, enabled: bool) -> Self {
        self.debug = if enabled {
            self.debug.union(DebugFlags::STACK)
        } else {
            self.debug.difference(DebugFlags::STACK)
        };
        self
    }

    pub fn stack_diagnostics(&self) -> bool {
        self.debug.contains(DebugFlags::STACK)
    }

    pub fn log_tracebacks(&self) -> bool {
        self.debug.contains(DebugFlags::TRACEBACK)
    }
}
