//! Callable identity.
//!
//! Every callable (native builtin or user function) receives a `FnId` when
//! it is created. The call stack compares callables by this id only.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Stable identity of a callable.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct FnId(u32);

impl FnId {
    /// Sentinel for "no callable".
    pub const INVALID: FnId = FnId(u32::MAX);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        FnId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Debug for FnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "FnId({})", self.0)
        } else {
            write!(f, "FnId::INVALID")
        }
    }
}

impl fmt::Display for FnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn#{}", self.0)
    }
}

impl Default for FnId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Hands out fresh [`FnId`]s.
///
/// Thread-safe; ids are unique per allocator and never equal
/// [`FnId::INVALID`].
#[derive(Debug, Default)]
pub struct FnIdAllocator {
    next: AtomicU32,
}

impl FnIdAllocator {
    pub const fn new() -> Self {
        FnIdAllocator {
            next: AtomicU32::new(0),
        }
    }

    /// Allocate the next id, or `None` once the id space is exhausted.
    pub fn try_fresh(&self) -> Option<FnId> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                (n < u32::MAX).then(|| n + 1)
            })
            .ok()
            .map(FnId)
    }

    /// Allocate the next id.
    ///
    /// # Panics
    /// Panics after `u32::MAX` allocations.
    pub fn fresh(&self) -> FnId {
        self.try_fresh()
            .unwrap_or_else(|| panic!("callable id space exhausted"))
    }
}
