//! # Identity Registry
//!
//! Hands out slot ids to facets and fields at declaration time.
//!
//! There is exactly one registry per process. It is a plain atomic counter,
//! initialized at compile time and never reset, so ids stay unique and stable
//! for the lifetime of the process no matter which thread declares a slot.

use crate::types::{SlotId, SlotKind, SlotRef};
use std::sync::atomic::{AtomicU64, Ordering};

static GLOBAL: IdRegistry = IdRegistry::new();

/// Monotonic id source shared by every facet and field declaration.
#[derive(Debug)]
pub struct IdRegistry {
    next: AtomicU64,
}

impl IdRegistry {
    const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// The process-wide registry.
    #[must_use]
    pub fn global() -> &'static IdRegistry {
        &GLOBAL
    }

    /// Allocate the next id for a slot of the given kind.
    pub fn allocate(&self, kind: SlotKind) -> SlotRef {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        SlotRef::new(SlotId(id), kind)
    }

    /// Number of ids handed out so far.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}
