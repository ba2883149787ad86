//! # Core Type Definitions
//!
//! This module contains the plain value types shared by every part of the engine:
//! - Slot identity (`SlotId`, `SlotKind`, `SlotRef`)
//! - Storage addressing (`Address`)
//! - Precedence ranks (`Prec`)
//! - Error types (`TesseraError`)
//!
//! ## Determinism Guarantees
//!
//! All identity types:
//! - Are plain integers under the hood
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Compare by identity only, never by the values they address

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// SLOT IDENTIFIERS
// =============================================================================

/// Unique numeric identifier handed out to every declared facet and field.
///
/// Ids come from the process-wide [`IdRegistry`](crate::ids::IdRegistry) and are
/// strictly increasing in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(pub u64);

impl SlotId {
    /// Get the raw id value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// What kind of declaration a slot id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    /// A combining configuration channel.
    Facet,
    /// A piece of state with a create/update lifecycle.
    Field,
}

/// Opaque identity of a facet or a field, used as the dependency graph key.
///
/// Ordering is by id first, so a `BTreeMap<SlotRef, _>` iterates in
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    /// The unique id.
    pub id: SlotId,
    /// Facet or field.
    pub kind: SlotKind,
}

impl SlotRef {
    /// Create a slot reference.
    #[must_use]
    pub const fn new(id: SlotId, kind: SlotKind) -> Self {
        Self { id, kind }
    }

    /// Whether this slot names a facet.
    #[must_use]
    pub const fn is_facet(self) -> bool {
        matches!(self.kind, SlotKind::Facet)
    }

    /// Whether this slot names a field.
    #[must_use]
    pub const fn is_field(self) -> bool {
        matches!(self.kind, SlotKind::Field)
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SlotKind::Facet => write!(f, "facet#{}", self.id.0),
            SlotKind::Field => write!(f, "field#{}", self.id.0),
        }
    }
}

// =============================================================================
// ADDRESS
// =============================================================================

/// Storage address of a resolved slot.
///
/// Static slots live once in the owning configuration; dynamic slots live in
/// every state built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "storage", content = "index", rename_all = "lowercase")]
pub enum Address {
    /// Index into the configuration's shared static values.
    Static(usize),
    /// Index into a state's per-instance values.
    Dynamic(usize),
}

impl Address {
    /// Whether the slot is stored in the configuration.
    #[must_use]
    pub const fn is_static(self) -> bool {
        matches!(self, Self::Static(_))
    }
}

// =============================================================================
// PRECEDENCE
// =============================================================================

/// Precedence rank of a sub-tree of extensions.
///
/// Variants are declared from highest to lowest priority, so the derived
/// `Ord` puts `Override` first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Prec {
    /// Highest rank.
    Override,
    /// Above the default rank.
    Extend,
    /// Rank of anything not explicitly wrapped.
    #[default]
    Default,
    /// Lowest rank.
    Fallback,
}

impl Prec {
    /// All ranks, highest first.
    pub const ALL: [Prec; 4] = [Prec::Override, Prec::Extend, Prec::Default, Prec::Fallback];

    /// Bucket index used while flattening (0 = highest).
    #[must_use]
    pub const fn rank(self) -> usize {
        match self {
            Self::Override => 0,
            Self::Extend => 1,
            Self::Default => 2,
            Self::Fallback => 3,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while declaring or resolving a configuration.
///
/// - Every variant is raised at resolution time (or derivation time), never
///   while a state is being updated
/// - A failed resolution produces no configuration and therefore no state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TesseraError {
    /// A dependency chain revisited a slot that was still being resolved.
    #[error("Cyclic dependency in facets and fields: {}", display_cycle(.cycle))]
    CyclicDependency {
        /// The slots forming the cycle, closing slot repeated at the end.
        cycle: Vec<SlotRef>,
    },

    /// A slot declared a dependency on a field missing from the extension tree.
    #[error("Dependency on unavailable field {field} (required by {dependent})")]
    UnavailableFieldDependency {
        /// The missing field.
        field: SlotRef,
        /// The slot that declared the dependency.
        dependent: SlotRef,
    },

    /// A dependency-based contribution was attached to a static facet.
    #[error("Can't derive static facet {facet}")]
    StaticDerivation {
        /// The static facet.
        facet: SlotRef,
    },
}

fn display_cycle(cycle: &[SlotRef]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn slot_refs_order_by_id() {
        let mut set = BTreeSet::new();
        set.insert(SlotRef::new(SlotId(7), SlotKind::Field));
        set.insert(SlotRef::new(SlotId(2), SlotKind::Facet));
        set.insert(SlotRef::new(SlotId(5), SlotKind::Facet));

        let ids: Vec<_> = set.iter().map(|s| s.id.value()).collect();
        assert_eq!(ids, vec![2, 5, 7]);
    }

    #[test]
    fn prec_orders_override_first() {
        let mut ranks = vec![Prec::Fallback, Prec::Default, Prec::Override, Prec::Extend];
        ranks.sort();
        assert_eq!(ranks, Prec::ALL.to_vec());
        assert_eq!(Prec::default(), Prec::Default);
        assert_eq!(Prec::Fallback.rank(), 3);
    }

    #[test]
    fn cycle_error_names_every_slot() {
        let a = SlotRef::new(SlotId(1), SlotKind::Facet);
        let b = SlotRef::new(SlotId(2), SlotKind::Field);
        let err = TesseraError::CyclicDependency {
            cycle: vec![a, b, a],
        };
        assert_eq!(
            err.to_string(),
            "Cyclic dependency in facets and fields: facet#1 -> field#2 -> facet#1"
        );
    }

    #[test]
    fn address_reports_storage() {
        assert!(Address::Static(0).is_static());
        assert!(!Address::Dynamic(3).is_static());
    }
}
