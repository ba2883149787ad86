//! # Extensions
//!
//! The declarative tree a caller hands to
//! [`Configuration::resolve`](crate::Configuration::resolve): provider and
//! field leaves, composed by plain nesting and by the four precedence
//! wrappers in [`prec`].
//!
//! ## Flattening
//!
//! The tree is walked depth-first carrying the current rank (starting at
//! `Prec::Default`). Each leaf lands in its rank's bucket in traversal order,
//! and the buckets are concatenated from `Override` down to `Fallback`. That
//! concatenation is the order in which facet inputs reach `combine`.

use crate::facet::ErasedProvider;
use crate::field::ErasedField;
use crate::types::{Prec, SlotRef};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// LEAVES
// =============================================================================

/// One contribution to a facet, built by `of`, `derive` or `derive_n`.
#[derive(Clone)]
pub struct Provider(Arc<dyn ErasedProvider>);

impl Provider {
    pub(crate) fn new(inner: Arc<dyn ErasedProvider>) -> Self {
        Self(inner)
    }

    /// The facet this provider contributes to.
    #[must_use]
    pub fn facet(&self) -> SlotRef {
        self.0.facet().slot()
    }

    /// The slots this provider reads.
    #[must_use]
    pub fn deps(&self) -> &[SlotRef] {
        self.0.deps()
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("facet", &self.facet())
            .field("deps", &self.deps())
            .finish()
    }
}

/// A field placed in the extension tree.
#[derive(Clone)]
pub struct FieldEntry(Arc<dyn ErasedField>);

impl FieldEntry {
    pub(crate) fn new(inner: Arc<dyn ErasedField>) -> Self {
        Self(inner)
    }

    /// The field's identity.
    #[must_use]
    pub fn slot(&self) -> SlotRef {
        self.0.slot()
    }
}

impl fmt::Debug for FieldEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldEntry").field(&self.slot()).finish()
    }
}

// =============================================================================
// EXTENSION TREE
// =============================================================================

/// A node of the extension tree.
#[derive(Debug, Clone)]
pub enum Extension {
    /// A facet contribution.
    Provider(Provider),
    /// A field.
    Field(FieldEntry),
    /// An ordered sequence of extensions.
    Group(Vec<Extension>),
    /// A sub-tree with its own precedence rank.
    Prec(Prec, Box<Extension>),
}

impl Extension {
    /// An ordered group.
    pub fn group(items: impl IntoIterator<Item = Extension>) -> Self {
        Self::Group(items.into_iter().collect())
    }

    /// An empty group. Contributes nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::Group(Vec::new())
    }

    /// Wrap this sub-tree in a precedence rank.
    #[must_use]
    pub fn with_prec(self, prec: Prec) -> Self {
        Self::Prec(prec, Box::new(self))
    }
}

impl From<Vec<Extension>> for Extension {
    fn from(items: Vec<Extension>) -> Self {
        Self::Group(items)
    }
}

impl<const N: usize> From<[Extension; N]> for Extension {
    fn from(items: [Extension; N]) -> Self {
        Self::Group(items.into())
    }
}

// =============================================================================
// PRECEDENCE WRAPPERS
// =============================================================================

/// Precedence wrappers, highest rank first.
pub mod prec {
    use super::Extension;
    use crate::types::Prec;

    /// Rank above everything else.
    pub fn overriding(ext: impl Into<Extension>) -> Extension {
        ext.into().with_prec(Prec::Override)
    }

    /// Rank above unwrapped extensions.
    pub fn extend(ext: impl Into<Extension>) -> Extension {
        ext.into().with_prec(Prec::Extend)
    }

    /// The rank unwrapped extensions already have; resets an outer wrapper.
    pub fn default(ext: impl Into<Extension>) -> Extension {
        ext.into().with_prec(Prec::Default)
    }

    /// Rank below everything else.
    pub fn fallback(ext: impl Into<Extension>) -> Extension {
        ext.into().with_prec(Prec::Fallback)
    }
}

// =============================================================================
// FLATTENING
// =============================================================================

/// A leaf of the flattened tree.
pub(crate) enum Leaf {
    Provider(Arc<dyn ErasedProvider>),
    Field(Arc<dyn ErasedField>),
}

/// Flatten the tree into precedence order.
pub(crate) fn flatten(ext: &Extension) -> Vec<Leaf> {
    let mut buckets: [Vec<Leaf>; 4] = Default::default();
    collect(ext, Prec::Default, &mut buckets);
    buckets.into_iter().flatten().collect()
}

fn collect(ext: &Extension, prec: Prec, buckets: &mut [Vec<Leaf>; 4]) {
    match ext {
        Extension::Provider(p) => buckets[prec.rank()].push(Leaf::Provider(Arc::clone(&p.0))),
        Extension::Field(f) => buckets[prec.rank()].push(Leaf::Field(Arc::clone(&f.0))),
        Extension::Group(items) => {
            for item in items {
                collect(item, prec, buckets);
            }
        }
        Extension::Prec(inner_prec, inner) => collect(inner, *inner_prec, buckets),
    }
}

/// Remove repeated slots, keeping the first occurrence.
pub(crate) fn unique(slots: Vec<SlotRef>) -> Vec<SlotRef> {
    let mut out: Vec<SlotRef> = Vec::with_capacity(slots.len());
    for slot in slots {
        if !out.contains(&slot) {
            out.push(slot);
        }
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================
