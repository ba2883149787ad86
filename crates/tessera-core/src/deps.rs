//! # Dependency Views
//!
//! Read access to resolved slot values from inside provider and field
//! callbacks.
//!
//! A [`DepView`] is built on the stack right before a single slot is
//! evaluated and borrows the storage of the state under construction. Its
//! lifetime ends when the callback returns, so it cannot be retained or read
//! outside the evaluation that produced it.

use crate::types::{Address, SlotRef};
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Type-erased slot value as stored by configurations and states.
pub(crate) type Value = Arc<dyn Any + Send + Sync>;

// =============================================================================
// SLOT TRAIT
// =============================================================================

/// A typed handle to a facet or a field.
pub trait Slot {
    /// The resolved value type.
    type Value: Any + Send + Sync;

    /// Identity of the slot.
    fn slot_ref(&self) -> SlotRef;

    /// Value reported when the slot has no address in a configuration.
    ///
    /// Facets report their default output; fields have none.
    fn absent(&self) -> Option<&Self::Value>;
}

// =============================================================================
// SLOT STORAGE
// =============================================================================

/// Borrowed view of where slot values live while a state is being built.
///
/// `dynamics` and `changed` hold only the slots computed so far, which is
/// every slot ordered before the one being evaluated.
#[derive(Clone, Copy)]
pub(crate) struct Slots<'a> {
    pub(crate) addresses: &'a BTreeMap<SlotRef, Address>,
    pub(crate) statics: &'a [Value],
    pub(crate) dynamics: &'a [Value],
    pub(crate) changed: &'a [bool],
}

impl<'a> Slots<'a> {
    pub(crate) fn value(&self, slot: SlotRef) -> Option<&'a Value> {
        match self.addresses.get(&slot)? {
            Address::Static(i) => self.statics.get(*i),
            Address::Dynamic(i) => self.dynamics.get(*i),
        }
    }

    pub(crate) fn changed(&self, slot: SlotRef) -> bool {
        match self.addresses.get(&slot) {
            Some(Address::Dynamic(i)) => self.changed.get(*i).copied().unwrap_or(false),
            _ => false,
        }
    }

    pub(crate) fn typed<T: Any>(&self, slot: SlotRef) -> Option<&'a T> {
        self.value(slot).and_then(|v| v.downcast_ref::<T>())
    }
}

// =============================================================================
// DEPENDENCY VIEW
// =============================================================================

/// Read-only accessor handed to `derive`, `derive_n` and field callbacks.
///
/// Only slots listed in the callback's declared dependencies are guaranteed
/// to be computed before the callback runs.
pub struct DepView<'a> {
    slots: Slots<'a>,
    declared: &'a [SlotRef],
}

impl<'a> DepView<'a> {
    pub(crate) fn new(slots: Slots<'a>, declared: &'a [SlotRef]) -> Self {
        Self { slots, declared }
    }

    /// Whether `slot` is one of the declared dependencies.
    #[must_use]
    pub fn is_declared(&self, slot: SlotRef) -> bool {
        self.declared.contains(&slot)
    }

    /// The declared dependencies, in declaration order.
    #[must_use]
    pub fn declared(&self) -> &[SlotRef] {
        self.declared
    }

    /// Current value of a slot, falling back to its absent value.
    ///
    /// Reads are not checked against the declared dependencies; a slot that
    /// was not declared may not be computed yet and then reads as absent.
    pub fn get<'s, S: Slot>(&'s self, slot: &'s S) -> Option<&'s S::Value> {
        self.slots
            .typed::<S::Value>(slot.slot_ref())
            .or_else(|| slot.absent())
    }

    /// Current output of a facet (its default when the facet is not configured).
    pub fn facet<'s, I, O>(&'s self, facet: &'s crate::Facet<I, O>) -> &'s O
    where
        I: Send + Sync + 'static,
        O: Send + Sync + 'static,
    {
        self.slots
            .typed::<O>(facet.slot_ref())
            .unwrap_or_else(|| facet.default_value())
    }

    /// Current value of a field.
    ///
    /// Always `Some` for a declared dependency: resolution rejects trees where
    /// a declared field is missing and orders it before the reader.
    pub fn field<'s, V>(&'s self, field: &'s crate::Field<V>) -> Option<&'s V>
    where
        V: Send + Sync + 'static,
    {
        self.slots.typed::<V>(field.slot_ref())
    }

    /// Whether a dependency changed during the current update pass.
    ///
    /// Always `false` for static and unconfigured slots.
    pub fn changed<S: Slot>(&self, slot: &S) -> bool {
        self.slots.changed(slot.slot_ref())
    }
}

// =============================================================================
// TESTS
// =============================================================================
