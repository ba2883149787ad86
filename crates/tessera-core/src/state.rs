//! # States
//!
//! An immutable snapshot: a document, a selection and the value of every
//! dynamic slot of one configuration, plus a change bit per slot recording
//! whether the value differs from the previous state. Static values are read
//! through the configuration the state was built from.

use crate::config::Configuration;
use crate::deps::{Slot, Value};
use crate::text::{Selection, Text};
use crate::types::{Address, SlotRef};
use crate::Facet;
use std::fmt;

/// An immutable snapshot of document, selection and slot values.
#[derive(Clone)]
pub struct State {
    config: Configuration,
    doc: Text,
    selection: Selection,
    values: Vec<Value>,
    changed: Vec<bool>,
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("doc_len", &self.doc.len())
            .field("selection", &self.selection)
            .field("slots", &self.values.len())
            .field("changed", &self.changed.iter().filter(|c| **c).count())
            .finish()
    }
}

impl State {
    pub(crate) fn new(
        config: Configuration,
        doc: Text,
        selection: Selection,
        values: Vec<Value>,
        changed: Vec<bool>,
    ) -> Self {
        Self {
            config,
            doc,
            selection,
            values,
            changed,
        }
    }

    /// The configuration this state was built from.
    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    #[must_use]
    pub fn doc(&self) -> &Text {
        &self.doc
    }

    #[must_use]
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Value of a facet or field.
    ///
    /// Unconfigured facets read as their default; unconfigured fields as
    /// `None`.
    pub fn get<'s, S: Slot>(&'s self, slot: &'s S) -> Option<&'s S::Value> {
        self.value_of(slot.slot_ref())
            .and_then(|v| v.downcast_ref::<S::Value>())
            .or_else(|| slot.absent())
    }

    /// Output of a facet, or its default when no extension contributes to it.
    pub fn facet<'s, I, O>(&'s self, facet: &'s Facet<I, O>) -> &'s O
    where
        I: Send + Sync + 'static,
        O: Send + Sync + 'static,
    {
        self.value_of(facet.slot_ref())
            .and_then(|v| v.downcast_ref::<O>())
            .unwrap_or_else(|| facet.default_value())
    }

    /// Value of a field, or `None` when the field is not configured.
    pub fn field<V: Send + Sync + 'static>(&self, field: &crate::Field<V>) -> Option<&V> {
        self.value_of(field.slot_ref())
            .and_then(|v| v.downcast_ref::<V>())
    }

    /// Whether the slot's value changed in the step that produced this state.
    ///
    /// Static and unconfigured slots never change.
    pub fn has_changed<S: Slot>(&self, slot: &S) -> bool {
        match self.config.address_of(slot.slot_ref()) {
            Some(Address::Dynamic(i)) => self.changed.get(i).copied().unwrap_or(false),
            _ => false,
        }
    }

    /// Slots whose value changed in the step that produced this state, in
    /// evaluation order.
    pub fn changed_slots(&self) -> impl Iterator<Item = SlotRef> + '_ {
        self.config
            .dynamic_slots()
            .zip(self.changed.iter().copied())
            .filter_map(|(slot, changed)| changed.then_some(slot))
    }

    pub(crate) fn value_of(&self, slot: SlotRef) -> Option<&Value> {
        let inner = self.config.inner();
        match inner.addresses.get(&slot)? {
            Address::Static(i) => inner.static_values.get(*i),
            Address::Dynamic(i) => self.values.get(*i),
        }
    }

    pub(crate) fn dynamic_value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

// =============================================================================
// TESTS
// =============================================================================
