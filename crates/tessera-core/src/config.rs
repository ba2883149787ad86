//! # Configuration
//!
//! The immutable result of resolving an extension tree. A configuration owns
//! the evaluation order of dynamic slots, the address of every resolved slot
//! and the shared static values; it builds the first [`State`] with
//! [`init`](Configuration::init) and every following one with
//! [`update`](Configuration::update).
//!
//! Cloning a configuration clones a handle. States keep one, so any number of
//! states share the same static values.

use crate::deps::{Slot, Slots, Value};
use crate::extension::Extension;
use crate::resolver::{self, ResolvedSlot};
use crate::state::State;
use crate::text::{Selection, Text};
use crate::transaction::Transaction;
use crate::types::{Address, SlotRef, TesseraError};
use crate::Facet;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub(crate) struct ConfigInner {
    pub(crate) dynamic_slots: Vec<ResolvedSlot>,
    pub(crate) addresses: BTreeMap<SlotRef, Address>,
    pub(crate) static_values: Vec<Value>,
}

impl ConfigInner {
    pub(crate) fn slots<'a>(&'a self, dynamics: &'a [Value], changed: &'a [bool]) -> Slots<'a> {
        Slots {
            addresses: &self.addresses,
            statics: &self.static_values,
            dynamics,
            changed,
        }
    }
}

/// A resolved, immutable set of facets and fields.
#[derive(Clone)]
pub struct Configuration {
    inner: Arc<ConfigInner>,
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("dynamic_slots", &self.inner.dynamic_slots.len())
            .field("static_slots", &self.inner.static_values.len())
            .finish()
    }
}

impl Configuration {
    /// Resolve an extension tree.
    ///
    /// Fails, producing nothing, on a dependency cycle, on a dependency to a
    /// field missing from the tree, or on a derived contribution to a static
    /// facet.
    pub fn resolve(extension: &Extension) -> Result<Self, TesseraError> {
        let resolved = resolver::resolve(extension)?;
        Ok(Self {
            inner: Arc::new(ConfigInner {
                dynamic_slots: resolved.dynamic_slots,
                addresses: resolved.addresses,
                static_values: resolved.static_values,
            }),
        })
    }

    pub(crate) fn inner(&self) -> &ConfigInner {
        &self.inner
    }

    /// Whether two handles refer to the same configuration.
    #[must_use]
    pub fn ptr_eq(&self, other: &Configuration) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Address of a slot, or `None` if the slot is not configured.
    #[must_use]
    pub fn address_of(&self, slot: SlotRef) -> Option<Address> {
        self.inner.addresses.get(&slot).copied()
    }

    /// Dynamic slots in evaluation order.
    pub fn dynamic_slots(&self) -> impl Iterator<Item = SlotRef> + '_ {
        self.inner.dynamic_slots.iter().map(ResolvedSlot::slot)
    }

    /// Every configured slot with its address, ordered by slot id.
    pub fn addresses(&self) -> impl Iterator<Item = (SlotRef, Address)> + '_ {
        self.inner.addresses.iter().map(|(slot, addr)| (*slot, *addr))
    }

    /// Number of per-state slots.
    #[must_use]
    pub fn dynamic_len(&self) -> usize {
        self.inner.dynamic_slots.len()
    }

    /// Number of shared static slots.
    #[must_use]
    pub fn static_len(&self) -> usize {
        self.inner.static_values.len()
    }

    /// Value of a facet that is static in this configuration.
    ///
    /// Returns the facet's default when the facet has no static address.
    pub fn static_facet<'s, I, O>(&'s self, facet: &'s Facet<I, O>) -> &'s O
    where
        I: Send + Sync + 'static,
        O: Send + Sync + 'static,
    {
        match self.address_of(facet.slot_ref()) {
            Some(Address::Static(i)) => self
                .inner
                .static_values
                .get(i)
                .and_then(|v| v.downcast_ref::<O>())
                .unwrap_or_else(|| facet.default_value()),
            _ => facet.default_value(),
        }
    }

    // =========================================================================
    // STATE CONSTRUCTION
    // =========================================================================

    /// Build a state from scratch.
    ///
    /// With a `previous` state (reconfiguration), fields that were configured
    /// there keep their previous value instead of being created again. Every
    /// slot of a fresh state counts as changed.
    pub fn init(&self, doc: Text, selection: Selection, previous: Option<&State>) -> State {
        let inner = &self.inner;
        let len = inner.dynamic_slots.len();
        let mut values: Vec<Value> = Vec::with_capacity(len);
        let changed = vec![true; len];

        for slot in &inner.dynamic_slots {
            let value = {
                let slots = inner.slots(&values, &changed);
                match slot {
                    ResolvedSlot::Field(field) => {
                        match previous.and_then(|prev| prev.value_of(field.slot())) {
                            Some(carried) => Arc::clone(carried),
                            None => field.create(&doc, selection, slots),
                        }
                    }
                    ResolvedSlot::Facet(instance) => instance.compute(slots),
                }
            };
            values.push(value);
        }

        tracing::trace!(slots = len, reconfigured = previous.is_some(), "state initialized");
        State::new(self.clone(), doc, selection, values, changed)
    }

    /// Build the state that follows `previous` after `tr`.
    ///
    /// Fields are always updated; a facet is recomputed only when one of its
    /// dependencies changed. A slot whose new value compares equal to the old
    /// one keeps the old value and is not marked changed. Static values are
    /// never touched.
    ///
    /// `previous` may come from another configuration: values are then looked
    /// up by slot, slots it does not have are created or computed from
    /// scratch, and facets are always recomputed.
    pub fn update(&self, previous: &State, tr: &Transaction) -> State {
        let inner = &self.inner;
        let len = inner.dynamic_slots.len();
        let same_config = previous.config().ptr_eq(self);
        let mut values: Vec<Value> = Vec::with_capacity(len);
        let mut changed: Vec<bool> = Vec::with_capacity(len);

        for (index, slot) in inner.dynamic_slots.iter().enumerate() {
            let old = if same_config {
                previous.dynamic_value(index)
            } else {
                previous.value_of(slot.slot())
            };

            let (value, did_change) = {
                let slots = inner.slots(&values, &changed);
                match (slot, old) {
                    (ResolvedSlot::Field(field), Some(old)) => {
                        let new = field.update(old, tr, slots);
                        if field.same(old, &new) {
                            (Arc::clone(old), false)
                        } else {
                            (new, true)
                        }
                    }
                    (ResolvedSlot::Field(field), None) => {
                        (field.create(tr.doc(), tr.selection(), slots), true)
                    }
                    (ResolvedSlot::Facet(instance), Some(old)) => {
                        let stale = !same_config || instance.deps.iter().any(|d| slots.changed(*d));
                        if !stale {
                            (Arc::clone(old), false)
                        } else {
                            let new = instance.compute(slots);
                            if instance.facet.same(old, &new) {
                                (Arc::clone(old), false)
                            } else {
                                (new, true)
                            }
                        }
                    }
                    (ResolvedSlot::Facet(instance), None) => (instance.compute(slots), true),
                }
            };
            values.push(value);
            changed.push(did_change);
        }

        tracing::trace!(
            slots = len,
            changed = changed.iter().filter(|c| **c).count(),
            "state updated"
        );
        State::new(
            self.clone(),
            tr.doc().clone(),
            tr.selection(),
            values,
            changed,
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
