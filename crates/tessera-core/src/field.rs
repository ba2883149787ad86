//! # Fields
//!
//! A field is a piece of state with an explicit lifecycle: `create` builds the
//! value when a state is initialized, `update` derives the next value from the
//! previous one and a transaction. When `compare` reports the two values as
//! equal the previous value is kept, allocation included.
//!
//! Fields that read facets or other fields must declare those dependencies
//! through [`Field::define_deps`] so they are evaluated in the right order.

use crate::deps::{DepView, Slot, Slots, Value};
use crate::extension::{Extension, FieldEntry};
use crate::ids::IdRegistry;
use crate::text::{Selection, Text};
use crate::transaction::Transaction;
use crate::types::{SlotKind, SlotRef};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type CreateFn<V> = Box<dyn Fn(&Text, Selection, &DepView<'_>) -> V + Send + Sync>;
type UpdateFn<V> = Box<dyn Fn(&V, &Transaction, &DepView<'_>) -> V + Send + Sync>;
type CompareFn<V> = Box<dyn Fn(&V, &V) -> bool + Send + Sync>;

// =============================================================================
// FIELD SPEC
// =============================================================================

/// Lifecycle callbacks of a [`Field`].
pub struct FieldSpec<V> {
    create: CreateFn<V>,
    update: UpdateFn<V>,
    compare: CompareFn<V>,
}

impl<V> FieldSpec<V>
where
    V: PartialEq + Send + Sync + 'static,
{
    /// Callbacks with value equality as the comparison.
    pub fn new<C, U>(create: C, update: U) -> Self
    where
        C: Fn(&Text, Selection, &DepView<'_>) -> V + Send + Sync + 'static,
        U: Fn(&V, &Transaction, &DepView<'_>) -> V + Send + Sync + 'static,
    {
        Self::with_compare(create, update, |a: &V, b: &V| a == b)
    }
}

impl<V> FieldSpec<V>
where
    V: Send + Sync + 'static,
{
    /// Callbacks with an explicit comparison.
    pub fn with_compare<C, U, K>(create: C, update: U, compare: K) -> Self
    where
        C: Fn(&Text, Selection, &DepView<'_>) -> V + Send + Sync + 'static,
        U: Fn(&V, &Transaction, &DepView<'_>) -> V + Send + Sync + 'static,
        K: Fn(&V, &V) -> bool + Send + Sync + 'static,
    {
        Self {
            create: Box::new(create),
            update: Box::new(update),
            compare: Box::new(compare),
        }
    }

    /// Replace the comparison.
    #[must_use]
    pub fn compare(mut self, compare: impl Fn(&V, &V) -> bool + Send + Sync + 'static) -> Self {
        self.compare = Box::new(compare);
        self
    }
}

// =============================================================================
// FIELD
// =============================================================================

pub(crate) struct FieldInner<V> {
    slot: SlotRef,
    deps: Vec<SlotRef>,
    create: CreateFn<V>,
    update: UpdateFn<V>,
    compare: CompareFn<V>,
}

/// A typed piece of state kept in sync across transactions.
pub struct Field<V> {
    inner: Arc<FieldInner<V>>,
}

impl<V> Clone for Field<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for Field<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("slot", &self.inner.slot)
            .field("deps", &self.inner.deps)
            .finish()
    }
}

/// Dependencies collected by [`Field::define_deps`], waiting for callbacks.
pub struct FieldDeps<V> {
    deps: Vec<SlotRef>,
    _value: PhantomData<fn() -> V>,
}

impl<V: Send + Sync + 'static> FieldDeps<V> {
    /// Declare the field.
    pub fn define(self, spec: FieldSpec<V>) -> Field<V> {
        Field::declare(self.deps, spec)
    }
}

impl<V: Send + Sync + 'static> Field<V> {
    /// Declare a field without dependencies.
    pub fn define(spec: FieldSpec<V>) -> Self {
        Self::declare(Vec::new(), spec)
    }

    /// Start declaring a field that reads the given facets or fields.
    pub fn define_deps(deps: impl IntoIterator<Item = SlotRef>) -> FieldDeps<V> {
        FieldDeps {
            deps: crate::extension::unique(deps.into_iter().collect()),
            _value: PhantomData,
        }
    }

    fn declare(deps: Vec<SlotRef>, spec: FieldSpec<V>) -> Self {
        let slot = IdRegistry::global().allocate(SlotKind::Field);
        Self {
            inner: Arc::new(FieldInner {
                slot,
                deps,
                create: spec.create,
                update: spec.update,
                compare: spec.compare,
            }),
        }
    }

    /// The declared dependencies.
    #[must_use]
    pub fn deps(&self) -> &[SlotRef] {
        &self.inner.deps
    }

    /// This field as an extension leaf.
    #[must_use]
    pub fn extension(&self) -> Extension {
        let erased: Arc<dyn ErasedField> = self.inner.clone();
        Extension::Field(FieldEntry::new(erased))
    }
}

impl<V: Send + Sync + 'static> Slot for Field<V> {
    type Value = V;

    fn slot_ref(&self) -> SlotRef {
        self.inner.slot
    }

    fn absent(&self) -> Option<&V> {
        None
    }
}

impl<V: Send + Sync + 'static> From<Field<V>> for Extension {
    fn from(field: Field<V>) -> Self {
        field.extension()
    }
}

impl<V: Send + Sync + 'static> From<&Field<V>> for Extension {
    fn from(field: &Field<V>) -> Self {
        field.extension()
    }
}

// =============================================================================
// TYPE-ERASED FIELDS
// =============================================================================

/// Field operations the resolver and states run without knowing `V`.
pub(crate) trait ErasedField: Send + Sync {
    fn slot(&self) -> SlotRef;
    fn deps(&self) -> &[SlotRef];
    fn create(&self, doc: &Text, selection: Selection, slots: Slots<'_>) -> Value;
    /// Next value from `old`; falls back to `create` if `old` has another type.
    fn update(&self, old: &Value, tr: &Transaction, slots: Slots<'_>) -> Value;
    fn same(&self, a: &Value, b: &Value) -> bool;
}

impl<V: Send + Sync + 'static> ErasedField for FieldInner<V> {
    fn slot(&self) -> SlotRef {
        self.slot
    }

    fn deps(&self) -> &[SlotRef] {
        &self.deps
    }

    fn create(&self, doc: &Text, selection: Selection, slots: Slots<'_>) -> Value {
        let view = DepView::new(slots, &self.deps);
        Arc::new((self.create)(doc, selection, &view))
    }

    fn update(&self, old: &Value, tr: &Transaction, slots: Slots<'_>) -> Value {
        match old.downcast_ref::<V>() {
            Some(old) => {
                let view = DepView::new(slots, &self.deps);
                Arc::new((self.update)(old, tr, &view))
            }
            None => self.create(tr.doc(), tr.selection(), slots),
        }
    }

    fn same(&self, a: &Value, b: &Value) -> bool {
        if Arc::ptr_eq(a, b) {
            return true;
        }
        match (a.downcast_ref::<V>(), b.downcast_ref::<V>()) {
            (Some(a), Some(b)) => (self.compare)(a, b),
            _ => false,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Facet, FacetSpec};

    fn counter() -> Field<u32> {
        Field::define(FieldSpec::new(|_, _, _| 0, |v, _, _| v + 1))
    }

    #[test]
    fn define_allocates_field_ids() {
        let a = counter();
        let b = counter();
        assert!(a.slot_ref().is_field());
        assert!(b.slot_ref().id > a.slot_ref().id);
        assert!(a.absent().is_none());
    }

    #[test]
    fn define_deps_records_unique_dependencies() {
        let facet: Facet<u32> = Facet::define(FacetSpec::default());
        let field = Field::define_deps([facet.slot_ref(), facet.slot_ref()])
            .define(FieldSpec::new(|_, _, _| 1_u8, |v, _, _| *v));
        assert_eq!(field.deps(), &[facet.slot_ref()]);
    }

    #[test]
    fn default_comparison_is_value_equality() {
        let field = counter();
        let a: Value = Arc::new(3_u32);
        let b: Value = Arc::new(3_u32);
        let c: Value = Arc::new(4_u32);
        assert!(field.inner.same(&a, &b));
        assert!(!field.inner.same(&a, &c));
    }

    #[test]
    fn explicit_comparison_is_used() {
        let field = Field::define(
            FieldSpec::new(|_, _, _| 0_u32, |v, _, _| *v).compare(|_, _| false),
        );
        let a: Value = Arc::new(3_u32);
        let b: Value = Arc::new(3_u32);
        assert!(!field.inner.same(&a, &b));
        // identical allocations are always the same value
        assert!(field.inner.same(&a, &a));
    }
}
