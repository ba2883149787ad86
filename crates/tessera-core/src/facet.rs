//! # Facets
//!
//! A facet is a configuration channel: any number of extensions contribute
//! inputs, and the facet's `combine` function folds them, in precedence
//! order, into one output value.
//!
//! ## Comparison defaults
//!
//! - `FacetSpec::default()` collects the raw inputs into a `Vec` and compares
//!   outputs element by element.
//! - `FacetSpec::combine(f)` compares outputs with `PartialEq`.
//! - `FacetSpec::combine_with(f, compare)` takes the comparison explicitly, for
//!   outputs without `PartialEq`. `|a, b| std::ptr::eq(a, b)` makes every
//!   recomputation count as a change.

use crate::deps::{DepView, Slot, Slots, Value};
use crate::extension::{Extension, Provider};
use crate::ids::IdRegistry;
use crate::types::{SlotKind, SlotRef, TesseraError};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type CombineFn<I, O> = Box<dyn Fn(&[I]) -> O + Send + Sync>;
type CompareFn<O> = Box<dyn Fn(&O, &O) -> bool + Send + Sync>;
type EmitFn<I> = Box<dyn Fn(&DepView<'_>, &mut Vec<I>) + Send + Sync>;

// =============================================================================
// FACET SPEC
// =============================================================================

/// Declaration parameters for a [`Facet`].
pub struct FacetSpec<I, O> {
    combine: CombineFn<I, O>,
    compare: CompareFn<O>,
    is_static: bool,
}

impl<I> Default for FacetSpec<I, Vec<I>>
where
    I: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self {
            combine: Box::new(|inputs: &[I]| inputs.to_vec()),
            compare: Box::new(|a: &Vec<I>, b: &Vec<I>| a == b),
            is_static: false,
        }
    }
}

impl<I, O> FacetSpec<I, O>
where
    I: Send + Sync + 'static,
    O: PartialEq + Send + Sync + 'static,
{
    /// Use a custom combine function. Outputs compare by value unless
    /// [`compare`](Self::compare) is also given.
    pub fn combine(combine: impl Fn(&[I]) -> O + Send + Sync + 'static) -> Self {
        Self::combine_with(combine, |a: &O, b: &O| a == b)
    }
}

impl<I, O> FacetSpec<I, O>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    /// Use a custom combine function and output comparison.
    pub fn combine_with(
        combine: impl Fn(&[I]) -> O + Send + Sync + 'static,
        compare: impl Fn(&O, &O) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            combine: Box::new(combine),
            compare: Box::new(compare),
            is_static: false,
        }
    }

    /// Use a custom output comparison.
    #[must_use]
    pub fn compare(mut self, compare: impl Fn(&O, &O) -> bool + Send + Sync + 'static) -> Self {
        self.compare = Box::new(compare);
        self
    }

    /// Only accept constant contributions. The output is then computed once
    /// per configuration and shared by every state.
    #[must_use]
    pub fn static_only(mut self) -> Self {
        self.is_static = true;
        self
    }
}

// =============================================================================
// FACET
// =============================================================================

pub(crate) struct FacetInner<I, O> {
    slot: SlotRef,
    default: O,
    combine: CombineFn<I, O>,
    compare: CompareFn<O>,
    is_static: bool,
}

/// A typed configuration channel combining `I` inputs into an `O` output.
///
/// Cloning a facet clones the handle; identity is preserved.
pub struct Facet<I, O = Vec<I>> {
    inner: Arc<FacetInner<I, O>>,
}

impl<I, O> Clone for Facet<I, O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I, O> fmt::Debug for Facet<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Facet")
            .field("slot", &self.inner.slot)
            .field("static", &self.inner.is_static)
            .finish()
    }
}

impl<I, O> Facet<I, O>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    /// Declare a new facet. The default output is `combine(&[])`, computed once.
    pub fn define(spec: FacetSpec<I, O>) -> Self {
        let slot = IdRegistry::global().allocate(SlotKind::Facet);
        let default = (spec.combine)(&[]);
        Self {
            inner: Arc::new(FacetInner {
                slot,
                default,
                combine: spec.combine,
                compare: spec.compare,
                is_static: spec.is_static,
            }),
        }
    }

    /// The output used when no extension contributes to this facet.
    #[must_use]
    pub fn default_value(&self) -> &O {
        &self.inner.default
    }

    /// Whether the facet only accepts constant contributions.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.inner.is_static
    }

    /// Apply the facet's combine function.
    pub fn combine(&self, inputs: &[I]) -> O {
        (self.inner.combine)(inputs)
    }

    /// Apply the facet's output comparison.
    pub fn compare(&self, a: &O, b: &O) -> bool {
        (self.inner.compare)(a, b)
    }

    /// Contribute a constant input.
    pub fn of(&self, value: I) -> Extension
    where
        I: Clone,
    {
        self.provider(Vec::new(), Box::new(move |_, out| out.push(value.clone())))
    }

    /// Contribute one input computed from the given dependencies.
    pub fn derive<F>(
        &self,
        deps: impl IntoIterator<Item = SlotRef>,
        get: F,
    ) -> Result<Extension, TesseraError>
    where
        F: Fn(&DepView<'_>) -> I + Send + Sync + 'static,
    {
        self.ensure_dynamic()?;
        Ok(self.provider(
            deps.into_iter().collect(),
            Box::new(move |view, out| out.push(get(view))),
        ))
    }

    /// Contribute any number of inputs computed from the given dependencies.
    pub fn derive_n<F, It>(
        &self,
        deps: impl IntoIterator<Item = SlotRef>,
        get: F,
    ) -> Result<Extension, TesseraError>
    where
        F: Fn(&DepView<'_>) -> It + Send + Sync + 'static,
        It: IntoIterator<Item = I>,
    {
        self.ensure_dynamic()?;
        Ok(self.provider(
            deps.into_iter().collect(),
            Box::new(move |view, out| out.extend(get(view))),
        ))
    }

    fn ensure_dynamic(&self) -> Result<(), TesseraError> {
        if self.inner.is_static {
            return Err(TesseraError::StaticDerivation {
                facet: self.inner.slot,
            });
        }
        Ok(())
    }

    fn provider(&self, deps: Vec<SlotRef>, emit: EmitFn<I>) -> Extension {
        let deps = crate::extension::unique(deps);
        let facet: Arc<dyn ErasedFacet> = self.inner.clone();
        Extension::Provider(Provider::new(Arc::new(ProviderInner { facet, deps, emit })))
    }
}

impl<I, O> Slot for Facet<I, O>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    type Value = O;

    fn slot_ref(&self) -> SlotRef {
        self.inner.slot
    }

    fn absent(&self) -> Option<&O> {
        Some(&self.inner.default)
    }
}

// =============================================================================
// TYPE-ERASED FACETS AND PROVIDERS
// =============================================================================

/// Facet operations the resolver and states run without knowing `I`/`O`.
pub(crate) trait ErasedFacet: Send + Sync {
    fn slot(&self) -> SlotRef;
    fn is_static(&self) -> bool;
    /// Run every provider in order and combine the gathered inputs.
    fn compute(&self, providers: &[Arc<dyn ErasedProvider>], slots: Slots<'_>) -> Value;
    /// Identity or the facet's comparison.
    fn same(&self, a: &Value, b: &Value) -> bool;
}

impl<I, O> ErasedFacet for FacetInner<I, O>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    fn slot(&self) -> SlotRef {
        self.slot
    }

    fn is_static(&self) -> bool {
        self.is_static
    }

    fn compute(&self, providers: &[Arc<dyn ErasedProvider>], slots: Slots<'_>) -> Value {
        let mut inputs: Vec<I> = Vec::new();
        for provider in providers {
            if let Some(provider) = provider.as_any().downcast_ref::<ProviderInner<I>>() {
                let view = DepView::new(slots, &provider.deps);
                (provider.emit)(&view, &mut inputs);
            }
        }
        Arc::new((self.combine)(&inputs))
    }

    fn same(&self, a: &Value, b: &Value) -> bool {
        if Arc::ptr_eq(a, b) {
            return true;
        }
        match (a.downcast_ref::<O>(), b.downcast_ref::<O>()) {
            (Some(a), Some(b)) => (self.compare)(a, b),
            _ => false,
        }
    }
}

/// Provider operations the resolver runs without knowing `I`.
pub(crate) trait ErasedProvider: Send + Sync {
    fn facet(&self) -> &Arc<dyn ErasedFacet>;
    fn deps(&self) -> &[SlotRef];
    fn as_any(&self) -> &dyn Any;
}

struct ProviderInner<I> {
    facet: Arc<dyn ErasedFacet>,
    deps: Vec<SlotRef>,
    emit: EmitFn<I>,
}

impl<I: Send + Sync + 'static> ErasedProvider for ProviderInner<I> {
    fn facet(&self) -> &Arc<dyn ErasedFacet> {
        &self.facet
    }

    fn deps(&self) -> &[SlotRef] {
        &self.deps
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_is_combine_of_nothing() {
        let facet: Facet<u32> = Facet::define(FacetSpec::default());
        assert!(facet.default_value().is_empty());

        let summed: Facet<u32, u32> = Facet::define(FacetSpec::combine(|v: &[u32]| v.iter().sum::<u32>()));
        assert_eq!(*summed.default_value(), 0);
    }

    #[test]
    fn default_compare_is_elementwise() {
        let facet: Facet<u32> = Facet::define(FacetSpec::default());
        assert!(facet.compare(&vec![1, 2], &vec![1, 2]));
        assert!(!facet.compare(&vec![1, 2], &vec![2, 1]));
    }

    #[test]
    fn custom_combine_compares_by_value() {
        let facet: Facet<u32, u32> = Facet::define(FacetSpec::combine(|v: &[u32]| v.len() as u32));
        let a = 1_u32;
        let b = 1_u32;
        assert!(facet.compare(&a, &b));
        assert!(!facet.compare(&a, &2));
    }

    #[test]
    fn combine_with_takes_the_given_comparison() {
        let facet: Facet<u32, u32> = Facet::define(FacetSpec::combine_with(
            |v: &[u32]| v.len() as u32,
            |a: &u32, b: &u32| std::ptr::eq(a, b),
        ));
        let a = 1_u32;
        let b = 1_u32;
        assert!(facet.compare(&a, &a));
        assert!(!facet.compare(&a, &b));
    }

    #[test]
    fn explicit_compare_replaces_the_default() {
        let facet: Facet<u32, u32> =
            Facet::define(FacetSpec::combine(|v: &[u32]| v.len() as u32).compare(|_, _| false));
        assert!(!facet.compare(&1, &1));
    }

    #[test]
    fn static_facet_rejects_derivation() {
        let facet: Facet<u32> = Facet::define(FacetSpec::default().static_only());
        assert!(facet.is_static());

        let err = facet.derive([], |_| 1).err();
        assert_eq!(
            err,
            Some(TesseraError::StaticDerivation {
                facet: facet.slot_ref()
            })
        );
        assert!(facet.derive_n([], |_| vec![1]).is_err());
    }

    #[test]
    fn declaration_allocates_fresh_ids() {
        let a: Facet<u8> = Facet::define(FacetSpec::default());
        let b: Facet<u8> = Facet::define(FacetSpec::default());
        assert_ne!(a.slot_ref(), b.slot_ref());
        assert_eq!(a.clone().slot_ref(), a.slot_ref());
    }
}
