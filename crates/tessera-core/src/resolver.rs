//! # Resolver
//!
//! Turns a flattened extension tree into the parts of a
//! [`Configuration`](crate::Configuration):
//!
//! 1. Group leaves into one graph node per facet (all of its providers, in
//!    precedence order, with the union of their dependencies) and one per field.
//! 2. Order the nodes depth-first so every node follows its dependencies,
//!    failing on cycles and on dependencies to fields that are not present.
//! 3. Split the order into static facets (only constant inputs, transitively)
//!    and dynamic slots, assign addresses, and evaluate the static facets once.
//!
//! Nodes are kept in a `BTreeMap` keyed by slot, so the traversal starts from
//! slots in declaration order and the result is deterministic.

use crate::deps::{Slots, Value};
use crate::extension::{self, Extension, Leaf};
use crate::facet::{ErasedFacet, ErasedProvider};
use crate::field::ErasedField;
use crate::types::{Address, SlotRef, TesseraError};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// RESOLVED SLOTS
// =============================================================================

/// A facet bound to its contributing providers.
pub(crate) struct FacetInstance {
    pub(crate) facet: Arc<dyn ErasedFacet>,
    pub(crate) providers: Vec<Arc<dyn ErasedProvider>>,
    /// Union of the providers' dependencies.
    pub(crate) deps: Vec<SlotRef>,
}

impl FacetInstance {
    pub(crate) fn compute(&self, slots: Slots<'_>) -> Value {
        self.facet.compute(&self.providers, slots)
    }
}

/// A slot evaluated per state.
pub(crate) enum ResolvedSlot {
    Field(Arc<dyn ErasedField>),
    Facet(FacetInstance),
}

impl ResolvedSlot {
    pub(crate) fn slot(&self) -> SlotRef {
        match self {
            Self::Field(field) => field.slot(),
            Self::Facet(instance) => instance.facet.slot(),
        }
    }
}

/// Output of a successful resolution.
pub(crate) struct Resolved {
    pub(crate) dynamic_slots: Vec<ResolvedSlot>,
    pub(crate) addresses: BTreeMap<SlotRef, Address>,
    pub(crate) static_values: Vec<Value>,
}

// =============================================================================
// DEPENDENCY GRAPH
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

enum Payload {
    Facet {
        facet: Arc<dyn ErasedFacet>,
        providers: Vec<Arc<dyn ErasedProvider>>,
    },
    Field(Arc<dyn ErasedField>),
}

struct GraphNode {
    deps: Vec<SlotRef>,
    payload: Payload,
    mark: Mark,
}

type Graph = BTreeMap<SlotRef, GraphNode>;

fn build_graph(leaves: Vec<Leaf>) -> Result<Graph, TesseraError> {
    let mut graph = Graph::new();

    for leaf in leaves {
        match leaf {
            Leaf::Field(field) => {
                graph.entry(field.slot()).or_insert_with(|| GraphNode {
                    deps: field.deps().to_vec(),
                    payload: Payload::Field(Arc::clone(&field)),
                    mark: Mark::Unvisited,
                });
            }
            Leaf::Provider(provider) => {
                let facet = Arc::clone(provider.facet());
                if facet.is_static() && !provider.deps().is_empty() {
                    return Err(TesseraError::StaticDerivation { facet: facet.slot() });
                }
                let node = graph.entry(facet.slot()).or_insert_with(|| GraphNode {
                    deps: Vec::new(),
                    payload: Payload::Facet {
                        facet,
                        providers: Vec::new(),
                    },
                    mark: Mark::Unvisited,
                });
                for dep in provider.deps() {
                    if !node.deps.contains(dep) {
                        node.deps.push(*dep);
                    }
                }
                if let Payload::Facet { providers, .. } = &mut node.payload {
                    providers.push(provider);
                }
            }
        }
    }

    Ok(graph)
}

// =============================================================================
// TOPOLOGICAL ORDER
// =============================================================================

fn topological_order(graph: &mut Graph) -> Result<Vec<SlotRef>, TesseraError> {
    let mut ordered = Vec::with_capacity(graph.len());
    let mut path = Vec::new();
    let roots: Vec<SlotRef> = graph.keys().copied().collect();
    for slot in roots {
        visit(slot, graph, &mut path, &mut ordered)?;
    }
    Ok(ordered)
}

fn visit(
    slot: SlotRef,
    graph: &mut Graph,
    path: &mut Vec<SlotRef>,
    ordered: &mut Vec<SlotRef>,
) -> Result<(), TesseraError> {
    let Some(node) = graph.get_mut(&slot) else {
        return Ok(());
    };
    match node.mark {
        Mark::Done => return Ok(()),
        Mark::InProgress => {
            let start = path.iter().position(|s| *s == slot).unwrap_or(0);
            let mut cycle = path[start..].to_vec();
            cycle.push(slot);
            return Err(TesseraError::CyclicDependency { cycle });
        }
        Mark::Unvisited => node.mark = Mark::InProgress,
    }

    let deps = node.deps.clone();
    path.push(slot);
    for dep in deps {
        if !graph.contains_key(&dep) {
            if dep.is_field() {
                return Err(TesseraError::UnavailableFieldDependency {
                    field: dep,
                    dependent: slot,
                });
            }
            // An unconfigured facet is a constant: its default.
            continue;
        }
        visit(dep, graph, path, ordered)?;
    }
    path.pop();

    if let Some(node) = graph.get_mut(&slot) {
        node.mark = Mark::Done;
    }
    ordered.push(slot);
    Ok(())
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Resolve an extension tree. All-or-nothing: any error aborts resolution.
pub(crate) fn resolve(ext: &Extension) -> Result<Resolved, TesseraError> {
    let leaves = extension::flatten(ext);
    let leaf_count = leaves.len();
    let mut graph = build_graph(leaves)?;
    let order = topological_order(&mut graph)?;

    // A facet is static when every provider dependency is a static facet.
    // Dependencies precede dependents in `order`, so one pass suffices.
    let mut is_static: BTreeMap<SlotRef, bool> = BTreeMap::new();
    for slot in &order {
        let value = match graph.get(slot).map(|node| &node.payload) {
            Some(Payload::Facet { providers, .. }) => providers.iter().all(|p| {
                p.deps()
                    .iter()
                    .all(|dep| is_static.get(dep).copied().unwrap_or(dep.is_facet()))
            }),
            _ => false,
        };
        is_static.insert(*slot, value);
    }

    let mut addresses = BTreeMap::new();
    let mut static_slots: Vec<FacetInstance> = Vec::new();
    let mut dynamic_slots: Vec<ResolvedSlot> = Vec::new();

    for slot in order {
        let Some(node) = graph.remove(&slot) else {
            continue;
        };
        match node.payload {
            Payload::Facet { facet, providers } => {
                let instance = FacetInstance {
                    facet,
                    providers,
                    deps: node.deps,
                };
                if is_static.get(&slot).copied().unwrap_or(false) {
                    addresses.insert(slot, Address::Static(static_slots.len()));
                    static_slots.push(instance);
                } else {
                    addresses.insert(slot, Address::Dynamic(dynamic_slots.len()));
                    dynamic_slots.push(ResolvedSlot::Facet(instance));
                }
            }
            Payload::Field(field) => {
                addresses.insert(slot, Address::Dynamic(dynamic_slots.len()));
                dynamic_slots.push(ResolvedSlot::Field(field));
            }
        }
    }

    // Static facets only read static facets, so they are evaluated against the
    // static values filled so far and no per-state storage.
    let mut static_values: Vec<Value> = Vec::with_capacity(static_slots.len());
    for instance in &static_slots {
        let value = instance.compute(Slots {
            addresses: &addresses,
            statics: &static_values,
            dynamics: &[],
            changed: &[],
        });
        static_values.push(value);
    }

    tracing::debug!(
        leaves = leaf_count,
        static_slots = static_values.len(),
        dynamic_slots = dynamic_slots.len(),
        "configuration resolved"
    );

    Ok(Resolved {
        dynamic_slots,
        addresses,
        static_values,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::prec;
    use crate::{Facet, FacetSpec, Field, FieldSpec, Slot};

    fn facet() -> Facet<u32> {
        Facet::define(FacetSpec::default())
    }

    fn slot_order(resolved: &Resolved) -> Vec<SlotRef> {
        resolved.dynamic_slots.iter().map(ResolvedSlot::slot).collect()
    }

    #[test]
    fn providers_of_one_facet_share_a_node() {
        let f = facet();
        let tree = Extension::group([f.of(1), prec::fallback(f.of(2)), f.of(3)]);
        let graph = build_graph(extension::flatten(&tree)).expect("graph");
        assert_eq!(graph.len(), 1);
        match graph.get(&f.slot_ref()).map(|n| &n.payload) {
            Some(Payload::Facet { providers, .. }) => assert_eq!(providers.len(), 3),
            _ => unreachable!("facet node missing"),
        }
    }

    #[test]
    fn node_deps_are_the_union_of_provider_deps() {
        let a = facet();
        let b = facet();
        let target = facet();
        let tree = Extension::group([
            a.of(1),
            b.of(2),
            target.derive([a.slot_ref()], |_| 0).expect("derive"),
            target
                .derive([a.slot_ref(), b.slot_ref()], |_| 0)
                .expect("derive"),
        ]);
        let graph = build_graph(extension::flatten(&tree)).expect("graph");
        let deps = graph.get(&target.slot_ref()).map(|n| n.deps.clone());
        assert_eq!(deps, Some(vec![a.slot_ref(), b.slot_ref()]));
    }

    #[test]
    fn dependencies_precede_dependents() {
        let base = Field::define(FieldSpec::new(|_, _, _| 2_u32, |v, _, _| *v));
        let doubled = facet();
        let base_for_derive = base.clone();
        let tree = Extension::group([
            doubled
                .derive([base.slot_ref()], move |deps| deps.field(&base_for_derive).copied().unwrap_or_default() * 2)
                .expect("derive"),
            base.extension(),
        ]);

        let resolved = resolve(&tree).expect("resolve");
        assert_eq!(slot_order(&resolved), vec![base.slot_ref(), doubled.slot_ref()]);
        assert!(resolved.static_values.is_empty());
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let f = facet();
        let tree = f.derive([f.slot_ref()], |_| 1).expect("derive");
        let err = resolve(&tree).err();
        assert_eq!(
            err,
            Some(TesseraError::CyclicDependency {
                cycle: vec![f.slot_ref(), f.slot_ref()]
            })
        );
    }

    #[test]
    fn missing_field_dependency_is_rejected() {
        let missing = Field::define(FieldSpec::new(|_, _, _| 0_u8, |v, _, _| *v));
        let f = facet();
        let tree = f.derive([missing.slot_ref()], |_| 1).expect("derive");
        let err = resolve(&tree).err();
        assert_eq!(
            err,
            Some(TesseraError::UnavailableFieldDependency {
                field: missing.slot_ref(),
                dependent: f.slot_ref()
            })
        );
    }

    #[test]
    fn missing_facet_dependency_is_skipped_and_static() {
        let absent = facet();
        let f = facet();
        let tree = f.derive([absent.slot_ref()], |_| 7).expect("derive");
        let resolved = resolve(&tree).expect("resolve");
        assert!(resolved.dynamic_slots.is_empty());
        assert_eq!(
            resolved.addresses.get(&f.slot_ref()),
            Some(&Address::Static(0))
        );
        let value = resolved.static_values[0].downcast_ref::<Vec<u32>>().cloned();
        assert_eq!(value, Some(vec![7]));
    }

    #[test]
    fn static_chains_are_evaluated_once() {
        let base = facet();
        let sum: Facet<u32, u32> = Facet::define(
            FacetSpec::combine(|v: &[u32]| v.iter().sum::<u32>()).compare(|a, b| a == b),
        );
        let base_for_derive = base.clone();
        let tree = Extension::group([
            base.of(2),
            base.of(3),
            sum.derive_n([base.slot_ref()], move |deps| {
                deps.facet(&base_for_derive).clone()
            })
            .expect("derive"),
        ]);

        let resolved = resolve(&tree).expect("resolve");
        assert!(resolved.dynamic_slots.is_empty());
        let idx = match resolved.addresses.get(&sum.slot_ref()) {
            Some(Address::Static(i)) => *i,
            other => unreachable!("unexpected address {other:?}"),
        };
        assert_eq!(resolved.static_values[idx].downcast_ref::<u32>(), Some(&5));
    }

    #[test]
    fn fields_are_never_static() {
        let field = Field::define(FieldSpec::new(|_, _, _| 1_u8, |v, _, _| *v));
        let resolved = resolve(&field.extension()).expect("resolve");
        assert_eq!(
            resolved.addresses.get(&field.slot_ref()),
            Some(&Address::Dynamic(0))
        );
    }
}
