//! # tessera-core
//!
//! A dependency-ordered configuration and incremental state engine.
//!
//! Extensions contribute inputs to typed [`Facet`]s and declare stateful
//! [`Field`]s. A [`Configuration`] resolves an extension tree once: it orders
//! every facet and field by its declared dependencies, evaluates the parts that
//! can never change, and builds [`State`]s that carry everything else.
//!
//! ## Flow
//!
//! ```text
//! Extension tree --> Configuration::resolve --> Configuration
//!                                                   |
//!                       Configuration::init ------> State
//!                                                   |
//!       Transaction --> Configuration::update ----> State --> ...
//! ```
//!
//! ## Guarantees
//!
//! - Facet inputs are combined in precedence order, then declaration order.
//! - Every dependency is evaluated before its dependents; cycles are rejected.
//! - A slot whose value compares equal to the previous one keeps the previous
//!   value and is not reported as changed.
//! - Resolution and update are deterministic for a given tree and history.

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
pub mod deps;
pub mod extension;
pub mod facet;
pub mod field;
pub mod ids;
pub mod state;
pub mod text;
pub mod transaction;
pub mod types;

mod resolver;

// =============================================================================
// RE-EXPORTS: Identity and Errors (from types module)
// =============================================================================

pub use ids::IdRegistry;
pub use types::{Address, Prec, SlotId, SlotKind, SlotRef, TesseraError};

// =============================================================================
// RE-EXPORTS: Declarations
// =============================================================================

pub use deps::{DepView, Slot};
pub use extension::{Extension, FieldEntry, Provider, prec};
pub use facet::{Facet, FacetSpec};
pub use field::{Field, FieldDeps, FieldSpec};

// =============================================================================
// RE-EXPORTS: Runtime
// =============================================================================

pub use config::Configuration;
pub use state::State;
pub use text::{Selection, Text};
pub use transaction::Transaction;
