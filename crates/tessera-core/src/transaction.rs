//! # Transactions
//!
//! A transaction describes one discrete update from a previous state to the
//! next one: the resulting document and selection, whether either changed,
//! and any number of typed effects that individual field `update` callbacks
//! may inspect.
//!
//! Building and dispatching transactions is the caller's business; the engine
//! only reads them.

use crate::state::State;
use crate::text::{Selection, Text};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type Effect = Arc<dyn Any + Send + Sync>;

/// A discrete update applied to a [`State`].
#[derive(Clone)]
pub struct Transaction {
    doc: Text,
    selection: Selection,
    doc_changed: bool,
    selection_changed: bool,
    effects: Vec<Effect>,
}

impl Transaction {
    /// Start an empty transaction on top of `state`.
    ///
    /// Without further changes it carries the state's document and selection
    /// and reports no change.
    #[must_use]
    pub fn start(state: &State) -> Self {
        Self::new(state.doc().clone(), state.selection())
    }

    /// Start an empty transaction from explicit document and selection values.
    #[must_use]
    pub fn new(doc: Text, selection: Selection) -> Self {
        Self {
            doc,
            selection,
            doc_changed: false,
            selection_changed: false,
            effects: Vec::new(),
        }
    }

    /// Replace the document.
    #[must_use]
    pub fn with_doc(mut self, doc: Text) -> Self {
        self.doc_changed |= doc != self.doc;
        self.doc = doc;
        self
    }

    /// Replace the selection.
    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection_changed |= selection != self.selection;
        self.selection = selection;
        self
    }

    /// Attach a typed effect.
    #[must_use]
    pub fn with_effect<T: Any + Send + Sync>(mut self, effect: T) -> Self {
        self.effects.push(Arc::new(effect));
        self
    }

    /// The document after this transaction.
    #[must_use]
    pub fn doc(&self) -> &Text {
        &self.doc
    }

    /// The selection after this transaction.
    #[must_use]
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Whether the document changed.
    #[must_use]
    pub fn doc_changed(&self) -> bool {
        self.doc_changed
    }

    /// Whether the selection changed.
    #[must_use]
    pub fn selection_changed(&self) -> bool {
        self.selection_changed
    }

    /// The first effect of type `T`, if any.
    #[must_use]
    pub fn effect<T: Any>(&self) -> Option<&T> {
        self.effects::<T>().next()
    }

    /// Every effect of type `T`, in the order they were attached.
    pub fn effects<T: Any>(&self) -> impl Iterator<Item = &T> + '_ {
        self.effects.iter().filter_map(|e| e.downcast_ref::<T>())
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("doc_changed", &self.doc_changed)
            .field("selection_changed", &self.selection_changed)
            .field("effects", &self.effects.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct SetLanguage(&'static str);

    #[test]
    fn unchanged_values_do_not_flag_changes() {
        let tr = Transaction::new(Text::from("a"), Selection::single(0))
            .with_doc(Text::from("a"))
            .with_selection(Selection::single(0));
        assert!(!tr.doc_changed());
        assert!(!tr.selection_changed());
    }

    #[test]
    fn replaced_values_flag_changes() {
        let tr = Transaction::new(Text::empty(), Selection::single(0))
            .with_doc(Text::from("x"))
            .with_selection(Selection::single(1));
        assert!(tr.doc_changed());
        assert!(tr.selection_changed());
        assert_eq!(tr.doc().as_str(), "x");
    }

    #[test]
    fn effects_are_typed() {
        let tr = Transaction::new(Text::empty(), Selection::single(0))
            .with_effect(SetLanguage("rust"))
            .with_effect(42_u32)
            .with_effect(SetLanguage("toml"));

        assert_eq!(tr.effect::<SetLanguage>(), Some(&SetLanguage("rust")));
        assert_eq!(tr.effects::<SetLanguage>().count(), 2);
        assert_eq!(tr.effect::<u32>(), Some(&42));
        assert!(tr.effect::<String>().is_none());
    }
}
