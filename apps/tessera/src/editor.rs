//! # Editor Extensions
//!
//! The built-in facets and fields a replayed session runs against.
//!
//! | Slot          | Kind  | Reads                                        |
//! |---------------|-------|----------------------------------------------|
//! | `tab_size`    | facet | constants only (static)                      |
//! | `indent_unit` | facet | `tab_size` (static)                          |
//! | `revision`    | field | -                                            |
//! | `line_count`  | field | -                                            |
//! | `cursor_line` | field | -                                            |
//! | `language`    | field | -                                            |
//! | `edits`       | field | `line_count` change bit                      |
//! | `status`      | facet | `language`, `line_count`, `cursor_line`, `indent_unit` |

use crate::script::TabSizeEntry;
use serde::Serialize;
use tessera_core::{
    Extension, Facet, FacetSpec, Field, FieldSpec, Slot, SlotRef, State, TesseraError, prec,
};

/// Tab size used when no extension contributes one.
pub const DEFAULT_TAB_SIZE: u32 = 4;

/// Language of a document no step has classified yet.
pub const PLAIN_LANGUAGE: &str = "plain";

/// Transaction effect switching the document language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetLanguage(pub String);

// =============================================================================
// EDITOR
// =============================================================================

/// Handles to every built-in facet and field.
#[derive(Debug, Clone)]
pub struct Editor {
    pub tab_size: Facet<u32, u32>,
    pub indent_unit: Facet<String, String>,
    pub status: Facet<String>,
    pub revision: Field<u64>,
    pub line_count: Field<usize>,
    pub cursor_line: Field<usize>,
    pub language: Field<String>,
    pub edits: Field<u32>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Declare the built-in slots.
    pub fn new() -> Self {
        let tab_size = Facet::define(FacetSpec::combine(|sizes: &[u32]| {
            sizes.first().copied().unwrap_or(DEFAULT_TAB_SIZE)
        }));
        let indent_unit = Facet::define(FacetSpec::combine(|units: &[String]| {
            units
                .first()
                .cloned()
                .unwrap_or_else(|| " ".repeat(DEFAULT_TAB_SIZE as usize))
        }));
        let status = Facet::define(FacetSpec::default());

        let revision = Field::define(FieldSpec::new(
            |_, _, _| 0_u64,
            |rev, tr, _| if tr.doc_changed() { rev + 1 } else { *rev },
        ));
        let line_count = Field::define(FieldSpec::new(
            |doc, _, _| doc.line_count(),
            |lines, tr, _| {
                if tr.doc_changed() {
                    tr.doc().line_count()
                } else {
                    *lines
                }
            },
        ));
        let cursor_line = Field::define(FieldSpec::new(
            |doc, selection, _| doc.line_at(selection.head),
            |line, tr, _| {
                if tr.doc_changed() || tr.selection_changed() {
                    tr.doc().line_at(tr.selection().head)
                } else {
                    *line
                }
            },
        ));
        let language = Field::define(FieldSpec::new(
            |_, _, _| PLAIN_LANGUAGE.to_string(),
            |current: &String, tr, _| {
                tr.effect::<SetLanguage>()
                    .map_or_else(|| current.clone(), |set| set.0.clone())
            },
        ));
        let counted = line_count.clone();
        let edits = Field::define_deps([line_count.slot_ref()]).define(FieldSpec::new(
            |_, _, _| 0_u32,
            move |edits, _, deps| {
                if deps.changed(&counted) {
                    edits + 1
                } else {
                    *edits
                }
            },
        ));

        Self {
            tab_size,
            indent_unit,
            status,
            revision,
            line_count,
            cursor_line,
            language,
            edits,
        }
    }

    /// The extension tree for a set of tab size contributions.
    pub fn extension(&self, tab_sizes: &[TabSizeEntry]) -> Result<Extension, TesseraError> {
        let mut items: Vec<Extension> = tab_sizes
            .iter()
            .map(|entry| self.tab_size.of(entry.value).with_prec(entry.prec))
            .collect();

        let tab_size = self.tab_size.clone();
        items.push(
            self.indent_unit
                .derive([self.tab_size.slot_ref()], move |deps| {
                    " ".repeat(*deps.facet(&tab_size) as usize)
                })?,
        );

        items.extend([
            self.revision.extension(),
            self.line_count.extension(),
            self.cursor_line.extension(),
            self.language.extension(),
            self.edits.extension(),
        ]);

        let language = self.language.clone();
        items.push(
            self.status
                .derive([self.language.slot_ref()], move |deps| {
                    deps.field(&language)
                        .cloned()
                        .unwrap_or_else(|| PLAIN_LANGUAGE.to_string())
                })?,
        );
        let (lines, cursor) = (self.line_count.clone(), self.cursor_line.clone());
        items.push(self.status.derive(
            [self.line_count.slot_ref(), self.cursor_line.slot_ref()],
            move |deps| {
                let line = deps.field(&cursor).copied().unwrap_or_default();
                let total = deps.field(&lines).copied().unwrap_or_default();
                format!("Ln {}/{}", line + 1, total)
            },
        )?);
        let indent = self.indent_unit.clone();
        items.push(prec::extend(self.status.derive(
            [self.indent_unit.slot_ref()],
            move |deps| format!("Spaces: {}", deps.facet(&indent).len()),
        )?));
        items.push(prec::fallback(self.status.of("tessera".to_string())));

        Ok(Extension::from(items))
    }

    /// Every built-in slot with its display name, in declaration order.
    pub fn named_slots(&self) -> Vec<(&'static str, SlotRef)> {
        vec![
            ("tab_size", self.tab_size.slot_ref()),
            ("indent_unit", self.indent_unit.slot_ref()),
            ("status", self.status.slot_ref()),
            ("revision", self.revision.slot_ref()),
            ("line_count", self.line_count.slot_ref()),
            ("cursor_line", self.cursor_line.slot_ref()),
            ("language", self.language.slot_ref()),
            ("edits", self.edits.slot_ref()),
        ]
    }

    /// Display name of a built-in slot.
    pub fn name_of(&self, slot: SlotRef) -> Option<&'static str> {
        self.named_slots()
            .into_iter()
            .find_map(|(name, s)| (s == slot).then_some(name))
    }

    /// Names of the slots that changed in the step producing `state`.
    pub fn changed(&self, state: &State) -> Vec<&'static str> {
        state
            .changed_slots()
            .filter_map(|slot| self.name_of(slot))
            .collect()
    }

    /// Names of the slots whose value differs between `before` and `after`,
    /// or that `after` reports as changed.
    ///
    /// Covers steps that switch configurations, where the change bits of
    /// `after` only describe its own transaction. Static slots come first,
    /// then dynamic slots in evaluation order.
    pub fn changed_since(&self, before: &State, after: &State) -> Vec<&'static str> {
        let differing = [
            (self.tab_size.slot_ref(), differs(&self.tab_size, before, after)),
            (self.indent_unit.slot_ref(), differs(&self.indent_unit, before, after)),
            (self.status.slot_ref(), differs(&self.status, before, after)),
            (self.revision.slot_ref(), differs(&self.revision, before, after)),
            (self.line_count.slot_ref(), differs(&self.line_count, before, after)),
            (self.cursor_line.slot_ref(), differs(&self.cursor_line, before, after)),
            (self.language.slot_ref(), differs(&self.language, before, after)),
            (self.edits.slot_ref(), differs(&self.edits, before, after)),
        ];
        let flagged: Vec<SlotRef> = after.changed_slots().collect();

        let config = after.config();
        config
            .addresses()
            .filter(|(_, address)| address.is_static())
            .map(|(slot, _)| slot)
            .chain(config.dynamic_slots())
            .filter(|slot| {
                flagged.contains(slot)
                    || differing.iter().any(|(s, d)| s == slot && *d)
            })
            .filter_map(|slot| self.name_of(slot))
            .collect()
    }

    /// Values of every built-in slot on `state`.
    pub fn snapshot(&self, state: &State) -> Snapshot {
        Snapshot {
            doc_len: state.doc().len(),
            cursor: state.selection().head,
            revision: state.field(&self.revision).copied().unwrap_or_default(),
            line_count: state.field(&self.line_count).copied().unwrap_or_default(),
            cursor_line: state.field(&self.cursor_line).copied().unwrap_or_default(),
            language: state
                .field(&self.language)
                .cloned()
                .unwrap_or_else(|| PLAIN_LANGUAGE.to_string()),
            edits: state.field(&self.edits).copied().unwrap_or_default(),
            tab_size: *state.facet(&self.tab_size),
            indent_width: state.facet(&self.indent_unit).len(),
            status: state.facet(&self.status).clone(),
        }
    }
}

fn differs<S: Slot>(slot: &S, before: &State, after: &State) -> bool
where
    S::Value: PartialEq,
{
    before.get(slot) != after.get(slot)
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Plain values of the built-in slots, for printing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub doc_len: usize,
    pub cursor: usize,
    pub revision: u64,
    pub line_count: usize,
    pub cursor_line: usize,
    pub language: String,
    pub edits: u32,
    pub tab_size: u32,
    pub indent_width: usize,
    pub status: Vec<String>,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{Address, Configuration, Prec, Selection, Text, Transaction};

    fn entries(values: &[(u32, Prec)]) -> Vec<TabSizeEntry> {
        values
            .iter()
            .map(|&(value, prec)| TabSizeEntry { value, prec })
            .collect()
    }

    #[test]
    fn tab_size_and_indent_are_static() {
        let editor = Editor::new();
        let ext = editor
            .extension(&entries(&[(2, Prec::Fallback), (8, Prec::Default)]))
            .expect("extension");
        let config = Configuration::resolve(&ext).expect("resolve");

        assert_eq!(*config.static_facet(&editor.tab_size), 8);
        assert_eq!(config.static_facet(&editor.indent_unit).len(), 8);
        assert!(matches!(
            config.address_of(editor.indent_unit.slot_ref()),
            Some(Address::Static(_))
        ));
        assert!(matches!(
            config.address_of(editor.status.slot_ref()),
            Some(Address::Dynamic(_))
        ));
    }

    #[test]
    fn status_follows_precedence() {
        let editor = Editor::new();
        let config =
            Configuration::resolve(&editor.extension(&[]).expect("extension")).expect("resolve");
        let state = config.init(Text::from("a\nb"), Selection::single(2), None);

        assert_eq!(
            editor.snapshot(&state).status,
            vec![
                "Spaces: 4".to_string(),
                "plain".to_string(),
                "Ln 2/2".to_string(),
                "tessera".to_string(),
            ]
        );
    }

    #[test]
    fn language_effect_changes_only_language_and_status() {
        let editor = Editor::new();
        let config =
            Configuration::resolve(&editor.extension(&[]).expect("extension")).expect("resolve");
        let state = config.init(Text::from("x"), Selection::single(0), None);

        let tr = Transaction::start(&state).with_effect(SetLanguage("rust".to_string()));
        let next = config.update(&state, &tr);

        assert_eq!(editor.changed(&next), vec!["language", "status"]);
        assert_eq!(editor.snapshot(&next).language, "rust");
    }

    #[test]
    fn edits_count_line_count_changes() {
        let editor = Editor::new();
        let config =
            Configuration::resolve(&editor.extension(&[]).expect("extension")).expect("resolve");
        let s0 = config.init(Text::from("x"), Selection::single(0), None);

        let s1 = config.update(&s0, &Transaction::start(&s0).with_doc(Text::from("xy")));
        let s2 = config.update(&s1, &Transaction::start(&s1).with_doc(Text::from("xy\nz")));

        assert_eq!(editor.snapshot(&s1).edits, 0);
        assert_eq!(editor.snapshot(&s1).revision, 1);
        assert_eq!(editor.snapshot(&s2).edits, 1);
        assert_eq!(editor.snapshot(&s2).revision, 2);
    }

    #[test]
    fn changed_since_covers_a_configuration_switch() {
        let editor = Editor::new();
        let narrow = Configuration::resolve(
            &editor.extension(&entries(&[(2, Prec::Default)])).expect("extension"),
        )
        .expect("resolve");
        let wide = Configuration::resolve(
            &editor.extension(&entries(&[(8, Prec::Default)])).expect("extension"),
        )
        .expect("resolve");

        let before = narrow.init(Text::from("a"), Selection::single(0), None);
        let switched = wide.init(before.doc().clone(), before.selection(), Some(&before));
        let after = wide.update(&switched, &Transaction::start(&switched));

        assert!(editor.changed(&after).is_empty());
        assert_eq!(
            editor.changed_since(&before, &after),
            vec!["tab_size", "indent_unit", "status"]
        );
        assert!(editor.changed_since(&after, &after).is_empty());
    }
}
