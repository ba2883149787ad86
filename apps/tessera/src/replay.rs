//! # Replay
//!
//! Runs a validated [`Script`] against the built-in [`Editor`] extensions and
//! records what every step changed.

use crate::editor::{Editor, Snapshot};
use crate::error::CliError;
use crate::script::{Script, TabSizeEntry};
use serde::Serialize;
use tessera_core::{Address, Configuration, Prec, Selection, Text};

// =============================================================================
// REPORTS
// =============================================================================

/// Outcome of one replayed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// One-based step number.
    pub index: usize,
    pub label: String,
    /// Whether the step switched configurations before its transaction.
    pub reconfigured: bool,
    /// Names of the slots that changed, in evaluation order. After a
    /// configuration switch this compares against the state before the step.
    pub changed: Vec<&'static str>,
    pub snapshot: Snapshot,
}

/// Outcome of a full replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub initial: Snapshot,
    pub steps: Vec<StepReport>,
}

/// Where a built-in slot lives in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotInfo {
    pub name: &'static str,
    pub slot: String,
    pub address: Option<Address>,
}

/// Resolved layout of the script's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub static_len: usize,
    pub dynamic_len: usize,
    /// Dynamic slots in evaluation order.
    pub evaluation_order: Vec<&'static str>,
    /// Every built-in slot, in declaration order.
    pub slots: Vec<SlotInfo>,
    pub tab_size: u32,
}

// =============================================================================
// OPERATIONS
// =============================================================================

fn resolve(editor: &Editor, tab_sizes: &[TabSizeEntry]) -> Result<Configuration, CliError> {
    let extension = editor.extension(tab_sizes)?;
    Ok(Configuration::resolve(&extension)?)
}

/// Resolve the script's configuration and describe it.
pub fn inspect(script: &Script) -> Result<Layout, CliError> {
    let editor = Editor::new();
    let config = resolve(&editor, &script.tab_size)?;

    Ok(Layout {
        static_len: config.static_len(),
        dynamic_len: config.dynamic_len(),
        evaluation_order: config
            .dynamic_slots()
            .filter_map(|slot| editor.name_of(slot))
            .collect(),
        slots: editor
            .named_slots()
            .into_iter()
            .map(|(name, slot)| SlotInfo {
                name,
                slot: slot.to_string(),
                address: config.address_of(slot),
            })
            .collect(),
        tab_size: *config.static_facet(&editor.tab_size),
    })
}

/// Replay every step of the script.
pub fn replay(script: &Script) -> Result<ReplayReport, CliError> {
    let editor = Editor::new();
    let mut config = resolve(&editor, &script.tab_size)?;
    let mut state = config.init(
        Text::from(script.document.text.as_str()),
        Selection::single(script.document.cursor),
        None,
    );
    let initial = editor.snapshot(&state);
    tracing::info!(
        static_slots = config.static_len(),
        dynamic_slots = config.dynamic_len(),
        "session started"
    );

    let mut steps = Vec::with_capacity(script.steps.len());
    for (offset, step) in script.steps.iter().enumerate() {
        let index = offset + 1;
        let before = state.clone();
        let reconfigured = match step.tab_size {
            Some(value) => {
                let mut entries = script.tab_size.clone();
                entries.push(TabSizeEntry {
                    value,
                    prec: Prec::Override,
                });
                config = resolve(&editor, &entries)?;
                state = config.init(state.doc().clone(), state.selection(), Some(&state));
                tracing::debug!(step = index, tab_size = value, "reconfigured");
                true
            }
            None => false,
        };

        let tr = step.transaction(&state)?;
        state = config.update(&state, &tr);

        let changed = if reconfigured {
            editor.changed_since(&before, &state)
        } else {
            editor.changed(&state)
        };
        tracing::debug!(step = index, changed = changed.len(), "step applied");
        steps.push(StepReport {
            index,
            label: step.name(),
            reconfigured,
            changed,
            snapshot: editor.snapshot(&state),
        });
    }

    tracing::info!(steps = steps.len(), "session replayed");
    Ok(ReplayReport { initial, steps })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
[document]
text = "one"

[[tab_size]]
value = 2

[[step]]
label = "newline"
insert = { at = 3, text = "\ntwo" }

[[step]]
label = "reindent"
tab_size = 8

[[step]]
label = "classify"
language = "rust"
"#;

    #[test]
    fn replay_reports_changes_per_step() {
        let script = Script::parse(SCRIPT).expect("parse");
        let report = replay(&script).expect("replay");

        assert_eq!(report.initial.line_count, 1);
        assert_eq!(report.initial.tab_size, 2);
        assert_eq!(report.steps.len(), 3);

        let newline = &report.steps[0];
        assert!(newline.changed.contains(&"line_count"));
        assert!(newline.changed.contains(&"edits"));
        assert_eq!(newline.snapshot.revision, 1);

        let reindent = &report.steps[1];
        assert!(reindent.reconfigured);
        assert_eq!(reindent.snapshot.tab_size, 8);
        assert_eq!(reindent.snapshot.revision, 1);
        assert_eq!(reindent.snapshot.edits, 1);
        assert_eq!(reindent.changed, vec!["tab_size", "indent_unit", "status"]);

        let classify = &report.steps[2];
        assert_eq!(classify.changed, vec!["language", "status"]);
        assert_eq!(classify.snapshot.language, "rust");
        assert_eq!(classify.snapshot.tab_size, 8);
    }

    #[test]
    fn inspect_reports_static_and_dynamic_slots() {
        let script = Script::parse(SCRIPT).expect("parse");
        let layout = inspect(&script).expect("inspect");

        assert_eq!(layout.static_len, 2);
        assert_eq!(layout.dynamic_len, 6);
        assert_eq!(layout.tab_size, 2);
        assert_eq!(layout.evaluation_order.last(), Some(&"edits"));
        let status = layout
            .slots
            .iter()
            .find(|info| info.name == "status")
            .expect("status");
        assert!(matches!(status.address, Some(Address::Dynamic(_))));
    }
}
