//! # Session Scripts
//!
//! A script is a TOML file describing an initial document, the tab size
//! contributions of the editor configuration and a list of editing steps:
//!
//! ```toml
//! [document]
//! text = "fn main() {}\n"
//! cursor = 0
//!
//! [[tab_size]]
//! value = 2
//! prec = "fallback"
//!
//! [[step]]
//! label = "type"
//! insert = { at = 0, text = "// hello\n" }
//!
//! [[step]]
//! language = "rust"
//! ```
//!
//! Scripts are validated in full, edits included, before any configuration is
//! resolved.

use crate::editor::SetLanguage;
use crate::error::CliError;
use serde::{Deserialize, Serialize};
use tessera_core::{Prec, Selection, State, Text, Transaction};

// =============================================================================
// SCRIPT TYPES
// =============================================================================

/// A parsed session script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// The document the session starts from.
    #[serde(default)]
    pub document: DocumentSpec,

    /// Tab size contributions, in tree order.
    #[serde(default)]
    pub tab_size: Vec<TabSizeEntry>,

    /// Editing steps, applied in order.
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// Initial document and cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentSpec {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub cursor: usize,
}

/// One tab size contribution and its precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TabSizeEntry {
    pub value: u32,
    #[serde(default)]
    pub prec: Prec,
}

/// Text insertion at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Insert {
    pub at: usize,
    pub text: String,
}

/// Deletion of a byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Delete {
    pub from: usize,
    pub to: usize,
}

/// One editing step.
///
/// Within a step the deletion is applied first, then the insertion (offsets
/// relative to the document after the deletion), then the cursor move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub delete: Option<Delete>,
    #[serde(default)]
    pub insert: Option<Insert>,
    #[serde(default)]
    pub cursor: Option<usize>,
    /// Switch the document language (a transaction effect).
    #[serde(default)]
    pub language: Option<String>,
    /// Replace the configuration with one where this tab size overrides the
    /// script's entries. Field values survive the switch.
    #[serde(default)]
    pub tab_size: Option<u32>,
}

// =============================================================================
// LIMITS
// =============================================================================

/// Largest accepted tab size.
pub const MAX_TAB_SIZE: u32 = 16;

/// Largest accepted number of steps.
pub const MAX_STEPS: usize = 10_000;

// =============================================================================
// PARSING AND VALIDATION
// =============================================================================

impl Script {
    /// Parse and validate a script.
    pub fn parse(source: &str) -> Result<Self, CliError> {
        let script: Script = toml::from_str(source)?;
        script.validate()?;
        Ok(script)
    }

    /// Check every offset by replaying the edits on the bare document.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.steps.is_empty() {
            return Err(CliError::Script("script has no [[step]] entries".to_string()));
        }
        if self.steps.len() > MAX_STEPS {
            return Err(CliError::Script(format!(
                "step count {} exceeds maximum allowed {}",
                self.steps.len(),
                MAX_STEPS
            )));
        }
        for entry in &self.tab_size {
            check_tab_size(entry.value)?;
        }

        let mut doc = Text::from(self.document.text.as_str());
        let mut selection = Selection::single(self.document.cursor);
        check_offset(&doc, self.document.cursor, "document cursor")?;

        for (index, step) in self.steps.iter().enumerate() {
            if let Some(size) = step.tab_size {
                check_tab_size(size)?;
            }
            let (next_doc, next_selection) = step.apply(&doc, selection).map_err(|reason| {
                CliError::Script(format!("step {} ({}): {}", index + 1, step.name(), reason))
            })?;
            doc = next_doc;
            selection = next_selection;
        }
        Ok(())
    }
}

fn check_tab_size(size: u32) -> Result<(), CliError> {
    if size == 0 || size > MAX_TAB_SIZE {
        return Err(CliError::Script(format!(
            "tab size {} outside 1..={}",
            size, MAX_TAB_SIZE
        )));
    }
    Ok(())
}

fn check_offset(doc: &Text, offset: usize, what: &str) -> Result<(), CliError> {
    if offset > doc.len() || !doc.as_str().is_char_boundary(offset) {
        return Err(CliError::Script(format!(
            "{} {} is not a character boundary of a {} byte document",
            what,
            offset,
            doc.len()
        )));
    }
    Ok(())
}

// =============================================================================
// STEP APPLICATION
// =============================================================================

impl Step {
    /// Label for reports, falling back to a description of the step.
    pub fn name(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        let mut parts = Vec::new();
        if self.delete.is_some() {
            parts.push("delete");
        }
        if self.insert.is_some() {
            parts.push("insert");
        }
        if self.cursor.is_some() {
            parts.push("cursor");
        }
        if self.language.is_some() {
            parts.push("language");
        }
        if self.tab_size.is_some() {
            parts.push("tab_size");
        }
        if parts.is_empty() {
            "noop".to_string()
        } else {
            parts.join("+")
        }
    }

    /// Resulting document and selection, or why the step does not apply.
    fn apply(&self, doc: &Text, selection: Selection) -> Result<(Text, Selection), String> {
        let mut doc = doc.clone();
        let mut head = selection.head;

        if let Some(delete) = self.delete {
            doc = doc.replace(delete.from, delete.to, "").ok_or_else(|| {
                format!(
                    "delete {}..{} outside a {} byte document",
                    delete.from,
                    delete.to,
                    doc.len()
                )
            })?;
            head = delete.from;
        }
        if let Some(insert) = &self.insert {
            doc = doc.replace(insert.at, insert.at, &insert.text).ok_or_else(|| {
                format!("insert at {} outside a {} byte document", insert.at, doc.len())
            })?;
            head = insert.at + insert.text.len();
        }
        if let Some(cursor) = self.cursor {
            if cursor > doc.len() || !doc.as_str().is_char_boundary(cursor) {
                return Err(format!(
                    "cursor {} outside a {} byte document",
                    cursor,
                    doc.len()
                ));
            }
            head = cursor;
        }

        let len = doc.len();
        Ok((doc, Selection::single(head.min(len))))
    }

    /// Build the transaction this step performs on `state`.
    pub fn transaction(&self, state: &State) -> Result<Transaction, CliError> {
        let (doc, selection) = self
            .apply(state.doc(), state.selection())
            .map_err(|reason| CliError::Script(format!("{}: {}", self.name(), reason)))?;

        let mut tr = Transaction::start(state)
            .with_doc(doc)
            .with_selection(selection);
        if let Some(language) = &self.language {
            tr = tr.with_effect(SetLanguage(language.clone()));
        }
        Ok(tr)
    }
}

// =============================================================================
// TESTS
// =============================================================================
