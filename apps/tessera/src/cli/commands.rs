//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::error::CliError;
use crate::replay::{Layout, ReplayReport, inspect, replay};
use crate::script::Script;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE LIMITS
// =============================================================================

/// Maximum script size (1 MB).
const MAX_SCRIPT_FILE_SIZE: u64 = 1024 * 1024;

/// Canonicalize a script path and make sure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, CliError> {
    let canonical = path.canonicalize().map_err(|e| CliError::io(path, e))?;

    if !canonical.is_file() {
        return Err(CliError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }

    Ok(canonical)
}

fn validate_file_size(path: &Path, max_size: u64) -> Result<(), CliError> {
    let metadata = std::fs::metadata(path).map_err(|e| CliError::io(path, e))?;

    if metadata.len() > max_size {
        return Err(CliError::FileTooLarge {
            size: metadata.len(),
            max: max_size,
        });
    }
    Ok(())
}

/// Read, parse and validate a script file.
pub fn load_script(path: &Path) -> Result<Script, CliError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_SCRIPT_FILE_SIZE)?;

    let source = std::fs::read_to_string(&validated).map_err(|e| CliError::io(&validated, e))?;
    let script = Script::parse(&source)?;
    tracing::debug!(path = %validated.display(), steps = script.steps.len(), "script loaded");
    Ok(script)
}

// =============================================================================
// REPLAY COMMAND
// =============================================================================

/// Replay a script and print every step.
pub fn cmd_replay(path: &Path, json_mode: bool, verbose: bool) -> Result<(), CliError> {
    let script = load_script(path)?;
    let report = replay(&script)?;

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_replay(&report, verbose);
    Ok(())
}

fn print_replay(report: &ReplayReport, verbose: bool) {
    println!("Tessera Replay");
    println!("==============");
    println!(
        "Initial: {} bytes, {} lines, tab size {}",
        report.initial.doc_len, report.initial.line_count, report.initial.tab_size
    );
    println!();

    for step in &report.steps {
        let marker = if step.reconfigured { " [reconfigured]" } else { "" };
        println!("Step {}: {}{}", step.index, step.label, marker);
        if step.changed.is_empty() {
            println!("  Changed: (nothing)");
        } else {
            println!("  Changed: {}", step.changed.join(", "));
        }
        println!("  Status:  {}", step.snapshot.status.join(" | "));
        if verbose {
            let s = &step.snapshot;
            println!("  Revision:    {}", s.revision);
            println!("  Lines:       {}", s.line_count);
            println!("  Cursor:      {} (line {})", s.cursor, s.cursor_line + 1);
            println!("  Language:    {}", s.language);
            println!("  Line edits:  {}", s.edits);
            println!("  Tab size:    {}", s.tab_size);
        }
    }
}

// =============================================================================
// INSPECT COMMAND
// =============================================================================

/// Print the resolved layout of a script's configuration.
pub fn cmd_inspect(path: &Path, json_mode: bool) -> Result<(), CliError> {
    let script = load_script(path)?;
    let layout = inspect(&script)?;

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(());
    }

    print_layout(&layout);
    Ok(())
}

fn print_layout(layout: &Layout) {
    println!("Tessera Configuration");
    println!("=====================");
    println!("Static slots:  {}", layout.static_len);
    println!("Dynamic slots: {}", layout.dynamic_len);
    println!("Tab size:      {}", layout.tab_size);
    println!();
    println!("Evaluation order: {}", layout.evaluation_order.join(" -> "));
    println!();
    println!("Slots:");
    for info in &layout.slots {
        let address = match info.address {
            Some(tessera_core::Address::Static(i)) => format!("static[{}]", i),
            Some(tessera_core::Address::Dynamic(i)) => format!("dynamic[{}]", i),
            None => "unconfigured".to_string(),
        };
        println!("  {:<12} {:<10} {}", info.name, info.slot, address);
    }
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Validate a script without resolving it.
pub fn cmd_check(path: &Path, json_mode: bool) -> Result<(), CliError> {
    let script = load_script(path)?;

    if json_mode {
        let output = serde_json::json!({
            "valid": true,
            "steps": script.steps.len(),
            "tab_size_entries": script.tab_size.len(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "Script OK: {} steps, {} tab size entries",
        script.steps.len(),
        script.tab_size.len()
    );
    Ok(())
}
