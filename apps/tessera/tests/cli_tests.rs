//! Integration tests for script loading and the CLI commands.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};
use tessera::cli::{self, Cli, Commands, load_script};
use tessera::{CliError, inspect, replay};

const SESSION: &str = r#"
[document]
text = "fn main() {}"
cursor = 0

[[tab_size]]
value = 2
prec = "fallback"

[[tab_size]]
value = 3
prec = "extend"

[[step]]
label = "comment"
insert = { at = 0, text = "// entry\n" }

[[step]]
label = "move"
cursor = 3

[[step]]
label = "classify"
language = "rust"

[[step]]
label = "wider"
tab_size = 8

[[step]]
label = "trim"
delete = { from = 0, to = 9 }
"#;

fn script_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// =============================================================================
// SCRIPT LOADING
// =============================================================================

#[test]
fn test_load_script_from_file() {
    let file = script_file(SESSION);
    let script = load_script(file.path()).unwrap();

    assert_eq!(script.document.text, "fn main() {}");
    assert_eq!(script.tab_size.len(), 2);
    assert_eq!(script.steps.len(), 5);
}

#[test]
fn test_load_script_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing: PathBuf = dir.path().join("absent.toml");

    let err = load_script(&missing).unwrap_err();
    assert!(matches!(err, CliError::Io { .. }));
}

#[test]
fn test_load_script_rejects_directory() {
    let dir = TempDir::new().unwrap();
    let err = load_script(dir.path()).unwrap_err();
    assert!(err.to_string().contains("not a regular file"));
}

#[test]
fn test_load_script_rejects_oversized_file() {
    let big = format!("# {}\n[[step]]\n", "x".repeat(2 * 1024 * 1024));
    let file = script_file(&big);

    let err = load_script(file.path()).unwrap_err();
    assert!(matches!(err, CliError::FileTooLarge { .. }));
}

#[test]
fn test_load_script_rejects_invalid_toml() {
    let file = script_file("[[step]\n");
    let err = load_script(file.path()).unwrap_err();
    assert!(matches!(err, CliError::Parse(_)));
}

// =============================================================================
// REPLAY
// =============================================================================

#[test]
fn test_replay_session() {
    let file = script_file(SESSION);
    let script = load_script(file.path()).unwrap();
    let report = replay(&script).unwrap();

    // extend outranks fallback
    assert_eq!(report.initial.tab_size, 3);
    assert_eq!(report.initial.line_count, 1);

    let comment = &report.steps[0];
    assert_eq!(comment.label, "comment");
    assert_eq!(comment.snapshot.line_count, 2);
    assert_eq!(comment.snapshot.cursor_line, 1);
    assert!(comment.changed.contains(&"revision"));

    let moved = &report.steps[1];
    assert_eq!(moved.changed, vec!["cursor_line", "status"]);
    assert_eq!(moved.snapshot.cursor_line, 0);

    let classify = &report.steps[2];
    assert_eq!(classify.changed, vec!["language", "status"]);

    let wider = &report.steps[3];
    assert!(wider.reconfigured);
    assert_eq!(wider.snapshot.tab_size, 8);
    assert_eq!(wider.snapshot.language, "rust");
    assert_eq!(wider.changed, vec!["tab_size", "indent_unit", "status"]);
    assert!(wider.snapshot.status.contains(&"Spaces: 8".to_string()));

    let trim = &report.steps[4];
    assert_eq!(trim.snapshot.line_count, 1);
    assert_eq!(trim.snapshot.doc_len, "fn main() {}".len());
    assert_eq!(trim.snapshot.revision, 2);
    assert_eq!(trim.snapshot.edits, 2);
}

#[test]
fn test_replay_report_serializes() {
    let script = load_script(script_file(SESSION).path()).unwrap();
    let report = replay(&script).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["steps"].as_array().unwrap().len(), 5);
    assert_eq!(json["steps"][2]["snapshot"]["language"], "rust");
    assert_eq!(json["steps"][3]["reconfigured"], true);
}

// =============================================================================
// INSPECT
// =============================================================================

#[test]
fn test_inspect_layout() {
    let script = load_script(script_file(SESSION).path()).unwrap();
    let layout = inspect(&script).unwrap();

    assert_eq!(layout.tab_size, 3);
    assert_eq!(layout.static_len + layout.dynamic_len, layout.slots.len());
    assert_eq!(
        layout.evaluation_order,
        vec![
            "language",
            "line_count",
            "cursor_line",
            "status",
            "revision",
            "edits"
        ]
    );

    let json = serde_json::to_value(&layout).unwrap();
    assert_eq!(json["slots"][0]["name"], "tab_size");
    assert_eq!(json["slots"][0]["address"]["storage"], "static");
}

// =============================================================================
// COMMANDS
// =============================================================================

#[test]
fn test_execute_commands() {
    let file = script_file(SESSION);
    let path = file.path().to_path_buf();

    for command in [
        Commands::Check {
            script: path.clone(),
        },
        Commands::Inspect {
            script: path.clone(),
        },
        Commands::Replay {
            script: path.clone(),
        },
    ] {
        let cli = Cli {
            verbose: true,
            quiet: true,
            json_mode: false,
            command,
        };
        cli::execute(cli).unwrap();
    }
}

#[test]
fn test_execute_reports_invalid_script() {
    let file = script_file("[document]\ntext = \"abc\"\ncursor = 9\n[[step]]\n");
    let cli = Cli {
        verbose: false,
        quiet: true,
        json_mode: true,
        command: Commands::Replay {
            script: file.path().to_path_buf(),
        },
    };

    let err = cli::execute(cli).unwrap_err();
    assert!(err.to_string().contains("document cursor 9"));
}
