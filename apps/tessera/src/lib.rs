//! # tessera
//!
//! Command-line front end for `tessera-core`: loads TOML session scripts,
//! resolves the built-in editor extensions and replays scripted edits.

pub mod cli;
pub mod editor;
pub mod error;
pub mod replay;
pub mod script;

pub use editor::{Editor, SetLanguage, Snapshot};
pub use error::CliError;
pub use replay::{Layout, ReplayReport, SlotInfo, StepReport, inspect, replay};
pub use script::Script;
