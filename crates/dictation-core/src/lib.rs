#![warn(missing_docs)]
//! Dictation Core - Headless Command Editor for Speech Input
//!
//! # Overview
//!
//! `dictation-core` turns the output of a speech recognizer into edits of a text field.
//! Every utterance is first rewritten by an ordered rule table. The result is either literal
//! text, written at the cursor with automatic spacing and capitalization, or a command such
//! as "select X", "replace X with Y" or "undo 2", executed against the text field.
//!
//! The text field itself is abstracted as a [`Document`]: a host implements a handful of
//! primitive requests (read text, set selection, insert, delete, key presses) and the engine
//! does everything else. [`TextBuffer`] is a ready-made in-memory document.
//!
//! # Core Features
//!
//! - **Incremental commits**: partial results only rewrite the part that changed
//! - **Multi-utterance commands**: a command may span up to four consecutive utterances;
//!   literal text written for the earlier ones is taken back when the command resolves
//! - **Reversible operations**: every edit produces an inverse, kept on a bounded undo stack
//! - **Macros**: `combine N` fuses the last N operations, `apply N` replays the last one
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  CommandEditor (commit, undo, combine/apply)│  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  RuleTable           │  Command dispatch    │  ← Interpretation
//! ├─────────────────────────────────────────────┤
//! │  Op / Inverse        │  Undo & op history   │  ← Reversible edits
//! ├─────────────────────────────────────────────┤
//! │  Document capability (TextBuffer, host)     │  ← Text field
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use dictation_core::{CommandEditor, Rule, RuleTable, TextBuffer};
//!
//! let mut editor = CommandEditor::new(TextBuffer::empty());
//! editor.set_rules(RuleTable::new(vec![
//!     Rule::text(" ?comma", ",").unwrap(),
//!     Rule::command("select (.*)", "", "select", ["$1"]).unwrap(),
//!     Rule::command("selection uppercase", "", "ucSel", Vec::<String>::new()).unwrap(),
//! ]));
//!
//! // Interim results are shown as they arrive, then replaced by the final one.
//! editor.commit_partial("hello");
//! editor.commit_partial("hello world");
//! editor.commit_final("hello world comma");
//! assert_eq!(editor.document().to_string(), "Hello world,");
//!
//! editor.commit_final("select world");
//! editor.commit_final("selection uppercase");
//! assert_eq!(editor.document().to_string(), "Hello WORLD,");
//!
//! editor.undo(2).unwrap();
//! assert_eq!(editor.document().to_string(), "Hello world,");
//! ```
//!
//! # Module Description
//!
//! - [`document`] - Document capability trait, keys and the scoped edit batch
//! - [`buffer`] - Rope-backed in-memory document
//! - [`rewriter`] - Rules, rule table and rewrites
//! - [`operation`] - Forward operations and their inverses
//! - [`history`] - Undo stack and operation memory
//! - [`dispatch`] - Command id table and argument coercion
//! - [`config`] - Engine configuration
//! - [`editor`] - The command editor engine
//! - [`search`] - Character-offset search helpers

pub mod buffer;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod editor;
pub mod history;
pub mod operation;
pub mod rewriter;
pub mod search;
mod text;

pub use buffer::{BufferEdit, TextBuffer};
pub use config::EditorConfig;
pub use dispatch::{Command, CommandId, DispatchError};
pub use document::{Arrow, ContextAction, Document, EditBatch, EditorAction, Key, TextSnapshot};
pub use editor::{CommandEditor, CommandError, CommitResult};
pub use history::{OpStack, UndoStack};
pub use operation::{Inverse, Op, OpError, SELECTION_REFERENCE};
pub use rewriter::{Rewrite, Rule, RuleError, RuleTable};
pub use search::SearchMatch;
