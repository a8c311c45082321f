//! The command editor engine.
//!
//! [`CommandEditor`] owns a [`Document`] together with the per-field state needed to turn
//! recognition results into edits:
//!
//! - the rule table, which decides whether an utterance is literal text or a command;
//! - the session, which remembers the last partial result so the next result only rewrites
//!   what changed;
//! - the command prefix, the last few literal utterances that a later utterance may turn
//!   into a command retroactively;
//! - the undo stack and the operation memory used by `combine` and `apply`.
//!
//! # Example
//!
//! ```rust
//! use dictation_core::{CommandEditor, Rule, RuleTable, TextBuffer};
//!
//! let mut editor = CommandEditor::new(TextBuffer::new("Test word1 word2"));
//! editor.set_rules(RuleTable::new(vec![
//!     Rule::command("connect (.*) and (.*)", "", "replace", ["$1 $2", "$1-$2"]).unwrap(),
//! ]));
//!
//! editor.commit_final("connect word1");
//! editor.commit_final("and");
//! let result = editor.commit_final("word2");
//! assert!(result.is_success());
//! assert_eq!(editor.document().to_string(), "Test word1-word2");
//!
//! editor.undo(1).unwrap();
//! assert_eq!(editor.document().to_string(), "Test word1 word2");
//! ```

use crate::config::EditorConfig;
use crate::dispatch::{Command, DispatchError};
use crate::document::{Document, EditBatch};
use crate::history::{CommandPrefix, OpStack, PrefixEntry, UndoStack};
use crate::operation::{Inverse, Op, OpError};
use crate::rewriter::{Rewrite, RuleTable};
use crate::text;
use std::fmt;
use thiserror::Error;

/// Errors reported by engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    /// The command could not be resolved.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    /// The operation failed; the document is unchanged.
    #[error(transparent)]
    Op(#[from] OpError),
    /// The undo stack ran out before all requested steps were undone.
    #[error("undo stopped after {completed} of {requested} steps: nothing left to undo")]
    UndoUnderflow {
        /// Steps requested.
        requested: usize,
        /// Steps undone.
        completed: usize,
    },
    /// An undo entry failed to run. It is not put back on the stack.
    #[error("undo entry '{entry}' failed after {completed} of {requested} steps")]
    UndoFailed {
        /// Steps requested.
        requested: usize,
        /// Steps undone before the failure.
        completed: usize,
        /// Label of the failed entry.
        entry: String,
        /// Why the entry failed.
        #[source]
        source: OpError,
    },
    /// `apply` was called with no remembered operation.
    #[error("no operation to apply")]
    NothingToApply,
    /// `combine` asked for more operations than are remembered.
    #[error("cannot combine {requested} operations: only {available} remembered")]
    NotEnoughOperations {
        /// Operations requested.
        requested: usize,
        /// Operations remembered.
        available: usize,
    },
}

/// Outcome of [`CommandEditor::commit_final`].
#[derive(Debug, Clone, PartialEq)]
pub struct CommitResult {
    /// How the utterance was interpreted.
    pub rewrite: Rewrite,
    /// `Ok` if the literal text was written and the command, if any, succeeded.
    pub outcome: Result<(), CommandError>,
}

impl CommitResult {
    /// Returns `true` if the utterance was a command.
    pub fn is_command(&self) -> bool {
        self.rewrite.is_command()
    }

    /// Returns `true` if nothing failed.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

impl fmt::Display for CommitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_command() {
            let sign = if self.is_success() { '+' } else { '-' };
            write!(f, "{sign}{}", self.rewrite)
        } else {
            write!(f, "{}", self.rewrite)
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Session {
    /// The last partial result, after rewriting.
    previous_partial: String,
    /// Characters the current utterance occupies in the document, glue included.
    added_len: usize,
}

/// Turns recognition results into document edits.
#[derive(Debug)]
pub struct CommandEditor<D: Document> {
    document: D,
    rules: RuleTable,
    config: EditorConfig,
    undo: UndoStack,
    ops: OpStack,
    prefix: CommandPrefix,
    session: Session,
}

impl<D: Document> CommandEditor<D> {
    /// Create an editor over `document` with the default configuration and no rules.
    pub fn new(document: D) -> Self {
        Self::with_config(document, EditorConfig::default())
    }

    /// Create an editor over `document` with `config` and no rules.
    pub fn with_config(document: D, config: EditorConfig) -> Self {
        Self {
            document,
            rules: RuleTable::empty(),
            undo: UndoStack::new(config.undo_capacity),
            ops: OpStack::new(config.op_capacity),
            prefix: CommandPrefix::new(config.max_command_prefix),
            session: Session::default(),
            config,
        }
    }

    /// Replace the rule table.
    pub fn set_rules(&mut self, rules: RuleTable) {
        self.rules = rules;
    }

    /// The active rule table.
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// The configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The document.
    pub fn document(&self) -> &D {
        &self.document
    }

    /// Mutable access to the document, e.g. for edits made outside the engine.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    /// Consume the editor and return the document.
    pub fn into_document(self) -> D {
        self.document
    }

    /// The undo stack.
    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    /// The remembered forward operations.
    pub fn op_stack(&self) -> &OpStack {
        &self.ops
    }

    /// Forget the command prefix and the partial result. Undo history is kept.
    pub fn reset(&mut self) {
        self.prefix.clear();
        self.session = Session::default();
    }

    /// Switch to another document (text field) and return the previous one.
    ///
    /// Undo history, operation memory, the command prefix and the session all belong to a
    /// single field and are dropped.
    pub fn replace_document(&mut self, document: D) -> D {
        self.clear_field_state();
        std::mem::replace(&mut self.document, document)
    }

    /// Write an interim recognition result.
    ///
    /// Returns `false` without touching the document if there is a non-empty selection
    /// (it may be the target of the command being spoken) or if the document rejects the edit.
    /// Commands are never executed from partial results.
    pub fn commit_partial(&mut self, text: &str) -> bool {
        if !self.document.selected_text().is_empty() {
            return false;
        }

        let rewritten = self.rules.rewrite(text).text;
        match self.commit_text(&rewritten) {
            Ok(added_len) => {
                self.session = Session {
                    previous_partial: rewritten,
                    added_len,
                };
                true
            }
            Err(err) => {
                tracing::warn!(%err, "document rejected partial result");
                false
            }
        }
    }

    /// Write a final recognition result, executing it if it resolves to a command.
    pub fn commit_final(&mut self, text: &str) -> CommitResult {
        let before = self.document.text();
        let selected = self.document.selected_text();

        let rewrite = match self.resolve(text) {
            Ok(rewrite) => rewrite,
            Err((rewrite, err)) => {
                self.session = Session::default();
                return CommitResult {
                    rewrite,
                    outcome: Err(err),
                };
            }
        };
        let committed = self.commit_text(&rewrite.text);
        self.session = Session::default();

        let added_len = match committed {
            Ok(added_len) => added_len,
            Err(err) => {
                tracing::warn!(
                    %err,
                    text = rewrite.text.as_str(),
                    "document rejected final result"
                );
                return CommitResult {
                    rewrite,
                    outcome: Err(err.into()),
                };
            }
        };

        let mut undo_entries = 0;
        if added_len > 0 {
            let inverse = match before {
                Some(snapshot) if !selected.is_empty() => Inverse::RestoreText {
                    inserted_len: added_len,
                    original: selected,
                    start: snapshot.selection_start,
                    end: snapshot.selection_end,
                },
                _ => Inverse::DeleteText { len: added_len },
            };
            if self.undo.push(inverse) {
                undo_entries = 1;
            }
        }

        let outcome = match &rewrite.command_id {
            Some(id) => {
                self.prefix.clear();
                let outcome = self.dispatch(id, &rewrite.args);
                if let Err(err) = &outcome {
                    tracing::debug!(command = id.as_str(), %err, "command failed");
                }
                outcome
            }
            None => {
                self.prefix.push(PrefixEntry {
                    text: rewrite.text.clone(),
                    undo_entries,
                });
                Ok(())
            }
        };

        CommitResult { rewrite, outcome }
    }

    /// Resolve and run command `id` with `args`, as a command rule would.
    pub fn execute(&mut self, id: &str, args: &[String]) -> Result<(), CommandError> {
        self.prefix.clear();
        self.dispatch(id, args)
    }

    /// Run `op`, push its inverse and remember it for `combine`/`apply`.
    pub fn run(&mut self, op: Op) -> Result<(), CommandError> {
        self.prefix.clear();
        self.run_op(op)
    }

    /// Undo the last `steps` undo entries, newest first.
    ///
    /// Stops at the first entry that fails; that entry is not put back. If the stack runs out
    /// first, the error reports how many steps were completed.
    pub fn undo(&mut self, steps: usize) -> Result<(), CommandError> {
        self.prefix.clear();
        self.undo_entries(steps)
    }

    /// Replace the last `count` remembered operations with one composite operation that runs
    /// them in their original order.
    pub fn combine(&mut self, count: usize) -> Result<(), CommandError> {
        self.prefix.clear();
        if count == 0 {
            return Ok(());
        }
        let available = self.ops.len();
        let ops = self
            .ops
            .pop_n(count)
            .ok_or(CommandError::NotEnoughOperations {
                requested: count,
                available,
            })?;
        let combined = Op::Composite(ops);
        tracing::debug!(op = %combined, "combined operations");
        self.ops.push(combined);
        Ok(())
    }

    /// Run the last remembered operation `times` times.
    ///
    /// Each run pushes its own undo entry. If any run fails, the runs already made are undone
    /// and the error is returned.
    pub fn apply(&mut self, times: usize) -> Result<(), CommandError> {
        self.prefix.clear();
        let op = self.ops.last().cloned().ok_or(CommandError::NothingToApply)?;
        tracing::debug!(%op, times, "apply");

        let mut pushed = 0;
        for _ in 0..times {
            match op.run(&mut self.document) {
                Ok(inverse) => {
                    if self.undo.push(inverse) {
                        pushed += 1;
                    }
                }
                Err(err) => {
                    if let Err(undo_err) = self.undo_entries(pushed) {
                        tracing::warn!(%undo_err, "could not roll back applied operations");
                    }
                    return Err(err.into());
                }
            }
        }

        if leaves_field(&op) && times > 0 {
            self.clear_field_state();
        }
        Ok(())
    }

    fn dispatch(&mut self, id: &str, args: &[String]) -> Result<(), CommandError> {
        let command = Command::parse(id, args, &self.config)?;
        tracing::debug!(command = id, ?args, "dispatch");
        match command {
            Command::Op(op) => self.run_op(op),
            Command::Undo(steps) => self.undo_entries(steps),
            Command::Combine(count) => self.combine(count),
            Command::Apply(times) => self.apply(times),
        }
    }

    fn run_op(&mut self, op: Op) -> Result<(), CommandError> {
        let inverse = op.run(&mut self.document)?;
        if leaves_field(&op) {
            tracing::debug!(%op, "left the field");
            self.clear_field_state();
            return Ok(());
        }
        self.undo.push(inverse);
        self.ops.push(op);
        Ok(())
    }

    fn undo_entries(&mut self, steps: usize) -> Result<(), CommandError> {
        for completed in 0..steps {
            let entry = self.undo.pop().ok_or(CommandError::UndoUnderflow {
                requested: steps,
                completed,
            })?;
            tracing::debug!(%entry, remaining = self.undo.len(), "undo");
            entry
                .run(&mut self.document)
                .map_err(|source| CommandError::UndoFailed {
                    requested: steps,
                    completed,
                    entry: entry.to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    fn clear_field_state(&mut self) {
        self.undo.clear();
        self.ops.clear();
        self.reset();
    }

    /// Interpret `utterance`, possibly together with the buffered literal utterances before it.
    ///
    /// Windows are tried from the largest to the smallest; the first one that resolves to a
    /// command wins. The literal text of the absorbed utterances, and any partial text of the
    /// current one, is taken back first. A window whose utterances are no longer fully on the
    /// undo stack is skipped. If taking the text back fails, the command is not run and the
    /// error is returned with the rewrite.
    fn resolve(&mut self, utterance: &str) -> Result<Rewrite, (Rewrite, CommandError)> {
        let largest = self.config.max_command_prefix.min(self.prefix.len());
        for size in (1..=largest).rev() {
            let candidate = self.prefix.window(size, utterance);
            let rewrite = self.rules.rewrite(&candidate);
            if !rewrite.is_command() {
                continue;
            }

            let entries = self.prefix.undo_entries(size);
            if entries > self.undo.len() {
                tracing::debug!(
                    utterance = candidate.as_str(),
                    entries,
                    available = self.undo.len(),
                    "skipping command window whose text was evicted from undo"
                );
                continue;
            }

            tracing::debug!(
                utterance = candidate.as_str(),
                absorbed = size,
                "command spans earlier utterances"
            );
            self.prefix.clear();
            let taken_back = self
                .discard_partial()
                .map_err(CommandError::from)
                .and_then(|()| self.undo_entries(entries));
            return match taken_back {
                Ok(()) => Ok(rewrite),
                Err(err) => {
                    tracing::warn!(%err, "could not take back absorbed utterances");
                    Err((rewrite, err))
                }
            };
        }
        Ok(self.rules.rewrite(utterance))
    }

    fn discard_partial(&mut self) -> Result<(), OpError> {
        let len = self.session.added_len;
        self.session = Session::default();
        if len > 0 && !self.document.delete_surrounding_text(len, 0) {
            return Err(OpError::Rejected("deleteSurroundingText"));
        }
        Ok(())
    }

    /// Write `text` over the previous partial result, touching only what changed.
    ///
    /// Returns how many characters the current utterance occupies afterwards.
    fn commit_text(&mut self, text: &str) -> Result<usize, OpError> {
        let previous = self.session.previous_partial.as_str();
        let previous_len = previous.chars().count();
        let common = text::common_prefix_len(previous, text);
        let text_len = text.chars().count();

        let mut doc = EditBatch::begin(&mut self.document);

        // Without a shared prefix the whole previous result goes, glue included.
        let delete = if common == 0 {
            self.session.added_len
        } else {
            previous_len - common
        };
        if delete > 0 && !doc.delete_surrounding_text(delete, 0) {
            return Err(OpError::Rejected("deleteSurroundingText"));
        }

        if text_len == common {
            return Ok(self.session.added_len.saturating_sub(delete));
        }

        let (insert, added_len) = if common == 0 {
            let left = doc
                .text_before_cursor(self.config.max_deletable_context)
                .unwrap_or_default();
            let glue = text::glue(text, &left);
            let insert = format!("{glue}{}", text::capitalize_if_needed(text, &left));
            let added_len = insert.chars().count();
            (insert, added_len)
        } else {
            let common_prefix: String = text.chars().take(common).collect();
            let suffix = text::capitalize_if_needed(text::skip_chars(text, common), &common_prefix);
            let added_len = self.session.added_len.saturating_sub(delete) + suffix.chars().count();
            (suffix, added_len)
        };

        tracing::trace!(
            previous,
            text,
            common,
            delete,
            insert = insert.as_str(),
            "diff commit"
        );
        if !doc.insert_text(&insert) {
            return Err(OpError::Rejected("insertText"));
        }
        Ok(added_len)
    }
}

fn leaves_field(op: &Op) -> bool {
    match op {
        Op::EditorAction(action) => action.leaves_field(),
        Op::Composite(ops) => ops.iter().any(leaves_field),
        _ => false,
    }
}
