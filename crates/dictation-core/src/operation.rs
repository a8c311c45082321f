//! Reversible operations.
//!
//! An [`Op`] is a named forward operation. Running it against a [`Document`] either fails
//! without changing the document, or succeeds and returns an [`Inverse`] that captures exactly
//! the pre-mutation state (old text, old selection) needed to undo it.
//!
//! Both types are plain values: the engine keeps forward ops in its operation memory (for
//! `combine`/`apply`) and inverses on the undo stack.
//!
//! Every run happens inside an [`EditBatch`]. Compound operations that fail halfway undo the
//! steps they already performed before reporting the error.

use crate::document::{Arrow, ContextAction, Document, EditBatch, EditorAction, Key, TextSnapshot};
use crate::search::{self, SearchMatch};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Placeholder that [`Op::ReplaceSelection`] substitutes with the selected text.
pub const SELECTION_REFERENCE: &str = "{}";

/// A token optionally preceded by whitespace.
static WHITESPACE_AND_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\w+").expect("valid regex"));

/// Reasons an operation can fail. A failed operation leaves the document unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpError {
    /// The document could not provide its text.
    #[error("document text is unavailable")]
    DocumentUnavailable,
    /// The search query does not occur left of the cursor.
    #[error("'{0}' not found before the cursor")]
    NotFound(String),
    /// The pattern has no match left of the cursor.
    #[error("pattern '{0}' has no match before the cursor")]
    NoMatch(String),
    /// The selection does not hold an integer.
    #[error("selection '{0}' is not an integer")]
    NotAnInteger(String),
    /// A cursor move would leave the document.
    #[error("cannot move {delta} characters from offset {from}")]
    OutOfRange {
        /// Offset the move starts from.
        from: usize,
        /// Requested move.
        delta: isize,
    },
    /// There is nothing left of the cursor that can be deleted as a word.
    #[error("no word before the cursor")]
    NoWordBeforeCursor,
    /// The operation needs a non-empty selection.
    #[error("nothing is selected")]
    EmptySelection,
    /// The document refused a primitive request.
    #[error("document rejected {0}")]
    Rejected(&'static str),
    /// A search pattern failed to compile.
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

/// A forward operation.
#[derive(Debug, Clone)]
pub enum Op {
    /// Select the last case-insensitive occurrence of `query` before the cursor.
    Select {
        /// Text to look for.
        query: String,
    },
    /// Select the last match of `pattern` before the cursor (first group if present).
    SelectReBefore {
        /// Compiled pattern.
        pattern: Regex,
    },
    /// Select the whole text.
    SelectAll,
    /// Collapse the selection to its end.
    ResetSelection,
    /// Replace the last occurrence of `query` before the cursor with `replacement`.
    Replace {
        /// Text to look for.
        query: String,
        /// Replacement; empty means delete.
        replacement: String,
    },
    /// Replace the selection with `template`, where [`SELECTION_REFERENCE`] stands for the
    /// selected text.
    ReplaceSelection {
        /// Replacement template.
        template: String,
    },
    /// Upper-case the selection.
    UppercaseSelection,
    /// Lower-case the selection.
    LowercaseSelection,
    /// Replace an integer selection with its successor.
    IncrementSelection,
    /// Move the caret by `delta` characters (negative moves left from the selection start,
    /// positive moves right from the selection end).
    Move {
        /// Signed character count.
        delta: isize,
    },
    /// Put the caret at `pos`.
    GoToPosition {
        /// Character offset.
        pos: usize,
    },
    /// Put the caret at the end of the text.
    GoToEnd,
    /// Press an arrow key.
    Arrow(Arrow),
    /// Delete the selection, or the word (with its leading whitespace) left of the cursor.
    DeleteLeftWord {
        /// How many characters left of the cursor are inspected.
        max_context: usize,
    },
    /// Delete the whole text.
    DeleteAll,
    /// Write `text` over the selection.
    InsertText {
        /// Text to write.
        text: String,
    },
    /// Cut the selection.
    Cut,
    /// Copy the selection.
    Copy,
    /// Paste over the selection.
    Paste,
    /// Select everything and cut it.
    CutAll,
    /// Select everything and copy it.
    CopyAll,
    /// Deliver a key press.
    Key(Key),
    /// Perform an editor action.
    EditorAction(EditorAction),
    /// Run several operations in order as one unit.
    Composite(Vec<Op>),
}

/// The undo half of a successful operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inverse {
    /// Nothing to undo. Never stored on the undo stack.
    NoOp,
    /// Restore a selection.
    RestoreSelection {
        /// Selection start.
        start: usize,
        /// Selection end.
        end: usize,
    },
    /// Delete `len` characters left of the cursor.
    DeleteText {
        /// Character count.
        len: usize,
    },
    /// Delete `inserted_len` characters left of the cursor, write `original` back and
    /// restore the selection.
    RestoreText {
        /// Characters the forward operation inserted.
        inserted_len: usize,
        /// Text the forward operation removed.
        original: String,
        /// Selection start before the forward operation.
        start: usize,
        /// Selection end before the forward operation.
        end: usize,
    },
    /// Write `text` at the cursor.
    InsertText {
        /// Text to write.
        text: String,
    },
    /// Press an arrow key.
    Arrow(Arrow),
    /// Several inverses, stored in forward order and run newest first.
    Sequence(Vec<Inverse>),
}

impl Inverse {
    /// Returns `true` if running this inverse would do nothing.
    pub fn is_no_op(&self) -> bool {
        match self {
            Inverse::NoOp => true,
            Inverse::Sequence(steps) => steps.iter().all(Inverse::is_no_op),
            _ => false,
        }
    }

    /// Undo the forward operation this inverse belongs to.
    pub fn run<D: Document + ?Sized>(&self, doc: &mut D) -> Result<(), OpError> {
        let mut batch = EditBatch::begin(doc);
        self.run_in_batch(&mut *batch)
    }

    fn run_in_batch<D: Document + ?Sized>(&self, doc: &mut D) -> Result<(), OpError> {
        match self {
            Inverse::NoOp => Ok(()),
            Inverse::RestoreSelection { start, end } => {
                check(doc.set_selection(*start, *end), "setSelection")
            }
            Inverse::DeleteText { len } => {
                check(doc.delete_surrounding_text(*len, 0), "deleteSurroundingText")
            }
            Inverse::RestoreText {
                inserted_len,
                original,
                start,
                end,
            } => {
                if *inserted_len > 0 {
                    check(
                        doc.delete_surrounding_text(*inserted_len, 0),
                        "deleteSurroundingText",
                    )?;
                }
                if !original.is_empty() {
                    check(doc.insert_text(original), "insertText")?;
                }
                check(doc.set_selection(*start, *end), "setSelection")
            }
            Inverse::InsertText { text } => check(doc.insert_text(text), "insertText"),
            Inverse::Arrow(arrow) => check(doc.send_key(Key::Arrow(*arrow)), "sendKey"),
            Inverse::Sequence(steps) => {
                for step in steps.iter().rev() {
                    step.run_in_batch(doc)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Inverse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inverse::NoOp => f.write_str("noOp"),
            Inverse::RestoreSelection { .. } => f.write_str("select"),
            Inverse::DeleteText { len } => write!(f, "delete {len}"),
            Inverse::RestoreText { inserted_len, .. } => write!(f, "restore {inserted_len}"),
            Inverse::InsertText { text } => write!(f, "insert {}", text.chars().count()),
            Inverse::Arrow(arrow) => write!(f, "go{arrow:?}"),
            Inverse::Sequence(steps) => write_list(f, steps.iter()),
        }
    }
}

impl Op {
    /// Run the operation. On success the returned inverse undoes it.
    pub fn run<D: Document + ?Sized>(&self, doc: &mut D) -> Result<Inverse, OpError> {
        let mut batch = EditBatch::begin(doc);
        self.run_in_batch(&mut *batch)
    }

    fn run_in_batch<D: Document + ?Sized>(&self, doc: &mut D) -> Result<Inverse, OpError> {
        match self {
            Op::Select { query } => {
                let before = snapshot(doc)?;
                let m = find_query(&before, query)?;
                select_range(doc, m.start, m.end, &before)
            }
            Op::SelectReBefore { pattern } => {
                let before = snapshot(doc)?;
                let m =
                    search::find_last_regex_before(&before.text, pattern, before.selection_start)
                        .ok_or_else(|| OpError::NoMatch(pattern.as_str().to_string()))?;
                select_range(doc, m.start, m.end, &before)
            }
            Op::SelectAll => {
                let before = snapshot(doc)?;
                select_range(doc, 0, before.char_count(), &before)
            }
            Op::ResetSelection => {
                let before = snapshot(doc)?;
                select_range(doc, before.selection_end, before.selection_end, &before)
            }
            Op::GoToEnd => {
                let before = snapshot(doc)?;
                let end = before.char_count();
                select_range(doc, end, end, &before)
            }
            Op::GoToPosition { pos } => {
                let before = snapshot(doc)?;
                select_range(doc, *pos, *pos, &before)
            }
            Op::Move { delta } => {
                let before = snapshot(doc)?;
                let from = if *delta < 0 {
                    before.selection_start
                } else {
                    before.selection_end
                };
                let to = from
                    .checked_add_signed(*delta)
                    .filter(|to| *to <= before.char_count())
                    .ok_or(OpError::OutOfRange {
                        from,
                        delta: *delta,
                    })?;
                select_range(doc, to, to, &before)
            }
            Op::Replace { query, replacement } => replace(doc, query, replacement),
            Op::ReplaceSelection { template } => {
                let selected = doc.selected_text();
                replace_selection(doc, &template.replace(SELECTION_REFERENCE, &selected))
            }
            Op::UppercaseSelection => {
                let selected = doc.selected_text();
                replace_selection(doc, &selected.to_uppercase())
            }
            Op::LowercaseSelection => {
                let selected = doc.selected_text();
                replace_selection(doc, &selected.to_lowercase())
            }
            Op::IncrementSelection => {
                let selected = doc.selected_text();
                let next = selected
                    .parse::<i64>()
                    .ok()
                    .and_then(|n| n.checked_add(1))
                    .ok_or_else(|| OpError::NotAnInteger(selected.clone()))?;
                replace_selection(doc, &next.to_string())
            }
            Op::Arrow(arrow) => {
                let before = snapshot(doc)?;
                check(doc.send_key(Key::Arrow(*arrow)), "sendKey")?;
                // The opposite arrow alone cannot bring back a collapsed range or a clamped
                // column, so the old bounds are restored after it.
                Ok(Inverse::Sequence(vec![
                    Inverse::RestoreSelection {
                        start: before.selection_start,
                        end: before.selection_end,
                    },
                    Inverse::Arrow(arrow.opposite()),
                ]))
            }
            Op::DeleteLeftWord { max_context } => delete_left_word(doc, *max_context),
            Op::DeleteAll => {
                let before = snapshot(doc)?;
                let select = select_range(doc, 0, before.char_count(), &before)?;
                let delete = with_rollback(doc, &select, |doc| replace_selection(doc, ""))?;
                Ok(Inverse::Sequence(vec![select, delete]))
            }
            Op::InsertText { text } => replace_selection(doc, text),
            Op::Cut => cut(doc),
            Op::Copy => {
                check(doc.perform_context_action(ContextAction::Copy), "copy")?;
                Ok(Inverse::NoOp)
            }
            Op::Paste => {
                let before = snapshot(doc)?;
                check(doc.perform_context_action(ContextAction::Paste), "paste")?;
                let after = snapshot(doc)?;
                let kept = before.char_count() - (before.selection_end - before.selection_start);
                Ok(Inverse::RestoreText {
                    inserted_len: after.char_count().saturating_sub(kept),
                    original: before.selected_text(),
                    start: before.selection_start,
                    end: before.selection_end,
                })
            }
            Op::CutAll => {
                let before = snapshot(doc)?;
                let select = select_range(doc, 0, before.char_count(), &before)?;
                let cut = with_rollback(doc, &select, cut)?;
                Ok(Inverse::Sequence(vec![select, cut]))
            }
            Op::CopyAll => {
                let before = snapshot(doc)?;
                let select = select_range(doc, 0, before.char_count(), &before)?;
                with_rollback(doc, &select, |doc| {
                    check(doc.perform_context_action(ContextAction::Copy), "copy")
                })?;
                Ok(select)
            }
            Op::Key(key) => {
                check(doc.send_key(*key), "sendKey")?;
                Ok(Inverse::NoOp)
            }
            Op::EditorAction(action) => {
                check(doc.perform_editor_action(*action), "editorAction")?;
                Ok(Inverse::NoOp)
            }
            Op::Composite(ops) => {
                let mut done: Vec<Inverse> = Vec::with_capacity(ops.len());
                for op in ops {
                    match op.run_in_batch(doc) {
                        Ok(inverse) => done.push(inverse),
                        Err(err) => {
                            rollback(doc, &Inverse::Sequence(done));
                            return Err(err);
                        }
                    }
                }
                Ok(Inverse::Sequence(done))
            }
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Select { query } => write!(f, "select({query})"),
            Op::SelectReBefore { pattern } => write!(f, "selectReBefore({})", pattern.as_str()),
            Op::SelectAll => f.write_str("selectAll"),
            Op::ResetSelection => f.write_str("resetSel"),
            Op::Replace { query, replacement } => write!(f, "replace({query},{replacement})"),
            Op::ReplaceSelection { template } => write!(f, "replaceSel({template})"),
            Op::UppercaseSelection => f.write_str("ucSel"),
            Op::LowercaseSelection => f.write_str("lcSel"),
            Op::IncrementSelection => f.write_str("incSel"),
            Op::Move { delta } => write!(f, "move({delta})"),
            Op::GoToPosition { pos } => write!(f, "goToCharacterPosition({pos})"),
            Op::GoToEnd => f.write_str("goToEnd"),
            Op::Arrow(arrow) => write!(f, "go{arrow:?}"),
            Op::DeleteLeftWord { .. } => f.write_str("deleteLeftWord"),
            Op::DeleteAll => f.write_str("deleteAll"),
            Op::InsertText { text } => write!(f, "insert({text:?})"),
            Op::Cut => f.write_str("cut"),
            Op::Copy => f.write_str("copy"),
            Op::Paste => f.write_str("paste"),
            Op::CutAll => f.write_str("cutAll"),
            Op::CopyAll => f.write_str("copyAll"),
            Op::Key(key) => write!(f, "key({key:?})"),
            Op::EditorAction(action) => write!(f, "editorAction({action:?})"),
            Op::Composite(ops) => write_list(f, ops.iter()),
        }
    }
}

pub(crate) fn write_list<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

fn check(accepted: bool, primitive: &'static str) -> Result<(), OpError> {
    if accepted {
        Ok(())
    } else {
        Err(OpError::Rejected(primitive))
    }
}

fn snapshot<D: Document + ?Sized>(doc: &D) -> Result<TextSnapshot, OpError> {
    doc.text().ok_or(OpError::DocumentUnavailable)
}

fn find_query(before: &TextSnapshot, query: &str) -> Result<SearchMatch, OpError> {
    search::find_last_before(&before.text, query, before.selection_start)?
        .ok_or_else(|| OpError::NotFound(query.to_string()))
}

/// Undo already performed steps of a failing operation.
fn rollback<D: Document + ?Sized>(doc: &mut D, inverse: &Inverse) {
    if let Err(err) = inverse.run_in_batch(doc) {
        tracing::warn!(%inverse, %err, "rollback of a failed operation did not complete");
    }
}

/// Run `step`; if it fails, roll back `done` before returning the error.
fn with_rollback<D, T, F>(doc: &mut D, done: &Inverse, step: F) -> Result<T, OpError>
where
    D: Document + ?Sized,
    F: FnOnce(&mut D) -> Result<T, OpError>,
{
    step(doc).inspect_err(|_| rollback(doc, done))
}

fn select_range<D: Document + ?Sized>(
    doc: &mut D,
    start: usize,
    end: usize,
    before: &TextSnapshot,
) -> Result<Inverse, OpError> {
    check(doc.set_selection(start, end), "setSelection")?;
    Ok(Inverse::RestoreSelection {
        start: before.selection_start,
        end: before.selection_end,
    })
}

/// Write `new_text` over the selection, remembering what it replaced.
fn replace_selection<D: Document + ?Sized>(
    doc: &mut D,
    new_text: &str,
) -> Result<Inverse, OpError> {
    let before = snapshot(doc)?;
    check(doc.insert_text(new_text), "insertText")?;
    Ok(Inverse::RestoreText {
        inserted_len: new_text.chars().count(),
        original: before.selected_text(),
        start: before.selection_start,
        end: before.selection_end,
    })
}

fn replace<D: Document + ?Sized>(
    doc: &mut D,
    query: &str,
    replacement: &str,
) -> Result<Inverse, OpError> {
    let before = snapshot(doc)?;
    let m = find_query(&before, query)?;
    let matched: String = before.text.chars().skip(m.start).take(m.len()).collect();

    check(doc.set_selection(m.start, m.start), "setSelection")?;
    let restore_selection = Inverse::RestoreSelection {
        start: before.selection_start,
        end: before.selection_end,
    };
    with_rollback(doc, &restore_selection, |doc| {
        check(doc.delete_surrounding_text(0, m.len()), "deleteSurroundingText")
    })?;

    let mut inverse = Inverse::RestoreText {
        inserted_len: 0,
        original: matched,
        start: before.selection_start,
        end: before.selection_end,
    };
    if replacement.is_empty() {
        return Ok(inverse);
    }

    with_rollback(doc, &inverse, |doc| {
        check(doc.insert_text(replacement), "insertText")
    })?;
    if let Inverse::RestoreText { inserted_len, .. } = &mut inverse {
        *inserted_len = replacement.chars().count();
    }
    Ok(inverse)
}

fn cut<D: Document + ?Sized>(doc: &mut D) -> Result<Inverse, OpError> {
    let before = snapshot(doc)?;
    if before.is_caret() {
        return Err(OpError::EmptySelection);
    }
    check(doc.perform_context_action(ContextAction::Cut), "cut")?;
    Ok(Inverse::RestoreText {
        inserted_len: 0,
        original: before.selected_text(),
        start: before.selection_start,
        end: before.selection_end,
    })
}

fn delete_left_word<D: Document + ?Sized>(
    doc: &mut D,
    max_context: usize,
) -> Result<Inverse, OpError> {
    if !doc.selected_text().is_empty() {
        return replace_selection(doc, "");
    }

    let before_cursor = doc
        .text_before_cursor(max_context)
        .ok_or(OpError::DocumentUnavailable)?;

    // If the cursor touches a token, delete the token and the whitespace before it;
    // otherwise delete whatever follows the last token.
    let mut cut_at = 0;
    for m in WHITESPACE_AND_TOKEN.find_iter(&before_cursor) {
        cut_at = if m.end() == before_cursor.len() {
            m.start()
        } else {
            m.end()
        };
    }
    if cut_at == 0 && before_cursor.chars().count() >= max_context {
        return Err(OpError::NoWordBeforeCursor);
    }

    let deleted = &before_cursor[cut_at..];
    let len = deleted.chars().count();
    if len == 0 {
        return Err(OpError::NoWordBeforeCursor);
    }
    check(doc.delete_surrounding_text(len, 0), "deleteSurroundingText")?;
    Ok(Inverse::InsertText {
        text: deleted.to_string(),
    })
}
