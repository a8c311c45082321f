//! In-memory document.
//!
//! [`TextBuffer`] is a complete [`Document`] implementation backed by a [`ropey::Rope`].
//! It is what tests and benches drive, and what hosts without a native text widget can use
//! directly.
//!
//! Every primitive text mutation is appended to an edit log of [`BufferEdit`] records,
//! expressed in character offsets at the time the edit was applied. Replaying the log in
//! order transforms the initial text into the current text.

use crate::document::{Arrow, ContextAction, Document, EditorAction, Key, TextSnapshot};
use ropey::Rope;
use unicode_segmentation::UnicodeSegmentation;

/// Number of characters inspected on each side of the caret when looking for a grapheme
/// boundary. Longer clusters are clamped to this window.
const GRAPHEME_WINDOW: usize = 32;

/// A single primitive text edit recorded by [`TextBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferEdit {
    /// Start character offset of the edit.
    pub start: usize,
    /// Exact deleted text (may be empty).
    pub deleted_text: String,
    /// Exact inserted text (may be empty).
    pub inserted_text: String,
}

impl BufferEdit {
    /// Length of `deleted_text` in characters.
    pub fn deleted_len(&self) -> usize {
        self.deleted_text.chars().count()
    }

    /// Length of `inserted_text` in characters.
    pub fn inserted_len(&self) -> usize {
        self.inserted_text.chars().count()
    }
}

/// Rope-backed editable text with a selection, a clipboard and an edit log.
///
/// # Example
///
/// ```rust
/// use dictation_core::{Document, TextBuffer};
///
/// let mut buffer = TextBuffer::new("Hello");
/// buffer.insert_text(" world");
/// assert_eq!(buffer.to_string(), "Hello world");
/// assert_eq!(buffer.selection(), (11, 11));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
    selection_start: usize,
    selection_end: usize,
    batch_depth: usize,
    clipboard: Option<String>,
    editor_actions: Vec<EditorAction>,
    edits: Vec<BufferEdit>,
}

impl TextBuffer {
    /// Create a buffer holding `text`, with the caret at the end.
    pub fn new(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let end = rope.len_chars();
        Self {
            rope,
            selection_start: end,
            selection_end: end,
            ..Self::default()
        }
    }

    /// Create an empty buffer.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Current selection as `(start, end)` character offsets.
    pub fn selection(&self) -> (usize, usize) {
        (self.selection_start, self.selection_end)
    }

    /// Text length in characters.
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    /// Current clipboard contents.
    pub fn clipboard(&self) -> Option<&str> {
        self.clipboard.as_deref()
    }

    /// Replace the clipboard contents.
    pub fn set_clipboard(&mut self, text: impl Into<String>) {
        self.clipboard = Some(text.into());
    }

    /// Editor actions performed so far, oldest first.
    pub fn editor_actions(&self) -> &[EditorAction] {
        &self.editor_actions
    }

    /// Recorded primitive edits, oldest first.
    pub fn edits(&self) -> &[BufferEdit] {
        &self.edits
    }

    /// Take and clear the recorded edits.
    pub fn take_edits(&mut self) -> Vec<BufferEdit> {
        std::mem::take(&mut self.edits)
    }

    /// Depth of currently open edit batches.
    pub fn batch_depth(&self) -> usize {
        self.batch_depth
    }

    fn slice_string(&self, start: usize, end: usize) -> String {
        self.rope.slice(start..end).to_string()
    }

    fn replace_range(&mut self, start: usize, end: usize, text: &str) {
        let deleted_text = self.slice_string(start, end);
        if deleted_text.is_empty() && text.is_empty() {
            return;
        }
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        self.edits.push(BufferEdit {
            start,
            deleted_text,
            inserted_text: text.to_string(),
        });
    }

    fn set_caret(&mut self, pos: usize) {
        self.selection_start = pos;
        self.selection_end = pos;
    }

    fn grapheme_len_before(&self, pos: usize) -> usize {
        let window = self.slice_string(pos.saturating_sub(GRAPHEME_WINDOW), pos);
        window
            .graphemes(true)
            .next_back()
            .map(|g| g.chars().count())
            .unwrap_or(0)
    }

    fn grapheme_len_after(&self, pos: usize) -> usize {
        let end = (pos + GRAPHEME_WINDOW).min(self.rope.len_chars());
        let window = self.slice_string(pos, end);
        window
            .graphemes(true)
            .next()
            .map(|g| g.chars().count())
            .unwrap_or(0)
    }

    /// Length of a line in characters, excluding its line break.
    fn line_len(&self, line: usize) -> usize {
        let slice = self.rope.line(line);
        let mut len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len -= 1;
            if len > 0 && slice.char(len - 1) == '\r' {
                len -= 1;
            }
        }
        len
    }

    fn move_arrow(&mut self, arrow: Arrow) -> bool {
        let (start, end) = self.selection();
        match arrow {
            Arrow::Left => {
                if start != end {
                    self.set_caret(start);
                    return true;
                }
                let step = self.grapheme_len_before(start);
                if step == 0 {
                    return false;
                }
                self.set_caret(start - step);
                true
            }
            Arrow::Right => {
                if start != end {
                    self.set_caret(end);
                    return true;
                }
                let step = self.grapheme_len_after(end);
                if step == 0 {
                    return false;
                }
                self.set_caret(end + step);
                true
            }
            Arrow::Up | Arrow::Down => {
                let line = self.rope.char_to_line(end);
                let column = end - self.rope.line_to_char(line);
                let target = match arrow {
                    Arrow::Up => match line.checked_sub(1) {
                        Some(target) => target,
                        None => return false,
                    },
                    _ => {
                        if line + 1 >= self.rope.len_lines() {
                            return false;
                        }
                        line + 1
                    }
                };
                let pos = self.rope.line_to_char(target) + column.min(self.line_len(target));
                self.set_caret(pos);
                true
            }
        }
    }
}

impl std::fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl Document for TextBuffer {
    fn text(&self) -> Option<TextSnapshot> {
        Some(TextSnapshot {
            text: self.rope.to_string(),
            selection_start: self.selection_start,
            selection_end: self.selection_end,
        })
    }

    fn text_before_cursor(&self, max_chars: usize) -> Option<String> {
        let end = self.selection_start;
        Some(self.slice_string(end.saturating_sub(max_chars), end))
    }

    fn selected_text(&self) -> String {
        self.slice_string(self.selection_start, self.selection_end)
    }

    fn set_selection(&mut self, start: usize, end: usize) -> bool {
        let len = self.rope.len_chars();
        if start > len || end > len {
            return false;
        }
        self.selection_start = start.min(end);
        self.selection_end = start.max(end);
        true
    }

    fn delete_surrounding_text(&mut self, before: usize, after: usize) -> bool {
        let (start, end) = self.selection();

        let after_end = end.saturating_add(after).min(self.rope.len_chars());
        self.replace_range(end, after_end, "");

        let before_start = start.saturating_sub(before);
        self.replace_range(before_start, start, "");

        self.selection_start = before_start;
        self.selection_end = end - (start - before_start);
        true
    }

    fn insert_text(&mut self, text: &str) -> bool {
        let (start, end) = self.selection();
        self.replace_range(start, end, text);
        self.set_caret(start + text.chars().count());
        true
    }

    fn begin_edit(&mut self) {
        self.batch_depth += 1;
    }

    fn end_edit(&mut self) {
        self.batch_depth = self.batch_depth.saturating_sub(1);
    }

    fn send_key(&mut self, key: Key) -> bool {
        match key {
            Key::Arrow(arrow) => self.move_arrow(arrow),
            Key::Enter => self.insert_text("\n"),
            Key::Tab => self.insert_text("\t"),
            Key::Space => self.insert_text(" "),
            Key::Char(ch) => self.insert_text(ch.encode_utf8(&mut [0; 4])),
            Key::Backspace => {
                let (start, end) = self.selection();
                if start != end {
                    return self.insert_text("");
                }
                let step = self.grapheme_len_before(start);
                step > 0 && self.delete_surrounding_text(step, 0)
            }
            Key::Delete => {
                let (start, end) = self.selection();
                if start != end {
                    return self.insert_text("");
                }
                let step = self.grapheme_len_after(end);
                step > 0 && self.delete_surrounding_text(0, step)
            }
            Key::Home => {
                let line = self.rope.char_to_line(self.selection_end);
                self.set_caret(self.rope.line_to_char(line));
                true
            }
            Key::End => {
                let line = self.rope.char_to_line(self.selection_end);
                self.set_caret(self.rope.line_to_char(line) + self.line_len(line));
                true
            }
        }
    }

    fn perform_context_action(&mut self, action: ContextAction) -> bool {
        match action {
            ContextAction::Cut | ContextAction::Copy => {
                let selected = self.selected_text();
                if selected.is_empty() {
                    return false;
                }
                self.clipboard = Some(selected);
                action == ContextAction::Copy || self.insert_text("")
            }
            ContextAction::Paste => match self.clipboard.clone() {
                Some(text) => self.insert_text(&text),
                None => false,
            },
        }
    }

    fn perform_editor_action(&mut self, action: EditorAction) -> bool {
        self.editor_actions.push(action);
        true
    }
}
