//! Document capability interface.
//!
//! The engine never talks to a concrete text widget. Everything it needs from the host is
//! expressed by the [`Document`] trait: a text snapshot with selection bounds, a few
//! cursor-relative edit primitives, and passthroughs for keys, clipboard actions and editor
//! actions.
//!
//! All offsets are **character offsets** (Unicode scalar values), and selections are
//! half-open `[start, end)` ranges with `start <= end`.
//!
//! Compound manipulations are wrapped in an [`EditBatch`], which calls
//! [`Document::begin_edit`] on creation and [`Document::end_edit`] when dropped, so a batch is
//! closed on every exit path, including early `?` returns.

use std::ops::{Deref, DerefMut};

/// A snapshot of the document text together with the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSnapshot {
    /// Full document text.
    pub text: String,
    /// Selection start (character offset, inclusive).
    pub selection_start: usize,
    /// Selection end (character offset, exclusive).
    pub selection_end: usize,
}

impl TextSnapshot {
    /// Returns `true` if the selection is a caret (empty range).
    pub fn is_caret(&self) -> bool {
        self.selection_start == self.selection_end
    }

    /// Length of the text in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// The selected text (empty for a caret).
    pub fn selected_text(&self) -> String {
        self.text
            .chars()
            .skip(self.selection_start)
            .take(self.selection_end.saturating_sub(self.selection_start))
            .collect()
    }
}

/// Arrow keys used for cursor navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arrow {
    /// Move one line up.
    Up,
    /// Move one line down.
    Down,
    /// Move one grapheme left.
    Left,
    /// Move one grapheme right.
    Right,
}

impl Arrow {
    /// The arrow that undoes a move in this direction.
    pub fn opposite(self) -> Self {
        match self {
            Arrow::Up => Arrow::Down,
            Arrow::Down => Arrow::Up,
            Arrow::Left => Arrow::Right,
            Arrow::Right => Arrow::Left,
        }
    }
}

/// A key press delivered to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Arrow key.
    Arrow(Arrow),
    /// Enter / Return.
    Enter,
    /// Tab.
    Tab,
    /// Space bar.
    Space,
    /// Backspace (delete left).
    Backspace,
    /// Forward delete.
    Delete,
    /// Move to the start of the line.
    Home,
    /// Move to the end of the line.
    End,
    /// A printable character key.
    Char(char),
}

impl Key {
    /// Resolve a numeric key code.
    ///
    /// The numbering follows the key codes speech front-ends commonly emit (the Android
    /// `KeyEvent` table): `19..=22` arrows, `66` enter, `61` tab, `62` space, `67` backspace,
    /// `112` forward delete, `122`/`123` home/end, `7..=16` digits and `29..=54` letters.
    pub fn from_code(code: u32) -> Option<Self> {
        let key = match code {
            7..=16 => Key::Char(char::from(b'0' + (code - 7) as u8)),
            19 => Key::Arrow(Arrow::Up),
            20 => Key::Arrow(Arrow::Down),
            21 => Key::Arrow(Arrow::Left),
            22 => Key::Arrow(Arrow::Right),
            29..=54 => Key::Char(char::from(b'a' + (code - 29) as u8)),
            61 => Key::Tab,
            62 => Key::Space,
            66 => Key::Enter,
            67 => Key::Backspace,
            112 => Key::Delete,
            122 => Key::Home,
            123 => Key::End,
            _ => return None,
        };
        Some(key)
    }

    /// Resolve a symbolic key name such as `ENTER`, `DPAD_LEFT`, `DEL` or `A`.
    ///
    /// A bare letter or digit types that character as given. Other names match
    /// case-insensitively, with an optional `KEYCODE_` prefix.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let mut chars = name.chars();
        if let (Some(ch), None) = (chars.next(), chars.next())
            && ch.is_ascii_alphanumeric()
        {
            return Some(Key::Char(ch));
        }

        let upper = name.to_ascii_uppercase();
        let upper = upper.strip_prefix("KEYCODE_").unwrap_or(&upper);
        if let [ch] = upper.as_bytes()
            && ch.is_ascii_alphanumeric()
        {
            return Some(Key::Char(char::from(ch.to_ascii_lowercase())));
        }

        let key = match upper {
            "DPAD_UP" | "UP" => Key::Arrow(Arrow::Up),
            "DPAD_DOWN" | "DOWN" => Key::Arrow(Arrow::Down),
            "DPAD_LEFT" | "LEFT" => Key::Arrow(Arrow::Left),
            "DPAD_RIGHT" | "RIGHT" => Key::Arrow(Arrow::Right),
            "ENTER" | "RETURN" => Key::Enter,
            "TAB" => Key::Tab,
            "SPACE" => Key::Space,
            "DEL" | "BACKSPACE" => Key::Backspace,
            "FORWARD_DEL" | "DELETE" => Key::Delete,
            "MOVE_HOME" | "HOME" => Key::Home,
            "MOVE_END" | "END" => Key::End,
            _ => return None,
        };
        Some(key)
    }
}

/// Clipboard actions from the text field's context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextAction {
    /// Cut the selection to the clipboard.
    Cut,
    /// Copy the selection to the clipboard.
    Copy,
    /// Paste the clipboard over the selection.
    Paste,
}

/// Editor (IME) actions that are forwarded to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorAction {
    /// "Done".
    Done,
    /// "Go".
    Go,
    /// "Search".
    Search,
    /// "Send".
    Send,
    /// Move focus to the previous field.
    PreviousField,
    /// Move focus to the next field.
    NextField,
}

impl EditorAction {
    /// Returns `true` if performing the action moves focus away from the current field.
    pub fn leaves_field(self) -> bool {
        matches!(self, EditorAction::PreviousField | EditorAction::NextField)
    }
}

/// Capability interface over an editable text buffer with a cursor/selection.
///
/// Implemented by the host; the engine only ever uses these operations. Boolean results
/// report whether the document accepted the request.
pub trait Document {
    /// Full text with selection bounds, or `None` if the document cannot currently provide it.
    fn text(&self) -> Option<TextSnapshot>;

    /// Up to `max_chars` characters immediately before the selection start.
    fn text_before_cursor(&self, max_chars: usize) -> Option<String>;

    /// The currently selected text (empty if the selection is a caret).
    fn selected_text(&self) -> String;

    /// Set the selection to `[start, end)`. Returns `false` for out-of-range offsets.
    fn set_selection(&mut self, start: usize, end: usize) -> bool;

    /// Delete `before` characters before the selection start and `after` characters after
    /// the selection end, keeping the selection itself.
    fn delete_surrounding_text(&mut self, before: usize, after: usize) -> bool;

    /// Replace the selection with `text`, leaving the caret after the inserted text.
    fn insert_text(&mut self, text: &str) -> bool;

    /// Open an edit batch. Batches nest.
    fn begin_edit(&mut self);

    /// Close the innermost edit batch.
    fn end_edit(&mut self);

    /// Deliver a key press.
    fn send_key(&mut self, key: Key) -> bool;

    /// Perform a clipboard action.
    fn perform_context_action(&mut self, action: ContextAction) -> bool;

    /// Perform an editor action.
    fn perform_editor_action(&mut self, action: EditorAction) -> bool;
}

impl<D: Document + ?Sized> Document for &mut D {
    fn text(&self) -> Option<TextSnapshot> {
        (**self).text()
    }

    fn text_before_cursor(&self, max_chars: usize) -> Option<String> {
        (**self).text_before_cursor(max_chars)
    }

    fn selected_text(&self) -> String {
        (**self).selected_text()
    }

    fn set_selection(&mut self, start: usize, end: usize) -> bool {
        (**self).set_selection(start, end)
    }

    fn delete_surrounding_text(&mut self, before: usize, after: usize) -> bool {
        (**self).delete_surrounding_text(before, after)
    }

    fn insert_text(&mut self, text: &str) -> bool {
        (**self).insert_text(text)
    }

    fn begin_edit(&mut self) {
        (**self).begin_edit()
    }

    fn end_edit(&mut self) {
        (**self).end_edit()
    }

    fn send_key(&mut self, key: Key) -> bool {
        (**self).send_key(key)
    }

    fn perform_context_action(&mut self, action: ContextAction) -> bool {
        (**self).perform_context_action(action)
    }

    fn perform_editor_action(&mut self, action: EditorAction) -> bool {
        (**self).perform_editor_action(action)
    }
}

/// Scoped edit batch: `begin_edit` on creation, `end_edit` on drop.
pub struct EditBatch<'a, D: Document + ?Sized> {
    doc: &'a mut D,
}

impl<'a, D: Document + ?Sized> EditBatch<'a, D> {
    /// Open a batch on `doc`.
    pub fn begin(doc: &'a mut D) -> Self {
        doc.begin_edit();
        Self { doc }
    }
}

impl<D: Document + ?Sized> Deref for EditBatch<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.doc
    }
}

impl<D: Document + ?Sized> DerefMut for EditBatch<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.doc
    }
}

impl<D: Document + ?Sized> Drop for EditBatch<'_, D> {
    fn drop(&mut self) {
        self.doc.end_edit();
    }
}
