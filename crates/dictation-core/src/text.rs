//! Glue, capitalization and prefix helpers for dictated text.

use unicode_segmentation::UnicodeSegmentation;

/// Symbols that are written without a preceding space.
const PUNCTUATION: &[char] = &[',', ':', ';', '.', '!', '?', '-', ')', ']', '}', '…', '%'];

/// Symbols after which the next word starts a new sentence.
const END_OF_SENTENCE: &[char] = &['.', '!', '?', '…'];

/// Symbols that stick to whatever follows them.
const STICKY: &[char] = &['(', '[', '{', '<', '-', '"', '¿', '¡', '/'];

/// Length (in characters) of the greatest common prefix of `a` and `b`.
pub(crate) fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

/// `text` without its first `chars` characters.
pub(crate) fn skip_chars(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((byte, _)) => &text[byte..],
        None => "",
    }
}

/// The glue to put between `left_context` and newly dictated `text`: either nothing or a
/// single space.
pub(crate) fn glue(text: &str, left_context: &str) -> &'static str {
    let Some(first) = text.chars().next() else {
        return "";
    };

    // Single letters attach to the preceding word.
    if first.is_alphabetic() && text.graphemes(true).nth(1).is_none() {
        return "";
    }

    if first.is_whitespace() || PUNCTUATION.contains(&first) {
        return "";
    }

    match left_context.chars().next_back() {
        None => "",
        Some(prev) if prev.is_whitespace() || STICKY.contains(&prev) => "",
        Some(_) => " ",
    }
}

/// Upper-case the first non-whitespace character of `text` if `left_context` is empty or
/// ends a sentence.
pub(crate) fn capitalize_if_needed(text: &str, left_context: &str) -> String {
    let starts_sentence = match left_context.trim_end().chars().next_back() {
        None => true,
        Some(last) => END_OF_SENTENCE.contains(&last),
    };
    if !starts_sentence {
        return text.to_string();
    }

    match text.char_indices().find(|(_, ch)| !ch.is_whitespace()) {
        Some((byte, ch)) => {
            let mut out = String::with_capacity(text.len() + 2);
            out.push_str(&text[..byte]);
            out.extend(ch.to_uppercase());
            out.push_str(&text[byte + ch.len_utf8()..]);
            out
        }
        None => text.to_string(),
    }
}
