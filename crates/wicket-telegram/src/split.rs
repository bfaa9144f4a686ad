// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Splitting of texts longer than one Telegram message.

/// Telegram rejects message texts longer than this many bytes of UTF-8.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Splits `text` into parts no longer than `max_len` bytes.
///
/// Each cut prefers a paragraph break, then a line break, then a space,
/// and never lands inside a multi-byte character.
pub fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let (head, tail) = split_once(rest, max_len.max(4));
        if !head.is_empty() {
            parts.push(head);
        }
        rest = tail;
    }
    parts
}

fn split_once(text: &str, max_len: usize) -> (&str, &str) {
    if text.len() <= max_len {
        return (text, "");
    }

    let mut limit = max_len;
    while !text.is_char_boundary(limit) {
        limit -= 1;
    }
    let window = &text[..limit];

    if let Some(pos) = window.rfind("\n\n").filter(|&p| p > 0) {
        return (&text[..pos], text[pos + 2..].trim_start());
    }
    if let Some(pos) = window.rfind('\n').filter(|&p| p > 0) {
        return (&text[..pos], text[pos + 1..].trim_start());
    }
    if let Some(pos) = window.rfind(' ').filter(|&p| p > 0) {
        return (&text[..pos], &text[pos + 1..]);
    }
    (window, &text[limit..])
}
