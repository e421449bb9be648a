//! Fixed-width reflow for formatted log output.
//!
//! A wrapped line occupies at most `width - 1` display columns; the last
//! column is left for the line break. Words are never split, except that a
//! hyphenated word may break right after one of its hyphens. Newlines in the
//! input are kept as hard breaks. A single word wider than the line is
//! placed on a line of its own.

use unicode_width::UnicodeWidthChar;

/// Column width used when formatted output is enabled.
pub const DEFAULT_WRAP_WIDTH: usize = 65;

pub const DIVIDER_CHAR: char = '-';

const TAB_COLUMNS: usize = 4;

pub fn divider(width: usize) -> String {
    DIVIDER_CHAR.to_string().repeat(width)
}

/// Wrap `text` and append a divider footer of the same width.
pub fn format_block(text: &str, width: usize) -> String {
    format!("{}\n{}", wrap(text, width), divider(width))
}

pub fn wrap(text: &str, width: usize) -> String {
    let limit = width.saturating_sub(1).max(1);
    let mut lines = Vec::new();
    for hard_line in text.split('\n') {
        wrap_line(hard_line, limit, &mut lines);
    }
    lines.join("\n")
}

pub(crate) fn columns(s: &str) -> usize {
    s.chars()
        .map(|c| match c {
            '\t' => TAB_COLUMNS,
            other => other.width().unwrap_or(0),
        })
        .sum()
}

fn wrap_line(line: &str, limit: usize, out: &mut Vec<String>) {
    let mut current = String::new();
    let mut used = 0usize;

    for word in line.split(' ').filter(|w| !w.is_empty()) {
        let mut rest = word;
        loop {
            let w = columns(rest);
            let needed = if used == 0 { w } else { used + 1 + w };
            if needed <= limit {
                push_word(&mut current, rest, used);
                used = needed;
                break;
            }

            let room = if used == 0 {
                limit
            } else {
                limit.saturating_sub(used + 1)
            };
            if let Some(split) = hyphen_split(rest, room) {
                push_word(&mut current, &rest[..split], used);
                out.push(std::mem::take(&mut current));
                used = 0;
                rest = &rest[split..];
                continue;
            }

            if used > 0 {
                out.push(std::mem::take(&mut current));
                used = 0;
                continue;
            }

            current.push_str(rest);
            used = w;
            break;
        }
    }

    out.push(current);
}

fn push_word(line: &mut String, word: &str, used: usize) {
    if used > 0 {
        line.push(' ');
    }
    line.push_str(word);
}

/// Byte offset just past the last hyphen whose left part fits in `room`
/// columns, leaving a non-empty remainder.
fn hyphen_split(word: &str, room: usize) -> Option<usize> {
    word.char_indices()
        .filter(|(i, c)| *c == '-' && *i > 0)
        .map(|(i, _)| i + 1)
        .filter(|idx| *idx < word.len() && columns(&word[..*idx]) <= room)
        .last()
}
