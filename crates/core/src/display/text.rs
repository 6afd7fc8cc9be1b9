//! Width-aware text helpers for fixed-column terminal output.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Longest prefix of `s` that fits in `max_width` columns.
pub fn truncate(s: &str, max_width: usize) -> &str {
    let (head, _) = split_at_width(s, max_width);
    head
}

fn split_at_width(s: &str, max_width: usize) -> (&str, &str) {
    let mut width = 0;
    for (idx, c) in s.char_indices() {
        width += c.width().unwrap_or(0);
        if width > max_width {
            return s.split_at(idx);
        }
    }
    (s, "")
}

/// `s` truncated or right-padded to exactly `width` columns.
pub fn pad(s: &str, width: usize) -> String {
    let s = truncate(s, width);
    format!("{s}{}", " ".repeat(width - s.width()))
}

/// `s` truncated or left-padded to exactly `width` columns.
pub fn pad_left(s: &str, width: usize) -> String {
    let s = truncate(s, width);
    format!("{}{s}", " ".repeat(width - s.width()))
}

/// `left` and `right` on one line of `width` columns, at least one space
/// apart. `right` wins when both do not fit.
pub fn spread(left: &str, right: &str, width: usize) -> String {
    let right = truncate(right, width);
    let room = width - right.width();
    let left_room = if right.is_empty() {
        room
    } else {
        room.saturating_sub(1)
    };
    format!("{}{}{right}", pad(left, left_room), " ".repeat(room - left_room))
}

/// Greedy word wrap of one paragraph; words wider than `width` are broken.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    if width == 0 {
        return lines;
    }

    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word = word;
        while word.width() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let (mut head, mut tail) = split_at_width(word, width);
            if head.is_empty() {
                // a single character wider than the line
                let first = word.chars().next().map_or(0, char::len_utf8);
                (head, tail) = word.split_at(first);
            }
            lines.push(head.to_string());
            word = tail;
        }
        if word.is_empty() {
            continue;
        }

        if !line.is_empty() && line.width() + 1 + word.width() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Lay out `columns` side by side, each `width` columns wide and `sep`
/// spaces apart. Shorter columns are filled with blanks.
pub fn columnize(width: usize, columns: &[Vec<String>], sep: usize, rstrip: bool) -> Vec<String> {
    let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
    (0..rows)
        .map(|i| {
            let mut row = String::new();
            for (j, column) in columns.iter().enumerate() {
                row.push_str(&pad(column.get(i).map_or("", String::as_str), width));
                if j + 1 < columns.len() {
                    row.push_str(&" ".repeat(sep));
                }
            }
            if rstrip {
                row.truncate(row.trim_end().len());
            }
            row
        })
        .collect()
}
