//! Boxed card prints and the sections printed under them.

use std::collections::HashSet;

use super::text::{columnize, pad, pad_left, spread, wrap};
use super::format_price;
use crate::card::{printed_faces, Card, Layout, Legality, Printing, Ruling, SetInfo};

/// Width of one printed card.
pub const SHEET_WIDTH: usize = 36;

const MIN_TEXT_LINES: usize = 6;
const PRINTING_WIDTH: usize = 18;
const STATUS_WIDTH: usize = 6;

/// "p/t" for creatures, the loyalty for planeswalkers, else empty.
pub fn power_toughness_loyalty(card: &Card) -> String {
    match (&card.power, &card.loyalty) {
        (Some(power), _) => format!(
            "{power}/{}",
            card.toughness.as_deref().unwrap_or_default()
        ),
        (None, Some(loyalty)) => loyalty.clone(),
        (None, None) => String::new(),
    }
}

fn text_lines(card: &Card, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, paragraph) in card.text.as_deref().unwrap_or("").lines().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.extend(wrap(paragraph, width));
    }
    lines
}

fn face_box(card: &Card, width: usize, min_text: usize) -> Vec<String> {
    let inner = width.saturating_sub(2);
    let text_width = inner.saturating_sub(2);
    let border = "─".repeat(inner);
    let blank = format!("│{}│", " ".repeat(inner));

    let mut lines = vec![
        format!("┌{border}┐"),
        format!(
            "│{}│",
            spread(&card.name, card.mana_cost.as_deref().unwrap_or(""), inner)
        ),
        blank.clone(),
        format!("│{}│", spread(&card.type_line, &card.set_code, inner)),
        blank,
    ];

    let mut text = text_lines(card, text_width);
    if text.len() < min_text {
        text.resize(min_text, String::new());
    }
    lines.extend(text.iter().map(|line| format!("│ {} │", pad(line, text_width))));

    lines.push(format!("│{}│", pad_left(&power_toughness_loyalty(card), inner)));
    lines.push(format!("└{border}┘"));
    lines
}

/// Print of `card` and the faces printed with it.
///
/// Transform and meld faces are shown side by side; the halves of split,
/// flip, adventure and aftermath cards are stacked.
pub fn card_sheet(card: &Card, width: usize) -> Vec<String> {
    let faces = printed_faces(card);
    let text_width = width.saturating_sub(4);

    if faces.len() > 1 && matches!(card.layout, Layout::Transform | Layout::Meld) {
        let min_text = faces
            .iter()
            .map(|face| text_lines(face, text_width).len())
            .max()
            .unwrap_or(0)
            .max(MIN_TEXT_LINES);
        let boxes: Vec<Vec<String>> = faces
            .iter()
            .map(|face| face_box(face, width, min_text))
            .collect();
        return columnize(width, &boxes, 2, false);
    }

    faces
        .iter()
        .flat_map(|face| face_box(face, width, MIN_TEXT_LINES))
        .collect()
}

/// "Restricted" → "restr."
fn abbreviate(status: &str, max: usize) -> String {
    let status = status.to_lowercase();
    if status.chars().count() > max {
        let head: String = status.chars().take(max - 1).collect();
        format!("{head}.")
    } else {
        status
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Legality of each of `shown` formats, two per line.
pub fn formats_section(formats: &[Legality], shown: &[String]) -> Vec<String> {
    let status = |format: &str| {
        formats
            .iter()
            .find(|l| l.format.eq_ignore_ascii_case(format))
            .map(|l| abbreviate(&l.status, STATUS_WIDTH))
            .unwrap_or_default()
    };
    let column_width = |offset: usize| {
        shown
            .iter()
            .skip(offset)
            .step_by(2)
            .map(String::len)
            .max()
            .unwrap_or(0)
            + 2
    };
    let (left_width, right_width) = (column_width(0), column_width(1));

    shown
        .chunks(2)
        .map(|pair| {
            let left = format!(
                "{:left_width$}{}",
                format!("{}:", capitalize(&pair[0])),
                status(&pair[0])
            );
            let right = pair
                .get(1)
                .map(|format| {
                    format!(
                        "{:right_width$}{}",
                        format!("{}:", capitalize(format)),
                        status(format)
                    )
                })
                .unwrap_or_default();
            format!("  {left:19}{right}").trim_end().to_string()
        })
        .collect()
}

/// Printings in four columns; main sets are starred.
pub fn printings_section(printings: &[Printing], sets: &[SetInfo], rate: f64) -> Vec<String> {
    let main: HashSet<&str> = sets
        .iter()
        .filter(|set| set.is_main())
        .map(|set| set.code.as_str())
        .collect();

    let items: Vec<String> = printings
        .iter()
        .map(|printing| {
            let mut label = printing.set_code.clone();
            if main.contains(printing.set_code.as_str()) {
                label.push('*');
            }
            match printing.price {
                Some(_) => format!("{label:4} ({})", format_price(printing.price, rate)),
                None => label,
            }
        })
        .collect();

    let per_column = items.len().div_ceil(4);
    if per_column == 0 {
        return Vec::new();
    }
    let columns: Vec<Vec<String>> = items.chunks(per_column).map(<[String]>::to_vec).collect();
    columnize(PRINTING_WIDTH, &columns, 0, true)
        .into_iter()
        .map(|line| format!("  {line}"))
        .collect()
}

/// Rulings in two columns of `width`, each followed by its date.
pub fn rulings_section(rulings: &[Ruling], width: usize) -> Vec<String> {
    let split = rulings.len().div_ceil(2);
    let columns: Vec<Vec<String>> = [&rulings[..split], &rulings[split..]]
        .into_iter()
        .map(|part| {
            let mut column = Vec::new();
            for ruling in part {
                column.extend(wrap(&ruling.text, width.saturating_sub(2)));
                column.push(format!("({})", ruling.date.format("%Y-%m-%d")));
                column.push(String::new());
            }
            column.pop();
            column
        })
        .collect();

    columnize(width, &columns, 0, true)
        .into_iter()
        .map(|line| format!("  {line}"))
        .collect()
}
