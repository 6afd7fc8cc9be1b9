//! Plain-text rendering of card listings and card pages.

mod sheet;
mod text;

pub use sheet::{
    card_sheet, formats_section, power_toughness_loyalty, printings_section, rulings_section,
    SHEET_WIDTH,
};
pub use text::{columnize, pad, wrap};

use crate::card::{multi_mana_cost, multi_name, Card, Printing, SetInfo};
use crate::config::DisplayConfig;

const NAME_WIDTH: usize = 32;
const SET_WIDTH: usize = 5;
const MANA_WIDTH: usize = 15;
const TYPE_WIDTH: usize = 14;
const PTL_WIDTH: usize = 7;
const RARITY_WIDTH: usize = 3;

/// A USD price converted with `rate`, or empty when unknown.
pub fn format_price(usd: Option<f64>, rate: f64) -> String {
    usd.map(|usd| format!("${:.2}", usd * rate))
        .unwrap_or_default()
}

pub fn rarity_letter(rarity: Option<&str>) -> &'static str {
    match rarity {
        Some("mythic") => "M",
        Some("rare") => "R",
        Some("uncommon") => "U",
        Some("common") => "C",
        Some("special") => "S",
        _ => "",
    }
}

/// One name per card; with `all_faces`, every printed face name.
pub fn name_listing(cards: &[Card], all_faces: bool) -> Vec<String> {
    cards
        .iter()
        .map(|card| {
            if all_faces {
                multi_name(card)
            } else {
                card.name.clone()
            }
        })
        .collect()
}

fn detail_row(cells: [&str; 6], price: &str) -> String {
    let widths = [
        NAME_WIDTH,
        SET_WIDTH,
        MANA_WIDTH,
        TYPE_WIDTH,
        PTL_WIDTH,
        RARITY_WIDTH,
    ];
    let mut row: String = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| pad(cell, width))
        .collect();
    row.push_str(price);
    row.truncate(row.trim_end().len());
    row
}

/// One line of details per card, optionally under a header.
pub fn detail_listing(cards: &[Card], header: bool, display: &DisplayConfig) -> Vec<String> {
    let mut lines = Vec::with_capacity(cards.len() + 1);
    if header {
        lines.push(detail_row(
            ["NAME", "SET", "MANA", "TYPE", "PT|L", "R"],
            &display.currency,
        ));
    }

    for card in cards {
        let name = multi_name(card);
        let name = text::truncate(&name, NAME_WIDTH - 2);
        lines.push(detail_row(
            [
                name,
                card.set_code.as_str(),
                multi_mana_cost(card).as_str(),
                card.main_type(),
                power_toughness_loyalty(card).as_str(),
                rarity_letter(card.rarity.as_deref()),
            ],
            &format_price(card.price, display.usd_to_currency_rate),
        ));
    }
    lines
}

/// Full page for one card: its print and, when requested, price,
/// printings, formats and rulings.
///
/// `printings` is `Some` in verbose mode. Rulings are shown when the card
/// was loaded with them.
pub fn card_page(
    card: &Card,
    printings: Option<&[Printing]>,
    sets: &[SetInfo],
    display: &DisplayConfig,
) -> String {
    let mut lines = card_sheet(card, SHEET_WIDTH);

    if let Some(printings) = printings {
        lines.push(String::new());
        lines.push(
            format!(
                "Price ({}): {}",
                display.currency,
                format_price(card.price, display.usd_to_currency_rate)
            )
            .trim_end()
            .to_string(),
        );
        lines.push(String::new());
        lines.push(format!("Printings ({}):", display.currency));
        lines.push(String::new());
        lines.extend(printings_section(
            printings,
            sets,
            display.usd_to_currency_rate,
        ));
        lines.push(String::new());
        lines.push("Formats:".to_string());
        lines.push(String::new());
        lines.extend(formats_section(
            card.formats.as_deref().unwrap_or_default(),
            &display.shown_formats,
        ));
    }

    if let Some(rulings) = &card.rulings {
        lines.push(String::new());
        if rulings.is_empty() {
            lines.push("No rulings.".to_string());
        } else {
            lines.push("Rulings:".to_string());
            lines.push(String::new());
            lines.extend(rulings_section(rulings, SHEET_WIDTH));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CardLookup, CardStore, SearchOptions};
    use crate::testing::fixtures;

    fn sample_cards() -> Vec<Card> {
        let store = fixtures::sample_store().unwrap();
        let predicate = crate::query::compile("angel or giant or fire", &Default::default())
            .unwrap()
            .into_predicate();
        store.search(&predicate, &SearchOptions::default()).unwrap()
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Some(0.25), 1.0), "$0.25");
        assert_eq!(format_price(Some(2.0), 0.9), "$1.80");
        assert_eq!(format_price(None, 1.0), "");
    }

    #[test]
    fn test_rarity_letter() {
        assert_eq!(rarity_letter(Some("mythic")), "M");
        assert_eq!(rarity_letter(Some("special")), "S");
        assert_eq!(rarity_letter(None), "");
    }

    #[test]
    fn test_name_listing() {
        let cards = sample_cards();
        let names = name_listing(&cards, false);
        assert!(names.contains(&"Bonecrusher Giant".to_string()));
        assert!(names.contains(&"Fire".to_string()));

        let all = name_listing(&cards, true);
        assert!(all.contains(&"Bonecrusher Giant // Stomp".to_string()));
        assert!(all.contains(&"Fire // Ice".to_string()));
    }

    #[test]
    fn test_detail_listing() {
        let cards = sample_cards();
        let lines = detail_listing(&cards, true, &DisplayConfig::default());
        assert_eq!(
            lines[0],
            "NAME                            SET  MANA           TYPE          PT|L   R  USD"
        );
        assert_eq!(lines.len(), cards.len() + 1);

        let serra = lines
            .iter()
            .find(|line| line.starts_with("Serra Angel"))
            .unwrap();
        assert!(serra.contains("3WW"));
        assert!(serra.contains("Creature"));
        assert!(serra.contains("4/4"));
        assert!(serra.contains(" U"));

        let fire = lines.iter().find(|line| line.starts_with("Fire // Ice")).unwrap();
        assert!(fire.contains("1R // 1U"));

        let no_header = detail_listing(&cards, false, &DisplayConfig::default());
        assert_eq!(no_header.len(), cards.len());
    }

    #[test]
    fn test_card_page_verbose() {
        let store = fixtures::sample_store().unwrap();
        let lookup = CardLookup {
            verbose: true,
            rulings: true,
            ..CardLookup::named("Serra Angel")
        };
        let card = store.get_card(&lookup).unwrap();
        let printings = store.get_printings(&card.name).unwrap();
        let sets = store.get_sets().unwrap();

        let page = card_page(&card, Some(printings.as_slice()), &sets, &DisplayConfig::default());
        assert!(page.contains("Price (USD): $0.25"));
        assert!(page.contains("Printings (USD):"));
        assert!(page.contains("M15* ($0.25)"));
        assert!(page.contains("Commander:"));
        assert!(page.contains("Rulings:"));
        assert!(page.contains("(2014-07-18)"));
    }

    #[test]
    fn test_card_page_without_rulings() {
        let store = fixtures::sample_store().unwrap();
        let lookup = CardLookup {
            rulings: true,
            ..CardLookup::named("Shivan Dragon")
        };
        let card = store.get_card(&lookup).unwrap();
        let page = card_page(&card, None, &[], &DisplayConfig::default());
        assert!(page.ends_with("No rulings."));
        assert!(!page.contains("Formats:"));
    }
}
