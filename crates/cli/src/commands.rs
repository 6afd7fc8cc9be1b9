//! The two things the tool does: list cards, or print one.

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use mtgcard_core::{compile, display, CardLookup, CardStore, Config, SearchOptions};

use crate::cli::{Args, Listing};

/// Cards matching the query, rendered as `listing`.
pub fn list<S>(store: &S, args: &Args, listing: Listing, config: &Config) -> Result<String>
where
    S: CardStore + ?Sized,
{
    let query = args.query_string();
    let compiled = compile(&query, &config.compile_options())?;
    if !compiled.diagnostics().is_empty() {
        info!(
            skipped = compiled.diagnostics().len(),
            "Ignored characters in query"
        );
    }

    let options = SearchOptions {
        sort: args.sort.into(),
        reverse: args.reverse,
        limit: args.limit,
    };
    let cards = store.search(compiled.predicate(), &options)?;
    debug!(query = %query, matches = cards.len(), "Listed cards");

    if args.json {
        return serde_json::to_string_pretty(&cards).context("Failed to serialize cards");
    }

    let mut lines = match listing {
        Listing::Names => display::name_listing(&cards, false),
        Listing::AllNames => display::name_listing(&cards, true),
        Listing::Details => display::detail_listing(&cards, !args.no_header, &config.display),
    };
    if args.verbose {
        lines.push(format!("{} matches", cards.len()));
    }
    Ok(lines.join("\n"))
}

/// The card named by the query, rendered as a card page.
pub fn show<S>(store: &S, args: &Args, config: &Config) -> Result<String>
where
    S: CardStore + ?Sized,
{
    let name = args.query_string();
    if name.trim().is_empty() {
        bail!("no card name given");
    }

    let lookup = CardLookup {
        name,
        set_code: args.set_code.clone(),
        format: args
            .format
            .clone()
            .or_else(|| config.display.default_format.clone()),
        single_side: false,
        verbose: args.verbose,
        rulings: args.rulings,
    };
    let card = store.get_card(&lookup)?;

    if args.json {
        return serde_json::to_string_pretty(&card).context("Failed to serialize card");
    }

    let page = if args.verbose {
        let printings = if card.token {
            store.get_token_printings(&card.name)?
        } else {
            store.get_printings(&card.name)?
        };
        let sets = store.get_sets()?;
        display::card_page(&card, Some(printings.as_slice()), &sets, &config.display)
    } else {
        display::card_page(&card, None, &[], &config.display)
    };
    Ok(page)
}
