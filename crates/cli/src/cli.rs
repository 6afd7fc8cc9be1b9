//! Command line arguments.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};

use mtgcard_core::SortKey;

#[derive(Parser, Debug)]
#[command(
    name = "mtgcard",
    version,
    about = "Either print a card by name or list cards matching a query",
    long_about = None
)]
#[command(group(
    ArgGroup::new("listing")
        .args(["detail_list", "name_list", "name_list_multi"])
))]
pub struct Args {
    /// List card summaries matching the query
    #[arg(short = 'l')]
    pub detail_list: bool,

    /// List card names matching the query
    #[arg(short = 'n')]
    pub name_list: bool,

    /// List card names, all faces, matching the query
    #[arg(short = 'N')]
    pub name_list_multi: bool,

    /// Hide the header of the summary listing
    #[arg(short = 'q', requires = "listing")]
    pub no_header: bool,

    /// Sort key of listings
    #[arg(long, value_enum, default_value_t = SortArg::Name)]
    pub sort: SortArg,

    /// Reverse the sort order
    #[arg(short = 'r')]
    pub reverse: bool,

    /// List at most N cards
    #[arg(short = 'L', value_name = "N")]
    pub limit: Option<u32>,

    /// Card: show price, printings and formats. Listing: show match count
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Show rulings
    #[arg(short = 'R')]
    pub rulings: bool,

    /// Print the card from this set
    #[arg(short = 's', long = "set", value_name = "SET", conflicts_with = "listing")]
    pub set_code: Option<String>,

    /// Print the card only if legal in this format
    #[arg(
        short = 'f',
        long = "format",
        value_name = "FORMAT",
        conflicts_with = "listing"
    )]
    pub format: Option<String>,

    /// Machine readable output
    #[arg(long)]
    pub json: bool,

    /// Configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Card database, overriding the configured one
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Card name, or a search query with a listing flag
    #[arg(value_name = "QUERY")]
    pub query: Vec<String>,
}

/// Kind of card listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Details,
    Names,
    AllNames,
}

impl Args {
    /// Query words joined by spaces.
    pub fn query_string(&self) -> String {
        self.query.join(" ")
    }

    /// The requested listing, or `None` to print a single card.
    pub fn listing(&self) -> Option<Listing> {
        if self.detail_list {
            Some(Listing::Details)
        } else if self.name_list {
            Some(Listing::Names)
        } else if self.name_list_multi {
            Some(Listing::AllNames)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortArg {
    #[default]
    Name,
    Cmc,
    Price,
    Setcode,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortKey::Name,
            SortArg::Cmc => SortKey::Cmc,
            SortArg::Price => SortKey::Price,
            SortArg::Setcode => SortKey::SetCode,
        }
    }
}
