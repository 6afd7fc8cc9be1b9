//! Card storage.
//!
//! The store runs compiled search predicates against a local copy of the
//! card database and resolves the returned rows into [`Card`] values,
//! including the sibling faces of multi-faced cards.

pub mod functions;
mod sqlite;
mod types;

pub use sqlite::SqliteCardStore;
pub use types::*;

use crate::card::{Card, Legality, Printing, Ruling, SetInfo};
use crate::query::Predicate;

/// Trait for card storage.
pub trait CardStore: Send + Sync {
    /// Cards matching `predicate`, one per display name.
    ///
    /// Only paper printings outside the novelty sets are considered, and
    /// only primary faces are returned. An empty predicate matches every
    /// card. No match is an empty list, not an error.
    fn search(&self, predicate: &Predicate, options: &SearchOptions)
        -> Result<Vec<Card>, StoreError>;

    /// A single card by exact (case-insensitive) name.
    ///
    /// Core and expansion printings are preferred, newest first. A name that
    /// only ever stands for side "b" of a flip, adventure, split or aftermath
    /// card resolves to the whole card. A name ending in " token" looks up
    /// the token without that suffix.
    fn get_card(&self, lookup: &CardLookup) -> Result<Card, StoreError>;

    /// The sibling faces of `card`, loaded single-sided.
    fn get_alternate_faces(&self, card: &Card) -> Result<Vec<Card>, StoreError>;

    /// Rulings for a card, oldest first.
    fn get_rulings(&self, uuid: &str) -> Result<Vec<Ruling>, StoreError>;

    /// Format legalities for a card, by format name.
    fn get_formats(&self, uuid: &str) -> Result<Vec<Legality>, StoreError>;

    /// Cheapest paper price of `name` in `set_code`.
    fn get_price(&self, name: &str, set_code: &str) -> Result<Option<f64>, StoreError>;

    /// Every set `name` was printed in with its cheapest paper price.
    fn get_printings(&self, name: &str) -> Result<Vec<Printing>, StoreError>;

    /// Every set the token `name` was printed in with its cheapest paper
    /// price.
    fn get_token_printings(&self, name: &str) -> Result<Vec<Printing>, StoreError>;

    /// All sets, main sets first, newest first.
    fn get_sets(&self) -> Result<Vec<SetInfo>, StoreError>;
}
