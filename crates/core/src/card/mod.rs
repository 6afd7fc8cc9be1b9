//! Card entities and the rules tying multi-faced cards together.

pub mod faces;
pub mod mana;
mod types;

pub use faces::{canonical_redirect, multi_mana_cost, multi_name, printed_faces};
pub use types::*;
