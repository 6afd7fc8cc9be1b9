//! Card model types.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How the faces of a physical card relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    #[default]
    Normal,
    Split,
    Aftermath,
    Flip,
    Adventure,
    Transform,
    Meld,
    /// Any layout without multi-face handling (leveler, saga, ...).
    #[serde(other)]
    Other,
}

impl Layout {
    /// Layouts whose cards are stored as more than one row.
    pub const MULTI_FACE: [Layout; 6] = [
        Layout::Adventure,
        Layout::Aftermath,
        Layout::Flip,
        Layout::Split,
        Layout::Transform,
        Layout::Meld,
    ];

    pub fn parse(s: &str) -> Self {
        match s {
            "normal" => Self::Normal,
            "split" => Self::Split,
            "aftermath" => Self::Aftermath,
            "flip" => Self::Flip,
            "adventure" => Self::Adventure,
            "transform" => Self::Transform,
            "meld" => Self::Meld,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Split => "split",
            Self::Aftermath => "aftermath",
            Self::Flip => "flip",
            Self::Adventure => "adventure",
            Self::Transform => "transform",
            Self::Meld => "meld",
            Self::Other => "other",
        }
    }

    /// Whether a lookup resolving to side "b" must re-resolve via side "a".
    ///
    /// Both halves of these layouts live on the same side of the physical
    /// card, so the "a" half stands for the whole card.
    pub fn redirects_side_b(self) -> bool {
        matches!(
            self,
            Self::Flip | Self::Adventure | Self::Split | Self::Aftermath
        )
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which face of a multi-faced card a row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
    C,
}

impl Side {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "a" => Some(Self::A),
            "b" => Some(Self::B),
            "c" => Some(Self::C),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
            Self::C => "c",
        }
    }
}

/// Identity of one face plus the identities of its sibling faces.
///
/// Siblings are resolved by lookup, never held as references.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FaceGroup {
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sibling_uuids: Vec<String>,
}

impl FaceGroup {
    /// Build a face group from a comma separated `otherFaceIds` column.
    pub fn new(uuid: impl Into<String>, side: Option<Side>, other_face_ids: Option<&str>) -> Self {
        let sibling_uuids = other_face_ids
            .map(|ids| {
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            uuid: uuid.into(),
            side,
            sibling_uuids,
        }
    }

    pub fn has_siblings(&self) -> bool {
        !self.sibling_uuids.is_empty()
    }
}

/// A card resolved from one or more stored rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Card {
    /// Display name: the face name for multi-faced cards, else the card name.
    pub name: String,
    /// All face names of the card in printed order (empty for single faced
    /// cards).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    pub faces: FaceGroup,
    pub layout: Layout,
    /// Read from the token table.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub token: bool,
    pub set_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mana_cost: Option<String>,
    pub cmc: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toughness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loyalty: Option<String>,
    /// Colors; for split cards the union over both halves.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
    pub types: Vec<String>,
    /// Full type line (e.g. "Creature — Angel").
    pub type_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub printings: Vec<String>,
    /// Sibling faces, loaded single-sided.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_faces: Vec<Card>,
    /// Paper price in USD.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formats: Option<Vec<Legality>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rulings: Option<Vec<Ruling>>,
}

impl Card {
    pub fn uuid(&self) -> &str {
        &self.faces.uuid
    }

    pub fn side(&self) -> Option<Side> {
        self.faces.side
    }

    pub fn is_multi_faced(&self) -> bool {
        !self.names.is_empty()
    }

    /// First entry of the type list ("Creature", "Instant", ...).
    pub fn main_type(&self) -> &str {
        self.types.first().map(String::as_str).unwrap_or("")
    }
}

/// One stored row: a single face of a physical card.
///
/// Field names follow the stored columns; this is what seeding code writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub uuid: String,
    /// Full card name; faces joined with " // ".
    pub name: String,
    pub face_name: Option<String>,
    pub layout: String,
    pub side: Option<String>,
    pub set_code: String,
    pub mana_cost: Option<String>,
    pub converted_mana_cost: f64,
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub loyalty: Option<String>,
    /// Comma separated color letters ("W,U").
    pub colors: Option<String>,
    pub types: String,
    pub subtypes: Option<String>,
    pub supertypes: Option<String>,
    pub type_line: String,
    pub text: Option<String>,
    pub rarity: Option<String>,
    /// Comma separated sibling uuids.
    pub other_face_ids: Option<String>,
    pub printings: Option<String>,
    pub availability: String,
}

/// Legality status of a card in one format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legality {
    pub format: String,
    pub status: String,
}

/// An official ruling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruling {
    pub date: NaiveDate,
    pub text: String,
}

/// Cheapest paper price of a card within one set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Printing {
    pub set_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// A set and its category ("core", "expansion", "masters", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetInfo {
    pub code: String,
    pub set_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
}

impl SetInfo {
    /// Core and expansion sets are preferred when picking a printing.
    pub fn is_main(&self) -> bool {
        is_main_set_type(&self.set_type)
    }
}

pub fn is_main_set_type(set_type: &str) -> bool {
    matches!(set_type, "core" | "expansion")
}
