//! Predicate fragments: SQL conditions with positional `?` placeholders and
//! the values bound to them, composed without ever separating the two.

use std::fmt;

use serde::Serialize;

use crate::card::Layout;

/// Table name the primary face is selected from.
pub const PRIMARY: &str = "cards";

/// Alias of the sibling face row inside the alternate-face subquery.
pub const FACE: &str = "face";

/// A literal bound to one placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Param {
    Text(String),
    Int(i64),
    Real(f64),
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Real(x) => write!(f, "{x}"),
        }
    }
}

/// A SQL boolean condition plus its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Predicate {
    sql: String,
    params: Vec<Param>,
}

impl Predicate {
    pub fn new(sql: impl Into<String>, params: Vec<Param>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A condition whose every placeholder binds the same value.
    pub fn repeat(sql: impl Into<String>, value: impl Into<Param>) -> Self {
        let sql = sql.into();
        let value = value.into();
        let params = vec![value; count_placeholders(&sql)];
        Self { sql, params }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn into_parts(self) -> (String, Vec<Param>) {
        (self.sql, self.params)
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.sql)
    }

    /// `self AND other`
    pub fn and(self, other: Self) -> Self {
        self.join("AND", other)
    }

    /// `self OR other`
    pub fn or(self, other: Self) -> Self {
        self.join("OR", other)
    }

    /// `NOT self`
    pub fn negate(self) -> Self {
        Self {
            sql: format!("NOT {}", self.sql),
            params: self.params,
        }
    }

    /// `( self )`
    pub fn group(self) -> Self {
        Self {
            sql: format!("( {} )", self.sql),
            params: self.params,
        }
    }

    fn join(mut self, glue: &str, other: Self) -> Self {
        self.sql = format!("{} {} {}", self.sql, glue, other.sql);
        self.params.extend(other.params);
        self
    }
}

/// Count `?` placeholders outside single-quoted SQL literals.
pub fn count_placeholders(sql: &str) -> usize {
    let mut in_literal = false;
    let mut count = 0;
    for c in sql.chars() {
        match c {
            '\'' => in_literal = !in_literal,
            '?' if !in_literal => count += 1,
            _ => {}
        }
    }
    count
}

/// Which sibling rows count as alternate faces of the outer card.
///
/// Side "a" is always the primary face. Meld side "b" is a card of its own,
/// so only the melded side "c" is an alternate face there. Old split rows
/// carry no side; their first named half is the primary one.
const SIBLING_FACE: &str = "((face.layout != 'meld' AND face.side != 'a') \
OR (face.layout = 'meld' AND face.side != 'a' AND face.side != 'b') \
OR (face.side IS NULL AND face.layout = 'split' \
AND face.faceName != facename_element(face.name, 0)))";

fn layout_list(layouts: &[Layout]) -> String {
    layouts
        .iter()
        .map(|layout| format!("'{}'", layout.as_str()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Match a card if its primary face satisfies `primary`, or if one of its
/// alternate faces satisfies `alternate`.
///
/// `primary` is written against [`PRIMARY`], `alternate` against [`FACE`].
/// Alternate faces are only consulted for cards whose layout is in `layouts`
/// (every multi-face layout when `None`). Without an alternate condition the
/// result is just the grouped primary condition.
pub fn card_or_other_faces(
    primary: Predicate,
    alternate: Option<Predicate>,
    layouts: Option<&[Layout]>,
) -> Predicate {
    let Some(alternate) = alternate else {
        return primary.group();
    };

    let layouts = layout_list(layouts.unwrap_or(&Layout::MULTI_FACE));
    let sql = format!(
        "( ( {primary} ) OR ( {PRIMARY}.otherFaceIds IS NOT NULL \
AND {PRIMARY}.layout IN ({layouts}) \
AND EXISTS (SELECT 1 FROM cards AS {FACE} \
WHERE csv_in({PRIMARY}.otherFaceIds, {FACE}.uuid) \
AND {SIBLING_FACE} AND ( {alternate} )) ) )",
        primary = primary.sql,
        alternate = alternate.sql,
    );

    let mut params = primary.params;
    params.extend(alternate.params);
    Predicate { sql, params }
}
