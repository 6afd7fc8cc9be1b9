//! Per-keyword compilation of search terms into predicate fragments.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::error::QueryError;
use super::lexer::TokenKind;
use super::predicate::{card_or_other_faces, Predicate};
use crate::card::{mana, Layout};

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("price pattern is valid"));

/// Layouts whose sibling faces carry their own power and toughness.
const PT_LAYOUTS: [Layout; 4] = [
    Layout::Aftermath,
    Layout::Flip,
    Layout::Transform,
    Layout::Meld,
];

/// Layouts whose sibling faces carry their own color identity.
const COLOR_LAYOUTS: [Layout; 2] = [Layout::Transform, Layout::Meld];

/// Layouts whose sibling faces carry their own mana cost.
const MANA_LAYOUTS: [Layout; 3] = [Layout::Adventure, Layout::Split, Layout::Aftermath];

/// Knobs that change how values are bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Prices typed by the user are in the display currency; the database
    /// holds USD.
    pub usd_to_currency_rate: f64,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            usd_to_currency_rate: 1.0,
        }
    }
}

/// Search keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Name,
    Text,
    Set,
    Legal,
    Rarity,
    Layout,
    Cmc,
    Power,
    Toughness,
    Loyalty,
    Year,
    Price,
    Type,
    Colors,
    Mana,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("name", Keyword::Name),
    ("text", Keyword::Text),
    ("set", Keyword::Set),
    ("legal", Keyword::Legal),
    ("format", Keyword::Legal),
    ("f", Keyword::Legal),
    ("rarity", Keyword::Rarity),
    ("layout", Keyword::Layout),
    ("cmc", Keyword::Cmc),
    ("power", Keyword::Power),
    ("toughness", Keyword::Toughness),
    ("loyalty", Keyword::Loyalty),
    ("year", Keyword::Year),
    ("price", Keyword::Price),
    ("type", Keyword::Type),
    ("t", Keyword::Type),
    ("colors", Keyword::Colors),
    ("c", Keyword::Colors),
    ("mana", Keyword::Mana),
];

impl Keyword {
    /// Resolve a keyword, ignoring case.
    pub fn lookup(word: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(word))
            .map(|(_, keyword)| *keyword)
    }

    /// Whether `>`, `<`, `>=`, `<=` and `!=` apply to this keyword.
    pub fn accepts_compare(self) -> bool {
        matches!(
            self,
            Self::Cmc
                | Self::Power
                | Self::Toughness
                | Self::Loyalty
                | Self::Year
                | Self::Price
                | Self::Colors
                | Self::Mana
        )
    }

    /// Whether the `!` exact marker may follow `:` or `=`.
    pub fn accepts_exact(self) -> bool {
        self == Self::Name
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Text => "text",
            Self::Set => "set",
            Self::Legal => "legal",
            Self::Rarity => "rarity",
            Self::Layout => "layout",
            Self::Cmc => "cmc",
            Self::Power => "power",
            Self::Toughness => "toughness",
            Self::Loyalty => "loyalty",
            Self::Year => "year",
            Self::Price => "price",
            Self::Type => "type",
            Self::Colors => "colors",
            Self::Mana => "mana",
        }
    }
}

/// Keyword operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `:`, meaning depends on the keyword.
    KwEq,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl Operator {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::KwEq => Some(Self::KwEq),
            TokenKind::Eq => Some(Self::Eq),
            TokenKind::Ne => Some(Self::Ne),
            TokenKind::Gt => Some(Self::Gt),
            TokenKind::Lt => Some(Self::Lt),
            TokenKind::Ge => Some(Self::Ge),
            TokenKind::Le => Some(Self::Le),
            _ => None,
        }
    }

    /// Resolve `:` for `keyword`: containment for colors and mana, equality
    /// for everything else.
    pub fn normalize(self, keyword: Keyword) -> Self {
        match (self, keyword) {
            (Self::KwEq, Keyword::Colors | Keyword::Mana) => Self::Ge,
            (Self::KwEq, _) => Self::Eq,
            (op, _) => op,
        }
    }

    /// The operator as typed.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KwEq => ":",
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::KwEq | Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }
}

/// Fuzzy or exact match on the card name or any alternate face name.
pub fn name_term(value: &str, exact: bool) -> Predicate {
    let (cmp, bound) = if exact {
        ("=", value.to_string())
    } else {
        ("LIKE", format!("%{value}%"))
    };
    card_or_other_faces(
        Predicate::repeat(format!("lower(v_name) {cmp} lower(?)"), bound.as_str()),
        Some(Predicate::repeat(
            format!("lower(face.faceName) {cmp} lower(?)"),
            bound,
        )),
        None,
    )
}

/// Compile `keyword op value` (with `exact` set by a `!` after the operator).
///
/// The operator and the exact marker are checked against the keyword
/// here.
pub fn keyword_term(
    keyword: &str,
    op: Operator,
    exact: bool,
    value: &str,
    options: &CompileOptions,
) -> Result<Predicate, QueryError> {
    let kw = Keyword::lookup(keyword)
        .ok_or_else(|| QueryError::UnknownKeyword(keyword.to_string()))?;
    let unsupported = |op: &str| QueryError::UnsupportedOperator {
        keyword: keyword.to_string(),
        op: op.to_string(),
    };
    if !matches!(op, Operator::KwEq | Operator::Eq) && !kw.accepts_compare() {
        return Err(unsupported(op.as_str()));
    }
    if exact && !kw.accepts_exact() {
        return Err(unsupported(&format!("{}!", op.as_str())));
    }

    let op = op.normalize(kw);
    let invalid = || QueryError::InvalidValue {
        keyword: kw.as_str().to_string(),
        value: value.to_string(),
    };

    let predicate = match kw {
        Keyword::Name => name_term(value, exact),
        Keyword::Text => card_or_other_faces(
            Predicate::repeat("lower(cards.text) LIKE lower(?)", format!("%{value}%")),
            Some(Predicate::repeat(
                "lower(face.text) LIKE lower(?)",
                format!("%{value}%"),
            )),
            None,
        ),
        Keyword::Set => exact_column("cards.setCode", value),
        Keyword::Legal => exact_column("legalities.format", value),
        Keyword::Rarity => exact_column("cards.rarity", value),
        Keyword::Layout => exact_column("cards.layout", value),
        Keyword::Cmc => {
            let n = parse_int(value).ok_or_else(invalid)?;
            card_or_other_faces(
                Predicate::repeat(format!("cards.convertedManaCost {} ?", op.sql()), n),
                None,
                None,
            )
        }
        Keyword::Loyalty => {
            let n = parse_int(value).ok_or_else(invalid)?;
            card_or_other_faces(
                Predicate::repeat(format!("CAST(cards.loyalty AS INTEGER) {} ?", op.sql()), n),
                None,
                None,
            )
        }
        Keyword::Power | Keyword::Toughness => {
            let n = parse_int(value).ok_or_else(invalid)?;
            let col = kw.as_str();
            card_or_other_faces(
                Predicate::repeat(format!("CAST(cards.{col} AS INTEGER) {} ?", op.sql()), n),
                Some(Predicate::repeat(
                    format!("CAST(face.{col} AS INTEGER) {} ?", op.sql()),
                    n,
                )),
                Some(&PT_LAYOUTS),
            )
        }
        Keyword::Year => {
            let n = parse_int(value).ok_or_else(invalid)?;
            card_or_other_faces(
                Predicate::repeat(
                    format!(
                        "CAST(strftime('%Y', DATE(sets.releaseDate)) AS INTEGER) {} ?",
                        op.sql()
                    ),
                    n,
                ),
                None,
                None,
            )
        }
        Keyword::Price => {
            if !PRICE_RE.is_match(value) {
                return Err(invalid());
            }
            let amount: f64 = value.parse().map_err(|_| invalid())?;
            card_or_other_faces(
                Predicate::repeat(
                    format!(
                        "(prices.price {} round(?, 2) AND prices.type = 'paper')",
                        op.sql()
                    ),
                    amount / options.usd_to_currency_rate,
                ),
                None,
                None,
            )
        }
        Keyword::Type => card_or_other_faces(
            Predicate::repeat(type_membership("cards"), value),
            Some(Predicate::repeat(type_membership("face"), value)),
            None,
        ),
        Keyword::Colors => {
            let colors = color_list(value).ok_or_else(invalid)?;
            card_or_other_faces(
                Predicate::repeat(set_comparison(SetFns::COLORS, "colors_sp", op), colors.as_str()),
                Some(Predicate::repeat(
                    set_comparison(SetFns::COLORS, "face.colors", op),
                    colors,
                )),
                Some(&COLOR_LAYOUTS),
            )
        }
        Keyword::Mana => {
            if mana::symbols(value).is_empty() {
                return Err(invalid());
            }
            card_or_other_faces(
                Predicate::repeat(set_comparison(SetFns::MANA, "cards.manaCost", op), value),
                Some(Predicate::repeat(
                    set_comparison(SetFns::MANA, "face.manaCost", op),
                    value,
                )),
                Some(&MANA_LAYOUTS),
            )
        }
    };

    Ok(predicate)
}

fn exact_column(column: &str, value: &str) -> Predicate {
    card_or_other_faces(
        Predicate::repeat(format!("lower({column}) = lower(?)"), value),
        None,
        None,
    )
}

fn type_membership(table: &str) -> String {
    format!(
        "(csv_in(lower({table}.subtypes), lower(?)) OR \
csv_in(lower({table}.supertypes), lower(?)) OR \
csv_in(lower({table}.types), lower(?)))"
    )
}

fn parse_int(value: &str) -> Option<i64> {
    value.parse().ok()
}

/// `ub` (or `u,b`, `UB`) becomes `u,b`.
fn color_list(value: &str) -> Option<String> {
    let letters: Vec<String> = value
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase().to_string())
        .collect();
    if letters.is_empty() {
        None
    } else {
        Some(letters.join(","))
    }
}

/// SQL functions measuring and comparing a set-like column.
#[derive(Clone, Copy)]
struct SetFns {
    size: &'static str,
    contains: &'static str,
}

impl SetFns {
    const COLORS: SetFns = SetFns {
        size: "csv_len",
        contains: "csv_set_contains",
    };
    const MANA: SetFns = SetFns {
        size: "manacost_to_cmc",
        contains: "manacost_contains",
    };
}

/// Size comparison plus containment in the direction of the operator.
fn set_comparison(fns: SetFns, col: &str, op: Operator) -> String {
    let SetFns { size, contains } = fns;
    match op {
        Operator::Gt | Operator::Ge => format!(
            "( {size}({col}) {op} {size}(lower(?)) AND {contains}(lower({col}), lower(?)) )",
            op = op.sql()
        ),
        Operator::Lt | Operator::Le => format!(
            "( {size}({col}) {op} {size}(lower(?)) AND {contains}(lower(?), lower({col})) )",
            op = op.sql()
        ),
        Operator::KwEq | Operator::Eq => format!(
            "( {size}({col}) = {size}(lower(?)) AND {contains}(lower(?), lower({col})) \
AND {contains}(lower({col}), lower(?)) )"
        ),
        Operator::Ne => format!("NOT {}", set_comparison(fns, col, Operator::Eq)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::predicate::Param;

    fn compile(keyword: &str, op: Operator, value: &str) -> Result<Predicate, QueryError> {
        keyword_term(keyword, op, false, value, &CompileOptions::default())
    }

    fn texts(p: &Predicate) -> Vec<String> {
        p.params()
            .iter()
            .map(|param| match param {
                Param::Text(s) => s.clone(),
                other => panic!("expected text param, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_lookup_is_case_insensitive_and_aliased() {
        assert_eq!(Keyword::lookup("NAME"), Some(Keyword::Name));
        assert_eq!(Keyword::lookup("f"), Some(Keyword::Legal));
        assert_eq!(Keyword::lookup("format"), Some(Keyword::Legal));
        assert_eq!(Keyword::lookup("T"), Some(Keyword::Type));
        assert_eq!(Keyword::lookup("c"), Some(Keyword::Colors));
        assert_eq!(Keyword::lookup("badkey"), None);
    }

    #[test]
    fn test_colon_normalization() {
        assert_eq!(Operator::KwEq.normalize(Keyword::Cmc), Operator::Eq);
        assert_eq!(Operator::KwEq.normalize(Keyword::Colors), Operator::Ge);
        assert_eq!(Operator::KwEq.normalize(Keyword::Mana), Operator::Ge);
        assert_eq!(Operator::Lt.normalize(Keyword::Colors), Operator::Lt);
    }

    #[test]
    fn test_fuzzy_name() {
        let p = name_term("angel", false);
        assert_eq!(texts(&p), vec!["%angel%", "%angel%"]);
        assert!(p.sql().contains("lower(v_name) LIKE lower(?)"));
        assert!(p.sql().contains("lower(face.faceName) LIKE lower(?)"));
    }

    #[test]
    fn test_exact_name() {
        let p = keyword_term("name", Operator::KwEq, true, "angel", &CompileOptions::default())
            .unwrap();
        assert_eq!(texts(&p), vec!["angel", "angel"]);
        assert!(p.sql().contains("lower(v_name) = lower(?)"));
    }

    #[test]
    fn test_exact_marker_only_for_name() {
        let err = keyword_term("set", Operator::Eq, true, "eld", &CompileOptions::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "keyword 'set' does not accept '=!'");
    }

    #[test]
    fn test_set_has_single_param() {
        let p = compile("set", Operator::Eq, "eld").unwrap();
        assert_eq!(texts(&p), vec!["eld"]);
        assert_eq!(p.sql(), "( lower(cards.setCode) = lower(?) )");
    }

    #[test]
    fn test_legal_aliases() {
        let p = compile("f", Operator::KwEq, "modern").unwrap();
        assert_eq!(p.sql(), "( lower(legalities.format) = lower(?) )");
    }

    #[test]
    fn test_cmc_colon_is_equality() {
        let p = compile("cmc", Operator::KwEq, "3").unwrap();
        assert_eq!(p.params(), &[Param::Int(3)]);
        assert!(p.sql().contains("cards.convertedManaCost = ?"));
    }

    #[test]
    fn test_cmc_rejects_non_integer() {
        let err = compile("cmc", Operator::KwEq, "x").unwrap_err();
        assert!(matches!(err, QueryError::InvalidValue { .. }));
    }

    #[test]
    fn test_power_has_alternate_branch() {
        let p = compile("power", Operator::Gt, "4").unwrap();
        assert_eq!(p.params(), &[Param::Int(4), Param::Int(4)]);
        assert!(p
            .sql()
            .contains("cards.layout IN ('aftermath','flip','transform','meld')"));
    }

    #[test]
    fn test_loyalty_has_no_alternate_branch() {
        let p = compile("loyalty", Operator::Ge, "3").unwrap();
        assert_eq!(p.params(), &[Param::Int(3)]);
        assert!(!p.sql().contains("EXISTS"));
    }

    #[test]
    fn test_year_binds_once() {
        let p = compile("year", Operator::Lt, "2000").unwrap();
        assert_eq!(p.params(), &[Param::Int(2000)]);
        assert_eq!(p.placeholder_count(), 1);
    }

    #[test]
    fn test_price_converts_currency() {
        let options = CompileOptions {
            usd_to_currency_rate: 2.0,
        };
        let p = keyword_term("price", Operator::Lt, false, "5", &options).unwrap();
        assert_eq!(p.params(), &[Param::Real(2.5)]);
        assert!(p.sql().contains("prices.price < round(?, 2)"));
    }

    #[test]
    fn test_price_rejects_malformed_value() {
        assert!(matches!(
            compile("price", Operator::Lt, "abc").unwrap_err(),
            QueryError::InvalidValue { .. }
        ));
        assert!(compile("price", Operator::Lt, "1.").is_err());
        assert!(compile("price", Operator::Lt, "0.25").is_ok());
    }

    #[test]
    fn test_type_binds_six() {
        let p = compile("t", Operator::KwEq, "angel").unwrap();
        assert_eq!(texts(&p), vec!["angel"; 6]);
    }

    #[test]
    fn test_colors_less_than() {
        let p = compile("colors", Operator::Lt, "ub").unwrap();
        assert_eq!(texts(&p), vec!["u,b"; 4]);
        assert!(p
            .sql()
            .contains("csv_set_contains(lower(?), lower(colors_sp))"));
        assert!(p.sql().contains("cards.layout IN ('transform','meld')"));
    }

    #[test]
    fn test_colors_colon_means_at_least() {
        let p = compile("c", Operator::KwEq, "r").unwrap();
        assert!(p.sql().contains("csv_len(colors_sp) >= csv_len(lower(?))"));
        assert_eq!(p.params().len(), 4);
    }

    #[test]
    fn test_colors_equal_and_not_equal_bind_six() {
        let eq = compile("colors", Operator::Eq, "wu").unwrap();
        assert_eq!(eq.params().len(), 6);
        let ne = compile("colors", Operator::Ne, "wu").unwrap();
        assert_eq!(ne.params().len(), 6);
        assert!(ne.sql().contains("NOT ( csv_len(colors_sp) ="));
    }

    #[test]
    fn test_mana_equal_binds_six() {
        let p = compile("mana", Operator::Eq, "ub").unwrap();
        assert_eq!(texts(&p), vec!["ub"; 6]);
        assert!(p
            .sql()
            .contains("cards.layout IN ('adventure','split','aftermath')"));
    }

    #[test]
    fn test_mana_rejects_empty_cost() {
        assert!(compile("mana", Operator::Ge, "...").is_err());
    }

    #[test]
    fn test_compare_on_text_keyword_is_unsupported() {
        let err = compile("name", Operator::Gt, "angel").unwrap_err();
        assert_eq!(
            err,
            QueryError::UnsupportedOperator {
                keyword: "name".to_string(),
                op: ">".to_string()
            }
        );
        let err = compile("Set", Operator::Ne, "eld").unwrap_err();
        assert_eq!(err.to_string(), "keyword 'Set' does not accept '!='");
    }

    #[test]
    fn test_unknown_keyword() {
        let err = compile("badkey", Operator::KwEq, "ral").unwrap_err();
        assert_eq!(err.to_string(), "invalid search keyword 'badkey'");
    }

    #[test]
    fn test_placeholders_match_params_for_every_keyword() {
        for (keyword, op, value) in [
            ("name", Operator::KwEq, "x"),
            ("text", Operator::KwEq, "flying"),
            ("rarity", Operator::Eq, "rare"),
            ("layout", Operator::Eq, "split"),
            ("toughness", Operator::Le, "2"),
            ("price", Operator::Ge, "1.50"),
            ("colors", Operator::Gt, "g"),
            ("mana", Operator::Le, "{2}{w}"),
            ("mana", Operator::Ne, "ww"),
        ] {
            let p = compile(keyword, op, value).unwrap();
            assert_eq!(p.placeholder_count(), p.params().len(), "{keyword}");
        }
    }
}
