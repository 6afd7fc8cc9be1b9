//! Search query compiler.
//!
//! A query such as `name:serra cmc>3 colors=ub` is tokenized, parsed and
//! compiled into a SQL boolean condition with positional `?` placeholders
//! plus the values bound to them, in placeholder order.
//!
//! ```text
//! raw string -> Lexer -> Parser -> keywords -> Predicate
//! ```

mod error;
pub mod keywords;
pub mod lexer;
pub mod parser;
pub mod predicate;

pub use error::{LexError, QueryError};
pub use keywords::{CompileOptions, Keyword, Operator};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{Parser, MAX_NESTING};
pub use predicate::{card_or_other_faces, Param, Predicate};

use tracing::debug;

/// A compiled query plus the lexer diagnostics collected on the way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledQuery {
    predicate: Predicate,
    diagnostics: Vec<LexError>,
}

impl CompiledQuery {
    pub fn sql(&self) -> &str {
        self.predicate.sql()
    }

    pub fn params(&self) -> &[Param] {
        self.predicate.params()
    }

    /// An empty query matches every card.
    pub fn is_empty(&self) -> bool {
        self.predicate.is_empty()
    }

    /// Characters that were skipped while tokenizing.
    pub fn diagnostics(&self) -> &[LexError] {
        &self.diagnostics
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn into_predicate(self) -> Predicate {
        self.predicate
    }
}

/// Compile a search string.
///
/// Each call builds its own lexer and parser, so a failed compile leaves
/// nothing behind for the next one.
pub fn compile(input: &str, options: &CompileOptions) -> Result<CompiledQuery, QueryError> {
    let (tokens, diagnostics) = Lexer::new(input).tokenize();
    let predicate = Parser::new(tokens, options).parse()?;

    debug!(
        sql = %predicate.sql(),
        params = predicate.params().len(),
        "Compiled search query"
    );

    Ok(CompiledQuery {
        predicate,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn compile_default(input: &str) -> Result<CompiledQuery, QueryError> {
        compile(input, &CompileOptions::default())
    }

    fn text_params(query: &CompiledQuery) -> Vec<String> {
        query
            .params()
            .iter()
            .map(|p| match p {
                Param::Text(s) => s.clone(),
                other => panic!("unexpected param {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_fuzzy_name() {
        let q = compile_default("angel").unwrap();
        assert_eq!(text_params(&q), vec!["%angel%", "%angel%"]);
        assert!(q.sql().contains("lower(v_name) LIKE lower(?)"));
        assert!(q.sql().contains(" OR "));
    }

    #[test]
    fn test_exact_name_keyword() {
        let q = compile_default("name:!angel").unwrap();
        assert_eq!(text_params(&q), vec!["angel", "angel"]);
    }

    #[test]
    fn test_set_equals() {
        let q = compile_default("set = eld").unwrap();
        assert_eq!(text_params(&q), vec!["eld"]);
    }

    #[test]
    fn test_cmc_colon() {
        let q = compile_default("cmc:3").unwrap();
        assert_eq!(q.params(), &[Param::Int(3)]);
        assert!(q.sql().contains("= ?"));
    }

    #[test]
    fn test_colors_less_than() {
        let q = compile_default("colors<ub").unwrap();
        assert_eq!(text_params(&q), vec!["u,b"; 4]);
    }

    #[test]
    fn test_mana_equals() {
        let q = compile_default("mana=ub").unwrap();
        assert_eq!(q.params().len(), 6);
    }

    #[test]
    fn test_unknown_keyword() {
        let err = compile_default("badkey:ral").unwrap_err();
        assert_eq!(err, QueryError::UnknownKeyword("badkey".to_string()));
        assert!(err.to_string().contains("badkey"));
    }

    #[test]
    fn test_grouped_or() {
        let q = compile_default("('serra angel' or 'shivan dragon')").unwrap();
        assert_eq!(
            text_params(&q),
            vec![
                "%serra angel%",
                "%serra angel%",
                "%shivan dragon%",
                "%shivan dragon%"
            ]
        );
        assert!(q.sql().starts_with("( "));
    }

    #[test]
    fn test_grouping_keeps_params() {
        for input in ["angel cmc>2", "c:wu or t:angel", "-set:m15"] {
            let plain = compile_default(input).unwrap();
            let grouped = compile_default(&format!("({input})")).unwrap();
            assert_eq!(plain.params(), grouped.params());
            assert_eq!(grouped.sql(), format!("( {} )", plain.sql()));
        }
    }

    #[test]
    fn test_failed_compile_does_not_leak_params() {
        assert!(compile_default("angel badkey:x").is_err());
        let q = compile_default("cmc:2").unwrap();
        assert_eq!(q.params(), &[Param::Int(2)]);
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let q = compile_default("").unwrap();
        assert!(q.is_empty());
        assert!(q.params().is_empty());
    }

    #[test]
    fn test_diagnostics_are_kept() {
        let q = compile_default("ang#el").unwrap();
        assert_eq!(q.diagnostics().len(), 1);
        assert_eq!(q.diagnostics()[0].ch, '#');
        assert_eq!(q.params().len(), 4);
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let deep = format!("{}angel{}", "(".repeat(20_000), ")".repeat(20_000));
        let err = compile_default(&deep).unwrap_err();
        assert!(matches!(err, QueryError::TooDeep { limit: MAX_NESTING, .. }));

        let negations = format!("{}angel", "-".repeat(200_000));
        assert!(matches!(
            compile_default(&negations).unwrap_err(),
            QueryError::TooDeep { .. }
        ));

        // the next compile is unaffected
        assert_eq!(compile_default("cmc:2").unwrap().params(), &[Param::Int(2)]);
    }

    #[test]
    fn test_keyword_operator_mismatch() {
        let err = compile_default("set>eld").unwrap_err();
        assert_eq!(err.to_string(), "keyword 'set' does not accept '>'");
        let err = compile_default("set=!eld").unwrap_err();
        assert_eq!(err.to_string(), "keyword 'set' does not accept '=!'");
    }

    #[test]
    fn test_keywords_ignore_case() {
        let lower = compile_default("cmc:3").unwrap();
        let upper = compile_default("CMC:3").unwrap();
        assert_eq!(lower, upper);
    }

    fn arb_word() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9]{0,7}".prop_filter("reserved word", |w| !w.eq_ignore_ascii_case("or"))
    }

    fn arb_op() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec![":", "=", ">", "<", ">=", "<=", "!="])
    }

    fn arb_term() -> impl Strategy<Value = String> {
        prop_oneof![
            arb_word(),
            arb_word().prop_map(|w| format!("'{w} {w}'")),
            arb_word().prop_map(|w| format!("!{w}")),
            (any::<bool>(), arb_word()).prop_map(|(exact, w)| {
                format!("name:{}{w}", if exact { "!" } else { "" })
            }),
            (
                prop::sample::select(vec!["cmc", "power", "toughness", "loyalty", "year"]),
                arb_op(),
                0i64..3000,
            )
                .prop_map(|(kw, op, n)| format!("{kw}{op}{n}")),
            (arb_op(), 0u32..500, 0u32..100)
                .prop_map(|(op, whole, cents)| format!("price{op}{whole}.{cents}")),
            (prop::sample::select(vec!["colors", "c"]), arb_op(), "[wubrg]{1,5}")
                .prop_map(|(kw, op, v)| format!("{kw}{op}{v}")),
            (arb_op(), "[0-9]?[wubrgx]{1,4}").prop_map(|(op, v)| format!("mana{op}{v}")),
            (
                prop::sample::select(vec![
                    "set", "rarity", "layout", "legal", "f", "format", "type", "t", "text"
                ]),
                prop::sample::select(vec![":", "="]),
                arb_word(),
            )
                .prop_map(|(kw, op, v)| format!("{kw}{op}{v}")),
        ]
    }

    fn arb_query() -> impl Strategy<Value = String> {
        arb_term().prop_recursive(4, 24, 3, |inner| {
            prop_oneof![
                inner.clone().prop_map(|q| format!("-{q}")),
                inner.clone().prop_map(|q| format!("({q})")),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} {b}")),
                (inner.clone(), inner).prop_map(|(a, b)| format!("{a} or {b}")),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_placeholders_align_with_params(input in arb_query()) {
            let q = compile_default(&input).unwrap();
            prop_assert_eq!(q.predicate().placeholder_count(), q.params().len());
        }

        #[test]
        fn prop_grouping_is_transparent(input in arb_query()) {
            let plain = compile_default(&input).unwrap();
            let grouped = compile_default(&format!("({input})")).unwrap();
            prop_assert_eq!(plain.params(), grouped.params());
        }
    }
}
