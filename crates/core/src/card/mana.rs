//! Mana cost arithmetic.
//!
//! Costs are accepted braced (`{2}{W}{U}`), bare (`2wu`) or mixed. Symbols are
//! compared case-insensitively; hybrid symbols compare equal regardless of the
//! order of their halves (`{W/U}` == `{u/w}`).

use std::collections::BTreeMap;

/// Split a mana cost into normalized symbols.
///
/// Braced content is one symbol. Outside braces a run of digits is one
/// generic symbol and every letter is its own symbol. Anything else is
/// ignored.
pub fn symbols(cost: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = cost.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == '{' {
            let rest = &cost[i + 1..];
            let end = rest.find('}').unwrap_or(rest.len());
            let inner = &rest[..end];
            if !inner.trim().is_empty() {
                out.push(normalize_symbol(inner));
            }
            // skip past the closing brace
            while let Some((j, _)) = chars.peek() {
                if *j > i + end + 1 {
                    break;
                }
                chars.next();
            }
        } else if c.is_ascii_digit() {
            let mut digits = c.to_string();
            while let Some((_, d)) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits.push(*d);
                chars.next();
            }
            out.push(digits);
        } else if c.is_alphabetic() {
            out.push(c.to_lowercase().collect());
        }
    }

    out
}

fn normalize_symbol(inner: &str) -> String {
    let lower = inner.trim().to_lowercase();
    if lower.contains('/') {
        let mut parts: Vec<&str> = lower.split('/').collect();
        parts.sort_unstable();
        parts.join("/")
    } else {
        lower
    }
}

fn generic_amount(symbol: &str) -> Option<u32> {
    if !symbol.is_empty() && symbol.bytes().all(|b| b.is_ascii_digit()) {
        symbol.parse().ok()
    } else {
        None
    }
}

/// Converted mana cost of a cost string; `None` costs nothing.
///
/// `X` counts as zero, a generic hybrid such as `{2/W}` counts as two and
/// every other colored, hybrid or phyrexian symbol counts as one.
pub fn cmc(cost: Option<&str>) -> i64 {
    let Some(cost) = cost else {
        return 0;
    };

    symbols(cost)
        .iter()
        .map(|symbol| {
            if symbol == "x" {
                return 0;
            }
            if let Some(n) = generic_amount(symbol) {
                return i64::from(n);
            }
            // generic hybrid: digits sort before letters
            match symbol.split_once('/') {
                Some((left, _)) => generic_amount(left).map(i64::from).unwrap_or(1),
                None => 1,
            }
        })
        .fold(0, i64::saturating_add)
}

/// Multiset of symbols with generic mana flattened into unit pips.
fn pips(cost: &str) -> BTreeMap<String, u64> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for symbol in symbols(cost) {
        let (key, n) = match generic_amount(&symbol) {
            Some(0) => continue,
            Some(n) => ("1".to_string(), u64::from(n)),
            None => (symbol, 1),
        };
        let count = counts.entry(key).or_insert(0);
        *count = count.saturating_add(n);
    }
    counts
}

/// Whether cost `a` contains every pip of cost `b`.
///
/// An empty or missing `b` is contained in anything; a non-empty `b` is never
/// contained in an empty `a`.
pub fn contains(a: Option<&str>, b: Option<&str>) -> bool {
    let a = a.unwrap_or("");
    let b = b.unwrap_or("");
    if b.is_empty() {
        return true;
    }
    if a.is_empty() {
        return false;
    }

    let have = pips(a);
    pips(b)
        .iter()
        .all(|(symbol, need)| have.get(symbol).copied().unwrap_or(0) >= *need)
}
