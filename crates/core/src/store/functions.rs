//! Scalar functions and collations registered on every card connection.
//!
//! Compiled search predicates call these by name, so a connection without
//! them cannot run a search.

use std::cmp::Ordering;
use std::collections::HashSet;

use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::card::{is_main_set_type, mana};

/// Split a name list on commas that are not followed by a space.
///
/// Card names may themselves contain ", " ("Bruna, the Fading Light").
fn split_names(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let bytes = list.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b',' && bytes.get(i + 1).is_some_and(|next| *next != b' ') {
            parts.push(&list[start..i]);
            start = i + 1;
        }
    }
    parts.push(&list[start..]);
    parts
}

fn split_set(list: &str) -> HashSet<&str> {
    if list.is_empty() {
        HashSet::new()
    } else {
        list.split(',').collect()
    }
}

/// Whether `value` is an element of the comma separated `list`.
pub fn csv_in(list: Option<&str>, value: Option<&str>) -> bool {
    match (list, value) {
        (Some(list), Some(value)) => split_names(list).contains(&value),
        _ => false,
    }
}

/// Element `index` of the comma separated `list`.
pub fn csv_element(list: Option<&str>, index: i64) -> Option<String> {
    let index = usize::try_from(index).ok()?;
    split_names(list?).get(index).map(|s| s.to_string())
}

/// Number of distinct elements of `list`; missing or empty lists have none.
pub fn csv_len(list: Option<&str>) -> i64 {
    let len = list.map(|l| split_set(l).len()).unwrap_or(0);
    i64::try_from(len).unwrap_or(i64::MAX)
}

/// Whether set `a` contains every element of set `b`.
///
/// An empty `b` is contained in anything; a non-empty `b` is never
/// contained in an empty `a`.
pub fn csv_set_contains(a: Option<&str>, b: Option<&str>) -> bool {
    let a = a.unwrap_or("");
    let b = b.unwrap_or("");
    if b.is_empty() {
        return true;
    }
    if a.is_empty() {
        return false;
    }
    split_set(a).is_superset(&split_set(b))
}

/// Element `index` of a " // " separated face name.
pub fn facename_element(name: Option<&str>, index: i64) -> Option<String> {
    let index = usize::try_from(index).ok()?;
    name?.split(" // ").nth(index).map(String::from)
}

/// Alphabetical, except that core and expansion sets sort above all others.
pub fn collate_main_sets_first(a: &str, b: &str) -> Ordering {
    match (is_main_set_type(a), is_main_set_type(b)) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
        (false, false) => a.cmp(b),
    }
}

/// Read argument `idx` as text, whatever its storage class.
fn text_arg(ctx: &Context<'_>, idx: usize) -> Option<String> {
    match ctx.get_raw(idx) {
        ValueRef::Null => None,
        ValueRef::Integer(n) => Some(n.to_string()),
        ValueRef::Real(x) => Some(x.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn int_arg(ctx: &Context<'_>, idx: usize) -> i64 {
    match ctx.get_raw(idx) {
        ValueRef::Integer(n) => n,
        ValueRef::Real(x) => x as i64,
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0),
        _ => 0,
    }
}

/// Register the card functions and the `main_sets_first` collation.
pub fn register(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function("csv_in", 2, flags, |ctx| {
        Ok(csv_in(
            text_arg(ctx, 0).as_deref(),
            text_arg(ctx, 1).as_deref(),
        ))
    })?;
    conn.create_scalar_function("csv_element", 2, flags, |ctx| {
        Ok(csv_element(text_arg(ctx, 0).as_deref(), int_arg(ctx, 1)))
    })?;
    conn.create_scalar_function("csv_len", 1, flags, |ctx| {
        Ok(csv_len(text_arg(ctx, 0).as_deref()))
    })?;
    conn.create_scalar_function("csv_set_contains", 2, flags, |ctx| {
        Ok(csv_set_contains(
            text_arg(ctx, 0).as_deref(),
            text_arg(ctx, 1).as_deref(),
        ))
    })?;
    conn.create_scalar_function("facename_element", 2, flags, |ctx| {
        Ok(facename_element(text_arg(ctx, 0).as_deref(), int_arg(ctx, 1)))
    })?;
    conn.create_scalar_function("manacost_to_cmc", 1, flags, |ctx| {
        Ok(mana::cmc(text_arg(ctx, 0).as_deref()))
    })?;
    conn.create_scalar_function("manacost_contains", 2, flags, |ctx| {
        Ok(mana::contains(
            text_arg(ctx, 0).as_deref(),
            text_arg(ctx, 1).as_deref(),
        ))
    })?;

    conn.create_collation("main_sets_first", collate_main_sets_first)?;

    Ok(())
}
