//! SQLite-backed card store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::types::{ToSqlOutput, Type};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, ToSql};
use tracing::{debug, info, warn};

use super::functions;
use super::{CardLookup, CardStore, SearchOptions, StoreError};
use crate::card::{
    canonical_redirect, Card, CardRecord, FaceGroup, Layout, Legality, Printing, Ruling, SetInfo,
    Side,
};
use crate::query::{Param, Predicate};

/// Lookups ending in this name a token.
const TOKEN_SUFFIX: &str = " token";

/// Novelty sets never shown in listings.
const EXCLUDED_SETS: &str = "'CMB1', 'HHO', 'PTG', 'HTR', 'HTR17', 'HTR18', 'H17'";

/// Display name of a row: the face name for multi-faced cards.
const V_NAME: &str = "CASE WHEN cards.faceName IS NULL THEN cards.name ELSE cards.faceName END";

/// Display name of a token row.
const TOKEN_V_NAME: &str =
    "CASE WHEN tokens.faceName IS NULL THEN tokens.name ELSE tokens.faceName END";

/// Colors of a row; split and aftermath halves carry the colors of the
/// whole card.
const COLORS_SP: &str = "CASE WHEN cards.layout IN ('split', 'aftermath') THEN \
trim(coalesce((SELECT group_concat(sib.colors) FROM cards AS sib \
WHERE csv_in(cards.otherFaceIds, sib.uuid)), '') || ',' || coalesce(cards.colors, ''), ',') \
ELSE cards.colors END";

/// Rows that stand for a whole card in listings.
const PRIMARY_FACE: &str = "((cards.side IS NULL AND cards.layout != 'split') \
OR cards.side = 'a' \
OR (cards.layout = 'meld' AND cards.side = 'b') \
OR (cards.side IS NULL AND cards.layout = 'split' AND v_name = facename_element(cards.name, 0)))";

/// Joins the most recent paper price of each card row.
const LATEST_PRICE: &str = "LEFT JOIN prices ON prices.id = (SELECT p.id FROM prices AS p \
WHERE p.uuid = cards.uuid AND p.type = 'paper' ORDER BY p.date DESC LIMIT 1)";

/// Joins the most recent paper price of each token row.
const TOKEN_LATEST_PRICE: &str = "LEFT JOIN prices ON prices.id = (SELECT p.id FROM prices AS p \
WHERE p.uuid = tokens.uuid AND p.type = 'paper' ORDER BY p.date DESC LIMIT 1)";

fn card_columns() -> String {
    format!(
        "{V_NAME} AS v_name, cards.uuid, cards.name, cards.layout, cards.side, cards.setCode, \
cards.manaCost, cards.convertedManaCost, cards.power, cards.toughness, cards.loyalty, \
cards.types, cards.type, cards.text, cards.rarity, cards.otherFaceIds, cards.printings, \
{COLORS_SP} AS colors_sp"
    )
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Param::Text(s) => s.to_sql(),
            Param::Int(n) => n.to_sql(),
            Param::Real(x) => x.to_sql(),
        }
    }
}

/// A card row as selected by [`card_columns`], plus its price.
struct CardRow {
    v_name: String,
    uuid: String,
    name: String,
    layout: String,
    side: Option<String>,
    set_code: String,
    mana_cost: Option<String>,
    cmc: Option<f64>,
    power: Option<String>,
    toughness: Option<String>,
    loyalty: Option<String>,
    types: Option<String>,
    type_line: Option<String>,
    text: Option<String>,
    rarity: Option<String>,
    other_face_ids: Option<String>,
    printings: Option<String>,
    colors: Option<String>,
    price: Option<f64>,
    price_date: Option<String>,
}

impl CardRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            v_name: row.get("v_name")?,
            uuid: row.get("uuid")?,
            name: row.get("name")?,
            layout: row.get("layout")?,
            side: row.get("side")?,
            set_code: row.get("setCode")?,
            mana_cost: row.get("manaCost")?,
            cmc: row.get("convertedManaCost")?,
            power: row.get("power")?,
            toughness: row.get("toughness")?,
            loyalty: row.get("loyalty")?,
            types: row.get("types")?,
            type_line: row.get("type")?,
            text: row.get("text")?,
            rarity: row.get("rarity")?,
            other_face_ids: row.get("otherFaceIds")?,
            printings: row.get("printings")?,
            colors: row.get("colors_sp")?,
            price: row.get("price")?,
            price_date: row.get("date")?,
        })
    }
}

/// `"Angel token"` is the token `"Angel"`.
fn token_name(name: &str) -> Option<&str> {
    let split = name.len().checked_sub(TOKEN_SUFFIX.len())?;
    let suffix = name.get(split..)?;
    if split > 0 && suffix.eq_ignore_ascii_case(TOKEN_SUFFIX) {
        name.get(..split)
    } else {
        None
    }
}

fn face_names(name: &str) -> Vec<String> {
    if name.contains(" // ") {
        name.split(" // ").map(String::from).collect()
    } else {
        Vec::new()
    }
}

fn split_list(list: Option<&str>) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in list.unwrap_or("").split(',').map(str::trim) {
        if !item.is_empty() && !items.iter().any(|seen| seen == item) {
            items.push(item.to_string());
        }
    }
    items
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

/// SQLite-backed card store.
pub struct SqliteCardStore {
    conn: Mutex<Connection>,
}

impl SqliteCardStore {
    /// Open an existing card database.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::Missing(path.display().to_string()));
        }
        let conn = Connection::open(path).map_err(db_err)?;
        let store = Self::with_connection(conn)?;
        info!(path = %path.display(), "Opened card database");
        Ok(store)
    }

    /// Create an in-memory card store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        functions::register(&conn).map_err(db_err)?;
        conn.execute_batch("PRAGMA case_sensitive_like = ON;")
            .map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create the tables the store reads, if missing.
    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uuid TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                faceName TEXT,
                layout TEXT NOT NULL,
                side TEXT,
                setCode TEXT NOT NULL,
                manaCost TEXT,
                convertedManaCost REAL NOT NULL DEFAULT 0,
                power TEXT,
                toughness TEXT,
                loyalty TEXT,
                colors TEXT,
                types TEXT NOT NULL,
                subtypes TEXT,
                supertypes TEXT,
                type TEXT NOT NULL,
                text TEXT,
                rarity TEXT,
                otherFaceIds TEXT,
                printings TEXT,
                availability TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_cards_name ON cards(name);
            CREATE INDEX IF NOT EXISTS idx_cards_set ON cards(setCode);

            CREATE TABLE IF NOT EXISTS sets (
                code TEXT PRIMARY KEY,
                type TEXT NOT NULL,
                releaseDate TEXT
            );

            CREATE TABLE IF NOT EXISTS legalities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uuid TEXT NOT NULL,
                format TEXT NOT NULL,
                status TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_legalities_uuid ON legalities(uuid);

            CREATE TABLE IF NOT EXISTS prices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uuid TEXT NOT NULL,
                price REAL,
                type TEXT NOT NULL,
                date TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_prices_uuid ON prices(uuid);

            CREATE TABLE IF NOT EXISTS rulings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uuid TEXT NOT NULL,
                date TEXT NOT NULL,
                text TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_rulings_uuid ON rulings(uuid);

            CREATE TABLE IF NOT EXISTS tokens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uuid TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                faceName TEXT,
                layout TEXT NOT NULL,
                side TEXT,
                setCode TEXT NOT NULL,
                power TEXT,
                toughness TEXT,
                colors TEXT,
                types TEXT NOT NULL,
                type TEXT NOT NULL,
                text TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_tokens_name ON tokens(name);
            "#,
        )
        .map_err(db_err)?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Internal(format!("connection lock poisoned: {e}")))
    }

    /// Insert or replace one card row.
    pub fn insert_record(&self, record: &CardRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO cards (uuid, name, faceName, layout, side, setCode, manaCost,
                convertedManaCost, power, toughness, loyalty, colors, types, subtypes,
                supertypes, type, text, rarity, otherFaceIds, printings, availability)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20, ?21)",
            params![
                record.uuid,
                record.name,
                record.face_name,
                record.layout,
                record.side,
                record.set_code,
                record.mana_cost,
                record.converted_mana_cost,
                record.power,
                record.toughness,
                record.loyalty,
                record.colors,
                record.types,
                record.subtypes,
                record.supertypes,
                record.type_line,
                record.text,
                record.rarity,
                record.other_face_ids,
                record.printings,
                record.availability,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Insert or replace one token row. Card-only fields of `record` are
    /// not stored.
    pub fn insert_token(&self, record: &CardRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO tokens (uuid, name, faceName, layout, side, setCode, power,
                toughness, colors, types, type, text)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                record.uuid,
                record.name,
                record.face_name,
                record.layout,
                record.side,
                record.set_code,
                record.power,
                record.toughness,
                record.colors,
                record.types,
                record.type_line,
                record.text,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn insert_set(&self, set: &SetInfo) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO sets (code, type, releaseDate) VALUES (?, ?, ?)",
            params![
                set.code,
                set.set_type,
                set.release_date.map(|d| d.format("%Y-%m-%d").to_string()),
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn insert_legality(&self, uuid: &str, legality: &Legality) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO legalities (uuid, format, status) VALUES (?, ?, ?)",
            params![uuid, legality.format, legality.status],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Record a paper price in USD.
    pub fn insert_price(
        &self,
        uuid: &str,
        price: f64,
        date: Option<NaiveDate>,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO prices (uuid, price, type, date) VALUES (?, ?, 'paper', ?)",
            params![uuid, price, date.map(|d| d.format("%Y-%m-%d").to_string())],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn insert_ruling(&self, uuid: &str, ruling: &Ruling) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO rulings (uuid, date, text) VALUES (?, ?, ?)",
            params![
                uuid,
                ruling.date.format("%Y-%m-%d").to_string(),
                ruling.text
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Run a single-card query and resolve its first row.
    fn lookup_card(conn: &Connection, lookup: &CardLookup) -> Result<Card, StoreError> {
        let mut sql = format!(
            "SELECT {}, prices.price, prices.date
             FROM cards
                LEFT JOIN sets ON cards.setCode = sets.code
                {LATEST_PRICE}",
            card_columns()
        );
        if lookup.format.is_some() {
            sql.push_str(" LEFT JOIN legalities ON cards.uuid = legalities.uuid");
        }
        sql.push_str(" WHERE lower(v_name) = lower(?) AND csv_in(cards.availability, 'paper')");

        let mut values = vec![lookup.name.clone()];
        if let Some(set_code) = &lookup.set_code {
            sql.push_str(" AND lower(cards.setCode) = lower(?)");
            values.push(set_code.clone());
        }
        if let Some(format) = &lookup.format {
            sql.push_str(
                " AND lower(legalities.format) = lower(?) AND legalities.status = 'Legal'",
            );
            values.push(format.clone());
        }
        sql.push_str(
            " ORDER BY sets.type COLLATE main_sets_first DESC, sets.releaseDate DESC LIMIT 1",
        );

        let row = conn
            .query_row(&sql, params_from_iter(values.iter()), CardRow::from_row)
            .optional()
            .map_err(db_err)?
            .ok_or_else(|| lookup.not_found())?;

        Self::resolve(conn, row, lookup)
    }

    /// Look up a token by name. Tokens have no sibling faces, no rulings
    /// and no format filter.
    fn lookup_token(conn: &Connection, lookup: &CardLookup) -> Result<Card, StoreError> {
        let mut sql = format!(
            "SELECT {TOKEN_V_NAME} AS v_name, tokens.uuid, tokens.name, tokens.layout,
                tokens.side, tokens.setCode, tokens.power, tokens.toughness, tokens.colors,
                tokens.types, tokens.type, tokens.text, prices.price, prices.date
             FROM tokens
                LEFT JOIN sets ON tokens.setCode = sets.code
                {TOKEN_LATEST_PRICE}
             WHERE lower(v_name) = lower(?)"
        );
        let mut values = vec![lookup.name.clone()];
        if let Some(set_code) = &lookup.set_code {
            sql.push_str(" AND lower(tokens.setCode) = lower(?)");
            values.push(set_code.clone());
        }
        sql.push_str(
            " ORDER BY sets.type COLLATE main_sets_first DESC, sets.releaseDate DESC LIMIT 1",
        );

        let mut card = conn
            .query_row(&sql, params_from_iter(values.iter()), |row| {
                let uuid: String = row.get("uuid")?;
                let side: Option<String> = row.get("side")?;
                let name: String = row.get("name")?;
                let colors: Option<String> = row.get("colors")?;
                let types: Option<String> = row.get("types")?;
                let price_date: Option<String> = row.get("date")?;
                Ok(Card {
                    name: row.get("v_name")?,
                    names: face_names(&name),
                    faces: FaceGroup::new(uuid, side.as_deref().and_then(Side::parse), None),
                    layout: Layout::parse(&row.get::<_, String>("layout")?),
                    token: true,
                    set_code: row.get("setCode")?,
                    power: row.get("power")?,
                    toughness: row.get("toughness")?,
                    colors: split_list(colors.as_deref()),
                    types: split_list(types.as_deref()),
                    type_line: row.get::<_, Option<String>>("type")?.unwrap_or_default(),
                    text: row.get("text")?,
                    price: row.get("price")?,
                    price_date: price_date.as_deref().and_then(parse_date),
                    ..Default::default()
                })
            })
            .optional()
            .map_err(db_err)?
            .ok_or_else(|| lookup.token_not_found())?;

        if lookup.verbose {
            card.formats = Some(Self::query_formats(conn, card.uuid())?);
        }
        Ok(card)
    }

    /// Sets `name` was printed in, each with its cheapest paper price.
    /// `table` is `cards` or `tokens`; `v_name` its display name expression.
    fn query_printings(
        conn: &Connection,
        table: &str,
        v_name: &str,
        name: &str,
    ) -> Result<Vec<Printing>, StoreError> {
        let sql = format!(
            "SELECT {table}.setCode, min(prices.price)
             FROM {table}
                LEFT JOIN sets ON {table}.setCode = sets.code
                LEFT JOIN prices ON {table}.uuid = prices.uuid AND prices.type = 'paper'
             WHERE lower({v_name}) = lower(?)
             GROUP BY {table}.setCode
             ORDER BY sets.type COLLATE main_sets_first DESC, sets.releaseDate DESC"
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params![name], |row| {
                Ok(Printing {
                    set_code: row.get(0)?,
                    price: row.get(1)?,
                })
            })
            .map_err(db_err)?;

        let mut printings = Vec::new();
        for row in rows {
            printings.push(row.map_err(db_err)?);
        }
        Ok(printings)
    }

    /// Load a single row by identity, single-sided.
    fn load_face(conn: &Connection, uuid: &str) -> Result<Option<Card>, StoreError> {
        let sql = format!(
            "SELECT {}, NULL AS price, NULL AS date FROM cards WHERE cards.uuid = ?",
            card_columns()
        );
        let row = conn
            .query_row(&sql, params![uuid], CardRow::from_row)
            .optional()
            .map_err(db_err)?;

        match row {
            Some(row) => {
                let lookup = CardLookup {
                    single_side: true,
                    ..Default::default()
                };
                Self::resolve(conn, row, &lookup).map(Some)
            }
            None => Ok(None),
        }
    }

    fn load_faces(conn: &Connection, group: &FaceGroup) -> Result<Vec<Card>, StoreError> {
        let mut faces = Vec::with_capacity(group.sibling_uuids.len());
        for uuid in &group.sibling_uuids {
            match Self::load_face(conn, uuid)? {
                Some(face) => faces.push(face),
                None => warn!(uuid = %uuid, of = %group.uuid, "Sibling face missing"),
            }
        }
        Ok(faces)
    }

    /// Turn a row into a card, following the side "b" redirect and loading
    /// sibling faces unless `lookup.single_side` is set.
    fn resolve(conn: &Connection, row: CardRow, lookup: &CardLookup) -> Result<Card, StoreError> {
        let layout = Layout::parse(&row.layout);
        let side = row.side.as_deref().and_then(Side::parse);
        let names = face_names(&row.name);

        if !lookup.single_side {
            if let Some(target) = canonical_redirect(layout, side, &names) {
                if !target.eq_ignore_ascii_case(&row.v_name) {
                    debug!(from = %row.v_name, to = %target, "Resolving face to its card");
                    let redirected = CardLookup {
                        name: target.to_string(),
                        set_code: Some(row.set_code.clone()),
                        format: None,
                        ..lookup.clone()
                    };
                    return Self::lookup_card(conn, &redirected);
                }
            }
        }

        let faces = FaceGroup::new(row.uuid, side, row.other_face_ids.as_deref());
        let mut card = Card {
            name: row.v_name,
            names,
            layout,
            set_code: row.set_code,
            mana_cost: row
                .mana_cost
                .map(|cost| cost.replace(['{', '}'], ""))
                .filter(|cost| !cost.is_empty()),
            cmc: row.cmc.unwrap_or(0.0),
            power: row.power,
            toughness: row.toughness,
            loyalty: row.loyalty,
            colors: split_list(row.colors.as_deref()),
            types: split_list(row.types.as_deref()),
            type_line: row.type_line.unwrap_or_default(),
            text: row.text,
            rarity: row.rarity,
            printings: split_list(row.printings.as_deref()),
            price: row.price,
            price_date: row.price_date.as_deref().and_then(parse_date),
            faces,
            ..Default::default()
        };

        if lookup.verbose {
            card.formats = Some(Self::query_formats(conn, card.uuid())?);
        }
        if lookup.rulings {
            card.rulings = Some(Self::query_rulings(conn, card.uuid())?);
        }
        if !lookup.single_side && card.faces.has_siblings() {
            card.other_faces = Self::load_faces(conn, &card.faces)?;
        }

        Ok(card)
    }

    fn query_formats(conn: &Connection, uuid: &str) -> Result<Vec<Legality>, StoreError> {
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT format, status FROM legalities WHERE uuid = ? ORDER BY format",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![uuid], |row| {
                Ok(Legality {
                    format: row.get(0)?,
                    status: row.get(1)?,
                })
            })
            .map_err(db_err)?;

        let mut formats = Vec::new();
        for row in rows {
            formats.push(row.map_err(db_err)?);
        }
        Ok(formats)
    }

    fn query_rulings(conn: &Connection, uuid: &str) -> Result<Vec<Ruling>, StoreError> {
        let mut stmt = conn
            .prepare("SELECT date, text FROM rulings WHERE uuid = ? ORDER BY id")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![uuid], |row| {
                let date: String = row.get(0)?;
                let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
                })?;
                Ok(Ruling {
                    date,
                    text: row.get(1)?,
                })
            })
            .map_err(db_err)?;

        let mut rulings = Vec::new();
        for row in rows {
            rulings.push(row.map_err(db_err)?);
        }
        Ok(rulings)
    }
}

impl CardStore for SqliteCardStore {
    fn search(
        &self,
        predicate: &Predicate,
        options: &SearchOptions,
    ) -> Result<Vec<Card>, StoreError> {
        let conn = self.lock()?;

        let filter = if predicate.is_empty() {
            String::new()
        } else {
            format!("AND ({})", predicate.sql())
        };
        let direction = if options.reverse { "DESC" } else { "ASC" };
        let limit = options
            .limit
            .map(|n| format!("LIMIT {n}"))
            .unwrap_or_default();

        let sql = format!(
            "WITH main_first AS (
                SELECT {columns}, prices.price, prices.date
                FROM cards
                    JOIN sets ON cards.setCode = sets.code
                    LEFT JOIN legalities ON cards.uuid = legalities.uuid
                    {LATEST_PRICE}
                WHERE csv_in(cards.availability, 'paper')
                    AND cards.setCode NOT IN ({EXCLUDED_SETS})
                    AND {PRIMARY_FACE}
                    {filter}
            )
            SELECT * FROM main_first
            GROUP BY v_name
            ORDER BY {sort} {direction}
            {limit}",
            columns = card_columns(),
            sort = options.sort.column(),
        );
        debug!(
            params = predicate.params().len(),
            sort = %options.sort,
            "Searching cards"
        );

        let rows = {
            let mut stmt = conn.prepare(&sql).map_err(db_err)?;
            let mapped = stmt
                .query_map(params_from_iter(predicate.params().iter()), CardRow::from_row)
                .map_err(db_err)?;
            let mut rows = Vec::new();
            for row in mapped {
                rows.push(row.map_err(db_err)?);
            }
            rows
        };

        let lookup = CardLookup::default();
        let cards = rows
            .into_iter()
            .map(|row| Self::resolve(&conn, row, &lookup))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = cards.len(), "Search finished");
        Ok(cards)
    }

    fn get_card(&self, lookup: &CardLookup) -> Result<Card, StoreError> {
        let conn = self.lock()?;
        match token_name(&lookup.name) {
            Some(name) => {
                let token = CardLookup {
                    name: name.to_string(),
                    format: None,
                    ..lookup.clone()
                };
                debug!(name = %token.name, "Looking up token");
                Self::lookup_token(&conn, &token)
            }
            None => Self::lookup_card(&conn, lookup),
        }
    }

    fn get_alternate_faces(&self, card: &Card) -> Result<Vec<Card>, StoreError> {
        let conn = self.lock()?;
        Self::load_faces(&conn, &card.faces)
    }

    fn get_rulings(&self, uuid: &str) -> Result<Vec<Ruling>, StoreError> {
        let conn = self.lock()?;
        Self::query_rulings(&conn, uuid)
    }

    fn get_formats(&self, uuid: &str) -> Result<Vec<Legality>, StoreError> {
        let conn = self.lock()?;
        Self::query_formats(&conn, uuid)
    }

    fn get_price(&self, name: &str, set_code: &str) -> Result<Option<f64>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT prices.price
             FROM cards
                JOIN prices ON cards.uuid = prices.uuid AND prices.type = 'paper'
             WHERE lower({V_NAME}) = lower(?) AND lower(cards.setCode) = lower(?)
                AND prices.price IS NOT NULL
             ORDER BY prices.price
             LIMIT 1"
        );
        conn.query_row(&sql, params![name, set_code], |row| row.get(0))
            .optional()
            .map_err(db_err)
    }

    fn get_printings(&self, name: &str) -> Result<Vec<Printing>, StoreError> {
        let conn = self.lock()?;
        Self::query_printings(&conn, "cards", V_NAME, name)
    }

    fn get_token_printings(&self, name: &str) -> Result<Vec<Printing>, StoreError> {
        let conn = self.lock()?;
        Self::query_printings(&conn, "tokens", TOKEN_V_NAME, name)
    }

    fn get_sets(&self) -> Result<Vec<SetInfo>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT code, type, releaseDate FROM sets
                 ORDER BY type COLLATE main_sets_first DESC, releaseDate DESC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                let release_date: Option<String> = row.get(2)?;
                Ok(SetInfo {
                    code: row.get(0)?,
                    set_type: row.get(1)?,
                    release_date: release_date.as_deref().and_then(parse_date),
                })
            })
            .map_err(db_err)?;

        let mut sets = Vec::new();
        for row in rows {
            sets.push(row.map_err(db_err)?);
        }
        Ok(sets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{compile, CompileOptions};
    use crate::store::SortKey;
    use crate::testing::fixtures;

    fn create_test_store() -> SqliteCardStore {
        fixtures::sample_store().unwrap()
    }

    fn search_names(store: &SqliteCardStore, query: &str) -> Vec<String> {
        let compiled = compile(query, &CompileOptions::default()).unwrap();
        store
            .search(compiled.predicate(), &SearchOptions::default())
            .unwrap()
            .into_iter()
            .map(|card| card.name)
            .collect()
    }

    #[test]
    fn test_open_missing_database() {
        let dir = tempfile::tempdir().unwrap();
        let result = SqliteCardStore::open(&dir.path().join("absent.sqlite"));
        assert!(matches!(result, Err(StoreError::Missing(_))));
    }

    #[test]
    fn test_open_existing_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.sqlite");
        Connection::open(&path).unwrap();

        let store = SqliteCardStore::open(&path).unwrap();
        assert!(store.get_sets().unwrap().is_empty());
    }

    #[test]
    fn test_param_binds_by_type() {
        let store = SqliteCardStore::in_memory().unwrap();
        let conn = store.lock().unwrap();
        let (text, int, real): (String, i64, f64) = conn
            .query_row(
                "SELECT ?, ?, ?",
                params_from_iter(
                    [
                        Param::Text("a".to_string()),
                        Param::Int(2),
                        Param::Real(0.5),
                    ]
                    .iter(),
                ),
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!((text.as_str(), int, real), ("a", 2, 0.5));
    }

    #[test]
    fn test_empty_query_lists_primary_faces_only() {
        let store = create_test_store();
        let names = search_names(&store, "");
        assert!(names.contains(&"Serra Angel".to_string()));
        assert!(names.contains(&"Fire".to_string()));
        assert!(!names.contains(&"Ice".to_string()));
        assert!(!names.contains(&"Stomp".to_string()));
        assert!(!names.contains(&"Insectile Aberration".to_string()));
        assert!(names.contains(&"Bruna, the Fading Light".to_string()));
        assert!(names.contains(&"Gisela, the Broken Blade".to_string()));
        assert!(!names.contains(&"Brisela, Voice of Nightmares".to_string()));
    }

    #[test]
    fn test_search_excludes_novelty_sets_and_non_paper() {
        let store = create_test_store();
        let names = search_names(&store, "");
        assert!(!names.contains(&"Playtest Angel".to_string()));
        assert!(!names.contains(&"Digital Dragon".to_string()));
    }

    #[test]
    fn test_search_deduplicates_reprints() {
        let store = create_test_store();
        let names = search_names(&store, "serra");
        assert_eq!(names, vec!["Serra Angel"]);
    }

    #[test]
    fn test_search_sorted_and_limited() {
        let store = create_test_store();
        let compiled = compile("t:creature", &CompileOptions::default()).unwrap();
        let options = SearchOptions {
            sort: SortKey::Cmc,
            reverse: true,
            limit: Some(2),
        };
        let cards = store.search(compiled.predicate(), &options).unwrap();
        assert_eq!(cards.len(), 2);
        assert!(cards[0].cmc >= cards[1].cmc);
    }

    #[test]
    fn test_search_no_match_is_empty() {
        let store = create_test_store();
        assert!(search_names(&store, "nonexistentcardname").is_empty());
    }

    #[test]
    fn test_get_card_prefers_main_sets() {
        let store = create_test_store();
        let card = store.get_card(&CardLookup::named("serra angel")).unwrap();
        assert_eq!(card.name, "Serra Angel");
        assert_eq!(card.set_code, "M15");
        assert_eq!(card.mana_cost.as_deref(), Some("3WW"));
    }

    #[test]
    fn test_get_card_in_set() {
        let store = create_test_store();
        let lookup = CardLookup {
            set_code: Some("a25".to_string()),
            ..CardLookup::named("Serra Angel")
        };
        assert_eq!(store.get_card(&lookup).unwrap().set_code, "A25");
    }

    #[test]
    fn test_get_card_not_found() {
        let store = create_test_store();
        let lookup = CardLookup {
            set_code: Some("m15".to_string()),
            ..CardLookup::named("x")
        };
        let err = store.get_card(&lookup).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(err.to_string(), "card not found in 'm15': 'x'");
    }

    #[test]
    fn test_get_card_in_format_requires_legal() {
        let store = create_test_store();
        let legal = CardLookup {
            format: Some("modern".to_string()),
            ..CardLookup::named("Shivan Dragon")
        };
        assert!(store.get_card(&legal).is_ok());

        let banned = CardLookup {
            format: Some("standard".to_string()),
            ..CardLookup::named("Shivan Dragon")
        };
        assert!(matches!(
            store.get_card(&banned),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_side_b_redirects_to_side_a() {
        let store = create_test_store();
        let stomp = store.get_card(&CardLookup::named("Stomp")).unwrap();
        assert_eq!(stomp.name, "Bonecrusher Giant");
        assert_eq!(stomp.other_faces.len(), 1);
        assert_eq!(stomp.other_faces[0].name, "Stomp");
    }

    #[test]
    fn test_single_side_does_not_redirect() {
        let store = create_test_store();
        let lookup = CardLookup {
            single_side: true,
            ..CardLookup::named("Stomp")
        };
        let card = store.get_card(&lookup).unwrap();
        assert_eq!(card.name, "Stomp");
        assert!(card.other_faces.is_empty());
    }

    #[test]
    fn test_transform_back_face_is_not_redirected() {
        let store = create_test_store();
        let card = store
            .get_card(&CardLookup::named("Insectile Aberration"))
            .unwrap();
        assert_eq!(card.name, "Insectile Aberration");
        assert_eq!(card.other_faces[0].name, "Delver of Secrets");
    }

    #[test]
    fn test_split_colors_cover_both_halves() {
        let store = create_test_store();
        let fire = store.get_card(&CardLookup::named("Fire")).unwrap();
        let mut colors = fire.colors.clone();
        colors.sort();
        assert_eq!(colors, vec!["R", "U"]);
    }

    #[test]
    fn test_verbose_and_rulings() {
        let store = create_test_store();
        let lookup = CardLookup {
            verbose: true,
            rulings: true,
            ..CardLookup::named("Serra Angel")
        };
        let card = store.get_card(&lookup).unwrap();
        let formats = card.formats.unwrap();
        assert!(formats.iter().any(|f| f.format == "commander"));
        assert_eq!(card.rulings.unwrap().len(), 1);
        assert!(card.price.is_some());
    }

    #[test]
    fn test_get_alternate_faces() {
        let store = create_test_store();
        let lookup = CardLookup {
            single_side: true,
            ..CardLookup::named("Delver of Secrets")
        };
        let delver = store.get_card(&lookup).unwrap();
        let faces = store.get_alternate_faces(&delver).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].name, "Insectile Aberration");
    }

    #[test]
    fn test_get_price_and_printings() {
        let store = create_test_store();
        assert_eq!(store.get_price("Serra Angel", "m15").unwrap(), Some(0.25));
        assert_eq!(store.get_price("Serra Angel", "xyz").unwrap(), None);

        let printings = store.get_printings("serra angel").unwrap();
        assert_eq!(printings[0].set_code, "M15");
        assert!(printings.iter().any(|p| p.set_code == "A25"));
    }

    #[test]
    fn test_token_name_suffix() {
        assert_eq!(token_name("Angel token"), Some("Angel"));
        assert_eq!(token_name("Angel TOKEN"), Some("Angel"));
        assert_eq!(token_name(" token"), None);
        assert_eq!(token_name("Tokenizer"), None);
        assert_eq!(token_name("Serra Angel"), None);
    }

    #[test]
    fn test_get_token() {
        let store = create_test_store();

        let angel = store.get_card(&CardLookup::named("Angel token")).unwrap();
        assert!(angel.token);
        assert_eq!(angel.name, "Angel");
        assert_eq!(angel.set_code, "TA25");
        assert_eq!(angel.type_line, "Token Creature — Angel");
        assert_eq!(angel.price, Some(0.40));
        assert!(angel.other_faces.is_empty());

        let lookup = CardLookup {
            set_code: Some("tm15".to_string()),
            format: Some("modern".to_string()),
            ..CardLookup::named("angel Token")
        };
        assert_eq!(store.get_card(&lookup).unwrap().set_code, "TM15");

        // tokens are not cards
        let err = store.get_card(&CardLookup::named("Angel")).unwrap_err();
        assert_eq!(err.to_string(), "card not found: 'Angel'");
        assert!(search_names(&store, "angel").iter().all(|n| n != "Angel"));
    }

    #[test]
    fn test_token_not_found() {
        let store = create_test_store();
        let err = store
            .get_card(&CardLookup::named("Serra Angel token"))
            .unwrap_err();
        assert_eq!(err.to_string(), "token card not found: 'Serra Angel'");

        let lookup = CardLookup {
            set_code: Some("m15".to_string()),
            ..CardLookup::named("Angel token")
        };
        assert_eq!(
            store.get_card(&lookup).unwrap_err().to_string(),
            "token card not found in 'm15': 'Angel'"
        );
    }

    #[test]
    fn test_get_token_printings() {
        let store = create_test_store();
        let printings = store.get_token_printings("angel").unwrap();
        assert_eq!(
            printings,
            vec![
                Printing {
                    set_code: "TA25".to_string(),
                    price: Some(0.40)
                },
                Printing {
                    set_code: "TM15".to_string(),
                    price: Some(0.15)
                },
            ]
        );
        assert!(store.get_printings("angel").unwrap().is_empty());
    }

    #[test]
    fn test_get_sets_main_first() {
        let store = create_test_store();
        let sets = store.get_sets().unwrap();
        let first_other = sets.iter().position(|s| !s.is_main()).unwrap();
        assert!(sets[..first_other].iter().all(SetInfo::is_main));
        assert!(sets[first_other..].iter().all(|s| !s.is_main()));
    }

    #[test]
    fn test_rulings_empty_for_unknown_uuid() {
        let store = create_test_store();
        assert!(store.get_rulings("nope").unwrap().is_empty());
        assert!(store.get_formats("nope").unwrap().is_empty());
    }
}
