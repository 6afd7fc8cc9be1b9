//! Testing utilities: a small card database covering every multi-face
//! layout.
//!
//! # Example
//!
//! ```rust,ignore
//! use mtgcard_core::testing::fixtures;
//! use mtgcard_core::{CardLookup, CardStore};
//!
//! let store = fixtures::sample_store()?;
//! let card = store.get_card(&CardLookup::named("Stomp"))?;
//! assert_eq!(card.name, "Bonecrusher Giant");
//! ```

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::NaiveDate;

    use crate::card::{CardRecord, Legality, Ruling, SetInfo};
    use crate::store::{SqliteCardStore, StoreError};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("fixture dates are valid")
    }

    /// A paper card row with reasonable defaults.
    pub fn record(uuid: &str, name: &str, set_code: &str) -> CardRecord {
        CardRecord {
            uuid: uuid.to_string(),
            name: name.to_string(),
            layout: "normal".to_string(),
            set_code: set_code.to_string(),
            availability: "mtgo,paper".to_string(),
            rarity: Some("common".to_string()),
            ..Default::default()
        }
    }

    /// One face of a multi-faced card.
    pub fn face(
        uuid: &str,
        name: &str,
        face_name: &str,
        set_code: &str,
        layout: &str,
        side: &str,
        other_face_ids: &str,
    ) -> CardRecord {
        CardRecord {
            face_name: Some(face_name.to_string()),
            layout: layout.to_string(),
            side: Some(side.to_string()),
            other_face_ids: Some(other_face_ids.to_string()),
            ..record(uuid, name, set_code)
        }
    }

    fn creature(mut card: CardRecord, mana: &str, cmc: f64, pt: (&str, &str)) -> CardRecord {
        card.mana_cost = Some(mana.to_string()).filter(|m| !m.is_empty());
        card.converted_mana_cost = cmc;
        card.power = Some(pt.0.to_string());
        card.toughness = Some(pt.1.to_string());
        card.types = "Creature".to_string();
        card
    }

    fn spell(mut card: CardRecord, mana: &str, cmc: f64, types: &str) -> CardRecord {
        card.mana_cost = Some(mana.to_string());
        card.converted_mana_cost = cmc;
        card.types = types.to_string();
        card.type_line = types.to_string();
        card
    }

    fn typed(
        mut card: CardRecord,
        colors: &str,
        subtypes: &str,
        type_line: &str,
        text: &str,
    ) -> CardRecord {
        card.colors = Some(colors.to_string()).filter(|c| !c.is_empty());
        card.subtypes = Some(subtypes.to_string()).filter(|s| !s.is_empty());
        card.type_line = type_line.to_string();
        card.text = Some(text.to_string());
        card
    }

    fn legendary(mut card: CardRecord) -> CardRecord {
        card.supertypes = Some("Legendary".to_string());
        card
    }

    fn rarity(mut card: CardRecord, rarity: &str) -> CardRecord {
        card.rarity = Some(rarity.to_string());
        card
    }

    /// Sets referenced by [`records`].
    pub fn sets() -> Vec<SetInfo> {
        [
            ("M15", "core", "2014-07-18"),
            ("10E", "core", "2007-07-13"),
            ("A25", "masters", "2018-03-16"),
            ("VMA", "masters", "2014-06-16"),
            ("ELD", "expansion", "2019-10-04"),
            ("APC", "expansion", "2001-06-04"),
            ("AKH", "expansion", "2017-04-28"),
            ("ISD", "expansion", "2011-09-30"),
            ("BOK", "expansion", "2005-02-04"),
            ("EMN", "expansion", "2016-07-22"),
            ("CMB1", "funny", "2019-11-07"),
            ("TM15", "token", "2014-07-18"),
            ("TA25", "token", "2018-03-16"),
        ]
        .into_iter()
        .map(|(code, set_type, released)| SetInfo {
            code: code.to_string(),
            set_type: set_type.to_string(),
            release_date: Some(date(released)),
        })
        .collect()
    }

    /// Card rows: two plain cards with reprints, one card of each
    /// multi-face layout, and rows that listings must never show.
    pub fn records() -> Vec<CardRecord> {
        let serra = |uuid: &str, set: &str| {
            let mut card = typed(
                creature(record(uuid, "Serra Angel", set), "{3}{W}{W}", 5.0, ("4", "4")),
                "W",
                "Angel",
                "Creature — Angel",
                "Flying\nVigilance",
            );
            card.rarity = Some("uncommon".to_string());
            card.printings = Some("10E,A25,M15".to_string());
            card
        };

        let mut digital = typed(
            creature(record("dragon-vma", "Digital Dragon", "VMA"), "{3}{R}", 4.0, ("4", "4")),
            "R",
            "Dragon",
            "Creature — Dragon",
            "Flying",
        );
        digital.availability = "mtgo".to_string();

        vec![
            serra("serra-m15", "M15"),
            serra("serra-a25", "A25"),
            serra("serra-10e", "10E"),
            rarity(
                typed(
                    creature(
                        record("shivan-m15", "Shivan Dragon", "M15"),
                        "{4}{R}{R}",
                        6.0,
                        ("5", "5"),
                    ),
                    "R",
                    "Dragon",
                    "Creature — Dragon",
                    "Flying\n{R}: Shivan Dragon gets +1/+0 until end of turn.",
                ),
                "rare",
            ),
            // split
            typed(
                spell(
                    face("fire-apc", "Fire // Ice", "Fire", "APC", "split", "a", "ice-apc"),
                    "{1}{R}",
                    4.0,
                    "Instant",
                ),
                "R",
                "",
                "Instant",
                "Fire deals 2 damage divided as you choose among one or two targets.",
            ),
            typed(
                spell(
                    face("ice-apc", "Fire // Ice", "Ice", "APC", "split", "b", "fire-apc"),
                    "{1}{U}",
                    4.0,
                    "Instant",
                ),
                "U",
                "",
                "Instant",
                "Tap target permanent.\nDraw a card.",
            ),
            // adventure
            rarity(
                typed(
                    creature(
                        face(
                            "bonecrusher-eld",
                            "Bonecrusher Giant // Stomp",
                            "Bonecrusher Giant",
                            "ELD",
                            "adventure",
                            "a",
                            "stomp-eld",
                        ),
                        "{2}{R}",
                        3.0,
                        ("4", "3"),
                    ),
                    "R",
                    "Giant",
                    "Creature — Giant",
                    "Whenever Bonecrusher Giant becomes the target of a spell, \
Bonecrusher Giant deals 2 damage to that spell's controller.",
                ),
                "rare",
            ),
            typed(
                spell(
                    face(
                        "stomp-eld",
                        "Bonecrusher Giant // Stomp",
                        "Stomp",
                        "ELD",
                        "adventure",
                        "b",
                        "bonecrusher-eld",
                    ),
                    "{1}{R}",
                    3.0,
                    "Instant",
                ),
                "R",
                "Adventure",
                "Instant — Adventure",
                "Damage can't be prevented this turn. Stomp deals 2 damage to any target.",
            ),
            // aftermath
            typed(
                spell(
                    face(
                        "commit-akh",
                        "Commit // Memory",
                        "Commit",
                        "AKH",
                        "aftermath",
                        "a",
                        "memory-akh",
                    ),
                    "{3}{U}",
                    10.0,
                    "Instant",
                ),
                "U",
                "",
                "Instant",
                "Put target spell or nonland permanent into its owner's library \
second from the top.",
            ),
            typed(
                spell(
                    face(
                        "memory-akh",
                        "Commit // Memory",
                        "Memory",
                        "AKH",
                        "aftermath",
                        "b",
                        "commit-akh",
                    ),
                    "{4}{U}{U}",
                    10.0,
                    "Sorcery",
                ),
                "U",
                "",
                "Sorcery",
                "Aftermath\nEach player shuffles their hand and graveyard into their library, \
then draws seven cards.",
            ),
            // transform
            typed(
                creature(
                    face(
                        "delver-isd",
                        "Delver of Secrets // Insectile Aberration",
                        "Delver of Secrets",
                        "ISD",
                        "transform",
                        "a",
                        "aberration-isd",
                    ),
                    "{U}",
                    1.0,
                    ("1", "1"),
                ),
                "U",
                "Human,Wizard",
                "Creature — Human Wizard",
                "At the beginning of your upkeep, look at the top card of your library.",
            ),
            typed(
                creature(
                    face(
                        "aberration-isd",
                        "Delver of Secrets // Insectile Aberration",
                        "Insectile Aberration",
                        "ISD",
                        "transform",
                        "b",
                        "delver-isd",
                    ),
                    "",
                    1.0,
                    ("3", "2"),
                ),
                "U",
                "Human,Insect",
                "Creature — Human Insect",
                "Flying",
            ),
            // flip
            typed(
                creature(
                    face(
                        "bushi-bok",
                        "Bushi Tenderfoot // Kenzo the Hardhearted",
                        "Bushi Tenderfoot",
                        "BOK",
                        "flip",
                        "a",
                        "kenzo-bok",
                    ),
                    "{W}",
                    1.0,
                    ("1", "1"),
                ),
                "W",
                "Human,Soldier",
                "Creature — Human Soldier",
                "When a creature dealt damage by Bushi Tenderfoot this turn dies, \
flip Bushi Tenderfoot.",
            ),
            legendary(typed(
                creature(
                    face(
                        "kenzo-bok",
                        "Bushi Tenderfoot // Kenzo the Hardhearted",
                        "Kenzo the Hardhearted",
                        "BOK",
                        "flip",
                        "b",
                        "bushi-bok",
                    ),
                    "{W}",
                    1.0,
                    ("3", "4"),
                ),
                "W",
                "Human,Samurai",
                "Legendary Creature — Human Samurai",
                "Double strike; bushido 2",
            )),
            // meld
            rarity(
                legendary(typed(
                    creature(
                        face(
                            "bruna-emn",
                            "Bruna, the Fading Light // Brisela, Voice of Nightmares",
                            "Bruna, the Fading Light",
                            "EMN",
                            "meld",
                            "a",
                            "brisela-emn",
                        ),
                        "{5}{W}{W}",
                        7.0,
                        ("5", "7"),
                    ),
                    "W",
                    "Angel,Horror",
                    "Legendary Creature — Angel Horror",
                    "Flying, vigilance",
                )),
                "rare",
            ),
            rarity(
                legendary(typed(
                    creature(
                        face(
                            "gisela-emn",
                            "Gisela, the Broken Blade // Brisela, Voice of Nightmares",
                            "Gisela, the Broken Blade",
                            "EMN",
                            "meld",
                            "b",
                            "brisela-emn",
                        ),
                        "{2}{W}{W}",
                        4.0,
                        ("4", "3"),
                    ),
                    "W",
                    "Angel,Horror",
                    "Legendary Creature — Angel Horror",
                    "Flying, first strike, lifelink",
                )),
                "mythic",
            ),
            rarity(
                legendary(typed(
                    creature(
                        face(
                            "brisela-emn",
                            "Bruna, the Fading Light // Brisela, Voice of Nightmares",
                            "Brisela, Voice of Nightmares",
                            "EMN",
                            "meld",
                            "c",
                            "bruna-emn,gisela-emn",
                        ),
                        "",
                        11.0,
                        ("9", "10"),
                    ),
                    "W",
                    "Eldrazi,Angel",
                    "Legendary Creature — Eldrazi Angel",
                    "Flying, first strike, vigilance, lifelink",
                )),
                "mythic",
            ),
            // never listed
            typed(
                creature(
                    record("playtest-cmb1", "Playtest Angel", "CMB1"),
                    "{2}{W}",
                    3.0,
                    ("2", "2"),
                ),
                "W",
                "Angel",
                "Creature — Angel",
                "Flying",
            ),
            digital,
        ]
    }

    /// Token rows, stored apart from cards.
    pub fn tokens() -> Vec<CardRecord> {
        ["TM15", "TA25"]
            .into_iter()
            .map(|set| {
                let uuid = format!("angel-{}", set.to_lowercase());
                let mut token = typed(
                    record(&uuid, "Angel", set),
                    "W",
                    "Angel",
                    "Token Creature — Angel",
                    "Flying",
                );
                token.types = "Creature".to_string();
                token.power = Some("4".to_string());
                token.toughness = Some("4".to_string());
                token.rarity = None;
                token
            })
            .collect()
    }

    fn legal(format: &str) -> Legality {
        Legality {
            format: format.to_string(),
            status: "Legal".to_string(),
        }
    }

    /// Seed `store` with [`sets`], [`records`], [`tokens`], legalities,
    /// prices and rulings.
    pub fn seed(store: &SqliteCardStore) -> Result<(), StoreError> {
        for set in sets() {
            store.insert_set(&set)?;
        }
        for record in records() {
            store.insert_record(&record)?;
        }
        for token in tokens() {
            store.insert_token(&token)?;
        }

        for format in ["commander", "legacy", "modern", "pauper", "vintage"] {
            store.insert_legality("serra-m15", &legal(format))?;
        }
        for format in ["commander", "legacy", "modern", "vintage"] {
            store.insert_legality("shivan-m15", &legal(format))?;
        }
        for format in ["commander", "modern", "pioneer", "standard"] {
            store.insert_legality("bonecrusher-eld", &legal(format))?;
        }
        store.insert_legality(
            "delver-isd",
            &Legality {
                format: "pauper".to_string(),
                status: "Banned".to_string(),
            },
        )?;

        store.insert_price("serra-m15", 0.30, Some(date("2020-04-01")))?;
        store.insert_price("serra-m15", 0.25, Some(date("2020-05-01")))?;
        store.insert_price("serra-a25", 0.35, Some(date("2020-05-01")))?;
        store.insert_price("shivan-m15", 0.50, Some(date("2020-05-01")))?;
        store.insert_price("bonecrusher-eld", 2.10, Some(date("2020-05-01")))?;
        store.insert_price("delver-isd", 1.25, Some(date("2020-05-01")))?;
        store.insert_price("angel-tm15", 0.15, Some(date("2020-05-01")))?;
        store.insert_price("angel-ta25", 0.40, Some(date("2020-05-01")))?;

        store.insert_ruling(
            "serra-m15",
            &Ruling {
                date: date("2014-07-18"),
                text: "Vigilance means attacking doesn't cause Serra Angel to tap.".to_string(),
            },
        )?;
        store.insert_ruling(
            "bonecrusher-eld",
            &Ruling {
                date: date("2019-10-04"),
                text: "Stomp's effect applies to all damage dealt this turn.".to_string(),
            },
        )?;
        store.insert_ruling(
            "bonecrusher-eld",
            &Ruling {
                date: date("2019-10-04"),
                text: "If Bonecrusher Giant is the target of an Aura spell, its ability triggers."
                    .to_string(),
            },
        )?;

        Ok(())
    }

    /// An in-memory store seeded with the sample data.
    pub fn sample_store() -> Result<SqliteCardStore, StoreError> {
        let store = SqliteCardStore::in_memory()?;
        seed(&store)?;
        Ok(store)
    }
}
