pub mod card;
pub mod config;
pub mod display;
pub mod query;
pub mod store;
pub mod testing;

pub use card::{Card, CardRecord, FaceGroup, Layout, Legality, Printing, Ruling, SetInfo, Side};
pub use config::{
    load_config, load_config_from_str, load_config_optional, validate_config, Config,
    ConfigError, DatabaseConfig, DisplayConfig,
};
pub use query::{compile, CompileOptions, CompiledQuery, LexError, Param, Predicate, QueryError};
pub use store::{CardLookup, CardStore, SearchOptions, SortKey, SqliteCardStore, StoreError};
