//! Persistence adapters: the JSON correlation map and the MySQL ticket store.

pub mod map_json;
pub mod mysql_store;

pub use map_json::JsonCorrelationMap;
pub use mysql_store::MySqlTicketStore;
