pub mod blacklist_store;
pub mod config_source;
