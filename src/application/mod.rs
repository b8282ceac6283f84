pub mod app_error;
pub mod blacklist;
pub mod jwt;
pub mod ports;
pub mod resolver;
pub mod selector;
