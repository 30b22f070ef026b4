//! Infrastructure layer: network listeners, OS access and config loading.

pub mod config_file;
pub mod host;
pub mod static_server;
pub mod ws_server;
