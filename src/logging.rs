//! Logging bootstrap.
//!
//! The library logs through the `log` facade only. Binaries call
//! [`init_logging`] once at startup to install `env_logger` as the backend.

use env_logger::{Builder, Env};

/// Environment variable consulted when no explicit filter is given.
pub const LOG_ENV: &str = "BOOKSHELF_LOG";

const DEFAULT_FILTER: &str = "info";

/// Install `env_logger` with `filter` (e.g. `"info"`, `"bookshelf=debug"`).
///
/// `None` falls back to `BOOKSHELF_LOG`, then to `info`. Returns an error
/// message when a logger is already installed.
pub fn init_logging(filter: Option<&str>) -> Result<(), String> {
    let mut builder = match filter {
        Some(filter) => {
            let mut builder = Builder::new();
            builder.parse_filters(filter);
            builder
        }
        None => Builder::from_env(Env::default().filter_or(LOG_ENV, DEFAULT_FILTER)),
    };

    builder
        .format_timestamp_millis()
        .try_init()
        .map_err(|err| format!("logger already initialized: {}", err))
}
