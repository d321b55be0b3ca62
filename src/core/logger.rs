//! Logger setup
//!
//! The engine logs through the `log` facade; binaries call [`init`] once at
//! startup to install `env_logger`.

/// Install `env_logger`, using `RUST_LOG` when set and `default_filter` otherwise.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let result = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();

    if result.is_err() {
        log::debug!("Logger already initialized");
    }
}
