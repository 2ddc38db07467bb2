//! Logger setup for the benchmark driver and tests

use std::sync::Once;

use env_logger::Builder;
use log::LevelFilter;

/// Guards logger installation
static INIT: Once = Once::new();

/// Installs an `env_logger` with `Info` as the default level.
///
/// `RUST_LOG` overrides the defaults. Calling this more than once is harmless.
pub fn initialize_logger() {
    INIT.call_once(|| {
        let mut builder = Builder::new();

        builder
            .filter_level(LevelFilter::Info)
            .format_timestamp_millis()
            .parse_default_env();

        if let Err(err) = builder.try_init() {
            log::debug!("Logger already installed: {err}");
        }
    });
}

/// Captured logger for unit tests, at `Trace` so every record is exercised
#[cfg(test)]
pub(crate) fn init_test_logger() {
    let _ = env_logger::builder().filter_level(LevelFilter::Trace).is_test(true).try_init();
}

#[cfg(test)]
mod tests {
    use log::{debug, info};

    use super::*;

    #[test]
    fn test_logging_levels() {
        initialize_logger();
        initialize_logger();
        debug!("Debug message in test");
        info!("Info message in test");
    }
}
