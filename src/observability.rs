//! This module provides observability and diagnostics for the codec.
//!
//! All logging goes through the `log` facade. The `log_metric!` macro emits a
//! structured key-value record at `trace` level and is compiled out of release
//! builds entirely. `enable_verbose_logging` installs an `env_logger` backend for
//! applications and tests that do not bring their own logger.

use log::LevelFilter;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Once;

use crate::error::PlmError;

/// Logs a structured key-value metric record, only in debug builds.
///
/// # Example
/// ```
/// use plm_codec::log_metric;
/// let pixels = 64;
/// log_metric!("event" = "quantize", "pixels" = &pixels);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            // Collect each pair as a JSON string fragment
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+

            $crate::__log::trace!(
                target: "plm_codec::metric",
                "PLM_METRIC: {{ {} }}",
                parts.join(", ")
            );
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs a compact `[LEVEL] message` logger at `level`, once per process.
///
/// When `log_file` is given, records are appended to that file instead of stderr.
/// Later calls are no-ops, as is the first call if another logger is already set.
pub fn enable_verbose_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<(), PlmError> {
    // Open the file outside the `Once` so a bad path surfaces as an error.
    let file = log_file
        .map(|path| OpenOptions::new().append(true).create(true).open(path))
        .transpose()?;

    INIT_LOGGER.call_once(move || {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(level);

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}
