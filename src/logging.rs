//! Logging setup: `log` facade with an `env_logger` backend.
//!
//! Level resolution, highest priority first: the `RUST_LOG` environment
//! variable, then `--quiet` (errors only), then the `-v` count (debug,
//! trace), then the info default. `--quiet` silences narration; the final
//! report is printed regardless.

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

/// Initialize logging from the CLI flags.
///
/// Safe to call more than once; later calls keep the first configuration,
/// which matters for tests that drive the whole app repeatedly.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    match std::env::var("RUST_LOG") {
        Ok(_) => {
            builder.parse_default_env();
        }
        Err(_) => {
            builder.filter_level(level_for(verbose, quiet));
        }
    }

    let with_module = verbose >= 1;
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        if cfg!(debug_assertions) || with_module {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.module_path().unwrap_or("?"),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{:<5}{style:#} {}", record.level(), record.args())
        }
    });

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized, keeping existing configuration");
    }
}

/// Map the CLI flags to a level filter. Quiet wins over verbose; the CLI
/// already rejects the combination, this is just the tiebreak.
fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_info() {
        assert_eq!(level_for(0, false), LevelFilter::Info);
    }

    #[test]
    fn test_verbose_steps_up() {
        assert_eq!(level_for(1, false), LevelFilter::Debug);
        assert_eq!(level_for(2, false), LevelFilter::Trace);
        assert_eq!(level_for(9, false), LevelFilter::Trace);
    }

    #[test]
    fn test_quiet_always_wins() {
        assert_eq!(level_for(0, true), LevelFilter::Error);
        assert_eq!(level_for(3, true), LevelFilter::Error);
    }
}
