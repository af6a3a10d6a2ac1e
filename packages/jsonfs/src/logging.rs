//! Log level selection for the `--log` flag.

use clap::ValueEnum;
use log::LevelFilter;

/// Accepted `--log` values, matched case-insensitively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    /// Nothing is more severe than an error here; same as `error`.
    Critical,
}

impl LogLevel {
    pub fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Error | LogLevel::Critical => LevelFilter::Error,
        }
    }
}

/// Install the global logger. `RUST_LOG` refines the level per module.
pub fn init(level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(level.filter())
        .parse_default_env()
        .init();
}
