//! A stderr logger implementation for the `log` crate.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use std::io::Write;

use log::{LevelFilter, Metadata, Record};

/// Writes `LEVEL target: message` lines to stderr.
///
/// Records from outside the ffsgen crates are dropped below `Warn`.
pub struct StderrLogger {
    target_filters: &'static [(&'static str, LevelFilter)],
}

static LOGGER: StderrLogger = StderrLogger { target_filters: &[("ffsgen", LevelFilter::Trace)] };

impl StderrLogger {
    fn target_level(&self, target: &str) -> LevelFilter {
        self.target_filters
            .iter()
            .find(|(name, _)| target.starts_with(name))
            .map(|(_, level)| *level)
            .unwrap_or(LevelFilter::Warn)
    }
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && metadata.level() <= self.target_level(metadata.target())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(std::io::stderr().lock(), "{:<5} {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Map the number of `-v` flags to a level filter.
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the logger. Only the first call takes effect.
pub fn init(verbosity: u8) {
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(level_for_verbosity(verbosity)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_raise_the_level() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Warn);
        assert_eq!(level_for_verbosity(1), LevelFilter::Info);
        assert_eq!(level_for_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(9), LevelFilter::Trace);
    }

    #[test]
    fn test_foreign_targets_are_limited_to_warnings() {
        assert_eq!(LOGGER.target_level("ffsgen::section"), LevelFilter::Trace);
        assert_eq!(LOGGER.target_level("ffsgen_compressors::lzma"), LevelFilter::Trace);
        assert_eq!(LOGGER.target_level("clap"), LevelFilter::Warn);
    }
}
