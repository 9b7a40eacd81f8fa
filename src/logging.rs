// primus/src/logging.rs
//
//! A stderr sink for the `log` facade.
//!
//! Verbosity is governed by `PRIMUS_VERBOSE` rather than `RUST_LOG`: the
//! shim is loaded into foreign applications and must honor its documented
//! configuration surface. Levels map onto the three reporting channels:
//! `error!` for fatal conditions, `warn!` for recoverable ones, `info!` for
//! the periodic profiling lines.

use log::{Level, LevelFilter, Log, Metadata, Record};

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => "fatal",
            Level::Warn => "warning",
            Level::Info => "profiling",
            Level::Debug | Level::Trace => "debug",
        };
        eprintln!("primus: {}: {}", tag, record.args());
    }

    fn flush(&self) {}
}

pub fn init(verbosity: u32) {
    let ceiling = match verbosity {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        _ => LevelFilter::Info,
    };
    // Another logger may already be installed by the host application's own
    // Rust code; in that case we defer to it.
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(ceiling);
    }
}
