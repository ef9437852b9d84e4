use core::fmt;

use log::{Level, LevelFilter, Log, Metadata, Record};
use spin::Once;

/// Platform console sink.
pub type Console = fn(fmt::Arguments<'_>);

static LOGGER: Logger = Logger::new();

pub struct Logger {
    console: Once<Console>,
}

pub fn init(level: LevelFilter, console: Console) -> Result<(), log::SetLoggerError> {
    LOGGER.console.call_once(|| console);
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

fn tag(level: Level) -> char {
    match level {
        Level::Info => '*',
        Level::Warn => 'W',
        Level::Error => 'E',
        Level::Debug => 'D',
        Level::Trace => 'T',
    }
}

impl Logger {
    pub const fn new() -> Self {
        Self {
            console: Once::new(),
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(console) = self.console.get() {
            console(format_args!("[{}] {}\n", tag(record.level()), record.args()));
        }
    }

    fn flush(&self) {}
}
