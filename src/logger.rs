use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};

struct Logger;

impl Log for Logger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        };
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        println!(
            "[{} {} {}] {}",
            timestamp,
            record.level(),
            record.target(),
            record.args(),
        );
    }

    fn flush(&self) {}
}

static LOGGER: Logger = Logger;

pub fn configure_logger(base_level: Level) -> () {
    let log_level_filter = std::env::var("RUST_LOG").ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(base_level.to_level_filter());
    log::set_logger(&LOGGER)
        .map(|()| log::set_max_level(log_level_filter))
        .expect("logger should not be already initialized");
}
