use colored::{Color, Colorize};
use log::{Level, LevelFilter, Log, Metadata, Record};
use time::macros::format_description;

struct Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = time::OffsetDateTime::now_utc()
            .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
            .unwrap();
        let level = record.level().as_str();
        let args = record.args();

        let color = match record.level() {
            Level::Error => Color::BrightRed,
            Level::Warn => Color::BrightYellow,
            Level::Info => Color::BrightCyan,
            Level::Debug => Color::BrightMagenta,
            Level::Trace => Color::BrightGreen,
        };

        println!("{} {} {args}", timestamp.color(Color::BrightBlack), level.color(color));
    }

    fn flush(&self) {}
}

pub fn init(level: LevelFilter) {
    log::set_max_level(level);
    log::set_boxed_logger(Box::new(Logger)).unwrap();
}
