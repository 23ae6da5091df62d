use slog::{o, Discard, Drain, Level, LevelFilter, Logger};

/// Root logger writing to stderr, so that replies on stdout stay untouched.
pub fn init(verbose: bool) -> Logger {
    let level = if verbose { Level::Debug } else { Level::Info };
    let plain = slog_term::PlainSyncDecorator::new(std::io::stderr());
    let drain = slog_term::FullFormat::new(plain).build().fuse();
    let drain = LevelFilter::new(drain, level).fuse();
    Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}

pub fn discard() -> Logger {
    Logger::root(Discard, o!())
}
