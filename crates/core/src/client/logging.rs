use std::sync::Once;

use log::LevelFilter;

use super::LogLevel;

static INIT_LOG: Once = Once::new();

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

/// Installs the platform logger once per process. Later calls only adjust the
/// level. Hosts that install their own `log` backend (the wasm binding does)
/// are left alone.
pub fn init_log(level: LogLevel) {
    INIT_LOG.call_once(|| {
        platform::init_log(level);
    });
    set_log_level(level);
}

pub fn set_log_level(level: LogLevel) {
    log::set_max_level(level.into())
}

#[cfg(all(target_os = "android", not(test)))]
mod platform {
    use super::*;

    pub fn init_log(level: LogLevel) {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(level.into())
                .with_tag("SiteBehavior"),
        );
    }
}

#[cfg(all(target_vendor = "apple", not(test)))]
mod platform {
    use super::*;

    pub fn init_log(level: LogLevel) {
        if let Err(e) = oslog::OsLogger::new("com.elevenmusic.site.behavior")
            .level_filter(level.into())
            .init()
        {
            eprintln!("{e}");
        }
    }
}

#[cfg(all(
    not(target_family = "wasm"),
    any(test, not(any(target_os = "android", target_vendor = "apple")))
))]
mod platform {
    use std::io::Write;

    use env_logger::{Builder, Env};

    use super::*;

    pub fn init_log(level: LogLevel) {
        let _ = Builder::from_env(Env::default())
            .is_test(cfg!(test))
            .format(|formatter, record| {
                writeln!(
                    formatter,
                    "[{}] {} - {}",
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .filter(None, level.into())
            .try_init();
    }
}

#[cfg(target_family = "wasm")]
mod platform {
    use super::*;

    // The browser binding installs `console_log` itself.
    pub fn init_log(_level: LogLevel) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_mapping() {
        assert_eq!(LevelFilter::from(LogLevel::Warn), LevelFilter::Warn);
        assert_eq!(LevelFilter::from(LogLevel::default()), LevelFilter::Info);
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_log(LogLevel::Debug);
        init_log(LogLevel::Debug);
    }
}
