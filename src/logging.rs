//! File logging setup. The terminal belongs to the UI, so logs never go to stdout.

use std::env;
use std::path::Path;

use anyhow::{Result, anyhow};
use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

/// When present, this file fully replaces the built-in logging setup.
pub const LOG_CONFIG_PATH: &str = "config/log4rs.yaml";
/// Level for the built-in setup (`error`..`trace`, default `info`).
pub const LOG_LEVEL_ENV: &str = "AGENTDESK_LOG";

const LOG_FILE: &str = "logs/agentdesk.log";
const ARCHIVE_PATTERN: &str = "logs/agentdesk.{}.log.gz";
const ROLL_SIZE_BYTES: u64 = 1024 * 1024;
const ARCHIVE_COUNT: u32 = 3;

pub fn init() -> Result<()> {
    let config_path = Path::new(LOG_CONFIG_PATH);
    if config_path.exists() {
        log4rs::init_file(config_path, Default::default())
            .map_err(|err| anyhow!("failed to load {}: {err}", config_path.display()))?;
        log::info!("Logging configured from {}", config_path.display());
        return Ok(());
    }

    let level = level_from(env::var(LOG_LEVEL_ENV).ok().as_deref());
    let roller = FixedWindowRoller::builder()
        .build(ARCHIVE_PATTERN, ARCHIVE_COUNT)
        .map_err(|err| anyhow!("invalid log archive pattern: {err}"))?;
    let policy = CompoundPolicy::new(
        Box::new(SizeTrigger::new(ROLL_SIZE_BYTES)),
        Box::new(roller),
    );
    let appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S%.3f)} {l:<5} {t} - {m}{n}",
        )))
        .build(LOG_FILE, Box::new(policy))
        .map_err(|err| anyhow!("failed to open {LOG_FILE}: {err}"))?;

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(appender)))
        .build(Root::builder().appender("file").build(level))
        .map_err(|err| anyhow!("invalid logging config: {err}"))?;
    log4rs::init_config(config).map_err(|err| anyhow!("logger already set: {err}"))?;
    Ok(())
}

fn level_from(raw: Option<&str>) -> LevelFilter {
    raw.and_then(|value| value.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info)
}
