use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use boss_music::{ArbiterConfig, ConfigError, ProximityMusicController};
use engine::{Client, LoopConfig, MetricsHandle, ResourceIdError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::scenario;

const CONFIG_PATH_ENV_VAR: &str = "BOSS_MUSIC_CONFIG";
const MAX_TICKS_ENV_VAR: &str = "BOSS_MUSIC_MAX_TICKS";
const REALTIME_ENV_VAR: &str = "BOSS_MUSIC_REALTIME";
const DEFAULT_MAX_TICKS: u64 = 1_000;

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid value for {var}: {value:?} (expected {expected})")]
    InvalidEnv {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("invalid sound id: {0}")]
    SoundId(#[from] ResourceIdError),
}

pub(crate) struct AppWiring {
    pub(crate) loop_config: LoopConfig,
    pub(crate) client: Client,
    pub(crate) metrics: MetricsHandle,
    pub(crate) controller: Rc<RefCell<ProximityMusicController>>,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Boss Music Startup ===");

    let config = load_arbiter_config()?;
    let loop_config = LoopConfig {
        max_ticks: Some(parse_max_ticks_from_env()?),
        realtime: parse_realtime_from_env()?,
        ..LoopConfig::default()
    };

    let mut client = Client::new();
    let director = ambient_music::install(&mut client, scenario::ambient_playlist()?);
    let controller = boss_music::install(&mut client, config)?;
    scenario::install(
        &mut client,
        scenario::default_script(),
        controller.clone(),
        director,
    )?;

    Ok(AppWiring {
        loop_config,
        client,
        metrics: MetricsHandle::default(),
        controller,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn load_arbiter_config() -> Result<ArbiterConfig, StartupError> {
    let Some(path) = std::env::var_os(CONFIG_PATH_ENV_VAR).map(PathBuf::from) else {
        info!("arbiter_config_defaults");
        return Ok(ArbiterConfig::default());
    };
    let config = ArbiterConfig::load(&path)?;
    info!(path = %path.display(), "arbiter_config_loaded");
    Ok(config)
}

fn parse_max_ticks_from_env() -> Result<u64, StartupError> {
    match std::env::var(MAX_TICKS_ENV_VAR) {
        Ok(raw) => parse_max_ticks(&raw),
        Err(_) => Ok(DEFAULT_MAX_TICKS),
    }
}

fn parse_max_ticks(raw: &str) -> Result<u64, StartupError> {
    match raw.trim().parse::<u64>() {
        Ok(ticks) if ticks > 0 => Ok(ticks),
        _ => Err(StartupError::InvalidEnv {
            var: MAX_TICKS_ENV_VAR,
            value: raw.to_string(),
            expected: "a positive tick count",
        }),
    }
}

fn parse_realtime_from_env() -> Result<bool, StartupError> {
    match std::env::var(REALTIME_ENV_VAR) {
        Ok(raw) => parse_flag(REALTIME_ENV_VAR, &raw),
        Err(_) => Ok(false),
    }
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, StartupError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(StartupError::InvalidEnv {
            var,
            value: raw.to_string(),
            expected: "a boolean flag",
        }),
    }
}
