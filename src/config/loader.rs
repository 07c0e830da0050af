//! Settings file lookup, `AT_TTY_*` environment overrides and persistence.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use directories::ProjectDirs;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const ENV_PREFIX: &str = "AT_TTY";

/// Explicit settings file, checked first.
const CONFIG_PATH_ENV: &str = "AT_TTY_CONFIG";

const LOCAL_FILE: &str = "at-tty.toml";
const USER_FILE: &str = "config.toml";

/// Where the settings in effect were read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Named by `AT_TTY_CONFIG` or passed explicitly.
    Explicit(PathBuf),
    /// `./at-tty.toml`.
    WorkingDir(PathBuf),
    /// The per-user config directory.
    UserDir(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::WorkingDir(p) | Self::UserDir(p) => Some(p),
            Self::Defaults => None,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.path() {
            Some(path) => write!(f, "{}", path.display()),
            None => f.write_str("built-in defaults"),
        }
    }
}

/// Resolved settings plus the file they came from.
///
/// Lookup order is `AT_TTY_CONFIG`, `./at-tty.toml`, then
/// `<user config dir>/at-tty/config.toml`; with none present the built-in
/// defaults apply. `AT_TTY_<SECTION>_<KEY>` variables are applied last and
/// win over any file.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    source: ConfigSource,
    config: Config,
}

impl ConfigLoader {
    pub fn load() -> ConfigResult<Self> {
        let source = locate();
        let config = match source.path() {
            Some(path) => read_file(path)?,
            None => Config::default(),
        };
        Self::finish(source, config)
    }

    /// Read `path` instead of searching. A missing file is an error here.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let config = read_file(&path)?;
        Self::finish(ConfigSource::Explicit(path), config)
    }

    /// Built-in defaults with environment overrides applied.
    pub fn with_defaults() -> ConfigResult<Self> {
        Self::finish(ConfigSource::Defaults, Config::default())
    }

    fn finish(source: ConfigSource, mut config: Config) -> ConfigResult<Self> {
        apply_env_overrides(&mut config)?;
        Ok(Self { source, config })
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    /// Write the effective settings back to the file they were read from.
    pub fn save(&self) -> ConfigResult<()> {
        let path = self.source.path().ok_or(ConfigError::NoPath)?;
        write_file(&self.config, path)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        write_file(&self.config, path.as_ref())
    }
}

/// The first settings file that exists, in lookup order.
pub fn locate() -> ConfigSource {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from) {
        if path.is_file() {
            return ConfigSource::Explicit(path);
        }
    }
    let local = PathBuf::from(LOCAL_FILE);
    if local.is_file() {
        return ConfigSource::WorkingDir(local);
    }
    match user_config_file() {
        Some(path) if path.is_file() => ConfigSource::UserDir(path),
        _ => ConfigSource::Defaults,
    }
}

/// `<user config dir>/at-tty/config.toml`, whether or not it exists.
pub fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "at-tty").map(|dirs| dirs.config_dir().join(USER_FILE))
}

fn read_file(path: &Path) -> ConfigResult<Config> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(config: &Config, path: &Path) -> ConfigResult<()> {
    let text = toml::to_string_pretty(config)?;
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, text).map_err(write_err)
}

fn env_value<T: FromStr>(suffix: &str, expected: &'static str) -> ConfigResult<Option<T>> {
    let var = format!("{ENV_PREFIX}_{suffix}");
    let Ok(value) = std::env::var(&var) else {
        return Ok(None);
    };
    match value.trim().parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(ConfigError::BadOverride {
            var,
            value,
            expected,
        }),
    }
}

fn env_flag(suffix: &str) -> ConfigResult<Option<bool>> {
    let var = format!("{ENV_PREFIX}_{suffix}");
    let Ok(value) = std::env::var(&var) else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::BadOverride {
            var,
            value,
            expected: "boolean",
        }),
    }
}

fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    let modem = &mut config.modem;
    if let Some(device) = env_value("MODEM_DEVICE", "device path")? {
        modem.device = device;
    }
    if let Some(baud) = env_value("MODEM_BAUD_RATE", "baud rate")? {
        modem.baud_rate = baud;
    }
    if let Some(bits) = env_value("MODEM_DATA_BITS", "data bit count")? {
        modem.data_bits = bits;
    }
    if let Some(secs) = env_value("MODEM_TIMEOUT_SECS", "number of seconds")? {
        modem.timeout_secs = secs;
    }
    if let Some(greedy) = env_flag("MODEM_GREEDY_READ")? {
        modem.greedy_read = greedy;
    }
    if let Some(clear) = env_flag("MODEM_CLEAR_BUFFERS")? {
        modem.clear_modem_side_buffers = clear;
    }
    if let Some(level) = env_value("LOGGING_LEVEL", "log level")? {
        config.logging.level = level;
    }
    Ok(())
}
