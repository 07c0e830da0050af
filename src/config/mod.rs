//! Modem and logging settings for at-tty.
//!
//! TOML files with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `AT_TTY_CONFIG` environment variable (explicit path)
//! 2. `./at-tty.toml` (current directory)
//! 3. `<platform config dir>/at-tty/config.toml`
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! - `AT_TTY_MODEM_DEVICE`, `AT_TTY_MODEM_BAUD_RATE`, `AT_TTY_MODEM_DATA_BITS`
//! - `AT_TTY_MODEM_TIMEOUT_SECS`, `AT_TTY_MODEM_GREEDY_READ`,
//!   `AT_TTY_MODEM_CLEAR_BUFFERS`
//! - `AT_TTY_LOGGING_LEVEL`
//!
//! # Example
//!
//! ```rust,no_run
//! use at_tty::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let profile = loader.config().modem.to_profile()?;
//! println!("Using {}", profile.device.display());
//! # Ok::<(), at_tty::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{locate, user_config_file, ConfigLoader, ConfigSource};
pub use schema::{Config, LogFormat, LoggingConfig, ModemConfig};
