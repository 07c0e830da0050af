use at_tty::config::{ConfigLoader, LogFormat, LoggingConfig, ModemConfig};
use at_tty::{Channel, ReadOutcome, ReadRequest};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status for configuration problems.
const EXIT_CONFIG_ERROR: u8 = 8;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Send one AT command to a modem over its serial TTY and print the response.",
    long_about = "Opens the modem's AT port in raw mode, writes the command terminated by CRLF, and reads response lines until OK, ERROR, a +CME/+CMS error, NO CARRIER or the requested keyword arrives. The exit status reflects how the read ended."
)]
struct Args {
    /// Configuration file (defaults to the standard search path).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device of the AT port.
    #[arg(short, long)]
    device: Option<String>,

    /// Baud rate (4800, 9600, 19200, 38400, 57600 or 115200).
    #[arg(short, long)]
    baud: Option<u32>,

    /// Data bits (5-8).
    #[arg(long)]
    data_bits: Option<u8>,

    /// Read timeout in seconds.
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Restart the timeout whenever data arrives.
    #[arg(long)]
    greedy: bool,

    /// Drain stale modem output before sending.
    #[arg(long)]
    clear: bool,

    /// Finish successfully on a line starting with this keyword.
    #[arg(short, long)]
    keyword: Option<String>,

    /// Send the command as-is, without appending CRLF.
    #[arg(long)]
    raw: bool,

    /// Print the outcome and response as JSON.
    #[arg(long)]
    json: bool,

    /// The AT command to send, e.g. AT+CSQ.
    command: String,
}

impl Args {
    /// Layer command-line values over the file and environment settings.
    fn apply_to(&self, modem: &mut ModemConfig) {
        if let Some(device) = &self.device {
            modem.device = device.clone();
        }
        if let Some(baud) = self.baud {
            modem.baud_rate = baud;
        }
        if let Some(bits) = self.data_bits {
            modem.data_bits = bits;
        }
        if let Some(secs) = self.timeout {
            modem.timeout_secs = secs;
        }
        modem.greedy_read |= self.greedy;
        modem.clear_modem_side_buffers |= self.clear;
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path),
        None => ConfigLoader::load(),
    };
    let loader = match loader {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    init_tracing(&loader.config().logging);
    tracing::debug!("Settings from {}", loader.source());
    let mut config = loader.into_config();
    args.apply_to(&mut config.modem);

    let profile = match config.modem.to_profile() {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let mut channel = match Channel::open(&profile) {
        Ok(channel) => channel,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(e.outcome().exit_code());
        }
    };

    let written = if args.raw {
        channel.write_raw(&args.command)
    } else {
        channel.write(&args.command)
    };
    if let Err(e) = written {
        tracing::error!("{e}");
        channel.close();
        return ExitCode::from(e.outcome().exit_code());
    }

    let request = match args.keyword.as_deref() {
        Some(keyword) => ReadRequest::keyword(keyword),
        None => ReadRequest::new(),
    };
    let response = channel.read_with(request);
    channel.close();

    if args.json {
        match serde_json::to_string_pretty(&response) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!("Failed to encode response: {e}"),
        }
    } else if let Some(message) = &response.message {
        for line in message.lines() {
            println!("{line}");
        }
    }

    if response.outcome != ReadOutcome::Success {
        tracing::warn!("Read ended with {}", response.outcome);
    }
    ExitCode::from(response.outcome.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use at_tty::ConfigError;
    use std::time::Duration;

    fn modem_for(argv: &[&str]) -> ModemConfig {
        let args = Args::try_parse_from(argv).unwrap();
        let mut modem = ModemConfig::default();
        args.apply_to(&mut modem);
        modem
    }

    #[test]
    fn test_flags_override_settings() {
        let modem = modem_for(&["at-tty", "-d", "/dev/ttyACM0", "-t", "9", "--greedy", "AT"]);
        let profile = modem.to_profile().unwrap();
        assert_eq!(profile.device, PathBuf::from("/dev/ttyACM0"));
        assert_eq!(profile.timeout, Duration::from_secs(9));
        assert!(profile.greedy_read);
    }

    #[test]
    fn test_flags_are_validated() {
        for argv in [
            &["at-tty", "--timeout", "0", "AT"][..],
            &["at-tty", "--timeout", "18446744073709551615", "AT"],
            &["at-tty", "--device", "", "AT"],
        ] {
            let modem = modem_for(argv);
            assert!(
                matches!(modem.to_profile(), Err(ConfigError::Invalid { .. })),
                "{argv:?}"
            );
        }
    }
}
