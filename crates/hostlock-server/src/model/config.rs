//! Configuration management for the hostlock server
//!
//! Settings come from `conf/hostlock.yml` (optional), environment variables
//! with the `hostlock` prefix, and command line flags, in ascending
//! priority.

use anyhow::{Context, bail};
use clap::Parser;
use config::{Config, Environment};

use hostlock_common::MAX_IDENTIFIER_LEN;

const DEFAULT_SERVER_PORT: u16 = 8040;

/// Command line arguments for the server
#[derive(Debug, Parser)]
#[command(name = "hostlock-server")]
struct Cli {
    #[arg(short = 'a', long = "address")]
    address: Option<String>,
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,
    #[arg(long = "data-dir", env = "HOSTLOCK_DATA_DIR")]
    data_dir: Option<String>,
    #[arg(long = "secret", env = "HOSTLOCK_SECRET", hide_env_values = true)]
    secret: Option<String>,
}

/// Application configuration loaded from config file, environment, and CLI
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    pub fn new() -> anyhow::Result<Self> {
        let args = Cli::parse();
        let mut config_builder = Config::builder()
            .add_source(
                Environment::with_prefix("hostlock")
                    .separator(".")
                    .try_parsing(true),
            )
            .add_source(config::File::with_name("conf/hostlock").required(false));

        if let Some(v) = args.address {
            config_builder = config_builder.set_override("server.address", v)?;
        }
        if let Some(v) = args.port {
            config_builder = config_builder.set_override("server.port", v as i64)?;
        }
        if let Some(v) = args.data_dir {
            config_builder = config_builder.set_override("storage.dataDir", v)?;
        }
        if let Some(v) = args.secret {
            config_builder = config_builder.set_override("lock.secret", v)?;
        }

        let config = config_builder.build().context("building configuration")?;

        Ok(Configuration { config })
    }

    pub fn server_address(&self) -> String {
        self.config
            .get_string("server.address")
            .unwrap_or("0.0.0.0".to_string())
    }

    pub fn server_port(&self) -> u16 {
        self.config
            .get_int("server.port")
            .unwrap_or(DEFAULT_SERVER_PORT.into()) as u16
    }

    /// Data directory for the file-backed stores; `None` selects the
    /// in-memory backends.
    pub fn data_dir(&self) -> Option<String> {
        self.config.get_string("storage.dataDir").ok()
    }

    /// The shared secret guarding mutating operations.
    ///
    /// An over-long or empty configured secret is a setup error, reported
    /// at startup rather than surfacing per request.
    pub fn secret(&self) -> anyhow::Result<String> {
        let secret = self
            .config
            .get_string("lock.secret")
            .context("lock.secret must be configured (flag --secret or HOSTLOCK_SECRET)")?;
        if secret.is_empty() {
            bail!("configured secret must not be empty");
        }
        if secret.len() > MAX_IDENTIFIER_LEN {
            bail!(
                "configured secret exceeds {} characters",
                MAX_IDENTIFIER_LEN
            );
        }
        Ok(secret)
    }

    /// Lease expiry threshold in seconds; unset means locks never expire.
    pub fn lease_timeout_secs(&self) -> Option<u64> {
        self.config
            .get_int("lock.leaseTimeoutSecs")
            .ok()
            .map(|v| v.max(0) as u64)
    }

    /// Directory for rolling log files; unset logs to stdout only.
    pub fn log_dir(&self) -> Option<String> {
        self.config.get_string("logs.path").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configuration_with(overrides: &[(&str, &str)]) -> Configuration {
        let mut builder = Config::builder();
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value).unwrap();
        }
        Configuration {
            config: builder.build().unwrap(),
        }
    }

    #[test]
    fn test_defaults() {
        let configuration = configuration_with(&[]);
        assert_eq!(configuration.server_address(), "0.0.0.0");
        assert_eq!(configuration.server_port(), DEFAULT_SERVER_PORT);
        assert_eq!(configuration.data_dir(), None);
        assert_eq!(configuration.lease_timeout_secs(), None);
    }

    #[test]
    fn test_secret_validation() {
        let configuration = configuration_with(&[("lock.secret", "secret123")]);
        assert_eq!(configuration.secret().unwrap(), "secret123");

        let configuration = configuration_with(&[]);
        assert!(configuration.secret().is_err());

        let configuration = configuration_with(&[("lock.secret", "")]);
        assert!(configuration.secret().is_err());

        let configuration =
            configuration_with(&[("lock.secret", "way-too-long-secret-over-20-chars")]);
        assert!(configuration.secret().is_err());
    }

    #[test]
    fn test_lease_timeout() {
        let configuration = configuration_with(&[("lock.leaseTimeoutSecs", "86400")]);
        assert_eq!(configuration.lease_timeout_secs(), Some(86400));
    }
}
