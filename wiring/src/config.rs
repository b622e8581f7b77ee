//! Two kinds of configuration live here. [ApplicationConfig] controls how an
//! [Application](crate::application::Application) boots: whether it installs a tracing logger and
//! which runner it starts. [ConfigValues] carries the settings of the application itself and turns
//! single entries into named registrations, so components receive them like any other dependency.
//!
//! Boot settings are read from an optional `wiring.json` file and `WIRING_` environment
//! variables. Any setting missing from both keeps its default.

use config::{Config, ConfigError, Environment, File};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use wiring_di::container::Container;
use wiring_di::error::RegistrationError;
use wiring_di::record::PendingRecord;

const CONFIG_ENV_PREFIX: &str = "WIRING";

/// Boot settings file, looked up in the working directory.
pub const CONFIG_FILE: &str = "wiring.json";

/// Name the entry point runner is resolved by, unless configured otherwise.
pub const DEFAULT_ENTRY_POINT: &str = "main";

/// Settings used while booting an application.
#[non_exhaustive]
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Install a `tracing-subscriber` formatter with an env filter before running.
    pub install_tracing_logger: bool,
    /// Name of the registration holding the `dyn ApplicationRunner` to run.
    pub entry_point: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            install_tracing_logger: true,
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
        }
    }
}

impl ApplicationConfig {
    /// Reads boot settings from [CONFIG_FILE] and `WIRING_` variables, e.g.
    /// `WIRING_ENTRY_POINT=migrations`.
    pub fn init_from_environment() -> Result<Self, ConfigError> {
        let sources = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX))
            .build()?;

        Self::from_config(&sources)
    }

    fn from_config(sources: &Config) -> Result<Self, ConfigError> {
        sources.clone().try_deserialize()
    }
}

#[derive(Error, Debug)]
pub enum ConfigValueError {
    #[error("Error reading config value: {0}")]
    Config(#[from] ConfigError),
    #[error("Error registering config value: {0}")]
    Registration(#[from] RegistrationError),
}

/// Application-specific configuration values, which can be registered in a [Container].
///
/// ```
/// use config::Config;
/// use wiring::config::ConfigValues;
/// use wiring_di::container::Container;
///
/// let config = Config::builder()
///     .set_default("network.http_port", 12345)?
///     .build()?;
///
/// let container = Container::new("base");
/// ConfigValues::new(config).bind::<u16>(&container, "network.http_port", "port")?;
///
/// assert_eq!(*container.resolve_name::<u16>("port")?, 12345);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct ConfigValues {
    config: Config,
}

impl ConfigValues {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Loads values from given file and environment variables with given prefix. Nested entries
    /// are separated with `__` in variable names.
    pub fn load(file: &str, env_prefix: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix(env_prefix).separator("__"))
            .build()
            .map(Self::new)
    }

    /// Reads a single value at given path, e.g. `database.url`.
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConfigValueError> {
        self.config.get(path).map_err(ConfigValueError::Config)
    }

    /// Registers the value at given path under given name, typed as `T`.
    pub fn bind<T: DeserializeOwned + 'static>(
        &self,
        container: &Container,
        path: &str,
        name: &str,
    ) -> Result<PendingRecord, ConfigValueError> {
        let value = self.get::<T>(path)?;

        debug!(path, name, container = %container.name(), "Binding config value.");

        container
            .register_value(value)
            .to_name_as::<T, _>(name)
            .map_err(ConfigValueError::Registration)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ApplicationConfig, ConfigValueError, ConfigValues};
    use config::Config;
    use wiring_di::container::Container;
    use wiring_di::error::RegistrationError;

    fn create_values() -> ConfigValues {
        ConfigValues::new(
            Config::builder()
                .set_default("logging.log_path", "/var/log/app")
                .unwrap()
                .set_default("network.http_port", 12345)
                .unwrap()
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn should_keep_defaults_for_missing_settings() {
        let config = ApplicationConfig::from_config(
            &Config::builder()
                .set_override("install_tracing_logger", false)
                .unwrap()
                .build()
                .unwrap(),
        )
        .unwrap();

        assert!(!config.install_tracing_logger);
        assert_eq!(config.entry_point, "main");
    }

    #[test]
    fn should_bind_config_values() {
        let container = Container::new("base");
        let values = create_values();

        values
            .bind::<String>(&container, "logging.log_path", "log_path")
            .unwrap();
        values
            .bind::<u16>(&container, "network.http_port", "port")
            .unwrap();

        assert_eq!(
            *container.resolve_name::<String>("log_path").unwrap(),
            "/var/log/app"
        );
        assert_eq!(*container.resolve_name::<u16>("port").unwrap(), 12345);
    }

    #[test]
    fn should_report_missing_values() {
        let container = Container::new("base");

        assert!(matches!(
            create_values()
                .bind::<String>(&container, "database.url", "database_url")
                .unwrap_err(),
            ConfigValueError::Config(_)
        ));
    }

    #[test]
    fn should_report_registration_errors() {
        let container = Container::new("base");
        let values = create_values();

        values
            .bind::<u16>(&container, "network.http_port", "port")
            .unwrap();

        assert!(matches!(
            values
                .bind::<u16>(&container, "network.http_port", "port")
                .unwrap_err(),
            ConfigValueError::Registration(RegistrationError::KeyConflict { .. })
        ));
    }
}
