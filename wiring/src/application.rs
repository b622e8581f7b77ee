//! Core application framework functionality.

use crate::config::ApplicationConfig;
use crate::runner::{ApplicationRunner, ErrorPtr};
use config::ConfigError;
use derive_more::Constructor;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wiring_di::container::Container;
use wiring_di::error::ResolutionError;

#[derive(Clone, Error, Debug)]
pub enum ApplicationError {
    #[error("Error resolving runner: {0}")]
    RunnerResolution(ResolutionError),
    #[error("Runner error: {0}")]
    RunnerError(ErrorPtr),
}

/// Main entrypoint for the application. Resolves the entry point
/// [ApplicationRunner] from the root container and runs it.
#[derive(Constructor)]
pub struct Application {
    container: Container,
    config: ApplicationConfig,
}

impl Application {
    pub fn run(&self) -> Result<(), ApplicationError> {
        if self.config.install_tracing_logger {
            install_tracing_logger();
        }

        info!("Resolving entry point '{}'...", self.config.entry_point);

        let runner = self
            .container
            .resolve_name::<dyn ApplicationRunner>(&self.config.entry_point)
            .map_err(ApplicationError::RunnerResolution)?;

        info!("Running application...");

        runner.run().map_err(ApplicationError::RunnerError)
    }
}

/// Creates an [Application] for given root container, with config read from the environment.
pub fn create_default(container: Container) -> Result<Application, ConfigError> {
    ApplicationConfig::init_from_environment().map(|config| Application::new(container, config))
}

fn install_tracing_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(error) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        debug!("Not installing tracing logger: {}", error);
    }
}
