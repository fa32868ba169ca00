//! Configuration storage port

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Port for configuration storage
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the stored configuration.
    ///
    /// A missing file loads as [`AppConfig::empty`].
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Write `config`, creating parent directories as needed.
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// Location of the config file
    fn path(&self) -> PathBuf;

    fn exists(&self) -> bool;

    /// Write [`AppConfig::defaults`]. Fails with `AlreadyExists` if the file exists.
    async fn init(&self) -> Result<(), ConfigError>;
}
