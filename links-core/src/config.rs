use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct LinksConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub properties: Option<PropertiesConfig>,
    #[serde(default)]
    pub service: ServiceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

/// Where `based_on("slug")` filters look up property ids.
#[derive(Debug, Deserialize, Clone)]
pub struct PropertiesConfig {
    pub table: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl LinksConfig {
    /// Load from a TOML file, then apply `LINKS__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("LINKS").separator("__"))
            .build()?;
        s.try_deserialize()
    }
}
