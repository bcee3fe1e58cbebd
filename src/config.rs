use config::{Config, ConfigError, Environment, File};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub extractor: ExtractorConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Key under which the whole listing collection is stored.
    pub storage_key: String,
}

/// Selector table for the map-search markup. Every markup convention the
/// extractor depends on lives here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub place_url_prefix: String,
    /// Any link under this prefix is a map link rather than a website.
    pub maps_url_prefix: String,
    pub container_selector: String,
    pub title_selector: String,
    pub rating_selector: String,
    pub link_selector: String,
    pub search_input_selectors: Vec<String>,
    /// Base used to resolve relative anchor targets.
    pub page_url: String,
    pub search_engine_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub default_filename: String,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://listings.db".to_string(),
            max_connections: 4,
            storage_key: "gmes_results".to_string(),
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            place_url_prefix: "https://www.google.com/maps/place".to_string(),
            maps_url_prefix: "https://www.google.com/maps".to_string(),
            container_selector: r#"[jsaction*="mouseover:pane"]"#.to_string(),
            title_selector: ".fontHeadlineSmall".to_string(),
            rating_selector: r#"[role="img"]"#.to_string(),
            link_selector: "a[href]".to_string(),
            search_input_selectors: vec![
                "#searchboxinput".to_string(),
                r#"input[aria-label*="Search"]"#.to_string(),
            ],
            page_url: "https://www.google.com/maps/search/".to_string(),
            search_engine_url: "https://www.google.com/search".to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_filename: "google-maps-data".to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("HARVESTER").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port must be greater than 0".into()));
        }

        if self.store.max_connections == 0 {
            return Err(ConfigError::Message("Store max_connections must be greater than 0".into()));
        }

        if self.store.storage_key.trim().is_empty() {
            return Err(ConfigError::Message("Store storage_key must not be empty".into()));
        }

        for (name, value) in [
            ("place_url_prefix", &self.extractor.place_url_prefix),
            ("maps_url_prefix", &self.extractor.maps_url_prefix),
            ("page_url", &self.extractor.page_url),
            ("search_engine_url", &self.extractor.search_engine_url),
        ] {
            if Url::parse(value).is_err() {
                return Err(ConfigError::Message(format!("Invalid URL in extractor.{}", name)));
            }
        }

        let selectors = [
            &self.extractor.container_selector,
            &self.extractor.title_selector,
            &self.extractor.rating_selector,
            &self.extractor.link_selector,
        ];
        for selector in selectors.into_iter().chain(&self.extractor.search_input_selectors) {
            if Selector::parse(selector).is_err() {
                return Err(ConfigError::Message(format!("Invalid CSS selector '{}'", selector)));
            }
        }

        if self.export.default_filename.trim().is_empty() {
            return Err(ConfigError::Message("Export default_filename must not be empty".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.storage_key, "gmes_results");
        assert_eq!(config.extractor.place_url_prefix, "https://www.google.com/maps/place");
    }

    #[test]
    fn test_config_validation_invalid_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("port must be greater than 0"));
    }

    #[test]
    fn test_config_validation_empty_storage_key() {
        let mut config = AppConfig::default();
        config.store.storage_key = "  ".to_string();

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("storage_key must not be empty"));
    }

    #[test]
    fn test_config_validation_invalid_page_url() {
        let mut config = AppConfig::default();
        config.extractor.page_url = "not-a-url".to_string();

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("extractor.page_url"));
    }

    #[test]
    fn test_config_validation_invalid_selector() {
        let mut config = AppConfig::default();
        config.extractor.container_selector = "div >".to_string();

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid CSS selector"));
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(config::File::from_str(
                "[server]\nport = 8080\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.export.default_filename, "google-maps-data");
    }
}
