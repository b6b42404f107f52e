use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;

fn default_entry_point() -> String {
    "http://localhost:8080/api/users".to_string()
}

fn default_page_size() -> u32 {
    10
}

/// Client configuration: where the user service lives and how big a page
/// to ask for when the caller does not say.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            entry_point: default_entry_point(),
            default_page_size: default_page_size(),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> io::Result<()> {
        url::Url::parse(&self.entry_point).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid entry point URL '{}': {e}", self.entry_point),
            )
        })?;
        if self.default_page_size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "default_page_size must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Location of the client's data directory and the config file inside it.
#[derive(Debug, Clone)]
pub struct DataPath {
    pub root: PathBuf,
}

impl DataPath {
    pub fn new(data_path: Option<PathBuf>) -> io::Result<Self> {
        let root = match data_path {
            Some(path) => path,
            None => dirs::home_dir()
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        "Home directory not found. Please specify --data-path.",
                    )
                })?
                .join(".userctl"),
        };
        Ok(Self { root })
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }
}

/// Service for loading and saving the TOML config file.
pub struct ConfigService;

impl ConfigService {
    /// Load the configuration, falling back to defaults when no file exists.
    pub fn load_config(data_path: &DataPath) -> io::Result<ServiceConfig> {
        let config_path = data_path.config_path();
        if !config_path.exists() {
            return Ok(ServiceConfig::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: ServiceConfig = toml::from_str(&content).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid config format in {}: {e}", config_path.display()),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_config(config: &ServiceConfig, data_path: &DataPath) -> io::Result<()> {
        config.validate()?;
        std::fs::create_dir_all(&data_path.root)?;
        let content = toml::to_string_pretty(config)
            .map_err(|e| io::Error::other(format!("Failed to serialize config: {e}")))?;
        std::fs::write(data_path.config_path(), content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let data_path = DataPath {
            root: dir.path().to_path_buf(),
        };
        let config = ConfigService::load_config(&data_path).expect("defaults");
        assert_eq!(config.entry_point, "http://localhost:8080/api/users");
        assert_eq!(config.default_page_size, 10);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().expect("temp dir");
        let data_path = DataPath {
            root: dir.path().to_path_buf(),
        };
        let config = ServiceConfig {
            entry_point: "http://users.internal:9090/api/users".to_string(),
            default_page_size: 25,
        };
        ConfigService::save_config(&config, &data_path).expect("save");

        let loaded = ConfigService::load_config(&data_path).expect("reload");
        assert_eq!(loaded.entry_point, config.entry_point);
        assert_eq!(loaded.default_page_size, 25);
    }

    #[test]
    fn test_invalid_entry_point_rejected() {
        let config = ServiceConfig {
            entry_point: "not a url".to_string(),
            default_page_size: 10,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = ServiceConfig {
            entry_point: "http://localhost:8080/api/users".to_string(),
            default_page_size: 0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let data_path = DataPath {
            root: dir.path().to_path_buf(),
        };
        std::fs::write(
            data_path.config_path(),
            "entry_point = \"http://example.com/api/users\"\n",
        )
        .expect("write partial config");

        let config = ConfigService::load_config(&data_path).expect("load");
        assert_eq!(config.entry_point, "http://example.com/api/users");
        assert_eq!(config.default_page_size, 10);
    }
}
