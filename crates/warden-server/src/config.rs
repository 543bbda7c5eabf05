use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub permissions: PermissionsSection,
    #[serde(default)]
    pub console: ConsoleSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_server_name")]
    pub name: String,
}

fn default_server_name() -> String {
    "warden".into()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: default_server_name(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct PermissionsSection {
    #[serde(default)]
    pub whitelist_enabled: bool,
    /// Directory holding `whitelist.json` and `banned-ips.json`.
    #[serde(default = "default_data_directory")]
    pub data_directory: String,
}

fn default_data_directory() -> String {
    ".".into()
}

impl Default for PermissionsSection {
    fn default() -> Self {
        Self {
            whitelist_enabled: false,
            data_directory: default_data_directory(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConsoleSection {
    #[serde(default = "default_console_enabled")]
    pub enabled: bool,
}

fn default_console_enabled() -> bool {
    true
}

impl Default for ConsoleSection {
    fn default() -> Self {
        Self {
            enabled: default_console_enabled(),
        }
    }
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}
