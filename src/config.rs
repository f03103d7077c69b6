//! Configuration types for dermascan.

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Model configuration.
    #[serde(default)]
    pub model: ModelConfig,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Model configuration.
#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    /// Path to the safetensors weights file.
    #[serde(default = "default_weights_path")]
    pub weights_path: String,

    /// EfficientNet variant to construct (b0..b7).
    #[serde(default = "default_variant")]
    pub variant: String,

    /// Device to load the model on.
    #[serde(default = "default_device")]
    pub device: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights_path: default_weights_path(),
            variant: default_variant(),
            device: default_device(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_weights_path() -> String {
    "weights.safetensors".to_string()
}

fn default_variant() -> String {
    "b0".to_string()
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> crate::error::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model.weights_path, "weights.safetensors");
        assert_eq!(config.model.variant, "b0");
        assert_eq!(config.model.device, "cpu");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = Config::from_yaml_str(
            r#"
model:
  weights_path: /data/skin.safetensors
server:
  port: 9000
"#,
        )
        .unwrap();
        assert_eq!(config.model.weights_path, "/data/skin.safetensors");
        assert_eq!(config.model.device, "cpu");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        assert!(Config::from_yaml_str("model: [not, a, map]").is_err());
    }
}
