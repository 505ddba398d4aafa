use crate::ports::{AppConfig, ConfigError, ConfigResult, ConfigStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug, Serialize, Deserialize)]
struct ConfigFile {
    backend_url: Option<String>,
}

/// Config lives in `<config_dir>/taskdeck/config.json`; the service key
/// goes into the OS keyring, with a 0600 file and the TASKDECK_API_KEY
/// env var as fallbacks.
pub struct FileConfigStore {
    config_path: PathBuf,
    keyring_service: String,
}

impl FileConfigStore {
    pub fn new() -> ConfigResult<Self> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ConfigError::ReadError("Cannot determine config directory".to_string())
        })?;

        let config_path = config_dir.join("taskdeck").join("config.json");

        Ok(Self {
            config_path,
            keyring_service: "taskdeck".to_string(),
        })
    }

    #[cfg(test)]
    fn at_path(config_path: PathBuf) -> Self {
        Self {
            config_path,
            keyring_service: "taskdeck-test".to_string(),
        }
    }

    async fn ensure_config_dir(&self) -> ConfigResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }
        Ok(())
    }

    fn key_file_path(&self) -> PathBuf {
        self.config_path
            .parent()
            .map(|p| p.join(".apikey"))
            .unwrap_or_else(|| PathBuf::from(".apikey"))
    }

    async fn get_key_from_file(&self) -> ConfigResult<Option<String>> {
        match fs::read_to_string(self.key_file_path()).await {
            Ok(key) => Ok(Some(key.trim().to_string())),
            Err(_) => Ok(None),
        }
    }

    async fn set_key_in_file(&self, key: &str) -> ConfigResult<()> {
        self.ensure_config_dir().await?;
        let key_path = self.key_file_path();
        fs::write(&key_path, key)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        // Owner-only permissions (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&key_path)
                .await
                .map_err(|e| ConfigError::WriteError(e.to_string()))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&key_path, perms)
                .await
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        Ok(())
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load_config(&self) -> ConfigResult<AppConfig> {
        let content = match fs::read_to_string(&self.config_path).await {
            Ok(content) => content,
            Err(_) => {
                // No config file yet: key storage may still hold a key
                let api_key = self.get_api_key().await?;
                return Ok(AppConfig {
                    api_key,
                    ..Default::default()
                });
            }
        };

        let config_file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        let mut api_key = self.get_api_key().await?;
        if api_key.is_none() {
            if let Ok(env_key) = std::env::var("TASKDECK_API_KEY") {
                api_key = Some(env_key);
            }
        }

        Ok(AppConfig {
            backend_url: config_file.backend_url,
            api_key,
        })
    }

    async fn save_config(&self, config: &AppConfig) -> ConfigResult<()> {
        self.ensure_config_dir().await?;

        let config_file = ConfigFile {
            backend_url: config.backend_url.clone(),
        };

        let content = serde_json::to_string_pretty(&config_file)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        fs::write(&self.config_path, content)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        if let Some(key) = &config.api_key {
            self.set_api_key(key).await?;
        }

        Ok(())
    }

    async fn get_api_key(&self) -> ConfigResult<Option<String>> {
        match keyring::Entry::new(&self.keyring_service, "api_key") {
            Ok(entry) => match entry.get_password() {
                Ok(key) => return Ok(Some(key)),
                Err(keyring::Error::NoEntry) => {
                    // No key in keyring, try the file
                }
                Err(_) => {
                    tracing::warn!("Keyring not available, falling back to file storage");
                }
            },
            Err(_) => {
                tracing::warn!("Keyring service not available, falling back to file storage");
            }
        }

        self.get_key_from_file().await
    }

    async fn set_api_key(&self, key: &str) -> ConfigResult<()> {
        match keyring::Entry::new(&self.keyring_service, "api_key") {
            Ok(entry) => match entry.set_password(key) {
                Ok(()) => return Ok(()),
                Err(_) => {
                    tracing::warn!("Failed to store in keyring, falling back to file storage");
                }
            },
            Err(_) => {
                tracing::warn!("Keyring not available, using file storage");
            }
        }

        self.set_key_in_file(key).await
    }
}
