// src/settings.rs
//! Environment-driven runtime settings with local-friendly defaults

use crate::smoke::DEFAULT_TARGET;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE_PATH: &str = "data/users.db";
pub const DEFAULT_KEYS_DIR: &str = "keys";

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub database_path: PathBuf,
    pub keys_dir: PathBuf,
    pub smoke_url: String,
}

impl Settings {
    /// Load settings from the environment, falling back to local defaults
    pub fn load() -> Result<Self> {
        let port = match std::env::var("USERGATE_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .context("USERGATE_PORT must be a valid port number")?,
            Err(_) => DEFAULT_PORT,
        };

        let database_path = std::env::var("USERGATE_DATABASE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATABASE_PATH));

        let keys_dir = std::env::var("USERGATE_KEYS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_KEYS_DIR));

        let smoke_url =
            std::env::var("USERGATE_SMOKE_URL").unwrap_or_else(|_| DEFAULT_TARGET.to_string());

        Ok(Self {
            port,
            database_path,
            keys_dir,
            smoke_url,
        })
    }

    /// RSA signing key, e.g. `openssl genrsa -out keys/app.rsa 2048`
    pub fn private_key_path(&self) -> PathBuf {
        self.keys_dir.join("app.rsa")
    }

    /// RSA verification key, e.g. `openssl rsa -in keys/app.rsa -pubout > keys/app.rsa.pub`
    pub fn public_key_path(&self) -> PathBuf {
        self.keys_dir.join("app.rsa.pub")
    }

    /// Ensure the directories the server writes into exist
    pub async fn ensure_directories(&self) -> Result<()> {
        if let Some(parent) = self.database_path.parent() {
            ensure_directory(parent).await?;
        }
        ensure_directory(&self.keys_dir).await?;

        info!("All configured directories ensured to exist");
        Ok(())
    }
}

async fn ensure_directory(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_paths_follow_keys_dir() {
        let settings = Settings {
            port: DEFAULT_PORT,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            keys_dir: PathBuf::from("/etc/usergate/keys"),
            smoke_url: DEFAULT_TARGET.to_string(),
        };

        assert_eq!(
            settings.private_key_path(),
            PathBuf::from("/etc/usergate/keys/app.rsa")
        );
        assert_eq!(
            settings.public_key_path(),
            PathBuf::from("/etc/usergate/keys/app.rsa.pub")
        );
    }
}
