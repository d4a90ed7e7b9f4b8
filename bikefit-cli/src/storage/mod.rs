// Local storage module using sled embedded database

use anyhow::{Context, Result};
use bikefit::services::session_store::{KeyValueStore, SessionStore};
use sled::Db;
use std::path::{Path, PathBuf};

use crate::config::Config;

const KV_TREE: &str = "kv";

/// Key-value storage backed by a sled database
pub struct Storage {
    db: Db,
}

impl Storage {
    /// Get database directory path (~/.bikefit/db)
    ///
    /// `BIKEFIT_DB_PATH` wins over the configured path.
    pub fn db_path(config: &Config) -> Result<PathBuf> {
        if let Ok(path) = std::env::var("BIKEFIT_DB_PATH") {
            return Ok(PathBuf::from(path));
        }

        match &config.storage.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::config_dir()?.join("db")),
        }
    }

    /// Open the database for the given configuration
    pub fn init(config: &Config) -> Result<Self> {
        Self::open(&Self::db_path(config)?)
    }

    pub fn open(path: &Path) -> Result<Self> {
        tracing::debug!("Opening sled database at {:?}", path);

        let db = sled::open(path).context("Failed to open sled database")?;

        Ok(Self { db })
    }

    fn tree(&self) -> Result<sled::Tree> {
        self.db.open_tree(KV_TREE).context("Failed to open key-value tree")
    }
}

impl KeyValueStore for Storage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(value) = self.tree()?.get(key).context("Failed to read key")? else {
            return Ok(None);
        };
        let text = String::from_utf8(value.to_vec()).context("Stored value is not UTF-8")?;
        Ok(Some(text))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.tree()?
            .insert(key, value.as_bytes())
            .context("Failed to write key")?;
        self.db.flush().context("Failed to flush database")?;

        tracing::debug!("Stored {} ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.tree()?.remove(key).context("Failed to remove key")?;
        self.db.flush().context("Failed to flush database")?;
        Ok(())
    }
}

/// Session store over the configured database
pub fn open_session_store(config: &Config) -> Result<SessionStore<Storage>> {
    Ok(SessionStore::new(Storage::init(config)?))
}
