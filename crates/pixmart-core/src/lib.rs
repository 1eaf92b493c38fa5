pub mod artworks;
pub mod config;
pub mod error;
pub mod palettes;
pub mod rewards;
pub mod users;

#[cfg(test)]
mod testutil;

pub use config::Config;
pub use error::{CoreError, CoreResult};

use pixmart_db::Database;
use pixmart_types::models::ArtworkStatus;
use uuid::Uuid;

/// Service facade over the ledger store. Callers are identified by an
/// opaque user id; the capability check that produces it lives in the
/// surrounding layer. Operations are grouped into `impl Marketplace`
/// blocks per module: `users`, `artworks`, `palettes`, `rewards`.
pub struct Marketplace {
    db: Database,
    config: Config,
}

impl Marketplace {
    pub fn new(db: Database, config: Config) -> Self {
        Self { db, config }
    }

    /// Open the database named by the environment and wrap it.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Config::from_env();
        let db = Database::open(&config.db_path)?;
        Ok(Self::new(db, config))
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

pub(crate) fn parse_uuid(raw: &str) -> CoreResult<Uuid> {
    raw.parse()
        .map_err(|_| CoreError::internal(format!("corrupt id in store: {raw}")))
}

pub(crate) fn parse_status(raw: &str) -> CoreResult<ArtworkStatus> {
    ArtworkStatus::parse(raw)
        .ok_or_else(|| CoreError::internal(format!("unknown artwork status: {raw}")))
}
