use std::path::PathBuf;

pub const DEFAULT_STARTING_BALANCE: i64 = 5000;

/// Environment-driven settings; a `.env` file is honored when present.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Pixel-coin balance granted to newly registered users.
    pub starting_balance: i64,
}

impl Config {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let db_path = std::env::var("PIXMART_DB_PATH").unwrap_or_else(|_| "pixmart.db".into());
        let starting_balance = std::env::var("PIXMART_STARTING_BALANCE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_STARTING_BALANCE);

        Self {
            db_path: PathBuf::from(db_path),
            starting_balance,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("pixmart.db"),
            starting_balance: DEFAULT_STARTING_BALANCE,
        }
    }
}
