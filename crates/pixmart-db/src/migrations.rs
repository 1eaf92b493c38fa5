use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            handle          TEXT NOT NULL UNIQUE,
            email           TEXT NOT NULL UNIQUE,
            password_hash   TEXT NOT NULL,
            balance         INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS pixel_blocks (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            tone        TEXT NOT NULL DEFAULT '',
            rarity      TEXT NOT NULL DEFAULT '',
            rgb         TEXT NOT NULL DEFAULT '#000000'
        );

        CREATE TABLE IF NOT EXISTS palettes (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            block_id    TEXT NOT NULL REFERENCES pixel_blocks(id),
            count       INTEGER NOT NULL DEFAULT 0,
            updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, block_id)
        );

        CREATE INDEX IF NOT EXISTS idx_palettes_user
            ON palettes(user_id);

        CREATE TABLE IF NOT EXISTS artworks (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            title       TEXT NOT NULL,
            status      TEXT NOT NULL DEFAULT 'draft',
            price       INTEGER,
            data_json   TEXT,
            buyer_id    TEXT REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
            listed_at   TEXT,
            sold_at     TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_artworks_owner
            ON artworks(user_id, status);

        CREATE INDEX IF NOT EXISTS idx_artworks_listed
            ON artworks(status, listed_at);

        CREATE TABLE IF NOT EXISTS transactions (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            artwork_id  TEXT NOT NULL REFERENCES artworks(id),
            seller_id   TEXT NOT NULL REFERENCES users(id),
            buyer_id    TEXT NOT NULL REFERENCES users(id),
            price       INTEGER NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_transactions_artwork
            ON transactions(artwork_id);

        CREATE TABLE IF NOT EXISTS checkins (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         TEXT NOT NULL REFERENCES users(id),
            day             TEXT NOT NULL,
            granted_common  INTEGER NOT NULL DEFAULT 0,
            granted_rare    INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, day)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
