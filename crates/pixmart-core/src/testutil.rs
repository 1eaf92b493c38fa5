//! Shared fixtures for the service tests: an in-memory marketplace plus
//! helpers for users, balances and listed artworks.

use serde_json::{Value, json};
use uuid::Uuid;

use pixmart_db::Database;
use pixmart_db::rusqlite::params;
use pixmart_types::api::{ArtworkAction, ArtworkPatch, NewUser};

use crate::{Config, Marketplace};

pub fn marketplace() -> Marketplace {
    Marketplace::new(Database::open_in_memory().unwrap(), Config::default())
}

pub fn register_user(market: &Marketplace, handle: &str) -> Uuid {
    market
        .register(&NewUser {
            handle: handle.to_string(),
            email: format!("{handle}@example.com"),
            password_hash: "opaque-hash".to_string(),
        })
        .unwrap()
        .id
}

pub fn set_balance(market: &Marketplace, user: Uuid, balance: i64) {
    market
        .db()
        .with_conn(|conn| {
            conn.execute(
                "UPDATE users SET balance = ?1 WHERE id = ?2",
                params![balance, user.to_string()],
            )?;
            Ok(())
        })
        .unwrap();
}

pub fn balance_of(market: &Marketplace, user: Uuid) -> i64 {
    market
        .db()
        .with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT balance FROM users WHERE id = ?1",
                [user.to_string()],
                |row| row.get(0),
            )?)
        })
        .unwrap()
}

pub fn palette_count(market: &Marketplace, user: Uuid, block_id: &str) -> i64 {
    market
        .db()
        .with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT count FROM palettes WHERE user_id = ?1 AND block_id = ?2",
                    params![user.to_string(), block_id],
                    |row| row.get(0),
                )
                .unwrap_or(0))
        })
        .unwrap()
}

/// `{"usage": [{"blockId": ..., "count": ...}, ...]}`
pub fn usage_data(entries: &[(&str, i64)]) -> Value {
    json!({
        "usage": entries
            .iter()
            .map(|(id, count)| json!({ "blockId": id, "count": count }))
            .collect::<Vec<_>>()
    })
}

pub fn listed_artwork(
    market: &Marketplace,
    owner: Uuid,
    title: &str,
    price: i64,
    data: &Value,
) -> Uuid {
    let art = market.create_artwork(owner, title, data).unwrap();
    market
        .update_artwork(
            owner,
            art.id,
            &ArtworkPatch {
                action: Some(ArtworkAction::List),
                price: Some(price),
                ..Default::default()
            },
        )
        .unwrap();
    art.id
}
