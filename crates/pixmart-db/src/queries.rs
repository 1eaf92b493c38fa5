//! Query functions over the marketplace tables. Everything takes a plain
//! `&Connection` so the same calls compose inside a `Database::with_tx`
//! scope as well as standalone reads.

use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};

use pixmart_types::models::BlockMeta;

use crate::models::{
    ArtworkRow, BlockRow, CheckinRow, FeedRow, PaletteBlockRow, PaletteRow, UserRow,
};

// -- Users --

pub fn insert_user(
    conn: &Connection,
    id: &str,
    handle: &str,
    email: &str,
    password_hash: &str,
    balance: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, handle, email, password_hash, balance) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, handle, email, password_hash, balance],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            "SELECT id, handle, email, password_hash, balance, created_at FROM users WHERE id = ?1",
            [id],
            map_user,
        )
        .optional()?;
    Ok(row)
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            "SELECT id, handle, email, password_hash, balance, created_at FROM users WHERE email = ?1",
            [email],
            map_user,
        )
        .optional()?;
    Ok(row)
}

pub fn get_user_by_handle(conn: &Connection, handle: &str) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            "SELECT id, handle, email, password_hash, balance, created_at FROM users WHERE handle = ?1",
            [handle],
            map_user,
        )
        .optional()?;
    Ok(row)
}

/// Returns the number of rows changed (zero when the user is missing).
pub fn update_handle(conn: &Connection, id: &str, handle: &str) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE users SET handle = ?1 WHERE id = ?2",
        params![handle, id],
    )?;
    Ok(changed)
}

pub fn add_balance(conn: &Connection, id: &str, delta: i64) -> Result<()> {
    conn.execute(
        "UPDATE users SET balance = balance + ?1 WHERE id = ?2",
        params![delta, id],
    )?;
    Ok(())
}

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        handle: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        balance: row.get(4)?,
        created_at: row.get(5)?,
    })
}

// -- Pixel blocks --

pub fn get_block(conn: &Connection, id: &str) -> Result<Option<BlockRow>> {
    let row = conn
        .query_row(
            "SELECT id, name, tone, rarity, rgb FROM pixel_blocks WHERE id = ?1",
            [id],
            map_block,
        )
        .optional()?;
    Ok(row)
}

pub fn list_blocks(conn: &Connection) -> Result<Vec<BlockRow>> {
    let mut stmt = conn.prepare("SELECT id, name, tone, rarity, rgb FROM pixel_blocks")?;
    let rows = stmt
        .query_map([], map_block)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Idempotent insert-or-fetch keyed on the deterministic slug id.
pub fn ensure_block(conn: &Connection, meta: &BlockMeta) -> Result<BlockRow> {
    if let Some(block) = get_block(conn, &meta.id)? {
        return Ok(block);
    }
    conn.execute(
        "INSERT OR IGNORE INTO pixel_blocks (id, name, tone, rarity, rgb) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![meta.id, meta.name, meta.tone, meta.rarity, meta.rgb],
    )?;
    get_block(conn, &meta.id)?.ok_or_else(|| anyhow!("block {} missing after ensure", meta.id))
}

fn map_block(row: &rusqlite::Row<'_>) -> rusqlite::Result<BlockRow> {
    Ok(BlockRow {
        id: row.get(0)?,
        name: row.get(1)?,
        tone: row.get(2)?,
        rarity: row.get(3)?,
        rgb: row.get(4)?,
    })
}

// -- Palettes --

pub fn get_palette_row(
    conn: &Connection,
    user_id: &str,
    block_id: &str,
) -> Result<Option<PaletteRow>> {
    let row = conn
        .query_row(
            "SELECT id, user_id, block_id, count, updated_at FROM palettes
             WHERE user_id = ?1 AND block_id = ?2",
            params![user_id, block_id],
            map_palette,
        )
        .optional()?;
    Ok(row)
}

pub fn get_palette_row_by_id(
    conn: &Connection,
    user_id: &str,
    palette_id: &str,
) -> Result<Option<PaletteRow>> {
    let row = conn
        .query_row(
            "SELECT id, user_id, block_id, count, updated_at FROM palettes
             WHERE id = ?1 AND user_id = ?2",
            params![palette_id, user_id],
            map_palette,
        )
        .optional()?;
    Ok(row)
}

pub fn set_palette_count(conn: &Connection, palette_id: &str, count: i64) -> Result<()> {
    conn.execute(
        "UPDATE palettes SET count = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![count, palette_id],
    )?;
    Ok(())
}

/// First grant of a block to a user; the row id is the `{block}-{user}`
/// composite the rest of the system addresses palettes by.
pub fn insert_palette_row(
    conn: &Connection,
    user_id: &str,
    block_id: &str,
    count: i64,
) -> Result<()> {
    let id = format!("{}-{}", block_id, user_id);
    conn.execute(
        "INSERT INTO palettes (id, user_id, block_id, count) VALUES (?1, ?2, ?3, ?4)",
        params![id, user_id, block_id, count],
    )?;
    Ok(())
}

/// Apply a delta to a user's holding of one block: floors at zero, creates
/// the row on a first positive grant, and ignores a decrement of a holding
/// that does not exist. Returns the new count.
pub fn adjust_palette(conn: &Connection, user_id: &str, block_id: &str, delta: i64) -> Result<i64> {
    match get_palette_row(conn, user_id, block_id)? {
        Some(row) => {
            let next = (row.count + delta).max(0);
            set_palette_count(conn, &row.id, next)?;
            Ok(next)
        }
        None if delta > 0 => {
            insert_palette_row(conn, user_id, block_id, delta)?;
            Ok(delta)
        }
        None => Ok(0),
    }
}

pub fn user_has_palette(conn: &Connection, user_id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM palettes WHERE user_id = ?1 LIMIT 1",
            [user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// All palette rows for a user, left-joined with the catalog and ordered
/// by block display name case-insensitively. Tone and rarity filters are
/// pass-through predicates on the catalog columns.
pub fn list_palette_rows(
    conn: &Connection,
    user_id: &str,
    tone: Option<&str>,
    rarity: Option<&str>,
) -> Result<Vec<PaletteBlockRow>> {
    let mut sql = String::from(
        "SELECT p.id, p.block_id, p.count, p.updated_at, b.name, b.tone, b.rarity, b.rgb
           FROM palettes p
           LEFT JOIN pixel_blocks b ON b.id = p.block_id
          WHERE p.user_id = ?1",
    );
    let mut sql_params: Vec<&dyn rusqlite::types::ToSql> = vec![&user_id];
    if let Some(tone) = &tone {
        sql.push_str(&format!(" AND b.tone = ?{}", sql_params.len() + 1));
        sql_params.push(tone);
    }
    if let Some(rarity) = &rarity {
        sql.push_str(&format!(" AND b.rarity = ?{}", sql_params.len() + 1));
        sql_params.push(rarity);
    }
    sql.push_str(" ORDER BY b.name COLLATE NOCASE");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(sql_params.as_slice(), |row| {
            Ok(PaletteBlockRow {
                id: row.get(0)?,
                block_id: row.get(1)?,
                count: row.get(2)?,
                updated_at: row.get(3)?,
                name: row.get(4)?,
                tone: row.get(5)?,
                rarity: row.get(6)?,
                rgb: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_palette(row: &rusqlite::Row<'_>) -> rusqlite::Result<PaletteRow> {
    Ok(PaletteRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        block_id: row.get(2)?,
        count: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

// -- Artworks --

const ARTWORK_COLUMNS: &str =
    "id, user_id, title, status, price, data_json, buyer_id, created_at, updated_at, listed_at, sold_at";

pub fn insert_artwork(
    conn: &Connection,
    id: &str,
    user_id: &str,
    title: &str,
    data_json: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO artworks (id, user_id, title, status, price, data_json)
         VALUES (?1, ?2, ?3, 'draft', NULL, ?4)",
        params![id, user_id, title, data_json],
    )?;
    Ok(())
}

pub fn get_artwork(conn: &Connection, id: &str) -> Result<Option<ArtworkRow>> {
    let sql = format!("SELECT {ARTWORK_COLUMNS} FROM artworks WHERE id = ?1");
    let row = conn.query_row(&sql, [id], map_artwork).optional()?;
    Ok(row)
}

pub fn get_artwork_for_owner(
    conn: &Connection,
    id: &str,
    user_id: &str,
) -> Result<Option<ArtworkRow>> {
    let sql = format!("SELECT {ARTWORK_COLUMNS} FROM artworks WHERE id = ?1 AND user_id = ?2");
    let row = conn
        .query_row(&sql, params![id, user_id], map_artwork)
        .optional()?;
    Ok(row)
}

pub fn list_artworks_by_owner(
    conn: &Connection,
    user_id: &str,
    status: Option<&str>,
) -> Result<Vec<ArtworkRow>> {
    let mut sql = format!("SELECT {ARTWORK_COLUMNS} FROM artworks WHERE user_id = ?1");
    let mut sql_params: Vec<&dyn rusqlite::types::ToSql> = vec![&user_id];
    if let Some(status) = &status {
        sql.push_str(" AND status = ?2");
        sql_params.push(status);
    }
    sql.push_str(" ORDER BY updated_at DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(sql_params.as_slice(), map_artwork)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Draft and listed artworks whose payloads can hold block reservations.
pub fn list_reserving_artworks(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<(String, Option<String>)>> {
    let mut stmt = conn.prepare(
        "SELECT id, data_json FROM artworks
          WHERE user_id = ?1 AND status IN ('draft', 'listed') AND data_json IS NOT NULL",
    )?;
    let rows = stmt
        .query_map([user_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_listed_feed(conn: &Connection) -> Result<Vec<FeedRow>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.title, a.status, a.price, a.data_json, a.listed_at, u.id, u.handle
           FROM artworks a
           JOIN users u ON u.id = a.user_id
          WHERE a.status = 'listed'
          ORDER BY a.listed_at DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(FeedRow {
                id: row.get(0)?,
                title: row.get(1)?,
                status: row.get(2)?,
                price: row.get(3)?,
                data_json: row.get(4)?,
                listed_at: row.get(5)?,
                seller_id: row.get(6)?,
                seller_handle: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Single artwork joined with its current owner's handle.
pub fn get_artwork_with_seller(
    conn: &Connection,
    id: &str,
) -> Result<Option<(ArtworkRow, String)>> {
    let row = conn
        .query_row(
            "SELECT a.id, a.user_id, a.title, a.status, a.price, a.data_json, a.buyer_id,
                    a.created_at, a.updated_at, a.listed_at, a.sold_at, u.handle
               FROM artworks a
               JOIN users u ON u.id = a.user_id
              WHERE a.id = ?1",
            [id],
            |row| Ok((map_artwork(row)?, row.get(11)?)),
        )
        .optional()?;
    Ok(row)
}

pub fn update_artwork_draft(
    conn: &Connection,
    id: &str,
    user_id: &str,
    title: &str,
    data_json: Option<&str>,
) -> Result<()> {
    conn.execute(
        "UPDATE artworks SET title = ?1, data_json = ?2, updated_at = datetime('now')
         WHERE id = ?3 AND user_id = ?4",
        params![title, data_json, id, user_id],
    )?;
    Ok(())
}

pub fn mark_artwork_listed(
    conn: &Connection,
    id: &str,
    user_id: &str,
    price: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE artworks SET status = 'listed', price = ?1,
                listed_at = datetime('now'), updated_at = datetime('now')
         WHERE id = ?2 AND user_id = ?3",
        params![price, id, user_id],
    )?;
    Ok(())
}

pub fn mark_artwork_unlisted(conn: &Connection, id: &str, user_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE artworks SET status = 'draft', price = NULL,
                listed_at = NULL, updated_at = datetime('now')
         WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    Ok(())
}

/// Ownership transfers to the buyer as part of the sale.
pub fn mark_artwork_sold(conn: &Connection, id: &str, buyer_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE artworks SET status = 'sold', buyer_id = ?1, user_id = ?1,
                sold_at = datetime('now'), updated_at = datetime('now'), listed_at = NULL
         WHERE id = ?2",
        params![buyer_id, id],
    )?;
    Ok(())
}

fn map_artwork(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArtworkRow> {
    Ok(ArtworkRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        status: row.get(3)?,
        price: row.get(4)?,
        data_json: row.get(5)?,
        buyer_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        listed_at: row.get(9)?,
        sold_at: row.get(10)?,
    })
}

// -- Transactions --

pub fn insert_transaction_record(
    conn: &Connection,
    artwork_id: &str,
    seller_id: &str,
    buyer_id: &str,
    price: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO transactions (artwork_id, seller_id, buyer_id, price) VALUES (?1, ?2, ?3, ?4)",
        params![artwork_id, seller_id, buyer_id, price],
    )?;
    Ok(())
}

// -- Check-ins --

pub fn get_checkin(conn: &Connection, user_id: &str, day: &str) -> Result<Option<CheckinRow>> {
    let row = conn
        .query_row(
            "SELECT user_id, day, granted_common, granted_rare FROM checkins
             WHERE user_id = ?1 AND day = ?2",
            params![user_id, day],
            |row| {
                Ok(CheckinRow {
                    user_id: row.get(0)?,
                    day: row.get(1)?,
                    granted_common: row.get(2)?,
                    granted_rare: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn insert_checkin(
    conn: &Connection,
    user_id: &str,
    day: &str,
    granted_common: i64,
    granted_rare: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO checkins (user_id, day, granted_common, granted_rare) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, day, granted_common, granted_rare],
    )?;
    Ok(())
}

/// Most recent check-in days, newest first.
pub fn list_checkin_days(conn: &Connection, user_id: &str, limit: u32) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT day FROM checkins WHERE user_id = ?1 ORDER BY day DESC LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![user_id, limit], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
