use tracing::info;
use uuid::Uuid;

use pixmart_db::models::UserRow;
use pixmart_db::queries;
use pixmart_db::rusqlite::Connection;
use pixmart_types::api::{NewUser, UserProfile};
use pixmart_types::models::BlockMeta;

use crate::error::{CoreError, CoreResult};
use crate::{Marketplace, parse_uuid};

struct StarterBlock {
    id: &'static str,
    name: &'static str,
    tone: &'static str,
    rarity: &'static str,
    rgb: &'static str,
    count: i64,
}

/// The twelve-block palette every new account starts with.
const STARTER_BLOCKS: &[StarterBlock] = &[
    StarterBlock { id: "neon-cyan", name: "Neon Cyan", tone: "neon", rarity: "rare", rgb: "#0ea5e9", count: 42 },
    StarterBlock { id: "neon-pink", name: "Neon Pink", tone: "neon", rarity: "uncommon", rgb: "#ef5da8", count: 24 },
    StarterBlock { id: "neon-purple", name: "Neon Purple", tone: "neon", rarity: "uncommon", rgb: "#a855f7", count: 18 },
    StarterBlock { id: "soft-yellow", name: "Soft Yellow", tone: "soft", rarity: "common", rgb: "#f5d565", count: 36 },
    StarterBlock { id: "soft-coral", name: "Coral", tone: "soft", rarity: "rare", rgb: "#f58b7c", count: 28 },
    StarterBlock { id: "soft-mint", name: "Mint", tone: "soft", rarity: "common", rgb: "#7ad9c1", count: 30 },
    StarterBlock { id: "retro-green", name: "Retro Green", tone: "retro", rarity: "common", rgb: "#3ba56a", count: 40 },
    StarterBlock { id: "retro-orange", name: "Retro Orange", tone: "retro", rarity: "rare", rgb: "#f97316", count: 22 },
    StarterBlock { id: "retro-blue", name: "Retro Blue", tone: "retro", rarity: "common", rgb: "#3b82f6", count: 34 },
    StarterBlock { id: "earth-brown", name: "Earth Brown", tone: "nature", rarity: "common", rgb: "#8b5a2b", count: 26 },
    StarterBlock { id: "leaf", name: "Leaf Green", tone: "nature", rarity: "common", rgb: "#22c55e", count: 32 },
    StarterBlock { id: "sky", name: "Sky", tone: "nature", rarity: "rare", rgb: "#38bdf8", count: 27 },
];

impl Marketplace {
    /// Create a user with the configured starting balance and the starter
    /// palette, atomically. The credential is opaque here; hashing belongs
    /// to the surrounding auth layer.
    pub fn register(&self, new_user: &NewUser) -> CoreResult<UserProfile> {
        if new_user.handle.trim().is_empty() || new_user.email.trim().is_empty() {
            return Err(CoreError::validation("handle and email are required"));
        }

        let user_id = Uuid::new_v4();
        let profile = self.db.with_tx(|tx| {
            if queries::get_user_by_email(tx, &new_user.email)?.is_some() {
                return Err(CoreError::conflict("email is already registered"));
            }
            if queries::get_user_by_handle(tx, &new_user.handle)?.is_some() {
                return Err(CoreError::conflict("handle is already taken"));
            }

            queries::insert_user(
                tx,
                &user_id.to_string(),
                &new_user.handle,
                &new_user.email,
                &new_user.password_hash,
                self.config.starting_balance,
            )?;
            grant_starter_palette(tx, &user_id.to_string())?;

            let row = queries::get_user(tx, &user_id.to_string())?
                .ok_or_else(|| CoreError::internal("user missing after insert"))?;
            profile_from_row(row)
        })?;

        info!(user = %user_id, handle = %new_user.handle, "registered user");
        Ok(profile)
    }

    /// Idempotent starter grant, exposed for the auth collaborator which
    /// also runs it on login.
    pub fn ensure_starter_palette(&self, user_id: Uuid) -> CoreResult<()> {
        self.db.with_tx(|tx| {
            grant_starter_palette(tx, &user_id.to_string())?;
            Ok(())
        })
    }

    pub fn profile(&self, user_id: Uuid) -> CoreResult<UserProfile> {
        let row = self
            .db
            .with_conn(|conn| queries::get_user(conn, &user_id.to_string()))?
            .ok_or_else(|| CoreError::not_found("user not found"))?;
        profile_from_row(row)
    }

    pub fn update_handle(&self, user_id: Uuid, handle: &str) -> CoreResult<()> {
        if handle.trim().is_empty() {
            return Err(CoreError::validation("handle is required"));
        }
        let changed = self
            .db
            .with_conn(|conn| queries::update_handle(conn, &user_id.to_string(), handle))?;
        if changed == 0 {
            return Err(CoreError::not_found("user not found"));
        }
        Ok(())
    }
}

/// Grants the starter blocks unless the user already owns any palette row.
fn grant_starter_palette(conn: &Connection, user_id: &str) -> anyhow::Result<()> {
    if queries::user_has_palette(conn, user_id)? {
        return Ok(());
    }
    for b in STARTER_BLOCKS {
        let meta = BlockMeta {
            id: b.id.to_string(),
            name: b.name.to_string(),
            tone: b.tone.to_string(),
            rarity: b.rarity.to_string(),
            rgb: b.rgb.to_string(),
        };
        queries::ensure_block(conn, &meta)?;
        queries::insert_palette_row(conn, user_id, b.id, b.count)?;
    }
    info!(user = user_id, blocks = STARTER_BLOCKS.len(), "granted starter palette");
    Ok(())
}

fn profile_from_row(row: UserRow) -> CoreResult<UserProfile> {
    Ok(UserProfile {
        id: parse_uuid(&row.id)?,
        handle: row.handle,
        email: row.email,
        balance: row.balance,
        created_at: row.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use pixmart_types::api::PaletteFilter;

    fn new_user(handle: &str, email: &str) -> NewUser {
        NewUser {
            handle: handle.to_string(),
            email: email.to_string(),
            password_hash: "opaque-hash".to_string(),
        }
    }

    #[test]
    fn register_grants_balance_and_starter_palette() {
        let market = testutil::marketplace();
        let profile = market.register(&new_user("pixelwalker", "demo@example.com")).unwrap();

        assert_eq!(profile.balance, market.config().starting_balance);
        assert_eq!(profile.handle, "pixelwalker");

        let palette = market
            .list_available_palette(profile.id, &PaletteFilter::default())
            .unwrap();
        assert_eq!(palette.len(), STARTER_BLOCKS.len());

        let cyan = palette.iter().find(|p| p.block_id == "neon-cyan").unwrap();
        assert_eq!(cyan.count, 42);
        assert_eq!(cyan.total_count, 42);
        assert_eq!(cyan.reserved, 0);
    }

    #[test]
    fn starter_grant_is_idempotent() {
        let market = testutil::marketplace();
        let profile = market.register(&new_user("ada", "ada@example.com")).unwrap();

        market.ensure_starter_palette(profile.id).unwrap();
        market.ensure_starter_palette(profile.id).unwrap();

        let palette = market
            .list_available_palette(profile.id, &PaletteFilter::default())
            .unwrap();
        assert_eq!(palette.len(), STARTER_BLOCKS.len());
        let cyan = palette.iter().find(|p| p.block_id == "neon-cyan").unwrap();
        assert_eq!(cyan.total_count, 42);
    }

    #[test]
    fn duplicate_email_or_handle_conflicts_without_inserting() {
        let market = testutil::marketplace();
        market.register(&new_user("ada", "ada@example.com")).unwrap();

        let email_dup = market.register(&new_user("other", "ada@example.com"));
        assert_eq!(email_dup.unwrap_err().kind(), "conflict");

        let handle_dup = market.register(&new_user("ada", "fresh@example.com"));
        assert_eq!(handle_dup.unwrap_err().kind(), "conflict");

        let count: i64 = market
            .db()
            .with_conn(|conn| Ok(conn.query_row("SELECT count(*) FROM users", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn profile_and_handle_update() {
        let market = testutil::marketplace();
        let registered = market.register(&new_user("ada", "ada@example.com")).unwrap();

        market.update_handle(registered.id, "lovelace").unwrap();
        let profile = market.profile(registered.id).unwrap();
        assert_eq!(profile.handle, "lovelace");

        assert_eq!(
            market.update_handle(registered.id, "  ").unwrap_err().kind(),
            "validation"
        );
        assert_eq!(
            market.profile(Uuid::new_v4()).unwrap_err().kind(),
            "not_found"
        );
        assert_eq!(
            market.update_handle(Uuid::new_v4(), "ghost").unwrap_err().kind(),
            "not_found"
        );
    }
}
