use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use pixmart_db::queries;
use pixmart_types::api::{PaletteFilter, PaletteItem};
use pixmart_types::models::parse_usage;

use crate::Marketplace;
use crate::error::{CoreError, CoreResult};

impl Marketplace {
    /// Available (unreserved) counts per owned block: the stored count
    /// minus whatever the user's other draft/listed artworks declare as
    /// usage. Rows whose availability is zero are omitted entirely. The
    /// reservation map is transient, rebuilt on every call.
    pub fn list_available_palette(
        &self,
        user_id: Uuid,
        filter: &PaletteFilter,
    ) -> CoreResult<Vec<PaletteItem>> {
        let uid = user_id.to_string();
        let exclude = filter.exclude_artwork_id.map(|id| id.to_string());

        let (rows, artworks) = self.db.with_conn(|conn| {
            let rows =
                queries::list_palette_rows(conn, &uid, filter.tone.as_deref(), filter.rarity.as_deref())?;
            let artworks = queries::list_reserving_artworks(conn, &uid)?;
            Ok((rows, artworks))
        })?;

        let mut names_to_ids = HashMap::new();
        for row in &rows {
            if let Some(name) = &row.name {
                names_to_ids.insert(name.clone(), row.block_id.clone());
            }
        }

        let mut reserved: HashMap<String, i64> = HashMap::new();
        for (artwork_id, data_json) in &artworks {
            if exclude.as_deref() == Some(artwork_id.as_str()) {
                continue;
            }
            for entry in parse_usage(data_json.as_deref()) {
                if entry.count <= 0 {
                    continue;
                }
                match entry.resolve_block_id(&names_to_ids) {
                    Some(block_id) => *reserved.entry(block_id).or_insert(0) += entry.count,
                    None => debug!(artwork = %artwork_id, "dropping unresolvable usage entry"),
                }
            }
        }

        let items = rows
            .into_iter()
            .filter_map(|row| {
                let hold = reserved.get(&row.block_id).copied().unwrap_or(0);
                let available = (row.count - hold).max(0);
                (available > 0).then(|| PaletteItem {
                    id: row.id,
                    block_id: row.block_id,
                    name: row.name,
                    tone: row.tone,
                    rarity: row.rarity,
                    rgb: row.rgb,
                    count: available,
                    total_count: row.count,
                    reserved: hold,
                    updated_at: row.updated_at,
                })
            })
            .collect();
        Ok(items)
    }

    /// Owner-scoped manual adjustment of one palette row, floored at zero.
    pub fn adjust_palette(
        &self,
        user_id: Uuid,
        palette_id: &str,
        delta: i64,
    ) -> CoreResult<(String, i64)> {
        let uid = user_id.to_string();
        self.db.with_tx(|tx| {
            let row = queries::get_palette_row_by_id(tx, &uid, palette_id)?
                .ok_or_else(|| CoreError::not_found("palette not found"))?;
            let next = (row.count + delta).max(0);
            queries::set_palette_count(tx, &row.id, next)?;
            Ok((row.id, next))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use serde_json::json;

    fn available(market: &Marketplace, user: Uuid, block_id: &str) -> Option<i64> {
        market
            .list_available_palette(user, &PaletteFilter::default())
            .unwrap()
            .iter()
            .find(|p| p.block_id == block_id)
            .map(|p| p.count)
    }

    #[test]
    fn draft_usage_reserves_stored_blocks() {
        let market = testutil::marketplace();
        let user = testutil::register_user(&market, "ada");

        // Bring stored neon-cyan down to 8, then reserve 5 through a draft.
        let palette_id = format!("neon-cyan-{user}");
        market.adjust_palette(user, &palette_id, -34).unwrap();
        market
            .create_artwork(user, "Rain Halo", &testutil::usage_data(&[("neon-cyan", 5)]))
            .unwrap();

        let items = market
            .list_available_palette(user, &PaletteFilter::default())
            .unwrap();
        let cyan = items.iter().find(|p| p.block_id == "neon-cyan").unwrap();
        assert_eq!(cyan.count, 3);
        assert_eq!(cyan.total_count, 8);
        assert_eq!(cyan.reserved, 5);
    }

    #[test]
    fn listed_artworks_reserve_and_sold_do_not() {
        let market = testutil::marketplace();
        let user = testutil::register_user(&market, "ada");

        let art = testutil::listed_artwork(
            &market,
            user,
            "Raster Walker",
            100,
            &testutil::usage_data(&[("leaf", 10)]),
        );
        assert_eq!(available(&market, user, "leaf"), Some(22));

        market
            .db()
            .with_conn(|conn| queries::mark_artwork_sold(conn, &art.to_string(), &user.to_string()))
            .unwrap();
        assert_eq!(available(&market, user, "leaf"), Some(32));
    }

    #[test]
    fn zero_availability_rows_are_omitted() {
        let market = testutil::marketplace();
        let user = testutil::register_user(&market, "ada");

        // Reserve more than the stored 32; availability floors at zero and
        // the row disappears from the listing.
        market
            .create_artwork(user, "Overdraw", &testutil::usage_data(&[("leaf", 99)]))
            .unwrap();

        assert_eq!(available(&market, user, "leaf"), None);
    }

    #[test]
    fn excluded_artwork_does_not_count_against_itself() {
        let market = testutil::marketplace();
        let user = testutil::register_user(&market, "ada");

        let art = market
            .create_artwork(user, "Self Portrait", &testutil::usage_data(&[("sky", 20)]))
            .unwrap();

        assert_eq!(available(&market, user, "sky"), Some(7));

        let filter = PaletteFilter {
            exclude_artwork_id: Some(art.id),
            ..Default::default()
        };
        let items = market.list_available_palette(user, &filter).unwrap();
        let sky = items.iter().find(|p| p.block_id == "sky").unwrap();
        assert_eq!(sky.count, 27);
        assert_eq!(sky.reserved, 0);
    }

    #[test]
    fn malformed_payloads_reserve_nothing() {
        let market = testutil::marketplace();
        let user = testutil::register_user(&market, "ada");

        // Structurally wrong `usage` shape.
        market
            .create_artwork(user, "Odd Shape", &json!({ "usage": "five of everything" }))
            .unwrap();
        // Stored text that is not JSON at all.
        let art = market
            .create_artwork(user, "Broken", &json!({}))
            .unwrap();
        market
            .db()
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE artworks SET data_json = 'not json' WHERE id = ?1",
                    [art.id.to_string()],
                )?;
                Ok(())
            })
            .unwrap();

        assert_eq!(available(&market, user, "neon-cyan"), Some(42));
    }

    #[test]
    fn resolution_falls_back_to_prefix_and_name() {
        let market = testutil::marketplace();
        let user = testutil::register_user(&market, "ada");

        market
            .create_artwork(
                user,
                "Fallbacks",
                &json!({
                    "usage": [
                        { "id": "leaf-0042", "count": 2 },
                        { "name": "Sky", "count": 3 },
                        { "name": "No Such Block", "count": 9 },
                    ]
                }),
            )
            .unwrap();

        assert_eq!(available(&market, user, "leaf"), Some(30));
        assert_eq!(available(&market, user, "sky"), Some(24));
        // The unresolvable entry reserved nothing anywhere.
        let total_reserved: i64 = market
            .list_available_palette(user, &PaletteFilter::default())
            .unwrap()
            .iter()
            .map(|p| p.reserved)
            .sum();
        assert_eq!(total_reserved, 5);
    }

    #[test]
    fn tone_and_rarity_filters_pass_through() {
        let market = testutil::marketplace();
        let user = testutil::register_user(&market, "ada");

        let rare = market
            .list_available_palette(
                user,
                &PaletteFilter {
                    rarity: Some("rare".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(rare.len(), 4);
        assert!(rare.iter().all(|p| p.rarity.as_deref() == Some("rare")));

        let neon_rare = market
            .list_available_palette(
                user,
                &PaletteFilter {
                    tone: Some("neon".to_string()),
                    rarity: Some("rare".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(neon_rare.len(), 1);
        assert_eq!(neon_rare[0].block_id, "neon-cyan");
    }

    #[test]
    fn manual_adjustment_floors_at_zero() {
        let market = testutil::marketplace();
        let user = testutil::register_user(&market, "ada");
        let palette_id = format!("leaf-{user}");

        let (_, count) = market.adjust_palette(user, &palette_id, -100).unwrap();
        assert_eq!(count, 0);

        let (_, count) = market.adjust_palette(user, &palette_id, 7).unwrap();
        assert_eq!(count, 7);

        let missing = market.adjust_palette(user, "nope-nope", 1);
        assert_eq!(missing.unwrap_err().kind(), "not_found");

        // Another user cannot touch the row.
        let other = testutil::register_user(&market, "eve");
        let foreign = market.adjust_palette(other, &palette_id, 1);
        assert_eq!(foreign.unwrap_err().kind(), "not_found");
    }
}
