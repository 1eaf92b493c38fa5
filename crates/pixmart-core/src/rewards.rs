use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use pixmart_db::models::BlockRow;
use pixmart_db::queries;
use pixmart_types::api::{CheckinGrant, CheckinStatus, CheckinTotals, GrantedBlock};
use pixmart_types::models::{RARITY_COMMON, RARITY_RARE};

use crate::Marketplace;
use crate::error::{CoreError, CoreResult};

const COMMON_PICKS: usize = 9;
const RARE_PICKS: usize = 1;

/// How far back the status read looks for streak computation.
const CHECKIN_WINDOW: u32 = 14;

impl Marketplace {
    /// Daily check-in with the process RNG and the server's local date.
    pub fn daily_checkin(&self, user_id: Uuid) -> CoreResult<CheckinGrant> {
        self.daily_checkin_on(user_id, &today(), &mut rand::rng())
    }

    /// Deterministic variant: callers supply the day key and random
    /// source. One grant per (user, day); a repeat claim is a conflict and
    /// mutates nothing.
    pub fn daily_checkin_on<R: Rng>(
        &self,
        user_id: Uuid,
        day: &str,
        rng: &mut R,
    ) -> CoreResult<CheckinGrant> {
        let uid = user_id.to_string();
        self.db.with_tx(|tx| {
            if queries::get_checkin(tx, &uid, day)?.is_some() {
                return Err(CoreError::conflict("reward already claimed today"));
            }

            let blocks = queries::list_blocks(tx)?;
            let common: Vec<&BlockRow> =
                blocks.iter().filter(|b| b.rarity == RARITY_COMMON).collect();
            let rare: Vec<&BlockRow> =
                blocks.iter().filter(|b| b.rarity == RARITY_RARE).collect();
            if common.is_empty() {
                return Err(CoreError::configuration(
                    "no common-rarity blocks in the catalog",
                ));
            }
            let rare_pool = if rare.is_empty() { &common } else { &rare };

            let mut picks: Vec<&BlockRow> = Vec::with_capacity(COMMON_PICKS + RARE_PICKS);
            for _ in 0..COMMON_PICKS {
                picks.push(common[rng.random_range(0..common.len())]);
            }
            for _ in 0..RARE_PICKS {
                picks.push(rare_pool[rng.random_range(0..rare_pool.len())]);
            }

            // Aggregate repeated draws into one grant per block, keeping
            // first-drawn order.
            let mut order: Vec<&BlockRow> = Vec::new();
            let mut quantities: HashMap<&str, i64> = HashMap::new();
            for block in picks {
                let slot = quantities.entry(block.id.as_str()).or_insert(0);
                if *slot == 0 {
                    order.push(block);
                }
                *slot += 1;
            }

            let mut granted = Vec::with_capacity(order.len());
            for block in order {
                let qty = quantities[block.id.as_str()];
                queries::adjust_palette(tx, &uid, &block.id, qty)?;
                granted.push(GrantedBlock {
                    block_id: block.id.clone(),
                    name: block.name.clone(),
                    tone: block.tone.clone(),
                    rarity: block.rarity.clone(),
                    rgb: block.rgb.clone(),
                    count: qty,
                });
            }

            queries::insert_checkin(tx, &uid, day, COMMON_PICKS as i64, RARE_PICKS as i64)?;
            info!(user = %uid, day, "daily check-in rewards granted");

            Ok(CheckinGrant {
                date: day.to_string(),
                granted,
                totals: CheckinTotals {
                    common: COMMON_PICKS as u32,
                    rare: RARE_PICKS as u32,
                },
            })
        })
    }

    pub fn checkin_status(&self, user_id: Uuid) -> CoreResult<CheckinStatus> {
        self.checkin_status_on(user_id, &today())
    }

    pub fn checkin_status_on(&self, user_id: Uuid, day: &str) -> CoreResult<CheckinStatus> {
        let uid = user_id.to_string();
        let days = self
            .db
            .with_conn(|conn| queries::list_checkin_days(conn, &uid, CHECKIN_WINDOW))?;
        let claimed = days.iter().any(|d| d == day);
        let streak = streak_from(&days, day);
        Ok(CheckinStatus { claimed, streak })
    }
}

fn today() -> String {
    Local::now().date_naive().to_string()
}

/// Count consecutive check-in days ending at `today`, walking backwards
/// until the first gap. `days` must be sorted descending.
fn streak_from(days: &[String], today: &str) -> u32 {
    let Ok(mut cursor) = NaiveDate::parse_from_str(today, "%Y-%m-%d") else {
        return 0;
    };
    let mut streak = 0;
    for day in days {
        if day != &cursor.to_string() {
            break;
        }
        streak += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    streak
}
