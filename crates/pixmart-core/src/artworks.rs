use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use pixmart_db::models::ArtworkRow;
use pixmart_db::queries;
use pixmart_types::api::{ArtworkAction, ArtworkPatch, ArtworkSummary, FeedItem, PublicArtwork};
use pixmart_types::models::{ArtworkStatus, parse_data, parse_usage};

use crate::error::{CoreError, CoreResult};
use crate::{Marketplace, parse_status, parse_uuid};

impl Marketplace {
    /// New artworks always start as drafts with no price.
    pub fn create_artwork(&self, user_id: Uuid, title: &str, data: &Value) -> CoreResult<ArtworkSummary> {
        if title.trim().is_empty() {
            return Err(CoreError::validation("title is required"));
        }
        let id = Uuid::new_v4();
        let row = self
            .db
            .with_conn(|conn| {
                queries::insert_artwork(
                    conn,
                    &id.to_string(),
                    &user_id.to_string(),
                    title,
                    &data.to_string(),
                )?;
                queries::get_artwork(conn, &id.to_string())
            })?
            .ok_or_else(|| CoreError::internal("artwork missing after insert"))?;
        summary_from_row(row)
    }

    pub fn get_artwork(&self, user_id: Uuid, artwork_id: Uuid) -> CoreResult<ArtworkSummary> {
        let row = self
            .db
            .with_conn(|conn| {
                queries::get_artwork_for_owner(conn, &artwork_id.to_string(), &user_id.to_string())
            })?
            .ok_or_else(|| CoreError::not_found("artwork not found"))?;
        summary_from_row(row)
    }

    pub fn list_artworks(
        &self,
        user_id: Uuid,
        status: Option<ArtworkStatus>,
    ) -> CoreResult<Vec<ArtworkSummary>> {
        let rows = self.db.with_conn(|conn| {
            queries::list_artworks_by_owner(
                conn,
                &user_id.to_string(),
                status.map(|s| s.as_str()),
            )
        })?;
        rows.into_iter().map(summary_from_row).collect()
    }

    /// Everything currently listed, newest listing first, with sellers.
    pub fn listed_feed(&self) -> CoreResult<Vec<FeedItem>> {
        let rows = self.db.with_conn(queries::list_listed_feed)?;
        rows.into_iter()
            .map(|row| {
                Ok(FeedItem {
                    id: parse_uuid(&row.id)?,
                    title: row.title,
                    status: parse_status(&row.status)?,
                    price: row.price,
                    data: parse_data(row.data_json.as_deref()),
                    listed_at: row.listed_at,
                    seller_id: parse_uuid(&row.seller_id)?,
                    seller_handle: row.seller_handle,
                })
            })
            .collect()
    }

    /// Public single view; drafts stay private to their owner.
    pub fn public_artwork(&self, artwork_id: Uuid) -> CoreResult<PublicArtwork> {
        let (row, seller_handle) = self
            .db
            .with_conn(|conn| queries::get_artwork_with_seller(conn, &artwork_id.to_string()))?
            .ok_or_else(|| CoreError::not_found("artwork not viewable"))?;
        let status = parse_status(&row.status)?;
        if status != ArtworkStatus::Listed && status != ArtworkStatus::Sold {
            return Err(CoreError::not_found("artwork not viewable"));
        }
        Ok(PublicArtwork {
            id: parse_uuid(&row.id)?,
            title: row.title,
            status,
            price: row.price,
            data: parse_data(row.data_json.as_deref()),
            listed_at: row.listed_at,
            sold_at: row.sold_at,
            seller_id: parse_uuid(&row.user_id)?,
            seller_handle,
            buyer_id: row.buyer_id.as_deref().map(parse_uuid).transpose()?,
        })
    }

    /// Draft edits, listing and unlisting. A listed artwork only accepts
    /// the unlist action; a sold artwork accepts nothing.
    pub fn update_artwork(
        &self,
        user_id: Uuid,
        artwork_id: Uuid,
        patch: &ArtworkPatch,
    ) -> CoreResult<ArtworkSummary> {
        let uid = user_id.to_string();
        let aid = artwork_id.to_string();
        self.db.with_tx(|tx| {
            let art = queries::get_artwork_for_owner(tx, &aid, &uid)?
                .ok_or_else(|| CoreError::not_found("artwork not found"))?;
            let status = parse_status(&art.status)?;

            if status == ArtworkStatus::Sold {
                return Err(CoreError::conflict("sold artwork can no longer be modified"));
            }
            if status == ArtworkStatus::Listed && patch.action != Some(ArtworkAction::Unlist) {
                return Err(CoreError::conflict(
                    "listed artwork cannot be edited, unlist it first",
                ));
            }

            match patch.action {
                Some(ArtworkAction::List) => {
                    let price = patch
                        .price
                        .filter(|p| *p > 0)
                        .ok_or_else(|| {
                            CoreError::validation("listing price must be a positive integer")
                        })?;
                    queries::mark_artwork_listed(tx, &aid, &uid, price)?;
                }
                Some(ArtworkAction::Unlist) => {
                    queries::mark_artwork_unlisted(tx, &aid, &uid)?;
                }
                None => {
                    let title = patch.title.as_deref().unwrap_or(&art.title);
                    let data_json = match &patch.data {
                        Some(value) => Some(value.to_string()),
                        None => art.data_json.clone(),
                    };
                    queries::update_artwork_draft(tx, &aid, &uid, title, data_json.as_deref())?;
                }
            }

            let updated = queries::get_artwork(tx, &aid)?
                .ok_or_else(|| CoreError::internal("artwork missing after update"))?;
            summary_from_row(updated)
        })
    }

    /// The sale: balance transfer, palette re-allocation, ownership flip
    /// and the transaction record, all inside one atomic unit. Concurrent
    /// attempts on the same artwork serialize through the store; the loser
    /// re-reads a sold status and fails the purchasable check.
    pub fn purchase(&self, buyer_id: Uuid, artwork_id: Uuid) -> CoreResult<ArtworkSummary> {
        let bid = buyer_id.to_string();
        let aid = artwork_id.to_string();
        let summary = self.db.with_tx(|tx| {
            let art = queries::get_artwork(tx, &aid)?
                .ok_or_else(|| CoreError::not_found("artwork not found"))?;
            let status = parse_status(&art.status)?;
            if status != ArtworkStatus::Listed {
                return Err(CoreError::conflict("artwork is not purchasable"));
            }
            if art.user_id == bid {
                return Err(CoreError::conflict("cannot buy your own artwork"));
            }
            let price = art
                .price
                .ok_or_else(|| CoreError::internal("listed artwork has no price"))?;
            let buyer = queries::get_user(tx, &bid)?
                .ok_or_else(|| CoreError::not_found("buyer not found"))?;
            if buyer.balance < price {
                return Err(CoreError::conflict("insufficient pixel coin balance"));
            }
            let seller = queries::get_user(tx, &art.user_id)?
                .ok_or_else(|| CoreError::not_found("seller not found"))?;

            let usage = parse_usage(art.data_json.as_deref());

            queries::add_balance(tx, &buyer.id, -price)?;
            queries::add_balance(tx, &seller.id, price)?;

            for entry in &usage {
                if entry.count <= 0 {
                    continue;
                }
                let block = queries::ensure_block(tx, &entry.catalog_meta())?;
                queries::adjust_palette(tx, &seller.id, &block.id, -entry.count)?;
                queries::adjust_palette(tx, &buyer.id, &block.id, entry.count)?;
            }

            queries::mark_artwork_sold(tx, &aid, &buyer.id)?;
            queries::insert_transaction_record(tx, &aid, &seller.id, &buyer.id, price)?;

            let updated = queries::get_artwork(tx, &aid)?
                .ok_or_else(|| CoreError::internal("artwork missing after sale"))?;
            summary_from_row(updated)
        })?;

        info!(artwork = %artwork_id, buyer = %buyer_id, "artwork sold");
        Ok(summary)
    }
}

fn summary_from_row(row: ArtworkRow) -> CoreResult<ArtworkSummary> {
    Ok(ArtworkSummary {
        id: parse_uuid(&row.id)?,
        title: row.title,
        status: parse_status(&row.status)?,
        price: row.price,
        data: parse_data(row.data_json.as_deref()),
        buyer_id: row.buyer_id.as_deref().map(parse_uuid).transpose()?,
        created_at: row.created_at,
        updated_at: row.updated_at,
        listed_at: row.listed_at,
        sold_at: row.sold_at,
    })
}
