use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::ArtworkStatus;

// -- Users --

/// Registration input. The credential arrives already hashed; hashing and
/// token issuance live in the surrounding auth layer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub handle: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub handle: String,
    pub email: String,
    pub balance: i64,
    pub created_at: String,
}

// -- Artworks --

#[derive(Debug, Clone, Serialize)]
pub struct ArtworkSummary {
    pub id: Uuid,
    pub title: String,
    pub status: ArtworkStatus,
    pub price: Option<i64>,
    pub data: Value,
    pub buyer_id: Option<Uuid>,
    pub created_at: String,
    pub updated_at: String,
    pub listed_at: Option<String>,
    pub sold_at: Option<String>,
}

/// One entry of the public listed feed, with the seller attached.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    pub id: Uuid,
    pub title: String,
    pub status: ArtworkStatus,
    pub price: Option<i64>,
    pub data: Value,
    pub listed_at: Option<String>,
    pub seller_id: Uuid,
    pub seller_handle: String,
}

/// Public single-artwork view; only listed and sold artworks are visible.
#[derive(Debug, Clone, Serialize)]
pub struct PublicArtwork {
    pub id: Uuid,
    pub title: String,
    pub status: ArtworkStatus,
    pub price: Option<i64>,
    pub data: Value,
    pub listed_at: Option<String>,
    pub sold_at: Option<String>,
    pub seller_id: Uuid,
    pub seller_handle: String,
    pub buyer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtworkAction {
    List,
    Unlist,
}

/// Patch input for an owned artwork. With no action this is a draft edit;
/// `list` requires a price, `unlist` ignores the other fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtworkPatch {
    pub title: Option<String>,
    pub data: Option<Value>,
    pub action: Option<ArtworkAction>,
    pub price: Option<i64>,
}

// -- Palettes --

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaletteFilter {
    pub tone: Option<String>,
    pub rarity: Option<String>,
    /// Skip this artwork's own usage when computing reservations, so an
    /// artwork being edited does not count against itself.
    pub exclude_artwork_id: Option<Uuid>,
}

/// One availability row: `count` is what is free to spend right now,
/// `total_count` the stored holding, `reserved` the part committed to
/// draft/listed artworks. Rows with zero availability are omitted.
#[derive(Debug, Clone, Serialize)]
pub struct PaletteItem {
    pub id: String,
    pub block_id: String,
    pub name: Option<String>,
    pub tone: Option<String>,
    pub rarity: Option<String>,
    pub rgb: Option<String>,
    pub count: i64,
    pub total_count: i64,
    pub reserved: i64,
    pub updated_at: String,
}

// -- Check-ins --

#[derive(Debug, Clone, Serialize)]
pub struct GrantedBlock {
    pub block_id: String,
    pub name: String,
    pub tone: String,
    pub rarity: String,
    pub rgb: String,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CheckinTotals {
    pub common: u32,
    pub rare: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckinGrant {
    pub date: String,
    pub granted: Vec<GrantedBlock>,
    pub totals: CheckinTotals,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CheckinStatus {
    pub claimed: bool,
    pub streak: u32,
}
