/// Database row types — these map directly to SQLite rows.
/// Distinct from pixmart-types API models to keep the DB layer independent.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub handle: String,
    pub email: String,
    pub password_hash: String,
    pub balance: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct BlockRow {
    pub id: String,
    pub name: String,
    pub tone: String,
    pub rarity: String,
    pub rgb: String,
}

#[derive(Debug, Clone)]
pub struct PaletteRow {
    pub id: String,
    pub user_id: String,
    pub block_id: String,
    pub count: i64,
    pub updated_at: String,
}

/// Palette row left-joined with its catalog block; the block fields are
/// None when the catalog row is missing.
#[derive(Debug, Clone)]
pub struct PaletteBlockRow {
    pub id: String,
    pub block_id: String,
    pub count: i64,
    pub updated_at: String,
    pub name: Option<String>,
    pub tone: Option<String>,
    pub rarity: Option<String>,
    pub rgb: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ArtworkRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub status: String,
    pub price: Option<i64>,
    pub data_json: Option<String>,
    pub buyer_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub listed_at: Option<String>,
    pub sold_at: Option<String>,
}

/// Listed-feed row joined with the seller.
#[derive(Debug, Clone)]
pub struct FeedRow {
    pub id: String,
    pub title: String,
    pub status: String,
    pub price: Option<i64>,
    pub data_json: Option<String>,
    pub listed_at: Option<String>,
    pub seller_id: String,
    pub seller_handle: String,
}

#[derive(Debug, Clone)]
pub struct CheckinRow {
    pub user_id: String,
    pub day: String,
    pub granted_common: i64,
    pub granted_rare: i64,
}
