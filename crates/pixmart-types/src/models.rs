use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Rarity tiers the reward draw distinguishes. Anything else in the catalog
/// ("uncommon", empty string for lazily-created blocks) is ignored by the
/// draw.
pub const RARITY_COMMON: &str = "common";
pub const RARITY_RARE: &str = "rare";

/// Artwork lifecycle: draft -> listed -> sold, with listed -> draft as the
/// unlist escape hatch. Sold is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtworkStatus {
    Draft,
    Listed,
    Sold,
}

impl ArtworkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtworkStatus::Draft => "draft",
            ArtworkStatus::Listed => "listed",
            ArtworkStatus::Sold => "sold",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ArtworkStatus::Draft),
            "listed" => Some(ArtworkStatus::Listed),
            "sold" => Some(ArtworkStatus::Sold),
            _ => None,
        }
    }
}

impl std::fmt::Display for ArtworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog metadata for a pixel block. `id` is the deterministic slug
/// derived from the human name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockMeta {
    pub id: String,
    pub name: String,
    pub tone: String,
    pub rarity: String,
    pub rgb: String,
}

/// Derive a catalog block id from a human name: lowercase, whitespace runs
/// collapsed to single hyphens.
pub fn block_slug(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// One entry of an artwork's `usage` payload, describing how many units of
/// a block the artwork consumes. Payloads come from clients and are only
/// loosely shaped: every field is optional, unknown fields are ignored, and
/// a count that is not a number coerces to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UsageEntry {
    pub block_id: Option<String>,
    pub base_id: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub tone: Option<String>,
    pub rarity: Option<String>,
    pub rgb: Option<String>,
    #[serde(deserialize_with = "de_lenient_count")]
    pub count: i64,
}

impl UsageEntry {
    /// Resolve the referenced block id. Fallback chain: explicit block id,
    /// then base id, then the text before the first hyphen of a concrete
    /// item id, then a display-name lookup among the caller's own palette
    /// rows. Unresolvable entries are dropped by callers, not errors.
    pub fn resolve_block_id(&self, names_to_ids: &HashMap<String, String>) -> Option<String> {
        if let Some(id) = non_empty(&self.block_id) {
            return Some(id.to_string());
        }
        if let Some(id) = non_empty(&self.base_id) {
            return Some(id.to_string());
        }
        if let Some(id) = non_empty(&self.id) {
            if let Some(base) = id.split('-').next().filter(|s| !s.is_empty()) {
                return Some(base.to_string());
            }
        }
        if let Some(name) = non_empty(&self.name) {
            if let Some(id) = names_to_ids.get(name) {
                return Some(id.clone());
            }
        }
        None
    }

    /// Catalog metadata for ensure-on-first-reference, filling absent
    /// fields with the marketplace defaults.
    pub fn catalog_meta(&self) -> BlockMeta {
        let base = non_empty(&self.base_id)
            .or_else(|| non_empty(&self.block_id))
            .or_else(|| non_empty(&self.name))
            .unwrap_or("pix");
        let name = non_empty(&self.name)
            .or_else(|| non_empty(&self.base_id))
            .unwrap_or("Pixel");
        BlockMeta {
            id: block_slug(base),
            name: name.to_string(),
            tone: self.tone.clone().unwrap_or_default(),
            rarity: self.rarity.clone().unwrap_or_default(),
            rgb: non_empty(&self.rgb).unwrap_or("#000000").to_string(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn de_lenient_count<'de, D>(de: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(de)?;
    Ok(match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    })
}

/// Parse the `usage` array out of a stored artwork payload. Malformed or
/// absent payloads yield an empty list: bad per-record data is ignorable
/// and never fails a request. Non-object entries are dropped.
pub fn parse_usage(data_json: Option<&str>) -> Vec<UsageEntry> {
    let Some(raw) = data_json else {
        return Vec::new();
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
        return Vec::new();
    };
    match value.get("usage") {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| serde_json::from_value::<UsageEntry>(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse a stored payload for display, substituting an empty object when
/// the stored text is missing or malformed.
pub fn parse_data(data_json: Option<&str>) -> serde_json::Value {
    data_json
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_else(|| serde_json::Value::Object(Default::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_lowercase_hyphenated() {
        assert_eq!(block_slug("Neon Cyan"), "neon-cyan");
        assert_eq!(block_slug("  Soft   Yellow "), "soft-yellow");
        assert_eq!(block_slug("leaf"), "leaf");
    }

    #[test]
    fn status_round_trips() {
        for status in [
            ArtworkStatus::Draft,
            ArtworkStatus::Listed,
            ArtworkStatus::Sold,
        ] {
            assert_eq!(ArtworkStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ArtworkStatus::parse("archived"), None);
    }

    #[test]
    fn malformed_payload_parses_as_empty_usage() {
        assert!(parse_usage(None).is_empty());
        assert!(parse_usage(Some("not json")).is_empty());
        assert!(parse_usage(Some("{\"usage\": 7}")).is_empty());
        assert!(parse_usage(Some("{\"pixels\": []}")).is_empty());
    }

    #[test]
    fn non_object_usage_entries_are_dropped() {
        let usage = parse_usage(Some(
            "{\"usage\": [{\"blockId\": \"neon-cyan\", \"count\": 5}, \"junk\", 3]}",
        ));
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].block_id.as_deref(), Some("neon-cyan"));
        assert_eq!(usage[0].count, 5);
    }

    #[test]
    fn count_coerces_leniently() {
        let usage = parse_usage(Some(
            "{\"usage\": [{\"blockId\": \"a\", \"count\": \"4\"}, {\"blockId\": \"b\", \"count\": {}}, {\"blockId\": \"c\"}]}",
        ));
        assert_eq!(usage[0].count, 4);
        assert_eq!(usage[1].count, 0);
        assert_eq!(usage[2].count, 0);
    }

    #[test]
    fn resolution_prefers_explicit_ids() {
        let names: HashMap<String, String> =
            [("Neon Cyan".to_string(), "neon-cyan".to_string())].into();

        let explicit = UsageEntry {
            block_id: Some("retro-blue".into()),
            base_id: Some("ignored".into()),
            ..Default::default()
        };
        assert_eq!(explicit.resolve_block_id(&names).as_deref(), Some("retro-blue"));

        let base = UsageEntry {
            base_id: Some("soft-mint".into()),
            ..Default::default()
        };
        assert_eq!(base.resolve_block_id(&names).as_deref(), Some("soft-mint"));

        let prefix = UsageEntry {
            id: Some("leaf-0042".into()),
            ..Default::default()
        };
        assert_eq!(prefix.resolve_block_id(&names).as_deref(), Some("leaf"));

        let by_name = UsageEntry {
            name: Some("Neon Cyan".into()),
            ..Default::default()
        };
        assert_eq!(by_name.resolve_block_id(&names).as_deref(), Some("neon-cyan"));

        let unresolvable = UsageEntry {
            name: Some("Unknown".into()),
            ..Default::default()
        };
        assert_eq!(unresolvable.resolve_block_id(&names), None);
    }

    #[test]
    fn catalog_meta_fills_defaults() {
        let bare = UsageEntry::default();
        let meta = bare.catalog_meta();
        assert_eq!(meta.id, "pix");
        assert_eq!(meta.name, "Pixel");
        assert_eq!(meta.rgb, "#000000");

        let named = UsageEntry {
            name: Some("Dusk Violet".into()),
            rarity: Some("rare".into()),
            ..Default::default()
        };
        let meta = named.catalog_meta();
        assert_eq!(meta.id, "dusk-violet");
        assert_eq!(meta.name, "Dusk Violet");
        assert_eq!(meta.rarity, "rare");
    }
}
