use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreationDate {
    pub year: i64,
    pub month: i64,
    pub day: i64,
    pub hour: i64,
    pub minute: i64,
    pub second: i64,
}

/// Read-only projection of one open save, computed from disk on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveInfo {
    pub game_version: String,
    pub organisation_name: String,
    pub creation_date: Option<CreationDate>,
    pub playtime_seconds: u64,
    pub online_balance: i64,
    pub networth: i64,
    pub lifetime_earnings: i64,
    pub weekly_deposit_sum: i64,
    pub current_rank: String,
    pub rank: i64,
    pub tier: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveSlot {
    pub name: String,
    pub path: PathBuf,
    pub organisation_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuestCompletion {
    pub quests: usize,
    pub objectives: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemTarget {
    Weed,
    Item,
    Both,
}

/// Parameters for the bulk rewrite of item records inside property storage
/// objects. Quality and packaging only apply to weed records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub target: ItemTarget,
    pub quantity: i64,
    pub quality: Option<String>,
    pub packaging: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductGeneration {
    pub count: usize,
    pub id_length: usize,
    pub price: Option<i64>,
    pub add_to_listed: bool,
    pub use_name_pool: bool,
    pub min_properties: usize,
    pub max_properties: usize,
}

impl Default for ProductGeneration {
    fn default() -> Self {
        Self {
            count: 1,
            id_length: 10,
            price: None,
            add_to_listed: false,
            use_name_pool: false,
            min_properties: 1,
            max_properties: 8,
        }
    }
}
