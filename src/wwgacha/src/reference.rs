//! Reference tables shared by both converters.
//!
//! Column names, JSON keys and the labels each source tool uses for pools and
//! rarities are external contracts with those tools. They are kept verbatim
//! here as compile-time maps.

use crate::record::CardPoolType;
use phf::phf_map;
use std::fmt;

// ============================================================================
// Source fields
// ============================================================================

/// A field of the intermediate source record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceField {
    Pool,
    ResourceId,
    Rarity,
    Name,
    Count,
    Time,
    /// Present in both sources, has no output field
    ResourceType,
}

impl SourceField {
    pub fn output_key(self) -> &'static str {
        match self {
            SourceField::Pool => "cardPoolType",
            SourceField::ResourceId => "resourceId",
            SourceField::Rarity => "qualityLevel",
            SourceField::Name => "name",
            SourceField::Count => "count",
            SourceField::Time => "time",
            SourceField::ResourceType => "resourceType",
        }
    }
}

impl fmt::Display for SourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.output_key())
    }
}

// ============================================================================
// Spreadsheet columns
// ============================================================================

/// Header name -> field, as written by the spreadsheet export tool
pub static SPREADSHEET_COLUMNS: phf::Map<&'static str, SourceField> = phf_map! {
    "卡池" => SourceField::Pool,
    "资源ID" => SourceField::ResourceId,
    "星级" => SourceField::Rarity,
    "名称" => SourceField::Name,
    "数量" => SourceField::Count,
    "时间" => SourceField::Time,
    "类型" => SourceField::ResourceType,
};

/// Header names a sheet must carry to be converted
pub const REQUIRED_COLUMNS: &[&str] = &["卡池", "资源ID", "星级", "名称", "数量", "时间"];

/// Spreadsheet header name for a field
pub fn column_name(field: SourceField) -> Option<&'static str> {
    SPREADSHEET_COLUMNS
        .entries()
        .find(|(_, f)| **f == field)
        .map(|(name, _)| *name)
}

// ============================================================================
// Tracker JSON keys
// ============================================================================

/// Entry key -> field, as written by the tracker's JSON export
pub static TRACKER_KEYS: phf::Map<&'static str, SourceField> = phf_map! {
    "cardPoolType" => SourceField::Pool,
    "resourceId" => SourceField::ResourceId,
    "qualityLevel" => SourceField::Rarity,
    "name" => SourceField::Name,
    "count" => SourceField::Count,
    "time" => SourceField::Time,
    "resourceType" => SourceField::ResourceType,
};

/// Top-level array holding every entry of a tracker export
pub const TRACKER_PULLS_KEY: &str = "pulls";

/// Top-level keys carrying the player id, in lookup order
pub const UID_KEYS: &[&str] = &["playerId", "uid"];

/// Scalar top-level keys allowed next to pool groups
pub const METADATA_KEYS: &[&str] = &["playerId", "uid", "version", "date"];

// ============================================================================
// Pools
// ============================================================================

/// Pool labels used by the spreadsheet tool (and the game client)
pub static POOL_LABELS: phf::Map<&'static str, CardPoolType> = phf_map! {
    "角色活动唤取" => CardPoolType::CharacterEventWarp,
    "角色精准调谐" => CardPoolType::CharacterEventWarp,
    "武器活动唤取" => CardPoolType::WeaponEventWarp,
    "武器精准调谐" => CardPoolType::WeaponEventWarp,
    "角色常驻唤取" => CardPoolType::CharacterStandardWarp,
    "角色调谐（常驻池）" => CardPoolType::CharacterStandardWarp,
    "武器常驻唤取" => CardPoolType::WeaponStandardWarp,
    "武器调谐（常驻池）" => CardPoolType::WeaponStandardWarp,
    "新手唤取" => CardPoolType::BeginnerWarp,
    "新手调谐" => CardPoolType::BeginnerWarp,
    "新手自选唤取" => CardPoolType::BeginnerChoiceWarp,
    "新手自选唤取（感恩定向唤取）" => CardPoolType::GivebackCustomWarp,
    "感恩定向唤取" => CardPoolType::GivebackCustomWarp,
};

/// Resolve a pool from a label, a canonical name or a tracker id string
pub fn pool_by_label(label: &str) -> Option<CardPoolType> {
    let label = label.trim();
    POOL_LABELS
        .get(label)
        .copied()
        .or_else(|| CardPoolType::from_name(label))
        .or_else(|| {
            label
                .parse::<i64>()
                .ok()
                .and_then(CardPoolType::from_tracker_id)
        })
}

// ============================================================================
// Rarity
// ============================================================================

/// Lowest and highest rarity tier a draw can have
pub const MIN_QUALITY: u8 = 3;
pub const MAX_QUALITY: u8 = 5;

/// Textual rarity spellings -> tier
pub static RARITY_LABELS: phf::Map<&'static str, u8> = phf_map! {
    "3" => 3,
    "4" => 4,
    "5" => 5,
    "3星" => 3,
    "4星" => 4,
    "5星" => 5,
    "三星" => 3,
    "四星" => 4,
    "五星" => 5,
    "★★★" => 3,
    "★★★★" => 4,
    "★★★★★" => 5,
};

/// Get the tier for a numeric rarity, if it is a valid one
pub fn quality_by_tier(tier: i64) -> Option<u8> {
    u8::try_from(tier)
        .ok()
        .filter(|t| (MIN_QUALITY..=MAX_QUALITY).contains(t))
}

pub fn quality_by_label(label: &str) -> Option<u8> {
    RARITY_LABELS.get(label.trim()).copied()
}

// ============================================================================
// Timestamps
// ============================================================================

/// Naive formats accepted for textual draw times, tried in order.
/// RFC 3339 with an offset is tried after these.
pub const INPUT_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

// ============================================================================
// Export info
// ============================================================================

/// Values of the `info` block in the export layout, as expected by the importer
pub const EXPORT_APP: &str = "WutheringWavesUID";
pub const EXPORT_APP_VERSION: &str = "2.0.1";
pub const EXPORT_VERSION: &str = "v2.0";
pub const UNKNOWN_UID: &str = "unknown";
