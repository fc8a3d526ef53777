//! Canonical draw record.
//!
//! This is the shape the downstream import tool reads. Both converters
//! produce exactly this type, so equal draws serialize to equal bytes
//! regardless of the file they came from.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp format used for every `time` field in the output.
pub const OUTPUT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convene banner category.
///
/// Variant names are the canonical vocabulary written to `cardPoolType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardPoolType {
    CharacterEventWarp,
    WeaponEventWarp,
    CharacterStandardWarp,
    WeaponStandardWarp,
    BeginnerWarp,
    BeginnerChoiceWarp,
    GivebackCustomWarp,
}

impl CardPoolType {
    /// All pool types in tracker id order
    pub const ALL: [CardPoolType; 7] = [
        CardPoolType::CharacterEventWarp,
        CardPoolType::WeaponEventWarp,
        CardPoolType::CharacterStandardWarp,
        CardPoolType::WeaponStandardWarp,
        CardPoolType::BeginnerWarp,
        CardPoolType::BeginnerChoiceWarp,
        CardPoolType::GivebackCustomWarp,
    ];

    /// Canonical name, as serialized
    pub fn name(self) -> &'static str {
        match self {
            CardPoolType::CharacterEventWarp => "CharacterEventWarp",
            CardPoolType::WeaponEventWarp => "WeaponEventWarp",
            CardPoolType::CharacterStandardWarp => "CharacterStandardWarp",
            CardPoolType::WeaponStandardWarp => "WeaponStandardWarp",
            CardPoolType::BeginnerWarp => "BeginnerWarp",
            CardPoolType::BeginnerChoiceWarp => "BeginnerChoiceWarp",
            CardPoolType::GivebackCustomWarp => "GivebackCustomWarp",
        }
    }

    /// Numeric id used by the tracker's `cardPoolType` field
    pub fn tracker_id(self) -> i64 {
        match self {
            CardPoolType::CharacterEventWarp => 1,
            CardPoolType::WeaponEventWarp => 2,
            CardPoolType::CharacterStandardWarp => 3,
            CardPoolType::WeaponStandardWarp => 4,
            CardPoolType::BeginnerWarp => 5,
            CardPoolType::BeginnerChoiceWarp => 6,
            CardPoolType::GivebackCustomWarp => 7,
        }
    }

    pub fn from_tracker_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.tracker_id() == id)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for CardPoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One normalized convene draw.
///
/// Field order is the output key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawRecord {
    pub card_pool_type: CardPoolType,
    pub resource_id: i64,
    pub quality_level: u8,
    pub name: String,
    pub count: u32,
    #[serde(with = "draw_time")]
    pub time: NaiveDateTime,
}

impl DrawRecord {
    /// Draw time rendered in the output format
    pub fn time_string(&self) -> String {
        self.time.format(OUTPUT_TIME_FORMAT).to_string()
    }
}

mod draw_time {
    use super::OUTPUT_TIME_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(OUTPUT_TIME_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, OUTPUT_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}
