//! Source record normalization.
//!
//! Converters only pull raw values out of their container format into a
//! [`SourceRecord`]. Everything that interprets those values (vocabularies,
//! number coercion, timestamp formats) happens here, so the two input formats
//! cannot drift apart.

use chrono::{DateTime, NaiveDateTime, Timelike};
use thiserror::Error;

use crate::record::{CardPoolType, DrawRecord};
use crate::reference::{self, SourceField};

/// Why a single row or entry could not be mapped to a draw record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldMappingError {
    #[error("missing value for {0}")]
    MissingField(SourceField),

    #[error("unknown card pool {0:?}")]
    UnknownPool(String),

    #[error("unknown rarity {0:?}")]
    UnknownRarity(String),

    #[error("{field} is not an integer: {value:?}")]
    InvalidInteger { field: SourceField, value: String },

    #[error("count must be a positive integer, got {0}")]
    InvalidCount(i64),

    #[error("unparseable time {0:?}")]
    InvalidTime(String),

    #[error("entry is not an object")]
    NotAnObject,
}

/// A value as found in the source file, before interpretation
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawField {
    #[default]
    Empty,
    Text(String),
    Integer(i64),
    Float(f64),
    DateTime(NaiveDateTime),
}

impl RawField {
    /// Build a text value, mapping blank strings to `Empty`
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            RawField::Empty
        } else {
            RawField::Text(s)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RawField::Empty)
    }

    /// Render the value for error messages
    pub fn describe(&self) -> String {
        match self {
            RawField::Empty => String::new(),
            RawField::Text(s) => s.clone(),
            RawField::Integer(n) => n.to_string(),
            RawField::Float(f) => f.to_string(),
            RawField::DateTime(dt) => dt.to_string(),
        }
    }

    /// Integer value of numbers and numeric text; `None` for anything else
    fn as_integer(&self) -> Option<i64> {
        match self {
            RawField::Integer(n) => Some(*n),
            RawField::Float(f)
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
            {
                Some(*f as i64)
            }
            RawField::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Field-extracted record, one per source row or entry
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceRecord {
    pub pool: RawField,
    pub resource_id: RawField,
    pub rarity: RawField,
    pub name: RawField,
    pub count: RawField,
    pub time: RawField,
}

impl SourceRecord {
    /// Store a value under its field. Fields without an output slot are dropped.
    pub fn set(&mut self, field: SourceField, value: RawField) {
        match field {
            SourceField::Pool => self.pool = value,
            SourceField::ResourceId => self.resource_id = value,
            SourceField::Rarity => self.rarity = value,
            SourceField::Name => self.name = value,
            SourceField::Count => self.count = value,
            SourceField::Time => self.time = value,
            SourceField::ResourceType => {}
        }
    }
}

/// Map a source record onto the canonical draw record
pub fn normalize(source: SourceRecord) -> Result<DrawRecord, FieldMappingError> {
    Ok(DrawRecord {
        card_pool_type: card_pool_type(&source.pool)?,
        resource_id: integer(SourceField::ResourceId, &source.resource_id)?,
        quality_level: quality_level(&source.rarity)?,
        name: name(source.name)?,
        count: count(&source.count)?,
        time: draw_time(&source.time)?,
    })
}

fn card_pool_type(raw: &RawField) -> Result<CardPoolType, FieldMappingError> {
    let pool = match raw {
        RawField::Empty => return Err(FieldMappingError::MissingField(SourceField::Pool)),
        RawField::Text(s) => reference::pool_by_label(s),
        other => other.as_integer().and_then(CardPoolType::from_tracker_id),
    };
    pool.ok_or_else(|| FieldMappingError::UnknownPool(raw.describe()))
}

fn integer(field: SourceField, raw: &RawField) -> Result<i64, FieldMappingError> {
    if raw.is_empty() {
        return Err(FieldMappingError::MissingField(field));
    }
    raw.as_integer()
        .ok_or_else(|| FieldMappingError::InvalidInteger {
            field,
            value: raw.describe(),
        })
}

fn quality_level(raw: &RawField) -> Result<u8, FieldMappingError> {
    let tier = match raw {
        RawField::Empty => return Err(FieldMappingError::MissingField(SourceField::Rarity)),
        RawField::Text(s) => reference::quality_by_label(s),
        other => other.as_integer().and_then(reference::quality_by_tier),
    };
    tier.ok_or_else(|| FieldMappingError::UnknownRarity(raw.describe()))
}

fn name(raw: RawField) -> Result<String, FieldMappingError> {
    match raw {
        RawField::Text(s) => Ok(s.trim().to_string()),
        RawField::Integer(n) => Ok(n.to_string()),
        RawField::Empty => Err(FieldMappingError::MissingField(SourceField::Name)),
        other => Ok(other.describe()),
    }
}

fn count(raw: &RawField) -> Result<u32, FieldMappingError> {
    let n = integer(SourceField::Count, raw)?;
    u32::try_from(n)
        .ok()
        .filter(|c| *c >= 1)
        .ok_or(FieldMappingError::InvalidCount(n))
}

fn draw_time(raw: &RawField) -> Result<NaiveDateTime, FieldMappingError> {
    match raw {
        RawField::Empty => Err(FieldMappingError::MissingField(SourceField::Time)),
        RawField::DateTime(dt) => Ok(truncate_subsec(*dt)),
        RawField::Text(s) => {
            parse_time(s).ok_or_else(|| FieldMappingError::InvalidTime(s.clone()))
        }
        other => Err(FieldMappingError::InvalidTime(other.describe())),
    }
}

/// Parse a textual draw time in any of the accepted source formats.
///
/// Times carrying an offset keep their wall-clock value in that offset.
pub fn parse_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    reference::INPUT_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.naive_local())
        })
        .map(truncate_subsec)
}

fn truncate_subsec(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn valid_source() -> SourceRecord {
        SourceRecord {
            pool: RawField::text("角色活动唤取"),
            resource_id: RawField::Integer(1405),
            rarity: RawField::Integer(5),
            name: RawField::text("鉴心"),
            count: RawField::Integer(1),
            time: RawField::text("2024-01-01 10:00:00"),
        }
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_normalize_concrete_row() {
        let record = normalize(valid_source()).unwrap();
        assert_eq!(record.card_pool_type, CardPoolType::CharacterEventWarp);
        assert_eq!(record.resource_id, 1405);
        assert_eq!(record.quality_level, 5);
        assert_eq!(record.name, "鉴心");
        assert_eq!(record.count, 1);
        assert_eq!(record.time_string(), "2024-01-01 10:00:00");
    }

    #[test]
    fn test_numeric_coercion() {
        let source = SourceRecord {
            pool: RawField::Float(2.0),
            resource_id: RawField::text(" 21050016 "),
            rarity: RawField::Float(4.0),
            count: RawField::text("1"),
            ..valid_source()
        };
        let record = normalize(source).unwrap();
        assert_eq!(record.card_pool_type, CardPoolType::WeaponEventWarp);
        assert_eq!(record.resource_id, 21050016);
        assert_eq!(record.quality_level, 4);
    }

    #[test]
    fn test_unknown_rarity() {
        let source = SourceRecord {
            rarity: RawField::Integer(6),
            ..valid_source()
        };
        assert_eq!(
            normalize(source),
            Err(FieldMappingError::UnknownRarity("6".to_string()))
        );

        let source = SourceRecord {
            rarity: RawField::Float(4.5),
            ..valid_source()
        };
        assert!(matches!(
            normalize(source),
            Err(FieldMappingError::UnknownRarity(_))
        ));
    }

    #[test]
    fn test_unknown_pool_is_not_defaulted() {
        let source = SourceRecord {
            pool: RawField::text("限定唤取"),
            ..valid_source()
        };
        assert_eq!(
            normalize(source),
            Err(FieldMappingError::UnknownPool("限定唤取".to_string()))
        );

        let source = SourceRecord {
            pool: RawField::Integer(99),
            ..valid_source()
        };
        assert_eq!(
            normalize(source),
            Err(FieldMappingError::UnknownPool("99".to_string()))
        );
    }

    #[test]
    fn test_missing_fields() {
        let source = SourceRecord {
            name: RawField::text("   "),
            ..valid_source()
        };
        assert_eq!(
            normalize(source),
            Err(FieldMappingError::MissingField(SourceField::Name))
        );

        let source = SourceRecord {
            time: RawField::Empty,
            ..valid_source()
        };
        assert_eq!(
            normalize(source),
            Err(FieldMappingError::MissingField(SourceField::Time))
        );
    }

    #[test]
    fn test_invalid_count() {
        let source = SourceRecord {
            count: RawField::Integer(0),
            ..valid_source()
        };
        assert_eq!(normalize(source), Err(FieldMappingError::InvalidCount(0)));

        let source = SourceRecord {
            count: RawField::text("one"),
            ..valid_source()
        };
        assert!(matches!(
            normalize(source),
            Err(FieldMappingError::InvalidInteger {
                field: SourceField::Count,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_time_formats() {
        let expected = at(2024, 5, 23, 9, 12, 45);
        assert_eq!(parse_time("2024-05-23 09:12:45"), Some(expected));
        assert_eq!(parse_time("2024/05/23 09:12:45"), Some(expected));
        assert_eq!(parse_time("2024-05-23T09:12:45"), Some(expected));
        assert_eq!(parse_time("2024-05-23 09:12:45.250"), Some(expected));
        assert_eq!(parse_time("2024-05-23T09:12:45.000Z"), Some(expected));
        assert_eq!(parse_time("2024-05-23T09:12:45+08:00"), Some(expected));
        assert_eq!(parse_time("2024-05-23 09:12"), Some(at(2024, 5, 23, 9, 12, 0)));
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert_eq!(parse_time("yesterday"), None);
        assert_eq!(parse_time("2024-13-01 00:00:00"), None);
        assert_eq!(parse_time("01/02/2024"), None);
    }

    #[test]
    fn test_out_of_range_float_is_not_an_integer() {
        let source = SourceRecord {
            resource_id: RawField::Float(1e20),
            ..valid_source()
        };
        assert_eq!(
            normalize(source),
            Err(FieldMappingError::InvalidInteger {
                field: SourceField::ResourceId,
                value: RawField::Float(1e20).describe(),
            })
        );

        let source = SourceRecord {
            count: RawField::Float(-1e19),
            ..valid_source()
        };
        assert!(matches!(
            normalize(source),
            Err(FieldMappingError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn test_datetime_cell_is_truncated() {
        let with_millis = at(2024, 1, 1, 10, 0, 0)
            .with_nanosecond(500_000_000)
            .unwrap();
        let source = SourceRecord {
            time: RawField::DateTime(with_millis),
            ..valid_source()
        };
        assert_eq!(normalize(source).unwrap().time_string(), "2024-01-01 10:00:00");
    }

    #[test]
    fn test_numeric_time_rejected() {
        let source = SourceRecord {
            time: RawField::Float(45292.4166),
            ..valid_source()
        };
        assert!(matches!(
            normalize(source),
            Err(FieldMappingError::InvalidTime(_))
        ));
    }
}
