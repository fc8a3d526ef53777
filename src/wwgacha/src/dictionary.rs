//! JSON dictionary converter.
//!
//! Two layouts are understood:
//!
//! - the tracker export, `{"playerId": ..., "pulls": [entry, ...]}`
//! - a pool-keyed dictionary, `{"1": [entry, ...], "角色常驻唤取": [...]}`,
//!   where entries without their own pool take the group key
//!
//! The shape is also what identifies a file as convertible, so a document
//! that matches neither is rejected as a whole.

use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::conversion::{MalformedInputError, RowFailure, RowLocation};
use crate::normalize::{self, FieldMappingError, RawField, SourceRecord};
use crate::record::DrawRecord;
use crate::reference::{self, METADATA_KEYS, TRACKER_KEYS, TRACKER_PULLS_KEY, UID_KEYS};

/// Extension handled by this converter (lowercase, without the dot)
pub const JSON_EXTENSION: &str = "json";

/// Recognised top-level layout of a JSON document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    TrackerExport,
    PoolKeyed,
}

/// Check whether a document has one of the supported layouts
pub fn detect_shape(doc: &Value) -> Result<JsonShape, MalformedInputError> {
    let Value::Object(map) = doc else {
        return Err(unsupported("top level is not an object"));
    };

    if let Some(pulls) = map.get(TRACKER_PULLS_KEY) {
        return if pulls.is_array() {
            Ok(JsonShape::TrackerExport)
        } else {
            Err(unsupported(format!("`{}` is not an array", TRACKER_PULLS_KEY)))
        };
    }

    let mut groups = 0;
    for (key, value) in map {
        if METADATA_KEYS.contains(&key.as_str()) {
            if value.is_array() || value.is_object() {
                return Err(unsupported(format!("`{}` is not a scalar", key)));
            }
        } else if reference::pool_by_label(key).is_some() {
            if !value.is_array() {
                return Err(unsupported(format!("pool `{}` is not an array", key)));
            }
            groups += 1;
        } else {
            return Err(unsupported(format!("unexpected key `{}`", key)));
        }
    }

    if groups == 0 {
        return Err(unsupported("no pool groups"));
    }
    Ok(JsonShape::PoolKeyed)
}

fn unsupported(reason: impl Into<String>) -> MalformedInputError {
    MalformedInputError::UnsupportedShape(reason.into())
}

/// One array of entries and the key it was found under
#[derive(Debug)]
struct EntryGroup {
    key: String,
    /// Pool applied to entries that do not name their own
    default_pool: Option<String>,
    entries: std::iter::Enumerate<std::vec::IntoIter<Value>>,
}

/// Lazy, single-pass stream of the draws in a JSON document, in document order
#[derive(Debug)]
pub struct DictionaryRecords {
    uid: Option<String>,
    shape: JsonShape,
    groups: std::vec::IntoIter<EntryGroup>,
    current: Option<EntryGroup>,
}

impl DictionaryRecords {
    /// Build the stream from a parsed document
    pub fn from_value(doc: Value) -> Result<Self, MalformedInputError> {
        let shape = detect_shape(&doc)?;
        let Value::Object(map) = doc else {
            return Err(unsupported("top level is not an object"));
        };

        let uid = find_uid(&map);
        let mut groups = Vec::new();
        for (key, value) in map {
            let Value::Array(entries) = value else {
                continue;
            };
            let default_pool = match shape {
                JsonShape::TrackerExport if key != TRACKER_PULLS_KEY => continue,
                JsonShape::TrackerExport => None,
                JsonShape::PoolKeyed => Some(key.clone()),
            };
            groups.push(EntryGroup {
                key,
                default_pool,
                entries: entries.into_iter().enumerate(),
            });
        }

        Ok(DictionaryRecords {
            uid,
            shape,
            groups: groups.into_iter(),
            current: None,
        })
    }

    /// Player id from the document's metadata
    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    pub fn shape(&self) -> JsonShape {
        self.shape
    }
}

impl Iterator for DictionaryRecords {
    type Item = Result<DrawRecord, RowFailure>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(group) = &mut self.current {
                if let Some((index, entry)) = group.entries.next() {
                    let location = RowLocation::Entry {
                        group: group.key.clone(),
                        index,
                    };
                    return Some(
                        convert_entry(entry, group.default_pool.as_deref())
                            .map_err(|error| RowFailure { location, error }),
                    );
                }
            }
            self.current = Some(self.groups.next()?);
        }
    }
}

/// Read and parse a JSON file
pub fn open(path: &Path) -> Result<DictionaryRecords, MalformedInputError> {
    let doc = read_document(path)?;
    DictionaryRecords::from_value(doc)
}

/// Load a JSON file into a document tree
pub fn read_document(path: &Path) -> Result<Value, MalformedInputError> {
    let data = fs::read(path).map_err(|source| MalformedInputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&data)?)
}

fn find_uid(map: &Map<String, Value>) -> Option<String> {
    UID_KEYS.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn convert_entry(entry: Value, default_pool: Option<&str>) -> Result<DrawRecord, FieldMappingError> {
    let Value::Object(fields) = entry else {
        return Err(FieldMappingError::NotAnObject);
    };

    let mut source = SourceRecord::default();
    for (key, value) in fields {
        if let Some(field) = TRACKER_KEYS.get(key.as_str()) {
            source.set(*field, json_to_raw(value));
        }
    }

    if source.pool.is_empty() {
        if let Some(pool) = default_pool {
            source.pool = RawField::text(pool);
        }
    }
    // The tracker leaves out `count` for single draws
    if source.count.is_empty() {
        source.count = RawField::Integer(1);
    }

    normalize::normalize(source)
}

fn json_to_raw(value: Value) -> RawField {
    match value {
        Value::Null => RawField::Empty,
        Value::Bool(b) => RawField::Text(b.to_string()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => RawField::Integer(i),
            None => n.as_f64().map_or(RawField::Empty, RawField::Float),
        },
        Value::String(s) => RawField::text(s),
        other => RawField::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CardPoolType;
    use crate::reference::SourceField;
    use serde_json::json;

    fn tracker_doc() -> Value {
        json!({
            "version": "1.0",
            "date": "2024-07-01",
            "playerId": "100000001",
            "pulls": [
                {
                    "cardPoolType": 1,
                    "resourceId": 1405,
                    "qualityLevel": 5,
                    "resourceType": "Resonator",
                    "name": "Jiyan",
                    "time": "2024-01-01T10:00:00.000Z"
                },
                {
                    "cardPoolType": 2,
                    "resourceId": 21050016,
                    "qualityLevel": 5,
                    "resourceType": "Weapon",
                    "name": "Verdant Summit",
                    "count": 1,
                    "time": "2024-01-01 10:05:00"
                }
            ]
        })
    }

    #[test]
    fn test_detect_shapes() {
        assert_eq!(detect_shape(&tracker_doc()).unwrap(), JsonShape::TrackerExport);
        assert_eq!(
            detect_shape(&json!({"1": [], "playerId": 5})).unwrap(),
            JsonShape::PoolKeyed
        );
        assert_eq!(
            detect_shape(&json!({"角色常驻唤取": [], "WeaponEventWarp": []})).unwrap(),
            JsonShape::PoolKeyed
        );
    }

    #[test]
    fn test_rejects_unsupported_shapes() {
        let rejected = [
            json!([{"cardPoolType": 1}]),
            json!({"pulls": {}}),
            json!({"playerId": "1"}),
            json!({"info": {"uid": "1"}, "list": []}),
            json!({"1": [], "extra": []}),
            json!({"1": {"time": "x"}}),
            json!({"1": [], "uid": ["nested"]}),
            json!("text"),
        ];
        for doc in rejected {
            assert!(
                matches!(detect_shape(&doc), Err(MalformedInputError::UnsupportedShape(_))),
                "accepted {doc}"
            );
            assert!(DictionaryRecords::from_value(doc).is_err());
        }
    }

    #[test]
    fn test_tracker_export() {
        let records = DictionaryRecords::from_value(tracker_doc()).unwrap();
        assert_eq!(records.uid(), Some("100000001"));
        assert_eq!(records.shape(), JsonShape::TrackerExport);

        let converted: Vec<DrawRecord> = records.map(Result::unwrap).collect();
        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].card_pool_type, CardPoolType::CharacterEventWarp);
        assert_eq!(converted[0].name, "Jiyan");
        assert_eq!(converted[0].count, 1);
        assert_eq!(converted[0].time_string(), "2024-01-01 10:00:00");
        assert_eq!(converted[1].card_pool_type, CardPoolType::WeaponEventWarp);
    }

    #[test]
    fn test_pool_keyed_groups_in_document_order() {
        let doc = json!({
            "uid": 200000002,
            "新手唤取": [
                {"resourceId": 1501, "qualityLevel": 5, "name": "漂泊者", "time": "2024-02-01 00:00:00"},
                {"cardPoolType": 6, "resourceId": 1601, "qualityLevel": 4, "name": "桃祈", "time": "2024-02-01 00:00:01"}
            ],
            "3": [
                {"resourceId": 1301, "qualityLevel": 5, "name": "卡卡罗", "time": "2024-03-01 00:00:00"}
            ]
        });
        let records = DictionaryRecords::from_value(doc).unwrap();
        assert_eq!(records.uid(), Some("200000002"));

        let pools: Vec<CardPoolType> = records.map(|r| r.unwrap().card_pool_type).collect();
        assert_eq!(
            pools,
            vec![
                CardPoolType::BeginnerWarp,
                CardPoolType::BeginnerChoiceWarp,
                CardPoolType::CharacterStandardWarp,
            ]
        );
    }

    #[test]
    fn test_oversized_id_fails_entry() {
        let doc = json!({
            "pulls": [
                {"cardPoolType": 1, "resourceId": u64::MAX, "qualityLevel": 5, "name": "Jiyan", "time": "2024-01-01 10:00:00"}
            ]
        });
        let results: Vec<_> = DictionaryRecords::from_value(doc).unwrap().collect();
        let failure = results[0].as_ref().unwrap_err();
        assert!(matches!(
            failure.error,
            FieldMappingError::InvalidInteger {
                field: SourceField::ResourceId,
                ..
            }
        ));
    }

    #[test]
    fn test_bad_entries_fail_alone() {
        let doc = json!({
            "pulls": [
                {"cardPoolType": 1, "resourceId": 1405, "qualityLevel": 5, "name": "Jiyan", "time": "2024-01-01 10:00:00"},
                {"cardPoolType": 42, "resourceId": 1405, "qualityLevel": 5, "name": "Jiyan", "time": "2024-01-01 10:00:00"},
                "not an entry",
                {"cardPoolType": 1, "qualityLevel": 5, "name": "Jiyan", "time": "2024-01-01 10:00:00"},
                {"cardPoolType": 1, "resourceId": 1405, "qualityLevel": 5, "name": "Jiyan", "time": "soon"}
            ]
        });
        let results: Vec<_> = DictionaryRecords::from_value(doc).unwrap().collect();
        assert_eq!(results.len(), 5);
        assert!(results[0].is_ok());

        let errors: Vec<(String, FieldMappingError)> = results[1..]
            .iter()
            .map(|r| {
                let f = r.as_ref().unwrap_err();
                (f.location.to_string(), f.error.clone())
            })
            .collect();
        assert_eq!(
            errors,
            vec![
                ("pulls[1]".to_string(), FieldMappingError::UnknownPool("42".to_string())),
                ("pulls[2]".to_string(), FieldMappingError::NotAnObject),
                (
                    "pulls[3]".to_string(),
                    FieldMappingError::MissingField(SourceField::ResourceId)
                ),
                ("pulls[4]".to_string(), FieldMappingError::InvalidTime("soon".to_string())),
            ]
        );
    }

    #[test]
    fn test_open_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wuwatracker.json");
        fs::write(&path, serde_json::to_vec(&tracker_doc()).unwrap()).unwrap();

        let records = open(&path).unwrap();
        assert_eq!(records.count(), 2);
    }

    #[test]
    fn test_open_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, b"{\"pulls\": [").unwrap();

        assert!(matches!(open(&path), Err(MalformedInputError::Json(_))));
    }
}
