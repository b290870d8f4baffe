//! Firestore REST value encoding.
//!
//! Documents arrive as `{"name": ".../documents/<coll>/<id>", "fields": {...}}`
//! where each field is a single-key typed object such as
//! `{"stringValue": "Rex"}` or `{"integerValue": "50"}` (64-bit integers are
//! sent as strings).

use serde_json::{Map, Value, json};

use crate::character::{Character, ScoreRecord};
use crate::error::GameError;
use crate::geometry::ScenePoint;

type Fields = Map<String, Value>;

fn fields(doc: &Value) -> Result<&Fields, GameError> {
    doc.get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| GameError::Decode("document has no fields".into()))
}

/// Last path segment of the document resource name.
pub fn document_id(doc: &Value) -> Option<&str> {
    doc.get("name")?.as_str()?.rsplit('/').next()
}

fn string_field<'a>(fields: &'a Fields, key: &str) -> Option<&'a str> {
    fields.get(key)?.get("stringValue")?.as_str()
}

fn integer_value(value: &Value) -> Option<i64> {
    if let Some(raw) = value.get("integerValue") {
        return match raw {
            Value::String(s) => s.parse().ok(),
            other => other.as_i64(),
        };
    }
    let f = value.get("doubleValue")?.as_f64()?;
    // Only whole numbers inside the i64 range convert exactly.
    if f.fract() != 0.0 || !(i64::MIN as f64..i64::MAX as f64).contains(&f) {
        return None;
    }
    Some(f as i64)
}

fn axis(value: &Value, label: &str) -> Result<i32, GameError> {
    let raw = integer_value(value).ok_or_else(|| GameError::Decode(format!("bad {label} coordinate")))?;
    i32::try_from(raw).map_err(|_| GameError::Decode(format!("{label} coordinate {raw} out of range")))
}

fn bool_field(fields: &Fields, key: &str) -> Option<bool> {
    fields.get(key)?.get("booleanValue")?.as_bool()
}

fn coordinates(fields: &Fields) -> Result<ScenePoint, GameError> {
    let values = fields
        .get("coordinates")
        .and_then(|v| v.get("arrayValue"))
        .and_then(|v| v.get("values"))
        .and_then(Value::as_array)
        .ok_or_else(|| GameError::Decode("coordinates is not an array".into()))?;
    match values.as_slice() {
        [x, y] => Ok(ScenePoint::new(axis(x, "x")?, axis(y, "y")?)),
        _ => Err(GameError::Decode(format!(
            "coordinates must hold two values, got {}",
            values.len()
        ))),
    }
}

pub fn decode_character(doc: &Value) -> Result<Character, GameError> {
    let fields = fields(doc)?;
    let name = string_field(fields, "name")
        .or_else(|| document_id(doc))
        .ok_or_else(|| GameError::Decode("character has no name".into()))?;
    let mut character = Character::new(name, 0, 0);
    character.coordinates = coordinates(fields)?;
    character.found_status = bool_field(fields, "foundStatus").unwrap_or(false);
    Ok(character)
}

pub fn decode_score(doc: &Value) -> Result<ScoreRecord, GameError> {
    let fields = fields(doc)?;
    let name = string_field(fields, "name")
        .or_else(|| document_id(doc))
        .ok_or_else(|| GameError::Decode("score has no name".into()))?;
    let score = fields
        .get("score")
        .and_then(integer_value)
        .ok_or_else(|| GameError::Decode(format!("score for '{name}' is not a number")))?;
    let score = u32::try_from(score)
        .map_err(|_| GameError::Decode(format!("score for '{name}' out of range")))?;
    Ok(ScoreRecord::new(name, score))
}

/// Request body for creating a score document.
pub fn encode_score(record: &ScoreRecord) -> Value {
    json!({
        "fields": {
            "name": { "stringValue": record.name },
            "score": { "integerValue": record.score.to_string() },
        }
    })
}

/// `documents` of a list response; an empty collection omits the key.
pub fn list_documents(body: &Value) -> &[Value] {
    body.get("documents").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

/// Structured query for the fastest `limit` scores in `collection`.
pub fn leaders_query(collection: &str, limit: usize) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "orderBy": [{ "field": { "fieldPath": "score" }, "direction": "ASCENDING" }],
            "limit": limit,
        }
    })
}

/// `runQuery` answers with one entry per row; rows without a `document`
/// only carry read metadata.
pub fn query_documents(body: &Value) -> impl Iterator<Item = &Value> {
    body.as_array()
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .filter_map(|row| row.get("document"))
}
