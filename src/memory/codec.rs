//! JSON mapping for [`MemoryRecord`], shared by the server wire format and the
//! durable cache.
//!
//! Field names are snake_case (`date_added`, `image_url`) and the coordinate is
//! flattened into `latitude` / `longitude` keys. Local photo bytes never reach
//! the JSON form; only an uploaded `image_url` does.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::memory::types::{Coordinate, ImageRef, MemoryRecord, Rating, SyncStatus};

/// One record as a JSON object.
pub type WireRecord = Map<String, Value>;

/// Encode a record into its JSON object form.
pub fn encode(record: &MemoryRecord) -> WireRecord {
    let mut obj = Map::new();
    obj.insert("id".into(), Value::from(record.id.as_str()));
    obj.insert("name".into(), Value::from(record.name.as_str()));
    obj.insert("date_added".into(), Value::from(format_date(&record.date_added)));
    obj.insert("notes".into(), Value::from(record.notes.as_str()));
    obj.insert("rating".into(), Value::from(record.rating.get()));
    obj.insert("latitude".into(), Value::from(record.coordinate.latitude));
    obj.insert("longitude".into(), Value::from(record.coordinate.longitude));
    if let Some(url) = record.image_url() {
        obj.insert("image_url".into(), Value::from(url));
    }
    // The server never sends this key, so fetched records decode as synced.
    if record.sync_status != SyncStatus::Synced {
        obj.insert("sync_status".into(), Value::from(record.sync_status.as_str()));
    }
    obj
}

/// Decode one JSON value into a record.
pub fn decode(value: &Value) -> Result<MemoryRecord, DecodeError> {
    let obj = value.as_object().ok_or(DecodeError::TypeMismatch {
        field: "<record>",
        expected: "an object",
    })?;
    decode_object(obj)
}

/// Decode a whole collection, failing on the first bad element.
pub fn decode_all(values: &[Value]) -> Result<Vec<MemoryRecord>, DecodeError> {
    values.iter().map(decode).collect()
}

pub fn decode_object(obj: &WireRecord) -> Result<MemoryRecord, DecodeError> {
    let id = required_str(obj, "id")?.to_string();
    let name = required_str(obj, "name")?.to_string();
    let date_added = parse_date(required_str(obj, "date_added")?)?;
    let notes = required_str(obj, "notes")?.to_string();

    let stars = required(obj, "rating")?
        .as_i64()
        .ok_or(DecodeError::TypeMismatch {
            field: "rating",
            expected: "an integer",
        })?;
    let rating = u8::try_from(stars)
        .ok()
        .and_then(Rating::new)
        .ok_or(DecodeError::OutOfRange {
            field: "rating",
            value: stars as f64,
        })?;

    let latitude = required_f64(obj, "latitude")?;
    let longitude = required_f64(obj, "longitude")?;
    let coordinate = checked_coordinate(latitude, longitude)?;

    let image = match obj.get("image_url") {
        None | Some(Value::Null) => None,
        Some(Value::String(url)) => Some(ImageRef::Remote(url.clone())),
        Some(_) => {
            return Err(DecodeError::TypeMismatch {
                field: "image_url",
                expected: "a string",
            })
        }
    };

    let sync_status = match obj.get("sync_status") {
        None | Some(Value::Null) => SyncStatus::Synced,
        Some(Value::String(s)) => s.parse().map_err(|_| DecodeError::TypeMismatch {
            field: "sync_status",
            expected: "\"synced\" or \"pending_add\"",
        })?,
        Some(_) => {
            return Err(DecodeError::TypeMismatch {
                field: "sync_status",
                expected: "a string",
            })
        }
    };

    Ok(MemoryRecord {
        id,
        name,
        date_added,
        notes,
        rating,
        coordinate,
        image,
        sync_status,
    })
}

/// Format a timestamp as RFC 3339 in UTC, with only as many fractional digits as needed.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse `date_added`, trying each accepted encoding in order:
///
/// 1. RFC 3339 (`2025-08-16T10:15:30.123456Z`, `2025-08-16T10:15:30+02:00`),
///    with or without fractional seconds
/// 2. ISO-8601 with a colon-less offset (`2025-08-16T10:15:30+0200`)
/// 3. naive `YYYY-MM-DDTHH:MM:SS[.ffffff]`, read as UTC
pub fn parse_date(input: &str) -> Result<DateTime<Utc>, DecodeError> {
    let input = input.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Ok(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }

    Err(DecodeError::InvalidDate(input.to_string()))
}

/// Encode a coordinate as the ordered pair `[longitude, latitude]`.
///
/// Not used by [`encode`]; records always carry flattened keys.
pub fn coordinate_to_array(coordinate: &Coordinate) -> Value {
    Value::Array(vec![
        Value::from(coordinate.longitude),
        Value::from(coordinate.latitude),
    ])
}

/// Decode a `[longitude, latitude]` pair.
pub fn coordinate_from_array(value: &Value) -> Result<Coordinate, DecodeError> {
    let mismatch = DecodeError::TypeMismatch {
        field: "coordinate",
        expected: "a [longitude, latitude] array",
    };
    let pair = value.as_array().ok_or(mismatch.clone())?;
    match pair.as_slice() {
        [lon, lat] => {
            let longitude = lon.as_f64().ok_or(mismatch.clone())?;
            let latitude = lat.as_f64().ok_or(mismatch)?;
            checked_coordinate(latitude, longitude)
        }
        _ => Err(mismatch),
    }
}

fn checked_coordinate(latitude: f64, longitude: f64) -> Result<Coordinate, DecodeError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(DecodeError::OutOfRange {
            field: "latitude",
            value: latitude,
        });
    }
    Coordinate::new(latitude, longitude).ok_or(DecodeError::OutOfRange {
        field: "longitude",
        value: longitude,
    })
}

fn required<'a>(obj: &'a WireRecord, field: &'static str) -> Result<&'a Value, DecodeError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(DecodeError::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn required_str<'a>(obj: &'a WireRecord, field: &'static str) -> Result<&'a str, DecodeError> {
    required(obj, field)?
        .as_str()
        .ok_or(DecodeError::TypeMismatch {
            field,
            expected: "a string",
        })
}

fn required_f64(obj: &WireRecord, field: &'static str) -> Result<f64, DecodeError> {
    required(obj, field)?
        .as_f64()
        .ok_or(DecodeError::TypeMismatch {
            field,
            expected: "a number",
        })
}
