use chrono::DateTime;
use mongodb::bson::{oid::ObjectId, Bson};
use serde::{Deserialize, Deserializer};
use std::time::{SystemTime, UNIX_EPOCH};

// numeric timestamps above this are taken to be in milliseconds
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Get EPOCH timestamp in seconds
pub fn get_epoch_ts() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(n) => n.as_secs(),
        Err(_) => panic!("SystemTime before UNIX EPOCH!"),
    }
}

/// Parse the given value as ObjectId
pub fn parse_object_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id)
        .map_err(|err| tracing::debug!("not able to parse object id {id}: {:?}", err))
        .ok()
}

/// Deserialize helper for `_id` fields.
/// ObjectIds are returned as hex strings, string ids are kept as they are.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Option::<Bson>::deserialize(deserializer)?;
    let id = match val {
        Some(Bson::ObjectId(oid)) => Some(oid.to_hex()),
        Some(Bson::String(s)) if !s.is_empty() => Some(s),
        Some(Bson::Int32(n)) => Some(n.to_string()),
        Some(Bson::Int64(n)) => Some(n.to_string()),
        _ => None,
    };
    Ok(id)
}

/// Deserialize helper for timestamp fields written by different clients.
/// Accepts BSON datetimes, RFC 3339 strings and numeric epoch values
/// (seconds or milliseconds) and normalizes them to epoch seconds.
pub fn deserialize_ts<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Option::<Bson>::deserialize(deserializer)?;
    Ok(val.and_then(|val| bson_to_epoch_secs(&val)))
}

fn bson_to_epoch_secs(val: &Bson) -> Option<u64> {
    let secs = match val {
        Bson::DateTime(dt) => dt.timestamp_millis() / 1000,
        Bson::Int32(n) => i64::from(*n),
        Bson::Int64(n) => normalize_epoch(*n),
        Bson::Double(n) => normalize_epoch(*n as i64),
        Bson::String(s) => DateTime::parse_from_rfc3339(s).ok()?.timestamp(),
        _ => return None,
    };
    u64::try_from(secs).ok()
}

fn normalize_epoch(n: i64) -> i64 {
    if n > MILLIS_THRESHOLD {
        n / 1000
    } else {
        n
    }
}
