//! Response types for the statistics service
//!
//! The transport is sloppy about scalar types: numeric fields may arrive
//! as JSON strings and timestamps as either epoch numbers or ISO strings.
//! Every field that crosses that boundary goes through a coercing
//! deserializer here, so the rest of the crate only ever sees `i64`
//! epoch milliseconds and `f64`/`u64` counts.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::timeutil;

/// Metadata block attached to access-stats responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessMeta {
    /// Earliest timestamp with any data, epoch ms
    #[serde(rename = "availableMin", default, deserialize_with = "de_opt_ts")]
    pub available_min: Option<i64>,

    /// Latest timestamp with any data, epoch ms
    #[serde(rename = "availableMax", default, deserialize_with = "de_opt_ts")]
    pub available_max: Option<i64>,

    /// Category set observed in this particular fetch
    #[serde(default)]
    pub types: Vec<String>,
}

/// One fetched window of binned access counts
#[derive(Debug, Clone, Deserialize)]
pub struct AccessResponse {
    #[serde(default)]
    pub meta: AccessMeta,

    /// Bin start timestamps; required, coerced to epoch ms
    #[serde(deserialize_with = "de_ts_vec")]
    pub bins: Vec<i64>,

    /// Per-category counts, parallel to `bins`
    #[serde(rename = "countsByType", default, deserialize_with = "de_series_map")]
    pub counts_by_type: BTreeMap<String, Vec<f64>>,

    /// Total counts across categories, parallel to `bins`
    #[serde(default, deserialize_with = "de_f64_vec")]
    pub total: Vec<f64>,
}

/// Aggregate counters from the summary endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryResponse {
    #[serde(rename = "totalHits", default, deserialize_with = "de_flex_u64")]
    pub total_hits: u64,

    #[serde(rename = "uniqueUsers", default, deserialize_with = "de_flex_u64")]
    pub unique_users: u64,

    #[serde(rename = "uniqueGroups", default, deserialize_with = "de_flex_u64")]
    pub unique_groups: u64,

    #[serde(rename = "totalByType", default, deserialize_with = "de_u64_map")]
    pub total_by_type: BTreeMap<String, u64>,

    #[serde(rename = "availableMin", default, deserialize_with = "de_opt_ts")]
    pub available_min: Option<i64>,

    #[serde(rename = "availableMax", default, deserialize_with = "de_opt_ts")]
    pub available_max: Option<i64>,

    #[serde(rename = "generatedAt", default, deserialize_with = "de_opt_ts")]
    pub generated_at: Option<i64>,
}

/// Outage/load statistics for one scope (global or a single area)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsightStats {
    /// Busiest day, epoch ms at midnight UTC
    #[serde(rename = "maxDay", default, deserialize_with = "de_opt_ts")]
    pub max_day: Option<i64>,

    #[serde(rename = "maxDayCount", default, deserialize_with = "de_flex_u64")]
    pub max_day_count: u64,

    #[serde(rename = "outageCount", default, deserialize_with = "de_flex_u64")]
    pub outage_count: u64,

    #[serde(rename = "longestOutageSec", default, deserialize_with = "de_flex_u64")]
    pub longest_outage_sec: u64,

    #[serde(rename = "totalOutageSec", default, deserialize_with = "de_flex_u64")]
    pub total_outage_sec: u64,

    #[serde(rename = "uptimePct", default, deserialize_with = "de_flex_f64")]
    pub uptime_pct: f64,
}

/// Global and per-area insight statistics
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsightsResponse {
    #[serde(default)]
    pub global: InsightStats,

    #[serde(default)]
    pub areas: BTreeMap<String, InsightStats>,
}

/// One light on/off transition
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LightEvent {
    #[serde(deserialize_with = "de_ts")]
    pub ts: i64,
    pub on: bool,
}

/// Ordered on/off event streams per area
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LightsResponse {
    #[serde(default)]
    pub areas: BTreeMap<String, Vec<LightEvent>>,
}

/// Coerce a JSON value into epoch milliseconds
fn value_to_ts_ms(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_f64().and_then(timeutil::coerce_epoch_ms),
        Value::String(s) => timeutil::parse_timestamp_str(s),
        _ => None,
    }
}

/// Coerce a JSON value into a float, tolerating stringified numbers
fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn de_flex_f64<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(de)?;
    value_to_f64(&value).ok_or_else(|| serde::de::Error::custom("expected a number"))
}

fn de_flex_u64<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    de_flex_f64(de).map(|n| n.max(0.0).round() as u64)
}

fn de_ts<'de, D: Deserializer<'de>>(de: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(de)?;
    value_to_ts_ms(&value).ok_or_else(|| serde::de::Error::custom("expected a timestamp"))
}

fn de_opt_ts<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i64>, D::Error> {
    // Lenient: null or unparseable metadata degrades to "unknown"
    let value = Value::deserialize(de)?;
    Ok(value_to_ts_ms(&value))
}

fn de_ts_vec<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<i64>, D::Error> {
    let values = Vec::<Value>::deserialize(de)?;
    values
        .iter()
        .map(|v| value_to_ts_ms(v).ok_or_else(|| serde::de::Error::custom("bad timestamp in bins")))
        .collect()
}

fn de_f64_vec<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<f64>, D::Error> {
    let values = Vec::<Value>::deserialize(de)?;
    values
        .iter()
        .map(|v| value_to_f64(v).ok_or_else(|| serde::de::Error::custom("bad count value")))
        .collect()
}

fn de_series_map<'de, D: Deserializer<'de>>(
    de: D,
) -> Result<BTreeMap<String, Vec<f64>>, D::Error> {
    let raw = BTreeMap::<String, Vec<Value>>::deserialize(de)?;
    raw.into_iter()
        .map(|(key, values)| {
            let counts = values
                .iter()
                .map(|v| {
                    value_to_f64(v)
                        .ok_or_else(|| serde::de::Error::custom("bad count in countsByType"))
                })
                .collect::<Result<Vec<f64>, D::Error>>()?;
            Ok((key, counts))
        })
        .collect()
}

fn de_u64_map<'de, D: Deserializer<'de>>(de: D) -> Result<BTreeMap<String, u64>, D::Error> {
    let raw = BTreeMap::<String, Value>::deserialize(de)?;
    raw.into_iter()
        .map(|(key, value)| {
            let count = value_to_f64(&value)
                .ok_or_else(|| serde::de::Error::custom("bad count in totalByType"))?;
            Ok((key, count.max(0.0).round() as u64))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_response_coerces_string_numerics() {
        let body = r#"{
            "meta": { "availableMin": "2024-01-01T00:00:00Z", "availableMax": 1705329000, "types": ["cmd", "chat"] },
            "bins": ["1705320000", 1705320060000],
            "countsByType": { "cmd": ["3", 4.0], "chat": [1, "2"] },
            "total": ["4", 6]
        }"#;
        let resp: AccessResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.bins, vec![1_705_320_000_000, 1_705_320_060_000]);
        assert_eq!(resp.counts_by_type["cmd"], vec![3.0, 4.0]);
        assert_eq!(resp.counts_by_type["chat"], vec![1.0, 2.0]);
        assert_eq!(resp.total, vec![4.0, 6.0]);
        assert_eq!(resp.meta.available_min, Some(1_704_067_200_000));
        assert_eq!(resp.meta.available_max, Some(1_705_329_000_000));
        assert_eq!(resp.meta.types, vec!["cmd", "chat"]);
    }

    #[test]
    fn test_access_response_requires_bins() {
        let body = r#"{ "meta": {}, "countsByType": {}, "total": [] }"#;
        assert!(serde_json::from_str::<AccessResponse>(body).is_err());
    }

    #[test]
    fn test_summary_response() {
        let body = r#"{
            "totalHits": "10250",
            "uniqueUsers": 311,
            "uniqueGroups": 12,
            "totalByType": { "cmd": "9000", "chat": 1250 },
            "generatedAt": "2024-01-15T14:30:00Z"
        }"#;
        let resp: SummaryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.total_hits, 10_250);
        assert_eq!(resp.unique_users, 311);
        assert_eq!(resp.total_by_type["cmd"], 9000);
        assert_eq!(resp.generated_at, Some(1_705_329_000_000));
        assert_eq!(resp.available_min, None);
    }

    #[test]
    fn test_lights_response_events_keep_order() {
        let body = r#"{
            "areas": {
                "north": [
                    { "ts": 1705320000, "on": false },
                    { "ts": "2024-01-15T14:30:00Z", "on": true }
                ]
            }
        }"#;
        let resp: LightsResponse = serde_json::from_str(body).unwrap();
        let events = &resp.areas["north"];
        assert_eq!(events.len(), 2);
        assert!(!events[0].on);
        assert!(events[1].on);
        assert!(events[0].ts < events[1].ts);
    }
}
