//! The persisted history document and its JSON encoding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::HistoryError;

/// A single value carried in an event's data map.
///
/// Untagged so the JSON form stays plain: integers stay integers, fractional
/// numbers stay floats, everything else is text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    /// Whole number, e.g. a gold amount or entity identifier.
    Int(i64),
    /// Fractional number, e.g. a world coordinate.
    Float(f64),
    /// Free-form text, e.g. an entity kind name.
    Text(String),
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One timestamped entry in the recorded event log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    /// Seconds since recording started, rounded to milliseconds.
    pub time: f64,
    /// Stable event name, e.g. `tower_placed`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Event payload keyed by field name. Sorted for stable output.
    pub data: BTreeMap<String, DataValue>,
}

/// Complete record of one session: metadata, map, path, and event log.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameHistory {
    /// Human-readable timestamp of when the session was played.
    pub date: String,
    /// Session mode, e.g. `singleplayer` or `multiplayer`.
    pub game_mode: String,
    /// Address of the host for networked sessions, empty otherwise.
    pub server_ip: String,
    /// Tile grid encoded as rows of tile codes.
    pub map: Vec<Vec<u8>>,
    /// Path waypoints as `[column, row]` pairs in traversal order.
    pub path: Vec<[u32; 2]>,
    /// Recorded events in non-decreasing timestamp order.
    pub events: Vec<HistoryEvent>,
}

/// Encodes a history document as pretty-printed JSON.
pub fn save_json(history: &GameHistory) -> Result<String, HistoryError> {
    Ok(serde_json::to_string_pretty(history)?)
}

/// Decodes a history document from JSON.
pub fn load_json(input: &str) -> Result<GameHistory, HistoryError> {
    Ok(serde_json::from_str(input)?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{load_json, save_json, DataValue, GameHistory, HistoryEvent};
    use std::collections::BTreeMap;

    pub(crate) fn sample_history() -> GameHistory {
        let mut placed = BTreeMap::new();
        let _ = placed.insert("tower".to_owned(), DataValue::Int(0));
        let _ = placed.insert("kind".to_owned(), DataValue::from("basic"));
        let _ = placed.insert("x".to_owned(), DataValue::Int(4));
        let _ = placed.insert("y".to_owned(), DataValue::Int(0));

        let mut killed = BTreeMap::new();
        let _ = killed.insert("enemy".to_owned(), DataValue::Int(3));
        let _ = killed.insert("bounty".to_owned(), DataValue::Int(20));
        let _ = killed.insert("at_x".to_owned(), DataValue::Float(132.5));

        GameHistory {
            date: "2026-08-30 12:00:00".to_owned(),
            game_mode: "singleplayer".to_owned(),
            server_ip: String::new(),
            map: vec![vec![0, 1, 2], vec![3, 1, 0]],
            path: vec![[0, 1], [2, 1]],
            events: vec![
                HistoryEvent {
                    time: 0.0,
                    kind: "game_start".to_owned(),
                    data: BTreeMap::new(),
                },
                HistoryEvent {
                    time: 1.234,
                    kind: "tower_placed".to_owned(),
                    data: placed,
                },
                HistoryEvent {
                    time: 7.5,
                    kind: "enemy_killed".to_owned(),
                    data: killed,
                },
            ],
        }
    }

    #[test]
    fn json_round_trip_preserves_every_field() {
        let history = sample_history();
        let encoded = save_json(&history).expect("encode");
        let decoded = load_json(&encoded).expect("decode");
        assert_eq!(decoded, history);
    }

    #[test]
    fn integers_and_floats_stay_distinct() {
        let history = sample_history();
        let encoded = save_json(&history).expect("encode");
        let decoded = load_json(&encoded).expect("decode");
        assert_eq!(
            decoded.events[2].data.get("bounty"),
            Some(&DataValue::Int(20))
        );
        assert_eq!(
            decoded.events[2].data.get("at_x"),
            Some(&DataValue::Float(132.5))
        );
    }

    #[test]
    fn malformed_json_surfaces_an_error() {
        assert!(load_json("{ not json").is_err());
        assert!(load_json("{\"date\": 3}").is_err());
    }
}
