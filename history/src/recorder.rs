//! Live capture of session events into a history document.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::document::{DataValue, GameHistory, HistoryEvent};

/// Records timestamped events into a [`GameHistory`] while active.
///
/// Timestamps are seconds since recording started, rounded to milliseconds
/// and clamped to be non-decreasing.
#[derive(Debug, Default)]
pub struct HistoryRecorder {
    active: bool,
    history: GameHistory,
    last_time: f64,
}

impl HistoryRecorder {
    /// Creates an inactive recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports whether events are currently being captured.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.active
    }

    /// Begins a fresh recording with the provided session metadata.
    ///
    /// Any previously captured document is discarded. A `game_start` event is
    /// logged at time zero.
    pub fn start_recording(
        &mut self,
        date: String,
        game_mode: String,
        server_ip: String,
        map: Vec<Vec<u8>>,
        path: Vec<[u32; 2]>,
    ) {
        self.history = GameHistory {
            date,
            game_mode,
            server_ip,
            map,
            path,
            events: vec![HistoryEvent {
                time: 0.0,
                kind: "game_start".to_owned(),
                data: BTreeMap::new(),
            }],
        };
        self.last_time = 0.0;
        self.active = true;
    }

    /// Appends one event at the given offset from recording start.
    ///
    /// Ignored while the recorder is inactive.
    pub fn record_event(
        &mut self,
        elapsed: Duration,
        kind: &str,
        data: BTreeMap<String, DataValue>,
    ) {
        if !self.active {
            return;
        }
        let rounded = (elapsed.as_secs_f64() * 1000.0).round() / 1000.0;
        let time = rounded.max(self.last_time);
        self.last_time = time;
        self.history.events.push(HistoryEvent {
            time,
            kind: kind.to_owned(),
            data,
        });
    }

    /// Stops capturing without finalizing the document.
    pub fn stop_recording(&mut self) {
        self.active = false;
    }

    /// Logs a closing `game_end` event, stops capturing, and yields the
    /// completed document. Returns `None` when nothing was being recorded.
    pub fn finish(&mut self) -> Option<GameHistory> {
        if !self.active {
            return None;
        }
        self.history.events.push(HistoryEvent {
            time: self.last_time,
            kind: "game_end".to_owned(),
            data: BTreeMap::new(),
        });
        self.active = false;
        Some(std::mem::take(&mut self.history))
    }
}

#[cfg(test)]
mod tests {
    use super::HistoryRecorder;
    use crate::document::DataValue;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn started() -> HistoryRecorder {
        let mut recorder = HistoryRecorder::new();
        recorder.start_recording(
            "date".to_owned(),
            "singleplayer".to_owned(),
            String::new(),
            vec![vec![0, 1]],
            vec![[0, 0], [1, 0]],
        );
        recorder
    }

    #[test]
    fn recording_brackets_the_log_with_start_and_end() {
        let mut recorder = started();
        recorder.record_event(Duration::from_millis(1500), "wave_started", BTreeMap::new());
        let history = recorder.finish().expect("document");

        assert_eq!(history.events.len(), 3);
        assert_eq!(history.events[0].kind, "game_start");
        assert_eq!(history.events[1].time, 1.5);
        assert_eq!(history.events[2].kind, "game_end");
        assert!(!recorder.is_recording());
    }

    #[test]
    fn timestamps_round_to_milliseconds_and_never_decrease() {
        let mut recorder = started();
        recorder.record_event(Duration::from_micros(1_234_567), "a", BTreeMap::new());
        recorder.record_event(Duration::from_millis(1_000), "b", BTreeMap::new());
        let history = recorder.finish().expect("document");

        assert_eq!(history.events[1].time, 1.235);
        assert_eq!(history.events[2].time, 1.235);
    }

    #[test]
    fn events_are_dropped_while_inactive() {
        let mut recorder = HistoryRecorder::new();
        recorder.record_event(Duration::ZERO, "ignored", BTreeMap::new());
        assert!(recorder.finish().is_none());

        let mut recorder = started();
        recorder.stop_recording();
        let mut data = BTreeMap::new();
        let _ = data.insert("gold".to_owned(), DataValue::Int(70));
        recorder.record_event(Duration::from_secs(2), "ignored", data);
        assert!(!recorder.is_recording());
    }
}
