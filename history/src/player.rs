//! Variable-speed playback of a recorded history document.

use std::time::Duration;

use crate::document::{GameHistory, HistoryEvent};

/// Receiver for replayed events.
///
/// Playback is an event-driven projection: the sink applies each recorded
/// event to its own presentation state and nothing is re-simulated.
pub trait ReplaySink {
    /// Called once per recorded event, in timestamp order.
    fn on_event(&mut self, event: &HistoryEvent);
}

/// Cooperative playback cursor over a recorded event log.
///
/// Each [`HistoryPlayer::advance`] call moves a virtual clock forward by
/// `dt * speed` and dispatches every event whose timestamp has elapsed.
#[derive(Debug)]
pub struct HistoryPlayer {
    events: Vec<HistoryEvent>,
    cursor: usize,
    clock: f64,
    speed: f64,
    paused: bool,
}

impl HistoryPlayer {
    /// Creates a player positioned at the start of the document's event log.
    #[must_use]
    pub fn new(history: &GameHistory) -> Self {
        Self {
            events: history.events.clone(),
            cursor: 0,
            clock: 0.0,
            speed: 1.0,
            paused: false,
        }
    }

    /// Advances the virtual clock and dispatches due events to the sink.
    pub fn advance<S: ReplaySink>(&mut self, dt: Duration, sink: &mut S) {
        if self.paused || self.finished() {
            return;
        }
        self.clock += dt.as_secs_f64() * self.speed;
        while let Some(event) = self.events.get(self.cursor) {
            if event.time > self.clock {
                break;
            }
            sink.on_event(event);
            self.cursor += 1;
        }
    }

    /// Halts the clock; the playback position is preserved.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resumes a paused playback from where it stopped.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Reports whether playback is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Changes the playback rate without losing the current position.
    ///
    /// Non-positive rates are ignored.
    pub fn set_speed(&mut self, speed: f64) {
        if speed > 0.0 {
            self.speed = speed;
        }
    }

    /// Current playback rate.
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Rewinds to the start of the log and resumes the clock.
    pub fn stop(&mut self) {
        self.cursor = 0;
        self.clock = 0.0;
        self.paused = false;
    }

    /// Reports whether every event has been dispatched.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.cursor >= self.events.len()
    }

    /// Fraction of the log dispatched so far, in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.events.is_empty() {
            return 1.0;
        }
        self.cursor as f64 / self.events.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryPlayer, ReplaySink};
    use crate::document::{GameHistory, HistoryEvent};
    use std::collections::BTreeMap;
    use std::time::Duration;

    #[derive(Default)]
    struct Collector {
        kinds: Vec<String>,
    }

    impl ReplaySink for Collector {
        fn on_event(&mut self, event: &HistoryEvent) {
            self.kinds.push(event.kind.clone());
        }
    }

    fn history() -> GameHistory {
        let event = |time: f64, kind: &str| HistoryEvent {
            time,
            kind: kind.to_owned(),
            data: BTreeMap::new(),
        };
        GameHistory {
            events: vec![
                event(0.0, "game_start"),
                event(1.0, "wave_started"),
                event(2.5, "enemy_spawned"),
                event(4.0, "game_end"),
            ],
            ..GameHistory::default()
        }
    }

    #[test]
    fn events_dispatch_exactly_once_in_order() {
        let history = history();
        let mut player = HistoryPlayer::new(&history);
        let mut sink = Collector::default();

        for _ in 0..50 {
            player.advance(Duration::from_millis(100), &mut sink);
        }

        assert_eq!(
            sink.kinds,
            vec!["game_start", "wave_started", "enemy_spawned", "game_end"]
        );
        assert!(player.finished());
        assert_eq!(player.progress(), 1.0);
    }

    #[test]
    fn pause_freezes_the_clock() {
        let history = history();
        let mut player = HistoryPlayer::new(&history);
        let mut sink = Collector::default();

        player.advance(Duration::from_millis(1100), &mut sink);
        assert_eq!(sink.kinds.len(), 2);

        player.pause();
        player.advance(Duration::from_secs(10), &mut sink);
        assert_eq!(sink.kinds.len(), 2);

        player.resume();
        player.advance(Duration::from_secs(10), &mut sink);
        assert_eq!(sink.kinds.len(), 4);
    }

    #[test]
    fn double_speed_halves_the_wall_time() {
        let history = history();
        let mut player = HistoryPlayer::new(&history);
        let mut sink = Collector::default();
        player.set_speed(2.0);

        player.advance(Duration::from_millis(2000), &mut sink);
        assert_eq!(sink.kinds.len(), 4);
    }

    #[test]
    fn stop_rewinds_to_the_beginning() {
        let history = history();
        let mut player = HistoryPlayer::new(&history);
        let mut sink = Collector::default();

        player.advance(Duration::from_secs(10), &mut sink);
        player.stop();
        assert!(!player.finished());
        assert_eq!(player.progress(), 0.0);

        player.advance(Duration::from_secs(10), &mut sink);
        assert_eq!(sink.kinds.len(), 8);
    }

    #[test]
    fn invalid_speed_changes_are_ignored() {
        let history = history();
        let mut player = HistoryPlayer::new(&history);
        player.set_speed(0.0);
        assert_eq!(player.speed(), 1.0);
        player.set_speed(-3.0);
        assert_eq!(player.speed(), 1.0);
    }
}
