#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn cadence system: releases queued enemies at a fixed real-time rate.

use std::time::Duration;

use rat_defence_core::{Command, Event, TICK_DURATION};

/// Tuning parameters for the spawn cadence.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Wall-clock interval between consecutive spawn releases.
    pub spawn_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spawn_interval: Duration::from_millis(1000),
        }
    }
}

/// Accumulates simulated time from tick events and emits spawn commands.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    accumulated: Duration,
}

impl Spawning {
    /// Creates a spawning system with the given cadence.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            accumulated: Duration::ZERO,
        }
    }

    /// Consumes tick events and emits one [`Command::SpawnEnemy`] per elapsed
    /// interval, never more than `pending` in total.
    ///
    /// With an empty queue the accumulator is reset, so the first enemy of
    /// the next wave waits a full interval instead of spawning instantly.
    pub fn handle(&mut self, events: &[Event], pending: usize, out: &mut Vec<Command>) {
        if pending == 0 {
            self.accumulated = Duration::ZERO;
            return;
        }

        let ticks = events
            .iter()
            .filter(|event| matches!(event, Event::TickAdvanced))
            .count() as u32;
        self.accumulated += TICK_DURATION * ticks;

        let mut releases = 0;
        while self.accumulated >= self.config.spawn_interval && releases < pending {
            self.accumulated -= self.config.spawn_interval;
            out.push(Command::SpawnEnemy);
            releases += 1;
        }
    }
}

impl Default for Spawning {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, Spawning};
    use std::time::Duration;

    use rat_defence_core::{Command, Event, TICK_DURATION};

    fn ticks(count: usize) -> Vec<Event> {
        vec![Event::TickAdvanced; count]
    }

    fn ticks_per_interval(config: Config) -> usize {
        (config.spawn_interval.as_millis() / TICK_DURATION.as_millis()) as usize + 1
    }

    #[test]
    fn no_spawn_before_the_interval_elapses() {
        let mut system = Spawning::default();
        let mut out = Vec::new();

        system.handle(&ticks(10), 5, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn one_spawn_per_elapsed_interval() {
        let mut system = Spawning::default();
        let mut out = Vec::new();

        system.handle(&ticks(ticks_per_interval(Config::default())), 5, &mut out);

        assert_eq!(out, vec![Command::SpawnEnemy]);
    }

    #[test]
    fn leftover_time_carries_into_the_next_call() {
        let config = Config {
            spawn_interval: Duration::from_millis(32),
        };
        let mut system = Spawning::new(config);
        let mut out = Vec::new();

        system.handle(&ticks(3), 5, &mut out);
        assert_eq!(out.len(), 1);

        out.clear();
        system.handle(&ticks(1), 5, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn releases_never_exceed_the_pending_queue() {
        let config = Config {
            spawn_interval: Duration::from_millis(16),
        };
        let mut system = Spawning::new(config);
        let mut out = Vec::new();

        system.handle(&ticks(10), 3, &mut out);

        assert_eq!(out.len(), 3);
    }

    #[test]
    fn empty_queue_resets_the_accumulator() {
        let mut system = Spawning::default();
        let mut out = Vec::new();

        system.handle(&ticks(60), 0, &mut out);
        system.handle(&ticks(10), 5, &mut out);

        assert!(out.is_empty());
    }
}
