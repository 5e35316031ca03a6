#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session orchestration: fixed-step clock, wave scheduling, history capture,
//! and the bridge between wire messages and world commands.
//!
//! The [`Engine`] owns the authoritative world plus the stateful systems
//! around it. Adapters submit player intents through the engine's methods and
//! drive time forward with [`Engine::advance`]; everything else (spawn
//! cadence, wave seeds, event recording) happens internally.

mod record;
pub mod replay;
pub mod sync;

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use rat_defence_core::{
    Command, Event, GridPos, PlayerSide, TowerId, TowerKind, TICK_DURATION,
};
use rat_defence_history::{GameHistory, HistoryRecorder};
use rat_defence_network::{Message, MessageKind};
use rat_defence_system_spawning::Spawning;
use rat_defence_world::{apply, query, World};

/// Session parameters fixed at creation time.
#[derive(Clone, Debug)]
pub struct Config {
    /// Seed controlling map generation and wave composition.
    pub seed: u64,
    /// Number of tile columns in the generated map.
    pub map_width: u32,
    /// Number of tile rows in the generated map.
    pub map_height: u32,
    /// Split-screen divider column for two-player sessions.
    pub divider: Option<u32>,
    /// Session mode recorded into the history metadata.
    pub game_mode: String,
    /// Host address recorded into the history metadata.
    pub server_ip: String,
    /// Human-readable session start time for the history metadata.
    pub date: String,
    /// Whether the session writes a history document.
    pub record: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 0,
            map_width: 20,
            map_height: 15,
            divider: None,
            game_mode: "singleplayer".to_owned(),
            server_ip: String::new(),
            date: String::new(),
            record: true,
        }
    }
}

/// One running game session.
pub struct Engine {
    config: Config,
    world: World,
    spawning: Spawning,
    recorder: HistoryRecorder,
    accumulator: Duration,
    elapsed: Duration,
    paused: bool,
}

impl Engine {
    /// Generates a map from the configured seed and boots a fresh session.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let blueprint =
            rat_defence_system_map_generation::generate(config.map_width, config.map_height, &mut rng);
        let map_rows = blueprint.grid().rows();
        let path_pairs: Vec<[u32; 2]> = blueprint
            .path()
            .iter()
            .map(|waypoint| [waypoint.x(), waypoint.y()])
            .collect();

        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::InstallMap { blueprint }, &mut events);
        if config.divider.is_some() {
            apply(
                &mut world,
                Command::SetDivider {
                    column: config.divider,
                },
                &mut events,
            );
        }

        let mut recorder = HistoryRecorder::new();
        if config.record {
            recorder.start_recording(
                config.date.clone(),
                config.game_mode.clone(),
                config.server_ip.clone(),
                map_rows,
                path_pairs,
            );
        }

        tracing::info!(
            seed = config.seed,
            width = config.map_width,
            height = config.map_height,
            mode = %config.game_mode,
            "session created"
        );

        Self {
            config,
            world,
            spawning: Spawning::default(),
            recorder,
            accumulator: Duration::ZERO,
            elapsed: Duration::ZERO,
            paused: false,
        }
    }

    /// Read-only access to the authoritative world for adapter queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Session parameters the engine was created with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Simulated time since the session started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Reports whether the clock is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Freezes the simulation clock. All state is preserved.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resumes a paused simulation clock.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Requests placement of a tower.
    pub fn place_tower(&mut self, kind: TowerKind, at: GridPos, side: PlayerSide) -> Vec<Event> {
        self.apply_and_record(Command::PlaceTower { kind, at, side })
    }

    /// Requests the sale of a tower.
    pub fn sell_tower(&mut self, tower: TowerId) -> Vec<Event> {
        self.apply_and_record(Command::SellTower { tower })
    }

    /// Requests one upgrade of a tower.
    pub fn upgrade_tower(&mut self, tower: TowerId) -> Vec<Event> {
        self.apply_and_record(Command::UpgradeTower { tower })
    }

    /// Builds the next wave from the session seed and starts releasing it.
    ///
    /// Both peers of a networked session derive the identical spawn queue
    /// from the shared seed, so only the intent crosses the wire.
    pub fn start_wave(&mut self) -> Vec<Event> {
        let wave = query::wave(&self.world);
        let spawns =
            rat_defence_system_wave_generation::build_wave_for_seed(self.config.seed, wave);
        tracing::info!(wave, count = spawns.len(), "wave queued");
        self.apply_and_record(Command::StartWave { spawns })
    }

    /// Accumulates wall-clock time and runs every elapsed fixed step.
    ///
    /// Returns the events of all steps executed by this call. While paused
    /// no time accumulates and nothing runs.
    pub fn advance(&mut self, dt: Duration) -> Vec<Event> {
        if self.paused {
            return Vec::new();
        }

        let mut collected = Vec::new();
        self.accumulator += dt;
        while self.accumulator >= TICK_DURATION {
            self.accumulator -= TICK_DURATION;
            self.step(&mut collected);
        }
        collected
    }

    /// Runs exactly one fixed step, regardless of accumulated time.
    pub fn step_once(&mut self) -> Vec<Event> {
        let mut collected = Vec::new();
        if !self.paused {
            self.step(&mut collected);
        }
        collected
    }

    fn step(&mut self, collected: &mut Vec<Event>) {
        if query::is_game_over(&self.world) {
            return;
        }
        self.elapsed += TICK_DURATION;

        let mut events = Vec::new();
        apply(&mut self.world, Command::Tick, &mut events);

        let pending = query::pending_spawns(&self.world);
        let mut commands = Vec::new();
        self.spawning.handle(&events, pending, &mut commands);
        for command in commands {
            apply(&mut self.world, command, &mut events);
        }

        self.record(&events);
        collected.extend(events);
    }

    /// Translates one received wire message into world mutations.
    ///
    /// Messages that carry no simulation intent (chat, heartbeats, state
    /// snapshots) produce no events.
    pub fn apply_message(&mut self, message: &Message) -> Vec<Event> {
        match message.kind {
            MessageKind::PlaceTower | MessageKind::TowerUpgrade | MessageKind::TowerSell => {
                match sync::command_from_message(message) {
                    Some(command) => self.apply_and_record(command),
                    None => {
                        tracing::warn!(kind = ?message.kind, "dropping message with bad payload");
                        Vec::new()
                    }
                }
            }
            MessageKind::StartWave => self.start_wave(),
            MessageKind::Connect
            | MessageKind::Disconnect
            | MessageKind::ChatMessage
            | MessageKind::SyncState
            | MessageKind::Heartbeat => Vec::new(),
        }
    }

    /// Builds a state snapshot message for a peer that just connected.
    #[must_use]
    pub fn sync_state(&self, player_id: &str) -> Message {
        sync::sync_state_message(
            query::gold(&self.world),
            query::lives(&self.world),
            query::wave(&self.world),
            player_id,
        )
    }

    /// Reports whether events are being captured into a history document.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Finalizes and yields the recorded history document, if any.
    pub fn finish(&mut self) -> Option<GameHistory> {
        self.recorder.finish()
    }

    fn apply_and_record(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(&mut self.world, command, &mut events);
        self.record(&events);
        events
    }

    fn record(&mut self, events: &[Event]) {
        if !self.recorder.is_recording() {
            return;
        }
        for event in events {
            if let Some((kind, data)) = record::entry_for(event) {
                self.recorder.record_event(self.elapsed, kind, data);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, Engine};
    use rat_defence_core::{Event, GridPos, PlayerSide, TileType, TowerKind};
    use rat_defence_network::{Message, MessageKind};
    use rat_defence_world::query;
    use serde_json::json;
    use std::time::Duration;

    fn config(seed: u64) -> Config {
        Config {
            seed,
            date: "2026-08-30 12:00:00".to_owned(),
            ..Config::default()
        }
    }

    fn buildable_tile(engine: &Engine) -> GridPos {
        let grid = query::grid(engine.world());
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let at = GridPos::new(x, y);
                if grid.tile(at) == Some(TileType::Empty) {
                    return at;
                }
            }
        }
        unreachable!("generated maps always have empty tiles");
    }

    #[test]
    fn fresh_sessions_start_with_the_configured_map() {
        let engine = Engine::new(config(7));
        let grid = query::grid(engine.world());
        assert_eq!(grid.width(), 20);
        assert_eq!(grid.height(), 15);
        assert_eq!(query::gold(engine.world()), 100);
        assert_eq!(query::lives(engine.world()), 20);
    }

    #[test]
    fn equal_seeds_produce_identical_sessions() {
        let first = Engine::new(config(99));
        let second = Engine::new(config(99));
        assert_eq!(query::grid(first.world()), query::grid(second.world()));
        assert_eq!(query::path(first.world()), query::path(second.world()));
    }

    #[test]
    fn advance_runs_one_step_per_elapsed_tick() {
        let mut engine = Engine::new(config(1));
        let events = engine.advance(Duration::from_millis(160));
        let ticks = events
            .iter()
            .filter(|event| matches!(event, Event::TickAdvanced))
            .count();
        assert_eq!(ticks, 10);
    }

    #[test]
    fn leftover_time_carries_between_advances() {
        let mut engine = Engine::new(config(1));
        let first = engine.advance(Duration::from_millis(24));
        let second = engine.advance(Duration::from_millis(8));
        let ticks = |events: &[Event]| {
            events
                .iter()
                .filter(|event| matches!(event, Event::TickAdvanced))
                .count()
        };
        assert_eq!(ticks(&first), 1);
        assert_eq!(ticks(&second), 1);
    }

    #[test]
    fn paused_engines_do_not_advance() {
        let mut engine = Engine::new(config(1));
        engine.pause();
        assert!(engine.advance(Duration::from_secs(5)).is_empty());
        engine.resume();
        assert!(!engine.advance(Duration::from_millis(16)).is_empty());
    }

    #[test]
    fn waves_release_enemies_on_the_spawn_cadence() {
        let mut engine = Engine::new(config(3));
        let events = engine.start_wave();
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::WaveStarted { wave: 1, spawns: 5 })));

        let events = engine.advance(Duration::from_millis(1100));
        let spawned = events
            .iter()
            .filter(|event| matches!(event, Event::EnemySpawned { .. }))
            .count();
        assert_eq!(spawned, 1);
    }

    #[test]
    fn wave_composition_is_reproducible_across_engines() {
        let mut first = Engine::new(config(42));
        let mut second = Engine::new(config(42));
        assert_eq!(first.start_wave(), second.start_wave());
    }

    #[test]
    fn sessions_record_a_history_document() {
        let mut engine = Engine::new(config(5));
        let at = buildable_tile(&engine);
        let _ = engine.place_tower(TowerKind::Basic, at, PlayerSide::Solo);
        let _ = engine.start_wave();
        let _ = engine.advance(Duration::from_millis(160));

        let history = engine.finish().expect("recording enabled");
        assert_eq!(history.game_mode, "singleplayer");
        assert_eq!(history.map.len(), 15);
        assert_eq!(history.events.first().map(|e| e.kind.as_str()), Some("game_start"));
        assert_eq!(history.events.last().map(|e| e.kind.as_str()), Some("game_end"));
        assert!(history
            .events
            .iter()
            .any(|event| event.kind == "tower_placed"));
        assert!(history
            .events
            .iter()
            .any(|event| event.kind == "wave_started"));
        assert!(history
            .events
            .windows(2)
            .all(|pair| pair[0].time <= pair[1].time));
    }

    #[test]
    fn recording_can_be_disabled() {
        let mut engine = Engine::new(Config {
            record: false,
            ..config(5)
        });
        assert!(!engine.is_recording());
        assert!(engine.finish().is_none());
    }

    #[test]
    fn wire_messages_translate_into_world_mutations() {
        let mut engine = Engine::new(config(8));
        let at = buildable_tile(&engine);
        let message = Message::new(
            MessageKind::PlaceTower,
            json!({"kind": "basic", "x": at.x(), "y": at.y(), "side": "solo"}),
            "player2",
        );

        let events = engine.apply_message(&message);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::TowerPlaced { .. })));
        assert_eq!(query::gold(engine.world()), 70);
    }

    #[test]
    fn messages_with_bad_payloads_are_dropped() {
        let mut engine = Engine::new(config(8));
        let message = Message::new(
            MessageKind::PlaceTower,
            json!({"kind": "laser", "x": 1, "y": 1}),
            "player2",
        );
        assert!(engine.apply_message(&message).is_empty());

        let chat = Message::new(MessageKind::ChatMessage, json!({"text": "gg"}), "player2");
        assert!(engine.apply_message(&chat).is_empty());
    }

    #[test]
    fn sync_state_reports_the_current_economy() {
        let engine = Engine::new(config(8));
        let message = engine.sync_state("player1");
        assert_eq!(message.kind, MessageKind::SyncState);
        assert_eq!(message.data["gold"], 100);
        assert_eq!(message.data["lives"], 20);
        assert_eq!(message.data["wave"], 1);
    }
}
