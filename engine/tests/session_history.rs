use std::time::Duration;

use rat_defence_core::{Event, GridPos, PlayerSide, TileType, TowerKind, TICK_DURATION};
use rat_defence_engine::replay::ReplayProjection;
use rat_defence_engine::{Config, Engine};
use rat_defence_history::{
    load_json, load_xml, save_json, save_xml, DataValue, HistoryPlayer, ReplaySink,
};
use rat_defence_world::query;

const SESSION_SEED: u64 = 0x5eed_cafe;

fn session_config() -> Config {
    Config {
        seed: SESSION_SEED,
        date: "2026-08-30 12:00:00".to_owned(),
        ..Config::default()
    }
}

/// Plays one full wave of an autopiloted session and returns the engine.
fn play_session() -> Engine {
    let mut engine = Engine::new(session_config());
    // Two towers plus one upgrade exhaust 80 of the starting 100 gold.
    let mut placed = Vec::new();
    for at in tiles_bordering_path(&engine).into_iter().take(2) {
        let events = engine.place_tower(TowerKind::Basic, at, PlayerSide::Solo);
        placed.extend(events.iter().filter_map(|event| match event {
            Event::TowerPlaced { tower, .. } => Some(*tower),
            _ => None,
        }));
    }
    assert_eq!(placed.len(), 2);
    let upgrades = engine.upgrade_tower(placed[0]);
    assert!(upgrades
        .iter()
        .any(|event| matches!(event, Event::TowerUpgraded { .. })));
    let _ = engine.start_wave();
    let mut remaining = 40_000;
    while query::wave_active(engine.world()) && remaining > 0 {
        let _ = engine.advance(TICK_DURATION);
        remaining -= 1;
    }
    assert!(
        !query::wave_active(engine.world()),
        "wave one must resolve before the tick budget runs out"
    );
    engine
}

fn tiles_bordering_path(engine: &Engine) -> Vec<GridPos> {
    let grid = query::grid(engine.world());
    let mut tiles = Vec::new();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let at = GridPos::new(x, y);
            if grid.tile(at) != Some(TileType::Empty) {
                continue;
            }
            let near_path = [(1i64, 0i64), (-1, 0), (0, 1), (0, -1)].iter().any(|(dx, dy)| {
                let nx = i64::from(x) + dx;
                let ny = i64::from(y) + dy;
                if nx < 0 || ny < 0 {
                    return false;
                }
                matches!(
                    grid.tile(GridPos::new(nx as u32, ny as u32)),
                    Some(TileType::Path | TileType::Start | TileType::End)
                )
            });
            if near_path {
                tiles.push(at);
            }
        }
    }
    tiles
}

#[test]
fn identically_seeded_sessions_record_identical_histories() {
    let first = play_session().finish().expect("recording enabled");
    let second = play_session().finish().expect("recording enabled");
    assert_eq!(first, second);
}

#[test]
fn recorded_histories_round_trip_through_both_formats() {
    let history = play_session().finish().expect("recording enabled");

    let json = save_json(&history).expect("json encode");
    assert_eq!(load_json(&json).expect("json decode"), history);

    let xml = save_xml(&history).expect("xml encode");
    assert_eq!(load_xml(&xml).expect("xml decode"), history);
}

#[test]
fn replaying_the_log_reconstructs_the_live_economy() {
    let mut engine = play_session();
    let gold = query::gold(engine.world());
    let score = query::score(engine.world());
    let lives = query::lives(engine.world());
    let history = engine.finish().expect("recording enabled");

    let mut player = HistoryPlayer::new(&history);
    let mut projection = ReplayProjection::new();
    while !player.finished() {
        player.advance(Duration::from_millis(500), &mut projection);
    }

    // Placements, the upgrade, and every bounty are all in the log, so the
    // projection lands exactly on the live totals.
    assert_eq!(projection.gold, gold);
    assert_eq!(projection.score, score);
    assert_eq!(projection.lives, lives);
    assert_eq!(projection.towers_placed, 2);

    assert!(history.events.iter().any(|event| {
        event.kind == "tower_upgraded" && event.data.get("cost") == Some(&DataValue::Int(20))
    }));

    let spawned_entries = history
        .events
        .iter()
        .filter(|event| event.kind == "enemy_spawned")
        .count();
    assert_eq!(projection.enemies_spawned as usize, spawned_entries);
    assert_eq!(
        projection.enemies_killed + projection.enemies_escaped,
        projection.enemies_spawned,
        "every spawned enemy must either die or escape"
    );
}

#[test]
fn the_player_dispatches_each_entry_exactly_once() {
    let history = play_session().finish().expect("recording enabled");

    struct Counter(usize);
    impl ReplaySink for Counter {
        fn on_event(&mut self, _: &rat_defence_history::HistoryEvent) {
            self.0 += 1;
        }
    }

    let mut player = HistoryPlayer::new(&history);
    let mut counter = Counter(0);
    while !player.finished() {
        player.advance(Duration::from_millis(250), &mut counter);
    }
    assert_eq!(counter.0, history.events.len());
}
