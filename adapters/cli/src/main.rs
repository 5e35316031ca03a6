#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line adapter for the Rat Defence engine.
//!
//! `play` boots a seeded session, builds a simple defence, and autoplays a
//! number of waves, optionally synchronized with a second peer over TCP and
//! optionally saving the recorded history. `replay` folds a saved history
//! file back into a summary without re-simulating anything.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use rat_defence_core::{GridPos, PlayerSide, TileType, TowerKind, TICK_DURATION};
use rat_defence_engine::replay::ReplayProjection;
use rat_defence_engine::{sync, Config, Engine};
use rat_defence_history::{
    load_json, load_xml, save_json, save_xml, GameHistory, HistoryPlayer,
};
use rat_defence_network::{NetworkNotification, NetworkSession};
use rat_defence_world::query;

/// Safety cap on fixed steps per wave so a stalled session cannot spin.
const MAX_TICKS_PER_WAVE: u32 = 600_000;

/// Fixed steps between keepalive broadcasts, roughly five seconds of
/// simulated time.
const HEARTBEAT_INTERVAL_TICKS: u32 = 300;

/// Rat Defence, a deterministic tower-defence simulation.
#[derive(Parser)]
#[command(name = "rat-defence", version)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Runs a headless session and prints the outcome.
    Play(PlayArgs),
    /// Replays a saved history file and prints its summary.
    Replay(ReplayArgs),
}

#[derive(clap::Args)]
struct PlayArgs {
    /// Session seed; controls the map and every wave.
    #[arg(long)]
    seed: Option<u64>,
    /// Map width in tiles.
    #[arg(long, default_value_t = 20)]
    width: u32,
    /// Map height in tiles.
    #[arg(long, default_value_t = 15)]
    height: u32,
    /// Number of waves to autoplay.
    #[arg(long, default_value_t = 3)]
    waves: u32,
    /// Towers to place before the first wave.
    #[arg(long, default_value_t = 4)]
    towers: u32,
    /// Save the recorded history here (.xml for XML, JSON otherwise).
    #[arg(long)]
    save: Option<PathBuf>,
    /// Host a two-player session on this address.
    #[arg(long, conflicts_with = "join")]
    host: Option<String>,
    /// Join a hosted session at this address.
    #[arg(long)]
    join: Option<String>,
    /// Split-screen divider column; restricts building to the local half.
    #[arg(long)]
    divider: Option<u32>,
}

#[derive(clap::Args)]
struct ReplayArgs {
    /// History file to replay (.xml for XML, JSON otherwise).
    file: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        CliCommand::Play(args) => play(args),
        CliCommand::Replay(args) => replay(&args.file),
    }
}

fn play(args: PlayArgs) -> Result<()> {
    let seed = args.seed.unwrap_or_else(seed_from_clock);
    let session = match (&args.host, &args.join) {
        (Some(addr), _) => Some(
            NetworkSession::host(addr.as_str())
                .with_context(|| format!("failed to host on {addr}"))?,
        ),
        (None, Some(addr)) => Some(
            NetworkSession::join(addr.as_str())
                .with_context(|| format!("failed to join {addr}"))?,
        ),
        (None, None) => None,
    };

    let game_mode = if session.is_some() {
        "multiplayer"
    } else {
        "singleplayer"
    };
    let mut engine = Engine::new(Config {
        seed,
        map_width: args.width,
        map_height: args.height,
        divider: args.divider,
        game_mode: game_mode.to_owned(),
        server_ip: args.join.clone().unwrap_or_default(),
        date: unix_timestamp(),
        ..Config::default()
    });

    println!("seed: {seed}");
    let side = local_side(args.divider, args.join.is_some());
    build_defences(&mut engine, args.towers, side, session.as_ref());

    for _ in 0..args.waves {
        if query::is_game_over(engine.world()) {
            break;
        }
        let _ = engine.start_wave();
        if let Some(session) = &session {
            let _ = session.broadcast(&sync::start_wave_message(session.local_id()));
        }
        run_wave(&mut engine, session.as_ref());
    }

    print_session_summary(&engine);

    if let Some(path) = &args.save {
        let history = engine
            .finish()
            .context("recording was disabled, nothing to save")?;
        write_history(path, &history)?;
        println!("history saved to {}", path.display());
    }
    Ok(())
}

/// Side this process builds on. With a divider the host owns the left half
/// and the joiner the right; without one the whole map is open.
fn local_side(divider: Option<u32>, joined: bool) -> PlayerSide {
    match (divider, joined) {
        (None, _) => PlayerSide::Solo,
        (Some(_), false) => PlayerSide::Left,
        (Some(_), true) => PlayerSide::Right,
    }
}

/// Places towers on buildable tiles bordering the path until the budget or
/// the gold runs out.
fn build_defences(
    engine: &mut Engine,
    budget: u32,
    side: PlayerSide,
    session: Option<&NetworkSession>,
) {
    let candidates = tiles_bordering_path(engine);
    let mut placed = 0;
    for at in candidates {
        if placed >= budget {
            break;
        }
        if query::placement_valid(engine.world(), TowerKind::Basic, at, side).is_err() {
            continue;
        }
        let _ = engine.place_tower(TowerKind::Basic, at, side);
        if let Some(session) = session {
            let _ = session.broadcast(&sync::place_tower_message(
                TowerKind::Basic,
                at,
                side,
                session.local_id(),
            ));
        }
        placed += 1;
    }
    tracing::info!(placed, "defences built");
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
            let borders_path = neighbours(at, grid.width(), grid.height())
                .into_iter()
                .any(|next| {
                    matches!(
                        grid.tile(next),
                        Some(TileType::Path | TileType::Start | TileType::End)
                    )
                });
            if borders_path {
                tiles.push(at);
            }
        }
    }
    tiles
}

fn neighbours(at: GridPos, width: u32, height: u32) -> Vec<GridPos> {
    let mut result = Vec::with_capacity(4);
    if at.x() > 0 {
        result.push(GridPos::new(at.x() - 1, at.y()));
    }
    if at.x() + 1 < width {
        result.push(GridPos::new(at.x() + 1, at.y()));
    }
    if at.y() > 0 {
        result.push(GridPos::new(at.x(), at.y() - 1));
    }
    if at.y() + 1 < height {
        result.push(GridPos::new(at.x(), at.y() + 1));
    }
    result
}

/// Drives fixed steps until the current wave resolves.
fn run_wave(engine: &mut Engine, session: Option<&NetworkSession>) {
    let mut ticks = 0;
    while query::wave_active(engine.world()) && !query::is_game_over(engine.world()) {
        if ticks >= MAX_TICKS_PER_WAVE {
            tracing::warn!("wave exceeded the tick budget, aborting");
            break;
        }
        let _ = engine.advance(TICK_DURATION);
        drain_network(engine, session);
        if let Some(session) = session {
            if ticks % HEARTBEAT_INTERVAL_TICKS == 0 {
                let _ = session.broadcast(&sync::heartbeat_message(session.local_id()));
            }
        }
        ticks += 1;
    }
}

fn drain_network(engine: &mut Engine, session: Option<&NetworkSession>) {
    let Some(session) = session else { return };
    while let Some(notification) = session.poll() {
        match notification {
            NetworkNotification::PeerConnected { player_id } => {
                println!("{player_id} connected");
                let _ = session.broadcast(&engine.sync_state(session.local_id()));
            }
            NetworkNotification::PeerDisconnected { player_id } => {
                println!("{player_id} disconnected");
            }
            NetworkNotification::MessageReceived(message) => {
                let _ = engine.apply_message(&message);
            }
            NetworkNotification::Malformed(error) => {
                tracing::warn!(%error, "ignoring malformed message");
            }
        }
    }
}

fn print_session_summary(engine: &Engine) {
    let world = engine.world();
    println!("--- session summary ---");
    println!("waves played: {}", query::wave(world).saturating_sub(1));
    println!("gold: {}", query::gold(world));
    println!("score: {}", query::score(world));
    println!("lives: {}", query::lives(world));
    let towers = query::towers(world);
    for tower in towers.iter() {
        println!(
            "tower {} ({}) level {} kills {}",
            tower.id.get(),
            tower.kind.name(),
            tower.level,
            tower.kills
        );
    }
    if query::is_game_over(world) {
        println!("game over");
    }
}

fn replay(path: &Path) -> Result<()> {
    let history = read_history(path)?;
    let mut player = HistoryPlayer::new(&history);
    let mut projection = ReplayProjection::new();
    while !player.finished() {
        player.advance(Duration::from_millis(250), &mut projection);
    }

    println!("--- replay of {} ---", path.display());
    println!("date: {}", history.date);
    println!("mode: {}", history.game_mode);
    println!("events: {}", history.events.len());
    println!(
        "towers placed/sold: {}/{}",
        projection.towers_placed, projection.towers_sold
    );
    println!(
        "enemies spawned/killed/escaped: {}/{}/{}",
        projection.enemies_spawned, projection.enemies_killed, projection.enemies_escaped
    );
    println!("final gold: {}", projection.gold);
    println!("final score: {}", projection.score);
    println!("final lives: {}", projection.lives);
    if projection.game_over {
        println!("session ended in game over on wave {}", projection.wave);
    }
    Ok(())
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .map(|extension| extension.eq_ignore_ascii_case("xml"))
        .unwrap_or(false)
}

fn read_history(path: &Path) -> Result<GameHistory> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let history = if is_xml(path) {
        load_xml(&raw)?
    } else {
        load_json(&raw)?
    };
    Ok(history)
}

fn write_history(path: &Path, history: &GameHistory) -> Result<()> {
    let encoded = if is_xml(path) {
        save_xml(history)?
    } else {
        save_json(history)?
    };
    std::fs::write(path, encoded)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0)
}

fn unix_timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{is_xml, local_side};
    use rat_defence_core::PlayerSide;
    use std::path::Path;

    #[test]
    fn history_format_follows_the_file_extension() {
        assert!(is_xml(Path::new("session.xml")));
        assert!(is_xml(Path::new("session.XML")));
        assert!(!is_xml(Path::new("session.json")));
        assert!(!is_xml(Path::new("session")));
    }

    #[test]
    fn the_divider_assigns_the_host_left_and_the_joiner_right() {
        assert_eq!(local_side(None, false), PlayerSide::Solo);
        assert_eq!(local_side(None, true), PlayerSide::Solo);
        assert_eq!(local_side(Some(10), false), PlayerSide::Left);
        assert_eq!(local_side(Some(10), true), PlayerSide::Right);
    }
}
