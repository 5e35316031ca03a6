//! Mapping from world events to persisted history entries.
//!
//! Bookkeeping events (tick pulses, balance changes, rejections) are not
//! persisted; the replayable log carries only the session-level happenings.

use std::collections::BTreeMap;

use rat_defence_core::Event;
use rat_defence_history::DataValue;

type Data = BTreeMap<String, DataValue>;

fn int(value: u32) -> DataValue {
    DataValue::Int(i64::from(value))
}

fn float(value: f32) -> DataValue {
    DataValue::Float(f64::from(value))
}

/// Returns the history entry for an event, or `None` when it is not logged.
pub(crate) fn entry_for(event: &Event) -> Option<(&'static str, Data)> {
    let mut data = Data::new();
    let kind = match event {
        Event::TowerPlaced { tower, kind, at } => {
            let _ = data.insert("tower".to_owned(), int(tower.get()));
            let _ = data.insert("kind".to_owned(), DataValue::from(kind.name()));
            let _ = data.insert("x".to_owned(), int(at.x()));
            let _ = data.insert("y".to_owned(), int(at.y()));
            "tower_placed"
        }
        Event::TowerSold { tower, refund } => {
            let _ = data.insert("tower".to_owned(), int(tower.get()));
            let _ = data.insert("refund".to_owned(), int(*refund));
            "tower_sold"
        }
        Event::TowerUpgraded { tower, level, cost } => {
            let _ = data.insert("tower".to_owned(), int(tower.get()));
            let _ = data.insert("level".to_owned(), int(*level));
            let _ = data.insert("cost".to_owned(), int(*cost));
            "tower_upgraded"
        }
        Event::WaveStarted { wave, spawns } => {
            let _ = data.insert("wave".to_owned(), int(*wave));
            let _ = data.insert("spawns".to_owned(), int(*spawns));
            "wave_started"
        }
        Event::WaveEnded { wave } => {
            let _ = data.insert("wave".to_owned(), int(*wave));
            "wave_ended"
        }
        Event::EnemySpawned { enemy, kind } => {
            let _ = data.insert("enemy".to_owned(), int(enemy.get()));
            let _ = data.insert("kind".to_owned(), DataValue::from(kind.name()));
            "enemy_spawned"
        }
        Event::EnemyKilled {
            enemy,
            kind,
            by,
            bounty,
        } => {
            let _ = data.insert("enemy".to_owned(), int(enemy.get()));
            let _ = data.insert("kind".to_owned(), DataValue::from(kind.name()));
            let _ = data.insert("bounty".to_owned(), int(*bounty));
            if let Some(tower) = by {
                let _ = data.insert("tower".to_owned(), int(tower.get()));
            }
            "enemy_killed"
        }
        Event::EnemyEscaped { enemy, kind } => {
            let _ = data.insert("enemy".to_owned(), int(enemy.get()));
            let _ = data.insert("kind".to_owned(), DataValue::from(kind.name()));
            "enemy_escaped"
        }
        Event::ProjectileFired {
            projectile,
            kind,
            tower,
            from,
            direction,
        } => {
            let _ = data.insert("projectile".to_owned(), int(projectile.get()));
            let _ = data.insert("kind".to_owned(), DataValue::from(kind.name()));
            let _ = data.insert("tower".to_owned(), int(tower.get()));
            let _ = data.insert("x".to_owned(), float(from.x()));
            let _ = data.insert("y".to_owned(), float(from.y()));
            let _ = data.insert("dir_x".to_owned(), float(direction.x()));
            let _ = data.insert("dir_y".to_owned(), float(direction.y()));
            "projectile_fired"
        }
        Event::ProjectileExpired {
            projectile,
            kind,
            at,
        } => {
            let _ = data.insert("projectile".to_owned(), int(projectile.get()));
            let _ = data.insert("kind".to_owned(), DataValue::from(kind.name()));
            let _ = data.insert("x".to_owned(), float(at.x()));
            let _ = data.insert("y".to_owned(), float(at.y()));
            "projectile_expired"
        }
        Event::GameOver { wave, score } => {
            let _ = data.insert("wave".to_owned(), int(*wave));
            let _ = data.insert("score".to_owned(), int(*score));
            "game_over"
        }
        Event::MapInstalled { .. }
        | Event::DividerChanged { .. }
        | Event::TowerPlacementRejected { .. }
        | Event::TowerSellRejected { .. }
        | Event::TowerUpgradeRejected { .. }
        | Event::TowerBoosted { .. }
        | Event::TowerUnboosted { .. }
        | Event::GoldChanged { .. }
        | Event::ScoreChanged { .. }
        | Event::LivesChanged { .. }
        | Event::TickAdvanced => return None,
    };
    Some((kind, data))
}
