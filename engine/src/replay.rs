//! Event-driven projection of a recorded session.
//!
//! Replay never re-simulates: the projection folds the recorded event log
//! into summary state (economy, entity tallies, outcome) exactly as written.
//! Two replays of the same log therefore always agree.

use rat_defence_core::{STARTING_GOLD, STARTING_LIVES, STARTING_WAVE};
use rat_defence_history::{DataValue, HistoryEvent, ReplaySink};

/// Summary state folded from a replayed event log.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplayProjection {
    /// Gold balance reconstructed from placements, upgrades, sales, and
    /// bounties.
    pub gold: u32,
    /// Score reconstructed from bounties.
    pub score: u32,
    /// Lives reconstructed from escapes.
    pub lives: u32,
    /// Highest wave number seen.
    pub wave: u32,
    /// Towers placed over the session.
    pub towers_placed: u32,
    /// Towers sold over the session.
    pub towers_sold: u32,
    /// Enemies spawned over the session.
    pub enemies_spawned: u32,
    /// Enemies killed over the session.
    pub enemies_killed: u32,
    /// Enemies that escaped over the session.
    pub enemies_escaped: u32,
    /// Whether the log ended in a game over.
    pub game_over: bool,
}

impl Default for ReplayProjection {
    fn default() -> Self {
        Self {
            gold: STARTING_GOLD,
            score: 0,
            lives: STARTING_LIVES,
            wave: STARTING_WAVE,
            towers_placed: 0,
            towers_sold: 0,
            enemies_spawned: 0,
            enemies_killed: 0,
            enemies_escaped: 0,
            game_over: false,
        }
    }
}

fn field_u32(event: &HistoryEvent, key: &str) -> Option<u32> {
    match event.data.get(key) {
        Some(DataValue::Int(value)) => (*value).try_into().ok(),
        _ => None,
    }
}

fn field_text<'a>(event: &'a HistoryEvent, key: &str) -> Option<&'a str> {
    match event.data.get(key) {
        Some(DataValue::Text(value)) => Some(value),
        _ => None,
    }
}

fn tower_cost(kind_name: &str) -> u32 {
    rat_defence_core::TowerKind::from_name(kind_name)
        .map(rat_defence_core::TowerKind::cost)
        .unwrap_or(0)
}

impl ReplayProjection {
    /// Creates a projection at session-start state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplaySink for ReplayProjection {
    fn on_event(&mut self, event: &HistoryEvent) {
        match event.kind.as_str() {
            "tower_placed" => {
                self.towers_placed += 1;
                if let Some(kind) = field_text(event, "kind") {
                    self.gold = self.gold.saturating_sub(tower_cost(kind));
                }
            }
            "tower_sold" => {
                self.towers_sold += 1;
                self.gold += field_u32(event, "refund").unwrap_or(0);
            }
            "tower_upgraded" => {
                self.gold = self
                    .gold
                    .saturating_sub(field_u32(event, "cost").unwrap_or(0));
            }
            "wave_started" => {
                if let Some(wave) = field_u32(event, "wave") {
                    self.wave = self.wave.max(wave);
                }
            }
            "enemy_spawned" => self.enemies_spawned += 1,
            "enemy_killed" => {
                self.enemies_killed += 1;
                let bounty = field_u32(event, "bounty").unwrap_or(0);
                self.gold += bounty;
                self.score += bounty;
            }
            "enemy_escaped" => {
                self.enemies_escaped += 1;
                self.lives = self.lives.saturating_sub(1);
            }
            "game_over" => {
                self.game_over = true;
                if let Some(wave) = field_u32(event, "wave") {
                    self.wave = wave;
                }
                if let Some(score) = field_u32(event, "score") {
                    self.score = score;
                }
            }
            _ => {}
        }
    }
}
