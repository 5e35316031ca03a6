#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes tower target acquisition and fire decisions.
//!
//! Target selection deliberately keeps first-match semantics: the first live
//! enemy encountered in iteration order within range wins, with no
//! nearest-distance tie-break.

use rat_defence_core::{EnemyId, EnemyProbe, Position, ProjectileKind, TowerId, TowerView};

/// Firing instruction produced for a single ready tower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FireOrder {
    /// Tower that should fire.
    pub tower: TowerId,
    /// Enemy the shot was aimed at when the decision was made.
    pub target: EnemyId,
    /// Kind of projectile to launch.
    pub kind: ProjectileKind,
    /// Spawn position of the projectile (the tower centre).
    pub origin: Position,
    /// Unit direction toward the target's position at fire time.
    pub direction: Position,
    /// Damage the projectile carries, taken from the tower's effective stats.
    pub damage: i32,
}

/// Tower targeting system evaluated once per tick.
#[derive(Debug, Default)]
pub struct TowerTargeting;

impl TowerTargeting {
    /// Creates a new targeting system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Emits a [`FireOrder`] for every tower that is off cooldown and has an
    /// enemy within range.
    ///
    /// Towers still on cooldown and towers without a projectile kind
    /// (boosters) never fire. The output buffer is cleared first.
    pub fn handle(&mut self, towers: &TowerView, enemies: &[EnemyProbe], out: &mut Vec<FireOrder>) {
        out.clear();

        if enemies.is_empty() {
            return;
        }

        for tower in towers.iter() {
            let Some(kind) = tower.kind.projectile() else {
                continue;
            };

            if tower.cooldown > 0 {
                continue;
            }

            let Some(target) = first_target(tower.position, tower.range, enemies) else {
                continue;
            };

            out.push(FireOrder {
                tower: tower.id,
                target: target.id,
                kind,
                origin: tower.position,
                direction: tower.position.direction_to(target.position),
                damage: tower.damage,
            });
        }
    }
}

/// Returns the first enemy in iteration order within `range` of `origin`.
#[must_use]
pub fn first_target(origin: Position, range: f32, enemies: &[EnemyProbe]) -> Option<EnemyProbe> {
    enemies
        .iter()
        .copied()
        .find(|enemy| origin.distance_to(enemy.position) <= range)
}
