#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure circle-overlap collision tests between projectiles and enemies.

use rat_defence_core::{EnemyId, EnemyProbe, Position};

/// Reports whether two circles intersect or touch.
#[must_use]
pub fn circles_overlap(a: Position, radius_a: f32, b: Position, radius_b: f32) -> bool {
    a.distance_to(b) <= radius_a + radius_b
}

/// Stateless collision resolver; callers own the output scratch buffer.
#[derive(Debug, Default)]
pub struct CollisionResolver;

impl CollisionResolver {
    /// Creates a new collision resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Collects every enemy overlapping the projectile circle, skipping those
    /// the projectile already damaged.
    ///
    /// The output buffer is cleared first; enemy order follows the candidate
    /// slice so damage application stays deterministic.
    pub fn hits(
        &self,
        projectile: Position,
        radius: f32,
        enemies: &[EnemyProbe],
        already_hit: &[EnemyId],
        out: &mut Vec<EnemyId>,
    ) {
        out.clear();
        for enemy in enemies {
            if already_hit.contains(&enemy.id) {
                continue;
            }
            if circles_overlap(projectile, radius, enemy.position, enemy.radius) {
                out.push(enemy.id);
            }
        }
    }
}
