//! Entity records owned by the world.

use rat_defence_core::{
    EnemyId, EnemyKind, EnemyProbe, EnemySnapshot, GridPos, Position, ProjectileId,
    ProjectileKind, ProjectileSnapshot, TowerId, TowerKind, TowerSnapshot, BOOST_MODIFIER,
};

/// Enemy walking the path from start to end.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) position: Position,
    pub(crate) health: i32,
    pub(crate) waypoint: usize,
}

impl Enemy {
    pub(crate) fn probe(&self) -> EnemyProbe {
        EnemyProbe {
            id: self.id,
            position: self.position,
            radius: self.kind.radius(),
        }
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            health: self.health,
            waypoint: self.waypoint,
        }
    }
}

/// Placed tower. Effective stats are derived from the base kind, the upgrade
/// level, and the boost state; they are never stored.
#[derive(Clone, Debug)]
pub(crate) struct Tower {
    pub(crate) id: TowerId,
    pub(crate) kind: TowerKind,
    pub(crate) at: GridPos,
    pub(crate) level: u32,
    pub(crate) cooldown: u32,
    pub(crate) kills: u32,
    pub(crate) boosted_by: Option<TowerId>,
}

impl Tower {
    pub(crate) fn new(id: TowerId, kind: TowerKind, at: GridPos) -> Self {
        Self {
            id,
            kind,
            at,
            level: 0,
            cooldown: 0,
            kills: 0,
            boosted_by: None,
        }
    }

    fn boost(&self) -> f32 {
        if self.boosted_by.is_some() {
            BOOST_MODIFIER
        } else {
            1.0
        }
    }

    pub(crate) fn position(&self) -> Position {
        self.at.center()
    }

    pub(crate) fn damage(&self) -> i32 {
        let base = self.kind.damage() + self.level as i32 * self.kind.upgrade_damage();
        (base as f32 * self.boost()) as i32
    }

    pub(crate) fn range(&self) -> f32 {
        (self.kind.range() + self.level as f32 * self.kind.upgrade_range()) * self.boost()
    }

    /// Cooldown period in ticks; boosting shortens it, never below one tick.
    pub(crate) fn fire_rate(&self) -> u32 {
        let base = self
            .kind
            .fire_rate()
            .saturating_sub(self.level * self.kind.upgrade_fire_rate())
            .max(1);
        ((base as f32 / self.boost()) as u32).max(1)
    }

    /// Gold the player has sunk into the tower, the basis for the sale refund.
    fn sale_basis(&self) -> u32 {
        self.kind.cost() + self.level * self.kind.upgrade_cost_increase()
    }

    pub(crate) fn sell_value(&self) -> u32 {
        self.sale_basis() / 2
    }

    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            at: self.at,
            position: self.position(),
            damage: self.damage(),
            range: self.range(),
            fire_rate: self.fire_rate(),
            cooldown: self.cooldown,
            level: self.level,
            kills: self.kills,
            boosted: self.boosted_by.is_some(),
            sell_value: self.sell_value(),
            upgrade_cost: self.kind.upgrade_cost(),
        }
    }
}

/// Projectile in flight. Damage is captured from the firing tower at launch
/// time so later upgrades or sales never retroactively change a shot.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) kind: ProjectileKind,
    pub(crate) position: Position,
    pub(crate) direction: Position,
    pub(crate) damage: i32,
    pub(crate) pierce: i32,
    pub(crate) lifetime: u32,
    pub(crate) owner: Option<TowerId>,
    pub(crate) already_hit: Vec<EnemyId>,
}

impl Projectile {
    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            direction: self.direction,
            damage: self.damage,
            pierce: self.pierce,
            lifetime: self.lifetime,
            owner: self.owner,
        }
    }
}
