#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Rat Defence simulation.
//!
//! All mutation flows through [`apply`], which executes one [`Command`] and
//! appends the resulting [`Event`] values to the caller's buffer. Reads go
//! through the [`query`] module. The per-tick pipeline delegates target
//! selection and overlap math to the pure combat system crates so the world
//! only owns state transitions.

mod entities;

use std::collections::VecDeque;

use rat_defence_core::{
    Command, EnemyId, EnemyKind, Event, Grid, GridPos, MapBlueprint, PlacementError, PlayerSide,
    Position, ProjectileId, ProjectileKind, SellError, TowerId, TowerKind, TowerView,
    UpgradeError, EXPLOSION_DAMAGE, STARTING_GOLD, STARTING_LIVES, STARTING_WAVE,
    TOWER_FOOTPRINT_RADIUS, WAYPOINT_THRESHOLD,
};
use rat_defence_core::EnemyProbe;
use rat_defence_system_collision::{circles_overlap, CollisionResolver};
use rat_defence_system_tower_targeting::{FireOrder, TowerTargeting};

use entities::{Enemy, Projectile, Tower};

/// Authoritative game state. Mutated exclusively through [`apply`].
#[derive(Debug)]
pub struct World {
    grid: Grid,
    path: Vec<GridPos>,
    waypoints: Vec<Position>,
    divider: Option<u32>,
    enemies: Vec<Enemy>,
    towers: Vec<Tower>,
    projectiles: Vec<Projectile>,
    pending_spawns: VecDeque<EnemyKind>,
    wave: u32,
    wave_active: bool,
    gold: u32,
    score: u32,
    lives: u32,
    game_over: bool,
    next_enemy_id: u32,
    next_tower_id: u32,
    next_projectile_id: u32,
    targeting: TowerTargeting,
    collision: CollisionResolver,
    fire_orders: Vec<FireOrder>,
    probes: Vec<EnemyProbe>,
    hit_buffer: Vec<EnemyId>,
}

impl World {
    /// Creates an empty world. Nothing meaningful happens until a map is
    /// installed via [`Command::InstallMap`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            grid: Grid::new(0, 0),
            path: Vec::new(),
            waypoints: Vec::new(),
            divider: None,
            enemies: Vec::new(),
            towers: Vec::new(),
            projectiles: Vec::new(),
            pending_spawns: VecDeque::new(),
            wave: STARTING_WAVE,
            wave_active: false,
            gold: STARTING_GOLD,
            score: 0,
            lives: STARTING_LIVES,
            game_over: false,
            next_enemy_id: 0,
            next_tower_id: 0,
            next_projectile_id: 0,
            targeting: TowerTargeting::new(),
            collision: CollisionResolver::new(),
            fire_orders: Vec::new(),
            probes: Vec::new(),
            hit_buffer: Vec::new(),
        }
    }

    fn install_map(&mut self, blueprint: MapBlueprint, out_events: &mut Vec<Event>) {
        let (grid, path) = blueprint.into_parts();
        self.waypoints = path.iter().map(GridPos::center).collect();
        self.grid = grid;
        self.path = path;
        self.enemies.clear();
        self.towers.clear();
        self.projectiles.clear();
        self.pending_spawns.clear();
        self.wave = STARTING_WAVE;
        self.wave_active = false;
        self.gold = STARTING_GOLD;
        self.score = 0;
        self.lives = STARTING_LIVES;
        self.game_over = false;
        self.next_enemy_id = 0;
        self.next_tower_id = 0;
        self.next_projectile_id = 0;
        out_events.push(Event::MapInstalled {
            width: self.grid.width(),
            height: self.grid.height(),
        });
    }

    fn placement_check(
        &self,
        kind: TowerKind,
        at: GridPos,
        side: PlayerSide,
    ) -> Result<(), PlacementError> {
        if !self.grid.in_bounds(at) {
            return Err(PlacementError::OutOfBounds);
        }
        match self.grid.tile(at) {
            Some(tile) if tile.is_buildable() => {}
            _ => return Err(PlacementError::Blocked),
        }
        if self.towers.iter().any(|tower| tower.at == at) {
            return Err(PlacementError::Occupied);
        }
        if let Some(column) = self.divider {
            let allowed = match side {
                PlayerSide::Solo => true,
                PlayerSide::Left => at.x() < column,
                PlayerSide::Right => at.x() > column,
            };
            if !allowed {
                return Err(PlacementError::WrongSide);
            }
        }
        if self.gold < kind.cost() {
            return Err(PlacementError::InsufficientFunds);
        }
        Ok(())
    }

    fn place_tower(
        &mut self,
        kind: TowerKind,
        at: GridPos,
        side: PlayerSide,
        out_events: &mut Vec<Event>,
    ) {
        if let Err(reason) = self.placement_check(kind, at, side) {
            out_events.push(Event::TowerPlacementRejected { kind, at, reason });
            return;
        }

        let id = TowerId::new(self.next_tower_id);
        self.next_tower_id += 1;
        self.gold -= kind.cost();
        self.towers.push(Tower::new(id, kind, at));
        out_events.push(Event::TowerPlaced {
            tower: id,
            kind,
            at,
        });
        out_events.push(Event::GoldChanged { gold: self.gold });
        self.refresh_boosts(out_events);
    }

    fn sell_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        let Some(index) = self.towers.iter().position(|entry| entry.id == tower) else {
            out_events.push(Event::TowerSellRejected {
                tower,
                reason: SellError::MissingTower,
            });
            return;
        };

        let sold = self.towers.remove(index);
        let refund = sold.sell_value();
        self.gold += refund;
        for projectile in &mut self.projectiles {
            if projectile.owner == Some(tower) {
                projectile.owner = None;
            }
        }
        out_events.push(Event::TowerSold { tower, refund });
        out_events.push(Event::GoldChanged { gold: self.gold });
        self.refresh_boosts(out_events);
    }

    fn upgrade_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        let Some(entry) = self.towers.iter_mut().find(|entry| entry.id == tower) else {
            out_events.push(Event::TowerUpgradeRejected {
                tower,
                reason: UpgradeError::MissingTower,
            });
            return;
        };

        if entry.level >= entry.kind.max_upgrade_level() {
            out_events.push(Event::TowerUpgradeRejected {
                tower,
                reason: UpgradeError::MaxLevel,
            });
            return;
        }
        let cost = entry.kind.upgrade_cost();
        if self.gold < cost {
            out_events.push(Event::TowerUpgradeRejected {
                tower,
                reason: UpgradeError::InsufficientFunds,
            });
            return;
        }

        entry.level += 1;
        let level = entry.level;
        self.gold -= cost;
        out_events.push(Event::TowerUpgraded { tower, level, cost });
        out_events.push(Event::GoldChanged { gold: self.gold });
        self.refresh_boosts(out_events);
    }

    /// Recomputes which towers sit inside a booster footprint and emits boost
    /// transition events for the differences. Boosters never stack: the first
    /// covering booster in identifier order wins.
    fn refresh_boosts(&mut self, out_events: &mut Vec<Event>) {
        let boosters: Vec<(TowerId, Position, f32)> = self
            .towers
            .iter()
            .filter(|tower| tower.kind == TowerKind::Booster)
            .map(|tower| (tower.id, tower.position(), tower.range()))
            .collect();

        for tower in &mut self.towers {
            if tower.kind == TowerKind::Booster {
                continue;
            }
            let position = tower.position();
            let current = boosters
                .iter()
                .find(|(_, origin, range)| {
                    circles_overlap(*origin, *range, position, TOWER_FOOTPRINT_RADIUS)
                })
                .map(|(id, _, _)| *id);
            if current != tower.boosted_by {
                if let Some(previous) = tower.boosted_by {
                    out_events.push(Event::TowerUnboosted {
                        tower: tower.id,
                        by: previous,
                    });
                }
                if let Some(fresh) = current {
                    out_events.push(Event::TowerBoosted {
                        tower: tower.id,
                        by: fresh,
                    });
                }
                tower.boosted_by = current;
            }
        }
    }

    fn start_wave(&mut self, spawns: Vec<EnemyKind>, out_events: &mut Vec<Event>) {
        if self.wave_active || self.waypoints.is_empty() {
            return;
        }
        let count = spawns.len() as u32;
        self.pending_spawns = spawns.into();
        self.wave_active = true;
        out_events.push(Event::WaveStarted {
            wave: self.wave,
            spawns: count,
        });
    }

    fn spawn_enemy(&mut self, out_events: &mut Vec<Event>) {
        let Some(kind) = self.pending_spawns.pop_front() else {
            return;
        };
        let Some(origin) = self.waypoints.first() else {
            return;
        };

        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id += 1;
        self.enemies.push(Enemy {
            id,
            kind,
            position: *origin,
            health: kind.max_health(),
            waypoint: 1,
        });
        out_events.push(Event::EnemySpawned { enemy: id, kind });
    }

    fn tick(&mut self, out_events: &mut Vec<Event>) {
        out_events.push(Event::TickAdvanced);
        self.update_enemies(out_events);
        self.update_towers(out_events);
        self.update_projectiles();
        self.resolve_collisions(out_events);
        self.cleanup(out_events);
    }

    fn update_enemies(&mut self, out_events: &mut Vec<Event>) {
        let mut escaped: Vec<EnemyId> = Vec::new();

        for enemy in self.enemies.iter_mut() {
            let Some(target) = self.waypoints.get(enemy.waypoint) else {
                escaped.push(enemy.id);
                continue;
            };
            let speed = enemy.kind.speed();
            let threshold = WAYPOINT_THRESHOLD.max(speed);
            let distance = enemy.position.distance_to(*target);
            if distance <= threshold {
                enemy.waypoint += 1;
                if enemy.waypoint >= self.waypoints.len() {
                    escaped.push(enemy.id);
                }
                continue;
            }
            let direction = enemy.position.direction_to(*target);
            enemy.position = enemy.position.advanced_by(direction, speed.min(distance));
        }

        for id in escaped {
            let Some(index) = self.enemies.iter().position(|enemy| enemy.id == id) else {
                continue;
            };
            let enemy = self.enemies.remove(index);
            self.lives = self.lives.saturating_sub(1);
            out_events.push(Event::EnemyEscaped {
                enemy: enemy.id,
                kind: enemy.kind,
            });
            out_events.push(Event::LivesChanged { lives: self.lives });
        }
    }

    fn update_towers(&mut self, out_events: &mut Vec<Event>) {
        for tower in &mut self.towers {
            tower.cooldown = tower.cooldown.saturating_sub(1);
        }

        self.probes.clear();
        self.probes.extend(self.enemies.iter().map(Enemy::probe));
        let view = TowerView::from_snapshots(self.towers.iter().map(Tower::snapshot).collect());

        let mut orders = std::mem::take(&mut self.fire_orders);
        self.targeting.handle(&view, &self.probes, &mut orders);
        for order in &orders {
            let id = ProjectileId::new(self.next_projectile_id);
            self.next_projectile_id += 1;
            self.projectiles.push(Projectile {
                id,
                kind: order.kind,
                position: order.origin,
                direction: order.direction,
                damage: order.damage,
                pierce: order.kind.pierce(),
                lifetime: order.kind.lifetime(),
                owner: Some(order.tower),
                already_hit: Vec::new(),
            });
            if let Some(tower) = self.towers.iter_mut().find(|entry| entry.id == order.tower) {
                tower.cooldown = tower.fire_rate();
            }
            out_events.push(Event::ProjectileFired {
                projectile: id,
                kind: order.kind,
                tower: order.tower,
                from: order.origin,
                direction: order.direction,
            });
        }
        self.fire_orders = orders;
    }

    fn update_projectiles(&mut self) {
        for projectile in &mut self.projectiles {
            let speed = projectile.kind.speed();
            if speed > 0.0 {
                projectile.position = projectile.position.advanced_by(projectile.direction, speed);
            }
            projectile.lifetime = projectile.lifetime.saturating_sub(1);
        }
    }

    fn resolve_collisions(&mut self, out_events: &mut Vec<Event>) {
        self.probes.clear();
        self.probes.extend(self.enemies.iter().map(Enemy::probe));

        let mut kills: Vec<(EnemyId, Option<TowerId>)> = Vec::new();
        let mut hits = std::mem::take(&mut self.hit_buffer);

        for index in 0..self.projectiles.len() {
            if self.projectiles[index].pierce < 0 {
                continue;
            }
            let position = self.projectiles[index].position;
            let radius = self.projectiles[index].kind.radius();
            self.collision.hits(
                position,
                radius,
                &self.probes,
                &self.projectiles[index].already_hit,
                &mut hits,
            );

            for enemy_id in &hits {
                let projectile = &mut self.projectiles[index];
                if projectile.pierce < 0 {
                    break;
                }
                let Some(enemy) = self.enemies.iter_mut().find(|enemy| enemy.id == *enemy_id)
                else {
                    continue;
                };
                if enemy.health <= 0 {
                    continue;
                }
                enemy.health -= projectile.damage;
                projectile.already_hit.push(*enemy_id);
                projectile.pierce -= 1;
                if enemy.health <= 0 {
                    kills.push((*enemy_id, projectile.owner));
                }
            }
        }
        self.hit_buffer = hits;

        for (enemy_id, owner) in kills {
            let Some(index) = self.enemies.iter().position(|enemy| enemy.id == enemy_id) else {
                continue;
            };
            let enemy = self.enemies.remove(index);
            let bounty = enemy.kind.bounty();
            let by = owner.filter(|id| self.towers.iter().any(|tower| tower.id == *id));
            if let Some(credited) = by {
                if let Some(tower) = self.towers.iter_mut().find(|tower| tower.id == credited) {
                    tower.kills += 1;
                }
            }
            self.gold += bounty;
            self.score += bounty;
            out_events.push(Event::EnemyKilled {
                enemy: enemy.id,
                kind: enemy.kind,
                by,
                bounty,
            });
            out_events.push(Event::GoldChanged { gold: self.gold });
            out_events.push(Event::ScoreChanged { score: self.score });
        }
    }

    fn cleanup(&mut self, out_events: &mut Vec<Event>) {
        let mut index = 0;
        while index < self.projectiles.len() {
            let expired = {
                let projectile = &self.projectiles[index];
                projectile.pierce < 0 || projectile.lifetime == 0
            };
            if !expired {
                index += 1;
                continue;
            }

            let projectile = self.projectiles.remove(index);
            out_events.push(Event::ProjectileExpired {
                projectile: projectile.id,
                kind: projectile.kind,
                at: projectile.position,
            });

            // A spent bomb turns into a stationary area blast in place.
            if projectile.kind == ProjectileKind::Bomb {
                let id = ProjectileId::new(self.next_projectile_id);
                self.next_projectile_id += 1;
                self.projectiles.insert(
                    index,
                    Projectile {
                        id,
                        kind: ProjectileKind::Explosion,
                        position: projectile.position,
                        direction: projectile.direction,
                        damage: EXPLOSION_DAMAGE,
                        pierce: ProjectileKind::Explosion.pierce(),
                        lifetime: ProjectileKind::Explosion.lifetime(),
                        owner: projectile.owner,
                        already_hit: Vec::new(),
                    },
                );
                index += 1;
            }
        }

        if self.wave_active && self.pending_spawns.is_empty() && self.enemies.is_empty() {
            out_events.push(Event::WaveEnded { wave: self.wave });
            self.wave_active = false;
            self.wave += 1;
        }

        if self.lives == 0 && !self.game_over {
            self.game_over = true;
            out_events.push(Event::GameOver {
                wave: self.wave,
                score: self.score,
            });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Once the session has ended only [`Command::InstallMap`] is honoured; every
/// other command is dropped without emitting events.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if world.game_over && !matches!(command, Command::InstallMap { .. }) {
        return;
    }

    match command {
        Command::InstallMap { blueprint } => world.install_map(blueprint, out_events),
        Command::SetDivider { column } => {
            world.divider = column;
            out_events.push(Event::DividerChanged { column });
        }
        Command::PlaceTower { kind, at, side } => world.place_tower(kind, at, side, out_events),
        Command::SellTower { tower } => world.sell_tower(tower, out_events),
        Command::UpgradeTower { tower } => world.upgrade_tower(tower, out_events),
        Command::StartWave { spawns } => world.start_wave(spawns, out_events),
        Command::SpawnEnemy => world.spawn_enemy(out_events),
        Command::Tick => world.tick(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{
        entities::{Enemy, Projectile, Tower},
        World,
    };
    use rat_defence_core::{
        EnemyView, Grid, GridPos, PlacementError, PlayerSide, ProjectileView, TowerId, TowerKind,
        TowerView,
    };

    /// Captures a read-only view of all live enemies.
    #[must_use]
    pub fn enemies(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.iter().map(Enemy::snapshot).collect())
    }

    /// Captures a read-only view of all placed towers with effective stats.
    #[must_use]
    pub fn towers(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(Tower::snapshot).collect())
    }

    /// Captures a read-only view of all projectiles in flight.
    #[must_use]
    pub fn projectiles(world: &World) -> ProjectileView {
        ProjectileView::from_snapshots(world.projectiles.iter().map(Projectile::snapshot).collect())
    }

    /// Provides read-only access to the installed tile grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Waypoint tiles of the installed path, in traversal order.
    #[must_use]
    pub fn path(world: &World) -> &[GridPos] {
        &world.path
    }

    /// Current gold balance.
    #[must_use]
    pub fn gold(world: &World) -> u32 {
        world.gold
    }

    /// Current score.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.score
    }

    /// Lives remaining before the session ends.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// Current wave number.
    #[must_use]
    pub fn wave(world: &World) -> u32 {
        world.wave
    }

    /// Reports whether a wave is currently releasing or fighting enemies.
    #[must_use]
    pub fn wave_active(world: &World) -> bool {
        world.wave_active
    }

    /// Number of enemies still queued for release in the current wave.
    #[must_use]
    pub fn pending_spawns(world: &World) -> usize {
        world.pending_spawns.len()
    }

    /// Reports whether the session has ended.
    #[must_use]
    pub fn is_game_over(world: &World) -> bool {
        world.game_over
    }

    /// Configured split-screen divider column, if any.
    #[must_use]
    pub fn divider(world: &World) -> Option<u32> {
        world.divider
    }

    /// Validates a placement request without mutating anything.
    pub fn placement_valid(
        world: &World,
        kind: TowerKind,
        at: GridPos,
        side: PlayerSide,
    ) -> Result<(), PlacementError> {
        world.placement_check(kind, at, side)
    }

    /// Finds the tower occupying the provided tile, if any.
    #[must_use]
    pub fn tower_at(world: &World, at: GridPos) -> Option<TowerId> {
        world
            .towers
            .iter()
            .find(|tower| tower.at == at)
            .map(|tower| tower.id)
    }
}

#[cfg(test)]
mod tests {
    use super::{apply, query, World};
    use rat_defence_core::{
        Command, EnemyKind, Event, Grid, GridPos, MapBlueprint, PlacementError, PlayerSide,
        ProjectileKind, SellError, TileType, TowerId, TowerKind, UpgradeError,
    };

    fn straight_blueprint(width: u32, height: u32, row: u32) -> MapBlueprint {
        let mut grid = Grid::new(width, height);
        for x in 0..width {
            assert!(grid.set_tile(GridPos::new(x, row), TileType::Path));
        }
        assert!(grid.set_tile(GridPos::new(0, row), TileType::Start));
        assert!(grid.set_tile(GridPos::new(width - 1, row), TileType::End));
        MapBlueprint::new(
            grid,
            vec![GridPos::new(0, row), GridPos::new(width - 1, row)],
        )
    }

    fn fresh_world() -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::InstallMap {
                blueprint: straight_blueprint(10, 3, 1),
            },
            &mut events,
        );
        assert!(events.contains(&Event::MapInstalled {
            width: 10,
            height: 3
        }));
        world
    }

    fn run(world: &mut World, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, command, &mut events);
        events
    }

    fn run_ticks(world: &mut World, count: usize) -> Vec<Event> {
        let mut collected = Vec::new();
        for _ in 0..count {
            apply(world, Command::Tick, &mut collected);
        }
        collected
    }

    fn place(world: &mut World, kind: TowerKind, x: u32, y: u32) -> TowerId {
        let events = run(
            world,
            Command::PlaceTower {
                kind,
                at: GridPos::new(x, y),
                side: PlayerSide::Solo,
            },
        );
        events
            .iter()
            .find_map(|event| match event {
                Event::TowerPlaced { tower, .. } => Some(*tower),
                _ => None,
            })
            .expect("tower placement accepted")
    }

    #[test]
    fn placing_a_tower_deducts_its_cost() {
        let mut world = fresh_world();
        let _ = place(&mut world, TowerKind::Basic, 4, 0);
        assert_eq!(query::gold(&world), 70);
        assert_eq!(query::towers(&world).len(), 1);
    }

    #[test]
    fn placement_rejections_carry_specific_reasons() {
        let mut world = fresh_world();

        let events = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                at: GridPos::new(99, 0),
                side: PlayerSide::Solo,
            },
        );
        assert!(matches!(
            events[0],
            Event::TowerPlacementRejected {
                reason: PlacementError::OutOfBounds,
                ..
            }
        ));

        let events = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                at: GridPos::new(4, 1),
                side: PlayerSide::Solo,
            },
        );
        assert!(matches!(
            events[0],
            Event::TowerPlacementRejected {
                reason: PlacementError::Blocked,
                ..
            }
        ));

        let _ = place(&mut world, TowerKind::Basic, 4, 0);
        let events = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                at: GridPos::new(4, 0),
                side: PlayerSide::Solo,
            },
        );
        assert!(matches!(
            events[0],
            Event::TowerPlacementRejected {
                reason: PlacementError::Occupied,
                ..
            }
        ));

        let _ = place(&mut world, TowerKind::Basic, 5, 0);
        let _ = place(&mut world, TowerKind::Basic, 6, 0);
        let events = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                at: GridPos::new(7, 0),
                side: PlayerSide::Solo,
            },
        );
        assert!(matches!(
            events[0],
            Event::TowerPlacementRejected {
                reason: PlacementError::InsufficientFunds,
                ..
            }
        ));
    }

    #[test]
    fn divider_confines_each_player_to_their_side() {
        let mut world = fresh_world();
        let events = run(&mut world, Command::SetDivider { column: Some(5) });
        assert_eq!(events, vec![Event::DividerChanged { column: Some(5) }]);

        let events = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                at: GridPos::new(7, 0),
                side: PlayerSide::Left,
            },
        );
        assert!(matches!(
            events[0],
            Event::TowerPlacementRejected {
                reason: PlacementError::WrongSide,
                ..
            }
        ));

        let events = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                at: GridPos::new(7, 0),
                side: PlayerSide::Right,
            },
        );
        assert!(matches!(events[0], Event::TowerPlaced { .. }));
    }

    #[test]
    fn selling_refunds_half_the_invested_cost() {
        let mut world = fresh_world();
        let tower = place(&mut world, TowerKind::Basic, 4, 0);

        let events = run(&mut world, Command::SellTower { tower });
        assert!(events.contains(&Event::TowerSold { tower, refund: 15 }));
        assert_eq!(query::gold(&world), 85);
        assert!(query::towers(&world).is_empty());
    }

    #[test]
    fn upgrading_raises_stats_and_sale_value() {
        let mut world = fresh_world();
        let tower = place(&mut world, TowerKind::Basic, 4, 0);

        let events = run(&mut world, Command::UpgradeTower { tower });
        assert!(events.contains(&Event::TowerUpgraded {
            tower,
            level: 1,
            cost: 20,
        }));
        assert_eq!(query::gold(&world), 50);

        let view = query::towers(&world);
        let snapshot = view.iter().next().expect("tower exists");
        assert_eq!(snapshot.damage, 15);
        assert_eq!(snapshot.range, 120.0);
        assert_eq!(snapshot.fire_rate, 90);
        assert_eq!(snapshot.sell_value, 25);
    }

    #[test]
    fn upgrade_rejected_at_max_level() {
        let mut world = fresh_world();
        let tower = place(&mut world, TowerKind::Basic, 4, 0);
        for _ in 0..3 {
            let events = run(&mut world, Command::UpgradeTower { tower });
            assert!(!events.is_empty());
        }

        let events = run(&mut world, Command::UpgradeTower { tower });
        assert!(events.contains(&Event::TowerUpgradeRejected {
            tower,
            reason: UpgradeError::MaxLevel,
        }));
    }

    #[test]
    fn operations_on_missing_towers_are_rejected() {
        let mut world = fresh_world();
        let ghost = TowerId::new(77);

        let events = run(&mut world, Command::SellTower { tower: ghost });
        assert!(events.contains(&Event::TowerSellRejected {
            tower: ghost,
            reason: SellError::MissingTower,
        }));

        let events = run(&mut world, Command::UpgradeTower { tower: ghost });
        assert!(events.contains(&Event::TowerUpgradeRejected {
            tower: ghost,
            reason: UpgradeError::MissingTower,
        }));
    }

    #[test]
    fn booster_boosts_covered_towers_exactly_once() {
        let mut world = fresh_world();
        let basic = place(&mut world, TowerKind::Basic, 4, 0);
        let events = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Booster,
                at: GridPos::new(5, 0),
                side: PlayerSide::Solo,
            },
        );
        let booster = events
            .iter()
            .find_map(|event| match event {
                Event::TowerPlaced { tower, .. } => Some(*tower),
                _ => None,
            })
            .expect("booster placed");
        assert!(events.contains(&Event::TowerBoosted {
            tower: basic,
            by: booster,
        }));

        let view = query::towers(&world);
        let snapshot = view
            .iter()
            .find(|snapshot| snapshot.id == basic)
            .expect("basic tower");
        assert!(snapshot.boosted);
        assert_eq!(snapshot.damage, 15);
        assert_eq!(snapshot.fire_rate, 66);

        // A second covering booster must not stack another multiplier.
        let events = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Bomb,
                at: GridPos::new(3, 0),
                side: PlayerSide::Solo,
            },
        );
        assert!(events.iter().all(|event| !matches!(
            event,
            Event::TowerBoosted { tower, .. } if *tower == basic
        )));
    }

    #[test]
    fn selling_the_booster_reverts_the_boost() {
        let mut world = fresh_world();
        let basic = place(&mut world, TowerKind::Basic, 4, 0);
        let booster = place(&mut world, TowerKind::Booster, 5, 0);

        let events = run(&mut world, Command::SellTower { tower: booster });
        assert!(events.contains(&Event::TowerUnboosted {
            tower: basic,
            by: booster,
        }));
        let view = query::towers(&world);
        let snapshot = view.iter().next().expect("basic tower");
        assert!(!snapshot.boosted);
        assert_eq!(snapshot.damage, 10);
    }

    #[test]
    fn starting_a_wave_queues_spawns() {
        let mut world = fresh_world();
        let events = run(
            &mut world,
            Command::StartWave {
                spawns: vec![EnemyKind::Rat, EnemyKind::FastRat],
            },
        );
        assert!(events.contains(&Event::WaveStarted { wave: 1, spawns: 2 }));
        assert_eq!(query::pending_spawns(&world), 2);
        assert!(query::wave_active(&world));

        let events = run(&mut world, Command::SpawnEnemy);
        assert!(matches!(events[0], Event::EnemySpawned { .. }));
        assert_eq!(query::pending_spawns(&world), 1);
        assert_eq!(query::enemies(&world).len(), 1);
    }

    #[test]
    fn enemies_walk_toward_the_next_waypoint() {
        let mut world = fresh_world();
        let _ = run(
            &mut world,
            Command::StartWave {
                spawns: vec![EnemyKind::Rat],
            },
        );
        let _ = run(&mut world, Command::SpawnEnemy);
        let _ = run_ticks(&mut world, 4);

        let view = query::enemies(&world);
        let snapshot = view.iter().next().expect("enemy alive");
        assert!((snapshot.position.x() - 22.0).abs() < 1e-3);
        assert!((snapshot.position.y() - 60.0).abs() < 1e-3);
    }

    #[test]
    fn escaped_enemies_cost_a_life_and_end_the_wave() {
        let mut world = World::new();
        let _ = run(
            &mut world,
            Command::InstallMap {
                blueprint: straight_blueprint(2, 3, 1),
            },
        );
        let _ = run(
            &mut world,
            Command::StartWave {
                spawns: vec![EnemyKind::FastRat],
            },
        );
        let _ = run(&mut world, Command::SpawnEnemy);

        let events = run_ticks(&mut world, 60);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::EnemyEscaped { .. })));
        assert!(events.contains(&Event::LivesChanged { lives: 19 }));
        assert!(events.contains(&Event::WaveEnded { wave: 1 }));
        assert_eq!(query::wave(&world), 2);
        assert!(!query::wave_active(&world));
    }

    #[test]
    fn towers_fire_once_per_cooldown_period() {
        let mut world = fresh_world();
        let _ = place(&mut world, TowerKind::Basic, 1, 0);
        let _ = run(
            &mut world,
            Command::StartWave {
                spawns: vec![EnemyKind::GiantRat],
            },
        );
        let _ = run(&mut world, Command::SpawnEnemy);

        let events = run_ticks(&mut world, 10);
        let fired = events
            .iter()
            .filter(|event| matches!(event, Event::ProjectileFired { .. }))
            .count();
        assert_eq!(fired, 1);
    }

    #[test]
    fn kills_award_bounty_and_credit_the_tower() {
        let mut world = fresh_world();
        let tower = place(&mut world, TowerKind::Basic, 1, 0);
        let _ = run(&mut world, Command::UpgradeTower { tower });
        let _ = run(&mut world, Command::UpgradeTower { tower });
        let gold_before = query::gold(&world);
        let _ = run(
            &mut world,
            Command::StartWave {
                spawns: vec![EnemyKind::Rat],
            },
        );
        let _ = run(&mut world, Command::SpawnEnemy);

        let events = run_ticks(&mut world, 200);
        let kill = events
            .iter()
            .find_map(|event| match event {
                Event::EnemyKilled { by, bounty, .. } => Some((*by, *bounty)),
                _ => None,
            })
            .expect("rat killed");
        assert_eq!(kill, (Some(tower), 20));
        assert_eq!(query::gold(&world), gold_before + 20);
        assert_eq!(query::score(&world), 20);

        let view = query::towers(&world);
        assert_eq!(view.iter().next().expect("tower exists").kills, 1);
    }

    #[test]
    fn a_lone_tower_clears_a_full_rat_wave() {
        let mut world = fresh_world();
        let tower = place(&mut world, TowerKind::Basic, 1, 0);
        let _ = run(&mut world, Command::UpgradeTower { tower });
        let _ = run(&mut world, Command::UpgradeTower { tower });
        let gold_before = query::gold(&world);

        let _ = run(
            &mut world,
            Command::StartWave {
                spawns: vec![EnemyKind::Rat; 5],
            },
        );
        let mut events = Vec::new();
        for _ in 0..5 {
            events.extend(run(&mut world, Command::SpawnEnemy));
            events.extend(run_ticks(&mut world, 100));
        }

        let kills = events
            .iter()
            .filter(|event| matches!(event, Event::EnemyKilled { .. }))
            .count();
        assert_eq!(kills, 5, "every rat must die in range of the tower");
        assert!(events
            .iter()
            .all(|event| !matches!(event, Event::EnemyEscaped { .. })));
        assert_eq!(query::gold(&world), gold_before + 5 * 20);
        assert_eq!(query::lives(&world), 20);
        assert!(events.contains(&Event::WaveEnded { wave: 1 }));
        assert_eq!(query::wave(&world), 2);

        let view = query::towers(&world);
        assert_eq!(view.iter().next().expect("tower exists").kills, 5);
    }

    #[test]
    fn explosions_damage_every_overlapping_enemy() {
        let mut world = fresh_world();
        let tower = place(&mut world, TowerKind::Bomb, 1, 0);
        let _ = run(
            &mut world,
            Command::StartWave {
                spawns: vec![EnemyKind::Rat; 3],
            },
        );
        // Released back to back the rats march in a single stack, so one
        // blast covers all of them.
        for _ in 0..3 {
            let _ = run(&mut world, Command::SpawnEnemy);
        }

        let events = run_ticks(&mut world, 50);
        let fired = events
            .iter()
            .filter(|event| matches!(event, Event::ProjectileFired { .. }))
            .count();
        assert_eq!(fired, 1, "a single bomb launch must clear the stack");

        let kills: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                Event::EnemyKilled { by, .. } => Some(*by),
                _ => None,
            })
            .collect();
        assert_eq!(kills.len(), 3);
        assert!(kills.iter().all(|by| *by == Some(tower)));
        assert_eq!(query::enemies(&world).len(), 0);
        assert_eq!(query::gold(&world), 100 - 50 + 3 * 20);

        let view = query::towers(&world);
        assert_eq!(view.iter().next().expect("tower exists").kills, 3);
    }

    #[test]
    fn spent_bombs_detonate_into_explosions() {
        let mut world = fresh_world();
        let _ = place(&mut world, TowerKind::Bomb, 1, 0);
        let _ = run(
            &mut world,
            Command::StartWave {
                spawns: vec![EnemyKind::GiantRat],
            },
        );
        let _ = run(&mut world, Command::SpawnEnemy);

        let mut saw_explosion = false;
        for _ in 0..300 {
            let events = run_ticks(&mut world, 1);
            if events.iter().any(|event| {
                matches!(
                    event,
                    Event::ProjectileExpired {
                        kind: ProjectileKind::Bomb,
                        ..
                    }
                )
            }) {
                let view = query::projectiles(&world);
                saw_explosion = view
                    .iter()
                    .any(|snapshot| snapshot.kind == ProjectileKind::Explosion);
                break;
            }
        }
        assert!(saw_explosion);
    }

    #[test]
    fn game_ends_when_lives_run_out() {
        let mut world = World::new();
        let _ = run(
            &mut world,
            Command::InstallMap {
                blueprint: straight_blueprint(2, 3, 1),
            },
        );
        let _ = run(
            &mut world,
            Command::StartWave {
                spawns: vec![EnemyKind::FastRat; 20],
            },
        );
        for _ in 0..20 {
            let _ = run(&mut world, Command::SpawnEnemy);
        }

        let events = run_ticks(&mut world, 120);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::GameOver { .. })));
        assert!(query::is_game_over(&world));

        // Once the session is over further commands are dropped.
        let events = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                at: GridPos::new(1, 0),
                side: PlayerSide::Solo,
            },
        );
        assert!(events.is_empty());
    }

    #[test]
    fn installing_a_map_resets_the_session() {
        let mut world = fresh_world();
        let _ = place(&mut world, TowerKind::Basic, 4, 0);
        let _ = run(
            &mut world,
            Command::InstallMap {
                blueprint: straight_blueprint(10, 3, 1),
            },
        );

        assert_eq!(query::gold(&world), 100);
        assert_eq!(query::lives(&world), 20);
        assert_eq!(query::wave(&world), 1);
        assert!(query::towers(&world).is_empty());
        assert!(query::enemies(&world).is_empty());
    }
}
