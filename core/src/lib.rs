#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rat Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values that external
//! observers (UI, history recording, network sync) consume. Systems read
//! immutable snapshot views and respond exclusively with new command batches.

pub mod animation;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fixed duration of one simulation step (~60 Hz).
pub const TICK_DURATION: Duration = Duration::from_millis(16);

/// Side length of a single square grid tile measured in world units.
pub const TILE_LENGTH: f32 = 40.0;

/// Gold available when a fresh session begins.
pub const STARTING_GOLD: u32 = 100;

/// Lives available when a fresh session begins.
pub const STARTING_LIVES: u32 = 20;

/// Wave counter value for a fresh session.
pub const STARTING_WAVE: u32 = 1;

/// Radius of the circular footprint every tower occupies, in world units.
pub const TOWER_FOOTPRINT_RADIUS: f32 = 40.0;

/// Stat multiplier a booster applies to towers inside its footprint.
pub const BOOST_MODIFIER: f32 = 1.5;

/// Fixed area damage dealt by an explosion projectile per overlapping enemy.
pub const EXPLOSION_DAMAGE: i32 = 20;

/// Minimum distance at which an enemy counts a waypoint as reached.
///
/// The effective threshold is `max(WAYPOINT_THRESHOLD, speed)` so a fast
/// enemy can never oscillate around a waypoint it overshoots every tick.
pub const WAYPOINT_THRESHOLD: f32 = 5.0;

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Continuous 2D position expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Creates a new position from explicit coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate in world units.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate in world units.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance_to(self, other: Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Unit vector pointing from this position toward `other`.
    ///
    /// Falls back to the positive x axis when the two positions coincide so
    /// callers always receive a usable direction.
    #[must_use]
    pub fn direction_to(self, other: Position) -> Position {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let length = (dx * dx + dy * dy).sqrt();
        if length <= f32::EPSILON {
            return Position::new(1.0, 0.0);
        }
        Position::new(dx / length, dy / length)
    }

    /// Returns this position translated by `direction` scaled by `distance`.
    #[must_use]
    pub fn advanced_by(self, direction: Position, distance: f32) -> Position {
        Position::new(
            self.x + direction.x * distance,
            self.y + direction.y * distance,
        )
    }
}

/// Location of a single grid tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    x: u32,
    y: u32,
}

impl GridPos {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// World-space centre of the tile.
    #[must_use]
    pub fn center(&self) -> Position {
        Position::new(
            self.x as f32 * TILE_LENGTH + TILE_LENGTH / 2.0,
            self.y as f32 * TILE_LENGTH + TILE_LENGTH / 2.0,
        )
    }
}

/// Classification of a single map tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    /// Unoccupied ground; towers may be built here.
    Empty,
    /// Part of the enemy path; never buildable.
    Path,
    /// The tile enemies spawn from.
    Start,
    /// The tile enemies escape through.
    End,
    /// Part of a large 3x4 scenery obstacle.
    BigObstacle,
    /// A single-tile scenery obstacle.
    SmallObstacle,
}

impl TileType {
    /// Numeric encoding used by the persisted history format.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Path => 1,
            Self::Start => 2,
            Self::End => 3,
            Self::BigObstacle => 4,
            Self::SmallObstacle => 5,
        }
    }

    /// Decodes a tile from its numeric encoding.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Empty),
            1 => Some(Self::Path),
            2 => Some(Self::Start),
            3 => Some(Self::End),
            4 => Some(Self::BigObstacle),
            5 => Some(Self::SmallObstacle),
            _ => None,
        }
    }

    /// Reports whether a tower may be constructed on this tile.
    #[must_use]
    pub const fn is_buildable(self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Dense 2D tile grid describing the generated map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<TileType>,
}

impl Grid {
    /// Creates a grid of the requested dimensions filled with empty tiles.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let capacity = width as usize * height as usize;
        Self {
            width,
            height,
            tiles: vec![TileType::Empty; capacity],
        }
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn in_bounds(&self, at: GridPos) -> bool {
        at.x() < self.width && at.y() < self.height
    }

    /// Returns the tile at the provided coordinate, if in bounds.
    #[must_use]
    pub fn tile(&self, at: GridPos) -> Option<TileType> {
        self.index(at).map(|index| self.tiles[index])
    }

    /// Overwrites the tile at the provided coordinate.
    ///
    /// Returns `false` when the coordinate lies outside the grid.
    pub fn set_tile(&mut self, at: GridPos, tile: TileType) -> bool {
        match self.index(at) {
            Some(index) => {
                self.tiles[index] = tile;
                true
            }
            None => false,
        }
    }

    /// Encodes the grid as rows of numeric tile values for persistence.
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<u8>> {
        let mut rows = Vec::with_capacity(self.height as usize);
        for y in 0..self.height {
            let mut row = Vec::with_capacity(self.width as usize);
            for x in 0..self.width {
                let index = y as usize * self.width as usize + x as usize;
                row.push(self.tiles[index].as_u8());
            }
            rows.push(row);
        }
        rows
    }

    /// Decodes a grid from persisted rows of numeric tile values.
    ///
    /// Returns `None` when the rows are ragged or contain an unknown value.
    #[must_use]
    pub fn from_rows(rows: &[Vec<u8>]) -> Option<Self> {
        let height = u32::try_from(rows.len()).ok()?;
        let width = u32::try_from(rows.first().map_or(0, Vec::len)).ok()?;
        let mut tiles = Vec::with_capacity(width as usize * height as usize);
        for row in rows {
            if row.len() != width as usize {
                return None;
            }
            for value in row {
                tiles.push(TileType::from_u8(*value)?);
            }
        }
        Some(Self {
            width,
            height,
            tiles,
        })
    }

    fn index(&self, at: GridPos) -> Option<usize> {
        if self.in_bounds(at) {
            Some(at.y() as usize * self.width as usize + at.x() as usize)
        } else {
            None
        }
    }
}

/// Generated map paired with the waypoint path enemies traverse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapBlueprint {
    grid: Grid,
    path: Vec<GridPos>,
}

impl MapBlueprint {
    /// Creates a blueprint from a grid and its guaranteed path.
    #[must_use]
    pub fn new(grid: Grid, path: Vec<GridPos>) -> Self {
        Self { grid, path }
    }

    /// Tile grid describing the generated map.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Ordered waypoints from the start tile to the end tile.
    #[must_use]
    pub fn path(&self) -> &[GridPos] {
        &self.path
    }

    /// Consumes the blueprint, yielding grid and path.
    #[must_use]
    pub fn into_parts(self) -> (Grid, Vec<GridPos>) {
        (self.grid, self.path)
    }
}

/// Kinds of enemies that traverse the path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Baseline enemy: slow and fragile.
    Rat,
    /// Fast enemy with moderate health.
    FastRat,
    /// Slow, heavily armoured enemy worth a large bounty.
    GiantRat,
}

impl EnemyKind {
    /// Every enemy kind in canonical order.
    pub const ALL: [EnemyKind; 3] = [Self::Rat, Self::FastRat, Self::GiantRat];

    /// Health the enemy spawns with.
    #[must_use]
    pub const fn max_health(self) -> i32 {
        match self {
            Self::Rat => 20,
            Self::FastRat => 50,
            Self::GiantRat => 200,
        }
    }

    /// Movement speed in world units per tick.
    #[must_use]
    pub const fn speed(self) -> f32 {
        match self {
            Self::Rat => 0.5,
            Self::FastRat => 2.0,
            Self::GiantRat => 1.0,
        }
    }

    /// Gold and score awarded when the enemy dies.
    #[must_use]
    pub const fn bounty(self) -> u32 {
        match self {
            Self::Rat => 20,
            Self::FastRat => 40,
            Self::GiantRat => 100,
        }
    }

    /// Radius of the enemy's collision circle in world units.
    #[must_use]
    pub const fn radius(self) -> f32 {
        match self {
            Self::Rat | Self::FastRat => 20.0,
            Self::GiantRat => 30.0,
        }
    }

    /// Stable name used by the persisted history and wire formats.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rat => "rat",
            Self::FastRat => "fast_rat",
            Self::GiantRat => "giant_rat",
        }
    }

    /// Decodes an enemy kind from its stable name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Kinds of towers available for construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TowerKind {
    /// Cheap single-target tower.
    Basic,
    /// Slow tower whose projectile detonates into an area explosion.
    Bomb,
    /// Support tower that never fires but boosts neighbouring towers.
    Booster,
}

impl TowerKind {
    /// Every tower kind in canonical order.
    pub const ALL: [TowerKind; 3] = [Self::Basic, Self::Bomb, Self::Booster];

    /// Gold required to place the tower.
    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Self::Basic => 30,
            Self::Bomb | Self::Booster => 50,
        }
    }

    /// Base damage dealt per projectile.
    #[must_use]
    pub const fn damage(self) -> i32 {
        match self {
            Self::Basic => 10,
            Self::Bomb => 20,
            Self::Booster => 0,
        }
    }

    /// Base targeting range in world units.
    #[must_use]
    pub const fn range(self) -> f32 {
        match self {
            Self::Basic => 100.0,
            Self::Bomb | Self::Booster => 150.0,
        }
    }

    /// Base cooldown period between shots, in ticks.
    #[must_use]
    pub const fn fire_rate(self) -> u32 {
        match self {
            Self::Basic => 100,
            Self::Bomb | Self::Booster => 200,
        }
    }

    /// Gold required to upgrade the tower one level.
    #[must_use]
    pub const fn upgrade_cost(self) -> u32 {
        match self {
            Self::Basic => 20,
            Self::Bomb | Self::Booster => 30,
        }
    }

    /// Maximum number of upgrades the tower accepts.
    #[must_use]
    pub const fn max_upgrade_level(self) -> u32 {
        match self {
            Self::Bomb => 2,
            Self::Basic | Self::Booster => 3,
        }
    }

    /// Damage gained per upgrade level.
    #[must_use]
    pub const fn upgrade_damage(self) -> i32 {
        match self {
            Self::Basic => 5,
            Self::Bomb => 10,
            Self::Booster => 0,
        }
    }

    /// Range gained per upgrade level, in world units.
    #[must_use]
    pub const fn upgrade_range(self) -> f32 {
        match self {
            Self::Basic | Self::Booster => 20.0,
            Self::Bomb => 30.0,
        }
    }

    /// Cooldown period reduction per upgrade level, in ticks.
    #[must_use]
    pub const fn upgrade_fire_rate(self) -> u32 {
        match self {
            Self::Basic | Self::Booster => 10,
            Self::Bomb => 20,
        }
    }

    /// Increase of the tower's sale basis per upgrade level.
    #[must_use]
    pub const fn upgrade_cost_increase(self) -> u32 {
        match self {
            Self::Basic | Self::Booster => 20,
            Self::Bomb => 30,
        }
    }

    /// Projectile kind launched by the tower, if it fires at all.
    #[must_use]
    pub const fn projectile(self) -> Option<ProjectileKind> {
        match self {
            Self::Basic => Some(ProjectileKind::Basic),
            Self::Bomb => Some(ProjectileKind::Bomb),
            Self::Booster => None,
        }
    }

    /// Stable name used by the persisted history and wire formats.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Bomb => "bomb",
            Self::Booster => "booster",
        }
    }

    /// Decodes a tower kind from its stable name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Kinds of projectiles that may exist in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Small fast round fired by basic towers.
    Basic,
    /// Heavy round that detonates into an explosion on removal.
    Bomb,
    /// Stationary area blast spawned by a dying bomb round.
    Explosion,
}

impl ProjectileKind {
    /// Radius of the projectile's collision circle in world units.
    #[must_use]
    pub const fn radius(self) -> f32 {
        match self {
            Self::Basic => 5.0,
            Self::Bomb => 10.0,
            Self::Explosion => 50.0,
        }
    }

    /// Travel speed in world units per tick.
    #[must_use]
    pub const fn speed(self) -> f32 {
        match self {
            Self::Basic | Self::Bomb => 5.0,
            Self::Explosion => 0.0,
        }
    }

    /// Number of ticks the projectile survives after spawning.
    #[must_use]
    pub const fn lifetime(self) -> u32 {
        match self {
            Self::Basic | Self::Bomb => 1000,
            Self::Explosion => 100,
        }
    }

    /// Number of additional enemies the projectile may damage.
    ///
    /// A projectile is removed once its pierce counter drops below zero, so a
    /// value of zero permits exactly one hit.
    #[must_use]
    pub const fn pierce(self) -> i32 {
        match self {
            Self::Basic | Self::Bomb => 0,
            Self::Explosion => 999,
        }
    }

    /// Stable name used by the persisted history format.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Bomb => "bomb",
            Self::Explosion => "explosion",
        }
    }
}

/// Which half of a split-screen session a placement request belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSide {
    /// Single-player session; the divider is ignored.
    Solo,
    /// Player building on columns left of the divider.
    Left,
    /// Player building on columns right of the divider.
    Right,
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested tile lies beyond the grid bounds.
    OutOfBounds,
    /// The requested tile is part of the path or a scenery obstacle.
    Blocked,
    /// Another tower already occupies the requested tile.
    Occupied,
    /// The tile lies on the wrong side of the split-screen divider.
    WrongSide,
    /// The player cannot afford the tower.
    InsufficientFunds,
}

/// Reasons a tower upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeError {
    /// No tower with the provided identifier exists.
    MissingTower,
    /// The tower already reached its maximum upgrade level.
    MaxLevel,
    /// The player cannot afford the upgrade.
    InsufficientFunds,
}

/// Reasons a tower sale request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SellError {
    /// No tower with the provided identifier exists.
    MissingTower,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Installs a freshly generated map and resets all entity state.
    InstallMap {
        /// Grid and path produced by the map generator.
        blueprint: MapBlueprint,
    },
    /// Configures the split-screen divider column, or removes it.
    SetDivider {
        /// Column index splitting the map, or `None` for no divider.
        column: Option<u32>,
    },
    /// Requests placement of a tower on the provided tile.
    PlaceTower {
        /// Kind of tower to construct.
        kind: TowerKind,
        /// Tile the tower should occupy.
        at: GridPos,
        /// Side of the divider the requesting player builds on.
        side: PlayerSide,
    },
    /// Requests the sale of an existing tower.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Requests a single upgrade of an existing tower.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Begins the current wave with the provided spawn queue.
    StartWave {
        /// Shuffled enemy kinds awaiting spawn, in release order.
        spawns: Vec<EnemyKind>,
    },
    /// Releases the next queued enemy onto the path.
    SpawnEnemy,
    /// Advances the simulation by one fixed step.
    Tick,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a new map was installed and entity state reset.
    MapInstalled {
        /// Number of tile columns in the installed grid.
        width: u32,
        /// Number of tile rows in the installed grid.
        height: u32,
    },
    /// Announces a change to the split-screen divider configuration.
    DividerChanged {
        /// Column index splitting the map, or `None` for no divider.
        column: Option<u32>,
    },
    /// Confirms that a tower was placed and gold deducted.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Kind of tower that was placed.
        kind: TowerKind,
        /// Tile the tower occupies.
        at: GridPos,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Kind of tower requested for placement.
        kind: TowerKind,
        /// Tile provided in the placement request.
        at: GridPos,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower was sold and half its cost refunded.
    TowerSold {
        /// Identifier of the tower that was sold.
        tower: TowerId,
        /// Gold returned to the player.
        refund: u32,
    },
    /// Reports that a tower sale request was rejected.
    TowerSellRejected {
        /// Identifier of the tower targeted for sale.
        tower: TowerId,
        /// Specific reason the sale failed.
        reason: SellError,
    },
    /// Confirms that a tower gained one upgrade level.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Upgrade level after the operation.
        level: u32,
        /// Gold spent on the upgrade.
        cost: u32,
    },
    /// Reports that a tower upgrade request was rejected.
    TowerUpgradeRejected {
        /// Identifier of the tower targeted for upgrade.
        tower: TowerId,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that a booster applied its modifier to a tower.
    TowerBoosted {
        /// Tower receiving the boost.
        tower: TowerId,
        /// Booster tower providing the boost.
        by: TowerId,
    },
    /// Confirms that a booster's modifier was reverted from a tower.
    TowerUnboosted {
        /// Tower losing the boost.
        tower: TowerId,
        /// Booster tower whose sale reverted the boost.
        by: TowerId,
    },
    /// Announces that a wave began releasing enemies.
    WaveStarted {
        /// Wave number that started.
        wave: u32,
        /// Number of enemies queued for the wave.
        spawns: u32,
    },
    /// Announces that every enemy of the current wave was resolved.
    WaveEnded {
        /// Wave number that ended.
        wave: u32,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Kind of enemy that spawned.
        kind: EnemyKind,
    },
    /// Reports that an enemy's health reached zero.
    EnemyKilled {
        /// Identifier of the killed enemy.
        enemy: EnemyId,
        /// Kind of the killed enemy.
        kind: EnemyKind,
        /// Tower credited with the kill, when it still exists.
        by: Option<TowerId>,
        /// Gold and score awarded for the kill.
        bounty: u32,
    },
    /// Reports that an enemy reached the end of the path.
    EnemyEscaped {
        /// Identifier of the escaped enemy.
        enemy: EnemyId,
        /// Kind of the escaped enemy.
        kind: EnemyKind,
    },
    /// Confirms that a tower launched a projectile.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Kind of projectile in flight.
        kind: ProjectileKind,
        /// Tower that fired the projectile.
        tower: TowerId,
        /// Spawn position of the projectile.
        from: Position,
        /// Unit direction fixed at spawn time.
        direction: Position,
    },
    /// Reports that a projectile was removed from flight.
    ProjectileExpired {
        /// Identifier of the removed projectile.
        projectile: ProjectileId,
        /// Kind of the removed projectile.
        kind: ProjectileKind,
        /// Position the projectile held when it was removed.
        at: Position,
    },
    /// Announces the player's new gold balance.
    GoldChanged {
        /// Gold balance after the mutation.
        gold: u32,
    },
    /// Announces the player's new score.
    ScoreChanged {
        /// Score after the mutation.
        score: u32,
    },
    /// Announces the player's new life count.
    LivesChanged {
        /// Lives remaining after the mutation.
        lives: u32,
    },
    /// Announces that the session ended because lives reached zero.
    GameOver {
        /// Wave number active when the session ended.
        wave: u32,
        /// Final score.
        score: u32,
    },
    /// Indicates that the simulation clock advanced one fixed step.
    TickAdvanced,
}

/// Lightweight enemy descriptor consumed by the pure combat systems.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyProbe {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Current world position of the enemy.
    pub position: Position,
    /// Radius of the enemy's collision circle.
    pub radius: f32,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Kind of the enemy.
    pub kind: EnemyKind,
    /// Current world position.
    pub position: Position,
    /// Remaining health.
    pub health: i32,
    /// Index of the waypoint the enemy currently steers toward.
    pub waypoint: usize,
}

/// Read-only snapshot describing all live enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Unique identifier assigned to the tower.
    pub id: TowerId,
    /// Kind of the tower.
    pub kind: TowerKind,
    /// Tile the tower occupies.
    pub at: GridPos,
    /// World-space centre of the tower.
    pub position: Position,
    /// Effective damage including boost.
    pub damage: i32,
    /// Effective targeting range including boost.
    pub range: f32,
    /// Effective cooldown period including boost, in ticks.
    pub fire_rate: u32,
    /// Ticks remaining until the tower may fire again.
    pub cooldown: u32,
    /// Upgrade level, starting at zero.
    pub level: u32,
    /// Enemies this tower has been credited with killing.
    pub kills: u32,
    /// Indicates whether a booster currently boosts the tower.
    pub boosted: bool,
    /// Gold refunded if the tower were sold now.
    pub sell_value: u32,
    /// Gold required for the next upgrade.
    pub upgrade_cost: u32,
}

/// Read-only snapshot describing all placed towers.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single projectile's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Unique identifier assigned to the projectile.
    pub id: ProjectileId,
    /// Kind of the projectile.
    pub kind: ProjectileKind,
    /// Current world position.
    pub position: Position,
    /// Unit direction fixed at spawn time.
    pub direction: Position,
    /// Damage applied per enemy hit.
    pub damage: i32,
    /// Remaining number of additional enemies the projectile may damage.
    pub pierce: i32,
    /// Ticks remaining before the projectile expires.
    pub lifetime: u32,
    /// Tower that fired the projectile, when it still exists.
    pub owner: Option<TowerId>,
}

/// Read-only snapshot describing all projectiles in flight.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured projectile snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ProjectileSnapshot> {
        self.snapshots
    }
}
