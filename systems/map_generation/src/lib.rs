#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural map generation: one guaranteed path plus scattered obstacles.
//!
//! The path is orthogonal and monotonic in x by construction: horizontal
//! segments only ever move right and vertical segments never change the
//! column, so the walk can never self-intersect. Determinism comes entirely
//! from the injected random source; callers wanting reproducible maps seed it
//! themselves.

use rand::Rng;
use rat_defence_core::{Grid, GridPos, MapBlueprint, TileType};

/// Number of single-tile obstacles scattered by default.
pub const SMALL_OBSTACLE_COUNT: u32 = 15;

/// Number of large obstacles scattered by default.
pub const BIG_OBSTACLE_COUNT: u32 = 3;

const BIG_OBSTACLE_WIDTH: u32 = 3;
const BIG_OBSTACLE_HEIGHT: u32 = 4;

/// Attempts permitted per requested obstacle before giving up silently.
const ATTEMPTS_PER_OBSTACLE: u32 = 100;

/// Generates a map of the requested dimensions with the default obstacle mix.
#[must_use]
pub fn generate<R: Rng>(width: u32, height: u32, rng: &mut R) -> MapBlueprint {
    generate_with_obstacles(width, height, SMALL_OBSTACLE_COUNT, BIG_OBSTACLE_COUNT, rng)
}

/// Generates a map with an explicit obstacle mix.
///
/// Obstacle placement uses rejection sampling with a bounded retry count, so
/// a dense map may end up with fewer obstacles than requested. That shortfall
/// is silent and expected.
#[must_use]
pub fn generate_with_obstacles<R: Rng>(
    width: u32,
    height: u32,
    small_obstacles: u32,
    big_obstacles: u32,
    rng: &mut R,
) -> MapBlueprint {
    let mut grid = Grid::new(width, height);
    if width < 2 || height == 0 {
        return MapBlueprint::new(grid, Vec::new());
    }

    let path = generate_path(width, height, rng);
    stamp_path(&mut grid, &path);
    scatter_small_obstacles(&mut grid, small_obstacles, rng);
    scatter_big_obstacles(&mut grid, big_obstacles, rng);

    MapBlueprint::new(grid, path)
}

/// Walks a randomized orthogonal path from the left edge to the right edge.
fn generate_path<R: Rng>(width: u32, height: u32, rng: &mut R) -> Vec<GridPos> {
    let start_y = rng.gen_range(0..height);
    let end_y = rng.gen_range(0..height);
    let end_x = width - 1;

    let mut path = vec![GridPos::new(0, start_y)];
    let mut current = path[0];
    let mut move_right = true;

    while current.x() < end_x {
        if move_right {
            let max_steps = end_x - current.x();
            let steps = rng.gen_range(1..=max_steps);
            current = GridPos::new(current.x() + steps, current.y());
            path.push(current);
            move_right = false;
        } else {
            let down_room = height - 1 - current.y();
            let up_room = current.y();
            let go_down = match (down_room > 0, up_room > 0) {
                (true, true) => rng.gen_bool(0.5),
                (true, false) => true,
                (false, true) => false,
                (false, false) => {
                    move_right = true;
                    continue;
                }
            };
            let max_steps = if go_down { down_room } else { up_room };
            let steps = rng.gen_range(1..=max_steps);
            let new_y = if go_down {
                current.y() + steps
            } else {
                current.y() - steps
            };
            current = GridPos::new(current.x(), new_y);
            path.push(current);
            move_right = true;
        }
    }

    if current.y() != end_y {
        current = GridPos::new(current.x(), end_y);
        path.push(current);
    }

    path
}

/// Stamps PATH over every span between consecutive waypoints, then marks the
/// start and end tiles last so they survive overlapping spans.
fn stamp_path(grid: &mut Grid, path: &[GridPos]) {
    for pair in path.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if from.x() == to.x() {
            let (y_min, y_max) = (from.y().min(to.y()), from.y().max(to.y()));
            for y in y_min..=y_max {
                let _ = grid.set_tile(GridPos::new(from.x(), y), TileType::Path);
            }
        } else {
            let (x_min, x_max) = (from.x().min(to.x()), from.x().max(to.x()));
            for x in x_min..=x_max {
                let _ = grid.set_tile(GridPos::new(x, from.y()), TileType::Path);
            }
        }
    }

    if let (Some(first), Some(last)) = (path.first(), path.last()) {
        let _ = grid.set_tile(*first, TileType::Start);
        let _ = grid.set_tile(*last, TileType::End);
    }
}

fn scatter_small_obstacles<R: Rng>(grid: &mut Grid, count: u32, rng: &mut R) {
    let mut placed = 0;
    let mut attempts = 0;
    let max_attempts = count.saturating_mul(ATTEMPTS_PER_OBSTACLE);

    while placed < count && attempts < max_attempts {
        attempts += 1;
        let at = GridPos::new(
            rng.gen_range(0..grid.width()),
            rng.gen_range(0..grid.height()),
        );
        if grid.tile(at) == Some(TileType::Empty) {
            let _ = grid.set_tile(at, TileType::SmallObstacle);
            placed += 1;
        }
    }
}

fn scatter_big_obstacles<R: Rng>(grid: &mut Grid, count: u32, rng: &mut R) {
    if grid.width() < BIG_OBSTACLE_WIDTH || grid.height() < BIG_OBSTACLE_HEIGHT {
        return;
    }

    let mut placed = 0;
    let mut attempts = 0;
    let max_attempts = count.saturating_mul(ATTEMPTS_PER_OBSTACLE);

    while placed < count && attempts < max_attempts {
        attempts += 1;
        let x = rng.gen_range(0..=grid.width() - BIG_OBSTACLE_WIDTH);
        let y = rng.gen_range(0..=grid.height() - BIG_OBSTACLE_HEIGHT);

        let footprint_empty = (0..BIG_OBSTACLE_HEIGHT).all(|dy| {
            (0..BIG_OBSTACLE_WIDTH)
                .all(|dx| grid.tile(GridPos::new(x + dx, y + dy)) == Some(TileType::Empty))
        });
        if !footprint_empty {
            continue;
        }

        for dy in 0..BIG_OBSTACLE_HEIGHT {
            for dx in 0..BIG_OBSTACLE_WIDTH {
                let _ = grid.set_tile(GridPos::new(x + dx, y + dy), TileType::BigObstacle);
            }
        }
        placed += 1;
    }
}
