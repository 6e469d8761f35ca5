use super::config::GameConfig;
use super::constants::MAX_PLACEMENT_ATTEMPTS;
use super::types::{Cell, Direction};
use rand::seq::SliceRandom;
use rand::Rng;

pub fn positions_equal(a: Cell, b: Cell) -> bool {
    a.x == b.x && a.y == b.y
}

pub fn is_opposite(direction: Direction, next: Direction) -> bool {
    direction.x + next.x == 0 && direction.y + next.y == 0
}

/// Inclusive on both ends.
pub fn random_between<R: Rng + ?Sized>(rng: &mut R, min: u32, max: u32) -> u32 {
    if max <= min {
        return min;
    }
    rng.gen_range(min..=max)
}

pub fn random_cell<R: Rng + ?Sized>(rng: &mut R, config: &GameConfig) -> Cell {
    let min = config.food_margin;
    let max = config.grid_size - config.food_margin;
    let safe_range = (max - min).max(1);
    Cell {
        x: rng.gen_range(0..safe_range) + min,
        y: rng.gen_range(0..safe_range) + min,
    }
}

pub fn wrap(cell: Cell, grid_size: i32) -> Cell {
    Cell {
        x: cell.x.rem_euclid(grid_size),
        y: cell.y.rem_euclid(grid_size),
    }
}

/// Picks a margin cell outside `blocked`. Random probing first, then an exhaustive
/// scan so a crowded board still finds the last free cells.
pub fn place_clear<R: Rng + ?Sized>(rng: &mut R, config: &GameConfig, blocked: &[Cell]) -> Cell {
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let candidate = random_cell(rng, config);
        if !blocked.contains(&candidate) {
            return candidate;
        }
    }

    let min = config.food_margin;
    let max = (config.grid_size - config.food_margin).max(min + 1);
    let free: Vec<Cell> = (min..max)
        .flat_map(|y| (min..max).map(move |x| Cell { x, y }))
        .filter(|cell| !blocked.contains(cell))
        .collect();
    match free.choose(rng) {
        Some(cell) => *cell,
        None => random_cell(rng, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::Variant;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn positions_equal_matches_exact_coordinates() {
        assert!(positions_equal(Cell::new(3, 5), Cell::new(3, 5)));
        assert!(!positions_equal(Cell::new(3, 5), Cell::new(4, 5)));
        assert!(!positions_equal(Cell::new(3, 5), Cell::new(3, 6)));
        assert!(positions_equal(Cell::new(0, 0), Cell::new(0, 0)));
        assert!(positions_equal(Cell::new(-1, -2), Cell::new(-1, -2)));
    }

    #[test]
    fn positions_equal_is_symmetric() {
        let a = Cell::new(2, 9);
        let b = Cell::new(9, 2);
        assert_eq!(positions_equal(a, b), positions_equal(b, a));
        assert!(positions_equal(a, a));
    }

    #[test]
    fn opposite_only_for_reversed_vectors() {
        for direction in [Direction::UP, Direction::DOWN, Direction::LEFT, Direction::RIGHT] {
            assert!(is_opposite(direction, direction.reversed()));
            assert!(!is_opposite(direction, direction));
        }
        assert!(!is_opposite(Direction::RIGHT, Direction::DOWN));
    }

    #[test]
    fn random_between_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let value = random_between(&mut rng, 5, 10);
            assert!((5..=10).contains(&value));
        }
        assert_eq!(random_between(&mut rng, 7, 7), 7);
    }

    #[test]
    fn random_cell_respects_margin() {
        let config = GameConfig::for_variant(Variant::Rainbow);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            assert!(config.in_margin(random_cell(&mut rng, &config)));
        }
    }

    #[test]
    fn wrap_folds_out_of_grid_cells() {
        assert_eq!(wrap(Cell::new(-1, 4), 18), Cell::new(17, 4));
        assert_eq!(wrap(Cell::new(18, 4), 18), Cell::new(0, 4));
        assert_eq!(wrap(Cell::new(3, 18), 18), Cell::new(3, 0));
    }

    #[test]
    fn place_clear_finds_last_free_cell() {
        let config = GameConfig::for_variant(Variant::Rainbow);
        let min = config.food_margin;
        let max = config.grid_size - config.food_margin;
        let free = Cell::new(min + 3, min + 4);
        let blocked: Vec<Cell> = (min..max)
            .flat_map(|y| (min..max).map(move |x| Cell { x, y }))
            .filter(|cell| *cell != free)
            .collect();
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(place_clear(&mut rng, &config, &blocked), free);
    }
}
