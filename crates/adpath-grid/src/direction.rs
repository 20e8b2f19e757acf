use std::f64::consts::SQRT_2;

use enumset::{EnumSet, EnumSetType};

/// Direction of a single grid move. North is towards smaller `y`.
#[derive(EnumSetType, Hash, Debug)]
pub enum Direction {
    North,
    West,
    South,
    East,
    NorthWest,
    SouthWest,
    NorthEast,
    SouthEast,
}

impl Direction {
    pub const ORTHOGONAL: EnumSet<Direction> = enumset::enum_set!(
        Direction::North | Direction::West | Direction::South | Direction::East
    );

    pub const DIAGONAL: EnumSet<Direction> = enumset::enum_set!(
        Direction::NorthWest | Direction::SouthWest | Direction::NorthEast | Direction::SouthEast
    );

    /// `(dx, dy)` of a move in this direction.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::West => (-1, 0),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::NorthWest => (-1, -1),
            Direction::SouthWest => (-1, 1),
            Direction::NorthEast => (1, -1),
            Direction::SouthEast => (1, 1),
        }
    }

    /// Cell reached by moving one step from `(x, y)`.
    #[inline(always)]
    pub fn step(self, (x, y): (i32, i32)) -> (i32, i32) {
        let (dx, dy) = self.offset();
        (x + dx, y + dy)
    }

    pub fn is_diagonal(self) -> bool {
        Direction::DIAGONAL.contains(self)
    }

    /// Euclidean length of the move: 1 for orthogonal moves, √2 for diagonal ones.
    pub fn cost(self) -> f64 {
        if self.is_diagonal() {
            SQRT_2
        } else {
            1.0
        }
    }

    pub fn backwards(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::West => Direction::East,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::NorthWest => Direction::SouthEast,
            Direction::SouthWest => Direction::NorthEast,
            Direction::NorthEast => Direction::SouthWest,
            Direction::SouthEast => Direction::NorthWest,
        }
    }

    /// The orthogonal moves a diagonal move passes between. Empty for orthogonal directions.
    pub fn components(self) -> EnumSet<Direction> {
        match self {
            Direction::NorthWest => Direction::North | Direction::West,
            Direction::SouthWest => Direction::South | Direction::West,
            Direction::NorthEast => Direction::North | Direction::East,
            Direction::SouthEast => Direction::South | Direction::East,
            _ => EnumSet::empty(),
        }
    }

    /// Direction of the move from `from` to the adjacent cell `to`, if they are adjacent.
    pub fn between(from: (i32, i32), to: (i32, i32)) -> Option<Direction> {
        EnumSet::<Direction>::all()
            .iter()
            .find(|dir| dir.step(from) == to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backwards_undoes_step() {
        for dir in EnumSet::<Direction>::all() {
            assert_eq!(dir.backwards().step(dir.step((3, 4))), (3, 4));
            assert_eq!(dir.backwards().backwards(), dir);
            assert_eq!(Direction::between((3, 4), dir.step((3, 4))), Some(dir));
        }
        assert_eq!(Direction::between((0, 0), (2, 0)), None);
    }

    #[test]
    fn diagonals_pass_between_two_orthogonals() {
        for dir in Direction::DIAGONAL {
            let components = dir.components();
            assert_eq!(components.len(), 2);
            let (dx, dy) = components
                .iter()
                .fold((0, 0), |(x, y), c| (x + c.offset().0, y + c.offset().1));
            assert_eq!((dx, dy), dir.offset());
            assert_eq!(dir.cost(), SQRT_2);
        }
        for dir in Direction::ORTHOGONAL {
            assert!(dir.components().is_empty());
            assert_eq!(dir.cost(), 1.0);
        }
    }
}
