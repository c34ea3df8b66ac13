//! Cardinal axes, directions and quarter-turn rotations.
//!
//! A layer turn is a 90 degree rotation about one of the three grid axes.
//! Rotations are applied on doubled centered coordinates (`2c - (N - 1)`),
//! which keeps the center of even-sized grids on an integer and makes every
//! turn exact.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseMoveError;
use crate::pieces::Coord;

/// One of the three grid axes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Picks this axis' component out of a coordinate.
    #[inline]
    pub const fn component(self, (x, y, z): Coord) -> i32 {
        match self {
            Axis::X => x,
            Axis::Y => y,
            Axis::Z => z,
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
        }
    }
}

/// Outward direction of a face. The discriminant is the facelet index.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    PosX = 0,
    NegX = 1,
    PosY = 2,
    NegY = 3,
    PosZ = 4,
    NegZ = 5,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::PosX,
        Direction::NegX,
        Direction::PosY,
        Direction::NegY,
        Direction::PosZ,
        Direction::NegZ,
    ];

    pub const fn new(axis: Axis, positive: bool) -> Self {
        match (axis, positive) {
            (Axis::X, true) => Direction::PosX,
            (Axis::X, false) => Direction::NegX,
            (Axis::Y, true) => Direction::PosY,
            (Axis::Y, false) => Direction::NegY,
            (Axis::Z, true) => Direction::PosZ,
            (Axis::Z, false) => Direction::NegZ,
        }
    }

    pub const fn axis(self) -> Axis {
        match self {
            Direction::PosX | Direction::NegX => Axis::X,
            Direction::PosY | Direction::NegY => Axis::Y,
            Direction::PosZ | Direction::NegZ => Axis::Z,
        }
    }

    pub const fn is_positive(self) -> bool {
        matches!(self, Direction::PosX | Direction::PosY | Direction::PosZ)
    }

    /// +1 or -1.
    pub const fn sign(self) -> i32 {
        if self.is_positive() {
            1
        } else {
            -1
        }
    }

    pub const fn opposite(self) -> Self {
        Direction::new(self.axis(), !self.is_positive())
    }

    /// Unit vector with exactly one nonzero component.
    pub const fn vector(self) -> Coord {
        let s = self.sign();
        match self.axis() {
            Axis::X => (s, 0, 0),
            Axis::Y => (0, s, 0),
            Axis::Z => (0, 0, s),
        }
    }

    /// Inverse of [`Direction::vector`]; `None` unless exactly one component is ±1.
    pub fn from_vector(vector: Coord) -> Option<Self> {
        match vector {
            (1, 0, 0) => Some(Direction::PosX),
            (-1, 0, 0) => Some(Direction::NegX),
            (0, 1, 0) => Some(Direction::PosY),
            (0, -1, 0) => Some(Direction::NegY),
            (0, 0, 1) => Some(Direction::PosZ),
            (0, 0, -1) => Some(Direction::NegZ),
            _ => None,
        }
    }
}

/// Quarter-turn amount: +90 or -90 degrees (right-hand rule about the move axis).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Turn {
    Positive,
    Negative,
}

impl Turn {
    pub const fn sign(self) -> i32 {
        match self {
            Turn::Positive => 1,
            Turn::Negative => -1,
        }
    }

    pub const fn from_positive(positive: bool) -> Self {
        if positive {
            Turn::Positive
        } else {
            Turn::Negative
        }
    }

    pub const fn inverse(self) -> Self {
        match self {
            Turn::Positive => Turn::Negative,
            Turn::Negative => Turn::Positive,
        }
    }

    /// Signed angle in radians (`±π/2`).
    pub fn radians(self) -> f32 {
        self.sign() as f32 * std::f32::consts::FRAC_PI_2
    }
}

/// A single layer turn.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Move {
    /// Rotation axis as a signed cardinal direction.
    pub axis: Direction,
    /// Grid coordinate along `axis` selecting the layer (not mirrored for negative axes).
    pub layer: usize,
    pub turn: Turn,
}

impl Move {
    pub const fn new(axis: Direction, layer: usize, turn: Turn) -> Self {
        Self { axis, layer, turn }
    }

    /// The same layer turned the other way.
    pub const fn inverse(self) -> Self {
        Self {
            turn: self.turn.inverse(),
            ..self
        }
    }

    /// Turn sign about the positive axis; a +90 turn about -X equals -90 about +X.
    #[inline]
    pub const fn signed_quarter(self) -> i32 {
        self.axis.sign() * self.turn.sign()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.axis.is_positive() { '+' } else { '-' };
        write!(f, "{}{}{}", self.axis.axis().letter(), sign, self.layer)?;
        if self.turn == Turn::Negative {
            write!(f, "'")?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = ParseMoveError;

    /// Parses `<axis><sign><layer>[']`, e.g. `Y+2` or `x-0'`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseMoveError(text.to_string());
        let (body, turn) = match text.strip_suffix('\'') {
            Some(body) => (body, Turn::Negative),
            None => (text, Turn::Positive),
        };

        let mut chars = body.chars();
        let axis = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('X') => Axis::X,
            Some('Y') => Axis::Y,
            Some('Z') => Axis::Z,
            _ => return Err(invalid()),
        };
        let positive = match chars.next() {
            Some('+') => true,
            Some('-') => false,
            _ => return Err(invalid()),
        };
        let layer = chars.as_str().parse::<usize>().map_err(|_| invalid())?;

        Ok(Move::new(Direction::new(axis, positive), layer, turn))
    }
}

/// Formats a move list as space-separated notation.
pub fn format_moves(moves: &[Move]) -> String {
    moves
        .iter()
        .map(|mv| mv.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rotates a centered vector by a quarter turn about `axis`.
///
/// `quarter` is +1 for +90 degrees and -1 for -90 degrees about the positive axis.
#[inline]
pub const fn quarter_turn(axis: Axis, quarter: i32, (x, y, z): Coord) -> Coord {
    let s = quarter;
    match axis {
        Axis::X => (x, -s * z, s * y),
        Axis::Y => (s * z, y, -s * x),
        Axis::Z => (-s * y, s * x, z),
    }
}

/// Rotates a grid cell about the grid center.
///
/// Uses doubled coordinates so the center `(N - 1) / 2` stays integral.
#[inline]
pub const fn rotate_cell(cell: Coord, size: usize, axis: Axis, quarter: i32) -> Coord {
    let dim_m1 = size as i32 - 1;
    let doubled = (2 * cell.0 - dim_m1, 2 * cell.1 - dim_m1, 2 * cell.2 - dim_m1);
    let (rx, ry, rz) = quarter_turn(axis, quarter, doubled);
    ((rx + dim_m1) / 2, (ry + dim_m1) / 2, (rz + dim_m1) / 2)
}

/// Where a facelet facing `direction` points after the turn.
pub const fn rotate_direction(direction: Direction, axis: Axis, quarter: i32) -> Direction {
    let (x, y, z) = quarter_turn(axis, quarter, direction.vector());
    if x != 0 {
        Direction::new(Axis::X, x > 0)
    } else if y != 0 {
        Direction::new(Axis::Y, y > 0)
    } else {
        Direction::new(Axis::Z, z > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_turn_about_x_cycles_y_and_z() {
        let order = [
            Direction::PosY,
            Direction::PosZ,
            Direction::NegY,
            Direction::NegZ,
        ];
        for pair in order.windows(2) {
            assert_eq!(rotate_direction(pair[0], Axis::X, 1), pair[1]);
        }
        assert_eq!(rotate_direction(Direction::NegZ, Axis::X, 1), Direction::PosY);
        assert_eq!(rotate_direction(Direction::PosX, Axis::X, 1), Direction::PosX);
        assert_eq!(rotate_direction(Direction::NegX, Axis::X, 1), Direction::NegX);
    }

    #[test]
    fn test_quarter_turns_follow_right_hand_rule() {
        // +90 about Y sends +Z to +X, +90 about Z sends +X to +Y
        assert_eq!(rotate_direction(Direction::PosZ, Axis::Y, 1), Direction::PosX);
        assert_eq!(rotate_direction(Direction::PosX, Axis::Z, 1), Direction::PosY);
    }

    #[test]
    fn test_four_quarter_turns_are_identity() {
        for size in 1..=5 {
            for axis in Axis::ALL {
                for x in 0..size as i32 {
                    for y in 0..size as i32 {
                        for z in 0..size as i32 {
                            let mut cell = (x, y, z);
                            for _ in 0..4 {
                                cell = rotate_cell(cell, size, axis, 1);
                            }
                            assert_eq!(cell, (x, y, z));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_rotate_cell_stays_in_grid() {
        for size in 1..=4 {
            let last = size as i32 - 1;
            for axis in Axis::ALL {
                for quarter in [1, -1] {
                    let (x, y, z) = rotate_cell((0, last, 0), size, axis, quarter);
                    for c in [x, y, z] {
                        assert!((0..=last).contains(&c), "size {size} produced {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_move_notation() {
        let mv: Move = "Y+2".parse().unwrap();
        assert_eq!(mv, Move::new(Direction::PosY, 2, Turn::Positive));
        let mv: Move = "x-0'".parse().unwrap();
        assert_eq!(mv, Move::new(Direction::NegX, 0, Turn::Negative));
        assert_eq!(mv.to_string(), "X-0'");
        assert!("W+1".parse::<Move>().is_err());
        assert!("Y2".parse::<Move>().is_err());
        assert!("Y+".parse::<Move>().is_err());
    }

    #[test]
    fn test_negative_axis_is_inverse_turn() {
        let a = Move::new(Direction::NegZ, 1, Turn::Positive);
        let b = Move::new(Direction::PosZ, 1, Turn::Negative);
        assert_eq!(a.signed_quarter(), b.signed_quarter());
        assert_eq!(a.inverse().signed_quarter(), 1);
    }

    #[test]
    fn test_turn_radians_follow_sign() {
        use std::f32::consts::FRAC_PI_2;
        assert_eq!(Turn::Positive.radians(), FRAC_PI_2);
        assert_eq!(Turn::Negative.radians(), -FRAC_PI_2);
        assert_eq!(Turn::Positive.inverse().radians(), -FRAC_PI_2);
    }
}
