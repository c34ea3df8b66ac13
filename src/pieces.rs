//! Piece (cubie) definitions and coordinate types.
//!
//! Each visible cubie occupies one boundary cell of the N x N x N grid and
//! carries six facelets, one per outward direction.

use crate::geometry::Direction;

/// A logical grid cell. Every component stays in `0..N` after any turn.
pub type Coord = (i32, i32, i32);

/// Number of facelets per piece, one per cardinal direction.
pub const NUM_FACELETS: usize = 6;

/// Facelet color.
///
/// `Hidden` marks a face that was internal when the cube was built; it never
/// changes color and is ignored by solve detection.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Color {
    Orange,
    Red,
    Yellow,
    White,
    Blue,
    Green,
    Hidden,
}

impl Color {
    /// The canonical color painted on the face pointing in `direction`.
    pub const fn canonical(direction: Direction) -> Self {
        match direction {
            Direction::PosX => Color::Orange,
            Direction::NegX => Color::Red,
            Direction::PosY => Color::Yellow,
            Direction::NegY => Color::White,
            Direction::PosZ => Color::Blue,
            Direction::NegZ => Color::Green,
        }
    }

    /// Single-letter code used by the text net.
    pub const fn letter(self) -> char {
        match self {
            Color::Orange => 'O',
            Color::Red => 'R',
            Color::Yellow => 'Y',
            Color::White => 'W',
            Color::Blue => 'B',
            Color::Green => 'G',
            Color::Hidden => '.',
        }
    }

    /// Linear RGB triple for renderers.
    pub const fn rgb(self) -> (f32, f32, f32) {
        match self {
            Color::Orange => (1.0, 0.65, 0.0),
            Color::Red => (1.0, 0.0, 0.0),
            Color::Yellow => (1.0, 1.0, 0.0),
            Color::White => (1.0, 1.0, 1.0),
            Color::Blue => (0.0, 0.0, 1.0),
            Color::Green => (0.0, 1.0, 0.0),
            Color::Hidden => (0.1, 0.1, 0.1),
        }
    }

    #[inline]
    pub fn is_hidden(self) -> bool {
        self == Color::Hidden
    }
}

/// One visible cubie.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Piece {
    /// Current grid cell.
    pub position: Coord,
    /// Colors indexed by `Direction as usize`: `+X, -X, +Y, -Y, +Z, -Z`.
    pub facelets: [Color; NUM_FACELETS],
    /// Cell the piece was created in.
    pub home: Coord,
}

impl Piece {
    /// Builds the piece for `position` on a freshly initialized cube of `size`.
    ///
    /// A facelet is colored iff the piece lies on the boundary in that direction.
    pub fn solved(position: Coord, size: usize) -> Self {
        let mut facelets = [Color::Hidden; NUM_FACELETS];
        for direction in Direction::ALL {
            if is_on_boundary(position, direction, size) {
                facelets[direction as usize] = Color::canonical(direction);
            }
        }
        Self {
            position,
            facelets,
            home: position,
        }
    }

    /// Color currently facing `direction`.
    #[inline]
    pub fn facelet(&self, direction: Direction) -> Color {
        self.facelets[direction as usize]
    }
}

/// Returns true if `position` touches the face pointing in `direction`.
#[inline]
pub fn is_on_boundary(position: Coord, direction: Direction, size: usize) -> bool {
    let coordinate = direction.axis().component(position);
    if direction.is_positive() {
        coordinate == size as i32 - 1
    } else {
        coordinate == 0
    }
}

/// Returns true if `position` lies strictly inside the cube on every axis.
///
/// Such cells are never instantiated.
#[inline]
pub fn is_interior((x, y, z): Coord, size: usize) -> bool {
    let last = size as i32 - 1;
    let inner = |c: i32| c > 0 && c < last;
    inner(x) && inner(y) && inner(z)
}
