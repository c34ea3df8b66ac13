//! Logical cube state: the N x N x N grid and its pieces.
//!
//! The grid is a flat array where each cell holds a 1-based piece number,
//! or 0 for an interior cell that has no piece. Index order is x-major:
//! `idx = x * N * N + y * N + z`.

use rustc_hash::FxHashSet;

use crate::error::PuzzleError;
use crate::geometry::Direction;
use crate::pieces::{is_interior, is_on_boundary, Color, Coord, Piece};

/// Converts (x, y, z) coordinates to a linear cell index.
#[inline(always)]
pub const fn coord_to_idx(size: usize, (x, y, z): Coord) -> usize {
    (x as usize) * size * size + (y as usize) * size + (z as usize)
}

/// Converts a linear cell index to (x, y, z) coordinates.
#[inline(always)]
pub const fn idx_to_coord(size: usize, cell_index: usize) -> Coord {
    (
        (cell_index / (size * size)) as i32,
        ((cell_index / size) % size) as i32,
        (cell_index % size) as i32,
    )
}

/// Returns true if every component of `cell` is in `0..size`.
#[inline]
pub fn in_bounds((x, y, z): Coord, size: usize) -> bool {
    let range = 0..size as i32;
    range.contains(&x) && range.contains(&y) && range.contains(&z)
}

/// The logical puzzle.
///
/// Fields are crate-visible so the turn engine can mutate them; nothing else does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cube {
    pub(crate) size: usize,
    pub(crate) pieces: Vec<Piece>,
    /// Cell table, see module docs.
    pub(crate) cells: Vec<u32>,
}

/// Read-only view of the cube handed to renderers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CubeSnapshot {
    pub size: usize,
    /// Bumped on every applied turn and every reinitialization.
    pub revision: u64,
    pub pieces: Vec<Piece>,
}

impl Cube {
    /// Builds a solved cube with one piece per boundary cell.
    pub fn new(size: usize) -> Result<Self, PuzzleError> {
        // piece numbers in the cell table are u32
        let total_cells = size
            .checked_mul(size)
            .and_then(|square| square.checked_mul(size))
            .filter(|&cells| cells > 0 && cells <= u32::MAX as usize)
            .ok_or(PuzzleError::InvalidSize { size })?;
        let mut pieces = Vec::new();
        let mut cells = vec![0u32; total_cells];

        for cell_index in 0..total_cells {
            let position = idx_to_coord(size, cell_index);
            // skip the invisible interior
            if is_interior(position, size) {
                continue;
            }
            pieces.push(Piece::solved(position, size));
            cells[cell_index] = pieces.len() as u32;
        }

        tracing::debug!(size, pieces = pieces.len(), "initialized cube");
        Ok(Self {
            size,
            pieces,
            cells,
        })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Returns the piece occupying `cell`, or `None` for interior or
    /// out-of-range cells.
    pub fn piece_at(&self, cell: Coord) -> Option<&Piece> {
        if !in_bounds(cell, self.size) {
            return None;
        }
        match self.cells[coord_to_idx(self.size, cell)] {
            0 => None,
            piece_number => self.pieces.get(piece_number as usize - 1),
        }
    }

    /// Color on the face of `cell` that points in `direction`, if a piece is there.
    pub fn facelet_at(&self, cell: Coord, direction: Direction) -> Option<Color> {
        self.piece_at(cell).map(|piece| piece.facelet(direction))
    }

    pub fn snapshot(&self, revision: u64) -> CubeSnapshot {
        CubeSnapshot {
            size: self.size,
            revision,
            pieces: self.pieces.clone(),
        }
    }

    /// Checks the structural invariants.
    ///
    /// - every boundary cell holds exactly one piece and no two pieces share a cell
    /// - the cell table agrees with piece positions
    /// - every face shows exactly N x N colored facelets
    /// - each piece still carries the facelet colors it was created with
    pub fn check_invariants(&self) -> bool {
        let mut occupied: FxHashSet<Coord> = FxHashSet::default();
        for (index, piece) in self.pieces.iter().enumerate() {
            if !in_bounds(piece.position, self.size) || is_interior(piece.position, self.size) {
                return false;
            }
            if !occupied.insert(piece.position) {
                return false;
            }
            if self.cells[coord_to_idx(self.size, piece.position)] != index as u32 + 1 {
                return false;
            }
        }

        let boundary_cells = (0..self.cells.len())
            .filter(|&cell| !is_interior(idx_to_coord(self.size, cell), self.size))
            .count();
        if occupied.len() != boundary_cells {
            return false;
        }

        for direction in Direction::ALL {
            let colored = self
                .pieces
                .iter()
                .filter(|piece| is_on_boundary(piece.position, direction, self.size))
                .filter(|piece| !piece.facelet(direction).is_hidden())
                .count();
            if colored != self.size * self.size {
                return false;
            }
        }

        // turns permute facelets within a piece, they never repaint them
        self.pieces.iter().all(|piece| {
            let original = Piece::solved(piece.home, self.size);
            let count = |facelets: &[Color], color: Color| {
                facelets.iter().filter(|&&c| c == color).count()
            };
            original
                .facelets
                .iter()
                .all(|&color| count(&original.facelets, color) == count(&piece.facelets, color))
        })
    }
}

/// Formats the cube as an unfolded net.
///
/// ```text
///     U
/// L F R B
///     D
/// ```
///
/// Faces are seen from outside with +Y up and +Z toward the viewer.
/// Missing pieces show as '?'.
pub fn format_cube(cube: &Cube) -> String {
    let n = cube.size as i32;
    let last = n - 1;
    let letter = |cell: Coord, direction: Direction| {
        cube.facelet_at(cell, direction)
            .map(Color::letter)
            .unwrap_or('?')
    };
    let indent = " ".repeat(cube.size + 1);

    let mut output = String::new();

    // up: back row first
    for z in 0..n {
        output.push_str(&indent);
        for x in 0..n {
            output.push(letter((x, last, z), Direction::PosY));
        }
        output.push('\n');
    }

    // left, front, right, back side by side, top row first
    for y in (0..n).rev() {
        let rows: [String; 4] = [
            (0..n).map(|z| letter((0, y, z), Direction::NegX)).collect(),
            (0..n).map(|x| letter((x, y, last), Direction::PosZ)).collect(),
            (0..n).rev().map(|z| letter((last, y, z), Direction::PosX)).collect(),
            (0..n).rev().map(|x| letter((x, y, 0), Direction::NegZ)).collect(),
        ];
        output.push_str(&rows.join(" "));
        output.push('\n');
    }

    // down: front row first
    for z in (0..n).rev() {
        output.push_str(&indent);
        for x in 0..n {
            output.push(letter((x, 0, z), Direction::NegY));
        }
        output.push('\n');
    }

    output
}
