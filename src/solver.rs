//! Solve detection.
//!
//! The cube is solved when every boundary facelet matches the reference color
//! of its face. Reference colors are read off the current state rather than
//! fixed in advance, so any of the 24 whole-cube orientations counts as solved.

use crate::geometry::Direction;
use crate::grid::Cube;
use crate::pieces::{is_on_boundary, Color, Coord, NUM_FACELETS};

/// Reads one reference color per direction, indexed by `Direction as usize`.
///
/// Odd sizes use the face centers. Even sizes have no unique center, so the
/// corner at the origin supplies `-X, -Y, -Z` and the opposite corner
/// supplies `+X, +Y, +Z`.
///
/// Returns `None` when a reference piece is missing or two opposite faces
/// share a color.
pub fn reference_colors(cube: &Cube) -> Option<[Color; NUM_FACELETS]> {
    let size = cube.size() as i32;
    let last = size - 1;
    let mut colors = [Color::Hidden; NUM_FACELETS];

    if size % 2 == 1 {
        let mid = last / 2;
        for direction in Direction::ALL {
            let center = face_center(direction, mid, last);
            colors[direction as usize] = cube.facelet_at(center, direction)?;
        }
    } else {
        let low = cube.piece_at((0, 0, 0))?;
        let high = cube.piece_at((last, last, last))?;
        for direction in Direction::ALL {
            let corner = if direction.is_positive() { high } else { low };
            colors[direction as usize] = corner.facelet(direction);
        }
    }

    let consistent = Direction::ALL
        .iter()
        .filter(|direction| direction.is_positive())
        .all(|&direction| colors[direction as usize] != colors[direction.opposite() as usize]);
    if !consistent {
        return None;
    }

    Some(colors)
}

/// Middle cell of the face pointing in `direction`.
fn face_center(direction: Direction, mid: i32, last: i32) -> Coord {
    let edge = if direction.is_positive() { last } else { 0 };
    match direction {
        Direction::PosX | Direction::NegX => (edge, mid, mid),
        Direction::PosY | Direction::NegY => (mid, edge, mid),
        Direction::PosZ | Direction::NegZ => (mid, mid, edge),
    }
}

/// Returns true if every visible facelet matches its face's reference color.
pub fn is_solved(cube: &Cube) -> bool {
    if cube.size() <= 1 || cube.pieces().is_empty() {
        return true;
    }

    let Some(reference) = reference_colors(cube) else {
        tracing::warn!(size = cube.size(), "could not extract reference colors");
        return false;
    };

    cube.pieces().iter().all(|piece| {
        Direction::ALL.iter().all(|&direction| {
            !is_on_boundary(piece.position, direction, cube.size())
                || piece.facelet(direction) == reference[direction as usize]
        })
    })
}
