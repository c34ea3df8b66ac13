//! Drag-to-move resolution.
//!
//! Turns a clicked face plus a 2D drag into a quarter turn. The resolver never
//! touches a camera: the caller hands over already-resolved world vectors and
//! a [`ScreenProjector`] that maps world points to normalized screen space.

use glam::{Vec2, Vec3};

use crate::error::GestureRejection;
use crate::geometry::{Direction, Move, Turn};
use crate::pieces::Coord;

/// Minimum squared drag length in normalized device coordinates.
pub const MIN_DRAG_DISTANCE_SQ: f32 = 0.002;

/// Below this the largest axis component is treated as zero.
const MIN_AXIS_COMPONENT: f32 = 0.1;

/// `|camera_up · normal|` above this means the face is seen head-on from above or below.
const GIMBAL_THRESHOLD: f32 = 0.99;

impl Direction {
    /// World-space unit vector for this direction.
    pub fn unit_vector(self) -> Vec3 {
        let (x, y, z) = self.vector();
        Vec3::new(x as f32, y as f32, z as f32)
    }
}

/// Maps world-space points to normalized screen coordinates.
pub trait ScreenProjector {
    fn project(&self, world: Vec3) -> Vec2;
}

impl<F> ScreenProjector for F
where
    F: Fn(Vec3) -> Vec2,
{
    fn project(&self, world: Vec3) -> Vec2 {
        self(world)
    }
}

/// Orthographic projection onto the camera's image plane.
#[derive(Clone, Copy, Debug)]
pub struct PlanarProjector {
    right: Vec3,
    up: Vec3,
}

impl PlanarProjector {
    pub fn new(camera_forward: Vec3, camera_up: Vec3) -> Self {
        let right = camera_forward.cross(camera_up).normalize_or_zero();
        let up = right.cross(camera_forward).normalize_or_zero();
        Self { right, up }
    }
}

impl ScreenProjector for PlanarProjector {
    fn project(&self, world: Vec3) -> Vec2 {
        Vec2::new(world.dot(self.right), world.dot(self.up))
    }
}

/// Everything the resolver needs to know about one drag.
#[derive(Clone, Copy, Debug)]
pub struct Gesture {
    /// Outward normal of the touched face, already snapped to a cardinal axis.
    pub face_normal: Vec3,
    /// World-space point where the drag started.
    pub contact_point: Vec3,
    /// Drag vector in normalized screen space.
    pub drag: Vec2,
    pub camera_up: Vec3,
    pub camera_forward: Vec3,
    /// Logical position of the touched piece.
    pub piece: Coord,
}

/// Minimum-distance gate, checked before any geometry.
#[inline]
pub fn passes_drag_gate(drag: Vec2) -> bool {
    drag.length_squared() >= MIN_DRAG_DISTANCE_SQ
}

/// Builds the in-face ("face-right", "face-up") basis for a face seen by the camera.
///
/// When the face is nearly perpendicular to camera-up, camera-up is rebuilt
/// from camera-forward so the cross products stay well conditioned.
pub fn face_basis(face_normal: Vec3, camera_up: Vec3, camera_forward: Vec3) -> (Vec3, Vec3) {
    let mut up = camera_up.normalize_or_zero();
    if up.dot(face_normal).abs() > GIMBAL_THRESHOLD {
        let camera_right = camera_forward.cross(up).normalize_or_zero();
        up = face_normal.cross(camera_right).normalize_or_zero();
    }
    let right = up.cross(face_normal).normalize_or_zero();
    let face_up = face_normal.cross(right).normalize_or_zero();
    (right, face_up)
}

/// Snaps a rotation axis candidate to the nearest cardinal direction.
///
/// Components below half the largest magnitude are dropped. More than one
/// surviving component means the drag was diagonal to the grid.
pub fn snap_to_cardinal(axis: Vec3) -> Result<Direction, GestureRejection> {
    let largest = axis.abs().max_element();
    if largest < MIN_AXIS_COMPONENT {
        return Err(GestureRejection::DegenerateAxis);
    }

    let snap = |c: f32| {
        if c.abs() / largest > 0.5 {
            c.signum() as i32
        } else {
            0
        }
    };
    let snapped = (snap(axis.x), snap(axis.y), snap(axis.z));

    let length_sq = snapped.0 * snapped.0 + snapped.1 * snapped.1 + snapped.2 * snapped.2;
    if length_sq == 0 {
        return Err(GestureRejection::DegenerateAxis);
    }
    Direction::from_vector(snapped).ok_or(GestureRejection::AmbiguousAxis)
}

/// Resolves a drag on a cube of `size` into a move.
pub fn resolve(
    gesture: &Gesture,
    size: usize,
    projector: &impl ScreenProjector,
) -> Result<Move, GestureRejection> {
    if !passes_drag_gate(gesture.drag) {
        return Err(GestureRejection::DragTooShort);
    }

    let (face_right, face_up) =
        face_basis(gesture.face_normal, gesture.camera_up, gesture.camera_forward);

    // screen-space directions of the face basis at the contact point
    let origin = projector.project(gesture.contact_point);
    let right_screen = (projector.project(gesture.contact_point + face_right) - origin)
        .normalize_or_zero();
    let up_screen =
        (projector.project(gesture.contact_point + face_up) - origin).normalize_or_zero();

    let dot_right = gesture.drag.dot(right_screen);
    let dot_up = gesture.drag.dot(up_screen);

    // dragging along face-right turns about face-up and vice versa
    let (candidate, turn_sign) = if dot_right.abs() > dot_up.abs() {
        (face_up, dot_right)
    } else {
        (face_right, -dot_up)
    };
    if turn_sign == 0.0 {
        return Err(GestureRejection::NoTurnDirection);
    }

    let axis = snap_to_cardinal(candidate)?;
    let layer = axis.axis().component(gesture.piece);
    if layer < 0 || layer >= size as i32 {
        return Err(GestureRejection::OutsideCube);
    }

    Ok(Move::new(
        axis,
        layer as usize,
        Turn::from_positive(turn_sign > 0.0),
    ))
}
