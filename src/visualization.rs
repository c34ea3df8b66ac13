//! Interactive 3D cube viewer using kiss3d.

use std::time::{Duration, Instant};

use kiss3d::prelude::*;
use rand::rngs::StdRng;

use rubix::pieces::Color as FaceletColor;
use rubix::resolver::{resolve, Gesture};
use rubix::{
    Axis, Coord, CubeSnapshot, Direction, FinishedTurn, Move, SequenceOutcome, SequenceStep,
    Session, SolvePlan, Turn,
};

/// Largest cube the viewer will build.
const MAX_SIZE: usize = 10;

/// Edge of a piece body (slightly under 1.0 for visible gaps).
const BODY_SIZE: f32 = 0.94;
/// Edge of a sticker block; it sits inside the body except for a thin outer slab.
const STICKER_SIZE: f32 = 0.76;
/// How far a sticker block's center sits from the piece center.
const STICKER_OFFSET: f32 = BODY_SIZE / 2.0 - STICKER_SIZE / 2.0 + 0.03;

fn scene_vec(v: glam::Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn world_vec(v: Vec3) -> glam::Vec3 {
    glam::Vec3::new(v.x, v.y, v.z)
}

fn facelet_color(color: FaceletColor) -> Color {
    let (r, g, b) = color.rgb();
    Color::new(r, g, b, 1.0)
}

/// One scene node and where it sits relative to the cube center when at rest.
struct RenderedNode {
    node: SceneNode3d,
    base_position: glam::Vec3,
}

/// All nodes belonging to one piece.
struct RenderedPiece {
    position: (i32, i32, i32),
    nodes: Vec<RenderedNode>,
}

/// A turn being animated.
struct Animation {
    mv: Move,
    started: Instant,
}

/// Where a pick ray enters the cube.
#[derive(Clone, Copy, PartialEq, Debug)]
struct FaceHit {
    face: Direction,
    point: glam::Vec3,
    piece: Coord,
}

/// A left-button drag that started on the cube.
struct DragStart {
    cursor: glam::Vec2,
    hit: FaceHit,
}

/// Intersects a ray with the rendered cube's bounding box.
///
/// Returns `None` on a miss or when the ray starts inside the cube.
fn pick_face(origin: glam::Vec3, direction: glam::Vec3, size: usize) -> Option<FaceHit> {
    let half = size as f32 / 2.0;
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut entry = None;

    for (i, axis) in Axis::ALL.into_iter().enumerate() {
        let (o, d) = (origin[i], direction[i]);
        if d.abs() < f32::EPSILON {
            if o.abs() > half {
                return None;
            }
            continue;
        }
        let (t0, t1) = ((-half - o) / d, (half - o) / d);
        let (near, far) = if t0 < t1 { (t0, t1) } else { (t1, t0) };
        if near > t_enter {
            t_enter = near;
            // a ray travelling toward -axis enters through the + face
            entry = Some(Direction::new(axis, d < 0.0));
        }
        t_exit = t_exit.min(far);
    }

    let face = entry?;
    if t_enter > t_exit || t_enter < 0.0 {
        return None;
    }

    let point = origin + direction * t_enter;
    let inside = point - face.unit_vector() * 0.5;
    let cell = |v: f32| ((v + half).floor() as i32).clamp(0, size as i32 - 1);
    Some(FaceHit {
        face,
        point,
        piece: (cell(inside.x), cell(inside.y), cell(inside.z)),
    })
}

/// Maps a window pixel (origin top-left) to normalized device coordinates.
fn cursor_to_ndc(cursor: glam::Vec2, window_size: Vec2) -> glam::Vec2 {
    glam::Vec2::new(
        2.0 * cursor.x / window_size.x - 1.0,
        1.0 - 2.0 * cursor.y / window_size.y,
    )
}

/// Builds the scene for a snapshot.
///
/// Logical cell `c` is rendered at `c - (N - 1) / 2` so the cube is centered
/// on the origin.
fn build_scene(scene: &mut SceneNode3d, snapshot: &CubeSnapshot) -> Vec<RenderedPiece> {
    let center_offset = (snapshot.size as f32 - 1.0) / 2.0;
    let body_color = facelet_color(FaceletColor::Hidden);

    snapshot
        .pieces
        .iter()
        .map(|piece| {
            let (x, y, z) = piece.position;
            let center = glam::Vec3::new(x as f32, y as f32, z as f32) - center_offset;

            let mut nodes = vec![RenderedNode {
                node: scene
                    .add_cube(BODY_SIZE, BODY_SIZE, BODY_SIZE)
                    .set_color(body_color)
                    .set_position(scene_vec(center)),
                base_position: center,
            }];

            for direction in Direction::ALL {
                let color = piece.facelet(direction);
                if color.is_hidden() {
                    continue;
                }
                let base_position = center + direction.unit_vector() * STICKER_OFFSET;
                nodes.push(RenderedNode {
                    node: scene
                        .add_cube(STICKER_SIZE, STICKER_SIZE, STICKER_SIZE)
                        .set_color(facelet_color(color))
                        .set_position(scene_vec(base_position)),
                    base_position,
                });
            }

            RenderedPiece {
                position: piece.position,
                nodes,
            }
        })
        .collect()
}

/// Keyboard and mouse controller around a [`Session`].
struct Viewer {
    session: Session,
    rng: StdRng,
    move_duration: Duration,
    axis: Axis,
    layer: usize,
    animation: Option<Animation>,
    cursor: glam::Vec2,
    drag: Option<DragStart>,
    coins: u32,
    status: String,
}

impl Viewer {
    fn new(session: Session, move_duration_ms: u64, rng: StdRng) -> Self {
        Self {
            session,
            rng,
            move_duration: Duration::from_millis(move_duration_ms),
            axis: Axis::Y,
            layer: 0,
            animation: None,
            cursor: glam::Vec2::ZERO,
            drag: None,
            coins: 0,
            status: String::from("ready"),
        }
    }

    fn title(&self) -> String {
        let size = self.session.size();
        let activity = match self.session.sequence_progress() {
            Some((kind, applied, total)) => format!("{kind:?} {applied}/{total}"),
            None => self.status.clone(),
        };
        format!(
            "{size}x{size}x{size} - layer {}{} - coins {} - {activity}",
            self.axis.letter(),
            self.layer,
            self.coins
        )
    }

    fn handle_key(&mut self, key: kiss3d::event::Key) {
        use kiss3d::event::Key;

        let layer_keys = [
            Key::Key1,
            Key::Key2,
            Key::Key3,
            Key::Key4,
            Key::Key5,
            Key::Key6,
            Key::Key7,
            Key::Key8,
            Key::Key9,
        ];

        match key {
            Key::X => self.axis = Axis::X,
            Key::Y => self.axis = Axis::Y,
            Key::Z => self.axis = Axis::Z,
            Key::Left => self.start_manual_turn(Turn::Negative),
            Key::Right => self.start_manual_turn(Turn::Positive),
            Key::S => match self.session.scramble(&mut self.rng) {
                Ok(moves) => self.status = format!("scrambling {moves} moves"),
                Err(e) => self.status = e.to_string(),
            },
            Key::V => match self.session.solve() {
                Ok(SolvePlan::AlreadySolved) => self.status = String::from("already solved"),
                Ok(SolvePlan::Reverse { moves }) => self.status = format!("solving {moves} moves"),
                Ok(SolvePlan::Reset) => self.status = String::from("reset"),
                Err(e) => self.status = e.to_string(),
            },
            Key::C => {
                if self.session.request_stop() {
                    self.status = String::from("stopping");
                }
            }
            Key::R => self.resize(self.session.size()),
            Key::Up => self.resize((self.session.size() + 1).min(MAX_SIZE)),
            Key::Down => self.resize(self.session.size().saturating_sub(1).max(1)),
            other => {
                if let Some(index) = layer_keys.iter().position(|&k| k == other) {
                    if index < self.session.size() {
                        self.layer = index;
                    }
                }
            }
        }
    }

    fn resize(&mut self, size: usize) {
        match self.session.set_size(size) {
            Ok(()) => {
                self.layer = self.layer.min(size - 1);
                self.status = String::from("reset");
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    fn start_manual_turn(&mut self, turn: Turn) {
        self.start_move(Move::new(Direction::new(self.axis, true), self.layer, turn));
    }

    fn start_move(&mut self, mv: Move) {
        match self.session.begin_manual_turn(mv) {
            Ok(()) => self.start_animation(mv),
            Err(e) => tracing::debug!(%mv, error = %e, "manual turn refused"),
        }
    }

    fn start_animation(&mut self, mv: Move) {
        self.animation = Some(Animation {
            mv,
            started: Instant::now(),
        });
    }

    fn begin_drag(&mut self, camera: &OrbitCamera3d, window_size: Vec2) {
        let (origin, direction) = camera.unproject(Vec2::new(self.cursor.x, self.cursor.y), window_size);
        self.drag = pick_face(world_vec(origin), world_vec(direction), self.session.size())
            .map(|hit| DragStart {
                cursor: self.cursor,
                hit,
            });
    }

    /// Resolves a finished drag into a turn of the layer under the cursor.
    fn end_drag(&mut self, camera: &OrbitCamera3d, window_size: Vec2) {
        let Some(start) = self.drag.take() else {
            return;
        };

        let gesture = Gesture {
            face_normal: start.hit.face.unit_vector(),
            contact_point: start.hit.point,
            drag: cursor_to_ndc(self.cursor, window_size) - cursor_to_ndc(start.cursor, window_size),
            camera_up: glam::Vec3::Y,
            camera_forward: world_vec(camera.at() - camera.eye()).normalize_or_zero(),
            piece: start.hit.piece,
        };
        // camera.project puts the origin bottom-left
        let projector = |world: glam::Vec3| {
            let pixel = camera.project(scene_vec(world), window_size);
            glam::Vec2::new(
                2.0 * pixel.x / window_size.x - 1.0,
                2.0 * pixel.y / window_size.y - 1.0,
            )
        };

        match resolve(&gesture, self.session.size(), &projector) {
            Ok(mv) => self.start_move(mv),
            Err(rejection) => tracing::debug!(%rejection, "drag ignored"),
        }
    }

    /// Starts the next sequence turn if nothing is animating.
    fn advance_sequence(&mut self) {
        if self.animation.is_some() || !self.session.is_sequence_running() {
            return;
        }
        match self.session.next_sequence_step() {
            Ok(SequenceStep::Turn(mv)) => self.start_animation(mv),
            Ok(SequenceStep::Finished(report)) => {
                self.status = match (report.outcome, report.solved) {
                    (SequenceOutcome::Cancelled, _) => {
                        format!("stopped after {}/{}", report.applied, report.total)
                    }
                    (SequenceOutcome::Completed, true) => String::from("solved"),
                    (SequenceOutcome::Completed, false) => String::from("scrambled"),
                };
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    /// Moves the turning layer's nodes, finishing the turn once the duration has passed.
    fn animate(&mut self, pieces: &mut [RenderedPiece]) {
        let Some((mv, started)) = self.animation.as_ref().map(|a| (a.mv, a.started)) else {
            return;
        };
        let progress = (started.elapsed().as_secs_f32() / self.move_duration.as_secs_f32()).min(1.0);

        if progress >= 1.0 {
            self.animation = None;
            match self.session.finish_turn() {
                Ok(FinishedTurn::Manual(outcome)) => {
                    if let Some(reward) = outcome.reward {
                        self.coins += reward.coins;
                        self.status = format!("solved! +{} coins", reward.coins);
                    } else {
                        self.status = String::from("ready");
                    }
                }
                Ok(FinishedTurn::Sequence(_)) => {}
                Err(e) => self.status = e.to_string(),
            }
            return;
        }

        let axis = mv.axis.axis();
        // about the positive axis
        let angle = progress * mv.axis.sign() as f32 * mv.turn.radians();
        let rotation = glam::Quat::from_axis_angle(Direction::new(axis, true).unit_vector(), angle);

        for piece in pieces
            .iter_mut()
            .filter(|piece| axis.component(piece.position) == mv.layer as i32)
        {
            for rendered in &mut piece.nodes {
                rendered
                    .node
                    .set_position(scene_vec(rotation * rendered.base_position));
            }
        }
    }
}

/// Runs the viewer until the window is closed.
pub fn display(session: Session, move_duration_ms: u64, rng: StdRng) {
    pollster::block_on(display_async(session, move_duration_ms, rng));
}

async fn display_async(session: Session, move_duration_ms: u64, rng: StdRng) {
    let mut viewer = Viewer::new(session, move_duration_ms, rng);

    let mut window = Window::new(&viewer.title()).await;

    let mut camera = OrbitCamera3d::default();
    camera.set_dist(3.0 * viewer.session.size() as f32 + 2.0);
    // the left button turns layers
    camera.rebind_rotate_button(Some(MouseButton::Button2));
    camera.rebind_drag_button(Some(MouseButton::Button3));

    let mut scene = SceneNode3d::empty();
    scene
        .add_light(Light::point(100.0))
        .set_position(Vec3::new(5.0, 5.0, 5.0));

    let mut pieces = build_scene(&mut scene, &viewer.session.snapshot());
    let mut rendered_revision = viewer.session.revision();
    let mut rendered_size = viewer.session.size();
    let mut title = viewer.title();

    loop {
        let window_size = Vec2::new(window.size()[0] as f32, window.size()[1] as f32);
        for event in window.events().iter() {
            match event.value {
                WindowEvent::Key(key, Action::Press, _) => viewer.handle_key(key),
                WindowEvent::CursorPos(x, y, _) => {
                    viewer.cursor = glam::Vec2::new(x as f32, y as f32);
                }
                WindowEvent::MouseButton(MouseButton::Button1, Action::Press, _) => {
                    viewer.begin_drag(&camera, window_size);
                }
                WindowEvent::MouseButton(MouseButton::Button1, Action::Release, _) => {
                    viewer.end_drag(&camera, window_size);
                }
                _ => {}
            }
        }

        viewer.advance_sequence();
        viewer.animate(&mut pieces);

        // rebuild after every applied turn or reinitialization
        if viewer.session.revision() != rendered_revision {
            for piece in pieces.drain(..) {
                for mut rendered in piece.nodes {
                    rendered.node.remove();
                }
            }
            pieces = build_scene(&mut scene, &viewer.session.snapshot());
            rendered_revision = viewer.session.revision();

            if viewer.session.size() != rendered_size {
                rendered_size = viewer.session.size();
                camera.set_dist(3.0 * rendered_size as f32 + 2.0);
            }
        }

        let next_title = viewer.title();
        if next_title != title {
            window.set_title(&next_title);
            title = next_title;
        }

        if !window.render_3d(&mut scene, &mut camera).await {
            break;
        }
    }
}
