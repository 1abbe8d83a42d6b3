pub mod path;

use tracing::debug;

pub use path::{PathPoint, PathSegment, RenderPath};

/// One sampled pointer position; `t` is epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub t: u64,
}

impl Point {
    pub fn new(x: f32, y: f32, t: u64) -> Self {
        Self { x, y, t }
    }
}

/// A closed pointer-down to pointer-up gesture. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    points: Vec<Point>,
}

impl Stroke {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Every committed stroke of one recognition request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ink {
    strokes: Vec<Stroke>,
}

impl Ink {
    pub fn new(strokes: Vec<Stroke>) -> Self {
        Self { strokes }
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(Stroke::len).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Down,
    Move,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub action: PointerAction,
    pub x: f32,
    pub y: f32,
    pub timestamp_ms: u64,
}

impl PointerEvent {
    pub fn down(x: f32, y: f32, timestamp_ms: u64) -> Self {
        Self { action: PointerAction::Down, x, y, timestamp_ms }
    }

    pub fn moved(x: f32, y: f32, timestamp_ms: u64) -> Self {
        Self { action: PointerAction::Move, x, y, timestamp_ms }
    }

    pub fn up(x: f32, y: f32, timestamp_ms: u64) -> Self {
        Self { action: PointerAction::Up, x, y, timestamp_ms }
    }
}

/// Output of a finished gesture: the raw stroke for recognition and its display curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedStroke {
    pub stroke: Stroke,
    pub path: RenderPath,
}

struct ActiveGesture {
    points: Vec<Point>,
    path: RenderPath,
    last: PathPoint,
}

/// Turns press/move/release pointer events into strokes.
///
/// Owns nothing beyond the gesture in progress; committed strokes are handed to the caller.
#[derive(Default)]
pub struct StrokeCapture {
    active: Option<ActiveGesture>,
}

impl StrokeCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// The path of the gesture in progress, for live drawing.
    pub fn current_path(&self) -> Option<&RenderPath> {
        self.active.as_ref().map(|gesture| &gesture.path)
    }

    /// Drops the gesture in progress without producing a stroke.
    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Feeds one pointer event; returns the finished stroke on release.
    ///
    /// Move and release events without a preceding press are ignored. A press followed
    /// directly by a release still yields a two-point stroke.
    pub fn handle(&mut self, event: PointerEvent) -> Option<CompletedStroke> {
        let point = Point::new(event.x, event.y, event.timestamp_ms);
        let position = PathPoint::new(event.x, event.y);

        match event.action {
            PointerAction::Down => {
                if self.active.is_some() {
                    debug!("pointer down while a gesture was open; restarting stroke");
                }
                let mut path = RenderPath::new();
                path.move_to(position);
                self.active = Some(ActiveGesture {
                    points: vec![point],
                    path,
                    last: position,
                });
                None
            }
            PointerAction::Move => {
                let gesture = self.active.as_mut()?;
                gesture.path.smooth_to(gesture.last, position);
                gesture.last = position;
                gesture.points.push(point);
                None
            }
            PointerAction::Up => {
                let mut gesture = self.active.take()?;
                gesture.path.line_to(gesture.last);
                gesture.points.push(point);
                Some(CompletedStroke {
                    stroke: Stroke { points: gesture.points },
                    path: gesture.path,
                })
            }
        }
    }
}
