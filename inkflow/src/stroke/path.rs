/// A 2D coordinate on the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub x: f32,
    pub y: f32,
}

impl PathPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn midpoint(self, other: PathPoint) -> PathPoint {
        PathPoint::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(PathPoint),
    QuadTo { control: PathPoint, end: PathPoint },
    LineTo(PathPoint),
}

/// Visual-only curve for one stroke.
///
/// Built from the same pointer events as the [`Stroke`](super::Stroke) but smoothed with
/// midpoint quadratic segments, so its geometry does not match the raw points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPath {
    segments: Vec<PathSegment>,
}

impl RenderPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub(crate) fn move_to(&mut self, point: PathPoint) {
        self.segments.push(PathSegment::MoveTo(point));
    }

    /// Curve through `control` ending halfway between `control` and `next`.
    pub(crate) fn smooth_to(&mut self, control: PathPoint, next: PathPoint) {
        self.segments.push(PathSegment::QuadTo {
            control,
            end: control.midpoint(next),
        });
    }

    pub(crate) fn line_to(&mut self, point: PathPoint) {
        self.segments.push(PathSegment::LineTo(point));
    }

    /// Samples the path into a polyline, `steps_per_curve` points per quadratic segment.
    pub fn flatten(&self, steps_per_curve: usize) -> Vec<PathPoint> {
        let steps = steps_per_curve.max(1);
        let mut out = Vec::with_capacity(self.segments.len() * steps);
        let mut cursor: Option<PathPoint> = None;

        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(point) | PathSegment::LineTo(point) => {
                    out.push(point);
                    cursor = Some(point);
                }
                PathSegment::QuadTo { control, end } => {
                    let start = cursor.unwrap_or(control);
                    for step in 1..=steps {
                        let t = step as f32 / steps as f32;
                        out.push(quadratic_point(start, control, end, t));
                    }
                    cursor = Some(end);
                }
            }
        }

        out
    }
}

fn quadratic_point(start: PathPoint, control: PathPoint, end: PathPoint, t: f32) -> PathPoint {
    let inv = 1.0 - t;
    let a = inv * inv;
    let b = 2.0 * inv * t;
    let c = t * t;
    PathPoint::new(
        a * start.x + b * control.x + c * end.x,
        a * start.y + b * control.y + c * end.y,
    )
}
