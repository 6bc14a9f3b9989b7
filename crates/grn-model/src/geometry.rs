use serde::{Deserialize, Serialize};

/// A position in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// A straight line segment, used for routed edges and draft previews.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Direction of the segment in radians, measured from the positive x
    /// axis. A degenerate segment has angle 0.
    pub fn angle(&self) -> f64 {
        (self.end.y - self.start.y).atan2(self.end.x - self.start.x)
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Shortest distance from `point` to any point of the segment.
    pub fn distance_to(&self, point: Point) -> f64 {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq <= f64::EPSILON {
            return self.start.distance(point);
        }
        let t = (((point.x - self.start.x) * dx
            + (point.y - self.start.y) * dy)
            / len_sq)
            .clamp(0.0, 1.0);
        Point::new(self.start.x + t * dx, self.start.y + t * dy)
            .distance(point)
    }

    /// Triangle for an arrow head sitting on `end`, opening backwards
    /// along the segment by `half_angle` radians on each side.
    pub fn arrow_head(&self, size: f64, half_angle: f64) -> [Point; 3] {
        let angle = self.angle();
        let tip = self.end;
        let left = Point::new(
            tip.x - size * (angle - half_angle).cos(),
            tip.y - size * (angle - half_angle).sin(),
        );
        let right = Point::new(
            tip.x - size * (angle + half_angle).cos(),
            tip.y - size * (angle + half_angle).sin(),
        );
        [tip, left, right]
    }
}

/// Route an edge between two circles so the line starts and ends on their
/// boundaries instead of their centers.
pub fn route_between(
    source: Point,
    source_radius: f64,
    target: Point,
    target_radius: f64,
) -> Segment {
    let angle = (target.y - source.y).atan2(target.x - source.x);
    let (sin, cos) = angle.sin_cos();
    Segment::new(
        source.offset(source_radius * cos, source_radius * sin),
        target.offset(-target_radius * cos, -target_radius * sin),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn route_is_offset_by_each_radius() {
        let seg = route_between(
            Point::new(0.0, 0.0),
            25.0,
            Point::new(100.0, 0.0),
            10.0,
        );
        assert!(close(seg.start, Point::new(25.0, 0.0)));
        assert!(close(seg.end, Point::new(90.0, 0.0)));
    }

    #[test]
    fn route_follows_diagonal() {
        let seg = route_between(
            Point::new(0.0, 0.0),
            5.0,
            Point::new(30.0, 40.0),
            5.0,
        );
        assert!(close(seg.start, Point::new(3.0, 4.0)));
        assert!(close(seg.end, Point::new(27.0, 36.0)));
    }

    #[test]
    fn distance_to_clamps_to_endpoints() {
        let seg =
            Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert!((seg.distance_to(Point::new(5.0, 3.0)) - 3.0).abs() < 1e-9);
        assert!(
            (seg.distance_to(Point::new(-4.0, 3.0)) - 5.0).abs() < 1e-9
        );
        let dot = Segment::new(Point::new(1.0, 1.0), Point::new(1.0, 1.0));
        assert!((dot.distance_to(Point::new(4.0, 5.0)) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn arrow_head_points_back_along_segment() {
        let seg =
            Segment::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let [tip, left, right] =
            seg.arrow_head(12.0, 30f64.to_radians());
        assert!(close(tip, Point::new(100.0, 0.0)));
        assert!(left.x < 100.0 && right.x < 100.0);
        assert!((left.y + right.y).abs() < 1e-9);
        assert!((tip.distance(left) - 12.0).abs() < 1e-9);
    }
}
