//! Connection paths.
//!
//! A connection leaves its source socket horizontally, runs straight to a
//! point just before the target socket, and enters it horizontally.

use kurbo::{BezPath, ParamCurveNearest, Point, Vec2};

/// Horizontal run at each end of a connection.
pub const LEAD: f64 = 25.0;

pub fn connection_path(source: Point, target: Point) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(source);
    path.line_to(source + Vec2::new(LEAD, 0.0));
    path.line_to(target - Vec2::new(LEAD, 0.0));
    path.line_to(target);
    path
}

/// Shortest distance from `point` to `path`.
pub fn distance_to(path: &BezPath, point: Point) -> f64 {
    path.segments()
        .map(|seg| seg.nearest(point, 1e-6).distance_sq)
        .fold(f64::INFINITY, f64::min)
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_has_horizontal_leads() {
        let path = connection_path(Point::new(0.0, 0.0), Point::new(200.0, 100.0));
        let segments: Vec<_> = path.segments().collect();
        assert_eq!(segments.len(), 3);
        assert!(distance_to(&path, Point::new(10.0, 0.0)) < 1e-9);
        assert!(distance_to(&path, Point::new(190.0, 100.0)) < 1e-9);
    }

    #[test]
    fn distance_from_far_point() {
        let path = connection_path(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!((distance_to(&path, Point::new(50.0, 10.0)) - 10.0).abs() < 1e-9);
    }
}
