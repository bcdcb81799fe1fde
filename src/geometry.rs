//! Planar geometry tests used by the terrain classifier.

use crate::projection::PlanarPoint;

/// Open chain of points (road, rail or river segment chain).
pub type Polyline = Vec<PlanarPoint>;

/// Closed ring; closure back to the first point is implicit.
pub type Ring = Vec<PlanarPoint>;

/// Distance reported when there are no lines to measure against.
pub const FAR_AWAY: f64 = f64::INFINITY;

const HORIZONTAL_EDGE_EPS: f64 = 1e-12;

/// Minimum distance from `point` to any segment of any line.
pub fn distance_to_polylines(point: PlanarPoint, lines: &[Polyline]) -> f64 {
    let mut best = FAR_AWAY;
    for line in lines {
        match line.as_slice() {
            [] => {}
            [single] => best = best.min(point.distance(*single)),
            points => {
                for segment in points.windows(2) {
                    best = best.min(distance_to_segment(point, segment[0], segment[1]));
                }
            }
        }
    }
    best
}

/// Distance to the segment `a`-`b`, clamping the projection onto its ends.
pub fn distance_to_segment(point: PlanarPoint, a: PlanarPoint, b: PlanarPoint) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return point.distance(a);
    }
    let t = (((point.x - a.x) * dx + (point.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    point.distance(PlanarPoint::new(a.x + t * dx, a.y + t * dy))
}

/// Even-odd ray casting over the implicitly closed ring.
pub fn point_in_polygon(point: PlanarPoint, ring: &[PlanarPoint]) -> bool {
    let n = ring.len();
    let mut inside = false;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        if (a.y > point.y) != (b.y > point.y) {
            // eps keeps near-horizontal edges from dividing by zero
            let cross_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y + HORIZONTAL_EDGE_EPS) + a.x;
            if point.x < cross_x {
                inside = !inside;
            }
        }
    }
    inside
}
