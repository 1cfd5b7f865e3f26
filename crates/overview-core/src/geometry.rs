//! Map projection and fire-area polygon helpers.

use overview_types::{Point2, Vector3};

use crate::config::MapProjection;

/// Why a point sequence is not a valid fire-area hull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonDefect {
    /// Fewer than three vertices.
    TooFewPoints {
        /// Number of vertices supplied.
        count: usize,
    },
    /// A vertex is NaN or infinite.
    NonFinite,
    /// All vertices lie on one line.
    Degenerate,
    /// A vertex lies inside the hull or on one of its edges.
    NotConvex,
    /// The same vertex appears more than once.
    DuplicateVertex,
    /// Vertices are on the hull but out of order, so edges cross.
    SelfIntersecting,
}

impl core::fmt::Display for PolygonDefect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooFewPoints { count } => write!(f, "{count} vertices, need at least 3"),
            Self::NonFinite => write!(f, "non-finite vertex"),
            Self::Degenerate => write!(f, "collinear vertices"),
            Self::NotConvex => write!(f, "not convex"),
            Self::DuplicateVertex => write!(f, "duplicate vertex"),
            Self::SelfIntersecting => write!(f, "self-intersecting"),
        }
    }
}

/// Project a world position onto the overview image.
pub fn project(projection: &MapProjection, world: Vector3) -> Point2 {
    Point2::new(
        (world.x - projection.origin_x) / projection.scale,
        (projection.origin_y - world.y) / projection.scale,
    )
}

/// Z component of `(b - a) x (c - a)`. Positive for a counter-clockwise turn.
fn cross(a: Point2, b: Point2, c: Point2) -> f64 {
    (b.x - a.x).mul_add(c.y - a.y, -((b.y - a.y) * (c.x - a.x)))
}

fn push_hull_point(chain: &mut Vec<Point2>, point: Point2) {
    while let [.., a, b] = chain.as_slice() {
        if cross(*a, *b, point) > 0.0 {
            break;
        }
        chain.pop();
    }
    chain.push(point);
}

/// Convex hull of a point cloud (Andrew's monotone chain).
///
/// Non-finite points are ignored. The result is counter-clockwise in a
/// y-up frame, starts at the lowest-x point, and contains only strict
/// corners. Fewer than three points come back when the input is
/// degenerate.
pub fn convex_hull(points: &[Point2]) -> Vec<Point2> {
    let mut sorted: Vec<Point2> = points.iter().copied().filter(|p| p.is_finite()).collect();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower = Vec::with_capacity(sorted.len());
    for point in &sorted {
        push_hull_point(&mut lower, *point);
    }
    let mut upper = Vec::with_capacity(sorted.len());
    for point in sorted.iter().rev() {
        push_hull_point(&mut upper, *point);
    }

    // Each chain ends where the other one starts.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Hull of `points` with every point widened to a square of half-width
/// `radius`.
///
/// Any non-empty set of finite points spans an area this way, so a lone or
/// collinear fire still gets a polygon sized to what is burning.
pub fn padded_hull(points: &[Point2], radius: f64) -> Vec<Point2> {
    let corners: Vec<Point2> = points
        .iter()
        .flat_map(|p| {
            [
                Point2::new(p.x - radius, p.y - radius),
                Point2::new(p.x + radius, p.y - radius),
                Point2::new(p.x + radius, p.y + radius),
                Point2::new(p.x - radius, p.y + radius),
            ]
        })
        .collect();
    convex_hull(&corners)
}

/// Check that `polygon` is a simple, strictly convex hull.
///
/// Winding order does not matter. Returns the first defect found.
pub fn polygon_defect(polygon: &[Point2]) -> Option<PolygonDefect> {
    if polygon.len() < 3 {
        return Some(PolygonDefect::TooFewPoints {
            count: polygon.len(),
        });
    }
    if !polygon.iter().all(|p| p.is_finite()) {
        return Some(PolygonDefect::NonFinite);
    }

    let hull = convex_hull(polygon);
    if hull.len() < 3 {
        return Some(PolygonDefect::Degenerate);
    }
    if !polygon.iter().all(|p| hull.contains(p)) {
        return Some(PolygonDefect::NotConvex);
    }
    if polygon.len() != hull.len() {
        return Some(PolygonDefect::DuplicateVertex);
    }

    // Every vertex is a hull corner exactly once; the polygon is simple iff
    // it walks the hull in cyclic order, in either direction.
    let Some(start) = polygon
        .first()
        .and_then(|first| hull.iter().position(|p| p == first))
    else {
        return Some(PolygonDefect::NotConvex);
    };
    let forward = hull.iter().cycle().skip(start).take(hull.len());
    let backward = hull
        .iter()
        .rev()
        .cycle()
        .skip(hull.len().saturating_sub(1).saturating_sub(start))
        .take(hull.len());

    if polygon.iter().eq(forward) || polygon.iter().eq(backward) {
        None
    } else {
        Some(PolygonDefect::SelfIntersecting)
    }
}
