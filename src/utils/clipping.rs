/// Angular ordering of the candidate vertices around their centroid
///
pub mod ordering;

/// Shoelace area of an ordered polygon and its adjoint
///
pub mod area;

use crate::utils::bbox::{Footprint, OrientedBox};
use crate::utils::clipping::area::polygon_area;
use crate::utils::clipping::ordering::{order_vertices, AngleSort};
use geo::Coord;

/// 4 corners of the first box, 4 corners of the second box, 16 edge intersections
pub const MAX_CANDIDATES: usize = 24;

/// Position of the first edge intersection in the candidate buffer
pub const INTERSECTION_OFFSET: usize = 8;

/// Distance below which a point is considered to lie on a polygon edge
pub const ON_EDGE_TOLERANCE: f64 = 1e-9;

/// Slack on the segment parameters of an edge intersection, covers corners that lie on an
/// edge only up to rounding
pub const SEGMENT_PARAMETER_TOLERANCE: f64 = 1e-6;

#[inline]
pub fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Buffer slot of the intersection between edge `a_edge` of the first box and edge
/// `b_edge` of the second box
///
#[inline]
pub fn intersection_slot(a_edge: usize, b_edge: usize) -> usize {
    INTERSECTION_OFFSET + 4 * a_edge + b_edge
}

/// Intersection of the segments `p0 -> p1` and `q0 -> q1`
///
/// The segments intersect when both parameters `t` (along `p`) and `u` (along `q`) lie in
/// `[0, 1]` widened by [`SEGMENT_PARAMETER_TOLERANCE`]. A corner rejected by
/// [`point_in_quad`] as lying on an edge is then still produced here. Parallel and collinear segments (`|numerator| <= epsilon`)
/// report no intersection: a collinear overlap is recovered by the corner containment
/// tests instead.
///
pub fn edge_intersection(
    p0: Coord<f64>,
    p1: Coord<f64>,
    q0: Coord<f64>,
    q1: Coord<f64>,
    epsilon: f64,
) -> Option<Coord<f64>> {
    let numerator = cross(p0 - p1, q0 - q1);
    if numerator.abs() <= epsilon {
        return None;
    }
    let t = cross(p0 - q0, q0 - q1) / numerator;
    let u = -cross(p0 - p1, p0 - q0) / numerator;
    let segment = -SEGMENT_PARAMETER_TOLERANCE..=1.0 + SEGMENT_PARAMETER_TOLERANCE;
    if segment.contains(&t) && segment.contains(&u) {
        Some(p0 + (p1 - p0) * t)
    } else {
        None
    }
}

/// Crossing-number containment test for a quadrilateral
///
/// Counts the edges of `quad` crossing the ray cast from `p` along +x; an odd count means
/// the point is inside. Points lying on an edge (within [`ON_EDGE_TOLERANCE`]) or on a
/// corner are reported as outside. Such points still reach the candidate buffer as edge
/// intersections, see [`edge_intersection`].
///
pub fn point_in_quad(p: Coord<f64>, quad: &[Coord<f64>; 4]) -> bool {
    let mut crossings = 0;
    for i in 0..4 {
        let a = quad[i] - p;
        let b = quad[(i + 1) % 4] - p;

        let edge = b - a;
        let length = (edge.x * edge.x + edge.y * edge.y).sqrt();
        let on_line = cross(a, b).abs() <= ON_EDGE_TOLERANCE * length.max(1.0);
        let between = a.x * b.x + a.y * b.y <= 0.0;
        if on_line && between {
            return false;
        }

        if (b.y > 0.0) != (a.y > 0.0) && a.x - a.y * (b.x - a.x) / (b.y - a.y) > 0.0 {
            crossings += 1;
        }
    }
    crossings % 2 == 1
}

/// Containment in the frame of an oriented box, with the half extents grown by `margin`
///
/// Comparisons are inclusive, so a point exactly on the boundary is inside.
///
pub fn point_in_box(p: Coord<f64>, b: &OrientedBox, margin: f64) -> bool {
    let local = b.to_local(p);
    local.x.abs() <= b.width() / 2.0 + margin && local.y.abs() <= b.height() / 2.0 + margin
}

/// Fixed-capacity buffer of intersection polygon vertex candidates with a validity mask
///
/// Layout: slots `0..4` hold the corners of the first box (valid when inside the second
/// one), slots `4..8` the corners of the second box (valid when inside the first one) and
/// slots `8..24` the edge intersections, see [`intersection_slot`].
///
#[derive(Clone, Debug)]
pub struct CandidateVertices {
    vertices: [Coord<f64>; MAX_CANDIDATES],
    mask: [bool; MAX_CANDIDATES],
}

impl CandidateVertices {
    pub fn collect<FA, FB>(
        a: &[Coord<f64>; 4],
        b: &[Coord<f64>; 4],
        a_in_b: FA,
        b_in_a: FB,
        epsilon: f64,
    ) -> Self
    where
        FA: Fn(Coord<f64>) -> bool,
        FB: Fn(Coord<f64>) -> bool,
    {
        let mut vertices = [Coord { x: 0.0, y: 0.0 }; MAX_CANDIDATES];
        let mut mask = [false; MAX_CANDIDATES];

        for k in 0..4 {
            vertices[k] = a[k];
            mask[k] = a_in_b(a[k]);
            vertices[4 + k] = b[k];
            mask[4 + k] = b_in_a(b[k]);
        }

        for i in 0..4 {
            for j in 0..4 {
                if let Some(p) =
                    edge_intersection(a[i], a[(i + 1) % 4], b[j], b[(j + 1) % 4], epsilon)
                {
                    let slot = intersection_slot(i, j);
                    vertices[slot] = p;
                    mask[slot] = true;
                }
            }
        }

        Self { vertices, mask }
    }

    pub fn vertices(&self) -> &[Coord<f64>; MAX_CANDIDATES] {
        &self.vertices
    }

    pub fn mask(&self) -> &[bool; MAX_CANDIDATES] {
        &self.mask
    }

    pub fn valid_count(&self) -> usize {
        self.mask.iter().filter(|m| **m).count()
    }
}

/// Area of the intersection of two footprints
///
/// Fewer than three valid candidates mean the footprints touch at most in a point or a
/// segment, and the area is zero.
///
pub fn intersection_area<S: AngleSort + ?Sized>(
    a: &Footprint,
    b: &Footprint,
    epsilon: f64,
    margin: f64,
    sorter: &S,
) -> f64 {
    let candidates = CandidateVertices::collect(
        a.corners(),
        b.corners(),
        |p| b.contains(p, margin),
        |p| a.contains(p, margin),
        epsilon,
    );
    let order = order_vertices(&candidates, sorter);
    if order.len() < 3 {
        return 0.0;
    }
    let polygon = order
        .iter()
        .map(|&i| candidates.vertices[i])
        .collect::<Vec<_>>();
    polygon_area(&polygon)
}
