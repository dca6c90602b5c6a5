use geo::Coord;

/// Twice the signed area of a closed polygon, positive for counter-clockwise winding
///
pub fn shoelace(points: &[Coord<f64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, next)| p.x * next.y - next.x * p.y)
        .sum()
}

/// Unsigned area of a closed polygon given as an ordered vertex list
///
pub fn polygon_area(points: &[Coord<f64>]) -> f64 {
    0.5 * shoelace(points).abs()
}

/// Adjoint of [`polygon_area`]: the gradient of the loss w.r.t. every vertex given the
/// gradient w.r.t. the area.
///
/// The area is not differentiable where the signed sum is zero, the gradient is zero there.
///
pub fn polygon_area_backward(points: &[Coord<f64>], grad_area: f64) -> Vec<Coord<f64>> {
    let n = points.len();
    let signed = shoelace(points);
    if n < 3 || signed == 0.0 {
        return vec![Coord { x: 0.0, y: 0.0 }; n];
    }
    let scale = 0.5 * signed.signum() * grad_area;
    (0..n)
        .map(|k| {
            let prev = points[(k + n - 1) % n];
            let next = points[(k + 1) % n];
            Coord {
                x: scale * (next.y - prev.y),
                y: scale * (prev.x - next.x),
            }
        })
        .collect()
}
