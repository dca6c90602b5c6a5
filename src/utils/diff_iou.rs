use crate::utils::bbox::{OrientedBox, CORNER_SIGNS};
use crate::utils::clipping::area::{polygon_area, polygon_area_backward};
use crate::utils::clipping::ordering::{order_vertices, AngleSort, Atan2Sort};
use crate::utils::clipping::{point_in_quad, CandidateVertices, INTERSECTION_OFFSET};
use crate::utils::overlap::{check_fields, BoxLayout, DEFAULT_OVERLAP_EPSILON};
use crate::Errors;
use geo::Coord;
use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;

/// Lower bound of the union used when the boxes have no area
pub const DEFAULT_DIFF_IOU_EPSILON: f64 = 1e-6;

/// IoU of aligned `[x, y, w, h, yaw]` boxes together with its local Jacobians
///
/// The intersection polygon is rebuilt for every pair: corners of one box inside the other
/// (crossing-number test, boundary points are outside), the 16 edge intersections, the
/// angular order of the valid candidates and the shoelace area. The order is a constant
/// for the gradient, so derivatives flow through the gathered vertex coordinates only.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiffIouRotated {
    epsilon: f64,
}

impl Default for DiffIouRotated {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_DIFF_IOU_EPSILON,
        }
    }
}

/// Per-pair IoU and its derivatives w.r.t. the five parameters of both boxes
///
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PairGradient {
    pub iou: f64,
    pub grad_a: [f64; 5],
    pub grad_b: [f64; 5],
}

/// Result of [`DiffIouRotated::forward`]
///
/// `grad_a[i]` and `grad_b[i]` hold `d iou[i] / d boxes_a[i]` and `d iou[i] / d boxes_b[i]`.
///
#[derive(Clone, Debug, PartialEq)]
pub struct DiffIouOutput {
    pub iou: Array1<f32>,
    pub grad_a: Array2<f32>,
    pub grad_b: Array2<f32>,
}

impl DiffIouOutput {
    /// Chains the upstream gradient `d loss / d iou` into `d loss / d boxes_a` and
    /// `d loss / d boxes_b`
    ///
    pub fn backward(
        &self,
        grad_iou: ArrayView1<f32>,
    ) -> Result<(Array2<f32>, Array2<f32>), Errors> {
        if grad_iou.len() != self.iou.len() {
            debug!(
                "Rejecting upstream gradient of length {}, expected {}",
                grad_iou.len(),
                self.iou.len()
            );
            return Err(Errors::ShapeMismatch {
                argument: "grad_iou",
                expected: format!("[{}]", self.iou.len()),
                actual: format!("{:?}", grad_iou.shape()),
            });
        }
        let upstream = grad_iou.insert_axis(Axis(1));
        Ok((&self.grad_a * &upstream, &self.grad_b * &upstream))
    }
}

impl DiffIouRotated {
    pub fn new(epsilon: f64) -> Self {
        assert!(epsilon > 0.0, "Epsilon must be positive.");
        Self { epsilon }
    }

    pub fn forward(
        &self,
        boxes_a: ArrayView2<f32>,
        boxes_b: ArrayView2<f32>,
    ) -> Result<DiffIouOutput, Errors> {
        self.forward_with(boxes_a, boxes_b, &Atan2Sort)
    }

    /// Same as [`DiffIouRotated::forward`] with a custom angular sort
    ///
    pub fn forward_with<S: AngleSort + ?Sized>(
        &self,
        boxes_a: ArrayView2<f32>,
        boxes_b: ArrayView2<f32>,
        sorter: &S,
    ) -> Result<DiffIouOutput, Errors> {
        let a = read_boxes(boxes_a, "boxes_a")?;
        let b = read_boxes(boxes_b, "boxes_b")?;
        if a.len() != b.len() {
            debug!(
                "Rejecting differentiable IoU of {:?} and {:?}",
                boxes_a.shape(),
                boxes_b.shape()
            );
            return Err(Errors::ShapeMismatch {
                argument: "boxes_b",
                expected: format!("[{}, 5] (same rows as boxes_a)", a.len()),
                actual: format!("{:?}", boxes_b.shape()),
            });
        }

        let pairs = a
            .par_iter()
            .zip(b.par_iter())
            .map(|(a, b)| iou_with_gradient(a, b, self.epsilon, sorter))
            .collect::<Vec<_>>();

        let n = pairs.len();
        let mut iou = Array1::<f32>::zeros(n);
        let mut grad_a = Array2::<f32>::zeros((n, 5));
        let mut grad_b = Array2::<f32>::zeros((n, 5));
        for (i, pair) in pairs.iter().enumerate() {
            iou[i] = pair.iou as f32;
            for k in 0..5 {
                grad_a[[i, k]] = pair.grad_a[k] as f32;
                grad_b[[i, k]] = pair.grad_b[k] as f32;
            }
        }
        Ok(DiffIouOutput {
            iou,
            grad_a,
            grad_b,
        })
    }
}

/// IoU of aligned `[x, y, w, h, yaw]` boxes with the default settings
///
pub fn differentiable_iou(
    boxes_a: ArrayView2<f32>,
    boxes_b: ArrayView2<f32>,
) -> Result<Array1<f32>, Errors> {
    Ok(DiffIouRotated::default().forward(boxes_a, boxes_b)?.iou)
}

fn read_boxes(boxes: ArrayView2<f32>, argument: &'static str) -> Result<Vec<[f64; 5]>, Errors> {
    check_fields(boxes, BoxLayout::Xywhr, argument)?;
    boxes
        .rows()
        .into_iter()
        .enumerate()
        .map(|(row, b)| {
            for value in [b[2], b[3]] {
                if !(value.is_finite() && value >= 0.0) {
                    debug!("Rejecting {} row {}: extent {}", argument, row, value);
                    return Err(Errors::InvalidExtent {
                        argument,
                        row,
                        value,
                    });
                }
            }
            Ok([b[0] as f64, b[1] as f64, b[2] as f64, b[3] as f64, b[4] as f64])
        })
        .collect()
}

fn to_box(params: &[f64; 5]) -> OrientedBox {
    OrientedBox::new(params[0], params[1], params[2], params[3], params[4])
}

/// Gradients of the four segment ends `[p0, p1, q0, q1]` given the gradient of their
/// intersection point `p0 + t (p1 - p0)`
///
fn intersection_backward(ends: [Coord<f64>; 4], grad: Coord<f64>) -> [Coord<f64>; 4] {
    let [p0, p1, q0, q1] = ends;
    let d = p1 - p0;
    let e = q1 - q0;
    let w = q0 - p0;
    let numerator = w.x * e.y - w.y * e.x;
    let denominator = d.x * e.y - d.y * e.x;
    let t = numerator / denominator;

    let grad_t = grad.x * d.x + grad.y * d.y;
    let grad_numerator = grad_t / denominator;
    let grad_denominator = -grad_t * t / denominator;

    let grad_w = Coord {
        x: grad_numerator * e.y,
        y: -grad_numerator * e.x,
    };
    let grad_e = Coord {
        x: -grad_numerator * w.y - grad_denominator * d.y,
        y: grad_numerator * w.x + grad_denominator * d.x,
    };
    let grad_d = Coord {
        x: t * grad.x + grad_denominator * e.y,
        y: t * grad.y - grad_denominator * e.x,
    };

    [grad - grad_w - grad_d, grad_d, grad_w - grad_e, grad_e]
}

/// Chains corner gradients into `[x, y, w, h, yaw]`
///
fn corners_backward(params: &[f64; 5], grad_corners: &[Coord<f64>; 4]) -> [f64; 5] {
    let (s, c) = params[4].sin_cos();
    let mut grad = [0.0; 5];
    for ((sx, sy), g) in CORNER_SIGNS.iter().zip(grad_corners.iter()) {
        let lx = sx * params[2];
        let ly = sy * params[3];
        grad[0] += g.x;
        grad[1] += g.y;
        grad[2] += sx * (g.x * c + g.y * s);
        grad[3] += sy * (-g.x * s + g.y * c);
        grad[4] += g.x * (-lx * s - ly * c) + g.y * (lx * c - ly * s);
    }
    grad
}

pub(crate) fn iou_with_gradient<S: AngleSort + ?Sized>(
    a: &[f64; 5],
    b: &[f64; 5],
    epsilon: f64,
    sorter: &S,
) -> PairGradient {
    let corners_a = to_box(a).corners();
    let corners_b = to_box(b).corners();
    let candidates = CandidateVertices::collect(
        &corners_a,
        &corners_b,
        |p| point_in_quad(p, &corners_b),
        |p| point_in_quad(p, &corners_a),
        DEFAULT_OVERLAP_EPSILON,
    );
    let order = order_vertices(&candidates, sorter);
    let polygon = order
        .iter()
        .map(|&slot| candidates.vertices()[slot])
        .collect::<Vec<_>>();
    let intersection = if order.len() < 3 {
        0.0
    } else {
        polygon_area(&polygon)
    };

    let area_a = a[2] * a[3];
    let area_b = b[2] * b[3];
    let union = area_a + area_b - intersection;
    let (iou, grad_intersection, grad_areas) = if union > epsilon {
        (
            intersection / union,
            (area_a + area_b) / (union * union),
            -intersection / (union * union),
        )
    } else {
        (intersection / epsilon, 1.0 / epsilon, 0.0)
    };

    let mut grad_corners_a = [Coord { x: 0.0, y: 0.0 }; 4];
    let mut grad_corners_b = [Coord { x: 0.0, y: 0.0 }; 4];
    if order.len() >= 3 {
        let grad_polygon = polygon_area_backward(&polygon, grad_intersection);
        for (&slot, grad) in order.iter().zip(grad_polygon) {
            if slot < 4 {
                grad_corners_a[slot] = grad_corners_a[slot] + grad;
            } else if slot < INTERSECTION_OFFSET {
                grad_corners_b[slot - 4] = grad_corners_b[slot - 4] + grad;
            } else {
                let i = (slot - INTERSECTION_OFFSET) / 4;
                let j = (slot - INTERSECTION_OFFSET) % 4;
                let (next_i, next_j) = ((i + 1) % 4, (j + 1) % 4);
                let grad_ends = intersection_backward(
                    [corners_a[i], corners_a[next_i], corners_b[j], corners_b[next_j]],
                    grad,
                );
                grad_corners_a[i] = grad_corners_a[i] + grad_ends[0];
                grad_corners_a[next_i] = grad_corners_a[next_i] + grad_ends[1];
                grad_corners_b[j] = grad_corners_b[j] + grad_ends[2];
                grad_corners_b[next_j] = grad_corners_b[next_j] + grad_ends[3];
            }
        }
    }

    let mut grad_a = corners_backward(a, &grad_corners_a);
    let mut grad_b = corners_backward(b, &grad_corners_b);
    grad_a[2] += grad_areas * a[3];
    grad_a[3] += grad_areas * a[2];
    grad_b[2] += grad_areas * b[3];
    grad_b[3] += grad_areas * b[2];

    PairGradient {
        iou,
        grad_a,
        grad_b,
    }
}
