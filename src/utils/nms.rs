/// Suppression in the ego frame by the sight distance score
///
pub mod sight;

use crate::utils::bbox::Footprint;
use crate::utils::overlap::{check_fields, compose, BoxLayout, OverlapConvention, OverlapMode};
use crate::utils::overlap::DEFAULT_OVERLAP_EPSILON;
use crate::Errors;
use itertools::Itertools;
use log::debug;
use ndarray::{ArrayView1, ArrayView2};
use rayon::prelude::*;

/// Box count from which [`nms_by_overlap`] precomputes the pairwise IoU matrix in parallel
pub const PARALLEL_NMS_MIN_BOXES: usize = 64;

/// Indices sorted by descending score, equal scores keep the ascending index order
///
pub fn score_order(scores: ArrayView1<f32>) -> Vec<usize> {
    (0..scores.len())
        .sorted_by(|&l, &r| scores[r].total_cmp(&scores[l]).then(l.cmp(&r)))
        .collect()
}

pub(crate) fn check_scores(n: usize, scores: ArrayView1<f32>) -> Result<(), Errors> {
    if scores.len() != n {
        debug!("Rejecting {} scores for {} boxes", scores.len(), n);
        return Err(Errors::ShapeMismatch {
            argument: "scores",
            expected: format!("[{}] (one score per box)", n),
            actual: format!("{:?}", scores.shape()),
        });
    }
    Ok(())
}

/// Greedy suppression pass over positions of the sorted order
///
/// `suppresses(p, q)` tells whether the kept box at position `p` removes the box at
/// position `q > p`; it is called only for boxes not suppressed yet.
///
fn greedy_suppress<F>(order: &[usize], mut suppresses: F) -> Vec<usize>
where
    F: FnMut(usize, usize) -> bool,
{
    let mut suppressed = vec![false; order.len()];
    let mut keep = Vec::new();

    for p in 0..order.len() {
        if suppressed[p] {
            continue;
        }
        keep.push(order[p]);

        for q in p + 1..order.len() {
            if !suppressed[q] && suppresses(p, q) {
                suppressed[q] = true;
            }
        }
    }
    keep
}

/// NMS algorithm implementation
///
/// # Parameters
/// * `items` - boxes in any representation;
/// * `scores` - one score per box, higher is better;
/// * `suppresses` - whether a kept box removes a lower scored one.
///
/// Returns the indices of the kept boxes in the descending score order.
///
pub fn nms_by_predicate<T, P>(
    items: &[T],
    scores: ArrayView1<f32>,
    suppresses: P,
) -> Result<Vec<usize>, Errors>
where
    P: Fn(&T, &T) -> bool,
{
    check_scores(items.len(), scores)?;
    let order = score_order(scores);
    Ok(greedy_suppress(&order, |p, q| {
        suppresses(&items[order[p]], &items[order[q]])
    }))
}

/// Same as [`nms_by_predicate`], the predicate is evaluated for all pairs in parallel
/// before the sequential pass, so both produce the same keep list.
///
pub fn parallel_nms_by_predicate<T, P>(
    items: &[T],
    scores: ArrayView1<f32>,
    suppresses: P,
) -> Result<Vec<usize>, Errors>
where
    T: Sync,
    P: Fn(&T, &T) -> bool + Sync,
{
    check_scores(items.len(), scores)?;
    let order = score_order(scores);

    let matrix = order
        .par_iter()
        .enumerate()
        .map(|(p, &i)| {
            order[p + 1..]
                .iter()
                .map(|&j| suppresses(&items[i], &items[j]))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    Ok(greedy_suppress(&order, |p, q| matrix[p][q - p - 1]))
}

/// Suppresses boxes whose metric with a kept box is greater than `threshold`
///
pub fn nms_by_metric<T, M>(
    items: &[T],
    scores: ArrayView1<f32>,
    threshold: f32,
    metric: M,
) -> Result<Vec<usize>, Errors>
where
    M: Fn(&T, &T) -> f32,
{
    nms_by_predicate(items, scores, |l, r| metric(l, r) > threshold)
}

pub fn parallel_nms_by_metric<T, M>(
    items: &[T],
    scores: ArrayView1<f32>,
    threshold: f32,
    metric: M,
) -> Result<Vec<usize>, Errors>
where
    T: Sync,
    M: Fn(&T, &T) -> f32 + Sync,
{
    parallel_nms_by_predicate(items, scores, |l, r| metric(l, r) > threshold)
}

/// Rotated NMS of `[x, y, z, dx, dy, dz, yaw]` boxes by their BEV IoU
///
/// A box is suppressed when its IoU with a kept box is greater than `iou_threshold`.
///
pub fn nms_by_overlap(
    boxes: ArrayView2<f32>,
    scores: ArrayView1<f32>,
    iou_threshold: f32,
) -> Result<Vec<usize>, Errors> {
    let convention = OverlapConvention::nms3d();
    let footprints = convention.footprints(boxes, "boxes")?;
    let metric = |l: &Footprint, r: &Footprint| convention.pair_metric(l, r) as f32;

    let keep = if footprints.len() >= PARALLEL_NMS_MIN_BOXES {
        parallel_nms_by_metric(&footprints, scores, iou_threshold, metric)?
    } else {
        nms_by_metric(&footprints, scores, iou_threshold, metric)?
    };
    debug!(
        "Rotated NMS kept {} of {} boxes, IoU threshold {}",
        keep.len(),
        footprints.len(),
        iou_threshold
    );
    Ok(keep)
}

/// Axis-aligned BEV rectangle `[x1, y1, x2, y2]` of a `[x, y, z, dx, dy, dz, yaw]` row
///
fn bev_rectangle(row: ArrayView1<f32>) -> [f64; 4] {
    let (x, y) = (row[0] as f64, row[1] as f64);
    let (hw, hh) = (row[3] as f64 / 2.0, row[4] as f64 / 2.0);
    [x - hw, y - hh, x + hw, y + hh]
}

fn axis_aligned_iou(l: &[f64; 4], r: &[f64; 4]) -> f64 {
    let width = (l[2].min(r[2]) - l[0].max(r[0])).max(0.0);
    let height = (l[3].min(r[3]) - l[1].max(r[1])).max(0.0);
    let intersection = width * height;
    let area_l = (l[2] - l[0]) * (l[3] - l[1]);
    let area_r = (r[2] - r[0]) * (r[3] - r[1]);
    compose(
        intersection,
        area_l,
        area_r,
        OverlapMode::IoU,
        DEFAULT_OVERLAP_EPSILON,
    )
}

/// NMS of `[x, y, z, dx, dy, dz, yaw]` boxes with the yaw ignored
///
/// The BEV rectangles are axis aligned, a box is suppressed when its IoU with a kept box is
/// greater than or equal to `iou_threshold`.
///
pub fn nms_axis_aligned(
    boxes: ArrayView2<f32>,
    scores: ArrayView1<f32>,
    iou_threshold: f32,
) -> Result<Vec<usize>, Errors> {
    check_fields(boxes, BoxLayout::Xyzwhdr, "boxes")?;
    let rectangles = boxes.rows().into_iter().map(bev_rectangle).collect::<Vec<_>>();
    let keep = nms_by_predicate(&rectangles, scores, |l, r| {
        axis_aligned_iou(l, r) as f32 >= iou_threshold
    })?;
    debug!(
        "Axis-aligned NMS kept {} of {} boxes, IoU threshold {}",
        keep.len(),
        rectangles.len(),
        iou_threshold
    );
    Ok(keep)
}

/// Suppression with a caller supplied overlap convention, used when boxes come in another
/// layout than `[x, y, z, dx, dy, dz, yaw]`
///
pub fn nms_with_convention(
    boxes: ArrayView2<f32>,
    scores: ArrayView1<f32>,
    threshold: f32,
    convention: &OverlapConvention,
) -> Result<Vec<usize>, Errors> {
    let footprints = convention.footprints(boxes, "boxes")?;
    parallel_nms_by_metric(&footprints, scores, threshold, |l, r| {
        convention.pair_metric(l, r) as f32
    })
}
