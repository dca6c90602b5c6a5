use crate::utils::bbox::{Footprint, OrientedBox};
use crate::utils::clipping::intersection_area;
use crate::utils::clipping::ordering::Atan2Sort;
use crate::Errors;
use geo::Coord;
use log::debug;
use ndarray::parallel::prelude::*;
use ndarray::{Array1, Array2, ArrayD, ArrayView1, ArrayView2, Axis};

/// Tolerance of the union/area denominators and of the parallel edge test
pub const DEFAULT_OVERLAP_EPSILON: f64 = 1e-8;

/// Growth of the box half extents used by the corner containment test
pub const DEFAULT_OVERLAP_MARGIN: f64 = 1e-5;

/// Containment margin of the rotated 3D detection NMS
pub const NMS3D_MARGIN: f64 = 1e-2;

/// Field layout of a packed box row
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoxLayout {
    /// `[x1, y1, x2, y2, x3, y3, x4, y4]`, an arbitrary convex quadrilateral
    Corners,
    /// `[x1, y1, x2, y2, angle]`, two opposite corners of the unrotated box
    Xyxyr,
    /// `[x, y, dx, dy, angle]`
    #[default]
    Xywhr,
    /// `[x1, y1, z1, x2, y2, z2, angle]`, projected to BEV
    Xyzxyzr,
    /// `[x, y, z, dx, dy, dz, angle]`, projected to BEV
    Xyzwhdr,
}

impl BoxLayout {
    pub fn fields(&self) -> usize {
        match self {
            BoxLayout::Corners => 8,
            BoxLayout::Xyxyr | BoxLayout::Xywhr => 5,
            BoxLayout::Xyzxyzr | BoxLayout::Xyzwhdr => 7,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BoxLayout::Corners => "corners",
            BoxLayout::Xyxyr => "xyxyr",
            BoxLayout::Xywhr => "xywhr",
            BoxLayout::Xyzxyzr => "xyzxyzr",
            BoxLayout::Xyzwhdr => "xyzwhdr",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AngleUnit {
    #[default]
    Radian,
    Degree,
}

/// Direction in which a positive angle rotates the box
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Winding {
    Clockwise,
    #[default]
    CounterClockwise,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverlapMode {
    /// Intersection area
    Overlap,
    /// Intersection over union
    #[default]
    IoU,
    /// Intersection over the area of the box from the first tensor
    IoF,
}

/// Interpretation of the input tensors and the metric computed from the intersection area
///
/// The convention is resolved once per call: the layout, angle unit and winding only
/// affect how rows become footprints, the geometry core always works with radians and the
/// counter-clockwise winding.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlapConvention {
    layout: BoxLayout,
    angle_unit: AngleUnit,
    winding: Winding,
    mode: OverlapMode,
    epsilon: f64,
    margin: f64,
    aligned: bool,
}

impl Default for OverlapConvention {
    fn default() -> Self {
        Self {
            layout: BoxLayout::default(),
            angle_unit: AngleUnit::default(),
            winding: Winding::default(),
            mode: OverlapMode::default(),
            epsilon: DEFAULT_OVERLAP_EPSILON,
            margin: DEFAULT_OVERLAP_MARGIN,
            aligned: false,
        }
    }
}

impl OverlapConvention {
    /// Intersection areas in the BEV plane. Five-field rows are read as `xyxyr` with the
    /// yaw measured clockwise, anything else as `xyzwhdr` with the usual counter-clockwise
    /// yaw.
    ///
    pub fn boxes_overlap_bev(fields: usize) -> Self {
        let convention = Self::default().mode(OverlapMode::Overlap);
        if fields == 5 {
            convention
                .layout(BoxLayout::Xyxyr)
                .winding(Winding::Clockwise)
        } else {
            convention
                .layout(BoxLayout::Xyzwhdr)
                .winding(Winding::CounterClockwise)
        }
    }

    /// All-pairs BEV IoU of `[x, y, z, dx, dy, dz, yaw]` boxes
    ///
    pub fn boxes_iou_bev() -> Self {
        Self::default()
            .layout(BoxLayout::Xyzwhdr)
            .winding(Winding::CounterClockwise)
            .mode(OverlapMode::IoU)
    }

    /// `xywhr` boxes. A `clockwise` rotation keeps the yaw as is (`x cos - y sin`), otherwise
    /// the yaw is negated.
    ///
    pub fn box_iou_rotated(mode: OverlapMode, aligned: bool, clockwise: bool) -> Self {
        Self::default()
            .layout(BoxLayout::Xywhr)
            .winding(if clockwise {
                Winding::CounterClockwise
            } else {
                Winding::Clockwise
            })
            .mode(mode)
            .aligned(aligned)
    }

    pub fn box_iou_quadri(mode: OverlapMode, aligned: bool) -> Self {
        Self::default()
            .layout(BoxLayout::Corners)
            .mode(mode)
            .aligned(aligned)
    }

    /// Convention of the rotated 3D detection NMS, corners within 1 cm of the other box
    /// count as inside
    ///
    pub fn nms3d() -> Self {
        Self::default()
            .layout(BoxLayout::Xyzwhdr)
            .winding(Winding::CounterClockwise)
            .mode(OverlapMode::IoU)
            .margin(NMS3D_MARGIN)
    }

    pub fn layout(mut self, layout: BoxLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn angle_unit(mut self, unit: AngleUnit) -> Self {
        self.angle_unit = unit;
        self
    }

    pub fn winding(mut self, winding: Winding) -> Self {
        self.winding = winding;
        self
    }

    pub fn mode(mut self, mode: OverlapMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn epsilon(mut self, epsilon: f64) -> Self {
        assert!(epsilon > 0.0, "Epsilon must be positive.");
        self.epsilon = epsilon;
        self
    }

    pub fn margin(mut self, margin: f64) -> Self {
        assert!(
            margin >= 0.0,
            "Containment margin must be greater than or equal to 0.0."
        );
        self.margin = margin;
        self
    }

    pub fn aligned(mut self, aligned: bool) -> Self {
        self.aligned = aligned;
        self
    }

    pub fn get_layout(&self) -> BoxLayout {
        self.layout
    }

    pub fn get_winding(&self) -> Winding {
        self.winding
    }

    pub fn get_margin(&self) -> f64 {
        self.margin
    }

    pub fn get_mode(&self) -> OverlapMode {
        self.mode
    }

    pub fn is_aligned(&self) -> bool {
        self.aligned
    }

    fn radians(&self, angle: f32) -> f64 {
        let angle = match self.angle_unit {
            AngleUnit::Radian => angle as f64,
            AngleUnit::Degree => (angle as f64).to_radians(),
        };
        match self.winding {
            Winding::Clockwise => -angle,
            Winding::CounterClockwise => angle,
        }
    }

    fn footprint(
        &self,
        row: ArrayView1<f32>,
        index: usize,
        argument: &'static str,
    ) -> Result<Footprint, Errors> {
        let extent = |value: f32| -> Result<f64, Errors> {
            if value.is_finite() && value >= 0.0 {
                Ok(value as f64)
            } else {
                debug!(
                    "Rejecting {} row {}: extent {} is not a finite non-negative value",
                    argument, index, value
                );
                Err(Errors::InvalidExtent {
                    argument,
                    row: index,
                    value,
                })
            }
        };
        let from_opposite =
            |x1: f32, y1: f32, x2: f32, y2: f32, angle: f32| -> Result<Footprint, Errors> {
                Ok(Footprint::from_box(OrientedBox::new(
                    (x1 as f64 + x2 as f64) / 2.0,
                    (y1 as f64 + y2 as f64) / 2.0,
                    extent((x2 - x1).abs())?,
                    extent((y2 - y1).abs())?,
                    self.radians(angle),
                )))
            };
        let from_center =
            |x: f32, y: f32, dx: f32, dy: f32, angle: f32| -> Result<Footprint, Errors> {
                Ok(Footprint::from_box(OrientedBox::new(
                    x as f64,
                    y as f64,
                    extent(dx)?,
                    extent(dy)?,
                    self.radians(angle),
                )))
            };

        match self.layout {
            BoxLayout::Corners => Ok(Footprint::from_corners([0, 1, 2, 3].map(|k| Coord {
                x: row[2 * k] as f64,
                y: row[2 * k + 1] as f64,
            }))),
            BoxLayout::Xyxyr => from_opposite(row[0], row[1], row[2], row[3], row[4]),
            BoxLayout::Xywhr => from_center(row[0], row[1], row[2], row[3], row[4]),
            BoxLayout::Xyzxyzr => from_opposite(row[0], row[1], row[3], row[4], row[6]),
            BoxLayout::Xyzwhdr => from_center(row[0], row[1], row[3], row[4], row[6]),
        }
    }

    /// Validates the tensor shape against the layout and converts every row into a footprint
    ///
    pub fn footprints(
        &self,
        boxes: ArrayView2<f32>,
        argument: &'static str,
    ) -> Result<Vec<Footprint>, Errors> {
        check_fields(boxes, self.layout, argument)?;
        boxes
            .axis_iter(Axis(0))
            .enumerate()
            .map(|(index, row)| self.footprint(row, index, argument))
            .collect()
    }

    /// Metric of a single pair of footprints
    ///
    pub fn pair_metric(&self, a: &Footprint, b: &Footprint) -> f64 {
        let intersection = if Footprint::too_far(a, b, self.margin) {
            0.0
        } else {
            intersection_area(a, b, self.epsilon, self.margin, &Atan2Sort)
        };
        compose(intersection, a.area(), b.area(), self.mode, self.epsilon)
    }
}

/// Turns the intersection area into the requested metric
///
pub fn compose(
    intersection: f64,
    area_a: f64,
    area_b: f64,
    mode: OverlapMode,
    epsilon: f64,
) -> f64 {
    match mode {
        OverlapMode::Overlap => intersection,
        OverlapMode::IoU => intersection / (area_a + area_b - intersection).max(epsilon),
        OverlapMode::IoF => intersection / area_a.max(epsilon),
    }
}

pub(crate) fn check_fields(
    boxes: ArrayView2<f32>,
    layout: BoxLayout,
    argument: &'static str,
) -> Result<(), Errors> {
    if boxes.ncols() != layout.fields() {
        debug!(
            "Rejecting {}: layout {} needs {} fields, got shape {:?}",
            argument,
            layout.name(),
            layout.fields(),
            boxes.shape()
        );
        return Err(Errors::ShapeMismatch {
            argument,
            expected: format!("[N, {}] ({} layout)", layout.fields(), layout.name()),
            actual: format!("{:?}", boxes.shape()),
        });
    }
    Ok(())
}

/// Overlap between two box tensors under the given convention
///
/// Returns a `[|A|, |B|]` matrix in the all-pairs mode and a `[|A|]` vector in the aligned
/// mode, where both tensors must have the same number of rows.
///
pub fn oriented_overlap(
    boxes_a: ArrayView2<f32>,
    boxes_b: ArrayView2<f32>,
    convention: &OverlapConvention,
) -> Result<ArrayD<f32>, Errors> {
    if convention.is_aligned() {
        Ok(aligned_overlap(boxes_a, boxes_b, convention)?.into_dyn())
    } else {
        Ok(pairwise_overlap(boxes_a, boxes_b, convention)?.into_dyn())
    }
}

/// All-pairs overlap matrix, rows are computed in parallel
///
pub fn pairwise_overlap(
    boxes_a: ArrayView2<f32>,
    boxes_b: ArrayView2<f32>,
    convention: &OverlapConvention,
) -> Result<Array2<f32>, Errors> {
    let footprints_a = convention.footprints(boxes_a, "boxes_a")?;
    let footprints_b = convention.footprints(boxes_b, "boxes_b")?;

    let mut result = Array2::<f32>::zeros((footprints_a.len(), footprints_b.len()));
    result
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(i, mut row)| {
            let a = &footprints_a[i];
            for (j, b) in footprints_b.iter().enumerate() {
                row[j] = convention.pair_metric(a, b) as f32;
            }
        });
    Ok(result)
}

/// Element-wise overlap of the rows with the same index
///
pub fn aligned_overlap(
    boxes_a: ArrayView2<f32>,
    boxes_b: ArrayView2<f32>,
    convention: &OverlapConvention,
) -> Result<Array1<f32>, Errors> {
    if boxes_a.nrows() != boxes_b.nrows() {
        debug!(
            "Rejecting aligned overlap of {:?} and {:?}",
            boxes_a.shape(),
            boxes_b.shape()
        );
        return Err(Errors::ShapeMismatch {
            argument: "boxes_b",
            expected: format!(
                "[{}, {}] (same rows as boxes_a in aligned mode)",
                boxes_a.nrows(),
                convention.get_layout().fields()
            ),
            actual: format!("{:?}", boxes_b.shape()),
        });
    }
    let footprints_a = convention.footprints(boxes_a, "boxes_a")?;
    let footprints_b = convention.footprints(boxes_b, "boxes_b")?;

    let values = footprints_a
        .par_iter()
        .zip(footprints_b.par_iter())
        .map(|(a, b)| convention.pair_metric(a, b) as f32)
        .collect::<Vec<_>>();
    Ok(Array1::from(values))
}

#[cfg(test)]
mod tests {
    use crate::examples::{pack_xywhr, pack_xyzwhdr, OrientedBoxGen};
    use crate::utils::bbox::OrientedBox;
    use crate::utils::overlap::{
        aligned_overlap, oriented_overlap, pairwise_overlap, AngleUnit, BoxLayout,
        OverlapConvention, OverlapMode, Winding, DEFAULT_OVERLAP_MARGIN, NMS3D_MARGIN,
    };
    use crate::{Errors, EPS};
    use ndarray::{arr2, Array2};

    fn iou() -> OverlapConvention {
        OverlapConvention::default()
    }

    #[test]
    fn self_iou() {
        let boxes = arr2(&[
            [0.0, 0.0, 2.0, 1.0, 0.0],
            [3.0, -1.0, 0.5, 4.0, 0.7],
            [10.0, 10.0, 1.0, 1.0, -2.9],
        ]);
        let res = aligned_overlap(boxes.view(), boxes.view(), &iou()).unwrap();
        for v in res.iter() {
            assert!((v - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn symmetric_and_bounded() {
        let boxes = pack_xywhr(&OrientedBoxGen::new(11, 4.0).take(40).collect::<Vec<_>>());
        let res = pairwise_overlap(boxes.view(), boxes.view(), &iou()).unwrap();
        for i in 0..res.nrows() {
            for j in 0..res.ncols() {
                assert!(res[[i, j]] >= 0.0 && res[[i, j]] <= 1.0 + EPS);
                assert!((res[[i, j]] - res[[j, i]]).abs() < EPS);
            }
        }
    }

    #[test]
    fn disjoint_boxes() {
        let boxes = arr2(&[[0.0, 0.0, 2.0, 2.0, 0.4], [2.9, 0.0, 2.0, 2.0, 1.1]]);
        let res = pairwise_overlap(
            boxes.view(),
            boxes.view(),
            &iou().mode(OverlapMode::Overlap),
        )
        .unwrap();
        assert_eq!(res[[0, 1]], 0.0);
        assert_eq!(res[[1, 0]], 0.0);
    }

    #[test]
    fn rotation_invariance() {
        let pivot = (0.7, -0.3);
        let l = OrientedBox::new(0.0, 0.0, 3.0, 1.5, 0.2);
        let r = OrientedBox::new(1.0, 0.5, 2.0, 2.0, -0.6);
        let base = pack_xywhr(&[l]);
        let other = pack_xywhr(&[r]);
        let expected = pairwise_overlap(base.view(), other.view(), &iou()).unwrap()[[0, 0]];
        assert!(expected > 0.0);

        let rotate = |b: &OrientedBox, angle: f64| {
            let (s, c) = angle.sin_cos();
            let dx = b.x() - pivot.0;
            let dy = b.y() - pivot.1;
            OrientedBox::new(
                pivot.0 + dx * c - dy * s,
                pivot.1 + dx * s + dy * c,
                b.width(),
                b.height(),
                b.yaw() + angle,
            )
        };
        for angle in [0.3, 1.2, 2.5, -1.9] {
            let a = pack_xywhr(&[rotate(&l, angle)]);
            let b = pack_xywhr(&[rotate(&r, angle)]);
            let value = pairwise_overlap(a.view(), b.view(), &iou()).unwrap()[[0, 0]];
            assert!((value - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn corner_on_edge_is_counted() {
        let boxes_a = arr2(&[[0.0, 0.0, 2.0, 2.0, 0.0]]);
        let boxes_b = arr2(&[[1.0, 1.0, 2.0, 2.0, 0.0]]);
        let conv = iou().mode(OverlapMode::Overlap);
        let res = pairwise_overlap(boxes_a.view(), boxes_b.view(), &conv).unwrap();
        assert!(res[[0, 0]] > 0.0);
        assert!((res[[0, 0]] - 1.0).abs() < EPS);
    }

    #[test]
    fn degrees_match_radians() {
        let radians = arr2(&[[0.0, 0.0, 2.0, 1.0, 0.5], [0.5, 0.2, 1.0, 3.0, -1.0]]);
        let mut degrees = radians.clone();
        degrees
            .column_mut(4)
            .mapv_inplace(|v| (v as f64).to_degrees() as f32);
        let r = pairwise_overlap(radians.view(), radians.view(), &iou()).unwrap();
        let d = pairwise_overlap(
            degrees.view(),
            degrees.view(),
            &iou().angle_unit(AngleUnit::Degree),
        )
        .unwrap();
        assert!((&r - &d).iter().all(|v| v.abs() < 1e-5));
    }

    #[test]
    fn clockwise_is_mirrored() {
        let boxes = pack_xywhr(&OrientedBoxGen::new(3, 2.0).take(10).collect::<Vec<_>>());
        let mut mirrored = boxes.clone();
        mirrored.column_mut(1).mapv_inplace(|v| -v);
        let ccw = pairwise_overlap(boxes.view(), boxes.view(), &iou()).unwrap();
        let cw = pairwise_overlap(
            mirrored.view(),
            mirrored.view(),
            &iou().winding(Winding::Clockwise),
        )
        .unwrap();
        assert!((&ccw - &cw).iter().all(|v| v.abs() < 1e-5));
    }

    #[test]
    fn opposite_corner_layouts() {
        let xywhr = arr2(&[[1.0, 2.0, 2.0, 4.0, 0.3], [1.5, 2.5, 3.0, 1.0, -0.2]]);
        let xyxyr = arr2(&[[2.0, 4.0, 0.0, 0.0, 0.3], [0.0, 2.0, 3.0, 3.0, -0.2]]);
        let a = pairwise_overlap(xywhr.view(), xywhr.view(), &iou()).unwrap();
        let b = pairwise_overlap(
            xyxyr.view(),
            xyxyr.view(),
            &iou().layout(BoxLayout::Xyxyr),
        )
        .unwrap();
        assert!((&a - &b).iter().all(|v| v.abs() < EPS));

        let xyzxyzr = arr2(&[
            [2.0, 4.0, -1.0, 0.0, 0.0, 1.0, 0.3],
            [0.0, 2.0, 0.0, 3.0, 3.0, 2.0, -0.2],
        ]);
        let c = pairwise_overlap(
            xyzxyzr.view(),
            xyzxyzr.view(),
            &iou().layout(BoxLayout::Xyzxyzr),
        )
        .unwrap();
        assert!((&a - &c).iter().all(|v| v.abs() < EPS));
    }

    #[test]
    fn iof_and_overlap() {
        let boxes_a = arr2(&[[0.0, 0.0, 2.0, 2.0, 0.0]]);
        let boxes_b = arr2(&[[1.0, 0.0, 2.0, 2.0, 0.0]]);
        let overlap = pairwise_overlap(
            boxes_a.view(),
            boxes_b.view(),
            &iou().mode(OverlapMode::Overlap),
        )
        .unwrap();
        let iou_value = pairwise_overlap(boxes_a.view(), boxes_b.view(), &iou()).unwrap();
        let iof = pairwise_overlap(
            boxes_a.view(),
            boxes_b.view(),
            &iou().mode(OverlapMode::IoF),
        )
        .unwrap();
        assert!((overlap[[0, 0]] - 2.0).abs() < EPS);
        assert!((iou_value[[0, 0]] - 2.0 / 6.0).abs() < EPS);
        assert!((iof[[0, 0]] - 0.5).abs() < EPS);
    }

    #[test]
    fn quadrilaterals() {
        let squares = arr2(&[
            [0.0, 0.0, 2.0, 0.0, 2.0, 2.0, 0.0, 2.0],
            [1.0, 1.0, 3.0, 1.0, 3.0, 3.0, 1.0, 3.0],
        ]);
        let conv = OverlapConvention::box_iou_quadri(OverlapMode::IoU, true);
        let res = oriented_overlap(squares.view(), squares.view(), &conv).unwrap();
        assert_eq!(res.shape(), &[2]);
        assert!(res.iter().all(|v| (v - 1.0).abs() < EPS));

        let conv = OverlapConvention::box_iou_quadri(OverlapMode::IoU, false);
        let res = oriented_overlap(squares.view(), squares.view(), &conv).unwrap();
        assert_eq!(res.shape(), &[2, 2]);
        assert!((res[[0, 1]] - 1.0 / 7.0).abs() < EPS);
    }

    #[test]
    fn shape_errors() {
        let five = Array2::<f32>::zeros((3, 5));
        let seven = Array2::<f32>::zeros((2, 7));
        assert!(matches!(
            oriented_overlap(five.view(), seven.view(), &iou()),
            Err(Errors::ShapeMismatch {
                argument: "boxes_b",
                ..
            })
        ));
        let other = Array2::<f32>::zeros((2, 5));
        assert!(matches!(
            oriented_overlap(five.view(), other.view(), &iou().aligned(true)),
            Err(Errors::ShapeMismatch { .. })
        ));
        let res = oriented_overlap(five.view(), other.view(), &iou()).unwrap();
        assert_eq!(res.shape(), &[3, 2]);
    }

    #[test]
    fn negative_extent() {
        let boxes = arr2(&[[0.0, 0.0, 1.0, 1.0, 0.0], [0.0, 0.0, -1.0, 1.0, 0.0]]);
        assert_eq!(
            pairwise_overlap(boxes.view(), boxes.view(), &iou()),
            Err(Errors::InvalidExtent {
                argument: "boxes_a",
                row: 1,
                value: -1.0
            })
        );
    }

    #[test]
    fn presets() {
        let bev = OverlapConvention::boxes_overlap_bev(5);
        assert_eq!(bev.get_layout(), BoxLayout::Xyxyr);
        assert_eq!(bev.get_mode(), OverlapMode::Overlap);
        assert_eq!(bev.get_winding(), Winding::Clockwise);
        let bev = OverlapConvention::boxes_overlap_bev(7);
        assert_eq!(bev.get_layout(), BoxLayout::Xyzwhdr);
        assert_eq!(bev.get_winding(), Winding::CounterClockwise);
        assert_eq!(OverlapConvention::boxes_iou_bev().get_mode(), OverlapMode::IoU);
        let rotated = OverlapConvention::box_iou_rotated(OverlapMode::IoF, true, false);
        assert!(rotated.is_aligned());
        assert_eq!(rotated.get_winding(), Winding::Clockwise);
        let rotated = OverlapConvention::box_iou_rotated(OverlapMode::IoU, false, true);
        assert_eq!(rotated.get_winding(), Winding::CounterClockwise);
        assert_eq!(OverlapConvention::nms3d().get_margin(), NMS3D_MARGIN);
    }

    #[test]
    fn bev_iou_agrees_with_nms_convention() {
        let a = arr2(&[[0.0, 0.0, 0.0, 4.0, 1.0, 1.0, 0.5]]);
        let b = arr2(&[[1.0, 1.0, 0.0, 4.0, 1.0, 1.0, 0.0]]);
        let nms = OverlapConvention::nms3d().margin(DEFAULT_OVERLAP_MARGIN);
        let bev = oriented_overlap(a.view(), b.view(), &OverlapConvention::boxes_iou_bev())
            .unwrap();
        let reference = oriented_overlap(a.view(), b.view(), &nms).unwrap();
        assert_eq!(bev, reference);

        let boxes = OrientedBoxGen::new(19, 1.5).take(30).collect::<Vec<_>>();
        let packed = pack_xyzwhdr(&boxes);
        let bev =
            oriented_overlap(packed.view(), packed.view(), &OverlapConvention::boxes_iou_bev())
                .unwrap();
        let reference = oriented_overlap(packed.view(), packed.view(), &nms).unwrap();
        assert_eq!(bev, reference);

        // the same rows read as `xywhr` by the rotated IoU with a clockwise rotation
        let xywhr = pack_xywhr(&boxes);
        let rotated = oriented_overlap(
            xywhr.view(),
            xywhr.view(),
            &OverlapConvention::box_iou_rotated(OverlapMode::IoU, false, true),
        )
        .unwrap();
        assert!((&bev - &rotated).iter().all(|v| v.abs() < EPS));
    }
}
