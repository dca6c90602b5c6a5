use crate::utils::nms::{nms_by_metric, parallel_nms_by_metric, PARALLEL_NMS_MIN_BOXES};
use crate::utils::overlap::{check_fields, BoxLayout};
use crate::Errors;
use log::debug;
use ndarray::{ArrayView1, ArrayView2};

/// Boxes farther apart than 5 meters are never merged
pub const DEFAULT_MAX_MERGE_DISTANCE: f32 = 5.0;

/// 30 degrees
pub const DEFAULT_MAX_YAW_DIFFERENCE: f32 = 0.523598;

/// `tan(30°)`, half of the 120 degree forward field of view
pub const DEFAULT_FORWARD_FOV_TANGENT: f32 = (1.73205_f64 / 3.0) as f32;

/// Score of the pairs that cannot be merged, `-(10 m)^2`
pub const DEFAULT_VERY_FAR: f32 = -100.0;

pub const DEFAULT_SIGHT_EPSILON: f32 = 0.0001;

/// Tuning of the sight distance score
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SightDistanceOptions {
    max_merge_distance: f32,
    max_yaw_difference: f32,
    forward_fov_tangent: f32,
    very_far: f32,
    epsilon: f32,
}

impl Default for SightDistanceOptions {
    fn default() -> Self {
        Self {
            max_merge_distance: DEFAULT_MAX_MERGE_DISTANCE,
            max_yaw_difference: DEFAULT_MAX_YAW_DIFFERENCE,
            forward_fov_tangent: DEFAULT_FORWARD_FOV_TANGENT,
            very_far: DEFAULT_VERY_FAR,
            epsilon: DEFAULT_SIGHT_EPSILON,
        }
    }
}

impl SightDistanceOptions {
    pub fn max_merge_distance(mut self, distance: f32) -> Self {
        assert!(distance > 0.0, "Merge distance must be positive.");
        self.max_merge_distance = distance;
        self
    }

    pub fn max_yaw_difference(mut self, yaw: f32) -> Self {
        assert!(yaw > 0.0, "Yaw difference must be positive.");
        self.max_yaw_difference = yaw;
        self
    }

    pub fn forward_fov_tangent(mut self, tangent: f32) -> Self {
        assert!(tangent >= 0.0, "Field of view tangent must be non-negative.");
        self.forward_fov_tangent = tangent;
        self
    }

    pub fn very_far(mut self, score: f32) -> Self {
        self.very_far = score;
        self
    }

    pub fn epsilon(mut self, epsilon: f32) -> Self {
        assert!(epsilon > 0.0, "Epsilon must be positive.");
        self.epsilon = epsilon;
        self
    }

    /// The forward cone is already covered by the lidar, boxes inside it are never merged
    ///
    pub fn in_front(&self, p: &SightPoint) -> bool {
        p.x > p.y.abs() * self.forward_fov_tangent
    }
}

/// BEV center and yaw of a box in the ego frame
///
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SightPoint {
    pub x: f32,
    pub y: f32,
    pub yaw: f32,
}

impl SightPoint {
    pub fn new(x: f32, y: f32, yaw: f32) -> Self {
        Self { x, y, yaw }
    }

    /// Reads `[x, y, z, dx, dy, dz, yaw]`
    ///
    pub fn from_row(row: ArrayView1<f32>) -> Self {
        Self::new(row[0], row[1], row[6])
    }
}

/// Closeness of two boxes as seen from the ego origin
///
/// The score is the negated squared cross product of the centers scaled by the larger
/// squared range, which is the squared lateral offset between the two sight lines. It is
/// `very_far` unless the centers lie in the same half plane, neither is in the forward
/// cone, the centers are closer than `max_merge_distance` and the yaws differ by less than
/// `max_yaw_difference`. All arithmetic is `f32`.
///
pub fn sight_distance(a: &SightPoint, b: &SightPoint, options: &SightDistanceOptions) -> f32 {
    if options.in_front(a) {
        return options.very_far;
    }
    if !(a.x * b.x + a.y * b.y > 0.0) {
        return options.very_far;
    }
    if options.in_front(b) {
        return options.very_far;
    }

    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let max_distance = options.max_merge_distance * options.max_merge_distance;
    if !(dx * dx + dy * dy < max_distance) {
        return options.very_far;
    }
    if !((a.yaw - b.yaw).abs() < options.max_yaw_difference) {
        return options.very_far;
    }

    let up = a.x * b.y - a.y * b.x;
    let down = (a.x * a.x + a.y * a.y).max(b.x * b.x + b.y * b.y) + options.epsilon;
    -(up * up) / down
}

/// Ego-frame NMS of `[x, y, z, dx, dy, dz, yaw]` boxes with the default tuning
///
/// A box is suppressed when its sight distance score with a kept box is greater than
/// `-distance_threshold^2`.
///
pub fn nms_by_sight_distance(
    boxes: ArrayView2<f32>,
    scores: ArrayView1<f32>,
    distance_threshold: f32,
) -> Result<Vec<usize>, Errors> {
    nms_by_sight_distance_with(
        boxes,
        scores,
        distance_threshold,
        &SightDistanceOptions::default(),
    )
}

pub fn nms_by_sight_distance_with(
    boxes: ArrayView2<f32>,
    scores: ArrayView1<f32>,
    distance_threshold: f32,
    options: &SightDistanceOptions,
) -> Result<Vec<usize>, Errors> {
    check_fields(boxes, BoxLayout::Xyzwhdr, "boxes")?;
    let points = boxes
        .rows()
        .into_iter()
        .map(SightPoint::from_row)
        .collect::<Vec<_>>();
    let threshold = -(distance_threshold * distance_threshold);
    let metric = |l: &SightPoint, r: &SightPoint| sight_distance(l, r, options);

    let keep = if points.len() >= PARALLEL_NMS_MIN_BOXES {
        parallel_nms_by_metric(&points, scores, threshold, metric)?
    } else {
        nms_by_metric(&points, scores, threshold, metric)?
    };
    debug!(
        "Sight NMS kept {} of {} boxes, score threshold {}",
        keep.len(),
        points.len(),
        threshold
    );
    Ok(keep)
}
