use crate::utils;

pub use utils::bbox::{Footprint, OrientedBox};
pub use utils::clipping::ordering::{AngleSort, Atan2Sort, PseudoAngleSort};
pub use utils::diff_iou::{differentiable_iou, DiffIouOutput, DiffIouRotated};
pub use utils::nms::sight::{
    nms_by_sight_distance, nms_by_sight_distance_with, sight_distance, SightDistanceOptions,
    SightPoint,
};
pub use utils::nms::{nms_axis_aligned, nms_by_overlap, nms_with_convention};
pub use utils::overlap::{
    oriented_overlap, AngleUnit, BoxLayout, OverlapConvention, OverlapMode, Winding,
};

pub use crate::Errors;
