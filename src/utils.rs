/// Oriented boxes and their BEV footprints
pub mod bbox;

/// Clipping primitives: edge intersections, containment and the candidate vertex buffer
pub mod clipping;

/// Overlap, IoU and IoF between packed box tensors
pub mod overlap;

/// Rotated IoU with gradients w.r.t. both box tensors
pub mod diff_iou;

/// Non maximum suppression implementations for detected boxes
pub mod nms;
