use anyhow::Result;
use bevbox::examples::{pack_xywhr, OrientedBoxGen};
use bevbox::prelude::*;
use ndarray::{arr2, s};

fn main() -> Result<()> {
    env_logger::init();

    let boxes = pack_xywhr(&OrientedBoxGen::new(42, 1.0).take(5).collect::<Vec<_>>());
    eprintln!("Boxes [x, y, w, h, yaw]:\n{:.3}", boxes);

    let iou = oriented_overlap(boxes.view(), boxes.view(), &OverlapConvention::default())?;
    eprintln!("IoU:\n{:.3}", iou);

    let iof = oriented_overlap(
        boxes.view(),
        boxes.view(),
        &OverlapConvention::default().mode(OverlapMode::IoF),
    )?;
    eprintln!("IoF:\n{:.3}", iof);

    let degrees = arr2(&[[0.0, 0.0, 4.0, 2.0, 45.0], [1.0, 0.0, 4.0, 2.0, -45.0]]);
    let convention = OverlapConvention::box_iou_rotated(OverlapMode::IoU, true, false)
        .angle_unit(AngleUnit::Degree);
    let swapped = degrees.slice(s![..;-1, ..]);
    let aligned = oriented_overlap(degrees.view(), swapped, &convention)?;
    eprintln!("Aligned IoU of crossed boxes: {:.3}", aligned);

    let reversed = boxes.slice(s![..;-1, ..]);
    let diff = DiffIouRotated::default().forward(boxes.view(), reversed)?;
    eprintln!("Differentiable IoU: {:.3}", diff.iou);
    eprintln!("d IoU / d boxes_a:\n{:.3}", diff.grad_a);

    let truncated = degrees.slice(s![.., ..4]);
    match oriented_overlap(boxes.view(), truncated, &convention) {
        Ok(_) => eprintln!("Unexpected success"),
        Err(e) => eprintln!("Rejected: {}", e),
    }
    Ok(())
}
