use anyhow::Result;
use bevbox::examples::{clustered_detections, pack_xyzwhdr};
use bevbox::prelude::*;
use ndarray::Array1;

fn main() -> Result<()> {
    env_logger::init();

    let duplicates = 4;
    let (boxes, scores) = clustered_detections(7, 10, duplicates, 40.0, (-25.0, 0.0));
    let packed = pack_xyzwhdr(&boxes);
    let scores = Array1::from(scores);

    let keep = nms_by_overlap(packed.view(), scores.view(), 0.3)?;
    eprintln!(
        "Rotated NMS kept {} of {} detections: {:?}",
        keep.len(),
        boxes.len(),
        keep
    );

    let keep = nms_axis_aligned(packed.view(), scores.view(), 0.3)?;
    eprintln!("Axis-aligned NMS kept {}: {:?}", keep.len(), keep);

    let keep = nms_by_sight_distance(packed.view(), scores.view(), 1.0)?;
    eprintln!("Sight NMS kept {}: {:?}", keep.len(), keep);

    for (i, b) in keep.iter().map(|&i| (i, &boxes[i])) {
        eprintln!(
            "#{:3} score {:.3} at ({:7.2}, {:7.2}) yaw {:5.2}",
            i,
            scores[i],
            b.x(),
            b.y(),
            b.yaw()
        );
    }
    Ok(())
}
