use crate::utils::bbox::OrientedBox;
use ndarray::Array2;
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random walk of oriented boxes
///
/// Every step shifts the center, changes the extents and turns the box a little. The
/// generator is seeded, so a given seed always yields the same sequence.
///
pub struct OrientedBoxGen {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    yaw: f64,
    gen: StdRng,
    dist_pos: Uniform<f64>,
    dist_box: Uniform<f64>,
    dist_yaw: Uniform<f64>,
}

impl OrientedBoxGen {
    /// A 2x1 box starting at the origin drifting by up to `pos_drift` per step
    ///
    pub fn new(seed: u64, pos_drift: f64) -> Self {
        Self::new_at(seed, 0.0, 0.0, 2.0, 1.0, pos_drift, 0.2, 0.3)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new_at(
        seed: u64,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        pos_drift: f64,
        box_drift: f64,
        yaw_drift: f64,
    ) -> Self {
        Self {
            x,
            y,
            width,
            height,
            yaw: 0.0,
            gen: StdRng::seed_from_u64(seed),
            dist_pos: Uniform::new_inclusive(-pos_drift, pos_drift),
            dist_box: Uniform::new_inclusive(-box_drift, box_drift),
            dist_yaw: Uniform::new_inclusive(-yaw_drift, yaw_drift),
        }
    }
}

impl Iterator for OrientedBoxGen {
    type Item = OrientedBox;

    fn next(&mut self) -> Option<Self::Item> {
        self.x += self.gen.sample(self.dist_pos);
        self.y += self.gen.sample(self.dist_pos);

        self.width = (self.width + self.gen.sample(self.dist_box)).max(0.5);
        self.height = (self.height + self.gen.sample(self.dist_box)).max(0.5);
        self.yaw += self.gen.sample(self.dist_yaw);

        Some(OrientedBox::new(
            self.x, self.y, self.width, self.height, self.yaw,
        ))
    }
}

/// Detector-like output: every object is reported `duplicates` times with jittered
/// geometry and decreasing scores
///
/// Objects are spread over a square of side `area` centered at `(center_x, center_y)`.
/// Returns the boxes and their scores.
///
pub fn clustered_detections(
    seed: u64,
    objects: usize,
    duplicates: usize,
    area: f64,
    center: (f64, f64),
) -> (Vec<OrientedBox>, Vec<f32>) {
    let mut gen = StdRng::seed_from_u64(seed);
    let half = area / 2.0;
    let mut boxes = Vec::with_capacity(objects * duplicates);
    let mut scores = Vec::with_capacity(objects * duplicates);

    for _ in 0..objects {
        let x = center.0 + gen.gen_range(-half..=half);
        let y = center.1 + gen.gen_range(-half..=half);
        let width = gen.gen_range(1.5..=5.0);
        let height = gen.gen_range(1.0..=2.5);
        let yaw = gen.gen_range(-std::f64::consts::PI..std::f64::consts::PI);
        let confidence = gen.gen_range(0.5..=1.0_f32);

        for _ in 0..duplicates {
            boxes.push(OrientedBox::new(
                x + gen.gen_range(-0.3..=0.3),
                y + gen.gen_range(-0.3..=0.3),
                width * gen.gen_range(0.9..=1.1),
                height * gen.gen_range(0.9..=1.1),
                yaw + gen.gen_range(-0.1..=0.1),
            ));
            scores.push(confidence * gen.gen_range(0.5..=1.0_f32));
        }
    }
    (boxes, scores)
}

/// Packs boxes into `[N, 7]` rows of `[x, y, z, dx, dy, dz, yaw]`
///
pub fn pack_xyzwhdr(boxes: &[OrientedBox]) -> Array2<f32> {
    let mut packed = Array2::<f32>::zeros((boxes.len(), 7));
    for (mut row, b) in packed.rows_mut().into_iter().zip(boxes) {
        for (dst, src) in row.iter_mut().zip(b.to_xyzwhdr()) {
            *dst = src;
        }
    }
    packed
}

/// Packs boxes into `[N, 5]` rows of `[x, y, w, h, yaw]`
///
pub fn pack_xywhr(boxes: &[OrientedBox]) -> Array2<f32> {
    let mut packed = Array2::<f32>::zeros((boxes.len(), 5));
    for (mut row, b) in packed.rows_mut().into_iter().zip(boxes) {
        for (dst, src) in row.iter_mut().zip(b.to_xywhr()) {
            *dst = src;
        }
    }
    packed
}
