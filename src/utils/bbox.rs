use crate::utils::clipping::area::polygon_area;
use crate::utils::clipping::{point_in_box, point_in_quad};
use geo::{Coord, LineString, Polygon};

/// Half-extent multipliers of the four corners. The winding is counter-clockwise
/// for a positive yaw convention, starting from the (+width, +height) quadrant.
///
pub const CORNER_SIGNS: [(f64, f64); 4] = [(0.5, 0.5), (-0.5, 0.5), (-0.5, -0.5), (0.5, -0.5)];

/// Oriented box in the format (x, y, width, height, yaw)
///
/// The yaw is measured in radians and rotates the box counter-clockwise about its center.
/// Zero extents are legal: such a box collapses into a segment or a point and has no
/// overlap with anything.
///
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct OrientedBox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    yaw: f64,
}

impl OrientedBox {
    /// Constructor
    ///
    pub fn new(x: f64, y: f64, width: f64, height: f64, yaw: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            yaw,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn yaw(&self) -> f64 {
        self.yaw
    }

    pub fn center(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }

    /// Area does not depend on the rotation
    ///
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Radius of the circumscribed circle
    ///
    pub fn get_radius(&self) -> f64 {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        (hw * hw + hh * hh).sqrt()
    }

    /// Sets the yaw
    ///
    pub fn rotate(self, yaw: f64) -> Self {
        Self { yaw, ..self }
    }

    /// Four corners in the fixed winding of [`CORNER_SIGNS`]; edge `i` connects corner `i`
    /// with corner `(i + 1) % 4`.
    ///
    pub fn corners(&self) -> [Coord<f64>; 4] {
        expand_corners(self.center(), self.width, self.height, self.yaw)
    }

    /// Expresses a point in the box frame: the box center becomes the origin and the box
    /// axes become the coordinate axes.
    ///
    pub fn to_local(&self, p: Coord<f64>) -> Coord<f64> {
        let (s, c) = self.yaw.sin_cos();
        let dx = p.x - self.x;
        let dy = p.y - self.y;
        Coord {
            x: dx * c + dy * s,
            y: -dx * s + dy * c,
        }
    }

    /// Packs the box into `[x, y, z, dx, dy, dz, yaw]` placing it at the ground level with
    /// the unit height.
    ///
    pub fn to_xyzwhdr(&self) -> [f32; 7] {
        [
            self.x as f32,
            self.y as f32,
            0.0,
            self.width as f32,
            self.height as f32,
            1.0,
            self.yaw as f32,
        ]
    }

    /// Packs the box into `[x, y, width, height, yaw]`
    ///
    pub fn to_xywhr(&self) -> [f32; 5] {
        [
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
            self.yaw as f32,
        ]
    }
}

/// Rotates the half extents by `yaw` and shifts them to `center`
///
pub fn expand_corners(center: Coord<f64>, width: f64, height: f64, yaw: f64) -> [Coord<f64>; 4] {
    let (s, c) = yaw.sin_cos();
    CORNER_SIGNS.map(|(sx, sy)| {
        let lx = sx * width;
        let ly = sy * height;
        Coord {
            x: center.x + lx * c - ly * s,
            y: center.y + lx * s + ly * c,
        }
    })
}

impl From<&OrientedBox> for Polygon<f64> {
    fn from(b: &OrientedBox) -> Self {
        Polygon::new(LineString::from(b.corners().to_vec()), vec![])
    }
}

/// Bird's-eye-view footprint of a box
///
/// Footprints built from packed center/size layouts keep their oriented frame and answer
/// containment queries in that frame with a margin. Footprints built from raw corner arrays
/// have no frame and use the crossing-number test.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Footprint {
    corners: [Coord<f64>; 4],
    area: f64,
    center: Coord<f64>,
    radius: f64,
    frame: Option<OrientedBox>,
}

impl Footprint {
    pub fn from_box(b: OrientedBox) -> Self {
        Self {
            corners: b.corners(),
            area: b.area(),
            center: b.center(),
            radius: b.get_radius(),
            frame: Some(b),
        }
    }

    pub fn from_corners(corners: [Coord<f64>; 4]) -> Self {
        let center = Coord {
            x: corners.iter().map(|c| c.x).sum::<f64>() / 4.0,
            y: corners.iter().map(|c| c.y).sum::<f64>() / 4.0,
        };
        let radius = corners
            .iter()
            .map(|c| ((c.x - center.x).powi(2) + (c.y - center.y).powi(2)).sqrt())
            .fold(0.0_f64, f64::max);
        Self {
            corners,
            area: polygon_area(&corners),
            center,
            radius,
            frame: None,
        }
    }

    pub fn corners(&self) -> &[Coord<f64>; 4] {
        &self.corners
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn frame(&self) -> Option<&OrientedBox> {
        self.frame.as_ref()
    }

    pub fn contains(&self, p: Coord<f64>, margin: f64) -> bool {
        match &self.frame {
            Some(b) => point_in_box(p, b, margin),
            None => point_in_quad(p, &self.corners),
        }
    }

    /// Footprints whose circumscribed circles (grown by the containment margin) do not touch
    /// cannot produce a single intersection vertex.
    ///
    pub fn too_far(l: &Footprint, r: &Footprint, margin: f64) -> bool {
        let max_distance = l.radius + r.radius + 2.0 * margin.abs();
        let x = l.center.x - r.center.x;
        let y = l.center.y - r.center.y;
        x * x + y * y > max_distance * max_distance
    }
}

impl From<OrientedBox> for Footprint {
    fn from(b: OrientedBox) -> Self {
        Footprint::from_box(b)
    }
}
