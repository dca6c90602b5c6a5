use crate::utils::clipping::CandidateVertices;
use geo::Coord;
use itertools::Itertools;

/// Orders points by their polar angle around the origin
///
/// Implementations receive the candidate points already translated so that the centroid of
/// the valid ones is the origin, and return the indices of the valid points only, sorted
/// by ascending angle. Equal angles must keep the ascending index order so that the same
/// input always yields the same polygon. The returned indices are treated as constants by
/// the gradient computation.
///
pub trait AngleSort: Sync {
    fn sort_by_angle(&self, points: &[Coord<f64>], mask: &[bool]) -> Vec<usize>;
}

/// Reference ordering by `atan2`
///
#[derive(Clone, Copy, Debug, Default)]
pub struct Atan2Sort;

/// Ordering by a pseudo-angle that is monotone in `atan2` on `(-pi, pi]` but avoids the
/// trigonometry
///
#[derive(Clone, Copy, Debug, Default)]
pub struct PseudoAngleSort;

fn sort_valid_by_key<F>(points: &[Coord<f64>], mask: &[bool], key: F) -> Vec<usize>
where
    F: Fn(&Coord<f64>) -> f64,
{
    points
        .iter()
        .zip(mask.iter())
        .enumerate()
        .filter(|(_, (_, valid))| **valid)
        .map(|(index, (p, _))| (key(p), index))
        .sorted_by(|(l_angle, l_index), (r_angle, r_index)| {
            l_angle.total_cmp(r_angle).then(l_index.cmp(r_index))
        })
        .map(|(_, index)| index)
        .collect()
}

impl AngleSort for Atan2Sort {
    fn sort_by_angle(&self, points: &[Coord<f64>], mask: &[bool]) -> Vec<usize> {
        sort_valid_by_key(points, mask, |p| p.y.atan2(p.x))
    }
}

pub fn pseudo_angle(p: &Coord<f64>) -> f64 {
    let norm = p.x.abs() + p.y.abs();
    if norm == 0.0 {
        return 0.0;
    }
    (1.0 - p.x / norm).copysign(p.y)
}

impl AngleSort for PseudoAngleSort {
    fn sort_by_angle(&self, points: &[Coord<f64>], mask: &[bool]) -> Vec<usize> {
        sort_valid_by_key(points, mask, pseudo_angle)
    }
}

/// Mean of the valid points, `None` when nothing is valid
///
pub fn centroid(points: &[Coord<f64>], mask: &[bool]) -> Option<Coord<f64>> {
    let (sum, count) = points
        .iter()
        .zip(mask.iter())
        .filter(|(_, valid)| **valid)
        .fold((Coord { x: 0.0, y: 0.0 }, 0usize), |(sum, count), (p, _)| {
            (sum + *p, count + 1)
        });
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Indices of the valid candidates forming a simple polygon, ordered by angle around their
/// centroid
///
pub fn order_vertices<S: AngleSort + ?Sized>(
    candidates: &CandidateVertices,
    sorter: &S,
) -> Vec<usize> {
    let Some(center) = centroid(candidates.vertices(), candidates.mask()) else {
        return Vec::new();
    };
    let normalized = candidates.vertices().map(|v| v - center);
    sorter.sort_by_angle(&normalized, candidates.mask())
}

#[cfg(test)]
mod tests {
    use crate::utils::bbox::{Footprint, OrientedBox};
    use crate::utils::clipping::intersection_area;
    use crate::utils::clipping::ordering::{
        centroid, pseudo_angle, AngleSort, Atan2Sort, PseudoAngleSort,
    };
    use geo::Coord;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    #[test]
    fn sorts_valid_points_only() {
        let points = [c(0.0, -1.0), c(5.0, 5.0), c(-1.0, 0.0), c(0.0, 1.0), c(1.0, 0.0)];
        let mask = [true, false, true, true, true];
        assert_eq!(Atan2Sort.sort_by_angle(&points, &mask), vec![0, 4, 3, 2]);
        assert_eq!(PseudoAngleSort.sort_by_angle(&points, &mask), vec![0, 4, 3, 2]);
    }

    #[test]
    fn equal_angles_keep_index_order() {
        let points = [c(2.0, 2.0), c(0.0, -1.0), c(1.0, 1.0), c(2.0, 2.0)];
        let mask = [true; 4];
        let first = Atan2Sort.sort_by_angle(&points, &mask);
        assert_eq!(first, vec![1, 0, 2, 3]);
        for _ in 0..10 {
            assert_eq!(Atan2Sort.sort_by_angle(&points, &mask), first);
        }
    }

    #[test]
    fn pseudo_angle_is_monotone() {
        let mut previous = f64::NEG_INFINITY;
        for step in 1..360 {
            let angle = -std::f64::consts::PI + step as f64 * std::f64::consts::PI / 180.0;
            let value = pseudo_angle(&c(angle.cos(), angle.sin()));
            assert!(value > previous);
            previous = value;
        }
        assert_eq!(pseudo_angle(&c(0.0, 0.0)), 0.0);
    }

    #[test]
    fn centroid_of_valid_points() {
        let points = [c(0.0, 0.0), c(100.0, 100.0), c(2.0, 0.0), c(2.0, 2.0), c(0.0, 2.0)];
        let mask = [true, false, true, true, true];
        assert_eq!(centroid(&points, &mask), Some(c(1.0, 1.0)));
        assert_eq!(centroid(&points, &[false; 5]), None);
    }

    #[test]
    fn sorters_give_equal_areas() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let l = OrientedBox::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(0.5..3.0),
                rng.gen_range(0.5..3.0),
                rng.gen_range(-3.14..3.14),
            );
            let r = OrientedBox::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(0.5..3.0),
                rng.gen_range(0.5..3.0),
                rng.gen_range(-3.14..3.14),
            );
            let (l, r) = (Footprint::from_box(l), Footprint::from_box(r));
            let reference = intersection_area(&l, &r, 1e-8, 1e-5, &Atan2Sort);
            let pseudo = intersection_area(&l, &r, 1e-8, 1e-5, &PseudoAngleSort);
            assert!((reference - pseudo).abs() < 1e-9);
        }
    }
}
