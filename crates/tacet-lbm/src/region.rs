//! Axis-aligned boxes of lattice sites.

use crate::error::{LbmError, Result};

/// Inclusive box `[min, max]` of lattice coordinates.
///
/// 2D boxes have `min[2] == max[2] == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub min: [usize; 3],
    pub max: [usize; 3],
}

impl Region {
    /// Box from inclusive corners.
    pub const fn new(min: [usize; 3], max: [usize; 3]) -> Self {
        Self { min, max }
    }

    /// 2D box `x0..=x1, y0..=y1`.
    pub const fn new_2d(x0: usize, x1: usize, y0: usize, y1: usize) -> Self {
        Self {
            min: [x0, y0, 0],
            max: [x1, y1, 0],
        }
    }

    /// 3D box `x0..=x1, y0..=y1, z0..=z1`.
    pub const fn new_3d(x0: usize, x1: usize, y0: usize, y1: usize, z0: usize, z1: usize) -> Self {
        Self {
            min: [x0, y0, z0],
            max: [x1, y1, z1],
        }
    }

    /// Box holding a single site.
    pub const fn point(pos: [usize; 3]) -> Self {
        Self { min: pos, max: pos }
    }

    /// Box covering a whole lattice of the given shape.
    pub fn from_shape(shape: [usize; 3]) -> Self {
        Self {
            min: [0; 3],
            max: [
                shape[0].saturating_sub(1),
                shape[1].saturating_sub(1),
                shape[2].saturating_sub(1),
            ],
        }
    }

    /// Number of sites along `axis`.
    pub fn extent(&self, axis: usize) -> usize {
        self.max[axis] + 1 - self.min[axis]
    }

    /// Number of sites in the box.
    pub fn volume(&self) -> usize {
        (0..3).map(|a| self.extent(a)).product()
    }

    /// True if `min <= max` on every axis.
    pub fn is_ordered(&self) -> bool {
        (0..3).all(|a| self.min[a] <= self.max[a])
    }

    pub fn contains(&self, pos: [usize; 3]) -> bool {
        (0..3).all(|a| self.min[a] <= pos[a] && pos[a] <= self.max[a])
    }

    /// Overlap of two boxes, if any.
    pub fn intersection(&self, other: &Region) -> Option<Region> {
        let mut out = *self;
        for a in 0..3 {
            out.min[a] = self.min[a].max(other.min[a]);
            out.max[a] = self.max[a].min(other.max[a]);
            if out.min[a] > out.max[a] {
                return None;
            }
        }
        Some(out)
    }

    /// Check that the box is ordered and lies inside `domain`.
    pub fn checked_within(&self, domain: &Region) -> Result<Region> {
        if !self.is_ordered() {
            return Err(LbmError::InvertedRegion(*self));
        }
        if !(domain.contains(self.min) && domain.contains(self.max)) {
            return Err(LbmError::RegionOutOfBounds {
                region: *self,
                domain: *domain,
            });
        }
        Ok(*self)
    }

    /// Chebyshev distance from `pos` to the nearest face of the box,
    /// 0 for sites on the boundary. Only the first `dim` axes count.
    pub fn distance_to_boundary(&self, pos: [usize; 3], dim: usize) -> usize {
        (0..dim)
            .map(|a| (pos[a] - self.min[a]).min(self.max[a] - pos[a]))
            .min()
            .unwrap_or(0)
    }

    /// Iterate over all sites, x fastest.
    pub fn iter(&self) -> impl Iterator<Item = [usize; 3]> {
        let (min, max) = (self.min, self.max);
        (min[2]..=max[2])
            .flat_map(move |z| (min[1]..=max[1]).map(move |y| (y, z)))
            .flat_map(move |(y, z)| (min[0]..=max[0]).map(move |x| [x, y, z]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_and_iteration() {
        let r = Region::new_2d(2, 4, 1, 2);
        assert_eq!(r.volume(), 6);
        let sites: Vec<_> = r.iter().collect();
        assert_eq!(sites.len(), 6);
        assert_eq!(sites[0], [2, 1, 0]);
        assert_eq!(sites[1], [3, 1, 0]);
        assert_eq!(sites[5], [4, 2, 0]);
    }

    #[test]
    fn test_intersection() {
        let a = Region::new_3d(0, 9, 0, 9, 0, 9);
        let b = Region::new_3d(5, 20, 3, 4, 8, 12);
        assert_eq!(a.intersection(&b), Some(Region::new_3d(5, 9, 3, 4, 8, 9)));
        let c = Region::new_3d(10, 12, 0, 1, 0, 1);
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn test_checked_within() {
        let domain = Region::from_shape([10, 8, 1]);
        assert!(Region::new_2d(0, 9, 0, 7).checked_within(&domain).is_ok());
        assert!(matches!(
            Region::new_2d(0, 10, 0, 7).checked_within(&domain),
            Err(LbmError::RegionOutOfBounds { .. })
        ));
        assert!(matches!(
            Region::new_2d(5, 4, 0, 7).checked_within(&domain),
            Err(LbmError::InvertedRegion(_))
        ));
    }

    #[test]
    fn test_distance_to_boundary() {
        let domain = Region::from_shape([10, 6, 1]);
        assert_eq!(domain.distance_to_boundary([0, 3, 0], 2), 0);
        assert_eq!(domain.distance_to_boundary([4, 2, 0], 2), 2);
        assert_eq!(domain.distance_to_boundary([8, 3, 0], 2), 1);
    }

    #[test]
    fn test_inverted_region_is_empty() {
        let r = Region::new_2d(3, 1, 0, 0);
        assert_eq!(r.iter().count(), 0);
    }
}
