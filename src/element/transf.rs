use super::Act;
use super::Element;
use super::Ranked;
use crate::Arbitrary;
use crate::Error;
use crate::Point;
use crate::Result;
use itertools::Itertools;

/// a total function on {0, ..., n - 1}, stored as its image sequence:
/// position i holds the image of i.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transf {
    images: Vec<Point>,
}

impl Transf {
    pub fn new(images: Vec<Point>) -> Result<Self> {
        let bound = images.len();
        for &val in images.iter() {
            if val as usize >= bound {
                return Err(Error::ImageValue { found: val, bound });
            }
        }
        Ok(Self { images })
    }

    pub fn identity(n: usize) -> Self {
        Self {
            images: (0..n as Point).collect(),
        }
    }

    pub fn images(&self) -> &[Point] {
        &self.images
    }
}

impl Element for Transf {
    fn degree(&self) -> usize {
        self.images.len()
    }
    fn one(&self) -> Self {
        Self::identity(self.degree())
    }
    fn product(&mut self, x: &Self, y: &Self, _tid: usize) {
        debug_assert!(
            x.degree() == y.degree() && x.degree() == self.degree(),
            "product requires equal degrees: {} {} {}",
            self.degree(),
            x.degree(),
            y.degree()
        );
        for i in 0..self.images.len() {
            self.images[i] = y.images[x.images[i] as usize];
        }
    }
}

impl Ranked for Transf {
    fn rank(&self) -> usize {
        self.images.iter().unique().count()
    }
}

impl Act for Transf {
    fn act(&self, pt: Point) -> Point {
        self.images[pt as usize]
    }
}

/// shortlex on image sequences: degree first, then pointwise
impl Ord for Transf {
    fn cmp(&self, that: &Self) -> std::cmp::Ordering {
        self.degree()
            .cmp(&that.degree())
            .then_with(|| self.images.cmp(&that.images))
    }
}

impl PartialOrd for Transf {
    fn partial_cmp(&self, that: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(that))
    }
}

impl From<Vec<Point>> for Transf {
    fn from(images: Vec<Point>) -> Self {
        Self::new(images).expect("valid transformation")
    }
}

impl<const N: usize> From<[Point; N]> for Transf {
    fn from(images: [Point; N]) -> Self {
        Self::from(images.to_vec())
    }
}

impl std::fmt::Display for Transf {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Transf({:?})", self.images)
    }
}

impl Arbitrary for Transf {
    fn random() -> Self {
        use rand::Rng;
        const N: usize = 8;
        let mut rng = rand::thread_rng();
        Self {
            images: (0..N).map(|_| rng.gen_range(0..N as Point)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_left_to_right() {
        let x = Transf::from([1, 2, 0, 0]);
        let y = Transf::from([0, 0, 2, 3]);
        let xy = Transf::product_of(&x, &y);
        // (xy)(p) = y(x(p))
        assert!(xy == Transf::from([0, 2, 0, 0]));
    }

    #[test]
    fn identity_is_neutral() {
        for _ in 0..16 {
            let x = Transf::random();
            let e = x.one();
            assert!(Transf::product_of(&x, &e) == x);
            assert!(Transf::product_of(&e, &x) == x);
        }
    }

    #[test]
    fn rejects_out_of_bounds_image() {
        assert!(matches!(
            Transf::new(vec![0, 4, 1, 2]),
            Err(Error::ImageValue { found: 4, bound: 4 })
        ));
    }

    #[test]
    fn rank_counts_distinct_images() {
        assert!(Transf::from([0, 0, 0, 0]).rank() == 1);
        assert!(Transf::from([1, 2, 0, 0]).rank() == 3);
        assert!(Transf::identity(5).rank() == 5);
    }

    #[test]
    fn shortlex_order() {
        let small = Transf::from([2, 0, 1]);
        let large = Transf::from([0, 0, 0, 0]);
        assert!(small < large);
        assert!(Transf::from([0, 1, 2]) < Transf::from([0, 2, 1]));
    }

    #[test]
    fn equal_hash_equal() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hash;
        use std::hash::Hasher;
        let x = Transf::from([1, 2, 0, 0]);
        let y = Transf::from([1, 2, 0, 0]);
        let mut hx = DefaultHasher::new();
        let mut hy = DefaultHasher::new();
        x.hash(&mut hx);
        y.hash(&mut hy);
        assert!(x == y && hx.finish() == hy.finish());
    }
}
