use super::Act;
use super::Element;
use super::Inverse;
use super::Ranked;
use crate::Arbitrary;
use crate::Error;
use crate::Point;
use crate::Result;

/// a bijection on {0, ..., n - 1} stored as its image sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Perm {
    images: Vec<Point>,
}

impl Perm {
    pub fn new(images: Vec<Point>) -> Result<Self> {
        let bound = images.len();
        let mut present = vec![false; bound];
        for &val in images.iter() {
            if val as usize >= bound {
                return Err(Error::ImageValue { found: val, bound });
            }
            if present[val as usize] {
                return Err(Error::DuplicateImage(val));
            }
            present[val as usize] = true;
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

impl Element for Perm {
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

impl Inverse for Perm {
    fn inverse(&self) -> Self {
        let mut images = vec![0; self.images.len()];
        for (i, &img) in self.images.iter().enumerate() {
            images[img as usize] = i as Point;
        }
        Self { images }
    }
}

impl Ranked for Perm {
    fn rank(&self) -> usize {
        self.degree()
    }
}

impl Act for Perm {
    fn act(&self, pt: Point) -> Point {
        self.images[pt as usize]
    }
}

impl Ord for Perm {
    fn cmp(&self, that: &Self) -> std::cmp::Ordering {
        self.degree()
            .cmp(&that.degree())
            .then_with(|| self.images.cmp(&that.images))
    }
}

impl PartialOrd for Perm {
    fn partial_cmp(&self, that: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(that))
    }
}

impl From<Vec<Point>> for Perm {
    fn from(images: Vec<Point>) -> Self {
        Self::new(images).expect("valid permutation")
    }
}

impl<const N: usize> From<[Point; N]> for Perm {
    fn from(images: [Point; N]) -> Self {
        Self::from(images.to_vec())
    }
}

impl std::fmt::Display for Perm {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Perm({:?})", self.images)
    }
}

impl Arbitrary for Perm {
    fn random() -> Self {
        use rand::seq::SliceRandom;
        const N: usize = 8;
        let mut images = (0..N as Point).collect::<Vec<_>>();
        images.shuffle(&mut rand::thread_rng());
        Self { images }
    }
}
