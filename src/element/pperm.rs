use super::Act;
use super::Element;
use super::Inverse;
use super::Ranked;
use crate::Arbitrary;
use crate::Error;
use crate::Point;
use crate::Result;
use crate::UNDEFINED;

/// an injective partial function on {0, ..., n - 1}. positions outside
/// the domain hold UNDEFINED.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PPerm {
    images: Vec<Point>,
}

impl PPerm {
    pub fn new(images: Vec<Point>) -> Result<Self> {
        let bound = images.len();
        let mut present = vec![false; bound];
        for &val in images.iter() {
            if val == UNDEFINED {
                continue;
            }
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

    /// the partial permutation of degree `deg` sending dom[i] to ran[i]
    /// and undefined elsewhere
    pub fn from_dom_ran(dom: &[Point], ran: &[Point], deg: usize) -> Result<Self> {
        if dom.len() != ran.len() {
            return Err(Error::DomainMismatch {
                dom: dom.len(),
                ran: ran.len(),
            });
        }
        if let Some(&found) = dom.iter().find(|&&p| p as usize >= deg) {
            return Err(Error::ImageValue { found, bound: deg });
        }
        let mut images = vec![UNDEFINED; deg];
        for (&d, &r) in dom.iter().zip(ran.iter()) {
            images[d as usize] = r;
        }
        Self::new(images)
    }

    pub fn identity(n: usize) -> Self {
        Self {
            images: (0..n as Point).collect(),
        }
    }

    pub fn images(&self) -> &[Point] {
        &self.images
    }

    /// degree ignoring the trailing undefined tail, the quantity the
    /// ordering compares first
    fn trimmed_degree(&self) -> usize {
        let tail = self.images.iter().rev().take_while(|&&v| v == UNDEFINED);
        self.images.len() - tail.count()
    }
}

impl Element for PPerm {
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
            self.images[i] = match x.images[i] {
                UNDEFINED => UNDEFINED,
                p => y.images[p as usize],
            };
        }
    }
}

impl Inverse for PPerm {
    /// the inverse partial permutation; its domain is the image of self
    fn inverse(&self) -> Self {
        let mut images = vec![UNDEFINED; self.images.len()];
        for (i, &img) in self.images.iter().enumerate() {
            if img != UNDEFINED {
                images[img as usize] = i as Point;
            }
        }
        Self { images }
    }
}

impl Ranked for PPerm {
    fn rank(&self) -> usize {
        self.images.iter().filter(|&&v| v != UNDEFINED).count()
    }
}

impl Act for PPerm {
    fn act(&self, pt: Point) -> Point {
        self.images[pt as usize]
    }
}

/// the GAP ordering on partial permutations: trimmed degree first, then
/// pointwise with an undefined slot below any defined image, so that a
/// restriction of a map compares less than the map itself.
impl Ord for PPerm {
    fn cmp(&self, that: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        let this_deg = self.trimmed_degree();
        let that_deg = that.trimmed_degree();
        if this_deg != that_deg {
            return this_deg.cmp(&that_deg);
        }
        for i in 0..this_deg {
            let a = self.images[i];
            let b = that.images[i];
            if a != b {
                return match (a, b) {
                    (UNDEFINED, _) => Ordering::Less,
                    (_, UNDEFINED) => Ordering::Greater,
                    (a, b) => a.cmp(&b),
                };
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for PPerm {
    fn partial_cmp(&self, that: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(that))
    }
}

impl std::fmt::Display for PPerm {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "PPerm(")?;
        for (i, &img) in self.images.iter().enumerate() {
            let sep = if i == 0 { "" } else { ", " };
            match img {
                UNDEFINED => write!(f, "{}-", sep)?,
                p => write!(f, "{}{}", sep, p)?,
            }
        }
        write!(f, ")")
    }
}

impl Arbitrary for PPerm {
    fn random() -> Self {
        use rand::seq::SliceRandom;
        use rand::Rng;
        const N: usize = 8;
        let mut rng = rand::thread_rng();
        let mut ran = (0..N as Point).collect::<Vec<_>>();
        ran.shuffle(&mut rng);
        let mut images = vec![UNDEFINED; N];
        for i in 0..N {
            if rng.gen_bool(0.6) {
                images[i] = ran[i];
            }
        }
        Self { images }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_respects_domains() {
        let x = PPerm::from_dom_ran(&[0, 1], &[2, 0], 4).unwrap();
        let y = PPerm::from_dom_ran(&[0, 2], &[3, 1], 4).unwrap();
        let xy = PPerm::product_of(&x, &y);
        assert!(xy == PPerm::from_dom_ran(&[0, 1], &[1, 3], 4).unwrap());
    }

    #[test]
    fn inverse_domain_is_image() {
        for _ in 0..16 {
            let x = PPerm::random();
            let inv = x.inverse();
            for p in 0..x.degree() as Point {
                let img = x.act(p);
                if img != UNDEFINED {
                    assert!(inv.act(img) == p);
                }
            }
            assert!(inv.rank() == x.rank());
        }
    }

    #[test]
    fn restriction_compares_less() {
        let full = PPerm::new(vec![1, 2, 0]).unwrap();
        let restricted = PPerm::new(vec![1, UNDEFINED, 0]).unwrap();
        assert!(restricted < full);
    }

    #[test]
    fn trimmed_degree_compares_first() {
        let short = PPerm::new(vec![1, 0, UNDEFINED, UNDEFINED]).unwrap();
        let long = PPerm::new(vec![UNDEFINED, UNDEFINED, 2, 3]).unwrap();
        assert!(short < long);
    }

    #[test]
    fn rejects_duplicate_image() {
        assert!(matches!(
            PPerm::new(vec![1, 1, UNDEFINED]),
            Err(Error::DuplicateImage(1))
        ));
    }

    #[test]
    fn dom_ran_mismatch() {
        assert!(matches!(
            PPerm::from_dom_ran(&[0, 1], &[2], 4),
            Err(Error::DomainMismatch { dom: 2, ran: 1 })
        ));
    }
}
