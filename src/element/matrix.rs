use super::Element;
use crate::Arbitrary;
use crate::Error;
use crate::Result;

/// additive identity of the max-plus semiring
pub const MINUS_INFINITY: i64 = i64::MIN;
/// additive identity of the min-plus semiring
pub const PLUS_INFINITY: i64 = i64::MAX;

/// the arithmetic a matrix entry lives in
pub trait Semiring:
    Clone + Copy + PartialEq + Eq + std::hash::Hash + Ord + std::fmt::Debug + Send + Sync
{
    fn zero(&self) -> i64;
    fn one(&self) -> i64;
    fn plus(&self, a: i64, b: i64) -> i64;
    fn times(&self, a: i64, b: i64) -> i64;
}

/// (max, +) with minus infinity absorbing under multiplication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MaxPlus;

impl Semiring for MaxPlus {
    fn zero(&self) -> i64 {
        MINUS_INFINITY
    }
    fn one(&self) -> i64 {
        0
    }
    fn plus(&self, a: i64, b: i64) -> i64 {
        a.max(b)
    }
    fn times(&self, a: i64, b: i64) -> i64 {
        if a == MINUS_INFINITY || b == MINUS_INFINITY {
            MINUS_INFINITY
        } else {
            a + b
        }
    }
}

/// (min, +) with plus infinity absorbing under multiplication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MinPlus;

impl Semiring for MinPlus {
    fn zero(&self) -> i64 {
        PLUS_INFINITY
    }
    fn one(&self) -> i64 {
        0
    }
    fn plus(&self, a: i64, b: i64) -> i64 {
        a.min(b)
    }
    fn times(&self, a: i64, b: i64) -> i64 {
        if a == PLUS_INFINITY || b == PLUS_INFINITY {
            PLUS_INFINITY
        } else {
            a + b
        }
    }
}

/// max-plus arithmetic truncated at a threshold, which keeps the
/// generated matrix semigroups finite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TropicalMaxPlus {
    pub threshold: i64,
}

impl Semiring for TropicalMaxPlus {
    fn zero(&self) -> i64 {
        MINUS_INFINITY
    }
    fn one(&self) -> i64 {
        0
    }
    fn plus(&self, a: i64, b: i64) -> i64 {
        a.max(b).min(self.threshold)
    }
    fn times(&self, a: i64, b: i64) -> i64 {
        if a == MINUS_INFINITY || b == MINUS_INFINITY {
            MINUS_INFINITY
        } else {
            (a + b).min(self.threshold)
        }
    }
}

/// a square matrix over a semiring, row-major
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mat<S: Semiring> {
    semiring: S,
    dim: usize,
    entries: Vec<i64>,
}

impl<S: Semiring> Mat<S> {
    pub fn new(semiring: S, dim: usize, entries: Vec<i64>) -> Result<Self> {
        if entries.len() != dim * dim {
            return Err(Error::DomainMismatch {
                dom: entries.len(),
                ran: dim * dim,
            });
        }
        Ok(Self {
            semiring,
            dim,
            entries,
        })
    }

    pub fn from_rows(semiring: S, rows: Vec<Vec<i64>>) -> Result<Self> {
        let dim = rows.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != dim) {
            return Err(Error::DomainMismatch {
                dom: bad.len(),
                ran: dim,
            });
        }
        Self::new(semiring, dim, rows.into_iter().flatten().collect())
    }

    pub fn identity(semiring: S, dim: usize) -> Self {
        let mut entries = vec![semiring.zero(); dim * dim];
        for i in 0..dim {
            entries[i * dim + i] = semiring.one();
        }
        Self {
            semiring,
            dim,
            entries,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> i64 {
        self.entries[row * self.dim + col]
    }

    pub fn semiring(&self) -> &S {
        &self.semiring
    }
}

impl<S: Semiring> Element for Mat<S> {
    fn degree(&self) -> usize {
        self.dim
    }
    fn one(&self) -> Self {
        Self::identity(self.semiring, self.dim)
    }
    fn product(&mut self, x: &Self, y: &Self, _tid: usize) {
        debug_assert!(
            x.dim == y.dim && x.dim == self.dim,
            "product requires equal dimensions: {} {} {}",
            self.dim,
            x.dim,
            y.dim
        );
        let n = self.dim;
        let s = self.semiring;
        for i in 0..n {
            for j in 0..n {
                let mut acc = s.zero();
                for k in 0..n {
                    acc = s.plus(acc, s.times(x.get(i, k), y.get(k, j)));
                }
                self.entries[i * n + j] = acc;
            }
        }
    }
}

impl<S: Semiring> Ord for Mat<S> {
    fn cmp(&self, that: &Self) -> std::cmp::Ordering {
        self.dim
            .cmp(&that.dim)
            .then_with(|| self.entries.cmp(&that.entries))
    }
}

impl<S: Semiring> PartialOrd for Mat<S> {
    fn partial_cmp(&self, that: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(that))
    }
}

impl<S: Semiring> std::fmt::Display for Mat<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for row in 0..self.dim {
            for col in 0..self.dim {
                let sep = if col == 0 { "" } else { " " };
                match self.get(row, col) {
                    MINUS_INFINITY => write!(f, "{}-inf", sep)?,
                    PLUS_INFINITY => write!(f, "{}inf", sep)?,
                    entry => write!(f, "{}{}", sep, entry)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<S: Semiring + Default> Arbitrary for Mat<S> {
    fn random() -> Self {
        use rand::Rng;
        const N: usize = 4;
        let semiring = S::default();
        let mut rng = rand::thread_rng();
        let entries = (0..N * N)
            .map(|_| {
                if rng.gen_bool(0.2) {
                    semiring.zero()
                } else {
                    rng.gen_range(-4..=4)
                }
            })
            .collect();
        Self {
            semiring,
            dim: N,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_plus_product() {
        let s = MaxPlus;
        let x = Mat::from_rows(s, vec![vec![0, 1], vec![MINUS_INFINITY, 2]]).unwrap();
        let y = Mat::from_rows(s, vec![vec![1, MINUS_INFINITY], vec![0, 3]]).unwrap();
        let xy = Mat::product_of(&x, &y);
        // xy[0][0] = max(0 + 1, 1 + 0) = 1
        // xy[0][1] = max(-inf, 1 + 3) = 4
        // xy[1][0] = max(-inf, 2 + 0) = 2
        // xy[1][1] = max(-inf, 2 + 3) = 5
        assert!(xy == Mat::from_rows(s, vec![vec![1, 4], vec![2, 5]]).unwrap());
    }

    #[test]
    fn identity_is_neutral() {
        let s = MinPlus;
        let x = Mat::from_rows(s, vec![vec![3, 0], vec![PLUS_INFINITY, -2]]).unwrap();
        let e = x.one();
        assert!(Mat::product_of(&x, &e) == x);
        assert!(Mat::product_of(&e, &x) == x);
    }

    #[test]
    fn tropical_truncates() {
        let s = TropicalMaxPlus { threshold: 5 };
        let x = Mat::from_rows(s, vec![vec![4]]).unwrap();
        let sq = Mat::product_of(&x, &x);
        assert!(sq.get(0, 0) == 5);
    }

    #[test]
    fn rejects_ragged_rows() {
        assert!(Mat::from_rows(MaxPlus, vec![vec![0], vec![0, 1]]).is_err());
    }

    #[test]
    fn identity_is_neutral_for_random_matrices() {
        for _ in 0..16 {
            let x: Mat<MaxPlus> = Mat::random();
            let e = x.one();
            assert!(Mat::product_of(&x, &e) == x);
            assert!(Mat::product_of(&e, &x) == x);
        }
    }

    #[test]
    fn renders_sentinels() {
        let x = Mat::from_rows(MaxPlus, vec![vec![0, MINUS_INFINITY], vec![2, 1]]).unwrap();
        assert!(x.to_string() == "0 -inf\n2 1\n");
    }
}
