use super::Element;
use super::Ranked;
use crate::Arbitrary;
use crate::Error;
use crate::Result;
use itertools::Itertools;

/// a square boolean matrix in row-major order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BMat {
    dim: usize,
    entries: Vec<bool>,
}

impl BMat {
    pub fn new(dim: usize, entries: Vec<bool>) -> Result<Self> {
        if entries.len() != dim * dim {
            return Err(Error::DomainMismatch {
                dom: entries.len(),
                ran: dim * dim,
            });
        }
        Ok(Self { dim, entries })
    }

    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self> {
        let dim = rows.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != dim) {
            return Err(Error::DomainMismatch {
                dom: bad.len(),
                ran: dim,
            });
        }
        Ok(Self {
            dim,
            entries: rows.into_iter().flatten().collect(),
        })
    }

    pub fn identity(dim: usize) -> Self {
        let mut entries = vec![false; dim * dim];
        for i in 0..dim {
            entries[i * dim + i] = true;
        }
        Self { dim, entries }
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.entries[row * self.dim + col]
    }

    // row as a chunked bitset, for the rank computation
    fn row_bits(&self, row: usize) -> Vec<u64> {
        let mut bits = vec![0u64; self.dim.div_ceil(64)];
        for col in 0..self.dim {
            if self.get(row, col) {
                bits[col / 64] |= 1 << (col % 64);
            }
        }
        bits
    }
}

fn contained(a: &[u64], b: &[u64]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x & !y == 0)
}

impl Element for BMat {
    fn degree(&self) -> usize {
        self.dim
    }
    fn one(&self) -> Self {
        Self::identity(self.dim)
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
        for i in 0..n {
            for j in 0..n {
                self.entries[i * n + j] = (0..n).any(|k| x.get(i, k) && y.get(k, j));
            }
        }
    }
}

impl Ranked for BMat {
    /// dimension of the row space over the boolean semiring: the size of
    /// the unique minimal generating set. a row is redundant exactly when
    /// it is the union of the distinct rows strictly contained in it.
    fn rank(&self) -> usize {
        let rows = (0..self.dim)
            .map(|i| self.row_bits(i))
            .filter(|r| r.iter().any(|&w| w != 0))
            .unique()
            .collect::<Vec<_>>();
        rows.iter()
            .filter(|row| {
                let mut cover = vec![0u64; row.len()];
                for other in rows.iter() {
                    if *other != **row && contained(other, row) {
                        for (c, o) in cover.iter_mut().zip(other.iter()) {
                            *c |= o;
                        }
                    }
                }
                cover != **row
            })
            .count()
    }
}

impl Ord for BMat {
    fn cmp(&self, that: &Self) -> std::cmp::Ordering {
        self.dim
            .cmp(&that.dim)
            .then_with(|| self.entries.cmp(&that.entries))
    }
}

impl PartialOrd for BMat {
    fn partial_cmp(&self, that: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(that))
    }
}

impl std::fmt::Display for BMat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for row in 0..self.dim {
            for col in 0..self.dim {
                write!(f, "{}", if self.get(row, col) { 1 } else { 0 })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Arbitrary for BMat {
    fn random() -> Self {
        use rand::Rng;
        const N: usize = 4;
        let mut rng = rand::thread_rng();
        Self {
            dim: N,
            entries: (0..N * N).map(|_| rng.gen_bool(0.5)).collect(),
        }
    }
}
