use super::Element;
use super::Ranked;
use crate::Arbitrary;
use crate::Error;
use crate::Result;
use std::cell::RefCell;

thread_local! {
    // per-thread working storage for the block fusion in product()
    static SCRATCH: RefCell<(Vec<u32>, Vec<u32>)> = const { RefCell::new((Vec::new(), Vec::new())) };
}

/// a partition of {0, ..., 2n - 1} stored as a block-label sequence in
/// first-occurrence order: if a label k > 0 appears, k - 1 appeared
/// earlier. the first n points are the top row, the rest the bottom.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bipartition {
    blocks: Vec<u32>,
}

impl Bipartition {
    pub fn new(blocks: Vec<u32>) -> Result<Self> {
        if blocks.len() % 2 != 0 {
            return Err(Error::OddDegree(blocks.len()));
        }
        let mut next = 0;
        for &label in blocks.iter() {
            if label > next {
                return Err(Error::BlockLabel(label));
            }
            if label == next {
                next += 1;
            }
        }
        Ok(Self { blocks })
    }

    /// blocks {i, n + i} for each i
    pub fn identity(n: usize) -> Self {
        let mut blocks = (0..n as u32).collect::<Vec<_>>();
        blocks.extend(0..n as u32);
        Self { blocks }
    }

    pub fn blocks(&self) -> &[u32] {
        &self.blocks
    }

    pub fn nr_blocks(&self) -> usize {
        self.blocks.iter().max().map_or(0, |&m| m as usize + 1)
    }

    /// blocks meeting the top row; these carry the labels 0..k because
    /// labels are assigned in first-occurrence order
    pub fn nr_left_blocks(&self) -> usize {
        let n = self.degree();
        self.blocks[..n].iter().max().map_or(0, |&m| m as usize + 1)
    }

    pub fn nr_right_blocks(&self) -> usize {
        let n = self.degree();
        let mut seen = vec![false; self.nr_blocks()];
        for &label in &self.blocks[n..] {
            seen[label as usize] = true;
        }
        seen.into_iter().filter(|&b| b).count()
    }

    fn scratch_find(parent: &mut [u32], x: u32) -> u32 {
        let mut x = x;
        while parent[x as usize] != x {
            parent[x as usize] = parent[parent[x as usize] as usize];
            x = parent[x as usize];
        }
        x
    }
}

impl Element for Bipartition {
    fn degree(&self) -> usize {
        self.blocks.len() / 2
    }

    fn one(&self) -> Self {
        Self::identity(self.degree())
    }

    /// fuse x's bottom row with y's top row through a scratch union-find
    /// over the blocks of both operands, then relabel in first-occurrence
    /// order. the scratch lives in thread-local storage; `tid` remains a
    /// slot hint for callers that schedule their own threads.
    fn product(&mut self, x: &Self, y: &Self, _tid: usize) {
        debug_assert!(
            x.degree() == y.degree() && x.degree() == self.degree(),
            "product requires equal degrees: {} {} {}",
            self.degree(),
            x.degree(),
            y.degree()
        );
        let n = self.degree();
        let nbx = x.nr_blocks() as u32;
        let nby = y.nr_blocks() as u32;
        SCRATCH.with(|cell| {
            let (parent, relabel) = &mut *cell.borrow_mut();
            parent.clear();
            parent.extend(0..nbx + nby);
            for i in 0..n {
                let a = Self::scratch_find(parent, x.blocks[n + i]);
                let b = Self::scratch_find(parent, nbx + y.blocks[i]);
                parent[a as usize] = b;
            }
            relabel.clear();
            relabel.resize((nbx + nby) as usize, u32::MAX);
            let mut next = 0;
            for i in 0..n {
                let root = Self::scratch_find(parent, x.blocks[i]);
                if relabel[root as usize] == u32::MAX {
                    relabel[root as usize] = next;
                    next += 1;
                }
                self.blocks[i] = relabel[root as usize];
            }
            for i in 0..n {
                let root = Self::scratch_find(parent, nbx + y.blocks[n + i]);
                if relabel[root as usize] == u32::MAX {
                    relabel[root as usize] = next;
                    next += 1;
                }
                self.blocks[n + i] = relabel[root as usize];
            }
        });
    }
}

impl Ranked for Bipartition {
    /// number of transverse blocks: those meeting both rows
    fn rank(&self) -> usize {
        let n = self.degree();
        let mut top = vec![false; self.nr_blocks()];
        for &label in &self.blocks[..n] {
            top[label as usize] = true;
        }
        let mut count = 0;
        let mut counted = vec![false; self.nr_blocks()];
        for &label in &self.blocks[n..] {
            if top[label as usize] && !counted[label as usize] {
                counted[label as usize] = true;
                count += 1;
            }
        }
        count
    }
}

impl Ord for Bipartition {
    fn cmp(&self, that: &Self) -> std::cmp::Ordering {
        self.degree()
            .cmp(&that.degree())
            .then_with(|| self.blocks.cmp(&that.blocks))
    }
}

impl PartialOrd for Bipartition {
    fn partial_cmp(&self, that: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(that))
    }
}

impl From<Vec<u32>> for Bipartition {
    fn from(blocks: Vec<u32>) -> Self {
        Self::new(blocks).expect("valid bipartition")
    }
}

impl std::fmt::Display for Bipartition {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Bipartition({:?})", self.blocks)
    }
}

impl Arbitrary for Bipartition {
    fn random() -> Self {
        use rand::Rng;
        const N: usize = 3;
        let mut rng = rand::thread_rng();
        let mut blocks = Vec::with_capacity(2 * N);
        let mut next = 0;
        for _ in 0..2 * N {
            let label = rng.gen_range(0..=next);
            if label == next {
                next += 1;
            }
            blocks.push(label);
        }
        Self { blocks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_first_occurrence_order() {
        assert!(Bipartition::new(vec![0, 1, 0, 1]).is_ok());
        assert!(matches!(
            Bipartition::new(vec![0, 2, 1, 0]),
            Err(Error::BlockLabel(2))
        ));
        assert!(matches!(
            Bipartition::new(vec![0, 0, 1]),
            Err(Error::OddDegree(3))
        ));
    }

    #[test]
    fn identity_is_neutral() {
        for _ in 0..32 {
            let x = Bipartition::random();
            let e = x.one();
            assert!(Bipartition::product_of(&x, &e) == x);
            assert!(Bipartition::product_of(&e, &x) == x);
        }
    }

    #[test]
    fn product_fuses_middle_rows() {
        // x has one block {0, 1, 0', 1'}; y separates {0, 0'} and {1, 1'}
        let x = Bipartition::from(vec![0, 0, 0, 0]);
        let y = Bipartition::from(vec![0, 1, 0, 1]);
        let xy = Bipartition::product_of(&x, &y);
        assert!(xy == Bipartition::from(vec![0, 0, 0, 0]));
        let yx = Bipartition::product_of(&y, &x);
        assert!(yx == Bipartition::from(vec![0, 0, 0, 0]));
    }

    #[test]
    fn rank_counts_transverse_blocks() {
        assert!(Bipartition::identity(4).rank() == 4);
        // top row in one block, bottom row in another
        let x = Bipartition::from(vec![0, 0, 1, 1]);
        assert!(x.rank() == 0);
        assert!(x.nr_blocks() == 2);
        assert!(x.nr_left_blocks() == 1);
        assert!(x.nr_right_blocks() == 1);
    }

    #[test]
    fn block_counts() {
        let x = Bipartition::from(vec![0, 1, 2, 1, 0, 2]);
        assert!(x.degree() == 3);
        assert!(x.nr_blocks() == 3);
        assert!(x.nr_left_blocks() == 3);
        assert!(x.nr_right_blocks() == 3);
        assert!(x.rank() == 3);
    }
}
