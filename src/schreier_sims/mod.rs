use crate::element::Act;
use crate::element::Element;
use crate::element::Inverse;
use crate::element::Perm;
use crate::Error;
use crate::Point;
use crate::Result;

/// a base and strong generating set for a permutation group of fixed
/// degree, built by the Schreier-Sims procedure: orbits of each base
/// point with transversals and their inverses, strong generators
/// grouped by the deepest level they belong to, and sifting as the
/// membership test. the chain is completed lazily by the queries that
/// need it.
pub struct SchreierSims {
    degree: usize,
    base: Vec<Point>,
    strong_gens: Vec<Vec<Perm>>,
    orbits: Vec<Vec<Point>>,
    lookup: Vec<Vec<bool>>,
    transversal: Vec<Vec<Option<Perm>>>,
    inversal: Vec<Vec<Option<Perm>>>,
    one: Perm,
    finished: bool,
}

impl SchreierSims {
    pub fn new(degree: usize) -> Self {
        Self {
            degree,
            base: Vec::new(),
            strong_gens: vec![Vec::new(); degree + 1],
            orbits: vec![Vec::new(); degree],
            lookup: vec![vec![false; degree]; degree],
            transversal: vec![vec![None; degree]; degree],
            inversal: vec![vec![None; degree]; degree],
            one: Perm::identity(degree),
            finished: false,
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn empty(&self) -> bool {
        self.strong_gens[0].is_empty()
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn base(&self, index: usize) -> Result<Point> {
        self.base
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                found: index,
                bound: self.base.len(),
            })
    }

    pub fn base_size(&self) -> usize {
        self.base.len()
    }

    pub fn generator(&self, index: usize) -> Result<&Perm> {
        self.strong_gens[0].get(index).ok_or(Error::IndexOutOfBounds {
            found: index,
            bound: self.strong_gens[0].len(),
        })
    }

    pub fn number_of_generators(&self) -> usize {
        self.strong_gens[0].len()
    }

    fn check_degree(&self, x: &Perm) -> Result<()> {
        if x.degree() == self.degree {
            Ok(())
        } else {
            Err(Error::Degree {
                expected: self.degree,
                found: x.degree(),
            })
        }
    }

    /// pre-seed the base with a point the caller wants stabilised early
    pub fn add_base_point(&mut self, pt: Point) -> Result<()> {
        if pt as usize >= self.degree {
            return Err(Error::PointOutOfBounds {
                found: pt,
                bound: self.degree,
            });
        }
        if self.finished || self.base.len() == self.degree {
            return Err(Error::BaseClosed);
        }
        if self.base.contains(&pt) {
            return Err(Error::DuplicateBasePoint(pt));
        }
        self.push_base_point(pt);
        Ok(())
    }

    /// sift the generator through the chain; only a non-trivial residue
    /// extends the group
    pub fn add_generator(&mut self, x: Perm) -> Result<()> {
        self.check_degree(&x)?;
        if !self.contains(&x) {
            self.finished = false;
            let residue = self.residue(x);
            self.strong_gens[0].push(residue);
        }
        Ok(())
    }

    /// reduce x through the transversals; the result is the identity
    /// exactly when x lies in the group spanned by the current chain
    pub fn sift(&self, x: &Perm) -> Result<Perm> {
        self.check_degree(x)?;
        Ok(self.residue(x.clone()))
    }

    pub fn contains(&mut self, x: &Perm) -> bool {
        if x.degree() != self.degree {
            return false;
        }
        self.complete();
        self.residue(x.clone()) == self.one
    }

    pub fn size(&mut self) -> u128 {
        if self.empty() {
            return 1;
        }
        self.complete();
        self.orbits[..self.base.len()]
            .iter()
            .map(|orbit| orbit.len() as u128)
            .product()
    }

    fn residue(&self, x: Perm) -> Perm {
        self.residue_with_depth(x).0
    }

    fn residue_with_depth(&self, mut x: Perm) -> (Perm, usize) {
        let mut scratch = self.one.clone();
        for depth in 0..self.base.len() {
            let beta = x.act(self.base[depth]);
            if !self.lookup[depth][beta as usize] {
                return (x, depth);
            }
            let back = self.inversal[depth][beta as usize]
                .as_ref()
                .expect("orbit points carry transversal elements");
            scratch.product(&x, back, 0);
            std::mem::swap(&mut x, &mut scratch);
        }
        (x, self.base.len())
    }

    fn push_base_point(&mut self, pt: Point) {
        let depth = self.base.len();
        self.base.push(pt);
        self.orbits[depth].clear();
        self.orbits[depth].push(pt);
        self.lookup[depth] = vec![false; self.degree];
        self.lookup[depth][pt as usize] = true;
        self.transversal[depth] = vec![None; self.degree];
        self.inversal[depth] = vec![None; self.degree];
        self.transversal[depth][pt as usize] = Some(self.one.clone());
        self.inversal[depth][pt as usize] = Some(self.one.clone());
    }

    fn orbit_add_point(&mut self, depth: usize, x: &Perm, pt: Point) {
        let img = x.act(pt);
        if !self.lookup[depth][img as usize] {
            self.orbits[depth].push(img);
            self.lookup[depth][img as usize] = true;
            let mut forward = self.one.clone();
            forward.product(
                self.transversal[depth][pt as usize]
                    .as_ref()
                    .expect("pt lies in the orbit"),
                x,
                0,
            );
            self.inversal[depth][img as usize] = Some(forward.inverse());
            self.transversal[depth][img as usize] = Some(forward);
        }
    }

    fn orbit_enumerate(&mut self, depth: usize, first: usize) {
        let mut i = first;
        while i < self.orbits[depth].len() {
            let pt = self.orbits[depth][i];
            for j in 0..self.strong_gens[depth].len() {
                let x = self.strong_gens[depth][j].clone();
                self.orbit_add_point(depth, &x, pt);
            }
            i += 1;
        }
    }

    fn orbit_add_gen(&mut self, depth: usize, r#gen: &Perm) {
        let old_size = self.orbits[depth].len();
        for i in 0..old_size {
            let pt = self.orbits[depth][i];
            self.orbit_add_point(depth, r#gen, pt);
        }
        self.orbit_enumerate(depth, old_size);
    }

    fn first_non_fixed_point(&self, x: &Perm) -> Option<Point> {
        (0..self.degree as Point).find(|&p| x.act(p) != p)
    }

    /// the Schreier-Sims completion: distribute generators down the
    /// chain, enumerate orbits, and sift Schreier generators until
    /// every level verifies
    fn complete(&mut self) {
        if self.finished {
            return;
        }
        // every generator must move some base point
        for j in 0..self.strong_gens[0].len() {
            let x = self.strong_gens[0][j].clone();
            let fixes_all = self
                .base
                .iter()
                .all(|&b| x.act(b) == b);
            if fixes_all {
                if let Some(pt) = self.first_non_fixed_point(&x) {
                    self.push_base_point(pt);
                }
            }
        }
        // distribute the generators level by level
        let mut first = 0;
        for i in 1..=self.base.len() {
            let beta = self.base[i - 1];
            let old_first = self.strong_gens[i].len();
            for j in first..self.strong_gens[i - 1].len() {
                let x = self.strong_gens[i - 1][j].clone();
                if x.act(beta) == beta {
                    self.strong_gens[i].push(x);
                }
            }
            first = old_first;
            self.orbit_enumerate(i - 1, 0);
        }
        // verify each level, propagating any residue deeper and
        // restarting from where it landed
        let mut level = self.base.len() as isize - 1;
        let mut scratch = self.one.clone();
        while level >= 0 {
            let i = level as usize;
            let mut restart = false;
            'scan: for oi in 0..self.orbits[i].len() {
                let beta = self.orbits[i][oi];
                for m in 0..self.strong_gens[i].len() {
                    let r#gen = self.strong_gens[i][m].clone();
                    let along = self.transversal[i][beta as usize]
                        .as_ref()
                        .expect("orbit points carry transversal elements");
                    scratch.product(along, &r#gen, 0);
                    let delta = r#gen.act(beta);
                    if Some(&scratch) != self.transversal[i][delta as usize].as_ref() {
                        let mut schreier = self.one.clone();
                        schreier.product(
                            &scratch,
                            self.inversal[i][delta as usize]
                                .as_ref()
                                .expect("delta lies in the orbit"),
                            0,
                        );
                        let (residue, depth) = self.residue_with_depth(schreier);
                        let mut propagate = depth < self.base.len();
                        if !propagate && residue != self.one {
                            propagate = true;
                            let pt = self
                                .first_non_fixed_point(&residue)
                                .expect("a non-identity residue moves something");
                            self.push_base_point(pt);
                        }
                        if propagate {
                            for l in i + 1..=depth {
                                self.strong_gens[l].push(residue.clone());
                                self.orbit_add_gen(l, &residue);
                            }
                            level = depth as isize;
                            restart = true;
                            break 'scan;
                        }
                    }
                }
            }
            if !restart {
                level -= 1;
            }
        }
        self.finished = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s5() -> SchreierSims {
        let mut chain = SchreierSims::new(5);
        chain.add_generator(Perm::from([1, 0, 2, 3, 4])).unwrap();
        chain.add_generator(Perm::from([1, 2, 3, 4, 0])).unwrap();
        chain
    }

    #[test]
    fn symmetric_group_order() {
        let mut chain = s5();
        assert!(chain.size() == 120);
    }

    #[test]
    fn membership_after_completion() {
        let mut chain = s5();
        // the transposition (0 2)
        assert!(chain.contains(&Perm::from([2, 1, 0, 3, 4])));
        // a handful of arbitrary 5-point permutations
        for p in [
            Perm::from([2, 0, 1, 4, 3]),
            Perm::from([3, 4, 1, 0, 2]),
            Perm::from([0, 2, 4, 1, 3]),
            Perm::from([4, 2, 3, 0, 1]),
        ] {
            assert!(chain.contains(&p));
        }
    }

    #[test]
    fn wrong_degree_is_not_contained() {
        let mut chain = s5();
        assert!(!chain.contains(&Perm::from([1, 0, 2, 3, 4, 5])));
        assert!(chain.add_generator(Perm::identity(6)).is_err());
    }

    #[test]
    fn sift_witnesses_membership() {
        let mut chain = s5();
        chain.size();
        let inside = Perm::from([4, 3, 2, 1, 0]);
        assert!(chain.sift(&inside).unwrap() == Perm::identity(5));
        assert!(chain.contains(&inside));
    }

    #[test]
    fn alternating_subgroup() {
        let mut chain = SchreierSims::new(5);
        // two 3-cycles generate A5
        chain.add_generator(Perm::from([1, 2, 0, 3, 4])).unwrap();
        chain.add_generator(Perm::from([0, 1, 3, 4, 2])).unwrap();
        assert!(chain.size() == 60);
        // odd permutations stay outside
        assert!(!chain.contains(&Perm::from([1, 0, 2, 3, 4])));
    }

    #[test]
    fn size_matches_orbit_product() {
        let mut chain = s5();
        let size = chain.size();
        let product: u128 = (0..chain.base_size())
            .map(|i| chain.orbits[i].len() as u128)
            .product();
        assert!(size == product);
    }

    #[test]
    fn added_generators_are_contained() {
        let mut chain = SchreierSims::new(6);
        let gens = [
            Perm::from([1, 2, 3, 0, 4, 5]),
            Perm::from([0, 1, 2, 3, 5, 4]),
        ];
        for r#gen in gens.iter() {
            chain.add_generator(r#gen.clone()).unwrap();
        }
        for r#gen in gens.iter() {
            assert!(chain.contains(r#gen));
        }
        // the direct product C4 x C2
        assert!(chain.size() == 8);
    }

    #[test]
    fn trivial_group() {
        let mut chain = SchreierSims::new(4);
        assert!(chain.size() == 1);
        chain.add_generator(Perm::identity(4)).unwrap();
        assert!(chain.size() == 1);
        assert!(chain.empty());
    }

    #[test]
    fn base_points_can_be_seeded() {
        let mut chain = SchreierSims::new(5);
        chain.add_base_point(2).unwrap();
        assert!(matches!(
            chain.add_base_point(2),
            Err(Error::DuplicateBasePoint(2))
        ));
        chain.add_generator(Perm::from([1, 2, 3, 4, 0])).unwrap();
        assert!(chain.size() == 5);
        assert!(chain.base(0).unwrap() == 2);
    }
}
