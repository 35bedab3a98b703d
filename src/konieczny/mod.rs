pub mod dclass;
pub mod orbit;

pub use dclass::DClass;
pub use orbit::Orbit;

use crate::element::Element;
use crate::element::Perm;
use crate::element::PPerm;
use crate::element::Ranked;
use crate::element::Transf;
use crate::partition::UnionFind;
use crate::report;
use crate::runner::Run;
use crate::runner::Runner;
use crate::schreier_sims::SchreierSims;
use crate::Error;
use crate::Point;
use crate::Result;
use crate::UNDEFINED;
use std::collections::BTreeSet;
use std::collections::HashMap;

/// the hooks the D-class decomposition needs from a transformation-like
/// element: a λ-value (image side) acted on from the right, a ρ-value
/// (kernel side) acted on from the left, and the permutation an H-class
/// member induces on a λ-value
pub trait LambdaRho: Element + Ranked {
    type Lambda: Clone + Eq + std::hash::Hash + Send + Sync;
    type Rho: Clone + Eq + std::hash::Hash + Send + Sync;

    fn lambda(&self) -> Self::Lambda;
    fn rho(&self) -> Self::Rho;
    fn lambda_act(value: &Self::Lambda, x: &Self) -> Self::Lambda;
    fn rho_act(x: &Self, value: &Self::Rho) -> Self::Rho;
    fn h_perm(x: &Self, lambda: &Self::Lambda) -> Perm;
}

fn kernel_labels(images: &[Point]) -> Vec<u32> {
    let mut lookup = vec![UNDEFINED; images.len()];
    let mut next = 0;
    let mut labels = Vec::with_capacity(images.len());
    for &v in images {
        if lookup[v as usize] == UNDEFINED {
            lookup[v as usize] = next;
            next += 1;
        }
        labels.push(lookup[v as usize]);
    }
    labels
}

impl LambdaRho for Transf {
    type Lambda = Vec<Point>;
    type Rho = Vec<u32>;

    fn lambda(&self) -> Vec<Point> {
        let mut image = self.images().to_vec();
        image.sort_unstable();
        image.dedup();
        image
    }

    fn rho(&self) -> Vec<u32> {
        kernel_labels(self.images())
    }

    fn lambda_act(value: &Vec<Point>, x: &Self) -> Vec<Point> {
        let mut image = value
            .iter()
            .map(|&p| x.images()[p as usize])
            .collect::<Vec<_>>();
        image.sort_unstable();
        image.dedup();
        image
    }

    fn rho_act(x: &Self, value: &Vec<u32>) -> Vec<u32> {
        let composed = x
            .images()
            .iter()
            .map(|&p| value[p as usize])
            .collect::<Vec<_>>();
        kernel_labels(&composed)
    }

    fn h_perm(x: &Self, lambda: &Vec<Point>) -> Perm {
        let images = lambda
            .iter()
            .map(|&p| {
                let q = x.images()[p as usize];
                lambda
                    .binary_search(&q)
                    .expect("an H-class member permutes the image") as Point
            })
            .collect::<Vec<_>>();
        Perm::new(images).expect("induced images form a permutation")
    }
}

impl LambdaRho for PPerm {
    type Lambda = Vec<Point>;
    type Rho = Vec<Point>;

    fn lambda(&self) -> Vec<Point> {
        let mut image = self
            .images()
            .iter()
            .copied()
            .filter(|&v| v != UNDEFINED)
            .collect::<Vec<_>>();
        image.sort_unstable();
        image
    }

    fn rho(&self) -> Vec<Point> {
        (0..self.degree() as Point)
            .filter(|&p| self.images()[p as usize] != UNDEFINED)
            .collect()
    }

    fn lambda_act(value: &Vec<Point>, x: &Self) -> Vec<Point> {
        let mut image = value
            .iter()
            .map(|&p| x.images()[p as usize])
            .filter(|&v| v != UNDEFINED)
            .collect::<Vec<_>>();
        image.sort_unstable();
        image
    }

    fn rho_act(x: &Self, value: &Vec<Point>) -> Vec<Point> {
        (0..x.degree() as Point)
            .filter(|&p| {
                let q = x.images()[p as usize];
                q != UNDEFINED && value.binary_search(&q).is_ok()
            })
            .collect()
    }

    fn h_perm(x: &Self, lambda: &Vec<Point>) -> Perm {
        let images = lambda
            .iter()
            .map(|&p| {
                let q = x.images()[p as usize];
                lambda
                    .binary_search(&q)
                    .expect("an H-class member permutes the image") as Point
            })
            .collect::<Vec<_>>();
        Perm::new(images).expect("induced images form a permutation")
    }
}

/// Green's relation decomposition of the semigroup generated by
/// transformation-like elements. elements are enumerated breadth first
/// under multiplication on both sides, which fills the left and right
/// Cayley graphs; R- and L-classes are the strongly connected
/// components of those graphs, D-classes their join, and the group of
/// every regular H-class comes out of a stabiliser chain on the
/// representative's image. the D-class list only grows across resumed
/// runs, so partial counts are safe mid-enumeration.
pub struct Konieczny<T: LambdaRho> {
    runner: Runner,
    gens: Vec<T>,
    elements: Vec<T>,
    map: HashMap<T, usize>,
    right: crate::graph::WordGraph,
    left: crate::graph::WordGraph,
    pos: usize,
    lambda_orbit: Orbit<T::Lambda>,
    rho_orbit: Orbit<T::Rho>,
    dclasses: Option<Vec<DClass>>,
    class_of: Vec<usize>,
}

impl<T: LambdaRho + Send + Sync> Konieczny<T> {
    pub fn new(gens: Vec<T>) -> Result<Self> {
        let first = gens.first().ok_or(Error::NoGenerators)?;
        let degree = first.degree();
        if let Some(bad) = gens.iter().find(|g| g.degree() != degree) {
            return Err(Error::Degree {
                expected: degree,
                found: bad.degree(),
            });
        }
        let mut graph = crate::graph::WordGraph::new(0, 0);
        graph.add_to_out_degree(gens.len());
        let mut engine = Self {
            runner: Runner::new("konieczny"),
            lambda_orbit: Orbit::new(gens.len()),
            rho_orbit: Orbit::new(gens.len()),
            gens,
            elements: Vec::new(),
            map: HashMap::new(),
            right: graph.clone(),
            left: graph,
            pos: 0,
            dclasses: None,
            class_of: Vec::new(),
        };
        for g in engine.gens.clone() {
            engine.insert(g);
        }
        Ok(engine)
    }

    fn insert(&mut self, element: T) -> usize {
        match self.map.get(&element) {
            Some(&at) => at,
            None => {
                let at = self.elements.len();
                self.map.insert(element.clone(), at);
                self.elements.push(element);
                self.right.add_nodes(1);
                self.left.add_nodes(1);
                at
            }
        }
    }

    pub fn degree(&self) -> usize {
        self.gens[0].degree()
    }

    pub fn generators(&self) -> &[T] {
        &self.gens
    }

    pub fn current_size(&self) -> usize {
        self.elements.len()
    }

    pub fn size(&mut self) -> Result<usize> {
        self.run()?;
        Ok(self.elements.len())
    }

    pub fn contains(&mut self, x: &T) -> Result<bool> {
        self.run()?;
        Ok(self.map.contains_key(x))
    }

    fn close_orbits(&mut self) {
        if self.lambda_orbit.is_empty() {
            let gens = self.gens.clone();
            for g in gens.iter() {
                self.lambda_orbit.seed(g.lambda());
                self.rho_orbit.seed(g.rho());
            }
            self.lambda_orbit
                .close(|v, a| T::lambda_act(v, &gens[a as usize]));
            self.rho_orbit.close(|v, a| T::rho_act(&gens[a as usize], v));
        }
    }

    pub fn lambda_orbit_len(&mut self) -> usize {
        self.close_orbits();
        self.lambda_orbit.len()
    }

    pub fn rho_orbit_len(&mut self) -> usize {
        self.close_orbits();
        self.rho_orbit.len()
    }

    /// join of the R- and L-partitions on whatever has been enumerated
    fn partition_now(&mut self) -> UnionFind {
        let n = self.elements.len();
        let right_ids = {
            let scc = self.right.sccs();
            (0..n).map(|i| scc.id(i as Point)).collect::<Vec<_>>()
        };
        let left_ids = {
            let scc = self.left.sccs();
            (0..n).map(|i| scc.id(i as Point)).collect::<Vec<_>>()
        };
        let mut uf = UnionFind::new(n);
        let mut first_of: HashMap<u32, Point> = HashMap::new();
        for (i, &id) in right_ids.iter().enumerate() {
            match first_of.get(&id) {
                Some(&anchor) => {
                    uf.unite(anchor, i as Point);
                }
                None => {
                    first_of.insert(id, i as Point);
                }
            }
        }
        first_of.clear();
        for (i, &id) in left_ids.iter().enumerate() {
            match first_of.get(&id) {
                Some(&anchor) => {
                    uf.unite(anchor, i as Point);
                }
                None => {
                    first_of.insert(id, i as Point);
                }
            }
        }
        uf
    }

    /// how many D-classes the enumeration so far supports; exact once
    /// finished, an estimate before that
    pub fn current_number_of_d_classes(&mut self) -> usize {
        if let Some(classes) = &self.dclasses {
            return classes.len();
        }
        self.partition_now().number_of_blocks()
    }

    pub fn d_classes(&mut self) -> Result<&[DClass]> {
        self.run()?;
        self.compute_dclasses()?;
        Ok(self.dclasses.as_deref().expect("just computed"))
    }

    pub fn number_of_d_classes(&mut self) -> Result<usize> {
        Ok(self.d_classes()?.len())
    }

    pub fn number_of_l_classes(&mut self) -> Result<usize> {
        Ok(self.d_classes()?.iter().map(|d| d.number_of_l_classes()).sum())
    }

    pub fn number_of_r_classes(&mut self) -> Result<usize> {
        Ok(self.d_classes()?.iter().map(|d| d.number_of_r_classes()).sum())
    }

    pub fn number_of_idempotents(&mut self) -> Result<usize> {
        Ok(self
            .d_classes()?
            .iter()
            .map(|d| d.number_of_idempotents())
            .sum())
    }

    /// index into d_classes() of the class containing x
    pub fn d_class_of(&mut self, x: &T) -> Result<Option<usize>> {
        self.d_classes()?;
        Ok(self.map.get(x).map(|&i| self.class_of[i]))
    }

    fn compute_dclasses(&mut self) -> Result<()> {
        if self.dclasses.is_some() {
            return Ok(());
        }
        self.close_orbits();
        let mut uf = self.partition_now();
        let n = self.elements.len();
        let mut blocks: HashMap<Point, Vec<usize>> = HashMap::new();
        for i in 0..n {
            blocks.entry(uf.find(i as Point)).or_default().push(i);
        }
        let mut classes = Vec::with_capacity(blocks.len());
        for members in blocks.into_values() {
            classes.push(self.build_dclass(members)?);
        }
        classes.sort_by_key(|d: &DClass| d.rep);
        let mut class_of = vec![0; n];
        for (ci, class) in classes.iter().enumerate() {
            for &m in class.members.iter() {
                class_of[m] = ci;
            }
        }
        self.class_of = class_of;
        self.dclasses = Some(classes);
        Ok(())
    }

    fn build_dclass(&self, members: Vec<usize>) -> Result<DClass> {
        let rep = members[0];
        let rank = self.elements[rep].rank();
        let mut lambdas = BTreeSet::new();
        let mut rhos = BTreeSet::new();
        let mut member_positions = Vec::with_capacity(members.len());
        for &m in members.iter() {
            let lp = self
                .lambda_orbit
                .position(&self.elements[m].lambda())
                .expect("every element's lambda lies in the orbit");
            let rp = self
                .rho_orbit
                .position(&self.elements[m].rho())
                .expect("every element's rho lies in the orbit");
            lambdas.insert(lp);
            rhos.insert(rp);
            member_positions.push((m, lp, rp));
        }
        let idempotents = members
            .iter()
            .copied()
            .filter(|&m| {
                let x = &self.elements[m];
                &T::product_of(x, x) == x
            })
            .collect::<Vec<_>>();
        let regular = !idempotents.is_empty();
        let h_size = if regular {
            // the H-class of an idempotent is a group; measure it with a
            // stabiliser chain on the idempotent's image
            let e = idempotents[0];
            let e_lambda = self.elements[e].lambda();
            let e_lp = self.lambda_orbit.position(&e_lambda).expect("in orbit");
            let e_rp = self
                .rho_orbit
                .position(&self.elements[e].rho())
                .expect("in orbit");
            let mut chain = SchreierSims::new(rank);
            for &(m, lp, rp) in member_positions.iter() {
                if lp == e_lp && rp == e_rp {
                    chain.add_generator(T::h_perm(&self.elements[m], &e_lambda))?;
                }
            }
            chain.size() as usize
        } else {
            members.len() / (lambdas.len() * rhos.len())
        };
        Ok(DClass {
            rep,
            rank,
            members,
            lambdas: lambdas.into_iter().collect(),
            rhos: rhos.into_iter().collect(),
            idempotents,
            h_size,
            regular,
        })
    }
}

impl<T: LambdaRho + Send + Sync> Run for Konieczny<T> {
    fn runner(&self) -> &Runner {
        &self.runner
    }

    fn runner_mut(&mut self) -> &mut Runner {
        &mut self.runner
    }

    fn finished_impl(&self) -> bool {
        self.pos >= self.elements.len()
    }

    fn run_impl(&mut self) -> Result<()> {
        let mut product = self.gens[0].one();
        while self.pos < self.elements.len() {
            if self.runner.stopped() {
                break;
            }
            let pos = self.pos;
            for a in 0..self.gens.len() {
                if self.right.at(pos as Point, a as u32) == UNDEFINED {
                    product.product(&self.elements[pos], &self.gens[a], 0);
                    let target = self.insert(product.clone());
                    self.right
                        .set_target(pos as Point, a as u32, target as Point)?;
                }
                if self.left.at(pos as Point, a as u32) == UNDEFINED {
                    product.product(&self.gens[a], &self.elements[pos], 0);
                    let target = self.insert(product.clone());
                    self.left
                        .set_target(pos as Point, a as u32, target as Point)?;
                }
            }
            self.pos += 1;
            if report::reporting() && self.pos % 4096 == 0 {
                log::info!(
                    "konieczny: {} elements found, {} processed",
                    self.elements.len(),
                    self.pos
                );
            }
        }
        if self.finished_impl() {
            // fresh elements invalidate any partially derived structure
            self.dclasses = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn shapes(engine: &mut Konieczny<Transf>) -> Vec<(usize, usize, usize, usize, bool)> {
        let mut out = engine
            .d_classes()
            .unwrap()
            .iter()
            .map(|d| {
                (
                    d.size(),
                    d.number_of_l_classes(),
                    d.number_of_r_classes(),
                    d.size_of_h_classes(),
                    d.is_regular(),
                )
            })
            .collect::<Vec<_>>();
        out.sort();
        out
    }

    #[test]
    fn small_transformation_semigroup() {
        let mut engine = Konieczny::new(vec![
            Transf::from([1, 2, 0, 0]),
            Transf::from([0, 0, 2, 3]),
        ])
        .unwrap();
        assert!(engine.size().unwrap() == 25);
        assert!(engine.number_of_d_classes().unwrap() == 4);
        assert!(engine.number_of_idempotents().unwrap() == 11);
        assert!(shapes(&mut engine) == vec![
            (1, 1, 1, 1, true),
            (3, 1, 1, 3, true),
            (3, 3, 1, 1, true),
            (18, 3, 3, 2, true),
        ]);
    }

    #[test]
    fn full_transformation_monoid_t4() {
        let mut engine = Konieczny::new(vec![
            Transf::from([1, 0, 2, 3]),
            Transf::from([1, 2, 3, 0]),
            Transf::from([0, 0, 2, 3]),
        ])
        .unwrap();
        assert!(engine.size().unwrap() == 256);
        assert!(engine.number_of_d_classes().unwrap() == 4);
        assert!(engine.number_of_idempotents().unwrap() == 41);
        assert!(shapes(&mut engine) == vec![
            (4, 4, 1, 1, true),
            (24, 1, 1, 24, true),
            (84, 6, 7, 2, true),
            (144, 4, 6, 6, true),
        ]);
        // image subsets and kernel partitions of a full monoid
        assert!(engine.lambda_orbit_len() == 15);
        assert!(engine.rho_orbit_len() == 15);
    }

    #[test]
    fn full_transformation_monoid_t5() {
        let mut engine = Konieczny::new(vec![
            Transf::from([1, 0, 2, 3, 4]),
            Transf::from([1, 2, 3, 4, 0]),
            Transf::from([0, 0, 2, 3, 4]),
        ])
        .unwrap();
        assert!(engine.size().unwrap() == 3125);
        assert!(engine.number_of_d_classes().unwrap() == 5);
        assert!(engine.number_of_idempotents().unwrap() == 196);
        // the group of units is the symmetric group S5
        let units = engine
            .d_class_of(&Transf::identity(5))
            .unwrap()
            .expect("identity is generated");
        let class = &engine.d_classes().unwrap()[units];
        assert!(class.size() == 120);
        assert!(class.size_of_h_classes() == 120);
    }

    #[test]
    fn h_class_cells_tile_every_d_class() {
        let mut engine = Konieczny::new(vec![
            Transf::from([1, 0, 2, 3]),
            Transf::from([1, 2, 3, 0]),
            Transf::from([0, 0, 2, 3]),
        ])
        .unwrap();
        for class in engine.d_classes().unwrap() {
            let cells = class.number_of_l_classes() * class.number_of_r_classes();
            assert!(class.size() == cells * class.size_of_h_classes());
        }
    }

    #[test]
    fn every_element_lies_in_exactly_one_d_class() {
        let mut engine = Konieczny::new(vec![
            Transf::from([1, 2, 0, 0]),
            Transf::from([0, 0, 2, 3]),
        ])
        .unwrap();
        let total: usize = engine
            .d_classes()
            .unwrap()
            .iter()
            .map(|d| d.size())
            .sum();
        assert!(total == engine.size().unwrap());
        for i in 0..engine.current_size() {
            let x = engine.elements[i].clone();
            let class = engine.d_class_of(&x).unwrap().unwrap();
            assert!(engine.d_classes().unwrap()[class].members().contains(&i));
        }
    }

    #[test]
    fn partial_permutation_semigroup() {
        let cycle = PPerm::from_dom_ran(&[0, 1, 2], &[1, 2, 0], 3).unwrap();
        let partial = PPerm::from_dom_ran(&[0, 1], &[0, 1], 3).unwrap();
        let mut engine = Konieczny::new(vec![cycle, partial]).unwrap();
        assert!(engine.size().unwrap() == 22);
        assert!(engine.number_of_d_classes().unwrap() == 4);
        assert!(engine.number_of_idempotents().unwrap() == 8);
    }

    #[test]
    fn resumes_and_grows_monotonically() {
        let mut engine = Konieczny::new(vec![
            Transf::from([1, 0, 2, 3, 4]),
            Transf::from([1, 2, 3, 4, 0]),
            Transf::from([0, 0, 2, 3, 4]),
        ])
        .unwrap();
        engine.run_for(Duration::ZERO).unwrap();
        assert!(!engine.finished());
        let partial_size = engine.current_size();
        let partial_classes = engine.current_number_of_d_classes();
        assert!(partial_size < 3125);
        assert!(engine.size().unwrap() == 3125);
        assert!(engine.current_number_of_d_classes() >= partial_classes.min(5));
        assert!(engine.current_size() >= partial_size);
    }
}
