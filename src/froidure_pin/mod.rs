use crate::element::Element;
use crate::graph::WordGraph;
use crate::presentation::Presentation;
use crate::report;
use crate::runner::Run;
use crate::runner::Runner;
use crate::Error;
use crate::Letter;
use crate::Point;
use crate::Result;
use crate::Word;
use crate::UNDEFINED;
use rayon::prelude::*;
use std::collections::HashMap;

// sentinel for the prefix and suffix of the generators
const NONE: usize = usize::MAX;

/// breadth first enumeration of the semigroup generated by a finite set
/// of elements. elements are discovered in order of their shortest
/// word; alongside each sits its prefix, suffix, first and final letter
/// and word length, so factorisation never multiplies anything. the
/// right Cayley graph is built during the walk, a rule is recorded for
/// every product that reproduces a known element, and a cursor lets the
/// enumeration resume exactly where a timeout or kill left it.
pub struct FroidurePin<T: Element> {
    runner: Runner,
    gens: Vec<T>,
    letter_to_pos: Vec<usize>,
    elements: Vec<T>,
    map: HashMap<T, usize>,
    prefix: Vec<usize>,
    suffix: Vec<usize>,
    first: Vec<Letter>,
    last: Vec<Letter>,
    length: Vec<usize>,
    right: WordGraph,
    left: Option<WordGraph>,
    rules: Vec<(Word, Word)>,
    pos: usize,
    idempotents: Option<Vec<usize>>,
    sorted: Option<Vec<usize>>,
}

impl<T: Element + Send + Sync> FroidurePin<T> {
    pub fn new(gens: Vec<T>) -> Result<Self> {
        let first = gens.first().ok_or(Error::NoGenerators)?;
        let degree = first.degree();
        if let Some(bad) = gens.iter().find(|g| g.degree() != degree) {
            return Err(Error::Degree {
                expected: degree,
                found: bad.degree(),
            });
        }
        let mut fp = Self {
            runner: Runner::new("froidure-pin"),
            gens: Vec::new(),
            letter_to_pos: Vec::new(),
            elements: Vec::new(),
            map: HashMap::new(),
            prefix: Vec::new(),
            suffix: Vec::new(),
            first: Vec::new(),
            last: Vec::new(),
            length: Vec::new(),
            right: WordGraph::new(0, 0),
            left: None,
            rules: Vec::new(),
            pos: 0,
            idempotents: None,
            sorted: None,
        };
        fp.install_generators(gens);
        Ok(fp)
    }

    fn install_generators(&mut self, gens: Vec<T>) {
        self.right.add_to_out_degree(gens.len());
        for r#gen in gens {
            let letter = self.gens.len() as Letter;
            self.gens.push(r#gen.clone());
            match self.map.get(&r#gen) {
                Some(&known) => {
                    self.letter_to_pos.push(known);
                    let rule = (vec![letter], self.factorisation_unchecked(known));
                    self.rules.push(rule);
                }
                None => {
                    let index = self.elements.len();
                    self.letter_to_pos.push(index);
                    self.map.insert(r#gen.clone(), index);
                    self.elements.push(r#gen);
                    self.prefix.push(NONE);
                    self.suffix.push(NONE);
                    self.first.push(letter);
                    self.last.push(letter);
                    self.length.push(1);
                    self.right.add_nodes(1);
                }
            }
        }
        self.left = None;
        self.idempotents = None;
        self.sorted = None;
        // rescan earlier rows for the fresh letters
        self.pos = 0;
    }

    /// extend the generating set and carry on enumerating without
    /// restarting; duplicates of known elements only add a rule
    pub fn add_generators(&mut self, gens: Vec<T>) -> Result<()> {
        if gens.is_empty() {
            return Ok(());
        }
        let degree = self.degree();
        if let Some(bad) = gens.iter().find(|g| g.degree() != degree) {
            return Err(Error::Degree {
                expected: degree,
                found: bad.degree(),
            });
        }
        self.install_generators(gens);
        Ok(())
    }

    /// add only the generators lying outside the semigroup as it stands
    pub fn closure(&mut self, gens: Vec<T>) -> Result<()> {
        self.run()?;
        let fresh = gens
            .into_iter()
            .filter(|g| !self.map.contains_key(g))
            .collect::<Vec<_>>();
        self.add_generators(fresh)
    }

    pub fn degree(&self) -> usize {
        self.gens[0].degree()
    }

    pub fn number_of_generators(&self) -> usize {
        self.gens.len()
    }

    pub fn generator(&self, letter: Letter) -> &T {
        &self.gens[letter as usize]
    }

    pub fn current_size(&self) -> usize {
        self.elements.len()
    }

    pub fn current_max_word_length(&self) -> usize {
        self.length.last().copied().unwrap_or(0)
    }

    pub fn size(&mut self) -> Result<usize> {
        self.run()?;
        Ok(self.elements.len())
    }

    pub fn contains(&mut self, element: &T) -> Result<bool> {
        self.run()?;
        Ok(self.map.contains_key(element))
    }

    pub fn position(&mut self, element: &T) -> Result<Option<usize>> {
        self.run()?;
        Ok(self.map.get(element).copied())
    }

    pub fn at(&self, index: usize) -> &T {
        &self.elements[index]
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.elements.len() {
            Ok(())
        } else {
            Err(Error::IndexOutOfBounds {
                found: index,
                bound: self.elements.len(),
            })
        }
    }

    /// the length of the shortest word for the element at `index`
    pub fn current_length(&self, index: usize) -> Result<usize> {
        self.check_index(index)?;
        Ok(self.length[index])
    }

    fn factorisation_unchecked(&self, index: usize) -> Word {
        let mut word = Word::new();
        let mut cursor = index;
        while cursor != NONE {
            word.push(self.last[cursor]);
            cursor = self.prefix[cursor];
        }
        word.reverse();
        word
    }

    /// a shortest word in the generators spelling the element at `index`
    pub fn factorisation(&self, index: usize) -> Result<Word> {
        self.check_index(index)?;
        Ok(self.factorisation_unchecked(index))
    }

    /// the element index reached by reading `word` through the right
    /// Cayley graph; requires the enumeration to be finished
    pub fn word_to_position(&mut self, word: &[Letter]) -> Result<Option<usize>> {
        self.run()?;
        let Some((&head, tail)) = word.split_first() else {
            return Ok(None);
        };
        if head as usize >= self.gens.len() {
            return Err(Error::LetterOutOfBounds {
                found: head,
                alphabet: self.gens.len(),
            });
        }
        let mut index = self.letter_to_pos[head as usize];
        for &a in tail {
            if a as usize >= self.gens.len() {
                return Err(Error::LetterOutOfBounds {
                    found: a,
                    alphabet: self.gens.len(),
                });
            }
            index = self.right.at(index as Point, a) as usize;
        }
        Ok(Some(index))
    }

    /// defining relations recorded during enumeration, suitable for
    /// seeding a rewriting or coset engine
    pub fn rules(&mut self) -> Result<&[(Word, Word)]> {
        self.run()?;
        Ok(&self.rules)
    }

    pub fn number_of_rules(&self) -> usize {
        self.rules.len()
    }

    /// the enumerated semigroup as a presentation on one letter per
    /// generator
    pub fn presentation(&mut self) -> Result<Presentation> {
        self.run()?;
        let mut p = Presentation::new(self.gens.len());
        for (u, v) in self.rules.iter() {
            p.add_rule(u.clone(), v.clone())?;
        }
        Ok(p)
    }

    pub fn right_cayley(&mut self) -> Result<&WordGraph> {
        self.run()?;
        Ok(&self.right)
    }

    /// the left Cayley graph, built once the enumeration is closed
    pub fn left_cayley(&mut self) -> Result<&WordGraph> {
        self.run()?;
        if self.left.is_none() {
            let mut left = WordGraph::new(self.elements.len(), self.gens.len());
            let mut product = self.gens[0].one();
            for index in 0..self.elements.len() {
                for (a, r#gen) in self.gens.iter().enumerate() {
                    product.product(r#gen, &self.elements[index], 0);
                    let target = self.map[&product];
                    left.set_target(index as Point, a as Letter, target as Point)?;
                }
            }
            self.left = Some(left);
        }
        Ok(self.left.as_ref().expect("just built"))
    }

    fn is_idempotent_unchecked(&self, index: usize) -> bool {
        // square through the right Cayley graph instead of multiplying
        let mut cursor = index;
        let mut walk = index;
        let mut word = Vec::new();
        while cursor != NONE {
            word.push(self.last[cursor]);
            cursor = self.prefix[cursor];
        }
        for &a in word.iter().rev() {
            walk = self.right.at(walk as Point, a) as usize;
        }
        walk == index
    }

    pub fn is_idempotent(&mut self, index: usize) -> Result<bool> {
        self.run()?;
        self.check_index(index)?;
        Ok(self.is_idempotent_unchecked(index))
    }

    /// indices of the idempotents, scanned in parallel and cached
    pub fn idempotents(&mut self) -> Result<&[usize]> {
        self.run()?;
        if self.idempotents.is_none() {
            let found = (0..self.elements.len())
                .into_par_iter()
                .filter(|&i| self.is_idempotent_unchecked(i))
                .collect::<Vec<_>>();
            self.idempotents = Some(found);
        }
        Ok(self.idempotents.as_deref().expect("just computed"))
    }

    pub fn number_of_idempotents(&mut self) -> Result<usize> {
        Ok(self.idempotents()?.len())
    }

    /// the permutation sending sorted rank to enumeration index, cached
    pub fn sorted(&mut self) -> Result<&[usize]> {
        self.run()?;
        if self.sorted.is_none() {
            let mut order = (0..self.elements.len()).collect::<Vec<_>>();
            order.sort_by(|&i, &j| self.elements[i].cmp(&self.elements[j]));
            self.sorted = Some(order);
        }
        Ok(self.sorted.as_deref().expect("just computed"))
    }

    pub fn sorted_at(&mut self, rank: usize) -> Result<&T> {
        self.sorted()?;
        let bound = self.elements.len();
        let index = *self
            .sorted()?
            .get(rank)
            .ok_or(Error::IndexOutOfBounds {
                found: rank,
                bound,
            })?;
        Ok(&self.elements[index])
    }
}

impl<T: Element + Send + Sync> Run for FroidurePin<T> {
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
            for a in 0..self.gens.len() as Letter {
                if self.right.at(pos as Point, a) != UNDEFINED {
                    continue;
                }
                product.product(&self.elements[pos], &self.gens[a as usize], 0);
                match self.map.get(&product) {
                    Some(&known) => {
                        self.right.set_target(pos as Point, a, known as Point)?;
                        let mut lhs = self.factorisation_unchecked(pos);
                        lhs.push(a);
                        self.rules.push((lhs, self.factorisation_unchecked(known)));
                    }
                    None => {
                        let index = self.elements.len();
                        self.map.insert(product.clone(), index);
                        self.elements.push(product.clone());
                        self.prefix.push(pos);
                        self.first.push(self.first[pos]);
                        self.last.push(a);
                        self.length.push(self.length[pos] + 1);
                        let suffix = if self.length[pos] == 1 {
                            self.letter_to_pos[a as usize]
                        } else {
                            self.right.at(self.suffix[pos] as Point, a) as usize
                        };
                        self.suffix.push(suffix);
                        self.right.add_nodes(1);
                        self.right.set_target(pos as Point, a, index as Point)?;
                    }
                }
            }
            self.pos += 1;
            if report::reporting() && self.pos % 4096 == 0 {
                log::info!(
                    "froidure-pin: {} elements found, {} processed",
                    self.elements.len(),
                    self.pos
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Transf;
    use crate::knuth_bendix::KnuthBendix;
    use crate::Size;
    use std::time::Duration;

    fn example() -> FroidurePin<Transf> {
        FroidurePin::new(vec![
            Transf::from([1, 2, 0, 0]),
            Transf::from([0, 0, 2, 3]),
        ])
        .unwrap()
    }

    fn t5() -> FroidurePin<Transf> {
        FroidurePin::new(vec![
            Transf::from([1, 0, 2, 3, 4]),
            Transf::from([1, 2, 3, 4, 0]),
            Transf::from([0, 0, 2, 3, 4]),
        ])
        .unwrap()
    }

    #[test]
    fn enumerates_the_whole_semigroup() {
        let mut fp = example();
        assert!(fp.size().unwrap() == 25);
        assert!(fp.number_of_idempotents().unwrap() == 11);
        assert!(fp.finished());
    }

    #[test]
    fn full_transformation_monoid_t5() {
        let mut fp = t5();
        assert!(fp.size().unwrap() == 3125);
        assert!(fp.number_of_idempotents().unwrap() == 196);
    }

    #[test]
    fn prefix_suffix_first_last_invariants() {
        let mut fp = example();
        fp.run().unwrap();
        let mut product = fp.at(0).one();
        for i in 0..fp.current_size() {
            let word = fp.factorisation(i).unwrap();
            assert!(word.len() == fp.current_length(i).unwrap());
            assert!(fp.word_to_position(&word).unwrap() == Some(i));
            if word.len() > 1 {
                let prefix = fp.prefix[i];
                let suffix = fp.suffix[i];
                // element = prefix * last letter
                product.product(fp.at(prefix), fp.generator(fp.last[i]), 0);
                assert!(&product == fp.at(i));
                // element = first letter * suffix
                product.product(fp.generator(fp.first[i]), fp.at(suffix), 0);
                assert!(&product == fp.at(i));
            }
        }
    }

    #[test]
    fn recorded_rules_hold_in_the_semigroup() {
        let mut fp = example();
        let rules = fp.rules().unwrap().to_vec();
        assert!(!rules.is_empty());
        for (u, v) in rules {
            let left = fp.word_to_position(&u).unwrap();
            let right = fp.word_to_position(&v).unwrap();
            assert!(left == right);
        }
    }

    #[test]
    fn rules_present_the_semigroup_to_knuth_bendix() {
        let mut fp = example();
        let presentation = fp.presentation().unwrap();
        let mut kb = KnuthBendix::new(presentation).unwrap();
        kb.run().unwrap();
        assert!(kb.confluent());
        assert!(kb.size().unwrap() == Size::Finite(25));
    }

    #[test]
    fn idempotents_square_to_themselves() {
        let mut fp = example();
        let idempotents = fp.idempotents().unwrap().to_vec();
        for i in 0..fp.current_size() {
            let x = fp.at(i).clone();
            let squared = Element::product_of(&x, &x);
            assert!((squared == x) == idempotents.contains(&i));
        }
    }

    #[test]
    fn sorted_view_is_ordered() {
        let mut fp = example();
        let sorted = fp.sorted().unwrap().to_vec();
        assert!(sorted.len() == 25);
        for pair in sorted.windows(2) {
            assert!(fp.at(pair[0]) < fp.at(pair[1]));
        }
        let least = fp.sorted_at(0).unwrap().clone();
        assert!((0..25).all(|i| &least <= fp.at(i)));
    }

    #[test]
    fn left_cayley_agrees_with_left_multiplication() {
        let mut fp = example();
        fp.run().unwrap();
        let pairs = {
            let left = fp.left_cayley().unwrap();
            left.nodes()
                .flat_map(|n| left.neighbors(n).map(move |(a, t)| (n, a, t)))
                .collect::<Vec<_>>()
        };
        assert!(pairs.len() == 2 * 25);
        let mut product = fp.at(0).one();
        for (index, a, target) in pairs {
            product.product(fp.generator(a), fp.at(index as usize), 0);
            assert!(&product == fp.at(target as usize));
        }
    }

    #[test]
    fn resumes_after_a_timeout() {
        let mut fp = t5();
        fp.run_for(Duration::ZERO).unwrap();
        assert!(!fp.finished());
        assert!(fp.timed_out());
        let partial = fp.current_size();
        assert!(partial < 3125);
        assert!(fp.size().unwrap() == 3125);
        assert!(fp.current_size() >= partial);
    }

    #[test]
    fn add_generators_continues_without_restart() {
        let mut fp = FroidurePin::new(vec![Transf::from([1, 2, 0, 0])]).unwrap();
        let alone = fp.size().unwrap();
        assert!(alone < 25);
        fp.add_generators(vec![Transf::from([0, 0, 2, 3])]).unwrap();
        assert!(fp.size().unwrap() == 25);
    }

    #[test]
    fn closure_refuses_known_elements() {
        let mut fp = example();
        fp.run().unwrap();
        let known = fp.at(5).clone();
        fp.closure(vec![known]).unwrap();
        assert!(fp.number_of_generators() == 2);
        assert!(fp.size().unwrap() == 25);
    }

    #[test]
    fn duplicate_generators_share_a_position() {
        let mut fp = FroidurePin::new(vec![
            Transf::from([1, 2, 0, 0]),
            Transf::from([1, 2, 0, 0]),
        ])
        .unwrap();
        assert!(fp.number_of_generators() == 2);
        fp.run().unwrap();
        assert!(fp.word_to_position(&[0]).unwrap() == fp.word_to_position(&[1]).unwrap());
    }

    #[test]
    fn boolean_matrix_monoid() {
        use crate::element::BMat;
        let mut fp = FroidurePin::new(vec![
            BMat::from_rows(vec![vec![false, true], vec![true, false]]).unwrap(),
            BMat::from_rows(vec![vec![true, true], vec![false, true]]).unwrap(),
            BMat::from_rows(vec![vec![true, false], vec![false, false]]).unwrap(),
        ])
        .unwrap();
        // the three generators give every 2 x 2 boolean matrix
        assert!(fp.size().unwrap() == 16);
        assert!(fp.number_of_idempotents().unwrap() == 11);
    }

    #[test]
    fn partition_monoid_of_degree_two() {
        use crate::element::Bipartition;
        let mut fp = FroidurePin::new(vec![
            Bipartition::from(vec![0, 1, 1, 0]),
            Bipartition::from(vec![0, 0, 0, 0]),
            Bipartition::from(vec![0, 1, 0, 2]),
        ])
        .unwrap();
        assert!(fp.size().unwrap() == 15);
    }

    #[test]
    fn tropical_matrices_stay_finite() {
        use crate::element::matrix::MINUS_INFINITY;
        use crate::element::Mat;
        use crate::element::TropicalMaxPlus;
        let s = TropicalMaxPlus { threshold: 3 };
        let r#gen = Mat::from_rows(s, vec![vec![1, 1], vec![MINUS_INFINITY, 1]]).unwrap();
        let mut fp = FroidurePin::new(vec![r#gen]).unwrap();
        // powers saturate at the threshold
        assert!(fp.size().unwrap() == 3);
    }

    #[test]
    fn mixed_degrees_are_rejected() {
        let gens = vec![Transf::from([0, 1]), Transf::from([0, 1, 2])];
        assert!(matches!(
            FroidurePin::new(gens),
            Err(Error::Degree {
                expected: 2,
                found: 3
            })
        ));
    }
}
