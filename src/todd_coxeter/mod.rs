use crate::graph::Forest;
use crate::graph::WordGraph;
use crate::partition::UnionFind;
use crate::presentation::Presentation;
use crate::report;
use crate::runner::Run;
use crate::runner::Runner;
use crate::Error;
use crate::Letter;
use crate::Point;
use crate::Relation;
use crate::Result;
use crate::Size;
use crate::Word;
use crate::UNDEFINED;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Hlt,
    Felsch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookahead {
    Partial,
    Full,
}

/// the word orders available for standardising the coset table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    ShortLex,
    Lex,
    Recursive,
}

/// coset enumeration over a monoid or semigroup presentation, with the
/// congruence optionally coarsened by extra generating pairs. cosets
/// live in a word graph whose rows are completed either eagerly while
/// scanning (HLT) or one forced edge at a time (Felsch); coincidences
/// flow through a union-find and dead cosets are skipped until the
/// final standardisation compacts the table.
pub struct ToddCoxeter {
    runner: Runner,
    presentation: Presentation,
    extra: Vec<Relation>,
    strategy: Strategy,
    lookahead: Lookahead,
    lookahead_interval: usize,
    next_lookahead: usize,
    table: WordGraph,
    uf: UnionFind,
    coincidences: VecDeque<(Point, Point)>,
    deductions: VecDeque<(Point, Letter)>,
    scan_cursor: Point,
    standardized: Option<Order>,
    forest: Forest,
    complete: bool,
}

impl ToddCoxeter {
    pub fn new(presentation: Presentation) -> Self {
        let alphabet = presentation.alphabet();
        Self {
            runner: Runner::new("todd-coxeter"),
            presentation,
            extra: Vec::new(),
            strategy: Strategy::Hlt,
            lookahead: Lookahead::Partial,
            lookahead_interval: 5_000,
            next_lookahead: 5_000,
            table: WordGraph::new(1, alphabet),
            uf: UnionFind::new(1),
            coincidences: VecDeque::new(),
            deductions: VecDeque::new(),
            scan_cursor: 0,
            standardized: None,
            forest: Forest::new(1),
            complete: false,
        }
    }

    pub fn strategy(&mut self, strategy: Strategy) -> &mut Self {
        self.strategy = strategy;
        self
    }

    pub fn lookahead(&mut self, lookahead: Lookahead) -> &mut Self {
        self.lookahead = lookahead;
        self
    }

    pub fn lookahead_interval(&mut self, interval: usize) -> &mut Self {
        self.lookahead_interval = interval.max(1);
        self.next_lookahead = self.table.number_of_nodes() + self.lookahead_interval;
        self
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    /// coarsen the congruence by a generating pair; anything already
    /// deduced remains valid, but the table must be rescanned
    pub fn add_pair(&mut self, u: Word, v: Word) -> Result<()> {
        self.presentation.validate_word(&u)?;
        self.presentation.validate_word(&v)?;
        self.extra.push((u, v));
        self.scan_cursor = 0;
        self.complete = false;
        self.standardized = None;
        Ok(())
    }

    pub fn number_of_generating_pairs(&self) -> usize {
        self.extra.len()
    }

    pub fn current_number_of_cosets(&self) -> usize {
        self.uf.number_of_blocks()
    }

    /// a presentation maps onto an infinite monoid whenever some letter
    /// occurs in no relation at all, and trivially when there are no
    /// relations over a non-empty alphabet
    pub fn is_obviously_infinite(&self) -> bool {
        let alphabet = self.presentation.alphabet();
        if alphabet == 0 {
            return false;
        }
        let mut used = vec![false; alphabet];
        for (u, v) in self.presentation.rules().iter().chain(self.extra.iter()) {
            for &a in u.iter().chain(v.iter()) {
                used[a as usize] = true;
            }
        }
        used.iter().any(|&u| !u)
    }

    // coset plumbing

    fn new_coset(&mut self) -> Point {
        let coset = self.table.number_of_nodes() as Point;
        self.table.add_nodes(1);
        self.uf.grow(1);
        coset
    }

    fn cell(&self, coset: Point, a: Letter) -> Point {
        self.table.at(coset, a)
    }

    /// follow `word`, defining fresh cosets at missing edges when asked;
    /// resolves forwarding on the way and returns the live endpoint
    fn trace(&mut self, coset: Point, word: &[Letter], define: bool) -> Result<Option<Point>> {
        let mut cursor = self.uf.find(coset);
        for &a in word {
            let target = match self.cell(cursor, a) {
                UNDEFINED if define => {
                    let fresh = self.new_coset();
                    self.table.set_target(cursor, a, fresh)?;
                    self.deductions.push_back((cursor, a));
                    fresh
                }
                UNDEFINED => return Ok(None),
                t => t,
            };
            cursor = self.uf.find(target);
        }
        Ok(Some(cursor))
    }

    /// apply one relation at one coset. with `define` this is the HLT
    /// step; without it only coincidences and forced last edges arise,
    /// which is the Felsch and lookahead step.
    fn scan(&mut self, coset: Point, u: &[Letter], v: &[Letter], define: bool) -> Result<()> {
        if define {
            let eu = self.trace(coset, u, true)?.expect("defining trace completes");
            let ev = self.trace(coset, v, true)?.expect("defining trace completes");
            if eu != ev {
                self.coincidences.push_back((eu, ev));
            }
            return Ok(());
        }
        let eu = self.partial_trace(coset, u)?;
        let ev = self.partial_trace(coset, v)?;
        match (eu, ev) {
            (Trace::Complete(a), Trace::Complete(b)) => {
                if a != b {
                    self.coincidences.push_back((a, b));
                }
            }
            (Trace::Complete(end), Trace::LastMissing(at, a))
            | (Trace::LastMissing(at, a), Trace::Complete(end)) => {
                self.table.set_target(at, a, end)?;
                self.deductions.push_back((at, a));
            }
            _ => {}
        }
        Ok(())
    }

    fn partial_trace(&mut self, coset: Point, word: &[Letter]) -> Result<Trace> {
        let mut cursor = self.uf.find(coset);
        for (i, &a) in word.iter().enumerate() {
            match self.cell(cursor, a) {
                UNDEFINED if i + 1 == word.len() => return Ok(Trace::LastMissing(cursor, a)),
                UNDEFINED => return Ok(Trace::Incomplete),
                t => cursor = self.uf.find(t),
            }
        }
        Ok(Trace::Complete(cursor))
    }

    /// drain the coincidence queue, merging rows into the surviving
    /// coset and queueing the clashes that merging uncovers
    fn process_coincidences(&mut self) -> Result<()> {
        let alphabet = self.table.out_degree() as Letter;
        while let Some((a, b)) = self.coincidences.pop_front() {
            let a = self.uf.find(a);
            let b = self.uf.find(b);
            if a == b {
                continue;
            }
            self.uf.unite(a, b);
            let keep = self.uf.find(a);
            let gone = if keep == a { b } else { a };
            for x in 0..alphabet {
                let from_gone = self.cell(gone, x);
                if from_gone == UNDEFINED {
                    continue;
                }
                match self.cell(keep, x) {
                    UNDEFINED => self.table.set_target(keep, x, from_gone)?,
                    from_keep => self.coincidences.push_back((from_keep, from_gone)),
                }
            }
        }
        Ok(())
    }

    fn live_cosets(&self) -> Vec<Point> {
        self.uf.representatives().collect()
    }

    /// one no-define pass over the live cosets at or after `from`
    fn lookahead_pass(&mut self, from: Point) -> Result<()> {
        let relations = self.all_relations();
        for coset in self.live_cosets() {
            if coset < from {
                continue;
            }
            for (u, v) in relations.iter() {
                if self.uf.find(coset) != coset {
                    break;
                }
                self.scan(coset, u, v, false)?;
                self.process_coincidences()?;
            }
        }
        Ok(())
    }

    fn all_relations(&self) -> Vec<Relation> {
        self.presentation
            .rules()
            .iter()
            .chain(self.extra.iter())
            .cloned()
            .collect()
    }

    fn run_hlt(&mut self) -> Result<()> {
        let relations = self.all_relations();
        let alphabet = self.table.out_degree() as Letter;
        while (self.scan_cursor as usize) < self.table.number_of_nodes() {
            if self.runner.stopped() {
                return Ok(());
            }
            let coset = self.scan_cursor;
            if self.uf.root(coset) != coset {
                self.scan_cursor += 1;
                continue;
            }
            for (u, v) in relations.iter() {
                self.scan(coset, u, v, true)?;
                self.process_coincidences()?;
                if self.uf.find(coset) != coset {
                    break;
                }
            }
            // a monoid coset has an image under every letter: complete
            // the row so the table closes
            if self.uf.find(coset) == coset {
                for a in 0..alphabet {
                    if self.cell(coset, a) == UNDEFINED {
                        let fresh = self.new_coset();
                        self.table.set_target(coset, a, fresh)?;
                    }
                }
            }
            self.scan_cursor += 1;
            // HLT propagates through scans, not through the deduction
            // queue; keep it from accumulating
            self.deductions.clear();
            if self.table.number_of_nodes() >= self.next_lookahead {
                let from = match self.lookahead {
                    Lookahead::Full => 0,
                    Lookahead::Partial => self.scan_cursor,
                };
                if report::reporting() {
                    log::info!(
                        "todd-coxeter: lookahead at {} cosets ({} live)",
                        self.table.number_of_nodes(),
                        self.current_number_of_cosets()
                    );
                }
                self.lookahead_pass(from)?;
                self.next_lookahead = self.table.number_of_nodes() + self.lookahead_interval;
            }
        }
        // closing verification: rescan everything until a whole pass
        // neither merges a coset nor fills an edge
        loop {
            let blocks = self.current_number_of_cosets();
            let edges = self.table.number_of_edges();
            self.lookahead_pass(0)?;
            if self.current_number_of_cosets() == blocks
                && self.table.number_of_edges() == edges
            {
                break;
            }
        }
        self.complete = true;
        Ok(())
    }

    fn run_felsch(&mut self) -> Result<()> {
        let relations = self.all_relations();
        loop {
            // propagate every consequence of the current definitions:
            // repeat no-define passes until one neither merges a coset
            // nor fills a forced edge
            loop {
                let blocks = self.current_number_of_cosets();
                let edges = self.table.number_of_edges();
                self.deductions.clear();
                for coset in self.live_cosets() {
                    for (u, v) in relations.iter() {
                        if self.uf.find(coset) != coset {
                            break;
                        }
                        self.scan(coset, u, v, false)?;
                        self.process_coincidences()?;
                    }
                }
                if self.current_number_of_cosets() == blocks
                    && self.table.number_of_edges() == edges
                    && self.deductions.is_empty()
                {
                    break;
                }
            }
            if self.runner.stopped() {
                return Ok(());
            }
            // define the first missing edge, preferring space over speed
            let mut defined = false;
            'hunt: for coset in self.live_cosets() {
                for a in 0..self.table.out_degree() as Letter {
                    if self.cell(coset, a) == UNDEFINED {
                        let fresh = self.new_coset();
                        self.table.set_target(coset, a, fresh)?;
                        self.deductions.push_back((coset, a));
                        defined = true;
                        break 'hunt;
                    }
                }
            }
            if !defined {
                self.complete = true;
                return Ok(());
            }
        }
    }

    // public queries

    pub fn number_of_classes(&mut self) -> Result<Size> {
        if self.is_obviously_infinite() {
            return Ok(Size::Infinite);
        }
        self.run()?;
        Ok(Size::Finite(
            self.current_number_of_cosets() - self.class_offset(),
        ))
    }

    // the root coset is the empty word; it only counts as a class when
    // the presented object contains it or some non-empty word reaches it
    fn class_offset(&self) -> usize {
        if self.presentation.contains_empty_word() {
            return 0;
        }
        let root = self.uf.root(0);
        let reachable = self
            .live_cosets()
            .into_iter()
            .any(|c| (0..self.table.out_degree() as Letter).any(|a| self.resolved(c, a) == root));
        if reachable { 0 } else { 1 }
    }

    /// relabel the cosets so traversal follows the given word order,
    /// compacting dead cosets away and building the normal form forest
    pub fn standardize(&mut self, order: Order) -> Result<()> {
        self.run()?;
        if self.standardized == Some(order) {
            return Ok(());
        }
        let alphabet = self.table.out_degree();
        let live = self.live_cosets();
        let count = live.len();
        let mut numbering = vec![UNDEFINED; self.table.number_of_nodes()];
        let root = self.uf.root(0);
        let mut order_of_visit = Vec::with_capacity(count);
        numbering[root as usize] = 0;
        order_of_visit.push(root);
        match order {
            Order::ShortLex => {
                let mut queue = VecDeque::from([root]);
                while let Some(coset) = queue.pop_front() {
                    for a in 0..alphabet as Letter {
                        let target = self.resolved(coset, a);
                        if target != UNDEFINED && numbering[target as usize] == UNDEFINED {
                            numbering[target as usize] = order_of_visit.len() as Point;
                            order_of_visit.push(target);
                            queue.push_back(target);
                        }
                    }
                }
            }
            Order::Lex | Order::Recursive => {
                let mut stack = vec![(root, 0 as Letter)];
                while let Some((coset, cursor)) = stack.last().copied() {
                    if cursor as usize >= alphabet {
                        stack.pop();
                        continue;
                    }
                    stack.last_mut().expect("stack is non-empty").1 = cursor + 1;
                    let a = match order {
                        Order::Lex => cursor,
                        _ => (alphabet as Letter - 1) - cursor,
                    };
                    let target = self.resolved(coset, a);
                    if target != UNDEFINED && numbering[target as usize] == UNDEFINED {
                        numbering[target as usize] = order_of_visit.len() as Point;
                        order_of_visit.push(target);
                        stack.push((target, 0));
                    }
                }
            }
        }
        let mut table = WordGraph::new(count, alphabet);
        let mut forest = Forest::new(count);
        for (new, &old) in order_of_visit.iter().enumerate() {
            for a in 0..alphabet as Letter {
                let target = self.resolved(old, a);
                if target != UNDEFINED {
                    let target = numbering[target as usize];
                    table.set_target(new as Point, a, target)?;
                    if target != 0 && forest.is_root(target) && target > new as Point {
                        forest.set(target, new as Point, a);
                    }
                }
            }
        }
        self.table = table;
        self.uf = UnionFind::new(count);
        self.scan_cursor = count as Point;
        self.forest = forest;
        self.standardized = Some(order);
        Ok(())
    }

    fn resolved(&self, coset: Point, a: Letter) -> Point {
        match self.cell(coset, a) {
            UNDEFINED => UNDEFINED,
            t => self.uf.root(t),
        }
    }

    /// the coset index of the class containing `word`
    pub fn class_index_of(&mut self, word: &[Letter]) -> Result<usize> {
        self.presentation.validate_word(word)?;
        self.run()?;
        if self.standardized.is_none() {
            self.standardize(Order::ShortLex)?;
        }
        let coset = self
            .table
            .follow(0, word)
            .expect("a closed table is complete");
        Ok(coset as usize - self.class_offset())
    }

    /// the normal form of class `index` under the standardisation order
    pub fn word_of(&mut self, index: usize) -> Result<Word> {
        self.run()?;
        if self.standardized.is_none() {
            self.standardize(Order::ShortLex)?;
        }
        let coset = index + self.class_offset();
        if coset >= self.table.number_of_nodes() {
            return Err(Error::IndexOutOfBounds {
                found: index,
                bound: self.table.number_of_nodes() - self.class_offset(),
            });
        }
        Ok(self.forest.path_from_root(coset as Point))
    }

    /// group the classes of `other` by the classes of this coarser
    /// enumeration, returning only the cells that merge something
    pub fn non_trivial_classes(&mut self, other: &mut ToddCoxeter) -> Result<Vec<Vec<usize>>> {
        let Size::Finite(classes) = other.number_of_classes()? else {
            return Err(Error::NotFinished);
        };
        let Size::Finite(own) = self.number_of_classes()? else {
            return Err(Error::NotFinished);
        };
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); own];
        for k in 0..classes {
            let word = other.word_of(k)?;
            let mine = self.class_index_of(&word)?;
            buckets[mine].push(k);
        }
        Ok(buckets.into_iter().filter(|b| b.len() > 1).collect())
    }
}

enum Trace {
    Complete(Point),
    LastMissing(Point, Letter),
    Incomplete,
}

impl Run for ToddCoxeter {
    fn runner(&self) -> &Runner {
        &self.runner
    }

    fn runner_mut(&mut self) -> &mut Runner {
        &mut self.runner
    }

    fn finished_impl(&self) -> bool {
        self.complete
    }

    fn run_impl(&mut self) -> Result<()> {
        match self.strategy {
            Strategy::Hlt => self.run_hlt(),
            Strategy::Felsch => self.run_felsch(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn klein_four() -> Presentation {
        let mut p = Presentation::new(2);
        p.set_contains_empty_word(true);
        p.add_rule(vec![0, 0], vec![]).unwrap();
        p.add_rule(vec![1, 1], vec![]).unwrap();
        p.add_rule(vec![0, 1, 0, 1], vec![]).unwrap();
        p
    }

    #[test]
    fn klein_four_has_four_classes() {
        let mut tc = ToddCoxeter::new(klein_four());
        assert!(tc.number_of_classes().unwrap() == Size::Finite(4));
    }

    #[test]
    fn felsch_agrees_with_hlt() {
        let mut hlt = ToddCoxeter::new(klein_four());
        let mut felsch = ToddCoxeter::new(klein_four());
        felsch.strategy(Strategy::Felsch);
        assert!(hlt.number_of_classes().unwrap() == felsch.number_of_classes().unwrap());
    }

    #[test]
    fn class_indices_round_trip() {
        let mut tc = ToddCoxeter::new(klein_four());
        tc.run().unwrap();
        for k in 0..4 {
            let word = tc.word_of(k).unwrap();
            assert!(tc.class_index_of(&word).unwrap() == k);
        }
        // ab and ba fall together, a and b do not
        assert!(
            tc.class_index_of(&[0, 1]).unwrap() == tc.class_index_of(&[1, 0]).unwrap()
        );
        assert!(tc.class_index_of(&[0]).unwrap() != tc.class_index_of(&[1]).unwrap());
    }

    #[test]
    fn shortlex_normal_forms() {
        let mut tc = ToddCoxeter::new(klein_four());
        tc.standardize(Order::ShortLex).unwrap();
        assert!(tc.word_of(0).unwrap().is_empty());
        assert!(tc.word_of(1).unwrap() == vec![0]);
        assert!(tc.word_of(2).unwrap() == vec![1]);
        assert!(tc.word_of(3).unwrap() == vec![0, 1]);
    }

    #[test]
    fn standardisation_orders_relabel_consistently() {
        for order in [Order::ShortLex, Order::Lex, Order::Recursive] {
            let mut tc = ToddCoxeter::new(klein_four());
            tc.standardize(order).unwrap();
            assert!(tc.number_of_classes().unwrap() == Size::Finite(4));
            for k in 0..4 {
                let word = tc.word_of(k).unwrap();
                assert!(tc.class_index_of(&word).unwrap() == k);
            }
        }
    }

    #[test]
    fn generating_pairs_coarsen() {
        let mut coarse = ToddCoxeter::new(klein_four());
        coarse.add_pair(vec![0], vec![1]).unwrap();
        // identifying the two generators quotients onto C2
        assert!(coarse.number_of_classes().unwrap() == Size::Finite(2));
        let mut fine = ToddCoxeter::new(klein_four());
        let classes = coarse.non_trivial_classes(&mut fine).unwrap();
        assert!(classes.len() == 2);
        assert!(classes.iter().all(|c| c.len() == 2));
    }

    #[test]
    fn free_presentations_are_obviously_infinite() {
        let mut tc = ToddCoxeter::new(Presentation::new(2));
        assert!(tc.is_obviously_infinite());
        assert!(tc.number_of_classes().unwrap() == Size::Infinite);
        let mut p = Presentation::new(2);
        p.add_rule(vec![0, 0], vec![0]).unwrap();
        let tc = ToddCoxeter::new(p);
        // letter 1 appears in no relation
        assert!(tc.is_obviously_infinite());
    }

    #[test]
    fn timeouts_leave_a_partial_table() {
        let mut tc = ToddCoxeter::new(klein_four());
        tc.run_for(std::time::Duration::ZERO).unwrap();
        assert!(!tc.finished());
        assert!(tc.timed_out());
        // resumes and completes
        assert!(tc.number_of_classes().unwrap() == Size::Finite(4));
    }

    #[test]
    fn counts_a_semigroup_presented_by_enumeration() {
        use crate::element::Transf;
        use crate::froidure_pin::FroidurePin;
        let mut fp = FroidurePin::new(vec![
            Transf::from([1, 2, 0, 0]),
            Transf::from([0, 0, 2, 3]),
        ])
        .unwrap();
        let mut tc = ToddCoxeter::new(fp.presentation().unwrap());
        assert!(tc.number_of_classes().unwrap() == Size::Finite(25));
        // both sides of every defining relation land in one class
        for (u, v) in fp.rules().unwrap().to_vec() {
            assert!(tc.class_index_of(&u).unwrap() == tc.class_index_of(&v).unwrap());
        }
    }

    #[test]
    fn semigroup_counting_excludes_the_empty_coset() {
        // the two-element left zero semigroup: aa = a, bb = b, ab = a, ba = b
        let mut p = Presentation::new(2);
        p.add_rule(vec![0, 0], vec![0]).unwrap();
        p.add_rule(vec![1, 1], vec![1]).unwrap();
        p.add_rule(vec![0, 1], vec![0]).unwrap();
        p.add_rule(vec![1, 0], vec![1]).unwrap();
        let mut tc = ToddCoxeter::new(p);
        assert!(tc.number_of_classes().unwrap() == Size::Finite(2));
        assert!(tc.class_index_of(&[0, 1, 0, 1]).unwrap() == tc.class_index_of(&[0]).unwrap());
    }
}
