use super::wordgraph::WordGraph;
use crate::Letter;
use crate::Point;
use crate::Size;
use crate::Word;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOrder {
    ShortLex,
    Lex,
}

/// lazy enumeration of the paths leaving a source node, yielded as
/// (word, final node) pairs with lengths in [min, max). lex order walks
/// the graph depth first with prefixes before their extensions; shortlex
/// walks it breadth first.
pub struct Paths<'g> {
    graph: &'g WordGraph,
    order: PathOrder,
    source: Point,
    min: usize,
    max: usize,
    started: bool,
    // lex state
    stack: Vec<(Point, Letter)>,
    word: Word,
    // shortlex state
    queue: VecDeque<(Word, Point)>,
}

impl WordGraph {
    pub fn paths(&self, source: Point, order: PathOrder, min: usize, max: usize) -> Paths<'_> {
        Paths {
            graph: self,
            order,
            source,
            min,
            max,
            started: false,
            stack: Vec::new(),
            word: Word::new(),
            queue: VecDeque::new(),
        }
    }

    /// how many paths of any length leave `source`, the empty path
    /// included; infinite exactly when a cycle is reachable
    pub fn number_of_paths(&self, source: Point) -> Size {
        if !self.is_acyclic_from(source) {
            return Size::Infinite;
        }
        // reachable nodes in depth first finish order
        let mut finish: Vec<Point> = Vec::new();
        let mut seen = vec![false; self.number_of_nodes()];
        let mut stack = vec![(source, 0 as Letter)];
        seen[source as usize] = true;
        while let Some((node, label)) = stack.last().copied() {
            match self.next_neighbor(node, label) {
                None => {
                    finish.push(node);
                    stack.pop();
                }
                Some((a, target)) => {
                    stack.last_mut().expect("stack is non-empty").1 = a + 1;
                    if !seen[target as usize] {
                        seen[target as usize] = true;
                        stack.push((target, 0));
                    }
                }
            }
        }
        // children finish before parents, so one pass suffices
        let mut count = vec![0usize; self.number_of_nodes()];
        for &node in finish.iter() {
            let mut total = 1usize;
            for (_, target) in self.neighbors(node) {
                total = total.saturating_add(count[target as usize]);
            }
            count[node as usize] = total;
        }
        Size::Finite(count[source as usize])
    }
}

impl Iterator for Paths<'_> {
    type Item = (Word, Point);

    fn next(&mut self) -> Option<Self::Item> {
        match self.order {
            PathOrder::Lex => self.next_lex(),
            PathOrder::ShortLex => self.next_shortlex(),
        }
    }
}

impl Paths<'_> {
    fn next_lex(&mut self) -> Option<(Word, Point)> {
        if !self.started {
            self.started = true;
            self.stack.push((self.source, 0));
            if self.min == 0 && self.max > 0 {
                return Some((Word::new(), self.source));
            }
        }
        loop {
            let (node, cursor) = self.stack.last().copied()?;
            let next = if self.word.len() + 1 < self.max {
                self.graph.next_neighbor(node, cursor)
            } else {
                None
            };
            match next {
                Some((a, target)) => {
                    self.stack.last_mut().expect("stack is non-empty").1 = a + 1;
                    self.stack.push((target, 0));
                    self.word.push(a);
                    if self.word.len() >= self.min {
                        return Some((self.word.clone(), target));
                    }
                }
                None => {
                    self.stack.pop();
                    self.word.pop();
                }
            }
        }
    }

    fn next_shortlex(&mut self) -> Option<(Word, Point)> {
        if !self.started {
            self.started = true;
            if self.max > 0 {
                self.queue.push_back((Word::new(), self.source));
            }
        }
        while let Some((word, node)) = self.queue.pop_front() {
            if word.len() + 1 < self.max {
                for (a, target) in self.graph.neighbors(node) {
                    let mut next = word.clone();
                    next.push(a);
                    self.queue.push_back((next, target));
                }
            }
            if word.len() >= self.min {
                return Some((word, node));
            }
        }
        None
    }
}
