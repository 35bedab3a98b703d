use crate::graph::WordGraph;
use crate::Letter;
use crate::Point;
use std::collections::HashMap;
use std::hash::Hash;

/// breadth first orbit of a set of seed values under the action of the
/// generators, with the action recorded as a word graph over one label
/// per generator
pub struct Orbit<V> {
    values: Vec<V>,
    map: HashMap<V, usize>,
    graph: WordGraph,
    cursor: usize,
}

impl<V: Clone + Eq + Hash> Orbit<V> {
    pub fn new(generators: usize) -> Self {
        let mut graph = WordGraph::new(0, 0);
        graph.add_to_out_degree(generators);
        Self {
            values: Vec::new(),
            map: HashMap::new(),
            graph,
            cursor: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn seed(&mut self, value: V) -> usize {
        match self.map.get(&value) {
            Some(&at) => at,
            None => {
                let at = self.values.len();
                self.map.insert(value.clone(), at);
                self.values.push(value);
                self.graph.add_nodes(1);
                at
            }
        }
    }

    /// enumerate to closure under the action
    pub fn close<F>(&mut self, mut act: F)
    where
        F: FnMut(&V, Letter) -> V,
    {
        while self.cursor < self.values.len() {
            let at = self.cursor;
            for a in 0..self.graph.out_degree() as Letter {
                let image = act(&self.values[at], a);
                let target = self.seed(image);
                self.graph
                    .set_target(at as Point, a, target as Point)
                    .expect("orbit nodes track values");
            }
            self.cursor += 1;
        }
    }

    pub fn position(&self, value: &V) -> Option<usize> {
        self.map.get(value).copied()
    }

    pub fn value(&self, at: usize) -> &V {
        &self.values[at]
    }

    pub fn graph_mut(&mut self) -> &mut WordGraph {
        &mut self.graph
    }
}
