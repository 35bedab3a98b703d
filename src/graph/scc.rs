use super::forest::Forest;
use super::wordgraph::WordGraph;
use crate::Letter;
use crate::Point;
use crate::UNDEFINED;

/// strongly connected components of a word graph, computed by an
/// iterative Tarjan walk. components are numbered in the order Tarjan
/// emits them, which is reverse topological: every edge leaving a
/// component lands in one with a smaller id. alongside the components a
/// spanning forest is kept in which every node records a forward path to
/// the first-discovered node of its component.
#[derive(Debug, Clone)]
pub struct Scc {
    ids: Vec<u32>,
    comps: Vec<Vec<Point>>,
    forest: Forest,
}

impl Scc {
    pub fn compute(graph: &WordGraph) -> Self {
        let n = graph.number_of_nodes();
        let mut index = vec![UNDEFINED; n];
        let mut low = vec![0u32; n];
        let mut on_stack = vec![false; n];
        let mut stack: Vec<Point> = Vec::new();
        let mut ids = vec![0u32; n];
        let mut comps: Vec<Vec<Point>> = Vec::new();
        let mut counter = 0u32;
        for start in 0..n as Point {
            if index[start as usize] != UNDEFINED {
                continue;
            }
            let mut frames: Vec<(Point, Letter)> = vec![(start, 0)];
            index[start as usize] = counter;
            low[start as usize] = counter;
            counter += 1;
            stack.push(start);
            on_stack[start as usize] = true;
            while let Some((node, label)) = frames.last().copied() {
                match graph.next_neighbor(node, label) {
                    Some((a, target)) => {
                        frames.last_mut().expect("frames are non-empty").1 = a + 1;
                        if index[target as usize] == UNDEFINED {
                            index[target as usize] = counter;
                            low[target as usize] = counter;
                            counter += 1;
                            stack.push(target);
                            on_stack[target as usize] = true;
                            frames.push((target, 0));
                        } else if on_stack[target as usize] {
                            low[node as usize] = low[node as usize].min(index[target as usize]);
                        }
                    }
                    None => {
                        frames.pop();
                        if let Some(&(parent, _)) = frames.last() {
                            low[parent as usize] = low[parent as usize].min(low[node as usize]);
                        }
                        if low[node as usize] == index[node as usize] {
                            let mut comp = Vec::new();
                            loop {
                                let member = stack.pop().expect("tarjan stack is non-empty");
                                on_stack[member as usize] = false;
                                ids[member as usize] = comps.len() as u32;
                                comp.push(member);
                                if member == node {
                                    break;
                                }
                            }
                            comp.reverse();
                            comps.push(comp);
                        }
                    }
                }
            }
        }
        let forest = Self::spanning_forest(graph, &ids, &comps);
        Self { ids, comps, forest }
    }

    // breadth first from each component root over the reversed edges
    // that stay inside the component
    fn spanning_forest(graph: &WordGraph, ids: &[u32], comps: &[Vec<Point>]) -> Forest {
        let n = graph.number_of_nodes();
        let mut incoming: Vec<Vec<(Point, Letter)>> = vec![Vec::new(); n];
        for node in graph.nodes() {
            for (a, target) in graph.neighbors(node) {
                if ids[node as usize] == ids[target as usize] {
                    incoming[target as usize].push((node, a));
                }
            }
        }
        let mut forest = Forest::new(n);
        let mut seen = vec![false; n];
        let mut queue = std::collections::VecDeque::new();
        for comp in comps {
            let root = comp[0];
            seen[root as usize] = true;
            queue.push_back(root);
            while let Some(node) = queue.pop_front() {
                for &(source, label) in incoming[node as usize].iter() {
                    if !seen[source as usize] {
                        seen[source as usize] = true;
                        forest.set(source, node, label);
                        queue.push_back(source);
                    }
                }
            }
        }
        forest
    }

    pub fn id(&self, node: Point) -> u32 {
        self.ids[node as usize]
    }

    pub fn count(&self) -> usize {
        self.comps.len()
    }

    pub fn components(&self) -> &[Vec<Point>] {
        &self.comps
    }

    /// the first-discovered node of the component of `node`
    pub fn root_of(&self, node: Point) -> Point {
        self.comps[self.ids[node as usize] as usize][0]
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }
}
