use super::scc::Scc;
use crate::Error;
use crate::Letter;
use crate::Point;
use crate::Result;
use crate::Word;
use crate::UNDEFINED;

/// a digraph with labelled out-edges: a row-major nodes-by-labels matrix
/// of targets, UNDEFINED where no edge exists. nodes are added at the
/// end, the out-degree can grow, and the only way to shrink is to
/// truncate or quotient. derived artifacts (strongly connected
/// components and their spanning forest) are cached and thrown away on
/// any mutation.
#[derive(Debug, Clone)]
pub struct WordGraph {
    nr_nodes: usize,
    out_degree: usize,
    targets: Vec<Point>,
    scc: Option<Scc>,
}

impl PartialEq for WordGraph {
    fn eq(&self, that: &Self) -> bool {
        self.nr_nodes == that.nr_nodes
            && self.out_degree == that.out_degree
            && self.targets == that.targets
    }
}

impl Eq for WordGraph {}

impl WordGraph {
    pub fn new(nr_nodes: usize, out_degree: usize) -> Self {
        Self {
            nr_nodes,
            out_degree,
            targets: vec![UNDEFINED; nr_nodes * out_degree],
            scc: None,
        }
    }

    pub fn number_of_nodes(&self) -> usize {
        self.nr_nodes
    }

    pub fn out_degree(&self) -> usize {
        self.out_degree
    }

    pub fn number_of_edges(&self) -> usize {
        self.targets.iter().filter(|&&t| t != UNDEFINED).count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = Point> + use<> {
        0..self.nr_nodes as Point
    }

    fn check_node(&self, node: Point) -> Result<()> {
        if (node as usize) < self.nr_nodes {
            Ok(())
        } else {
            Err(Error::NodeOutOfBounds {
                found: node,
                bound: self.nr_nodes,
            })
        }
    }

    fn check_label(&self, label: Letter) -> Result<()> {
        if (label as usize) < self.out_degree {
            Ok(())
        } else {
            Err(Error::LabelOutOfBounds {
                found: label,
                bound: self.out_degree,
            })
        }
    }

    pub fn reserve(&mut self, nodes: usize, out_degree: usize) {
        let want = nodes * out_degree.max(self.out_degree);
        if want > self.targets.capacity() {
            self.targets.reserve(want - self.targets.len());
        }
    }

    pub fn add_nodes(&mut self, k: usize) {
        self.nr_nodes += k;
        self.targets.resize(self.nr_nodes * self.out_degree, UNDEFINED);
        self.scc = None;
    }

    /// widen every row by k labels, preserving existing edges
    pub fn add_to_out_degree(&mut self, k: usize) {
        if k == 0 {
            return;
        }
        let old = self.out_degree;
        let new = old + k;
        let mut targets = vec![UNDEFINED; self.nr_nodes * new];
        for node in 0..self.nr_nodes {
            targets[node * new..node * new + old]
                .copy_from_slice(&self.targets[node * old..(node + 1) * old]);
        }
        self.out_degree = new;
        self.targets = targets;
        self.scc = None;
    }

    pub fn set_target(&mut self, node: Point, label: Letter, target: Point) -> Result<()> {
        self.check_node(node)?;
        self.check_label(label)?;
        self.check_node(target)?;
        self.targets[node as usize * self.out_degree + label as usize] = target;
        self.scc = None;
        Ok(())
    }

    pub fn target(&self, node: Point, label: Letter) -> Result<Point> {
        self.check_node(node)?;
        self.check_label(label)?;
        Ok(self.at(node, label))
    }

    /// unchecked lookup for the hot paths of the engines that own the graph
    pub(crate) fn at(&self, node: Point, label: Letter) -> Point {
        debug_assert!((node as usize) < self.nr_nodes, "node {} out of range", node);
        debug_assert!(
            (label as usize) < self.out_degree,
            "label {} out of range",
            label
        );
        self.targets[node as usize * self.out_degree + label as usize]
    }

    /// the first defined edge at `node` with label at or after `label`
    pub fn next_neighbor(&self, node: Point, label: Letter) -> Option<(Letter, Point)> {
        (label..self.out_degree as Letter)
            .map(|a| (a, self.at(node, a)))
            .find(|&(_, t)| t != UNDEFINED)
    }

    pub fn neighbors(&self, node: Point) -> impl Iterator<Item = (Letter, Point)> + '_ {
        (0..self.out_degree as Letter)
            .map(move |a| (a, self.at(node, a)))
            .filter(|&(_, t)| t != UNDEFINED)
    }

    pub fn remove_edge(&mut self, node: Point, label: Letter) -> Result<()> {
        self.check_node(node)?;
        self.check_label(label)?;
        self.targets[node as usize * self.out_degree + label as usize] = UNDEFINED;
        self.scc = None;
        Ok(())
    }

    /// exchange the `label` edges of two nodes
    pub fn swap_edges(&mut self, m: Point, n: Point, label: Letter) -> Result<()> {
        self.check_node(m)?;
        self.check_node(n)?;
        self.check_label(label)?;
        let d = self.out_degree;
        self.targets
            .swap(m as usize * d + label as usize, n as usize * d + label as usize);
        self.scc = None;
        Ok(())
    }

    /// truncate to the first k nodes; the caller must have arranged that
    /// no surviving edge points past the cut
    pub fn restrict(&mut self, k: usize) {
        debug_assert!(
            self.targets[..k * self.out_degree]
                .iter()
                .all(|&t| t == UNDEFINED || (t as usize) < k),
            "restrict would leave a dangling edge"
        );
        self.nr_nodes = k;
        self.targets.truncate(k * self.out_degree);
        self.scc = None;
    }

    pub fn is_complete(&self) -> bool {
        self.targets.iter().all(|&t| t != UNDEFINED)
    }

    /// a graph with every edge defined uniformly at random
    pub fn random<R: rand::Rng>(nr_nodes: usize, out_degree: usize, rng: &mut R) -> Self {
        let mut graph = Self::new(nr_nodes, out_degree);
        for i in 0..graph.targets.len() {
            graph.targets[i] = rng.gen_range(0..nr_nodes as Point);
        }
        graph
    }

    // strongly connected components, cached until the next mutation

    pub fn sccs(&mut self) -> &Scc {
        if self.scc.is_none() {
            self.scc = Some(Scc::compute(self));
        }
        self.scc.as_ref().expect("just computed")
    }

    pub fn scc_id(&mut self, node: Point) -> u32 {
        self.sccs().id(node)
    }

    pub fn number_of_sccs(&mut self) -> usize {
        self.sccs().count()
    }

    /// labels spelling a path from `node` to the root of its component
    /// in the spanning forest of the components
    pub fn path_to_scc_root(&mut self, node: Point) -> Word {
        self.sccs().forest().path_to_root(node)
    }

    // traversals that need no cache

    /// three-colour depth first search over every node
    pub fn is_acyclic(&self) -> bool {
        let mut colour = vec![0u8; self.nr_nodes];
        (0..self.nr_nodes as Point).all(|n| colour[n as usize] != 0 || self.dfs_acyclic(n, &mut colour))
    }

    pub fn is_acyclic_from(&self, source: Point) -> bool {
        let mut colour = vec![0u8; self.nr_nodes];
        self.dfs_acyclic(source, &mut colour)
    }

    fn dfs_acyclic(&self, source: Point, colour: &mut [u8]) -> bool {
        // 0 unvisited, 1 on the current path, 2 done
        let mut stack = vec![(source, 0 as Letter)];
        colour[source as usize] = 1;
        while let Some((node, label)) = stack.last().copied() {
            match self.next_neighbor(node, label) {
                None => {
                    colour[node as usize] = 2;
                    stack.pop();
                }
                Some((a, target)) => {
                    stack.last_mut().expect("stack is non-empty").1 = a + 1;
                    match colour[target as usize] {
                        1 => return false,
                        2 => {}
                        _ => {
                            colour[target as usize] = 1;
                            stack.push((target, 0));
                        }
                    }
                }
            }
        }
        true
    }

    pub fn is_reachable(&self, from: Point, to: Point) -> bool {
        if from == to {
            return true;
        }
        let mut seen = vec![false; self.nr_nodes];
        let mut stack = vec![from];
        seen[from as usize] = true;
        while let Some(node) = stack.pop() {
            for (_, target) in self.neighbors(node) {
                if target == to {
                    return true;
                }
                if !seen[target as usize] {
                    seen[target as usize] = true;
                    stack.push(target);
                }
            }
        }
        false
    }

    /// follow `word` from `node`; None as soon as an edge is missing
    pub fn follow(&self, node: Point, word: &[Letter]) -> Option<Point> {
        let mut node = node;
        for &a in word {
            match self.at(node, a) {
                UNDEFINED => return None,
                next => node = next,
            }
        }
        Some(node)
    }
}
