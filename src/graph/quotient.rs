use super::wordgraph::WordGraph;
use crate::partition::UnionFind;
use crate::Error;
use crate::Point;
use crate::Result;
use crate::UNDEFINED;
use std::collections::VecDeque;

/// the coarsest congruence on the disjoint union of two rooted word
/// graphs that identifies the roots: whenever two identified nodes both
/// carry an edge with the same label, the targets are identified too.
/// nodes of `x` keep their ids, nodes of `y` are shifted up by
/// `x.number_of_nodes()`.
pub fn congruence(
    x: &WordGraph,
    x_root: Point,
    y: &WordGraph,
    y_root: Point,
) -> Result<UnionFind> {
    if x.out_degree() != y.out_degree() {
        return Err(Error::LabelOutOfBounds {
            found: y.out_degree() as u32,
            bound: x.out_degree(),
        });
    }
    let nx = x.number_of_nodes();
    let degree = x.out_degree();
    let total = nx + y.number_of_nodes();
    let at = |node: Point, label: u32| -> Point {
        if (node as usize) < nx {
            x.at(node, label)
        } else {
            match y.at(node - nx as Point, label) {
                UNDEFINED => UNDEFINED,
                t => t + nx as Point,
            }
        }
    };
    // one representative edge row per block, merged as blocks merge
    let mut uf = UnionFind::new(total);
    let mut edges: Vec<Vec<Point>> = (0..total)
        .map(|n| {
            (0..degree as u32)
                .map(|a| at(n as Point, a))
                .collect()
        })
        .collect();
    let mut queue = VecDeque::new();
    queue.push_back((x_root, nx as Point + y_root));
    while let Some((a, b)) = queue.pop_front() {
        let a = uf.find(a);
        let b = uf.find(b);
        if a == b {
            continue;
        }
        uf.unite(a, b);
        let survivor = uf.find(a);
        let (gone, kept) = if survivor == a { (b, a) } else { (a, b) };
        for label in 0..degree {
            let from_gone = edges[gone as usize][label];
            let from_kept = edges[kept as usize][label];
            match (from_gone, from_kept) {
                (UNDEFINED, _) => {}
                (t, UNDEFINED) => edges[kept as usize][label] = t,
                (s, t) => queue.push_back((s, t)),
            }
        }
    }
    Ok(uf)
}

/// quotient of the joined graphs by the congruence, rebuilt as a word
/// graph whose node 0 is the block of the roots, numbered breadth first
pub fn join(x: &WordGraph, x_root: Point, y: &WordGraph, y_root: Point) -> Result<WordGraph> {
    let uf = congruence(x, x_root, y, y_root)?;
    let nx = x.number_of_nodes();
    let degree = x.out_degree();
    let target_of = |node: Point, label: u32| -> Point {
        if (node as usize) < nx {
            x.at(node, label)
        } else {
            match y.at(node - nx as Point, label) {
                UNDEFINED => UNDEFINED,
                t => t + nx as Point,
            }
        }
    };
    let total = uf.size();
    let mut numbering = vec![UNDEFINED; total];
    let root = uf.root(x_root);
    numbering[root as usize] = 0;
    let mut blocks = vec![root];
    let mut queue = VecDeque::from([root]);
    // discover the reachable blocks breadth first, smallest member first
    while let Some(block) = queue.pop_front() {
        for label in 0..degree as u32 {
            for member in 0..total as Point {
                if uf.root(member) != block {
                    continue;
                }
                let target = target_of(member, label);
                if target == UNDEFINED {
                    continue;
                }
                let target = uf.root(target);
                if numbering[target as usize] == UNDEFINED {
                    numbering[target as usize] = blocks.len() as Point;
                    blocks.push(target);
                    queue.push_back(target);
                }
            }
        }
    }
    let mut quotient = WordGraph::new(blocks.len(), degree);
    for member in 0..total as Point {
        let block = uf.root(member);
        if numbering[block as usize] == UNDEFINED {
            continue;
        }
        for label in 0..degree as u32 {
            let target = target_of(member, label);
            if target != UNDEFINED {
                let target = uf.root(target);
                quotient.set_target(
                    numbering[block as usize],
                    label,
                    numbering[target as usize],
                )?;
            }
        }
    }
    Ok(quotient)
}

/// true when every pair of words identified by `fine` is identified by
/// `coarse`: joining the two graphs must not merge two distinct nodes
/// of `coarse`
pub fn is_subrelation(
    fine: &WordGraph,
    fine_root: Point,
    coarse: &WordGraph,
    coarse_root: Point,
) -> Result<bool> {
    let uf = congruence(coarse, coarse_root, fine, fine_root)?;
    let nc = coarse.number_of_nodes();
    let mut owner = vec![UNDEFINED; uf.size()];
    for node in 0..nc as Point {
        let root = uf.root(node);
        if owner[root as usize] != UNDEFINED {
            return Ok(false);
        }
        owner[root as usize] = node;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    // single generator: x is a 2-cycle, y a 4-cycle
    fn cycles() -> (WordGraph, WordGraph) {
        let mut x = WordGraph::new(2, 1);
        x.set_target(0, 0, 1).unwrap();
        x.set_target(1, 0, 0).unwrap();
        let mut y = WordGraph::new(4, 1);
        for i in 0..4 {
            y.set_target(i, 0, (i + 1) % 4).unwrap();
        }
        (x, y)
    }

    #[test]
    fn join_of_cycles_has_gcd_length() {
        let (x, y) = cycles();
        let joined = join(&x, 0, &y, 0).unwrap();
        // identifying the roots of a 2-cycle and a 4-cycle collapses
        // both to a 2-cycle
        assert!(joined.number_of_nodes() == 2);
        assert!(joined.follow(0, &[0, 0]) == Some(0));
        assert!(joined.follow(0, &[0]) == Some(1));
    }

    #[test]
    fn subrelation_of_refining_cycles() {
        let (x, y) = cycles();
        // words agreeing mod 4 agree mod 2, not conversely
        assert!(is_subrelation(&y, 0, &x, 0).unwrap());
        assert!(!is_subrelation(&x, 0, &y, 0).unwrap());
    }

    #[test]
    fn identical_graphs_are_mutual_subrelations() {
        let (x, _) = cycles();
        assert!(is_subrelation(&x, 0, &x, 0).unwrap());
        let joined = join(&x, 0, &x, 0).unwrap();
        assert!(joined.number_of_nodes() == x.number_of_nodes());
    }

    #[test]
    fn mismatched_degrees_are_rejected() {
        let (x, _) = cycles();
        let y = WordGraph::new(1, 2);
        assert!(congruence(&x, 0, &y, 0).is_err());
    }
}
