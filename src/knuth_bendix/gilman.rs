use super::KnuthBendix;
use crate::graph::WordGraph;
use crate::Letter;
use crate::Point;
use crate::UNDEFINED;
use std::collections::VecDeque;

/// the automaton of irreducible words: states are the trie states not
/// carrying a rule match, the start state is node 0, and every state
/// accepts. a word avoids every active left-hand side exactly when it
/// traces a path here, so counting paths counts the reduced-word
/// language of the system.
pub fn digraph(kb: &KnuthBendix) -> WordGraph {
    let trie = kb.system().trie();
    let alphabet = trie.alphabet();
    let mut numbering = vec![UNDEFINED; trie.number_of_states()];
    let mut states = Vec::new();
    numbering[0] = 0;
    states.push(0 as Point);
    let mut queue = VecDeque::from([0 as Point]);
    while let Some(state) = queue.pop_front() {
        for a in 0..alphabet as Letter {
            let target = trie.step(state, a);
            if trie.hit(target).is_some() {
                continue;
            }
            if numbering[target as usize] == UNDEFINED {
                numbering[target as usize] = states.len() as Point;
                states.push(target);
                queue.push_back(target);
            }
        }
    }
    let mut graph = WordGraph::new(states.len(), alphabet);
    for (node, &state) in states.iter().enumerate() {
        for a in 0..alphabet as Letter {
            let target = trie.step(state, a);
            if trie.hit(target).is_none() {
                graph
                    .set_target(node as Point, a, numbering[target as usize])
                    .expect("good states were numbered");
            }
        }
    }
    graph
}
