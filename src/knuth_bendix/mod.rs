pub mod gilman;

use crate::presentation::Presentation;
use crate::report;
use crate::rewrite::ReductionOrder;
use crate::rewrite::RewriteSystem;
use crate::rewrite::RuleId;
use crate::rewrite::ShortLex;
use crate::runner::Run;
use crate::runner::Runner;
use crate::Error;
use crate::Letter;
use crate::Relation;
use crate::Result;
use crate::Size;
use crate::Word;
use std::collections::VecDeque;

/// completion of a presentation into a (hopefully confluent) rewriting
/// system. the run drains a queue of rule pairs, turning each critical
/// pair that fails to converge into a fresh rule, inter-reducing and
/// testing confluence at a configurable interval. timeouts and kills
/// leave a consistent not-yet-confluent system behind; exceeded limits
/// abandon the run but every query stays answerable.
pub struct KnuthBendix {
    runner: Runner,
    presentation: Presentation,
    system: RewriteSystem,
    pending: VecDeque<(RuleId, RuleId)>,
    confluence: Option<bool>,
    limit: Option<&'static str>,
    max_rules: usize,
    max_pending: usize,
    max_overlap_length: usize,
    check_confluence_interval: usize,
}

impl std::fmt::Debug for KnuthBendix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnuthBendix")
            .field("presentation", &self.presentation)
            .finish_non_exhaustive()
    }
}

impl KnuthBendix {
    pub fn new(presentation: Presentation) -> Result<Self> {
        Self::with_order(presentation, Box::new(ShortLex::new()))
    }

    pub fn with_order(
        presentation: Presentation,
        order: Box<dyn ReductionOrder>,
    ) -> Result<Self> {
        let mut kb = Self {
            runner: Runner::new("knuth-bendix"),
            system: RewriteSystem::with_order(presentation.alphabet(), order),
            presentation,
            pending: VecDeque::new(),
            confluence: None,
            limit: None,
            max_rules: usize::MAX,
            max_pending: usize::MAX,
            max_overlap_length: usize::MAX,
            check_confluence_interval: 32,
        };
        for (u, v) in kb.presentation.rules().to_vec() {
            kb.push_rule(u, v)?;
        }
        Ok(kb)
    }

    // tuning knobs

    pub fn max_rules(&mut self, n: usize) -> &mut Self {
        self.max_rules = n;
        self
    }

    pub fn max_pending(&mut self, n: usize) -> &mut Self {
        self.max_pending = n;
        self
    }

    pub fn max_overlap_length(&mut self, n: usize) -> &mut Self {
        self.max_overlap_length = n;
        self
    }

    pub fn check_confluence_interval(&mut self, n: usize) -> &mut Self {
        self.check_confluence_interval = n.max(1);
        self
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub(crate) fn system(&self) -> &RewriteSystem {
        &self.system
    }

    pub fn number_of_active_rules(&self) -> usize {
        self.system.number_of_active_rules()
    }

    pub fn number_of_inactive_rules(&self) -> usize {
        self.system.number_of_inactive_rules()
    }

    pub fn total_rules(&self) -> usize {
        self.system.total_rules()
    }

    pub fn active_rules(&self) -> impl Iterator<Item = (&Word, &Word)> {
        self.system.active_rules()
    }

    pub fn unorientable(&self) -> &[Relation] {
        self.system.unorientable()
    }

    /// the limit that abandoned the last run, if one did
    pub fn limit_reached(&self) -> Option<&'static str> {
        self.limit
    }

    /// add a defining rule after construction; anything already derived
    /// stays valid since the congruence only grows
    pub fn add_rule(&mut self, lhs: Word, rhs: Word) -> Result<()> {
        self.presentation.validate_word(&lhs)?;
        self.presentation.validate_word(&rhs)?;
        self.push_rule(lhs, rhs)
    }

    fn push_rule(&mut self, u: Word, v: Word) -> Result<()> {
        match self.system.add(u, v) {
            Ok(Some(id)) => {
                self.confluence = None;
                self.enqueue(id);
                Ok(())
            }
            Ok(None) => Ok(()),
            // recorded in the system, completion continues without it
            Err(Error::Unorientable(..)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn enqueue(&mut self, id: RuleId) {
        for j in self.system.active_ids() {
            self.pending.push_back((id, j));
            if j != id {
                self.pending.push_back((j, id));
            }
        }
    }

    fn give_up(&mut self, what: &'static str) {
        self.limit = Some(what);
        log::warn!("knuth-bendix: {} exceeded, abandoning the run", what);
        self.runner.kill();
    }

    /// rewrite in place against the current active rules
    pub fn rewrite(&self, word: &mut Word) {
        self.system.rewrite(word);
    }

    /// an irreducible word equivalent to the input; a canonical form
    /// exactly when the system is confluent
    pub fn normal_form(&self, word: &[Letter]) -> Result<Word> {
        if let Some(&found) = word
            .iter()
            .find(|&&a| a as usize >= self.presentation.alphabet())
        {
            return Err(Error::LetterOutOfBounds {
                found,
                alphabet: self.presentation.alphabet(),
            });
        }
        Ok(self.system.normal_form(word))
    }

    /// confluence of the system as it currently stands, cached until the
    /// rule set changes
    pub fn confluent(&mut self) -> bool {
        if let Some(c) = self.confluence {
            return c;
        }
        let c = self.system.confluent(self.max_overlap_length);
        self.confluence = Some(c);
        c
    }

    /// decide u = v, completing first if the system is not yet confluent
    pub fn equal_to(&mut self, u: &[Letter], v: &[Letter]) -> Result<bool> {
        if !self.confluent() {
            self.run()?;
        }
        Ok(self.normal_form(u)? == self.normal_form(v)?)
    }

    /// the number of elements presented, counted by the language of
    /// irreducible words
    pub fn size(&mut self) -> Result<Size> {
        self.run()?;
        let graph = gilman::digraph(self);
        Ok(match graph.number_of_paths(0) {
            Size::Infinite => Size::Infinite,
            Size::Finite(paths) if self.presentation.contains_empty_word() => {
                Size::Finite(paths)
            }
            // the empty path spells a word outside the semigroup
            Size::Finite(paths) => Size::Finite(paths - 1),
        })
    }
}

impl Run for KnuthBendix {
    fn runner(&self) -> &Runner {
        &self.runner
    }

    fn runner_mut(&mut self) -> &mut Runner {
        &mut self.runner
    }

    fn finished_impl(&self) -> bool {
        self.pending.is_empty()
    }

    fn run_impl(&mut self) -> Result<()> {
        let max_overlap = self.max_overlap_length;
        let mut processed = 0usize;
        'completion: loop {
            while let Some((i, j)) = self.pending.pop_front() {
                if !self.system.is_active(i) || !self.system.is_active(j) {
                    continue;
                }
                for (u, v) in self.system.critical_pairs(i, j, max_overlap) {
                    match self.system.add(u, v) {
                        Ok(Some(id)) => {
                            self.confluence = None;
                            self.enqueue(id);
                        }
                        Ok(None) => {}
                        Err(Error::Unorientable(..)) => {}
                        Err(e) => return Err(e),
                    }
                }
                processed += 1;
                if self.system.number_of_active_rules() > self.max_rules {
                    self.give_up("max_rules");
                    break 'completion;
                }
                if self.pending.len() > self.max_pending {
                    self.give_up("max_pending");
                    break 'completion;
                }
                if processed % self.check_confluence_interval == 0 {
                    for id in self.system.inter_reduce()? {
                        self.confluence = None;
                        self.enqueue(id);
                    }
                    if self.system.confluent(max_overlap) {
                        self.confluence = Some(true);
                        self.pending.clear();
                        break 'completion;
                    }
                    if report::reporting() {
                        log::info!(
                            "knuth-bendix: {} active rules, {} pending pairs",
                            self.system.number_of_active_rules(),
                            self.pending.len()
                        );
                    }
                }
                if self.runner.stopped() {
                    break 'completion;
                }
            }
            // the queue drained: inter-reduce towards the reduced
            // completion, which may surface new equations to process
            let added = self.system.inter_reduce()?;
            if added.is_empty() {
                break;
            }
            for id in added {
                self.confluence = None;
                self.enqueue(id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presentation(alphabet: usize, rules: &[(&[Letter], &[Letter])]) -> Presentation {
        let mut p = Presentation::new(alphabet);
        p.set_contains_empty_word(rules.iter().any(|(u, v)| u.is_empty() || v.is_empty()));
        for (u, v) in rules {
            p.add_rule(u.to_vec(), v.to_vec()).unwrap();
        }
        p
    }

    #[test]
    fn one_relation_monoid_completes() {
        // abab = ab
        let mut kb = KnuthBendix::new(presentation(2, &[(&[0, 1, 0, 1], &[0, 1])])).unwrap();
        kb.run().unwrap();
        assert!(kb.finished());
        assert!(kb.confluent());
        assert!(kb.number_of_active_rules() == 1);
        // aabab reduces to aab
        assert!(kb.normal_form(&[0, 0, 1, 0, 1]).unwrap() == vec![0, 0, 1]);
        assert!(kb.equal_to(&[0, 0, 1, 0, 1], &[0, 0, 1]).unwrap());
        assert!(!kb.equal_to(&[0], &[1]).unwrap());
        assert!(kb.size().unwrap() == Size::Infinite);
    }

    #[test]
    fn idempotent_generator_has_one_element() {
        let mut kb = KnuthBendix::new(presentation(1, &[(&[0, 0], &[0])])).unwrap();
        kb.run().unwrap();
        assert!(kb.confluent());
        assert!(kb.size().unwrap() == Size::Finite(1));
    }

    #[test]
    fn klein_four_group() {
        // aa = bb = abab = empty
        let mut kb = KnuthBendix::new(presentation(
            2,
            &[(&[0, 0], &[]), (&[1, 1], &[]), (&[0, 1, 0, 1], &[])],
        ))
        .unwrap();
        kb.run().unwrap();
        assert!(kb.confluent());
        assert!(kb.size().unwrap() == Size::Finite(4));
        // ba = ab in the completed system
        assert!(kb.equal_to(&[1, 0], &[0, 1]).unwrap());
        assert!(kb.normal_form(&[1, 0, 1, 0]).unwrap().is_empty());
    }

    #[test]
    fn free_monoid_is_infinite() {
        let mut kb = KnuthBendix::new(presentation(2, &[])).unwrap();
        kb.run().unwrap();
        assert!(kb.confluent());
        assert!(kb.size().unwrap() == Size::Infinite);
        assert!(kb.number_of_active_rules() == 0);
    }

    #[test]
    fn normal_forms_are_idempotent_when_confluent() {
        // the free commutative band on two generators
        let mut kb = KnuthBendix::new(presentation(
            2,
            &[(&[0, 0], &[0]), (&[1, 1], &[1]), (&[1, 0], &[0, 1])],
        ))
        .unwrap();
        kb.run().unwrap();
        assert!(kb.confluent());
        for word in [
            vec![0, 1, 0, 1, 0, 1],
            vec![1, 1, 1, 1, 0],
            vec![0, 0, 0, 0],
            vec![1, 0, 1, 0, 1, 0],
        ] {
            let nf = kb.normal_form(&word).unwrap();
            assert!(kb.normal_form(&nf).unwrap() == nf);
        }
        assert!(kb.size().unwrap() == Size::Finite(3));
        assert!(kb.equal_to(&[1, 0], &[0, 1]).unwrap());
    }

    #[test]
    fn max_rules_abandons_but_stays_queryable() {
        // a presentation known to keep producing rules under shortlex
        let mut kb = KnuthBendix::new(presentation(
            2,
            &[(&[0, 0, 0], &[]), (&[1, 1, 1], &[]), (&[0, 1, 0, 1, 0, 1], &[])],
        ))
        .unwrap();
        kb.max_rules(4);
        kb.run().unwrap();
        assert!(kb.limit_reached() == Some("max_rules"));
        assert!(kb.dead());
        assert!(!kb.finished());
        // partial rewriting still works
        assert!(kb.normal_form(&[0, 0, 0]).unwrap().is_empty());
    }

    #[test]
    fn rejects_letters_outside_the_alphabet() {
        let kb = KnuthBendix::new(presentation(2, &[(&[0, 1], &[0])])).unwrap();
        assert!(matches!(
            kb.normal_form(&[0, 5]),
            Err(Error::LetterOutOfBounds {
                found: 5,
                alphabet: 2
            })
        ));
    }
}
