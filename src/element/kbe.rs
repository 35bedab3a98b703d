use super::Element;
use crate::knuth_bendix::KnuthBendix;
use crate::Error;
use crate::Letter;
use crate::Result;
use crate::Word;

/// a word kept in normal form by a rewriting engine it borrows. the
/// engine must outlive every element derived from it, which the borrow
/// encodes; equality is equality of the stored normal forms, so it only
/// decides the word problem once the engine is confluent.
#[derive(Debug, Clone)]
pub struct Kbe<'kb> {
    kb: &'kb KnuthBendix,
    word: Word,
}

impl<'kb> Kbe<'kb> {
    pub fn new(kb: &'kb KnuthBendix, word: Word) -> Result<Self> {
        let alphabet = kb.presentation().alphabet();
        if let Some(&found) = word.iter().find(|&&a| a as usize >= alphabet) {
            return Err(Error::LetterOutOfBounds { found, alphabet });
        }
        let mut word = word;
        kb.rewrite(&mut word);
        Ok(Self { kb, word })
    }

    pub fn from_letter(kb: &'kb KnuthBendix, letter: Letter) -> Result<Self> {
        Self::new(kb, vec![letter])
    }

    pub fn word(&self) -> &Word {
        &self.word
    }
}

impl PartialEq for Kbe<'_> {
    fn eq(&self, that: &Self) -> bool {
        debug_assert!(
            std::ptr::eq(self.kb, that.kb),
            "comparing elements of different rewriting engines"
        );
        self.word == that.word
    }
}

impl Eq for Kbe<'_> {}

impl std::hash::Hash for Kbe<'_> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.word.hash(state);
    }
}

/// by length, then lexicographically
impl Ord for Kbe<'_> {
    fn cmp(&self, that: &Self) -> std::cmp::Ordering {
        self.word
            .len()
            .cmp(&that.word.len())
            .then_with(|| self.word.cmp(&that.word))
    }
}

impl PartialOrd for Kbe<'_> {
    fn partial_cmp(&self, that: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(that))
    }
}

impl Element for Kbe<'_> {
    fn degree(&self) -> usize {
        0
    }

    fn one(&self) -> Self {
        Self {
            kb: self.kb,
            word: Word::new(),
        }
    }

    fn product(&mut self, x: &Self, y: &Self, _tid: usize) {
        debug_assert!(
            std::ptr::eq(x.kb, y.kb),
            "multiplying elements of different rewriting engines"
        );
        self.kb = x.kb;
        self.word.clear();
        self.word.extend_from_slice(&x.word);
        self.word.extend_from_slice(&y.word);
        self.kb.rewrite(&mut self.word);
    }
}

impl std::fmt::Display for Kbe<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Kbe({:?})", self.word)
    }
}
