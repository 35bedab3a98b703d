use crate::Letter;
use crate::Point;
use crate::Word;

/// crate-wide error type. kept Clone so a runner can replay the error
/// captured from a failed run on every subsequent attempt to drive it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("degree mismatch: expected {expected}, found {found}")]
    Degree { expected: usize, found: usize },

    #[error("image value out of bounds: found {found}, must be less than {bound}")]
    ImageValue { found: Point, bound: usize },

    #[error("duplicate image value {0}")]
    DuplicateImage(Point),

    #[error("domain and range size mismatch: {dom} != {ran}")]
    DomainMismatch { dom: usize, ran: usize },

    #[error("letter out of bounds: found {found}, alphabet has {alphabet} letters")]
    LetterOutOfBounds { found: Letter, alphabet: usize },

    #[error("node out of bounds: found {found}, must be less than {bound}")]
    NodeOutOfBounds { found: Point, bound: usize },

    #[error("label out of bounds: found {found}, must be less than {bound}")]
    LabelOutOfBounds { found: Letter, bound: usize },

    #[error("the rule {0:?} = {1:?} cannot be oriented")]
    Unorientable(Word, Word),

    #[error("{what} limit of {limit} exceeded")]
    LimitExceeded { what: &'static str, limit: usize },

    #[error("the congruence has not been shown to be finite")]
    NotFinished,

    #[error("the empty word does not belong to the presentation")]
    EmptyWord,

    #[error("point out of bounds: found {found}, must be less than {bound}")]
    PointOutOfBounds { found: Point, bound: usize },

    #[error("{0} is already a base point")]
    DuplicateBasePoint(Point),

    #[error("the base is closed, no further base points can be added")]
    BaseClosed,

    #[error("inverses must be an involution of the alphabet")]
    BadInverses,

    #[error("block label {0} appears before some smaller label")]
    BlockLabel(u32),

    #[error("a bipartition requires an even number of points, found {0}")]
    OddDegree(usize),

    #[error("at least one generator is required")]
    NoGenerators,

    #[error("index out of bounds: found {found}, must be less than {bound}")]
    IndexOutOfBounds { found: usize, bound: usize },
}
