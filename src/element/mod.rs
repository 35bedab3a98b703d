use crate::Point;

pub mod bipartition;
pub mod bmat;
pub mod kbe;
pub mod matrix;
pub mod perm;
pub mod pperm;
pub mod transf;

pub use bipartition::Bipartition;
pub use bmat::BMat;
pub use kbe::Kbe;
pub use matrix::Mat;
pub use matrix::MaxPlus;
pub use matrix::MinPlus;
pub use matrix::Semiring;
pub use matrix::TropicalMaxPlus;
pub use perm::Perm;
pub use pperm::PPerm;
pub use transf::Transf;

/// the capability set shared by everything a semigroup can be made of.
/// multiplication is in place: after `out.product(&x, &y, tid)` the
/// receiver holds x followed by y (left-to-right composition). aliasing
/// the receiver with an operand is ruled out by the borrow checker, so
/// the classic misuse of the out-parameter convention cannot compile.
pub trait Element: Clone + Eq + Ord + std::hash::Hash {
    /// number of points (or rows) used in the definition
    fn degree(&self) -> usize;

    /// the identity with the same degree (and context) as self
    fn one(&self) -> Self;

    /// set self to the product of x and y. `tid` is a hint naming the
    /// per-thread scratch slot for variants that need working storage.
    fn product(&mut self, x: &Self, y: &Self, tid: usize);

    /// out-of-place product, for callers without a spare receiver
    fn product_of(x: &Self, y: &Self) -> Self {
        let mut out = x.one();
        out.product(x, y, 0);
        out
    }
}

/// elements with a group inverse on their domain of definition
pub trait Inverse: Element {
    fn inverse(&self) -> Self;
}

/// elements with a rank: the number of distinct defined images, or the
/// row space dimension for matrices
pub trait Ranked: Element {
    fn rank(&self) -> usize;
}

/// right action on points; partial maps send points outside their
/// domain to UNDEFINED
pub trait Act: Element {
    fn act(&self, pt: Point) -> Point;
}
