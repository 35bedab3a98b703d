pub mod forest;
pub mod paths;
pub mod quotient;
pub mod scc;
pub mod wordgraph;

pub use forest::Forest;
pub use paths::PathOrder;
pub use paths::Paths;
pub use scc::Scc;
pub use wordgraph::WordGraph;
