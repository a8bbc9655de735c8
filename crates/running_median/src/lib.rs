mod error;
mod policy;
mod traits;

pub mod impls;

pub use error::InvariantViolation;
pub use impls::{BalanceMode, Iter, MedianTree, OrderedMapMedian};
pub use policy::{Ascending, Comparator, Descending, Midpoint};
pub use traits::RunningMedian;
