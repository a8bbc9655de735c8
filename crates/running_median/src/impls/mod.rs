pub mod ordered_map;
pub mod weighted_avl;

pub use ordered_map::OrderedMapMedian;
pub use weighted_avl::{BalanceMode, Iter, MedianTree};
