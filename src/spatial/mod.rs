//! spatial substrate: a static k-d tree with k-nearest and radius queries,
//! the neighbourhood smoother and the characteristic length dnn built on it.

mod dnn;
mod kdtree;
mod smooth;

pub use dnn::{first_quartile, nearest_neighbour_squared_distances};
pub use kdtree::KdTree;
pub use smooth::smoothen_cloud;
