//! the characteristic length dnn of a point cloud.
//!
//! dnn is the square root of the first quartile of the squared distance of
//! every point to its nearest other point. Callers use it to scale the
//! smoothing radius, the triplet metric and the maximal gap width, so that
//! those parameters can be given as multiples of the local point spacing.

use num_traits::Float;
use rayon::prelude::*;

use std::fmt::Debug;

use super::kdtree::KdTree;
use crate::cloud::PointCloud;

/// For every point the squared distance to its nearest neighbour other than
/// itself. A point with no other point in the cloud contributes zero.
pub fn nearest_neighbour_squared_distances<T>(cloud: &PointCloud<T>) -> Vec<T>
where
    T: Float + Debug + Send + Sync,
{
    let items: Vec<([T; 3], ())> = cloud.iter().map(|p| (p.get_position(), ())).collect();
    let kdtree = KdTree::build(items);
    //
    (0..cloud.len())
        .into_par_iter()
        .map(|i| {
            // the nearest result is the point itself at distance 0
            let neighbours = kdtree.k_nearest(&cloud[i].get_position(), 2);
            match neighbours.get(1) {
                Some(&(d2, _)) => d2,
                None => T::zero(),
            }
        })
        .collect()
}

/// First quartile of the nearest neighbour squared distances of *cloud*,
/// i.e. the element at rank len/4 of the ascending order. The square root
/// of this value is the characteristic length dnn.
pub fn first_quartile<T>(cloud: &PointCloud<T>) -> T
where
    T: Float + Debug + Send + Sync,
{
    let mut distances = nearest_neighbour_squared_distances(cloud);
    if distances.is_empty() {
        return T::zero();
    }
    let q1 = distances.len() / 4;
    distances.select_nth_unstable_by(q1, |a, b| a.partial_cmp(b).unwrap());
    distances[q1]
}

//========================================================

// end of tests
