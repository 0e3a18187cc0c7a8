//! position smoothing of a point cloud.

use num_traits::Float;
use rayon::prelude::*;

use std::fmt::Debug;

use super::kdtree::KdTree;
use crate::cloud::{Point, PointCloud};

/// Smooth *cloud* by replacing every point with the centroid of its
/// neighbours within radius *r* (the point itself included, so the
/// neighbourhood is never empty).
///
/// The result has the same size and order as the input and keeps every
/// point's input rank and the cloud flags. A radius of zero returns the
/// input unchanged.
pub fn smoothen_cloud<T>(cloud: &PointCloud<T>, r: T) -> PointCloud<T>
where
    T: Float + Debug + Send + Sync,
{
    if r == T::zero() {
        return cloud.clone();
    }
    //
    let items: Vec<([T; 3], usize)> = cloud
        .iter()
        .enumerate()
        .map(|(i, p)| (p.get_position(), i))
        .collect();
    let kdtree = KdTree::build(items);
    //
    let smoothed: Vec<Point<T>> = (0..cloud.len())
        .into_par_iter()
        .map(|i| {
            let position = cloud[i].get_position();
            let neighbours = kdtree.range(&position, r);
            let nb_neighbours = T::from(neighbours.len()).unwrap();
            let mut centroid = [T::zero(); 3];
            for (_, neighbour) in &neighbours {
                let neighbour_position = cloud[*neighbour].get_position();
                for d in 0..3 {
                    centroid[d] = centroid[d] + neighbour_position[d];
                }
            }
            for coordinate in centroid.iter_mut() {
                *coordinate = *coordinate / nb_neighbours;
            }
            Point::with_index(centroid[0], centroid[1], centroid[2], cloud[i].get_index())
        })
        .collect();
    //
    let mut result = PointCloud::with_capacity(cloud.len());
    for point in smoothed {
        result.push(point);
    }
    result.set_2d(cloud.is_2d());
    result.set_ordered(cloud.is_ordered());
    result
}

//========================================================

// end of tests
