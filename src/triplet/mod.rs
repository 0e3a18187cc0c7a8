//! triplets of approximately collinear points.
//!
//! A triplet (a, b, c) has b as its midpoint. It is summarised by the
//! centroid of its three points, the unit direction of its second leg
//! b -> c and a collinearity error in [0, 2]: 1 minus the cosine of the
//! angle between the legs a -> b and b -> c. Perfectly collinear triplets
//! have error 0.

mod metric;

pub use metric::ScaleTripletMetric;

use num_traits::Float;
use rayon::prelude::*;

use std::fmt::Debug;

use crate::cloud::{Point, PointCloud};
use crate::spatial::KdTree;

/// A triplet of three point ranks into the cloud it was generated from,
/// with its centroid, leg direction and collinearity error.
#[derive(Debug, Clone)]
pub struct Triplet<T> {
    index_a: usize,
    index_b: usize,
    index_c: usize,
    center: Point<T>,
    direction: Point<T>,
    error: T,
}

impl<T> Triplet<T>
where
    T: Float + Debug,
{
    /// rank of the first outer point
    pub fn get_index_a(&self) -> usize {
        self.index_a
    }

    /// rank of the midpoint
    pub fn get_index_b(&self) -> usize {
        self.index_b
    }

    /// rank of the second outer point
    pub fn get_index_c(&self) -> usize {
        self.index_c
    }

    /// centroid of the three points
    pub fn get_center(&self) -> &Point<T> {
        &self.center
    }

    /// unit direction of the leg b -> c
    pub fn get_direction(&self) -> &Point<T> {
        &self.direction
    }

    /// collinearity error, 1 - cos of the angle between the two legs
    pub fn get_error(&self) -> T {
        self.error
    }
} // end of impl Triplet

/// Generate triplets from *cloud*.
///
/// Every point b is taken as a midpoint candidate: among its *k* nearest
/// neighbours all pairs (a, c) in neighbour order are tried, coincident
/// neighbours (distance 0 from b, which includes b itself) are skipped, and
/// a triplet is kept if its collinearity error is at most *a*. Per midpoint
/// the *n* candidates with the smallest error survive.
///
/// On an ordered cloud only triplets with input ranks a < b < c are formed.
pub fn generate_triplets<T>(cloud: &PointCloud<T>, k: usize, n: usize, a: T) -> Vec<Triplet<T>>
where
    T: Float + Debug + Send + Sync,
{
    let items: Vec<([T; 3], usize)> = cloud
        .iter()
        .enumerate()
        .map(|(i, p)| (p.get_position(), i))
        .collect();
    let kdtree = KdTree::build(items);
    let ordered = cloud.is_ordered();
    //
    let per_midpoint: Vec<Vec<Triplet<T>>> = (0..cloud.len())
        .into_par_iter()
        .map(|index_b| {
            let point_b = &cloud[index_b];
            let neighbours = kdtree.k_nearest(&point_b.get_position(), k);
            let mut candidates: Vec<Triplet<T>> = Vec::new();
            //
            for (slot_a, &(d2_a, index_a)) in neighbours.iter().enumerate() {
                // distance 0 means b itself or a coincident point
                if d2_a == T::zero() {
                    continue;
                }
                let point_a = &cloud[index_a];
                if ordered && point_a.get_index() >= point_b.get_index() {
                    continue;
                }
                let leg_ab = point_b - point_a;
                let direction_ab = &leg_ab / leg_ab.norm();
                //
                for &(d2_c, index_c) in neighbours.iter().skip(slot_a + 1) {
                    if d2_c == T::zero() {
                        continue;
                    }
                    let point_c = &cloud[index_c];
                    if ordered && point_b.get_index() >= point_c.get_index() {
                        continue;
                    }
                    let leg_bc = point_c - point_b;
                    let direction_bc = &leg_bc / leg_bc.norm();
                    //
                    let error = T::one() - direction_ab.dot(&direction_bc);
                    if error <= a {
                        let center = &(&(point_a + point_b) + point_c) / T::from(3).unwrap();
                        candidates.push(Triplet {
                            index_a,
                            index_b,
                            index_c,
                            center,
                            direction: direction_bc,
                            error,
                        });
                    }
                }
            }
            // keep the n best candidates of this midpoint
            candidates.sort_by(|s, t| s.error.partial_cmp(&t.error).unwrap());
            candidates.truncate(n);
            candidates
        })
        .collect();
    //
    let triplets: Vec<Triplet<T>> = per_midpoint.into_iter().flatten().collect();
    log::debug!(
        "generate_triplets : {} triplets from {} points",
        triplets.len(),
        cloud.len()
    );
    triplets
}

//========================================================

// end of tests
