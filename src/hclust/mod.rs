//! agglomerative hierarchical clustering over a condensed dissimilarity
//! array.
//!
//! The input is the upper triangle of the pairwise dissimilarity matrix in
//! row major order: d(i, j) with i < j sits at offset
//! i*(2n-i-1)/2 + (j - i - 1). The output is the merge sequence and
//! the dissimilarity at which each merge happened. Merge partners are
//! encoded the usual way: -(leaf+1) for singletons, (step+1) for the result
//! of an earlier merge.
//!
//! Cluster distances follow the Lance-Williams recurrence for the chosen
//! linkage; merges always pick the globally smallest pair, with ties
//! resolved towards the smallest condensed offset. The input array is used
//! as scratch space and is not preserved.

mod autocut;

pub use autocut::{automatic_cut_index, fixed_cut_index, implied_threshold};

use num_traits::Float;

use std::fmt::Debug;
use std::str::FromStr;

/// Rule for the distance between two clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    /// smallest pairwise item distance
    Single,
    /// largest pairwise item distance
    Complete,
    /// size weighted mean of the pairwise item distances
    Average,
}

impl FromStr for Linkage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Linkage::Single),
            "complete" => Ok(Linkage::Complete),
            "average" => Ok(Linkage::Average),
            _ => Err(format!("{} is not a valid linkage", s)),
        }
    }
}

/// Merge trace of an agglomerative clustering of n items: n-1 merge pairs
/// and the n-1 cluster distances at which they occurred.
pub struct Dendrogram<T> {
    merge: Vec<(i32, i32)>,
    cdists: Vec<T>,
}

impl<T> Dendrogram<T>
where
    T: Float + Debug,
{
    /// the merged pair per step, -(leaf+1) for singletons, (step+1) for
    /// prior merge results
    pub fn get_merge(&self) -> &[(i32, i32)] {
        &self.merge
    }

    /// the dissimilarity at which each merge occurred
    pub fn get_cdists(&self) -> &[T] {
        &self.cdists
    }

    /// consume the dendrogram into its merge pairs and merge heights
    pub fn into_parts(self) -> (Vec<(i32, i32)>, Vec<T>) {
        (self.merge, self.cdists)
    }
} // end of impl Dendrogram

/// offset of d(i, j), i < j, in the condensed array
#[inline]
pub fn condensed_index(n: usize, i: usize, j: usize) -> usize {
    debug_assert!(i < j && j < n);
    i * (2 * n - i - 1) / 2 + (j - i - 1)
}

// exact minimum of row i over the active columns j > i
fn refresh_row<T>(n: usize, i: usize, active: &[bool], dist: &[T]) -> (T, usize)
where
    T: Float,
{
    let mut best = T::infinity();
    let mut arg = usize::MAX;
    for j in (i + 1)..n {
        if !active[j] {
            continue;
        }
        let d = dist[condensed_index(n, i, j)];
        if d < best {
            best = d;
            arg = j;
        }
    }
    (best, arg)
}

/// Cluster *nb_items* items whose condensed dissimilarities are in *dist*.
///
/// *dist* is rewritten during clustering and holds no meaningful content
/// afterwards.
pub fn hclust<T>(nb_items: usize, dist: &mut [T], method: Linkage) -> Dendrogram<T>
where
    T: Float + Debug,
{
    let n = nb_items;
    assert_eq!(
        dist.len(),
        n * n.saturating_sub(1) / 2,
        "condensed array length does not match item count"
    );
    let mut merge: Vec<(i32, i32)> = Vec::with_capacity(n.saturating_sub(1));
    let mut cdists: Vec<T> = Vec::with_capacity(n.saturating_sub(1));
    if n < 2 {
        return Dendrogram { merge, cdists };
    }
    //
    let mut active = vec![true; n];
    let mut size = vec![1usize; n];
    // cluster label under the merge encoding
    let mut label: Vec<i32> = (0..n).map(|i| -((i as i32) + 1)).collect();
    // cached per row minima over the active columns right of the row
    let mut row_min = vec![T::infinity(); n];
    let mut row_arg = vec![usize::MAX; n];
    for i in 0..n {
        let (m, a) = refresh_row(n, i, &active, dist);
        row_min[i] = m;
        row_arg[i] = a;
    }
    //
    for step in 0..(n - 1) {
        // globally closest active pair, smallest row first on ties
        let mut i = usize::MAX;
        let mut d = T::infinity();
        for row in 0..n {
            if active[row] && row_arg[row] != usize::MAX && row_min[row] < d {
                d = row_min[row];
                i = row;
            }
        }
        let j = row_arg[i];
        merge.push((label[i], label[j]));
        cdists.push(d);
        label[i] = (step as i32) + 1;
        //
        let size_i = T::from(size[i]).unwrap();
        let size_j = T::from(size[j]).unwrap();
        // Lance-Williams update: distances to the merged cluster live in
        // the row/column of i
        for k in 0..n {
            if !active[k] || k == i || k == j {
                continue;
            }
            let at_ik = condensed_index(n, i.min(k), i.max(k));
            let d_ik = dist[at_ik];
            let d_jk = dist[condensed_index(n, j.min(k), j.max(k))];
            dist[at_ik] = match method {
                Linkage::Single => d_ik.min(d_jk),
                Linkage::Complete => d_ik.max(d_jk),
                Linkage::Average => (d_ik * size_i + d_jk * size_j) / (size_i + size_j),
            };
        }
        active[j] = false;
        size[i] += size[j];
        //
        // re-validate the cached minima touched by the merge
        for k in 0..n {
            if !active[k] || k == i {
                continue;
            }
            if k < i {
                let v = dist[condensed_index(n, k, i)];
                if row_arg[k] == i {
                    // the cached value of this row was overwritten
                    let (m, a) = refresh_row(n, k, &active, dist);
                    row_min[k] = m;
                    row_arg[k] = a;
                } else if row_arg[k] == j {
                    // the cached minimum pointed at the vanished cluster
                    if v <= row_min[k] {
                        row_min[k] = v;
                        row_arg[k] = i;
                    } else {
                        let (m, a) = refresh_row(n, k, &active, dist);
                        row_min[k] = m;
                        row_arg[k] = a;
                    }
                } else if v < row_min[k] {
                    row_min[k] = v;
                    row_arg[k] = i;
                }
            } else if row_arg[k] == j {
                // i < k < j: the entry (k, j) is gone
                let (m, a) = refresh_row(n, k, &active, dist);
                row_min[k] = m;
                row_arg[k] = a;
            }
        }
        let (m, a) = refresh_row(n, i, &active, dist);
        row_min[i] = m;
        row_arg[i] = a;
    }
    //
    Dendrogram { merge, cdists }
}

/// Cut the merge tree of *nb_items* leaves into *nb_clusters* clusters and
/// label every leaf. Labels are 0 based and assigned in order of the first
/// leaf of each cluster.
pub fn cutree(nb_items: usize, merge: &[(i32, i32)], nb_clusters: usize) -> Vec<usize> {
    let n = nb_items;
    if n == 0 {
        return Vec::new();
    }
    let nb_clusters = nb_clusters.clamp(1, n);
    let nb_steps = n - nb_clusters;
    //
    let mut parent: Vec<usize> = (0..n).collect();
    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }
    // a representative leaf per applied merge step
    let mut step_root = vec![0usize; nb_steps];
    for (s, &(a, b)) in merge.iter().take(nb_steps).enumerate() {
        let leaf_a = if a < 0 {
            (-a - 1) as usize
        } else {
            step_root[(a - 1) as usize]
        };
        let leaf_b = if b < 0 {
            (-b - 1) as usize
        } else {
            step_root[(b - 1) as usize]
        };
        let root_a = find(&mut parent, leaf_a);
        let root_b = find(&mut parent, leaf_b);
        parent[root_b] = root_a;
        step_root[s] = root_a;
    }
    //
    let mut labels = vec![usize::MAX; n];
    let mut root_label = vec![usize::MAX; n];
    let mut next_label = 0usize;
    for leaf in 0..n {
        let root = find(&mut parent, leaf);
        if root_label[root] == usize::MAX {
            root_label[root] = next_label;
            next_label += 1;
        }
        labels[leaf] = root_label[root];
    }
    labels
}

//========================================================

// end of tests
