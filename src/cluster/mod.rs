//! clustering of triplets and propagation of the cluster labels to points.
//!
//! The triplets are clustered agglomeratively under the scaled segment
//! dissimilarity; the dendrogram is cut automatically at the first
//! unexpectedly large merge or at a fixed height. The resulting triplet
//! clusters are pruned, converted to point clusters and finally written
//! into the per point label sets of the cloud.

pub mod gapsplit;

pub use gapsplit::split_cluster_at_gaps;

use num_traits::Float;
use rayon::prelude::*;

use std::fmt::Debug;

use crate::cloud::PointCloud;
use crate::hclust::{
    automatic_cut_index, cutree, fixed_cut_index, hclust, implied_threshold, Linkage,
};
use crate::triplet::{ScaleTripletMetric, Triplet};

/// point (or triplet) ranks forming one cluster
pub type ClusterSet = Vec<usize>;

/// all clusters of one run; cluster labels are positional
pub type ClusterGroup = Vec<ClusterSet>;

/// Where to cut the dendrogram.
#[derive(Debug, Clone, Copy)]
pub enum CutThreshold<T> {
    /// scan the merge heights for the first unexpectedly large jump
    Automatic,
    /// cut at the first merge height at least this value
    Fixed(T),
}

/// Outcome of the triplet clustering step: the triplet clusters and the
/// merge height trace they were cut from.
pub struct TripletClustering<T> {
    clusters: ClusterGroup,
    cdists: Vec<T>,
}

impl<T> TripletClustering<T>
where
    T: Float + Debug,
{
    pub fn get_clusters(&self) -> &ClusterGroup {
        &self.clusters
    }

    /// merge heights in merge order, one per merge (for debug dumps)
    pub fn get_cdists(&self) -> &[T] {
        &self.cdists
    }

    pub fn into_parts(self) -> (ClusterGroup, Vec<T>) {
        (self.clusters, self.cdists)
    }
} // end of impl TripletClustering

// condensed dissimilarity matrix of the triplets, filled row wise in
// parallel
fn condensed_dissimilarities<T>(triplets: &[Triplet<T>], scale: T) -> Vec<T>
where
    T: Float + Debug + Send + Sync,
{
    let nb = triplets.len();
    let metric = ScaleTripletMetric::new(scale);
    let rows: Vec<Vec<T>> = (0..nb)
        .into_par_iter()
        .map(|i| {
            let mut row = Vec::with_capacity(nb - i - 1);
            for j in (i + 1)..nb {
                row.push(metric.dissimilarity(&triplets[i], &triplets[j]));
            }
            row
        })
        .collect();
    let mut dist = Vec::with_capacity(nb * nb.saturating_sub(1) / 2);
    for row in rows {
        dist.extend(row);
    }
    dist
}

/// Cluster *triplets* hierarchically under the segment dissimilarity with
/// scale factor *scale* and cut the dendrogram according to *threshold*.
///
/// Clusters come back as lists of triplet ranks; their positional order is
/// determined by the merge order and is stable for a given input.
pub fn cluster_triplets<T>(
    triplets: &[Triplet<T>],
    scale: T,
    threshold: &CutThreshold<T>,
    method: Linkage,
) -> TripletClustering<T>
where
    T: Float + Debug + Send + Sync,
{
    let nb = triplets.len();
    if nb == 0 {
        return TripletClustering {
            clusters: Vec::new(),
            cdists: Vec::new(),
        };
    }
    //
    let mut dist = condensed_dissimilarities(triplets, scale);
    let dendrogram = hclust(nb, &mut dist, method);
    drop(dist);
    let (merge, cdists) = dendrogram.into_parts();
    //
    let cut_index = match threshold {
        CutThreshold::Automatic => {
            let k = automatic_cut_index(&cdists);
            if let Some(t) = implied_threshold(&cdists, k) {
                log::info!("optimal cdist threshold : {:.3e}", t.to_f64().unwrap());
            }
            k
        }
        CutThreshold::Fixed(t) => fixed_cut_index(&cdists, *t),
    };
    let nb_clusters = nb - cut_index;
    let labels = cutree(nb, &merge, nb_clusters);
    //
    let mut clusters: ClusterGroup = vec![Vec::new(); nb_clusters];
    for (triplet_rank, &label) in labels.iter().enumerate() {
        clusters[label].push(triplet_rank);
    }
    log::debug!(
        "cluster_triplets : {} triplets cut into {} clusters",
        nb,
        nb_clusters
    );
    //
    TripletClustering { clusters, cdists }
}

/// Remove every cluster with fewer than *m* members. Surviving clusters
/// keep their relative order; labels are positional and renumber
/// implicitly. Returns the number of removed clusters.
pub fn remove_small_clusters(cl_group: &mut ClusterGroup, m: usize) -> usize {
    let old_size = cl_group.len();
    cl_group.retain(|cluster| cluster.len() >= m);
    let removed = old_size - cl_group.len();
    log::info!("in pruning removed clusters : {}", removed);
    removed
}

/// Replace the triplet ranks in every cluster of *cl_group* with the point
/// ranks of the triplet members, sorted and deduplicated.
pub fn cluster_triplets_to_points<T>(triplets: &[Triplet<T>], cl_group: &mut ClusterGroup)
where
    T: Float + Debug,
{
    for cluster in cl_group.iter_mut() {
        let mut point_ranks: Vec<usize> = cluster
            .iter()
            .flat_map(|&triplet_rank| {
                let t = &triplets[triplet_rank];
                [t.get_index_a(), t.get_index_b(), t.get_index_c()]
            })
            .collect();
        point_ranks.sort_unstable();
        point_ranks.dedup();
        *cluster = point_ranks;
    }
}

/// Store the positional cluster labels of *cl_group* in the points of
/// *cloud*.
///
/// With *extract_overlaps* set (used by the gnuplot output), points that
/// belong to the same set of at least two clusters are moved out of their
/// base clusters into one extra cluster per distinct label set, appended
/// behind the base clusters. The labels the points carry are unaffected.
pub fn add_clusters<T>(cloud: &mut PointCloud<T>, cl_group: &mut ClusterGroup, extract_overlaps: bool)
where
    T: Float + Debug,
{
    for (label, cluster) in cl_group.iter().enumerate() {
        for &point_rank in cluster.iter() {
            cloud[point_rank].add_cluster_id(label);
        }
    }
    //
    if extract_overlaps {
        let mut overlap_clusters: Vec<ClusterSet> = Vec::new();
        for point_rank in 0..cloud.len() {
            if cloud[point_rank].get_cluster_ids().len() > 1 {
                // group by the exact label set
                let mut found = false;
                for overlap in overlap_clusters.iter_mut() {
                    if cloud[overlap[0]].get_cluster_ids() == cloud[point_rank].get_cluster_ids() {
                        overlap.push(point_rank);
                        found = true;
                    }
                }
                if !found {
                    overlap_clusters.push(vec![point_rank]);
                }
                // the point leaves all its base clusters
                for &label in cloud[point_rank].get_cluster_ids().clone().iter() {
                    cl_group[label].retain(|&p| p != point_rank);
                }
            }
        }
        cl_group.extend(overlap_clusters);
    }
}

//========================================================

#[cfg(test)]
mod tests {

    use super::*;
    use crate::cloud::Point;
    use crate::spatial::{first_quartile, smoothen_cloud};
    use crate::triplet::generate_triplets;

    use rand::prelude::*;
    use rand_distr::Uniform;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // the full pipeline as the binary drives it
    #[allow(clippy::too_many_arguments)]
    fn run_pipeline(
        cloud: &mut PointCloud<f64>,
        r: f64,
        k: usize,
        n: usize,
        a: f64,
        s: f64,
        m: usize,
        dmax: Option<f64>,
        extract_overlaps: bool,
    ) -> ClusterGroup {
        let smoothed = smoothen_cloud(cloud, r);
        let triplets = generate_triplets(&smoothed, k, n, a);
        let clustering =
            cluster_triplets(&triplets, s, &CutThreshold::Automatic, Linkage::Single);
        let (mut cl_group, _) = clustering.into_parts();
        remove_small_clusters(&mut cl_group, m);
        cluster_triplets_to_points(&triplets, &mut cl_group);
        if let Some(dmax) = dmax {
            let mut split_group = ClusterGroup::new();
            for cluster in &cl_group {
                split_group.extend(split_cluster_at_gaps(cluster, cloud, dmax, m + 2));
            }
            cl_group = split_group;
        }
        add_clusters(cloud, &mut cl_group, extract_overlaps);
        cl_group
    }

    fn dnn(cloud: &PointCloud<f64>) -> f64 {
        first_quartile(cloud).sqrt()
    }

    #[test]
    fn test_unit_triangle_is_noise() {
        log_init_test();
        let mut cloud = PointCloud::new();
        cloud.push(Point::with_index(0., 0., 0., 0));
        cloud.push(Point::with_index(1., 0., 0., 1));
        cloud.push(Point::with_index(0., 1., 0., 2));
        cloud.set_2d(true);
        let dnn = dnn(&cloud);
        let cl_group = run_pipeline(
            &mut cloud,
            2. * dnn,
            19,
            2,
            0.03,
            0.3 * dnn,
            5,
            None,
            false,
        );
        assert!(cl_group.is_empty());
        for p in cloud.iter() {
            assert!(p.get_cluster_ids().is_empty());
        }
    }

    #[test]
    fn test_ordered_line_is_one_cluster() {
        log_init_test();
        let mut cloud = PointCloud::new();
        for i in 0..10 {
            cloud.push(Point::with_index(i as f64, 0., 0., i));
        }
        cloud.set_ordered(true);
        let dnn = dnn(&cloud);
        let cl_group = run_pipeline(
            &mut cloud,
            2. * dnn,
            19,
            2,
            0.03,
            0.3 * dnn,
            5,
            None,
            false,
        );
        assert_eq!(cl_group.len(), 1);
        assert_eq!(cl_group[0], (0..10).collect::<Vec<usize>>());
        for p in cloud.iter() {
            assert_eq!(p.get_cluster_ids().len(), 1);
            assert!(p.get_cluster_ids().contains(&0));
        }
    }

    #[test]
    fn test_two_parallel_lines() {
        log_init_test();
        let mut cloud = PointCloud::new();
        for i in 0..10 {
            cloud.push(Point::with_index(i as f64, 0., 0., i));
        }
        for i in 0..10 {
            cloud.push(Point::with_index(i as f64, 10., 0., 10 + i));
        }
        let dnn = dnn(&cloud);
        let cl_group = run_pipeline(
            &mut cloud,
            2. * dnn,
            19,
            2,
            0.03,
            0.3 * dnn,
            5,
            None,
            false,
        );
        assert_eq!(cl_group.len(), 2);
        for cluster in &cl_group {
            assert_eq!(cluster.len(), 10);
        }
        // no point belongs to both lines
        for p in cloud.iter() {
            assert_eq!(p.get_cluster_ids().len(), 1);
        }
        // partition identity: one cluster per input line
        let mut lines = [usize::MAX, usize::MAX];
        for (label, cluster) in cl_group.iter().enumerate() {
            let line = cluster[0] / 10;
            lines[line] = label;
            for &p in cluster {
                assert_eq!(p / 10, line);
            }
        }
        assert_ne!(lines[0], lines[1]);
    }

    #[test]
    fn test_crossing_lines_overlap_cluster() {
        log_init_test();
        // a line on y = x and one on y = -x sharing the origin point
        let mut cloud = PointCloud::new();
        let mut rank = 0;
        for i in -10..=10 {
            cloud.push(Point::with_index(i as f64, i as f64, 0., rank));
            rank += 1;
        }
        let origin = 10;
        for i in -10..=10 {
            if i == 0 {
                continue;
            }
            cloud.push(Point::with_index(i as f64, -i as f64, 0., rank));
            rank += 1;
        }
        // no smoothing so the crossing stays exact
        let dnn = dnn(&cloud);
        let cl_group = run_pipeline(&mut cloud, 0., 19, 2, 0.03, 0.3 * dnn, 5, None, true);
        // two curves plus one overlap cluster holding the shared origin
        assert_eq!(cl_group.len(), 3);
        assert_eq!(cl_group[2], vec![origin]);
        assert_eq!(
            cloud[origin].get_cluster_ids().iter().copied().collect::<Vec<usize>>(),
            vec![0, 1]
        );
        // the origin left its base clusters
        for cluster in &cl_group[0..2] {
            assert!(!cluster.contains(&origin));
        }
    }

    #[test]
    fn test_uniform_noise_has_no_cluster() {
        log_init_test();
        let unif = Uniform::<f64>::new(0., 1.).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2718);
        let mut cloud = PointCloud::new();
        for i in 0..100 {
            cloud.push(Point::with_index(
                unif.sample(&mut rng),
                unif.sample(&mut rng),
                unif.sample(&mut rng),
                i,
            ));
        }
        let dnn = dnn(&cloud);
        // a very tight angular tolerance: random triplets do not survive
        let cl_group = run_pipeline(
            &mut cloud,
            2. * dnn,
            19,
            2,
            1.0e-4,
            0.3 * dnn,
            5,
            None,
            false,
        );
        assert!(cl_group.is_empty());
        for p in cloud.iter() {
            assert!(p.get_cluster_ids().is_empty());
        }
    }

    #[test]
    fn test_gap_splitting() {
        log_init_test();
        let segments = |cloud: &mut PointCloud<f64>| {
            for i in 0..10 {
                cloud.push(Point::with_index(i as f64, 0., 0., i));
            }
            for i in 0..10 {
                cloud.push(Point::with_index(14. + i as f64, 0., 0., 10 + i));
            }
        };
        //
        // without a gap limit the collinear segments bridge into one cluster
        let mut cloud = PointCloud::new();
        segments(&mut cloud);
        let d = dnn(&cloud);
        let cl_group = run_pipeline(&mut cloud, 2. * d, 19, 2, 0.03, 0.3 * d, 5, None, false);
        assert_eq!(cl_group.len(), 1);
        assert_eq!(cl_group[0].len(), 20);
        //
        // with dmax 1 the minimum spanning tree is cut at the gap
        let mut cloud = PointCloud::new();
        segments(&mut cloud);
        let cl_group = run_pipeline(&mut cloud, 2. * d, 19, 2, 0.03, 0.3 * d, 5, Some(1.), false);
        assert_eq!(cl_group.len(), 2);
        for cluster in &cl_group {
            assert_eq!(cluster.len(), 10);
        }
    }

    #[test]
    fn test_single_point_is_noise() {
        log_init_test();
        let mut cloud = PointCloud::new();
        cloud.push(Point::with_index(1., 2., 3., 0));
        let cl_group = run_pipeline(&mut cloud, 0.5, 19, 2, 0.03, 0.3, 5, None, false);
        assert!(cl_group.is_empty());
        assert!(cloud[0].get_cluster_ids().is_empty());
    }

    #[test]
    fn test_pruning_floor() {
        log_init_test();
        let mut clusters: ClusterGroup = vec![vec![0, 1, 2], vec![3, 4, 5, 6, 7], vec![8]];
        let removed = remove_small_clusters(&mut clusters, 4);
        assert_eq!(removed, 2);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 5);
    }

    #[test]
    fn test_triplets_to_points_dedups_and_sorts() {
        log_init_test();
        let mut cloud = PointCloud::new();
        for i in 0..5 {
            cloud.push(Point::with_index(i as f64, 0., 0., i));
        }
        let triplets = generate_triplets(&cloud, 5, 10, 0.03);
        // find two overlapping triplets
        let mut cl_group: ClusterGroup = vec![(0..triplets.len()).collect()];
        cluster_triplets_to_points(&triplets, &mut cl_group);
        let cluster = &cl_group[0];
        // sorted, unique, within range
        for w in cluster.windows(2) {
            assert!(w[0] < w[1]);
        }
        assert_eq!(cluster, &(0..5).collect::<Vec<usize>>());
    }

    #[test]
    fn test_fixed_threshold_cut() {
        log_init_test();
        // two parallel lines, fixed threshold between 0 and the bridge
        let mut cloud = PointCloud::new();
        for i in 0..10 {
            cloud.push(Point::with_index(i as f64, 0., 0., i));
        }
        for i in 0..10 {
            cloud.push(Point::with_index(i as f64, 10., 0., 10 + i));
        }
        let smoothed = smoothen_cloud(&cloud, 2.);
        let triplets = generate_triplets(&smoothed, 19, 2, 0.03);
        let clustering =
            cluster_triplets(&triplets, 0.3, &CutThreshold::Fixed(1.0), Linkage::Single);
        assert_eq!(clustering.get_clusters().len(), 2);
        // merge height trace has one entry per merge
        assert_eq!(clustering.get_cdists().len(), triplets.len() - 1);
    }
} // end of tests
