//! Detection of one-dimensional curves in 2D/3D point clouds.
//!
//! A curve is modelled as a set of approximately collinear point triplets.
//! Triplets are generated from the k nearest neighbours of every point,
//! clustered hierarchically under a line-segment dissimilarity, and the
//! cluster labels are propagated back to the underlying points. Points
//! belonging to no cluster are noise.
//!
//! The pipeline (driven by the `curveclust` binary):
//! 1. neighbourhood smoothing of the cloud ([spatial::smoothen_cloud])
//! 2. generation of approximately collinear triplets ([triplet::generate_triplets])
//! 3. hierarchical clustering of the triplets with an automatic dendrogram
//!    cut ([cluster::cluster_triplets])
//! 4. pruning of small clusters, propagation of triplet labels to points and
//!    optional splitting of clusters at gaps via a minimum spanning tree

use lazy_static::lazy_static;

lazy_static! {
    static ref LOG: u64 = init_log();
}

// install a logger facility
fn init_log() -> u64 {
    let _res = env_logger::try_init();
    1
}

pub mod cloud;
pub mod cluster;
pub mod hclust;
pub mod output;
pub mod spatial;
pub mod triplet;
