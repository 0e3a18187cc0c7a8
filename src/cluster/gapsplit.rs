//! splitting point clusters at gaps.
//!
//! A cluster that the triplet stage glued together across a spatial gap is
//! split by building the minimum spanning tree of its points, deleting
//! every tree edge longer than the maximal gap width and keeping the
//! resulting connected components. All comparisons work on squared
//! distances.

use num_traits::Float;

use std::fmt::Debug;

use crate::cloud::PointCloud;

struct Edge<T> {
    src: usize,
    dest: usize,
    weight: T,
}

// all edges of the complete graph on the cluster points, weighted with the
// squared point distance and sorted ascending. Equal weights keep the
// (src, dest) generation order.
fn create_edges<T>(cloud: &PointCloud<T>, cluster: &[usize]) -> Vec<Edge<T>>
where
    T: Float + Debug,
{
    let mut edges = Vec::with_capacity(cluster.len() * cluster.len().saturating_sub(1) / 2);
    for vertex1 in 0..cluster.len() {
        for vertex2 in (vertex1 + 1)..cluster.len() {
            let p = &cloud[cluster[vertex1]];
            let q = &cloud[cluster[vertex2]];
            let weight = (q - p).squared_norm();
            edges.push(Edge {
                src: vertex1,
                dest: vertex2,
                weight,
            });
        }
    }
    edges.sort_by(|a, b| a.weight.partial_cmp(&b.weight).unwrap());
    edges
}

// kruskal over the sorted edges, with component membership kept in a flat
// relabelled group list
fn minimum_spanning_tree<T>(edges: Vec<Edge<T>>, nb_vertices: usize) -> Vec<Edge<T>>
where
    T: Float + Debug,
{
    let mut groups: Vec<usize> = (0..nb_vertices).collect();
    let mut mst_edges = Vec::with_capacity(nb_vertices.saturating_sub(1));
    for edge in edges {
        let group_a = groups[edge.src];
        let group_b = groups[edge.dest];
        if group_a != group_b {
            for group in groups.iter_mut() {
                if *group == group_b {
                    *group = group_a;
                }
            }
            mst_edges.push(edge);
        }
    }
    mst_edges
}

// adjacency lists over the remaining edges
fn create_adjacency<T>(nb_vertices: usize, edges: &[Edge<T>]) -> Vec<Vec<usize>>
where
    T: Float + Debug,
{
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); nb_vertices];
    for edge in edges {
        adjacency[edge.src].push(edge.dest);
        adjacency[edge.dest].push(edge.src);
    }
    adjacency
}

// depth first collection of the component containing *start*, translated
// back to point ranks via *cluster*
fn collect_component(
    start: usize,
    visited: &mut [bool],
    cluster: &[usize],
    adjacency: &[Vec<usize>],
) -> Vec<usize> {
    let mut component = Vec::new();
    let mut stack = vec![start];
    while let Some(vertex) = stack.pop() {
        visited[vertex] = true;
        component.push(cluster[vertex]);
        for &neighbour in &adjacency[vertex] {
            if !visited[neighbour] {
                stack.push(neighbour);
            }
        }
    }
    component
}

/// Split *cluster* (point ranks into *cloud*) at gaps wider than *dmax*.
///
/// Components with at least *min_size* points survive as new clusters.
/// When no tree edge exceeds the gap width the single component is kept
/// whatever its size, so clusters that passed the pruning are not lost
/// here.
pub fn split_cluster_at_gaps<T>(
    cluster: &[usize],
    cloud: &PointCloud<T>,
    dmax: T,
    min_size: usize,
) -> Vec<Vec<usize>>
where
    T: Float + Debug,
{
    let nb_vertices = cluster.len();
    let edges = create_edges(cloud, cluster);
    let mut mst_edges = minimum_spanning_tree(edges, nb_vertices);
    //
    let nb_before = mst_edges.len();
    let dmax2 = dmax * dmax;
    mst_edges.retain(|edge| edge.weight <= dmax2);
    let nb_removed = nb_before - mst_edges.len();
    //
    let adjacency = create_adjacency(nb_vertices, &mst_edges);
    let mut visited = vec![false; nb_vertices];
    let mut new_clusters = Vec::new();
    for vertex in 0..nb_vertices {
        if !visited[vertex] {
            let component = collect_component(vertex, &mut visited, cluster, &adjacency);
            if component.len() >= min_size || nb_removed == 0 {
                new_clusters.push(component);
            }
        }
    }
    log::debug!(
        "split_cluster_at_gaps : {} points, {} removed edges, {} components kept",
        nb_vertices,
        nb_removed,
        new_clusters.len()
    );
    new_clusters
}

//========================================================

#[cfg(test)]
mod tests {

    use super::*;
    use crate::cloud::Point;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn two_segments_cloud(gap: f64) -> PointCloud<f64> {
        let mut cloud = PointCloud::new();
        for i in 0..10 {
            cloud.push(Point::with_index(i as f64, 0., 0., i));
        }
        for i in 0..10 {
            cloud.push(Point::with_index(9. + gap + i as f64, 0., 0., 10 + i));
        }
        cloud
    }

    #[test]
    fn test_no_gap_keeps_cluster() {
        log_init_test();
        let cloud = two_segments_cloud(1.);
        let cluster: Vec<usize> = (0..20).collect();
        let split = split_cluster_at_gaps(&cluster, &cloud, 1.5, 7);
        assert_eq!(split.len(), 1);
        let mut points = split[0].clone();
        points.sort_unstable();
        assert_eq!(points, cluster);
    }

    #[test]
    fn test_gap_splits_cluster() {
        log_init_test();
        let cloud = two_segments_cloud(5.);
        let cluster: Vec<usize> = (0..20).collect();
        let split = split_cluster_at_gaps(&cluster, &cloud, 1.5, 7);
        assert_eq!(split.len(), 2);
        for component in &split {
            assert_eq!(component.len(), 10);
        }
    }

    #[test]
    fn test_small_components_are_dropped_after_split() {
        log_init_test();
        // a chain of 3 and a chain of 10 separated by a gap
        let mut cloud = PointCloud::new();
        for i in 0..3 {
            cloud.push(Point::with_index(i as f64, 0., 0., i));
        }
        for i in 0..10 {
            cloud.push(Point::with_index(20. + i as f64, 0., 0., 3 + i));
        }
        let cluster: Vec<usize> = (0..13).collect();
        let split = split_cluster_at_gaps(&cluster, &cloud, 1.5, 7);
        assert_eq!(split.len(), 1);
        assert_eq!(split[0].len(), 10);
    }

    #[test]
    fn test_small_cluster_without_gap_survives() {
        log_init_test();
        // no removed edge: the component is kept although it is smaller
        // than min_size
        let mut cloud = PointCloud::new();
        for i in 0..4 {
            cloud.push(Point::with_index(i as f64, 0., 0., i));
        }
        let cluster: Vec<usize> = (0..4).collect();
        let split = split_cluster_at_gaps(&cluster, &cloud, 1.5, 7);
        assert_eq!(split.len(), 1);
        assert_eq!(split[0].len(), 4);
    }

    #[test]
    fn test_squared_weights_against_squared_threshold() {
        log_init_test();
        // spacing 2 with dmax 1.9: every edge is a gap, all components are
        // singletons and get dropped (edges were removed)
        let mut cloud = PointCloud::new();
        for i in 0..5 {
            cloud.push(Point::with_index(2. * i as f64, 0., 0., i));
        }
        let cluster: Vec<usize> = (0..5).collect();
        let split = split_cluster_at_gaps(&cluster, &cloud, 1.9, 3);
        assert!(split.is_empty());
        // with dmax exactly the spacing nothing is removed
        let split = split_cluster_at_gaps(&cluster, &cloud, 2., 3);
        assert_eq!(split.len(), 1);
    }
} // end of tests
