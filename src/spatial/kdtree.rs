//! a static k-d tree over 3D points.
//!
//! The tree is bulk-built once by median splits and immutable afterwards.
//! Every item carries a caller supplied payload (the triplet generator
//! stores the rank of the point in its cloud there). Queries return squared
//! euclidean distances; ties are broken by item insertion order so that all
//! results are deterministic for a given input order.

use num_traits::Float;

use std::fmt::Debug;

// a tree node refers to one item and its children
struct Node {
    item: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// Static k-d tree over items of a position and a payload.
///
/// 2D data is indexed with z = 0, the splitting axis just cycles through a
/// degenerate third dimension in that case.
pub struct KdTree<T, D> {
    positions: Vec<[T; 3]>,
    payloads: Vec<D>,
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl<T, D> KdTree<T, D>
where
    T: Float + Debug,
    D: Clone,
{
    /// Bulk-build the tree from items in insertion order.
    pub fn build(items: Vec<([T; 3], D)>) -> Self {
        let mut positions = Vec::with_capacity(items.len());
        let mut payloads = Vec::with_capacity(items.len());
        for (position, payload) in items {
            positions.push(position);
            payloads.push(payload);
        }
        let mut tree = KdTree {
            positions,
            payloads,
            nodes: Vec::new(),
            root: None,
        };
        let mut order: Vec<usize> = (0..tree.positions.len()).collect();
        tree.nodes.reserve(order.len());
        tree.root = tree.build_recursive(&mut order, 0);
        tree
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    // split *items* at the median along the cycling axis. Coordinate ties are
    // ordered by insertion rank so the layout only depends on the input order.
    fn build_recursive(&mut self, items: &mut [usize], depth: usize) -> Option<usize> {
        if items.is_empty() {
            return None;
        }
        let axis = depth % 3;
        let mid = items.len() / 2;
        items.select_nth_unstable_by(mid, |&a, &b| {
            self.positions[a][axis]
                .partial_cmp(&self.positions[b][axis])
                .unwrap()
                .then(a.cmp(&b))
        });
        let item = items[mid];
        // placeholder node, children are patched in below
        let node_id = self.nodes.len();
        self.nodes.push(Node {
            item,
            left: None,
            right: None,
        });
        let (lower, rest) = items.split_at_mut(mid);
        let upper = &mut rest[1..];
        let left = self.build_recursive(lower, depth + 1);
        let right = self.build_recursive(upper, depth + 1);
        self.nodes[node_id].left = left;
        self.nodes[node_id].right = right;
        Some(node_id)
    }

    fn squared_distance(a: &[T; 3], b: &[T; 3]) -> T {
        let dx = a[0] - b[0];
        let dy = a[1] - b[1];
        let dz = a[2] - b[2];
        dx * dx + dy * dy + dz * dz
    }

    /// The k items nearest to *query* as (squared distance, payload) pairs in
    /// ascending distance order. A query position that was indexed is part of
    /// its own result. k larger than the number of items is clamped.
    pub fn k_nearest(&self, query: &[T; 3], k: usize) -> Vec<(T, D)> {
        let k = k.min(self.len());
        if k == 0 {
            return Vec::new();
        }
        // best holds (squared distance, insertion rank), ascending
        let mut best: Vec<(T, usize)> = Vec::with_capacity(k + 1);
        if let Some(root) = self.root {
            self.knn_recursive(root, 0, query, k, &mut best);
        }
        best.into_iter()
            .map(|(d2, item)| (d2, self.payloads[item].clone()))
            .collect()
    }

    fn knn_recursive(
        &self,
        node_id: usize,
        depth: usize,
        query: &[T; 3],
        k: usize,
        best: &mut Vec<(T, usize)>,
    ) {
        let node = &self.nodes[node_id];
        let position = &self.positions[node.item];
        let d2 = Self::squared_distance(query, position);
        let candidate = (d2, node.item);
        if best.len() < k || candidate < best[best.len() - 1] {
            let at = best.partition_point(|entry| *entry < candidate);
            best.insert(at, candidate);
            best.truncate(k);
        }
        let axis = depth % 3;
        let diff = query[axis] - position[axis];
        let (near, far) = if diff < T::zero() {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(near) = near {
            self.knn_recursive(near, depth + 1, query, k, best);
        }
        // the far half space can still hold closer items, or equal distances
        // won by insertion order
        if let Some(far) = far {
            if best.len() < k || diff * diff <= best[best.len() - 1].0 {
                self.knn_recursive(far, depth + 1, query, k, best);
            }
        }
    }

    /// All items within euclidean distance *radius* of *query* as (squared
    /// distance, payload) pairs. The order is the tree traversal order.
    pub fn range(&self, query: &[T; 3], radius: T) -> Vec<(T, D)> {
        let mut result = Vec::new();
        if let Some(root) = self.root {
            self.range_recursive(root, 0, query, radius * radius, &mut result);
        }
        result
            .into_iter()
            .map(|(d2, item)| (d2, self.payloads[item].clone()))
            .collect()
    }

    fn range_recursive(
        &self,
        node_id: usize,
        depth: usize,
        query: &[T; 3],
        radius2: T,
        result: &mut Vec<(T, usize)>,
    ) {
        let node = &self.nodes[node_id];
        let position = &self.positions[node.item];
        let d2 = Self::squared_distance(query, position);
        if d2 <= radius2 {
            result.push((d2, node.item));
        }
        let axis = depth % 3;
        let diff = query[axis] - position[axis];
        if let Some(left) = node.left {
            if diff < T::zero() || diff * diff <= radius2 {
                self.range_recursive(left, depth + 1, query, radius2, result);
            }
        }
        if let Some(right) = node.right {
            if diff >= T::zero() || diff * diff <= radius2 {
                self.range_recursive(right, depth + 1, query, radius2, result);
            }
        }
    }
} // end of impl KdTree

//========================================================

// end of tests
