//! defines points and clouds of points

use num_traits::Float;

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::ops::{Add, Div, Index, IndexMut, Mul, Sub};

/// A single 3D point. For 2D data the z coordinate is 0.
///
/// Besides its coordinates a point carries the rank it had in the input
/// (`index`, used to restrict triplet generation on ordered clouds) and the
/// set of cluster labels assigned at the end of the pipeline. A point with
/// an empty label set is noise.
#[derive(Debug, Clone)]
pub struct Point<T> {
    x: T,
    y: T,
    z: T,
    // rank of the point in the input cloud
    index: usize,
    // labels of the clusters the point belongs to
    cluster_ids: BTreeSet<usize>,
}

impl<T> Point<T>
where
    T: Float + Debug,
{
    pub fn new(x: T, y: T, z: T) -> Self {
        Point {
            x,
            y,
            z,
            index: 0,
            cluster_ids: BTreeSet::new(),
        }
    }

    /// a point with its rank in the input cloud
    pub fn with_index(x: T, y: T, z: T, index: usize) -> Self {
        Point {
            x,
            y,
            z,
            index,
            cluster_ids: BTreeSet::new(),
        }
    }

    pub fn get_x(&self) -> T {
        self.x
    }

    pub fn get_y(&self) -> T {
        self.y
    }

    pub fn get_z(&self) -> T {
        self.z
    }

    /// coordinates as an array, in x, y, z order
    pub fn get_position(&self) -> [T; 3] {
        [self.x, self.y, self.z]
    }

    /// rank of the point in the input cloud
    pub fn get_index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// labels of the clusters this point was assigned to (empty: noise)
    pub fn get_cluster_ids(&self) -> &BTreeSet<usize> {
        &self.cluster_ids
    }

    pub fn add_cluster_id(&mut self, id: usize) {
        self.cluster_ids.insert(id);
    }

    /// scalar product
    pub fn dot(&self, other: &Point<T>) -> T {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// euclidean norm
    pub fn norm(&self) -> T {
        self.squared_norm().sqrt()
    }

    /// squared euclidean norm
    pub fn squared_norm(&self) -> T {
        self.x * self.x + self.y * self.y + self.z * self.z
    }
} // end of impl Point

// equality is by coordinates only
impl<T> PartialEq for Point<T>
where
    T: Float + Debug,
{
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}

impl<T> Add for &Point<T>
where
    T: Float + Debug,
{
    type Output = Point<T>;

    fn add(self, other: &Point<T>) -> Point<T> {
        Point::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl<T> Sub for &Point<T>
where
    T: Float + Debug,
{
    type Output = Point<T>;

    fn sub(self, other: &Point<T>) -> Point<T> {
        Point::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

// scalar multiplication
impl<T> Mul<T> for &Point<T>
where
    T: Float + Debug,
{
    type Output = Point<T>;

    fn mul(self, c: T) -> Point<T> {
        Point::new(self.x * c, self.y * c, self.z * c)
    }
}

// scalar division
impl<T> Div<T> for &Point<T>
where
    T: Float + Debug,
{
    type Output = Point<T>;

    fn div(self, c: T) -> Point<T> {
        Point::new(self.x / c, self.y / c, self.z / c)
    }
}

//========================================

/// An ordered sequence of points.
///
/// The `is2d` flag records that the input had two columns (z is then 0 for
/// every point). The `ordered` flag declares the input as sampled along the
/// curve, which restricts triplet generation to monotone index triples.
#[derive(Debug, Clone)]
pub struct PointCloud<T> {
    points: Vec<Point<T>>,
    points2d: bool,
    ordered: bool,
}

impl<T> PointCloud<T>
where
    T: Float + Debug,
{
    pub fn new() -> Self {
        PointCloud {
            points: Vec::new(),
            points2d: false,
            ordered: false,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        PointCloud {
            points: Vec::with_capacity(capacity),
            points2d: false,
            ordered: false,
        }
    }

    pub fn push(&mut self, point: Point<T>) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point<T>> {
        self.points.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Point<T>> {
        self.points.iter_mut()
    }

    pub fn get_points(&self) -> &[Point<T>] {
        &self.points
    }

    pub fn set_2d(&mut self, is2d: bool) {
        self.points2d = is2d;
    }

    pub fn is_2d(&self) -> bool {
        self.points2d
    }

    pub fn set_ordered(&mut self, ordered: bool) {
        self.ordered = ordered;
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }
} // end of impl PointCloud

impl<T> Index<usize> for PointCloud<T> {
    type Output = Point<T>;

    fn index(&self, i: usize) -> &Point<T> {
        &self.points[i]
    }
}

impl<T> IndexMut<usize> for PointCloud<T> {
    fn index_mut(&mut self, i: usize) -> &mut Point<T> {
        &mut self.points[i]
    }
}

//========================================================

// end of tests
