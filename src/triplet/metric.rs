//! dissimilarity of two triplets.

use num_traits::Float;

use std::fmt::Debug;

use super::Triplet;

/// Dissimilarity of two triplets seen as oriented line segments, scaled by
/// an external length factor.
///
/// The measure combines the larger of the two perpendicular distances
/// between the segment centers (each taken against the other segment's
/// direction, divided by the scale) with the tangent of the angle between
/// the directions. Near perpendicular pairs are not comparable and get a
/// large finite value. The measure is symmetric and non-negative but not a
/// metric, which is all hierarchical clustering needs.
pub struct ScaleTripletMetric<T> {
    scale: T,
}

impl<T> ScaleTripletMetric<T>
where
    T: Float + Debug,
{
    /// *scale* must be positive, typically a multiple of the cloud's dnn.
    pub fn new(scale: T) -> Self {
        ScaleTripletMetric { scale }
    }

    pub fn dissimilarity(&self, lhs: &Triplet<T>, rhs: &Triplet<T>) -> T {
        let lhs_center = lhs.get_center();
        let rhs_center = rhs.get_center();
        let lhs_direction = lhs.get_direction();
        let rhs_direction = rhs.get_direction();
        //
        let delta = rhs_center - lhs_center;
        let delta_back = lhs_center - rhs_center;
        // perpendicular component of the center offset w.r.t. each direction
        let perpendicular_a =
            (&delta + &(lhs_direction * lhs_direction.dot(&delta_back))).squared_norm();
        let perpendicular_b =
            (&delta_back + &(rhs_direction * rhs_direction.dot(&delta))).squared_norm();
        //
        let mut anglecos = lhs_direction.dot(rhs_direction);
        if anglecos > T::one() {
            anglecos = T::one();
        }
        if anglecos < -T::one() {
            anglecos = -T::one();
        }
        if anglecos.abs() < T::from(1.0e-8).unwrap() {
            // near perpendicular segments are effectively non-comparable
            return T::from(1.0e8).unwrap();
        }
        perpendicular_a.max(perpendicular_b).sqrt() / self.scale + anglecos.acos().tan().abs()
    }
} // end of impl ScaleTripletMetric

//========================================================

// end of tests
