//! automatic choice of the dendrogram cut height.
//!
//! The merge height sequence of an agglomerative clustering is monotone for
//! the supported linkages. While merges happen within one curve the heights
//! grow slowly; the first merge between different curves shows up as an
//! unexpectedly large jump. The scan below finds the first height that
//! exceeds its predecessor by more than twice the sample standard deviation
//! of the heights so far, restricted to the upper half of the sequence
//! where enough history is available.

use num_traits::Float;

use std::fmt::Debug;

// unbiased sample standard deviation
fn standard_deviation<T>(values: &[T]) -> T
where
    T: Float,
{
    let nb = T::from(values.len()).unwrap();
    let mean = values.iter().fold(T::zero(), |acc, &v| acc + v) / nb;
    let sum = values.iter().fold(T::zero(), |acc, &v| {
        let dev = mean - v;
        acc + dev * dev
    });
    (sum / (nb - T::one())).sqrt()
}

/// Index of the first unexpectedly large merge height in *cdists*, or
/// cdists.len() if every merge looks regular (then everything is one
/// cluster). Cutting a clustering of n items at the returned index k keeps
/// n - k clusters.
pub fn automatic_cut_index<T>(cdists: &[T]) -> usize
where
    T: Float + Debug,
{
    let nb_merges = cdists.len();
    if nb_merges == 0 {
        return 0;
    }
    let two = T::from(2).unwrap();
    let tiny = T::from(1.0e-8).unwrap();
    // the scan needs at least one predecessor height
    let start = (nb_merges / 2).max(1);
    for k in start..nb_merges {
        // an all zero history means nothing has separated yet
        if (cdists[k - 1] > T::zero() || cdists[k] > tiny)
            && cdists[k] > cdists[k - 1] + two * standard_deviation(&cdists[0..=k])
        {
            return k;
        }
    }
    nb_merges
}

/// Index of the first merge height at least *threshold*, or cdists.len().
pub fn fixed_cut_index<T>(cdists: &[T], threshold: T) -> usize
where
    T: Float + Debug,
{
    for (k, &height) in cdists.iter().enumerate() {
        if height >= threshold {
            return k;
        }
    }
    cdists.len()
}

/// The merge height threshold implied by cutting at index *k*: halfway
/// between the last regular and the first separating merge, or the last
/// height if no merge separates.
pub fn implied_threshold<T>(cdists: &[T], k: usize) -> Option<T>
where
    T: Float + Debug,
{
    if cdists.is_empty() || k == 0 {
        return None;
    }
    if k < cdists.len() {
        Some((cdists[k - 1] + cdists[k]) / T::from(2).unwrap())
    } else {
        Some(cdists[cdists.len() - 1])
    }
}

//========================================================

// end of tests
