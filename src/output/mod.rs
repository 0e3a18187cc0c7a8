//! writers for the result and debug files.
//!
//! The csv output lists every input point with the labels of the curves it
//! belongs to (`-1` for noise, `;` separated labels for points on several
//! curves). The gnuplot output renders one inline dataset per cluster with
//! a colour derived from the cluster label, noise in red, plus the
//! smoothed-cloud and merge-height debug dumps.

use num_traits::Float;

use std::fmt::{Debug, Display};
use std::io::Write;

use crate::cloud::{Point, PointCloud};
use crate::cluster::ClusterGroup;

/// Deterministic rgb colour for a cluster label, packed as 0xrrggbb.
pub fn compute_cluster_colour(cluster_index: usize) -> u32 {
    let r = ((cluster_index * 23) % 19) as f64 / 18.0;
    let g = ((cluster_index * 23) % 7) as f64 / 6.0;
    let b = ((cluster_index * 23) % 3) as f64 / 2.0;
    let r = (r * 255.) as u32;
    let g = (g * 255.) as u32;
    let b = (b * 255.) as u32;
    (r << 16) | (g << 8) | b
}

// coordinate wise minimum and maximum over the cloud
fn find_min_max_point<T>(cloud: &PointCloud<T>) -> (Point<T>, Point<T>)
where
    T: Float + Debug,
{
    let first = &cloud[0];
    let (mut min, mut max) = (first.get_position(), first.get_position());
    for p in cloud.iter() {
        let position = p.get_position();
        for d in 0..3 {
            if min[d] > position[d] {
                min[d] = position[d];
            } else if max[d] < position[d] {
                max[d] = position[d];
            }
        }
    }
    (
        Point::new(min[0], min[1], min[2]),
        Point::new(max[0], max[1], max[2]),
    )
}

// one axis range line; a degenerate range is widened so gnuplot accepts it
fn write_axis_range<T, W>(out: &mut W, axis: &str, min: T, max: T) -> std::io::Result<()>
where
    T: Float + Debug + Display,
    W: Write,
{
    if max > min {
        writeln!(out, "set {}range [{:.6}:{:.6}]", axis, min, max)
    } else {
        writeln!(
            out,
            "set {}range [{:.6}:{:.6}]",
            axis,
            min - T::one(),
            max + T::one()
        )
    }
}

/// Write the labelled *cloud* as csv: `x,y,z,curveID` (or `x,y,curveID` for
/// 2D input), noise as label -1, multiple labels `;` separated.
pub fn clusters_to_csv<T, W>(cloud: &PointCloud<T>, out: &mut W) -> std::io::Result<()>
where
    T: Float + Debug + Display,
    W: Write,
{
    let is2d = cloud.is_2d();
    writeln!(out, "# Comment: curveID -1 represents noise")?;
    writeln!(out, "# x, y, z, curveID")?;
    for p in cloud.iter() {
        write!(out, "{:.6},{:.6},", p.get_x(), p.get_y())?;
        if !is2d {
            write!(out, "{:.6},", p.get_z())?;
        }
        if p.get_cluster_ids().is_empty() {
            writeln!(out, "-1")?;
        } else {
            let labels: Vec<String> = p
                .get_cluster_ids()
                .iter()
                .map(|id| id.to_string())
                .collect();
            writeln!(out, "{}", labels.join(";"))?;
        }
    }
    Ok(())
}

/// Write the labelled *cloud* as a gnuplot script with one dataset per
/// cluster of *cl_group* and the unclustered points in red.
pub fn clusters_to_gnuplot<T, W>(
    cloud: &PointCloud<T>,
    cl_group: &ClusterGroup,
    out: &mut W,
) -> std::io::Result<()>
where
    T: Float + Debug + Display,
    W: Write,
{
    let is2d = cloud.is_2d();
    let mut clustered = vec![false; cloud.len()];
    //
    // dataset declarations for the clusters
    let mut dataset_header = String::new();
    let mut dataset_points = String::new();
    for (cluster_index, point_ranks) in cl_group.iter().enumerate() {
        // empty base clusters remain when their points moved to an overlap
        // cluster
        if point_ranks.is_empty() {
            continue;
        }
        let rgb_hex = compute_cluster_colour(cluster_index);
        dataset_header.push_str(&format!(" '-' with points lc '#{:x}", rgb_hex));
        let cluster_ids = cloud[point_ranks[0]].get_cluster_ids();
        if cluster_ids.len() > 1 {
            let labels: Vec<String> = cluster_ids.iter().map(|id| id.to_string()).collect();
            dataset_header.push_str(&format!("' title 'overlap {}", labels.join(";")));
        } else {
            dataset_header.push_str(&format!(
                "' title 'curve {}",
                cluster_ids.iter().next().unwrap()
            ));
        }
        dataset_header.push_str("',");
        //
        for &point_rank in point_ranks.iter() {
            clustered[point_rank] = true;
            let p = &cloud[point_rank];
            dataset_points.push_str(&format!("{:.6} {:.6}", p.get_x(), p.get_y()));
            if !is2d {
                dataset_points.push_str(&format!(" {:.6}", p.get_z()));
            }
            dataset_points.push('\n');
        }
        dataset_points.push_str("e\n");
    }
    dataset_header.push('\n');
    //
    // noise dataset with all points in no cluster
    let mut noise_header = String::new();
    let mut noise_points = String::new();
    if clustered.iter().any(|&c| !c) {
        noise_header.push_str(" '-' with points lc 'red' title 'noise',");
        for (point_rank, _) in clustered.iter().enumerate().filter(|(_, &c)| !c) {
            let p = &cloud[point_rank];
            noise_points.push_str(&format!("{:.6} {:.6}", p.get_x(), p.get_y()));
            if !is2d {
                noise_points.push_str(&format!(" {:.6}", p.get_z()));
            }
            noise_points.push('\n');
        }
        noise_points.push_str("e\n");
    }
    //
    if !is2d {
        let (min, max) = find_min_max_point(cloud);
        write_axis_range(out, "x", min.get_x(), max.get_x())?;
        write_axis_range(out, "y", min.get_y(), max.get_y())?;
        write_axis_range(out, "z", min.get_z(), max.get_z())?;
        write!(out, "splot ")?;
    } else {
        // 2D data plots without ranges
        write!(out, "plot")?;
    }
    write!(out, "{}", noise_header)?;
    write!(out, "{}", dataset_header)?;
    write!(out, "{}", noise_points)?;
    write!(out, "{}", dataset_points)?;
    write!(out, "pause mouse keypress\n")?;
    Ok(())
}

/// Write the plain coordinates of *cloud* as csv (debug dump of the
/// smoothed cloud).
pub fn cloud_to_csv<T, W>(cloud: &PointCloud<T>, out: &mut W) -> std::io::Result<()>
where
    T: Float + Debug + Display,
    W: Write,
{
    let is2d = cloud.is_2d();
    writeln!(out, "# x,y,z")?;
    for p in cloud.iter() {
        write!(out, "{:.6},{:.6}", p.get_x(), p.get_y())?;
        if !is2d {
            write!(out, ",{:.6}", p.get_z())?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Write a gnuplot script showing *cloud* in black and its smoothed
/// counterpart in red (debug dump of the smoothing step).
pub fn debug_gnuplot<T, W>(
    cloud: &PointCloud<T>,
    cloud_smooth: &PointCloud<T>,
    out: &mut W,
) -> std::io::Result<()>
where
    T: Float + Debug + Display,
    W: Write,
{
    let is2d = cloud.is_2d();
    if !is2d {
        let (min, max) = find_min_max_point(cloud);
        write_axis_range(out, "x", min.get_x(), max.get_x())?;
        write_axis_range(out, "y", min.get_y(), max.get_y())?;
        write_axis_range(out, "z", min.get_z(), max.get_z())?;
        write!(out, "splot ")?;
    } else {
        write!(out, "plot ")?;
    }
    writeln!(
        out,
        "'-' with points lc 'black' title 'original', '-' with points lc 'red' title 'smoothed'"
    )?;
    for half in [cloud, cloud_smooth] {
        for p in half.iter() {
            write!(out, "{:.6} {:.6}", p.get_x(), p.get_y())?;
            if !is2d {
                write!(out, " {:.6}", p.get_z())?;
            }
            writeln!(out)?;
        }
        writeln!(out, "e")?;
    }
    write!(out, "pause mouse keypress\n")?;
    Ok(())
}

/// Write the merge heights, one per line in merge order (debug dump used to
/// inspect the automatic threshold).
pub fn cdists_to_csv<T, W>(cdists: &[T], out: &mut W) -> std::io::Result<()>
where
    T: Float + Debug + Display,
    W: Write,
{
    for height in cdists {
        writeln!(out, "{:.6}", height)?;
    }
    Ok(())
}

//========================================================

#[cfg(test)]
mod tests {

    use super::*;
    use crate::cloud::Point;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn labelled_cloud() -> (PointCloud<f64>, ClusterGroup) {
        let mut cloud = PointCloud::new();
        for i in 0..4 {
            cloud.push(Point::with_index(i as f64, 0., 0., i));
        }
        let mut cl_group: ClusterGroup = vec![vec![0, 1], vec![2]];
        crate::cluster::add_clusters(&mut cloud, &mut cl_group, false);
        (cloud, cl_group)
    }

    #[test]
    fn test_cluster_colour_is_deterministic() {
        log_init_test();
        assert_eq!(compute_cluster_colour(0), 0);
        let c1 = compute_cluster_colour(1);
        assert_eq!(c1, compute_cluster_colour(1));
        // components stay in 8 bit range by construction
        assert!(c1 <= 0xffffff);
    }

    #[test]
    fn test_csv_output() {
        log_init_test();
        let (cloud, _) = labelled_cloud();
        let mut out = Vec::new();
        clusters_to_csv(&cloud, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with('#'));
        assert!(lines[1].starts_with('#'));
        assert_eq!(lines[2], "0.000000,0.000000,0.000000,0");
        assert_eq!(lines[4], "2.000000,0.000000,0.000000,1");
        // unlabelled point is noise
        assert_eq!(lines[5], "3.000000,0.000000,0.000000,-1");
    }

    #[test]
    fn test_csv_output_2d() {
        log_init_test();
        let mut cloud = PointCloud::new();
        cloud.push(Point::with_index(1., 2., 0., 0));
        cloud.set_2d(true);
        let mut out = Vec::new();
        clusters_to_csv(&cloud, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().nth(2).unwrap().eq("1.000000,2.000000,-1"));
    }

    #[test]
    fn test_csv_multi_label() {
        log_init_test();
        let mut cloud = PointCloud::new();
        let mut p = Point::with_index(0., 0., 0., 0);
        p.add_cluster_id(2);
        p.add_cluster_id(0);
        cloud.push(p);
        let mut out = Vec::new();
        clusters_to_csv(&cloud, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        // labels ascending, ';' separated
        assert!(text.contains(",0;2"));
    }

    #[test]
    fn test_gnuplot_output_structure() {
        log_init_test();
        let (cloud, cl_group) = labelled_cloud();
        let mut out = Vec::new();
        clusters_to_gnuplot(&cloud, &cl_group, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("set xrange"));
        assert!(text.contains("splot "));
        assert!(text.contains("title 'noise'"));
        assert!(text.contains("title 'curve 0'"));
        assert!(text.contains("title 'curve 1'"));
        assert!(text.ends_with("pause mouse keypress\n"));
        // one data terminator per dataset: noise + two clusters
        assert_eq!(text.matches("\ne\n").count(), 3);
    }

    #[test]
    fn test_gnuplot_2d_uses_plot() {
        log_init_test();
        let mut cloud = PointCloud::new();
        cloud.push(Point::with_index(0., 0., 0., 0));
        cloud.push(Point::with_index(1., 1., 0., 1));
        cloud.set_2d(true);
        let cl_group = ClusterGroup::new();
        let mut out = Vec::new();
        clusters_to_gnuplot(&cloud, &cl_group, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("plot '-'"));
        assert!(!text.contains("splot"));
        assert!(!text.contains("set xrange"));
    }

    #[test]
    fn test_gnuplot_overlap_title() {
        log_init_test();
        let mut cloud = PointCloud::new();
        for i in 0..3 {
            cloud.push(Point::with_index(i as f64, 0., 0., i));
        }
        let mut cl_group: ClusterGroup = vec![vec![0], vec![1], vec![2]];
        cloud[2].add_cluster_id(0);
        cloud[2].add_cluster_id(1);
        cloud[0].add_cluster_id(0);
        cloud[1].add_cluster_id(1);
        let mut out = Vec::new();
        clusters_to_gnuplot(&cloud, &cl_group, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("title 'overlap 0;1'"));
    }

    #[test]
    fn test_degenerate_range_is_widened() {
        log_init_test();
        let mut cloud = PointCloud::new();
        cloud.push(Point::with_index(2., 3., 4., 0));
        let cl_group = ClusterGroup::new();
        let mut out = Vec::new();
        clusters_to_gnuplot(&cloud, &cl_group, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("set xrange [1.000000:3.000000]"));
        assert!(text.contains("set zrange [3.000000:5.000000]"));
    }

    #[test]
    fn test_cloud_to_csv() {
        log_init_test();
        let mut cloud = PointCloud::new();
        cloud.push(Point::with_index(1., 2., 3., 0));
        let mut out = Vec::new();
        cloud_to_csv(&cloud, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "# x,y,z\n1.000000,2.000000,3.000000\n");
    }

    #[test]
    fn test_debug_gnuplot_two_datasets() {
        log_init_test();
        let mut cloud = PointCloud::new();
        cloud.push(Point::with_index(0., 0., 0., 0));
        cloud.push(Point::with_index(1., 0., 0., 1));
        let smoothed = cloud.clone();
        let mut out = Vec::new();
        debug_gnuplot(&cloud, &smoothed, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("title 'original'"));
        assert!(text.contains("title 'smoothed'"));
        assert_eq!(text.matches("\ne\n").count(), 2);
    }

    #[test]
    fn test_cdists_to_csv() {
        log_init_test();
        let mut out = Vec::new();
        cdists_to_csv(&[0.5f64, 1.25], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0.500000\n1.250000\n");
    }
} // end of tests
