//! csv loader for point clouds.
//!
//! One point per line, `#` starts a comment line, the column delimiter is a
//! single configurable character. Two columns per record declare a 2D cloud
//! (z is set to 0), three or more columns a 3D cloud; everything after the
//! third column is ignored. Mixing 2- and 3-column records is an error.

use anyhow::{anyhow, bail, Context};

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::point::{Point, PointCloud};

/// Load the csv file *fname* into a point cloud.
///
/// *delimiter* separates the columns; the first *skip* lines are dropped
/// unread. Row and column numbers in error messages refer to the file, i.e.
/// they include skipped lines.
pub fn load_csv_file<P: AsRef<Path>>(
    fname: P,
    delimiter: char,
    skip: usize,
) -> anyhow::Result<PointCloud<f64>> {
    let filepath = fname.as_ref();
    let fileres = OpenOptions::new().read(true).open(filepath);
    if fileres.is_err() {
        log::error!("load_csv_file could not open {:?}", filepath.as_os_str());
        return Err(anyhow!(
            "load_csv_file could not open file {}",
            filepath.display()
        ));
    }
    let file = fileres?;
    let mut bufreader = BufReader::new(file);

    // skip the header
    let mut skipped = 0;
    let mut line = String::new();
    for _ in 0..skip {
        line.clear();
        let n = bufreader
            .read_line(&mut line)
            .with_context(|| format!("cannot read file {}", filepath.display()))?;
        if n == 0 {
            break;
        }
        skipped += 1;
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(bufreader);

    let mut cloud = PointCloud::<f64>::new();
    let mut count2d = 0;
    let mut countpoints = 0;

    for result in rdr.records() {
        let record = result.with_context(|| format!("in file {}", filepath.display()))?;
        // row number in the original file, for error reporting
        let row = record
            .position()
            .map(|p| p.line() as usize + skipped)
            .unwrap_or(0);
        // whitespace-only lines come out as records of empty fields
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() < 2 {
            bail!("row {}: too few columns", row);
        }
        let is2d_record = record.len() == 2;
        if is2d_record {
            count2d += 1;
        }
        let mut coords = [0.0f64; 3];
        for (column, coord) in coords.iter_mut().enumerate().take(if is2d_record {
            2
        } else {
            3
        }) {
            let field = record.get(column).unwrap();
            *coord = field
                .parse::<f64>()
                .map_err(|e| anyhow!("row {} column {}: {}", row, column + 1, e))?;
        }
        cloud.push(Point::with_index(
            coords[0],
            coords[1],
            coords[2],
            countpoints,
        ));
        countpoints += 1;
    }

    // a cloud is 2d only if every record had two columns
    if count2d > 0 && count2d != cloud.len() {
        bail!("mixed 2d and 3d points");
    } else if count2d > 0 {
        cloud.set_2d(true);
    }
    //
    log::debug!(
        "load_csv_file read {} points from {}, 2d : {}",
        cloud.len(),
        filepath.display(),
        cloud.is_2d()
    );
    //
    Ok(cloud)
}

//========================================================

// end of tests
