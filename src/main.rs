//! command line front end of the curve detection pipeline.
//!
//! Reads a point cloud from csv, runs smoothing, triplet generation,
//! hierarchical triplet clustering with automatic or fixed cut, pruning,
//! label propagation and optional gap splitting, and writes the labelled
//! cloud as csv or gnuplot script.
//!
//! Exit codes: 0 on success, 1 for command line errors, 2 for input errors,
//! 3 for semantic errors (a characteristic length of zero, or the point
//! limit of the demo build).

use anyhow::anyhow;
use clap::{Arg, ArgAction, Command};
use cpu_time::ProcessTime;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::process::exit;
use std::time::SystemTime;

use curveclust::cloud::load_csv_file;
use curveclust::cluster::{
    add_clusters, cluster_triplets, cluster_triplets_to_points, remove_small_clusters,
    split_cluster_at_gaps, ClusterGroup, CutThreshold,
};
use curveclust::hclust::Linkage;
use curveclust::output::{
    cdists_to_csv, cloud_to_csv, clusters_to_csv, clusters_to_gnuplot, debug_gnuplot,
};
use curveclust::spatial::{first_quartile, smoothen_cloud};
use curveclust::triplet::generate_triplets;

/// a length parameter, either absolute or a multiple of the characteristic
/// length dnn
#[derive(Debug, Clone, Copy)]
struct DnnScaled {
    value: f64,
    times_dnn: bool,
}

fn parse_dnn_scaled(arg: &str) -> anyhow::Result<DnnScaled> {
    let trimmed = arg.trim();
    let (number, times_dnn) = match trimmed
        .strip_suffix("dnn")
        .or_else(|| trimmed.strip_suffix("dNN"))
    {
        Some(prefix) => (prefix.trim_end(), true),
        None => (trimmed, false),
    };
    let value = number
        .parse::<f64>()
        .map_err(|_| anyhow!("'{}' is not a number", arg))?;
    Ok(DnnScaled { value, times_dnn })
}

#[derive(Debug)]
struct Params {
    infile: String,
    oprefix: Option<String>,
    gnuplot: bool,
    delimiter: char,
    skip: usize,
    verbosity: u8,
    // smoothing
    r: DnnScaled,
    // triplet building
    k: usize,
    n: usize,
    a: f64,
    ordered: bool,
    // triplet clustering
    s: DnnScaled,
    threshold: CutThreshold<f64>,
    m: usize,
    dmax: Option<DnnScaled>,
    link: Linkage,
}

fn command() -> Command {
    Command::new("curveclust")
        .version(env!("CARGO_PKG_VERSION"))
        .about("detection of curves in 2D/3D point clouds by triplet clustering")
        .arg(Arg::new("infile").required(true).help("csv file with one point per line"))
        .arg(
            Arg::new("radius")
                .short('r')
                .long("radius")
                .value_name("V[dnn]")
                .default_value("2dnn")
                .help("radius for point smoothing, absolute or a multiple of dnn"),
        )
        .arg(
            Arg::new("knn")
                .short('k')
                .long("knn")
                .value_name("N")
                .default_value("19")
                .help("number of neighbours in triplet creation"),
        )
        .arg(
            Arg::new("best")
                .short('n')
                .long("best")
                .value_name("N")
                .default_value("2")
                .help("number of best triplets kept per midpoint"),
        )
        .arg(
            Arg::new("alpha")
                .short('a')
                .long("alpha")
                .value_name("F")
                .default_value("0.03")
                .help("maximum angle error (1 - cos) between the triplet branches"),
        )
        .arg(
            Arg::new("scale")
                .short('s')
                .long("scale")
                .value_name("V[dnn]")
                .default_value("0.3dnn")
                .help("scaling factor for clustering, absolute or a multiple of dnn"),
        )
        .arg(
            Arg::new("threshold")
                .short('t')
                .long("threshold")
                .value_name("V|auto")
                .default_value("auto")
                .help("cluster cut distance, or 'auto'"),
        )
        .arg(
            Arg::new("min")
                .short('m')
                .long("min-triplets")
                .value_name("N")
                .default_value("5")
                .help("minimum number of triplets for a cluster"),
        )
        .arg(
            Arg::new("dmax")
                .long("dmax")
                .value_name("V[dnn]|none")
                .default_value("none")
                .help("maximum gap width within a cluster, absolute or a multiple of dnn"),
        )
        .arg(
            Arg::new("link")
                .long("link")
                .value_name("METHOD")
                .default_value("single")
                .help("linkage method: single, complete or average"),
        )
        .arg(
            Arg::new("ordered")
                .long("ordered")
                .action(ArgAction::SetTrue)
                .help("input points are sampled along the curve"),
        )
        .arg(
            Arg::new("delim")
                .long("delim")
                .value_name("CHAR")
                .default_value(" ")
                .help("single character delimiter of the input"),
        )
        .arg(
            Arg::new("skip")
                .long("skip")
                .value_name("N")
                .default_value("0")
                .help("number of lines skipped at the head of the input"),
        )
        .arg(
            Arg::new("oprefix")
                .short('o')
                .long("oprefix")
                .value_name("PREFIX")
                .help("write the result to <PREFIX>.csv (and <PREFIX>.gnuplot) instead of stdout"),
        )
        .arg(
            Arg::new("gnuplot")
                .long("gnuplot")
                .action(ArgAction::SetTrue)
                .help("print the result as a gnuplot script"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("be verbose (-vv writes debug trace files)"),
        )
}

// exits with code 1 on bad arguments, like every parse failure below
fn argument_error(message: &str) -> ! {
    eprintln!("[Error] {}", message);
    exit(1);
}

fn parse_params() -> Params {
    let matches = match command().try_get_matches() {
        Ok(matches) => matches,
        Err(e) => {
            let code = match e.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            exit(code);
        }
    };
    //
    let r = parse_dnn_scaled(matches.get_one::<String>("radius").unwrap())
        .unwrap_or_else(|e| argument_error(&e.to_string()));
    let s = parse_dnn_scaled(matches.get_one::<String>("scale").unwrap())
        .unwrap_or_else(|e| argument_error(&e.to_string()));
    let k = matches
        .get_one::<String>("knn")
        .unwrap()
        .parse::<usize>()
        .unwrap_or_else(|_| argument_error("option -k takes a positive integer"));
    let n = matches
        .get_one::<String>("best")
        .unwrap()
        .parse::<usize>()
        .unwrap_or_else(|_| argument_error("option -n takes a positive integer"));
    let a = matches
        .get_one::<String>("alpha")
        .unwrap()
        .parse::<f64>()
        .unwrap_or_else(|_| argument_error("option -a takes a number"));
    let m = matches
        .get_one::<String>("min")
        .unwrap()
        .parse::<usize>()
        .unwrap_or_else(|_| argument_error("option -m takes a positive integer"));
    //
    let threshold_arg = matches.get_one::<String>("threshold").unwrap();
    let threshold = if threshold_arg == "auto" || threshold_arg == "automatic" {
        CutThreshold::Automatic
    } else {
        let t = threshold_arg
            .parse::<f64>()
            .unwrap_or_else(|_| argument_error("option -t takes a number or 'auto'"));
        CutThreshold::Fixed(t)
    };
    //
    let dmax_arg = matches.get_one::<String>("dmax").unwrap();
    let dmax = if dmax_arg == "none" {
        None
    } else {
        Some(parse_dnn_scaled(dmax_arg).unwrap_or_else(|e| argument_error(&e.to_string())))
    };
    //
    let link = matches
        .get_one::<String>("link")
        .unwrap()
        .parse::<Linkage>()
        .unwrap_or_else(|e| argument_error(&e));
    //
    let delim_arg = matches.get_one::<String>("delim").unwrap();
    let mut delim_chars = delim_arg.chars();
    let delimiter = match (delim_chars.next(), delim_chars.next()) {
        (Some(c), None) if c.is_ascii() => c,
        _ => argument_error("only a single ascii character as delimiter is allowed"),
    };
    //
    let skip = match matches
        .get_one::<String>("skip")
        .unwrap()
        .parse::<i64>()
        .unwrap_or_else(|_| argument_error("option -skip takes an integer"))
    {
        negative if negative < 0 => {
            eprintln!("[Warning] skip takes only positive integers. parameter is ignored!");
            0
        }
        skip => skip as usize,
    };
    //
    Params {
        infile: matches.get_one::<String>("infile").unwrap().clone(),
        oprefix: matches.get_one::<String>("oprefix").cloned(),
        gnuplot: matches.get_flag("gnuplot"),
        delimiter,
        skip,
        verbosity: matches.get_count("verbose"),
        r,
        k,
        n,
        a,
        ordered: matches.get_flag("ordered"),
        s,
        threshold,
        m,
        dmax,
        link,
    }
}

// debug file writes are reported but never stop the pipeline
fn write_debug_file<F>(fname: &str, write: F)
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let result = File::create(fname).and_then(|file| {
        let mut out = BufWriter::new(file);
        write(&mut out)?;
        out.flush()
    });
    if let Err(e) = result {
        log::error!("could not write file '{}' : {}", fname, e);
    }
}

fn main() {
    let params = parse_params();
    //
    let level = match params.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(level).init();
    //
    let cpu_start = ProcessTime::now();
    let sys_now = SystemTime::now();
    //
    // load data
    let mut cloud = match load_csv_file(&params.infile, params.delimiter, params.skip) {
        Ok(cloud) => cloud,
        Err(e) => {
            eprintln!("[Error] in file '{}': {:#}", params.infile, e);
            exit(2);
        }
    };
    if cloud.is_empty() {
        eprintln!(
            "[Error] empty cloud in file '{}'\nmaybe you used the wrong delimiter",
            params.infile
        );
        exit(2);
    }
    #[cfg(feature = "webdemo")]
    if cloud.len() > 1000 {
        eprintln!(
            "[Error] in file '{}': number of points limited to 1000 in demo mode",
            params.infile
        );
        exit(3);
    }
    cloud.set_ordered(params.ordered);
    //
    // compute the characteristic length dnn if any parameter is relative
    let mut r = params.r.value;
    let mut s = params.s.value;
    let mut dmax = params.dmax.map(|d| d.value);
    let needs_dnn = params.r.times_dnn
        || params.s.times_dnn
        || params.dmax.map_or(false, |d| d.times_dnn);
    if needs_dnn {
        let dnn = first_quartile(&cloud).sqrt();
        log::info!("computed dnn : {:.6}", dnn);
        if dnn == 0.0 {
            eprintln!("[Error] dnn computed as zero. Suggestion: remove doublets, e.g. with 'sort -u'");
            exit(3);
        }
        if params.r.times_dnn {
            r *= dnn;
            log::info!("computed smoothing radius : {:.6}", r);
        }
        if params.s.times_dnn {
            s *= dnn;
            log::info!("computed distance scale : {:.6}", s);
        }
        if params.dmax.map_or(false, |d| d.times_dnn) {
            let gap = dmax.as_mut().unwrap();
            *gap *= dnn;
            log::info!("computed max gap width : {:.6}", gap);
        }
    }
    //
    // step 1: smoothing by position averaging of neighbouring points
    let cloud_smooth = smoothen_cloud(&cloud, r);
    if params.verbosity > 1 {
        write_debug_file("debug_smoothed.csv", |out| cloud_to_csv(&cloud_smooth, out));
        write_debug_file("debug_smoothed.gnuplot", |out| {
            debug_gnuplot(&cloud, &cloud_smooth, out)
        });
    }
    //
    // step 2: triplets of approximately collinear points
    let triplets = generate_triplets(&cloud_smooth, params.k, params.n, params.a);
    log::info!("generated triplets : {}", triplets.len());
    //
    // step 3: hierarchical clustering of the triplets
    let clustering = cluster_triplets(&triplets, s, &params.threshold, params.link);
    if params.verbosity > 1 {
        write_debug_file("debug_cdist.csv", |out| {
            cdists_to_csv(clustering.get_cdists(), out)
        });
    }
    let (mut cl_group, _) = clustering.into_parts();
    //
    // step 4: pruning, label propagation and optional gap splitting
    remove_small_clusters(&mut cl_group, params.m);
    cluster_triplets_to_points(&triplets, &mut cl_group);
    if let Some(dmax) = dmax {
        let mut split_group = ClusterGroup::new();
        for cluster in &cl_group {
            split_group.extend(split_cluster_at_gaps(cluster, &cloud, dmax, params.m + 2));
        }
        cl_group = split_group;
    }
    //
    // store cluster labels in the points
    add_clusters(&mut cloud, &mut cl_group, params.gnuplot);
    //
    // output
    let written = if let Some(prefix) = &params.oprefix {
        File::create(format!("{}.csv", prefix))
            .and_then(|file| {
                let mut out = BufWriter::new(file);
                clusters_to_csv(&cloud, &mut out)?;
                out.flush()
            })
            .and_then(|_| {
                if params.gnuplot {
                    File::create(format!("{}.gnuplot", prefix)).and_then(|file| {
                        let mut out = BufWriter::new(file);
                        clusters_to_gnuplot(&cloud, &cl_group, &mut out)?;
                        out.flush()
                    })
                } else {
                    Ok(())
                }
            })
    } else {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        if params.gnuplot {
            clusters_to_gnuplot(&cloud, &cl_group, &mut out)
        } else {
            clusters_to_csv(&cloud, &mut out)
        }
    };
    if let Err(e) = written {
        eprintln!("[Error] cannot write result: {}", e);
        exit(2);
    }
    //
    log::info!(
        "curve detection sys time(ms) {:?} cpu time(ms) {:?}",
        sys_now.elapsed().unwrap().as_millis(),
        cpu_start.elapsed().as_millis()
    );
}
