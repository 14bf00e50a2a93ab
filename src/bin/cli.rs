//! xcscore CLI - score an IGC flight track for distance contests
//!
//! Usage:
//!   xcscore-cli <flight.igc>
//!   xcscore-cli <flight.igc> --json
//!   xcscore-cli <flight.igc> --begin 11 --end 16:30 --progress-secs 5
//!
//! Loads the track, runs the turnpoint search and prints the best free
//! distance path and the best flat/FAI triangles with their OLC point
//! values, plus flight statistics. With `--progress-secs` a polling thread
//! reports intermediate bests while the search runs.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use xcscore::igc::{format_time, parse_time_of_day};
use xcscore::{
    distance_meters, load_igc, Candidate, FlightScore, FlightStats, IgcOptions, IgcTrack,
    OptimizeConfig, Optimizer, TrackPoint,
};

#[derive(Parser)]
#[command(name = "xcscore-cli")]
#[command(about = "Score an IGC flight track for distance contests", long_about = None)]
struct Cli {
    /// IGC file to score
    file: PathBuf,

    /// Enable verbose debug output
    #[arg(short, long)]
    verbose: bool,

    /// Load the track and report statistics only; skip the turnpoint search
    #[arg(short = 'n', long)]
    no_optimize: bool,

    /// Disable all skip-ahead shortcuts (slow; for cross-checking)
    #[arg(long)]
    exhaustive: bool,

    /// Ignore fixes before this time of day, hh[:mm[:ss]]
    #[arg(short, long)]
    begin: Option<String>,

    /// Ignore fixes after this time of day, hh[:mm[:ss]]
    #[arg(short, long)]
    end: Option<String>,

    /// Plausibility ceiling for ground speed in km/h
    #[arg(short = 's', long, default_value_t = 90.0)]
    max_speed: f64,

    /// Print the result as JSON instead of a report
    #[arg(long)]
    json: bool,

    /// Report intermediate best candidates every N seconds while searching
    #[arg(long, value_name = "N")]
    progress_secs: Option<u64>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    file: String,
    date: Option<&'a str>,
    stats: Option<&'a FlightStats>,
    score: &'a FlightScore,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{:5}] {}", record.level(), record.args())
        })
        .init();

    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> xcscore::Result<()> {
    let mut options = IgcOptions {
        max_speed_kmh: cli.max_speed,
        ..IgcOptions::default()
    };
    if let Some(begin) = &cli.begin {
        options.begin_seconds = parse_time_of_day(begin)?;
    }
    if let Some(end) = &cli.end {
        options.end_seconds = parse_time_of_day(end)?;
    }

    let track = load_igc(&cli.file, &options)?;
    let config = OptimizeConfig {
        skip_search: cli.no_optimize,
        exhaustive: cli.exhaustive,
    };
    let optimizer = Optimizer::new(&track.points, config);

    let score = match cli.progress_secs {
        Some(secs) if !cli.no_optimize => {
            let progress = optimizer.progress();
            let stop = Arc::new(AtomicBool::new(false));
            let stop_poller = Arc::clone(&stop);
            let interval = Duration::from_secs(secs.max(1));
            let poller = thread::spawn(move || {
                let tick = Duration::from_millis(200);
                let mut waited = Duration::ZERO;
                while !stop_poller.load(Ordering::Relaxed) {
                    thread::sleep(tick);
                    waited += tick;
                    if waited >= interval {
                        waited = Duration::ZERO;
                        let snapshot = progress.snapshot();
                        let best = |c: &Option<Candidate>| {
                            c.map(|c| format!("{:.3} km", c.km()))
                                .unwrap_or_else(|| "-".to_string())
                        };
                        eprintln!(
                            "searching (i2={}, i4={}): free {} | flat {} | fai {}",
                            snapshot.scan_i2,
                            snapshot.scan_i4,
                            best(&snapshot.free_flight),
                            best(&snapshot.flat_triangle),
                            best(&snapshot.fai_triangle),
                        );
                    }
                }
            });
            let score = optimizer.run();
            stop.store(true, Ordering::Relaxed);
            let _ = poller.join();
            score
        }
        _ => optimizer.run(),
    };

    if cli.json {
        let report = JsonReport {
            file: cli.file.display().to_string(),
            date: track.date.as_deref(),
            stats: track.stats.as_ref(),
            score: &score,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("error: failed to serialize report: {err}"),
        }
    } else {
        print_report(&cli.file, &track, &score);
    }
    Ok(())
}

// ============================================================================
// Report rendering
// ============================================================================

fn print_report(file: &PathBuf, track: &IgcTrack, score: &FlightScore) {
    println!("flight: {}", file.display());
    if let Some(date) = &track.date {
        println!("date:   {date}");
    }
    println!("fixes:  {}", score.point_count);

    if let Some(stats) = &track.stats {
        let duration = stats.duration_seconds();
        println!(
            "time:   {} - {} ({})",
            format_time(stats.start_seconds),
            format_time(stats.end_seconds),
            format_time(duration)
        );
        println!(
            "speed:  max {:.1} km/h, mean {:.1} km/h",
            stats.max_speed_kmh, stats.mean_speed_kmh
        );
        println!(
            "alt:    takeoff {} m, min {} m, max {} m",
            stats.takeoff_altitude, stats.min_altitude, stats.max_altitude
        );
        println!(
            "vario:  max {:+.2} m/s, min {:+.2} m/s",
            stats.max_vario_ms, stats.min_vario_ms
        );
    }

    println!();
    println!(
        "straight distance: {:.3} km",
        f64::from(score.max_distance.meters) / 1000.0
    );
    print_turnpoint(&track.points, score.max_distance.from, None);
    print_turnpoint(
        &track.points,
        score.max_distance.to,
        Some(score.max_distance.meters),
    );
    println!(
        "max distance from takeoff: {:.3} km",
        f64::from(score.max_takeoff.meters) / 1000.0
    );

    for (label, candidate) in [
        ("free flight", &score.free_flight),
        ("flat triangle", &score.flat_triangle),
        ("FAI triangle", &score.fai_triangle),
    ] {
        println!();
        match candidate {
            None => println!("{label}: none"),
            Some(candidate) => {
                println!(
                    "{label}: {:.3} km = {:.3} points",
                    candidate.km(),
                    candidate.olc_points()
                );
                print_candidate(&track.points, candidate);
            }
        }
    }

    if let Some(best) = score.best_flight() {
        println!();
        println!(
            "best flight type: {} ({:.3} points)",
            best.kind.as_str(),
            best.olc_points()
        );
    }
}

/// Print a candidate's fixes with the leg distances re-derived from the
/// coordinates (identical to the matrix values by construction).
fn print_candidate(points: &[TrackPoint], candidate: &Candidate) {
    let [p1, p2, p3, p4, p5] = candidate.indices;
    match candidate.kind {
        xcscore::CandidateKind::FreeFlight => {
            print_turnpoint(points, p1, None);
            for (from, to) in [(p1, p2), (p2, p3), (p3, p4), (p4, p5)] {
                print_turnpoint(points, to, Some(leg(points, from, to)));
            }
        }
        _ => {
            // Start/end pair closes the triangle; legs run 2-3, 3-4, 4-2.
            print_turnpoint(points, p1, None);
            print_turnpoint(points, p5, Some(leg(points, p1, p5)));
            print_turnpoint(points, p2, None);
            print_turnpoint(points, p3, Some(leg(points, p2, p3)));
            print_turnpoint(points, p4, Some(leg(points, p3, p4)));
            print_turnpoint(points, p2, Some(leg(points, p2, p4)));
        }
    }
}

fn leg(points: &[TrackPoint], from: usize, to: usize) -> u32 {
    let a = &points[from];
    let b = &points[to];
    distance_meters(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// One line per fix: index, time of day, coordinates, optional leg length.
fn print_turnpoint(points: &[TrackPoint], index: usize, leg_meters: Option<u32>) {
    let point = &points[index];
    let lat_hemi = if point.latitude < 0.0 { 'S' } else { 'N' };
    let lon_hemi = if point.longitude < 0.0 { 'W' } else { 'E' };
    print!(
        "  p{:04} {} {}{} {}{}",
        index + 1,
        format_time(point.seconds),
        lat_hemi,
        format_degrees(point.latitude.abs()),
        lon_hemi,
        format_degrees(point.longitude.abs()),
    );
    match leg_meters {
        Some(meters) => println!("  {:.3} km", f64::from(meters) / 1000.0),
        None => println!(),
    }
}

/// Degrees as `deg:minutes.thousandths`, the form contest forms use.
fn format_degrees(degrees: f64) -> String {
    let whole = degrees.trunc();
    let minutes = (degrees - whole) * 60.0;
    format!("{:02}:{:06.3}", whole as u32, minutes)
}
