use std::path::PathBuf;
use std::process;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use log::{error, info, warn};

use dotmap::config::Config;
use dotmap::render::render_map;
use dotmap::scan;
use dotmap::Bounds;

/// Plot the density of lat/lon points from a delimited text file as an
/// ASCII map.
#[derive(Parser, Debug)]
#[command(name = "dotmap", version)]
struct Args {
    /// Input data file, one point per line
    input: PathBuf,

    /// Map width in cells
    #[arg(short = 'W', long, default_value_t = 120)]
    width: usize,

    /// Map height in cells
    #[arg(short = 'H', long, default_value_t = 40)]
    height: usize,

    /// Field delimiter
    #[arg(short, long, default_value = ",")]
    delimiter: String,

    /// Number of leading header lines to skip
    #[arg(long, default_value_t = 0)]
    skip_header: usize,

    /// Density glyphs from empty to busiest; the first is the empty cell
    #[arg(long, default_value = " .:-=+*#%@")]
    glyphs: String,

    /// 0-based column index of the latitude field
    #[arg(long, default_value_t = 0)]
    lat_column: usize,

    /// 0-based column index of the longitude field
    #[arg(long, default_value_t = 1)]
    lon_column: usize,

    /// How many per-line errors to log individually (-1 for all)
    #[arg(long, default_value_t = 10)]
    max_reported_errors: i64,

    /// Scan the file with one shard per CPU instead of sequentially
    #[arg(short, long)]
    parallel: bool,

    /// Skip bounds discovery and plot inside this rectangle
    #[arg(long, value_name = "MIN_LAT,MAX_LAT,MIN_LON,MAX_LON")]
    fixed_bounds: Option<String>,

    /// Where the external HTML renderer would write its output
    #[arg(long, value_name = "PATH")]
    html_out: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run(Args::parse()) {
        error!("{err:#}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let fixed_bounds = args
        .fixed_bounds
        .as_deref()
        .map(parse_fixed_bounds)
        .transpose()?;
    let config = Config {
        file_path: args.input,
        map_width: args.width,
        map_height: args.height,
        delimiter: args.delimiter,
        skip_header_lines: args.skip_header,
        glyphs: args.glyphs.chars().collect(),
        lat_column: args.lat_column,
        lon_column: args.lon_column,
        max_reported_errors: args.max_reported_errors,
        parallel: args.parallel,
        fixed_bounds,
        html_output: args.html_out,
    };
    config.validate()?;

    info!("Starting ASCII map plotter:");
    info!("Input data file: {:?}", config.file_path);
    info!("Map size: {} x {}", config.map_width, config.map_height);
    info!("Delimiter: {:?}", config.delimiter);
    info!("Skip header lines: {}", config.skip_header_lines);
    if let Some(path) = &config.html_output {
        warn!("HTML output ({path:?}) is produced by the external renderer; ignoring it here");
    }

    let bounds = match config.fixed_bounds {
        Some(b) => {
            info!("Using fixed bounds: {b}");
            b
        }
        None => {
            info!("Finding data bounds...");
            if config.parallel {
                scan::find_bounds_parallel(&config)?
            } else {
                scan::find_bounds(&config)?
            }
        }
    };

    info!("Populating grid...");
    let grid = if config.parallel {
        scan::populate_grid_parallel(&config, &bounds)?
    } else {
        scan::populate_grid(&config, &bounds)?
    };
    info!("Max points per cell: {}", grid.max_count());

    info!("{}", render_map(&grid, &config, &bounds));
    Ok(())
}

fn parse_fixed_bounds(s: &str) -> Result<Bounds> {
    let parts: Vec<&str> = s.split(',').collect();
    ensure!(
        parts.len() == 4,
        "fixed bounds must be MIN_LAT,MAX_LAT,MIN_LON,MAX_LON"
    );
    let mut vals = [0.0f64; 4];
    for (v, raw) in vals.iter_mut().zip(&parts) {
        *v = raw
            .trim()
            .parse()
            .with_context(|| format!("bad fixed-bounds value {raw:?}"))?;
    }
    Ok(Bounds::new(vals[0], vals[1], vals[2], vals[3], 0))
}
