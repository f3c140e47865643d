use clap::Parser;
use firechange::{
    load_csv_files, parse_date, CellSearch, DetectorConfig, FireChangeResult, Period,
    FRP_CHANGE_THRESHOLD, PROXIMITY_THRESHOLD,
};
use log::{info, warn, LevelFilter};
use simple_logger::SimpleLogger;
use std::{
    fmt::{self, Display},
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Compare two periods of FIRMS fire detections stored in CSV files.
///
/// Each period is given as one or more FIRMS area CSV files or directories containing them. The
/// changes are written as JSON.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "comparefires")]
#[clap(author, version, about)]
struct CompareFiresOptionsInit {
    /// CSV files or directories with the detections for the first period.
    #[clap(long, required = true, multiple_values = true)]
    before: Vec<PathBuf>,

    /// CSV files or directories with the detections for the second period.
    #[clap(long, required = true, multiple_values = true)]
    after: Vec<PathBuf>,

    /// The first period as START,END[,LABEL] with dates in YYYY-MM-DD format.
    ///
    /// If this is not specified, the period is left blank in the output.
    #[clap(long)]
    #[clap(parse(try_from_str=parse_period))]
    period1: Option<Period>,

    /// The second period as START,END[,LABEL] with dates in YYYY-MM-DD format.
    #[clap(long)]
    #[clap(parse(try_from_str=parse_period))]
    period2: Option<Period>,

    /// The path to write the JSON output to.
    ///
    /// If this is not specified, the output goes to standard out.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// The path to a KML or KMZ file of the changes to produce from this run.
    #[clap(short, long)]
    kml_file: Option<PathBuf>,

    /// Maximum distance in degrees between detections of the same fire.
    #[clap(long, default_value_t = PROXIMITY_THRESHOLD)]
    proximity: f64,

    /// Minimum relative change in fire radiative power for a matched fire to be reported.
    #[clap(long, default_value_t = FRP_CHANGE_THRESHOLD)]
    frp_change: f64,

    /// Only look for a match in the grid cell a detection falls in.
    #[clap(long)]
    single_cell: bool,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn parse_period(period: &str) -> Result<Period, String> {
    period.parse::<Period>().map_err(|err| err.to_string())
}

#[derive(Debug)]
struct CompareFiresOptionsChecked {
    before: Vec<PathBuf>,
    after: Vec<PathBuf>,
    period1: Period,
    period2: Period,
    output: Option<PathBuf>,
    kml_file: Option<PathBuf>,
    config: DetectorConfig,
}

impl Display for CompareFiresOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        for pth in &self.before {
            writeln!(f, "         Before: {}", pth.display())?;
        }
        for pth in &self.after {
            writeln!(f, "          After: {}", pth.display())?;
        }
        writeln!(f, "       Period 1: {}", self.period1)?;
        writeln!(f, "       Period 2: {}", self.period2)?;
        match self.output {
            Some(ref pth) => writeln!(f, "    Output JSON: {}", pth.display())?,
            None => writeln!(f, "    Output JSON: standard out")?,
        }
        if let Some(ref pth) = self.kml_file {
            writeln!(f, "     Output KML: {}", pth.display())?;
        }
        writeln!(f, "      Proximity: {}", self.config.proximity_threshold)?;
        writeln!(f, "     FRP Change: {}", self.config.frp_change_threshold)?;
        writeln!(f, "    Cell Search: {:?}", self.config.cell_search)?;
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
fn parse_args() -> FireChangeResult<CompareFiresOptionsChecked> {
    let CompareFiresOptionsInit {
        before,
        after,
        period1,
        period2,
        output,
        kml_file,
        proximity,
        frp_change,
        single_cell,
        verbose,
    } = CompareFiresOptionsInit::parse();

    start_logger(verbose)?;

    if !(proximity.is_finite() && proximity > 0.0) {
        return Err(format!(
            "Proximity must be a positive number of degrees: {}",
            proximity
        )
        .into());
    }

    if !(frp_change.is_finite() && frp_change >= 0.0) {
        return Err(format!("FRP change must be a non-negative fraction: {}", frp_change).into());
    }

    let period1 = period1.unwrap_or_else(|| Period::new("", "", "Period 1"));
    let period2 = period2.unwrap_or_else(|| Period::new("", "", "Period 2"));

    let start1 = parse_date(&period1.start_date);
    let start2 = parse_date(&period2.start_date);
    if let (Ok(start1), Ok(start2)) = (start1, start2) {
        if start2 < start1 {
            warn!("The second period starts before the first.");
        }
    }

    let cell_search = if single_cell {
        CellSearch::SingleCell
    } else {
        CellSearch::Neighborhood
    };

    let config = DetectorConfig {
        proximity_threshold: proximity,
        frp_change_threshold: frp_change,
        cell_search,
        ..DetectorConfig::default()
    };

    let checked = CompareFiresOptionsChecked {
        before,
        after,
        period1,
        period2,
        output,
        kml_file,
        config,
    };

    if verbose {
        info!("{}", checked);
    }

    Ok(checked)
}

/*-------------------------------------------------------------------------------------------------
 *                                             MAIN
 *-----------------------------------------------------------------------------------------------*/
fn main() -> FireChangeResult<()> {
    let opts = parse_args()?;

    //
    // Load the detections for each period.
    //
    let before = load_csv_files(&opts.before)?;
    let after = load_csv_files(&opts.after)?;
    info!(
        "Loaded {} detections for the first period and {} for the second.",
        before.len(),
        after.len()
    );

    let result = opts.config.detect(
        &before,
        &after,
        opts.period1.clone(),
        opts.period2.clone(),
    );

    info!("\n{}", result.summary);

    //
    // Output
    //
    match opts.output {
        Some(ref pth) => {
            let mut f = BufWriter::new(File::create(pth)?);
            serde_json::to_writer_pretty(&mut f, &result)?;
            writeln!(f)?;
            f.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, &result)?;
            writeln!(out)?;
        }
    }

    if let Some(ref kml_file) = opts.kml_file {
        result.save_kml(kml_file)?;
        info!("Saved KML to {}", kml_file.display());
    }

    Ok(())
}

/// Log messages from this crate at the info level, or debug if verbose.
fn start_logger(verbose: bool) -> FireChangeResult<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .with_module_level("firechange", level)
        .with_module_level("comparefires", level)
        .init()?;

    Ok(())
}
