use clap::Parser;
use firechange::{
    BoundingBox, DetectorConfig, FireChangeResult, FirmsClient, FirmsRequest, Period,
    DEFAULT_SOURCE, FIRMS_BASE_URL,
};
use log::{info, LevelFilter};
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
/// Download two periods of fire detections from NASA FIRMS and compare them.
///
/// Each period is requested as 10 days of data starting on the period start date. The changes
/// are written as JSON.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "fetchchanges")]
#[clap(author, version, about)]
struct FetchChangesOptionsInit {
    /// The area to compare as WEST,SOUTH,EAST,NORTH in decimal degrees.
    #[clap(short, long, allow_hyphen_values = true)]
    #[clap(parse(try_from_str=parse_bbox))]
    bbox: BoundingBox,

    /// The first period as START,END[,LABEL] with dates in YYYY-MM-DD format.
    #[clap(long)]
    #[clap(parse(try_from_str=parse_period))]
    period1: Period,

    /// The second period as START,END[,LABEL] with dates in YYYY-MM-DD format.
    #[clap(long)]
    #[clap(parse(try_from_str=parse_period))]
    period2: Period,

    /// The FIRMS map key.
    ///
    /// If this is not specified, then the program will check for it in the "FIRMS_MAP_KEY"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "FIRMS_MAP_KEY", hide_env_values = true)]
    map_key: String,

    /// The FIRMS data set to use, e.g. VIIRS_SNPP_NRT, VIIRS_NOAA20_NRT, or MODIS_NRT.
    #[clap(short, long)]
    #[clap(env = "FIRMS_SOURCE", default_value = DEFAULT_SOURCE)]
    source: String,

    /// The FIRMS area API endpoint.
    #[clap(long)]
    #[clap(env = "FIRMS_BASE_URL", default_value = FIRMS_BASE_URL)]
    base_url: String,

    /// The path to write the JSON output to.
    ///
    /// If this is not specified, the output goes to standard out.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// The path to a KML or KMZ file of the changes to produce from this run.
    #[clap(short, long)]
    kml_file: Option<PathBuf>,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn parse_bbox(bbox: &str) -> Result<BoundingBox, String> {
    bbox.parse::<BoundingBox>().map_err(|err| err.to_string())
}

fn parse_period(period: &str) -> Result<Period, String> {
    period.parse::<Period>().map_err(|err| err.to_string())
}

#[derive(Debug)]
struct FetchChangesOptionsChecked {
    request: FirmsRequest,
    period1: Period,
    period2: Period,
    output: Option<PathBuf>,
    kml_file: Option<PathBuf>,
}

impl Display for FetchChangesOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        writeln!(f, "       Area: {}", self.request.bounds)?;
        writeln!(f, "     Source: {}", self.request.source)?;
        writeln!(f, "   Base URL: {}", self.request.base_url)?;
        writeln!(f, "   Period 1: {}", self.period1)?;
        writeln!(f, "   Period 2: {}", self.period2)?;
        match self.output {
            Some(ref pth) => writeln!(f, "Output JSON: {}", pth.display())?,
            None => writeln!(f, "Output JSON: standard out")?,
        }
        if let Some(ref pth) = self.kml_file {
            writeln!(f, " Output KML: {}", pth.display())?;
        }
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
///
/// If there is missing data, try to fill it in with environment variables.
fn parse_args() -> FireChangeResult<FetchChangesOptionsChecked> {
    let FetchChangesOptionsInit {
        bbox,
        period1,
        period2,
        map_key,
        source,
        base_url,
        output,
        kml_file,
        verbose,
    } = FetchChangesOptionsInit::parse();

    start_logger(verbose)?;

    if map_key.trim().is_empty() {
        return Err("A FIRMS map key is required.".into());
    }

    let request = FirmsRequest {
        base_url,
        source,
        ..FirmsRequest::new(map_key.trim(), bbox)
    };

    let checked = FetchChangesOptionsChecked {
        request,
        period1,
        period2,
        output,
        kml_file,
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
    // Download both periods at once.
    //
    let client = FirmsClient::new()?;
    let (before, after) = client.fetch_periods(&opts.request, &opts.period1, &opts.period2)?;

    let result = DetectorConfig::default().detect(
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
        .with_module_level("fetchchanges", level)
        .init()?;

    Ok(())
}
