/*!
 * Fire observations as delivered by NASA FIRMS.
 *
 * The FIRMS area API returns CSV text with a fixed 14 column layout. Each row is a single satellite
 * pixel in which a fire was detected.
 */
use crate::{
    geo::{Coord, Geo},
    FireChangeResult,
};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

/// The number of columns in a FIRMS area CSV row.
pub const FIRMS_CSV_COLUMNS: usize = 14;

/// Confidence assigned to a VIIRS "low" (`l`) detection.
pub const VIIRS_LOW_CONFIDENCE: f64 = 30.0;
/// Confidence assigned to a VIIRS "nominal" (`n`) detection.
pub const VIIRS_NOMINAL_CONFIDENCE: f64 = 60.0;
/// Confidence assigned to a VIIRS "high" (`h`) detection.
pub const VIIRS_HIGH_CONFIDENCE: f64 = 90.0;

/// Whether the detection was made during the day or at night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayNight {
    #[serde(rename = "D")]
    Day,
    #[serde(rename = "N")]
    Night,
}

/**
 * A single satellite detection of a fire.
 *
 * Only the location, radiative power, confidence, and acquisition date are used when comparing
 * periods. Everything else is carried along untouched so it can be handed back to a client.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireObservation {
    /// Latitude of the pixel center in degrees.
    pub latitude: f64,
    /// Longitude of the pixel center in degrees.
    pub longitude: f64,
    /// Brightness temperature of the fire pixel, Kelvin.
    pub brightness: Option<f64>,
    /// Along scan pixel size.
    pub scan: Option<f64>,
    /// Along track pixel size.
    pub track: Option<f64>,
    /// Acquisition date, YYYY-MM-DD.
    pub acq_date: String,
    /// Acquisition time, HHMM in UTC.
    pub acq_time: String,
    pub satellite: String,
    pub instrument: String,
    /// Detection confidence on a 0-100 scale.
    pub confidence: f64,
    pub version: String,
    /// Brightness temperature of the pixel in the thermal channel, Kelvin.
    pub bright_t31: Option<f64>,
    /// Fire radiative power in megawatts.
    pub frp: f64,
    pub daynight: Option<DayNight>,
}

impl Geo for FireObservation {
    fn coord(&self) -> Coord {
        Coord {
            lat: self.latitude,
            lon: self.longitude,
        }
    }
}

impl FireObservation {
    /// Parse the body of a FIRMS area CSV response.
    ///
    /// The first line is a header and is skipped. Rows that can't be located or that have no
    /// usable radiative power or confidence are dropped with a warning. A row with the wrong number
    /// of columns is an error, the layout is fixed.
    pub fn from_csv_reader<R: Read>(reader: R) -> FireChangeResult<Vec<FireObservation>> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut observations = vec![];
        for (i, res) in csv_reader.records().enumerate() {
            let record = res?;
            // The header is line 1.
            let line = i + 2;

            if record.len() != FIRMS_CSV_COLUMNS {
                return Err(format!(
                    "line {}: expected {} columns, found {}",
                    line,
                    FIRMS_CSV_COLUMNS,
                    record.len()
                )
                .into());
            }

            match Self::from_record(&record) {
                Ok(obs) => observations.push(obs),
                Err(reason) => warn!("Skipping line {}: {}", line, reason),
            }
        }

        debug!("Parsed {} fire observations", observations.len());

        Ok(observations)
    }

    /// Parse a FIRMS CSV file.
    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> FireChangeResult<Vec<FireObservation>> {
        let path = path.as_ref();
        debug!("Loading {}", path.display());

        let f = File::open(path)?;
        Self::from_csv_reader(f)
    }

    fn from_record(record: &StringRecord) -> Result<Self, String> {
        let latitude = parse_f64(&record[0])
            .filter(|lat| (-90.0..=90.0).contains(lat))
            .ok_or_else(|| format!("invalid latitude '{}'", &record[0]))?;

        let longitude = parse_f64(&record[1])
            .filter(|lon| (-180.0..=180.0).contains(lon))
            .ok_or_else(|| format!("invalid longitude '{}'", &record[1]))?;

        let confidence = parse_confidence(&record[9])
            .ok_or_else(|| format!("invalid confidence '{}'", &record[9]))?;

        let frp = parse_f64(&record[12])
            .filter(|frp| *frp >= 0.0)
            .ok_or_else(|| format!("invalid fire radiative power '{}'", &record[12]))?;

        let daynight = match &record[13] {
            "D" => Some(DayNight::Day),
            "N" => Some(DayNight::Night),
            _ => None,
        };

        Ok(FireObservation {
            latitude,
            longitude,
            brightness: parse_f64(&record[2]),
            scan: parse_f64(&record[3]),
            track: parse_f64(&record[4]),
            acq_date: record[5].to_owned(),
            acq_time: record[6].to_owned(),
            satellite: record[7].to_owned(),
            instrument: record[8].to_owned(),
            confidence,
            version: record[10].to_owned(),
            bright_t31: parse_f64(&record[11]),
            frp,
            daynight,
        })
    }
}

/// Load and concatenate fire observations from several CSV files.
///
/// Directories are searched recursively for files ending in ".csv". Files are loaded in sorted
/// path order so the result doesn't depend on how the file system lists a directory.
pub fn load_csv_files<P: AsRef<Path>>(paths: &[P]) -> FireChangeResult<Vec<FireObservation>> {
    let mut files: Vec<PathBuf> = vec![];

    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            let mut found: Vec<PathBuf> = walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(|res| res.ok())
                // Ignore directories, WalkDir will take care of recursing into them.
                .filter(|entry| entry.path().is_file())
                .filter(|entry| entry.file_name().to_string_lossy().ends_with(".csv"))
                .map(|entry| entry.into_path())
                .collect();

            found.sort_unstable();
            files.append(&mut found);
        } else {
            files.push(path.to_path_buf());
        }
    }

    let mut observations = vec![];
    for file in &files {
        let mut obs = FireObservation::from_csv_file(file)?;
        observations.append(&mut obs);
    }

    Ok(observations)
}

fn parse_f64(val: &str) -> Option<f64> {
    val.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// MODIS reports confidence as a percentage, VIIRS as a category.
fn parse_confidence(val: &str) -> Option<f64> {
    match val {
        "l" | "low" => Some(VIIRS_LOW_CONFIDENCE),
        "n" | "nominal" => Some(VIIRS_NOMINAL_CONFIDENCE),
        "h" | "high" => Some(VIIRS_HIGH_CONFIDENCE),
        _ => parse_f64(val),
    }
}
